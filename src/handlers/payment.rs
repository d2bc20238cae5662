use crate::models::errors::AppError;
use crate::AppState;
use axum::{extract::State, response::Json};
use serde_json::{json, Value};

/// Public settings the storefront needs to start a checkout
pub async fn payment_config(State(app_state): State<AppState>) -> Result<Json<Value>, AppError> {
    let client_key = app_state
        .config
        .payment_client_key
        .as_deref()
        .ok_or_else(|| AppError::not_found("Payment provider configuration"))?;

    Ok(Json(json!({
        "success": true,
        "clientKey": client_key,
        "baseUrl": app_state.config.base_url,
        "successUrl": format!("{}/checkout/success", app_state.config.base_url),
        "failUrl": format!("{}/checkout/fail", app_state.config.base_url)
    })))
}
