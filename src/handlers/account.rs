use crate::middleware::{require_admin, require_identity, SessionId};
use crate::models::errors::AppError;
use crate::models::user::Identity;
use crate::services::accounts;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Profile of the signed-in member
pub async fn my_profile(
    State(app_state): State<AppState>,
    identity: Option<Extension<Identity>>,
) -> Result<Json<Value>, AppError> {
    let identity = require_identity(identity)?;
    let user = app_state
        .db
        .find_user(identity.user_id)
        .await
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(Json(json!({
        "success": true,
        "profile": user.profile()
    })))
}

pub async fn get_admin_account(
    State(app_state): State<AppState>,
    identity: Option<Extension<Identity>>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(identity)?;
    let user = app_state
        .db
        .find_user(admin.user_id)
        .await
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(Json(json!({
        "success": true,
        "account": user.profile()
    })))
}

/// Changes the admin's display name or email. Live sessions pick up the
/// new values immediately.
pub async fn update_admin_account(
    State(app_state): State<AppState>,
    identity: Option<Extension<Identity>>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(identity)?;
    let Json(req) = payload?;

    let name = match req.name.as_deref() {
        Some(name) => accounts::normalize_name(name)?,
        None => admin.name.clone(),
    };
    let email = match req.email.as_deref() {
        Some(email) => accounts::normalize_email(email)?,
        None => admin.email.clone(),
    };

    let user = app_state
        .db
        .update_user_account(admin.user_id, name, email)
        .await?;

    let refreshed = app_state
        .session_manager
        .refresh_identity(&user.identity())
        .await;
    tracing::info!(
        "Admin account {} updated ({} sessions refreshed)",
        user.id,
        refreshed
    );

    Ok(Json(json!({
        "success": true,
        "account": user.profile()
    })))
}

/// Changes the admin password and signs out every other session
pub async fn change_admin_password(
    State(app_state): State<AppState>,
    identity: Option<Extension<Identity>>,
    session: Option<Extension<SessionId>>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(identity)?;
    let Json(req) = payload?;

    accounts::change_password(
        &app_state.db,
        admin.user_id,
        &req.current_password,
        &req.new_password,
    )
    .await?;

    let keep = session.as_ref().map(|Extension(SessionId(id))| id.as_str());
    let revoked = app_state
        .session_manager
        .destroy_user_sessions(admin.user_id, keep)
        .await;
    if revoked > 0 {
        tracing::info!("Revoked {} other sessions of {}", revoked, admin.user_id);
    }

    Ok(Json(json!({
        "success": true,
        "message": "Password updated"
    })))
}
