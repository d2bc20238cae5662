use crate::middleware::{require_identity, SessionId};
use crate::models::errors::AppError;
use crate::models::user::{Identity, Role};
use crate::services::accounts;
use crate::services::session_manager::SESSION_COOKIE;
use crate::utils::cookies::{build_cookie, clear_cookie};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse, Json, Response},
    Extension,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Creates a member account. Signing in is a separate step.
pub async fn register(
    State(app_state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;

    let user = accounts::register(
        &app_state.db,
        &req.email,
        &req.name,
        &req.password,
        Role::Member,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": user.profile()
        })),
    )
        .into_response())
}

/// Verifies credentials and starts a session
pub async fn login(
    State(app_state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;

    let user = accounts::authenticate(&app_state.db, &req.email, &req.password).await?;
    let session_id = app_state.session_manager.create_session(user.identity()).await;

    let cookie = build_cookie(
        SESSION_COOKIE,
        &session_id,
        app_state.session_manager.expiry_duration(),
        app_state.config.secure_cookies(),
    );

    tracing::info!("User {} signed in", user.id);

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(json!({
            "success": true,
            "user": user.profile()
        })),
    )
        .into_response())
}

/// Ends the current session. Succeeds even without one.
pub async fn logout(
    State(app_state): State<AppState>,
    session: Option<Extension<SessionId>>,
) -> Response {
    if let Some(Extension(SessionId(session_id))) = session {
        if let Err(e) = app_state.session_manager.destroy_session(&session_id).await {
            tracing::debug!("Logout without a live session: {}", e);
        }
    }

    (
        AppendHeaders([(header::SET_COOKIE, clear_cookie(SESSION_COOKIE))]),
        Json(json!({
            "success": true,
            "message": "Signed out"
        })),
    )
        .into_response()
}

/// The identity behind the current session
pub async fn session(
    identity: Option<Extension<Identity>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let identity = require_identity(identity)?;

    Ok(Json(json!({
        "success": true,
        "user": identity
    })))
}
