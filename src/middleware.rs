// Request middleware: resolves the session cookie and applies the access policy

use crate::models::errors::AppError;
use crate::models::user::Identity;
use crate::services::access_control::AccessDecision;
use crate::services::session_manager::SESSION_COOKIE;
use crate::utils::cookies::read_cookie;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};

/// Id of the session the request was made with
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

/// Resolves the session and rejects requests the access policy denies.
/// Allowed requests carry the [`Identity`] and [`SessionId`] as extensions.
pub async fn session_gate(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session_id = read_cookie(request.headers(), SESSION_COOKIE);
    let identity = match &session_id {
        Some(id) => app_state.session_manager.resolve(id).await,
        None => None,
    };

    let path = request.uri().path().to_string();
    let decision = app_state.access_policy.decide(&path, identity.as_ref());

    if decision != AccessDecision::Allow {
        tracing::debug!("Access to {} denied: {:?}", path, decision);
        return deny(&path, decision);
    }

    if let (Some(session_id), Some(identity)) = (session_id, identity) {
        request.extensions_mut().insert(SessionId(session_id));
        request.extensions_mut().insert(identity);
    }

    next.run(request).await
}

fn deny(path: &str, decision: AccessDecision) -> Response {
    let is_api = path == "/api" || path.starts_with("/api/");

    match (is_api, decision) {
        (true, AccessDecision::Forbidden) => {
            AppError::forbidden("You do not have permission to access this resource")
                .into_response()
        }
        (true, _) => AppError::unauthenticated("Sign in to access this resource").into_response(),
        (false, AccessDecision::Forbidden) => Redirect::temporary("/").into_response(),
        (false, _) => Redirect::temporary(&format!(
            "/login?callbackUrl={}",
            encode_query_value(path)
        ))
        .into_response(),
    }
}

fn encode_query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// The signed-in identity, or 401
pub fn require_identity(identity: Option<Extension<Identity>>) -> Result<Identity, AppError> {
    identity
        .map(|Extension(identity)| identity)
        .ok_or_else(|| AppError::unauthenticated("Sign in to continue"))
}

/// The signed-in identity if it is an admin; 401 or 403 otherwise
pub fn require_admin(identity: Option<Extension<Identity>>) -> Result<Identity, AppError> {
    let identity = require_identity(identity)?;
    if !identity.is_admin() {
        return Err(AppError::forbidden("Administrator access required"));
    }
    Ok(identity)
}
