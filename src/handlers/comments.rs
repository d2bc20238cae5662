use crate::middleware::require_identity;
use crate::models::content::Comment;
use crate::models::errors::AppError;
use crate::models::user::Identity;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

const MAX_BODY_LEN: usize = 2000;
const MAX_SLUG_LEN: usize = 200;

#[derive(Debug, Deserialize)]
pub struct CommentQuery {
    pub post: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_slug: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub body: String,
}

/// Comments on one article, oldest first
pub async fn list_comments(
    State(app_state): State<AppState>,
    query: Result<Query<CommentQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    let slug = validate_slug(query.post.as_deref().unwrap_or_default())?;

    let comments = app_state.db.list_comments(&slug).await;

    Ok(Json(json!({
        "success": true,
        "comments": comments,
        "total": comments.len()
    })))
}

pub async fn create_comment(
    State(app_state): State<AppState>,
    identity: Option<Extension<Identity>>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let identity = require_identity(identity)?;
    if !identity.capabilities.can_comment {
        return Err(AppError::forbidden("Your account cannot post comments"));
    }

    let Json(req) = payload?;
    let slug = validate_slug(&req.post_slug)?;
    let body = validate_body(&req.body)?;

    let comment = app_state
        .db
        .insert_comment(Comment::new(slug, identity.user_id, identity.name, body))
        .await?;

    tracing::debug!("Comment {} posted on {}", comment.id, comment.post_slug);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "comment": comment
        })),
    ))
}

pub async fn update_comment(
    State(app_state): State<AppState>,
    identity: Option<Extension<Identity>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateCommentRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let identity = require_identity(identity)?;
    let Path(id) = id?;
    let Json(req) = payload?;

    authorize_comment_change(&app_state, &identity, id).await?;
    let body = validate_body(&req.body)?;

    let comment = app_state.db.update_comment_body(id, body).await?;

    Ok(Json(json!({
        "success": true,
        "comment": comment
    })))
}

pub async fn delete_comment(
    State(app_state): State<AppState>,
    identity: Option<Extension<Identity>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let identity = require_identity(identity)?;
    let Path(id) = id?;

    authorize_comment_change(&app_state, &identity, id).await?;
    app_state.db.delete_comment(id).await?;

    tracing::debug!("Comment {} deleted by {}", id, identity.user_id);

    Ok(Json(json!({
        "success": true,
        "message": "Comment deleted"
    })))
}

/// Only the author or an administrator may change a comment
async fn authorize_comment_change(
    app_state: &AppState,
    identity: &Identity,
    id: Uuid,
) -> Result<(), AppError> {
    let comment = app_state
        .db
        .get_comment(id)
        .await
        .ok_or_else(|| AppError::not_found("Comment"))?;

    if comment.author_id != identity.user_id && !identity.is_admin() {
        return Err(AppError::forbidden("You can only change your own comments"));
    }
    Ok(())
}

fn validate_slug(slug: &str) -> Result<String, AppError> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(AppError::validation_failed("post is required"));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(AppError::validation_failed("post is too long"));
    }
    Ok(slug.to_string())
}

fn validate_body(body: &str) -> Result<String, AppError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(AppError::validation_failed("Comment cannot be empty"));
    }
    if body.chars().count() > MAX_BODY_LEN {
        return Err(AppError::validation_failed(format!(
            "Comment must be at most {} characters",
            MAX_BODY_LEN
        )));
    }
    Ok(body.to_string())
}
