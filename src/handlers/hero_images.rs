use crate::middleware::require_admin;
use crate::models::content::{HeroImage, HeroImageFields, HeroImagePatch};
use crate::models::errors::AppError;
use crate::models::user::Identity;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde_json::{json, Value};
use uuid::Uuid;

const MAX_TITLE_LEN: usize = 200;
const MAX_URL_LEN: usize = 2048;

/// Active hero images for the landing page
pub async fn list_hero_images(State(app_state): State<AppState>) -> Json<Value> {
    let images = app_state.db.list_hero_images(true).await;

    Json(json!({
        "success": true,
        "heroImages": images,
        "total": images.len()
    }))
}

pub async fn get_hero_image(
    State(app_state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id?;
    let image = app_state
        .db
        .get_hero_image(id)
        .await
        .ok_or_else(|| AppError::not_found("Hero image"))?;

    Ok(Json(json!({
        "success": true,
        "heroImage": image
    })))
}

/// Every hero image including inactive ones
pub async fn list_all_hero_images(
    State(app_state): State<AppState>,
    identity: Option<Extension<Identity>>,
) -> Result<Json<Value>, AppError> {
    require_admin(identity)?;
    let images = app_state.db.list_hero_images(false).await;

    Ok(Json(json!({
        "success": true,
        "heroImages": images,
        "total": images.len()
    })))
}

pub async fn create_hero_image(
    State(app_state): State<AppState>,
    identity: Option<Extension<Identity>>,
    payload: Result<Json<HeroImageFields>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let admin = require_admin(identity)?;
    let Json(fields) = payload?;
    let fields = validate_fields(fields)?;

    let image = app_state.db.insert_hero_image(HeroImage::new(fields)).await?;

    tracing::info!("Hero image {} created by {}", image.id, admin.user_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "heroImage": image
        })),
    ))
}

/// Full replace
pub async fn replace_hero_image(
    State(app_state): State<AppState>,
    identity: Option<Extension<Identity>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<HeroImageFields>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    require_admin(identity)?;
    let Path(id) = id?;
    let Json(fields) = payload?;
    let fields = validate_fields(fields)?;

    let image = app_state
        .db
        .update_hero_image(id, |image| image.replace(fields))
        .await?;

    Ok(Json(json!({
        "success": true,
        "heroImage": image
    })))
}

/// Partial update
pub async fn update_hero_image(
    State(app_state): State<AppState>,
    identity: Option<Extension<Identity>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<HeroImagePatch>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    require_admin(identity)?;
    let Path(id) = id?;
    let Json(patch) = payload?;
    let patch = validate_patch(patch)?;

    let image = app_state
        .db
        .update_hero_image(id, |image| image.apply(patch))
        .await?;

    Ok(Json(json!({
        "success": true,
        "heroImage": image
    })))
}

pub async fn delete_hero_image(
    State(app_state): State<AppState>,
    identity: Option<Extension<Identity>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(identity)?;
    let Path(id) = id?;

    app_state.db.delete_hero_image(id).await?;

    tracing::info!("Hero image {} deleted by {}", id, admin.user_id);

    Ok(Json(json!({
        "success": true,
        "message": "Hero image deleted"
    })))
}

fn validate_fields(mut fields: HeroImageFields) -> Result<HeroImageFields, AppError> {
    fields.title = validate_title(&fields.title)?;
    fields.image_url = validate_url("imageUrl", &fields.image_url)?;
    fields.link_url = match fields.link_url.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(link) => Some(validate_url("linkUrl", link)?),
    };
    fields.alt_text = fields.alt_text.trim().to_string();
    Ok(fields)
}

fn validate_patch(mut patch: HeroImagePatch) -> Result<HeroImagePatch, AppError> {
    if let Some(title) = &patch.title {
        patch.title = Some(validate_title(title)?);
    }
    if let Some(image_url) = &patch.image_url {
        patch.image_url = Some(validate_url("imageUrl", image_url)?);
    }
    if let Some(Some(link)) = &patch.link_url {
        patch.link_url = match link.trim() {
            "" => Some(None),
            link => Some(Some(validate_url("linkUrl", link)?)),
        };
    }
    if let Some(alt_text) = &patch.alt_text {
        patch.alt_text = Some(alt_text.trim().to_string());
    }
    Ok(patch)
}

fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation_failed("title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation_failed(format!(
            "title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

/// Site-relative paths or absolute http(s) URLs
fn validate_url(field: &str, url: &str) -> Result<String, AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::validation_failed(format!("{} is required", field)));
    }
    if url.len() > MAX_URL_LEN {
        return Err(AppError::validation_failed(format!("{} is too long", field)));
    }

    let relative = url.starts_with('/') && !url.starts_with("//");
    let absolute = url.starts_with("https://") || url.starts_with("http://");
    if !relative && !absolute {
        return Err(AppError::validation_failed(format!(
            "{} must be a site path or an http(s) URL",
            field
        )));
    }
    Ok(url.to_string())
}
