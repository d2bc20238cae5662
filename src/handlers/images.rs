use crate::models::errors::AppError;
use crate::AppState;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use mime::Mime;
use std::path::Path as FsPath;

const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Streams a stored upload back with an image content type
pub async fn proxy_image(
    State(app_state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(path) = path?;
    let data = app_state.storage.read_upload(&path).await?;

    let content_type = HeaderValue::from_str(content_type_for(&path).as_ref())
        .map_err(|e| AppError::internal_error(format!("Invalid content type: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL)),
        ],
        data,
    )
        .into_response())
}

fn content_type_for(path: &str) -> Mime {
    let extension = FsPath::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => mime::IMAGE_PNG,
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("webp") => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}
