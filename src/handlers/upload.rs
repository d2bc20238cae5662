use crate::middleware::require_identity;
use crate::models::errors::AppError;
use crate::models::user::Identity;
use crate::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::Json,
    Extension,
};
use futures_util::TryStreamExt;
use multer::{Constraints, Multipart, SizeLimit};
use serde_json::{json, Value};

/// Fields that carry files; anything else in the form is ignored
const FILE_FIELDS: [&str; 2] = ["file", "image"];

/// Image formats accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Sniffs the format from the leading bytes of the file
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageFormat::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }

    /// Declared content type, used when the bytes are not recognised
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/gif" => Some(ImageFormat::Gif),
            "image/webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
        }
    }
}

/// Handle multipart image upload
pub async fn upload_image(
    State(app_state): State<AppState>,
    identity: Option<Extension<Identity>>,
    request: Request<Body>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let identity = require_identity(identity)?;
    if !identity.capabilities.can_upload {
        return Err(AppError::forbidden("Your account cannot upload files"));
    }

    let boundary = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| AppError::validation_failed("Missing or invalid multipart boundary"))?;

    let max_size = app_state.config.max_file_size;

    // Convert the request body to a stream
    let stream = request
        .into_body()
        .into_data_stream()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err));

    let constraints =
        Constraints::new().size_limit(SizeLimit::new().per_field(max_size as u64));
    let mut multipart = Multipart::with_constraints(stream, boundary, constraints);
    let mut uploaded_files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|m| m.to_string());

        tracing::debug!(
            "Processing field: {} (filename: {:?}, content_type: {:?})",
            name,
            filename,
            content_type
        );

        if !FILE_FIELDS.contains(&name.as_str()) {
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_size))?;

        if data.len() > max_size {
            return Err(AppError::PayloadTooLarge { max_size });
        }
        if data.is_empty() {
            return Err(AppError::file_upload_failed("Uploaded file is empty"));
        }

        let format = ImageFormat::detect(&data)
            .or_else(|| content_type.as_deref().and_then(ImageFormat::from_content_type))
            .ok_or_else(|| {
                AppError::unsupported_media_type(
                    "Only PNG, JPEG, GIF and WebP images are supported",
                )
            })?;

        let stored = app_state
            .storage
            .store_upload(&data, format.extension())
            .await?;

        tracing::info!(
            "Uploaded {} ({} bytes) for user {}",
            stored.relative_path,
            stored.size,
            identity.user_id
        );

        uploaded_files.push(json!({
            "url": format!("/uploads/{}", stored.relative_path),
            "path": stored.relative_path,
            "fileName": stored.file_name,
            "originalName": filename,
            "size": stored.size,
            "contentType": format.content_type()
        }));
    }

    if uploaded_files.is_empty() {
        return Err(AppError::file_upload_failed(
            "Please select an image file to upload",
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Files uploaded successfully",
            "files": uploaded_files
        })),
    ))
}

fn multipart_error(error: multer::Error, max_size: usize) -> AppError {
    match error {
        multer::Error::FieldSizeExceeded { .. } | multer::Error::StreamSizeExceeded { .. } => {
            AppError::PayloadTooLarge { max_size }
        }
        e => {
            tracing::warn!("Failed to read multipart data: {}", e);
            AppError::file_upload_failed(format!("Failed to parse uploaded file: {}", e))
        }
    }
}
