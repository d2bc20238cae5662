use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Authentication required: {message}")]
    Unauthenticated { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("File exceeds the maximum size of {max_size} bytes")]
    PayloadTooLarge { max_size: usize },

    #[error("Unsupported media type: {message}")]
    UnsupportedMediaType { message: String },

    #[error("File upload error: {message}")]
    FileUploadError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Session error: {message}")]
    SessionError { message: String },

    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

/// JSON body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError { .. } | AppError::FileUploadError { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::StorageError { .. }
            | AppError::SessionError { .. }
            | AppError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts the error into the body sent to the client. Server-side
    /// failures never leak their details.
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            AppError::ValidationError { message } => ErrorResponse {
                error: "Validation failed".to_string(),
                message: message.clone(),
            },
            AppError::Unauthenticated { message } => ErrorResponse {
                error: "Unauthorized".to_string(),
                message: message.clone(),
            },
            AppError::Forbidden { message } => ErrorResponse {
                error: "Forbidden".to_string(),
                message: message.clone(),
            },
            AppError::NotFound { resource } => ErrorResponse {
                error: "Not found".to_string(),
                message: format!("{} not found", resource),
            },
            AppError::PayloadTooLarge { .. } => ErrorResponse {
                error: "File too large".to_string(),
                message: self.to_string(),
            },
            AppError::UnsupportedMediaType { message } => ErrorResponse {
                error: "Unsupported file format".to_string(),
                message: message.clone(),
            },
            AppError::FileUploadError { message } => ErrorResponse {
                error: "File upload failed".to_string(),
                message: message.clone(),
            },
            AppError::StorageError { .. }
            | AppError::SessionError { .. }
            | AppError::InternalError { .. } => ErrorResponse {
                error: "Internal server error".to_string(),
                message: "An unexpected error occurred".to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }

        (status, Json(self.to_response())).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation_failed(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::validation_failed(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation_failed(rejection.body_text())
    }
}

// Convenience functions for creating specific errors
impl AppError {
    pub fn validation_failed(message: impl Into<String>) -> Self {
        AppError::ValidationError { message: message.into() }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        AppError::Unauthenticated { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden { message: message.into() }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound { resource: resource.into() }
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        AppError::UnsupportedMediaType { message: message.into() }
    }

    pub fn file_upload_failed(message: impl Into<String>) -> Self {
        AppError::FileUploadError { message: message.into() }
    }

    pub fn storage_failed(message: impl Into<String>) -> Self {
        AppError::StorageError { message: message.into() }
    }

    pub fn session_error(message: impl Into<String>) -> Self {
        AppError::SessionError { message: message.into() }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        AppError::InternalError { message: message.into() }
    }
}
