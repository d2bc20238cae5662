use crate::models::errors::AppError;
use chrono::{DateTime, Datelike, Utc};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};
use tokio::fs as async_fs;
use uuid::Uuid;

/// A file written by [`FileStorageService::store_upload`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    /// Path relative to the upload root, always with `/` separators
    pub relative_path: String,
    pub file_name: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct FileStorageService {
    upload_dir: PathBuf,
}

impl FileStorageService {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let upload_dir = upload_dir.into();

        // Create the upload directory if it doesn't exist
        if !upload_dir.exists() {
            fs::create_dir_all(&upload_dir).map_err(|e| {
                AppError::storage_failed(format!("Failed to create upload directory: {}", e))
            })?;
        }

        Ok(Self { upload_dir })
    }

    /// Stores an uploaded file under `<YYYY>/<MM>/` with a generated name
    pub async fn store_upload(&self, data: &[u8], extension: &str) -> Result<StoredFile, AppError> {
        self.store_upload_at(data, extension, Utc::now()).await
    }

    pub async fn store_upload_at(
        &self,
        data: &[u8],
        extension: &str,
        now: DateTime<Utc>,
    ) -> Result<StoredFile, AppError> {
        let partition = format!("{:04}/{:02}", now.year(), now.month());
        let dir = self.upload_dir.join(now.year().to_string()).join(format!("{:02}", now.month()));

        async_fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::storage_failed(format!("Failed to create upload partition: {}", e))
        })?;

        let file_name = generate_file_name(now, extension);
        let file_path = dir.join(&file_name);

        async_fs::write(&file_path, data)
            .await
            .map_err(|e| AppError::storage_failed(format!("Failed to write upload: {}", e)))?;

        tracing::debug!("Stored upload: {}", file_path.display());

        Ok(StoredFile {
            relative_path: format!("{}/{}", partition, file_name),
            file_name,
            size: data.len(),
        })
    }

    /// Resolves a client-supplied relative path inside the upload root.
    /// Returns `None` for anything that could escape it.
    pub fn resolve(&self, relative_path: &str) -> Option<PathBuf> {
        sanitize_relative_path(relative_path).map(|path| self.upload_dir.join(path))
    }

    /// Reads a file by its relative path
    pub async fn read_upload(&self, relative_path: &str) -> Result<Vec<u8>, AppError> {
        let file_path = self
            .resolve(relative_path)
            .ok_or_else(|| AppError::validation_failed("Invalid file path"))?;

        match async_fs::read(&file_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::not_found("File")),
            // Directories and the like
            Err(_) if !file_path.is_file() => Err(AppError::not_found("File")),
            Err(e) => Err(AppError::storage_failed(format!("Failed to read upload: {}", e))),
        }
    }

    /// Get the upload directory path
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }
}

/// `<unix millis>-<8 random hex chars>.<ext>`
fn generate_file_name(now: DateTime<Utc>, extension: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    let extension: String = extension
        .trim_start_matches('.')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    format!("{}-{}.{}", now.timestamp_millis(), &random[..8], extension)
}

/// Accepts only plain relative paths made of normal components
pub fn sanitize_relative_path(raw: &str) -> Option<PathBuf> {
    if raw.is_empty() || raw.contains('\\') || raw.contains('\0') {
        return None;
    }

    let path = Path::new(raw);
    let mut clean = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if clean.as_os_str().is_empty() {
        None
    } else {
        Some(clean)
    }
}
