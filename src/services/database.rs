use crate::models::content::{Comment, HeroImage};
use crate::models::errors::AppError;
use crate::models::user::User;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::fs as async_fs;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    #[serde(default)]
    users: HashMap<Uuid, User>,
    #[serde(default)]
    hero_images: HashMap<Uuid, HeroImage>,
    #[serde(default)]
    comments: HashMap<Uuid, Comment>,
}

/// Shared handle to the application tables.
///
/// When opened with a snapshot path every write is applied to a copy of the
/// tables, written to disk, and only then made visible, so a failed write
/// leaves the previous state in place.
#[derive(Debug, Clone)]
pub struct Database {
    tables: Arc<RwLock<Tables>>,
    snapshot_path: Option<PathBuf>,
}

impl Database {
    /// Creates a database that only lives in memory
    pub fn in_memory() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            snapshot_path: None,
        }
    }

    /// Opens a database backed by a JSON snapshot file, loading it if present
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();

        let tables = match async_fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Tables>(&bytes).map_err(|e| {
                AppError::storage_failed(format!(
                    "Failed to parse data file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Data file {} not found, starting empty", path.display());
                Tables::default()
            }
            Err(e) => {
                return Err(AppError::storage_failed(format!(
                    "Failed to read data file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::info!(
            "Loaded {} users, {} hero images, {} comments",
            tables.users.len(),
            tables.hero_images.len(),
            tables.comments.len()
        );

        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
            snapshot_path: Some(path),
        })
    }

    async fn write<T>(
        &self,
        apply: impl FnOnce(&mut Tables) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut tables = self.tables.write().await;

        let Some(path) = &self.snapshot_path else {
            return apply(&mut *tables);
        };

        let mut next = tables.clone();
        let result = apply(&mut next)?;
        persist(path, &next).await?;
        *tables = next;

        Ok(result)
    }

    // Users

    pub async fn find_user(&self, id: Uuid) -> Option<User> {
        let tables = self.tables.read().await;
        tables.users.get(&id).cloned()
    }

    pub async fn find_user_by_email(&self, email: &str) -> Option<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    pub async fn user_count(&self) -> usize {
        let tables = self.tables.read().await;
        tables.users.len()
    }

    /// Inserts a user, rejecting an email that is already registered
    pub async fn insert_user(&self, user: User) -> Result<User, AppError> {
        self.write(|tables| {
            ensure_email_free(tables, &user.email, None)?;
            tables.users.insert(user.id, user.clone());
            Ok(user)
        })
        .await
    }

    pub async fn update_user_account(
        &self,
        id: Uuid,
        name: String,
        email: String,
    ) -> Result<User, AppError> {
        self.write(|tables| {
            ensure_email_free(tables, &email, Some(id))?;
            let user = tables
                .users
                .get_mut(&id)
                .ok_or_else(|| AppError::not_found("User"))?;

            user.name = name;
            user.email = email;
            user.updated_at = Utc::now();
            Ok(user.clone())
        })
        .await
    }

    pub async fn update_password_hash(&self, id: Uuid, password_hash: String) -> Result<(), AppError> {
        self.write(|tables| {
            let user = tables
                .users
                .get_mut(&id)
                .ok_or_else(|| AppError::not_found("User"))?;

            user.password_hash = password_hash;
            user.updated_at = Utc::now();
            Ok(())
        })
        .await
    }

    // Hero images

    /// Lists hero images by sort order, oldest first within the same order
    pub async fn list_hero_images(&self, active_only: bool) -> Vec<HeroImage> {
        let tables = self.tables.read().await;
        let mut images: Vec<HeroImage> = tables
            .hero_images
            .values()
            .filter(|image| !active_only || image.is_active)
            .cloned()
            .collect();

        images.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then(a.created_at.cmp(&b.created_at))
        });
        images
    }

    pub async fn get_hero_image(&self, id: Uuid) -> Option<HeroImage> {
        let tables = self.tables.read().await;
        tables.hero_images.get(&id).cloned()
    }

    pub async fn insert_hero_image(&self, image: HeroImage) -> Result<HeroImage, AppError> {
        self.write(|tables| {
            tables.hero_images.insert(image.id, image.clone());
            Ok(image)
        })
        .await
    }

    pub async fn update_hero_image(
        &self,
        id: Uuid,
        update: impl FnOnce(&mut HeroImage),
    ) -> Result<HeroImage, AppError> {
        self.write(|tables| {
            let image = tables
                .hero_images
                .get_mut(&id)
                .ok_or_else(|| AppError::not_found("Hero image"))?;

            update(image);
            Ok(image.clone())
        })
        .await
    }

    pub async fn delete_hero_image(&self, id: Uuid) -> Result<HeroImage, AppError> {
        self.write(|tables| {
            tables
                .hero_images
                .remove(&id)
                .ok_or_else(|| AppError::not_found("Hero image"))
        })
        .await
    }

    // Comments

    /// Lists the comments of a post, oldest first
    pub async fn list_comments(&self, post_slug: &str) -> Vec<Comment> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|comment| comment.post_slug == post_slug)
            .cloned()
            .collect();

        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        comments
    }

    pub async fn get_comment(&self, id: Uuid) -> Option<Comment> {
        let tables = self.tables.read().await;
        tables.comments.get(&id).cloned()
    }

    pub async fn insert_comment(&self, comment: Comment) -> Result<Comment, AppError> {
        self.write(|tables| {
            tables.comments.insert(comment.id, comment.clone());
            Ok(comment)
        })
        .await
    }

    pub async fn update_comment_body(&self, id: Uuid, body: String) -> Result<Comment, AppError> {
        self.write(|tables| {
            let comment = tables
                .comments
                .get_mut(&id)
                .ok_or_else(|| AppError::not_found("Comment"))?;

            comment.body = body;
            comment.updated_at = Utc::now();
            Ok(comment.clone())
        })
        .await
    }

    pub async fn delete_comment(&self, id: Uuid) -> Result<Comment, AppError> {
        self.write(|tables| {
            tables
                .comments
                .remove(&id)
                .ok_or_else(|| AppError::not_found("Comment"))
        })
        .await
    }
}

fn ensure_email_free(tables: &Tables, email: &str, except: Option<Uuid>) -> Result<(), AppError> {
    let taken = tables
        .users
        .values()
        .any(|user| Some(user.id) != except && user.email.eq_ignore_ascii_case(email));

    if taken {
        return Err(AppError::validation_failed(
            "An account with this email already exists",
        ));
    }
    Ok(())
}

async fn persist(path: &Path, tables: &Tables) -> Result<(), AppError> {
    let bytes = serde_json::to_vec_pretty(tables)
        .map_err(|e| AppError::storage_failed(format!("Failed to serialize data: {}", e)))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::storage_failed(format!("Failed to create data directory: {}", e)))?;
    }

    let tmp_path = path.with_extension("tmp");
    async_fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| AppError::storage_failed(format!("Failed to write data file: {}", e)))?;
    async_fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AppError::storage_failed(format!("Failed to replace data file: {}", e)))?;

    tracing::debug!("Persisted data snapshot to {}", path.display());
    Ok(())
}
