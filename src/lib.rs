// Library exports for testing and external use

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    routing::{get, post, put},
    Router,
};
use models::errors::AppError;
use services::{
    access_control::AccessPolicy, accounts, cart::CartRegistry, database::Database,
    file_storage::FileStorageService, session_manager::SessionManager,
};
use std::{sync::Arc, time::Duration};
use tower_http::services::ServeDir;
use utils::config::AppConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Database,
    pub storage: Arc<FileStorageService>,
    pub session_manager: Arc<SessionManager>,
    pub access_policy: Arc<AccessPolicy>,
    pub carts: Arc<CartRegistry>,
}

impl AppState {
    /// Opens the store, prepares upload storage and seeds the admin account
    pub async fn new(config: AppConfig) -> Result<Self, AppError> {
        let db = match &config.data_file {
            Some(path) => Database::open(path).await?,
            None => {
                tracing::warn!("DATA_FILE not set, data will not survive a restart");
                Database::in_memory()
            }
        };

        if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
            if accounts::ensure_admin(&db, email, password).await? {
                tracing::info!("Created admin account {}", email);
            }
        }

        let storage = FileStorageService::new(&config.upload_dir)?;
        let session_manager =
            SessionManager::with_expiry(Duration::from_secs(config.session_ttl_seconds));

        let carts = CartRegistry::new(&config.cart_dir);

        Ok(Self {
            config: Arc::new(config),
            db,
            storage: Arc::new(storage),
            session_manager: Arc::new(session_manager),
            access_policy: Arc::new(AccessPolicy::default()),
            carts: Arc::new(carts),
        })
    }
}

/// Builds the application router. Transport layers (trace, timeout, CORS)
/// are added by the binary.
pub fn build_router(app_state: AppState) -> Router {
    use handlers::{
        account, auth, cart, comments, health, hero_images, images, pages, payment, upload,
    };

    Router::new()
        // Health check endpoint
        .route("/health", get(health::health_check))
        .route("/api/health", get(health::health_check))
        // Hero images
        .route("/api/hero-images", get(hero_images::list_hero_images))
        .route("/api/hero-images/:id", get(hero_images::get_hero_image))
        .route(
            "/api/admin/hero-images",
            get(hero_images::list_all_hero_images).post(hero_images::create_hero_image),
        )
        .route(
            "/api/admin/hero-images/:id",
            put(hero_images::replace_hero_image)
                .patch(hero_images::update_hero_image)
                .delete(hero_images::delete_hero_image),
        )
        // Comments
        .route(
            "/api/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/api/comments/:id",
            axum::routing::patch(comments::update_comment).delete(comments::delete_comment),
        )
        // Uploads and the image proxy
        .route("/api/admin/uploads", post(upload::upload_image))
        .route("/api/images/*path", get(images::proxy_image))
        // Authentication
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::session))
        // Accounts
        .route("/api/mypage/profile", get(account::my_profile))
        .route(
            "/api/admin/account",
            get(account::get_admin_account).put(account::update_admin_account),
        )
        .route("/api/admin/password", put(account::change_admin_password))
        // Cart
        .route("/api/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/api/cart/items", post(cart::add_item))
        .route(
            "/api/cart/items/:product_id",
            axum::routing::patch(cart::update_quantity).delete(cart::remove_item),
        )
        // Payment
        .route("/api/payment/config", get(payment::payment_config))
        // Uploaded files
        .nest_service("/uploads", ServeDir::new(app_state.storage.upload_dir()))
        // Fallback route for the frontend
        .fallback(pages::fallback)
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            middleware::session_gate,
        ))
        .with_state(app_state)
}
