use axum::http::{HeaderValue, Method};
use patient_shop::{build_router, utils::config::AppConfig, AppState};
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "patient_shop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting patient information and shop server");

    // Load configuration
    let config = AppConfig::from_env();
    tracing::info!(
        "Configuration loaded: bind={}, upload_dir={}, cart_dir={}, data_file={:?}",
        config.bind_address(),
        config.upload_dir,
        config.cart_dir,
        config.data_file
    );

    let app_state = AppState::new(config.clone()).await.map_err(|e| {
        tracing::error!("Failed to initialize application state: {}", e);
        e
    })?;

    // Start cleanup task for expired sessions and abandoned carts
    let cleanup_sessions = app_state.session_manager.clone();
    let cleanup_carts = app_state.carts.clone();
    let cart_ttl = Duration::from_secs(config.cart_ttl_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600)); // Run every hour
        loop {
            interval.tick().await;
            let removed = cleanup_sessions.cleanup_expired_sessions().await;
            if removed > 0 {
                tracing::info!("Removed {} expired sessions", removed);
            }

            let carts = cleanup_carts.clone();
            match tokio::task::spawn_blocking(move || carts.remove_stale(cart_ttl)).await {
                Ok(Ok(0)) => {}
                Ok(Ok(removed)) => tracing::info!("Removed {} stale carts", removed),
                Ok(Err(e)) => tracing::warn!("Cart cleanup failed: {}", e),
                Err(e) => tracing::error!("Cart cleanup task failed: {}", e),
            }
        }
    });

    let app = build_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_seconds,
            )))
            .layer(cors_layer(&config.cors_origins)),
    );

    // Parse the bind address
    let addr: SocketAddr = config.bind_address().parse()?;
    tracing::info!("Server listening on {}", addr);

    // Create the server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ]);

    if origins.iter().any(|origin| origin == "*") {
        return cors.allow_headers(Any).allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();

    cors.allow_headers([
        axum::http::header::CONTENT_TYPE,
        axum::http::header::ACCEPT,
    ])
    .allow_credentials(true)
    .allow_origin(AllowOrigin::list(origins))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
