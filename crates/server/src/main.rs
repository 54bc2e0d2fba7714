//! Quill-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use quill_api::{middleware::AppState, router};
use quill_common::{Config, LocalMediaStore, config::StorageSettings};
use quill_core::{MediaService, PostService};
use quill_db::repositories::PostRepository;
use tokio::signal;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Request bodies may carry one image plus form fields.
const MAX_BODY_SIZE: usize = 12 * 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
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
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Build the media store from configuration.
async fn build_media_store(config: &Config) -> Result<MediaService, Box<dyn std::error::Error>> {
    match &config.storage {
        StorageSettings::Local {
            base_path,
            base_url,
            folder,
        } => Ok(Arc::new(LocalMediaStore::new(
            base_path.clone(),
            base_url.clone(),
            folder.clone(),
        ))),
        #[cfg(feature = "s3")]
        StorageSettings::S3 {
            endpoint,
            bucket,
            region,
            access_key_id,
            secret_access_key,
            public_url,
            folder,
        } => Ok(Arc::new(
            quill_common::storage::S3MediaStore::new(
                endpoint,
                bucket.clone(),
                region,
                access_key_id,
                secret_access_key,
                public_url.clone(),
                folder.clone(),
            )
            .await?,
        )),
        #[cfg(not(feature = "s3"))]
        StorageSettings::S3 { .. } => {
            Err("S3 storage configured but the server was built without the `s3` feature".into())
        }
    }
}

/// Build the CORS layer from the configured origin list.
fn build_cors(config: &Config) -> CorsLayer {
    if config.server.allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting quill-rs server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = quill_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    quill_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize media store
    let media = build_media_store(&config).await?;
    info!(folder = config.storage.folder(), "Media store initialized");

    // Initialize repository and service
    let db = Arc::new(db);
    let post_repo = PostRepository::new(Arc::clone(&db));
    let post_service = PostService::new(post_repo, media);

    // Create app state
    let state = AppState { post_service };

    // Build router
    let app = router()
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&config))
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
