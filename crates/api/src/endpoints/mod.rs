//! API endpoints.

pub mod posts;

use axum::{Router, http::Uri, routing::get};

use crate::middleware::AppState;
use quill_common::AppError;

/// Welcome/health-check route.
async fn welcome() -> &'static str {
    "Welcome to the Blog API"
}

/// Catch-all for undefined routes, reporting the requested path.
async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.to_string())
}

/// Build the application router.
#[must_use]
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .nest("/api/posts", posts::router())
        .fallback(not_found)
}
