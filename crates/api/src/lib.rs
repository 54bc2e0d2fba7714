//! HTTP API layer for quill-rs.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: the post CRUD routes, the welcome route, and the
//!   not-found fallback
//! - **Middleware**: application state shared by all handlers
//! - **Responses**: small response-shaping helpers
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod middleware;
pub mod response;

pub use endpoints::router;
