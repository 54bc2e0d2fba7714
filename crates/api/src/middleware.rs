//! API middleware.

use quill_core::PostService;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Post lifecycle service.
    pub post_service: PostService,
}
