//! Core business logic for quill-rs.
//!
//! The post lifecycle and media-consistency orchestration lives here:
//! validation, media upload/delete sequencing, and persistence calls.

pub mod services;

pub use services::media::{MediaService, MemoryMediaStore};
pub use services::post::{
    CreatePostInput, ImageUpload, PostFields, PostResponse, PostService, UpdatePostInput,
};
