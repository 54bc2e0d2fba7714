//! Database repositories.

#![allow(missing_docs)]

mod post;

pub use post::PostRepository;
