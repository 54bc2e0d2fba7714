//! Database entities.

#![allow(missing_docs)]

pub mod post;

pub use post::Entity as Post;
