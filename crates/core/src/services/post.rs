//! Post service: lifecycle and media-consistency orchestration.

use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::entities::post;
use quill_db::repositories::PostRepository;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::media::MediaService;

/// Maximum accepted image size (10MB).
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

const REQUIRED_FIELDS_MESSAGE: &str = "Title, description, and story are required fields.";

/// The text fields carried by every create/edit request.
///
/// Validation happens here, once, before any store interaction; the database
/// schema's NOT NULL constraints are a backstop, not the validator.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostFields {
    /// Post title.
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    /// Short description.
    #[validate(length(min = 1))]
    pub description: String,
    /// Body content.
    #[validate(length(min = 1))]
    pub story: String,
}

/// An uploaded image file, as decoded from a multipart request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Original file name, used to derive the storage extension.
    pub file_name: String,
    /// MIME content type.
    pub content_type: String,
    /// Raw file bytes.
    pub data: Vec<u8>,
}

/// Input for creating a post.
#[derive(Debug)]
pub struct CreatePostInput {
    /// Required text fields.
    pub fields: PostFields,
    /// The image file; required, rejected when absent.
    pub image: Option<ImageUpload>,
}

/// Input for editing a post.
#[derive(Debug)]
pub struct UpdatePostInput {
    /// Required text fields; always overwritten in full.
    pub fields: PostFields,
    /// Replacement image, if one was supplied.
    pub image: Option<ImageUpload>,
}

/// Response for a post.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub story: String,
    pub image_url: String,
    pub image_key: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<post::Model> for PostResponse {
    fn from(p: post::Model) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            story: p.story,
            image_url: p.image_url,
            image_key: p.image_key,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

/// Service for managing posts and their stored images.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    media: MediaService,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(post_repo: PostRepository, media: MediaService) -> Self {
        Self {
            post_repo,
            media,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new post.
    ///
    /// Validates first, uploads the image, then persists. Nothing is
    /// uploaded or written when validation fails.
    pub async fn create(&self, input: CreatePostInput) -> AppResult<PostResponse> {
        input
            .fields
            .validate()
            .map_err(|_| AppError::BadRequest(REQUIRED_FIELDS_MESSAGE.to_string()))?;

        let image = input
            .image
            .ok_or_else(|| AppError::BadRequest("Image is required.".to_string()))?;
        check_image(&image)?;

        let stored = self
            .media
            .upload(&image.data, &image.content_type, &image.file_name)
            .await?;

        let now = chrono::Utc::now();
        let id = self.id_gen.generate();

        let model = post::ActiveModel {
            id: Set(id),
            title: Set(input.fields.title),
            description: Set(input.fields.description),
            story: Set(input.fields.story),
            image_url: Set(stored.url),
            image_key: Set(stored.key),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = self.post_repo.create(model).await?;
        Ok(created.into())
    }

    /// List all posts, most recently updated first.
    pub async fn list(&self) -> AppResult<Vec<PostResponse>> {
        let posts = self.post_repo.find_all_sorted().await?;
        Ok(posts.into_iter().map(Into::into).collect())
    }

    /// Get a post by ID.
    pub async fn get(&self, post_id: &str) -> AppResult<PostResponse> {
        let post = self.post_repo.get_by_id(post_id).await?;
        Ok(post.into())
    }

    /// Edit a post.
    ///
    /// Title, description, and story are overwritten unconditionally. When a
    /// replacement image is supplied, the previous stored image is deleted
    /// best-effort before the new one is uploaded; a deletion failure does
    /// not abort the edit.
    pub async fn update(&self, post_id: &str, input: UpdatePostInput) -> AppResult<PostResponse> {
        input
            .fields
            .validate()
            .map_err(|_| AppError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()))?;

        let post = self.post_repo.get_by_id(post_id).await?;
        let previous_key = post.image_key.clone();
        let mut active: post::ActiveModel = post.into();

        if let Some(image) = input.image {
            check_image(&image)?;

            if let Err(e) = self.media.delete(&previous_key).await {
                tracing::warn!(
                    post_id = %post_id,
                    image_key = %previous_key,
                    error = %e,
                    "Failed to delete old image from media store, continuing with replacement"
                );
            }

            let stored = self
                .media
                .upload(&image.data, &image.content_type, &image.file_name)
                .await?;
            active.image_url = Set(stored.url);
            active.image_key = Set(stored.key);
        }

        active.title = Set(input.fields.title);
        active.description = Set(input.fields.description);
        active.story = Set(input.fields.story);
        active.updated_at = Set(chrono::Utc::now().into());

        let updated = self.post_repo.update(active).await?;
        Ok(updated.into())
    }

    /// Delete a post.
    ///
    /// Attempts best-effort deletion of the stored image before removing the
    /// record. Deleting an absent post reports not-found, including on the
    /// second of two racing deletes.
    pub async fn delete(&self, post_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if !post.image_key.is_empty()
            && let Err(e) = self.media.delete(&post.image_key).await
        {
            tracing::warn!(
                post_id = %post_id,
                image_key = %post.image_key,
                error = %e,
                "Failed to delete image from media store, proceeding with record deletion"
            );
        }

        let removed = self.post_repo.delete(post_id).await?;
        if !removed {
            // Lost the race with a concurrent delete
            return Err(AppError::PostNotFound);
        }
        Ok(())
    }
}

fn check_image(image: &ImageUpload) -> AppResult<()> {
    if image.data.is_empty() {
        return Err(AppError::BadRequest("File is empty".to_string()));
    }
    if image.data.len() > MAX_IMAGE_SIZE {
        return Err(AppError::BadRequest(format!(
            "File too large. Maximum size is {MAX_IMAGE_SIZE} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::media::MemoryMediaStore;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_fields(title: &str) -> PostFields {
        PostFields {
            title: title.to_string(),
            description: "A short description".to_string(),
            story: "Once upon a time".to_string(),
        }
    }

    fn test_image() -> ImageUpload {
        ImageUpload {
            file_name: "photo.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            data: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }
    }

    fn test_post(id: &str, image_key: &str) -> post::Model {
        let now = Utc::now();
        post::Model {
            id: id.to_string(),
            title: "A title".to_string(),
            description: "A short description".to_string(),
            story: "Once upon a time".to_string(),
            image_url: format!("memory://{image_key}"),
            image_key: image_key.to_string(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn service_with(
        db: sea_orm::DatabaseConnection,
        media: Arc<MemoryMediaStore>,
    ) -> PostService {
        let repo = PostRepository::new(Arc::new(db));
        PostService::new(repo, media)
    }

    #[tokio::test]
    async fn test_create_uploads_then_persists() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post("p1", "blog-images/a.jpg")]])
            .into_connection();
        let media = Arc::new(MemoryMediaStore::new("blog-images"));
        let service = service_with(db, media.clone());

        let created = service
            .create(CreatePostInput {
                fields: test_fields("A title"),
                image: Some(test_image()),
            })
            .await
            .unwrap();

        assert_eq!(created.title, "A title");
        assert!(!created.image_url.is_empty());
        assert!(!created.image_key.is_empty());
        assert_eq!(media.upload_count(), 1);
        assert_eq!(media.len(), 1);
    }

    #[tokio::test]
    async fn test_create_missing_title_skips_upload() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let media = Arc::new(MemoryMediaStore::new("blog-images"));
        let service = service_with(db, media.clone());

        let result = service
            .create(CreatePostInput {
                fields: test_fields(""),
                image: Some(test_image()),
            })
            .await;

        match result {
            Err(AppError::BadRequest(msg)) => {
                assert_eq!(msg, "Title, description, and story are required fields.");
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
        assert_eq!(media.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_create_without_image_skips_upload() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let media = Arc::new(MemoryMediaStore::new("blog-images"));
        let service = service_with(db, media.clone());

        let result = service
            .create(CreatePostInput {
                fields: test_fields("A title"),
                image: None,
            })
            .await;

        match result {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Image is required."),
            other => panic!("expected BadRequest, got {other:?}"),
        }
        assert_eq!(media.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_create_empty_file_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let media = Arc::new(MemoryMediaStore::new("blog-images"));
        let service = service_with(db, media.clone());

        let result = service
            .create(CreatePostInput {
                fields: test_fields("A title"),
                image: Some(ImageUpload {
                    data: Vec::new(),
                    ..test_image()
                }),
            })
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(media.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();
        let media = Arc::new(MemoryMediaStore::new("blog-images"));
        let service = service_with(db, media);

        let result = service.get("absent").await;
        assert!(matches!(result, Err(AppError::PostNotFound)));
    }

    #[tokio::test]
    async fn test_update_missing_fields_is_validation_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let media = Arc::new(MemoryMediaStore::new("blog-images"));
        let service = service_with(db, media.clone());

        let result = service
            .update(
                "p1",
                UpdatePostInput {
                    fields: PostFields {
                        title: "A title".to_string(),
                        description: String::new(),
                        story: "Story".to_string(),
                    },
                    image: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(media.delete_count(), 0);
        assert_eq!(media.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_update_with_new_image_replaces_old() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![test_post("p1", "blog-images/old.jpg")],
                vec![test_post("p1", "blog-images/new.jpg")],
            ])
            .into_connection();
        let media = Arc::new(MemoryMediaStore::new("blog-images"));
        let service = service_with(db, media.clone());

        let updated = service
            .update(
                "p1",
                UpdatePostInput {
                    fields: test_fields("Edited title"),
                    image: Some(test_image()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.image_key, "blog-images/new.jpg");
        // Old key deleted exactly once, replacement uploaded exactly once
        assert_eq!(media.delete_count(), 1);
        assert_eq!(media.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_update_without_image_keeps_reference() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![test_post("p1", "blog-images/old.jpg")],
                vec![test_post("p1", "blog-images/old.jpg")],
            ])
            .into_connection();
        let media = Arc::new(MemoryMediaStore::new("blog-images"));
        let service = service_with(db, media.clone());

        let updated = service
            .update(
                "p1",
                UpdatePostInput {
                    fields: test_fields("Edited title"),
                    image: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.image_key, "blog-images/old.jpg");
        assert_eq!(media.delete_count(), 0);
        assert_eq!(media.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_image_then_record() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post("p1", "blog-images/a.jpg")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let media = Arc::new(MemoryMediaStore::new("blog-images"));
        let service = service_with(db, media.clone());

        service.delete("p1").await.unwrap();
        assert_eq!(media.delete_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();
        let media = Arc::new(MemoryMediaStore::new("blog-images"));
        let service = service_with(db, media.clone());

        let result = service.delete("absent").await;
        assert!(matches!(result, Err(AppError::PostNotFound)));
        assert_eq!(media.delete_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_lost_race_is_not_found() {
        // The lookup still sees the post, but the row is gone by the time
        // the delete statement runs.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post("p1", "blog-images/a.jpg")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let media = Arc::new(MemoryMediaStore::new("blog-images"));
        let service = service_with(db, media);

        let result = service.delete("p1").await;
        assert!(matches!(result, Err(AppError::PostNotFound)));
    }
}
