//! Post endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::get,
};
use quill_common::{AppError, AppResult};
use quill_core::{CreatePostInput, ImageUpload, PostFields, PostResponse, UpdatePostInput};

use crate::{
    middleware::AppState,
    response::{Created, MessageResponse},
};

/// The multipart field name uploads must arrive under.
const IMAGE_FIELD: &str = "image";

/// Decoded multipart form shared by create and edit.
#[derive(Debug, Default)]
struct PostForm {
    title: Option<String>,
    description: Option<String>,
    story: Option<String>,
    image: Option<ImageUpload>,
}

impl PostForm {
    /// Decode a multipart request body.
    ///
    /// Text fields other than the known ones are ignored; a *file* arriving
    /// under any field name other than `image` is a protocol misuse.
    async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();

            match name.as_str() {
                "title" => {
                    form.title = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| AppError::BadRequest(e.to_string()))?,
                    );
                }
                "description" => {
                    form.description = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| AppError::BadRequest(e.to_string()))?,
                    );
                }
                "story" => {
                    form.story = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| AppError::BadRequest(e.to_string()))?,
                    );
                }
                IMAGE_FIELD => {
                    let file_name = field
                        .file_name()
                        .map_or_else(|| "image".to_string(), std::string::ToString::to_string);
                    let content_type = field.content_type().map_or_else(
                        || "application/octet-stream".to_string(),
                        std::string::ToString::to_string,
                    );
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?
                        .to_vec();
                    form.image = Some(ImageUpload {
                        file_name,
                        content_type,
                        data,
                    });
                }
                _ => {
                    if field.file_name().is_some() {
                        return Err(AppError::UnexpectedFileField(IMAGE_FIELD.to_string()));
                    }
                }
            }
        }

        Ok(form)
    }

    fn into_fields_and_image(self) -> (PostFields, Option<ImageUpload>) {
        (
            PostFields {
                title: self.title.unwrap_or_default(),
                description: self.description.unwrap_or_default(),
                story: self.story.unwrap_or_default(),
            },
            self.image,
        )
    }
}

/// Create a new post.
async fn create_post(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Created<PostResponse>> {
    let (fields, image) = PostForm::from_multipart(multipart)
        .await?
        .into_fields_and_image();
    let post = state
        .post_service
        .create(CreatePostInput { fields, image })
        .await?;
    Ok(Created(post))
}

/// List all posts, most recently updated first.
async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<PostResponse>>> {
    let posts = state.post_service.list().await?;
    Ok(Json(posts))
}

/// Get a post by ID.
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PostResponse>> {
    let post = state.post_service.get(&id).await?;
    Ok(Json(post))
}

/// Edit a post.
async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<PostResponse>> {
    let (fields, image) = PostForm::from_multipart(multipart)
        .await?
        .into_fields_and_image();
    let post = state
        .post_service
        .update(&id, UpdatePostInput { fields, image })
        .await?;
    Ok(Json(post))
}

/// Delete a post.
async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<MessageResponse> {
    state.post_service.delete(&id).await?;
    Ok(MessageResponse::new("Post deleted successfully"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route(
            "/{id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
}
