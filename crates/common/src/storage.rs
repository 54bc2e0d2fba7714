//! Media store abstraction for image uploads.
//!
//! Supports both local filesystem and S3-compatible object storage.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Content types accepted for uploaded images.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// A stored image, as returned by [`MediaStore::upload`].
///
/// `key` is the store's public identifier for the object; it is the handle
/// used to address and delete the stored image later.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// Storage key (path or object key).
    pub key: String,
    /// Public URL to access the image.
    pub url: String,
    /// Image size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
    /// MD5 hash of the image data.
    pub md5: String,
}

/// Media store trait.
#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload an image and return its stored reference.
    ///
    /// The store assigns the key; callers keep it alongside the URL to be
    /// able to delete the object later.
    async fn upload(
        &self,
        data: &[u8],
        content_type: &str,
        original_name: &str,
    ) -> AppResult<StoredImage>;

    /// Delete a stored image by key.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn url_for(&self, key: &str) -> String;
}

/// Rejects content types outside the accepted image formats.
pub fn check_content_type(content_type: &str) -> AppResult<()> {
    if ALLOWED_IMAGE_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Only jpg, jpeg, and png images are allowed.".to_string(),
        ))
    }
}

/// Local filesystem media store.
pub struct LocalMediaStore {
    base_path: PathBuf,
    base_url: String,
    folder: String,
}

impl LocalMediaStore {
    /// Create a new local media store.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String, folder: String) -> Self {
        Self {
            base_path,
            base_url,
            folder,
        }
    }
}

#[async_trait::async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(
        &self,
        data: &[u8],
        content_type: &str,
        original_name: &str,
    ) -> AppResult<StoredImage> {
        check_content_type(content_type)?;

        let key = generate_image_key(&self.folder, original_name);
        let path = self.base_path.join(&key);

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        // Write file
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        // Calculate MD5
        let md5 = format!("{:x}", md5::compute(data));

        Ok(StoredImage {
            url: self.url_for(&key),
            key,
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        if path.exists() {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

/// S3-compatible media store.
#[cfg(feature = "s3")]
pub struct S3MediaStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: Option<String>,
    folder: String,
}

#[cfg(feature = "s3")]
impl S3MediaStore {
    /// Create a new S3 media store.
    pub async fn new(
        endpoint: &str,
        bucket: String,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
        public_url: Option<String>,
        folder: String,
    ) -> AppResult<Self> {
        use aws_config::Region;
        use aws_sdk_s3::config::Credentials;

        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "quill-rs");

        let config = aws_sdk_s3::Config::builder()
            .endpoint_url(endpoint)
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = aws_sdk_s3::Client::from_conf(config);

        Ok(Self {
            client,
            bucket,
            public_url,
            folder,
        })
    }
}

#[cfg(feature = "s3")]
#[async_trait::async_trait]
impl MediaStore for S3MediaStore {
    async fn upload(
        &self,
        data: &[u8],
        content_type: &str,
        original_name: &str,
    ) -> AppResult<StoredImage> {
        use aws_sdk_s3::primitives::ByteStream;

        check_content_type(content_type)?;

        let key = generate_image_key(&self.folder, original_name);
        let md5 = format!("{:x}", md5::compute(data));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        Ok(StoredImage {
            url: self.url_for(&key),
            key,
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete failed: {e}")))?;

        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        match &self.public_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, key),
        }
    }
}

/// Generate a unique storage key for an uploaded image.
#[must_use]
pub fn generate_image_key(folder: &str, original_name: &str) -> String {
    use chrono::Utc;

    let now = Utc::now();
    let date_path = now.format("%Y/%m/%d").to_string();
    let timestamp = now.timestamp_millis();

    // Extract extension from original name
    let extension = original_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < original_name.len() - 1)
        .map(|pos| &original_name[pos + 1..])
        .filter(|ext| ext.len() <= 10 && ext.chars().all(char::is_alphanumeric))
        .unwrap_or("bin");

    format!(
        "{}/{}/{}_{}.{}",
        folder.trim_end_matches('/'),
        date_path,
        timestamp,
        uuid::Uuid::new_v4(),
        extension
    )
}
