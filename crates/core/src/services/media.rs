//! Media service handle and test-friendly in-memory backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use quill_common::{AppResult, MediaStore, StoredImage, check_content_type, generate_image_key};

/// Type alias for the media service handle passed into operations.
pub type MediaService = Arc<dyn MediaStore>;

#[derive(Default)]
struct MemoryInner {
    objects: HashMap<String, Vec<u8>>,
    uploads: u64,
    deletes: u64,
}

/// In-memory media store.
///
/// Used as a substitute for the real media store in tests; counts the
/// upload/delete calls it receives so sequencing can be asserted.
#[derive(Default)]
pub struct MemoryMediaStore {
    inner: Mutex<MemoryInner>,
    folder: String,
}

impl MemoryMediaStore {
    /// Create a new in-memory media store uploading under `folder`.
    #[must_use]
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
            folder: folder.into(),
        }
    }

    /// Number of uploads performed.
    #[must_use]
    pub fn upload_count(&self) -> u64 {
        self.lock().uploads
    }

    /// Number of delete calls received.
    #[must_use]
    pub fn delete_count(&self) -> u64 {
        self.lock().deletes
    }

    /// Whether an object is currently stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().objects.contains_key(key)
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().objects.len()
    }

    /// Whether the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait::async_trait]
impl MediaStore for MemoryMediaStore {
    async fn upload(
        &self,
        data: &[u8],
        content_type: &str,
        original_name: &str,
    ) -> AppResult<StoredImage> {
        check_content_type(content_type)?;

        let key = generate_image_key(&self.folder, original_name);
        let md5 = format!("{:x}", md5::compute(data));

        let mut inner = self.lock();
        inner.uploads += 1;
        inner.objects.insert(key.clone(), data.to_vec());

        Ok(StoredImage {
            url: self.url_for(&key),
            key,
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut inner = self.lock();
        inner.deletes += 1;
        inner.objects.remove(key);
        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        format!("memory://{key}")
    }
}
