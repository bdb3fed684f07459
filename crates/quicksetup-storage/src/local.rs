use crate::traits::{ObjectStoreClient, StorageError, StorageResult};
use crate::types::{ByteRange, ObjectChunk, ObjectListing, ObjectSummary};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use quicksetup_core::constants::LIST_PAGE_SIZE;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// Local filesystem object store
///
/// Each bucket is a directory under `base_path`; object keys map to files
/// below it, with `/` separating path components.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory holding one subdirectory per bucket
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn bucket_path(&self, bucket: &str) -> StorageResult<PathBuf> {
        if bucket.is_empty() || bucket.contains('/') || bucket.contains('\\') || bucket == ".."
        {
            return Err(StorageError::InvalidKey(format!(
                "Invalid bucket name: {:?}",
                bucket
            )));
        }
        Ok(self.base_path.join(bucket))
    }

    /// Convert an object key to a filesystem path, rejecting keys that could
    /// escape the bucket directory.
    fn key_to_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty()
            || key.starts_with('/')
            || key.split('/').any(|component| component == "..")
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.bucket_path(bucket)?.join(key))
    }

    async fn require_bucket(&self, bucket: &str) -> StorageResult<PathBuf> {
        let path = self.bucket_path(bucket)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NoSuchBucket(bucket.to_string()));
        }
        Ok(path)
    }

    /// Write an object, creating intermediate directories.
    ///
    /// Not part of [`ObjectStoreClient`]; used to seed buckets.
    pub async fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> StorageResult<()> {
        self.require_bucket(bucket).await?;
        let path = self.key_to_path(bucket, key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::BackendError(format!("Failed to create file {}: {}", path.display(), e))
        })?;
        file.write_all(data).await?;
        file.sync_all().await?;

        tracing::debug!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = data.len(),
            "Local storage put successful"
        );

        Ok(())
    }

    async fn collect_objects(&self, bucket_path: &Path) -> StorageResult<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut pending = vec![bucket_path.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let metadata = entry.metadata().await?;
                let path = entry.path();
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let relative = match path.strip_prefix(bucket_path) {
                    Ok(relative) => relative,
                    Err(_) => continue,
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                objects.push(ObjectSummary {
                    key,
                    size: metadata.len(),
                    last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                    e_tag: None,
                    storage_class: None,
                });
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}

#[async_trait]
impl ObjectStoreClient for LocalStorage {
    async fn create_bucket(&self, bucket: &str, location_constraint: &str) -> StorageResult<()> {
        let path = self.bucket_path(bucket)?;

        if fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::BucketAlreadyOwnedByYou(bucket.to_string()));
        }

        fs::create_dir_all(&path).await.map_err(|e| {
            StorageError::BackendError(format!(
                "Failed to create bucket directory {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            location = %location_constraint,
            "Local storage bucket created"
        );

        Ok(())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<ObjectListing> {
        let bucket_path = self.require_bucket(bucket).await?;
        let start = std::time::Instant::now();

        let mut objects: Vec<ObjectSummary> = self
            .collect_objects(&bucket_path)
            .await?
            .into_iter()
            .filter(|o| o.key.starts_with(prefix))
            .collect();

        let is_truncated = objects.len() > LIST_PAGE_SIZE;
        objects.truncate(LIST_PAGE_SIZE);

        tracing::info!(
            bucket = %bucket,
            prefix = %prefix,
            count = objects.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage list successful"
        );

        Ok(ObjectListing {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            objects,
            is_truncated,
        })
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<ObjectChunk> {
        self.require_bucket(bucket).await?;
        let path = self.key_to_path(bucket, key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, key)));
        }

        let mut file = fs::File::open(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;
        let size = file.metadata().await?.len();

        let body = match range {
            Some(range) => {
                if range.length == 0 || range.offset >= size {
                    return Err(StorageError::InvalidRange(format!(
                        "{}/{} ({} of {} bytes)",
                        bucket,
                        key,
                        range.header_value(),
                        size
                    )));
                }
                let length = range.length.min(size - range.offset);
                file.seek(SeekFrom::Start(range.offset)).await?;
                let mut buffer = Vec::with_capacity(length as usize);
                file.take(length).read_to_end(&mut buffer).await?;
                buffer
            }
            None => {
                let mut buffer = Vec::with_capacity(size as usize);
                file.read_to_end(&mut buffer).await?;
                buffer
            }
        };

        Ok(ObjectChunk {
            body: Bytes::from(body),
            total_size: Some(size),
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage_with_bucket(dir: &Path, bucket: &str) -> LocalStorage {
        let storage = LocalStorage::new(dir).await.unwrap();
        storage.create_bucket(bucket, "us-west-2").await.unwrap();
        storage
    }

    #[tokio::test]
    async fn test_create_bucket_twice_reports_owned() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path(), "models").await;

        let result = storage.create_bucket("models", "us-west-2").await;
        assert!(matches!(result, Err(StorageError::BucketAlreadyOwnedByYou(_))));
    }

    #[tokio::test]
    async fn test_put_and_get_whole_object() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path(), "models").await;

        storage
            .put_object("models", "dir/file.bin", b"payload")
            .await
            .unwrap();

        let chunk = storage.get_object("models", "dir/file.bin", None).await.unwrap();
        assert_eq!(&chunk.body[..], b"payload");
        assert_eq!(chunk.total_size, Some(7));
    }

    #[tokio::test]
    async fn test_ranged_get_clamps_to_object_end() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path(), "models").await;
        storage
            .put_object("models", "blob", b"0123456789")
            .await
            .unwrap();

        let chunk = storage
            .get_object("models", "blob", Some(ByteRange::new(8, 100)))
            .await
            .unwrap();
        assert_eq!(&chunk.body[..], b"89");
        assert_eq!(chunk.total_size, Some(10));

        let result = storage
            .get_object("models", "blob", Some(ByteRange::new(10, 5)))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidRange(_))));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path(), "models").await;

        let result = storage.get_object("models", "../../etc/passwd", None).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.get_object("models", "/etc/passwd", None).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.create_bucket("../outside", "us-west-2").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_missing_bucket_and_key() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path(), "models").await;

        let result = storage.get_object("models", "nope", None).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));

        let result = storage.list_objects("other", "").await;
        assert!(matches!(result, Err(StorageError::NoSuchBucket(_))));
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix_and_sorts() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path(), "models").await;
        for key in ["logs/b.txt", "logs/a.txt", "logs/nested/c.txt", "other/d.txt"] {
            storage.put_object("models", key, b"x").await.unwrap();
        }

        let listing = storage.list_objects("models", "logs/").await.unwrap();
        let keys: Vec<&str> = listing.keys().collect();
        assert_eq!(keys, vec!["logs/a.txt", "logs/b.txt", "logs/nested/c.txt"]);
        assert!(!listing.is_truncated);
        assert_eq!(listing.bucket, "models");
        assert_eq!(listing.prefix, "logs/");
    }

    #[tokio::test]
    async fn test_list_caps_page_and_flags_truncation() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path(), "models").await;
        for i in 0..=LIST_PAGE_SIZE {
            storage
                .put_object("models", &format!("parts/{:05}", i), b"")
                .await
                .unwrap();
        }

        let listing = storage.list_objects("models", "parts/").await.unwrap();
        assert!(listing.is_truncated);
        assert_eq!(listing.objects.len(), LIST_PAGE_SIZE);
        assert_eq!(listing.objects[0].key, "parts/00000");
        assert_eq!(listing.objects[LIST_PAGE_SIZE - 1].key, "parts/00999");

        let listing = storage.list_objects("models", "parts/0099").await.unwrap();
        assert!(!listing.is_truncated);
        assert_eq!(listing.objects.len(), 10);
    }
}
