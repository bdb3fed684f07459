//! Object store abstraction trait
//!
//! This module defines the capability every storage backend must provide:
//! bucket creation, single-page listing, and (optionally ranged) object reads.

use crate::types::{ByteRange, ObjectChunk, ObjectListing};
use crate::StorageBackend;
use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Bucket already owned by you: {0}")]
    BucketAlreadyOwnedByYou(String),

    #[error("Bucket already exists: {0}")]
    BucketAlreadyExists(String),

    #[error("Bucket not found: {0}")]
    NoSuchBucket(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Requested range not satisfiable: {0}")]
    InvalidRange(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// True for the two create-bucket outcomes that mean the bucket is
    /// already in place.
    pub fn is_bucket_already_present(&self) -> bool {
        matches!(
            self,
            StorageError::BucketAlreadyOwnedByYou(_) | StorageError::BucketAlreadyExists(_)
        )
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Object store client trait
///
/// The gateway only ever talks to storage through this trait, so any provider
/// implementing these operations can be substituted, including in-memory
/// fakes in tests.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Create a bucket in the given location.
    ///
    /// Backends report an existing bucket as
    /// [`StorageError::BucketAlreadyOwnedByYou`] or
    /// [`StorageError::BucketAlreadyExists`] rather than succeeding silently;
    /// deciding that those are fine is the caller's business.
    async fn create_bucket(&self, bucket: &str, location_constraint: &str) -> StorageResult<()>;

    /// List objects under a prefix. Returns a single page; `is_truncated` on
    /// the listing tells whether the backend had more.
    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<ObjectListing>;

    /// Read an object, or the given byte range of it.
    ///
    /// A range that starts at or past the end of the object yields
    /// [`StorageError::InvalidRange`].
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<ObjectChunk>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
