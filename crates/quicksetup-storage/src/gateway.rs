//! Storage gateway
//!
//! Bootstrap-time helpers on top of an [`ObjectStoreClient`]: make sure a
//! bucket exists, pull a single object onto local disk, and list what lives
//! under a prefix. Each call is independent; the gateway keeps no state besides
//! its client and options.

use crate::traits::{ObjectStoreClient, StorageError};
use crate::transfer::Downloader;
use crate::types::ObjectListing;
use quicksetup_core::constants::{DEFAULT_BUCKET_PREFIX, DEFAULT_REGION, DEFAULT_TEMP_DIR_PREFIX};
use quicksetup_core::SetupConfig;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;

/// Gateway operation errors
///
/// Every variant names what was being worked on so callers can report the
/// failure without extra context.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("An account id is required to derive the default bucket name")]
    MissingAccountId,

    #[error("Failed to create bucket {bucket}: {source}")]
    CreateBucket {
        bucket: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create file {}: {source}", .path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create temp directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("Object key {0:?} cannot be used as a local path")]
    InvalidKey(String),

    #[error("Failed to download object {key} from bucket {bucket}: {source}")]
    Download {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to list objects in bucket {bucket} for prefix {prefix}: {source}")]
    List {
        bucket: String,
        prefix: String,
        #[source]
        source: StorageError,
    },
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Knobs for [`StorageGateway`].
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Prefix of bucket names derived from an account id.
    pub bucket_prefix: String,
    /// Location constraint sent with create-bucket.
    pub location_constraint: String,
    /// Prefix of temp directories used by `download_object_to_temp_location`.
    pub temp_dir_prefix: String,
    pub downloader: Downloader,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        GatewayOptions {
            bucket_prefix: DEFAULT_BUCKET_PREFIX.to_string(),
            location_constraint: DEFAULT_REGION.to_string(),
            temp_dir_prefix: DEFAULT_TEMP_DIR_PREFIX.to_string(),
            downloader: Downloader::default(),
        }
    }
}

impl From<&SetupConfig> for GatewayOptions {
    fn from(config: &SetupConfig) -> Self {
        GatewayOptions {
            bucket_prefix: config.bucket_prefix.clone(),
            location_constraint: config.region.clone(),
            temp_dir_prefix: config.temp_dir_prefix.clone(),
            downloader: Downloader::new(
                config.download_part_size_bytes,
                config.download_concurrency,
            ),
        }
    }
}

/// Façade over an object store for one-shot setup tasks.
#[derive(Clone)]
pub struct StorageGateway {
    client: Arc<dyn ObjectStoreClient>,
    options: GatewayOptions,
}

impl StorageGateway {
    pub fn new(client: Arc<dyn ObjectStoreClient>, options: GatewayOptions) -> Self {
        StorageGateway { client, options }
    }

    pub fn with_defaults(client: Arc<dyn ObjectStoreClient>) -> Self {
        Self::new(client, GatewayOptions::default())
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    /// Bucket name used when the caller does not supply one.
    pub fn default_bucket_name(&self, account_id: &str) -> String {
        format!("{}-{}", self.options.bucket_prefix, account_id)
    }

    /// Create `bucket_name` unless it is already there, returning the name.
    ///
    /// An empty `bucket_name` is replaced by `<bucket_prefix>-<account_id>`.
    /// "Already owned by you" and "already exists" are both treated as
    /// success.
    pub async fn ensure_bucket(&self, bucket_name: &str, account_id: &str) -> GatewayResult<String> {
        let bucket = if bucket_name.is_empty() {
            if account_id.is_empty() {
                return Err(GatewayError::MissingAccountId);
            }
            self.default_bucket_name(account_id)
        } else {
            bucket_name.to_string()
        };

        match self
            .client
            .create_bucket(&bucket, &self.options.location_constraint)
            .await
        {
            Ok(()) => Ok(bucket),
            Err(e) if e.is_bucket_already_present() => {
                tracing::info!(bucket = %bucket, reason = %e, "Bucket already present");
                Ok(bucket)
            }
            Err(source) => Err(GatewayError::CreateBucket { bucket, source }),
        }
    }

    /// Download `bucket/key` to `destination`, creating missing parent
    /// directories and truncating any existing file. Returns `destination`.
    ///
    /// A partially written file is left in place if the transfer fails.
    pub async fn download_object_to_path(
        &self,
        bucket: &str,
        key: &str,
        destination: impl Into<PathBuf>,
    ) -> GatewayResult<PathBuf> {
        let destination = destination.into();
        let start = std::time::Instant::now();

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| GatewayError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let mut file =
            fs::File::create(&destination)
                .await
                .map_err(|source| GatewayError::CreateFile {
                    path: destination.clone(),
                    source,
                })?;

        let size = self
            .options
            .downloader
            .download(self.client.as_ref(), bucket, key, &mut file)
            .await
            .map_err(|source| GatewayError::Download {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            path = %destination.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object downloaded"
        );

        Ok(destination)
    }

    /// Download `bucket/key` into a fresh temp directory, keeping the key's
    /// path structure below it. The directory is not cleaned up.
    pub async fn download_object_to_temp_location(
        &self,
        bucket: &str,
        key: &str,
    ) -> GatewayResult<PathBuf> {
        let relative = key_to_relative_path(key)?;

        let temp_dir = tempfile::Builder::new()
            .prefix(&self.options.temp_dir_prefix)
            .tempdir()
            .map_err(GatewayError::TempDir)?
            .keep();

        self.download_object_to_path(bucket, key, temp_dir.join(relative))
            .await
    }

    /// List one page of objects under `prefix`, exactly as the backend
    /// reports them.
    ///
    /// Listings are not paginated. When the backend has more than one page,
    /// `is_truncated` is set on the result and a warning is logged.
    pub async fn list_objects_by_prefix(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> GatewayResult<ObjectListing> {
        let listing = self
            .client
            .list_objects(bucket, prefix)
            .await
            .map_err(|source| GatewayError::List {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
                source,
            })?;

        if listing.is_truncated {
            tracing::warn!(
                bucket = %bucket,
                prefix = %prefix,
                returned = listing.objects.len(),
                "Listing truncated to a single page"
            );
        }

        Ok(listing)
    }
}

/// Turn an object key into a path relative to a download directory.
///
/// Leading separators are dropped; keys that would climb out of the directory
/// or that name no file are rejected.
fn key_to_relative_path(key: &str) -> GatewayResult<PathBuf> {
    let trimmed = key.trim_start_matches('/');
    let relative = Path::new(trimmed);

    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    // `Path::components` drops a trailing `.`, so check the raw last segment too
    let last_segment = trimmed.rsplit('/').next().unwrap_or_default();
    let names_file = !matches!(last_segment, "" | "." | "..")
        && matches!(relative.components().next_back(), Some(Component::Normal(_)));
    if escapes || !names_file {
        return Err(GatewayError::InvalidKey(key.to_string()));
    }

    Ok(relative.to_path_buf())
}
