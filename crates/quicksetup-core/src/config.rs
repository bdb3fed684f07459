//! Configuration module
//!
//! Settings for the storage backend, bucket naming, and the downloader. Values
//! come from the process environment (with `.env` support); command-line flags
//! may override individual fields afterwards.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_BUCKET_PREFIX, DEFAULT_DOWNLOAD_CONCURRENCY, DEFAULT_DOWNLOAD_PART_SIZE_MB,
    DEFAULT_REGION, DEFAULT_TEMP_DIR_PREFIX,
};
use crate::storage_types::StorageBackend;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Setup tool configuration
#[derive(Clone, Debug)]
pub struct SetupConfig {
    pub storage_backend: StorageBackend,
    pub region: String,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub local_storage_path: Option<PathBuf>,
    // Bucket naming
    pub bucket_name: String,
    pub account_id: Option<String>,
    pub bucket_prefix: String,
    // Downloads
    pub temp_dir_prefix: String,
    pub download_part_size_bytes: u64,
    pub download_concurrency: usize,
}

impl Default for SetupConfig {
    fn default() -> Self {
        SetupConfig {
            storage_backend: StorageBackend::S3,
            region: DEFAULT_REGION.to_string(),
            s3_endpoint: None,
            local_storage_path: None,
            bucket_name: String::new(),
            account_id: None,
            bucket_prefix: DEFAULT_BUCKET_PREFIX.to_string(),
            temp_dir_prefix: DEFAULT_TEMP_DIR_PREFIX.to_string(),
            download_part_size_bytes: DEFAULT_DOWNLOAD_PART_SIZE_MB * BYTES_PER_MB,
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
        }
    }
}

impl SetupConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// `from_env` passes `std::env::var`; tests pass a map so they do not
    /// depend on the process environment.
    pub fn from_vars<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SetupConfig::default();

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.storage_backend,
        };

        let region = lookup("S3_REGION")
            .or_else(|| lookup("AWS_REGION"))
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(defaults.region);

        let download_part_size_bytes = match lookup("DOWNLOAD_PART_SIZE_MB") {
            Some(value) => {
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("DOWNLOAD_PART_SIZE_MB must be a valid number"))?
                    .checked_mul(BYTES_PER_MB)
                    .ok_or_else(|| anyhow::anyhow!("DOWNLOAD_PART_SIZE_MB is too large"))?
            }
            None => defaults.download_part_size_bytes,
        };

        let download_concurrency = match lookup("DOWNLOAD_CONCURRENCY") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("DOWNLOAD_CONCURRENCY must be a valid number"))?,
            None => defaults.download_concurrency,
        };

        let config = SetupConfig {
            storage_backend,
            region,
            s3_endpoint: lookup("S3_ENDPOINT").filter(|e| !e.trim().is_empty()),
            local_storage_path: lookup("LOCAL_STORAGE_PATH").map(PathBuf::from),
            bucket_name: lookup("BUCKET_NAME").unwrap_or_default(),
            account_id: lookup("AWS_ACCOUNT_ID").filter(|a| !a.trim().is_empty()),
            bucket_prefix: lookup("BUCKET_PREFIX").unwrap_or(defaults.bucket_prefix),
            temp_dir_prefix: lookup("TEMP_DIR_PREFIX").unwrap_or(defaults.temp_dir_prefix),
            download_part_size_bytes,
            download_concurrency,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.download_part_size_bytes == 0 {
            return Err(anyhow::anyhow!("DOWNLOAD_PART_SIZE_MB must be greater than 0"));
        }
        if self.download_concurrency == 0 {
            return Err(anyhow::anyhow!("DOWNLOAD_CONCURRENCY must be greater than 0"));
        }
        if self.bucket_prefix.trim().is_empty() {
            return Err(anyhow::anyhow!("BUCKET_PREFIX cannot be empty"));
        }
        if self.storage_backend == StorageBackend::Local && self.local_storage_path.is_none() {
            return Err(anyhow::anyhow!(
                "LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local"
            ));
        }
        Ok(())
    }
}
