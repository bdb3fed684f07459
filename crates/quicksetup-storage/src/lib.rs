//! Quicksetup Storage Library
//!
//! This crate provides the object store abstraction used by the setup tool,
//! implementations for S3 and the local filesystem, a ranged-part downloader,
//! and [`StorageGateway`], the façade that ensures buckets, downloads objects
//! to disk and lists objects under a prefix.
//!
//! # Error model
//!
//! Nothing in this crate terminates the process. Backends return
//! [`StorageError`]; the gateway wraps those in [`GatewayError`] together with
//! the bucket, key, prefix or path involved, and leaves it to the caller to
//! decide whether a failure is fatal.

pub mod factory;
pub mod gateway;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;
pub mod transfer;
pub mod types;

// Re-export commonly used types
pub use factory::create_client;
pub use gateway::{GatewayError, GatewayOptions, GatewayResult, StorageGateway};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use quicksetup_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Client;
pub use traits::{ObjectStoreClient, StorageError, StorageResult};
pub use transfer::Downloader;
pub use types::{ByteRange, ObjectChunk, ObjectListing, ObjectSummary};
