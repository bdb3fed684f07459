//! Quicksetup Core Library
//!
//! This crate provides the configuration, constants and backend selection
//! shared by the storage library and the command-line tool.

pub mod config;
pub mod constants;
pub mod storage_types;

// Re-export commonly used types
pub use config::SetupConfig;
pub use storage_types::StorageBackend;
