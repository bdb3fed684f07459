//! Values exchanged with object store backends.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A contiguous byte range of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

impl ByteRange {
    pub fn new(offset: u64, length: u64) -> Self {
        ByteRange { offset, length }
    }

    /// Offset of the last byte in the range.
    pub fn last_byte(&self) -> u64 {
        self.offset + self.length.saturating_sub(1)
    }

    /// Value for an HTTP `Range` header, e.g. `bytes=0-1023`.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.offset, self.last_byte())
    }
}

/// Bytes returned by a (possibly ranged) read.
#[derive(Debug, Clone)]
pub struct ObjectChunk {
    pub body: Bytes,
    /// Size of the whole object, when the backend reported it.
    pub total_size: Option<u64>,
}

/// Metadata for one listed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub e_tag: Option<String>,
    pub storage_class: Option<String>,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectListing {
    pub bucket: String,
    pub prefix: String,
    pub objects: Vec<ObjectSummary>,
    pub is_truncated: bool,
}

impl ObjectListing {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|o| o.key.as_str())
    }
}

/// Parse the object size out of a `Content-Range` header (`bytes 0-99/1234`).
///
/// Returns `None` when the header is malformed or the size is `*`.
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}
