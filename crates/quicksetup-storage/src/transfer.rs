//! Managed object download.
//!
//! Objects are fetched as a series of ranged reads. The first part tells us
//! the object size; the remaining parts are requested with a bounded number in
//! flight and written to the destination strictly in order.

use crate::traits::{ObjectStoreClient, StorageError, StorageResult};
use crate::types::ByteRange;
use futures::stream::{self, StreamExt};
use quicksetup_core::constants::{DEFAULT_DOWNLOAD_CONCURRENCY, DEFAULT_DOWNLOAD_PART_SIZE_MB};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Splits downloads into ranged requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Downloader {
    part_size: u64,
    concurrency: usize,
}

impl Default for Downloader {
    fn default() -> Self {
        Downloader {
            part_size: DEFAULT_DOWNLOAD_PART_SIZE_MB * 1024 * 1024,
            concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
        }
    }
}

impl Downloader {
    /// Zero values are bumped to 1.
    pub fn new(part_size: u64, concurrency: usize) -> Self {
        Downloader {
            part_size: part_size.max(1),
            concurrency: concurrency.max(1),
        }
    }

    pub fn part_size(&self) -> u64 {
        self.part_size
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Ranges still to fetch once `fetched` bytes of a `total`-byte object
    /// have been received.
    fn remaining_ranges(&self, fetched: u64, total: u64) -> Vec<ByteRange> {
        let mut ranges = Vec::new();
        let mut offset = fetched;
        while offset < total {
            let length = self.part_size.min(total - offset);
            ranges.push(ByteRange::new(offset, length));
            offset += length;
        }
        ranges
    }

    /// Download `bucket/key` into `writer`, returning the number of bytes written.
    ///
    /// Nothing is rolled back on failure; whatever was written stays written.
    pub async fn download<W>(
        &self,
        client: &dyn ObjectStoreClient,
        bucket: &str,
        key: &str,
        writer: &mut W,
    ) -> StorageResult<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let first = match client
            .get_object(bucket, key, Some(ByteRange::new(0, self.part_size)))
            .await
        {
            Ok(chunk) => chunk,
            // Ranged reads of an empty object are unsatisfiable
            Err(StorageError::InvalidRange(_)) => {
                let whole = client.get_object(bucket, key, None).await?;
                writer.write_all(&whole.body).await?;
                writer.flush().await?;
                return Ok(whole.body.len() as u64);
            }
            Err(e) => return Err(e),
        };

        let mut written = first.body.len() as u64;
        let total = first.total_size.unwrap_or(written);
        writer.write_all(&first.body).await?;

        let ranges = self.remaining_ranges(written, total);
        let part_count = ranges.len() + 1;

        let mut parts = stream::iter(ranges)
            .map(|range| client.get_object(bucket, key, Some(range)))
            .buffered(self.concurrency);

        while let Some(part) = parts.next().await {
            let part = part?;
            writer.write_all(&part.body).await?;
            written += part.body.len() as u64;
        }
        writer.flush().await?;

        if written != total {
            return Err(StorageError::DownloadFailed(format!(
                "expected {} bytes for {}/{}, received {}",
                total, bucket, key, written
            )));
        }

        tracing::debug!(
            bucket = %bucket,
            key = %key,
            size_bytes = written,
            parts = part_count,
            "Download assembled"
        );

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ObjectChunk, ObjectListing};
    use crate::StorageBackend;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    /// Serves one object and records every requested range.
    struct SingleObject {
        data: Vec<u8>,
        requests: Mutex<Vec<Option<ByteRange>>>,
    }

    impl SingleObject {
        fn new(data: Vec<u8>) -> Self {
            SingleObject {
                data,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ObjectStoreClient for SingleObject {
        async fn create_bucket(&self, _bucket: &str, _location: &str) -> StorageResult<()> {
            unimplemented!()
        }

        async fn list_objects(&self, _bucket: &str, _prefix: &str) -> StorageResult<ObjectListing> {
            unimplemented!()
        }

        async fn get_object(
            &self,
            _bucket: &str,
            _key: &str,
            range: Option<ByteRange>,
        ) -> StorageResult<ObjectChunk> {
            self.requests.lock().unwrap().push(range);
            let size = self.data.len() as u64;
            let body = match range {
                Some(r) if r.offset >= size => {
                    return Err(StorageError::InvalidRange("out of range".to_string()))
                }
                Some(r) => {
                    let end = (r.offset + r.length).min(size) as usize;
                    self.data[r.offset as usize..end].to_vec()
                }
                None => self.data.clone(),
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

    #[test]
    fn test_remaining_ranges_cover_object() {
        let downloader = Downloader::new(4, 2);
        let ranges = downloader.remaining_ranges(4, 10);
        assert_eq!(ranges, vec![ByteRange::new(4, 4), ByteRange::new(8, 2)]);
        assert!(downloader.remaining_ranges(10, 10).is_empty());
    }

    #[test]
    fn test_zero_settings_are_bumped() {
        let downloader = Downloader::new(0, 0);
        assert_eq!(downloader.part_size(), 1);
        assert_eq!(downloader.concurrency(), 1);
    }

    #[tokio::test]
    async fn test_multi_part_download_is_reassembled_in_order() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let client = SingleObject::new(data.clone());
        let downloader = Downloader::new(64, 4);

        let mut out = Vec::new();
        let written = downloader
            .download(&client, "bucket", "key", &mut out)
            .await
            .unwrap();

        assert_eq!(written, 1000);
        assert_eq!(out, data);
        // 1000 bytes in 64-byte parts
        assert_eq!(client.requests.lock().unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_small_object_needs_one_request() {
        let client = SingleObject::new(b"tiny".to_vec());
        let mut out = Vec::new();
        Downloader::default()
            .download(&client, "bucket", "key", &mut out)
            .await
            .unwrap();

        assert_eq!(out, b"tiny");
        assert_eq!(client.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_object_falls_back_to_plain_get() {
        let client = SingleObject::new(Vec::new());
        let mut out = Vec::new();
        let written = Downloader::default()
            .download(&client, "bucket", "key", &mut out)
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert!(out.is_empty());
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].is_none());
    }
}
