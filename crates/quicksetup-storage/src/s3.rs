use crate::traits::{ObjectStoreClient, StorageError, StorageResult};
use crate::types::{parse_content_range_total, ByteRange, ObjectChunk, ObjectListing, ObjectSummary};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::list_objects::ListObjectsError;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};

/// S3 rejects an explicit location constraint for its default region.
const DEFAULT_S3_REGION: &str = "us-east-1";

/// S3 object store client
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    region: String,
}

impl S3Client {
    /// Create a new S3Client instance
    ///
    /// Credentials come from the SDK's default provider chain.
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        if region.trim().is_empty() {
            return Err(StorageError::ConfigError("region cannot be empty".to_string()));
        }

        let region_provider =
            RegionProviderChain::first_try(aws_config::Region::new(region.clone()));

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let client = if let Some(ref endpoint) = endpoint_url {
            // S3-compatible providers generally need path-style addressing
            let s3_config = aws_sdk_s3::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        } else {
            Client::new(&config)
        };

        Ok(S3Client { client, region })
    }

    /// Wrap an already configured SDK client.
    pub fn from_client(client: Client, region: String) -> Self {
        S3Client { client, region }
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

#[async_trait]
impl ObjectStoreClient for S3Client {
    async fn create_bucket(&self, bucket: &str, location_constraint: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();

        let mut request = self.client.create_bucket().bucket(bucket);
        if !location_constraint.is_empty() && location_constraint != DEFAULT_S3_REGION {
            let configuration = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(location_constraint))
                .build();
            request = request.create_bucket_configuration(configuration);
        }

        request.send().await.map_err(|e| match &e {
            SdkError::ServiceError(service_err) => match service_err.err() {
                CreateBucketError::BucketAlreadyOwnedByYou(_) => {
                    StorageError::BucketAlreadyOwnedByYou(bucket.to_string())
                }
                CreateBucketError::BucketAlreadyExists(_) => {
                    StorageError::BucketAlreadyExists(bucket.to_string())
                }
                _ => {
                    tracing::error!(
                        error = %DisplayErrorContext(&e),
                        bucket = %bucket,
                        location = %location_constraint,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "S3 create bucket failed"
                    );
                    StorageError::BackendError(DisplayErrorContext(&e).to_string())
                }
            },
            _ => {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %bucket,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 create bucket failed"
                );
                StorageError::BackendError(DisplayErrorContext(&e).to_string())
            }
        })?;

        tracing::info!(
            bucket = %bucket,
            location = %location_constraint,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 bucket created"
        );

        Ok(())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<ObjectListing> {
        let start = std::time::Instant::now();

        let output = self
            .client
            .list_objects()
            .bucket(bucket)
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %bucket,
                    prefix = %prefix,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 list objects failed"
                );
                match &e {
                    SdkError::ServiceError(service_err) => match service_err.err() {
                        ListObjectsError::NoSuchBucket(_) => {
                            StorageError::NoSuchBucket(bucket.to_string())
                        }
                        _ => StorageError::BackendError(DisplayErrorContext(&e).to_string()),
                    },
                    _ => StorageError::BackendError(DisplayErrorContext(&e).to_string()),
                }
            })?;

        let objects: Vec<ObjectSummary> = output
            .contents()
            .iter()
            .map(|object| ObjectSummary {
                key: object.key().unwrap_or_default().to_string(),
                size: object.size().unwrap_or_default().max(0) as u64,
                last_modified: object.last_modified().and_then(to_chrono),
                e_tag: object.e_tag().map(str::to_string),
                storage_class: object.storage_class().map(|c| c.as_str().to_string()),
            })
            .collect();

        tracing::info!(
            bucket = %bucket,
            prefix = %prefix,
            count = objects.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list objects successful"
        );

        Ok(ObjectListing {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            objects,
            is_truncated: output.is_truncated().unwrap_or(false),
        })
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<ObjectChunk> {
        let start = std::time::Instant::now();

        let mut request = self.client.get_object().bucket(bucket).key(key);
        if let Some(range) = range {
            request = request.range(range.header_value());
        }

        let response = request.send().await.map_err(|e| match &e {
            SdkError::ServiceError(service_err) => match service_err.err() {
                GetObjectError::NoSuchKey(_) => StorageError::NotFound(format!("{}/{}", bucket, key)),
                err if err.code() == Some("InvalidRange") => {
                    StorageError::InvalidRange(format!("{}/{}", bucket, key))
                }
                err if err.code() == Some("NoSuchBucket") => {
                    StorageError::NoSuchBucket(bucket.to_string())
                }
                _ => {
                    tracing::error!(
                        error = %DisplayErrorContext(&e),
                        bucket = %bucket,
                        key = %key,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "S3 get object failed"
                    );
                    StorageError::DownloadFailed(DisplayErrorContext(&e).to_string())
                }
            },
            _ => {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 get object failed"
                );
                StorageError::DownloadFailed(DisplayErrorContext(&e).to_string())
            }
        })?;

        let total_size = match range {
            Some(_) => response.content_range().and_then(parse_content_range_total),
            None => response.content_length().map(|len| len.max(0) as u64),
        };

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?
            .into_bytes();

        tracing::debug!(
            bucket = %bucket,
            key = %key,
            size_bytes = body.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 get object successful"
        );

        Ok(ObjectChunk { body, total_size })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
