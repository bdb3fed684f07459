//! Fixed values used when configuration does not override them.

/// Prefix of the bucket name derived from the account id when none is given.
pub const DEFAULT_BUCKET_PREFIX: &str = "sagemaker-edgemanager";

/// Region used both for the client and as the bucket location constraint.
pub const DEFAULT_REGION: &str = "us-west-2";

/// Prefix of the temporary directories objects are downloaded into.
pub const DEFAULT_TEMP_DIR_PREFIX: &str = "aws_sagemaker_quick_device_setup";

/// Size of each ranged request issued by the downloader.
pub const DEFAULT_DOWNLOAD_PART_SIZE_MB: u64 = 5;

/// Number of ranged requests the downloader keeps in flight.
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 5;

/// Upper bound of entries a single listing page returns.
pub const LIST_PAGE_SIZE: usize = 1000;
