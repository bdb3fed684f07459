use quicksetup_core::SetupConfig;

/// Apply command-line overrides on top of the environment configuration.
///
/// Empty strings count as "not given" so `--bucket ""` falls back to the
/// derived default name.
pub fn apply_overrides(
    mut config: SetupConfig,
    bucket: Option<String>,
    account_id: Option<String>,
    region: Option<String>,
) -> SetupConfig {
    if let Some(bucket) = bucket {
        config.bucket_name = bucket;
    }
    if let Some(account_id) = account_id.filter(|a| !a.is_empty()) {
        config.account_id = Some(account_id);
    }
    if let Some(region) = region.filter(|r| !r.is_empty()) {
        config.region = region;
    }
    config
}


/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
