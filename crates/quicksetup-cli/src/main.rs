//! Quicksetup CLI — object storage bootstrap for device setup.
//!
//! Storage settings come from the environment (see `SetupConfig::from_env`);
//! flags override them per invocation.

use anyhow::Context;
use clap::{Parser, Subcommand};
use quicksetup_cli::{apply_overrides, init_tracing};
use quicksetup_core::SetupConfig;
use quicksetup_storage::{create_client, GatewayOptions, StorageGateway};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quicksetup", about = "Object storage bootstrap helpers")]
struct Cli {
    /// Region, also used as the bucket location constraint
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a bucket unless it already exists
    EnsureBucket {
        /// Bucket name; derived from the account id when omitted
        #[arg(long)]
        bucket: Option<String>,
        /// Account id used to derive the default bucket name
        #[arg(long)]
        account_id: Option<String>,
    },
    /// Download a single object
    Download {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
        /// Destination file; a fresh temp directory is used when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List objects under a prefix (single page)
    List {
        #[arg(long)]
        bucket: String,
        #[arg(long, default_value = "")]
        prefix: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = SetupConfig::from_env().context("Invalid configuration")?;

    let (bucket_override, account_override) = match &cli.command {
        Commands::EnsureBucket { bucket, account_id } => (bucket.clone(), account_id.clone()),
        _ => (None, None),
    };
    let config = apply_overrides(config, bucket_override, account_override, cli.region);

    let client = create_client(&config)
        .await
        .context("Failed to create storage client")?;
    let gateway = StorageGateway::new(client, GatewayOptions::from(&config));

    match cli.command {
        Commands::EnsureBucket { .. } => {
            let account_id = config.account_id.as_deref().unwrap_or_default();
            let bucket = gateway
                .ensure_bucket(&config.bucket_name, account_id)
                .await?;
            print_json(&serde_json::json!({ "bucket": bucket }))?;
        }
        Commands::Download {
            bucket,
            key,
            output,
        } => {
            let path = match output {
                Some(output) => gateway.download_object_to_path(&bucket, &key, output).await?,
                None => gateway.download_object_to_temp_location(&bucket, &key).await?,
            };
            print_json(&serde_json::json!({
                "bucket": bucket,
                "key": key,
                "path": path.display().to_string(),
            }))?;
        }
        Commands::List { bucket, prefix } => {
            let listing = gateway.list_objects_by_prefix(&bucket, &prefix).await?;
            print_json(&listing)?;
        }
    }

    Ok(())
}
