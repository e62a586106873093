//! coursemart uploader entry point.

mod app;
mod config;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Upload a course video or e-book to the storage endpoint in chunks.
#[derive(Debug, Parser)]
#[command(name = "coursemart-upload", version, about)]
pub struct Args {
    /// File to upload.
    pub file: PathBuf,

    /// Chunk upload endpoint (overrides the config file).
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Bytes per chunk (overrides the config file).
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Attempts per chunk (overrides the config file).
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Configuration file path.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Split and upload into an in-process store instead of the endpoint.
    #[arg(long)]
    pub dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        file = %args.file.display(),
        "starting coursemart upload"
    );

    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let config = config::Config::load_from(&config_path)?.merge_args(&args);
    tracing::info!(endpoint = %config.endpoint, chunk_size = config.chunk_size, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(app::run(&args, &config))?;

    println!("{}", outcome.url);
    Ok(())
}
