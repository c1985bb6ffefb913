//! `helix-api` binary entrypoint.
//!
//! Loads configuration from environment variables and starts the HTTP server.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use std::sync::Arc;

use anyhow::Result;

use helix_api::config::Config;
use helix_api::server::Server;
use helix_core::{LogFormat, MemoryBackend, ObjectStoreBackend, StorageBackend, init_logging};

fn choose_log_format(config: &Config) -> LogFormat {
    if config.debug {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(choose_log_format(&config));

    let storage: Arc<dyn StorageBackend> = if let Some(bucket) = config.bucket.as_deref() {
        tracing::info!(bucket = %bucket, "Using object storage backend");
        Arc::new(ObjectStoreBackend::from_bucket(bucket)?)
    } else {
        tracing::warn!("HELIX_STORAGE_BUCKET not set; using in-memory storage (debug only)");
        Arc::new(MemoryBackend::new())
    };

    let server = Server::from_config(config, storage)?;
    server.serve().await?;
    Ok(())
}
