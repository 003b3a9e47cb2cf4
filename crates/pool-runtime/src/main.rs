//! # Rotation Pool Node
//!
//! Runs the rotation scheduler until Ctrl+C.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG`, default `info`)
//! 2. Load configuration from the environment
//! 3. Lock the data directory and wire the adapters
//! 4. Start the scheduler
//! 5. Wait for Ctrl+C, then shut down after any in-flight tick

use anyhow::{Context, Result};
use pool_runtime::{PoolConfig, PoolRuntime};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = PoolConfig::from_env().context("invalid configuration")?;

    let mut runtime = PoolRuntime::new(config)
        .await
        .context("failed to open data directory")?;
    runtime.start()?;

    info!("Pool is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
