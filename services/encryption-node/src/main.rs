//! Encryption service node.
//!
//! Loads configuration, initialises logging and serves the
//! `encryption.MessageService` gRPC API until Ctrl-C or SIGTERM.

use anyhow::Context;
use clap::Parser;
use pwex_core::{logging, Config, LogFormat};
use pwex_crypto::{EncryptionService, OsRandomSource};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "pwex-encryption-node", version, about = "Starts the encryption gRPC service")]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "PWEX_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides config and environment
    #[arg(long)]
    listen_addr: Option<SocketAddr>,

    /// Log output format (text or json)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config
        .apply_env_overrides()
        .context("invalid environment override")?;

    if let Some(addr) = args.listen_addr {
        config.server.listen_addr = addr;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    logging::init(&config.logging).context("failed to initialise logging")?;

    tracing::info!(
        listen_addr = %config.server.listen_addr,
        version = env!("CARGO_PKG_VERSION"),
        "Starting encryption service"
    );

    let service = Arc::new(EncryptionService::new(OsRandomSource::new()));
    pwex_crypto::serve(&config.server, service, shutdown_signal())
        .await
        .context("encryption service terminated abnormally")?;

    tracing::info!("Encryption service stopped");
    Ok(())
}
