//! ragdesk desktop shell
//!
//! Starts the `ragdesk serve` backend next to this executable, waits for it
//! to answer on `/health`, then keeps it alive until Ctrl-C. The backend is
//! stopped on every exit path.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ragdesk::config::{Config, CONFIG_FILE_NAME};
use ragdesk::supervisor::{BackendSupervisor, SupervisorConfig};

#[derive(Parser, Debug)]
#[command(name = "ragdesk-desktop")]
#[command(version)]
#[command(about = "Run the ragdesk backend under supervision", long_about = None)]
struct Args {
    /// Backend executable (looked up beside this program by default)
    #[arg(long)]
    backend: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut supervisor_config = SupervisorConfig {
        backend_path: args.backend,
        ..SupervisorConfig::default()
    };

    // Poll the port the backend will read from its own config file
    let locator = BackendSupervisor::new(supervisor_config.clone());
    let backend_config = match locator.resolve_backend_path() {
        Ok(path) => path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)),
        Err(_) => None,
    };
    let config = match backend_config.filter(|p| p.exists()) {
        Some(path) => Config::load(Some(&path)),
        None => Config::load(None),
    }
    .context("Failed to load configuration")?;
    supervisor_config.health_url = config.health_url();

    let mut supervisor = BackendSupervisor::new(supervisor_config);
    info!("starting ragdesk, press Ctrl-C to quit");
    supervisor.run_until(shutdown_signal()).await?;
    info!("shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
