//! Main entry point for the gamelog-harvester CLI

use clap::Parser;
use gamelog_harvester::cli::Cli;
use gamelog_harvester::shutdown::{self, ShutdownCoordinator};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gamelog_harvester=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    // A missing .env is fine; real variables still apply.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let shutdown = ShutdownCoordinator::shared();
    shutdown::listen_for_ctrl_c(shutdown.clone());

    match cli.execute(shutdown).await {
        Ok(summary) => {
            info!(
                username = %summary.username,
                logs = summary.logs,
                games = summary.games,
                log_path = %summary.log_path.display(),
                games_path = %summary.games_path.display(),
                "Harvest finished"
            );
        }
        Err(e) => {
            error!("Harvest failed: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
