// JobPlanner API server
// Entry point for the jobplanner-server binary

use api_server::serve;
use clap::Parser;
use jobplanner_engine::config::Config;
use jobplanner_engine::telemetry::init_telemetry_with_level;
use std::path::PathBuf;

/// Serve the JobPlanner HTTP API
#[derive(Parser, Debug)]
#[command(name = "jobplanner-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Specify alternate configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load_or_create()?,
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_telemetry_with_level(&config.core.log_level);
    tracing::info!("JobPlanner API v{}", env!("CARGO_PKG_VERSION"));

    serve(&config).await
}
