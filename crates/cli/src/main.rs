//! DevSquad CLI — the main entry point.
//!
//! Commands:
//! - `serve`  — Start the WebSocket gateway
//! - `doctor` — Diagnose configuration and backend reachability
//! - `config` — Print the effective configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "devsquad",
    about = "DevSquad — an AI development team over WebSockets",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to an alternate config file
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the WebSocket gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Diagnose configuration and backend health
    Doctor,

    /// Print the effective configuration (secrets redacted)
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => devsquad_config::AppConfig::load_from(path),
        None => devsquad_config::AppConfig::load(),
    }
    .map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, port).await?,
        Commands::Doctor => commands::doctor::run(config).await?,
        Commands::Config => commands::config_cmd::run(config)?,
    }

    Ok(())
}
