mod configs;
mod search;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "topfind")]
#[command(about = "Find apps, videos, podcasts and news about a topic")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search providers and export the filtered results as CSV
    Search(search::SearchArgs),
    /// Manage saved search configurations
    Config {
        #[command(subcommand)]
        command: configs::ConfigCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = topfind_core::load_app_config()?;
    init_tracing(&config.log_level);
    tracing::debug!(env = %config.env, "configuration loaded");

    match cli.command {
        Commands::Search(args) => search::run(&config, args).await,
        Commands::Config { command } => configs::run(&config, command),
    }
}

/// `RUST_LOG` wins; otherwise the configured level applies.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests;
