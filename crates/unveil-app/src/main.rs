mod cli;
mod clipboard;
mod commands;
mod setup;

use anyhow::Result;
use clap::Parser;
use unveil_core::config::AppConfig;
use unveil_core::lifecycle;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    lifecycle::init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref());
    lifecycle::log_startup();

    let result = match cli.command {
        Commands::Init { phrase_file, force } => commands::init(&config, phrase_file, force),
        Commands::Reveal => commands::reveal(&config).await,
        Commands::Check => commands::check(&config).await,
        Commands::Events { limit } => commands::events(&config, limit),
    };

    lifecycle::log_shutdown();
    result
}
