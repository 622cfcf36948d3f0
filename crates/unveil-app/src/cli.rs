use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "unveil", about = "Reveal a password-sealed recovery phrase")]
pub struct Cli {
    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Seal a recovery phrase into a new vault
    Init {
        /// Read the phrase from this file instead of prompting
        #[arg(long)]
        phrase_file: Option<PathBuf>,
        /// Overwrite an existing vault
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Interactive reveal: password, hold-to-reveal, then view/copy/close
    Reveal,

    /// Check the vault password without revealing anything
    Check,

    /// Show recent disclosure events
    Events {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}
