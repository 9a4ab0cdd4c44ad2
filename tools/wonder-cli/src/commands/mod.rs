//! CLI command implementations.

pub mod config;
pub mod replay;

use clap::{Args, Subcommand};

/// Arguments for the replay command.
#[derive(Args)]
pub struct ReplayArgs {
    /// Scenario file (TOML, or JSON by extension).
    pub scenario: String,

    /// Print the replacement cache contents after the run.
    #[arg(long)]
    pub show_cache: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective session cache configuration.
    Show,
    /// Write a default config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate a config file.
    Validate {
        /// Config file to check (default: the loaded one).
        path: Option<String>,
    },
}
