//! CLI argument definitions using clap
//!
//! Commands:
//! - survey-collector init --config <path>
//! - survey-collector serve --config <path> [--port <port>]
//! - survey-collector export --config <path> --study <id> [--format json|csv] [--output <file>]
//! - survey-collector check-studies --config <path> [--dir <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Survey collection service
#[derive(Parser, Debug)]
#[command(name = "survey-collector")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database and write a default config if none exists
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./survey.json")]
        config: PathBuf,
    },

    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./survey.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Export one study's surveys and exit
    Export {
        /// Path to configuration file
        #[arg(long, default_value = "./survey.json")]
        config: PathBuf,

        /// Study to export
        #[arg(long)]
        study: String,

        /// Output format: json or csv
        #[arg(long, default_value = "json")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate study config files without starting the server
    CheckStudies {
        /// Path to configuration file
        #[arg(long, default_value = "./survey.json")]
        config: PathBuf,

        /// Directory to check instead of the configured one
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
