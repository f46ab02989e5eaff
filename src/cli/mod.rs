//! CLI module
//!
//! Provides command-line interface for:
//! - init: Create the database and a default config
//! - serve: Boot the store and serve HTTP
//! - export: One-shot study export
//! - check-studies: Validate study config files

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_studies, export, init, run, run_command, seed_study_configs, serve, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
