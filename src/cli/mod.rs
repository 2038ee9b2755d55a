//! CLI module for bitstore
//!
//! Provides command-line interface for:
//! - load: load every configured location, print a summary
//! - list: load, then print every registered volume
//! - check: classify a directory's entries without opening volumes

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check, list, load, run, run_command};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
