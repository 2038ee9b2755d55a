//! CLI argument definitions using clap
//!
//! Commands:
//! - bitstore load --config <path>
//! - bitstore list --config <path>
//! - bitstore check --dir <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// bitstore - volume discovery for a disk-backed volume store
#[derive(Parser, Debug)]
#[command(name = "bitstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load every configured location and print a summary report
    Load {
        /// Path to configuration file
        #[arg(long, default_value = "./bitstore.json")]
        config: PathBuf,
    },

    /// Load every configured location and print one line per volume
    List {
        /// Path to configuration file
        #[arg(long, default_value = "./bitstore.json")]
        config: PathBuf,
    },

    /// Classify the entries of a directory without opening any volume
    Check {
        /// Directory to inspect
        #[arg(long)]
        dir: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
