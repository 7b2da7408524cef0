//! CLI argument definitions using clap
//!
//! Commands:
//! - txstate inspect --data-dir <path> | --config <path>
//! - txstate verify --data-dir <path> | --config <path>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// txstate - offline tooling for transactional state stores
#[derive(Parser, Debug)]
#[command(name = "txstate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where the store lives. `--data-dir` wins over the config file.
#[derive(Args, Debug, Clone)]
pub struct StoreLocation {
    /// Data directory holding the store
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the latest value of every key as JSON lines
    Inspect {
        #[command(flatten)]
        location: StoreLocation,
    },

    /// Check every record checksum and print a summary
    Verify {
        #[command(flatten)]
        location: StoreLocation,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
