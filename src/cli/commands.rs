//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Browse paged catalogs across a chain of sources
#[derive(Parser, Debug)]
#[command(name = "pagechain")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog configuration file (YAML). Uses the built-in TMDB session when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API key, overriding the one in the config
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the catalog configuration
    Validate,

    /// List configured sources
    Sources,

    /// Scroll through every source, printing each state transition
    Browse {
        /// Stop once this many items are loaded
        #[arg(long)]
        max_items: Option<usize>,

        /// Retries allowed for failed page loads
        #[arg(long, default_value = "0")]
        retries: usize,

        /// Look-ahead distance overriding the config
        #[arg(long)]
        prefetch_distance: Option<usize>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
