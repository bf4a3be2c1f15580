//! CLI module
//!
//! Command-line interface for browsing catalogs.
//!
//! # Commands
//!
//! - `validate` - Check the catalog configuration
//! - `sources` - List configured sources
//! - `browse` - Drive a pagination engine to the end of the chain

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{browse, BrowseOptions, Runner, StateSummary};
