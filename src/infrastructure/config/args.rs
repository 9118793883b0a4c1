//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::app_config::LogLevel;
use crate::domain::entities::ProviderKind;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "notebanner",
    version,
    about = "Resolve banner images for notes from links, vault files or stock-photo searches",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Provider priority, comma separated.
    #[arg(long, value_enum, value_delimiter = ',', global = true)]
    pub providers: Option<Vec<ProviderKind>>,

    /// Minimum spacing between provider requests, in milliseconds.
    #[arg(long, global = true)]
    pub rate_limit_ms: Option<u64>,

    /// Check provider images are loadable before using them.
    #[arg(long, global = true)]
    pub verify_images: Option<bool>,

    /// Action to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve one banner input and print the result.
    Resolve {
        /// URL, vault path, `[[wiki link]]` or search keyword.
        input: String,

        /// Vault directory used for paths and links.
        #[arg(long, value_name = "DIR")]
        vault: Option<PathBuf>,

        /// Document the input belongs to, for relative link resolution.
        #[arg(long, value_name = "PATH", default_value = "banner.md")]
        document: String,

        /// Draw a random image from this vault folder instead.
        #[arg(long, value_name = "FOLDER")]
        shuffle: Option<String>,
    },
    /// List providers in priority order with their credential state.
    Providers,
    /// Print the configuration file path.
    ConfigPath,
}
