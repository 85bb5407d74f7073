//! CLI argument definitions using clap
//!
//! - labcache stats                 # Cache statistics
//! - labcache list --sort success   # Learned patterns
//! - labcache classify report.txt   # Dry-run routing of a text file
//! - labcache maintain --dry-run    # Preview threshold maintenance
//! - labcache config init           # Utility commands

use clap::{Parser, Subcommand, ValueEnum};
use labcache_core::config::CONFIG_FILE_NAME;
use std::path::PathBuf;

/// Default configuration file name used across all CLI commands.
pub const DEFAULT_CONFIG_FILE: &str = CONFIG_FILE_NAME;

#[derive(Parser, Debug)]
#[command(name = "labcache")]
#[command(about = "Labcache - learned biomarker pattern cache for lab-report extraction")]
#[command(
    long_about = r#"Labcache - learned biomarker pattern cache for lab-report extraction

USAGE:
  labcache stats                       # Hit rate and counters
  labcache list                        # Learned patterns, most frequent first
  labcache show glucose                # One pattern as JSON
  labcache classify report.txt         # Which lines the cache would resolve
  labcache maintain                    # Adjust thresholds, prune, save

UTILITY COMMANDS:
  labcache config init                 # Create config file
  labcache config show                 # Show effective config

For detailed help: labcache --help"#
)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: String,

    /// Pattern cache file, overriding the configured path
    #[arg(long, global = true)]
    pub cache_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Cache(CacheCommand),

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Commands that open the pattern cache file
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Show cache statistics
    Stats {
        /// Print raw statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// List learned patterns
    List {
        /// Sort order
        #[arg(long, value_enum, default_value = "frequency")]
        sort: SortKey,
    },

    /// Print one pattern as JSON
    Show {
        /// Biomarker name, any spelling
        name: String,
    },

    /// Classify a text file without recording statistics or learning
    Classify {
        /// Text file, or `-` for stdin
        input: String,

        /// Print classifications as JSON
        #[arg(long)]
        json: bool,
    },

    /// Lower thresholds of reliable patterns, raise degrading ones, prune bad ones
    Maintain {
        /// Show what would change without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Zero all statistics counters and save
    ResetStats,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Display the effective configuration
    Show,

    /// Validate configuration file for errors
    Validate,

    /// Create a configuration file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Pattern list order
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Most observed first
    Frequency,
    /// Highest success rate first
    Success,
    /// Alphabetical
    Name,
}
