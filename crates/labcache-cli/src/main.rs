//! Labcache CLI application
//!
//! Inspect and maintain a learned biomarker pattern cache.
//!
//! # Installation
//!
//! ```bash
//! cargo install --path crates/labcache-cli
//! ```
//!
//! # Commands
//!
//! - `labcache stats`: hit rate, saved LLM calls, false positives
//! - `labcache list` / `labcache show <name>`: learned patterns
//! - `labcache classify <file>`: which paragraphs the cache would resolve,
//!   without recording anything
//! - `labcache maintain`: adjust thresholds and prune, then save
//! - `labcache reset-stats`: zero the counters
//! - `labcache config show|init|validate`: configuration files
//!
//! Set `RUST_LOG=debug` for verbose logging.

mod args;
mod commands;
mod console;
mod logging;
mod router;

use args::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    router::route(cli).await
}
