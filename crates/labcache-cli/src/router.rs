//! Command routing logic for CLI

use crate::args::{CacheCommand, Cli, Commands, ConfigAction};
use crate::console::CliConsole;
use crate::{commands, logging};
use labcache_core::config::ConfigLoader;
use labcache_core::{CacheConfig, LabCacheConfig, LabCacheResult, LoggingConfig, PatternCache};
use std::collections::HashMap;
use std::path::Path;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Config { action } => {
            logging::init(&LoggingConfig::default(), cli.verbose)?;
            route_config(action, &cli.config_file, cli.verbose).await
        }
        Commands::Cache(command) => {
            let config = load_config(&cli.config_file, cli.cache_file.as_deref())?;
            logging::init(&config.logging, cli.verbose)?;
            route_cache_command(command, config.cache, cli.verbose).await
        }
    }
}

async fn route_cache_command(
    command: CacheCommand,
    config: CacheConfig,
    verbose: bool,
) -> anyhow::Result<()> {
    tracing::debug!(?command, cache_path = %config.cache_path.display(), "routing command");
    let cache = open_cache(config, verbose);

    match command {
        CacheCommand::Stats { json } => commands::stats::show(&cache, json)?,
        CacheCommand::ResetStats => commands::stats::reset(&cache)?,
        CacheCommand::List { sort } => commands::patterns::list(&cache, sort),
        CacheCommand::Show { name } => commands::patterns::show(&cache, &name)?,
        CacheCommand::Classify { input, json } => {
            commands::classify::run(&cache, &input, json).await?
        }
        CacheCommand::Maintain { dry_run } => commands::maintain::run(&cache, dry_run)?,
    }
    Ok(())
}

async fn route_config(action: ConfigAction, config_file: &str, verbose: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => commands::config::show(config_file, verbose).await?,
        ConfigAction::Validate => commands::config::validate(config_file).await?,
        ConfigAction::Init { force } => commands::config::init(config_file, force).await?,
    }
    Ok(())
}

/// Defaults, then the config file, then `LABCACHE_*`, then `--cache-file`
pub fn load_config(config_file: &str, cache_file: Option<&Path>) -> LabCacheResult<LabCacheConfig> {
    let mut overrides = HashMap::new();
    if let Some(path) = cache_file {
        overrides.insert("cache_path".to_string(), path.display().to_string());
    }

    ConfigLoader::new()
        .with_defaults()
        .with_file(config_file)
        .with_env()
        .with_overrides(overrides)
        .load()
}

/// Open the cache file for inspection, even when the cache is disabled for pipelines
fn open_cache(config: CacheConfig, verbose: bool) -> PatternCache {
    let console = CliConsole::new(verbose);
    if !config.enabled {
        console.warn("The pattern cache is disabled in configuration; pipelines will bypass it");
    }
    console.info(&format!("Cache file: {}", config.cache_path.display()));

    PatternCache::new(CacheConfig {
        enabled: true,
        ..config
    })
}
