//! Statistics commands

use crate::console::{CliConsole, percent};
use labcache_core::{LabCacheError, LabCacheResult, PatternCache};

/// Print cache statistics
pub fn show(cache: &PatternCache, json: bool) -> LabCacheResult<()> {
    let stats = cache.statistics();
    if json {
        let out = serde_json::to_string_pretty(&stats)
            .map_err(|e| LabCacheError::json(format!("Failed to serialize statistics: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    let console = CliConsole::new(true);
    let store = cache.store();
    console.print_header("Pattern Cache Statistics");
    console.field("Cache file", store.path().display());
    console.field("Loaded from", store.load_source());
    console.field("Patterns", store.len());
    console.print_separator();
    console.field("Chunks classified", stats.total_extractions);
    console.field("Cache hits", stats.cache_hits);
    console.field("Cache misses", stats.cache_misses);
    console.field("Hit rate", format!("{:.1}%", stats.cache_hit_rate));
    console.field("LLM calls saved", stats.llm_calls_saved);
    console.field("LLM calls made", stats.llm_calls_made());
    console.field("False positives", stats.false_positives);
    console.field("Average confidence", percent(stats.average_confidence));
    console.field(
        "Last updated",
        stats.last_updated.format("%Y-%m-%d %H:%M:%S UTC"),
    );
    Ok(())
}

/// Zero the statistics and save
pub fn reset(cache: &PatternCache) -> LabCacheResult<()> {
    let console = CliConsole::new(true);
    let before = cache.statistics();
    cache.reset_statistics();
    cache.store().save()?;
    console.success(&format!(
        "Statistics reset ({} classified chunks discarded)",
        before.total_extractions
    ));
    Ok(())
}
