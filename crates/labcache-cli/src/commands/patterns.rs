//! Pattern inspection commands

use crate::args::SortKey;
use crate::console::{CliConsole, percent};
use colored::*;
use labcache_core::{BiomarkerPattern, LabCacheError, LabCacheResult, PatternCache};

/// List learned patterns
pub fn list(cache: &PatternCache, sort: SortKey) {
    let console = CliConsole::new(true);
    let mut patterns = cache.store().all();

    console.print_header(&format!("Learned Patterns ({})", patterns.len()));
    if patterns.is_empty() {
        console.warn("No patterns learned yet");
        return;
    }

    sort_patterns(&mut patterns, sort);
    println!(
        "  {:<24} {:>6} {:>8} {:>9}  {}",
        "NAME".bold(),
        "SEEN".bold(),
        "SUCCESS".bold(),
        "THRESHOLD".bold(),
        "UNITS".bold()
    );
    for pattern in &patterns {
        let success = percent(pattern.success_rate);
        let success = if pattern.success_rate >= pattern.confidence_threshold {
            success.green()
        } else {
            success.yellow()
        };
        println!(
            "  {:<24} {:>6} {:>8} {:>9.2}  {}",
            pattern.standardized_name,
            pattern.frequency_count,
            success,
            pattern.confidence_threshold,
            pattern.common_units.join(", ").dimmed()
        );
    }
}

/// Print one pattern as JSON
pub fn show(cache: &PatternCache, name: &str) -> LabCacheResult<()> {
    let pattern = cache
        .store()
        .get(name)
        .ok_or_else(|| LabCacheError::not_found(format!("No pattern named '{name}'")))?;
    let out = serde_json::to_string_pretty(&pattern)
        .map_err(|e| LabCacheError::json(format!("Failed to serialize pattern: {e}")))?;
    println!("{out}");
    Ok(())
}

fn sort_patterns(patterns: &mut [BiomarkerPattern], sort: SortKey) {
    match sort {
        SortKey::Frequency => patterns.sort_by(|a, b| {
            b.frequency_count
                .cmp(&a.frequency_count)
                .then_with(|| a.name.cmp(&b.name))
        }),
        SortKey::Success => patterns.sort_by(|a, b| {
            b.success_rate
                .total_cmp(&a.success_rate)
                .then_with(|| a.name.cmp(&b.name))
        }),
        SortKey::Name => patterns.sort_by(|a, b| a.name.cmp(&b.name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(patterns: &[BiomarkerPattern]) -> Vec<&str> {
        patterns.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_sort_patterns() {
        let mut patterns = vec![
            BiomarkerPattern::new("tsh").with_frequency(3).with_success_rate(0.99),
            BiomarkerPattern::new("glucose").with_frequency(40).with_success_rate(0.9),
            BiomarkerPattern::new("ferritin").with_frequency(40).with_success_rate(0.5),
        ];

        sort_patterns(&mut patterns, SortKey::Frequency);
        assert_eq!(names(&patterns), vec!["ferritin", "glucose", "tsh"]);

        sort_patterns(&mut patterns, SortKey::Success);
        assert_eq!(names(&patterns), vec!["tsh", "glucose", "ferritin"]);

        sort_patterns(&mut patterns, SortKey::Name);
        assert_eq!(names(&patterns), vec!["ferritin", "glucose", "tsh"]);
    }
}
