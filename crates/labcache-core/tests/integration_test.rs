//! Integration tests for the labcache core
//!
//! Drives the cache with a scripted extractor over repeated lab reports and
//! checks that the cache learns, persists, recovers and self-corrects.

use async_trait::async_trait;
use labcache_core::{
    BiomarkerExtractor, BiomarkerPattern, BiomarkerSource, CacheConfig, ExtractedBiomarker,
    LabCacheResult, LoadSource, PatternCache,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const REPORT: &str = "Glucose 95 mg/dL\nHemoglobin A1c 5.4 %\nCreatinine 0.9 mg/dL";

/// Answers from a fixed table: every entry whose label occurs in the text
struct ScriptedExtractor {
    table: Vec<(&'static str, &'static str, f64, &'static str)>,
    calls: AtomicUsize,
}

impl ScriptedExtractor {
    fn lab_panel() -> Self {
        Self {
            table: vec![
                ("glucose", "Glucose", 95.0, "mg/dL"),
                ("hemoglobin a1c", "HbA1c", 5.4, "%"),
                ("creatinine", "Creatinine", 0.9, "mg/dL"),
            ],
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BiomarkerExtractor for ScriptedExtractor {
    async fn extract(&self, chunk_text: &str) -> LabCacheResult<Vec<ExtractedBiomarker>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut found = Vec::new();
        for line in chunk_text.lines() {
            let lower = line.to_lowercase();
            for (label, name, value, unit) in &self.table {
                if lower.contains(label) {
                    found.push(ExtractedBiomarker::new(*name, *value, *unit).with_raw_span(line.trim()));
                }
            }
        }
        Ok(found)
    }
}

/// Show cache logs for failing tests (`RUST_LOG=labcache_core=debug`)
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config_in(dir: &TempDir) -> CacheConfig {
    CacheConfig::with_cache_path(dir.path().join("pattern_cache.json"))
}

#[tokio::test]
async fn test_cache_learns_a_recurring_report() -> LabCacheResult<()> {
    let dir = TempDir::new().unwrap();
    let cache = PatternCache::new(config_in(&dir));
    let extractor = ScriptedExtractor::lab_panel();

    let first = cache.process_chunk(REPORT, &extractor).await?;
    assert_eq!(first.llm_calls, 1);
    assert_eq!(first.learning.created.len(), 3);
    assert_eq!(first.from_llm_count(), 3);
    assert!(cache.store().contains("hba1c"));
    assert!(
        cache
            .store()
            .get("hba1c")
            .unwrap()
            .pattern_variations
            .contains(&"hemoglobin a1c".to_string())
    );

    let mut last = first;
    for _ in 0..19 {
        last = cache.process_chunk(REPORT, &extractor).await?;
    }

    assert_eq!(last.llm_calls, 0);
    assert_eq!(last.from_cache_count(), 3);
    let names: Vec<_> = last.biomarkers.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["glucose", "hba1c", "creatinine"]);

    let stats = cache.statistics();
    assert_eq!(stats.total_extractions, 20);
    assert!(stats.cache_hits > 0);
    assert_eq!(stats.llm_calls_saved, stats.cache_hits);
    assert_eq!(stats.false_positives, 0);
    assert!(extractor.calls() < 20 * 3);
    Ok(())
}

#[tokio::test]
async fn test_learning_survives_restart() -> LabCacheResult<()> {
    let dir = TempDir::new().unwrap();
    let extractor = ScriptedExtractor::lab_panel();
    {
        let cache = PatternCache::new(config_in(&dir));
        for _ in 0..20 {
            cache.process_chunk(REPORT, &extractor).await?;
        }
        cache.flush()?;
    }

    let reopened = PatternCache::new(config_in(&dir));
    assert_eq!(reopened.store().load_source(), LoadSource::Primary);
    assert_eq!(reopened.store().len(), 3);
    assert_eq!(reopened.statistics().total_extractions, 20);

    let calls_before = extractor.calls();
    let result = reopened.process_chunk(REPORT, &extractor).await?;
    assert_eq!(result.from_cache_count(), 3);
    assert_eq!(extractor.calls(), calls_before);
    Ok(())
}

#[tokio::test]
async fn test_corrupt_file_recovers_from_backup() -> LabCacheResult<()> {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let extractor = ScriptedExtractor::lab_panel();
    {
        let cache = PatternCache::new(config.clone());
        cache.process_chunk(REPORT, &extractor).await?;
        cache.flush()?;
        cache.process_chunk(REPORT, &extractor).await?;
        cache.flush()?;
    }
    std::fs::write(&config.cache_path, "{\"biomarker_patterns\": {").unwrap();

    let recovered = PatternCache::new(config.clone());
    assert_eq!(recovered.store().load_source(), LoadSource::Backup);
    assert_eq!(recovered.store().len(), 3);

    // The next save rewrites a readable primary
    recovered.flush()?;
    let reopened = PatternCache::new(config);
    assert_eq!(reopened.store().load_source(), LoadSource::Primary);
    Ok(())
}

#[tokio::test]
async fn test_verification_demotes_a_wrong_pattern() -> LabCacheResult<()> {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = CacheConfig {
        verify_every_n_hits: 1,
        ..config_in(&dir)
    };
    let cache = PatternCache::new(config);
    cache.store().upsert(
        BiomarkerPattern::new("glucose")
            .with_range("mg/dL", 70.0, 99.0)
            .with_success_rate(0.95)
            .with_frequency(8),
    )?;

    // The lab actually reports a different glucose than the cache reads
    let extractor = ScriptedExtractor {
        table: vec![("glucose", "Glucose", 59.0, "mg/dL")],
        calls: AtomicUsize::new(0),
    };

    let mut sources = Vec::new();
    for _ in 0..7 {
        let result = cache.process_chunk("Glucose 95 mg/dL", &extractor).await?;
        sources.push(result.biomarkers[0].source);
    }

    // Each contradiction lowers the success rate until the pattern stops hitting
    let demoted = sources
        .iter()
        .position(|s| *s == BiomarkerSource::Llm)
        .expect("pattern never demoted");
    assert!(demoted >= 2);
    assert!(sources[..demoted].iter().all(|s| *s == BiomarkerSource::Cache));
    assert!(sources[demoted..].iter().all(|s| *s == BiomarkerSource::Llm));
    assert_eq!(cache.statistics().false_positives, demoted as u64);
    assert_eq!(extractor.calls(), 7);
    assert!(cache.store().get("glucose").unwrap().success_rate < 0.7);
    Ok(())
}

#[tokio::test]
async fn test_document_processing_with_autosave() -> LabCacheResult<()> {
    let dir = TempDir::new().unwrap();
    let cache = PatternCache::new(config_in(&dir));
    let extractor = ScriptedExtractor::lab_panel();
    let autosave = cache.spawn_autosave(CancellationToken::new());

    let chunks: Vec<&str> = REPORT.lines().collect();
    let document = cache
        .process_document(&chunks, &extractor, &CancellationToken::new())
        .await?;
    assert!(!document.cancelled);
    assert_eq!(document.chunks.len(), 3);
    assert_eq!(document.llm_calls(), 3);
    assert_eq!(document.biomarkers().count(), 3);

    autosave.shutdown().await?;
    assert!(!cache.store().is_dirty());
    assert!(dir.path().join("pattern_cache.json").exists());
    Ok(())
}
