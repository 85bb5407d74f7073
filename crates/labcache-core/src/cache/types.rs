//! Chunk and document processing results

use crate::classifier::{BiomarkerHit, Classification};
use crate::learner::LearningReport;
use crate::llm::ExtractedBiomarker;
use serde::{Deserialize, Serialize};

/// Where a biomarker in a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiomarkerSource {
    Cache,
    Llm,
}

/// A biomarker in a chunk result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBiomarker {
    /// Canonical name
    pub name: String,
    /// Name as it should be shown
    pub display_name: String,
    pub value: f64,
    pub unit: String,
    pub confidence: f64,
    pub source: BiomarkerSource,
}

impl From<&BiomarkerHit> for ResolvedBiomarker {
    fn from(hit: &BiomarkerHit) -> Self {
        Self {
            name: hit.name.clone(),
            display_name: hit.display_name.clone(),
            value: hit.value,
            unit: hit.unit.clone(),
            confidence: hit.confidence,
            source: BiomarkerSource::Cache,
        }
    }
}

impl From<&ExtractedBiomarker> for ResolvedBiomarker {
    fn from(item: &ExtractedBiomarker) -> Self {
        Self {
            name: item.canonical_name(),
            display_name: item.name.trim().to_string(),
            value: item.value,
            unit: item.unit.clone(),
            confidence: item.model_confidence,
            source: BiomarkerSource::Llm,
        }
    }
}

/// Everything known about one chunk after routing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkResult {
    /// Hits first, then LLM results for names without a hit
    pub biomarkers: Vec<ResolvedBiomarker>,
    pub classification: Classification,
    pub learning: LearningReport,
    /// Extractor calls made for this chunk
    pub llm_calls: usize,
}

impl ChunkResult {
    pub fn from_cache_count(&self) -> usize {
        self.count(BiomarkerSource::Cache)
    }

    pub fn from_llm_count(&self) -> usize {
        self.count(BiomarkerSource::Llm)
    }

    fn count(&self, source: BiomarkerSource) -> usize {
        self.biomarkers.iter().filter(|b| b.source == source).count()
    }
}

/// Results for a document, in chunk order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    pub chunks: Vec<ChunkResult>,
    /// Processing stopped early; `chunks` holds what finished
    pub cancelled: bool,
}

impl DocumentResult {
    pub fn biomarkers(&self) -> impl Iterator<Item = &ResolvedBiomarker> {
        self.chunks.iter().flat_map(|c| c.biomarkers.iter())
    }

    pub fn llm_calls(&self) -> usize {
        self.chunks.iter().map(|c| c.llm_calls).sum()
    }
}
