//! Boundary to the external LLM extractor
//!
//! The cache never talks to a model itself. Callers hand it something that
//! implements [`BiomarkerExtractor`] and the cache calls it for the spans it
//! cannot resolve.

use crate::error::LabCacheResult;
use crate::normalizer::normalize;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One biomarker reported by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedBiomarker {
    pub name: String,
    pub value: f64,
    pub unit: String,
    /// Source text the biomarker was read from
    #[serde(default)]
    pub raw_span: String,
    /// The model's own confidence in [0, 1]
    #[serde(default = "full_confidence")]
    pub model_confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

impl ExtractedBiomarker {
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            raw_span: String::new(),
            model_confidence: 1.0,
        }
    }

    pub fn with_raw_span(mut self, raw_span: impl Into<String>) -> Self {
        self.raw_span = raw_span.into();
        self
    }

    pub fn with_model_confidence(mut self, confidence: f64) -> Self {
        self.model_confidence = confidence;
        self
    }

    /// Normalized name, the pattern key this result maps to
    pub fn canonical_name(&self) -> String {
        normalize(&self.name)
    }

    /// Whether the result is trustworthy enough to learn from
    pub fn is_learnable(&self, min_model_confidence: f64) -> bool {
        self.model_confidence.is_finite()
            && self.model_confidence >= min_model_confidence
            && self.value.is_finite()
            && !self.canonical_name().is_empty()
    }
}

/// External structured extraction service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BiomarkerExtractor: Send + Sync {
    /// Extract every biomarker in `chunk_text`
    async fn extract(&self, chunk_text: &str) -> LabCacheResult<Vec<ExtractedBiomarker>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learnable() {
        let item = ExtractedBiomarker::new("Glucose", 95.0, "mg/dL");
        assert!(item.is_learnable(0.5));
        assert!(!item.clone().with_model_confidence(0.3).is_learnable(0.5));
        assert!(!ExtractedBiomarker::new("  ", 1.0, "x").is_learnable(0.5));
        assert!(!ExtractedBiomarker::new("ldl", f64::NAN, "mg/dL").is_learnable(0.5));
    }

    #[test]
    fn test_deserialize_defaults() {
        let item: ExtractedBiomarker =
            serde_json::from_str(r#"{"name": "TSH", "value": 2.1, "unit": "mIU/L"}"#).unwrap();
        assert_eq!(item.model_confidence, 1.0);
        assert_eq!(item.canonical_name(), "tsh");
    }

    #[test]
    fn test_mock_extractor() {
        let mut mock = MockBiomarkerExtractor::new();
        mock.expect_extract()
            .returning(|_| Ok(vec![ExtractedBiomarker::new("Ferritin", 80.0, "ng/mL")]));

        let items = tokio_test::block_on(mock.extract("Ferritin 80 ng/mL")).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].canonical_name(), "ferritin");
    }
}
