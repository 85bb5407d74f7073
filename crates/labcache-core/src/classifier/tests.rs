//! ChunkClassifier tests

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::store::PatternStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn classifier_with(patterns: Vec<BiomarkerPattern>) -> (TempDir, ChunkClassifier) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(PatternStore::new(
            dir.path().join("cache.json"),
            dir.path().join("cache_backup.json"),
        ));
        for pattern in patterns {
            store.upsert(pattern).unwrap();
        }
        let classifier = ChunkClassifier::new(store, &CacheConfig::default());
        (dir, classifier)
    }

    fn glucose() -> BiomarkerPattern {
        BiomarkerPattern::new("glucose")
            .with_standardized_name("Glucose")
            .with_range("mg/dL", 70.0, 99.0)
            .with_threshold(0.9)
            .with_success_rate(0.95)
    }

    fn hba1c() -> BiomarkerPattern {
        BiomarkerPattern::new("hba1c")
            .with_standardized_name("HbA1c")
            .with_variation("hemoglobin a1c")
            .with_range("%", 4.0, 5.6)
            .with_threshold(0.9)
            .with_success_rate(0.95)
    }

    #[test]
    fn test_seeded_glucose_is_a_hit() {
        let (_dir, classifier) = classifier_with(vec![glucose()]);
        let result = classifier.classify("Glucose 95 mg/dL (Ref: 70-99)");

        assert_eq!(result.hits.len(), 1);
        let hit = &result.hits[0];
        assert_eq!(hit.name, "glucose");
        assert_eq!(hit.display_name, "Glucose");
        assert_eq!(hit.value, 95.0);
        assert_eq!(hit.unit, "mg/dL");
        assert!(hit.confidence >= 0.9);
        assert!(result.miss_spans.is_empty());
        assert!(result.is_resolved());
    }

    #[test]
    fn test_default_seeded_glucose_is_a_hit() {
        let seeded = BiomarkerPattern::new("glucose")
            .with_range("mg/dL", 70.0, 99.0)
            .with_threshold(0.9);
        assert_eq!(seeded.success_rate, 0.7);
        let (_dir, classifier) = classifier_with(vec![seeded]);
        let result = classifier.classify("Glucose 95 mg/dL (Ref: 70-99)");

        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].value, 95.0);
        assert!(result.hits[0].confidence >= 0.9);
        assert!(result.is_resolved());
    }

    #[test]
    fn test_no_patterns_whole_chunk_is_one_span() {
        let (_dir, classifier) = classifier_with(vec![]);
        let chunk = "  Ferritin 80 ng/mL  ";
        let result = classifier.classify(chunk);

        assert!(result.hits.is_empty());
        assert_eq!(result.miss_spans.len(), 1);
        assert_eq!(result.miss_spans[0].text, "Ferritin 80 ng/mL");
    }

    #[test]
    fn test_blank_chunk() {
        let (_dir, classifier) = classifier_with(vec![glucose()]);
        let result = classifier.classify("   \n\t ");
        assert!(result.hits.is_empty());
        assert!(result.miss_spans.is_empty());
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn test_mixed_chunk_splits_hits_and_spans() {
        let (_dir, classifier) = classifier_with(vec![glucose(), hba1c()]);
        let chunk = "Glucose 95 mg/dL\nFerritin 80 ng/mL\nHemoglobin A1c 5.4 %";
        let result = classifier.classify(chunk);

        let names: Vec<_> = result.hits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["glucose", "hba1c"]);
        assert_eq!(result.miss_spans.len(), 1);
        assert_eq!(result.miss_spans[0].text, "Ferritin 80 ng/mL");
    }

    #[test]
    fn test_hits_and_spans_do_not_overlap() {
        let (_dir, classifier) = classifier_with(vec![glucose(), hba1c()]);
        let chunk = "TSH 2.1 mIU/L\nGlucose 95 mg/dL\nLDL 130 mg/dL\nHbA1c 5.4 %\nNotes: fasting";
        let result = classifier.classify(chunk);

        for span in &result.miss_spans {
            for candidate in result.candidates.iter().filter(|c| c.is_hit) {
                let r = &candidate.source_range;
                assert!(r.end <= span.start || r.start >= span.end);
            }
            assert_eq!(&chunk[span.start..span.end], span.text);
        }
        for pair in result.miss_spans.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_unknown_unit_is_not_a_hit() {
        let (_dir, classifier) = classifier_with(vec![glucose()]);
        let result = classifier.classify("Glucose 5.3 mmol/L");

        assert!(result.hits.is_empty());
        assert_eq!(result.candidates.len(), 1);
        assert!(result.candidates[0].confidence < 0.9);
        assert_eq!(result.miss_spans.len(), 1);
    }

    #[test]
    fn test_wild_value_is_not_a_hit() {
        let (_dir, classifier) = classifier_with(vec![glucose()]);
        let result = classifier.classify("Glucose 950 mg/dL");

        assert!(result.hits.is_empty());
        assert_eq!(result.candidates[0].range_check, RangeCheck::OutOfRange);
    }

    #[test]
    fn test_near_range_value_can_hit() {
        let pattern = glucose().with_success_rate(1.0).with_threshold(0.85);
        let (_dir, classifier) = classifier_with(vec![pattern]);
        let result = classifier.classify("Glucose 110 mg/dL H");

        assert_eq!(result.candidates[0].range_check, RangeCheck::NearRange);
        assert_eq!(result.hits.len(), 1);
    }

    #[test]
    fn test_name_without_value_is_a_miss() {
        let (_dir, classifier) = classifier_with(vec![glucose()]);
        let result = classifier.classify("Glucose tolerance test pending");

        assert!(result.hits.is_empty());
        assert_eq!(result.miss_spans.len(), 1);
    }

    #[test]
    fn test_low_success_rate_blocks_hit() {
        let pattern = glucose().with_success_rate(0.2);
        let (_dir, classifier) = classifier_with(vec![pattern]);
        let result = classifier.classify("Glucose 95 mg/dL");
        assert!(result.hits.is_empty());
    }

    #[test]
    fn test_unit_variants_match_stored_spelling() {
        let creatinine = BiomarkerPattern::new("creatinine")
            .with_range("µmol/L", 60.0, 110.0)
            .with_success_rate(1.0);
        let (_dir, classifier) = classifier_with(vec![creatinine]);
        let result = classifier.classify("CREATININE 88 umol / l");

        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].unit, "µmol/L");
    }

    #[test]
    fn test_glued_value_and_unit() {
        let (_dir, classifier) = classifier_with(vec![glucose()]);
        let result = classifier.classify("Glucose: 95mg/dL");
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].value, 95.0);
    }

    #[test]
    fn test_repeated_biomarker_gives_two_hits() {
        let (_dir, classifier) = classifier_with(vec![glucose()]);
        let result = classifier.classify("Glucose 92 mg/dL\nGlucose 97 mg/dL");
        let values: Vec<_> = result.hits.iter().map(|h| h.value).collect();
        assert_eq!(values, vec![92.0, 97.0]);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let (_dir, classifier) = classifier_with(vec![glucose(), hba1c()]);
        let chunk = "Glucose 95 mg/dL HbA1c 5.4 % Ferritin 80";
        assert_eq!(classifier.classify(chunk), classifier.classify(chunk));
    }

    #[test]
    fn test_mean_confidence() {
        let (_dir, classifier) = classifier_with(vec![glucose()]);
        let result = classifier.classify("Glucose 95 mg/dL");
        assert!((result.mean_confidence() - result.hits[0].confidence).abs() < 1e-12);
    }
}
