//! Schema migration for older snapshot files
//!
//! Version 1 files have no `metadata.version` (or version 1), may store
//! `success_rate` as a percentage and lack the `false_positives` and
//! `llm_calls_saved` counters. Versions may be written as numbers or as
//! `major[.minor]` strings; only the major part counts. Files newer than
//! this build are rejected.

use super::types::CURRENT_SCHEMA_VERSION;
use crate::error::{LabCacheError, LabCacheResult};
use serde_json::{Map, Value, json};

/// Bring a raw snapshot document up to [`CURRENT_SCHEMA_VERSION`]
pub fn migrate(mut document: Value, path: &str) -> LabCacheResult<Value> {
    let version = schema_version(&document, path)?;

    if version > CURRENT_SCHEMA_VERSION {
        return Err(LabCacheError::corrupt_cache(
            path,
            format!(
                "schema version {} is newer than supported version {}",
                version, CURRENT_SCHEMA_VERSION
            ),
        ));
    }

    if version < 2 {
        migrate_v1_to_v2(&mut document);
        tracing::info!(path, from = version, to = 2, "migrated pattern cache schema");
    } else {
        set_version(&mut document, version);
    }

    Ok(document)
}

fn schema_version(document: &Value, path: &str) -> LabCacheResult<u32> {
    if !document.is_object() {
        return Err(LabCacheError::corrupt_cache(
            path,
            "top-level value is not an object",
        ));
    }

    let version = match document.get("metadata").and_then(|m| m.get("version")) {
        None | Some(Value::Null) => 1,
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64))
            .ok_or_else(|| {
                LabCacheError::corrupt_cache(path, format!("invalid schema version {}", n))
            })?,
        Some(Value::String(s)) => parse_major(s).ok_or_else(|| {
            LabCacheError::corrupt_cache(path, format!("invalid schema version '{}'", s))
        })?,
        Some(other) => {
            return Err(LabCacheError::corrupt_cache(
                path,
                format!("invalid schema version {}", other),
            ));
        }
    };

    if version == 0 {
        return Err(LabCacheError::corrupt_cache(path, "schema version 0"));
    }

    Ok(u32::try_from(version).unwrap_or(u32::MAX))
}

/// Major part of `"2"`, `"2.1"` or `"v2.1.0"`
fn parse_major(version: &str) -> Option<u64> {
    let version = version.trim();
    let version = version.strip_prefix(['v', 'V']).unwrap_or(version);
    let major = version.split('.').next()?;
    let rest_is_numeric = version
        .split('.')
        .skip(1)
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if !rest_is_numeric {
        return None;
    }
    major.parse().ok()
}

/// Store the version as the integer the snapshot type expects
fn set_version(document: &mut Value, version: u32) {
    if let Some(meta) = document.get_mut("metadata").and_then(Value::as_object_mut) {
        meta.insert("version".to_string(), json!(version));
    }
}

fn migrate_v1_to_v2(document: &mut Value) {
    let Some(root) = document.as_object_mut() else {
        return;
    };

    if let Some(Value::Object(patterns)) = root.get_mut("biomarker_patterns") {
        for pattern in patterns.values_mut() {
            // Only percentages need rescaling; some v1 writers already used fractions
            if let Some(rate) = pattern.get("success_rate").and_then(Value::as_f64) {
                if rate > 1.0 {
                    pattern["success_rate"] = json!(rate / 100.0);
                }
            }
        }
    }

    let statistics = root
        .entry("statistics")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(stats) = statistics.as_object_mut() {
        stats.entry("false_positives").or_insert(json!(0));
        stats.entry("llm_calls_saved").or_insert(json!(0));
    }

    let metadata = root
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(meta) = metadata.as_object_mut() {
        meta.insert("version".to_string(), json!(2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_success_rate_rescaled() {
        let v1 = json!({
            "biomarker_patterns": {
                "glucose": {"name": "glucose", "success_rate": 85.0}
            },
            "statistics": {"total_extractions": 4}
        });

        let migrated = migrate(v1, "test.json").unwrap();
        assert_eq!(migrated["metadata"]["version"], json!(2));
        assert_eq!(
            migrated["biomarker_patterns"]["glucose"]["success_rate"],
            json!(0.85)
        );
        assert_eq!(migrated["statistics"]["false_positives"], json!(0));
        assert_eq!(migrated["statistics"]["llm_calls_saved"], json!(0));
        assert_eq!(migrated["statistics"]["total_extractions"], json!(4));
    }

    #[test]
    fn test_v1_fractional_success_rate_kept() {
        let v1 = json!({
            "biomarker_patterns": {
                "glucose": {"name": "glucose", "success_rate": 0.9},
                "ldl": {"name": "ldl", "success_rate": 1.0}
            }
        });

        let migrated = migrate(v1, "test.json").unwrap();
        assert_eq!(migrated["metadata"]["version"], json!(2));
        assert_eq!(migrated["biomarker_patterns"]["glucose"]["success_rate"], json!(0.9));
        assert_eq!(migrated["biomarker_patterns"]["ldl"]["success_rate"], json!(1.0));
    }

    #[test]
    fn test_dotted_version_strings() {
        let v1 = json!({
            "biomarker_patterns": {"tsh": {"name": "tsh", "success_rate": 80.0}},
            "metadata": {"version": "1.0"}
        });
        let migrated = migrate(v1, "test.json").unwrap();
        assert_eq!(migrated["metadata"]["version"], json!(2));
        assert_eq!(migrated["biomarker_patterns"]["tsh"]["success_rate"], json!(0.8));

        let v2 = migrate(json!({"metadata": {"version": "2.1"}}), "test.json").unwrap();
        assert_eq!(v2["metadata"]["version"], json!(2));

        let float = migrate(json!({"metadata": {"version": 2.0}}), "test.json").unwrap();
        assert_eq!(float["metadata"]["version"], json!(2));

        assert!(migrate(json!({"metadata": {"version": "3.0"}}), "test.json").is_err());
        assert!(migrate(json!({"metadata": {"version": "1.x"}}), "test.json").is_err());
    }

    #[test]
    fn test_current_version_untouched() {
        let v2 = json!({
            "biomarker_patterns": {"ldl": {"name": "ldl", "success_rate": 0.9}},
            "metadata": {"version": 2}
        });
        let migrated = migrate(v2.clone(), "test.json").unwrap();
        assert_eq!(migrated, v2);
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = migrate(json!({"metadata": {"version": 7}}), "test.json").unwrap_err();
        assert!(err.is_corrupt_cache());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(migrate(json!([1, 2, 3]), "test.json").is_err());
        assert!(migrate(json!({"metadata": {"version": "two"}}), "test.json").is_err());
    }
}
