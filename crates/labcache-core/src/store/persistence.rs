//! Snapshot file I/O
//!
//! Writes go to a temporary file in the target directory which is then
//! renamed over the destination, so readers only ever see a complete old
//! or a complete new snapshot.

use super::migration::migrate;
use super::types::CacheSnapshot;
use crate::error::{LabCacheError, LabCacheResult};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Read and migrate a snapshot.
///
/// Returns `Ok(None)` when the file does not exist and a `CorruptCache`
/// error when it exists but cannot be used.
pub fn read_snapshot(path: &Path) -> LabCacheResult<Option<CacheSnapshot>> {
    let path_str = path.display().to_string();

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(LabCacheError::corrupt_cache(
                &path_str,
                format!("unreadable: {}", e),
            ));
        }
    };

    let document: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| LabCacheError::corrupt_cache(&path_str, format!("invalid JSON: {}", e)))?;
    let document = migrate(document, &path_str)?;

    let snapshot: CacheSnapshot = serde_json::from_value(document)
        .map_err(|e| LabCacheError::corrupt_cache(&path_str, format!("invalid schema: {}", e)))?;

    tracing::debug!(
        path = %path_str,
        patterns = snapshot.biomarker_patterns.len(),
        "read pattern cache snapshot"
    );
    Ok(Some(snapshot))
}

/// Write `snapshot` to `path`, first copying the current file to `backup_path`
pub fn write_snapshot(
    path: &Path,
    backup_path: &Path,
    snapshot: &CacheSnapshot,
) -> LabCacheResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            LabCacheError::io_with_path(
                format!("Failed to create cache directory: {}", e),
                parent.display().to_string(),
            )
        })?;
    }

    if path.exists() {
        match fs::read(path) {
            Ok(previous) => {
                if let Err(e) = write_atomic(backup_path, &previous) {
                    tracing::warn!(
                        path = %backup_path.display(),
                        error = %e,
                        "failed to refresh pattern cache backup"
                    );
                }
            }
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read previous snapshot for backup"
            ),
        }
    }

    let json = serde_json::to_vec_pretty(snapshot)?;
    write_atomic(path, &json)?;

    tracing::debug!(
        path = %path.display(),
        patterns = snapshot.biomarker_patterns.len(),
        "saved pattern cache snapshot"
    );
    Ok(())
}

/// Write `bytes` to a sibling temp file, sync it and rename it over `path`
pub fn write_atomic(path: &Path, bytes: &[u8]) -> LabCacheResult<()> {
    let tmp_path = temp_path_for(path);
    let io_err = |e: std::io::Error| {
        LabCacheError::io_with_path(e.to_string(), tmp_path.display().to_string())
    };

    {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(io_err)?;
        file.write_all(bytes).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(LabCacheError::io_with_path(
            format!("Failed to replace snapshot: {}", e),
            path.display().to_string(),
        ));
    }

    Ok(())
}

/// Move an unusable cache file aside so the next save does not back it up
pub fn quarantine(path: &Path) -> Option<PathBuf> {
    if !path.exists() {
        return None;
    }
    let mut name: OsString = path.file_name()?.to_os_string();
    name.push(".corrupt");
    let target = path.with_file_name(name);

    match fs::rename(path, &target) {
        Ok(()) => {
            tracing::warn!(
                from = %path.display(),
                to = %target.display(),
                "moved unusable pattern cache aside"
            );
            Some(target)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to move unusable cache aside");
            None
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("pattern_cache"));
    name.push(".tmp");
    path.with_file_name(name)
}
