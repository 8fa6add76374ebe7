use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::{
    error::{FluxError, Result},
    models::GenerationResult,
};

pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeReport {
    pub metadata_path: PathBuf,
    pub removed_files: Vec<PathBuf>,
}

/// Persists the batch metadata, then sweeps zero-byte files out of `out_dir`.
pub async fn finalize_run(results: &[GenerationResult], out_dir: &Path) -> Result<FinalizeReport> {
    let metadata_path = write_metadata(results, out_dir).await?;
    let removed_files = remove_empty_files(out_dir).await?;

    Ok(FinalizeReport {
        metadata_path,
        removed_files,
    })
}

fn to_pretty_json(results: &[GenerationResult]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    results.serialize(&mut serializer)?;
    Ok(buf)
}

/// Writes `metadata.json` in one step: the document lands in a temporary
/// sibling first and is renamed into place.
pub async fn write_metadata(results: &[GenerationResult], out_dir: &Path) -> Result<PathBuf> {
    let body = to_pretty_json(results)?;
    let path = out_dir.join(METADATA_FILE);
    let staging = out_dir.join(format!(".{}.tmp", METADATA_FILE));

    let persist = async {
        tokio::fs::create_dir_all(out_dir).await?;
        tokio::fs::write(&staging, &body).await?;
        tokio::fs::rename(&staging, &path).await
    };
    persist.await.map_err(|e| {
        FluxError::PersistenceError(format!("failed to write {}: {}", path.display(), e))
    })?;

    log::info!("💾 Wrote metadata for {} results to {}", results.len(), path.display());
    Ok(path)
}

/// Removes every zero-byte file below `dir` and returns what was removed.
pub async fn remove_empty_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || sweep_empty_files(&dir))
        .await
        .map_err(|e| FluxError::PersistenceError(format!("cleanup task failed: {}", e)))
}

fn sweep_empty_files(dir: &Path) -> Vec<PathBuf> {
    let mut removed = Vec::new();

    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("⚠️  Skipping unreadable entry during cleanup: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let empty = entry.metadata().map(|meta| meta.len() == 0).unwrap_or(false);
        if !empty {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                log::info!("🧹 Removed empty file: {}", entry.path().display());
                removed.push(entry.into_path());
            }
            Err(e) => log::warn!("⚠️  Could not remove {}: {}", entry.path().display(), e),
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn results() -> Vec<GenerationResult> {
        vec![
            serde_json::from_value(json!({"images": [{"url": "https://x/a_1.png"}], "seed": 2})).unwrap(),
            serde_json::from_value(json!({"images": [], "seed": 1, "timings": {"inference": 1.5}})).unwrap(),
        ]
    }

    #[tokio::test]
    async fn test_metadata_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let report = finalize_run(&results(), dir.path()).await.unwrap();

        assert_eq!(report.metadata_path, dir.path().join("metadata.json"));
        let text = std::fs::read_to_string(&report.metadata_path).unwrap();
        assert!(text.contains("\n    {"));
        let stored: Vec<GenerationResult> = serde_json::from_str(&text).unwrap();
        assert_eq!(stored, results());
        assert!(!dir.path().join(".metadata.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_empty_files_are_removed_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("empty.png"), b"").unwrap();
        std::fs::write(nested.join("empty.jpeg"), b"").unwrap();
        std::fs::write(nested.join("full.jpeg"), b"data").unwrap();

        let report = finalize_run(&[], dir.path()).await.unwrap();

        let mut removed = report.removed_files.clone();
        removed.sort();
        let mut expected = vec![nested.join("empty.jpeg"), dir.path().join("empty.png")];
        expected.sort();
        assert_eq!(removed, expected);
        assert!(nested.join("full.jpeg").exists());
        assert_eq!(std::fs::read_to_string(report.metadata_path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_metadata_write_failure_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let err = write_metadata(&results(), &blocker).await.unwrap_err();
        assert!(matches!(err, FluxError::PersistenceError(_)));
    }

    #[tokio::test]
    async fn test_sweep_skips_unreadable_root() {
        let dir = tempfile::tempdir().unwrap();
        let removed = remove_empty_files(&dir.path().join("missing")).await.unwrap();
        assert!(removed.is_empty());
    }
}
