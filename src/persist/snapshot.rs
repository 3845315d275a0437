//! Per-site JSON snapshots under `results/current/<domain>.json`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::model::SiteRun;

fn snapshot_path(dir: &Path, domain: &str) -> PathBuf {
    let safe = sanitize_filename::sanitize(domain);
    dir.join(format!("{safe}.json"))
}

/// Write a site run snapshot atomically (temp file + rename).
pub fn write_snapshot(dir: &Path, run: &SiteRun) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create snapshot dir {}", dir.display()))?;

    let path = snapshot_path(dir, &run.domain);
    let json = serde_json::to_string_pretty(run).context("failed to serialize site run")?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .with_context(|| format!("failed to write snapshot to {}", tmp.display()))?;
    std::fs::rename(&tmp, &path)
        .with_context(|| format!("failed to move snapshot into place at {}", path.display()))?;

    info!(domain = %run.domain, path = %path.display(), "snapshot written");
    Ok(())
}

/// Read a previously written snapshot.
pub fn read_snapshot(dir: &Path, domain: &str) -> Result<SiteRun> {
    let path = snapshot_path(dir, domain);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&raw).context("failed to parse snapshot JSON")
}

/// Age of a domain's snapshot, if one exists.
#[must_use]
pub fn snapshot_age(dir: &Path, domain: &str) -> Option<Duration> {
    let metadata = std::fs::metadata(snapshot_path(dir, domain)).ok()?;
    metadata.modified().ok()?.elapsed().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut run = SiteRun::begin("x.example");
        run.record_error("something minor");
        run.metadata.record_strategy("api");
        run.completed_at = Some(chrono::Utc::now());

        write_snapshot(dir.path(), &run).expect("write snapshot");
        let loaded = read_snapshot(dir.path(), "x.example").expect("read snapshot");
        assert_eq!(loaded.domain, run.domain);
        assert_eq!(loaded.extraction_id, run.extraction_id);
        assert_eq!(loaded.errors, run.errors);
        assert_eq!(loaded.metadata.strategies_used, vec!["api"]);

        assert!(snapshot_age(dir.path(), "x.example").is_some());
        assert!(snapshot_age(dir.path(), "missing.example").is_none());
    }

    #[test]
    fn hostile_domain_names_become_safe_filenames() {
        let dir = tempfile::tempdir().expect("tempdir");
        let run = SiteRun::begin("evil/../../etc/passwd");
        write_snapshot(dir.path(), &run).expect("write snapshot");
        // Nothing escapes the snapshot directory
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .collect();
        assert_eq!(entries.len(), 1);
    }
}
