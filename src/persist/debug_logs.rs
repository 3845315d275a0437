//! Debug artifacts with TTL-based cleanup.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::collector::PageCapture;

/// Write the captured page artifacts for one leaderboard to
/// `<debug_dir>/<domain>/<name>/`.
pub fn write_debug_artifacts(
    debug_dir: &Path,
    domain: &str,
    leaderboard: &str,
    capture: &PageCapture,
) -> Result<()> {
    let dir = debug_dir
        .join(sanitize_filename::sanitize(domain))
        .join(sanitize_filename::sanitize(leaderboard));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create debug dir {}", dir.display()))?;

    std::fs::write(dir.join("page.html"), &capture.html).context("failed to write page.html")?;
    std::fs::write(dir.join("page.md"), &capture.markdown).context("failed to write page.md")?;
    if let Some(screenshot) = &capture.screenshot {
        std::fs::write(dir.join("page.jpg"), screenshot).context("failed to write page.jpg")?;
    }
    let network = serde_json::json!({
        "capturedUrls": capture.network.captured_urls,
        "jsonResponses": capture.network.json_responses.len(),
        "urlPatterns": capture.network.url_patterns,
    });
    std::fs::write(dir.join("network.json"), network.to_string())
        .context("failed to write network.json")?;

    debug!(path = %dir.display(), "debug artifacts written");
    Ok(())
}

/// Delete debug artifacts older than `ttl` (default 48 h at the call site).
/// Returns how many top-level entries were removed.
pub fn cleanup_expired(debug_dir: &Path, ttl: Duration) -> usize {
    let Ok(entries) = std::fs::read_dir(debug_dir) else {
        return 0;
    };
    let mut removed = 0usize;
    for entry in entries.flatten() {
        let expired = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|m| m.elapsed().ok())
            .is_some_and(|age| age > ttl);
        if !expired {
            continue;
        }
        let path = entry.path();
        let result = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        match result {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), "debug cleanup failed: {e}"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_removes_only_expired_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let old = dir.path().join("old.example");
        let fresh = dir.path().join("fresh.example");
        std::fs::create_dir_all(&old).expect("mkdir old");
        std::fs::create_dir_all(&fresh).expect("mkdir fresh");

        // Everything is fresh: a large TTL removes nothing, a zero TTL
        // removes both
        assert_eq!(cleanup_expired(dir.path(), Duration::from_secs(3600)), 0);
        assert_eq!(cleanup_expired(dir.path(), Duration::ZERO), 2);
        assert!(!old.exists());
        assert!(!fresh.exists());
    }

    #[test]
    fn missing_dir_is_a_noop() {
        assert_eq!(
            cleanup_expired(Path::new("/nonexistent/debug"), Duration::ZERO),
            0
        );
    }
}
