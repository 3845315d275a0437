//! Keyword cache: tokens that tag leaderboard switchers.
//!
//! Loaded once per run from `keywords.txt` (one lowercase token per line)
//! into a process-wide cache. Reloads are last-writer-wins.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::path::Path;
use tracing::info;

static CACHE: Lazy<RwLock<Vec<String>>> = Lazy::new(|| RwLock::new(Vec::new()));

/// Parse keyword file content: one token per line, lowercased; `#` comments
/// and blanks skipped.
#[must_use]
pub fn parse(content: &str) -> Vec<String> {
    let mut keywords: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_lowercase)
        .collect();
    keywords.dedup();
    keywords
}

/// Load `keywords.txt` into the process-wide cache. A missing file leaves
/// the cache empty.
pub fn load(path: &Path) -> Result<usize> {
    let keywords = if path.exists() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read keywords from {}", path.display()))?;
        parse(&raw)
    } else {
        Vec::new()
    };
    let count = keywords.len();
    *CACHE.write() = keywords;
    info!(count, "keyword cache loaded");
    Ok(count)
}

/// Snapshot of the cached keywords.
#[must_use]
pub fn all() -> Vec<String> {
    CACHE.read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes() {
        let keywords = parse("Roobet\n# comment\n\nSTAKE\nstake\n");
        assert_eq!(keywords, vec!["roobet".to_string(), "stake".to_string()]);
    }
}
