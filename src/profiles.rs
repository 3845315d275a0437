//! Site profiles: per-domain knowledge carried between runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Everything the engine knows about one domain ahead of time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteProfile {
    pub domain: String,
    /// Known leaderboard path, e.g. `/leaderboards`.
    #[serde(default, rename = "leaderboardPath")]
    pub leaderboard_path: Option<String>,
    /// Leaderboard names/keywords known to exist on the site.
    #[serde(default, rename = "knownLeaderboards")]
    pub known_leaderboards: Vec<String>,
    /// Remaining advisor (vision review) invocations for this site.
    #[serde(default = "default_advisor_budget", rename = "advisorBudget")]
    pub advisor_budget: u32,
}

fn default_advisor_budget() -> u32 {
    3
}

/// Profiles keyed by domain, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    profiles: HashMap<String, SiteProfile>,
}

impl ProfileStore {
    /// Load profiles from a JSON file: `{"<domain>": {...}, ...}`. A missing
    /// file is an empty store, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profiles from {}", path.display()))?;
        let mut profiles: HashMap<String, SiteProfile> =
            serde_json::from_str(&raw).context("failed to parse profiles JSON")?;
        for (domain, profile) in &mut profiles {
            profile.domain = domain.clone();
        }
        Ok(Self { profiles })
    }

    #[must_use]
    pub fn get(&self, domain: &str) -> Option<&SiteProfile> {
        self.profiles.get(domain)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_profiles_and_fills_domains() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("profiles.json");
        std::fs::write(
            &path,
            r#"{"x.example": {"leaderboardPath": "/lb", "knownLeaderboards": ["weekly"]}}"#,
        )
        .expect("write profiles");

        let store = ProfileStore::load(&path).expect("load profiles");
        let profile = store.get("x.example").expect("profile present");
        assert_eq!(profile.domain, "x.example");
        assert_eq!(profile.leaderboard_path.as_deref(), Some("/lb"));
        assert_eq!(profile.advisor_budget, 3, "default budget applies");
    }

    #[test]
    fn missing_file_is_empty_store() {
        let store = ProfileStore::load(Path::new("/nonexistent/profiles.json")).expect("load");
        assert!(store.is_empty());
    }
}
