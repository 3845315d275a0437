//! Getter methods for [`ScrapeConfig`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::ScrapeConfig;

impl ScrapeConfig {
    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn production(&self) -> bool {
        self.production
    }

    #[must_use]
    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Directory for current snapshots: `<results>/current`.
    #[must_use]
    pub fn current_results_dir(&self) -> PathBuf {
        self.results_dir.join("current")
    }

    #[must_use]
    pub fn debug_dir(&self) -> Option<&Path> {
        self.debug_dir.as_deref()
    }

    #[must_use]
    pub fn keywords_path(&self) -> &Path {
        &self.keywords_path
    }

    #[must_use]
    pub fn websites_path(&self) -> &Path {
        &self.websites_path
    }

    #[must_use]
    pub fn profiles_path(&self) -> &Path {
        &self.profiles_path
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[must_use]
    pub fn start_delay(&self) -> Duration {
        self.start_delay
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    #[must_use]
    pub fn site_timeout(&self) -> Duration {
        self.site_timeout
    }

    #[must_use]
    pub fn min_entries(&self) -> usize {
        self.min_entries
    }

    #[must_use]
    pub fn screenshots(&self) -> bool {
        self.screenshots
    }

    #[must_use]
    pub fn advisor_enabled(&self) -> bool {
        self.advisor_enabled
    }

    #[must_use]
    pub fn website_names(&self) -> &[String] {
        &self.website_names
    }
}
