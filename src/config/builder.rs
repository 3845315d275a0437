//! Builder for [`ScrapeConfig`] with validation and defaults.

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::time::Duration;

use super::types::ScrapeConfig;
use crate::utils::constants::{REFRESH_INTERVAL, SITE_TIMEOUT};

#[derive(Debug, Clone)]
pub struct ScrapeConfigBuilder {
    headless: bool,
    production: bool,
    results_dir: PathBuf,
    debug_dir: Option<PathBuf>,
    keywords_path: PathBuf,
    websites_path: PathBuf,
    profiles_path: PathBuf,
    workers: usize,
    start_delay: Duration,
    limit: Option<usize>,
    refresh_interval: Duration,
    site_timeout: Duration,
    min_entries: usize,
    screenshots: bool,
    advisor_enabled: bool,
    website_names: Vec<String>,
}

impl Default for ScrapeConfigBuilder {
    fn default() -> Self {
        Self {
            headless: true,
            production: false,
            results_dir: PathBuf::from("results"),
            debug_dir: None,
            keywords_path: PathBuf::from("keywords.txt"),
            websites_path: PathBuf::from("websites.txt"),
            profiles_path: PathBuf::from("profiles.json"),
            workers: default_workers(),
            start_delay: Duration::from_millis(500),
            limit: None,
            refresh_interval: REFRESH_INTERVAL,
            site_timeout: SITE_TIMEOUT,
            min_entries: 2,
            screenshots: true,
            advisor_enabled: false,
            website_names: Vec::new(),
        }
    }
}

fn default_workers() -> usize {
    num_cpus::get().min(4).max(1)
}

impl ScrapeConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    #[must_use]
    pub fn results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    #[must_use]
    pub fn debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn keywords_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.keywords_path = path.into();
        self
    }

    #[must_use]
    pub fn websites_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.websites_path = path.into();
        self
    }

    #[must_use]
    pub fn profiles_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.profiles_path = path.into();
        self
    }

    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    #[must_use]
    pub fn site_timeout(mut self, timeout: Duration) -> Self {
        self.site_timeout = timeout;
        self
    }

    #[must_use]
    pub fn min_entries(mut self, min: usize) -> Self {
        self.min_entries = min;
        self
    }

    #[must_use]
    pub fn screenshots(mut self, enabled: bool) -> Self {
        self.screenshots = enabled;
        self
    }

    #[must_use]
    pub fn advisor_enabled(mut self, enabled: bool) -> Self {
        self.advisor_enabled = enabled;
        self
    }

    #[must_use]
    pub fn website_names(mut self, names: Vec<String>) -> Self {
        self.website_names = names;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<ScrapeConfig> {
        if self.workers == 0 || self.workers > 64 {
            return Err(anyhow!("workers must be in 1..=64, got {}", self.workers));
        }
        if self.min_entries < 2 {
            return Err(anyhow!(
                "min_entries below 2 would emit degenerate leaderboards"
            ));
        }
        if self.site_timeout < Duration::from_secs(10) {
            return Err(anyhow!("site_timeout below 10s cannot finish navigation"));
        }
        Ok(ScrapeConfig {
            headless: self.headless,
            production: self.production,
            results_dir: self.results_dir,
            debug_dir: self.debug_dir,
            keywords_path: self.keywords_path,
            websites_path: self.websites_path,
            profiles_path: self.profiles_path,
            workers: self.workers,
            start_delay: self.start_delay,
            limit: self.limit,
            refresh_interval: self.refresh_interval,
            site_timeout: self.site_timeout,
            min_entries: self.min_entries,
            screenshots: self.screenshots,
            advisor_enabled: self.advisor_enabled,
            website_names: self.website_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let config = ScrapeConfigBuilder::new().build().expect("defaults valid");
        assert!(config.headless);
        assert_eq!(config.min_entries, 2);
        assert!(config.workers >= 1);
    }

    #[test]
    fn validation_rejects_degenerate_values() {
        assert!(ScrapeConfigBuilder::new().workers(0).build().is_err());
        assert!(ScrapeConfigBuilder::new().min_entries(1).build().is_err());
        assert!(
            ScrapeConfigBuilder::new()
                .site_timeout(Duration::from_secs(1))
                .build()
                .is_err()
        );
    }
}
