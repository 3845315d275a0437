//! Core configuration type for scraping runs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for scraping operations.
///
/// Construct through [`super::ScrapeConfigBuilder`]; fields are read through
/// the getters in `getters.rs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Run browsers headless.
    pub(crate) headless: bool,
    /// Production mode: datastore writes enabled in the external layer.
    pub(crate) production: bool,

    /// Root for JSON snapshots (`results/current/<domain>.json`).
    pub(crate) results_dir: PathBuf,
    /// Optional debug artifact directory (TTL-cleaned).
    pub(crate) debug_dir: Option<PathBuf>,
    pub(crate) keywords_path: PathBuf,
    pub(crate) websites_path: PathBuf,
    pub(crate) profiles_path: PathBuf,

    /// Inter-site worker count.
    pub(crate) workers: usize,
    /// Delay between site starts.
    pub(crate) start_delay: Duration,
    /// Cap on sites processed in one batch.
    pub(crate) limit: Option<usize>,
    /// Skip sites scraped more recently than this.
    pub(crate) refresh_interval: Duration,

    /// Per-site hard deadline.
    pub(crate) site_timeout: Duration,
    /// Minimum fused entries for a result to be emitted.
    pub(crate) min_entries: usize,
    /// Capture viewport screenshots during collection.
    pub(crate) screenshots: bool,
    /// Invoke the advisor on empty extractions.
    pub(crate) advisor_enabled: bool,

    /// Website-name tokens rejected as usernames, on top of the domain.
    pub(crate) website_names: Vec<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        super::ScrapeConfigBuilder::new()
            .build()
            .expect("default configuration is valid")
    }
}
