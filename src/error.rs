//! Error kinds for the extraction pipeline.
//!
//! Per-subsystem failures are `anyhow` chains internally; this enum is the
//! public surface the orchestrator and CLI pattern-match on.

use std::fmt;

/// Top-level error kinds for scraping operations.
#[derive(Debug, Clone)]
pub enum ScrapeError {
    /// Positioning the browser on a leaderboard section failed.
    Navigation(String),
    /// No leaderboard candidates were found on the site.
    DiscoveryEmpty(String),
    /// A UI interaction (switcher click, row-selector selection) failed.
    Interaction(String),
    /// Page collection (screenshot, markdown projection, pagination fetch)
    /// failed. Non-fatal; fields are left empty.
    Collection(String),
    /// No strategy returned enough entries.
    ExtractionEmpty(String),
    /// Per-site deadline exceeded.
    Timeout(String),
    /// Circuit breaker is open for the domain.
    CircuitOpen(String),
    /// Browser/CDP failure.
    Browser(String),
    /// Snapshot or datastore write failure.
    Persistence(String),
    /// Configuration error.
    Config(String),
    /// Other errors.
    Other(String),
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigation(msg) => write!(f, "Navigation failed: {msg}"),
            Self::DiscoveryEmpty(domain) => {
                write!(f, "No leaderboards discovered on {domain}")
            }
            Self::Interaction(msg) => write!(f, "Interaction failed: {msg}"),
            Self::Collection(msg) => write!(f, "Collection failed: {msg}"),
            Self::ExtractionEmpty(name) => {
                write!(f, "No strategy extracted usable entries for {name}")
            }
            Self::Timeout(domain) => write!(f, "Site workflow timed out for {domain}"),
            Self::CircuitOpen(domain) => write!(f, "Circuit breaker open for {domain}"),
            Self::Browser(msg) => write!(f, "Browser error: {msg}"),
            Self::Persistence(msg) => write!(f, "Persistence error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "Scrape error: {msg}"),
        }
    }
}

impl std::error::Error for ScrapeError {}

impl From<anyhow::Error> for ScrapeError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the full context chain in the message
        Self::Other(format!("{err:#}"))
    }
}

/// Convenience alias for Result with [`ScrapeError`].
pub type ScrapeResult<T> = Result<T, ScrapeError>;
