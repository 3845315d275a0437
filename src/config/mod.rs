//! Configuration for scraping runs.
//!
//! `ScrapeConfig` carries everything a run needs: paths for the keyword /
//! website / profile inputs, output directories, worker counts, and the
//! feature toggles. The builder applies validation and sensible defaults.

pub mod builder;
pub mod getters;
pub mod types;

pub use builder::ScrapeConfigBuilder;
pub use types::ScrapeConfig;
