//! Canonical data model for leaderboard extraction.
//!
//! Every strategy produces [`RawEntry`] values; fusion, sanitization and
//! normalization rewrite them into [`LeaderboardEntry`] records which are
//! frozen inside a [`LeaderboardResult`]. One scraping pass over a domain is
//! recorded as a [`SiteRun`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel username for rows that carry rank/amounts but no visible name
/// (avatar-only rows).
pub const HIDDEN_USERNAME: &str = "[hidden]";

/// Whether a leaderboard shows the running period or a finished one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardKind {
    #[default]
    Current,
    Previous,
}

impl std::fmt::Display for LeaderboardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Previous => write!(f, "previous"),
        }
    }
}

/// Extraction strategy tag.
///
/// Strategies are a closed set so fusion can pattern-match instead of going
/// through trait objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Api,
    Markdown,
    Dom,
    Geometric,
}

impl StrategyKind {
    /// Stable label used in `source` fields and `strategiesUsed` metadata.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Markdown => "markdown",
            Self::Dom => "dom",
            Self::Geometric => "geometric",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An entry as a strategy parsed it, before fusion and normalization.
///
/// `rank == 0` means "not assigned yet"; it is legal here and forbidden in
/// emitted results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    pub rank: u32,
    pub username: String,
    pub wager: Option<f64>,
    pub prize: Option<f64>,
}

impl RawEntry {
    #[must_use]
    pub fn new(rank: u32, username: impl Into<String>) -> Self {
        Self {
            rank,
            username: username.into(),
            wager: None,
            prize: None,
        }
    }

    /// True when the entry carries at least one numeric signal besides rank.
    #[must_use]
    pub fn has_amounts(&self) -> bool {
        self.wager.is_some() || self.prize.is_some()
    }
}

/// The output of one extraction strategy over one collected page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyOutput {
    pub kind: StrategyKind,
    pub entries: Vec<RawEntry>,
    /// Strategy's own confidence in its output, 0..100.
    pub confidence: f64,
}

impl StrategyOutput {
    #[must_use]
    pub fn new(kind: StrategyKind, entries: Vec<RawEntry>, confidence: f64) -> Self {
        Self {
            kind,
            entries,
            confidence,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A normalized, frozen leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub username: String,
    pub wager: f64,
    pub prize: f64,
    #[serde(rename = "extractedAt")]
    pub extracted_at: DateTime<Utc>,
    #[serde(rename = "leaderboard_type")]
    pub leaderboard_kind: LeaderboardKind,
}

/// Validation verdict attached to every emitted result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub completeness: bool,
    pub sanity: bool,
    #[serde(rename = "strategyAgreement")]
    pub strategy_agreement: bool,
    #[serde(rename = "confidencePenalty")]
    pub confidence_penalty: f64,
    /// Human-readable reasons for any failed check.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl ValidationReport {
    /// A report that passes every check with zero penalty.
    #[must_use]
    pub fn passing() -> Self {
        Self {
            valid: true,
            completeness: true,
            sanity: true,
            strategy_agreement: true,
            confidence_penalty: 0.0,
            issues: Vec::new(),
        }
    }
}

/// One leaderboard extracted from one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardResult {
    pub id: Uuid,
    #[serde(rename = "extractionId")]
    pub extraction_id: Uuid,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: LeaderboardKind,
    /// Which strategy (or combination) produced the entries.
    pub source: String,
    pub entries: Vec<LeaderboardEntry>,
    /// Explicit prize table when the page advertises one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prizes: Vec<f64>,
    #[serde(rename = "totalPrizePool")]
    pub total_prize_pool: f64,
    #[serde(rename = "totalWagered")]
    pub total_wagered: f64,
    /// Post-penalty confidence, clamped to 0..100.
    pub confidence: f64,
    #[serde(rename = "scrapedAt")]
    pub scraped_at: DateTime<Utc>,
    pub validation: ValidationReport,
}

impl LeaderboardResult {
    /// Recompute the aggregate invariants from `entries` and `prizes`.
    ///
    /// `totalWagered` is always the entry sum; `totalPrizePool` prefers the
    /// explicit prize table when present.
    pub fn recompute_totals(&mut self) {
        self.total_wagered = self.entries.iter().map(|e| e.wager).sum();
        self.total_prize_pool = if self.prizes.is_empty() {
            self.entries.iter().map(|e| e.prize).sum()
        } else {
            self.prizes.iter().sum()
        };
    }
}

/// Run-level metadata counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetadata {
    #[serde(rename = "leaderboardsDiscovered")]
    pub leaderboards_discovered: usize,
    #[serde(rename = "leaderboardsScraped")]
    pub leaderboards_scraped: usize,
    /// Strategy labels in first-seen order.
    #[serde(rename = "strategiesUsed")]
    pub strategies_used: Vec<String>,
}

impl RunMetadata {
    /// Append a strategy label, preserving first-seen order.
    pub fn record_strategy(&mut self, label: &str) {
        if !self.strategies_used.iter().any(|s| s == label) {
            self.strategies_used.push(label.to_string());
        }
    }
}

/// One scraping pass over one domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRun {
    pub domain: String,
    #[serde(rename = "extractionId")]
    pub extraction_id: Uuid,
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "completedAt")]
    pub completed_at: Option<DateTime<Utc>>,
    pub results: Vec<LeaderboardResult>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(default, rename = "timedOut")]
    pub timed_out: bool,
    pub metadata: RunMetadata,
}

impl SiteRun {
    #[must_use]
    pub fn begin(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            extraction_id: Uuid::new_v4(),
            started_at: Utc::now(),
            completed_at: None,
            results: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            timed_out: false,
            metadata: RunMetadata::default(),
        }
    }

    /// Record an error against the run without aborting it.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn record_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// A run succeeded when at least one leaderboard produced a result.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !self.results.is_empty()
    }
}

/// Geometry and text of one rendered block element, captured in-page.
///
/// The geometric strategy works purely over these boxes, so it never touches
/// the browser after collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    pub tag: String,
    #[serde(default)]
    pub classes: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutBox {
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// A clickable element that selects one of several leaderboards on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Switcher {
    /// Normalized keyword the element was tagged with.
    pub keyword: String,
    /// Pointer position to click, when one was resolved.
    pub coordinates: Option<(f64, f64)>,
    pub priority: i32,
    #[serde(rename = "foundOnPath")]
    pub found_on_path: String,
}

/// How the orchestrator reaches a discovered leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReachMethod {
    /// Click a switcher element on the already-loaded page.
    SwitcherClick,
    /// Click a tab/button matched by its visible text.
    DetectedName,
    /// Navigate directly to a URL.
    UrlNavigation,
    /// Known from the site profile rather than discovered on the page.
    ProfileKnown,
}

impl ReachMethod {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SwitcherClick => "switcher-click",
            Self::DetectedName => "detected-name",
            Self::UrlNavigation => "url-navigation",
            Self::ProfileKnown => "profile-known",
        }
    }
}

/// One leaderboard the discovery pass decided to scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredLeaderboard {
    pub name: String,
    /// Direct URL when the leaderboard is URL-addressable.
    pub url: Option<String>,
    pub method: ReachMethod,
    pub switcher: Option<Switcher>,
    pub kind: LeaderboardKind,
}
