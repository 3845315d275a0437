//! Shared configuration constants.
//!
//! Default values used throughout the codebase to ensure consistency and
//! avoid magic numbers.

use std::time::Duration;

/// Chrome user agent string for stealth mode
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
/// Next update: 2025-04-29 (quarterly schedule)
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Viewport applied to every page session.
pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 1080;

/// Hard deadline for one site's whole workflow.
pub const SITE_TIMEOUT: Duration = Duration::from_secs(300);

/// Upper bound on waiting for network idle after an interaction.
pub const NETWORK_IDLE_BOUND: Duration = Duration::from_millis(2000);

/// Delay between row-count stability polls.
pub const ROW_POLL_INTERVAL: Duration = Duration::from_millis(600);

/// Row-count polls per readiness check.
pub const ROW_POLL_COUNT: usize = 3;

/// Scroll-until-stable: polls with an unchanged row count before stopping.
pub const SCROLL_STABLE_POLLS: usize = 3;

/// Maximum Show-More clicks per leaderboard.
pub const MAX_SHOW_MORE_CLICKS: usize = 25;

/// Extra paginated-API pages fetched beyond the first.
pub const MAX_EXTRA_PAGES: u32 = 5;

/// Markdown projection size cap.
pub const MAX_MARKDOWN_BYTES: usize = 1024 * 1024;

/// Minimum fused entries for a leaderboard result to be emitted.
pub const MIN_ENTRIES: usize = 2;

/// Debug artifact time-to-live before cleanup.
pub const DEBUG_LOG_TTL: Duration = Duration::from_secs(48 * 3600);

/// Per-site refresh interval for batch runs.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

/// Grace given to in-flight sites on shutdown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);
