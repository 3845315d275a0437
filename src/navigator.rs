//! Navigator: position the browser on a site's leaderboard section.
//!
//! Strategy order: profile-known path, nav/header anchor scan, SPA tab
//! click, then the standard paths. Fails only when no strategy lands.

use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bypass::{ChallengeBypass, ChallengeKind};
use crate::page_session::PageSession;
use crate::ui;
use crate::utils::url_utils::{join_path, same_domain};

static LEADERBOARD_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/leaderboards?\b").expect("hardcoded leaderboard path regex is valid")
});

static HISTORICAL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)prev-|previous-|past-|history|archive")
        .expect("hardcoded historical marker regex is valid")
});

/// Standard leaderboard paths probed last.
const STANDARD_PATHS: &[&str] = &["/leaderboards", "/leaderboard", "/lb", "/rankings"];

/// Grace after network idle for client-side rendering.
const RENDER_GRACE: Duration = Duration::from_millis(1200);

#[derive(Debug, Error)]
#[error("navigation failed for {base_url}: {reason}")]
pub struct NavigationFailed {
    pub base_url: String,
    pub reason: String,
}

/// Anchor scan executed in page scope: hrefs and texts of leaderboard links
/// inside nav/header regions, non-historical ones first.
const SCAN_NAV_LINKS: &str = r#"
(() => {
    const historical = /prev-|previous-|past-|history|archive/i;
    const results = [];
    const scopes = document.querySelectorAll('nav, header, [role=navigation]');
    for (const scope of scopes) {
        for (const a of scope.querySelectorAll('a[href]')) {
            const href = a.getAttribute('href') || '';
            const text = (a.textContent || '').trim();
            if (!/leaderboard/i.test(href) && !/leaderboard/i.test(text)) continue;
            results.push({
                href,
                text,
                historical: historical.test(href) || historical.test(text),
            });
        }
    }
    results.sort((a, b) => Number(a.historical) - Number(b.historical));
    return results.slice(0, 10);
})()
"#;

#[derive(Debug, serde::Deserialize)]
struct NavLink {
    href: String,
    #[allow(dead_code)]
    text: String,
    historical: bool,
}

/// Position the page on the site's leaderboard section.
pub async fn position(
    session: &PageSession,
    base_url: &str,
    profile_path: Option<&str>,
    bypass: &dyn ChallengeBypass,
) -> Result<(), NavigationFailed> {
    let fail = |reason: String| NavigationFailed {
        base_url: base_url.to_string(),
        reason,
    };

    let current = session.current_url().await.unwrap_or_default();
    if already_positioned(&current) {
        debug!(url = %current, "already on a leaderboard URL");
        return Ok(());
    }

    // Make sure we are on the right domain before any scanning
    if current.is_empty() || current == "about:blank" || !same_domain(&current, base_url) {
        navigate_with_bypass(session, base_url, bypass)
            .await
            .map_err(|e| fail(format!("base navigation failed: {e:#}")))?;
    }

    // 1. Profile-known path
    if let Some(path) = profile_path {
        if let Ok(url) = join_path(base_url, path)
            && try_navigate(session, &url, bypass).await
        {
            info!(%url, "positioned via profile-known path");
            return Ok(());
        }
        warn!(%path, "profile-known leaderboard path did not land");
    }

    // 2. Nav/header anchor scan
    let links: Vec<NavLink> = session.eval(SCAN_NAV_LINKS).await.unwrap_or_default();
    for link in links.iter().filter(|l| !l.historical).chain(links.iter()) {
        let Ok(url) = join_path(base_url, &link.href) else {
            continue;
        };
        if try_navigate(session, &url, bypass).await {
            info!(%url, "positioned via nav link");
            return Ok(());
        }
    }

    // 3. SPA leaderboard elements
    if let Ok(tabs) = ui::detect_leaderboard_tabs(session).await {
        for tab in tabs {
            if ui::click_by_text(session, &tab).await.unwrap_or(false) {
                ui::wait_for_leaderboard_ready(session).await.ok();
                let now = session.current_url().await.unwrap_or_default();
                if already_positioned(&now) || ui::row_count(session).await.unwrap_or(0) >= 3 {
                    info!(%tab, "positioned via SPA tab click");
                    return Ok(());
                }
            }
        }
    }

    // 4. Standard paths
    for path in STANDARD_PATHS {
        let Ok(url) = join_path(base_url, path) else {
            continue;
        };
        if try_navigate(session, &url, bypass).await {
            info!(%url, "positioned via standard path");
            return Ok(());
        }
    }

    Err(fail("no strategy positioned the page".into()))
}

/// Whether a URL already points at a live (non-historical) leaderboard.
#[must_use]
pub fn already_positioned(url: &str) -> bool {
    LEADERBOARD_PATH.is_match(url) && !HISTORICAL_MARKER.is_match(url)
}

async fn try_navigate(session: &PageSession, url: &str, bypass: &dyn ChallengeBypass) -> bool {
    match navigate_with_bypass(session, url, bypass).await {
        Ok(()) => {
            // A 404 page or an empty shell does not count as positioned
            let rows = ui::row_count(session).await.unwrap_or(0);
            let now = session.current_url().await.unwrap_or_default();
            rows > 0 || already_positioned(&now)
        }
        Err(e) => {
            debug!(url, "navigation attempt failed: {e:#}");
            false
        }
    }
}

/// Navigate and clear any interstitial challenge.
///
/// Goes to the URL, waits for a key leaderboard selector (bounded), hands a
/// detected challenge to the bypass collaborator, then waits for network
/// idle plus a rendering grace.
pub async fn navigate_with_bypass(
    session: &PageSession,
    url: &str,
    bypass: &dyn ChallengeBypass,
) -> Result<()> {
    session
        .page()
        .goto(url)
        .await
        .with_context(|| format!("goto {url} failed"))?;
    session.page().wait_for_navigation().await.ok();

    // Bounded wait for leaderboard-shaped content to exist at all
    let selector_wait = async {
        for _ in 0..10 {
            let present: bool = session
                .eval("Boolean(document.querySelector('table, [class*=leaderboard], [class*=ranking]'))")
                .await
                .unwrap_or(false);
            if present {
                return;
            }
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
    };
    selector_wait.await;

    let detection = bypass.detect(session).await;
    if let Ok(detection) = detection
        && detection.kind != ChallengeKind::None
    {
        info!(kind = ?detection.kind, "interstitial challenge detected");
        let outcome = bypass
            .handle(session)
            .await
            .context("challenge handling failed")?;
        if !outcome.success {
            anyhow::bail!(
                "challenge bypass failed: {}",
                outcome.error.unwrap_or_else(|| "unknown".into())
            );
        }
    }

    ui::wait_for_leaderboard_ready(session).await.ok();
    tokio::time::sleep(RENDER_GRACE).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positioned_urls() {
        assert!(already_positioned("https://x.example/leaderboard"));
        assert!(already_positioned("https://x.example/leaderboards/weekly"));
        assert!(!already_positioned("https://x.example/leaderboard/history"));
        assert!(!already_positioned("https://x.example/prev-leaderboard"));
        assert!(!already_positioned("https://x.example/promotions"));
    }
}
