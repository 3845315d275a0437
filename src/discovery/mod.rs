//! Discovery: enumerate the leaderboards a site exposes.
//!
//! A site either addresses leaderboards by URL (`/leaderboard/<keyword>`) or
//! switches between them with keyword-tagged clickable elements
//! ("switchers"). Discovery scans up to three candidate paths, dedupes
//! switchers, infers the site's URL pattern when one exists, and merges
//! profile-known leaderboards the scan missed.

use anyhow::Result;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::bypass::ChallengeBypass;
use crate::model::{DiscoveredLeaderboard, LeaderboardKind, ReachMethod, Switcher};
use crate::navigator;
use crate::page_session::PageSession;
use crate::profiles::SiteProfile;
use crate::utils::url_utils::join_path;

static URL_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/leaderboards?/([a-z0-9_-]+)/?$")
        .expect("hardcoded url keyword regex is valid")
});

static PATTERN_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*/leaderboards?/)[a-z0-9_-]+/?$")
        .expect("hardcoded pattern href regex is valid")
});

/// Paths scanned for switchers, in order.
const CANDIDATE_PATHS: &[&str] = &["/", "/leaderboard", "/leaderboards"];

/// Discovery output for one site.
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    pub leaderboards: Vec<DiscoveredLeaderboard>,
    pub switchers: Vec<Switcher>,
    /// `.../leaderboard/{}` template inferred from anchor hrefs.
    pub url_pattern: Option<String>,
}

/// Switcher scan executed in page scope. Matches element text, image alt,
/// image filename, `data-*` attributes and href segments against the
/// keyword list.
const SCAN_SWITCHERS: &str = r#"
((keywords) => {
    const found = [];
    const hrefs = [];
    const match = (s) => {
        s = String(s || '').toLowerCase();
        for (const k of keywords) if (k && s.includes(k)) return k;
        return null;
    };
    const push = (keyword, el, priority) => {
        const r = el.getBoundingClientRect();
        const visible = r.width > 0 && r.height > 0;
        found.push({
            keyword,
            x: visible ? r.x + r.width / 2 : null,
            y: visible ? r.y + r.height / 2 : null,
            priority,
            href: el.getAttribute && el.getAttribute('href'),
        });
    };
    for (const el of document.querySelectorAll('a, button, [role=button], [role=tab], [class*=switch], [class*=tab]')) {
        const href = el.getAttribute('href') || '';
        if (href) hrefs.push(href);
        let k;
        if ((k = match(href))) { push(k, el, 3); continue; }
        for (const attr of el.attributes) {
            if (attr.name.startsWith('data-') && (k = match(attr.value))) { push(k, el, 2); break; }
        }
        if (k) continue;
        if ((k = match((el.textContent || '').slice(0, 80)))) { push(k, el, 2); continue; }
        const img = el.querySelector && el.querySelector('img');
        if (img && (k = match(img.alt) || match((img.src || '').split('/').pop()))) {
            push(k, el, 1);
        }
    }
    return { found, hrefs: hrefs.slice(0, 200) };
})
"#;

#[derive(Debug, Deserialize)]
struct ScannedSwitcher {
    keyword: String,
    x: Option<f64>,
    y: Option<f64>,
    priority: i32,
    href: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ScanResult {
    found: Vec<ScannedSwitcher>,
    hrefs: Vec<String>,
}

/// Enumerate the leaderboards reachable on a site.
pub async fn enumerate(
    session: &PageSession,
    base_url: &str,
    keywords: &[String],
    profile: Option<&SiteProfile>,
    bypass: &dyn ChallengeBypass,
) -> Result<DiscoveryOutcome> {
    // Short-circuit: the incoming URL already names one leaderboard
    let current = session.current_url().await.unwrap_or_default();
    if let Some(keyword) = url_keyword(&current, keywords) {
        info!(%keyword, "URL names its leaderboard, skipping scan");
        let mut outcome = DiscoveryOutcome {
            leaderboards: vec![DiscoveredLeaderboard {
                name: keyword,
                url: Some(current),
                method: ReachMethod::UrlNavigation,
                switcher: None,
                kind: LeaderboardKind::Current,
            }],
            ..Default::default()
        };
        merge_profile_known(&mut outcome, profile);
        return Ok(outcome);
    }

    let mut all_switchers: Vec<Switcher> = Vec::new();
    let mut all_hrefs: Vec<String> = Vec::new();

    for path in CANDIDATE_PATHS {
        let Ok(url) = join_path(base_url, path) else {
            continue;
        };
        let on_target = session
            .current_url()
            .await
            .map(|u| u.trim_end_matches('/') == url.trim_end_matches('/'))
            .unwrap_or(false);
        if !on_target && navigator::navigate_with_bypass(session, &url, bypass).await.is_err() {
            debug!(%url, "candidate path unreachable");
            continue;
        }

        let script = format!("({SCAN_SWITCHERS})({})", serde_json::json!(keywords));
        let scan: ScanResult = session.eval(&script).await.unwrap_or_default();
        all_hrefs.extend(scan.hrefs);
        for s in scan.found {
            all_switchers.push(Switcher {
                keyword: s.keyword.trim().to_lowercase(),
                coordinates: s.x.zip(s.y),
                priority: s.priority + i32::from(s.href.is_some()),
                found_on_path: (*path).to_string(),
            });
        }
        // The dedicated leaderboard paths subsume the root scan
        if all_switchers.len() >= 2 && *path != "/" {
            break;
        }
    }

    let switchers = dedup_switchers(all_switchers);
    let url_pattern = infer_url_pattern(base_url, &all_hrefs);

    let mut outcome = DiscoveryOutcome {
        leaderboards: switchers
            .iter()
            .map(|s| DiscoveredLeaderboard {
                name: s.keyword.clone(),
                url: url_pattern
                    .as_ref()
                    .map(|p| p.replace("{}", &s.keyword)),
                method: ReachMethod::SwitcherClick,
                switcher: Some(s.clone()),
                kind: LeaderboardKind::Current,
            })
            .collect(),
        switchers,
        url_pattern,
    };

    // No switchers: leaderboard tabs addressed by their visible text
    if outcome.leaderboards.is_empty() {
        for tab in crate::ui::detect_leaderboard_tabs(session)
            .await
            .unwrap_or_default()
            .into_iter()
            .take(4)
        {
            outcome.leaderboards.push(DiscoveredLeaderboard {
                name: tab,
                url: None,
                method: ReachMethod::DetectedName,
                switcher: None,
                kind: LeaderboardKind::Current,
            });
        }
    }

    // A positioned page with no switchers is still one leaderboard
    if outcome.leaderboards.is_empty() {
        let now = session.current_url().await.unwrap_or_default();
        if navigator::already_positioned(&now) {
            outcome.leaderboards.push(DiscoveredLeaderboard {
                name: "default".into(),
                url: Some(now),
                method: ReachMethod::UrlNavigation,
                switcher: None,
                kind: LeaderboardKind::Current,
            });
        }
    }

    merge_profile_known(&mut outcome, profile);
    Ok(outcome)
}

/// Keyword named by the URL itself, when it is in the configured list.
#[must_use]
pub fn url_keyword(url: &str, keywords: &[String]) -> Option<String> {
    let caps = URL_KEYWORD.captures(url)?;
    let keyword = caps[1].to_lowercase();
    keywords
        .iter()
        .any(|k| k.eq_ignore_ascii_case(&keyword))
        .then_some(keyword)
}

/// Collapse duplicate keywords, preferring entries with coordinates, then
/// higher priority.
#[must_use]
pub fn dedup_switchers(switchers: Vec<Switcher>) -> Vec<Switcher> {
    let mut best: HashMap<String, Switcher> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for switcher in switchers {
        match best.get(&switcher.keyword) {
            None => {
                order.push(switcher.keyword.clone());
                best.insert(switcher.keyword.clone(), switcher);
            }
            Some(existing) => {
                let better = (switcher.coordinates.is_some(), switcher.priority)
                    > (existing.coordinates.is_some(), existing.priority);
                if better {
                    best.insert(switcher.keyword.clone(), switcher);
                }
            }
        }
    }
    order
        .into_iter()
        .filter_map(|k| best.remove(&k))
        .collect()
}

/// Infer a `/leaderboard/{}` URL template from scanned hrefs.
#[must_use]
pub fn infer_url_pattern(base_url: &str, hrefs: &[String]) -> Option<String> {
    for href in hrefs {
        if let Some(caps) = PATTERN_HREF.captures(href) {
            let prefix = &caps[1];
            let absolute = if prefix.starts_with("http") {
                format!("{prefix}{{}}")
            } else {
                join_path(base_url, prefix).ok()? + "{}"
            };
            return Some(absolute);
        }
    }
    None
}

/// Append profile-known leaderboards discovery missed.
fn merge_profile_known(outcome: &mut DiscoveryOutcome, profile: Option<&SiteProfile>) {
    let Some(profile) = profile else { return };
    for name in &profile.known_leaderboards {
        let known = name.to_lowercase();
        if outcome
            .leaderboards
            .iter()
            .any(|l| l.name.eq_ignore_ascii_case(&known))
        {
            continue;
        }
        outcome.leaderboards.push(DiscoveredLeaderboard {
            name: known.clone(),
            url: outcome.url_pattern.as_ref().map(|p| p.replace("{}", &known)),
            method: ReachMethod::ProfileKnown,
            switcher: None,
            kind: LeaderboardKind::Current,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn url_keyword_short_circuit() {
        let keywords = kw(&["roobet", "stake"]);
        assert_eq!(
            url_keyword("https://x.example/leaderboard/roobet", &keywords).as_deref(),
            Some("roobet")
        );
        assert_eq!(
            url_keyword("https://x.example/leaderboards/Stake/", &keywords).as_deref(),
            Some("stake")
        );
        assert_eq!(url_keyword("https://x.example/leaderboard/unknown", &keywords), None);
        assert_eq!(url_keyword("https://x.example/about", &keywords), None);
    }

    #[test]
    fn dedup_prefers_coordinates_then_priority() {
        let s = |kw: &str, coords: Option<(f64, f64)>, priority| Switcher {
            keyword: kw.into(),
            coordinates: coords,
            priority,
            found_on_path: "/".into(),
        };
        let out = dedup_switchers(vec![
            s("stake", None, 3),
            s("stake", Some((10.0, 10.0)), 1),
            s("roobet", None, 2),
        ]);
        assert_eq!(out.len(), 2);
        assert!(out[0].coordinates.is_some(), "coordinates win over priority");
        assert_eq!(out[0].keyword, "stake");
        assert_eq!(out[1].keyword, "roobet", "first-seen order preserved");
    }

    #[test]
    fn url_pattern_inference() {
        let pattern = infer_url_pattern(
            "https://x.example",
            &["/leaderboard/roobet".to_string(), "/promo".to_string()],
        );
        assert_eq!(
            pattern.as_deref(),
            Some("https://x.example/leaderboard/{}")
        );
        assert_eq!(infer_url_pattern("https://x.example", &["/promo".to_string()]), None);
    }
}
