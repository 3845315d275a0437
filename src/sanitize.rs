//! Entry sanitizer: UI noise, site-name rows and aggregate rows.
//!
//! Runs after fusion, before normalization. Rejections happen in a fixed
//! order so the report stays explainable; the ≥10× outlier rule only flags,
//! it never removes.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::{RawEntry, HIDDEN_USERNAME};
use crate::strategies::markdown::is_ui_text;

static AGGREGATE_USERNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(total|sum|average|prize pool|grand total|volume|duration|ending|remaining|participants|entries|players|time (left|remaining))|^\d+\s*(days?|hours?|minutes?|mins?|seconds?|secs?)\b",
    )
    .expect("hardcoded aggregate username regex is valid")
});

static DOMAIN_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(com|net|org|io|gg|casino|bet|vip|app|xyz)$")
        .expect("hardcoded domain suffix regex is valid")
});

static EMAIL_SHAPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("hardcoded email regex is valid")
});

/// Sanitizer output: surviving entries, per-entry rejection reasons, and
/// advisory flags that do not remove anything.
#[derive(Debug, Default)]
pub struct SanitizeReport {
    pub entries: Vec<RawEntry>,
    pub rejected: Vec<(RawEntry, String)>,
    pub flags: Vec<String>,
}

/// Sanitize fused entries. `site_names` carries the domain and any
/// configured website-name tokens whose appearance as a username means the
/// row is branding, not a player.
#[must_use]
pub fn sanitize(entries: Vec<RawEntry>, site_names: &[String]) -> SanitizeReport {
    let mut report = SanitizeReport::default();
    let mut kept: Vec<RawEntry> = Vec::new();

    for entry in entries {
        if let Some(reason) = reject_reason(&entry, site_names) {
            report.rejected.push((entry, reason));
        } else {
            kept.push(entry);
        }
    }

    filter_aggregate_rows(&mut kept, &mut report);
    report.entries = kept;
    report
}

fn reject_reason(entry: &RawEntry, site_names: &[String]) -> Option<String> {
    let name = entry.username.trim();

    if name.is_empty() {
        return Some("empty username".into());
    }
    if name != HIDDEN_USERNAME && is_ui_text(name) {
        return Some(format!("ui text as username: {name:?}"));
    }
    let letters = name.chars().filter(|c| c.is_alphabetic()).count();
    if name != HIDDEN_USERNAME && letters < 2 && !name.contains('*') {
        return Some(format!("too few letters: {name:?}"));
    }

    // Website branding rows; emails are user handles, not site names
    if !EMAIL_SHAPED.is_match(name) {
        let lower = name.to_lowercase();
        if site_names.iter().any(|s| s.to_lowercase() == lower) {
            return Some(format!("website name as username: {name:?}"));
        }
        if DOMAIN_SUFFIX.is_match(name) {
            return Some(format!("domain-shaped username: {name:?}"));
        }
    }

    if name == HIDDEN_USERNAME
        && entry.wager.unwrap_or(0.0) == 0.0
        && entry.prize.unwrap_or(0.0) == 0.0
    {
        return Some("hidden placeholder with no amounts".into());
    }

    if let Some(wager) = entry.wager
        && (wager.is_nan() || wager < 0.0)
    {
        return Some(format!("invalid wager: {wager}"));
    }

    None
}

/// Drop aggregate-stats rows: label usernames, and rows whose wager equals
/// the sum of every other wager. A wager ≥ 10× the next-highest is flagged
/// but kept.
fn filter_aggregate_rows(entries: &mut Vec<RawEntry>, report: &mut SanitizeReport) {
    entries.retain(|entry| {
        if AGGREGATE_USERNAME.is_match(entry.username.trim()) {
            report
                .rejected
                .push((entry.clone(), format!("aggregate row: {:?}", entry.username)));
            false
        } else {
            true
        }
    });

    // Total-row detection: one row's wager ≈ sum of all the others
    let wagers: Vec<f64> = entries.iter().map(|e| e.wager.unwrap_or(0.0)).collect();
    let total: f64 = wagers.iter().sum();
    let mut drop_index = None;
    for (i, &wager) in wagers.iter().enumerate() {
        let others = total - wager;
        let tolerance = (others * 0.01).max(100.0);
        // Below the tolerance scale every row would "equal the sum"
        if others <= tolerance {
            continue;
        }
        if (wager - others).abs() <= tolerance {
            drop_index = Some(i);
            break;
        }
    }
    if let Some(i) = drop_index {
        let removed = entries.remove(i);
        report
            .rejected
            .push((removed, "wager equals sum of all other rows".into()));
    }

    // ≥ 10× outlier: advisory only
    let mut sorted: Vec<f64> = entries
        .iter()
        .filter_map(|e| e.wager)
        .filter(|w| *w > 0.0)
        .collect();
    sorted.sort_by(|a, b| b.total_cmp(a));
    if sorted.len() >= 2 && sorted[0] >= sorted[1] * 10.0 {
        report.flags.push(format!(
            "top wager {:.2} is ≥10x the next-highest {:.2}",
            sorted[0], sorted[1]
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, wager: f64, prize: f64) -> RawEntry {
        let mut e = RawEntry::new(0, name);
        e.wager = Some(wager);
        e.prize = Some(prize);
        e
    }

    #[test]
    fn ui_text_and_short_names_rejected() {
        let report = sanitize(
            vec![
                entry("Show More", 10.0, 0.0),
                entry("A", 10.0, 0.0),
                entry("A*", 10.0, 0.0),
                entry("Alice", 10.0, 0.0),
            ],
            &[],
        );
        let names: Vec<&str> = report.entries.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["A*", "Alice"], "censored single letter survives");
    }

    #[test]
    fn website_names_rejected_but_emails_pass_that_check() {
        let report = sanitize(
            vec![
                entry("RollCasino", 5.0, 0.0),
                entry("stake.com", 5.0, 0.0),
                entry("bob@mail.com", 5.0, 0.0),
            ],
            &["rollcasino".to_string()],
        );
        let names: Vec<&str> = report.entries.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["bob@mail.com"]);
    }

    #[test]
    fn hidden_rows_need_amounts() {
        let report = sanitize(
            vec![entry(HIDDEN_USERNAME, 0.0, 0.0), entry(HIDDEN_USERNAME, 50.0, 0.0)],
            &[],
        );
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].wager, Some(50.0));
    }

    #[test]
    fn total_row_dropped() {
        let report = sanitize(
            vec![
                entry("Alice", 600.0, 0.0),
                entry("Bob", 400.0, 0.0),
                entry("Grand", 1000.0, 0.0),
            ],
            &[],
        );
        assert_eq!(report.entries.len(), 2);
        assert!(report
            .rejected
            .iter()
            .any(|(e, _)| e.username == "Grand"));
    }

    #[test]
    fn aggregate_labels_dropped() {
        let report = sanitize(
            vec![
                entry("Total Wagered", 99.0, 0.0),
                entry("3 days left", 0.0, 1.0),
                entry("Carol", 40.0, 0.0),
            ],
            &[],
        );
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].username, "Carol");
    }

    #[test]
    fn outlier_flagged_not_removed() {
        let report = sanitize(
            vec![
                entry("Whale", 100_000.0, 0.0),
                entry("Min", 500.0, 0.0),
                entry("Now", 400.0, 0.0),
            ],
            &[],
        );
        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.flags.len(), 1);
    }

    #[test]
    fn negative_wager_rejected() {
        let report = sanitize(vec![entry("Alice", -5.0, 0.0)], &[]);
        assert!(report.entries.is_empty());
    }
}
