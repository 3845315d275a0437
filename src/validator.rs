//! Dataset validation: completeness, sanity, agreement, penalty, warnings.
//!
//! The three channels stay orthogonal: validation failures subtract
//! confidence, warnings only annotate the result, and errors never originate
//! here.

use std::collections::HashMap;

use crate::model::{LeaderboardEntry, LeaderboardResult, ValidationReport, HIDDEN_USERNAME};

/// Knobs for the validation pass.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorConfig {
    /// Minimum rows for a dataset to count as complete.
    pub min_rows: usize,
    /// Record the first rank gap when ranks are not sequential.
    pub check_sequential: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            check_sequential: true,
        }
    }
}

const PENALTY_COMPLETENESS: f64 = 15.0;
const PENALTY_SANITY: f64 = 10.0;
const PENALTY_AGREEMENT: f64 = 20.0;

/// Agreement below this is low confidence.
const AGREEMENT_FLOOR: f64 = 0.7;

/// Validate a normalized dataset.
///
/// `overall_agreement` is `None` when only one strategy produced entries;
/// the agreement check then passes (the single-source penalty was already
/// noted by fusion).
#[must_use]
pub fn validate(
    entries: &[LeaderboardEntry],
    overall_agreement: Option<f64>,
    config: ValidatorConfig,
) -> ValidationReport {
    let mut issues = Vec::new();

    let completeness = check_completeness(entries, config, &mut issues);
    let sanity = check_sanity(entries, &mut issues);
    let strategy_agreement = match overall_agreement {
        Some(agreement) if agreement < AGREEMENT_FLOOR => {
            issues.push(format!("low strategy agreement: {agreement:.2}"));
            false
        }
        _ => true,
    };

    let mut penalty = 0.0;
    if !completeness {
        penalty += PENALTY_COMPLETENESS;
    }
    if !sanity {
        penalty += PENALTY_SANITY;
    }
    if !strategy_agreement {
        penalty += PENALTY_AGREEMENT;
    }

    ValidationReport {
        valid: completeness && sanity && strategy_agreement,
        completeness,
        sanity,
        strategy_agreement,
        confidence_penalty: penalty,
        issues,
    }
}

fn check_completeness(
    entries: &[LeaderboardEntry],
    config: ValidatorConfig,
    issues: &mut Vec<String>,
) -> bool {
    let mut ok = true;
    if entries.len() < config.min_rows {
        issues.push(format!(
            "row count {} below minimum {}",
            entries.len(),
            config.min_rows
        ));
        ok = false;
    }
    if entries.is_empty() {
        return ok;
    }

    let max_rank = entries.iter().map(|e| e.rank).max().unwrap_or(0);
    if max_rank as usize != entries.len() {
        issues.push(format!(
            "rank_count_mismatch: max rank {} vs {} rows",
            max_rank,
            entries.len()
        ));
        ok = false;
    }

    let mut seen = HashMap::new();
    for entry in entries {
        if let Some(prev) = seen.insert(entry.rank, &entry.username) {
            issues.push(format!(
                "duplicate rank {}: {:?} and {:?}",
                entry.rank, prev, entry.username
            ));
            ok = false;
            break;
        }
    }

    if config.check_sequential {
        let mut expected = 1u32;
        for entry in entries {
            if entry.rank != expected {
                issues.push(format!(
                    "rank gap: expected {expected}, found {}",
                    entry.rank
                ));
                ok = false;
                break;
            }
            expected += 1;
        }
    }
    ok
}

fn check_sanity(entries: &[LeaderboardEntry], issues: &mut Vec<String>) -> bool {
    for entry in entries {
        if entry.username.trim().is_empty() {
            issues.push(format!("empty username at rank {}", entry.rank));
            return false;
        }
        if !entry.wager.is_finite() || entry.wager < 0.0 {
            issues.push(format!("negative or non-finite wager at rank {}", entry.rank));
            return false;
        }
        if !entry.prize.is_finite() || entry.prize < 0.0 {
            issues.push(format!("negative or non-finite prize at rank {}", entry.rank));
            return false;
        }
    }
    true
}

/// Fraction of adjacent pairs violating a non-increasing order tolerated
/// before warning.
const ORDER_VIOLATION_TOLERANCE: f64 = 0.2;

/// Compute advisory warnings for an emitted result. These never change the
/// confidence.
#[must_use]
pub fn collect_warnings(result: &LeaderboardResult) -> Vec<String> {
    let entries = &result.entries;
    let mut warnings = Vec::new();
    if entries.len() < 2 {
        return warnings;
    }

    if let Some(ratio) = order_violation_ratio(entries, |e| e.prize) {
        if ratio > ORDER_VIOLATION_TOLERANCE {
            warnings.push(format!(
                "{}: prize order increases with rank on {:.0}% of adjacent pairs",
                result.name,
                ratio * 100.0
            ));
        }
    }
    if let Some(ratio) = order_violation_ratio(entries, |e| e.wager) {
        if ratio > ORDER_VIOLATION_TOLERANCE {
            warnings.push(format!(
                "{}: wager order increases with rank on {:.0}% of adjacent pairs",
                result.name,
                ratio * 100.0
            ));
        }
    }

    // Prize values tracking the rank number for deep ranks are almost always
    // a DOM extraction artifact (the rank column read as the prize column)
    let rank_like = entries
        .iter()
        .filter(|e| e.rank > 20 && e.prize > 0.0 && (e.prize - f64::from(e.rank)).abs() <= 1.0)
        .count();
    if rank_like >= 3 {
        warnings.push(format!(
            "{}: {rank_like} prizes nearly equal their rank number (extraction artifact?)",
            result.name
        ));
    }

    let prize_over_wager = entries
        .iter()
        .filter(|e| e.wager > 0.0 && e.prize > e.wager)
        .count();
    if prize_over_wager > 3
        && prize_over_wager as f64 > entries.len() as f64 * ORDER_VIOLATION_TOLERANCE
    {
        warnings.push(format!(
            "{}: prize exceeds wager on {prize_over_wager} entries",
            result.name
        ));
    }

    if entries.iter().all(|e| e.wager == 0.0) {
        warnings.push(format!("{}: all wagers are zero", result.name));
    }

    let mut wager_counts: HashMap<u64, usize> = HashMap::new();
    for entry in entries {
        if entry.wager > 0.0 {
            *wager_counts.entry(entry.wager.to_bits()).or_default() += 1;
        }
    }
    if let Some((bits, count)) = wager_counts.iter().max_by_key(|(_, c)| **c)
        && *count >= 3
    {
        warnings.push(format!(
            "{}: wager value {:.2} repeats {count} times",
            result.name,
            f64::from_bits(*bits)
        ));
    }

    let hidden = entries
        .iter()
        .filter(|e| e.username == HIDDEN_USERNAME)
        .count();
    if hidden * 2 > entries.len() {
        warnings.push(format!(
            "{}: majority of usernames are hidden placeholders",
            result.name
        ));
    }

    warnings
}

/// Ratio of adjacent pairs (by ascending rank) where the value increases.
/// `None` when every value is zero.
fn order_violation_ratio(
    entries: &[LeaderboardEntry],
    field: impl Fn(&LeaderboardEntry) -> f64,
) -> Option<f64> {
    if entries.iter().all(|e| field(e) == 0.0) {
        return None;
    }
    let mut violations = 0usize;
    let mut pairs = 0usize;
    for window in entries.windows(2) {
        let (a, b) = (field(&window[0]), field(&window[1]));
        if a == 0.0 || b == 0.0 {
            continue;
        }
        pairs += 1;
        if b > a {
            violations += 1;
        }
    }
    (pairs > 0).then(|| violations as f64 / pairs as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LeaderboardKind, ValidationReport};
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(rank: u32, username: &str, wager: f64, prize: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            rank,
            username: username.into(),
            wager,
            prize,
            extracted_at: Utc::now(),
            leaderboard_kind: LeaderboardKind::Current,
        }
    }

    fn result_with(entries: Vec<LeaderboardEntry>) -> LeaderboardResult {
        let mut r = LeaderboardResult {
            id: Uuid::new_v4(),
            extraction_id: Uuid::new_v4(),
            name: "weekly".into(),
            url: "https://x.example/leaderboard".into(),
            kind: LeaderboardKind::Current,
            source: "api".into(),
            entries,
            prizes: vec![],
            total_prize_pool: 0.0,
            total_wagered: 0.0,
            confidence: 80.0,
            scraped_at: Utc::now(),
            validation: ValidationReport::passing(),
        };
        r.recompute_totals();
        r
    }

    #[test]
    fn two_clean_entries_are_valid() {
        let entries = vec![entry(1, "Alice", 1000.0, 100.0), entry(2, "Bob", 800.0, 50.0)];
        let report = validate(&entries, Some(0.95), ValidatorConfig::default());
        assert!(report.valid);
        assert_eq!(report.confidence_penalty, 0.0);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn duplicate_and_gapped_ranks_fail_completeness() {
        let dup = vec![entry(1, "A", 10.0, 0.0), entry(1, "B", 9.0, 0.0)];
        let report = validate(&dup, None, ValidatorConfig::default());
        assert!(!report.completeness);
        assert_eq!(report.confidence_penalty, PENALTY_COMPLETENESS);

        let gap = vec![entry(1, "A", 10.0, 0.0), entry(3, "B", 9.0, 0.0)];
        let report = validate(&gap, None, ValidatorConfig::default());
        assert!(!report.completeness);
        assert!(report.issues.iter().any(|i| i.contains("rank")));
    }

    #[test]
    fn low_agreement_penalizes_twenty() {
        let entries = vec![entry(1, "A", 10.0, 0.0), entry(2, "B", 9.0, 0.0)];
        let report = validate(&entries, Some(0.4), ValidatorConfig::default());
        assert!(!report.strategy_agreement);
        assert_eq!(report.confidence_penalty, PENALTY_AGREEMENT);
        assert!(report.completeness, "channels stay orthogonal");
    }

    #[test]
    fn single_source_agreement_passes() {
        let entries = vec![entry(1, "A", 10.0, 0.0), entry(2, "B", 9.0, 0.0)];
        let report = validate(&entries, None, ValidatorConfig::default());
        assert!(report.strategy_agreement);
    }

    #[test]
    fn prize_order_warning_respects_tolerance() {
        // Strictly decreasing prizes: nothing to warn about
        let mut entries: Vec<LeaderboardEntry> = (1..=10)
            .map(|i| entry(i, &format!("u{i}"), 1000.0 / f64::from(i), 200.0 - f64::from(i) * 10.0))
            .collect();
        assert!(collect_warnings(&result_with(entries.clone())).is_empty());

        // Reverse the prizes entirely: warned
        for (i, e) in entries.iter_mut().enumerate() {
            e.prize = (i as f64 + 1.0) * 10.0;
        }
        let warnings = collect_warnings(&result_with(entries));
        assert!(warnings.iter().any(|w| w.contains("prize order")));
    }

    #[test]
    fn duplicate_wagers_and_zero_wagers_warn() {
        let entries = vec![
            entry(1, "A", 500.0, 0.0),
            entry(2, "B", 500.0, 0.0),
            entry(3, "C", 500.0, 0.0),
        ];
        let warnings = collect_warnings(&result_with(entries));
        assert!(warnings.iter().any(|w| w.contains("repeats 3 times")));

        let zeros = vec![entry(1, "A", 0.0, 10.0), entry(2, "B", 0.0, 5.0)];
        let warnings = collect_warnings(&result_with(zeros));
        assert!(warnings.iter().any(|w| w.contains("all wagers are zero")));
    }

    #[test]
    fn prize_tracking_rank_number_warns() {
        let mut entries: Vec<LeaderboardEntry> = (1..=30)
            .map(|i| entry(i, &format!("u{i}"), 1000.0, 0.0))
            .collect();
        for e in entries.iter_mut().skip(20) {
            e.prize = f64::from(e.rank);
        }
        let warnings = collect_warnings(&result_with(entries));
        assert!(warnings.iter().any(|w| w.contains("extraction artifact")));
    }
}
