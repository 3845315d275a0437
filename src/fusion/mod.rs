//! Fusion and cross-validation of competing strategy outputs.
//!
//! Entries are aligned on a stable key (rank, else normalized
//! username + rounded wager), compared field by field across every source
//! pair, and one source is recommended by a coverage/agreement score. The
//! recommended list is enriched with fields the other sources agreed on.

pub mod align;

pub use align::normalize_username;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::model::{RawEntry, StrategyKind, StrategyOutput};
use align::{alignment_key, compare, FieldComparison};

/// Agreement status of one aligned entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    /// Every pair comparison within the entry's group matched.
    Agreed,
    /// At least one pair comparison failed.
    Disputed,
    /// Only one strategy produced the entry.
    SingleSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryAgreement {
    pub status: AgreementStatus,
    pub sources: Vec<String>,
}

/// One concrete field disagreement, kept for the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discrepancy {
    pub key: String,
    pub field: String,
    pub source_a: String,
    pub value_a: String,
    pub source_b: String,
    pub value_b: String,
}

/// Per-field agreement ratios across all pair comparisons.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FieldAgreement {
    pub username: f64,
    pub rank: f64,
    pub wager: f64,
    pub prize: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossValidation {
    #[serde(rename = "overallAgreement")]
    pub overall_agreement: f64,
    #[serde(rename = "fieldAgreement")]
    pub field_agreement: FieldAgreement,
    pub discrepancies: Vec<Discrepancy>,
    #[serde(rename = "entryAgreement")]
    pub entry_agreement: BTreeMap<String, EntryAgreement>,
    #[serde(rename = "totalPairComparisons")]
    pub total_pair_comparisons: usize,
}

/// Result of fusing all strategy outputs for one leaderboard.
#[derive(Debug, Clone)]
pub struct FusionOutcome {
    pub recommended: StrategyKind,
    /// The recommended source's entries, enriched with agreed fields from
    /// the other sources.
    pub entries: Vec<RawEntry>,
    /// The recommended source's own confidence before adjustment.
    pub source_confidence: f64,
    /// Signed confidence adjustment derived from cross-validation.
    pub confidence_adjustment: f64,
    /// True when only one strategy produced entries (−5 noted downstream).
    pub single_source: bool,
    pub cross_validation: CrossValidation,
}

/// Fuse strategy outputs. Returns `None` when no strategy produced entries.
#[must_use]
pub fn fuse(outputs: &[StrategyOutput]) -> Option<FusionOutcome> {
    let sources: Vec<&StrategyOutput> = outputs.iter().filter(|o| !o.is_empty()).collect();
    if sources.is_empty() {
        return None;
    }

    let report = cross_validate(&sources);
    let agreed_per_source = agreed_counts(&sources, &report);
    let recommended = recommend(&sources, &agreed_per_source);
    let single_source = sources.len() == 1;

    let recommended_output = sources
        .iter()
        .find(|o| o.kind == recommended)
        .expect("recommended source comes from the input set");

    let mut entries = recommended_output.entries.clone();
    enrich_from_others(&mut entries, &sources, recommended);

    Some(FusionOutcome {
        recommended,
        entries,
        source_confidence: recommended_output.confidence,
        confidence_adjustment: confidence_adjustment(&report, single_source),
        single_source,
        cross_validation: report,
    })
}

/// Compare every aligned entry pair across sources and build the report.
fn cross_validate(sources: &[&StrategyOutput]) -> CrossValidation {
    // key -> [(source, entry)]
    let mut groups: HashMap<String, Vec<(StrategyKind, &RawEntry)>> = HashMap::new();
    for source in sources {
        for entry in &source.entries {
            groups
                .entry(alignment_key(entry))
                .or_default()
                .push((source.kind, entry));
        }
    }

    let mut total_pairs = 0usize;
    let mut matched_pairs = 0usize;
    let mut field_hits = [0usize; 4];
    let mut field_totals = [0usize; 4];
    let mut discrepancies = Vec::new();
    let mut entry_agreement = BTreeMap::new();

    for (key, members) in &groups {
        let display = members
            .first()
            .map(|(_, e)| e.username.clone())
            .unwrap_or_else(|| key.clone());
        let source_labels: Vec<String> =
            members.iter().map(|(kind, _)| kind.to_string()).collect();

        if members.len() < 2 {
            entry_agreement.insert(
                display,
                EntryAgreement {
                    status: AgreementStatus::SingleSource,
                    sources: source_labels,
                },
            );
            continue;
        }

        let mut all_matched = true;
        for i in 0..members.len() {
            for j in i + 1..members.len() {
                let (kind_a, a) = members[i];
                let (kind_b, b) = members[j];
                let cmp = compare(a, b);
                total_pairs += 1;
                if cmp.matches() {
                    matched_pairs += 1;
                } else {
                    all_matched = false;
                }
                tally_fields(&cmp, &mut field_hits, &mut field_totals);
                record_discrepancies(key, kind_a, a, kind_b, b, &cmp, &mut discrepancies);
            }
        }

        entry_agreement.insert(
            display,
            EntryAgreement {
                status: if all_matched {
                    AgreementStatus::Agreed
                } else {
                    AgreementStatus::Disputed
                },
                sources: source_labels,
            },
        );
    }

    let ratio = |hits: usize, total: usize| {
        if total == 0 { 1.0 } else { hits as f64 / total as f64 }
    };
    CrossValidation {
        overall_agreement: ratio(matched_pairs, total_pairs),
        field_agreement: FieldAgreement {
            username: ratio(field_hits[0], field_totals[0]),
            rank: ratio(field_hits[1], field_totals[1]),
            wager: ratio(field_hits[2], field_totals[2]),
            prize: ratio(field_hits[3], field_totals[3]),
        },
        discrepancies,
        entry_agreement,
        total_pair_comparisons: total_pairs,
    }
}

fn tally_fields(cmp: &FieldComparison, hits: &mut [usize; 4], totals: &mut [usize; 4]) {
    for (idx, field) in [cmp.username, cmp.rank, cmp.wager, cmp.prize]
        .into_iter()
        .enumerate()
    {
        if let Some(agreed) = field {
            totals[idx] += 1;
            if agreed {
                hits[idx] += 1;
            }
        }
    }
}

fn record_discrepancies(
    key: &str,
    kind_a: StrategyKind,
    a: &RawEntry,
    kind_b: StrategyKind,
    b: &RawEntry,
    cmp: &FieldComparison,
    out: &mut Vec<Discrepancy>,
) {
    let mut push = |field: &str, value_a: String, value_b: String| {
        out.push(Discrepancy {
            key: key.to_string(),
            field: field.to_string(),
            source_a: kind_a.to_string(),
            value_a,
            source_b: kind_b.to_string(),
            value_b,
        });
    };
    if cmp.username == Some(false) {
        push("username", a.username.clone(), b.username.clone());
    }
    if cmp.rank == Some(false) {
        push("rank", a.rank.to_string(), b.rank.to_string());
    }
    if cmp.wager == Some(false) {
        push(
            "wager",
            format!("{:.2}", a.wager.unwrap_or_default()),
            format!("{:.2}", b.wager.unwrap_or_default()),
        );
    }
    if cmp.prize == Some(false) {
        push(
            "prize",
            format!("{:.2}", a.prize.unwrap_or_default()),
            format!("{:.2}", b.prize.unwrap_or_default()),
        );
    }
}

/// Per-source count of entries whose whole group agreed.
fn agreed_counts(
    sources: &[&StrategyOutput],
    report: &CrossValidation,
) -> HashMap<StrategyKind, usize> {
    let mut counts = HashMap::new();
    for source in sources {
        let label = source.kind.to_string();
        let agreed = report
            .entry_agreement
            .values()
            .filter(|e| e.status == AgreementStatus::Agreed && e.sources.contains(&label))
            .count();
        counts.insert(source.kind, agreed);
    }
    counts
}

/// Score each source and pick the best:
/// `0.3·confidence + min(entries×2, 30) + wagerCoverage×20 + prizeCoverage×10
/// + agreedEntries×3`.
fn recommend(
    sources: &[&StrategyOutput],
    agreed: &HashMap<StrategyKind, usize>,
) -> StrategyKind {
    let score = |source: &StrategyOutput| -> f64 {
        let n = source.entries.len();
        let wager_coverage =
            source.entries.iter().filter(|e| e.wager.is_some()).count() as f64 / n as f64;
        let prize_coverage =
            source.entries.iter().filter(|e| e.prize.is_some()).count() as f64 / n as f64;
        0.3 * source.confidence
            + (n as f64 * 2.0).min(30.0)
            + wager_coverage * 20.0
            + prize_coverage * 10.0
            + *agreed.get(&source.kind).unwrap_or(&0) as f64 * 3.0
    };

    sources
        .iter()
        .max_by(|a, b| score(a).total_cmp(&score(b)))
        .map(|o| o.kind)
        .expect("sources is non-empty")
}

/// Confidence adjustment from the agreement level and discrepancy volume.
fn confidence_adjustment(report: &CrossValidation, single_source: bool) -> f64 {
    if single_source {
        return -5.0;
    }
    let agreement = report.overall_agreement;
    let mut adjustment = if agreement >= 0.9 {
        20.0
    } else if agreement >= 0.7 {
        10.0
    } else if agreement >= 0.5 {
        5.0
    } else if agreement < 0.3 {
        -15.0
    } else {
        -10.0
    };
    let discrepancies = report.discrepancies.len();
    if discrepancies > 10 {
        adjustment -= 10.0;
    } else if discrepancies > 5 {
        adjustment -= 5.0;
    }
    adjustment
}

/// Fill missing wager/prize fields on the recommended entries from any other
/// source aligned on the same key.
fn enrich_from_others(
    entries: &mut [RawEntry],
    sources: &[&StrategyOutput],
    recommended: StrategyKind,
) {
    let mut by_key: HashMap<String, &RawEntry> = HashMap::new();
    for source in sources {
        if source.kind == recommended {
            continue;
        }
        for entry in &source.entries {
            by_key.entry(alignment_key(entry)).or_insert(entry);
        }
    }
    for entry in entries.iter_mut() {
        if let Some(other) = by_key.get(&alignment_key(entry)) {
            if entry.wager.is_none() {
                entry.wager = other.wager;
            }
            if entry.prize.is_none() {
                entry.prize = other.prize;
            }
        }
    }
}
