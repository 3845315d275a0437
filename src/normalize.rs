//! Normalization to the canonical entry schema.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::model::{LeaderboardEntry, LeaderboardKind, RawEntry, HIDDEN_USERNAME};

/// Coerce sanitized entries into frozen [`LeaderboardEntry`] records.
///
/// Rank 0 entries receive the next free sequential position (rank 0 is
/// forbidden in emitted results), amounts default to zero, and the result is
/// sorted ascending by rank.
#[must_use]
pub fn normalize(
    entries: Vec<RawEntry>,
    kind: LeaderboardKind,
    extracted_at: DateTime<Utc>,
) -> Vec<LeaderboardEntry> {
    let used: HashSet<u32> = entries.iter().map(|e| e.rank).filter(|r| *r > 0).collect();
    let mut next_free = 1u32;
    let mut out: Vec<LeaderboardEntry> = Vec::with_capacity(entries.len());

    for raw in entries {
        let rank = if raw.rank > 0 {
            raw.rank
        } else {
            while used.contains(&next_free) {
                next_free += 1;
            }
            let assigned = next_free;
            next_free += 1;
            assigned
        };

        let username = {
            let trimmed = raw.username.trim();
            if trimmed.is_empty() {
                HIDDEN_USERNAME.to_string()
            } else {
                trimmed.to_string()
            }
        };

        out.push(LeaderboardEntry {
            rank,
            username,
            wager: non_negative(raw.wager),
            prize: non_negative(raw.prize),
            extracted_at,
            leaderboard_kind: kind,
        });
    }

    out.sort_by_key(|e| e.rank);
    out
}

fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}
