//! Podium parser: top-3 blocks built around `Wagered:` labels.
//!
//! Podium markup rarely survives projection as a table. What does survive is
//! a `Wagered:` label near each winner card, with the username a few lines
//! above and the prize a few lines below.

use regex::Regex;
use std::sync::LazyLock;

use super::lines::{
    amounts_in_line, has_prize_marker, is_image_only, is_separator_line, line_amount,
    looks_like_rank_number, unescape_dollars, PRIZE_LABEL, WAGERED_LABEL,
};
use super::table::ColumnOrderHint;
use super::username::clean_markdown_username;
use crate::model::{RawEntry, HIDDEN_USERNAME};

static LIST_RANK_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\*{0,2}#\*{0,2}\s*\d|\d{1,4}\.(?:\s|$))")
        .expect("hardcoded list rank prefix regex is valid")
});

/// How far back to search for the username belonging to a `Wagered:` label.
const USERNAME_LOOKBACK: usize = 8;
/// How far forward to search for the prize.
const PRIZE_LOOKAHEAD: usize = 4;
/// A podium is at most three entries.
const PODIUM_CAP: usize = 3;

/// Parse podium entries. Ranks are assigned 1..3 in order of appearance.
#[must_use]
pub fn parse_podium(markdown: &str, hint: ColumnOrderHint) -> Vec<RawEntry> {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut entries: Vec<RawEntry> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if entries.len() >= PODIUM_CAP {
            break;
        }
        let Some(caps) = WAGERED_LABEL.captures(line) else {
            continue;
        };

        // Inline amount, or label-then-amount on the next line or two
        let mut wager = caps
            .get(1)
            .and_then(|m| line_amount(m.as_str()))
            .or_else(|| amounts_in_line(line).into_iter().next());
        let mut amount_line = i;
        if wager.is_none() {
            for (offset, next) in lines.iter().enumerate().skip(i + 1).take(2) {
                if let Some(v) = line_amount(next) {
                    wager = Some(v);
                    amount_line = offset;
                    break;
                }
            }
        }
        let Some(wager) = wager else { continue };

        // Rank-marked cards belong to the list parser, not the podium
        if rank_marked_above(&lines, i) {
            continue;
        }
        let username = find_username_above(&lines, i).unwrap_or_else(|| HIDDEN_USERNAME.to_string());
        let prize = find_prize_below(&lines, amount_line, hint);

        let mut entry = RawEntry::new(entries.len() as u32 + 1, username);
        entry.wager = Some(wager);
        entry.prize = prize;
        entries.push(entry);
    }

    entries
}

/// Does the nearest non-noise line above carry an explicit list rank
/// marker (`#4`, `5.`)?
fn rank_marked_above(lines: &[&str], from: usize) -> bool {
    for line in lines[..from].iter().rev().take(USERNAME_LOOKBACK) {
        if is_separator_line(line) || is_image_only(line) || line_amount(line).is_some() {
            continue;
        }
        return LIST_RANK_PREFIX.is_match(line);
    }
    false
}

/// Walk back up to [`USERNAME_LOOKBACK`] lines for the nearest plausible
/// username, skipping separators, images and amount lines.
fn find_username_above(lines: &[&str], from: usize) -> Option<String> {
    for line in lines[..from].iter().rev().take(USERNAME_LOOKBACK) {
        if is_separator_line(line) || is_image_only(line) {
            continue;
        }
        if line_amount(line).is_some() {
            continue;
        }
        if WAGERED_LABEL.is_match(line) || PRIZE_LABEL.is_match(line) {
            // ran into the previous podium card
            return None;
        }
        if let Some(name) = clean_markdown_username(line)
            && name != HIDDEN_USERNAME
        {
            return Some(name);
        }
    }
    None
}

/// Look forward for an explicit `Prize:` label or a bare amount. Bare values
/// that look like the next card's rank number are rejected unless the page
/// gave a prize-first hint or the line carries a prize icon.
fn find_prize_below(lines: &[&str], from: usize, hint: ColumnOrderHint) -> Option<f64> {
    for line in lines.iter().skip(from + 1).take(PRIZE_LOOKAHEAD) {
        if WAGERED_LABEL.is_match(line) {
            // next podium card started
            return None;
        }
        if let Some(caps) = PRIZE_LABEL.captures(line) {
            let tail = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            if let Some(v) = line_amount(tail).or_else(|| amounts_in_line(tail).into_iter().next())
            {
                return Some(v);
            }
            continue;
        }
        if let Some(v) = line_amount(line) {
            let raw = unescape_dollars(line);
            let accept = !looks_like_rank_number(raw.trim(), v)
                || hint == ColumnOrderHint::PrizeFirst
                || has_prize_marker(line);
            if accept {
                return Some(v);
            }
        }
    }
    None
}
