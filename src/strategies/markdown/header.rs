//! Header-block parser: sites that render each entry as `### username`.

use regex::Regex;
use std::sync::LazyLock;

use super::lines::{
    amounts_in_line, is_image_only, is_separator_line, line_amount, PRIZE_LABEL, WAGERED_LABEL,
};
use super::username::clean_markdown_username;
use crate::model::{RawEntry, HIDDEN_USERNAME};

static HEADER_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{2,4}\s+(.+)$").expect("hardcoded header block regex is valid"));

static POINTS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([\d.,]+)\s*(?:points?|pts|coins?|xp)\s*$")
        .expect("hardcoded points line regex is valid")
});

static POSITION_BADGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(10|[1-9])\s*$").expect("hardcoded badge regex is valid"));

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:#\d|\*{1,2}#|\d{1,4}\.\s)").expect("hardcoded list marker regex is valid")
});

/// Lines following a header that may still belong to its entry.
const BLOCK_SPAN: usize = 8;
/// How far back a position badge may sit above its header.
const BADGE_LOOKBACK: usize = 3;

/// Parse `### username` entry blocks.
///
/// A bare `1..10` on its own line just above a header is that entry's
/// position badge; otherwise ranks are assigned in order of appearance.
#[must_use]
pub fn parse_headers(markdown: &str) -> Vec<RawEntry> {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut entries: Vec<RawEntry> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = HEADER_BLOCK.captures(line) else {
            continue;
        };
        let Some(username) = clean_markdown_username(&caps[1]) else {
            continue; // UI-text headings ("Leaderboard", "How it works")
        };
        if username == HIDDEN_USERNAME {
            continue;
        }

        let rank = badge_above(&lines, i).unwrap_or(entries.len() as u32 + 1);
        let mut entry = RawEntry::new(rank, username);

        for follow in lines.iter().skip(i + 1).take(BLOCK_SPAN) {
            if HEADER_BLOCK.is_match(follow) || LIST_MARKER.is_match(follow) {
                // next entry block (or a rank-marker list) started
                break;
            }
            if is_separator_line(follow) || is_image_only(follow) {
                continue;
            }
            if let Some(caps) = WAGERED_LABEL.captures(follow) {
                if entry.wager.is_none() {
                    let tail = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                    entry.wager =
                        line_amount(tail).or_else(|| amounts_in_line(tail).into_iter().next());
                }
                continue;
            }
            if let Some(caps) = PRIZE_LABEL.captures(follow) {
                if entry.prize.is_none() {
                    let tail = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                    entry.prize =
                        line_amount(tail).or_else(|| amounts_in_line(tail).into_iter().next());
                }
                continue;
            }
            if let Some(points) = POINTS_LINE.captures(follow) {
                if entry.wager.is_none() {
                    entry.wager = crate::amount::parse_amount(&points[1]);
                }
                continue;
            }
            if let Some(value) = line_amount(follow) {
                if entry.wager.is_none() {
                    entry.wager = Some(value);
                } else if entry.prize.is_none() {
                    entry.prize = Some(value);
                }
            }
            // anything else is a tier line or decoration; skip
        }

        if entry.has_amounts() {
            entries.push(entry);
        }
    }
    entries
}

fn badge_above(lines: &[&str], header_idx: usize) -> Option<u32> {
    for line in lines[..header_idx].iter().rev().take(BADGE_LOOKBACK) {
        if is_separator_line(line) || is_image_only(line) {
            continue;
        }
        return POSITION_BADGE
            .captures(line)
            .and_then(|caps| caps[1].parse().ok());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_blocks_with_badges_and_points() {
        let md = "\
1
### LuckyOne
Diamond
Wagered: $52,000
Prize: $1,500

2
### SecondBest
Gold
48,000 Points
$900";
        let entries = parse_headers(md);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].username, "LuckyOne");
        assert_eq!(entries[0].wager, Some(52_000.0));
        assert_eq!(entries[0].prize, Some(1_500.0));

        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[1].wager, Some(48_000.0), "points count as wager");
        assert_eq!(entries[1].prize, Some(900.0));
    }

    #[test]
    fn ui_text_headings_are_skipped() {
        let md = "\
### Leaderboard
### Alice
Wagered: $100";
        let entries = parse_headers(md);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].username, "Alice");
    }

    #[test]
    fn sequence_rank_when_no_badge() {
        let md = "\
### One
Wagered: $300
### Two
Wagered: $200";
        let entries = parse_headers(md);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].rank, 2);
    }
}
