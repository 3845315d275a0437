//! Line-level entry parser shared by the DOM and geometric strategies.
//!
//! Rendered leaderboard rows flatten into a handful of text lines: a rank
//! marker, a username, amounts, and `WAGERED`/`PRIZE` labels that may appear
//! before *or after* their value. [`EntryLineParser`] runs a small state
//! machine over those lines.

use regex::Regex;
use std::sync::LazyLock;

use crate::amount::{parse_amount, parse_rank, parse_roman, scan_amounts};
use crate::model::{RawEntry, HIDDEN_USERNAME};
use crate::strategies::markdown::clean_markdown_username;

static WAGER_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bwagere?d?\b").expect("hardcoded wager word regex is valid"));

static PRIZE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(prize|reward|bonus|payout|winnings)\b")
        .expect("hardcoded prize word regex is valid")
});

static EXPLICIT_RANK_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:#\s*(\d{1,4})|(\d{1,4})(?:st|nd|rd|th))\s*\.?\s*$")
        .expect("hardcoded rank marker regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingLabel {
    Wager,
    Prize,
}

/// Bare integers above this are amounts, never ranks.
const MAX_BARE_RANK: u32 = 200;

/// State machine over one entry's text lines.
#[derive(Debug, Default)]
pub struct EntryLineParser {
    rank: u32,
    username: Option<String>,
    wager: Option<f64>,
    prize: Option<f64>,
    unlabeled: Vec<f64>,
    pending: Option<PendingLabel>,
}

impl EntryLineParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line of rendered text.
    pub fn feed(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let amounts = scan_amounts(line);
        let has_wager_word = WAGER_WORD.is_match(line);
        let has_prize_word = PRIZE_WORD.is_match(line);

        // Label + value on one line resolves immediately
        if has_wager_word && !amounts.is_empty() {
            if self.wager.is_none() {
                self.wager = Some(amounts[0]);
            }
            return;
        }
        if has_prize_word && !amounts.is_empty() {
            if self.prize.is_none() {
                self.prize = Some(amounts[0]);
            }
            return;
        }

        // Bare label: promote the last unlabeled amount (label-after-value
        // markup) or arm the state machine for the next numeric line
        if has_wager_word {
            if self.wager.is_none() {
                if let Some(value) = self.unlabeled.pop() {
                    self.wager = Some(value);
                } else {
                    self.pending = Some(PendingLabel::Wager);
                }
            }
            return;
        }
        if has_prize_word {
            if self.prize.is_none() {
                if let Some(value) = self.unlabeled.pop() {
                    self.prize = Some(value);
                } else {
                    self.pending = Some(PendingLabel::Prize);
                }
            }
            return;
        }

        // Rank markers: explicit (#N, Nst), Roman numerals, or an early bare
        // small integer
        if self.rank == 0 {
            if let Some(caps) = EXPLICIT_RANK_MARKER.captures(line) {
                if let Some(rank) = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .and_then(|m| m.as_str().parse().ok())
                {
                    self.rank = rank;
                    return;
                }
            }
            if let Some(rank) = parse_roman(line) {
                self.rank = rank;
                return;
            }
            if self.is_pristine()
                && let Some(rank) = bare_rank(line)
            {
                self.rank = rank;
                return;
            }
        }

        // Pure numeric lines
        if let Some(value) = single_amount(line) {
            match self.pending.take() {
                Some(PendingLabel::Wager) if self.wager.is_none() => self.wager = Some(value),
                Some(PendingLabel::Prize) if self.prize.is_none() => self.prize = Some(value),
                _ => self.unlabeled.push(value),
            }
            return;
        }

        // Anything left is a username candidate
        if self.username.is_none()
            && let Some(name) = clean_markdown_username(line)
            && name != HIDDEN_USERNAME
        {
            self.username = Some(name);
        }
    }

    /// No structural data consumed yet — the next bare integer can still be
    /// a rank badge.
    fn is_pristine(&self) -> bool {
        self.username.is_none()
            && self.wager.is_none()
            && self.prize.is_none()
            && self.unlabeled.is_empty()
    }

    /// Whether this parser has picked up any signal at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rank == 0 && self.is_pristine()
    }

    #[must_use]
    pub fn has_username(&self) -> bool {
        self.username.is_some()
    }

    #[must_use]
    pub fn has_wager(&self) -> bool {
        self.wager.is_some() || !self.unlabeled.is_empty()
    }

    /// Close the entry. Leftover unlabeled amounts fall back to
    /// largest-is-wager, second-largest-is-prize.
    #[must_use]
    pub fn finish(mut self) -> Option<RawEntry> {
        if self.wager.is_none() || self.prize.is_none() {
            let mut rest = std::mem::take(&mut self.unlabeled);
            rest.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
            let mut rest = rest.into_iter();
            if self.wager.is_none() {
                self.wager = rest.next();
            }
            if self.prize.is_none() {
                self.prize = rest.next();
            }
        }

        if self.wager.is_none() && self.prize.is_none() {
            return None;
        }
        let mut entry = RawEntry::new(
            self.rank,
            self.username.unwrap_or_else(|| HIDDEN_USERNAME.to_string()),
        );
        entry.wager = self.wager;
        entry.prize = self.prize;
        Some(entry)
    }
}

/// Parse a full block of text as a single entry.
#[must_use]
pub fn parse_entry_block(lines: &[&str]) -> Option<RawEntry> {
    let mut parser = EntryLineParser::new();
    for line in lines {
        parser.feed(line);
    }
    parser.finish()
}

/// Whether a line starts a new entry in flat body text.
#[must_use]
pub fn is_rank_marker_line(line: &str) -> bool {
    let line = line.trim();
    EXPLICIT_RANK_MARKER.is_match(line) || parse_roman(line).is_some()
}

/// Whether a line would register as a username (and nothing else) if fed to
/// the parser. Used for podium-style segmentation in flat body text.
#[must_use]
pub fn is_username_line(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty()
        || WAGER_WORD.is_match(line)
        || PRIZE_WORD.is_match(line)
        || is_rank_marker_line(line)
        || parse_amount(line).is_some()
    {
        return false;
    }
    clean_markdown_username(line).is_some_and(|n| n != HIDDEN_USERNAME)
}

fn bare_rank(line: &str) -> Option<u32> {
    let rank = parse_rank(line)?;
    // Reject rank-shaped values that are formatted like money ("$4", "1,000")
    if line.contains(['$', '€', '£', ',', '.']) && !line.trim_end().ends_with(['.', ')']) {
        return None;
    }
    (rank <= MAX_BARE_RANK).then_some(rank)
}

fn single_amount(line: &str) -> Option<f64> {
    // A numeric line has at most a couple of stray alphabetic chars (the
    // k/m/b suffix or a currency code)
    if line.chars().filter(|c| c.is_alphabetic()).count() > 3 {
        return None;
    }
    parse_amount(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(lines: &[&str]) -> RawEntry {
        parse_entry_block(lines).expect("block should parse")
    }

    #[test]
    fn labels_after_values() {
        let entry = parse(&["1", "PlayerX", "12345", "WAGERED", "100", "REWARD"]);
        assert_eq!(entry.rank, 1);
        assert_eq!(entry.username, "PlayerX");
        assert_eq!(entry.wager, Some(12345.0));
        assert_eq!(entry.prize, Some(100.0));
    }

    #[test]
    fn labels_before_values() {
        let entry = parse(&["#2", "Spinner", "WAGERED", "$9,876.50", "PRIZE", "$250"]);
        assert_eq!(entry.rank, 2);
        assert_eq!(entry.wager, Some(9876.5));
        assert_eq!(entry.prize, Some(250.0));
    }

    #[test]
    fn inline_labels() {
        let entry = parse(&["3rd", "Lucky", "Wagered: $5,000", "Prize: $100"]);
        assert_eq!(entry.rank, 3);
        assert_eq!(entry.wager, Some(5000.0));
        assert_eq!(entry.prize, Some(100.0));
    }

    #[test]
    fn roman_numeral_rank() {
        let entry = parse(&["IV", "Caesar", "WAGERED", "4000"]);
        assert_eq!(entry.rank, 4);
        assert_eq!(entry.username, "Caesar");
    }

    #[test]
    fn no_labels_sorts_amounts_descending() {
        let entry = parse(&["Gambler", "$150", "$3,200"]);
        assert_eq!(entry.wager, Some(3200.0), "largest amount is the wager");
        assert_eq!(entry.prize, Some(150.0));
    }

    #[test]
    fn avatar_only_row_becomes_hidden() {
        let entry = parse(&["5", "$1,000", "WAGERED"]);
        assert_eq!(entry.username, HIDDEN_USERNAME);
        assert_eq!(entry.rank, 5);
        assert_eq!(entry.wager, Some(1000.0));
    }

    #[test]
    fn text_without_amounts_is_not_an_entry() {
        assert!(parse_entry_block(&["Just", "some", "navigation"]).is_none());
    }

    #[test]
    fn censored_username_survives() {
        let entry = parse(&["1", "Z****o", "WAGERED", "$285,750"]);
        assert_eq!(entry.username, "Z****o");
    }
}
