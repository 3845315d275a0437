//! Pipe-table parser for markdown-projected leaderboards.

use regex::Regex;
use std::sync::LazyLock;

use super::lines::unescape_dollars;
use super::username::clean_markdown_username;
use crate::amount::{parse_amount, parse_rank};
use crate::model::RawEntry;

static HEADER_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(rank|pos(ition)?|place|player|user(name)?|name|wager(ed)?|amount|prize|reward|bonus|winnings)")
        .expect("hardcoded header cell regex is valid")
});

static SEPARATOR_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:?-+:?$").expect("hardcoded separator regex is valid"));

/// Which amount column comes first when a row carries two unlabeled amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnOrderHint {
    #[default]
    Unknown,
    WagerFirst,
    PrizeFirst,
}

/// Result of a table pass: entries plus the header-derived column hint the
/// list parser reuses for unlabeled amounts elsewhere on the page.
#[derive(Debug, Default)]
pub struct TableParse {
    pub entries: Vec<RawEntry>,
    pub column_hint: ColumnOrderHint,
    pub had_header: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct ColumnMap {
    rank: Option<usize>,
    username: Option<usize>,
    wager: Option<usize>,
    prize: Option<usize>,
}

impl ColumnMap {
    /// Positional fallback when the table has no recognizable header:
    /// Rank | Player | Wagered | Prize.
    fn positional(width: usize) -> Self {
        Self {
            rank: (width >= 1).then_some(0),
            username: (width >= 2).then_some(1),
            wager: (width >= 3).then_some(2),
            prize: (width >= 4).then_some(3),
        }
    }
}

fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim().trim_start_matches('|').trim_end_matches('|');
    trimmed.split('|').map(|c| c.trim().to_string()).collect()
}

fn is_pipe_row(line: &str) -> bool {
    let t = line.trim();
    t.starts_with('|') && t.matches('|').count() >= 2
}

fn is_separator_row(cells: &[String]) -> bool {
    !cells.is_empty() && cells.iter().all(|c| SEPARATOR_CELL.is_match(c))
}

fn map_header(cells: &[String]) -> Option<ColumnMap> {
    let matching = cells
        .iter()
        .filter(|c| HEADER_CELL.is_match(c) || c.as_str() == "#")
        .count();
    if matching < 2 {
        return None;
    }
    let mut map = ColumnMap::default();
    for (idx, cell) in cells.iter().enumerate() {
        let lower = cell.to_lowercase();
        let field: &mut Option<usize> = if lower == "#"
            || lower.starts_with("rank")
            || lower.starts_with("pos")
            || lower.starts_with("place")
        {
            &mut map.rank
        } else if lower.starts_with("player")
            || lower.starts_with("user")
            || lower == "name"
        {
            &mut map.username
        } else if lower.starts_with("wager") || lower.starts_with("amount") || lower.contains("wager")
        {
            &mut map.wager
        } else if lower.starts_with("prize")
            || lower.starts_with("reward")
            || lower.starts_with("bonus")
            || lower.starts_with("winnings")
            || lower.starts_with("payout")
        {
            &mut map.prize
        } else {
            continue;
        };
        // First matching column wins; "Prize | ... | Reward" keeps Prize
        if field.is_none() {
            *field = Some(idx);
        }
    }
    Some(map)
}

/// Parse every pipe table in the markdown. A fresh header row resets the
/// column mapping, so multiple tables in one document all contribute.
#[must_use]
pub fn parse_tables(markdown: &str) -> TableParse {
    let mut out = TableParse::default();
    let mut columns: Option<ColumnMap> = None;
    let mut sequence = 0u32;

    for line in markdown.lines() {
        if !is_pipe_row(line) {
            continue;
        }
        let cells = split_cells(line);
        if is_separator_row(&cells) {
            continue;
        }

        if let Some(map) = map_header(&cells) {
            columns = Some(map);
            out.had_header = true;
            sequence = 0;
            if let (Some(p), Some(w)) = (map.prize, map.wager) {
                out.column_hint = if p < w {
                    ColumnOrderHint::PrizeFirst
                } else {
                    ColumnOrderHint::WagerFirst
                };
            }
            continue;
        }

        let map = columns.unwrap_or_else(|| ColumnMap::positional(cells.len()));
        let cell = |idx: Option<usize>| idx.and_then(|i| cells.get(i)).map(String::as_str);

        let Some(username) = cell(map.username).and_then(clean_markdown_username) else {
            continue;
        };
        sequence += 1;
        let rank = cell(map.rank)
            .and_then(parse_rank)
            .unwrap_or(sequence);
        let amount = |idx| cell(idx).and_then(|c| parse_amount(&unescape_dollars(c)));
        let mut entry = RawEntry::new(rank, username);
        entry.wager = amount(map.wager);
        entry.prize = amount(map.prize);
        if entry.has_amounts() {
            out.entries.push(entry);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_table_with_prize_before_wager() {
        let md = "\
| Place | User | Prize | Wagered | Reward |
| --- | --- | --- | --- | --- |
| 1 | CodeUser | $150 | $2,732.62 | extra |
| 2 | Other | $100 | $1,800.00 | extra |";

        let parsed = parse_tables(md);
        assert!(parsed.had_header);
        assert_eq!(parsed.column_hint, ColumnOrderHint::PrizeFirst);
        assert_eq!(parsed.entries.len(), 2);

        let first = &parsed.entries[0];
        assert_eq!(first.rank, 1);
        assert_eq!(first.username, "CodeUser");
        assert_eq!(first.prize, Some(150.0));
        assert_eq!(first.wager, Some(2732.62));

        let second = &parsed.entries[1];
        assert_eq!(second.wager, Some(1800.0));
        assert_eq!(second.prize, Some(100.0));
    }

    #[test]
    fn headerless_table_uses_positional_mapping() {
        let md = "\
| 1 | Alice | $1,000 | $100 |
| 2 | Bob | $800 | $50 |";
        let parsed = parse_tables(md);
        assert!(!parsed.had_header);
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].username, "Alice");
        assert_eq!(parsed.entries[0].wager, Some(1000.0));
        assert_eq!(parsed.entries[0].prize, Some(100.0));
    }

    #[test]
    fn ui_text_rows_are_skipped() {
        let md = "\
| Rank | Player | Wagered |
| --- | --- | --- |
| 1 | Alice | $500 |
|  | Show More | |";
        let parsed = parse_tables(md);
        assert_eq!(parsed.entries.len(), 1);
    }

    #[test]
    fn rows_without_amounts_are_dropped() {
        let md = "\
| Rank | Player | Wagered |
| --- | --- | --- |
| 1 | Alice | n/a |";
        let parsed = parse_tables(md);
        assert!(parsed.entries.is_empty());
    }

    #[test]
    fn escaped_dollars_from_projection_parse() {
        let md = "\
| Rank | Player | Wagered |
| --- | --- | --- |
| 1 | Alice | \\$5,000 |";
        let parsed = parse_tables(md);
        assert_eq!(parsed.entries[0].wager, Some(5000.0));
    }

    #[test]
    fn rank_markers_in_cells_normalize() {
        let md = "\
| Rank | Player | Wagered |
| --- | --- | --- |
| #04. | Dana | $42.50 |";
        let parsed = parse_tables(md);
        assert_eq!(parsed.entries[0].rank, 4);
    }
}
