//! List parser: rank-marker driven rows below the podium.

use regex::Regex;
use std::sync::LazyLock;

use super::lines::{
    amounts_in_line, has_prize_marker, is_image_only, is_separator_line, line_amount,
    PRIZE_LABEL, WAGERED_LABEL,
};
use super::table::ColumnOrderHint;
use super::username::clean_markdown_username;
use crate::model::{RawEntry, HIDDEN_USERNAME};

static EXPLICIT_RANK: LazyLock<Regex> = LazyLock::new(|| {
    // `#4`, `**#**4`, `4.` at line start; `4.5` stays an amount
    Regex::new(r"^\s*(?:\*{0,2}#\*{0,2}\s*(\d{1,4})|(\d{1,4})\.(?:\s+|$))\s*")
        .expect("hardcoded explicit rank regex is valid")
});

static BARE_RANK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,3})\s*$").expect("hardcoded bare rank regex is valid")
});

static CHALLENGER_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)challenger|runners?[\s-]?up|top\s+players|places?\s+4")
        .expect("hardcoded challenger heading regex is valid")
});

/// How many lines after a rank marker may belong to that entry.
const BLOCK_SPAN: usize = 8;

struct Marker {
    line: usize,
    rank: u32,
    /// Text remaining on the marker line after the rank token.
    rest: String,
}

/// Parse rank-marker list entries. Bare integers are accepted only
/// sequentially (`4`, `5`, ...) once a challengers-style heading has been
/// seen, so timer digits and amounts never become ranks.
#[must_use]
pub fn parse_list(markdown: &str, hint: ColumnOrderHint) -> Vec<RawEntry> {
    let lines: Vec<&str> = markdown.lines().collect();
    let markers = find_markers(&lines);
    let mut entries = Vec::with_capacity(markers.len());

    for (idx, marker) in markers.iter().enumerate() {
        let block_end = markers
            .get(idx + 1)
            .map_or(lines.len(), |next| next.line)
            .min(marker.line + 1 + BLOCK_SPAN);
        if let Some(entry) = parse_block(marker, &lines[marker.line + 1..block_end], hint) {
            entries.push(entry);
        }
    }
    entries
}

fn find_markers(lines: &[&str]) -> Vec<Marker> {
    let mut markers: Vec<Marker> = Vec::new();
    let mut challenger_context = false;

    for (i, line) in lines.iter().enumerate() {
        if CHALLENGER_HEADING.is_match(line) {
            challenger_context = true;
        }
        if let Some(caps) = EXPLICIT_RANK.captures(line) {
            let digits = caps.get(1).or_else(|| caps.get(2));
            if let Some(m) = digits
                && let Ok(rank) = m.as_str().parse::<u32>()
                && rank > 0
                && rank <= 1000
            {
                let rest = line[caps.get(0).map_or(0, |m| m.end())..].to_string();
                markers.push(Marker { line: i, rank, rest });
                continue;
            }
        }
        // Bare integers only sequentially after the podium, and only in a
        // challengers-style context
        if challenger_context
            && let Some(caps) = BARE_RANK.captures(line)
            && let Ok(rank) = caps[1].parse::<u32>()
        {
            let expected = markers.last().map_or(4, |m| m.rank + 1);
            if rank >= 4 && rank == expected {
                markers.push(Marker {
                    line: i,
                    rank,
                    rest: String::new(),
                });
            }
        }
    }
    markers
}

fn parse_block(marker: &Marker, block: &[&str], hint: ColumnOrderHint) -> Option<RawEntry> {
    let mut username: Option<String> = None;
    let mut wager: Option<f64> = None;
    let mut prize: Option<f64> = None;
    let mut unlabeled: Vec<(f64, bool)> = Vec::new(); // (value, prize-marked line)

    // Username may share the marker line
    let inline = marker.rest.trim();
    if !inline.is_empty() && line_amount(inline).is_none() {
        username = clean_markdown_username(inline).filter(|u| u != HIDDEN_USERNAME);
    }

    for line in block {
        if is_separator_line(line) || is_image_only(line) {
            continue;
        }
        if let Some(caps) = WAGERED_LABEL.captures(line) {
            let tail = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            if wager.is_none() {
                wager = line_amount(tail).or_else(|| amounts_in_line(tail).into_iter().next());
            }
            continue;
        }
        if let Some(caps) = PRIZE_LABEL.captures(line) {
            let tail = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            if prize.is_none() {
                prize = line_amount(tail).or_else(|| amounts_in_line(tail).into_iter().next());
            }
            continue;
        }
        if let Some(value) = line_amount(line) {
            unlabeled.push((value, has_prize_marker(line)));
            continue;
        }
        if username.is_none() {
            username = clean_markdown_username(line).filter(|u| u != HIDDEN_USERNAME);
        }
    }

    assign_unlabeled(&mut wager, &mut prize, &unlabeled, hint);

    let username = username.unwrap_or_else(|| HIDDEN_USERNAME.to_string());
    let mut entry = RawEntry::new(marker.rank, username);
    entry.wager = wager;
    entry.prize = prize;
    entry.has_amounts().then_some(entry)
}

/// Distribute unlabeled amounts into the empty wager/prize slots using the
/// column-order hint or per-line prize markers.
fn assign_unlabeled(
    wager: &mut Option<f64>,
    prize: &mut Option<f64>,
    unlabeled: &[(f64, bool)],
    hint: ColumnOrderHint,
) {
    for &(value, prize_marked) in unlabeled {
        if prize_marked && prize.is_none() {
            *prize = Some(value);
        }
    }
    let remaining: Vec<f64> = unlabeled
        .iter()
        .filter(|(_, marked)| !marked)
        .map(|(v, _)| *v)
        .collect();

    match (wager.is_none(), prize.is_none(), remaining.len()) {
        (true, true, n) if n >= 2 => {
            if hint == ColumnOrderHint::PrizeFirst {
                *prize = Some(remaining[0]);
                *wager = Some(remaining[1]);
            } else {
                *wager = Some(remaining[0]);
                *prize = Some(remaining[1]);
            }
        }
        (true, _, n) if n >= 1 => *wager = Some(remaining[0]),
        (false, true, n) if n >= 1 => *prize = Some(remaining[0]),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_hash_markers() {
        let md = "\
#4 SlotFan
Wagered: $4,200
Prize: $120
#5 SpinKing
Wagered: $3,900
Prize: $90";
        let entries = parse_list(md, ColumnOrderHint::Unknown);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rank, 4);
        assert_eq!(entries[0].username, "SlotFan");
        assert_eq!(entries[0].wager, Some(4200.0));
        assert_eq!(entries[1].prize, Some(90.0));
    }

    #[test]
    fn bold_mangled_hash_and_dot_markers() {
        let md = "\
**#**6
Roller
Wagered: $2,000
7. Dicey
Wagered: $1,500";
        let entries = parse_list(md, ColumnOrderHint::Unknown);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rank, 6);
        assert_eq!(entries[0].username, "Roller");
        assert_eq!(entries[1].rank, 7);
        assert_eq!(entries[1].username, "Dicey");
    }

    #[test]
    fn bare_integers_only_in_challenger_context_and_sequential() {
        let no_context = "\
4
Alice
Wagered: $100";
        assert!(parse_list(no_context, ColumnOrderHint::Unknown).is_empty());

        let with_context = "\
## Challengers
4
Alice
Wagered: $100
5
Bob
Wagered: $90
9
Stray
Wagered: $1";
        let entries = parse_list(with_context, ColumnOrderHint::Unknown);
        assert_eq!(entries.len(), 2, "non-sequential '9' must be ignored");
        assert_eq!(entries[0].rank, 4);
        assert_eq!(entries[1].username, "Bob");
    }

    #[test]
    fn unlabeled_amounts_use_prize_first_hint() {
        let md = "\
#4 Gambler
$150
$3,200";
        let prize_first = parse_list(md, ColumnOrderHint::PrizeFirst);
        assert_eq!(prize_first[0].prize, Some(150.0));
        assert_eq!(prize_first[0].wager, Some(3200.0));

        let default_order = parse_list(md, ColumnOrderHint::Unknown);
        assert_eq!(default_order[0].wager, Some(150.0));
        assert_eq!(default_order[0].prize, Some(3200.0));
    }

    #[test]
    fn embedded_image_username_suffix() {
        let md = "\
#8 ![flag](de.png)Kaiser
Wagered: $800";
        let entries = parse_list(md, ColumnOrderHint::Unknown);
        assert_eq!(entries[0].username, "Kaiser");
    }
}
