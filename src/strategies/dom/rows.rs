//! Row-container extraction and the flat body-text fallback.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::model::RawEntry;
use crate::strategies::textline::{
    is_rank_marker_line, is_username_line, EntryLineParser,
};

static ROW_CONTAINERS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "[class*=entry], [class*=row], [class*=item], [class*=player], [class*=card], \
         [class*=user], [class*=rank], [class*=leader], tr, li",
    )
    .expect("row container selector is valid")
});

/// Containers with more lines than this are wrappers around many rows.
const MAX_ROW_LINES: usize = 12;
/// Containers with more text than this are page sections.
const MAX_ROW_TEXT: usize = 600;

/// Extract row entries from every plausible row container.
///
/// Nested matches (a `tr` inside a `[class*=table-row]` wrapper) resolve by
/// processing document order and deduplicating on a username/wager key.
#[must_use]
pub fn extract(document: &Html) -> Vec<RawEntry> {
    let mut entries: Vec<RawEntry> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for element in document.select(&ROW_CONTAINERS) {
        let lines = element_lines(element);
        if lines.len() < 2 || lines.len() > MAX_ROW_LINES {
            continue;
        }
        if lines.iter().map(String::len).sum::<usize>() > MAX_ROW_TEXT {
            continue;
        }
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let mut parser = EntryLineParser::new();
        for line in &refs {
            parser.feed(line);
        }
        let Some(entry) = parser.finish() else {
            continue;
        };
        if !entry.has_amounts() {
            continue;
        }
        let key = format!(
            "{}|{}",
            entry.username.to_lowercase(),
            entry.wager.map_or(0, |w| w.round() as i64)
        );
        if seen.insert(key) {
            entries.push(entry);
        }
    }
    entries
}

/// Parse flat `innerText`-style content with the same line state machine.
///
/// A rank-marker line always starts a new entry. A username line while the
/// current entry already has both a name and an amount also starts one —
/// that is how podium-style sequences with no rank badges split.
#[must_use]
pub fn parse_flat_text(text: &str) -> Vec<RawEntry> {
    let mut entries = Vec::new();
    let mut parser = EntryLineParser::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let starts_new = is_rank_marker_line(line)
            || (is_username_line(line) && parser.has_username() && parser.has_wager());
        if starts_new && !parser.is_empty() {
            if let Some(entry) = std::mem::take(&mut parser).finish() {
                entries.push(entry);
            }
        }
        parser.feed(line);
    }
    if let Some(entry) = parser.finish() {
        entries.push(entry);
    }

    // Flat text is noisy; keep only rows that carry an amount
    entries.retain(RawEntry::has_amounts);
    assign_sequential_ranks(&mut entries);
    entries
}

/// Give rank-less entries the next free sequential position.
fn assign_sequential_ranks(entries: &mut [RawEntry]) {
    let used: HashSet<u32> = entries.iter().map(|e| e.rank).filter(|r| *r > 0).collect();
    let mut next = 1u32;
    for entry in entries.iter_mut() {
        if entry.rank != 0 {
            continue;
        }
        while used.contains(&next) {
            next += 1;
        }
        entry.rank = next;
        next += 1;
    }
}

fn element_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
