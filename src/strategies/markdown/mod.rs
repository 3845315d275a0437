//! Markdown extraction strategy.
//!
//! Four sub-parsers run over the projected Markdown and their outputs merge
//! with priority header > podium > table > list: when two parsers claim the
//! same rank, the higher-priority parser's entry wins.

pub mod header;
pub mod lines;
pub mod list;
pub mod podium;
pub mod table;
pub mod username;

pub use table::ColumnOrderHint;
pub use username::{clean_markdown_username, is_censored, is_ui_text};

use std::collections::BTreeMap;

use crate::model::{RawEntry, StrategyKind, StrategyOutput};

/// Run the markdown strategy over a projected page.
#[must_use]
pub fn run(markdown: &str) -> StrategyOutput {
    let table = table::parse_tables(markdown);
    let hint = table.column_hint;
    let podium = podium::parse_podium(markdown, hint);
    let list = list::parse_list(markdown, hint);
    let headers = header::parse_headers(markdown);

    let mut parsers_hit = 0usize;
    // Lowest priority first; later inserts overwrite same-rank entries
    let mut by_rank: BTreeMap<u32, RawEntry> = BTreeMap::new();
    let mut unranked: Vec<RawEntry> = Vec::new();
    for batch in [list, table.entries.clone(), podium, headers] {
        if batch.is_empty() {
            continue;
        }
        parsers_hit += 1;
        for entry in batch {
            if entry.rank == 0 {
                unranked.push(entry);
            } else {
                by_rank.insert(entry.rank, entry);
            }
        }
    }

    let mut entries: Vec<RawEntry> = by_rank.into_values().collect();
    entries.extend(unranked);

    let mut confidence = 50.0 + 5.0 * parsers_hit as f64;
    if table.had_header {
        confidence += 10.0;
    }
    if entries.len() >= 3 {
        confidence += 5.0;
    }
    StrategyOutput::new(StrategyKind::Markdown, entries, confidence.min(85.0))
}
