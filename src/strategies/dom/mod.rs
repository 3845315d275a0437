//! DOM extraction strategy over captured HTML.
//!
//! Two passes: podium detection (class heuristics, then label-pattern
//! containers bounded by their captured rectangles), then broad
//! row-container extraction. When both together produce fewer than ten
//! entries, a flat body-text pass runs as a fallback.

pub mod podium;
pub mod rows;

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::model::{LayoutBox, RawEntry, StrategyKind, StrategyOutput};

/// Threshold below which the body-text fallback kicks in.
const TEXT_FALLBACK_MIN: usize = 10;

/// Run the DOM strategy over captured page HTML. `layout` carries the
/// rendered rectangles used to bound label-pattern podium candidates.
#[must_use]
pub fn run(html: &str, layout: &[LayoutBox]) -> StrategyOutput {
    let document = Html::parse_document(html);

    let podium_entries = podium::detect(&document, layout);
    let row_entries = rows::extract(&document);

    let mut entries = merge(podium_entries, row_entries);
    if entries.len() < TEXT_FALLBACK_MIN {
        let text = body_text(&document);
        let fallback = rows::parse_flat_text(&text);
        if fallback.len() > entries.len() {
            entries = fallback;
        }
    }

    let labeled = entries.iter().filter(|e| e.has_amounts()).count();
    let confidence = if labeled >= 3 { 65.0 } else { 50.0 };
    StrategyOutput::new(StrategyKind::Dom, entries, confidence)
}

/// Podium entries keep ranks 1..3; row entries fill in around them. Row
/// entries that duplicate a podium (same normalized username) are dropped.
fn merge(podium: Vec<RawEntry>, rows: Vec<RawEntry>) -> Vec<RawEntry> {
    let mut taken_ranks: HashSet<u32> = podium.iter().map(|e| e.rank).collect();
    let podium_names: HashSet<String> = podium
        .iter()
        .map(|e| e.username.to_lowercase())
        .collect();

    let mut merged = podium;
    for entry in rows {
        if entry.rank != 0 && taken_ranks.contains(&entry.rank) {
            continue;
        }
        if podium_names.contains(&entry.username.to_lowercase()) {
            continue;
        }
        if entry.rank != 0 {
            taken_ranks.insert(entry.rank);
        }
        merged.push(entry);
    }
    merged
}

fn body_text(document: &Html) -> String {
    static BODY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("body").expect("body selector is valid"));

    let mut out = String::new();
    let Some(body) = document.select(&BODY).next() else {
        return out;
    };
    for text in body.text() {
        let t = text.trim();
        if !t.is_empty() {
            out.push_str(t);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_extract() {
        let html = r#"<html><body><table>
            <tr class="lb-row"><td>1</td><td>Alice</td><td>$5,000</td><td>$500</td></tr>
            <tr class="lb-row"><td>2</td><td>Bob</td><td>$4,000</td><td>$250</td></tr>
            <tr class="lb-row"><td>3</td><td>Cara</td><td>$3,000</td><td>$100</td></tr>
        </table></body></html>"#;
        let output = run(html, &[]);
        assert_eq!(output.kind, StrategyKind::Dom);
        assert!(output.entries.len() >= 3, "got {:?}", output.entries);
        let alice = output
            .entries
            .iter()
            .find(|e| e.username == "Alice")
            .expect("Alice extracted");
        assert_eq!(alice.rank, 1);
        assert_eq!(alice.wager, Some(5000.0));
        assert_eq!(alice.prize, Some(500.0));
    }

    #[test]
    fn winner_cards_form_podium() {
        let html = r#"<html><body>
            <div class="winner-card"><span>Z****o</span><span>WAGERED</span><span>$285,750</span><span>REWARD</span><span>$2,000</span></div>
            <div class="winner-card"><span>K***r</span><span>WAGERED</span><span>$201,330</span><span>REWARD</span><span>$1,000</span></div>
        </body></html>"#;
        let output = run(html, &[]);
        let first = &output.entries[0];
        assert_eq!(first.rank, 1);
        assert_eq!(first.username, "Z****o");
        assert_eq!(first.wager, Some(285_750.0));
        assert_eq!(first.prize, Some(2_000.0));
    }

    #[test]
    fn label_after_value_scenario() {
        let html = r#"<html><body>
            <li class="entry"><div>1</div><div>PlayerX</div><div>12345</div><div>WAGERED</div><div>100</div><div>REWARD</div></li>
        </body></html>"#;
        let output = run(html, &[]);
        let entry = output
            .entries
            .iter()
            .find(|e| e.username == "PlayerX")
            .expect("PlayerX extracted");
        assert_eq!(entry.rank, 1);
        assert_eq!(entry.wager, Some(12345.0));
        assert_eq!(entry.prize, Some(100.0));
    }
}
