//! Podium detection in captured HTML.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::amount::scan_amounts;
use crate::model::{LayoutBox, RawEntry};
use crate::strategies::textline::parse_entry_block;

static PODIUM_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)winner[-_]?card|podium|place[-_]?[123]\b|top[-_]?3|(first|second|third)[-_]?place")
        .expect("hardcoded podium class regex is valid")
});

static PLACE_N: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)place[-_]?([123])\b").expect("hardcoded place regex is valid")
});

static ANY_ELEMENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body *").expect("body selector is valid"));

/// Containers this large are page sections, not cards.
const MAX_CARD_LINES: usize = 14;

/// Rendered size a label-pattern winner card must fit (CSS pixels).
const CARD_MIN_WIDTH: f64 = 80.0;
const CARD_MAX_WIDTH: f64 = 500.0;
const CARD_MIN_HEIGHT: f64 = 100.0;
const CARD_MAX_HEIGHT: f64 = 600.0;

/// Detect podium entries: first by class heuristics, then by the
/// WAGERED/REWARD label pattern over `layout`-bounded candidates. Ranks come
/// from `place-N` classes when present, else document order.
#[must_use]
pub fn detect(document: &Html, layout: &[LayoutBox]) -> Vec<RawEntry> {
    let by_class = detect_by_class(document);
    if !by_class.is_empty() {
        return by_class;
    }
    detect_by_labels(document, layout)
}

fn element_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn detect_by_class(document: &Html) -> Vec<RawEntry> {
    let mut cards: Vec<(Option<u32>, Vec<String>)> = Vec::new();
    let mut seen_ids = HashSet::new();

    for element in document.select(&ANY_ELEMENT) {
        let Some(class) = element.value().attr("class") else {
            continue;
        };
        if !PODIUM_CLASS.is_match(class) {
            continue;
        }
        // Keep the outermost matching element of each card subtree
        if element
            .ancestors()
            .any(|a| seen_ids.contains(&a.id()))
        {
            continue;
        }
        seen_ids.insert(element.id());

        let lines = element_lines(element);
        if lines.is_empty() || lines.len() > MAX_CARD_LINES {
            continue;
        }
        let place = PLACE_N
            .captures(class)
            .and_then(|caps| caps[1].parse().ok());
        cards.push((place, lines));
        if cards.len() >= 3 {
            break;
        }
    }

    build_entries(cards)
}

/// Label-pattern podium: containers whose text carries both a WAGERED and a
/// REWARD/PRIZE label, at least two money-shaped tokens, and a rendered
/// rectangle inside the winner-card bounds. Only innermost candidates
/// survive — a candidate fully containing another is a section wrapper.
fn detect_by_labels(document: &Html, layout: &[LayoutBox]) -> Vec<RawEntry> {
    let mut candidates: Vec<ElementRef<'_>> = Vec::new();
    for element in document.select(&ANY_ELEMENT) {
        let text_upper: String = element.text().collect::<String>().to_uppercase();
        if !text_upper.contains("WAGER") {
            continue;
        }
        if !text_upper.contains("REWARD") && !text_upper.contains("PRIZE") {
            continue;
        }
        if scan_amounts(&text_upper).len() < 2 {
            continue;
        }
        if element_lines(element).len() > MAX_CARD_LINES {
            continue;
        }
        if !card_within_bounds(element, layout) {
            continue;
        }
        candidates.push(element);
    }

    // Drop candidates that contain another candidate
    let ids: HashSet<_> = candidates.iter().map(|e| e.id()).collect();
    let innermost: Vec<&ElementRef<'_>> = candidates
        .iter()
        .filter(|e| {
            !e.descendants()
                .filter(|n| n.id() != e.id())
                .any(|n| ids.contains(&n.id()))
        })
        .collect();

    let cards: Vec<(Option<u32>, Vec<String>)> = innermost
        .into_iter()
        .take(3)
        .map(|e| (None, element_lines(*e)))
        .collect();
    build_entries(cards)
}

/// Apply the winner-card rectangle bound using the captured layout boxes.
///
/// Captured HTML carries no geometry, so the candidate is matched to its
/// layout box by whitespace-normalized text. A candidate with no captured
/// box (geometry-free fixtures, zero-size subtrees) passes; the line-count
/// cap is the only bound left for it.
fn card_within_bounds(element: ElementRef<'_>, layout: &[LayoutBox]) -> bool {
    match find_card_box(element, layout) {
        Some(b) => {
            (CARD_MIN_WIDTH..=CARD_MAX_WIDTH).contains(&b.width)
                && (CARD_MIN_HEIGHT..=CARD_MAX_HEIGHT).contains(&b.height)
        }
        None => true,
    }
}

fn find_card_box<'a>(element: ElementRef<'_>, layout: &'a [LayoutBox]) -> Option<&'a LayoutBox> {
    let text = normalize_ws(&element.text().collect::<String>());
    if text.is_empty() {
        return None;
    }
    layout.iter().find(|b| normalize_ws(&b.text) == text)
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn build_entries(cards: Vec<(Option<u32>, Vec<String>)>) -> Vec<RawEntry> {
    let mut entries = Vec::with_capacity(cards.len());
    for (i, (place, lines)) in cards.into_iter().enumerate() {
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let Some(mut entry) = parse_entry_block(&refs) else {
            continue;
        };
        if let Some(place) = place {
            entry.rank = place;
        } else if entry.rank == 0 {
            entry.rank = i as u32 + 1;
        }
        entries.push(entry);
    }
    entries.sort_by_key(|e| e.rank);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bx(w: f64, h: f64, text: &str) -> LayoutBox {
        LayoutBox {
            tag: "div".into(),
            classes: String::new(),
            text: text.into(),
            x: 0.0,
            y: 0.0,
            width: w,
            height: h,
        }
    }

    #[test]
    fn place_classes_assign_ranks() {
        let html = r#"<html><body>
            <div class="card place-2"><span>Silver</span><span>Wagered: $200</span><span>Prize: $20</span></div>
            <div class="card place-1"><span>Gold</span><span>Wagered: $300</span><span>Prize: $30</span></div>
        </body></html>"#;
        let entries = detect(&Html::parse_document(html), &[]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].username, "Gold");
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].username, "Silver");
    }

    #[test]
    fn label_pattern_keeps_innermost() {
        let html = r#"<html><body><section>
            <div class="a"><span>One</span><span>WAGERED $100</span><span>REWARD $10</span></div>
            <div class="b"><span>Two</span><span>WAGERED $90</span><span>REWARD $9</span></div>
        </section></body></html>"#;
        let entries = detect(&Html::parse_document(html), &[]);
        // The <section> wrapper contains both cards and must not be one
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].username, "One");
    }

    #[test]
    fn label_pattern_enforces_card_rectangle() {
        let html = r#"<html><body>
            <div class="a"><span>One</span><span>WAGERED $100</span><span>REWARD $10</span></div>
            <div class="b"><span>Two</span><span>WAGERED $90</span><span>REWARD $9</span></div>
        </body></html>"#;
        // "One" renders as a 300x400 card; "Two" is a full-width banner
        let layout = vec![
            bx(300.0, 400.0, "One\nWAGERED $100\nREWARD $10"),
            bx(1800.0, 80.0, "Two\nWAGERED $90\nREWARD $9"),
        ];
        let entries = detect(&Html::parse_document(html), &layout);
        assert_eq!(entries.len(), 1, "banner-sized candidate must be dropped");
        assert_eq!(entries[0].username, "One");
    }

    #[test]
    fn candidates_without_captured_boxes_still_pass() {
        let html = r#"<html><body>
            <div class="a"><span>One</span><span>WAGERED $100</span><span>REWARD $10</span></div>
        </body></html>"#;
        // Layout was captured but holds nothing matching this card
        let layout = vec![bx(1200.0, 60.0, "Unrelated header")];
        let entries = detect(&Html::parse_document(html), &layout);
        assert_eq!(entries.len(), 1);
    }
}
