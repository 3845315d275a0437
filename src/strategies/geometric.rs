//! Geometric extraction strategy.
//!
//! When markup gives nothing away, layout still does: leaderboard rows are
//! same-sized blocks stacked at one x position, and podium cards are a short
//! row of larger blocks sitting above them. Works purely over the
//! [`LayoutBox`] set captured at collection time.

use std::collections::HashSet;

use crate::model::{LayoutBox, RawEntry, StrategyKind, StrategyOutput};
use crate::strategies::textline::parse_entry_block;

/// Minimum usable block size.
const MIN_WIDTH: f64 = 50.0;
const MIN_HEIGHT: f64 = 20.0;
/// Blocks wider than this fraction of the viewport are page scaffolding.
const MAX_VIEWPORT_FRACTION: f64 = 0.95;
/// Size similarity tolerance for grouping.
const SIZE_TOLERANCE: f64 = 0.15;
/// Column alignment tolerance.
const X_TOLERANCE: f64 = 10.0;
/// A list needs at least this many aligned rows.
const MIN_LIST_LEN: usize = 5;
/// Podium cards must average at least this much more area than list rows.
const PODIUM_AREA_RATIO: f64 = 1.2;

/// Run the geometric strategy over captured layout boxes.
#[must_use]
pub fn run(boxes: &[LayoutBox], viewport_width: f64) -> StrategyOutput {
    let usable: Vec<&LayoutBox> = boxes
        .iter()
        .filter(|b| {
            b.width >= MIN_WIDTH
                && b.height >= MIN_HEIGHT
                && b.width <= viewport_width * MAX_VIEWPORT_FRACTION
                && !b.text.trim().is_empty()
        })
        .collect();

    let groups = group_by_size(&usable);

    let Some(list) = pick_list(&groups) else {
        return StrategyOutput::new(StrategyKind::Geometric, Vec::new(), 0.0);
    };
    let podium = pick_podium(&groups, list);

    let mut entries = Vec::new();
    let mut next_rank = 1u32;

    if let Some(podium) = podium {
        let mut cards: Vec<&LayoutBox> = podium.to_vec();
        cards.sort_by(|a, b| a.x.total_cmp(&b.x));
        for card in cards {
            if let Some(mut entry) = parse_box(card) {
                if entry.rank == 0 {
                    entry.rank = next_rank;
                }
                next_rank = entry.rank + 1;
                entries.push(entry);
            }
        }
    }

    let mut rows: Vec<&LayoutBox> = list.to_vec();
    rows.sort_by(|a, b| a.y.total_cmp(&b.y));
    let used: HashSet<u32> = entries.iter().map(|e| e.rank).collect();
    for row in rows {
        if let Some(mut entry) = parse_box(row) {
            if entry.rank == 0 {
                while used.contains(&next_rank) {
                    next_rank += 1;
                }
                entry.rank = next_rank;
            }
            next_rank = entry.rank + 1;
            entries.push(entry);
        }
    }

    let confidence = if entries.len() >= MIN_LIST_LEN { 55.0 } else { 40.0 };
    StrategyOutput::new(StrategyKind::Geometric, entries, confidence)
}

fn parse_box(b: &LayoutBox) -> Option<RawEntry> {
    let lines: Vec<&str> = b.text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    parse_entry_block(&lines)
}

fn within_tolerance(a: f64, b: f64) -> bool {
    let scale = a.max(b).max(1.0);
    (a - b).abs() / scale <= SIZE_TOLERANCE
}

/// Greedy clustering on (width, height).
fn group_by_size<'a>(boxes: &[&'a LayoutBox]) -> Vec<Vec<&'a LayoutBox>> {
    let mut groups: Vec<Vec<&LayoutBox>> = Vec::new();
    for b in boxes {
        let found = groups.iter_mut().find(|group| {
            let head = group[0];
            within_tolerance(head.width, b.width) && within_tolerance(head.height, b.height)
        });
        match found {
            Some(group) => group.push(b),
            None => groups.push(vec![b]),
        }
    }
    groups
}

/// The list is the x-aligned group of ≥ 5 boxes whose top sits highest.
fn pick_list<'a, 'b>(groups: &'b [Vec<&'a LayoutBox>]) -> Option<&'b Vec<&'a LayoutBox>> {
    groups
        .iter()
        .filter(|group| group.len() >= MIN_LIST_LEN && x_aligned(group))
        .min_by(|a, b| top_y(a).total_cmp(&top_y(b)))
}

fn x_aligned(group: &[&LayoutBox]) -> bool {
    let x0 = group[0].x;
    group.iter().all(|b| (b.x - x0).abs() <= X_TOLERANCE)
}

fn top_y(group: &[&LayoutBox]) -> f64 {
    group.iter().map(|b| b.y).fold(f64::INFINITY, f64::min)
}

fn median_area(group: &[&LayoutBox]) -> f64 {
    let mut areas: Vec<f64> = group.iter().map(|b| b.area()).collect();
    areas.sort_by(f64::total_cmp);
    areas[areas.len() / 2]
}

/// A podium is a 2–4 element group entirely above the list whose average
/// area clearly exceeds the list's median row area.
fn pick_podium<'a, 'b>(
    groups: &'b [Vec<&'a LayoutBox>],
    list: &[&'a LayoutBox],
) -> Option<&'b Vec<&'a LayoutBox>> {
    let list_top = top_y(list);
    let list_median = median_area(list);
    groups
        .iter()
        .filter(|group| {
            (2..=4).contains(&group.len())
                && group.iter().all(|b| b.y < list_top)
                && avg_area(group) >= list_median * PODIUM_AREA_RATIO
        })
        .min_by(|a, b| top_y(a).total_cmp(&top_y(b)))
}

fn avg_area(group: &[&LayoutBox]) -> f64 {
    group.iter().map(|b| b.area()).sum::<f64>() / group.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bx(x: f64, y: f64, w: f64, h: f64, text: &str) -> LayoutBox {
        LayoutBox {
            tag: "div".into(),
            classes: String::new(),
            text: text.into(),
            x,
            y,
            width: w,
            height: h,
        }
    }

    fn sample_page() -> Vec<LayoutBox> {
        let mut boxes = Vec::new();
        // Podium: three wide cards in a row
        boxes.push(bx(200.0, 100.0, 300.0, 400.0, "2\nSilver\nWagered: $200\n$20"));
        boxes.push(bx(550.0, 80.0, 310.0, 410.0, "1\nGold\nWagered: $300\n$30"));
        boxes.push(bx(900.0, 100.0, 305.0, 395.0, "3\nBronze\nWagered: $100\n$10"));
        // List: six aligned rows
        for i in 0..6 {
            boxes.push(bx(
                180.0,
                600.0 + f64::from(i) * 60.0,
                1000.0,
                50.0,
                &format!("#{}\nplayer{}\n$ {}0\nWAGERED", i + 4, i + 4, 9 - i),
            ));
        }
        // Noise: tiny icons and a full-width banner
        boxes.push(bx(0.0, 0.0, 1900.0, 80.0, "Banner"));
        boxes.push(bx(10.0, 10.0, 20.0, 20.0, "x"));
        boxes
    }

    #[test]
    fn podium_and_list_detected() {
        let boxes = sample_page();
        let output = run(&boxes, 1920.0);
        assert_eq!(output.kind, StrategyKind::Geometric);
        assert_eq!(output.entries.len(), 9);
        // Podium sorted left-to-right: Silver(x=200) has rank badge 2
        assert_eq!(output.entries[0].username, "Silver");
        assert_eq!(output.entries[0].rank, 2);
        assert_eq!(output.entries[1].username, "Gold");
        assert_eq!(output.entries[1].rank, 1);
        // List rows carry explicit ranks
        let p4 = output
            .entries
            .iter()
            .find(|e| e.rank == 4)
            .expect("rank 4 present");
        assert_eq!(p4.username, "player4");
    }

    #[test]
    fn no_aligned_group_yields_nothing() {
        let boxes = vec![
            bx(0.0, 0.0, 300.0, 100.0, "a"),
            bx(400.0, 0.0, 300.0, 100.0, "b"),
        ];
        let output = run(&boxes, 1920.0);
        assert!(output.is_empty());
    }

    #[test]
    fn banner_wider_than_viewport_fraction_is_ignored() {
        let mut boxes = sample_page();
        // Make the banner the same size class as rows; it is still too wide
        boxes.push(bx(0.0, 50.0, 1900.0, 50.0, "#1\nFake\n$999\nWAGERED"));
        let output = run(&boxes, 1920.0);
        assert!(output.entries.iter().all(|e| e.username != "Fake"));
    }
}
