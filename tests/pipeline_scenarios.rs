//! End-to-end pipeline scenarios over captured data (no browser).

mod common;

use common::{finish_pipeline, json_response, snapshot_with};
use leaderscrape::model::{RawEntry, StrategyKind, StrategyOutput};
use leaderscrape::strategies::{api, dom, markdown};

#[test]
fn pure_api_site_produces_high_confidence_result() {
    let body = r#"{"leaderboard":[
        {"rank":1,"user":"Alice","wager":1000,"prize":100},
        {"rank":2,"user":"Bob","wager":800,"prize":50}
    ]}"#;
    let network = snapshot_with(vec![json_response("https://x.example/api/leaderboard", body)]);

    let output = api::run(&network);
    assert_eq!(output.kind, StrategyKind::Api);

    let (result, warnings) =
        finish_pipeline(&[output], &[]).expect("pipeline emits a result");

    assert_eq!(result.source, "api");
    assert_eq!(result.entries.len(), 2);
    assert_eq!(result.entries[0].rank, 1);
    assert_eq!(result.entries[0].username, "Alice");
    assert_eq!(result.entries[1].username, "Bob");
    assert_eq!(result.total_wagered, 1800.0);
    assert_eq!(result.total_prize_pool, 150.0);
    assert!(result.confidence >= 70.0, "confidence {}", result.confidence);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    assert!(result.validation.valid);
}

#[test]
fn markdown_table_with_prize_before_wager() {
    let md = "\
| Place | User | Prize | Wagered | Reward |
| --- | --- | --- | --- | --- |
| 1 | CodeUser | $150 | $2,732.62 | bonus |
| 2 | Other | $100 | $1,800.00 | bonus |";

    let output = markdown::run(md);
    let (result, _) = finish_pipeline(&[output], &[]).expect("pipeline emits a result");

    assert_eq!(result.source, "markdown");
    assert_eq!(result.entries[0].prize, 150.0);
    assert_eq!(result.entries[0].wager, 2732.62);
    assert_eq!(result.entries[1].prize, 100.0);
    assert_eq!(result.entries[1].wager, 1800.0);
}

#[test]
fn podium_with_censored_usernames() {
    let md = "\
Z****o
Wagered: \\$285,750
\\$2,000

K***r
Wagered: \\$201,330
\\$1,000

M**x
Wagered: \\$150,000
\\$500";

    let output = markdown::run(md);
    let (result, _) = finish_pipeline(&[output], &[]).expect("pipeline emits a result");

    assert_eq!(result.entries.len(), 3);
    assert_eq!(result.entries[0].username, "Z****o", "asterisks preserved");
    assert_eq!(result.entries[0].wager, 285_750.0);
    assert_eq!(result.entries[0].prize, 2_000.0);
    assert_eq!(result.entries[2].username, "M**x");
}

#[test]
fn dom_labels_after_values() {
    let html = r#"<html><body>
        <li class="entry"><div>1</div><div>PlayerX</div><div>12345</div><div>WAGERED</div><div>100</div><div>REWARD</div></li>
        <li class="entry"><div>2</div><div>PlayerY</div><div>11000</div><div>WAGERED</div><div>90</div><div>REWARD</div></li>
    </body></html>"#;

    let output = dom::run(html, &[]);
    let (result, _) = finish_pipeline(&[output], &[]).expect("pipeline emits a result");

    let first = &result.entries[0];
    assert_eq!(first.rank, 1);
    assert_eq!(first.username, "PlayerX");
    assert_eq!(first.wager, 12345.0);
    assert_eq!(first.prize, 100.0);
}

#[test]
fn cross_validation_disagreement_still_emits() {
    let rows = |scale: f64| -> Vec<RawEntry> {
        (1..=10)
            .map(|i| {
                let mut e = RawEntry::new(i, format!("user{i}"));
                e.wager = Some(1000.0 * scale / f64::from(i));
                e.prize = Some(100.0 * scale / f64::from(i));
                e
            })
            .collect()
    };
    let api_output = StrategyOutput::new(StrategyKind::Api, rows(1.0), 85.0);
    let dom_output = StrategyOutput::new(StrategyKind::Dom, rows(1.08), 65.0);

    let outcome = leaderscrape::fusion::fuse(&[api_output.clone(), dom_output.clone()])
        .expect("fusion produces an outcome");
    assert!(outcome.cross_validation.overall_agreement <= 0.5);
    assert!(!outcome.cross_validation.discrepancies.is_empty());
    assert!(outcome.confidence_adjustment <= -10.0);

    let (result, _) =
        finish_pipeline(&[api_output, dom_output], &[]).expect("result still emitted");
    assert_eq!(result.source, "api", "higher-coverage source recommended");
    assert!(!result.validation.strategy_agreement);
    assert!(
        result.confidence <= 85.0 - 10.0,
        "penalty applied: {}",
        result.confidence
    );
    assert_eq!(result.entries.len(), 10);
}

#[test]
fn site_branding_rows_are_dropped_from_results() {
    let mut entries: Vec<RawEntry> = (1..=3)
        .map(|i| {
            let mut e = RawEntry::new(i, format!("user{i}"));
            e.wager = Some(100.0 / f64::from(i));
            e
        })
        .collect();
    let mut branding = RawEntry::new(4, "RollCasino");
    branding.wager = Some(1.0);
    entries.push(branding);

    let output = StrategyOutput::new(StrategyKind::Markdown, entries, 70.0);
    let (result, _) = finish_pipeline(&[output], &["rollcasino".to_string()])
        .expect("pipeline emits a result");
    assert_eq!(result.entries.len(), 3);
    assert!(result.entries.iter().all(|e| e.username != "RollCasino"));
}

#[test]
fn two_entry_leaderboard_is_valid() {
    let entries: Vec<RawEntry> = (1..=2)
        .map(|i| {
            let mut e = RawEntry::new(i, format!("user{i}"));
            e.wager = Some(10.0 / f64::from(i));
            e.prize = Some(1.0);
            e
        })
        .collect();
    let output = StrategyOutput::new(StrategyKind::Api, entries, 85.0);
    let (result, _) = finish_pipeline(&[output], &[]).expect("two entries suffice");
    assert!(result.validation.completeness);
}
