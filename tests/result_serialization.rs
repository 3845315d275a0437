//! Wire-format checks for persisted shapes.

use chrono::Utc;
use uuid::Uuid;

use leaderscrape::model::{
    LeaderboardEntry, LeaderboardKind, LeaderboardResult, SiteRun, ValidationReport,
};

fn sample_result() -> LeaderboardResult {
    let entry = LeaderboardEntry {
        rank: 1,
        username: "Alice".into(),
        wager: 1000.0,
        prize: 100.0,
        extracted_at: Utc::now(),
        leaderboard_kind: LeaderboardKind::Current,
    };
    let mut result = LeaderboardResult {
        id: Uuid::new_v4(),
        extraction_id: Uuid::new_v4(),
        name: "weekly".into(),
        url: "https://x.example/leaderboard".into(),
        kind: LeaderboardKind::Current,
        source: "api".into(),
        entries: vec![entry],
        prizes: vec![],
        total_prize_pool: 0.0,
        total_wagered: 0.0,
        confidence: 82.0,
        scraped_at: Utc::now(),
        validation: ValidationReport::passing(),
    };
    result.recompute_totals();
    result
}

#[test]
fn result_uses_camel_case_wire_names() {
    let json = serde_json::to_value(sample_result()).expect("serialize result");
    for key in [
        "extractionId",
        "totalPrizePool",
        "totalWagered",
        "scrapedAt",
    ] {
        assert!(json.get(key).is_some(), "missing key {key}: {json}");
    }
    assert_eq!(json["type"], "current");
    assert_eq!(json["entries"][0]["leaderboard_type"], "current");
    assert!(json["entries"][0].get("extractedAt").is_some());
    assert!(
        json["validation"].get("confidencePenalty").is_some(),
        "validation block keeps its wire names"
    );
}

#[test]
fn site_run_round_trips_through_json() {
    let mut run = SiteRun::begin("x.example");
    run.results.push(sample_result());
    run.record_warning("weekly: something advisory");
    run.metadata.leaderboards_discovered = 2;
    run.metadata.leaderboards_scraped = 1;
    run.metadata.record_strategy("api");
    run.completed_at = Some(Utc::now());

    let json = serde_json::to_string(&run).expect("serialize run");
    let back: SiteRun = serde_json::from_str(&json).expect("deserialize run");

    assert_eq!(back.domain, run.domain);
    assert_eq!(back.results.len(), 1);
    assert_eq!(back.results[0].entries[0].username, "Alice");
    assert_eq!(back.warnings, run.warnings);
    assert_eq!(back.metadata.leaderboards_discovered, 2);
    assert_eq!(back.metadata.strategies_used, vec!["api"]);
    assert!(!back.timed_out);
}

#[test]
fn metadata_keys_match_the_snapshot_contract() {
    let run = SiteRun::begin("x.example");
    let json = serde_json::to_value(&run).expect("serialize run");
    for key in ["extractionId", "startedAt", "completedAt", "metadata"] {
        assert!(json.get(key).is_some(), "missing key {key}");
    }
    for key in ["leaderboardsDiscovered", "leaderboardsScraped", "strategiesUsed"] {
        assert!(json["metadata"].get(key).is_some(), "missing metadata key {key}");
    }
}
