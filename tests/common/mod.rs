//! Shared helpers for pipeline-level tests.

use chrono::Utc;
use uuid::Uuid;

use leaderscrape::fusion::FusionOutcome;
use leaderscrape::model::{
    LeaderboardKind, LeaderboardResult, StrategyOutput, ValidationReport,
};
use leaderscrape::network_tap::{CapturedResponse, NetworkSnapshot, PayloadKind};
use leaderscrape::normalize::normalize;
use leaderscrape::sanitize::sanitize;
use leaderscrape::validator::{collect_warnings, validate, ValidatorConfig};

/// Wrap a JSON body as a captured response on a leaderboard-ish URL.
pub fn json_response(url: &str, body: &str) -> CapturedResponse {
    CapturedResponse {
        url: url.into(),
        status: 200,
        mime_type: "application/json".into(),
        body: body.into(),
        kind: PayloadKind::Json,
        leaderboard_shaped: true,
        period: LeaderboardKind::Current,
        captured_at: Utc::now(),
    }
}

pub fn snapshot_with(responses: Vec<CapturedResponse>) -> NetworkSnapshot {
    NetworkSnapshot {
        json_responses: responses,
        ..NetworkSnapshot::default()
    }
}

/// Drive fused strategy outputs through the back half of the pipeline the
/// way the orchestrator does: fuse → sanitize → normalize → validate →
/// assemble, returning the result plus the advisory warnings.
pub fn finish_pipeline(
    outputs: &[StrategyOutput],
    site_names: &[String],
) -> Option<(LeaderboardResult, Vec<String>)> {
    let outcome: FusionOutcome = leaderscrape::fusion::fuse(outputs)?;

    let report = sanitize(outcome.entries.clone(), site_names);
    let entries = normalize(report.entries, LeaderboardKind::Current, Utc::now());
    if entries.len() < 2 {
        return None;
    }

    let agreement = (!outcome.single_source).then_some(outcome.cross_validation.overall_agreement);
    let validation = validate(&entries, agreement, ValidatorConfig::default());
    let confidence = (outcome.source_confidence + outcome.confidence_adjustment
        - validation.confidence_penalty)
        .clamp(0.0, 100.0);

    let mut result = LeaderboardResult {
        id: Uuid::new_v4(),
        extraction_id: Uuid::new_v4(),
        name: "weekly".into(),
        url: "https://x.example/leaderboard".into(),
        kind: LeaderboardKind::Current,
        source: outcome.recommended.label().to_string(),
        entries,
        prizes: Vec::new(),
        total_prize_pool: 0.0,
        total_wagered: 0.0,
        confidence,
        scraped_at: Utc::now(),
        validation: ValidationReport::passing(),
    };
    result.validation = validation;
    result.recompute_totals();
    let warnings = collect_warnings(&result);
    Some((result, warnings))
}
