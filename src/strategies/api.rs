//! API extraction strategy over buffered network payloads.
//!
//! Never touches the browser: paginated follow-up fetches happen during
//! collection, so by the time this runs the buffer holds everything.

use serde_json::Value;
use url::Url;

use crate::amount::parse_amount;
use crate::model::{RawEntry, StrategyKind, StrategyOutput};
use crate::network_tap::{
    extract_arrays_from_js, extract_json_from_html, find_entry_array, is_historical_url,
    NetworkSnapshot,
};

const USERNAME_KEYS: &[&str] = &[
    "username",
    "user",
    "name",
    "displayName",
    "display_name",
    "player",
    "nick",
];

const WAGER_KEYS: &[&str] = &[
    "wager",
    "wagered",
    "amount",
    "total",
    "totalWager",
    "total_wager",
    "points",
    "score",
];

const PRIZE_KEYS: &[&str] = &["prize", "reward", "payout", "winnings"];

const RANK_KEYS: &[&str] = &["rank", "position", "place"];

/// Run the API strategy over the buffered network traffic.
///
/// JSON responses are preferred; JS bundles and HTML script payloads serve
/// as fallbacks. Within a category the response yielding the most entries
/// wins — merging across responses would mix periods and pages that the tap
/// already separated.
#[must_use]
pub fn run(network: &NetworkSnapshot) -> StrategyOutput {
    let mut best: Vec<RawEntry> = Vec::new();

    for response in &network.json_responses {
        if is_historical_url(&response.url)
            || response.period == crate::model::LeaderboardKind::Previous
        {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(&response.body) else {
            continue;
        };
        let entries = entries_from_value(&value);
        if entries.len() > best.len() {
            best = entries;
        }
    }

    // Pages of one paginated endpoint concatenate
    if network.json_responses.len() > 1 {
        let paged = concatenate_pages(network);
        if paged.len() > best.len() {
            best = paged;
        }
    }

    if best.is_empty() {
        for response in &network.js_responses {
            for value in extract_arrays_from_js(&response.body) {
                let entries = entries_from_value(&value);
                if entries.len() > best.len() {
                    best = entries;
                }
            }
        }
    }
    if best.is_empty() {
        for response in &network.text_responses {
            for value in extract_json_from_html(&response.body) {
                let entries = entries_from_value(&value);
                if entries.len() > best.len() {
                    best = entries;
                }
            }
        }
    }

    let confidence = if best.is_empty() { 0.0 } else { 85.0 };
    StrategyOutput::new(StrategyKind::Api, best, confidence)
}

/// Map the first entry-shaped array in a payload to raw entries.
#[must_use]
pub fn entries_from_value(value: &Value) -> Vec<RawEntry> {
    let Some(array) = find_entry_array(value) else {
        return Vec::new();
    };
    array
        .iter()
        .enumerate()
        .filter_map(|(idx, element)| map_entry(element, idx))
        .collect()
}

fn map_entry(element: &Value, index: usize) -> Option<RawEntry> {
    let obj = element.as_object()?;

    let username = USERNAME_KEYS.iter().find_map(|k| {
        obj.get(*k).and_then(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    })?;

    let rank = RANK_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(numeric))
        .map_or(index as u32 + 1, |r| r as u32);

    let mut entry = RawEntry::new(rank, username);
    entry.wager = WAGER_KEYS.iter().find_map(|k| obj.get(*k).and_then(numeric));
    entry.prize = PRIZE_KEYS.iter().find_map(|k| obj.get(*k).and_then(numeric));
    Some(entry)
}

/// Accept numbers and money-shaped strings.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite() && *v >= 0.0),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// A paginated API endpoint detected in the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedApi {
    pub url: String,
    pub page: u32,
    pub limit: usize,
}

/// Detect a paginated leaderboard API: the URL exposes `page=N` and
/// `limit=M` and the buffered response holds exactly `M` entries.
#[must_use]
pub fn detect_paginated(network: &NetworkSnapshot) -> Option<PaginatedApi> {
    for response in &network.json_responses {
        if is_historical_url(&response.url) {
            continue;
        }
        let Ok(parsed) = Url::parse(&response.url) else {
            continue;
        };
        let mut page = None;
        let mut limit = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "page" => page = value.parse::<u32>().ok(),
                "limit" => limit = value.parse::<usize>().ok(),
                _ => {}
            }
        }
        let (Some(page), Some(limit)) = (page, limit) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(&response.body) else {
            continue;
        };
        if find_entry_array(&value).is_some_and(|arr| arr.len() == limit) {
            return Some(PaginatedApi {
                url: response.url.clone(),
                page,
                limit,
            });
        }
    }
    None
}

/// URLs for the next `count` pages of a paginated endpoint.
#[must_use]
pub fn next_page_urls(api: &PaginatedApi, count: u32) -> Vec<String> {
    let Ok(base) = Url::parse(&api.url) else {
        return Vec::new();
    };
    (1..=count)
        .filter_map(|offset| {
            let mut next = base.clone();
            let pairs: Vec<(String, String)> = base
                .query_pairs()
                .map(|(k, v)| {
                    if k == "page" {
                        (k.to_string(), (api.page + offset).to_string())
                    } else {
                        (k.to_string(), v.to_string())
                    }
                })
                .collect();
            next.query_pairs_mut().clear().extend_pairs(pairs);
            Some(next.to_string())
        })
        .collect()
}

/// Concatenate entries from responses that are pages of the same endpoint.
fn concatenate_pages(network: &NetworkSnapshot) -> Vec<RawEntry> {
    let Some(api) = detect_paginated(network) else {
        return Vec::new();
    };
    let stem = page_stem(&api.url);

    let mut pages: Vec<(u32, Vec<RawEntry>)> = Vec::new();
    for response in &network.json_responses {
        if page_stem(&response.url) != stem {
            continue;
        }
        let Some(page) = query_page(&response.url) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(&response.body) else {
            continue;
        };
        let entries = entries_from_value(&value);
        if !entries.is_empty() {
            pages.push((page, entries));
        }
    }
    pages.sort_by_key(|(page, _)| *page);

    let mut out: Vec<RawEntry> = Vec::new();
    for (_, mut entries) in pages {
        // Sequence-derived ranks restart per page; rebase them past what we
        // already hold. True global ranks are larger and pass through.
        let offset = out.len() as u32;
        for entry in &mut entries {
            if entry.rank <= offset {
                entry.rank += offset;
            }
        }
        out.append(&mut entries);
    }
    out
}

fn page_stem(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .filter(|(k, _)| k != "page")
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            parsed.query_pairs_mut().clear().extend_pairs(pairs);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

fn query_page(url: &str) -> Option<u32> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LeaderboardKind;
    use crate::network_tap::{CapturedResponse, PayloadKind};
    use chrono::Utc;

    fn json_response(url: &str, body: &str) -> CapturedResponse {
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

    #[test]
    fn pure_api_site() {
        let body = r#"{"leaderboard":[
            {"rank":1,"user":"Alice","wager":1000,"prize":100},
            {"rank":2,"user":"Bob","wager":800,"prize":50}
        ]}"#;
        let mut network = NetworkSnapshot::default();
        network
            .json_responses
            .push(json_response("https://x.example/api/leaderboard", body));

        let output = run(&network);
        assert_eq!(output.kind, StrategyKind::Api);
        assert_eq!(output.entries.len(), 2);
        assert_eq!(output.entries[0].username, "Alice");
        assert_eq!(output.entries[0].wager, Some(1000.0));
        assert_eq!(output.entries[1].prize, Some(50.0));
        assert!(output.confidence >= 70.0);
    }

    #[test]
    fn string_amounts_and_missing_ranks() {
        let body = r#"[{"name":"Zed","wagered":"$1,234.56"},{"name":"Yve","wagered":"800"}]"#;
        let mut network = NetworkSnapshot::default();
        network
            .json_responses
            .push(json_response("https://x.example/api/leaders", body));

        let output = run(&network);
        assert_eq!(output.entries[0].rank, 1, "sequence index fills in rank");
        assert_eq!(output.entries[0].wager, Some(1234.56));
    }

    #[test]
    fn historical_responses_skipped() {
        let body = r#"[{"user":"Old","wager":1}]"#;
        let mut network = NetworkSnapshot::default();
        network.json_responses.push(json_response(
            "https://x.example/api/leaderboard/previous",
            body,
        ));
        assert!(run(&network).is_empty());
    }

    #[test]
    fn paginated_detection_and_next_urls() {
        let body = r#"[{"user":"A","wager":1},{"user":"B","wager":2}]"#;
        let mut network = NetworkSnapshot::default();
        network.json_responses.push(json_response(
            "https://x.example/api/leaderboard?page=1&limit=2",
            body,
        ));

        let api = detect_paginated(&network).expect("pagination detected");
        assert_eq!(api.page, 1);
        assert_eq!(api.limit, 2);

        let urls = next_page_urls(&api, 2);
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("page=2"));
        assert!(urls[1].contains("page=3"));
    }

    #[test]
    fn pages_concatenate_in_order() {
        let page1 = r#"[{"user":"A","wager":10},{"user":"B","wager":9}]"#;
        let page2 = r#"[{"user":"C","wager":8},{"user":"D","wager":7}]"#;
        let mut network = NetworkSnapshot::default();
        network.json_responses.push(json_response(
            "https://x.example/api/leaderboard?page=1&limit=2",
            page1,
        ));
        network.json_responses.push(json_response(
            "https://x.example/api/leaderboard?page=2&limit=2",
            page2,
        ));

        let output = run(&network);
        assert_eq!(output.entries.len(), 4);
        assert_eq!(output.entries[2].username, "C");
        assert_eq!(output.entries[2].rank, 3);
        assert_eq!(output.entries[3].rank, 4);
    }

    #[test]
    fn js_bundle_fallback() {
        let mut network = NetworkSnapshot::default();
        network.js_responses.push(CapturedResponse {
            url: "https://x.example/bundle.js".into(),
            status: 200,
            mime_type: "application/javascript".into(),
            body: r#"window.__LB__ = [{"username":"Jay","wager":500},{"username":"Kay","wager":400}];"#
                .into(),
            kind: PayloadKind::Js,
            leaderboard_shaped: true,
            period: LeaderboardKind::Current,
            captured_at: Utc::now(),
        });
        let output = run(&network);
        assert_eq!(output.entries.len(), 2);
        assert_eq!(output.entries[0].username, "Jay");
    }
}
