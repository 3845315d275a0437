//! Response classification: leaderboard probes and period detection.

use chrono::Utc;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::{CapturedResponse, PayloadKind};
use crate::model::LeaderboardKind;

static LEADERBOARD_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)leaderboard|ranking|leaders|api").expect("hardcoded url regex is valid")
});

static HISTORICAL_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)previous|past|history|archive|last|old|ended|completed")
        .expect("hardcoded historical regex is valid")
});

/// Keys that identify an object as a leaderboard entry when one of them is
/// present together with at least one numeric field.
const USERNAME_KEYS: &[&str] = &[
    "username",
    "user",
    "name",
    "displayName",
    "display_name",
    "player",
    "nick",
];

/// Does this URL smell like a leaderboard/API endpoint?
#[must_use]
pub fn is_leaderboard_url(url: &str) -> bool {
    LEADERBOARD_URL.is_match(url)
}

/// Does this URL point at a finished/previous period?
#[must_use]
pub fn is_historical_url(url: &str) -> bool {
    HISTORICAL_URL.is_match(url)
}

/// Decide current vs previous from the URL and response flags.
///
/// `"ended": true` or `"status": "completed"` anywhere near the top of the
/// payload marks a finished period even when the URL carries no hint.
#[must_use]
pub fn classify_period(url: &str, body: Option<&Value>) -> LeaderboardKind {
    if is_historical_url(url) {
        return LeaderboardKind::Previous;
    }
    if let Some(value) = body
        && object_flags_ended(value)
    {
        return LeaderboardKind::Previous;
    }
    LeaderboardKind::Current
}

fn object_flags_ended(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    if obj.get("ended").and_then(Value::as_bool) == Some(true) {
        return true;
    }
    if obj.get("status").and_then(Value::as_str) == Some("completed") {
        return true;
    }
    // One level of nesting covers the common `{ data: {...} }` envelope
    obj.values().any(|v| {
        v.as_object().is_some_and(|nested| {
            nested.get("ended").and_then(Value::as_bool) == Some(true)
                || nested.get("status").and_then(Value::as_str) == Some("completed")
        })
    })
}

/// Light probe: does this JSON look like it carries leaderboard data?
///
/// True when any array in the value holds objects carrying at least one
/// username-ish key and at least one numeric field.
#[must_use]
pub fn looks_like_leaderboard_json(value: &Value) -> bool {
    find_entry_array(value).is_some()
}

/// Walk a JSON value and return the first array whose elements look like
/// leaderboard entries.
///
/// Depth-first, breadth within objects in key order, so the outermost
/// plausible array wins — pagination envelopes (`{data: {entries: [...]}}`)
/// resolve to the entries.
#[must_use]
pub fn find_entry_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(arr) => {
            if array_is_entry_shaped(arr) {
                Some(arr)
            } else {
                arr.iter().find_map(find_entry_array)
            }
        }
        Value::Object(obj) => obj.values().find_map(find_entry_array),
        _ => None,
    }
}

fn array_is_entry_shaped(arr: &[Value]) -> bool {
    if arr.is_empty() {
        return false;
    }
    // Every element must be an object; the majority must look like entries.
    let mut entryish = 0usize;
    for element in arr {
        let Some(obj) = element.as_object() else {
            return false;
        };
        let has_name = USERNAME_KEYS.iter().any(|k| {
            obj.get(*k)
                .is_some_and(|v| v.is_string() || v.is_number())
        });
        let has_numeric = obj.values().any(Value::is_number)
            || obj
                .values()
                .any(|v| v.as_str().is_some_and(|s| crate::amount::parse_amount(s).is_some()));
        if has_name && has_numeric {
            entryish += 1;
        }
    }
    entryish * 2 > arr.len()
}

/// Build a [`CapturedResponse`] with probe and period classification applied.
#[must_use]
pub fn classify_response(
    url: String,
    status: u16,
    mime_type: String,
    kind: PayloadKind,
    body: String,
) -> CapturedResponse {
    let parsed = match kind {
        PayloadKind::Json => serde_json::from_str::<Value>(&body).ok(),
        // JS and HTML bodies are probed lazily by the strategies
        PayloadKind::Js | PayloadKind::Text => None,
    };
    let leaderboard_shaped = parsed
        .as_ref()
        .is_some_and(looks_like_leaderboard_json)
        || (kind != PayloadKind::Json && is_leaderboard_url(&url));
    let period = classify_period(&url, parsed.as_ref());

    CapturedResponse {
        url,
        status,
        mime_type,
        body,
        kind,
        leaderboard_shaped,
        period,
        captured_at: Utc::now(),
    }
}
