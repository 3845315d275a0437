//! Network tap: observes browser traffic and buffers payloads for extraction.
//!
//! Every response the page produces is categorized as JSON, JS or text and
//! pushed into a [`NetworkBuffer`] owned by the page session. Leaderboard-
//! shaped requests keep their method and headers for potential replay. The
//! tap never raises into the page session — classification and body-fetch
//! failures are logged at debug level and dropped.

pub mod classify;
pub mod embedded;

pub use classify::{
    classify_period, find_entry_array, is_historical_url, is_leaderboard_url,
    looks_like_leaderboard_json,
};
pub use embedded::{extract_arrays_from_js, extract_json_from_html};

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{
    EventRequestWillBeSent, EventResponseReceived, GetResponseBodyParams,
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::model::LeaderboardKind;

/// Payload category assigned by the tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Json,
    Js,
    Text,
}

/// One buffered response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedResponse {
    pub url: String,
    pub status: u16,
    pub mime_type: String,
    pub body: String,
    pub kind: PayloadKind,
    /// True when a light probe says the body carries leaderboard entries.
    pub leaderboard_shaped: bool,
    /// Current vs previous-period classification.
    pub period: LeaderboardKind,
    pub captured_at: DateTime<Utc>,
}

/// A request retained for replay (method + headers survive).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedRequest {
    pub url: String,
    pub method: String,
    pub headers: serde_json::Value,
}

#[derive(Debug, Default)]
struct BufferInner {
    json_responses: Vec<CapturedResponse>,
    js_responses: Vec<CapturedResponse>,
    text_responses: Vec<CapturedResponse>,
    captured_urls: Vec<String>,
    captured_requests: Vec<CapturedRequest>,
    /// Leaderboard-shaped URLs learned on this page. Survive `clear()` so a
    /// later leaderboard on the same page session can replay them.
    url_patterns: Vec<String>,
}

/// Response/request buffer exclusively owned by one page session.
///
/// Cloning shares the same underlying buffer — the clone is a handle, not a
/// copy. Use [`NetworkBuffer::snapshot`] for an immutable copy.
#[derive(Debug, Clone, Default)]
pub struct NetworkBuffer {
    inner: Arc<Mutex<BufferInner>>,
}

/// Immutable copy of the buffer contents handed to the strategies.
#[derive(Debug, Clone, Default)]
pub struct NetworkSnapshot {
    pub json_responses: Vec<CapturedResponse>,
    pub js_responses: Vec<CapturedResponse>,
    pub text_responses: Vec<CapturedResponse>,
    pub captured_urls: Vec<String>,
    pub captured_requests: Vec<CapturedRequest>,
    pub url_patterns: Vec<String>,
}

impl NetworkBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a classified response body.
    pub fn record_response(&self, response: CapturedResponse) {
        let mut inner = self.inner.lock();
        if response.leaderboard_shaped && !inner.url_patterns.contains(&response.url) {
            inner.url_patterns.push(response.url.clone());
        }
        inner.captured_urls.push(response.url.clone());
        match response.kind {
            PayloadKind::Json => inner.json_responses.push(response),
            PayloadKind::Js => inner.js_responses.push(response),
            PayloadKind::Text => inner.text_responses.push(response),
        }
    }

    /// Retain a request for potential replay.
    pub fn record_request(&self, request: CapturedRequest) {
        self.inner.lock().captured_requests.push(request);
    }

    /// Scoped reset between leaderboards: drops buffered bodies and request
    /// history but keeps learned URL patterns.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.json_responses.clear();
        inner.js_responses.clear();
        inner.text_responses.clear();
        inner.captured_urls.clear();
        inner.captured_requests.clear();
    }

    #[must_use]
    pub fn snapshot(&self) -> NetworkSnapshot {
        let inner = self.inner.lock();
        NetworkSnapshot {
            json_responses: inner.json_responses.clone(),
            js_responses: inner.js_responses.clone(),
            text_responses: inner.text_responses.clone(),
            captured_urls: inner.captured_urls.clone(),
            captured_requests: inner.captured_requests.clone(),
            url_patterns: inner.url_patterns.clone(),
        }
    }

    #[must_use]
    pub fn json_count(&self) -> usize {
        self.inner.lock().json_responses.len()
    }

    #[must_use]
    pub fn learned_patterns(&self) -> Vec<String> {
        self.inner.lock().url_patterns.clone()
    }
}

/// Maximum body size the tap will buffer (5 MB). Streaming media and bundle
/// payloads past this are skipped outright.
const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Delay before asking CDP for a response body. Bodies are not available
/// until loading finishes; a short grace covers the common case without
/// wiring up loadingFinished correlation.
const BODY_FETCH_GRACE: Duration = Duration::from_millis(250);

/// Attach the tap to a page. Returns the listener tasks; abort them when the
/// page session closes.
pub async fn attach(page: &Page, buffer: NetworkBuffer) -> anyhow::Result<Vec<JoinHandle<()>>> {
    let mut handles = Vec::with_capacity(2);

    let mut responses = page
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(|e| anyhow::anyhow!("failed to attach response listener: {e}"))?;
    let response_page = page.clone();
    let response_buffer = buffer.clone();
    handles.push(tokio::spawn(async move {
        while let Some(event) = responses.next().await {
            let url = event.response.url.clone();
            let mime = event.response.mime_type.to_lowercase();
            let status = event.response.status;
            let kind = if mime.contains("json") {
                PayloadKind::Json
            } else if mime.contains("javascript") || mime.contains("ecmascript") {
                PayloadKind::Js
            } else if mime.contains("text") {
                PayloadKind::Text
            } else {
                trace!(url = %url, mime = %mime, "tap skipping non-text response");
                continue;
            };

            let request_id = event.request_id.clone();
            let page = response_page.clone();
            let buffer = response_buffer.clone();
            tokio::spawn(async move {
                tokio::time::sleep(BODY_FETCH_GRACE).await;
                let body = match page.execute(GetResponseBodyParams::new(request_id)).await {
                    Ok(result) if !result.base64_encoded => result.result.body.clone(),
                    Ok(_) => return, // binary body, nothing to parse
                    Err(e) => {
                        debug!(url = %url, "tap could not fetch body: {e}");
                        return;
                    }
                };
                if body.len() > MAX_BODY_BYTES || body.is_empty() {
                    return;
                }
                buffer.record_response(classify::classify_response(
                    url,
                    status as u16,
                    mime,
                    kind,
                    body,
                ));
            });
        }
    }));

    let mut requests = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .map_err(|e| anyhow::anyhow!("failed to attach request listener: {e}"))?;
    let request_buffer = buffer;
    handles.push(tokio::spawn(async move {
        while let Some(event) = requests.next().await {
            let url = event.request.url.clone();
            // Only leaderboard-shaped requests are worth replaying
            if !is_leaderboard_url(&url) {
                continue;
            }
            let headers = event.request.headers.inner().clone();
            request_buffer.record_request(CapturedRequest {
                url,
                method: event.request.method.clone(),
                headers,
            });
        }
    }));

    Ok(handles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shaped(url: &str) -> CapturedResponse {
        CapturedResponse {
            url: url.to_string(),
            status: 200,
            mime_type: "application/json".into(),
            body: "[]".into(),
            kind: PayloadKind::Json,
            leaderboard_shaped: true,
            period: LeaderboardKind::Current,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn clear_keeps_learned_patterns() {
        let buffer = NetworkBuffer::new();
        buffer.record_response(shaped("https://a.example/api/leaderboard"));
        buffer.record_request(CapturedRequest {
            url: "https://a.example/api/leaderboard".into(),
            method: "GET".into(),
            headers: serde_json::json!({}),
        });

        assert_eq!(buffer.json_count(), 1);
        buffer.clear();

        let snap = buffer.snapshot();
        assert!(snap.json_responses.is_empty());
        assert!(snap.captured_requests.is_empty());
        assert_eq!(
            snap.url_patterns,
            vec!["https://a.example/api/leaderboard".to_string()],
            "learned URL patterns must survive clear()"
        );
    }

    #[test]
    fn clones_share_one_buffer() {
        let buffer = NetworkBuffer::new();
        let handle = buffer.clone();
        handle.record_response(shaped("https://b.example/rankings"));
        assert_eq!(buffer.json_count(), 1);
    }
}
