//! Page collector: materialize one leaderboard into pure data.
//!
//! Scrolls until the row count stabilizes, captures HTML, projects a
//! noise-stripped Markdown rendition, grabs layout boxes and a screenshot,
//! and snapshots the network buffer. Everything downstream of here is
//! suspend-free.

pub mod markdown;

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::model::LayoutBox;
use crate::network_tap::{classify, NetworkSnapshot, PayloadKind};
use crate::page_session::PageSession;
use crate::strategies::api::{next_page_urls, PaginatedApi};
use crate::ui::js_scripts;
use crate::utils::constants::{MAX_EXTRA_PAGES, SCROLL_STABLE_POLLS, VIEWPORT_WIDTH};

/// Everything the extraction strategies need, captured once.
#[derive(Debug, Clone)]
pub struct PageCapture {
    pub url: String,
    pub html: String,
    pub markdown: String,
    pub screenshot: Option<Vec<u8>>,
    pub layout: Vec<LayoutBox>,
    pub network: NetworkSnapshot,
    pub viewport_width: f64,
    pub collected_at: DateTime<Utc>,
}

/// Collection knobs.
#[derive(Debug, Clone, Copy)]
pub struct CollectorConfig {
    /// Fixed scroll count; `None` scrolls until stable.
    pub max_scrolls: Option<usize>,
    /// Unchanged row-count polls before the scroll loop stops.
    pub stable_polls: usize,
    pub take_screenshot: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_scrolls: None,
            stable_polls: SCROLL_STABLE_POLLS,
            take_screenshot: true,
        }
    }
}

/// Hard ceiling on scroll steps regardless of stability.
const SCROLL_CEILING: usize = 30;

/// Collect the current page. Screenshot and markdown failures are non-fatal
/// (the fields stay empty); only losing the HTML itself is an error.
pub async fn collect(session: &PageSession, config: CollectorConfig) -> Result<PageCapture> {
    scroll_until_stable(session, config).await;

    let html = session
        .page()
        .content()
        .await
        .map_err(|e| anyhow::anyhow!("failed to capture page HTML: {e}"))?;

    let markdown = match markdown::project(&html) {
        Ok(md) => md,
        Err(e) => {
            warn!("markdown projection failed: {e:#}");
            String::new()
        }
    };

    let layout: Vec<LayoutBox> = session
        .eval(js_scripts::CAPTURE_LAYOUT_BOXES)
        .await
        .unwrap_or_default();

    let screenshot = if config.take_screenshot {
        let params = CaptureScreenshotParams {
            quality: Some(80),
            format: Some(CaptureScreenshotFormat::Jpeg),
            ..Default::default()
        };
        match session.page().screenshot(params).await {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("screenshot failed: {e}");
                None
            }
        }
    } else {
        None
    };

    Ok(PageCapture {
        url: session.current_url().await.unwrap_or_default(),
        html,
        markdown,
        screenshot,
        layout,
        network: session.buffer().snapshot(),
        viewport_width: f64::from(VIEWPORT_WIDTH),
        collected_at: Utc::now(),
    })
}

/// Scroll toward the bottom until the broad row count stops growing (or the
/// bottom/ceiling is reached), then return to the top.
async fn scroll_until_stable(session: &PageSession, config: CollectorConfig) {
    let limit = config.max_scrolls.unwrap_or(SCROLL_CEILING).min(SCROLL_CEILING);
    let mut previous = crate::ui::row_count(session).await.unwrap_or(0);
    let mut stable = 0usize;

    for step in 0..limit {
        let at_bottom: bool = session.eval(js_scripts::SCROLL_STEP).await.unwrap_or(true);
        tokio::time::sleep(std::time::Duration::from_millis(400)).await;

        let current = crate::ui::row_count(session).await.unwrap_or(previous);
        if current == previous {
            stable += 1;
        } else {
            stable = 0;
        }
        previous = current;

        if at_bottom || (config.max_scrolls.is_none() && stable >= config.stable_polls) {
            debug!(steps = step + 1, rows = current, "scroll settled");
            break;
        }
    }

    let _: bool = session.eval(js_scripts::SCROLL_TO_TOP).await.unwrap_or(true);
}

/// Fetch up to [`MAX_EXTRA_PAGES`] further pages of a paginated API from
/// inside the page (browser credentials apply) and feed them to the buffer.
///
/// Failures are collection warnings, never errors — the buffered first page
/// still stands.
pub async fn fetch_extra_pages(session: &PageSession, api: &PaginatedApi) -> usize {
    let mut fetched = 0usize;
    for url in next_page_urls(api, MAX_EXTRA_PAGES) {
        let script = format!(
            "({fetcher})({url})",
            fetcher = js_scripts::FETCH_IN_PAGE,
            url = serde_json::json!(url)
        );
        let body: Option<String> = session.eval(&script).await.unwrap_or(None);
        let Some(body) = body else {
            debug!(%url, "paginated fetch returned nothing");
            break;
        };
        // An empty or short page means the dataset ended
        let response = classify::classify_response(
            url.clone(),
            200,
            "application/json".into(),
            PayloadKind::Json,
            body,
        );
        let done = serde_json::from_str::<serde_json::Value>(&response.body)
            .ok()
            .and_then(|v| {
                crate::network_tap::find_entry_array(&v).map(|arr| arr.len() < api.limit)
            })
            .unwrap_or(true);
        session.buffer().record_response(response);
        fetched += 1;
        if done {
            break;
        }
    }
    fetched
}
