//! UI interactor: rows-per-page maximization, pagination and readiness.
//!
//! All heuristics execute as JS in page scope (see [`js_scripts`]); this
//! module sequences them and owns the waits. Every state-changing action
//! runs under [`retry::with_ui_retry`].

pub mod js_scripts;
pub mod readiness;
pub mod retry;

pub use readiness::wait_for_leaderboard_ready;
pub use retry::{with_ui_retry, UiRetryPolicy};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::page_session::PageSession;

/// Inline a JSON-encoded argument into a function-expression script.
fn call_with_arg(script: &str, arg: &serde_json::Value) -> String {
    format!("({script})({arg})")
}

#[derive(Debug, Deserialize)]
struct NativeSelectOutcome {
    changed: bool,
    value: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DropdownCandidate {
    x: f64,
    y: f64,
    #[allow(dead_code)]
    area: f64,
}

/// Select the maximum "rows per page" option.
///
/// Strategy chain, first success wins: native `<select>`, custom dropdown
/// (trigger click → popover → largest option), then a Show-All button.
pub async fn select_maximum_entries(session: &PageSession) -> Result<bool> {
    let policy = UiRetryPolicy::default();

    // 1. Native select
    let native: NativeSelectOutcome = session
        .eval(js_scripts::SELECT_NATIVE_MAX)
        .await
        .context("native select scan failed")?;
    if native.changed {
        info!(rows = ?native.value, "native rows-per-page select maximized");
        return Ok(true);
    }

    // 2. Custom dropdowns
    let candidates: Vec<DropdownCandidate> = session
        .eval(js_scripts::SCAN_DROPDOWN_TRIGGERS)
        .await
        .unwrap_or_default();
    for candidate in candidates {
        let opened = with_ui_retry(policy, || open_dropdown(session, candidate.x, candidate.y))
            .await
            .unwrap_or(false);
        if !opened {
            continue;
        }
        let selected: bool = session
            .eval(js_scripts::POPOVER_SELECT_MAX)
            .await
            .unwrap_or(false);
        if selected {
            info!("custom dropdown rows-per-page maximized");
            return Ok(true);
        }
    }

    // 3. Show-All button
    let clicked: bool = session
        .eval(js_scripts::CLICK_SHOW_ALL)
        .await
        .unwrap_or(false);
    if clicked {
        info!("show-all control clicked");
    }
    Ok(clicked)
}

/// Click a dropdown trigger and wait briefly for its popover.
async fn open_dropdown(session: &PageSession, x: f64, y: f64) -> Result<bool> {
    session
        .eval::<bool>(js_scripts::SCROLL_LEADERBOARD_INTO_VIEW)
        .await
        .ok();
    let point = serde_json::json!([x, y]);
    let script = format!(
        "({clicker}).apply(null, {point})",
        clicker = js_scripts::CLICK_AT_POINT
    );
    let clicked: bool = session.eval(&script).await.context("trigger click failed")?;
    if !clicked {
        // keyboard fallback
        let script = format!(
            "({opener}).apply(null, {point})",
            opener = js_scripts::KEYBOARD_OPEN_AT_POINT
        );
        let _: bool = session.eval(&script).await.unwrap_or(false);
    }
    tokio::time::sleep(std::time::Duration::from_millis(350)).await;
    Ok(true)
}

/// Click one pagination / Show-More control. Returns whether anything was
/// clicked.
pub async fn click_show_more(session: &PageSession) -> Result<bool> {
    let clicked: bool = session
        .eval(js_scripts::CLICK_SHOW_MORE)
        .await
        .context("show-more scan failed")?;
    if clicked {
        debug!("show-more control clicked");
    }
    Ok(clicked)
}

/// Texts of visible leaderboard tabs/buttons.
pub async fn detect_leaderboard_tabs(session: &PageSession) -> Result<Vec<String>> {
    session
        .eval(js_scripts::DETECT_LEADERBOARD_TABS)
        .await
        .context("tab detection failed")
}

/// Click a tab/button by its visible text.
pub async fn click_by_text(session: &PageSession, text: &str) -> Result<bool> {
    let script = call_with_arg(js_scripts::CLICK_BY_TEXT, &serde_json::json!(text));
    session.eval(&script).await.context("click-by-text failed")
}

/// Click at page coordinates (used for switchers discovered with positions).
pub async fn click_at(session: &PageSession, x: f64, y: f64) -> Result<bool> {
    let script = format!(
        "({clicker}).apply(null, [{x}, {y}])",
        clicker = js_scripts::CLICK_AT_POINT
    );
    session.eval(&script).await.context("coordinate click failed")
}

/// Current broad-selector row count.
pub async fn row_count(session: &PageSession) -> Result<usize> {
    session.eval(js_scripts::COUNT_ROWS).await.context("row count failed")
}
