//! Owned page resource: one browser page plus its network tap.
//!
//! All browser interaction (Navigator, UI Interactor, Collector) goes
//! through a [`PageSession`]. The session owns its [`NetworkBuffer`] and the
//! tap listener tasks; `close()` runs on every exit path of the per-site
//! workflow.

use anyhow::{Context, Result};
use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::browser_setup::apply_stealth_measures;
use crate::network_tap::{self, NetworkBuffer};

/// One page with its tap attached.
pub struct PageSession {
    page: Page,
    buffer: NetworkBuffer,
    tap_tasks: Vec<JoinHandle<()>>,
}

impl PageSession {
    /// Open a blank page, apply stealth measures and attach the network tap.
    pub async fn open(browser: &Browser) -> Result<Self> {
        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;
        apply_stealth_measures(&page).await?;

        let buffer = NetworkBuffer::new();
        let tap_tasks = network_tap::attach(&page, buffer.clone())
            .await
            .context("failed to attach network tap")?;

        Ok(Self {
            page,
            buffer,
            tap_tasks,
        })
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub fn buffer(&self) -> &NetworkBuffer {
        &self.buffer
    }

    /// Evaluate JS in page scope and deserialize the result.
    pub async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("page evaluation failed")?;
        let value = result
            .into_value::<serde_json::Value>()
            .map_err(|e| anyhow::anyhow!("failed to read evaluation result: {e}"))?;
        serde_json::from_value(value).context("failed to deserialize evaluation result")
    }

    /// Current page URL as the browser reports it.
    pub async fn current_url(&self) -> Result<String> {
        self.eval::<String>("window.location.href").await
    }

    /// Close the page and stop the tap. Errors are logged, not raised — this
    /// runs in teardown.
    pub async fn close(self) {
        for task in &self.tap_tasks {
            task.abort();
        }
        if let Err(e) = self.page.close().await {
            warn!("failed to close page: {e}");
        } else {
            debug!("page session closed");
        }
    }
}
