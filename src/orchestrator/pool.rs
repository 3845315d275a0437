//! Inter-site worker pool.
//!
//! A bounded number of workers process the site queue; each site owns its
//! own browser, page and network buffer. On a shutdown signal no new sites
//! start, in-flight sites get a grace period, then the pool aborts them.

use anyhow::{Context, Result};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::Orchestrator;
use crate::browser_setup::launch_browser;
use crate::model::SiteRun;
use crate::persist;
use crate::utils::constants::SHUTDOWN_GRACE;

/// Process a batch of site URLs through the pool. Returns the completed
/// runs in completion order.
pub async fn run_batch(orchestrator: Arc<Orchestrator>, site_urls: Vec<String>) -> Vec<SiteRun> {
    let config = orchestrator.config().clone();
    if let Some(debug_dir) = config.debug_dir() {
        let removed = persist::cleanup_expired(debug_dir, crate::utils::constants::DEBUG_LOG_TTL);
        if removed > 0 {
            info!(removed, "expired debug artifacts cleaned up");
        }
    }
    let workers = config.workers();
    let semaphore = Arc::new(Semaphore::new(workers));
    let shutdown = Arc::new(AtomicBool::new(false));

    // Signal watcher: flips the flag, lets in-flight sites drain
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("shutdown signal received, finishing in-flight sites");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    let limit = config.limit().unwrap_or(usize::MAX);
    let mut tasks = FuturesUnordered::new();
    let mut started = 0usize;

    for site_url in site_urls.into_iter().take(limit) {
        if shutdown.load(Ordering::SeqCst) {
            info!("skipping remaining sites after shutdown signal");
            break;
        }
        if started > 0 {
            tokio::time::sleep(config.start_delay()).await;
        }
        started += 1;

        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break, // semaphore closed: shutting down
        };
        let orchestrator = Arc::clone(&orchestrator);
        let shutdown = Arc::clone(&shutdown);

        tasks.push(tokio::spawn(async move {
            let _permit = permit;
            if shutdown.load(Ordering::SeqCst) {
                return None;
            }
            Some(process_site(&orchestrator, &site_url).await)
        }));
    }

    let mut runs = Vec::new();
    loop {
        let next = if shutdown.load(Ordering::SeqCst) {
            // Grace-bounded drain after a shutdown signal
            match tokio::time::timeout(SHUTDOWN_GRACE, tasks.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!("shutdown grace expired, aborting {} in-flight sites", tasks.len());
                    for task in tasks.iter() {
                        task.abort();
                    }
                    break;
                }
            }
        } else {
            tasks.next().await
        };

        match next {
            Some(Ok(Some(run))) => runs.push(run),
            Some(Ok(None)) => {}
            Some(Err(e)) => warn!("site task panicked: {e}"),
            None => break,
        }
    }
    runs
}

/// One site end-to-end: browser launch, scrape, snapshot write, teardown.
pub async fn process_site(orchestrator: &Orchestrator, site_url: &str) -> SiteRun {
    let config = orchestrator.config();

    match launch_browser(config.headless(), None).await {
        Ok((browser, handler_task, profile_dir)) => {
            let mut run = orchestrator.scrape_site(&browser, site_url).await;

            // Cleanup order matters: close the browser before aborting the
            // CDP handler, then drop the profile directory
            let mut browser = browser;
            if let Err(e) = browser.close().await {
                warn!("browser close failed: {e}");
            }
            let _ = browser.wait().await;
            handler_task.abort();
            if profile_dir.starts_with(std::env::temp_dir())
                && let Err(e) = std::fs::remove_dir_all(&profile_dir)
            {
                warn!("profile dir cleanup failed: {e}");
            }

            if let Err(e) = persist::write_snapshot(config.current_results_dir().as_path(), &run) {
                run.record_error(format!("{e:#}"));
            }
            run
        }
        Err(e) => {
            let mut run = SiteRun::begin(site_url);
            run.record_error(format!("browser launch failed: {e:#}"));
            run.completed_at = Some(chrono::Utc::now());
            run
        }
    }
}

/// Whether a site is fresh enough to skip, judged from its last snapshot.
pub fn recently_scraped(orchestrator: &Orchestrator, site_url: &str) -> Result<bool> {
    let config = orchestrator.config();
    let domain = crate::utils::url_utils::domain_of(site_url)
        .context("cannot judge freshness of an invalid URL")?;
    Ok(persist::snapshot_age(config.current_results_dir().as_path(), &domain)
        .is_some_and(|age| age < config.refresh_interval()))
}
