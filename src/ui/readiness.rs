//! Readiness detection after state-changing interactions.

use anyhow::Result;
use tokio::time::sleep;
use tracing::debug;

use crate::page_session::PageSession;
use crate::utils::constants::{NETWORK_IDLE_BOUND, ROW_POLL_COUNT, ROW_POLL_INTERVAL};

/// Wait until the leaderboard settles: network activity quiets (bounded),
/// then the broad-selector row count holds steady for two consecutive
/// polls out of up to three.
pub async fn wait_for_leaderboard_ready(session: &PageSession) -> Result<()> {
    wait_for_network_idle(session).await;

    let mut previous = super::row_count(session).await.unwrap_or(0);
    let mut stable = 0usize;
    for _ in 0..ROW_POLL_COUNT {
        sleep(ROW_POLL_INTERVAL).await;
        let current = super::row_count(session).await.unwrap_or(0);
        if current == previous {
            stable += 1;
            if stable >= 2 {
                break;
            }
        } else {
            stable = 0;
        }
        previous = current;
    }
    debug!(rows = previous, "leaderboard ready");
    Ok(())
}

/// Bounded network-idle wait: the captured-URL count must hold for two
/// consecutive short polls, give up after [`NETWORK_IDLE_BOUND`].
async fn wait_for_network_idle(session: &PageSession) {
    let step = std::time::Duration::from_millis(250);
    let deadline = tokio::time::Instant::now() + NETWORK_IDLE_BOUND;
    let mut previous = session.buffer().snapshot().captured_urls.len();
    let mut quiet = 0usize;
    while tokio::time::Instant::now() < deadline {
        sleep(step).await;
        let current = session.buffer().snapshot().captured_urls.len();
        if current == previous {
            quiet += 1;
            if quiet >= 2 {
                return;
            }
        } else {
            quiet = 0;
        }
        previous = current;
    }
}
