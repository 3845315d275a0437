//! Extraction strategies.
//!
//! Four independent extractors compete over one collected page: API (network
//! payloads), Markdown (projected text), DOM (captured HTML) and Geometric
//! (layout boxes). All of them are pure over captured data — nothing here
//! suspends or talks to the browser.

pub mod api;
pub mod dom;
pub mod geometric;
pub mod markdown;
pub mod textline;

use crate::model::{LayoutBox, StrategyOutput};
use crate::network_tap::NetworkSnapshot;

/// Inputs every strategy pass shares.
pub struct StrategyInputs<'a> {
    pub html: &'a str,
    pub markdown: &'a str,
    pub layout: &'a [LayoutBox],
    pub viewport_width: f64,
    pub network: &'a NetworkSnapshot,
}

/// Run every strategy and keep the ones that produced entries.
#[must_use]
pub fn run_all(inputs: &StrategyInputs<'_>) -> Vec<StrategyOutput> {
    let outputs = [
        api::run(inputs.network),
        markdown::run(inputs.markdown),
        dom::run(inputs.html, inputs.layout),
        geometric::run(inputs.layout, inputs.viewport_width),
    ];
    outputs.into_iter().filter(|o| !o.is_empty()).collect()
}
