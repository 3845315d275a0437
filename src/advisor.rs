//! Optional vision-review collaborator.
//!
//! When every strategy comes up short (< 2 fused entries) and the site
//! profile still has review budget, the orchestrator hands the captured page
//! to an external evaluator that may return a corrected entry list. The
//! default implementation declines every review.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::collector::PageCapture;
use crate::model::RawEntry;
use crate::profiles::SiteProfile;

/// Evaluator verdict over one failed extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorVerdict {
    pub improved: bool,
    /// Corrected entries when the evaluator could read the page.
    #[serde(rename = "correctedResult")]
    pub corrected: Option<Vec<RawEntry>>,
    pub confidence: f64,
    pub phase: String,
    pub reason: String,
}

/// External page evaluator.
pub trait ResultAdvisor: Send + Sync {
    fn review<'a>(
        &'a self,
        capture: &'a PageCapture,
        profile: Option<&'a SiteProfile>,
    ) -> Pin<Box<dyn Future<Output = Result<AdvisorVerdict>> + Send + 'a>>;
}

/// Default advisor: never improves anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAdvisor;

impl ResultAdvisor for NoopAdvisor {
    fn review<'a>(
        &'a self,
        _capture: &'a PageCapture,
        _profile: Option<&'a SiteProfile>,
    ) -> Pin<Box<dyn Future<Output = Result<AdvisorVerdict>> + Send + 'a>> {
        Box::pin(async {
            Ok(AdvisorVerdict {
                improved: false,
                corrected: None,
                confidence: 0.0,
                phase: "disabled".into(),
                reason: "no advisor configured".into(),
            })
        })
    }
}
