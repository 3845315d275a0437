//! Challenge-bypass collaborator contract.
//!
//! Interstitial challenges (Cloudflare, hCaptcha, ...) are solved by an
//! external service. The engine only needs detection plus a handle call; the
//! default implementation does nothing, which is correct for sites without
//! challenges and for test runs.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::page_session::PageSession;

/// Kinds of interstitial challenge the detector distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    None,
    CloudflareTurnstile,
    CloudflareIuam,
    HCaptcha,
    RecaptchaV2,
    RecaptchaV3,
    Vercel,
    DataDome,
    Unknown,
}

/// Outcome of a detection pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeDetection {
    #[serde(rename = "type")]
    pub kind: ChallengeKind,
    pub sitekey: Option<String>,
    #[serde(rename = "pageUrl")]
    pub page_url: String,
}

/// Outcome of a handle attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BypassOutcome {
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: ChallengeKind,
    pub method: String,
    pub error: Option<String>,
}

/// External challenge solver.
pub trait ChallengeBypass: Send + Sync {
    /// Inspect the page for an interstitial challenge.
    fn detect<'a>(
        &'a self,
        session: &'a PageSession,
    ) -> Pin<Box<dyn Future<Output = Result<ChallengeDetection>> + Send + 'a>>;

    /// Attempt to clear a detected challenge.
    fn handle<'a>(
        &'a self,
        session: &'a PageSession,
    ) -> Pin<Box<dyn Future<Output = Result<BypassOutcome>> + Send + 'a>>;
}

/// Default no-op bypass: reports no challenge, handles nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBypass;

impl ChallengeBypass for NoopBypass {
    fn detect<'a>(
        &'a self,
        session: &'a PageSession,
    ) -> Pin<Box<dyn Future<Output = Result<ChallengeDetection>> + Send + 'a>> {
        Box::pin(async move {
            Ok(ChallengeDetection {
                kind: ChallengeKind::None,
                sitekey: None,
                page_url: session.current_url().await.unwrap_or_default(),
            })
        })
    }

    fn handle<'a>(
        &'a self,
        _session: &'a PageSession,
    ) -> Pin<Box<dyn Future<Output = Result<BypassOutcome>> + Send + 'a>> {
        Box::pin(async move {
            Ok(BypassOutcome {
                success: true,
                kind: ChallengeKind::None,
                method: "none".into(),
                error: None,
            })
        })
    }
}
