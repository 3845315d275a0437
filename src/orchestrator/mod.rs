//! Per-site orchestration: the extraction state machine.
//!
//! One pass per domain: circuit-breaker gate → position → discover → for
//! each leaderboard (reach → maximize rows → collect → extract → fuse →
//! sanitize → normalize → validate) → emit a [`SiteRun`]. Per-leaderboard
//! failures are isolated; only a timeout or an open circuit aborts the site.

pub mod circuit_breaker;
pub mod pool;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitState, DomainHealth};
pub use retry::{with_retry, RetryPolicy};

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::advisor::{NoopAdvisor, ResultAdvisor};
use crate::bypass::{ChallengeBypass, NoopBypass};
use crate::collector::{self, CollectorConfig, PageCapture};
use crate::config::ScrapeConfig;
use crate::discovery::{self, DiscoveryOutcome};
use crate::error::ScrapeError;
use crate::fusion::{self, FusionOutcome};
use crate::keywords;
use crate::model::{
    DiscoveredLeaderboard, LeaderboardResult, RawEntry, ReachMethod, SiteRun,
};
use crate::navigator;
use crate::normalize::normalize;
use crate::page_session::PageSession;
use crate::profiles::{ProfileStore, SiteProfile};
use crate::sanitize::sanitize;
use crate::strategies::{self, api::detect_paginated, StrategyInputs};
use crate::ui;
use crate::utils::constants::MAX_SHOW_MORE_CLICKS;
use crate::utils::url_utils::domain_of;
use crate::validator::{self, ValidatorConfig};

/// Drives the per-site extraction workflow.
pub struct Orchestrator {
    config: ScrapeConfig,
    circuit_breaker: Arc<CircuitBreaker>,
    profiles: ProfileStore,
    bypass: Arc<dyn ChallengeBypass>,
    advisor: Arc<dyn ResultAdvisor>,
    /// Advisor invocations spent per domain this run.
    advisor_spent: dashmap::DashMap<String, u32>,
}

impl Orchestrator {
    /// Build an orchestrator with the default (no-op) collaborators.
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        Self::with_collaborators(config, Arc::new(NoopBypass), Arc::new(NoopAdvisor))
    }

    /// Build with explicit bypass/advisor collaborators. Loads the keyword
    /// cache and site profiles as a side effect.
    pub fn with_collaborators(
        config: ScrapeConfig,
        bypass: Arc<dyn ChallengeBypass>,
        advisor: Arc<dyn ResultAdvisor>,
    ) -> Result<Self> {
        keywords::load(config.keywords_path())?;
        let profiles = ProfileStore::load(config.profiles_path())?;
        Ok(Self {
            config,
            circuit_breaker: Arc::new(CircuitBreaker::default()),
            profiles,
            bypass,
            advisor,
            advisor_spent: dashmap::DashMap::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    #[must_use]
    pub fn circuit_breaker(&self) -> Arc<CircuitBreaker> {
        Arc::clone(&self.circuit_breaker)
    }

    /// Run the whole per-site workflow and return its [`SiteRun`].
    ///
    /// Never panics or errors out: every failure lands in `run.errors`. No
    /// browser work happens when the circuit is open.
    pub async fn scrape_site(&self, browser: &Browser, site_url: &str) -> SiteRun {
        let domain = match domain_of(site_url) {
            Ok(domain) => domain,
            Err(e) => {
                let mut run = SiteRun::begin(site_url);
                run.record_error(format!("invalid site URL: {e:#}"));
                run.completed_at = Some(Utc::now());
                return run;
            }
        };

        let mut run = SiteRun::begin(&domain);
        if !self.circuit_breaker.should_attempt(&domain) {
            run.record_error(ScrapeError::CircuitOpen(domain.clone()).to_string());
            run.completed_at = Some(Utc::now());
            return run;
        }

        let session = match PageSession::open(browser).await {
            Ok(session) => session,
            Err(e) => {
                run.record_error(ScrapeError::Browser(format!("{e:#}")).to_string());
                self.circuit_breaker.record_failure(&domain, &format!("{e:#}"));
                run.completed_at = Some(Utc::now());
                return run;
            }
        };

        let outcome = tokio::time::timeout(
            self.config.site_timeout(),
            self.run_site(&session, &mut run, site_url, &domain),
        )
        .await;

        match outcome {
            Err(_) => {
                run.timed_out = true;
                run.record_error(ScrapeError::Timeout(domain.clone()).to_string());
                self.circuit_breaker
                    .record_failure(&domain, "site workflow timed out");
            }
            Ok(Err(e)) => {
                run.record_error(format!("{e:#}"));
                self.circuit_breaker.record_failure(&domain, &format!("{e:#}"));
            }
            Ok(Ok(())) => {
                if run.succeeded() {
                    self.circuit_breaker.record_success(&domain);
                } else {
                    self.circuit_breaker
                        .record_failure(&domain, "no leaderboard extracted any data");
                }
            }
        }

        // Scoped teardown runs on every path, including timeout
        session.close().await;

        let warnings: Vec<String> = run
            .results
            .iter()
            .flat_map(|result| validator::collect_warnings(result))
            .collect();
        run.warnings.extend(warnings);
        run.completed_at = Some(Utc::now());
        info!(
            %domain,
            results = run.results.len(),
            errors = run.errors.len(),
            "site run finished"
        );
        run
    }

    async fn run_site(
        &self,
        session: &PageSession,
        run: &mut SiteRun,
        site_url: &str,
        domain: &str,
    ) -> Result<()> {
        let profile = self.profiles.get(domain);

        navigator::position(
            session,
            site_url,
            profile.and_then(|p| p.leaderboard_path.as_deref()),
            &*self.bypass,
        )
        .await
        .map_err(|e| anyhow::anyhow!(ScrapeError::Navigation(e.to_string()).to_string()))?;

        let kw = keywords::all();
        let discovery = with_retry(RetryPolicy::default(), "discovery", || {
            discovery::enumerate(session, site_url, &kw, profile, &*self.bypass)
        })
        .await?;

        run.metadata.leaderboards_discovered = discovery.leaderboards.len();
        if discovery.leaderboards.is_empty() {
            run.record_error(ScrapeError::DiscoveryEmpty(domain.to_string()).to_string());
            return Ok(());
        }

        let prior_url = session.current_url().await.unwrap_or_else(|_| site_url.to_string());

        for (index, leaderboard) in discovery.leaderboards.iter().enumerate() {
            match self
                .extract_leaderboard(session, run, index, leaderboard, &discovery, profile, domain, &prior_url)
                .await
            {
                Ok(Some(result)) => {
                    run.metadata.leaderboards_scraped += 1;
                    run.metadata.record_strategy(&result.source);
                    run.results.push(result);
                }
                Ok(None) => {} // reason already recorded
                Err(e) => {
                    run.record_error(format!("{}: {e:#}", leaderboard.name));
                }
            }
        }
        Ok(())
    }

    /// One leaderboard: reach it, materialize it, extract it.
    #[allow(clippy::too_many_arguments)]
    async fn extract_leaderboard(
        &self,
        session: &PageSession,
        run: &mut SiteRun,
        index: usize,
        leaderboard: &DiscoveredLeaderboard,
        discovery: &DiscoveryOutcome,
        profile: Option<&SiteProfile>,
        domain: &str,
        prior_url: &str,
    ) -> Result<Option<LeaderboardResult>> {
        // TO_L: the default view's network buffer may already carry the API
        // payload for the first switcher-clicked leaderboard
        let default_view = index == 0 && leaderboard.method == ReachMethod::SwitcherClick;
        if !default_view {
            session.buffer().clear();
        }
        self.reach(session, leaderboard, discovery, default_view, prior_url)
            .await?;

        // READY: maximize rows, settle, then drain Show-More
        if let Err(e) = ui::select_maximum_entries(session).await {
            debug!("rows-per-page maximization failed: {e:#}");
        }
        ui::wait_for_leaderboard_ready(session).await.ok();
        for _ in 0..MAX_SHOW_MORE_CLICKS {
            match ui::click_show_more(session).await {
                Ok(true) => {
                    ui::wait_for_leaderboard_ready(session).await.ok();
                }
                _ => break,
            }
        }

        // COLL: paginated follow-ups first so the capture sees every page
        if let Some(api) = detect_paginated(&session.buffer().snapshot()) {
            let fetched = collector::fetch_extra_pages(session, &api).await;
            debug!(fetched, url = %api.url, "paginated API follow-up");
        }
        let capture = collector::collect(
            session,
            CollectorConfig {
                take_screenshot: self.config.screenshots(),
                ..CollectorConfig::default()
            },
        )
        .await
        .context("page collection failed")?;

        if let Some(debug_dir) = self.config.debug_dir()
            && let Err(e) =
                crate::persist::write_debug_artifacts(debug_dir, domain, &leaderboard.name, &capture)
        {
            debug!("debug artifact write failed: {e:#}");
        }

        // EXTR: strategies are pure over the capture
        let inputs = StrategyInputs {
            html: &capture.html,
            markdown: &capture.markdown,
            layout: &capture.layout,
            viewport_width: capture.viewport_width,
            network: &capture.network,
        };
        let outputs = strategies::run_all(&inputs);
        let fused = fusion::fuse(&outputs);

        match fused {
            Some(outcome) if outcome.entries.len() >= self.config.min_entries() => {
                Ok(self.build_result(run, leaderboard, &capture, outcome, domain))
            }
            _ => {
                self.consult_advisor(session, run, leaderboard, &capture, profile, domain)
                    .await
            }
        }
    }

    /// TO_L dispatch by reach method.
    async fn reach(
        &self,
        session: &PageSession,
        leaderboard: &DiscoveredLeaderboard,
        discovery: &DiscoveryOutcome,
        default_view: bool,
        prior_url: &str,
    ) -> Result<()> {
        match leaderboard.method {
            ReachMethod::SwitcherClick => {
                if default_view {
                    return Ok(()); // already displayed
                }
                let clicked = match leaderboard.switcher.as_ref().and_then(|s| s.coordinates) {
                    Some((x, y)) => ui::click_at(session, x, y).await.unwrap_or(false),
                    None => false,
                };
                if !clicked
                    && !ui::click_by_text(session, &leaderboard.name)
                        .await
                        .unwrap_or(false)
                {
                    return Err(anyhow::anyhow!(ScrapeError::Interaction(format!(
                        "switcher click failed for {:?}",
                        leaderboard.name
                    ))
                    .to_string()));
                }
                Ok(())
            }
            ReachMethod::DetectedName | ReachMethod::ProfileKnown => {
                if ui::click_by_text(session, &leaderboard.name)
                    .await
                    .unwrap_or(false)
                {
                    return Ok(());
                }
                // URL-pattern fallback, restoring the prior page on a 404
                let fallback = leaderboard.url.clone().or_else(|| {
                    discovery
                        .url_pattern
                        .as_ref()
                        .map(|p| p.replace("{}", &leaderboard.name.to_lowercase()))
                });
                let Some(url) = fallback else {
                    return Err(anyhow::anyhow!(ScrapeError::Interaction(format!(
                        "no way to reach {:?}",
                        leaderboard.name
                    ))
                    .to_string()));
                };
                navigator::navigate_with_bypass(session, &url, &*self.bypass).await?;
                if self.looks_like_404(session).await {
                    warn!(%url, "pattern navigation hit a 404, restoring prior page");
                    navigator::navigate_with_bypass(session, prior_url, &*self.bypass).await?;
                    return Err(anyhow::anyhow!(ScrapeError::Interaction(format!(
                        "pattern URL 404 for {:?}",
                        leaderboard.name
                    ))
                    .to_string()));
                }
                Ok(())
            }
            ReachMethod::UrlNavigation => {
                let Some(url) = &leaderboard.url else {
                    return Ok(());
                };
                let current = session.current_url().await.unwrap_or_default();
                if current.trim_end_matches('/') != url.trim_end_matches('/') {
                    navigator::navigate_with_bypass(session, url, &*self.bypass).await?;
                }
                Ok(())
            }
        }
    }

    async fn looks_like_404(&self, session: &PageSession) -> bool {
        let script = r#"
            (() => {
                const title = (document.title || '').toLowerCase();
                const body = (document.body ? document.body.innerText : '').slice(0, 400).toLowerCase();
                return /404|not found|page doesn.t exist/.test(title) || /404\b|page not found/.test(body);
            })()
        "#;
        session.eval(script).await.unwrap_or(false)
    }

    /// SANIT → NORM → VALIDATE → result assembly.
    fn build_result(
        &self,
        run: &mut SiteRun,
        leaderboard: &DiscoveredLeaderboard,
        capture: &PageCapture,
        outcome: FusionOutcome,
        domain: &str,
    ) -> Option<LeaderboardResult> {
        let mut site_names = vec![domain.to_string()];
        site_names.extend(self.config.website_names().iter().cloned());
        if let Some(stripped) = domain.strip_prefix("www.") {
            site_names.push(stripped.to_string());
        }

        let report = sanitize(outcome.entries.clone(), &site_names);
        for flag in &report.flags {
            run.record_warning(format!("{}: {flag}", leaderboard.name));
        }
        for (entry, reason) in &report.rejected {
            debug!(username = %entry.username, reason = %reason, "entry sanitized away");
        }

        let entries = normalize(report.entries, leaderboard.kind, Utc::now());
        if entries.len() < self.config.min_entries() {
            run.record_error(
                ScrapeError::ExtractionEmpty(format!(
                    "{} (post-sanitization rows: {})",
                    leaderboard.name,
                    entries.len()
                ))
                .to_string(),
            );
            return None;
        }

        let agreement = (!outcome.single_source)
            .then_some(outcome.cross_validation.overall_agreement);
        let validation = validator::validate(&entries, agreement, ValidatorConfig::default());
        let confidence = (outcome.source_confidence + outcome.confidence_adjustment
            - validation.confidence_penalty)
            .clamp(0.0, 100.0);

        let mut result = LeaderboardResult {
            id: Uuid::new_v4(),
            extraction_id: run.extraction_id,
            name: leaderboard.name.clone(),
            url: capture.url.clone(),
            kind: leaderboard.kind,
            source: outcome.recommended.label().to_string(),
            entries,
            prizes: Vec::new(),
            total_prize_pool: 0.0,
            total_wagered: 0.0,
            confidence,
            scraped_at: capture.collected_at,
            validation,
        };
        result.recompute_totals();
        Some(result)
    }

    /// Last resort: hand the capture to the advisor when core extraction
    /// produced too little and the profile budget allows.
    async fn consult_advisor(
        &self,
        _session: &PageSession,
        run: &mut SiteRun,
        leaderboard: &DiscoveredLeaderboard,
        capture: &PageCapture,
        profile: Option<&SiteProfile>,
        domain: &str,
    ) -> Result<Option<LeaderboardResult>> {
        let budget = profile.map_or(0, |p| p.advisor_budget);
        let spent = self.advisor_spent.get(domain).map_or(0, |v| *v);
        if !self.config.advisor_enabled() || spent >= budget {
            run.record_error(
                ScrapeError::ExtractionEmpty(leaderboard.name.clone()).to_string(),
            );
            return Ok(None);
        }
        *self.advisor_spent.entry(domain.to_string()).or_insert(0) += 1;

        let verdict = self.advisor.review(capture, profile).await?;
        if !verdict.improved {
            run.record_error(
                ScrapeError::ExtractionEmpty(format!(
                    "{} (advisor: {})",
                    leaderboard.name, verdict.reason
                ))
                .to_string(),
            );
            return Ok(None);
        }
        let corrected: Vec<RawEntry> = verdict.corrected.unwrap_or_default();
        if corrected.len() < self.config.min_entries() {
            run.record_error(
                ScrapeError::ExtractionEmpty(leaderboard.name.clone()).to_string(),
            );
            return Ok(None);
        }

        let outcome = FusionOutcome {
            recommended: crate::model::StrategyKind::Dom,
            entries: corrected,
            source_confidence: verdict.confidence.clamp(0.0, 100.0),
            confidence_adjustment: -5.0,
            single_source: true,
            cross_validation: fusion::CrossValidation {
                overall_agreement: 1.0,
                field_agreement: fusion::FieldAgreement::default(),
                discrepancies: Vec::new(),
                entry_agreement: Default::default(),
                total_pair_comparisons: 0,
            },
        };
        let mut built = self.build_result(run, leaderboard, capture, outcome, domain);
        if let Some(result) = built.as_mut() {
            result.source = "advisor".to_string();
        }
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn open_circuit_error_matches_the_skip_contract() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(300), Duration::from_secs(300));
        for _ in 0..3 {
            cb.record_failure("x.example", "navigation threw");
        }
        assert!(!cb.should_attempt("x.example"), "fourth run must be blocked");
        assert_eq!(
            ScrapeError::CircuitOpen("x.example".into()).to_string(),
            "Circuit breaker open for x.example"
        );
    }

    #[test]
    fn run_without_results_counts_as_failed() {
        let run = SiteRun::begin("x.example");
        assert!(!run.succeeded());
    }
}
