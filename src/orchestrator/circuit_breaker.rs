//! Circuit breaker for domain-level failure detection.
//!
//! Tracks domain health across three states:
//! - Closed: normal operation, sites proceed
//! - Open: too many recent failures, sites are skipped with no browser work
//! - `HalfOpen`: cooldown expired, one probe allowed

use dashmap::DashMap;
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    HalfOpen,
    Open,
}

/// Health tracking for a single domain.
#[derive(Debug, Clone)]
pub struct DomainHealth {
    /// Failures inside the rolling window.
    pub failure_count: u32,
    pub last_failure_at: Option<Instant>,
    /// When the circuit opened (for cooldown calculation).
    pub last_opened: Option<Instant>,
    pub state: CircuitState,
}

impl DomainHealth {
    fn new() -> Self {
        Self {
            failure_count: 0,
            last_failure_at: None,
            last_opened: None,
            state: CircuitState::Closed,
        }
    }
}

/// Process-wide circuit breaker keyed by domain.
///
/// Opens when `failure_threshold` failures land within `window`; half-open
/// after `cooldown`; any success resets the domain to Closed.
pub struct CircuitBreaker {
    domains: DashMap<String, DomainHealth>,
    failure_threshold: u32,
    window: Duration,
    cooldown: Duration,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(300), Duration::from_secs(300))
    }
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(failure_threshold: u32, window: Duration, cooldown: Duration) -> Self {
        Self {
            domains: DashMap::new(),
            failure_threshold,
            window,
            cooldown,
        }
    }

    /// Whether a site run for this domain should proceed.
    ///
    /// Also performs the Open→HalfOpen transition once the cooldown expires.
    pub fn should_attempt(&self, domain: &str) -> bool {
        let mut health = self
            .domains
            .entry(domain.to_string())
            .or_insert_with(DomainHealth::new);

        match health.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                if let Some(opened) = health.last_opened
                    && opened.elapsed() >= self.cooldown
                {
                    health.state = CircuitState::HalfOpen;
                    info!(
                        "circuit breaker HALF-OPEN for {domain} (after {:?} cooldown)",
                        opened.elapsed()
                    );
                    return true;
                }
                false
            }
        }
    }

    /// Record a successful run: the domain resets to Closed.
    pub fn record_success(&self, domain: &str) {
        if let Some(mut health) = self.domains.get_mut(domain) {
            if health.state != CircuitState::Closed {
                info!("circuit breaker CLOSED for {domain}");
            }
            health.failure_count = 0;
            health.last_failure_at = None;
            health.last_opened = None;
            health.state = CircuitState::Closed;
        }
    }

    /// Record a failed run. Failures older than the window do not count
    /// toward the threshold.
    pub fn record_failure(&self, domain: &str, error: &str) {
        let mut health = self
            .domains
            .entry(domain.to_string())
            .or_insert_with(DomainHealth::new);

        let now = Instant::now();
        let stale = health
            .last_failure_at
            .is_some_and(|at| now.duration_since(at) > self.window);
        if stale {
            health.failure_count = 0;
        }
        health.failure_count += 1;
        health.last_failure_at = Some(now);

        // A failed half-open probe reopens immediately
        if health.state == CircuitState::HalfOpen
            || (health.failure_count >= self.failure_threshold
                && health.state != CircuitState::Open)
        {
            health.state = CircuitState::Open;
            health.last_opened = Some(now);
            warn!(
                "circuit breaker OPEN for {domain} after {} failures: {error}",
                health.failure_count
            );
        } else if health.state != CircuitState::Open {
            debug!(
                "circuit breaker failure for {domain} ({}/{}): {error}",
                health.failure_count, self.failure_threshold
            );
        }
    }

    /// Health snapshot for a domain, if seen.
    #[must_use]
    pub fn get_health(&self, domain: &str) -> Option<DomainHealth> {
        self.domains.get(domain).map(|r| r.value().clone())
    }

    /// Domains currently in Open state.
    #[must_use]
    pub fn open_domains(&self) -> Vec<String> {
        self.domains
            .iter()
            .filter(|entry| entry.value().state == CircuitState::Open)
            .map(|entry| entry.key().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_three_failures() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(300), Duration::from_secs(300));

        assert!(cb.should_attempt("x.example"));
        cb.record_failure("x.example", "nav error");
        cb.record_failure("x.example", "nav error");
        assert!(cb.should_attempt("x.example"));
        cb.record_failure("x.example", "nav error");

        let health = cb.get_health("x.example").expect("domain tracked");
        assert_eq!(health.state, CircuitState::Open);
        assert!(!cb.should_attempt("x.example"), "open circuit blocks runs");
    }

    #[test]
    fn success_resets() {
        let cb = CircuitBreaker::default();
        cb.record_failure("x.example", "err");
        cb.record_failure("x.example", "err");
        cb.record_success("x.example");

        let health = cb.get_health("x.example").expect("domain tracked");
        assert_eq!(health.failure_count, 0);
        assert_eq!(health.state, CircuitState::Closed);
    }

    #[test]
    fn half_open_after_cooldown_then_reopens_on_failure() {
        let cb = CircuitBreaker::new(2, Duration::from_secs(300), Duration::from_millis(50));
        cb.record_failure("x.example", "err");
        cb.record_failure("x.example", "err");
        assert!(!cb.should_attempt("x.example"));

        std::thread::sleep(Duration::from_millis(80));
        assert!(cb.should_attempt("x.example"), "cooldown expired");
        assert_eq!(
            cb.get_health("x.example").expect("tracked").state,
            CircuitState::HalfOpen
        );

        cb.record_failure("x.example", "probe failed");
        assert!(!cb.should_attempt("x.example"), "failed probe reopens");
    }

    #[test]
    fn stale_failures_fall_out_of_the_window() {
        let cb = CircuitBreaker::new(3, Duration::from_millis(40), Duration::from_secs(300));
        cb.record_failure("x.example", "err");
        cb.record_failure("x.example", "err");
        std::thread::sleep(Duration::from_millis(60));
        cb.record_failure("x.example", "err");

        let health = cb.get_health("x.example").expect("tracked");
        assert_eq!(health.failure_count, 1, "old failures expired");
        assert_eq!(health.state, CircuitState::Closed);
    }
}
