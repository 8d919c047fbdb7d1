//! Per-domain exponential backoff with a terminal circuit breaker.
//!
//! Every SMTP attempt against a domain goes through [`DomainThrottle::acquire`],
//! which spaces attempts by `min(max_delay, base_delay * 2^failures)` and
//! refuses outright once the domain has failed `block_threshold` times in a
//! row.

mod types;

pub use types::{DELAY_CEILING_MS, DomainProbeState, ThrottleDecision, ThrottleOptions};

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct DomainThrottle {
    options: ThrottleOptions,
    domains: DashMap<String, DomainProbeState>,
}

fn key(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

impl DomainThrottle {
    pub fn new(options: ThrottleOptions) -> Self {
        Self {
            options,
            domains: DashMap::new(),
        }
    }

    pub fn options(&self) -> &ThrottleOptions {
        &self.options
    }

    pub fn is_blocked(&self, domain: &str) -> bool {
        self.domains
            .get(&key(domain))
            .is_some_and(|state| state.blocked)
    }

    /// Minimum spacing between two attempts after `failures` consecutive
    /// failures.
    pub fn min_delay(&self, failures: u32) -> Duration {
        let factor = 1u64.checked_shl(failures).unwrap_or(u64::MAX);
        let delay = Duration::from_millis(self.options.base_delay_ms.saturating_mul(factor));
        delay.min(self.options.max_delay())
    }

    /// Waits until the domain may be probed again.
    ///
    /// The slot is reserved before sleeping, so concurrent callers for the
    /// same domain are spaced one after the other.
    pub async fn acquire(&self, domain: &str) -> ThrottleDecision {
        let domain = key(domain);
        let wait = {
            let mut state = self.domains.entry(domain.clone()).or_default();
            if state.blocked {
                debug!(%domain, "domain blocked, skipping probe");
                return ThrottleDecision::Blocked;
            }
            let now = Instant::now();
            let start = match state.last_attempt_at {
                Some(last) => {
                    let delay = self.min_delay(state.consecutive_failures);
                    last.checked_add(delay).map_or(now, |earliest| now.max(earliest))
                }
                None => now,
            };
            state.last_attempt_at = Some(start);
            start.duration_since(now)
        };

        if !wait.is_zero() {
            debug!(%domain, wait_ms = wait.as_millis() as u64, "throttling probe");
            sleep(wait).await;
        }
        ThrottleDecision::Proceed { waited: wait }
    }

    pub fn record_success(&self, domain: &str) {
        let mut state = self.domains.entry(key(domain)).or_default();
        state.consecutive_failures = 0;
    }

    /// Returns `true` when this failure opened the circuit.
    pub fn record_failure(&self, domain: &str) -> bool {
        let domain = key(domain);
        let mut state = self.domains.entry(domain.clone()).or_default();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        if !state.blocked && state.consecutive_failures >= self.options.block_threshold {
            state.blocked = true;
            warn!(
                %domain,
                failures = state.consecutive_failures,
                "domain blocked after repeated failures"
            );
            return true;
        }
        debug!(%domain, failures = state.consecutive_failures, "probe failure recorded");
        false
    }

    pub fn snapshot(&self, domain: &str) -> Option<DomainProbeState> {
        self.domains.get(&key(domain)).map(|state| state.clone())
    }
}
