use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Upper bound applied to `max_delay_ms`, whatever the configuration says.
pub const DELAY_CEILING_MS: u64 = 24 * 60 * 60 * 1_000;

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleOptions {
    pub base_delay_ms: u64,
    /// Clamped to [`DELAY_CEILING_MS`].
    pub max_delay_ms: u64,
    /// Consecutive failures after which a domain is never probed again.
    pub block_threshold: u32,
}

impl Default for ThrottleOptions {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            block_threshold: 5,
        }
    }
}

impl ThrottleOptions {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms.min(DELAY_CEILING_MS))
    }
}

/// Per-domain bookkeeping, created on first use and kept for the process
/// lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainProbeState {
    /// Start of the most recent (or reserved) attempt.
    pub last_attempt_at: Option<Instant>,
    pub consecutive_failures: u32,
    pub blocked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Circuit open: no network activity allowed for this domain.
    Blocked,
    Proceed { waited: Duration },
}

impl ThrottleDecision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked)
    }
}
