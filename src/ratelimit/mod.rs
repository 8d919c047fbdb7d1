//! Fixed-window request quota per client identifier.

use std::time::Duration;

use dashmap::DashMap;
#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitOptions {
    /// Requests admitted per window and client.
    pub limit: u32,
    pub window_secs: u64,
}

impl Default for RateLimitOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            window_secs: 3_600,
        }
    }
}

impl RateLimitOptions {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_start: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rate limit exceeded, retry in {}s", .retry_after.as_secs())]
pub struct RateLimited {
    pub retry_after: Duration,
}

#[derive(Debug, Default)]
pub struct RequestRateLimiter {
    options: RateLimitOptions,
    entries: DashMap<String, RateLimitEntry>,
}

impl RequestRateLimiter {
    pub fn new(options: RateLimitOptions) -> Self {
        Self {
            options,
            entries: DashMap::new(),
        }
    }

    pub fn options(&self) -> &RateLimitOptions {
        &self.options
    }

    pub fn check(&self, client: &str) -> Result<(), RateLimited> {
        self.check_at(client, Instant::now())
    }

    /// Counts one request from `client` at `now`.
    pub fn check_at(&self, client: &str, now: Instant) -> Result<(), RateLimited> {
        let window = self.options.window();
        let mut entry = self
            .entries
            .entry(client.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                window_start: now,
            });

        let elapsed = now.saturating_duration_since(entry.window_start);
        if entry.count == 0 || elapsed > window {
            *entry = RateLimitEntry {
                count: 1,
                window_start: now,
            };
            debug!(client, "rate limit window opened");
            return Ok(());
        }
        if entry.count >= self.options.limit {
            let retry_after = window.saturating_sub(elapsed);
            warn!(client, count = entry.count, "request rate limited");
            return Err(RateLimited { retry_after });
        }
        entry.count += 1;
        Ok(())
    }

    /// Drops entries whose window has ended.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let window = self.options.window();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.window_start) <= window);
        before - self.entries.len()
    }

    pub fn entry(&self, client: &str) -> Option<RateLimitEntry> {
        self.entries.get(client).map(|entry| *entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleventh_request_in_window_is_rejected() {
        let limiter = RequestRateLimiter::default();
        let t0 = Instant::now();
        for i in 0..10 {
            let now = t0 + Duration::from_secs(i);
            assert!(limiter.check_at("203.0.113.7", now).is_ok(), "request {i}");
        }
        let err = limiter
            .check_at("203.0.113.7", t0 + Duration::from_secs(600))
            .expect_err("eleventh request must be limited");
        assert_eq!(err.retry_after, Duration::from_secs(3_000));
        assert_eq!(limiter.entry("203.0.113.7").map(|e| e.count), Some(10));
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RequestRateLimiter::default();
        let t0 = Instant::now();
        for _ in 0..10 {
            limiter.check_at("client", t0).unwrap();
        }
        // exactly one window later the old window still applies
        assert!(limiter.check_at("client", t0 + Duration::from_secs(3_600)).is_err());

        let later = t0 + Duration::from_secs(3_601);
        assert!(limiter.check_at("client", later).is_ok());
        let entry = limiter.entry("client").unwrap();
        assert_eq!(entry.count, 1);
        assert_eq!(entry.window_start, later);
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = RequestRateLimiter::new(RateLimitOptions {
            limit: 1,
            window_secs: 60,
        });
        let now = Instant::now();
        assert!(limiter.check_at("a", now).is_ok());
        assert!(limiter.check_at("a", now).is_err());
        assert!(limiter.check_at("b", now).is_ok());
        assert!(limiter.check_at("unknown", now).is_ok());
    }

    #[test]
    fn purge_drops_only_expired_windows() {
        let limiter = RequestRateLimiter::new(RateLimitOptions {
            limit: 5,
            window_secs: 60,
        });
        let t0 = Instant::now();
        limiter.check_at("old", t0).unwrap();
        limiter.check_at("fresh", t0 + Duration::from_secs(50)).unwrap();

        assert_eq!(limiter.purge_expired(t0 + Duration::from_secs(90)), 1);
        assert_eq!(limiter.len(), 1);
        assert!(limiter.entry("fresh").is_some());
    }
}
