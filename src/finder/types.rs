use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::guess::GuessStrategy;
use crate::ratelimit::{RateLimitOptions, RequestRateLimiter};
use crate::smtp_verify::{Existence, ProbeReport};
use crate::throttle::{DomainThrottle, ThrottleOptions};

/// How far a candidate is checked.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeDepth {
    /// MX lookup only; a domain with mail servers counts as a weak hit.
    #[cfg_attr(feature = "with-serde", serde(rename = "dns-only"))]
    DnsOnly,
    #[default]
    #[cfg_attr(feature = "with-serde", serde(rename = "dns+smtp"))]
    DnsAndSmtp,
}

impl FromStr for ProbeDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dns" | "dns-only" => Ok(Self::DnsOnly),
            "smtp" | "dns+smtp" => Ok(Self::DnsAndSmtp),
            other => Err(format!("unknown probe depth '{other}' (dns-only|dns+smtp)")),
        }
    }
}

/// Which MX hosts are tried, and in which order.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostSelection {
    /// Preference order.
    #[default]
    Primary,
    /// Shuffled on every candidate.
    Random,
}

impl FromStr for HostSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown host selection '{other}' (primary|random)")),
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierOptions {
    pub guess_strategy: GuessStrategy,
    pub probe_depth: ProbeDepth,
    pub host_selection: HostSelection,
    /// MX hosts tried per candidate when the previous one was unreachable.
    pub max_hosts: usize,
    /// Random pause `(min, max)` between two candidates that reached SMTP.
    pub inter_probe_delay_ms: Option<(u64, u64)>,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            guess_strategy: GuessStrategy::Basic,
            probe_depth: ProbeDepth::DnsAndSmtp,
            host_selection: HostSelection::Primary,
            max_hosts: 2,
            inter_probe_delay_ms: Some((500, 1_500)),
        }
    }
}

impl VerifierOptions {
    pub fn inter_probe_delay(&self) -> Option<(Duration, Duration)> {
        let (min, max) = self.inter_probe_delay_ms?;
        if max == 0 {
            return None;
        }
        Some((Duration::from_millis(min.min(max)), Duration::from_millis(max)))
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Exists,
    NotExists,
    Inconclusive,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
            Self::Inconclusive => "inconclusive",
        })
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Dns,
    Smtp,
    Format,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dns => "dns",
            Self::Smtp => "smtp",
            Self::Format => "format",
        })
    }
}

pub(crate) const CONFIDENCE_SMTP: u8 = 95;
pub(crate) const CONFIDENCE_NO_MX: u8 = 90;
pub(crate) const CONFIDENCE_DNS_ONLY: u8 = 50;
pub(crate) const CONFIDENCE_INCONCLUSIVE: u8 = 40;
pub(crate) const CONFIDENCE_BLOCKED: u8 = 30;
pub(crate) const CONFIDENCE_FORMAT: u8 = 100;

pub(crate) const BLOCKED_REASON: &str = "domain blocked after repeated probe failures";

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationVerdict {
    pub address: String,
    pub outcome: Outcome,
    /// 0..=100
    pub confidence: u8,
    pub method: Method,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub reason: Option<String>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub mx_host: Option<String>,
}

impl VerificationVerdict {
    pub fn is_deliverable(&self) -> bool {
        self.outcome == Outcome::Exists
    }

    pub(crate) fn format_failure(address: &str, reasons: &[String]) -> Self {
        Self {
            address: address.trim().to_string(),
            outcome: Outcome::NotExists,
            confidence: CONFIDENCE_FORMAT,
            method: Method::Format,
            reason: Some(reasons.join("; ")),
            mx_host: None,
        }
    }

    pub(crate) fn no_mail_server(address: String, reason: String) -> Self {
        Self {
            address,
            outcome: Outcome::NotExists,
            confidence: CONFIDENCE_NO_MX,
            method: Method::Dns,
            reason: Some(reason),
            mx_host: None,
        }
    }

    pub(crate) fn dns_error(address: String, reason: String) -> Self {
        Self {
            address,
            outcome: Outcome::Inconclusive,
            confidence: CONFIDENCE_INCONCLUSIVE,
            method: Method::Dns,
            reason: Some(reason),
            mx_host: None,
        }
    }

    pub(crate) fn dns_only(address: String, mx_host: String) -> Self {
        Self {
            address,
            outcome: Outcome::Exists,
            confidence: CONFIDENCE_DNS_ONLY,
            method: Method::Dns,
            reason: Some("domain accepts mail; mailbox not probed".to_string()),
            mx_host: Some(mx_host),
        }
    }

    pub(crate) fn blocked(address: String) -> Self {
        Self {
            address,
            outcome: Outcome::Inconclusive,
            confidence: CONFIDENCE_BLOCKED,
            method: Method::Smtp,
            reason: Some(BLOCKED_REASON.to_string()),
            mx_host: None,
        }
    }

    pub(crate) fn from_probe(address: String, report: &ProbeReport) -> Self {
        let (outcome, confidence, reason) = match &report.result {
            Existence::Exists => (Outcome::Exists, CONFIDENCE_SMTP, None),
            Existence::DoesNotExist => (
                Outcome::NotExists,
                CONFIDENCE_SMTP,
                report
                    .reply_code
                    .map(|code| format!("recipient rejected with {code}")),
            ),
            Existence::Indeterminate(reason) => (
                Outcome::Inconclusive,
                CONFIDENCE_INCONCLUSIVE,
                Some(reason.clone()),
            ),
        };
        Self {
            address,
            outcome,
            confidence,
            method: Method::Smtp,
            reason,
            mx_host: Some(report.host.clone()),
        }
    }
}

/// Result of a Find call.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "with-serde",
    serde(tag = "status", rename_all = "snake_case")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindReport {
    Found {
        verdict: VerificationVerdict,
        /// 1-based position of the winning guess.
        checked: usize,
        total: usize,
    },
    NotFound {
        attempts: Vec<VerificationVerdict>,
        total: usize,
        suggestions: Vec<String>,
    },
    /// Fewer than two name tokens, nothing to combine.
    InsufficientName,
    /// Enough tokens, but none of them spells a valid local part.
    NoUsablePattern { tokens: usize },
}

impl FindReport {
    pub fn total(&self) -> usize {
        match self {
            Self::Found { total, .. } | Self::NotFound { total, .. } => *total,
            Self::InsufficientName | Self::NoUsablePattern { .. } => 0,
        }
    }

    pub fn found(&self) -> Option<&VerificationVerdict> {
        match self {
            Self::Found { verdict, .. } => Some(verdict),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("{0}")]
    InputInvalid(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Process-wide shared state, built once at startup and handed to every
/// verifier and to the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct ProbeContext {
    pub throttle: Arc<DomainThrottle>,
    pub limiter: Arc<RequestRateLimiter>,
}

impl ProbeContext {
    pub fn new(throttle: ThrottleOptions, limits: RateLimitOptions) -> Self {
        Self {
            throttle: Arc::new(DomainThrottle::new(throttle)),
            limiter: Arc::new(RequestRateLimiter::new(limits)),
        }
    }
}
