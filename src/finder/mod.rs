//! Verification orchestrator.
//!
//! [`Verifier::find`] walks the ranked guesses for a name and stops at the
//! first confirmed mailbox; [`Verifier::validate`] checks one address. Both
//! share the per-candidate pipeline: circuit check, MX lookup, throttle wait,
//! SMTP probe.

mod types;

pub use types::{
    FindReport, HostSelection, Method, Outcome, ProbeContext, ProbeDepth, VerificationVerdict,
    VerifierOptions, VerifyError,
};

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};
use trust_dns_resolver::TokioAsyncResolver;

use crate::guess::generate_guesses;
use crate::mx::{LookupMx, MxRecord, resolve_mx, system_resolver};
use crate::names::normalize_name;
use crate::smtp_verify::{MailboxProber, SmtpProbeOptions, SmtpProber};
use crate::throttle::{DomainThrottle, ThrottleDecision};
use crate::validator::CandidateAddress;

pub const MISSING_INPUT: &str = "Missing name or domain";
pub const INVALID_DOMAIN: &str = "Invalid domain";

const SUGGESTIONS: &[&str] = &[
    "Check the spelling of the name and the company domain",
    "Try the smart guess strategy for more patterns",
    "The domain may accept all addresses or block verification; try again later",
];

/// Verdict for one candidate plus whether an SMTP conversation was attempted.
struct CandidateCheck {
    verdict: VerificationVerdict,
    probed: bool,
}

pub struct Verifier<R, P> {
    resolver: R,
    prober: P,
    throttle: Arc<DomainThrottle>,
    options: VerifierOptions,
}

impl Verifier<TokioAsyncResolver, SmtpProber> {
    /// Production wiring: system DNS configuration and real SMTP probes.
    pub fn from_system(
        options: VerifierOptions,
        smtp: SmtpProbeOptions,
        throttle: Arc<DomainThrottle>,
    ) -> Result<Self, VerifyError> {
        let resolver = system_resolver().map_err(|err| VerifyError::Internal(err.to_string()))?;
        Ok(Self::new(resolver, SmtpProber::new(smtp), throttle, options))
    }
}

impl<R, P> Verifier<R, P>
where
    R: LookupMx + Sync,
    P: MailboxProber + Sync,
{
    pub fn new(resolver: R, prober: P, throttle: Arc<DomainThrottle>, options: VerifierOptions) -> Self {
        Self {
            resolver,
            prober,
            throttle,
            options,
        }
    }

    pub fn options(&self) -> &VerifierOptions {
        &self.options
    }

    pub fn throttle(&self) -> &DomainThrottle {
        &self.throttle
    }

    /// Finds the mailbox of `name` at `domain`.
    ///
    /// Guesses are checked one after the other. Per-candidate failures are
    /// recorded as verdicts; only invalid input aborts before any network
    /// activity. A name that yields no candidate is reported as
    /// [`FindReport::InsufficientName`] or [`FindReport::NoUsablePattern`].
    pub async fn find(&self, name: &str, domain: &str) -> Result<FindReport, VerifyError> {
        let (name, domain) = (name.trim(), domain.trim());
        if name.is_empty() || domain.is_empty() {
            return Err(VerifyError::InputInvalid(MISSING_INPUT.to_string()));
        }
        let tokens = normalize_name(name);
        let guesses = generate_guesses(&tokens, domain, self.options.guess_strategy)
            .map_err(|_| VerifyError::InputInvalid(INVALID_DOMAIN.to_string()))?;
        if guesses.is_empty() {
            info!(domain, tokens = tokens.len(), "no candidate to check");
            return Ok(if tokens.is_sufficient() {
                FindReport::NoUsablePattern {
                    tokens: tokens.len(),
                }
            } else {
                FindReport::InsufficientName
            });
        }
        let total = guesses.len();
        info!(domain, total, strategy = ?self.options.guess_strategy, "starting find");

        let mut attempts = Vec::with_capacity(total);
        for (index, candidate) in guesses.iter().enumerate() {
            let check = self.check_candidate(candidate).await;
            if check.verdict.outcome == Outcome::Exists {
                info!(address = %candidate, checked = index + 1, total, "mailbox found");
                return Ok(FindReport::Found {
                    verdict: check.verdict,
                    checked: index + 1,
                    total,
                });
            }
            attempts.push(check.verdict);
            if check.probed && index + 1 < total {
                self.pause_between_probes().await;
            }
        }

        info!(domain, total, "no mailbox found");
        Ok(FindReport::NotFound {
            attempts,
            total,
            suggestions: SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Verifies one address. Syntax failures are answered without any DNS or
    /// SMTP traffic.
    pub async fn validate(&self, email: &str) -> VerificationVerdict {
        match CandidateAddress::parse(email) {
            Ok(candidate) => self.check_candidate(&candidate).await.verdict,
            Err(err) => {
                debug!(email, error = %err, "syntax check failed");
                VerificationVerdict::format_failure(email, err.reasons())
            }
        }
    }

    async fn check_candidate(&self, candidate: &CandidateAddress) -> CandidateCheck {
        let address = candidate.to_string();
        let domain = candidate.ascii_domain();

        if self.throttle.is_blocked(&domain) {
            return CandidateCheck {
                verdict: VerificationVerdict::blocked(address),
                probed: false,
            };
        }

        let records = match resolve_mx(&self.resolver, &domain).await {
            Ok(records) => records,
            Err(err) if err.is_no_mail_server() => {
                return CandidateCheck {
                    verdict: VerificationVerdict::no_mail_server(address, err.to_string()),
                    probed: false,
                };
            }
            Err(err) => {
                return CandidateCheck {
                    verdict: VerificationVerdict::dns_error(address, err.to_string()),
                    probed: false,
                };
            }
        };

        let hosts = self.select_hosts(&records);
        if self.options.probe_depth == ProbeDepth::DnsOnly {
            let primary = hosts.first().cloned().unwrap_or_default();
            return CandidateCheck {
                verdict: VerificationVerdict::dns_only(address, primary),
                probed: false,
            };
        }

        let mut last_report = None;
        for host in &hosts {
            if let ThrottleDecision::Blocked = self.throttle.acquire(&domain).await {
                break;
            }
            let report = self.prober.probe(candidate, host).await;
            if report.result.is_conclusive() {
                self.throttle.record_success(&domain);
            } else {
                self.throttle.record_failure(&domain);
            }
            let next_host = !report.reached_server && !report.result.is_conclusive();
            last_report = Some(report);
            if !next_host {
                break;
            }
            debug!(%address, %host, "mail server unreachable, trying next exchanger");
        }

        let verdict = match &last_report {
            Some(report) => VerificationVerdict::from_probe(address, report),
            None => VerificationVerdict::blocked(address),
        };
        info!(
            address = %verdict.address,
            outcome = %verdict.outcome,
            confidence = verdict.confidence,
            "candidate checked"
        );
        CandidateCheck {
            verdict,
            probed: last_report.is_some(),
        }
    }

    fn select_hosts(&self, records: &[MxRecord]) -> Vec<String> {
        let mut hosts: Vec<String> = records.iter().map(|mx| mx.exchange.clone()).collect();
        if self.options.host_selection == HostSelection::Random {
            hosts.shuffle(&mut rand::thread_rng());
        }
        hosts.truncate(self.options.max_hosts.max(1));
        hosts
    }

    fn jitter(&self) -> Option<Duration> {
        let (min, max) = self.options.inter_probe_delay()?;
        let millis = rand::thread_rng().gen_range(min.as_millis()..=max.as_millis());
        Some(Duration::from_millis(millis as u64))
    }

    async fn pause_between_probes(&self) {
        if let Some(delay) = self.jitter() {
            debug!(delay_ms = delay.as_millis() as u64, "pausing before next candidate");
            tokio::time::sleep(delay).await;
        }
    }
}
