#![forbid(unsafe_code)]
//! mailprobe_lib: email finder and deliverability probing.
//!
//! Guesses the address of a person at a domain and checks candidates with an
//! MX lookup followed by a minimal SMTP conversation (no message is sent).

pub mod finder;
pub mod guess;
pub mod logging;
pub mod mx;
pub mod names;
pub mod ratelimit;
pub mod smtp_verify;
pub mod throttle;
pub mod validator;

#[cfg(feature = "with-http")]
pub mod http;

pub use finder::{
    FindReport, Method, Outcome, ProbeContext, ProbeDepth, VerificationVerdict, Verifier,
    VerifierOptions, VerifyError,
};
pub use guess::{GuessSet, GuessStrategy, generate_guesses, guesses_for_name};
pub use mx::{Error as MxError, LookupMx, MxRecord, resolve_mx, system_resolver};
pub use names::{NameTokens, normalize_name};
pub use ratelimit::{RateLimitOptions, RateLimited, RequestRateLimiter};
pub use smtp_verify::{
    Existence, MailboxProber, ProbeReport, SmtpProbeOptions, SmtpProber, probe_mailbox,
};
pub use throttle::{DomainThrottle, ThrottleDecision, ThrottleOptions};
pub use validator::{AddressError, CandidateAddress, ValidationReport, validate_email};
