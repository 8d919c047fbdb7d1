//! Conservative email / domain syntax checks.
//!
//! Every address that reaches DNS or SMTP goes through [`CandidateAddress`],
//! whose constructors run [`validate_email`].

mod domain;
mod local;
mod types;

use std::sync::LazyLock;

use regex::Regex;

pub use types::{AddressError, CandidateAddress, ValidationReport};

pub use domain::{check_domain, normalize_domain};
pub(crate) use local::check_local;

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email regex")
});

pub fn validate_email(email: &str) -> ValidationReport {
    let input = email.trim();

    let mut reasons = Vec::new();

    if input.len() > 254 {
        reasons.push(format!("total length {} > 254", input.len()));
    }

    let parts: Vec<&str> = input.split('@').collect();
    if parts.len() != 2 {
        reasons.push("must contain exactly one '@'".to_string());
        return ValidationReport { ok: false, reasons };
    }
    let (local, domain) = (parts[0], parts[1]);

    if !EMAIL_SHAPE.is_match(input) {
        reasons.push("address does not match local@domain.tld".to_string());
    }

    if let Err(issue) = check_local(local) {
        reasons.push(issue.to_string());
    }

    check_domain(domain, &mut reasons);

    let ok = reasons.is_empty();
    ValidationReport { ok, reasons }
}

/// Domain-only grammar: dot-separated labels, alphabetic TLD of 2+ chars.
pub fn is_valid_domain(domain: &str) -> bool {
    let mut reasons = Vec::new();
    check_domain(domain, &mut reasons);
    reasons.is_empty()
}
