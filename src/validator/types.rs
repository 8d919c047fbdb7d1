use std::fmt;

use thiserror::Error;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub ok: bool,
    pub reasons: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid email address: {}", reasons.join("; "))]
    Invalid { reasons: Vec<String> },
}

impl AddressError {
    pub(crate) fn invalid(reasons: Vec<String>) -> Self {
        Self::Invalid { reasons }
    }

    pub fn reasons(&self) -> &[String] {
        match self {
            Self::Invalid { reasons } => reasons,
        }
    }
}

/// A syntactically valid mailbox, ready to be handed to the network layer.
///
/// The only constructors go through the validator, so holding a value means
/// the conservative grammar has already been checked.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateAddress {
    local_part: String,
    domain: String,
}

impl CandidateAddress {
    pub fn new(local_part: &str, domain: &str) -> Result<Self, AddressError> {
        Self::parse(&format!("{local_part}@{domain}"))
    }

    pub fn parse(addr: &str) -> Result<Self, AddressError> {
        let report = super::validate_email(addr);
        if !report.ok {
            return Err(AddressError::invalid(report.reasons));
        }
        // validate_email garantit exactement un '@'
        let (local, domain) = addr
            .trim()
            .split_once('@')
            .ok_or_else(|| AddressError::invalid(vec!["missing '@'".to_string()]))?;
        let (domain_lower, _) = super::normalize_domain(domain);
        Ok(Self {
            local_part: local.to_ascii_lowercase(),
            domain: domain_lower,
        })
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// ASCII (punycode) form of the domain, used for DNS and SMTP.
    pub fn ascii_domain(&self) -> String {
        super::normalize_domain(&self.domain).1
    }
}

impl fmt::Display for CandidateAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}
