use thiserror::Error;

#[derive(Debug, Error)]
pub enum MxError {
    #[error("domain is empty")]
    EmptyDomain,
    #[error("domain IDNA conversion failed")]
    IdnaConversion {
        #[source]
        source: idna::Errors,
    },
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },
    #[error("no mail server for {domain}: {reason}")]
    NoMailServer { domain: String, reason: String },
}

impl MxError {
    pub(crate) fn idna(source: idna::Errors) -> Self {
        Self::IdnaConversion { source }
    }

    pub(crate) fn resolver_init(source: trust_dns_resolver::error::ResolveError) -> Self {
        Self::ResolverInit { source }
    }

    pub(crate) fn no_mail_server(domain: &str, reason: impl Into<String>) -> Self {
        Self::NoMailServer {
            domain: domain.to_string(),
            reason: reason.into(),
        }
    }

    /// `true` when the domain simply cannot receive mail, as opposed to a
    /// local setup problem.
    pub fn is_no_mail_server(&self) -> bool {
        matches!(self, Self::NoMailServer { .. })
    }
}
