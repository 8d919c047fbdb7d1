use std::future::Future;

use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use tracing::debug;

use super::{Error, MxRecord};

/// Builds the production resolver from `/etc/resolv.conf` (or the platform
/// equivalent).
pub fn system_resolver() -> Result<TokioAsyncResolver, Error> {
    TokioAsyncResolver::tokio_from_system_conf().map_err(Error::resolver_init)
}

/// Resolves `domain` to its mail exchangers, best preference first.
///
/// Lookup errors (NXDOMAIN, timeouts, SERVFAIL), empty answers and null MX
/// records all map to [`Error::NoMailServer`]; nothing is retried here.
pub async fn resolve_mx<R>(resolver: &R, domain: &str) -> Result<Vec<MxRecord>, Error>
where
    R: LookupMx,
{
    let ascii = normalize_domain(domain)?;
    let mut records = match resolver.lookup_mx(&ascii).await {
        Ok(records) => records,
        Err(err) => {
            debug!(domain = %ascii, error = %err, "MX lookup failed");
            return Err(Error::no_mail_server(&ascii, err.to_string()));
        }
    };

    records.retain(|record| !record.is_null());
    records.sort();
    records.dedup();

    if records.is_empty() {
        return Err(Error::no_mail_server(&ascii, "no MX records"));
    }
    debug!(domain = %ascii, count = records.len(), "MX records resolved");
    Ok(records)
}

pub(crate) fn normalize_domain(domain: &str) -> Result<String, Error> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(Error::idna)
}

/// DNS capability consumed by the engine.
pub trait LookupMx {
    fn lookup_mx(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Vec<MxRecord>, ResolveError>> + Send;
}

impl LookupMx for TokioAsyncResolver {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        let lookup = match self.mx_lookup(domain).await {
            Ok(lookup) => lookup,
            Err(err) => {
                if matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. }) {
                    return Ok(Vec::new());
                }
                return Err(err);
            }
        };
        let mut records = Vec::new();
        for mx in lookup.iter() {
            records.push(MxRecord::new(mx.preference(), mx.exchange().to_utf8()));
        }
        Ok(records)
    }
}

#[cfg(test)]
impl LookupMx for crate::mx::tests::StubResolver {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        (self.on_lookup)(domain)
    }
}
