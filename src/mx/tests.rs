use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Error, MxRecord, resolver};
use trust_dns_resolver::error::ResolveError;

type LookupResult = Result<Vec<MxRecord>, ResolveError>;
type LookupFn = dyn Fn(&str) -> LookupResult + Send + Sync;

pub(crate) struct StubResolver {
    pub on_lookup: Box<LookupFn>,
    pub calls: AtomicUsize,
}

impl StubResolver {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> LookupResult + Send + Sync + 'static,
    {
        Self {
            on_lookup: Box::new(f),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every domain resolves to the same exchanger list.
    pub(crate) fn with_records(records: Vec<MxRecord>) -> Self {
        Self::new(move |_| Ok(records.clone()))
    }

    /// Every domain answers with an empty MX set.
    pub(crate) fn empty() -> Self {
        Self::new(|_| Ok(Vec::new()))
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[test]
fn normalize_domain_rejects_empty() {
    let err = resolver::normalize_domain("").expect_err("empty domain should fail");
    assert!(matches!(err, Error::EmptyDomain));
}

#[tokio::test]
async fn resolve_sorts_and_dedups_records() {
    let stub = StubResolver::new(|domain| {
        assert_eq!(domain, "example.com");
        Ok(vec![
            MxRecord::new(20, "mx2.example.com"),
            MxRecord::new(10, "mx1.example.com"),
            MxRecord::new(10, "mx1.example.com"),
            MxRecord::new(30, "mx3.example.com"),
        ])
    });

    let records = resolver::resolve_mx(&stub, "example.com")
        .await
        .expect("lookup succeeds");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].preference, 10);
    assert_eq!(records[0].exchange, "mx1.example.com");
    assert_eq!(records[2].preference, 30);
}

#[tokio::test]
async fn empty_answer_is_no_mail_server() {
    let stub = StubResolver::empty();
    let err = resolver::resolve_mx(&stub, "example.com")
        .await
        .expect_err("no records");
    assert!(err.is_no_mail_server());
    assert_eq!(stub.call_count(), 1);
}

#[tokio::test]
async fn lookup_error_is_no_mail_server() {
    let stub = StubResolver::new(|_| Err(ResolveError::from("NXDOMAIN")));
    let err = resolver::resolve_mx(&stub, "nope.example")
        .await
        .expect_err("lookup fails");
    match err {
        Error::NoMailServer { domain, reason } => {
            assert_eq!(domain, "nope.example");
            assert!(reason.contains("NXDOMAIN"));
        }
        other => panic!("expected NoMailServer, got {other:?}"),
    }
}

#[tokio::test]
async fn idn_domain_is_queried_in_ascii() {
    let stub = StubResolver::new(|domain| {
        assert_eq!(domain, "xn--exmple-cua.de");
        Ok(vec![MxRecord::new(5, "mx.xn--exmple-cua.de")])
    });
    let records = resolver::resolve_mx(&stub, "exämple.de")
        .await
        .expect("lookup succeeds");
    assert_eq!(records.len(), 1);
}

#[test]
fn record_host_is_trimmed_and_lowercased() {
    let record = MxRecord::new(10, "Mail.EXAMPLE.com.");
    assert_eq!(record.exchange, "mail.example.com");
    assert!(!record.is_null());
    assert_eq!(record.to_string(), "   10 mail.example.com");
}

#[tokio::test]
async fn null_mx_means_no_mail_server() {
    let stub = StubResolver::with_records(vec![MxRecord::new(0, ".")]);
    let err = resolver::resolve_mx(&stub, "example.com")
        .await
        .expect_err("null MX accepts no mail");
    assert!(err.is_no_mail_server());
}
