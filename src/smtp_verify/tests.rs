use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use super::*;
use crate::validator::CandidateAddress;

type Responder = fn(&str) -> Option<&'static str>;

/// One-shot loopback SMTP server: sends `banner`, then answers each command
/// line with `respond` until it returns `None` or the client quits.
async fn spawn_server(banner: &'static str, respond: Responder) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        let _ = write.write_all(banner.as_bytes()).await;
        while let Ok(Some(line)) = lines.next_line().await {
            if line == "QUIT" {
                let _ = write.write_all(b"221 bye\r\n").await;
                break;
            }
            match respond(&line) {
                Some(reply) => {
                    let _ = write.write_all(reply.as_bytes()).await;
                }
                None => tokio::time::sleep(Duration::from_secs(5)).await,
            }
        }
    });
    addr
}

fn options(addr: SocketAddr) -> SmtpProbeOptions {
    SmtpProbeOptions {
        port: addr.port(),
        helo_domain: "probe.test".to_string(),
        connect_timeout_ms: 1_000,
        command_timeout_ms: 1_000,
        probe_timeout_ms: 3_000,
        ..SmtpProbeOptions::default()
    }
}

fn mario() -> CandidateAddress {
    CandidateAddress::parse("mario@example.com").unwrap()
}

fn accepting(line: &str) -> Option<&'static str> {
    if line.starts_with("EHLO") {
        Some("250-mx.test\r\n250 SIZE 10240000\r\n")
    } else if line.starts_with("MAIL FROM") {
        Some("250 2.1.0 Ok\r\n")
    } else if line.starts_with("RCPT TO") {
        Some("250 2.1.5 Ok\r\n")
    } else {
        Some("500 unknown\r\n")
    }
}

fn rejecting(line: &str) -> Option<&'static str> {
    if line.starts_with("RCPT TO") {
        Some("550 5.1.1 <mario@example.com>: Recipient address rejected: User unknown\r\n")
    } else {
        accepting(line)
    }
}

#[tokio::test]
async fn accepted_recipient_exists() {
    let addr = spawn_server("220 mx.test ESMTP\r\n", accepting).await;
    let report = probe_mailbox(&mario(), "127.0.0.1", &options(addr)).await;

    assert_eq!(report.result, Existence::Exists);
    assert_eq!(report.reply_code, Some(250));
    assert!(report.reached_server);
    assert_eq!(report.host, "127.0.0.1");
    assert!(
        report
            .transcript
            .iter()
            .any(|l| l.ends_with("C: EHLO probe.test"))
    );
    assert!(
        report
            .transcript
            .iter()
            .any(|l| l.ends_with("C: MAIL FROM:<postmaster@example.com>"))
    );
    assert!(report.transcript.iter().any(|l| l.ends_with("C: QUIT")));
}

#[tokio::test]
async fn rejected_recipient_does_not_exist() {
    let addr = spawn_server("220 mx.test ESMTP\r\n", rejecting).await;
    let report = probe_mailbox(&mario(), "127.0.0.1", &options(addr)).await;

    assert_eq!(report.result, Existence::DoesNotExist);
    assert_eq!(report.reply_code, Some(550));
}

#[tokio::test]
async fn helo_fallback_after_unrecognised_ehlo() {
    fn legacy(line: &str) -> Option<&'static str> {
        if line.starts_with("EHLO") {
            Some("502 5.5.2 command not recognised\r\n")
        } else if line.starts_with("HELO") {
            Some("250 mx.test\r\n")
        } else {
            accepting(line)
        }
    }
    let addr = spawn_server("220 legacy smtpd\r\n", legacy).await;
    let report = probe_mailbox(&mario(), "127.0.0.1", &options(addr)).await;

    assert_eq!(report.result, Existence::Exists);
    assert!(
        report
            .transcript
            .iter()
            .any(|l| l.ends_with("C: HELO probe.test"))
    );
}

#[tokio::test]
async fn catch_all_server_is_indeterminate() {
    let addr = spawn_server("220 mx.test ESMTP\r\n", accepting).await;
    let opts = SmtpProbeOptions {
        catchall_probes: 1,
        ..options(addr)
    };
    let report = probe_mailbox(&mario(), "127.0.0.1", &opts).await;

    assert!(matches!(
        &report.result,
        Existence::Indeterminate(reason) if reason.contains("catch-all")
    ));
    let rcpts = report
        .transcript
        .iter()
        .filter(|l| l.contains("C: RCPT TO"))
        .count();
    assert_eq!(rcpts, 2);
}

#[tokio::test]
async fn silent_server_times_out_on_greeting() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });
    let opts = SmtpProbeOptions {
        command_timeout_ms: 200,
        ..options(addr)
    };
    let report = probe_mailbox(&mario(), "127.0.0.1", &opts).await;

    assert!(matches!(
        &report.result,
        Existence::Indeterminate(reason) if reason.contains("greeting")
    ));
    assert!(!report.reached_server);
}

#[tokio::test]
async fn overall_deadline_bounds_a_stalled_dialogue() {
    fn stalls_on_ehlo(_line: &str) -> Option<&'static str> {
        None
    }
    let addr = spawn_server("220 mx.test ESMTP\r\n", stalls_on_ehlo).await;
    let opts = SmtpProbeOptions {
        command_timeout_ms: 0,
        probe_timeout_ms: 300,
        ..options(addr)
    };
    let report = probe_mailbox(&mario(), "127.0.0.1", &opts).await;

    assert!(matches!(
        &report.result,
        Existence::Indeterminate(reason) if reason.contains("EHLO")
    ));
    assert!(report.reached_server);
}

#[tokio::test]
async fn refused_connection_is_indeterminate() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let report = probe_mailbox(&mario(), "127.0.0.1", &options(addr)).await;

    assert!(!report.result.is_conclusive());
    assert!(!report.reached_server);
    assert_eq!(report.reply_code, None);
}

#[tokio::test]
async fn prober_trait_delegates_to_probe_mailbox() {
    let addr = spawn_server("220 mx.test ESMTP\r\n", rejecting).await;
    let prober = SmtpProber::new(options(addr));
    let report = prober.probe(&mario(), "127.0.0.1").await;
    assert_eq!(report.result, Existence::DoesNotExist);
}

#[tokio::test]
async fn mixed_code_banner_is_indeterminate() {
    let addr = spawn_server("220-mx.test ESMTP\r\n550 too busy\r\n", accepting).await;
    let report = probe_mailbox(&mario(), "127.0.0.1", &options(addr)).await;

    assert!(matches!(
        &report.result,
        Existence::Indeterminate(reason) if reason.contains("220 vs 550")
    ));
}

#[tokio::test]
async fn codeless_banner_is_indeterminate() {
    let addr = spawn_server("mx.test ESMTP queue 15502 ready\r\n", accepting).await;
    let report = probe_mailbox(&mario(), "127.0.0.1", &options(addr)).await;

    assert!(matches!(&report.result, Existence::Indeterminate(_)));
}

#[tokio::test]
async fn mixed_code_rcpt_reply_is_indeterminate() {
    fn mixed(line: &str) -> Option<&'static str> {
        if line.starts_with("RCPT TO") {
            Some("250-accepted\r\n550 rejected\r\n")
        } else {
            accepting(line)
        }
    }
    let addr = spawn_server("220 mx.test ESMTP\r\n", mixed).await;
    let report = probe_mailbox(&mario(), "127.0.0.1", &options(addr)).await;

    assert!(!report.result.is_conclusive());
}

#[tokio::test]
async fn codeless_rcpt_reply_naming_the_mailbox_does_not_exist() {
    fn codeless(line: &str) -> Option<&'static str> {
        if line.starts_with("RCPT TO") {
            Some("Recipient rejected: no such user\r\n")
        } else {
            accepting(line)
        }
    }
    let addr = spawn_server("220 mx.test ESMTP\r\n", codeless).await;
    let report = probe_mailbox(&mario(), "127.0.0.1", &options(addr)).await;

    assert_eq!(report.result, Existence::DoesNotExist);
}
