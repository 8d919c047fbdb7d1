use std::borrow::Cow;
use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use super::util::random_hostname;

/// Configuration knobs for [`probe_mailbox`](super::probe_mailbox).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpProbeOptions {
    pub port: u16,
    /// Name announced in `EHLO`. Empty means "use the recipient domain".
    pub helo_domain: String,
    /// Announce a freshly generated hostname on every probe instead.
    pub randomize_helo: bool,
    /// Local part of the envelope sender; the domain is always the
    /// recipient's. Empty sends the null reverse-path `<>`.
    pub mail_from_local: String,
    pub connect_timeout_ms: u64,
    pub command_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    /// Random aliases tried after an accepted `RCPT TO` to spot catch-all
    /// servers. Capped at 3.
    pub catchall_probes: u8,
}

impl Default for SmtpProbeOptions {
    fn default() -> Self {
        Self {
            port: 25,
            helo_domain: String::new(),
            randomize_helo: false,
            mail_from_local: "postmaster".to_string(),
            connect_timeout_ms: 5_000,
            command_timeout_ms: 5_000,
            probe_timeout_ms: 12_000,
            catchall_probes: 0,
        }
    }
}

fn millis(value: u64) -> Option<Duration> {
    if value == 0 {
        None
    } else {
        Some(Duration::from_millis(value))
    }
}

impl SmtpProbeOptions {
    /// A zero value disables the corresponding deadline.
    pub fn connect_timeout(&self) -> Option<Duration> {
        millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        millis(self.command_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        millis(self.probe_timeout_ms)
    }

    pub fn helo_name<'a>(&'a self, fallback: &'a str) -> Cow<'a, str> {
        if self.randomize_helo {
            Cow::Owned(random_hostname())
        } else if self.helo_domain.trim().is_empty() {
            Cow::Borrowed(fallback)
        } else {
            Cow::Borrowed(self.helo_domain.trim())
        }
    }

    /// Envelope sender on the recipient's own domain.
    pub fn mail_from(&self, recipient_domain: &str) -> String {
        let local = self.mail_from_local.trim();
        if local.is_empty() {
            String::new()
        } else {
            format!("{local}@{recipient_domain}")
        }
    }

    pub fn catchall_count(&self) -> usize {
        usize::from(self.catchall_probes.min(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_disables_deadline() {
        let options = SmtpProbeOptions {
            command_timeout_ms: 0,
            ..SmtpProbeOptions::default()
        };
        assert_eq!(options.command_timeout(), None);
        assert_eq!(options.connect_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn sender_uses_recipient_domain() {
        let options = SmtpProbeOptions::default();
        assert_eq!(options.mail_from("example.com"), "postmaster@example.com");
        let null_sender = SmtpProbeOptions {
            mail_from_local: String::new(),
            ..SmtpProbeOptions::default()
        };
        assert_eq!(null_sender.mail_from("example.com"), "");
    }

    #[test]
    fn helo_falls_back_to_domain() {
        let options = SmtpProbeOptions::default();
        assert_eq!(options.helo_name("example.com"), "example.com");
        let fixed = SmtpProbeOptions {
            helo_domain: "probe.example.net".to_string(),
            ..SmtpProbeOptions::default()
        };
        assert_eq!(fixed.helo_name("example.com"), "probe.example.net");
        let random = SmtpProbeOptions {
            randomize_helo: true,
            ..SmtpProbeOptions::default()
        };
        assert_ne!(random.helo_name("example.com"), "example.com");
    }
}
