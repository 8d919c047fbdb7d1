use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Classification of the observed SMTP behaviour for a mailbox.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Existence {
    /// `RCPT TO` was accepted.
    Exists,
    /// The server rejected the recipient with a definitive status.
    DoesNotExist,
    /// The verification could not be concluded. The accompanying string holds
    /// a human-readable reason (temporary failures, timeouts, catch-all, etc.).
    Indeterminate(String),
}

impl Existence {
    pub fn is_conclusive(&self) -> bool {
        matches!(self, Self::Exists | Self::DoesNotExist)
    }

    pub(crate) fn indeterminate(reason: impl Into<String>) -> Self {
        Self::Indeterminate(reason.into())
    }
}

impl fmt::Display for Existence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists => f.write_str("Exists"),
            Self::DoesNotExist => f.write_str("DoesNotExist"),
            Self::Indeterminate(reason) => write!(f, "Indeterminate ({reason})"),
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    Connect,
    Greeting,
    Ehlo,
    MailFrom,
    RcptTo,
    Quit,
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connect => "connect",
            Self::Greeting => "greeting",
            Self::Ehlo => "EHLO",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
            Self::Quit => "QUIT",
        };
        f.write_str(label)
    }
}

/// A raw SMTP reply, preserving the numeric status code and message text.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SmtpReply {
    pub fn new(code: u16, text: &str) -> Self {
        Self {
            code,
            lines: vec![text.to_string()],
        }
    }

    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_permanent_failure(&self) -> bool {
        (500..600).contains(&self.code)
    }

    pub fn text(&self) -> String {
        self.lines.join(" ")
    }
}

/// Final report produced by [`probe_mailbox`](super::probe_mailbox).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub result: Existence,
    pub host: String,
    /// Code of the last reply that drove the verdict, if any.
    pub reply_code: Option<u16>,
    /// `false` when no banner was ever read (refused, unreachable, timeout).
    pub reached_server: bool,
    pub transcript: Vec<String>,
}

impl ProbeReport {
    pub fn new(result: Existence, host: impl Into<String>) -> Self {
        Self {
            result,
            host: host.into(),
            reply_code: None,
            reached_server: false,
            transcript: Vec::new(),
        }
    }
}
