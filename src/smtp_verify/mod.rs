//! SMTP mailbox probing.
//!
//! [`probe_mailbox`] runs a minimal dialogue (`EHLO`, `MAIL FROM`, `RCPT TO`,
//! `QUIT`) against one mail exchanger and classifies the outcome into an
//! [`Existence`]. No message is ever sent: the session stops after the
//! recipient is accepted or refused.

mod classify;
mod error;
mod machine;
mod options;
mod probe;
mod session;
mod types;
mod util;

pub use classify::{classify_reply, classify_text};
pub use error::SmtpVerifyError;
pub use machine::{Action, ProbeMachine, ProbeState};
pub use options::SmtpProbeOptions;
pub use probe::{MailboxProber, SmtpProber, probe_mailbox};
pub use types::{Existence, ProbeReport, ProbeStage, SmtpReply};
pub use util::random_local_part;

#[cfg(test)]
mod tests;
