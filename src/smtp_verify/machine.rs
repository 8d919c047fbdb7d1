//! SMTP verification dialogue as an explicit state machine.
//!
//! ```text
//! Connected --banner--> Greeted --EHLO--> EnvelopeSent --MAIL--> RecipientSent
//!                                                                   |
//!                                   Done <--verdict--+--RCPT--> AliasSent
//! ```
//!
//! The machine never touches the network: the caller feeds every reply to
//! [`ProbeMachine::on_reply`] and executes the returned [`Action`].

use std::collections::VecDeque;

use super::classify::{classify_reply, mentions_unknown_mailbox};
use super::types::{Existence, ProbeStage, SmtpReply};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// Waiting for the banner.
    Connected,
    /// `EHLO`/`HELO` sent.
    Greeted,
    /// `MAIL FROM` sent.
    EnvelopeSent,
    /// `RCPT TO` for the candidate sent.
    RecipientSent,
    /// `RCPT TO` for a random alias sent (catch-all detection).
    AliasSent,
    Done,
}

impl ProbeState {
    /// Stage whose reply is awaited in this state.
    pub fn stage(&self) -> ProbeStage {
        match self {
            Self::Connected => ProbeStage::Greeting,
            Self::Greeted => ProbeStage::Ehlo,
            Self::EnvelopeSent => ProbeStage::MailFrom,
            Self::RecipientSent | Self::AliasSent => ProbeStage::RcptTo,
            Self::Done => ProbeStage::Quit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Send(String),
    Finish(Existence),
}

#[derive(Debug, Clone)]
pub struct ProbeMachine {
    state: ProbeState,
    helo: String,
    mail_from: String,
    recipient: String,
    aliases: VecDeque<String>,
    helo_fallback_used: bool,
    last_code: Option<u16>,
}

impl ProbeMachine {
    pub fn new(helo: &str, mail_from: &str, recipient: &str, aliases: Vec<String>) -> Self {
        Self {
            state: ProbeState::Connected,
            helo: helo.to_string(),
            mail_from: mail_from.to_string(),
            recipient: recipient.to_string(),
            aliases: aliases.into(),
            helo_fallback_used: false,
            last_code: None,
        }
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    pub fn last_code(&self) -> Option<u16> {
        self.last_code
    }

    pub fn on_reply(&mut self, reply: &SmtpReply) -> Action {
        self.last_code = Some(reply.code);
        match self.state {
            ProbeState::Connected => self.on_banner(reply),
            ProbeState::Greeted => self.on_greeting_reply(reply),
            ProbeState::EnvelopeSent => self.on_envelope_reply(reply),
            ProbeState::RecipientSent => self.on_recipient_reply(reply),
            ProbeState::AliasSent => self.on_alias_reply(reply),
            ProbeState::Done => Action::Finish(Existence::indeterminate("dialogue already finished")),
        }
    }

    fn on_banner(&mut self, reply: &SmtpReply) -> Action {
        if !reply.is_positive_completion() {
            return self.early_failure(reply, "banner");
        }
        self.state = ProbeState::Greeted;
        Action::Send(format!("EHLO {}", self.helo))
    }

    fn on_greeting_reply(&mut self, reply: &SmtpReply) -> Action {
        if reply.is_positive_completion() {
            self.state = ProbeState::EnvelopeSent;
            return Action::Send(format!("MAIL FROM:<{}>", self.mail_from));
        }
        // 500/502: EHLO inconnu, on retente une fois en HELO
        if matches!(reply.code, 500 | 502) && !self.helo_fallback_used {
            self.helo_fallback_used = true;
            return Action::Send(format!("HELO {}", self.helo));
        }
        self.early_failure(reply, "EHLO")
    }

    fn on_envelope_reply(&mut self, reply: &SmtpReply) -> Action {
        if !reply.is_positive_completion() {
            return self.early_failure(reply, "MAIL FROM");
        }
        self.state = ProbeState::RecipientSent;
        Action::Send(format!("RCPT TO:<{}>", self.recipient))
    }

    fn on_recipient_reply(&mut self, reply: &SmtpReply) -> Action {
        match classify_reply(reply) {
            Existence::Exists => self.next_alias().unwrap_or_else(|| self.finish(Existence::Exists)),
            other => self.finish(other),
        }
    }

    fn on_alias_reply(&mut self, reply: &SmtpReply) -> Action {
        if reply.is_positive_completion() {
            return self.finish(Existence::indeterminate(
                "catch-all: server accepted a random alias",
            ));
        }
        self.next_alias().unwrap_or_else(|| self.finish(Existence::Exists))
    }

    fn next_alias(&mut self) -> Option<Action> {
        let alias = self.aliases.pop_front()?;
        self.state = ProbeState::AliasSent;
        Some(Action::Send(format!("RCPT TO:<{alias}>")))
    }

    /// Before `RCPT TO` a refusal says nothing about the mailbox, unless the
    /// text names it explicitly.
    fn early_failure(&mut self, reply: &SmtpReply, step: &str) -> Action {
        if mentions_unknown_mailbox(&reply.text()) {
            return self.finish(Existence::DoesNotExist);
        }
        self.finish(Existence::indeterminate(format!(
            "{step} rejected with {}",
            reply.code
        )))
    }

    fn finish(&mut self, existence: Existence) -> Action {
        self.state = ProbeState::Done;
        Action::Finish(existence)
    }
}
