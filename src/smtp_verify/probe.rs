use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info};

use crate::smtp_verify::classify::{classify_text, mentions_unknown_mailbox};
use crate::smtp_verify::error::SmtpVerifyError;
use crate::smtp_verify::machine::{Action, ProbeMachine, ProbeState};
use crate::smtp_verify::options::SmtpProbeOptions;
use crate::smtp_verify::session::SmtpSession;
use crate::smtp_verify::types::{Existence, ProbeReport, ProbeStage, SmtpReply};
use crate::smtp_verify::util::random_local_part;
use crate::validator::CandidateAddress;

/// SMTP capability consumed by the orchestrator.
pub trait MailboxProber {
    fn probe(
        &self,
        address: &CandidateAddress,
        host: &str,
    ) -> impl Future<Output = ProbeReport> + Send;
}

/// Production prober: a real TCP conversation per call.
#[derive(Debug, Clone, Default)]
pub struct SmtpProber {
    options: SmtpProbeOptions,
}

impl SmtpProber {
    pub fn new(options: SmtpProbeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SmtpProbeOptions {
        &self.options
    }
}

impl MailboxProber for SmtpProber {
    async fn probe(&self, address: &CandidateAddress, host: &str) -> ProbeReport {
        probe_mailbox(address, host, &self.options).await
    }
}

/// Runs connect → EHLO → MAIL FROM → RCPT TO → QUIT against `host` for one
/// address. Never fails: network errors and unreadable replies become
/// [`Existence::Indeterminate`].
pub async fn probe_mailbox(
    address: &CandidateAddress,
    host: &str,
    options: &SmtpProbeOptions,
) -> ProbeReport {
    let domain = address.ascii_domain();
    let recipient = format!("{}@{}", address.local_part(), domain);
    let helo = options.helo_name(&domain).into_owned();
    let mail_from = options.mail_from(&domain);
    let aliases: Vec<String> = (0..options.catchall_count())
        .map(|_| format!("{}@{domain}", random_local_part(address.local_part().len())))
        .filter(|alias| *alias != recipient)
        .collect();

    let mut machine = ProbeMachine::new(&helo, &mail_from, &recipient, aliases);
    let mut transcript = Vec::new();
    let mut reached_server = false;

    let dialogue = run_dialogue(
        host,
        options,
        &mut machine,
        &mut transcript,
        &mut reached_server,
    );
    let outcome = with_deadline(options.probe_timeout(), dialogue).await;

    let result = match outcome {
        Some(Ok(existence)) => existence,
        Some(Err(err)) => {
            debug!(host, address = %recipient, error = %err, "SMTP probe failed");
            existence_from_error(&err, machine.state())
        }
        None => Existence::indeterminate(format!(
            "probe timed out awaiting {} reply",
            machine.state().stage()
        )),
    };
    info!(host, address = %recipient, result = %result, "SMTP probe finished");

    ProbeReport {
        result,
        host: host.to_string(),
        reply_code: machine.last_code(),
        reached_server,
        transcript,
    }
}

async fn with_deadline<F, T>(limit: Option<Duration>, fut: F) -> Option<T>
where
    F: Future<Output = T>,
{
    match limit {
        Some(limit) => timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}

async fn run_dialogue(
    host: &str,
    options: &SmtpProbeOptions,
    machine: &mut ProbeMachine,
    transcript: &mut Vec<String>,
    reached_server: &mut bool,
) -> Result<Existence, SmtpVerifyError> {
    let mut session = SmtpSession::connect(
        host,
        options.port,
        options.connect_timeout(),
        options.command_timeout(),
        transcript,
    )
    .await?;
    let banner = session.read_reply(ProbeStage::Greeting).await?;
    *reached_server = true;

    let result = converse(&mut session, machine, banner).await;
    match &result {
        Err(err) if err.is_connection_lost() => {}
        _ => session.quit().await,
    }
    result
}

async fn converse(
    session: &mut SmtpSession<'_>,
    machine: &mut ProbeMachine,
    banner: SmtpReply,
) -> Result<Existence, SmtpVerifyError> {
    let mut reply = banner;
    loop {
        match machine.on_reply(&reply) {
            Action::Send(command) => {
                let stage = machine.state().stage();
                reply = session.send_command(&command, stage).await?;
            }
            Action::Finish(existence) => return Ok(existence),
        }
    }
}

/// Only a raw server line can carry a verdict: read as a RCPT reply while
/// the candidate is pending, through the mailbox markers before that.
fn existence_from_error(err: &SmtpVerifyError, state: ProbeState) -> Existence {
    match (err, state) {
        (SmtpVerifyError::Protocol { line, .. }, ProbeState::RecipientSent) => classify_text(line),
        (
            SmtpVerifyError::Protocol { line, .. },
            ProbeState::Connected | ProbeState::Greeted | ProbeState::EnvelopeSent,
        ) if mentions_unknown_mailbox(line) => Existence::DoesNotExist,
        (other, _) => Existence::indeterminate(other.to_string()),
    }
}
