use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::smtp_verify::error::SmtpVerifyError;
use crate::smtp_verify::types::{ProbeStage, SmtpReply};

const QUIT_GRACE: Duration = Duration::from_secs(1);

/// Runs `fut` under `limit`, or unbounded when `limit` is `None`.
pub(crate) async fn within<F, T>(
    limit: Option<Duration>,
    stage: ProbeStage,
    fut: F,
) -> Result<T, SmtpVerifyError>
where
    F: Future<Output = Result<T, SmtpVerifyError>>,
{
    match limit {
        Some(limit) => timeout(limit, fut)
            .await
            .map_err(|_| SmtpVerifyError::Timeout { stage })?,
        None => fut.await,
    }
}

/// One SMTP connection. The socket is closed when the session is dropped,
/// whichever way the probe ends.
pub struct SmtpSession<'t> {
    host: String,
    reader: BufReader<TcpStream>,
    command_timeout: Option<Duration>,
    transcript: &'t mut Vec<String>,
}

impl<'t> SmtpSession<'t> {
    pub async fn connect(
        host: &str,
        port: u16,
        connect_timeout: Option<Duration>,
        command_timeout: Option<Duration>,
        transcript: &'t mut Vec<String>,
    ) -> Result<Self, SmtpVerifyError> {
        let connect = async {
            TcpStream::connect((host, port))
                .await
                .map_err(|source| SmtpVerifyError::Connect {
                    host: format!("{host}:{port}"),
                    source,
                })
        };
        let stream = within(connect_timeout, ProbeStage::Connect, connect).await?;
        debug!(host, port, "SMTP connection established");
        Ok(Self {
            host: host.to_string(),
            reader: BufReader::new(stream),
            command_timeout,
            transcript,
        })
    }

    pub fn record(&mut self, direction: &str, message: &str) {
        self.transcript
            .push(format!("[{}] {direction}: {message}", self.host));
    }

    pub async fn read_reply(&mut self, stage: ProbeStage) -> Result<SmtpReply, SmtpVerifyError> {
        let limit = self.command_timeout;
        let reply = within(limit, stage, self.read_reply_inner(stage)).await?;
        self.record_reply(&reply);
        Ok(reply)
    }

    pub async fn send_command(
        &mut self,
        command: &str,
        stage: ProbeStage,
    ) -> Result<SmtpReply, SmtpVerifyError> {
        self.record("C", command);
        debug!(host = %self.host, %stage, command, "SMTP >");
        let mut data = command.as_bytes().to_vec();
        data.extend_from_slice(b"\r\n");
        let limit = self.command_timeout;
        let stream = self.reader.get_mut();
        within(limit, stage, async {
            stream.write_all(&data).await.map_err(SmtpVerifyError::io)?;
            stream.flush().await.map_err(SmtpVerifyError::io)
        })
        .await?;
        let reply = self.read_reply(stage).await?;
        debug!(host = %self.host, %stage, code = reply.code, "SMTP <");
        Ok(reply)
    }

    /// Best effort: a server that hangs on `QUIT` does not hold the probe.
    pub async fn quit(&mut self) {
        self.record("C", "QUIT");
        let stream = self.reader.get_mut();
        let sent = timeout(QUIT_GRACE, async {
            stream.write_all(b"QUIT\r\n").await?;
            stream.flush().await
        })
        .await;
        if !matches!(sent, Ok(Ok(()))) {
            return;
        }
        if let Ok(Ok(reply)) = timeout(QUIT_GRACE, self.read_reply_inner(ProbeStage::Quit)).await {
            self.record_reply(&reply);
        }
    }

    async fn read_reply_inner(&mut self, stage: ProbeStage) -> Result<SmtpReply, SmtpVerifyError> {
        let mut lines = Vec::new();
        let mut code: Option<u16> = None;
        loop {
            let line = self.read_line(stage).await?;
            let Some(parsed_code) = line.get(..3).and_then(|prefix| prefix.parse::<u16>().ok())
            else {
                return Err(SmtpVerifyError::Protocol { stage, line });
            };
            if let Some(existing) = code {
                if existing != parsed_code {
                    return Err(SmtpVerifyError::MixedCodes {
                        stage,
                        first: existing,
                        second: parsed_code,
                    });
                }
            } else {
                code = Some(parsed_code);
            }
            let is_last = line.as_bytes().get(3) != Some(&b'-');
            let text = line.get(4..).unwrap_or_default().to_string();
            lines.push(text);
            if is_last {
                break;
            }
        }
        Ok(SmtpReply {
            code: code.unwrap_or(0),
            lines,
        })
    }

    async fn read_line(&mut self, stage: ProbeStage) -> Result<String, SmtpVerifyError> {
        let mut buf = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(SmtpVerifyError::io)?;
        if read == 0 {
            return Err(SmtpVerifyError::Closed { stage });
        }
        if buf.ends_with(b"\r\n") {
            buf.truncate(buf.len() - 2);
        } else if buf.ends_with(b"\n") {
            buf.truncate(buf.len() - 1);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn record_reply(&mut self, reply: &SmtpReply) {
        if reply.lines.is_empty() {
            self.record("S", &format!("{}", reply.code));
        } else {
            for line in &reply.lines {
                self.record("S", &format!("{} {}", reply.code, line));
            }
        }
    }
}
