use thiserror::Error;

use super::types::ProbeStage;

#[derive(Debug, Error)]
pub enum SmtpVerifyError {
    #[error("connection to {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("timed out during {stage}")]
    Timeout { stage: ProbeStage },
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
    #[error("connection closed by server during {stage}")]
    Closed { stage: ProbeStage },
    /// A server line that is not an SMTP reply. `line` is the raw text.
    #[error("malformed reply during {stage}: {line}")]
    Protocol { stage: ProbeStage, line: String },
    #[error("inconsistent reply codes during {stage}: {first} vs {second}")]
    MixedCodes {
        stage: ProbeStage,
        first: u16,
        second: u16,
    },
}

impl SmtpVerifyError {
    pub(crate) fn io(source: std::io::Error) -> Self {
        Self::Io { source }
    }

    /// The socket can no longer carry a `QUIT`.
    pub(crate) fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Closed { .. } | Self::Connect { .. })
    }
}
