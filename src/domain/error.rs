use thiserror::Error;

/// Terminal failure of one search or revoke request.
///
/// The `Display` output is shown to the operator verbatim. A search that was
/// superseded by a newer one is not a failure and never produces this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestFailure {
    #[error("timeout")]
    Timeout,
    #[error("{0}")]
    Transport(String),
    #[error("{status} {reason}")]
    Status { status: u16, reason: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{0}")]
    Rejected(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RequestFailure {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}
