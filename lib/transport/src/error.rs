//! Error types for message transport.

use std::fmt;

/// Errors from sending outbound messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The delivery API rejected or never received the message.
    SendFailed { reason: String },
    /// The send exceeded its deadline.
    Timeout,
    /// Too many messages to this recipient in the current window.
    RateLimited { retry_after_secs: i64 },
    /// Recipient address is not usable.
    InvalidAddress { address: String },
    /// Transport configuration is unusable.
    InvalidConfig { reason: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed { reason } => write!(f, "message send failed: {reason}"),
            Self::Timeout => write!(f, "message send timed out"),
            Self::RateLimited { retry_after_secs } => {
                write!(f, "rate limited, retry after {retry_after_secs}s")
            }
            Self::InvalidAddress { address } => {
                write!(f, "invalid recipient address: {address}")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid transport configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for TransportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_failed_display() {
        let err = TransportError::SendFailed {
            reason: "HTTP 401".to_string(),
        };
        assert!(err.to_string().contains("HTTP 401"));
    }
}
