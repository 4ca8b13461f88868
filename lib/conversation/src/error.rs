//! Error types for the conversation crate.

use std::fmt;

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A session's stored state no longer makes sense.
    Corrupt { sender: String, reason: String },
    /// Saving or loading the session map failed.
    PersistenceFailed { reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupt { sender, reason } => {
                write!(f, "corrupt session for {sender}: {reason}")
            }
            Self::PersistenceFailed { reason } => {
                write!(f, "session persistence failed: {reason}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_display() {
        let err = SessionError::Corrupt {
            sender: "+15550001111".to_string(),
            reason: "identified without tenant".to_string(),
        };
        assert!(err.to_string().contains("+15550001111"));
        assert!(err.to_string().contains("identified without tenant"));
    }
}
