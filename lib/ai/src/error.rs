//! Error types for reply generation.

use std::fmt;

/// Errors from reply generation backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The HTTP request to the backend failed.
    RequestFailed { reason: String },
    /// The backend answered, but not in the expected shape.
    ResponseParseFailed { reason: String },
    /// An attempt exceeded its per-attempt deadline.
    Timeout,
    /// Backend configuration is unusable; retrying cannot help.
    InvalidConfig { reason: String },
    /// Every retry attempt failed; carries the last error.
    RetryExhausted {
        attempts: u32,
        last: Box<GenerationError>,
    },
}

impl GenerationError {
    /// Whether another attempt could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidConfig { .. } | Self::RetryExhausted { .. }
        )
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => {
                write!(f, "generation request failed: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse generation response: {reason}")
            }
            Self::Timeout => write!(f, "generation request timed out"),
            Self::InvalidConfig { reason } => {
                write!(f, "invalid generation configuration: {reason}")
            }
            Self::RetryExhausted { attempts, last } => {
                write!(f, "generation failed after {attempts} attempts: {last}")
            }
        }
    }
}

impl std::error::Error for GenerationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability() {
        assert!(GenerationError::Timeout.is_retryable());
        assert!(GenerationError::RequestFailed {
            reason: "503".to_string()
        }
        .is_retryable());
        assert!(!GenerationError::InvalidConfig {
            reason: "missing api key".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn retry_exhausted_display_names_last_error() {
        let err = GenerationError::RetryExhausted {
            attempts: 3,
            last: Box::new(GenerationError::Timeout),
        };
        let text = err.to_string();
        assert!(text.contains("3 attempts"));
        assert!(text.contains("timed out"));
    }
}
