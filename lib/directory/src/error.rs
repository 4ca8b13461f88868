//! Error types for the directory crate.

use std::fmt;

/// Errors from directory operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The external roster source could not be reached or returned garbage.
    SourceUnavailable { reason: String },
    /// Two roster records share an external id within one fetch.
    DuplicateExternalId { external_id: String },
    /// The ledger for a tenant could not be fetched.
    LedgerUnavailable { external_id: String, reason: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable { reason } => {
                write!(f, "directory source unavailable: {reason}")
            }
            Self::DuplicateExternalId { external_id } => {
                write!(f, "duplicate external id in roster: {external_id}")
            }
            Self::LedgerUnavailable {
                external_id,
                reason,
            } => {
                write!(f, "ledger unavailable for tenant {external_id}: {reason}")
            }
        }
    }
}

impl std::error::Error for DirectoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_unavailable_display() {
        let err = DirectoryError::SourceUnavailable {
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn duplicate_external_id_display() {
        let err = DirectoryError::DuplicateExternalId {
            external_id: "t-42".to_string(),
        };
        assert!(err.to_string().contains("t-42"));
    }
}
