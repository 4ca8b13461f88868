//! Error types for the conversation engine.

use parkline_directory::DirectoryError;
use parkline_transport::TransportError;
use std::fmt;

/// Errors surfaced by engine operations.
///
/// Most collaborator failures are absorbed inside the engine (fallback
/// replies, logged notification failures); what escapes here is what the
/// webhook layer should know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Outbound delivery failed after state already advanced.
    Transport(TransportError),
    /// Directory refresh or lookup failed.
    Directory(DirectoryError),
    /// The inbound message had no usable sender address.
    MissingSender,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Directory(e) => write!(f, "directory: {e}"),
            Self::MissingSender => write!(f, "inbound message has no sender address"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Directory(e) => Some(e),
            Self::MissingSender => None,
        }
    }
}

impl From<TransportError> for EngineError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<DirectoryError> for EngineError {
    fn from(e: DirectoryError) -> Self {
        Self::Directory(e)
    }
}
