//! Optional session persistence across process restarts.
//!
//! Correctness never depends on this: any session that does not survive a
//! restart is recreated as awaiting-identification on the next message.
//! On load, a session is either fully reconstructible or discarded; never
//! partially restored.

use crate::error::SessionError;
use crate::session::ConversationSession;
use async_trait::async_trait;
use std::path::PathBuf;

/// Durability collaborator for the session map.
#[async_trait]
pub trait SessionPersistence: Send + Sync {
    /// Saves a snapshot of every live session.
    async fn save(&self, sessions: &[ConversationSession]) -> Result<(), SessionError>;

    /// Loads previously saved sessions, dropping any that fail validation.
    async fn load(&self) -> Result<Vec<ConversationSession>, SessionError>;
}

/// JSON-file-backed persistence.
#[derive(Debug, Clone)]
pub struct JsonFileSessions {
    path: PathBuf,
}

impl JsonFileSessions {
    /// Creates a store writing to the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionPersistence for JsonFileSessions {
    async fn save(&self, sessions: &[ConversationSession]) -> Result<(), SessionError> {
        let json =
            serde_json::to_string_pretty(sessions).map_err(|e| SessionError::PersistenceFailed {
                reason: e.to_string(),
            })?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| SessionError::PersistenceFailed {
                reason: e.to_string(),
            })
    }

    async fn load(&self) -> Result<Vec<ConversationSession>, SessionError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SessionError::PersistenceFailed {
                    reason: e.to_string(),
                })
            }
        };

        let sessions: Vec<ConversationSession> =
            serde_json::from_str(&raw).map_err(|e| SessionError::PersistenceFailed {
                reason: e.to_string(),
            })?;

        let mut valid = Vec::with_capacity(sessions.len());
        for session in sessions {
            match session.validate() {
                Ok(()) => valid.push(session),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding invalid persisted session");
                }
            }
        }
        Ok(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Language, SessionPhase};
    use chrono::Utc;

    fn session(sender: &str) -> ConversationSession {
        ConversationSession::new(sender, Language::English, Utc::now())
    }

    #[tokio::test]
    async fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileSessions::new(dir.path().join("sessions.json"));

        let sessions = vec![session("+15550001111"), session("+15550002222")];
        store.save(&sessions).await.expect("save");

        let loaded = store.load().await.expect("load");
        assert_eq!(loaded, sessions);
    }

    #[tokio::test]
    async fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileSessions::new(dir.path().join("absent.json"));
        assert!(store.load().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn load_discards_invalid_sessions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileSessions::new(dir.path().join("sessions.json"));

        let mut corrupt = session("+15550001111");
        corrupt.phase = SessionPhase::Active; // identified but no tenant
        let good = session("+15550002222");
        store.save(&[corrupt, good.clone()]).await.expect("save");

        let loaded = store.load().await.expect("load");
        assert_eq!(loaded, vec![good]);
    }

    #[tokio::test]
    async fn load_garbage_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sessions.json");
        tokio::fs::write(&path, "not json").await.expect("write");

        let store = JsonFileSessions::new(path);
        assert!(matches!(
            store.load().await,
            Err(SessionError::PersistenceFailed { .. })
        ));
    }
}
