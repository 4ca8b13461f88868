//! Conversation session model.
//!
//! A session tracks one phone number's conversation: identification
//! progress, the language pinned from the first message, idle-timeout
//! bookkeeping, and a bounded history ring used as context for reply
//! generation (never as an audit log).

use crate::error::SessionError;
use chrono::{DateTime, Duration, Utc};
use parkline_directory::TenantIdentity;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of history entries kept per session.
pub const HISTORY_CAPACITY: usize = 5;

/// The phase of a conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Sender has not yet been resolved to a tenant.
    AwaitingIdentification,
    /// Tenant bound; conversation in progress.
    Active,
    /// Idle past the first threshold; one more silence closes it.
    PendingClose,
}

impl SessionPhase {
    /// Returns true once a tenant identity is bound.
    #[must_use]
    pub fn is_identified(&self) -> bool {
        !matches!(self, Self::AwaitingIdentification)
    }
}

/// The pinned reply language for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Spanish,
}

/// Who said a history line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// One line of conversational context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
}

/// Fixed-capacity history ring; oldest entries are dropped first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    /// Appends an entry, evicting the oldest when at capacity.
    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        if self.entries.len() == HISTORY_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            role,
            text: text.into(),
        });
    }

    /// Iterates entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clears all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A conversation session keyed by sender phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Sender address (phone number) this session belongs to.
    pub sender: String,
    /// Current phase.
    pub phase: SessionPhase,
    /// Bound tenant, present once identified.
    pub tenant: Option<TenantIdentity>,
    /// Language pinned from the first inbound message; immutable.
    pub language: Language,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the last inbound message arrived.
    pub last_message_at: DateTime<Utc>,
    /// When the still-there prompt was sent, if one is outstanding.
    pub pending_close_at: Option<DateTime<Utc>>,
    /// The message that triggered identification, replayed on success.
    pub pending_message: Option<String>,
    /// Bounded conversational context.
    pub history: History,
}

impl ConversationSession {
    /// Creates a session in the identification phase.
    #[must_use]
    pub fn new(sender: impl Into<String>, language: Language, now: DateTime<Utc>) -> Self {
        Self {
            sender: sender.into(),
            phase: SessionPhase::AwaitingIdentification,
            tenant: None,
            language,
            created_at: now,
            last_message_at: now,
            pending_close_at: None,
            pending_message: None,
            history: History::default(),
        }
    }

    /// Records the message that triggered identification.
    pub fn hold_pending_message(&mut self, text: impl Into<String>) {
        self.pending_message = Some(text.into());
    }

    /// Takes the held pending message, leaving none.
    pub fn take_pending_message(&mut self) -> Option<String> {
        self.pending_message.take()
    }

    /// Binds a resolved tenant and activates the session.
    pub fn bind_tenant(&mut self, tenant: TenantIdentity) {
        self.tenant = Some(tenant);
        self.phase = SessionPhase::Active;
    }

    /// Registers an inbound message: refreshes the idle clock and cancels
    /// any pending close.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_message_at = now;
        self.pending_close_at = None;
        if self.phase == SessionPhase::PendingClose {
            self.phase = SessionPhase::Active;
        }
    }

    /// Marks the session pending-close after the still-there prompt.
    pub fn mark_pending_close(&mut self, now: DateTime<Utc>) {
        self.phase = SessionPhase::PendingClose;
        self.pending_close_at = Some(now);
    }

    /// Idle time since the last inbound message.
    #[must_use]
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_message_at
    }

    /// Forces the session back to identification, dropping bound state.
    ///
    /// Used when a session is older than the staleness bound (a restart
    /// may have lost the sweeper's cadence) or fails validation on load.
    pub fn force_reset(&mut self, now: DateTime<Utc>) {
        self.phase = SessionPhase::AwaitingIdentification;
        self.tenant = None;
        self.pending_close_at = None;
        self.pending_message = None;
        self.history.clear();
        self.created_at = now;
        self.last_message_at = now;
    }

    /// Checks internal consistency, e.g. after loading persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Corrupt`] naming the first inconsistency.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.sender.trim().is_empty() {
            return Err(SessionError::Corrupt {
                sender: self.sender.clone(),
                reason: "empty sender address".to_string(),
            });
        }
        if self.phase.is_identified() && self.tenant.is_none() {
            return Err(SessionError::Corrupt {
                sender: self.sender.clone(),
                reason: "identified phase without a bound tenant".to_string(),
            });
        }
        if self.phase == SessionPhase::PendingClose && self.pending_close_at.is_none() {
            return Err(SessionError::Corrupt {
                sender: self.sender.clone(),
                reason: "pending close without a marker timestamp".to_string(),
            });
        }
        if self.last_message_at < self.created_at {
            return Err(SessionError::Corrupt {
                sender: self.sender.clone(),
                reason: "last message precedes creation".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ConversationSession {
        ConversationSession::new("+15550001111", Language::English, Utc::now())
    }

    #[test]
    fn new_session_awaits_identification() {
        let s = session();
        assert_eq!(s.phase, SessionPhase::AwaitingIdentification);
        assert!(s.tenant.is_none());
        assert!(!s.phase.is_identified());
    }

    #[test]
    fn bind_tenant_activates() {
        let mut s = session();
        s.bind_tenant(TenantIdentity::new("t-1", "Clara", "Lopez", "02"));
        assert_eq!(s.phase, SessionPhase::Active);
        assert!(s.phase.is_identified());
    }

    #[test]
    fn touch_cancels_pending_close() {
        let mut s = session();
        s.bind_tenant(TenantIdentity::new("t-1", "Clara", "Lopez", "02"));
        let now = Utc::now();
        s.mark_pending_close(now);
        assert_eq!(s.phase, SessionPhase::PendingClose);
        assert!(s.pending_close_at.is_some());

        s.touch(now + Duration::seconds(30));
        assert_eq!(s.phase, SessionPhase::Active);
        assert!(s.pending_close_at.is_none());
    }

    #[test]
    fn history_caps_at_five_preserving_order() {
        let mut h = History::default();
        for i in 0..6 {
            h.push(Role::User, format!("msg {i}"));
        }
        assert_eq!(h.len(), 5);
        let texts: Vec<&str> = h.entries().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["msg 1", "msg 2", "msg 3", "msg 4", "msg 5"]);
    }

    #[test]
    fn force_reset_drops_bound_state() {
        let mut s = session();
        s.bind_tenant(TenantIdentity::new("t-1", "Clara", "Lopez", "02"));
        s.history.push(Role::User, "hello");
        s.hold_pending_message("my pipe is leaking");

        s.force_reset(Utc::now());
        assert_eq!(s.phase, SessionPhase::AwaitingIdentification);
        assert!(s.tenant.is_none());
        assert!(s.pending_message.is_none());
        assert!(s.history.is_empty());
    }

    #[test]
    fn validate_rejects_identified_without_tenant() {
        let mut s = session();
        s.phase = SessionPhase::Active;
        assert!(matches!(
            s.validate(),
            Err(SessionError::Corrupt { .. })
        ));
    }

    #[test]
    fn validate_rejects_pending_close_without_marker() {
        let mut s = session();
        s.bind_tenant(TenantIdentity::new("t-1", "Clara", "Lopez", "02"));
        s.phase = SessionPhase::PendingClose;
        assert!(s.validate().is_err());
    }

    #[test]
    fn session_serde_roundtrip() {
        let mut s = session();
        s.bind_tenant(TenantIdentity::new("t-1", "Clara", "Lopez", "02"));
        s.history.push(Role::User, "hola");
        s.history.push(Role::Bot, "¿en qué puedo ayudarle?");

        let json = serde_json::to_string(&s).expect("serialize");
        let parsed: ConversationSession = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(s, parsed);
    }
}
