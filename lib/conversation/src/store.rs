//! Session store with per-sender serialization.
//!
//! The store maps sender addresses to locked slots. Handlers and the idle
//! sweeper lock a slot for the full duration of a state transition, which
//! gives the at-most-one-in-flight-transition-per-sender guarantee.
//! Different senders proceed fully in parallel.
//!
//! A closed session leaves its slot empty rather than removing the map
//! entry outright; [`SessionStore::prune`] later drops empty slots that no
//! task still holds, so a handler awaiting a slot lock can never end up
//! mutating a reaped slot unseen.

use crate::session::ConversationSession;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// A lockable per-sender slot; `None` means no live session.
pub type SessionSlot = Arc<Mutex<Option<ConversationSession>>>;

/// Concurrency-safe keyed collection of conversation sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    slots: RwLock<HashMap<String, SessionSlot>>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for a sender, creating an empty one if absent.
    ///
    /// The caller locks the returned slot to read or mutate the session.
    #[must_use]
    pub fn slot(&self, sender: &str) -> SessionSlot {
        if let Some(slot) = self.slots.read().unwrap().get(sender) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().unwrap();
        Arc::clone(
            slots
                .entry(sender.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(None))),
        )
    }

    /// Returns the slot for a sender only if one already exists.
    #[must_use]
    pub fn peek(&self, sender: &str) -> Option<SessionSlot> {
        self.slots.read().unwrap().get(sender).map(Arc::clone)
    }

    /// Snapshot of all sender addresses currently holding a slot.
    #[must_use]
    pub fn senders(&self) -> Vec<String> {
        self.slots.read().unwrap().keys().cloned().collect()
    }

    /// Number of slots (live and recently closed).
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().unwrap().len()
    }

    /// Returns true when no slots exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.read().unwrap().is_empty()
    }

    /// Drops empty slots that no other task is holding.
    ///
    /// A slot is removed only when this store owns the sole Arc reference
    /// and the slot is lockable and empty, so nobody awaiting the lock can
    /// lose a session they are about to create.
    pub fn prune(&self) -> usize {
        let mut slots = self.slots.write().unwrap();
        let before = slots.len();
        slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(guard) => guard.is_some(),
                Err(_) => true,
            }
        });
        before - slots.len()
    }

    /// Collects a copy of every live session, for persistence.
    pub async fn export(&self) -> Vec<ConversationSession> {
        let slots: Vec<SessionSlot> = {
            self.slots.read().unwrap().values().map(Arc::clone).collect()
        };
        let mut sessions = Vec::with_capacity(slots.len());
        for slot in slots {
            if let Some(session) = slot.lock().await.as_ref() {
                sessions.push(session.clone());
            }
        }
        sessions
    }

    /// Inserts sessions wholesale, e.g. after loading persisted state.
    ///
    /// Existing slots for the same sender are overwritten.
    pub async fn restore(&self, sessions: Vec<ConversationSession>) {
        for session in sessions {
            let slot = self.slot(&session.sender);
            *slot.lock().await = Some(session);
        }
    }
}
