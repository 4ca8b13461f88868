//! Conversation sessions for the parkline concierge.
//!
//! This crate provides:
//!
//! - **Session model**: Phase state machine, pinned language, bounded history
//! - **Session store**: Concurrency-safe map with per-sender serialization
//! - **Intent classification**: Maintenance/financial/end-of-conversation
//! - **Persistence**: Optional save/load of the session map across restarts

pub mod error;
pub mod intent;
pub mod persist;
pub mod session;
pub mod store;

pub use error::SessionError;
pub use intent::{classify, detect_language, is_greeting_only, Intent};
pub use persist::{JsonFileSessions, SessionPersistence};
pub use session::{ConversationSession, History, HistoryEntry, Language, Role, SessionPhase};
pub use store::SessionStore;
