//! Inbound voice call logging.
//!
//! The concierge is text-only; calls are logged so the park owner can see
//! who tried to phone, and the caller is told to text instead.

use crate::error::EngineError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkline_core::CallLogId;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// One logged inbound call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Call id.
    pub id: CallLogId,
    /// Caller phone number.
    pub caller: String,
    /// When the call arrived.
    pub received_at: DateTime<Utc>,
}

impl CallRecord {
    /// Creates a record with a fresh id.
    #[must_use]
    pub fn new(caller: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        Self {
            id: CallLogId::new(),
            caller: caller.into(),
            received_at,
        }
    }
}

/// Sink for call records.
#[async_trait]
pub trait CallLog: Send + Sync {
    /// Records one inbound call.
    async fn record_call(&self, record: &CallRecord) -> Result<(), EngineError>;
}

/// Process-local call log.
#[derive(Debug, Default)]
pub struct InMemoryCallLog {
    entries: RwLock<Vec<CallRecord>>,
}

impl InMemoryCallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<CallRecord> {
        self.entries.read().unwrap().clone()
    }
}

#[async_trait]
impl CallLog for InMemoryCallLog {
    async fn record_call(&self, record: &CallRecord) -> Result<(), EngineError> {
        tracing::info!(id = %record.id, caller = %record.caller, "inbound call logged");
        self.entries.write().unwrap().push(record.clone());
        Ok(())
    }
}
