//! The generation seam between the engine and the model backend.

use crate::error::GenerationError;
use async_trait::async_trait;
use parkline_conversation::{HistoryEntry, Intent, Language};
use parkline_directory::{LedgerEntry, TenantRecord};

/// Everything a backend needs to compose one reply.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The tenant's message, verbatim.
    pub query: String,
    /// The tenant this conversation is bound to.
    pub tenant: TenantRecord,
    /// Transaction ledger, present only when the question is financial.
    pub ledger: Option<Vec<LedgerEntry>>,
    /// Language the reply must be written in.
    pub language: Language,
    /// Recent conversation context, oldest first.
    pub history: Vec<HistoryEntry>,
    /// What the classifier thinks the message is asking for.
    pub intent: Intent,
}

impl GenerationRequest {
    /// Creates a request with no ledger or history.
    #[must_use]
    pub fn new(query: impl Into<String>, tenant: TenantRecord, language: Language) -> Self {
        Self {
            query: query.into(),
            tenant,
            ledger: None,
            language,
            history: Vec::new(),
            intent: Intent::General,
        }
    }

    /// Attaches the transaction ledger.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Vec<LedgerEntry>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Attaches conversation history, oldest first.
    #[must_use]
    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = history;
        self
    }

    /// Records the classified intent.
    #[must_use]
    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = intent;
        self
    }
}

/// Trait for reply generation backends.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Composes one reply to the tenant's message.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot produce a reply; the caller
    /// decides whether to fall back to a templated answer.
    async fn generate_reply(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
