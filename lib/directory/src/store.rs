//! Directory store with atomic snapshot replacement.
//!
//! The roster is refreshed wholesale: a successful fetch builds a brand-new
//! snapshot and swaps it in, so a resolution in progress never observes a
//! half-updated directory. A failed refresh leaves the prior snapshot in
//! place.

use crate::error::DirectoryError;
use crate::tenant::{LedgerEntry, TenantIdentity, TenantRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// External roster source.
///
/// Implemented against the property-management system; parkline only sees
/// the records, never the wire format.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Fetches the complete tenant roster.
    async fn fetch_all(&self) -> Result<Vec<TenantRecord>, DirectoryError>;

    /// Fetches the transaction ledger for one tenant.
    async fn fetch_ledger(&self, external_id: &str) -> Result<Vec<LedgerEntry>, DirectoryError>;
}

/// A complete, immutable point-in-time view of the roster.
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    records: Arc<HashMap<TenantIdentity, TenantRecord>>,
}

impl DirectorySnapshot {
    /// Builds a snapshot from records, rejecting duplicate external ids.
    pub fn from_records(records: Vec<TenantRecord>) -> Result<Self, DirectoryError> {
        let mut seen = HashMap::with_capacity(records.len());
        let mut map = HashMap::with_capacity(records.len());
        for record in records {
            let external_id = record.identity.external_id.clone();
            if seen.insert(external_id.clone(), ()).is_some() {
                return Err(DirectoryError::DuplicateExternalId { external_id });
            }
            map.insert(record.identity.clone(), record);
        }
        Ok(Self {
            records: Arc::new(map),
        })
    }

    /// Looks up a record by identity.
    #[must_use]
    pub fn get(&self, identity: &TenantIdentity) -> Option<&TenantRecord> {
        self.records.get(identity)
    }

    /// Iterates all records.
    pub fn records(&self) -> impl Iterator<Item = &TenantRecord> {
        self.records.values()
    }

    /// Number of tenants in this snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the snapshot holds no tenants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Shared directory state: the current snapshot plus a ledger cache.
///
/// Single-writer/atomic-swap/many-reader: readers clone the snapshot Arc and
/// work off it without further locking. The ledger cache is filled at most
/// once per tenant per refresh cycle; concurrent first requests for the same
/// tenant may duplicate one external fetch rather than serialize behind it.
#[derive(Debug, Default)]
pub struct DirectoryStore {
    snapshot: RwLock<DirectorySnapshot>,
    ledgers: RwLock<HashMap<String, Arc<Vec<LedgerEntry>>>>,
}

impl DirectoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> DirectorySnapshot {
        self.snapshot.read().unwrap().clone()
    }

    /// Refreshes the roster from the source, replacing the snapshot wholesale.
    ///
    /// Returns the number of tenants in the new snapshot. On any failure the
    /// prior snapshot stays in place, including when a previously non-empty
    /// roster suddenly comes back empty.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::SourceUnavailable`] when the source fails or
    /// returns an implausibly empty roster, and
    /// [`DirectoryError::DuplicateExternalId`] when the fetched roster
    /// violates id uniqueness.
    pub async fn refresh(&self, source: &dyn DirectorySource) -> Result<usize, DirectoryError> {
        let records = source.fetch_all().await?;

        if records.is_empty() && !self.snapshot().is_empty() {
            return Err(DirectoryError::SourceUnavailable {
                reason: "source returned an empty roster".to_string(),
            });
        }

        let next = DirectorySnapshot::from_records(records)?;
        let count = next.len();

        {
            let mut snapshot = self.snapshot.write().unwrap();
            *snapshot = next;
        }
        self.ledgers.write().unwrap().clear();

        tracing::info!(tenants = count, "directory snapshot replaced");
        Ok(count)
    }

    /// Returns the ledger for a tenant, fetching it on first request.
    ///
    /// The fetch happens without holding the cache lock, so two simultaneous
    /// first requests may both hit the source; the second insert wins and
    /// both callers get a complete ledger.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::LedgerUnavailable`] when the source fails.
    pub async fn ledger(
        &self,
        external_id: &str,
        source: &dyn DirectorySource,
    ) -> Result<Arc<Vec<LedgerEntry>>, DirectoryError> {
        if let Some(cached) = self.ledgers.read().unwrap().get(external_id) {
            return Ok(Arc::clone(cached));
        }

        let fetched = Arc::new(source.fetch_ledger(external_id).await?);
        self.ledgers
            .write()
            .unwrap()
            .insert(external_id.to_string(), Arc::clone(&fetched));
        Ok(fetched)
    }
}
