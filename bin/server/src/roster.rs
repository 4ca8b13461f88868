//! File-backed tenant roster source.
//!
//! The property-management export lands on disk as a JSON array of tenant
//! records, ledgers included. Every `fetch_all` re-reads the file, so
//! dropping in a new export and hitting `/admin/refresh` is the whole
//! update procedure.

use async_trait::async_trait;
use parkline_directory::{DirectoryError, DirectorySource, LedgerEntry, TenantRecord};
use std::path::PathBuf;

/// A [`DirectorySource`] reading a JSON roster file.
#[derive(Debug, Clone)]
pub struct JsonRosterSource {
    path: PathBuf,
}

impl JsonRosterSource {
    /// Creates a source reading from the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_records(&self) -> Result<Vec<TenantRecord>, DirectoryError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DirectoryError::SourceUnavailable {
                reason: format!("{}: {e}", self.path.display()),
            }
        })?;
        serde_json::from_str(&raw).map_err(|e| DirectoryError::SourceUnavailable {
            reason: format!("{}: {e}", self.path.display()),
        })
    }
}

#[async_trait]
impl DirectorySource for JsonRosterSource {
    async fn fetch_all(&self) -> Result<Vec<TenantRecord>, DirectoryError> {
        self.read_records().await
    }

    async fn fetch_ledger(&self, external_id: &str) -> Result<Vec<LedgerEntry>, DirectoryError> {
        let records = self
            .read_records()
            .await
            .map_err(|e| DirectoryError::LedgerUnavailable {
                external_id: external_id.to_string(),
                reason: e.to_string(),
            })?;
        let record = records
            .into_iter()
            .find(|r| r.identity.external_id == external_id)
            .ok_or_else(|| DirectoryError::LedgerUnavailable {
                external_id: external_id.to_string(),
                reason: "tenant not present in roster file".to_string(),
            })?;
        Ok(record.ledger.unwrap_or_default())
    }
}
