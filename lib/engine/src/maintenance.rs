//! Maintenance request logging.

use crate::error::EngineError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkline_core::MaintenanceRequestId;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// One logged maintenance issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    /// Request id.
    pub id: MaintenanceRequestId,
    /// Phone number the report came from.
    pub sender: String,
    /// Tenant display name.
    pub tenant_name: String,
    /// Unit/lot label.
    pub unit: String,
    /// The tenant's message, verbatim.
    pub issue: String,
    /// When the report arrived.
    pub reported_at: DateTime<Utc>,
}

impl MaintenanceRequest {
    /// Creates a request with a fresh id.
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        tenant_name: impl Into<String>,
        unit: impl Into<String>,
        issue: impl Into<String>,
        reported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MaintenanceRequestId::new(),
            sender: sender.into(),
            tenant_name: tenant_name.into(),
            unit: unit.into(),
            issue: issue.into(),
            reported_at,
        }
    }

    /// One-line summary for the owner notification.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Maintenance from {} (lot {}): {}",
            self.tenant_name, self.unit, self.issue
        )
    }
}

/// Sink for maintenance requests.
#[async_trait]
pub trait MaintenanceLog: Send + Sync {
    /// Records one request.
    async fn record(&self, request: &MaintenanceRequest) -> Result<(), EngineError>;
}

/// Process-local maintenance log.
#[derive(Debug, Default)]
pub struct InMemoryMaintenanceLog {
    entries: RwLock<Vec<MaintenanceRequest>>,
}

impl InMemoryMaintenanceLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<MaintenanceRequest> {
        self.entries.read().unwrap().clone()
    }
}

#[async_trait]
impl MaintenanceLog for InMemoryMaintenanceLog {
    async fn record(&self, request: &MaintenanceRequest) -> Result<(), EngineError> {
        tracing::info!(id = %request.id, unit = %request.unit, "maintenance request logged");
        self.entries.write().unwrap().push(request.clone());
        Ok(())
    }
}
