//! Rent reminder broadcast.
//!
//! Walks the current roster and texts every tenant carrying a positive
//! balance, on every phone number on file. One bad number never stops the
//! rest of the run.

use parkline_directory::{DirectoryStore, TenantRecord};
use parkline_transport::Transport;

/// Outcome of one reminder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderReport {
    /// Tenants with a positive balance.
    pub tenants: usize,
    /// Messages accepted for delivery.
    pub sent: usize,
    /// Sends that failed.
    pub failed: usize,
}

/// Composes the bilingual reminder for one tenant.
#[must_use]
fn reminder_body(record: &TenantRecord) -> String {
    format!(
        "Friendly reminder from {park}: your balance is {balance}, due on \
         the {due}. / Recordatorio de {park}: su saldo es {balance}, vence \
         el {due}.",
        park = if record.park.name.is_empty() {
            "the park office"
        } else {
            &record.park.name
        },
        balance = record.balance,
        due = record.due_date,
    )
}

/// Sends reminders to every tenant owing money.
pub async fn send_rent_reminders(
    directory: &DirectoryStore,
    transport: &dyn Transport,
) -> ReminderReport {
    let snapshot = directory.snapshot();
    let mut report = ReminderReport::default();

    for record in snapshot.records() {
        if !record.balance_is_positive() {
            continue;
        }
        report.tenants += 1;
        let body = reminder_body(record);
        for phone in &record.phones {
            match transport.send_message(phone, &body).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        tenant = %record.identity.external_id,
                        phone,
                        error = %e,
                        "rent reminder failed"
                    );
                }
            }
        }
    }

    tracing::info!(
        tenants = report.tenants,
        sent = report.sent,
        failed = report.failed,
        "rent reminder run finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parkline_directory::{
        DirectoryError, DirectorySource, LedgerEntry, TenantIdentity, TenantRecord,
    };
    use parkline_transport::TransportError;
    use std::sync::Mutex;

    struct FakeSource(Vec<TenantRecord>);

    #[async_trait]
    impl DirectorySource for FakeSource {
        async fn fetch_all(&self) -> Result<Vec<TenantRecord>, DirectoryError> {
            Ok(self.0.clone())
        }

        async fn fetch_ledger(&self, _: &str) -> Result<Vec<LedgerEntry>, DirectoryError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct FakeTransport {
        sent: Mutex<Vec<(String, String)>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send_message(&self, to: &str, body: &str) -> Result<(), TransportError> {
            if self.fail_for.as_deref() == Some(to) {
                return Err(TransportError::SendFailed {
                    reason: "undeliverable".to_string(),
                });
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn record(id: &str, balance: &str, phones: &[&str]) -> TenantRecord {
        let mut rec = TenantRecord::new(
            TenantIdentity::new(id, "Clara", "Lopez", "02"),
            balance,
            "1st",
        );
        for phone in phones {
            rec = rec.with_phone(*phone);
        }
        rec
    }

    #[tokio::test]
    async fn only_positive_balances_get_reminders() {
        let directory = DirectoryStore::new();
        let source = FakeSource(vec![
            record("t-1", "$450.00", &["+15550001111"]),
            record("t-2", "$0.00", &["+15550002222"]),
            record("t-3", "-$20.00", &["+15550003333"]),
        ]);
        directory.refresh(&source).await.expect("refresh");

        let transport = FakeTransport::default();
        let report = send_rent_reminders(&directory, &transport).await;

        assert_eq!(report.tenants, 1);
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 0);
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].0, "+15550001111");
        assert!(sent[0].1.contains("$450.00"));
    }

    #[tokio::test]
    async fn every_phone_on_file_is_texted() {
        let directory = DirectoryStore::new();
        let source = FakeSource(vec![record(
            "t-1",
            "$450.00",
            &["+15550001111", "+15550009999"],
        )]);
        directory.refresh(&source).await.expect("refresh");

        let transport = FakeTransport::default();
        let report = send_rent_reminders(&directory, &transport).await;
        assert_eq!(report.sent, 2);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_run() {
        let directory = DirectoryStore::new();
        let source = FakeSource(vec![
            record("t-1", "$450.00", &["+15550001111"]),
            record("t-2", "$300.00", &["+15550002222"]),
        ]);
        directory.refresh(&source).await.expect("refresh");

        let transport = FakeTransport {
            fail_for: Some("+15550001111".to_string()),
            ..Default::default()
        };
        let report = send_rent_reminders(&directory, &transport).await;
        assert_eq!(report.tenants, 2);
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);
    }
}
