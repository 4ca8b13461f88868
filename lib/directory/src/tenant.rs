//! Tenant roster types.
//!
//! A tenant is identified by the composite of external id, name, and unit.
//! Units keep their original display form ("18 A", "york 101") and expose a
//! normalized form for comparison.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Immutable composite key for a tenant record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantIdentity {
    /// Id assigned by the property-management system.
    pub external_id: String,
    /// First name as displayed.
    pub first_name: String,
    /// Last name as displayed. May contain several words.
    pub last_name: String,
    /// Unit/lot label as displayed.
    pub unit: String,
}

impl TenantIdentity {
    /// Creates a new identity.
    #[must_use]
    pub fn new(
        external_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            unit: unit.into(),
        }
    }

    /// Full display name, first then last.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Unit label folded to lowercase alphanumerics only, for comparison.
    ///
    /// "18 A" and "128B-2Mont" become "18a" and "128b2mont".
    #[must_use]
    pub fn normalized_unit(&self) -> String {
        self.unit
            .to_lowercase()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect()
    }

    /// Unit label folded with separators collapsed to single spaces.
    #[must_use]
    pub fn spaced_unit(&self) -> String {
        self.unit
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for TenantIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (unit {})", self.full_name(), self.unit)
    }
}

/// Descriptor of the park a tenant lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkInfo {
    /// Park name, e.g. "Oakwood Estates".
    pub name: String,
    /// City the park is in.
    pub city: String,
    /// Street address of the park office.
    pub address: String,
    /// Free-text payment method/procedure shown to tenants.
    pub payment_method: String,
    /// Name checks/money orders should be made out to.
    pub payee: String,
}

/// A single ledger line from the property-management system.
///
/// Amounts and dates are display strings; parkline never does arithmetic
/// on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Transaction date as displayed.
    pub date: String,
    /// Transaction description.
    pub description: String,
    /// Amount as displayed, sign included.
    pub amount: String,
}

/// A tenant roster record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    /// Composite identity.
    pub identity: TenantIdentity,
    /// Current balance as a display string, e.g. "$420.00" or "-$5.34".
    pub balance: String,
    /// Rent due date as a display string, e.g. "1st".
    pub due_date: String,
    /// Move-in date, when known.
    pub moved_in: Option<NaiveDate>,
    /// Postal address of the unit.
    pub postal_address: String,
    /// Park descriptor.
    pub park: ParkInfo,
    /// Phone numbers on file for reminders.
    pub phones: Vec<String>,
    /// Transaction ledger, absent until first requested.
    pub ledger: Option<Vec<LedgerEntry>>,
}

impl TenantRecord {
    /// Creates a record with empty ancillary fields.
    #[must_use]
    pub fn new(identity: TenantIdentity, balance: impl Into<String>, due_date: impl Into<String>) -> Self {
        Self {
            identity,
            balance: balance.into(),
            due_date: due_date.into(),
            moved_in: None,
            postal_address: String::new(),
            park: ParkInfo::default(),
            phones: Vec::new(),
            ledger: None,
        }
    }

    /// Sets the park descriptor.
    #[must_use]
    pub fn with_park(mut self, park: ParkInfo) -> Self {
        self.park = park;
        self
    }

    /// Sets the postal address.
    #[must_use]
    pub fn with_postal_address(mut self, address: impl Into<String>) -> Self {
        self.postal_address = address.into();
        self
    }

    /// Sets the move-in date.
    #[must_use]
    pub fn with_moved_in(mut self, date: NaiveDate) -> Self {
        self.moved_in = Some(date);
        self
    }

    /// Adds a phone number on file.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phones.push(phone.into());
        self
    }

    /// Returns a copy with the ledger attached.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Vec<LedgerEntry>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Best-effort check that the display balance is a positive amount.
    ///
    /// Display strings come from the external system; anything unparseable
    /// counts as not-positive so we never nag on garbage.
    #[must_use]
    pub fn balance_is_positive(&self) -> bool {
        let trimmed = self.balance.trim();
        if trimmed.starts_with('-') {
            return false;
        }
        let digits: String = trimmed
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        digits.parse::<f64>().map(|v| v > 0.0).unwrap_or(false)
    }
}
