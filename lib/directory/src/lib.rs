//! Tenant directory for the parkline concierge.
//!
//! This crate provides:
//!
//! - **Tenant model**: Composite tenant identities and roster records
//! - **Directory store**: Atomic point-in-time snapshots of the roster
//! - **Identity resolver**: Tiered matching of free-text input to a tenant

pub mod error;
pub mod resolver;
pub mod store;
pub mod tenant;

pub use error::DirectoryError;
pub use resolver::{IdentityResolver, Resolution};
pub use store::{DirectorySnapshot, DirectorySource, DirectoryStore};
pub use tenant::{LedgerEntry, ParkInfo, TenantIdentity, TenantRecord};
