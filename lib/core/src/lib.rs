//! Core domain types for the parkline concierge.
//!
//! This crate provides the strongly-typed ids shared by the parkline
//! tenant-messaging crates.

pub mod id;

pub use id::{CallLogId, MaintenanceRequestId, ParseIdError};
