//! Conversation engine for the parkline concierge.
//!
//! This crate wires the directory, session, generation, and transport
//! crates together:
//!
//! - **Engine**: One inbound message in, at most one reply out
//! - **Sweeper**: Idle-timeout prompts and closes on an interval
//! - **Reminders**: Rent reminder broadcast over the current roster
//! - **Logs**: Maintenance requests and inbound voice calls

pub mod calls;
pub mod engine;
pub mod error;
pub mod maintenance;
pub mod replies;
pub mod reminders;
pub mod sweeper;

pub use calls::{CallLog, CallRecord, InMemoryCallLog};
pub use engine::{ConversationEngine, EngineConfig};
pub use error::EngineError;
pub use maintenance::{InMemoryMaintenanceLog, MaintenanceLog, MaintenanceRequest};
pub use reminders::{send_rent_reminders, ReminderReport};
pub use sweeper::{IdleSweeper, SweepConfig, SweepReport};
