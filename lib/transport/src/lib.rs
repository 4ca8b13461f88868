//! Message transport for the parkline concierge.
//!
//! Inbound messages arrive through the webhook layer and are normalized
//! into [`InboundMessage`]. Outbound replies go through the [`Transport`]
//! trait; the production implementation posts to a Twilio-style REST API
//! with a per-recipient rate limit in front of it.

pub mod error;
pub mod message;
pub mod rate_limit;
pub mod sender;

pub use error::TransportError;
pub use message::{Channel, InboundMessage};
pub use rate_limit::{SendLimitConfig, SendLimiter};
pub use sender::{HttpSmsSender, SmsConfig, Transport};
