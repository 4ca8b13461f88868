//! Inbound message types.

use serde::{Deserialize, Serialize};

/// Which channel a message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Sms,
    Voice,
}

/// A normalized inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Sender address, usually an E.164 phone number.
    pub sender: String,
    /// Message body; empty for voice calls.
    pub text: String,
    /// Channel of arrival.
    pub channel: Channel,
}

impl InboundMessage {
    /// Creates an SMS message, trimming surrounding whitespace.
    #[must_use]
    pub fn sms(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into().trim().to_string(),
            text: text.into().trim().to_string(),
            channel: Channel::Sms,
        }
    }

    /// Creates a voice-call marker with no body.
    #[must_use]
    pub fn voice(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into().trim().to_string(),
            text: String::new(),
            channel: Channel::Voice,
        }
    }

    /// Whether the sender address is present.
    #[must_use]
    pub fn has_sender(&self) -> bool {
        !self.sender.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sms_trims_whitespace() {
        let msg = InboundMessage::sms(" +15550001111 ", "  hello  ");
        assert_eq!(msg.sender, "+15550001111");
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.channel, Channel::Sms);
    }

    #[test]
    fn voice_has_no_body() {
        let msg = InboundMessage::voice("+15550001111");
        assert!(msg.text.is_empty());
        assert_eq!(msg.channel, Channel::Voice);
    }

    #[test]
    fn blank_sender_detected() {
        assert!(!InboundMessage::sms("   ", "hi").has_sender());
    }
}
