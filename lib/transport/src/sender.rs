//! Outbound message delivery.

use crate::error::TransportError;
use crate::rate_limit::{SendLimitConfig, SendLimiter};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Trait for outbound message delivery.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers one message to one recipient.
    ///
    /// # Errors
    ///
    /// Returns an error when the message was not accepted for delivery.
    async fn send_message(&self, to: &str, body: &str) -> Result<(), TransportError>;
}

/// Configuration for the Twilio-style SMS API.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    /// API base URL.
    pub base_url: String,
    /// Account identifier, used in the URL and as the basic-auth user.
    pub account_sid: String,
    /// Auth token, used as the basic-auth password.
    pub auth_token: String,
    /// Number messages are sent from.
    pub from_number: String,
    /// Per-send deadline in seconds.
    pub timeout_seconds: u64,
}

/// SMS sender posting to a Twilio-style messages endpoint.
pub struct HttpSmsSender {
    client: reqwest::Client,
    config: SmsConfig,
    limiter: SendLimiter,
}

impl HttpSmsSender {
    /// Creates a sender, validating the configuration up front.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfig`] when credentials or the
    /// from-number are blank.
    pub fn new(config: SmsConfig, limit: SendLimitConfig) -> Result<Self, TransportError> {
        for (field, value) in [
            ("base_url", &config.base_url),
            ("account_sid", &config.account_sid),
            ("auth_token", &config.auth_token),
            ("from_number", &config.from_number),
        ] {
            if value.trim().is_empty() {
                return Err(TransportError::InvalidConfig {
                    reason: format!("{field} is empty"),
                });
            }
        }
        Ok(Self {
            client: reqwest::Client::new(),
            config,
            limiter: SendLimiter::new(limit),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.config.base_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl Transport for HttpSmsSender {
    async fn send_message(&self, to: &str, body: &str) -> Result<(), TransportError> {
        if to.trim().is_empty() {
            return Err(TransportError::InvalidAddress {
                address: to.to_string(),
            });
        }
        if let Err(retry_after) = self.limiter.acquire(to, chrono::Utc::now()) {
            return Err(TransportError::RateLimited {
                retry_after_secs: retry_after.num_seconds().max(0),
            });
        }

        let form = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];
        let request = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send();

        let response =
            match tokio::time::timeout(Duration::from_secs(self.config.timeout_seconds), request)
                .await
            {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    return Err(TransportError::SendFailed {
                        reason: e.to_string(),
                    })
                }
                Err(_) => return Err(TransportError::Timeout),
            };

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TransportError::SendFailed {
                reason: format!("{status}: {detail}"),
            });
        }
        tracing::debug!(to, "message accepted for delivery");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmsConfig {
        SmsConfig {
            base_url: "https://api.twilio.com/2010-04-01".to_string(),
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            from_number: "+15559990000".to_string(),
            timeout_seconds: 10,
        }
    }

    #[test]
    fn blank_credentials_are_rejected() {
        let mut cfg = config();
        cfg.auth_token = String::new();
        assert!(matches!(
            HttpSmsSender::new(cfg, SendLimitConfig::default()),
            Err(TransportError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn messages_url_embeds_account_sid() {
        let sender = HttpSmsSender::new(config(), SendLimitConfig::default()).expect("sender");
        assert_eq!(
            sender.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[tokio::test]
    async fn empty_recipient_is_rejected_before_sending() {
        let sender = HttpSmsSender::new(config(), SendLimitConfig::default()).expect("sender");
        assert!(matches!(
            sender.send_message("", "hi").await,
            Err(TransportError::InvalidAddress { .. })
        ));
    }

    #[tokio::test]
    async fn rate_limit_rejects_before_sending() {
        let sender = HttpSmsSender::new(
            config(),
            SendLimitConfig {
                max_messages: 0,
                window_seconds: 60,
            },
        )
        .expect("sender");
        assert!(matches!(
            sender.send_message("+15550001111", "hi").await,
            Err(TransportError::RateLimited { .. })
        ));
    }
}
