//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables with `__` as
//! the nesting separator, e.g. `SMS__AUTH_TOKEN` or
//! `SWEEP__PENDING_AFTER_MINUTES`.

use parkline_ai::OpenAiConfig;
use parkline_engine::SweepConfig;
use parkline_transport::{SendLimitConfig, SmsConfig};
use serde::Deserialize;

/// Top-level server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the webhook server listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Phone number maintenance reports are forwarded to.
    pub owner_number: String,

    /// Path to the tenant roster JSON file.
    pub roster_path: String,

    /// Path for session persistence across restarts; disabled when unset.
    #[serde(default)]
    pub sessions_path: Option<String>,

    /// Seconds between idle-sweep passes.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,

    /// Idle-timeout thresholds.
    #[serde(default)]
    pub sweep: SweepSettings,

    /// Outbound SMS credentials.
    pub sms: SmsSettings,

    /// Reply generation backend; templated fallbacks only when unset.
    #[serde(default)]
    pub openai: Option<OpenAiSettings>,

    /// Per-recipient outbound rate limit.
    #[serde(default)]
    pub send_limit: SendLimitConfig,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_sweep_interval_seconds() -> u64 {
    30
}

/// Idle-timeout thresholds in human units.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SweepSettings {
    /// Idle minutes before the still-there prompt.
    #[serde(default = "default_pending_after_minutes")]
    pub pending_after_minutes: i64,
    /// Further silent minutes before closing.
    #[serde(default = "default_close_after_minutes")]
    pub close_after_minutes: i64,
    /// Session age in hours after which state is reset outright.
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: i64,
}

fn default_pending_after_minutes() -> i64 {
    5
}

fn default_close_after_minutes() -> i64 {
    2
}

fn default_stale_after_hours() -> i64 {
    6
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            pending_after_minutes: default_pending_after_minutes(),
            close_after_minutes: default_close_after_minutes(),
            stale_after_hours: default_stale_after_hours(),
        }
    }
}

impl From<SweepSettings> for SweepConfig {
    fn from(s: SweepSettings) -> Self {
        Self {
            pending_after: chrono::Duration::minutes(s.pending_after_minutes),
            close_after: chrono::Duration::minutes(s.close_after_minutes),
            stale_after: chrono::Duration::hours(s.stale_after_hours),
        }
    }
}

/// Outbound SMS settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsSettings {
    #[serde(default = "default_sms_base_url")]
    pub base_url: String,
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    #[serde(default = "default_sms_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_sms_base_url() -> String {
    "https://api.twilio.com/2010-04-01".to_string()
}

fn default_sms_timeout_seconds() -> u64 {
    10
}

impl From<SmsSettings> for SmsConfig {
    fn from(s: SmsSettings) -> Self {
        Self {
            base_url: s.base_url,
            account_sid: s.account_sid,
            auth_token: s.auth_token,
            from_number: s.from_number,
            timeout_seconds: s.timeout_seconds,
        }
    }
}

/// Reply generation backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiSettings {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

impl From<OpenAiSettings> for OpenAiConfig {
    fn from(s: OpenAiSettings) -> Self {
        Self {
            base_url: s.base_url,
            api_key: s.api_key,
            model: s.model,
            temperature: s.temperature,
            max_tokens: s.max_tokens,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
