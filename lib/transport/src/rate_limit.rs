//! Per-recipient outbound rate limiting.
//!
//! Keeps a retry loop or a chatty tenant from turning into an SMS flood.
//! Fixed windows keyed by recipient address.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::RwLock;

/// Outbound limit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SendLimitConfig {
    /// Maximum messages per recipient per window.
    pub max_messages: u32,
    /// Window length in seconds.
    pub window_seconds: u32,
}

impl Default for SendLimitConfig {
    fn default() -> Self {
        // A live conversation stays well under this.
        Self {
            max_messages: 20,
            window_seconds: 60,
        }
    }
}

#[derive(Debug)]
struct Window {
    count: u32,
    started: DateTime<Utc>,
}

/// Fixed-window limiter keyed by recipient address.
#[derive(Debug)]
pub struct SendLimiter {
    config: SendLimitConfig,
    windows: RwLock<HashMap<String, Window>>,
}

impl SendLimiter {
    /// Creates a limiter with the given configuration.
    #[must_use]
    pub fn new(config: SendLimitConfig) -> Self {
        Self {
            config,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Records a send to `recipient` if allowed.
    ///
    /// Returns `Ok(())` when allowed, or the duration until the window
    /// resets when the recipient is over the limit.
    pub fn acquire(&self, recipient: &str, now: DateTime<Utc>) -> Result<(), Duration> {
        let window_len = Duration::seconds(i64::from(self.config.window_seconds));
        let mut windows = self.windows.write().unwrap();
        let window = windows
            .entry(recipient.to_string())
            .or_insert_with(|| Window {
                count: 0,
                started: now,
            });

        if now - window.started >= window_len {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.config.max_messages {
            return Err(window.started + window_len - now);
        }
        window.count += 1;
        Ok(())
    }

    /// Drops windows that have already expired.
    pub fn prune(&self, now: DateTime<Utc>) {
        let window_len = Duration::seconds(i64::from(self.config.window_seconds));
        let mut windows = self.windows.write().unwrap();
        windows.retain(|_, w| now - w.started < window_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32) -> SendLimiter {
        SendLimiter::new(SendLimitConfig {
            max_messages: max,
            window_seconds: 60,
        })
    }

    #[test]
    fn allows_under_limit() {
        let limiter = limiter(3);
        let now = Utc::now();
        for _ in 0..3 {
            assert!(limiter.acquire("+15550001111", now).is_ok());
        }
        assert!(limiter.acquire("+15550001111", now).is_err());
    }

    #[test]
    fn recipients_are_isolated() {
        let limiter = limiter(1);
        let now = Utc::now();
        assert!(limiter.acquire("+15550001111", now).is_ok());
        assert!(limiter.acquire("+15550001111", now).is_err());
        assert!(limiter.acquire("+15550002222", now).is_ok());
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = limiter(1);
        let now = Utc::now();
        assert!(limiter.acquire("+15550001111", now).is_ok());
        assert!(limiter.acquire("+15550001111", now).is_err());

        let later = now + Duration::seconds(61);
        assert!(limiter.acquire("+15550001111", later).is_ok());
    }

    #[test]
    fn prune_drops_expired_windows() {
        let limiter = limiter(1);
        let now = Utc::now();
        let _ = limiter.acquire("+15550001111", now);

        limiter.prune(now + Duration::seconds(61));
        assert!(limiter.windows.read().unwrap().is_empty());
    }
}
