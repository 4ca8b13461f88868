//! Retry policy for generation attempts.
//!
//! Bounded attempts with exponential backoff and a per-attempt deadline.
//! Configuration errors are never retried.

use crate::error::GenerationError;
use std::future::Future;
use std::time::Duration;

/// Retry configuration for a generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first included.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Backoff multiplier between attempts.
    pub backoff_multiplier: u32,
    /// Deadline applied to each attempt independently.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            backoff_multiplier: 2,
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Runs `attempt` until it succeeds, fails non-retryably, or attempts
    /// run out.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::RetryExhausted`] carrying the last error,
    /// or the error itself when it is not retryable.
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Result<T, GenerationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let mut backoff = self.initial_backoff;
        let mut last = GenerationError::RequestFailed {
            reason: "no attempts made".to_string(),
        };

        for n in 1..=self.max_attempts.max(1) {
            let outcome = match tokio::time::timeout(self.attempt_timeout, attempt()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(GenerationError::Timeout),
            };
            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    tracing::warn!(attempt = n, error = %err, "generation attempt failed");
                    last = err;
                }
            }
            if n < self.max_attempts {
                tokio::time::sleep(backoff).await;
                backoff *= self.backoff_multiplier;
            }
        }

        Err(GenerationError::RetryExhausted {
            attempts: self.max_attempts.max(1),
            last: Box::new(last),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            backoff_multiplier: 2,
            attempt_timeout: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, GenerationError>("reply".to_string()) }
            })
            .await;
        assert_eq!(result.unwrap(), "reply");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(GenerationError::RequestFailed {
                            reason: "503".to_string(),
                        })
                    } else {
                        Ok("eventually".to_string())
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "eventually");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_carries_last_error() {
        let result: Result<String, _> = fast_policy()
            .run(|| async {
                Err(GenerationError::RequestFailed {
                    reason: "503".to_string(),
                })
            })
            .await;
        match result {
            Err(GenerationError::RetryExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, GenerationError::RequestFailed { .. }));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn config_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<String, _> = fast_policy()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(GenerationError::InvalidConfig {
                        reason: "missing api key".to_string(),
                    })
                }
            })
            .await;
        assert!(matches!(result, Err(GenerationError::InvalidConfig { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_attempts_time_out() {
        let result: Result<String, _> = fast_policy()
            .run(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok("too late".to_string())
            })
            .await;
        assert!(matches!(
            result,
            Err(GenerationError::RetryExhausted { .. })
        ));
    }
}
