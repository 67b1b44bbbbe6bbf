use crate::error::Retryable;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry schedule shared by the findings and model clients
///
/// The default performs a single attempt.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Factor applied to the delay after every retry
    #[serde(default = "default_multiplier")]
    pub multiplier: u64,
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_backoff_ms() -> u64 {
    2000
}

fn default_multiplier() -> u64 {
    2
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = self
            .multiplier
            .saturating_pow(retry.saturating_sub(1));
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor))
    }

    /// Run `op` until it succeeds, fails with a final error, or attempts run out
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts && e.is_retryable() => {
                    let delay = self.backoff_for(attempt);
                    warn!(
                        "{} failed: {}. Retrying in {}ms (attempt {}/{})",
                        what,
                        e,
                        delay.as_millis(),
                        attempt + 1,
                        max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::cell::Cell;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 1,
            multiplier: 2,
        }
    }

    fn http(status: u16) -> FetchError {
        FetchError::Http {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_backoff_ms: 2000,
            multiplier: 2,
        };
        assert_eq!(policy.backoff_for(1), Duration::from_millis(2000));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(4000));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(8000));
    }

    #[tokio::test]
    async fn test_default_policy_makes_one_attempt() {
        let calls = Cell::new(0);
        let result: Result<(), FetchError> = RetryPolicy::default()
            .run("fetch", || {
                calls.set(calls.get() + 1);
                async { Err(http(503)) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_recovers_from_transient_failure() {
        let calls = Cell::new(0);
        let result: Result<u32, FetchError> = policy(3)
            .run("fetch", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { if n < 3 { Err(http(429)) } else { Ok(n) } }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_final_error_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), FetchError> = policy(5)
            .run("fetch", || {
                calls.set(calls.get() + 1);
                async { Err(http(401)) }
            })
            .await;
        assert!(matches!(result, Err(FetchError::Http { status: 401, .. })));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), FetchError> = policy(2)
            .run("fetch", || {
                calls.set(calls.get() + 1);
                async { Err(http(500)) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }
}
