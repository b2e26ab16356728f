use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::RetryConfig;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Bounded retry with exponential backoff for catalog calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            attempts: config.attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }

    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(operation, attempt, error = %e, ?delay, "catalog call failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(operation, attempt, error = %e, "catalog call failed, giving up");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(20), MAX_BACKOFF);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_configured_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), String> = RetryPolicy::default()
            .run("search", || {
                calls.set(calls.get() + 1);
                async { Err("boom".to_string()) }
            })
            .await;

        assert_eq!(result, Err("boom".to_string()));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_from_transient_failure() {
        let calls = Cell::new(0);
        let result: Result<u32, String> = RetryPolicy::default()
            .run("episodes", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 2 {
                        Err("flaky".to_string())
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_calls_once() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            attempts: 0,
            backoff: Duration::ZERO,
        };
        let _: Result<(), String> = policy
            .run("episode", || {
                calls.set(calls.get() + 1);
                async { Err("nope".to_string()) }
            })
            .await;
        assert_eq!(calls.get(), 1);
    }
}
