//! Fixed-delay retry around a market-data source

use crate::config::EvConfig;
use crate::error::{FinanceError, FinanceResult};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// How often and how patiently a source is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Wait after an attempt that returned no rows
    pub empty_delay: Duration,
    /// Wait after an attempt that failed
    pub error_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            empty_delay: Duration::from_secs(1),
            error_delay: Duration::from_secs(2),
        }
    }
}

enum Outcome {
    Empty,
    Failed(String),
}

impl RetryPolicy {
    pub fn from_config(config: &EvConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            empty_delay: config.empty_retry_delay,
            error_delay: config.error_retry_delay,
        }
    }

    /// Policy without waits, for tests and offline runs
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            empty_delay: Duration::ZERO,
            error_delay: Duration::ZERO,
        }
    }

    /// Call `op` until it yields a non-empty series
    ///
    /// `op` receives the 1-based attempt number. There is no wait after the
    /// last attempt. When every attempt is used up the error reflects the
    /// last attempt: [`FinanceError::NoData`] if it was empty,
    /// [`FinanceError::RetriesExhausted`] if it failed.
    pub async fn fetch_with_retry<T, F, Fut>(&self, ticker: &str, mut op: F) -> FinanceResult<Vec<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = FinanceResult<Vec<T>>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last = Outcome::Empty;

        for attempt in 1..=attempts {
            let delay = match op(attempt).await {
                Ok(rows) if !rows.is_empty() => {
                    if attempt > 1 {
                        info!(ticker, attempt, "Fetch succeeded after retry");
                    }
                    return Ok(rows);
                }
                Ok(_) => {
                    warn!(ticker, attempt, attempts, "Source returned no data");
                    last = Outcome::Empty;
                    self.empty_delay
                }
                Err(e) => {
                    warn!(ticker, attempt, attempts, "Fetch failed: {}", e);
                    last = Outcome::Failed(e.to_string());
                    self.error_delay
                }
            };

            if attempt < attempts && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        Err(match last {
            Outcome::Empty => FinanceError::NoData {
                ticker: ticker.to_string(),
                attempts,
            },
            Outcome::Failed(last_error) => FinanceError::RetriesExhausted {
                ticker: ticker.to_string(),
                attempts,
                last_error,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    #[tokio::test]
    async fn test_first_success_returns_immediately() {
        let calls = AtomicU32::new(0);
        let rows = RetryPolicy::immediate(3)
            .fetch_with_retry("TSLA", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(vec![1, 2, 3]) }
            })
            .await
            .unwrap();

        assert_eq!(rows, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_empty_and_error() {
        let rows = RetryPolicy::immediate(3)
            .fetch_with_retry("BYD", |attempt| async move {
                match attempt {
                    1 => Ok(Vec::new()),
                    2 => Err(FinanceError::Source("HTTP 502".to_string())),
                    _ => Ok(vec![42.0]),
                }
            })
            .await
            .unwrap();

        assert_eq!(rows, vec![42.0]);
    }

    #[tokio::test]
    async fn test_all_empty_is_no_data() {
        let calls = AtomicU32::new(0);
        let err = RetryPolicy::immediate(3)
            .fetch_with_retry("XXXX", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Vec::<f64>::new()) }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(err, FinanceError::NoData { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_last_error_is_reported() {
        let err = RetryPolicy::immediate(2)
            .fetch_with_retry("TSLA", |attempt| async move {
                if attempt == 1 {
                    Ok(Vec::<f64>::new())
                } else {
                    Err(FinanceError::Source("connection reset".to_string()))
                }
            })
            .await
            .unwrap_err();

        match err {
            FinanceError::RetriesExhausted {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("connection reset"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_delays_between_attempts_only() {
        let policy = RetryPolicy {
            max_attempts: 2,
            empty_delay: Duration::from_millis(100),
            error_delay: Duration::from_secs(5),
        };

        let started = Instant::now();
        let _ = policy
            .fetch_with_retry("TSLA", |_| async { Ok(Vec::<f64>::new()) })
            .await;
        let elapsed = started.elapsed();

        // One wait between the two attempts, none after the last
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(190));
    }

    #[test]
    fn test_from_config() {
        let policy = RetryPolicy::from_config(&EvConfig::default());
        assert_eq!(policy, RetryPolicy::default());
    }
}
