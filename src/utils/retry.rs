//! Retry utilities for resilient operations
//!
//! One retry/backoff loop shared by listing-page and article-page fetches.
//! The attempt bound and the delay policy come from [`RetryConfig`]; the
//! caller classifies each failure into a [`RetryAction`].

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How long to wait before the next attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DelayPolicy {
    /// Same delay before every retry
    Fixed(Duration),

    /// `base * multiplier^(retry - 1)`, capped at `max`
    Exponential {
        base: Duration,
        max: Duration,
        multiplier: f64,
    },
}

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,

    /// Delay between attempts
    pub delay: DelayPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: DelayPolicy::Fixed(Duration::from_secs(2)),
        }
    }
}

impl RetryConfig {
    /// Fixed-delay retry configuration
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay: DelayPolicy::Fixed(delay),
        }
    }

    /// Exponential backoff retry configuration
    pub fn exponential(max_attempts: u32, base: Duration, max: Duration) -> Self {
        Self {
            max_attempts,
            delay: DelayPolicy::Exponential {
                base,
                max,
                multiplier: 2.0,
            },
        }
    }

    /// Delay before the given attempt (0-based; attempt 0 never waits)
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        match self.delay {
            DelayPolicy::Fixed(delay) => delay,
            DelayPolicy::Exponential {
                base,
                max,
                multiplier,
            } => {
                let exponential = base.as_millis() as f64 * multiplier.powi((attempt - 1) as i32);
                Duration::from_millis(exponential as u64).min(max)
            }
        }
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Retry after the configured delay
    Retry,

    /// Retry, but wait this long instead of the configured delay
    RetryAfter(Duration),

    /// Give up immediately
    Abort,
}

/// Final failure of a retried operation
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// Attempts actually made
    pub attempts: u32,

    /// Error from the last attempt
    pub last_error: E,

    /// `true` when the classifier aborted rather than the budget running out
    pub aborted: bool,
}

/// Execute an operation with retry logic, classifying each failure
///
/// # Arguments
///
/// * `config` - Attempt bound and delay policy
/// * `operation` - Async operation; receives the 0-based attempt number
/// * `classify` - Decides whether (and how long after) a failure is retried
///
/// # Returns
///
/// Returns `Ok(T)` on success, or a [`RetryFailure`] carrying the last error
///
/// # Example
///
/// ```no_run
/// use balita::utils::retry::{with_retry_if, RetryAction, RetryConfig};
/// use std::time::Duration;
///
/// # async fn example() {
/// let config = RetryConfig::fixed(3, Duration::from_millis(10));
/// let result = with_retry_if(
///     &config,
///     |_attempt| async { Err::<(), _>("connection reset") },
///     |_e| RetryAction::Retry,
/// )
/// .await;
/// assert_eq!(result.unwrap_err().attempts, 3);
/// # }
/// ```
pub async fn with_retry_if<T, E, F, Fut, C>(
    config: &RetryConfig,
    mut operation: F,
    classify: C,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> RetryAction,
    E: Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut pending_delay = Duration::ZERO;
    let mut attempt = 0;

    loop {
        if attempt > 0 && !pending_delay.is_zero() {
            debug!(
                attempt,
                delay_ms = pending_delay.as_millis() as u64,
                "Retrying operation after delay"
            );
            tokio::time::sleep(pending_delay).await;
        }

        match operation(attempt).await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                let action = classify(&e);
                let attempts = attempt + 1;

                if action == RetryAction::Abort {
                    debug!(error = %e, "Non-retryable error encountered");
                    return Err(RetryFailure {
                        attempts,
                        last_error: e,
                        aborted: true,
                    });
                }

                warn!(attempt = attempts, max_attempts, error = %e, "Operation failed");

                if attempts >= max_attempts {
                    return Err(RetryFailure {
                        attempts,
                        last_error: e,
                        aborted: false,
                    });
                }

                pending_delay = match action {
                    RetryAction::RetryAfter(delay) => delay,
                    _ => config.delay_before(attempts),
                };
                attempt = attempts;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick() -> RetryConfig {
        RetryConfig::fixed(3, Duration::from_millis(1))
    }

    async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: F) -> Result<T, RetryFailure<String>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, String>>,
    {
        with_retry_if(config, operation, |_| RetryAction::Retry).await
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let result = with_retry(&quick(), |_| async { Ok::<_, String>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result = with_retry(&quick(), move |_| {
            let counter = Arc::clone(&counter);
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    return Err("simulated failure".to_string());
                }
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted_reports_attempts() {
        let result: Result<(), _> =
            with_retry(&quick(), |_| async { Err("permanent failure".to_string()) }).await;

        let failure = result.unwrap_err();
        assert_eq!(failure.attempts, 3);
        assert!(!failure.aborted);
        assert!(failure.last_error.contains("permanent"));
    }

    #[tokio::test]
    async fn test_abort_stops_immediately() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result: Result<(), _> = with_retry_if(
            &quick(),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err("not found".to_string()) }
            },
            |_| RetryAction::Abort,
        )
        .await;

        let failure = result.unwrap_err();
        assert!(failure.aborted);
        assert_eq!(failure.attempts, 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_operation_sees_attempt_number() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        let _: Result<(), _> = with_retry(&quick(), move |attempt| {
            log.lock().unwrap().push(attempt);
            async { Err("fail".to_string()) }
        })
        .await;

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_fixed_delay() {
        let config = RetryConfig::fixed(3, Duration::from_secs(2));
        assert_eq!(config.delay_before(0), Duration::ZERO);
        assert_eq!(config.delay_before(1), Duration::from_secs(2));
        assert_eq!(config.delay_before(2), Duration::from_secs(2));
    }

    #[test]
    fn test_exponential_delay_with_cap() {
        let config = RetryConfig::exponential(10, Duration::from_millis(1000), Duration::from_millis(5000));
        assert_eq!(config.delay_before(1), Duration::from_millis(1000));
        assert_eq!(config.delay_before(2), Duration::from_millis(2000));
        assert_eq!(config.delay_before(3), Duration::from_millis(4000));
        assert_eq!(config.delay_before(10), Duration::from_millis(5000));
    }
}
