//! Bounded retry with an optional per-attempt deadline
//!
//! Retry storms are worse than a failed read, so a policy allows at most
//! [`RetryPolicy::MAX_RETRIES`] extra attempts and only for transient errors.

use super::error::ResilienceError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one (0 or 1)
    max_retries: u32,
    /// Delay before the retry
    backoff: Duration,
    /// Deadline applied to each attempt separately
    attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::MAX_RETRIES,
            backoff: Duration::from_millis(250),
            attempt_timeout: None,
        }
    }
}

impl RetryPolicy {
    /// Upper bound on `max_retries`
    pub const MAX_RETRIES: u32 = 1;

    /// Create a policy
    ///
    /// # Errors
    ///
    /// Returns `ResilienceError::Permanent` if `max_retries` exceeds
    /// [`RetryPolicy::MAX_RETRIES`].
    pub fn new(max_retries: u32, backoff: Duration) -> Result<Self, ResilienceError> {
        if max_retries > Self::MAX_RETRIES {
            return Err(ResilienceError::Permanent(format!(
                "max_retries must be <= {} (got {})",
                Self::MAX_RETRIES,
                max_retries
            )));
        }
        Ok(Self {
            max_retries,
            backoff,
            attempt_timeout: None,
        })
    }

    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
            attempt_timeout: None,
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }
}

/// Await `fut`, failing with `ResilienceError::Timeout` once `limit` elapses
///
/// `None` waits indefinitely.
pub async fn within<F>(limit: Option<Duration>, fut: F) -> Result<F::Output, ResilienceError>
where
    F: Future,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ResilienceError::Timeout(limit)),
        None => Ok(fut.await),
    }
}

/// Execute an operation under a retry policy
///
/// The operation is retried once (at most) after `backoff` when it fails with
/// a transient error or exceeds the per-attempt deadline. Permanent errors are
/// returned immediately.
pub async fn retry<F, Fut, T>(policy: &RetryPolicy, op: F) -> Result<T, ResilienceError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ResilienceError>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        let outcome = within(policy.attempt_timeout, op())
            .await
            .and_then(|result| result);

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt <= policy.max_retries => {
                debug!(attempt, error = %e, "transient failure, retrying");
                tokio::time::sleep(policy.backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_policy_rejects_retry_storms() {
        assert!(RetryPolicy::new(1, Duration::ZERO).is_ok());
        let err = RetryPolicy::new(3, Duration::ZERO).unwrap_err();
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once() {
        let policy = RetryPolicy::new(1, Duration::ZERO).unwrap();
        let calls = AtomicUsize::new(0);

        let result = retry(&policy, || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ResilienceError::Transient("reset".to_string()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_one_retry() {
        let policy = RetryPolicy::new(1, Duration::ZERO).unwrap();
        let calls = AtomicUsize::new(0);

        let result: Result<(), _> = retry(&policy, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ResilienceError::Transient("down".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let policy = RetryPolicy::default();
        let calls = AtomicUsize::new(0);

        let result: Result<(), _> = retry(&policy, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ResilienceError::Permanent("rejected".to_string()))
        })
        .await;

        assert!(matches!(result, Err(ResilienceError::Permanent(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_deadline() {
        let policy = RetryPolicy::no_retry().with_attempt_timeout(Some(Duration::from_secs(5)));

        let result: Result<(), _> = retry(&policy, || async {
            std::future::pending::<Result<(), ResilienceError>>().await
        })
        .await;

        assert_eq!(
            result,
            Err(ResilienceError::Timeout(Duration::from_secs(5)))
        );
    }

    #[tokio::test]
    async fn test_within_without_limit() {
        let value = within(None, async { 42 }).await;
        assert_eq!(value, Ok(42));
    }
}
