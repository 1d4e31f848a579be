//! Retry with exponential backoff
//!
//! Only transient failures ([`FetchError::is_retryable`]) are retried, and
//! only until the policy's attempt or time budget runs out. The last error is
//! returned unchanged.

use std::future::Future;

use crate::config::RetryPolicy;
use crate::error::FetchError;

/// Run `operation` until it succeeds, fails permanently, or the policy is
/// exhausted
///
/// # Examples
/// ```
/// use networking::{retry::retry_transient, FetchError, RetryPolicy};
///
/// async fn example() -> Result<String, FetchError> {
///     retry_transient(&RetryPolicy::new(3), || async {
///         Ok("languages".to_string())
///     })
///     .await
/// }
/// ```
pub async fn retry_transient<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    backoff::future::retry(policy.backoff(), || {
        attempt += 1;
        let current = attempt;
        let fut = operation();

        async move {
            fut.await.map_err(|e| {
                if e.is_retryable() && current < max_attempts {
                    tracing::debug!(attempt = current, "transient fetch failure, retrying: {}", e);
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts)
            .with_initial_interval(Duration::from_millis(1))
            .with_max_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = retry_transient(&fast_policy(3), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, FetchError>("ok")
            }
        })
        .await;

        assert_eq!(result, Ok("ok"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = retry_transient(&fast_policy(3), || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FetchError::Http { status: 503, body: String::new() })
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("ok"));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result: Result<(), _> = retry_transient(&fast_policy(3), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Http { status: 404, body: "missing".to_string() })
            }
        })
        .await;

        assert_eq!(result.unwrap_err().status(), Some(404));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempts_exhausted() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result: Result<(), _> = retry_transient(&fast_policy(2), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Network("connection reset".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(FetchError::Network(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
