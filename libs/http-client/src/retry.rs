use std::{fmt::Display, future::Future, time::Duration};

use common_errors::{Classified, ErrorKind};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay_ms: u64::try_from(base_delay.as_millis())
                .unwrap_or(u64::MAX),
        }
    }

    /// `base_delay * 2^attempt`, attempt counted from zero.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms)
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

fn default_max_retries() -> u32 { 3 }
fn default_base_delay_ms() -> u64 { 1000 }

/// Kinds that are never retried, whatever the caller's predicate says.
fn never_retried<E: Classified>(err: &E) -> bool {
    matches!(
        err.kind(),
        ErrorKind::Validation
            | ErrorKind::NotFound
            | ErrorKind::Unauthorized
            | ErrorKind::Forbidden
    )
}

/// Runs `op` until it succeeds, the predicate rejects the error, or the
/// policy's retries are spent.
pub async fn with_retry<T, E, F, Fut, P>(
    policy: RetryPolicy, should_retry: P, mut op: F,
) -> Result<T, E>
where
    E: Classified + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if never_retried(&err)
            || !should_retry(&err)
            || attempt >= policy.max_retries
        {
            return Err(err);
        }

        let delay = policy.delay_for(attempt);
        warn!(
            "Attempt {} failed with {}, retrying in {:?}",
            attempt + 1,
            err,
            delay
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// [`with_retry`] retrying only [`Classified::is_retryable`] errors.
pub async fn retry<T, E, F, Fut>(policy: RetryPolicy, op: F) -> Result<T, E>
where
    E: Classified + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    with_retry(policy, |err: &E| err.is_retryable(), op).await
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use common_errors::AppError;
    use tokio::time::Instant;

    use super::*;

    fn counter() -> Arc<AtomicU32> { Arc::new(AtomicU32::new(0)) }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_server_errors_until_success() {
        let calls = counter();
        let start = Instant::now();

        let result = retry(RetryPolicy::new(3, Duration::from_millis(100)), || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(AppError::server(503, "unavailable"))
                }
                else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 100ms + 200ms of backoff
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = counter();

        let err = retry(RetryPolicy::new(2, Duration::from_millis(10)), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AppError::network("reset"))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_and_not_found_are_never_retried() {
        for err in [
            AppError::unauthorized("expired"),
            AppError::forbidden("denied"),
            AppError::not_found("missing"),
            AppError::validation("bad input"),
        ] {
            let calls = counter();
            let result = with_retry(
                RetryPolicy::new(3, Duration::from_millis(10)),
                |_| true,
                || {
                    let calls = calls.clone();
                    let err = err.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err::<(), _>(err)
                    }
                },
            )
            .await;

            assert!(result.is_err());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_predicate_can_stop_retrying() {
        let calls = counter();

        let result = with_retry(
            RetryPolicy::new(3, Duration::from_millis(10)),
            |err: &AppError| err.code() != 502,
            || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(AppError::server(502, "bad gateway"))
                }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
