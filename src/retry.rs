//! Optional retry with exponential backoff
//!
//! Retries are disabled unless [`RetryConfig::max_attempts`] is raised above
//! zero, in which case transient failures (timeouts, connection errors, 429
//! and 5xx responses) are retried with exponential backoff and optional
//! jitter. A cancelled token interrupts the backoff sleep.

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::FetchFailed {
                status: Some(code), ..
            } => *code == 429 || (500..600).contains(code),
            Error::FetchFailed {
                status: None,
                source: Some(e),
                ..
            } => e.is_timeout() || e.is_connect(),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}

/// Run `operation`, retrying transient failures according to `config`
///
/// Returns the first success, the first non-retryable error, or the last
/// error once attempts are exhausted. If `cancel` fires during a backoff
/// sleep, [`Error::Cancelled`] is returned.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );

                let jittered_delay = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };

                tokio::select! {
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    _ = tokio::time::sleep(jittered_delay) => {}
                }

                let next_delay =
                    Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next_delay.min(config.max_delay);
            }
            Err(e) => {
                if config.max_attempts > 0 && e.is_retryable() {
                    tracing::debug!(
                        error = %e,
                        attempts = attempt + 1,
                        "Operation failed after all retry attempts exhausted"
                    );
                }
                return Err(e);
            }
        }
    }
}

/// Jitter is uniform between 0% and 100% of the delay, so the result lies in `delay..=2*delay`
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn server_error() -> Error {
        Error::http_status("https://host/x.jpg", reqwest::StatusCode::SERVICE_UNAVAILABLE)
    }

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[tokio::test]
    async fn disabled_by_default() {
        let config = RetryConfig::default();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(&config, &CancellationToken::new(), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(server_error())
            }
        })
        .await;

        assert!(matches!(result, Err(Error::FetchFailed { status: Some(503), .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1, "no retries unless enabled");
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(&fast_config(3), &CancellationToken::new(), || {
            let counter = counter_clone.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(server_error())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(&fast_config(5), &CancellationToken::new(), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::http_status(
                    "https://host/x.jpg",
                    reqwest::StatusCode::NOT_FOUND,
                ))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(&fast_config(2), &CancellationToken::new(), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(server_error())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3, "initial + 2 retries");
    }

    #[tokio::test]
    async fn cancellation_interrupts_backoff() {
        let config = RetryConfig {
            initial_delay: Duration::from_secs(30),
            ..fast_config(3)
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = with_retry(&config, &cancel, || async { Err::<(), _>(server_error()) }).await;

        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn classifies_statuses() {
        assert!(server_error().is_retryable());
        assert!(
            Error::http_status("u", reqwest::StatusCode::TOO_MANY_REQUESTS).is_retryable()
        );
        assert!(!Error::http_status("u", reqwest::StatusCode::FORBIDDEN).is_retryable());
        assert!(!Error::Cancelled.is_retryable());
        assert!(
            !Error::ManifestMalformed {
                reason: "x".into(),
                source: None
            }
            .is_retryable()
        );
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let delay = Duration::from_millis(100);
        for _ in 0..20 {
            let jittered = add_jitter(delay);
            assert!(jittered >= delay);
            assert!(jittered <= delay * 2);
        }
    }
}
