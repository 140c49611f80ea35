use crate::shared::config::RetryConfig;
use crate::shared::error::AppError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Built-in taxonomy plus any message patterns configured by the caller.
pub fn is_retryable(error: &AppError, config: &RetryConfig) -> bool {
    if error.is_retryable() {
        return true;
    }
    if config.retryable_patterns.is_empty() {
        return false;
    }
    let message = error.to_string();
    config
        .retryable_patterns
        .iter()
        .any(|pattern| message.contains(pattern.as_str()))
}

/// `initial_delay × multiplier^(attempt−1)`, up to 10% jitter, capped at
/// `max_delay`.
fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let base = config.initial_delay_ms as f64 * config.backoff_multiplier.powi(exponent as i32);
    let jitter = base * rand::thread_rng().gen_range(0.0..0.1);
    let capped = (base + jitter).min(config.max_delay_ms as f64);
    Duration::from_millis(capped as u64)
}

/// Run `op` with bounded retries. Fatal errors are classified before the
/// attempt count is consulted, so they abort on attempt 1 regardless of
/// `max_retries`. The token is checked before every backoff sleep.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let max_retries = config.max_retries.max(1);
    let mut attempt = 1u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !is_retryable(&error, config) {
                    return Err(error);
                }
                if attempt >= max_retries {
                    return Err(error);
                }

                let delay = backoff_delay(config, attempt);
                tracing::debug!(
                    target: "offline::net",
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient failure; backing off before retry"
                );

                if cancel.is_cancelled() {
                    return Err(AppError::Cancelled);
                }
                tokio::select! {
                    _ = cancel.cancelled() => return Err(AppError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }

                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn config(max_retries: u32, initial_ms: u64, max_ms: u64) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: initial_ms,
            max_delay_ms: max_ms,
            backoff_multiplier: 2.0,
            retryable_patterns: Vec::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_makes_one_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_with_backoff(&config(5, 100, 1_000), &CancellationToken::new(), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AppError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_aborts_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), AppError> =
            retry_with_backoff(&config(5, 100, 1_000), &CancellationToken::new(), || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::Validation("bad payload".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_error_is_retried_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_with_backoff(&config(5, 100, 1_000), &CancellationToken::new(), || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AppError::Network("connection refused".into()))
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_rethrow_last_error_with_bounded_delay() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let started = Instant::now();

        // delays: ≤110ms, ≤220ms, then capped at 250ms
        let result: Result<(), AppError> =
            retry_with_backoff(&config(4, 100, 250), &CancellationToken::new(), || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::Timeout("deadline exceeded".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(AppError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(550), "elapsed {elapsed:?}");
        assert!(elapsed <= Duration::from_millis(580), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_stops_before_the_backoff_sleep() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<(), AppError> =
            retry_with_backoff(&config(5, 100, 1_000), &cancel, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::Network("unreachable".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(AppError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn configured_patterns_extend_classification() {
        let mut config = config(2, 10, 100);
        config.retryable_patterns = vec!["socket hang up".to_string()];
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), AppError> =
            retry_with_backoff(&config, &CancellationToken::new(), || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::Internal("socket hang up".into()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
