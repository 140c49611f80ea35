use crate::shared::config::CircuitBreakerConfig;
use crate::shared::error::AppError;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Three-state guard for one remote dependency. Constructed and injected
/// by whichever component composes the system; never a module-level
/// singleton.
///
/// The open→half-open transition is checked lazily on the next call, not
/// via a timer, and half-open admits a single probe. A probe that never
/// reports back (its future dropped mid-flight) is replaced once another
/// timeout window elapses.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.inner
            .lock()
            .map(|inner| inner.state)
            .unwrap_or(CircuitState::Open)
    }

    /// Run `op` unless the circuit is open. Rejections carry the distinct
    /// `AppError::CircuitOpen` sentinel so callers can tell "we stopped
    /// trying" apart from the dependency's own failures.
    pub async fn execute<T, F, Fut>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        self.admit()?;

        match op().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(error) => {
                self.on_failure();
                Err(error)
            }
        }
    }

    fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.config.open_timeout_ms)
    }

    fn admit(&self) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        let elapsed = inner
            .opened_at
            .map(|at| at.elapsed())
            .unwrap_or_default();
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen => {
                if elapsed >= self.open_timeout() {
                    // the admitted probe never reported back; replace it
                    inner.opened_at = Some(Instant::now());
                    tracing::warn!(
                        target: "offline::net",
                        breaker = %self.name,
                        "half-open probe stalled; admitting a replacement"
                    );
                    Ok(())
                } else {
                    Err(self.rejection())
                }
            }
            CircuitState::Open => {
                if elapsed >= self.open_timeout() {
                    inner.state = CircuitState::HalfOpen;
                    inner.opened_at = Some(Instant::now());
                    tracing::info!(
                        target: "offline::net",
                        breaker = %self.name,
                        "open timeout elapsed; admitting half-open probe"
                    );
                    Ok(())
                } else {
                    Err(self.rejection())
                }
            }
        }
    }

    fn on_success(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            if inner.state == CircuitState::HalfOpen {
                tracing::info!(
                    target: "offline::net",
                    breaker = %self.name,
                    "probe succeeded; closing circuit"
                );
            }
            inner.state = CircuitState::Closed;
            inner.consecutive_failures = 0;
            inner.opened_at = None;
        }
    }

    fn on_failure(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            match inner.state {
                CircuitState::HalfOpen => self.trip(&mut inner, "probe failed"),
                CircuitState::Closed => {
                    inner.consecutive_failures += 1;
                    if inner.consecutive_failures >= self.config.failure_threshold {
                        self.trip(&mut inner, "failure threshold reached");
                    }
                }
                CircuitState::Open => {}
            }
        }
    }

    fn trip(&self, inner: &mut BreakerInner, reason: &str) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        tracing::warn!(
            target: "offline::net",
            breaker = %self.name,
            failures = inner.consecutive_failures,
            reason,
            "circuit opened"
        );
    }

    fn rejection(&self) -> AppError {
        AppError::CircuitOpen {
            dependency: self.name.clone(),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BreakerInner>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::Internal("circuit breaker state poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn breaker(threshold: u32, timeout_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            "remote-data",
            CircuitBreakerConfig {
                failure_threshold: threshold,
                open_timeout_ms: timeout_ms,
            },
        )
    }

    async fn fail(breaker: &CircuitBreaker) -> Result<(), AppError> {
        breaker
            .execute(|| async { Err::<(), _>(AppError::Network("unreachable".into())) })
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn opens_after_threshold_consecutive_failures() {
        let breaker = breaker(5, 60_000);

        for _ in 0..4 {
            let _ = fail(&breaker).await;
            assert_eq!(breaker.state(), CircuitState::Closed);
        }
        let _ = fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn open_circuit_rejects_without_invoking_operation() {
        let breaker = breaker(5, 60_000);
        for _ in 0..5 {
            let _ = fail(&breaker).await;
        }

        tokio::time::advance(Duration::from_millis(10)).await;

        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = breaker
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, AppError>(())
                }
            })
            .await;

        assert!(matches!(result, Err(AppError::CircuitOpen { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_elapse_admits_probe_and_success_closes() {
        let breaker = breaker(5, 60_000);
        for _ in 0..5 {
            let _ = fail(&breaker).await;
        }

        tokio::time::advance(Duration::from_millis(61_000)).await;

        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = breaker
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, AppError>("probe")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "probe");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(breaker.state(), CircuitState::Closed);

        // counter was reset, so it again takes a full run of failures
        for _ in 0..4 {
            let _ = fail(&breaker).await;
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn callers_during_an_in_flight_probe_are_rejected() {
        let breaker = Arc::new(breaker(2, 60_000));
        for _ in 0..2 {
            let _ = fail(&breaker).await;
        }
        tokio::time::advance(Duration::from_millis(61_000)).await;

        // park the probe on a channel so the breaker stays half-open
        let (release, parked) = tokio::sync::oneshot::channel::<()>();
        let probe = {
            let breaker = breaker.clone();
            tokio::spawn(async move {
                breaker
                    .execute(|| async move {
                        parked.await.ok();
                        Ok::<_, AppError>("probe")
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = breaker
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, AppError>(())
                }
            })
            .await;
        assert!(matches!(result, Err(AppError::CircuitOpen { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        release.send(()).unwrap();
        assert_eq!(probe.await.unwrap().unwrap(), "probe");
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_probe_is_replaced_after_another_timeout() {
        let breaker = Arc::new(breaker(2, 60_000));
        for _ in 0..2 {
            let _ = fail(&breaker).await;
        }
        tokio::time::advance(Duration::from_millis(61_000)).await;

        let probe = {
            let breaker = breaker.clone();
            tokio::spawn(async move {
                breaker
                    .execute(|| async {
                        std::future::pending::<()>().await;
                        Ok::<_, AppError>(())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        probe.abort();

        // within the window the dropped probe still holds the slot
        let result = breaker.execute(|| async { Ok::<_, AppError>(()) }).await;
        assert!(matches!(result, Err(AppError::CircuitOpen { .. })));

        tokio::time::advance(Duration::from_millis(61_000)).await;
        let result = breaker.execute(|| async { Ok::<_, AppError>(()) }).await;
        assert!(result.is_ok());
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_probe_reopens_with_fresh_window() {
        let breaker = breaker(2, 60_000);
        for _ in 0..2 {
            let _ = fail(&breaker).await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_millis(61_000)).await;
        let _ = fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);

        // the window restarted, so a call shortly after is still rejected
        tokio::time::advance(Duration::from_millis(1_000)).await;
        let result = fail(&breaker).await;
        assert!(matches!(result, Err(AppError::CircuitOpen { .. })));

        tokio::time::advance(Duration::from_millis(60_000)).await;
        let result = breaker.execute(|| async { Ok::<_, AppError>(()) }).await;
        assert!(result.is_ok());
        assert_eq!(breaker.state(), CircuitState::Closed);
    }
}
