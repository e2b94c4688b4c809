//! Retry and circuit-breaker policies for the catalog read path.
//!
//! The breaker tracks an approximate failure ratio over a rolling window per
//! logical operation name. Once the ratio crosses the configured threshold it
//! opens and short-circuits calls for a cool-down period, then lets a single
//! probe through (half-open) before closing again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::ResilienceConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed,
    /// Short-circuiting: calls are blocked until the cool-down elapses.
    Open,
    /// One trial call is allowed to check whether the dependency recovered.
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    opened_at: Option<Instant>,
    window_start: Instant,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    inner: RwLock<BreakerInner>,
    successes: AtomicU32,
    failures: AtomicU32,
    failure_ratio: f64,
    min_calls: u32,
    cooldown: Duration,
    window: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_ratio: f64, min_calls: u32, cooldown: Duration, window: Duration) -> Self {
        Self {
            inner: RwLock::new(BreakerInner {
                state: CircuitState::Closed,
                opened_at: None,
                window_start: Instant::now(),
            }),
            successes: AtomicU32::new(0),
            failures: AtomicU32::new(0),
            failure_ratio,
            min_calls,
            cooldown,
            window,
        }
    }

    /// Whether the next call is allowed through.
    pub fn can_execute(&self) -> bool {
        let inner = self.inner.read().unwrap();

        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.cooldown)
                    .unwrap_or(true);
                if cooled_down {
                    drop(inner);
                    let mut inner = self.inner.write().unwrap();
                    // Another call may have transitioned already.
                    if inner.state == CircuitState::Open {
                        inner.state = CircuitState::HalfOpen;
                        info!("circuit breaker transitioning to half-open");
                    }
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => true,
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.write().unwrap();
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.opened_at = None;
                inner.window_start = Instant::now();
                self.successes.store(0, Ordering::Relaxed);
                self.failures.store(0, Ordering::Relaxed);
                info!("circuit breaker recovered, closing");
            }
            CircuitState::Closed => {
                self.roll_window(&mut inner);
                self.successes.fetch_add(1, Ordering::Relaxed);
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.write().unwrap();
        match inner.state {
            CircuitState::Closed => {
                self.roll_window(&mut inner);
                let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
                let total = failures + self.successes.load(Ordering::Relaxed);
                let ratio = failures as f64 / total as f64;
                if total >= self.min_calls && ratio >= self.failure_ratio {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    error!(
                        failures,
                        total, "circuit breaker OPENED, failure ratio {ratio:.2} over threshold"
                    );
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                warn!("circuit breaker probe failed, reopening");
            }
            CircuitState::Open => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.read().unwrap().state
    }

    // Counters approximate a rolling window: they reset once the window
    // elapses. Must be called with the write lock held.
    fn roll_window(&self, inner: &mut BreakerInner) {
        if inner.window_start.elapsed() >= self.window {
            inner.window_start = Instant::now();
            self.successes.store(0, Ordering::Relaxed);
            self.failures.store(0, Ordering::Relaxed);
        }
    }
}

/// One breaker per logical operation name, created lazily from shared
/// settings. Concurrent calls for the same operation share the same breaker.
pub struct BreakerRegistry {
    settings: ResilienceConfig,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    pub fn new(settings: ResilienceConfig) -> Self {
        Self {
            settings,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    pub fn breaker(&self, operation: &str) -> Arc<CircuitBreaker> {
        if let Some(found) = self.breakers.read().unwrap().get(operation) {
            return found.clone();
        }

        let mut breakers = self.breakers.write().unwrap();
        breakers
            .entry(operation.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    self.settings.breaker_failure_ratio,
                    self.settings.breaker_min_calls,
                    Duration::from_secs(self.settings.breaker_cooldown_seconds),
                    Duration::from_secs(self.settings.breaker_window_seconds),
                ))
            })
            .clone()
    }
}

/// Bounded retry with exponential backoff. Applies to transient read
/// failures only; writes are never auto-retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::new(
            config.retry_max_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
        )
    }

    /// Delay before the given retry, doubling per attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(ratio: f64, min_calls: u32, cooldown: Duration) -> CircuitBreaker {
        CircuitBreaker::new(ratio, min_calls, cooldown, Duration::from_secs(60))
    }

    #[test]
    fn stays_closed_below_min_calls() {
        let cb = breaker(0.5, 5, Duration::from_secs(30));
        for _ in 0..4 {
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.can_execute());
    }

    #[test]
    fn opens_when_ratio_crosses_threshold() {
        let cb = breaker(0.5, 4, Duration::from_secs(30));
        cb.record_success();
        cb.record_success();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.can_execute());
    }

    #[test]
    fn stays_closed_when_failures_are_minority() {
        let cb = breaker(0.5, 4, Duration::from_secs(30));
        for _ in 0..6 {
            cb.record_success();
        }
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_probe_closes_on_success() {
        let cb = breaker(1.0, 1, Duration::from_secs(0));
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);

        // Zero cool-down: the next execution check moves to half-open.
        assert!(cb.can_execute());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.can_execute());
    }

    #[test]
    fn half_open_probe_reopens_on_failure() {
        let cb = breaker(1.0, 1, Duration::from_secs(0));
        cb.record_failure();
        assert!(cb.can_execute());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn blocks_while_cooling_down() {
        let cb = breaker(1.0, 1, Duration::from_secs(3600));
        cb.record_failure();
        assert!(!cb.can_execute());
        assert!(!cb.can_execute());
    }

    #[test]
    fn registry_shares_breakers_per_operation() {
        let registry = BreakerRegistry::new(crate::config::ResilienceConfig {
            retry_max_attempts: 3,
            retry_base_delay_ms: 1,
            read_timeout_ms: 1000,
            breaker_failure_ratio: 1.0,
            breaker_min_calls: 1,
            breaker_cooldown_seconds: 3600,
            breaker_window_seconds: 60,
        });

        registry.breaker("list_events").record_failure();
        assert_eq!(
            registry.breaker("list_events").state(),
            CircuitState::Open
        );
        // Distinct operation, distinct breaker.
        assert_eq!(registry.breaker("get_event").state(), CircuitState::Closed);
    }

    #[test]
    fn retry_delay_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(3), Duration::from_millis(400));
    }
}
