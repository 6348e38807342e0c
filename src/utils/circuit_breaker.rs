use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

// ============================================================================
// Circuit Breaker
// ============================================================================
//
// Guards calls to an outbound dependency (the notification broker). After
// `failure_threshold` consecutive failures the breaker opens and rejects calls
// without touching the dependency. Once `open_for` has elapsed a trial call is
// let through (half-open); `success_threshold` successes close it again, any
// failure reopens it.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }

    /// Encoding used for the circuit breaker gauge
    pub fn gauge_value(&self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::HalfOpen => 1,
            CircuitState::Open => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// How long the circuit stays open before a trial call
    pub open_for: Duration,
    /// Successes in half-open needed to close
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_for: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker is open")]
    CircuitOpen,

    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

struct Counters {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
}

#[derive(Clone)]
pub struct CircuitBreaker {
    counters: Arc<Mutex<Counters>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            counters: Arc::new(Mutex::new(Counters {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                half_open_successes: 0,
                opened_at: None,
            })),
            config,
        }
    }

    /// Run `operation` unless the circuit is open
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        if !self.admit().await {
            return Err(CircuitBreakerError::CircuitOpen);
        }

        match operation.await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(err) => {
                self.on_failure().await;
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.counters.lock().await.state
    }

    async fn admit(&self) -> bool {
        let mut counters = self.counters.lock().await;

        if counters.state != CircuitState::Open {
            return true;
        }

        let cooled_down = counters
            .opened_at
            .map_or(true, |opened_at| opened_at.elapsed() >= self.config.open_for);

        if cooled_down {
            tracing::info!("Circuit breaker half-open, allowing trial call");
            counters.state = CircuitState::HalfOpen;
            counters.half_open_successes = 0;
        }

        cooled_down
    }

    async fn on_success(&self) {
        let mut counters = self.counters.lock().await;
        counters.consecutive_failures = 0;

        if counters.state == CircuitState::HalfOpen {
            counters.half_open_successes += 1;
            if counters.half_open_successes >= self.config.success_threshold {
                tracing::info!(
                    successes = counters.half_open_successes,
                    "Circuit breaker closed"
                );
                counters.state = CircuitState::Closed;
                counters.half_open_successes = 0;
                counters.opened_at = None;
            }
        }
    }

    async fn on_failure(&self) {
        let mut counters = self.counters.lock().await;
        counters.consecutive_failures += 1;

        let trip = match counters.state {
            CircuitState::Closed => counters.consecutive_failures >= self.config.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };

        if trip {
            tracing::warn!(
                failures = counters.consecutive_failures,
                from = counters.state.as_str(),
                "Circuit breaker opened"
            );
            counters.state = CircuitState::Open;
            counters.half_open_successes = 0;
            counters.opened_at = Some(Instant::now());
        }
    }
}
