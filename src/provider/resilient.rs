//! Circuit-breaker wrapper over a primary and a fallback provider
//!
//! CLOSED: calls go to the primary. A success resets the failure count; a
//! provider failure (timeout, transport, HTTP, malformed body) bumps it and,
//! at the threshold, opens the circuit. Request errors such as `Config` are
//! answered from the fallback without touching the count.
//! OPEN: calls go straight to the fallback. At the start of every call the
//! recovery window is checked; once it has passed since the last primary
//! failure the circuit closes again and that call tries the primary.
//!
//! A primary failure is answered from the fallback within the same call, so
//! callers only see an error when both providers fail.

use crate::core::config::CircuitConfig;
use crate::core::error::{ConductorError, Result};
use crate::decision::{Advice, DecisionRequest, DecisionResponse, WorldSummary};
use crate::provider::InferenceProvider;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const NAME: &str = "resilient";

/// Breaker state, owned by one `ResilientProvider`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CircuitState {
    pub using_fallback: bool,
    pub consecutive_failures: u32,
    pub last_failure_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Primary,
    Fallback,
}

pub struct ResilientProvider {
    primary: Arc<dyn InferenceProvider>,
    fallback: Arc<dyn InferenceProvider>,
    failure_threshold: u32,
    recovery_window: Duration,
    state: Mutex<CircuitState>,
}

impl ResilientProvider {
    pub fn new(
        primary: Arc<dyn InferenceProvider>,
        fallback: Arc<dyn InferenceProvider>,
        config: &CircuitConfig,
    ) -> Self {
        Self {
            primary,
            fallback,
            failure_threshold: config.failure_threshold.max(1),
            recovery_window: Duration::from_millis(config.recovery_window_ms),
            state: Mutex::new(CircuitState::default()),
        }
    }

    pub fn is_using_fallback(&self) -> bool {
        self.state.lock().using_fallback
    }

    pub fn circuit_state(&self) -> CircuitState {
        *self.state.lock()
    }

    /// Operator override: close the circuit unconditionally.
    pub fn force_primary(&self) {
        let mut state = self.state.lock();
        *state = CircuitState::default();
        tracing::info!("Circuit forced closed; routing to {}", self.primary.name());
    }

    /// Decide where the next call goes, closing the circuit first if the
    /// recovery window has passed.
    fn route(&self) -> Route {
        let mut state = self.state.lock();
        if state.using_fallback {
            let recovered = state
                .last_failure_at
                .map(|at| at.elapsed() > self.recovery_window)
                .unwrap_or(true);
            if recovered {
                state.using_fallback = false;
                state.consecutive_failures = 0;
                tracing::info!(
                    "Recovery window elapsed; retrying primary {}",
                    self.primary.name()
                );
            }
        }
        if state.using_fallback {
            Route::Fallback
        } else {
            Route::Primary
        }
    }

    fn record_primary_success(&self) {
        self.state.lock().consecutive_failures = 0;
    }

    fn record_primary_failure(&self) {
        let mut state = self.state.lock();
        state.consecutive_failures += 1;
        state.last_failure_at = Some(Instant::now());
        if !state.using_fallback && state.consecutive_failures >= self.failure_threshold {
            state.using_fallback = true;
            tracing::warn!(
                "Circuit open after {} consecutive failures; switching to {}",
                state.consecutive_failures,
                self.fallback.name()
            );
        }
    }

    fn exhausted(&self, primary: Option<&ConductorError>, fallback: &ConductorError) -> ConductorError {
        let message = match primary {
            Some(p) => format!(
                "{} failed ({}); {} failed ({})",
                self.primary.name(),
                p,
                self.fallback.name(),
                fallback
            ),
            None => format!("{} failed ({})", self.fallback.name(), fallback),
        };
        ConductorError::Unavailable(message)
    }
}

#[async_trait]
impl InferenceProvider for ResilientProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn decide_batch(&self, request: &DecisionRequest) -> Result<DecisionResponse> {
        match self.route() {
            Route::Primary => match self.primary.decide_batch(request).await {
                Ok(response) => {
                    self.record_primary_success();
                    Ok(response)
                }
                Err(primary_err) => {
                    if primary_err.is_provider_failure() {
                        self.record_primary_failure();
                    } else {
                        tracing::warn!(
                            "{} rejected the request ({}); not counted against the circuit",
                            self.primary.name(),
                            primary_err
                        );
                    }
                    self.fallback
                        .decide_batch(request)
                        .await
                        .map_err(|e| self.exhausted(Some(&primary_err), &e))
                }
            },
            Route::Fallback => self
                .fallback
                .decide_batch(request)
                .await
                .map_err(|e| self.exhausted(None, &e)),
        }
    }

    async fn advise(&self, summary: &WorldSummary) -> Result<Advice> {
        if !self.is_using_fallback() {
            match self.primary.advise(summary).await {
                Ok(advice) => return Ok(advice),
                Err(primary_err) => {
                    return self
                        .fallback
                        .advise(summary)
                        .await
                        .map_err(|e| self.exhausted(Some(&primary_err), &e));
                }
            }
        }
        self.fallback
            .advise(summary)
            .await
            .map_err(|e| self.exhausted(None, &e))
    }

    fn is_available(&self) -> bool {
        self.primary.is_available() || self.fallback.is_available()
    }

    fn average_latency(&self) -> Option<Duration> {
        if self.is_using_fallback() {
            self.fallback.average_latency()
        } else {
            self.primary.average_latency()
        }
    }

    fn is_degraded(&self) -> bool {
        self.is_using_fallback()
    }
}
