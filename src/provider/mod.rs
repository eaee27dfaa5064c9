//! Inference providers
//!
//! Every backend implements [`InferenceProvider`]; the scheduler and the
//! resilient wrapper only ever see `Arc<dyn InferenceProvider>`. Adding a
//! backend means implementing the trait and adding a branch to
//! [`build_single`].
//!
//! Each concrete provider owns a [`ProviderHealth`], which enforces the call
//! timeout (the timed-out future is dropped, which aborts the underlying
//! request) and keeps the rolling latency window and availability flag.

pub mod hosted;
pub mod http;
pub mod local;
pub mod ollama;
pub mod prompt;
pub mod remote;
pub mod resilient;

use crate::core::config::{ConductorConfig, ProviderKind};
use crate::core::error::{ConductorError, Result};
use crate::core::window::RollingWindow;
use crate::decision::{Advice, DecisionRequest, DecisionResponse, WorldSummary};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub use hosted::HostedProvider;
pub use local::LocalProvider;
pub use ollama::OllamaProvider;
pub use remote::RemoteProvider;
pub use resilient::ResilientProvider;

/// Samples kept in each provider's latency window
pub const LATENCY_WINDOW: usize = 32;

/// Uniform capability interface over one decision service
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Short stable name used in logs and decision provenance
    fn name(&self) -> &str;

    /// Decide every agent in `request`, in request order.
    async fn decide_batch(&self, request: &DecisionRequest) -> Result<DecisionResponse>;

    /// Low-frequency strategic hint about the world as a whole.
    async fn advise(&self, summary: &WorldSummary) -> Result<Advice>;

    /// False after a failed call, until the next success
    fn is_available(&self) -> bool;

    fn average_latency(&self) -> Option<Duration>;

    /// True while a wrapper is serving from its fallback
    fn is_degraded(&self) -> bool {
        false
    }
}

#[derive(Debug)]
struct HealthState {
    latencies: RollingWindow<Duration>,
    available: bool,
    calls: u64,
    failures: u64,
}

/// Timeout enforcement plus latency/availability bookkeeping for one provider
#[derive(Debug)]
pub struct ProviderHealth {
    name: String,
    timeout: Duration,
    state: Mutex<HealthState>,
}

impl ProviderHealth {
    pub fn new(name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            timeout,
            state: Mutex::new(HealthState {
                latencies: RollingWindow::new(LATENCY_WINDOW),
                available: true,
                calls: 0,
                failures: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `call` under the hard timeout and record the outcome.
    ///
    /// On expiry `call` is dropped mid-flight, which cancels whatever it was
    /// awaiting (an HTTP request, a sleep) rather than letting it finish.
    pub async fn observe<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ConductorError::Timeout {
                provider: self.name.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };
        let elapsed = started.elapsed();

        let mut state = self.state.lock();
        state.calls += 1;
        state.latencies.push(elapsed);
        match &outcome {
            Ok(_) => state.available = true,
            Err(e) => {
                state.available = false;
                state.failures += 1;
                tracing::warn!("Provider {} call failed after {:?}: {}", self.name, elapsed, e);
            }
        }
        outcome
    }

    pub fn is_available(&self) -> bool {
        self.state.lock().available
    }

    pub fn average_latency(&self) -> Option<Duration> {
        self.state.lock().latencies.mean()
    }

    pub fn calls(&self) -> u64 {
        self.state.lock().calls
    }

    pub fn failures(&self) -> u64 {
        self.state.lock().failures
    }
}

/// Build the configured provider stack: the primary alone, or primary and
/// fallback behind a circuit breaker when a fallback is configured and enabled.
pub fn build_provider(config: &ConductorConfig) -> Result<Arc<dyn InferenceProvider>> {
    let primary = build_single(config.provider.primary, config)?;
    match config.provider.fallback {
        Some(kind) if config.fallback_enabled => {
            let fallback = build_single(kind, config)?;
            tracing::info!(
                "Provider stack: {} with fallback {}",
                primary.name(),
                fallback.name()
            );
            Ok(Arc::new(ResilientProvider::new(
                primary,
                fallback,
                &config.circuit,
            )))
        }
        _ => {
            tracing::info!("Provider stack: {} (no fallback)", primary.name());
            Ok(primary)
        }
    }
}

/// Build one concrete provider of `kind` from its connection parameters.
pub fn build_single(
    kind: ProviderKind,
    config: &ConductorConfig,
) -> Result<Arc<dyn InferenceProvider>> {
    let timeout = config.timeout();
    let provider: Arc<dyn InferenceProvider> = match kind {
        ProviderKind::Local => Arc::new(LocalProvider::new(
            timeout,
            Duration::from_millis(config.provider.local.latency_ms),
        )),
        ProviderKind::Remote => Arc::new(RemoteProvider::new(&config.provider.remote, timeout)?),
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(&config.provider.ollama, timeout)?),
        ProviderKind::Hosted => Arc::new(HostedProvider::new(&config.provider.hosted, timeout)?),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_observe_success_marks_available() {
        let health = ProviderHealth::new("test", Duration::from_millis(100));
        let value = health
            .observe(async {
                tokio::time::sleep(Duration::from_millis(40)).await;
                Ok(7)
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert!(health.is_available());
        assert_eq!(health.average_latency(), Some(Duration::from_millis(40)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_timeout_marks_unavailable_until_success() {
        let health = ProviderHealth::new("slow", Duration::from_millis(100));
        let result: Result<()> = health
            .observe(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;
        assert!(matches!(
            result,
            Err(ConductorError::Timeout { timeout_ms: 100, .. })
        ));
        assert!(!health.is_available());
        assert_eq!(health.failures(), 1);

        health.observe(async { Ok(()) }).await.unwrap();
        assert!(health.is_available());
        assert_eq!(health.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_drops_the_inner_call() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let health = ProviderHealth::new("slow", Duration::from_millis(50));
        let _ = health
            .observe(async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_build_local_without_fallback() {
        let mut config = ConductorConfig::default();
        config.provider.primary = ProviderKind::Local;
        config.provider.fallback = None;
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "local");
        assert!(!provider.is_degraded());
    }

    #[test]
    fn test_build_wraps_with_fallback() {
        let mut config = ConductorConfig::default();
        config.provider.primary = ProviderKind::Ollama;
        config.provider.fallback = Some(ProviderKind::Local);
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "resilient");
    }

    #[test]
    fn test_fallback_disabled_skips_wrapper() {
        let mut config = ConductorConfig::default();
        config.fallback_enabled = false;
        config.provider.primary = ProviderKind::Ollama;
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_hosted_requires_api_key() {
        let mut config = ConductorConfig::default();
        config.provider.primary = ProviderKind::Hosted;
        config.provider.hosted.api_key = None;
        assert!(matches!(
            build_single(ProviderKind::Hosted, &config),
            Err(ConductorError::Config(_))
        ));
    }
}
