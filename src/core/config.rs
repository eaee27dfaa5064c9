//! Conductor configuration with documented defaults
//!
//! Everything the pipeline consumes from its owner lives here: the AI switch,
//! provider selection and connection parameters, batching bounds, timeouts and
//! the performance-mode selector. The file format is TOML; every field has a
//! default so a partial (or empty) file is valid.

use crate::core::error::{ConductorError, Result};
use crate::throttle::ThrottleMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Top-level configuration for the decision pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductorConfig {
    /// Master switch for provider-backed decisions
    ///
    /// When false the scheduler still advances the simulation every tick but
    /// never forms a batch; the domain layer keeps its own rule-based behavior.
    pub ai_enabled: bool,

    /// Period of the control loop in milliseconds (NORMAL profile baseline)
    pub tick_period_ms: u64,

    /// Smallest batch worth a provider call
    ///
    /// Also used as the tick-count rate limit: a new batch is only formed once
    /// this many ticks have passed since the previous dispatch.
    pub min_batch_size: usize,

    /// Largest batch sent in one provider call
    pub max_batch_size: usize,

    /// Agents considered for decisions per tick (NORMAL profile baseline)
    pub max_agents: usize,

    /// Minimum wall-clock gap between two provider calls
    pub decision_interval_ms: u64,

    /// Hard deadline for a single provider call; expired calls are aborted
    pub timeout_ms: u64,

    /// Whether the resilient wrapper may route to the fallback provider
    pub fallback_enabled: bool,

    /// `auto` follows the adaptive throttle, anything else pins a profile
    pub performance_mode: PerformanceMode,

    /// Consecutive ticks an agent may be deferred before it is dispatched alone
    pub max_deferrals: u32,

    /// Ticks between strategic `advise` calls (0 disables advice)
    pub advice_interval_ticks: u64,

    /// Ticks between status log lines emitted by the run loop (0 disables)
    pub status_interval_ticks: u64,

    pub cache: CacheConfig,
    pub circuit: CircuitConfig,
    pub throttle: ThrottleConfig,
    pub provider: ProviderConfig,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            ai_enabled: true,
            tick_period_ms: 300,
            min_batch_size: 3,
            max_batch_size: 10,
            max_agents: 500,
            decision_interval_ms: 1000,
            timeout_ms: 10_000,
            fallback_enabled: true,
            performance_mode: PerformanceMode::Auto,
            max_deferrals: 3,
            advice_interval_ticks: 200,
            status_interval_ticks: 50,
            cache: CacheConfig::default(),
            circuit: CircuitConfig::default(),
            throttle: ThrottleConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

/// Decision cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Disabling the cache only changes call volume, never outcomes
    pub enabled: bool,
    /// Entries older than this are treated as misses
    pub ttl_ms: u64,
    /// Maximum number of fingerprints held; oldest insertions are evicted
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_ms: 30_000,
            capacity: 1000,
        }
    }
}

/// Circuit breaker settings for the resilient provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    /// Consecutive primary failures that open the circuit
    pub failure_threshold: u32,
    /// Time since the last failure after which the primary is retried
    pub recovery_window_ms: u64,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_window_ms: 60_000,
        }
    }
}

/// Comfortable/critical pair for one monitored metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricThresholds {
    /// Below this the metric counts toward an upgrade
    pub comfortable: f64,
    /// At or above this the throttle degrades to ECO
    pub critical: f64,
}

/// Adaptive throttle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Size of every rolling window kept by the monitor
    pub window_size: usize,
    /// Ticks between CPU/memory samples
    pub sample_every_ticks: u64,
    /// CPU usage in percent
    pub cpu: MetricThresholds,
    /// Memory usage in percent
    pub memory: MetricThresholds,
    /// Average tick duration in milliseconds
    pub tick_ms: MetricThresholds,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            sample_every_ticks: 10,
            cpu: MetricThresholds {
                comfortable: 50.0,
                critical: 85.0,
            },
            memory: MetricThresholds {
                comfortable: 70.0,
                critical: 90.0,
            },
            tick_ms: MetricThresholds {
                comfortable: 50.0,
                critical: 150.0,
            },
        }
    }
}

/// Operator-facing performance selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceMode {
    /// Follow the adaptive throttle's recommendation every tick
    Auto,
    Eco,
    Normal,
    Performance,
}

impl PerformanceMode {
    /// The pinned throttle mode, or `None` when automatic
    pub fn fixed(self) -> Option<ThrottleMode> {
        match self {
            PerformanceMode::Auto => None,
            PerformanceMode::Eco => Some(ThrottleMode::Eco),
            PerformanceMode::Normal => Some(ThrottleMode::Normal),
            PerformanceMode::Performance => Some(ThrottleMode::Performance),
        }
    }
}

/// Which backend a provider slot uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// In-process heuristic model, never leaves the process
    Local,
    /// Generic JSON-over-HTTP decision endpoint
    Remote,
    /// Ollama local model server
    Ollama,
    /// Hosted chat API (Anthropic or OpenAI-compatible)
    Hosted,
}

impl FromStr for ProviderKind {
    type Err = ConductorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(ProviderKind::Local),
            "remote" | "http" => Ok(ProviderKind::Remote),
            "ollama" => Ok(ProviderKind::Ollama),
            "hosted" | "cloud" => Ok(ProviderKind::Hosted),
            other => Err(ConductorError::Config(format!(
                "unknown provider kind '{}'",
                other
            ))),
        }
    }
}

/// Provider selection plus per-backend connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub primary: ProviderKind,
    /// Used by the resilient wrapper; `None` runs the primary unwrapped
    pub fallback: Option<ProviderKind>,
    pub local: LocalProviderConfig,
    pub remote: RemoteProviderConfig,
    pub ollama: OllamaConfig,
    pub hosted: HostedConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            primary: ProviderKind::Ollama,
            fallback: Some(ProviderKind::Local),
            local: LocalProviderConfig::default(),
            remote: RemoteProviderConfig::default(),
            ollama: OllamaConfig::default(),
            hosted: HostedConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalProviderConfig {
    /// Artificial think time per call, useful for load experiments
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteProviderConfig {
    /// Base URL; batches are POSTed to `{url}/decide`, advice to `{url}/advise`
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for RemoteProviderConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".into(),
            model: "village-policy".into(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    pub temperature: f32,
    /// Upper bound on generated tokens per call
    pub num_predict: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".into(),
            model: "llama3.2".into(),
            temperature: 0.7,
            num_predict: 512,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostedConfig {
    /// Anthropic URLs select the Anthropic wire format, anything else is
    /// treated as OpenAI-compatible
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            url: "https://api.anthropic.com/v1/messages".into(),
            model: "claude-3-haiku-20240307".into(),
            api_key: None,
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

impl ConductorConfig {
    /// Load and validate a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse and validate a TOML string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: ConductorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `LLM_API_KEY`, `LLM_API_URL`, `LLM_MODEL` and `HIVE_PROVIDER`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            self.provider.hosted.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("LLM_API_URL") {
            self.provider.hosted.url = url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.provider.hosted.model = model;
        }
        if let Ok(kind) = std::env::var("HIVE_PROVIDER") {
            self.provider.primary = kind.parse()?;
        }
        Ok(())
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.min_batch_size == 0 {
            return Err(ConductorError::Config("min_batch_size must be at least 1".into()));
        }
        if self.min_batch_size > self.max_batch_size {
            return Err(ConductorError::Config(format!(
                "min_batch_size ({}) must be <= max_batch_size ({})",
                self.min_batch_size, self.max_batch_size
            )));
        }
        if self.max_agents == 0 {
            return Err(ConductorError::Config("max_agents must be positive".into()));
        }
        if self.tick_period_ms == 0 {
            return Err(ConductorError::Config("tick_period_ms must be positive".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ConductorError::Config("timeout_ms must be positive".into()));
        }
        if self.cache.capacity == 0 {
            return Err(ConductorError::Config("cache.capacity must be positive".into()));
        }
        if self.circuit.failure_threshold == 0 {
            return Err(ConductorError::Config(
                "circuit.failure_threshold must be positive".into(),
            ));
        }
        if self.throttle.window_size == 0 {
            return Err(ConductorError::Config(
                "throttle.window_size must be positive".into(),
            ));
        }
        for (name, t) in [
            ("cpu", self.throttle.cpu),
            ("memory", self.throttle.memory),
            ("tick_ms", self.throttle.tick_ms),
        ] {
            if t.comfortable >= t.critical {
                return Err(ConductorError::Config(format!(
                    "throttle.{}: comfortable ({}) must be < critical ({})",
                    name, t.comfortable, t.critical
                )));
            }
        }
        if self.provider.fallback == Some(self.provider.primary) {
            tracing::warn!(
                "Fallback provider is the same kind as the primary ({:?})",
                self.provider.primary
            );
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn decision_interval(&self) -> Duration {
        Duration::from_millis(self.decision_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
