//! Observability surface

use crate::core::types::Tick;
use crate::throttle::ThrottleMode;
use serde::Serialize;
use std::fmt;

/// Running totals kept by the scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Decisions produced by a provider and applied
    pub provider_decisions: u64,
    /// Safe defaults applied after a failed or unparseable call
    pub default_decisions: u64,
    pub provider_failures: u64,
    pub forced_dispatches: u64,
    pub batches_dispatched: u64,
    pub advice_received: u64,
    pub tick_faults: u64,
}

/// Point-in-time view of the pipeline for status reporters
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub tick: Tick,
    pub tick_rate: f64,
    pub last_tick_ms: f64,
    pub avg_tick_ms: f64,
    pub queued_decisions: usize,
    pub deferred_agents: usize,
    pub in_flight: bool,
    pub avg_inference_latency_ms: f64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub uptime_secs: f64,
    pub mode: ThrottleMode,
    pub provider: String,
    pub provider_available: bool,
    /// The provider is answering from its fallback
    pub degraded: bool,
    pub cache_entries: usize,
    #[serde(flatten)]
    pub counters: Counters,
}

impl StatusSnapshot {
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.counters.cache_hits + self.counters.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.counters.cache_hits as f64 / total as f64
        }
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick {} | {:.1} t/s | tick {:.1}ms (avg {:.1}) | queued {} | {} | {} {}{} | \
             latency {:.0}ms | cache {:.0}% | decisions {} (+{} default) | failures {} | cpu {:.0}% mem {:.0}% | up {:.0}s",
            self.tick,
            self.tick_rate,
            self.last_tick_ms,
            self.avg_tick_ms,
            self.queued_decisions,
            self.mode,
            self.provider,
            if self.provider_available { "up" } else { "down" },
            if self.degraded { " (fallback)" } else { "" },
            self.avg_inference_latency_ms,
            self.cache_hit_rate() * 100.0,
            self.counters.provider_decisions,
            self.counters.default_decisions,
            self.counters.provider_failures,
            self.cpu_percent,
            self.memory_percent,
            self.uptime_secs
        )
    }
}
