//! Performance monitor with asymmetric-hysteresis mode recommendation

use crate::core::config::{MetricThresholds, ThrottleConfig};
use crate::core::window::RollingWindow;
use crate::throttle::probe::ResourceProbe;
use crate::throttle::profile::ThrottleMode;
use std::time::Duration;
use tokio::time::Instant;

/// One point-in-time reading of host and pipeline load
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub avg_tick_duration_ms: f64,
    pub avg_inference_latency_ms: f64,
    pub active_agent_count: usize,
    pub timestamp: Instant,
}

impl PerformanceSample {
    pub fn new(
        cpu_percent: f64,
        memory_percent: f64,
        avg_tick_duration_ms: f64,
        avg_inference_latency_ms: f64,
        active_agent_count: usize,
    ) -> Self {
        Self {
            cpu_percent,
            memory_percent,
            avg_tick_duration_ms,
            avg_inference_latency_ms,
            active_agent_count,
            timestamp: Instant::now(),
        }
    }
}

/// Tracks tick durations, inference latencies and resource samples
///
/// Recommendation rules, evaluated against the most recent sample:
/// - any metric at or above its critical threshold degrades straight to ECO;
/// - a full window in which every metric of every sample is below its
///   comfortable threshold upgrades to PERFORMANCE;
/// - otherwise PERFORMANCE steps down to NORMAL when the latest sample is no
///   longer comfortable, and every other mode holds.
pub struct PerformanceMonitor {
    config: ThrottleConfig,
    probe: Box<dyn ResourceProbe>,
    tick_durations: RollingWindow<Duration>,
    inference_latencies: RollingWindow<Duration>,
    samples: RollingWindow<PerformanceSample>,
    mode: ThrottleMode,
    started_at: Instant,
}

impl PerformanceMonitor {
    pub fn new(config: ThrottleConfig, probe: Box<dyn ResourceProbe>) -> Self {
        let window = config.window_size;
        Self {
            config,
            probe,
            tick_durations: RollingWindow::new(window),
            inference_latencies: RollingWindow::new(window),
            samples: RollingWindow::new(window),
            mode: ThrottleMode::Normal,
            started_at: Instant::now(),
        }
    }

    pub fn record_tick(&mut self, duration: Duration) {
        self.tick_durations.push(duration);
    }

    pub fn record_inference(&mut self, latency: Duration) {
        self.inference_latencies.push(latency);
    }

    /// Read the probe, combine it with the rolling averages and store the result.
    pub fn sample(&mut self, active_agent_count: usize) -> PerformanceSample {
        let sample = PerformanceSample::new(
            self.probe.cpu_percent(),
            self.probe.memory_percent(),
            self.avg_tick_duration_ms(),
            self.avg_inference_latency_ms(),
            active_agent_count,
        );
        self.push_sample(sample);
        sample
    }

    pub fn push_sample(&mut self, sample: PerformanceSample) {
        self.samples.push(sample);
    }

    pub fn latest_sample(&self) -> Option<&PerformanceSample> {
        self.samples.latest()
    }

    pub fn avg_tick_duration_ms(&self) -> f64 {
        to_ms(self.tick_durations.mean())
    }

    pub fn last_tick_duration_ms(&self) -> f64 {
        to_ms(self.tick_durations.latest().copied())
    }

    pub fn avg_inference_latency_ms(&self) -> f64 {
        to_ms(self.inference_latencies.mean())
    }

    /// Ticks per second implied by the average tick duration plus the period
    pub fn tick_rate(&self, tick_period: Duration) -> f64 {
        let per_tick = tick_period.as_secs_f64().max(self.avg_tick_duration_ms() / 1000.0);
        if per_tick > 0.0 {
            1.0 / per_tick
        } else {
            0.0
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Evaluate the sample window and update the current mode.
    pub fn recommend_mode(&mut self) -> ThrottleMode {
        let Some(latest) = self.samples.latest() else {
            return self.mode;
        };

        let next = if self.is_critical(latest) {
            ThrottleMode::Eco
        } else if self.samples.is_full() && self.samples.iter().all(|s| self.is_comfortable(s)) {
            ThrottleMode::Performance
        } else if self.mode == ThrottleMode::Performance && !self.is_comfortable(latest) {
            ThrottleMode::Normal
        } else {
            self.mode
        };

        if next != self.mode {
            tracing::info!(
                "Throttle mode {} -> {} (cpu {:.0}%, mem {:.0}%, tick {:.1}ms)",
                self.mode,
                next,
                latest.cpu_percent,
                latest.memory_percent,
                latest.avg_tick_duration_ms
            );
            self.mode = next;
        }
        next
    }

    fn metrics(&self, sample: &PerformanceSample) -> [(f64, MetricThresholds); 3] {
        [
            (sample.cpu_percent, self.config.cpu),
            (sample.memory_percent, self.config.memory),
            (sample.avg_tick_duration_ms, self.config.tick_ms),
        ]
    }

    fn is_critical(&self, sample: &PerformanceSample) -> bool {
        self.metrics(sample)
            .iter()
            .any(|(value, t)| *value >= t.critical)
    }

    fn is_comfortable(&self, sample: &PerformanceSample) -> bool {
        self.metrics(sample)
            .iter()
            .all(|(value, t)| *value < t.comfortable)
    }
}

fn to_ms(duration: Option<Duration>) -> f64 {
    duration.map(|d| d.as_secs_f64() * 1000.0).unwrap_or(0.0)
}
