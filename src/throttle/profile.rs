//! Operating profiles
//!
//! Each throttle mode maps to a set of concrete operating parameters through a
//! static table of scale factors applied to the configured (NORMAL) baseline.

use crate::core::config::ConductorConfig;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Named operating profile, ordered from lightest to heaviest load
#[derive(
    Debug,
    Display,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThrottleMode {
    #[display(fmt = "ECO")]
    Eco,
    #[default]
    #[display(fmt = "NORMAL")]
    Normal,
    #[display(fmt = "PERFORMANCE")]
    Performance,
}

/// Parameters the scheduler uses for subsequent ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingParams {
    /// Population cap pushed to the domain and applied to batch formation
    pub max_agents: usize,
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    pub decision_interval: Duration,
    pub tick_period: Duration,
}

impl OperatingParams {
    /// The configured values, used verbatim as the NORMAL profile.
    pub fn from_config(config: &ConductorConfig) -> Self {
        Self {
            max_agents: config.max_agents,
            min_batch_size: config.min_batch_size,
            max_batch_size: config.max_batch_size,
            decision_interval: config.decision_interval(),
            tick_period: config.tick_period(),
        }
    }
}

struct ProfileScale {
    agents: f64,
    batch: f64,
    interval: f64,
    tick: f64,
}

const PROFILES: [(ThrottleMode, ProfileScale); 3] = [
    (
        ThrottleMode::Eco,
        ProfileScale {
            agents: 0.5,
            batch: 0.5,
            interval: 2.0,
            tick: 2.0,
        },
    ),
    (
        ThrottleMode::Normal,
        ProfileScale {
            agents: 1.0,
            batch: 1.0,
            interval: 1.0,
            tick: 1.0,
        },
    ),
    (
        ThrottleMode::Performance,
        ProfileScale {
            agents: 1.5,
            batch: 1.0,
            interval: 0.5,
            tick: 0.75,
        },
    ),
];

fn scale_of(mode: ThrottleMode) -> &'static ProfileScale {
    PROFILES
        .iter()
        .find(|(m, _)| *m == mode)
        .map(|(_, scale)| scale)
        .unwrap_or(&PROFILES[1].1)
}

fn scale_duration(duration: Duration, factor: f64) -> Duration {
    Duration::from_nanos((duration.as_nanos() as f64 * factor).round() as u64)
}

impl ThrottleMode {
    /// Derive this mode's parameters from the NORMAL baseline.
    ///
    /// Batch size stays within `[min_batch_size, base.max_batch_size]` and the
    /// tick period never drops below one millisecond.
    pub fn apply(self, base: &OperatingParams) -> OperatingParams {
        let scale = scale_of(self);
        let max_batch = ((base.max_batch_size as f64 * scale.batch).round() as usize)
            .clamp(base.min_batch_size, base.max_batch_size);
        let max_agents = ((base.max_agents as f64 * scale.agents).round() as usize).max(1);

        OperatingParams {
            max_agents,
            min_batch_size: base.min_batch_size,
            max_batch_size: max_batch,
            decision_interval: scale_duration(base.decision_interval, scale.interval),
            tick_period: scale_duration(base.tick_period, scale.tick).max(Duration::from_millis(1)),
        }
    }
}
