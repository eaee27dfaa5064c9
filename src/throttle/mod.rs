//! Adaptive throttle: load sampling, mode recommendation and operating profiles

pub mod monitor;
pub mod probe;
pub mod profile;

pub use monitor::{PerformanceMonitor, PerformanceSample};
pub use probe::{FixedProbe, ResourceProbe, SystemProbe};
pub use profile::{OperatingParams, ThrottleMode};
