//! Hive Conductor - decision pipeline for large agent populations
//!
//! A fixed-cadence tick scheduler batches agents that need a decision,
//! answers what it can from a fingerprint cache, and sends the rest to an
//! inference provider behind a circuit breaker. An adaptive throttle resizes
//! batches and cadence from observed load.

pub mod core;
pub mod decision;
pub mod demo;
pub mod provider;
pub mod scheduler;
pub mod throttle;

#[cfg(test)]
mod test_support;
