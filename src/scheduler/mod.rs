//! Fixed-cadence control loop and batch formation

pub mod batcher;
pub mod domain;
pub mod status;
pub mod tick;

pub use batcher::{BatchPlan, Batcher};
pub use domain::DomainLayer;
pub use status::{Counters, StatusSnapshot};
pub use tick::TickScheduler;
