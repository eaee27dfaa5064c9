//! Decision data model and memoization
//!
//! Contexts flow in from the domain layer, requests flow out to providers,
//! decisions flow back. The cache short-circuits providers for recently seen
//! fingerprints.

pub mod action;
pub mod cache;
pub mod context;
pub mod request;

pub use action::Action;
pub use cache::DecisionCache;
pub use context::{
    AgentContext, Fingerprint, LifeStage, Mood, Needs, Role, TaskKind, ThreatLevel, TimeOfDay,
    WorldContext,
};
pub use request::{Advice, Decision, DecisionRequest, DecisionResponse, Provenance, WorldSummary};
