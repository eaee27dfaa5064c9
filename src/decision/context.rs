//! Per-agent and per-batch snapshots handed to providers
//!
//! Contexts are produced fresh by the domain layer every tick and never
//! mutated here. The fingerprint reduces a context to the fields that drive
//! a decision, bucketed so that behaviorally identical agents share a key.

use crate::core::types::AgentId;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::hash::{BuildHasher, Hash, Hasher};

/// Number of buckets each urgency score is quantized into
pub const NEED_BUCKETS: u8 = 4;

// Fixed seeds keep fingerprints stable across processes and runs.
const FINGERPRINT_SEEDS: (u64, u64, u64, u64) = (
    0x5eed_0f_a9e7_c0de,
    0x0bad_cafe_f00d_d00d,
    0x7a1e_5eed_0000_0001,
    0x1234_5678_9abc_def0,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Farmer,
    Miner,
    Builder,
    Merchant,
    Guard,
    Healer,
    Priest,
    Crafter,
    Scout,
    Unemployed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Child,
    Adult,
    Elder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Content,
    Joyful,
    Anxious,
    Angry,
    Grieving,
}

/// Discretized danger, shared by agents and the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    #[default]
    None,
    Low,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    None,
    Mining,
    Farming,
    Building,
    Crafting,
    Trading,
    Patrolling,
    Resting,
}

/// Urgency scores, each in `0.0..=1.0` (1.0 = most urgent)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Needs {
    pub hunger: f32,
    pub fatigue: f32,
    pub social: f32,
    pub safety: f32,
}

impl Needs {
    /// Quantize each score into `NEED_BUCKETS` levels
    pub fn bucketed(&self) -> [u8; 4] {
        [
            bucket(self.hunger),
            bucket(self.fatigue),
            bucket(self.social),
            bucket(self.safety),
        ]
    }
}

fn bucket(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    let scaled = (value.clamp(0.0, 1.0) * NEED_BUCKETS as f32) as u8;
    scaled.min(NEED_BUCKETS - 1)
}

/// Immutable snapshot of one agent's decision-relevant state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentContext {
    pub agent_id: AgentId,
    pub name: String,
    pub role: Role,
    pub life_stage: LifeStage,
    pub needs: Needs,
    pub mood: Mood,
    /// Coarse location tag, e.g. "market" or "north_mine"
    pub location: String,
    pub threat: ThreatLevel,
    pub nearby_resources: Vec<String>,
    pub recent_events: Vec<String>,
    pub current_task: TaskKind,
}

impl AgentContext {
    /// Cache key covering role, life stage, bucketed needs, mood, threat and task.
    ///
    /// Identity, name, location and the nearby lists are deliberately absent.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = ahash::RandomState::with_seeds(
            FINGERPRINT_SEEDS.0,
            FINGERPRINT_SEEDS.1,
            FINGERPRINT_SEEDS.2,
            FINGERPRINT_SEEDS.3,
        )
        .build_hasher();
        self.role.hash(&mut hasher);
        self.life_stage.hash(&mut hasher);
        self.needs.bucketed().hash(&mut hasher);
        self.mood.hash(&mut hasher);
        self.threat.hash(&mut hasher);
        self.current_task.hash(&mut hasher);
        Fingerprint(hasher.finish())
    }
}

/// Deterministic hash of the decision-relevant part of an `AgentContext`
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "{:016x}", _0)]
pub struct Fingerprint(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Dawn,
    #[default]
    Day,
    Dusk,
    Night,
}

/// Coarse global state shared by every agent in one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WorldContext {
    pub time_of_day: TimeOfDay,
    pub era: String,
    pub global_threat: ThreatLevel,
}
