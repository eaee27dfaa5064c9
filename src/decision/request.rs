//! Requests sent to providers and the decisions they produce

use crate::core::error::{ConductorError, Result};
use crate::core::types::AgentId;
use crate::decision::action::Action;
use crate::decision::context::{AgentContext, WorldContext};
use ahash::AHashMap;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// One batch of agents plus the world they share
///
/// Never empty. Decisions come back in the same order as `agents`.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRequest {
    world: WorldContext,
    agents: Vec<AgentContext>,
}

impl DecisionRequest {
    pub fn new(world: WorldContext, agents: Vec<AgentContext>) -> Result<Self> {
        if agents.is_empty() {
            return Err(ConductorError::Config(
                "a decision request needs at least one agent".into(),
            ));
        }
        Ok(Self { world, agents })
    }

    pub fn world(&self) -> &WorldContext {
        &self.world
    }

    pub fn agents(&self) -> &[AgentContext] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(|a| a.agent_id).collect()
    }
}

/// Where a decision came from. Carried for observability only.
#[derive(Debug, Display, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Provenance {
    #[display(fmt = "cache")]
    Cache,
    #[display(fmt = "provider:{}", _0)]
    Provider(String),
    /// Safe default substituted for a missing or failed decision
    #[display(fmt = "default")]
    Default,
}

impl Provenance {
    pub fn is_default(&self) -> bool {
        matches!(self, Provenance::Default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub agent_id: AgentId,
    pub action: Action,
    pub provenance: Provenance,
}

impl Decision {
    pub fn fallback(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            action: Action::default(),
            provenance: Provenance::Default,
        }
    }
}

/// Decisions for a whole request, aligned with its agent order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionResponse {
    pub decisions: Vec<Decision>,
}

impl DecisionResponse {
    /// Align positional actions with the request; gaps become defaults.
    pub fn from_positional(
        request: &DecisionRequest,
        actions: &[Option<Action>],
        provider: &str,
    ) -> Self {
        let decisions = request
            .agents()
            .iter()
            .enumerate()
            .map(|(i, agent)| match actions.get(i).copied().flatten() {
                Some(action) => Decision {
                    agent_id: agent.agent_id,
                    action,
                    provenance: Provenance::Provider(provider.to_string()),
                },
                None => Decision::fallback(agent.agent_id),
            })
            .collect();
        Self { decisions }
    }

    /// Align actions keyed by agent id with the request; gaps become defaults.
    pub fn from_keyed(
        request: &DecisionRequest,
        actions: &AHashMap<AgentId, Action>,
        provider: &str,
    ) -> Self {
        let decisions = request
            .agents()
            .iter()
            .map(|agent| match actions.get(&agent.agent_id) {
                Some(&action) => Decision {
                    agent_id: agent.agent_id,
                    action,
                    provenance: Provenance::Provider(provider.to_string()),
                },
                None => Decision::fallback(agent.agent_id),
            })
            .collect();
        Self { decisions }
    }

    pub fn default_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.provenance.is_default())
            .count()
    }
}

/// Input to the low-frequency strategic query
#[derive(Debug, Clone, Serialize, Default)]
pub struct WorldSummary {
    pub world: WorldContext,
    pub population: usize,
    /// Short human-readable facts, e.g. "food stores low"
    pub highlights: Vec<String>,
}

impl WorldSummary {
    pub fn render(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Era: {}\n", self.world.era));
        s.push_str(&format!("Time of day: {:?}\n", self.world.time_of_day));
        s.push_str(&format!("Global threat: {:?}\n", self.world.global_threat));
        s.push_str(&format!("Population: {}\n", self.population));
        if !self.highlights.is_empty() {
            s.push_str("\nRecent developments:\n");
            for line in &self.highlights {
                s.push_str(&format!("- {}\n", line));
            }
        }
        s
    }
}

/// Narrative or strategic hint. Informational, never required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    pub text: String,
    /// Action the advisor would emphasise village-wide, if it named one
    pub focus: Option<Action>,
    pub provenance: Provenance,
}
