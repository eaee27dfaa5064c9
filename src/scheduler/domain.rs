//! Boundary between the scheduler and the simulation it drives

use crate::core::types::AgentId;
use crate::decision::{Action, Advice, AgentContext, WorldContext, WorldSummary};
use std::time::Duration;

/// The simulation side of the pipeline.
///
/// Every method is called from the tick and is expected to be cheap and
/// synchronous. An agent stays in `agents_needing_decision` until a decision
/// for it is applied.
pub trait DomainLayer: Send {
    /// Advance simulated time by the wall-clock delta since the previous tick.
    fn advance_simulation(&mut self, delta: Duration);

    /// Agents flagged as needing a decision, in priority order.
    fn agents_needing_decision(&mut self) -> Vec<AgentContext>;

    fn apply_decision(&mut self, agent_id: AgentId, action: Action);

    fn world_context(&self) -> WorldContext;

    /// Input for the strategic `advise` query.
    fn world_summary(&self) -> WorldSummary {
        WorldSummary {
            world: self.world_context(),
            ..WorldSummary::default()
        }
    }

    fn apply_advice(&mut self, _advice: &Advice) {}

    /// Active profile's population cap; domains that spawn agents should respect it.
    fn set_population_cap(&mut self, _cap: usize) {}
}
