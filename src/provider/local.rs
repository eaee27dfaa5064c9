//! In-process heuristic model
//!
//! Never touches the network, so it makes a natural fallback. It reads the
//! same contexts a remote model would and applies a fixed priority ladder:
//! threats, then desperate needs, then the current task, then the role's
//! default work.

use crate::core::error::Result;
use crate::decision::{
    Action, Advice, AgentContext, DecisionRequest, DecisionResponse, LifeStage, Provenance, Role,
    TaskKind, ThreatLevel, TimeOfDay, WorldContext, WorldSummary,
};
use crate::provider::{InferenceProvider, ProviderHealth};
use async_trait::async_trait;
use std::time::Duration;

const NAME: &str = "local";

/// Need score at which an agent drops its work to address it
const URGENT_NEED: f32 = 0.75;

pub struct LocalProvider {
    health: ProviderHealth,
    think_time: Duration,
}

impl LocalProvider {
    /// `think_time` is slept inside every call (zero for none).
    pub fn new(timeout: Duration, think_time: Duration) -> Self {
        Self {
            health: ProviderHealth::new(NAME, timeout),
            think_time,
        }
    }

    async fn think(&self) {
        if !self.think_time.is_zero() {
            tokio::time::sleep(self.think_time).await;
        }
    }
}

/// Pick an action for one agent
pub fn choose_action(agent: &AgentContext, world: &WorldContext) -> Action {
    let threat = agent.threat.max(world.global_threat);
    if threat >= ThreatLevel::High {
        return match agent.role {
            Role::Guard => Action::Defend,
            Role::Healer if agent.life_stage == LifeStage::Adult => Action::Heal,
            _ => Action::Flee,
        };
    }

    let needs = &agent.needs;
    if needs.hunger >= URGENT_NEED {
        return Action::Eat;
    }
    if needs.fatigue >= URGENT_NEED || (world.time_of_day == TimeOfDay::Night && needs.fatigue >= 0.5)
    {
        return Action::Sleep;
    }
    if needs.safety >= URGENT_NEED {
        return if agent.role == Role::Guard {
            Action::Patrol
        } else {
            Action::Pray
        };
    }
    if agent.life_stage == LifeStage::Child {
        return if needs.social >= 0.5 {
            Action::Socialize
        } else {
            Action::Explore
        };
    }
    if needs.social >= URGENT_NEED {
        return Action::Socialize;
    }

    match agent.current_task {
        TaskKind::Mining => return Action::Mine,
        TaskKind::Farming => return Action::Farm,
        TaskKind::Building => return Action::Build,
        TaskKind::Crafting => return Action::Craft,
        TaskKind::Trading => return Action::Trade,
        TaskKind::Patrolling => return Action::Patrol,
        TaskKind::Resting => return Action::Idle,
        TaskKind::None => {}
    }

    match agent.role {
        Role::Farmer => Action::Farm,
        Role::Miner => Action::Mine,
        Role::Builder => Action::Build,
        Role::Merchant => Action::Trade,
        Role::Guard => Action::Patrol,
        Role::Healer => Action::Heal,
        Role::Priest => Action::Pray,
        Role::Crafter => Action::Craft,
        Role::Scout => Action::Explore,
        Role::Unemployed => Action::Gather,
    }
}

fn advise_from(summary: &WorldSummary) -> (String, Action) {
    match summary.world.global_threat {
        ThreatLevel::Critical | ThreatLevel::High => (
            "Danger is close. Keep the guards on the walls and the rest behind them.".into(),
            Action::Defend,
        ),
        ThreatLevel::Low => (
            "Something stirs beyond the fields. Double the patrols but keep working.".into(),
            Action::Patrol,
        ),
        ThreatLevel::None if summary.world.time_of_day == TimeOfDay::Night => (
            "The night is quiet. Let the village rest for tomorrow's work.".into(),
            Action::Sleep,
        ),
        ThreatLevel::None => (
            "The village is at peace. Fill the granaries while the weather holds.".into(),
            Action::Farm,
        ),
    }
}

#[async_trait]
impl InferenceProvider for LocalProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn decide_batch(&self, request: &DecisionRequest) -> Result<DecisionResponse> {
        self.health
            .observe(async {
                self.think().await;
                let actions: Vec<Option<Action>> = request
                    .agents()
                    .iter()
                    .map(|agent| Some(choose_action(agent, request.world())))
                    .collect();
                Ok(DecisionResponse::from_positional(request, &actions, NAME))
            })
            .await
    }

    async fn advise(&self, summary: &WorldSummary) -> Result<Advice> {
        self.health
            .observe(async {
                self.think().await;
                let (text, focus) = advise_from(summary);
                Ok(Advice {
                    text,
                    focus: Some(focus),
                    provenance: Provenance::Provider(NAME.into()),
                })
            })
            .await
    }

    fn is_available(&self) -> bool {
        self.health.is_available()
    }

    fn average_latency(&self) -> Option<Duration> {
        self.health.average_latency()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ConductorError;
    use crate::decision::Needs;
    use crate::test_support::{agent, agent_with};

    #[test]
    fn test_threat_overrides_everything() {
        let world = WorldContext::default();
        let mut guard = agent_with("Sarah", Role::Guard, Needs::default());
        guard.threat = ThreatLevel::High;
        guard.needs.hunger = 1.0;
        assert_eq!(choose_action(&guard, &world), Action::Defend);

        let mut farmer = agent_with("Thomas", Role::Farmer, Needs::default());
        farmer.threat = ThreatLevel::Critical;
        assert_eq!(choose_action(&farmer, &world), Action::Flee);
    }

    #[test]
    fn test_needs_then_task_then_role() {
        let world = WorldContext::default();
        let hungry = agent_with(
            "Elena",
            Role::Miner,
            Needs {
                hunger: 0.9,
                ..Needs::default()
            },
        );
        assert_eq!(choose_action(&hungry, &world), Action::Eat);

        let mut busy = agent_with("Marcus", Role::Miner, Needs::default());
        busy.current_task = TaskKind::Building;
        assert_eq!(choose_action(&busy, &world), Action::Build);

        let idle_miner = agent_with("William", Role::Miner, Needs::default());
        assert_eq!(choose_action(&idle_miner, &world), Action::Mine);
    }

    #[test]
    fn test_night_makes_tired_agents_sleep() {
        let night = WorldContext {
            time_of_day: TimeOfDay::Night,
            ..WorldContext::default()
        };
        let tired = agent_with(
            "Ada",
            Role::Crafter,
            Needs {
                fatigue: 0.6,
                ..Needs::default()
            },
        );
        assert_eq!(choose_action(&tired, &night), Action::Sleep);
        assert_eq!(choose_action(&tired, &WorldContext::default()), Action::Craft);
    }

    #[tokio::test]
    async fn test_decide_batch_keeps_order() {
        let provider = LocalProvider::new(Duration::from_secs(1), Duration::ZERO);
        let request = DecisionRequest::new(
            WorldContext::default(),
            vec![
                agent_with("a", Role::Farmer, Needs::default()),
                agent_with("b", Role::Priest, Needs::default()),
            ],
        )
        .unwrap();
        let response = provider.decide_batch(&request).await.unwrap();
        assert_eq!(response.decisions[0].action, Action::Farm);
        assert_eq!(response.decisions[1].action, Action::Pray);
        assert_eq!(response.decisions[1].agent_id, request.agent_ids()[1]);
        assert!(provider.is_available());
        assert!(provider.average_latency().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_think_time_times_out() {
        let provider = LocalProvider::new(Duration::from_millis(100), Duration::from_millis(500));
        let request = DecisionRequest::new(WorldContext::default(), vec![agent("a")]).unwrap();
        let result = provider.decide_batch(&request).await;
        assert!(matches!(result, Err(ConductorError::Timeout { .. })));
        assert!(!provider.is_available());
    }

    #[tokio::test]
    async fn test_advice_reflects_threat() {
        let provider = LocalProvider::new(Duration::from_secs(1), Duration::ZERO);
        let mut summary = WorldSummary::default();
        summary.world.global_threat = ThreatLevel::High;
        let advice = provider.advise(&summary).await.unwrap();
        assert_eq!(advice.focus, Some(Action::Defend));
    }
}
