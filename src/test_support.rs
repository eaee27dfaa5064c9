//! Shared fixtures for unit tests

use crate::core::error::{ConductorError, Result};
use crate::core::types::AgentId;
use crate::decision::{
    Action, Advice, AgentContext, DecisionRequest, DecisionResponse, LifeStage, Mood, Needs,
    Provenance, Role, TaskKind, ThreatLevel, WorldContext, WorldSummary,
};
use crate::provider::InferenceProvider;
use crate::scheduler::DomainLayer;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

pub fn agent(name: &str) -> AgentContext {
    agent_with(name, Role::Farmer, Needs::default())
}

pub fn agent_with(name: &str, role: Role, needs: Needs) -> AgentContext {
    AgentContext {
        agent_id: AgentId::new(),
        name: name.to_string(),
        role,
        life_stage: LifeStage::Adult,
        needs,
        mood: Mood::Content,
        location: "village_square".into(),
        threat: ThreatLevel::None,
        nearby_resources: Vec::new(),
        recent_events: Vec::new(),
        current_task: TaskKind::None,
    }
}

/// `n` agents with pairwise different fingerprints (up to ten roles)
pub fn distinct_agents(n: usize) -> Vec<AgentContext> {
    const ROLES: [Role; 10] = [
        Role::Farmer,
        Role::Miner,
        Role::Builder,
        Role::Merchant,
        Role::Guard,
        Role::Healer,
        Role::Priest,
        Role::Crafter,
        Role::Scout,
        Role::Unemployed,
    ];
    (0..n)
        .map(|i| agent_with(&format!("agent-{}", i), ROLES[i % ROLES.len()], Needs::default()))
        .collect()
}

/// Domain that lists `pending` until a decision is applied to each agent
#[derive(Default)]
pub struct QueueDomain {
    pub pending: Vec<AgentContext>,
    pub applied: Vec<(AgentId, Action)>,
    pub elapsed: Duration,
    pub advice: Vec<Advice>,
    pub population_cap: Option<usize>,
    /// Panic inside the next `advance_simulation`
    pub fault_next_advance: bool,
}

impl QueueDomain {
    pub fn with_agents(agents: Vec<AgentContext>) -> Self {
        Self {
            pending: agents,
            ..Self::default()
        }
    }
}

impl DomainLayer for QueueDomain {
    fn advance_simulation(&mut self, delta: Duration) {
        if self.fault_next_advance {
            self.fault_next_advance = false;
            panic!("simulated domain fault");
        }
        self.elapsed += delta;
    }

    fn agents_needing_decision(&mut self) -> Vec<AgentContext> {
        self.pending.clone()
    }

    fn apply_decision(&mut self, agent_id: AgentId, action: Action) {
        self.pending.retain(|a| a.agent_id != agent_id);
        self.applied.push((agent_id, action));
    }

    fn world_context(&self) -> WorldContext {
        WorldContext::default()
    }

    fn apply_advice(&mut self, advice: &Advice) {
        self.advice.push(advice.clone());
    }

    fn set_population_cap(&mut self, cap: usize) {
        self.population_cap = Some(cap);
    }
}

/// Provider whose answer, failure mode and latency are set by the test
pub struct ScriptedProvider {
    name: String,
    /// Answers by position within a batch, cycling when shorter than the batch
    actions: Mutex<Vec<Action>>,
    failing: AtomicBool,
    /// Answer with a request error instead of a provider failure
    rejecting: AtomicBool,
    last_failed: AtomicBool,
    delay: Mutex<Duration>,
    calls: AtomicU64,
}

impl ScriptedProvider {
    pub fn answering(name: &str, action: Action) -> Self {
        Self::with_sequence(name, vec![action])
    }

    pub fn with_sequence(name: &str, actions: Vec<Action>) -> Self {
        Self {
            name: name.to_string(),
            actions: Mutex::new(actions),
            failing: AtomicBool::new(false),
            rejecting: AtomicBool::new(false),
            last_failed: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicU64::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        let provider = Self::answering(name, Action::Idle);
        provider.set_failing(true);
        provider
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    pub fn set_action(&self, action: Action) {
        *self.actions.lock() = vec![action];
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn step(&self) -> Result<Vec<Action>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let failing = self.failing.load(Ordering::SeqCst);
        self.last_failed.store(failing, Ordering::SeqCst);
        if failing {
            return Err(ConductorError::Transport(format!("{} is down", self.name)));
        }
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(ConductorError::Config(format!("{} cannot serve this request", self.name)));
        }
        Ok(self.actions.lock().clone())
    }
}

#[async_trait]
impl InferenceProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn decide_batch(&self, request: &DecisionRequest) -> Result<DecisionResponse> {
        let script = self.step().await?;
        let actions: Vec<Option<Action>> = (0..request.len())
            .map(|i| script.get(i % script.len().max(1)).copied())
            .collect();
        Ok(DecisionResponse::from_positional(request, &actions, &self.name))
    }

    async fn advise(&self, _summary: &WorldSummary) -> Result<Advice> {
        let action = self.step().await?.first().copied().unwrap_or_default();
        Ok(Advice {
            text: format!("{} suggests {}", self.name, action),
            focus: Some(action),
            provenance: Provenance::Provider(self.name.clone()),
        })
    }

    fn is_available(&self) -> bool {
        !self.last_failed.load(Ordering::SeqCst)
    }

    fn average_latency(&self) -> Option<Duration> {
        Some(*self.delay.lock())
    }
}
