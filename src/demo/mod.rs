//! A small in-memory village implementing [`DomainLayer`]
//!
//! Lets the binary run the pipeline end to end without an external
//! simulation. Needs drift over time, actions keep a villager busy for a few
//! seconds, and an idle villager is listed as needing a decision. Raids
//! arrive at random and raise everyone's safety need.
//!
//! When `autonomous` is set the village picks actions itself with the same
//! rule ladder the local provider uses; this is what happens when AI-backed
//! decisions are switched off.

use crate::core::types::AgentId;
use crate::decision::{
    Action, Advice, AgentContext, LifeStage, Mood, Needs, Role, TaskKind, ThreatLevel,
    TimeOfDay, WorldContext, WorldSummary,
};
use crate::provider::local::choose_action;
use crate::scheduler::DomainLayer;
use ahash::AHashMap;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Seconds of wall-clock time per simulated day
const DAY_LENGTH_SECS: f32 = 120.0;
/// Per-second chance that raiders show up
const RAID_CHANCE_PER_SEC: f64 = 0.004;
const RAID_DURATION_SECS: f32 = 20.0;
const MAX_RECENT_EVENTS: usize = 3;
const ERA: &str = "founding";

const ROLES: [Role; 9] = [
    Role::Farmer,
    Role::Farmer,
    Role::Miner,
    Role::Builder,
    Role::Merchant,
    Role::Guard,
    Role::Healer,
    Role::Priest,
    Role::Crafter,
];

const NAMES: [&str; 16] = [
    "Marcus", "Elena", "Tomas", "Ilse", "Bram", "Mira", "Oskar", "Wren", "Anselm", "Greta",
    "Piet", "Sanne", "Jorin", "Liesel", "Dirk", "Hanne",
];

struct Villager {
    id: AgentId,
    name: String,
    role: Role,
    life_stage: LifeStage,
    needs: Needs,
    mood: Mood,
    task: TaskKind,
    /// Seconds left on the current action; idle villagers need a decision
    busy_for: f32,
    recent_events: Vec<String>,
}

impl Villager {
    fn location(&self) -> &'static str {
        match self.role {
            Role::Farmer => "fields",
            Role::Miner => "north_mine",
            Role::Builder => "construction_site",
            Role::Merchant => "market",
            Role::Guard => "walls",
            Role::Healer => "infirmary",
            Role::Priest => "temple",
            Role::Crafter => "workshop",
            Role::Scout => "outskirts",
            Role::Unemployed => "village_square",
        }
    }

    fn nearby_resources(&self) -> Vec<String> {
        let resources: &[&str] = match self.role {
            Role::Farmer => &["wheat", "water"],
            Role::Miner => &["iron_ore", "stone"],
            Role::Builder => &["timber", "stone"],
            Role::Crafter => &["timber", "iron"],
            Role::Merchant => &["coin"],
            _ => &[],
        };
        resources.iter().map(|r| r.to_string()).collect()
    }

    fn context(&self, threat: ThreatLevel) -> AgentContext {
        AgentContext {
            agent_id: self.id,
            name: self.name.clone(),
            role: self.role,
            life_stage: self.life_stage,
            needs: self.needs,
            mood: self.mood,
            location: self.location().to_string(),
            threat,
            nearby_resources: self.nearby_resources(),
            recent_events: self.recent_events.clone(),
            current_task: self.task,
        }
    }

    fn remember(&mut self, event: impl Into<String>) {
        if self.recent_events.len() == MAX_RECENT_EVENTS {
            self.recent_events.remove(0);
        }
        self.recent_events.push(event.into());
    }

    fn drift(&mut self, dt: f32, safety_target: f32) {
        let activity = if self.busy_for > 0.0 { 1.5 } else { 1.0 };
        let needs = &mut self.needs;
        needs.hunger = (needs.hunger + 0.008 * dt).min(1.0);
        needs.fatigue = (needs.fatigue + 0.006 * dt * activity).min(1.0);
        needs.social = (needs.social + 0.003 * dt).min(1.0);
        needs.safety += (safety_target - needs.safety) * (0.2 * dt).min(1.0);
        self.mood = mood_for(needs);
        self.busy_for = (self.busy_for - dt).max(0.0);
    }
}

fn mood_for(needs: &Needs) -> Mood {
    if needs.safety > 0.7 {
        Mood::Anxious
    } else if needs.hunger > 0.8 {
        Mood::Angry
    } else if needs.social > 0.85 {
        Mood::Grieving
    } else if needs.hunger < 0.3 && needs.fatigue < 0.3 && needs.social < 0.3 {
        Mood::Joyful
    } else {
        Mood::Content
    }
}

fn safety_target(threat: ThreatLevel) -> f32 {
    match threat {
        ThreatLevel::None => 0.05,
        ThreatLevel::Low => 0.3,
        ThreatLevel::High => 0.8,
        ThreatLevel::Critical => 1.0,
    }
}

/// Base seconds an action keeps a villager busy
fn action_duration(action: Action) -> f32 {
    match action {
        Action::Idle => 2.0,
        Action::Eat => 3.0,
        Action::Sleep => 15.0,
        Action::Flee | Action::Defend => 5.0,
        Action::Socialize | Action::Pray | Action::Heal => 6.0,
        _ => 10.0,
    }
}

pub struct DemoVillage {
    villagers: Vec<Villager>,
    rng: ChaCha8Rng,
    clock_secs: f32,
    day: u32,
    threat: ThreatLevel,
    threat_left: f32,
    food_stores: f32,
    population_cap: usize,
    autonomous: bool,
    focus: Option<Action>,
    action_counts: AHashMap<Action, u64>,
}

impl DemoVillage {
    pub fn new(population: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let villagers = (0..population)
            .map(|i| {
                let roll: f32 = rng.gen();
                let life_stage = if roll < 0.15 {
                    LifeStage::Child
                } else if roll > 0.85 {
                    LifeStage::Elder
                } else {
                    LifeStage::Adult
                };
                let role = if life_stage == LifeStage::Child {
                    Role::Unemployed
                } else {
                    ROLES[rng.gen_range(0..ROLES.len())]
                };
                let needs = Needs {
                    hunger: rng.gen_range(0.0..0.5),
                    fatigue: rng.gen_range(0.0..0.5),
                    social: rng.gen_range(0.0..0.5),
                    safety: 0.05,
                };
                let name = if i < NAMES.len() {
                    NAMES[i].to_string()
                } else {
                    format!("{} {}", NAMES[i % NAMES.len()], i / NAMES.len() + 1)
                };
                Villager {
                    id: AgentId::new(),
                    name,
                    role,
                    life_stage,
                    mood: mood_for(&needs),
                    needs,
                    task: TaskKind::None,
                    busy_for: 0.0,
                    recent_events: Vec::new(),
                }
            })
            .collect();

        tracing::info!("Village founded with {} villagers (seed {})", population, seed);
        Self {
            villagers,
            rng,
            clock_secs: DAY_LENGTH_SECS * 0.25,
            day: 1,
            threat: ThreatLevel::None,
            threat_left: 0.0,
            food_stores: population as f32 * 2.0,
            population_cap: usize::MAX,
            autonomous: false,
            focus: None,
            action_counts: AHashMap::new(),
        }
    }

    /// Let the village choose actions itself when nothing else will.
    pub fn with_autonomy(mut self, autonomous: bool) -> Self {
        self.autonomous = autonomous;
        self
    }

    pub fn population(&self) -> usize {
        self.villagers.len()
    }

    /// Villagers within the population cap
    pub fn active_population(&self) -> usize {
        self.villagers.len().min(self.population_cap)
    }

    pub fn food_stores(&self) -> f32 {
        self.food_stores
    }

    pub fn threat(&self) -> ThreatLevel {
        self.threat
    }

    pub fn focus(&self) -> Option<Action> {
        self.focus
    }

    pub fn action_counts(&self) -> &AHashMap<Action, u64> {
        &self.action_counts
    }

    pub fn decisions_applied(&self) -> u64 {
        self.action_counts.values().sum()
    }

    fn time_of_day(&self) -> TimeOfDay {
        let phase = self.clock_secs / DAY_LENGTH_SECS;
        if phase < 0.2 {
            TimeOfDay::Dawn
        } else if phase < 0.6 {
            TimeOfDay::Day
        } else if phase < 0.75 {
            TimeOfDay::Dusk
        } else {
            TimeOfDay::Night
        }
    }

    fn update_threat(&mut self, dt: f32) {
        if self.threat_left > 0.0 {
            self.threat_left -= dt;
            if self.threat_left <= 0.0 {
                self.threat_left = 0.0;
                self.threat = ThreatLevel::None;
                tracing::info!("Day {}: the raiders have gone", self.day);
            }
            return;
        }
        let chance = (RAID_CHANCE_PER_SEC * dt as f64).min(1.0);
        if self.rng.gen_bool(chance) {
            self.threat = ThreatLevel::High;
            self.threat_left = RAID_DURATION_SECS;
            tracing::info!("Day {}: raiders sighted", self.day);
            for villager in &mut self.villagers {
                villager.remember("raiders sighted");
            }
        }
    }

    fn decide_locally(&mut self) {
        let world = self.world_context();
        let choices: Vec<(AgentId, Action)> = self
            .villagers
            .iter()
            .take(self.population_cap)
            .filter(|v| v.busy_for <= 0.0)
            .map(|v| (v.id, choose_action(&v.context(self.threat), &world)))
            .collect();
        for (id, action) in choices {
            self.apply_decision(id, action);
        }
    }
}

impl DomainLayer for DemoVillage {
    fn advance_simulation(&mut self, delta: Duration) {
        let dt = delta.as_secs_f32();
        self.clock_secs += dt;
        while self.clock_secs >= DAY_LENGTH_SECS {
            self.clock_secs -= DAY_LENGTH_SECS;
            self.day += 1;
        }
        self.update_threat(dt);

        let target = safety_target(self.threat);
        for villager in self.villagers.iter_mut().take(self.population_cap) {
            villager.drift(dt, target);
        }

        if self.autonomous {
            self.decide_locally();
        }
    }

    fn agents_needing_decision(&mut self) -> Vec<AgentContext> {
        self.villagers
            .iter()
            .take(self.population_cap)
            .filter(|v| v.busy_for <= 0.0)
            .map(|v| v.context(self.threat))
            .collect()
    }

    fn apply_decision(&mut self, agent_id: AgentId, action: Action) {
        let jitter: f32 = self.rng.gen_range(0.0..2.0);
        let Some(villager) = self.villagers.iter_mut().find(|v| v.id == agent_id) else {
            tracing::debug!("Decision for unknown villager {}", agent_id);
            return;
        };

        let needs = &mut villager.needs;
        match action {
            Action::Eat => {
                if self.food_stores >= 1.0 {
                    self.food_stores -= 1.0;
                    needs.hunger = (needs.hunger - 0.6).max(0.0);
                } else {
                    villager.remember("found the stores empty");
                }
            }
            Action::Sleep => {
                needs.fatigue = (needs.fatigue - 0.7).max(0.0);
                villager.task = TaskKind::Resting;
            }
            Action::Farm | Action::Gather => {
                let yield_ = if action == Action::Farm { 1.5 } else { 0.8 };
                let bonus = if self.focus == Some(action) { 1.25 } else { 1.0 };
                self.food_stores += yield_ * bonus;
                needs.fatigue = (needs.fatigue + 0.1).min(1.0);
                villager.task = TaskKind::Farming;
            }
            Action::Mine => {
                needs.fatigue = (needs.fatigue + 0.15).min(1.0);
                villager.task = TaskKind::Mining;
            }
            Action::Build => villager.task = TaskKind::Building,
            Action::Craft => villager.task = TaskKind::Crafting,
            Action::Trade => villager.task = TaskKind::Trading,
            Action::Patrol | Action::Defend => {
                needs.safety = (needs.safety - 0.3).max(0.0);
                villager.task = TaskKind::Patrolling;
            }
            Action::Flee => needs.safety = (needs.safety - 0.5).max(0.0),
            Action::Socialize => needs.social = (needs.social - 0.5).max(0.0),
            Action::Heal | Action::Pray => {
                needs.social = (needs.social - 0.2).max(0.0);
                needs.safety = (needs.safety - 0.1).max(0.0);
            }
            Action::Explore => needs.social = (needs.social + 0.1).min(1.0),
            Action::Idle => {}
        }
        villager.mood = mood_for(&villager.needs);
        villager.busy_for = action_duration(action) + jitter;
        *self.action_counts.entry(action).or_insert(0) += 1;
    }

    fn world_context(&self) -> WorldContext {
        WorldContext {
            time_of_day: self.time_of_day(),
            era: ERA.to_string(),
            global_threat: self.threat,
        }
    }

    fn world_summary(&self) -> WorldSummary {
        let active = self.active_population();
        let mut highlights = vec![format!(
            "Day {}, food stores {:.0} for {} villagers",
            self.day, self.food_stores, active
        )];
        if self.food_stores < active as f32 {
            highlights.push("food stores are running low".to_string());
        }
        if self.threat >= ThreatLevel::High {
            highlights.push("raiders are near the village".to_string());
        }
        if let Some((action, count)) = self.action_counts.iter().max_by_key(|(_, c)| **c) {
            highlights.push(format!("most common activity: {} ({} times)", action, count));
        }
        if let Some(focus) = self.focus {
            highlights.push(format!("current village focus: {}", focus));
        }
        WorldSummary {
            world: self.world_context(),
            population: active,
            highlights,
        }
    }

    fn apply_advice(&mut self, advice: &Advice) {
        if advice.focus != self.focus {
            if let Some(focus) = advice.focus {
                tracing::info!("Day {}: the village turns its attention to {}", self.day, focus);
            }
            self.focus = advice.focus;
        }
    }

    fn set_population_cap(&mut self, cap: usize) {
        if cap != self.population_cap {
            tracing::debug!("Population cap set to {}", cap);
        }
        self.population_cap = cap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Provenance;

    #[test]
    fn test_same_seed_same_village() {
        let a = DemoVillage::new(30, 7);
        let b = DemoVillage::new(30, 7);
        let roles_a: Vec<Role> = a.villagers.iter().map(|v| v.role).collect();
        let roles_b: Vec<Role> = b.villagers.iter().map(|v| v.role).collect();
        assert_eq!(roles_a, roles_b);
        assert_eq!(a.villagers[20].name, "Bram 2");
    }

    #[test]
    fn test_decision_makes_villager_busy() {
        let mut village = DemoVillage::new(5, 1);
        let waiting = village.agents_needing_decision();
        assert_eq!(waiting.len(), 5);

        village.apply_decision(waiting[0].agent_id, Action::Mine);
        let waiting = village.agents_needing_decision();
        assert_eq!(waiting.len(), 4);
        assert_eq!(village.decisions_applied(), 1);

        village.advance_simulation(Duration::from_secs(13));
        assert_eq!(village.agents_needing_decision().len(), 5);
    }

    #[test]
    fn test_eating_draws_on_stores() {
        let mut village = DemoVillage::new(1, 3);
        let id = village.villagers[0].id;
        village.villagers[0].needs.hunger = 0.9;
        let before = village.food_stores();

        village.apply_decision(id, Action::Eat);
        assert_eq!(village.food_stores(), before - 1.0);
        assert!(village.villagers[0].needs.hunger < 0.4);
    }

    #[test]
    fn test_population_cap_hides_villagers() {
        let mut village = DemoVillage::new(20, 5);
        village.set_population_cap(8);
        assert_eq!(village.agents_needing_decision().len(), 8);
        assert_eq!(village.active_population(), 8);
        assert_eq!(village.world_summary().population, 8);
    }

    #[test]
    fn test_autonomous_village_decides_for_itself() {
        let mut village = DemoVillage::new(10, 11).with_autonomy(true);
        village.advance_simulation(Duration::from_millis(300));
        assert!(village.agents_needing_decision().is_empty());
        assert_eq!(village.decisions_applied(), 10);
    }

    #[test]
    fn test_needs_drift_and_days_pass() {
        let mut village = DemoVillage::new(3, 2);
        let hunger_before = village.villagers[0].needs.hunger;
        village.advance_simulation(Duration::from_secs_f32(DAY_LENGTH_SECS));
        assert_eq!(village.day, 2);
        assert!(village.villagers[0].needs.hunger > hunger_before);
    }

    #[test]
    fn test_advice_sets_focus() {
        let mut village = DemoVillage::new(3, 2);
        village.apply_advice(&Advice {
            text: "Stock up before winter".into(),
            focus: Some(Action::Farm),
            provenance: Provenance::Provider("local".into()),
        });
        assert_eq!(village.focus(), Some(Action::Farm));
        assert!(village
            .world_summary()
            .highlights
            .iter()
            .any(|h| h.contains("FARM")));
    }
}
