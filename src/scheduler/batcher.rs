//! Batch formation, rate limiting and bounded deferral

use crate::core::types::{AgentId, Tick};
use crate::decision::{AgentContext, Decision, DecisionCache, Provenance};
use crate::throttle::OperatingParams;
use ahash::{AHashMap, AHashSet};
use std::cmp::Reverse;
use tokio::time::Instant;

/// What one batch step decided to do
#[derive(Debug, Default)]
pub struct BatchPlan {
    /// Cache hits, applied immediately in queue order
    pub cached: Vec<Decision>,
    /// Agents to send to the provider, in request order
    pub dispatch: Vec<AgentContext>,
    /// `dispatch` is a single agent released after maximum deferral
    pub forced: bool,
    /// Misses held back this step
    pub deferred: usize,
    /// Fewer than `min_batch_size` agents were queued and the queue has not
    /// stalled yet, so nothing was looked up
    pub waiting: bool,
}

impl BatchPlan {
    pub fn is_dispatch(&self) -> bool {
        !self.dispatch.is_empty()
    }
}

/// Decides when a batch may be formed and which agents go in it
#[derive(Debug)]
pub struct Batcher {
    max_deferrals: u32,
    deferrals: AHashMap<AgentId, u32>,
    last_dispatch: Option<(Tick, Instant)>,
    waiting_since: Option<Instant>,
}

impl Batcher {
    pub fn new(max_deferrals: u32) -> Self {
        Self {
            max_deferrals: max_deferrals.max(1),
            deferrals: AHashMap::new(),
            last_dispatch: None,
            waiting_since: None,
        }
    }

    /// Rate limit: `min_batch_size` ticks and the decision interval must both
    /// have passed since the last provider dispatch.
    pub fn may_dispatch(&self, tick: Tick, now: Instant, params: &OperatingParams) -> bool {
        match self.last_dispatch {
            None => true,
            Some((last_tick, last_at)) => {
                tick.saturating_sub(last_tick) >= params.min_batch_size as Tick
                    && now.saturating_duration_since(last_at) >= params.decision_interval
            }
        }
    }

    pub fn mark_dispatched(&mut self, tick: Tick, now: Instant) {
        self.last_dispatch = Some((tick, now));
    }

    pub fn deferred_agents(&self) -> usize {
        self.deferrals.len()
    }

    /// Form one batch from `queue`.
    ///
    /// Agents beyond the population cap are ignored. Deferred agents move to
    /// the front so they are looked at first. Cache hits are resolved here;
    /// misses are dispatched only when they still fill `min_batch_size`,
    /// otherwise each is deferred and the first one to reach the deferral
    /// limit is dispatched alone.
    pub fn plan(
        &mut self,
        mut queue: Vec<AgentContext>,
        cache: &mut DecisionCache,
        params: &OperatingParams,
        now: Instant,
    ) -> BatchPlan {
        let mut plan = BatchPlan::default();

        let queued: AHashSet<AgentId> = queue.iter().map(|a| a.agent_id).collect();
        self.deferrals.retain(|id, _| queued.contains(id));
        if queue.is_empty() {
            self.waiting_since = None;
            return plan;
        }

        queue.truncate(params.max_agents);
        queue.sort_by_key(|a| Reverse(self.deferrals.get(&a.agent_id).copied().unwrap_or(0)));
        queue.truncate(params.max_batch_size);

        if queue.len() < params.min_batch_size {
            let since = *self.waiting_since.get_or_insert(now);
            if now.saturating_duration_since(since) <= params.decision_interval {
                plan.waiting = true;
                return plan;
            }
        }
        self.waiting_since = None;

        let mut misses = Vec::with_capacity(queue.len());
        for agent in queue {
            match cache.get_at(agent.fingerprint(), now) {
                Some(action) => {
                    self.deferrals.remove(&agent.agent_id);
                    plan.cached.push(Decision {
                        agent_id: agent.agent_id,
                        action,
                        provenance: Provenance::Cache,
                    });
                }
                None => misses.push(agent),
            }
        }

        if misses.len() >= params.min_batch_size {
            for agent in &misses {
                self.deferrals.remove(&agent.agent_id);
            }
            plan.dispatch = misses;
            return plan;
        }

        let mut released = None;
        for (i, agent) in misses.iter().enumerate() {
            let count = self.deferrals.entry(agent.agent_id).or_insert(0);
            *count += 1;
            if released.is_none() && *count >= self.max_deferrals {
                released = Some(i);
            }
        }
        plan.deferred = misses.len();
        if let Some(i) = released {
            let agent = misses.swap_remove(i);
            self.deferrals.remove(&agent.agent_id);
            plan.deferred -= 1;
            plan.forced = true;
            plan.dispatch = vec![agent];
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Action;
    use crate::test_support::{agent, distinct_agents as distinct};
    use std::time::Duration;

    fn params(min: usize, max: usize) -> OperatingParams {
        OperatingParams {
            max_agents: 100,
            min_batch_size: min,
            max_batch_size: max,
            decision_interval: Duration::from_millis(1000),
            tick_period: Duration::from_millis(300),
        }
    }

    fn cache() -> DecisionCache {
        DecisionCache::new(Duration::from_secs(30), 100)
    }

    #[test]
    fn test_rate_limit_needs_ticks_and_interval() {
        let mut batcher = Batcher::new(3);
        let params = params(3, 10);
        let t0 = Instant::now();
        assert!(batcher.may_dispatch(1, t0, &params));

        batcher.mark_dispatched(1, t0);
        assert!(!batcher.may_dispatch(2, t0 + Duration::from_secs(5), &params));
        assert!(!batcher.may_dispatch(10, t0 + Duration::from_millis(500), &params));
        assert!(batcher.may_dispatch(4, t0 + Duration::from_secs(1), &params));
    }

    #[test]
    fn test_batch_capped_at_max() {
        let mut batcher = Batcher::new(3);
        let plan = batcher.plan(distinct(10), &mut cache(), &params(3, 4), Instant::now());
        assert_eq!(plan.dispatch.len(), 4);
        assert!(!plan.forced);
    }

    #[test]
    fn test_population_cap_limits_candidates() {
        let mut batcher = Batcher::new(3);
        let params = OperatingParams {
            max_agents: 5,
            ..params(3, 10)
        };
        let plan = batcher.plan(distinct(10), &mut cache(), &params, Instant::now());
        assert_eq!(plan.dispatch.len(), 5);
    }

    #[test]
    fn test_short_queue_waits_until_stalled() {
        let mut batcher = Batcher::new(3);
        let params = params(3, 10);
        let queue = distinct(2);
        let t0 = Instant::now();

        let plan = batcher.plan(queue.clone(), &mut cache(), &params, t0);
        assert!(plan.waiting);
        let plan = batcher.plan(queue.clone(), &mut cache(), &params, t0 + Duration::from_millis(900));
        assert!(plan.waiting);

        // stalled: proceeds to lookup, but the misses are still below minimum
        let plan = batcher.plan(queue, &mut cache(), &params, t0 + Duration::from_millis(1100));
        assert!(!plan.waiting);
        assert_eq!(plan.deferred, 2);
        assert!(plan.dispatch.is_empty());
    }

    #[test]
    fn test_cache_hits_resolved_and_residual_deferred() {
        let mut batcher = Batcher::new(3);
        let mut cache = cache();
        let queue = distinct(4);
        let now = Instant::now();
        for agent in &queue[..2] {
            cache.insert_at(agent.fingerprint(), Action::Farm, now);
        }

        let plan = batcher.plan(queue, &mut cache, &params(3, 10), now);
        assert_eq!(plan.cached.len(), 2);
        assert!(plan
            .cached
            .iter()
            .all(|d| d.action == Action::Farm && d.provenance == Provenance::Cache));
        assert!(plan.dispatch.is_empty());
        assert_eq!(plan.deferred, 2);
        assert_eq!(batcher.deferred_agents(), 2);
    }

    #[test]
    fn test_forced_single_dispatch_after_max_deferrals() {
        let mut batcher = Batcher::new(3);
        let mut cache = cache();
        let queue = distinct(4);
        let now = Instant::now();
        for agent in &queue[..2] {
            cache.insert_at(agent.fingerprint(), Action::Farm, now);
        }

        for round in 1..=2 {
            let plan = batcher.plan(queue.clone(), &mut cache, &params(3, 10), now);
            assert!(plan.dispatch.is_empty(), "round {}", round);
        }
        let plan = batcher.plan(queue.clone(), &mut cache, &params(3, 10), now);
        assert!(plan.forced);
        assert_eq!(plan.dispatch.len(), 1);
        assert_eq!(plan.deferred, 1);
        assert_eq!(batcher.deferred_agents(), 1);
    }

    #[test]
    fn test_deferrals_pruned_when_agent_leaves_queue() {
        let mut batcher = Batcher::new(3);
        let mut cache = cache();
        let queue = vec![agent("a"), agent("b")];
        let now = Instant::now() + Duration::from_secs(10);
        // short queue that has already stalled
        batcher.waiting_since = Some(now - Duration::from_secs(5));
        batcher.plan(queue, &mut cache, &params(3, 10), now);
        assert_eq!(batcher.deferred_agents(), 2);

        batcher.plan(Vec::new(), &mut cache, &params(3, 10), now);
        assert_eq!(batcher.deferred_agents(), 0);
    }

    #[test]
    fn test_deferred_agents_move_to_front() {
        let mut batcher = Batcher::new(5);
        let mut queue = distinct(6);
        let late = queue.pop().unwrap();
        batcher.deferrals.insert(late.agent_id, 2);
        queue.insert(0, agent("filler"));
        queue.push(late.clone());

        let plan = batcher.plan(queue, &mut cache(), &params(3, 3), Instant::now());
        assert_eq!(plan.dispatch[0].agent_id, late.agent_id);
        assert_eq!(plan.dispatch.len(), 3);
    }
}
