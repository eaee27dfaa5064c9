//! The tick scheduler
//!
//! One owner drives the whole pipeline. Every tick it:
//! 1. collects a finished inference batch, if any, and applies it in request order
//! 2. advances the domain by the elapsed wall-clock delta
//! 3. asks the domain which agents need a decision
//! 4. forms and dispatches at most one batch (rate limit, cache, deferral)
//! 5. records the tick duration and refreshes the operating profile
//!
//! Provider calls run in spawned tasks and report back over a oneshot
//! channel, so the cache, throttle and batcher are only ever touched from
//! here. While a batch is outstanding no new batch is formed.

use crate::core::config::ConductorConfig;
use crate::core::error::{ConductorError, Result};
use crate::core::types::{AgentId, Tick};
use crate::decision::{
    Advice, AgentContext, Decision, DecisionCache, DecisionRequest, DecisionResponse,
    Fingerprint, Provenance,
};
use crate::provider::InferenceProvider;
use crate::scheduler::batcher::Batcher;
use crate::scheduler::domain::DomainLayer;
use crate::scheduler::status::{Counters, StatusSnapshot};
use crate::throttle::{OperatingParams, PerformanceMonitor, ResourceProbe, ThrottleMode};
use ahash::AHashMap;
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Added to two provider timeouts (primary, then fallback) to get the point
/// at which an outstanding call is abandoned.
const BACKSTOP_SLACK: Duration = Duration::from_secs(1);

type BatchOutcome = (Result<DecisionResponse>, Duration);

struct InFlight {
    rx: oneshot::Receiver<BatchOutcome>,
    agents: Vec<(AgentId, Fingerprint)>,
    started: Instant,
}

struct AdviceCall {
    rx: oneshot::Receiver<Result<Advice>>,
    task: JoinHandle<()>,
}

pub struct TickScheduler<D: DomainLayer> {
    config: ConductorConfig,
    provider: Arc<dyn InferenceProvider>,
    domain: D,
    cache: DecisionCache,
    batcher: Batcher,
    monitor: PerformanceMonitor,
    base: OperatingParams,
    params: OperatingParams,
    mode: ThrottleMode,
    tick: Tick,
    last_tick_at: Option<Instant>,
    queued: usize,
    in_flight: Option<InFlight>,
    advice: Option<AdviceCall>,
    counters: Counters,
}

impl<D: DomainLayer> TickScheduler<D> {
    pub fn new(
        config: ConductorConfig,
        provider: Arc<dyn InferenceProvider>,
        domain: D,
        probe: Box<dyn ResourceProbe>,
    ) -> Self {
        let base = OperatingParams::from_config(&config);
        let mode = config.performance_mode.fixed().unwrap_or_default();
        let mut scheduler = Self {
            cache: DecisionCache::from_config(&config.cache),
            batcher: Batcher::new(config.max_deferrals),
            monitor: PerformanceMonitor::new(config.throttle.clone(), probe),
            params: mode.apply(&base),
            base,
            mode,
            config,
            provider,
            domain,
            tick: 0,
            last_tick_at: None,
            queued: 0,
            in_flight: None,
            advice: None,
            counters: Counters::default(),
        };
        scheduler
            .domain
            .set_population_cap(scheduler.params.max_agents);
        scheduler
    }

    pub fn domain(&self) -> &D {
        &self.domain
    }

    pub fn domain_mut(&mut self) -> &mut D {
        &mut self.domain
    }

    pub fn cache(&self) -> &DecisionCache {
        &self.cache
    }

    pub fn mode(&self) -> ThrottleMode {
        self.mode
    }

    pub fn params(&self) -> &OperatingParams {
        &self.params
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    pub fn tick_count(&self) -> Tick {
        self.tick
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Run one tick. Must be called from within a Tokio runtime.
    ///
    /// A panic or error inside the tick is logged and counted; it never
    /// escapes, so the loop keeps its cadence.
    pub fn tick(&mut self) {
        let started = Instant::now();
        let delta = self
            .last_tick_at
            .map(|at| started.saturating_duration_since(at))
            .unwrap_or(self.params.tick_period);
        self.last_tick_at = Some(started);
        self.tick += 1;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.step(delta, started)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.counters.tick_faults += 1;
                tracing::error!("Tick {} failed: {}", self.tick, e);
            }
            Err(payload) => {
                self.counters.tick_faults += 1;
                tracing::error!(
                    "Tick {} panicked: {}",
                    self.tick,
                    panic_message(payload.as_ref())
                );
            }
        }

        self.monitor.record_tick(started.elapsed());
        self.update_throttle();
    }

    fn step(&mut self, delta: Duration, now: Instant) -> Result<()> {
        self.poll_in_flight();
        self.poll_advice();

        self.domain.advance_simulation(delta);
        let queue = self.domain.agents_needing_decision();
        self.queued = queue.len();

        if self.config.ai_enabled
            && self.in_flight.is_none()
            && self.batcher.may_dispatch(self.tick, now, &self.params)
        {
            self.batch_step(queue, now)?;
        }

        self.maybe_request_advice();
        Ok(())
    }

    fn batch_step(&mut self, queue: Vec<AgentContext>, now: Instant) -> Result<()> {
        let mut plan = self
            .batcher
            .plan(queue, &mut self.cache, &self.params, now);

        for decision in std::mem::take(&mut plan.cached) {
            self.apply(decision);
        }

        if plan.is_dispatch() {
            if plan.forced {
                self.counters.forced_dispatches += 1;
                tracing::debug!(
                    "Agent {} deferred {} times; dispatching alone",
                    plan.dispatch[0].agent_id,
                    self.config.max_deferrals
                );
            }
            self.dispatch(plan.dispatch, now)?;
        }
        Ok(())
    }

    /// Hand a batch to the provider on its own task.
    fn dispatch(&mut self, agents: Vec<AgentContext>, now: Instant) -> Result<()> {
        let keys = agents
            .iter()
            .map(|a| (a.agent_id, a.fingerprint()))
            .collect();
        let request = DecisionRequest::new(self.domain.world_context(), agents)?;
        let provider = Arc::clone(&self.provider);
        let backstop = self.backstop();
        let (tx, rx) = oneshot::channel();

        tracing::debug!(
            "Tick {}: dispatching {} agents to {}",
            self.tick,
            request.len(),
            provider.name()
        );
        tokio::spawn(async move {
            let started = Instant::now();
            let result = match tokio::time::timeout(backstop, provider.decide_batch(&request)).await
            {
                Ok(result) => result,
                Err(_) => Err(ConductorError::Timeout {
                    provider: provider.name().to_string(),
                    timeout_ms: backstop.as_millis() as u64,
                }),
            };
            let _ = tx.send((result, started.elapsed()));
        });

        self.in_flight = Some(InFlight {
            rx,
            agents: keys,
            started: now,
        });
        self.batcher.mark_dispatched(self.tick, now);
        self.counters.batches_dispatched += 1;
        Ok(())
    }

    fn backstop(&self) -> Duration {
        self.config.timeout() * 2 + BACKSTOP_SLACK
    }

    fn poll_in_flight(&mut self) {
        let Some(flight) = self.in_flight.as_mut() else {
            return;
        };
        let (result, latency) = match flight.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Closed) => (Err(task_lost()), flight.started.elapsed()),
        };
        if let Some(flight) = self.in_flight.take() {
            self.complete(flight, result, latency);
        }
    }

    /// Wait for the outstanding batch, if any, and apply it.
    pub async fn drain_in_flight(&mut self) {
        let Some(mut flight) = self.in_flight.take() else {
            return;
        };
        let (result, latency) = match (&mut flight.rx).await {
            Ok(outcome) => outcome,
            Err(_) => (Err(task_lost()), flight.started.elapsed()),
        };
        self.complete(flight, result, latency);
    }

    /// Apply a finished batch in request order.
    ///
    /// Agents the provider left unanswered, and every agent of a failed call,
    /// get the safe default. Only provider answers are cached.
    fn complete(&mut self, flight: InFlight, result: Result<DecisionResponse>, latency: Duration) {
        self.monitor.record_inference(latency);

        let mut answered: AHashMap<AgentId, Decision> = match result {
            Ok(response) => response
                .decisions
                .into_iter()
                .map(|d| (d.agent_id, d))
                .collect(),
            Err(e) => {
                self.counters.provider_failures += 1;
                tracing::warn!(
                    "Batch of {} failed after {:?}: {}; applying defaults",
                    flight.agents.len(),
                    latency,
                    e
                );
                AHashMap::new()
            }
        };

        let now = Instant::now();
        for (agent_id, fingerprint) in flight.agents {
            let decision = answered
                .remove(&agent_id)
                .unwrap_or_else(|| Decision::fallback(agent_id));
            if matches!(decision.provenance, Provenance::Provider(_)) {
                self.cache.insert_at(fingerprint, decision.action, now);
            }
            self.apply(decision);
        }
    }

    /// Hand one decision to the domain and count it by provenance.
    fn apply(&mut self, decision: Decision) {
        match decision.provenance {
            Provenance::Cache => self.counters.cache_hits += 1,
            Provenance::Provider(_) => self.counters.provider_decisions += 1,
            Provenance::Default => self.counters.default_decisions += 1,
        }
        self.domain.apply_decision(decision.agent_id, decision.action);
    }

    fn poll_advice(&mut self) {
        let Some(call) = self.advice.as_mut() else {
            return;
        };
        let outcome = match call.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Closed) => Err(task_lost()),
        };
        self.advice = None;

        match outcome {
            Ok(advice) => {
                self.counters.advice_received += 1;
                tracing::info!("Advice from {}: {}", advice.provenance, advice.text);
                self.domain.apply_advice(&advice);
            }
            Err(e) => tracing::warn!("Advice request failed: {}", e),
        }
    }

    /// Fire the strategic query every `advice_interval_ticks`, one at a time.
    fn maybe_request_advice(&mut self) {
        let every = self.config.advice_interval_ticks;
        if !self.config.ai_enabled || every == 0 || self.tick % every != 0 || self.advice.is_some()
        {
            return;
        }

        let summary = self.domain.world_summary();
        let provider = Arc::clone(&self.provider);
        let backstop = self.backstop();
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let result = match tokio::time::timeout(backstop, provider.advise(&summary)).await {
                Ok(result) => result,
                Err(_) => Err(ConductorError::Timeout {
                    provider: provider.name().to_string(),
                    timeout_ms: backstop.as_millis() as u64,
                }),
            };
            let _ = tx.send(result);
        });
        self.advice = Some(AdviceCall { rx, task });
    }

    fn update_throttle(&mut self) {
        let every = self.config.throttle.sample_every_ticks;
        if every == 0 || self.tick % every != 0 {
            return;
        }
        self.monitor.sample(self.queued);

        let next = match self.config.performance_mode.fixed() {
            Some(mode) => mode,
            None => self.monitor.recommend_mode(),
        };
        if next != self.mode {
            self.apply_mode(next);
        }
    }

    /// Switch profiles. Work already in flight is untouched; only later ticks
    /// see the new parameters.
    fn apply_mode(&mut self, mode: ThrottleMode) {
        self.mode = mode;
        self.params = mode.apply(&self.base);
        tracing::debug!(
            "Profile {}: batch {}..={}, interval {:?}, tick {:?}, max agents {}",
            mode,
            self.params.min_batch_size,
            self.params.max_batch_size,
            self.params.decision_interval,
            self.params.tick_period,
            self.params.max_agents
        );
        self.domain.set_population_cap(self.params.max_agents);
    }

    pub fn status(&self) -> StatusSnapshot {
        let latest = self.monitor.latest_sample();
        StatusSnapshot {
            tick: self.tick,
            tick_rate: self.monitor.tick_rate(self.params.tick_period),
            last_tick_ms: self.monitor.last_tick_duration_ms(),
            avg_tick_ms: self.monitor.avg_tick_duration_ms(),
            queued_decisions: self.queued,
            deferred_agents: self.batcher.deferred_agents(),
            in_flight: self.in_flight.is_some(),
            avg_inference_latency_ms: self.monitor.avg_inference_latency_ms(),
            cpu_percent: latest.map(|s| s.cpu_percent).unwrap_or(0.0),
            memory_percent: latest.map(|s| s.memory_percent).unwrap_or(0.0),
            uptime_secs: self.monitor.uptime().as_secs_f64(),
            mode: self.mode,
            provider: self.provider.name().to_string(),
            provider_available: self.provider.is_available(),
            degraded: self.provider.is_degraded(),
            cache_entries: self.cache.len(),
            counters: Counters {
                cache_misses: self.cache.misses(),
                ..self.counters
            },
        }
    }

    /// Drive ticks until `shutdown` resolves or `tick_limit` ticks have run,
    /// then drain.
    ///
    /// The interval is rebuilt whenever the active profile changes the tick
    /// period. Late ticks are delayed rather than bunched.
    pub async fn run<F>(&mut self, shutdown: F, tick_limit: Option<Tick>)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut period = self.params.tick_period;
        let mut interval = tick_interval(Instant::now(), period);
        tracing::info!(
            "Scheduler started: tick {:?}, profile {}, provider {}",
            period,
            self.mode,
            self.provider.name()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested at tick {}", self.tick);
                    break;
                }
                _ = interval.tick() => {
                    self.tick();
                    self.log_status();
                    if tick_limit.is_some_and(|limit| self.tick >= limit) {
                        break;
                    }
                    if self.params.tick_period != period {
                        period = self.params.tick_period;
                        interval = tick_interval(Instant::now() + period, period);
                    }
                }
            }
        }

        self.shutdown().await;
    }

    /// Abandon any advice call and apply the outstanding batch.
    pub async fn shutdown(&mut self) {
        if let Some(call) = self.advice.take() {
            call.task.abort();
        }
        if self.in_flight.is_some() {
            tracing::info!("Draining in-flight batch");
            self.drain_in_flight().await;
        }
        tracing::info!("Scheduler stopped: {}", self.status());
    }

    fn log_status(&self) {
        let every = self.config.status_interval_ticks;
        if every > 0 && self.tick % every == 0 {
            tracing::info!("{}", self.status());
        }
    }
}

fn tick_interval(start: Instant, period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

fn task_lost() -> ConductorError {
    ConductorError::Unavailable("inference task ended without a result".into())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PerformanceMode;
    use crate::decision::Action;
    use crate::throttle::FixedProbe;
    use crate::test_support::{distinct_agents, QueueDomain, ScriptedProvider};

    const TICK: Duration = Duration::from_millis(300);

    fn config() -> ConductorConfig {
        ConductorConfig {
            min_batch_size: 3,
            max_batch_size: 10,
            performance_mode: PerformanceMode::Normal,
            advice_interval_ticks: 0,
            status_interval_ticks: 0,
            ..ConductorConfig::default()
        }
    }

    fn scheduler(
        config: ConductorConfig,
        provider: Arc<ScriptedProvider>,
        agents: Vec<AgentContext>,
    ) -> TickScheduler<QueueDomain> {
        TickScheduler::new(
            config,
            provider,
            QueueDomain::with_agents(agents),
            Box::new(FixedProbe::new(10.0, 10.0)),
        )
    }

    async fn run_ticks(scheduler: &mut TickScheduler<QueueDomain>, n: usize) {
        for _ in 0..n {
            scheduler.tick();
            tokio::time::sleep(TICK).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_applied_in_order_and_cached() {
        let provider = Arc::new(ScriptedProvider::with_sequence(
            "scripted",
            vec![Action::Mine, Action::Eat, Action::Build],
        ));
        let agents = distinct_agents(3);
        let ids: Vec<AgentId> = agents.iter().map(|a| a.agent_id).collect();
        let mut scheduler = scheduler(config(), provider.clone(), agents);

        scheduler.tick();
        assert!(scheduler.is_in_flight());
        scheduler.drain_in_flight().await;

        let applied = &scheduler.domain().applied;
        assert_eq!(
            applied,
            &vec![(ids[0], Action::Mine), (ids[1], Action::Eat), (ids[2], Action::Build)]
        );
        assert_eq!(scheduler.cache().len(), 3);
        assert_eq!(scheduler.status().counters.provider_decisions, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hits_skip_the_provider() {
        let provider = Arc::new(ScriptedProvider::answering("scripted", Action::Farm));
        let mut scheduler = scheduler(config(), provider.clone(), distinct_agents(3));

        scheduler.tick();
        scheduler.drain_in_flight().await;
        assert_eq!(provider.calls(), 1);

        // same situations, different agents
        let again = distinct_agents(3);
        scheduler.domain_mut().pending = again;
        run_ticks(&mut scheduler, 6).await;

        assert_eq!(provider.calls(), 1);
        assert!(scheduler.domain().pending.is_empty());
        assert_eq!(scheduler.domain().applied.len(), 6);
        let counters = scheduler.status().counters;
        assert_eq!(counters.cache_hits, 3);
        assert_eq!(counters.provider_decisions, 3);
        assert_eq!(counters.default_decisions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_batch_in_flight_at_a_time() {
        let provider = Arc::new(ScriptedProvider::answering("slow", Action::Mine));
        provider.set_delay(Duration::from_secs(5));
        let mut scheduler = scheduler(config(), provider.clone(), distinct_agents(10));
        let mut hungry = distinct_agents(10);
        for agent in &mut hungry {
            agent.needs.hunger = 0.9;
        }
        scheduler.domain_mut().pending.extend(hungry);

        for _ in 0..40 {
            scheduler.tick();
            let completed = scheduler.domain().applied.len() as u64 / 10;
            assert!(provider.calls() <= completed + 1);
            tokio::time::sleep(TICK).await;
        }
        assert_eq!(provider.calls(), 2);
        assert!(scheduler.status().counters.batches_dispatched >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_provider_applies_defaults() {
        let provider = Arc::new(ScriptedProvider::failing("down"));
        let mut scheduler = scheduler(config(), provider, distinct_agents(3));

        scheduler.tick();
        scheduler.drain_in_flight().await;

        let status = scheduler.status();
        assert!(scheduler
            .domain()
            .applied
            .iter()
            .all(|(_, action)| *action == Action::Idle));
        assert_eq!(status.counters.default_decisions, 3);
        assert_eq!(status.counters.provider_failures, 1);
        assert!(!status.provider_available);
        assert!(scheduler.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_disabled_still_advances() {
        let provider = Arc::new(ScriptedProvider::answering("scripted", Action::Mine));
        let config = ConductorConfig {
            ai_enabled: false,
            ..config()
        };
        let mut scheduler = scheduler(config, provider.clone(), distinct_agents(5));

        run_ticks(&mut scheduler, 10).await;
        assert_eq!(provider.calls(), 0);
        assert!(scheduler.domain().applied.is_empty());
        assert!(scheduler.domain().elapsed >= TICK * 9);
        assert_eq!(scheduler.status().queued_decisions, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_tick_is_isolated() {
        let provider = Arc::new(ScriptedProvider::answering("scripted", Action::Mine));
        let mut scheduler = scheduler(config(), provider.clone(), distinct_agents(3));
        scheduler.domain_mut().fault_next_advance = true;

        scheduler.tick();
        assert_eq!(scheduler.status().counters.tick_faults, 1);
        assert_eq!(provider.calls(), 0);

        scheduler.tick();
        scheduler.drain_in_flight().await;
        assert_eq!(provider.calls(), 1);
        assert_eq!(scheduler.domain().applied.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_mode_follows_load() {
        let provider = Arc::new(ScriptedProvider::answering("scripted", Action::Mine));
        let probe = FixedProbe::new(95.0, 10.0);
        let mut config = config();
        config.performance_mode = PerformanceMode::Auto;
        config.throttle.sample_every_ticks = 1;
        config.throttle.window_size = 3;
        let mut scheduler = TickScheduler::new(
            config,
            provider,
            QueueDomain::default(),
            Box::new(probe.clone()),
        );
        assert_eq!(scheduler.mode(), ThrottleMode::Normal);

        scheduler.tick();
        assert_eq!(scheduler.mode(), ThrottleMode::Eco);
        assert_eq!(scheduler.params().max_batch_size, 5);
        assert_eq!(scheduler.domain().population_cap, Some(250));

        probe.set(10.0, 10.0);
        run_ticks(&mut scheduler, 2).await;
        assert_eq!(scheduler.mode(), ThrottleMode::Eco);
        scheduler.tick();
        assert_eq!(scheduler.mode(), ThrottleMode::Performance);
        assert_eq!(scheduler.domain().population_cap, Some(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pinned_mode_ignores_load() {
        let provider = Arc::new(ScriptedProvider::answering("scripted", Action::Mine));
        let mut config = config();
        config.performance_mode = PerformanceMode::Eco;
        config.throttle.sample_every_ticks = 1;
        let mut scheduler = TickScheduler::new(
            config,
            provider,
            QueueDomain::default(),
            Box::new(FixedProbe::new(0.0, 0.0)),
        );
        run_ticks(&mut scheduler, 30).await;
        assert_eq!(scheduler.mode(), ThrottleMode::Eco);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advice_reaches_domain() {
        let provider = Arc::new(ScriptedProvider::answering("scripted", Action::Pray));
        let config = ConductorConfig {
            advice_interval_ticks: 2,
            ..config()
        };
        let mut scheduler = scheduler(config, provider, Vec::new());

        run_ticks(&mut scheduler, 3).await;
        let advice = &scheduler.domain().advice;
        assert_eq!(advice.len(), 1);
        assert_eq!(advice[0].focus, Some(Action::Pray));
        assert_eq!(scheduler.status().counters.advice_received, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_drains_outstanding_batch_on_exit() {
        let provider = Arc::new(ScriptedProvider::answering("slow", Action::Build));
        provider.set_delay(Duration::from_secs(2));
        let mut scheduler = scheduler(config(), provider.clone(), distinct_agents(4));

        scheduler.run(std::future::pending(), Some(2)).await;

        assert_eq!(scheduler.tick_count(), 2);
        assert!(!scheduler.is_in_flight());
        assert_eq!(scheduler.domain().applied.len(), 4);
        assert!(scheduler
            .domain()
            .applied
            .iter()
            .all(|(_, action)| *action == Action::Build));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown_signal() {
        let provider = Arc::new(ScriptedProvider::answering("scripted", Action::Mine));
        let mut scheduler = scheduler(config(), provider, Vec::new());

        scheduler
            .run(tokio::time::sleep(Duration::from_secs(3)), None)
            .await;
        let ticks = scheduler.tick_count();
        assert!((9..=11).contains(&ticks), "ran {} ticks", ticks);
    }
}
