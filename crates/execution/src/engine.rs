//! The execution engine - runs the scheduling control loop.

use std::time::Duration;

use cadence_core::Time;
use tracing::{debug, info, warn};

use crate::{Plan, PlanControl, PlanScheduler, SchedulerConfig, StepDriver};

/// Configuration for the execution engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Max ticks before stopping (None = until complete or stalled)
    pub max_ticks: Option<usize>,
    /// Consecutive ticks without progress before `run` gives up
    pub max_idle_ticks: usize,
    /// Consecutive paused ticks before `run` gives up (None = wait for the
    /// operator)
    pub max_paused_ticks: Option<usize>,
    /// Pause between ticks in `run`
    pub tick_interval: Duration,
    /// Candidate selection settings
    pub scheduler: SchedulerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_ticks: None,
            max_idle_ticks: 3,
            max_paused_ticks: None,
            tick_interval: Duration::ZERO,
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Operator hook run at the start of every tick with the tick number.
pub type TickHook = Box<dyn FnMut(usize) + Send>;

/// The main execution engine.
///
/// Each tick:
/// ```text
/// Poll in-flight steps → Select candidates → Dispatch
/// ```
pub struct ExecutionEngine<D: StepDriver> {
    plans: Vec<Plan>,
    driver: D,
    scheduler: PlanScheduler,
    config: EngineConfig,
    ticks_run: usize,
    hook: Option<TickHook>,
}

impl<D: StepDriver> ExecutionEngine<D> {
    /// Create a new execution engine. Earlier plans take precedence when
    /// claiming assets.
    pub fn new(plans: Vec<Plan>, driver: D) -> Self {
        let config = EngineConfig::default();
        Self {
            plans,
            driver,
            scheduler: PlanScheduler::new(config.scheduler),
            config,
            ticks_run: 0,
            hook: None,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.scheduler = PlanScheduler::new(config.scheduler);
        self.config = config;
        self
    }

    /// Run `hook` at the start of every tick, before in-flight steps are
    /// polled. Use it to pause, resume or approve through [`PlanControl`]
    /// handles at known ticks.
    pub fn on_tick<F>(mut self, hook: F) -> Self
    where
        F: FnMut(usize) + Send + 'static,
    {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Run one tick.
    pub async fn run_tick(&mut self) -> anyhow::Result<TickResult> {
        if self.is_complete() {
            return Ok(TickResult::Complete);
        }

        let started_at = chrono::Utc::now();
        let tick = self.ticks_run + 1;
        self.ticks_run = tick;

        if let Some(hook) = self.hook.as_mut() {
            hook(tick);
        }

        // 1. Advance in-flight work
        let mut polled = 0;
        for plan in &mut self.plans {
            for phase in plan.phases_mut() {
                for step in phase.steps_mut() {
                    if step.status().is_in_flight() {
                        self.driver.poll(step).await?;
                        polled += 1;
                    }
                }
            }
        }

        // 2. Select candidates
        let selection = self.scheduler.select(&self.plans);

        // 3. Dispatch
        let mut dispatched = Vec::with_capacity(selection.selected.len());
        for selected in &selection.selected {
            let Some(step) = self
                .plans
                .iter_mut()
                .find(|p| p.name == selected.plan)
                .and_then(|p| p.step_mut(selected.id))
            else {
                warn!("Selected step {} vanished before dispatch", selected.step);
                continue;
            };

            self.driver.dispatch(step).await?;
            dispatched.push(format!("{}/{}", selected.phase, selected.step));
        }

        if self.is_complete() {
            info!("Tick {}: all plans complete", tick);
            return Ok(TickResult::Complete);
        }

        if dispatched.is_empty() && polled == 0 {
            let held = self
                .plans
                .iter()
                .any(|p| p.has_interruption() || p.awaiting_approval());
            if held {
                debug!("Tick {}: interrupted", tick);
                return Ok(TickResult::Interrupted);
            }
            debug!("Tick {}: nothing to do", tick);
            return Ok(TickResult::Idle);
        }

        info!(
            "Tick {}: polled {}, dispatched {:?}, deferred {:?}",
            tick, polled, dispatched, selection.deferred
        );

        Ok(TickResult::Advanced(TickReport {
            tick,
            started_at,
            polled,
            dispatched,
            deferred: selection.deferred,
        }))
    }

    /// Run ticks until every plan completes, the tick limit is reached, or
    /// the engine stalls.
    ///
    /// Paused ticks are not stalls: the work is only deferred, so they are
    /// counted against `max_paused_ticks` instead of `max_idle_ticks`.
    pub async fn run(&mut self) -> anyhow::Result<RunOutcome> {
        let mut idle_ticks = 0;
        let mut paused_ticks = 0;

        loop {
            if let Some(max) = self.config.max_ticks {
                if self.ticks_run >= max {
                    info!("Reached max ticks ({})", max);
                    return Ok(RunOutcome::TickLimit);
                }
            }

            match self.run_tick().await? {
                TickResult::Complete => {
                    info!("All plans complete after {} ticks", self.ticks_run);
                    return Ok(RunOutcome::Complete);
                }
                TickResult::Advanced(_) => {
                    idle_ticks = 0;
                    paused_ticks = 0;
                }
                TickResult::Idle => {
                    paused_ticks = 0;
                    idle_ticks += 1;
                    if idle_ticks >= self.config.max_idle_ticks {
                        warn!("No progress for {} ticks, stopping", idle_ticks);
                        return Ok(RunOutcome::Stalled);
                    }
                }
                TickResult::Interrupted => {
                    idle_ticks = 0;
                    paused_ticks += 1;
                    if let Some(max) = self.config.max_paused_ticks {
                        if paused_ticks >= max {
                            warn!("Paused for {} ticks, stopping", paused_ticks);
                            return Ok(RunOutcome::Paused);
                        }
                    }
                }
            }

            if !self.config.tick_interval.is_zero() {
                tokio::time::sleep(self.config.tick_interval).await;
            }
        }
    }

    /// Whether every plan is complete.
    pub fn is_complete(&self) -> bool {
        self.plans.iter().all(Plan::is_complete)
    }

    /// Get ticks run so far.
    pub fn ticks(&self) -> usize {
        self.ticks_run
    }

    /// Plans in precedence order.
    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    /// Look up a plan by name.
    pub fn plan(&self, name: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.name == name)
    }

    /// Pause/resume handle for the named plan.
    pub fn control(&self, name: &str) -> Option<PlanControl> {
        self.plan(name).map(Plan::control)
    }

    /// Get a reference to the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }
}

/// Result of a single tick.
#[derive(Debug)]
pub enum TickResult {
    /// Steps were polled or dispatched
    Advanced(TickReport),
    /// Nothing to poll or dispatch
    Idle,
    /// Nothing to poll or dispatch and some strategy is paused or awaiting
    /// approval
    Interrupted,
    /// Every plan is complete
    Complete,
}

/// What happened during a tick that made progress.
#[derive(Debug, Clone)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: usize,
    /// When the tick started
    pub started_at: Time,
    /// In-flight steps polled
    pub polled: usize,
    /// Dispatched steps as `phase/step`
    pub dispatched: Vec<String>,
    /// Candidates deferred for a claimed asset
    pub deferred: Vec<String>,
}

/// Why `run` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every plan completed
    Complete,
    /// `max_ticks` reached
    TickLimit,
    /// `max_idle_ticks` ticks without progress
    Stalled,
    /// `max_paused_ticks` ticks paused or awaiting approval
    Paused,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Phase, PlanDefinition, SimulatedDriver};
    use cadence_core::{Status, Step};
    use cadence_strategy::{CanaryStrategy, ParallelStrategy, SerialStrategy};
    use std::sync::Arc;
    use std::time::Duration;

    fn deploy() -> Plan {
        Plan::new("deploy", Arc::new(SerialStrategy::new()))
            .with_phase(
                Phase::new("nodes", Arc::new(ParallelStrategy::new()))
                    .with_step(Step::new("node-0").with_asset("node-0"))
                    .with_step(Step::new("node-1").with_asset("node-1")),
            )
            .with_phase(
                Phase::new("gateways", Arc::new(SerialStrategy::new()))
                    .with_step(Step::new("gw-0"))
                    .with_step(Step::new("gw-1")),
            )
    }

    fn dispatched(result: &TickResult) -> Vec<String> {
        match result {
            TickResult::Advanced(report) => report.dispatched.clone(),
            other => panic!("expected progress, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tick_by_tick() {
        let mut engine = ExecutionEngine::new(vec![deploy()], SimulatedDriver::new());

        let first = engine.run_tick().await.unwrap();
        assert_eq!(dispatched(&first), ["nodes/node-0", "nodes/node-1"]);

        // In flight: polled, nothing new dispatched
        let second = engine.run_tick().await.unwrap();
        assert!(dispatched(&second).is_empty());

        // Nodes complete, gateways start serially
        let third = engine.run_tick().await.unwrap();
        assert_eq!(dispatched(&third), ["gateways/gw-0"]);
        assert_eq!(engine.plans()[0].phases()[0].status(), Status::Complete);
    }

    #[tokio::test]
    async fn test_run_to_completion() {
        let mut engine = ExecutionEngine::new(vec![deploy()], SimulatedDriver::new());
        assert_eq!(engine.run().await.unwrap(), RunOutcome::Complete);
        assert!(engine.is_complete());
        assert_eq!(engine.driver().dispatched(), 4);
        assert_eq!(engine.plans()[0].status(), Status::Complete);
    }

    #[tokio::test]
    async fn test_tick_limit() {
        let mut engine = ExecutionEngine::new(vec![deploy()], SimulatedDriver::new())
            .with_config(EngineConfig { max_ticks: Some(2), ..Default::default() });
        assert_eq!(engine.run().await.unwrap(), RunOutcome::TickLimit);
        assert_eq!(engine.ticks(), 2);
    }

    #[tokio::test]
    async fn test_failed_step_stalls_serial_plan() {
        let driver = SimulatedDriver::new().with_failure("gw-0");
        let mut engine = ExecutionEngine::new(vec![deploy()], driver);

        assert_eq!(engine.run().await.unwrap(), RunOutcome::Stalled);
        let plan = &engine.plans()[0];
        assert_eq!(plan.step("gateways", "gw-0").unwrap().status(), Status::Error);
        assert_eq!(plan.step("gateways", "gw-1").unwrap().status(), Status::Pending);
        assert_eq!(plan.status(), Status::Error);
    }

    #[tokio::test]
    async fn test_pause_and_resume_through_control() {
        let mut engine = ExecutionEngine::new(vec![deploy()], SimulatedDriver::new());
        let control = engine.control("deploy").unwrap();

        let handle = tokio::spawn(async move { control.interrupt_all() });
        handle.await.unwrap();

        assert!(matches!(engine.run_tick().await.unwrap(), TickResult::Interrupted));
        assert_eq!(engine.plans()[0].status(), Status::Waiting);

        engine.control("deploy").unwrap().proceed_all();
        let resumed = engine.run_tick().await.unwrap();
        assert_eq!(dispatched(&resumed), ["nodes/node-0", "nodes/node-1"]);
    }

    #[tokio::test]
    async fn test_interrupt_mid_flight_lets_running_steps_finish() {
        let mut engine = ExecutionEngine::new(vec![deploy()], SimulatedDriver::new());
        engine.run_tick().await.unwrap();

        engine.control("deploy").unwrap().interrupt_all();
        engine.run_tick().await.unwrap();
        engine.run_tick().await.unwrap();

        let nodes = &engine.plans()[0].phases()[0];
        assert!(nodes.steps().iter().all(|s| s.status() == Status::Complete));
        let gateways = &engine.plans()[0].phases()[1];
        assert!(gateways.steps().iter().all(|s| s.status() == Status::Pending));
        assert!(matches!(engine.run_tick().await.unwrap(), TickResult::Interrupted));
    }

    #[tokio::test]
    async fn test_recovery_plan_claims_assets_before_deploy() {
        let recovery = PlanDefinition::from_json(
            r#"{ "name": "recovery", "phases": [ { "name": "repair",
                "steps": [ { "name": "fix-node-0", "asset": "node-0" } ] } ] }"#,
        )
        .unwrap()
        .build()
        .unwrap();

        let mut engine = ExecutionEngine::new(vec![recovery, deploy()], SimulatedDriver::new());
        let first = engine.run_tick().await.unwrap();
        assert_eq!(dispatched(&first), ["repair/fix-node-0", "nodes/node-1"]);

        // node-0 stays blocked while the repair is in flight
        let second = engine.run_tick().await.unwrap();
        assert!(dispatched(&second).is_empty());

        let third = engine.run_tick().await.unwrap();
        assert_eq!(dispatched(&third), ["nodes/node-0"]);
    }

    #[tokio::test]
    async fn test_complete_plan_reports_complete() {
        let mut engine = ExecutionEngine::new(
            vec![Plan::new("empty", Arc::new(SerialStrategy::new()))],
            SimulatedDriver::new(),
        );
        assert!(matches!(engine.run_tick().await.unwrap(), TickResult::Complete));
        assert_eq!(engine.ticks(), 0);
    }

    #[tokio::test]
    async fn test_long_pause_is_not_a_stall() {
        let mut engine = ExecutionEngine::new(vec![deploy()], SimulatedDriver::new())
            .with_config(EngineConfig {
                tick_interval: Duration::from_millis(1),
                ..Default::default()
            });
        let control = engine.control("deploy").unwrap();
        control.interrupt_all();

        let resume = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            control.proceed_all();
        });

        assert_eq!(engine.run().await.unwrap(), RunOutcome::Complete);
        resume.await.unwrap();
        assert_eq!(engine.driver().dispatched(), 4);
    }

    #[tokio::test]
    async fn test_tick_hook_pauses_and_resumes() {
        let plan = deploy();
        let control = plan.control();

        let mut engine = ExecutionEngine::new(vec![plan], SimulatedDriver::new()).on_tick(
            move |tick| match tick {
                1 => control.interrupt_all(),
                8 => control.proceed_all(),
                _ => {}
            },
        );

        assert_eq!(engine.run().await.unwrap(), RunOutcome::Complete);
        // Seven paused ticks, more than max_idle_ticks, then the rollout
        assert!(engine.ticks() > 7);
    }

    #[tokio::test]
    async fn test_max_paused_ticks() {
        let mut engine = ExecutionEngine::new(vec![deploy()], SimulatedDriver::new())
            .with_config(EngineConfig { max_paused_ticks: Some(2), ..Default::default() });
        engine.control("deploy").unwrap().interrupt_all();

        assert_eq!(engine.run().await.unwrap(), RunOutcome::Paused);
        assert_eq!(engine.ticks(), 2);
    }

    #[tokio::test]
    async fn test_canary_phase_advances_only_on_approval() {
        let canary = CanaryStrategy::new(ParallelStrategy::new(), 1).unwrap();
        let plan = Plan::new("rollout", Arc::new(SerialStrategy::new())).with_phase(
            Phase::new("nodes", Arc::new(canary))
                .with_step(Step::new("node-0"))
                .with_step(Step::new("node-1"))
                .with_step(Step::new("node-2")),
        );
        let mut engine = ExecutionEngine::new(vec![plan], SimulatedDriver::new());
        let control = engine.control("rollout").unwrap();

        assert!(matches!(engine.run_tick().await.unwrap(), TickResult::Interrupted));

        assert!(control.approve_phase("nodes"));
        let first = engine.run_tick().await.unwrap();
        assert_eq!(dispatched(&first), ["nodes/node-0"]);

        // Pausing and resuming while the canary runs approves nothing
        control.interrupt_all();
        control.proceed_all();
        assert!(dispatched(&engine.run_tick().await.unwrap()).is_empty());
        assert!(dispatched(&engine.run_tick().await.unwrap()).is_empty());
        assert!(matches!(engine.run_tick().await.unwrap(), TickResult::Interrupted));

        assert!(control.approve_phase("nodes"));
        let rest = engine.run_tick().await.unwrap();
        assert_eq!(dispatched(&rest), ["nodes/node-1", "nodes/node-2"]);
    }
}
