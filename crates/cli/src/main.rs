//! Cadence CLI - inspect and simulate step scheduling for plans.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cadence_core::{DirtyAssets, Element};
use cadence_execution::{
    EngineConfig, ExecutionEngine, Plan, PlanControl, PlanDefinition, PlanScheduler,
    SimulatedDriver,
};
use cadence_strategy::DependencyStrategy;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Step scheduling for deployment and recovery plans", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a plan definition
    Validate {
        /// Plan definition (JSON)
        plan: PathBuf,
    },
    /// Show the steps the next tick would select
    Candidates {
        /// Plan definitions (JSON), highest precedence first
        #[arg(required = true)]
        plans: Vec<PathBuf>,
        /// Assets already claimed elsewhere
        #[arg(long = "dirty")]
        dirty: Vec<String>,
    },
    /// Run plans against a simulated driver
    Simulate {
        /// Plan definitions (JSON), highest precedence first
        #[arg(required = true)]
        plans: Vec<PathBuf>,
        /// Maximum number of ticks
        #[arg(long, default_value = "50")]
        max_ticks: usize,
        /// Ticks without progress before the run counts as stalled
        #[arg(long, default_value = "3")]
        max_idle_ticks: usize,
        /// Paused ticks before the run gives up waiting for the operator
        #[arg(long, default_value = "10")]
        max_paused_ticks: usize,
        /// Steps that fail the first time they start
        #[arg(long = "fail")]
        failures: Vec<String>,
        /// Ticks before which every plan is interrupted
        #[arg(long = "pause-at")]
        pause_at: Vec<usize>,
        /// Ticks before which every plan proceeds
        #[arg(long = "resume-at")]
        resume_at: Vec<usize>,
        /// Approve the next canary of a phase before a tick, as TICK:PHASE
        #[arg(long = "approve-at", value_parser = parse_approval)]
        approvals: Vec<(usize, String)>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { plan } => {
            let definition = load(&plan)?;
            let plan = definition.build()?;

            println!("Plan {} ({}): valid", plan.name, plan.strategy().name());
            let order = DependencyStrategy::topological_order(plan.phases())?;
            for phase in order {
                println!(
                    "  {} | {} | {} step(s){}",
                    phase.name,
                    phase.strategy().name(),
                    phase.steps().len(),
                    format_dependencies(phase.dependencies()),
                );
                for step in phase.steps() {
                    println!(
                        "    {} | {} | {}{}",
                        step.name,
                        step.status(),
                        step.asset().unwrap_or("-"),
                        format_dependencies(step.dependencies()),
                    );
                }
            }
        }
        Commands::Candidates { plans, dirty } => {
            let plans = load_plans(&plans)?;
            let claimed: DirtyAssets = dirty.into_iter().collect();
            let selection = PlanScheduler::default().select_with(&plans, claimed);

            println!("Candidates ({})", selection.selected.len());
            for selected in &selection.selected {
                println!("  {}/{}/{}", selected.plan, selected.phase, selected.step);
            }
            if !selection.deferred.is_empty() {
                println!("Deferred: {}", selection.deferred.join(", "));
            }
            let mut claimed: Vec<&str> = selection.dirty_assets.iter().collect();
            claimed.sort_unstable();
            println!("Claimed assets: {}", claimed.join(", "));
        }
        Commands::Simulate {
            plans,
            max_ticks,
            max_idle_ticks,
            max_paused_ticks,
            failures,
            pause_at,
            resume_at,
            approvals,
        } => {
            let plans = load_plans(&plans)?;
            let controls: Vec<PlanControl> = plans.iter().map(Plan::control).collect();
            let driver = failures
                .into_iter()
                .fold(SimulatedDriver::new(), SimulatedDriver::with_failure);
            let config = EngineConfig {
                max_ticks: Some(max_ticks),
                max_idle_ticks,
                max_paused_ticks: Some(max_paused_ticks),
                ..Default::default()
            };

            let mut engine = ExecutionEngine::new(plans, driver)
                .with_config(config)
                .on_tick(move |tick| operate(tick, &controls, &pause_at, &resume_at, &approvals));
            let outcome = engine.run().await?;

            println!("{:?} after {} tick(s)", outcome, engine.ticks());
            for plan in engine.plans() {
                println!("Plan {}: {}", plan.name, plan.status());
                for phase in plan.phases() {
                    println!("  {}: {}", phase.name, phase.status());
                    for step in phase.steps() {
                        println!("    {}: {}", step.name, step.status());
                    }
                }
            }
        }
    }

    Ok(())
}

/// Apply the operator actions scheduled for `tick`.
fn operate(
    tick: usize,
    controls: &[PlanControl],
    pause_at: &[usize],
    resume_at: &[usize],
    approvals: &[(usize, String)],
) {
    if pause_at.contains(&tick) {
        for control in controls {
            info!("Tick {}: pausing plan {}", tick, control.plan());
            control.interrupt_all();
        }
    }
    if resume_at.contains(&tick) {
        for control in controls {
            info!("Tick {}: resuming plan {}", tick, control.plan());
            control.proceed_all();
        }
    }
    for (_, phase) in approvals.iter().filter(|(at, _)| *at == tick) {
        let approved = controls.iter().filter(|c| c.approve_phase(phase)).count();
        if approved == 0 {
            warn!("Tick {}: phase {} has nothing left to approve", tick, phase);
        }
    }
}

fn parse_approval(value: &str) -> std::result::Result<(usize, String), String> {
    let (tick, phase) = value
        .split_once(':')
        .ok_or_else(|| format!("expected TICK:PHASE, got {value}"))?;
    let tick = tick
        .trim()
        .parse()
        .map_err(|e| format!("invalid tick {tick}: {e}"))?;
    Ok((tick, phase.trim().to_string()))
}

fn load(path: &Path) -> Result<PlanDefinition> {
    PlanDefinition::load(path).with_context(|| format!("Failed to load plan {}", path.display()))
}

fn load_plans(paths: &[PathBuf]) -> Result<Vec<Plan>> {
    paths
        .iter()
        .map(|path| Ok(load(path)?.build()?))
        .collect()
}

fn format_dependencies(dependencies: &[String]) -> String {
    if dependencies.is_empty() {
        String::new()
    } else {
        format!(" | after {}", dependencies.join(", "))
    }
}
