// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod model;
pub mod replay;
pub mod source;
pub mod store;
pub mod translate;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::replay::{load_scenario, replay, ReplayReport, Scenario};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - (optional) scenario loading
/// - replay through a live engine with an in-memory job store
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(&args.config)?;
    let scenario = args.replay.as_deref().map(load_scenario).transpose()?;

    if args.dry_run || scenario.is_none() {
        print_dry_run(&cfg, scenario.as_ref());
        return Ok(());
    }

    if let Some(scenario) = scenario {
        info!(
            tasks = scenario.task.len(),
            events = scenario.event_count(),
            "replaying pod event scenario"
        );
        let report = replay(&scenario, &cfg).await?;
        print_report(&report);
    }
    Ok(())
}

/// Simple dry-run output: print effective config and scenario contents.
fn print_dry_run(cfg: &ConfigFile, scenario: Option<&Scenario>) {
    println!("podsync dry-run");
    println!("  engine.merge_capacity = {}", cfg.engine.merge_capacity);
    println!("  engine.source_capacity = {}", cfg.engine.source_capacity);
    println!("  annotations.node_domain = {}", cfg.annotations.node_domain);
    println!("  annotations.network_domain = {}", cfg.annotations.network_domain);

    if let Some(scenario) = scenario {
        println!();
        println!("jobs ({}):", scenario.job.len());
        for job in &scenario.job {
            println!("  - {}", job.id);
        }
        println!("tasks ({}):", scenario.task.len());
        for seed in &scenario.task {
            println!("  - {} (job {}, {})", seed.id, seed.job_id, seed.state);
        }
        println!("direct events: {}", scenario.direct.len());
        for event in &scenario.direct {
            println!("  - {} {} {}", event.kind(), event.task_id(), event.pod().phase);
        }
        println!("reconciler events: {}", scenario.reconciler.len());
        for event in &scenario.reconciler {
            println!("  - {} {} {}", event.kind(), event.task_id(), event.pod().phase);
        }
    }

    debug!("dry-run complete (no events processed)");
}

fn print_report(report: &ReplayReport) {
    let stats = &report.stats;
    println!(
        "events: {} received, {} dispatched, {} dropped, {} failed writes",
        stats.received, stats.dispatched, stats.dropped, stats.failed_writes
    );
    println!();

    for task in &report.tasks {
        println!("{} [{}]", task.id, task.state());
        let history: Vec<String> = task.visited_states().map(|s| s.to_string()).collect();
        println!("    history: {}", history.join(" -> "));
        if !task.status.reason_code.is_empty() {
            println!(
                "    reason: {} ({})",
                task.status.reason_code, task.status.reason_message
            );
        }
        for (key, value) in &task.task_context {
            println!("    {key} = {value}");
        }
    }
}
