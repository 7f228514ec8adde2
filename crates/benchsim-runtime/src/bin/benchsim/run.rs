//! `benchsim run`: scripted scenarios.

use std::path::Path;

use anyhow::{bail, Context};

use benchsim_runtime::events::BenchEvent;
use benchsim_runtime::scenario::{Scenario, ScenarioReport};

use crate::style;

pub fn run_scenario(path: &Path, config: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = crate::load_config(config)?;
    let scenario = Scenario::load(path)
        .with_context(|| format!("failed to load scenario {}", path.display()))?;
    let report = scenario.run(&config);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    if !report.passed() {
        bail!(
            "scenario '{}' failed {} of {} expectations",
            report.name,
            report.failures.len(),
            report.checked
        );
    }
    Ok(())
}

fn print_report(report: &ScenarioReport) {
    println!("{}", style::accent(format!("scenario {}", report.name)));
    for event in &report.events {
        if let Some(line) = describe(event) {
            println!("  {:>8}  {line}", event.at().to_string());
        }
    }
    for failure in &report.failures {
        println!(
            "  {}",
            style::error(format!(
                "expected {} to be {} at {}, found {}",
                failure.indicator, failure.expected, failure.at, failure.actual
            ))
        );
    }
    let summary = format!(
        "{}/{} expectations met",
        report.checked - report.failures.len(),
        report.checked
    );
    if report.passed() {
        println!("{}", style::success(summary));
    } else {
        println!("{}", style::error(summary));
    }
}

fn describe(event: &BenchEvent) -> Option<String> {
    let line = match event {
        BenchEvent::Input { .. } => return None,
        BenchEvent::Power { on, .. } => format!("power {}", if *on { "on" } else { "off" }),
        BenchEvent::Boot { phase, .. } => format!("boot {phase:?}"),
        BenchEvent::TestStarted { slot, name, .. } => format!("tc{} started: {name}", slot + 1),
        BenchEvent::TestFinished { slot, result, .. } => format!("tc{} {result}", slot + 1),
        BenchEvent::RunSuperseded { slot, .. } => format!("tc{} superseded", slot + 1),
        BenchEvent::StaleCompletion { run_id, .. } => {
            format!("stale completion of run {run_id} discarded")
        }
        BenchEvent::StartRejected { reason, .. } => format!("start rejected: {reason}"),
        BenchEvent::ResetRejected { .. } => "reset rejected without power".to_string(),
        BenchEvent::SuiteWrapped { .. } => "suite wrapped to tc1".to_string(),
        BenchEvent::UnknownCue { slot, cue, .. } => {
            style::error(format!("tc{} unknown cue {cue}", slot + 1))
        }
        BenchEvent::HookFailed { slot, error, .. } => {
            style::error(format!("tc{} hook failed: {error}", slot + 1))
        }
    };
    Some(line)
}
