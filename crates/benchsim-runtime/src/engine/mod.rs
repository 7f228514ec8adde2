//! Test case contract and the single-run executor.

mod cue;
mod fixture;
mod result;
mod runner;

use std::time::Duration;

use serde::Serialize;

use crate::error::BenchError;
use crate::input::InputEvent;

pub use cue::VisualCue;
pub use fixture::{CaseContext, Fixture, HookContext, HookResult};
pub use result::TestResult;
pub use runner::{ActiveRun, TestRunner};

/// Outcome of a test case's observation callbacks: `Some` ends the run early.
pub type Verdict = Result<Option<TestResult>, BenchError>;

/// A behavioral acceptance test over button presses.
///
/// The runner calls [`start`](Self::start) once per run so the case can reset
/// itself and register hooks, then feeds it subscribed presses and optional
/// ticks until it returns a result or its window closes.
pub trait TestCase: Send {
    /// Short human-readable name.
    fn name(&self) -> &str;

    /// Observation window; [`conclude`](Self::conclude) runs when it closes.
    fn window(&self) -> Duration;

    /// Background tick interval, if the case needs time-driven checks.
    fn tick_interval(&self) -> Option<Duration> {
        None
    }

    /// Reset per-run state and register setup/teardown hooks.
    fn start(&mut self, fixture: &mut Fixture) -> Result<(), BenchError>;

    /// A press on a subscribed channel.
    fn on_input(&mut self, _event: InputEvent, _cx: &mut CaseContext) -> Verdict {
        Ok(None)
    }

    /// Background tick.
    fn on_tick(&mut self, _cx: &mut CaseContext) -> Verdict {
        Ok(None)
    }

    /// Window closed without an earlier verdict.
    fn conclude(&mut self, cx: &mut CaseContext) -> Result<TestResult, BenchError>;
}

/// Latest known outcome per panel slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// Not run since the last reset or wrap.
    #[default]
    NoResult,
    /// Currently observing.
    InProgress,
    /// Last run passed.
    Pass,
    /// Last run failed or faulted.
    Fail,
}
