//! Journal of notable bench events.

#![allow(missing_docs)]

use serde::Serialize;
use smol_str::SmolStr;

use crate::engine::TestResult;
use crate::input::Channel;
use crate::time::SimTime;

/// Boot and reset milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootPhase {
    InitFlash,
    Ready,
    Resetting,
    Restart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BenchEvent {
    Input {
        at: SimTime,
        channel: Channel,
    },
    Power {
        at: SimTime,
        on: bool,
    },
    Boot {
        at: SimTime,
        phase: BootPhase,
    },
    TestStarted {
        at: SimTime,
        slot: usize,
        run_id: u64,
        name: SmolStr,
    },
    TestFinished {
        at: SimTime,
        slot: usize,
        run_id: u64,
        result: TestResult,
    },
    /// A reset or power-off ended the run before it concluded.
    RunSuperseded {
        at: SimTime,
        slot: usize,
        run_id: u64,
    },
    /// A completion arrived for a run that is no longer current.
    StaleCompletion {
        at: SimTime,
        run_id: u64,
    },
    StartRejected {
        at: SimTime,
        reason: SmolStr,
    },
    ResetRejected {
        at: SimTime,
    },
    SuiteWrapped {
        at: SimTime,
    },
    UnknownCue {
        at: SimTime,
        slot: usize,
        cue: SmolStr,
    },
    HookFailed {
        at: SimTime,
        slot: usize,
        run_id: u64,
        error: SmolStr,
    },
}

impl BenchEvent {
    /// When the event happened.
    #[must_use]
    pub fn at(&self) -> SimTime {
        match self {
            Self::Input { at, .. }
            | Self::Power { at, .. }
            | Self::Boot { at, .. }
            | Self::TestStarted { at, .. }
            | Self::TestFinished { at, .. }
            | Self::RunSuperseded { at, .. }
            | Self::StaleCompletion { at, .. }
            | Self::StartRejected { at, .. }
            | Self::ResetRejected { at }
            | Self::SuiteWrapped { at }
            | Self::UnknownCue { at, .. }
            | Self::HookFailed { at, .. } => *at,
        }
    }
}
