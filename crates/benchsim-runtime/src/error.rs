//! Bench errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised by the bench core, its configuration, and test cases.
///
/// A failing test case is not an error: it produces a failing
/// [`TestResult`](crate::engine::TestResult). These variants describe faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BenchError {
    /// Configuration error.
    #[error("invalid config '{0}'")]
    InvalidConfig(SmolStr),

    /// Scenario script error.
    #[error("invalid scenario '{0}'")]
    InvalidScenario(SmolStr),

    /// Unknown input channel name.
    #[error("unknown input channel '{0}'")]
    UnknownChannel(SmolStr),

    /// Unknown indicator name.
    #[error("unknown indicator '{0}'")]
    UnknownIndicator(SmolStr),

    /// Unknown indicator color name.
    #[error("unknown color '{0}'")]
    UnknownColor(SmolStr),

    /// Unknown visual cue name.
    #[error("unknown visual cue '{0}'")]
    UnknownCue(SmolStr),

    /// A setup hook failed.
    #[error("setup hook {index} failed: {reason}")]
    SetupFailed { index: usize, reason: SmolStr },

    /// A teardown hook failed.
    #[error("teardown hook {index} failed: {reason}")]
    TeardownFailed { index: usize, reason: SmolStr },

    /// A test case faulted while starting or observing.
    #[error("test case fault '{0}'")]
    CaseFault(SmolStr),

    /// Thread spawn error.
    #[error("thread spawn error '{0}'")]
    ThreadSpawn(SmolStr),

    /// Runner command channel error.
    #[error("control error '{0}'")]
    ControlError(SmolStr),
}

impl BenchError {
    /// Build a test case fault from any displayable reason.
    pub fn fault(reason: impl std::fmt::Display) -> Self {
        Self::CaseFault(reason.to_string().into())
    }
}
