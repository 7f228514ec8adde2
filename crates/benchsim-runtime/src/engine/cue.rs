//! Visual cues a test case may request on its own pass/fail indicators.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use smol_str::SmolStr;

use crate::error::BenchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisualCue {
    /// Pulse the fail indicator (recovery sub-state).
    FailBlink,
    /// Stop the fail pulse.
    StopBlink,
    /// Solid pass.
    Pass,
    /// Solid fail.
    Fail,
    /// Both indicators off.
    Off,
    /// Resume the alternating in-progress pattern.
    TestInProgress,
}

impl VisualCue {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FailBlink => "FAIL_BLINK",
            Self::StopBlink => "STOP_BLINK",
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Off => "OFF",
            Self::TestInProgress => "TEST_IN_PROGRESS",
        }
    }
}

impl fmt::Display for VisualCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisualCue {
    type Err = BenchError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_uppercase().as_str() {
            "FAIL_BLINK" => Ok(Self::FailBlink),
            "STOP_FAIL_BLINK" | "STOP_BLINK" => Ok(Self::StopBlink),
            "PASS" => Ok(Self::Pass),
            "FAIL" => Ok(Self::Fail),
            "OFF" => Ok(Self::Off),
            "TEST_IN_PROGRESS" => Ok(Self::TestInProgress),
            _ => Err(BenchError::UnknownCue(SmolStr::new(text))),
        }
    }
}
