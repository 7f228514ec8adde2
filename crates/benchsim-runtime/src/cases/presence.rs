//! TC1: every test input pressed at least once.

use std::time::Duration;

use serde_json::json;

use crate::config::CaseTiming;
use crate::engine::{CaseContext, Fixture, TestCase, TestResult, Verdict};
use crate::error::BenchError;
use crate::input::{Channel, InputEvent};

use super::InputCounts;

#[derive(Debug, Clone)]
pub struct PresenceCase {
    window: Duration,
    seen: InputCounts,
}

impl PresenceCase {
    #[must_use]
    pub fn new(timing: &CaseTiming) -> Self {
        Self {
            window: timing.window,
            seen: InputCounts::default(),
        }
    }
}

impl TestCase for PresenceCase {
    fn name(&self) -> &str {
        "TC1 all inputs pressed"
    }

    fn window(&self) -> Duration {
        self.window
    }

    fn start(&mut self, fixture: &mut Fixture) -> Result<(), BenchError> {
        self.seen = InputCounts::default();
        fixture.listen(&Channel::TEST_INPUTS);
        Ok(())
    }

    fn on_input(&mut self, event: InputEvent, _cx: &mut CaseContext) -> Verdict {
        self.seen.latch(event.channel);
        Ok(None)
    }

    fn conclude(&mut self, _cx: &mut CaseContext) -> Result<TestResult, BenchError> {
        let seen = self.seen;
        Ok(TestResult::check(
            seen.a > 0 && seen.b > 0 && seen.c > 0,
            "All required buttons pressed",
            json!({ "seen": seen.to_json() }),
        ))
    }
}
