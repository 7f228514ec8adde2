//! TC3: B and C pressed, A never.

use std::time::Duration;

use serde_json::json;

use crate::config::CaseTiming;
use crate::engine::{CaseContext, Fixture, TestCase, TestResult, Verdict};
use crate::error::BenchError;
use crate::input::{Channel, InputEvent};

use super::InputCounts;

#[derive(Debug, Clone)]
pub struct ExclusionCase {
    window: Duration,
    flags: InputCounts,
}

impl ExclusionCase {
    #[must_use]
    pub fn new(timing: &CaseTiming) -> Self {
        Self {
            window: timing.window,
            flags: InputCounts::default(),
        }
    }
}

impl TestCase for ExclusionCase {
    fn name(&self) -> &str {
        "TC3 input pattern"
    }

    fn window(&self) -> Duration {
        self.window
    }

    fn start(&mut self, fixture: &mut Fixture) -> Result<(), BenchError> {
        self.flags = InputCounts::default();
        fixture.listen(&Channel::TEST_INPUTS);
        Ok(())
    }

    fn on_input(&mut self, event: InputEvent, cx: &mut CaseContext) -> Verdict {
        if cx.ready() {
            self.flags.latch(event.channel);
        }
        Ok(None)
    }

    fn conclude(&mut self, _cx: &mut CaseContext) -> Result<TestResult, BenchError> {
        let flags = self.flags;
        Ok(TestResult::check(
            flags.a == 0 && flags.b == 1 && flags.c == 1,
            "Incorrect input pattern",
            json!({ "input_state": flags.to_json() }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::testing::{conclude, press, press_with, start};

    fn run(channels: &[Channel]) -> TestResult {
        let mut case = ExclusionCase::new(&CaseTiming::default());
        start(&mut case);
        for (at, channel) in (100..).step_by(100).zip(channels) {
            press(&mut case, *channel, at).unwrap();
        }
        conclude(&mut case, 5_000)
    }

    #[test]
    fn b_and_c_without_a_passes() {
        assert!(run(&[Channel::B, Channel::C]).passed());
        assert!(run(&[Channel::C, Channel::B, Channel::B]).passed());
    }

    #[test]
    fn any_a_fails() {
        let result = run(&[Channel::A, Channel::B, Channel::C]);
        assert!(!result.passed());
        assert_eq!(result.details()["input_state"]["a"], 1);
    }

    #[test]
    fn presses_while_not_ready_are_ignored() {
        let mut case = ExclusionCase::new(&CaseTiming::default());
        start(&mut case);
        press_with(&mut case, Channel::A, 50, false).unwrap();
        press(&mut case, Channel::B, 100).unwrap();
        press(&mut case, Channel::C, 200).unwrap();
        assert!(conclude(&mut case, 5_000).passed());
    }
}
