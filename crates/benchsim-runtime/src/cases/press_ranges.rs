//! TC4: at least one input pressed a number of times within its range.

use std::ops::RangeInclusive;
use std::time::Duration;

use serde_json::json;

use crate::config::CaseTiming;
use crate::engine::{CaseContext, Fixture, TestCase, TestResult, Verdict};
use crate::error::BenchError;
use crate::input::{Channel, InputEvent};

use super::InputCounts;

const RANGE_A: RangeInclusive<u32> = 1..=3;
const RANGE_B: RangeInclusive<u32> = 5..=7;
const RANGE_C: RangeInclusive<u32> = 2..=4;

#[derive(Debug, Clone)]
pub struct PressRangeCase {
    window: Duration,
    counts: InputCounts,
}

impl PressRangeCase {
    #[must_use]
    pub fn new(timing: &CaseTiming) -> Self {
        Self {
            window: timing.window,
            counts: InputCounts::default(),
        }
    }
}

impl TestCase for PressRangeCase {
    fn name(&self) -> &str {
        "TC4 press ranges"
    }

    fn window(&self) -> Duration {
        self.window
    }

    fn start(&mut self, fixture: &mut Fixture) -> Result<(), BenchError> {
        self.counts = InputCounts::default();
        fixture.listen(&Channel::TEST_INPUTS);
        Ok(())
    }

    fn on_input(&mut self, event: InputEvent, cx: &mut CaseContext) -> Verdict {
        if cx.ready() {
            self.counts.bump(event.channel);
        }
        Ok(None)
    }

    fn conclude(&mut self, _cx: &mut CaseContext) -> Result<TestResult, BenchError> {
        let counts = self.counts;
        let valid = [
            ("a", counts.a, RANGE_A.contains(&counts.a)),
            ("b", counts.b, RANGE_B.contains(&counts.b)),
            ("c", counts.c, RANGE_C.contains(&counts.c)),
        ];
        let any_valid = valid.iter().any(|(_, _, ok)| *ok);
        let results: serde_json::Map<String, serde_json::Value> = valid
            .iter()
            .map(|(key, count, ok)| {
                ((*key).to_string(), json!({ "count": count, "is_valid": ok }))
            })
            .collect();
        Ok(TestResult::check(
            any_valid,
            "No valid inputs",
            json!({ "press_counts": counts.to_json(), "results": results }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::testing::{conclude, press, press_with, start};

    fn run(a: u32, b: u32, c: u32) -> TestResult {
        let mut case = PressRangeCase::new(&CaseTiming::default());
        start(&mut case);
        let mut at = 0;
        for (channel, times) in [(Channel::A, a), (Channel::B, b), (Channel::C, c)] {
            for _ in 0..times {
                at += 50;
                press(&mut case, channel, at).unwrap();
            }
        }
        conclude(&mut case, 5_000)
    }

    #[test]
    fn all_in_range_passes() {
        assert!(run(2, 6, 3).passed());
    }

    #[test]
    fn one_channel_in_range_is_enough() {
        assert!(run(0, 0, 4).passed());
        assert!(run(9, 5, 0).passed());
    }

    #[test]
    fn all_out_of_range_fails() {
        let result = run(5, 1, 10);
        assert_eq!(result.to_string(), "FAIL: No valid inputs");
        assert_eq!(result.details()["results"]["c"]["count"], 10);
        assert_eq!(result.details()["results"]["c"]["is_valid"], false);
    }

    #[test]
    fn counts_only_while_ready() {
        let mut case = PressRangeCase::new(&CaseTiming::default());
        start(&mut case);
        press_with(&mut case, Channel::A, 10, false).unwrap();
        assert!(!conclude(&mut case, 5_000).passed());
    }
}
