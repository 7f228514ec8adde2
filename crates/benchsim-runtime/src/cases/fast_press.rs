//! TC2: repeated fast presses on B.

use std::time::Duration;

use serde_json::json;

use crate::config::CaseTiming;
use crate::engine::{CaseContext, Fixture, TestCase, TestResult, Verdict};
use crate::error::BenchError;
use crate::input::{Channel, InputEvent};
use crate::time::{millis_of, SimTime};

#[derive(Debug, Clone)]
pub struct FastPressCase {
    window: Duration,
    threshold: Duration,
    presses: Vec<SimTime>,
}

impl FastPressCase {
    #[must_use]
    pub fn new(timing: &CaseTiming) -> Self {
        Self {
            window: timing.window,
            threshold: timing.fast_press,
            presses: Vec::new(),
        }
    }
}

impl TestCase for FastPressCase {
    fn name(&self) -> &str {
        "TC2 fast presses"
    }

    fn window(&self) -> Duration {
        self.window
    }

    fn start(&mut self, fixture: &mut Fixture) -> Result<(), BenchError> {
        self.presses.clear();
        fixture.listen(&[Channel::B]);
        Ok(())
    }

    fn on_input(&mut self, event: InputEvent, _cx: &mut CaseContext) -> Verdict {
        self.presses.push(event.at);
        Ok(None)
    }

    fn conclude(&mut self, _cx: &mut CaseContext) -> Result<TestResult, BenchError> {
        let intervals: Vec<Duration> = self
            .presses
            .windows(2)
            .map(|pair| pair[1].since(pair[0]))
            .collect();
        let enough = self.presses.len() >= 2;
        let all_fast = intervals.iter().all(|gap| *gap < self.threshold);
        let details = json!({
            "press_count": self.presses.len(),
            "intervals_ms": intervals.iter().copied().map(millis_of).collect::<Vec<_>>(),
        });
        let result = if !enough {
            TestResult::fail("Not enough presses", details)
        } else if !all_fast {
            TestResult::fail("One or more intervals too slow", details)
        } else {
            TestResult::pass("Fast presses detected", details)
        };
        Ok(result)
    }
}
