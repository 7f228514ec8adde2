//! TC5: unlock sequence with bounded attempts and a recovery gesture.
//!
//! A wrong five-press sequence costs an attempt and enters recovery: the fail
//! indicator blinks until C is pressed twice in a row. Missing the recovery
//! window ends the test.

use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::config::CaseTiming;
use crate::engine::{CaseContext, Fixture, TestCase, TestResult, Verdict, VisualCue};
use crate::error::BenchError;
use crate::input::{Channel, InputEvent};
use crate::time::SimTime;

const SEQUENCE: [Channel; 5] = [Channel::A, Channel::B, Channel::C, Channel::B, Channel::A];

#[derive(Debug, Clone)]
pub struct UnlockCase {
    window: Duration,
    recovery_window: Duration,
    tick: Duration,
    max_attempts: u32,
    entered: Vec<Channel>,
    attempts: u32,
    recovery: Option<Recovery>,
}

#[derive(Debug, Clone, Copy)]
struct Recovery {
    since: SimTime,
    last_was_c: bool,
}

impl UnlockCase {
    #[must_use]
    pub fn new(timing: &CaseTiming) -> Self {
        Self {
            window: timing.unlock_window,
            recovery_window: timing.recovery_window,
            tick: timing.unlock_tick,
            max_attempts: timing.max_attempts,
            entered: Vec::with_capacity(SEQUENCE.len()),
            attempts: 0,
            recovery: None,
        }
    }

    fn details(&self) -> serde_json::Value {
        json!({
            "attempts": self.attempts,
            "max_attempts": self.max_attempts,
            "sequence": self.entered.iter().map(|channel| channel.as_str()).collect::<Vec<_>>(),
            "in_recovery": self.recovery.is_some(),
        })
    }

    fn recovery_expired(&self, now: SimTime) -> bool {
        self.recovery
            .is_some_and(|recovery| now.since(recovery.since) >= self.recovery_window)
    }

    fn fail_recovery(&mut self, cx: &mut CaseContext) -> TestResult {
        self.recovery = None;
        self.attempts += 1;
        cx.cue(VisualCue::StopBlink);
        let message = if self.attempts >= self.max_attempts {
            "Recovery failed and max attempts reached"
        } else {
            "Recovery failed"
        };
        debug!(attempts = self.attempts, "unlock recovery timed out");
        TestResult::fail(message, self.details())
    }

    fn recover(&mut self, channel: Channel, cx: &mut CaseContext) {
        let Some(recovery) = self.recovery.as_mut() else {
            return;
        };
        if channel != Channel::C {
            recovery.last_was_c = false;
            return;
        }
        if !recovery.last_was_c {
            recovery.last_was_c = true;
            return;
        }
        debug!("unlock recovery gesture accepted");
        self.recovery = None;
        self.entered.clear();
        cx.cue(VisualCue::StopBlink);
        cx.cue(VisualCue::TestInProgress);
    }
}

impl TestCase for UnlockCase {
    fn name(&self) -> &str {
        "TC5 unlock sequence"
    }

    fn window(&self) -> Duration {
        self.window
    }

    fn tick_interval(&self) -> Option<Duration> {
        Some(self.tick)
    }

    fn start(&mut self, fixture: &mut Fixture) -> Result<(), BenchError> {
        self.entered.clear();
        self.attempts = 0;
        self.recovery = None;
        fixture.listen(&Channel::TEST_INPUTS);
        Ok(())
    }

    fn on_input(&mut self, event: InputEvent, cx: &mut CaseContext) -> Verdict {
        if self.recovery_expired(cx.now()) {
            return Ok(Some(self.fail_recovery(cx)));
        }
        if self.recovery.is_some() {
            self.recover(event.channel, cx);
            return Ok(None);
        }

        self.entered.push(event.channel);
        if self.entered.len() < SEQUENCE.len() {
            return Ok(None);
        }
        if self.entered == SEQUENCE {
            return Ok(Some(TestResult::pass(
                "Unlock sequence correct",
                self.details(),
            )));
        }

        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            return Ok(Some(TestResult::fail(
                "Maximum attempts reached",
                self.details(),
            )));
        }
        debug!(attempts = self.attempts, "wrong unlock sequence, entering recovery");
        self.entered.clear();
        self.recovery = Some(Recovery {
            since: cx.now(),
            last_was_c: false,
        });
        cx.cue(VisualCue::FailBlink);
        Ok(None)
    }

    fn on_tick(&mut self, cx: &mut CaseContext) -> Verdict {
        if self.recovery_expired(cx.now()) {
            return Ok(Some(self.fail_recovery(cx)));
        }
        Ok(None)
    }

    fn conclude(&mut self, cx: &mut CaseContext) -> Result<TestResult, BenchError> {
        if self.recovery.is_some() {
            return Ok(self.fail_recovery(cx));
        }
        Ok(TestResult::fail(
            "Unlock sequence not completed",
            self.details(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::testing::{conclude, press, start};

    const WRONG: [Channel; 5] = [Channel::A, Channel::A, Channel::A, Channel::A, Channel::A];

    fn enter(case: &mut UnlockCase, channels: &[Channel], from_ms: u64) -> Option<TestResult> {
        let mut verdict = None;
        for (offset, channel) in (0..).step_by(50).zip(channels) {
            verdict = press(case, *channel, from_ms + offset).unwrap();
        }
        verdict
    }

    fn tick(case: &mut UnlockCase, at_ms: u64) -> (Option<TestResult>, Vec<String>) {
        let mut cx = CaseContext::new(SimTime::from_millis(at_ms), true);
        let verdict = case.on_tick(&mut cx).unwrap();
        let cues = cx
            .into_cues()
            .into_iter()
            .map(|cue| format!("{cue:?}"))
            .collect();
        (verdict, cues)
    }

    #[test]
    fn correct_sequence_passes_immediately() {
        let mut case = UnlockCase::new(&CaseTiming::default());
        start(&mut case);
        let result = enter(&mut case, &SEQUENCE, 100).unwrap();
        assert!(result.passed());
        assert_eq!(result.message(), "Unlock sequence correct");
    }

    #[test]
    fn recovery_keeps_test_active_and_clears_sequence() {
        let mut case = UnlockCase::new(&CaseTiming::default());
        start(&mut case);
        assert_eq!(enter(&mut case, &WRONG, 100), None);
        assert!(case.recovery.is_some());
        assert!(case.entered.is_empty());

        assert_eq!(enter(&mut case, &[Channel::C, Channel::C], 1_000), None);
        assert!(case.recovery.is_none());
        assert_eq!(case.attempts, 1);

        let result = enter(&mut case, &SEQUENCE, 2_000).unwrap();
        assert!(result.passed());
    }

    #[test]
    fn broken_double_c_does_not_recover() {
        let mut case = UnlockCase::new(&CaseTiming::default());
        start(&mut case);
        enter(&mut case, &WRONG, 0);
        enter(&mut case, &[Channel::C, Channel::B, Channel::C], 1_000);
        assert!(case.recovery.is_some());
    }

    #[test]
    fn recovery_timeout_ends_the_test() {
        let mut case = UnlockCase::new(&CaseTiming::default());
        start(&mut case);
        enter(&mut case, &WRONG, 0);
        // One missed recovery ends the run even with attempts to spare (2 of 3).
        // Recovery began at the fifth press, 200 ms in.
        assert_eq!(tick(&mut case, 5_100).0, None);
        let (verdict, cues) = tick(&mut case, 5_200);
        let result = verdict.unwrap();
        assert_eq!(result.message(), "Recovery failed");
        assert_eq!(result.details()["attempts"], 2);
        assert_eq!(cues, vec!["Known(StopBlink)".to_string()]);
    }

    #[test]
    fn recovery_timeout_at_last_attempt() {
        let timing = CaseTiming {
            max_attempts: 2,
            ..CaseTiming::default()
        };
        let mut case = UnlockCase::new(&timing);
        start(&mut case);
        enter(&mut case, &WRONG, 0);
        let (verdict, _) = tick(&mut case, 5_200);
        assert_eq!(
            verdict.unwrap().message(),
            "Recovery failed and max attempts reached"
        );
    }

    #[test]
    fn third_wrong_sequence_fails() {
        let mut case = UnlockCase::new(&CaseTiming::default());
        start(&mut case);
        for round in 0..2 {
            let base = round * 1_000;
            assert_eq!(enter(&mut case, &WRONG, base), None);
            enter(&mut case, &[Channel::C, Channel::C], base + 500);
        }
        let result = enter(&mut case, &WRONG, 3_000).unwrap();
        assert_eq!(result.message(), "Maximum attempts reached");
        assert_eq!(result.details()["attempts"], 3);
    }

    #[test]
    fn window_close_without_verdict_fails() {
        let mut case = UnlockCase::new(&CaseTiming::default());
        start(&mut case);
        enter(&mut case, &[Channel::A, Channel::B], 0);
        let result = conclude(&mut case, 10_000);
        assert_eq!(result.message(), "Unlock sequence not completed");
    }
}
