//! The standard five-case acceptance library.

#![allow(missing_docs)]

mod exclusion;
mod fast_press;
mod presence;
mod press_ranges;
mod unlock;

use crate::config::CaseTiming;
use crate::engine::TestCase;
use crate::input::Channel;
use crate::panel::SLOT_COUNT;

pub use exclusion::ExclusionCase;
pub use fast_press::FastPressCase;
pub use presence::PresenceCase;
pub use press_ranges::PressRangeCase;
pub use unlock::UnlockCase;

/// Library in panel order: slot 0 is TC1.
#[must_use]
pub fn standard_library(timing: &CaseTiming) -> [Box<dyn TestCase>; SLOT_COUNT] {
    [
        Box::new(PresenceCase::new(timing)),
        Box::new(FastPressCase::new(timing)),
        Box::new(ExclusionCase::new(timing)),
        Box::new(PressRangeCase::new(timing)),
        Box::new(UnlockCase::new(timing)),
    ]
}

/// Per-channel counters for the three test inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct InputCounts {
    pub(crate) a: u32,
    pub(crate) b: u32,
    pub(crate) c: u32,
}

impl InputCounts {
    pub(crate) fn slot_mut(&mut self, channel: Channel) -> Option<&mut u32> {
        match channel {
            Channel::A => Some(&mut self.a),
            Channel::B => Some(&mut self.b),
            Channel::C => Some(&mut self.c),
            Channel::D | Channel::E | Channel::Power => None,
        }
    }

    pub(crate) fn bump(&mut self, channel: Channel) {
        if let Some(count) = self.slot_mut(channel) {
            *count = count.saturating_add(1);
        }
    }

    pub(crate) fn latch(&mut self, channel: Channel) {
        if let Some(flag) = self.slot_mut(channel) {
            *flag = 1;
        }
    }

    pub(crate) fn to_json(self) -> serde_json::Value {
        serde_json::json!({ "a": self.a, "b": self.b, "c": self.c })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Drive a case directly, without a bench.

    use crate::engine::{CaseContext, Fixture, TestCase, TestResult, Verdict};
    use crate::input::{Channel, InputEvent};
    use crate::time::SimTime;

    pub(crate) fn start(case: &mut dyn TestCase) {
        let mut fixture = Fixture::new();
        case.start(&mut fixture).unwrap();
    }

    pub(crate) fn press(case: &mut dyn TestCase, channel: Channel, at_ms: u64) -> Verdict {
        press_with(case, channel, at_ms, true)
    }

    pub(crate) fn press_with(
        case: &mut dyn TestCase,
        channel: Channel,
        at_ms: u64,
        ready: bool,
    ) -> Verdict {
        let at = SimTime::from_millis(at_ms);
        let mut cx = CaseContext::new(at, ready);
        case.on_input(InputEvent { channel, at }, &mut cx)
    }

    pub(crate) fn conclude(case: &mut dyn TestCase, at_ms: u64) -> TestResult {
        let mut cx = CaseContext::new(SimTime::from_millis(at_ms), true);
        case.conclude(&mut cx).unwrap()
    }
}
