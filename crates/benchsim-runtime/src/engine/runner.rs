//! Single-run test executor.

#![allow(missing_docs)]

use std::fmt;

use smol_str::SmolStr;
use tracing::{debug, error, info, warn};

use crate::bench::BenchCore;
use crate::error::BenchError;
use crate::events::BenchEvent;
use crate::input::InputEvent;
use crate::panel::{Color, IndicatorId, SLOT_COUNT};
use crate::timers::{GroupTag, TimerId};

use super::cue::VisualCue;
use super::fixture::{CaseContext, CueRequest, Fixture, Hook, HookContext};
use super::result::TestResult;
use super::{SlotStatus, TestCase};

/// The run currently being observed.
pub struct ActiveRun {
    run_id: u64,
    slot: usize,
    teardowns: Vec<Hook>,
    observation: Option<TimerId>,
    tick: Option<TimerId>,
}

impl fmt::Debug for ActiveRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveRun")
            .field("run_id", &self.run_id)
            .field("slot", &self.slot)
            .field("teardowns", &self.teardowns.len())
            .finish()
    }
}

impl ActiveRun {
    #[must_use]
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Runs the fixed case library one case at a time.
pub struct TestRunner {
    library: [Box<dyn TestCase>; SLOT_COUNT],
    slots: [SlotStatus; SLOT_COUNT],
    active: Option<ActiveRun>,
}

impl fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRunner")
            .field("cases", &self.names().collect::<Vec<_>>())
            .field("slots", &self.slots)
            .field("active", &self.active)
            .finish()
    }
}

impl TestRunner {
    pub fn new(library: [Box<dyn TestCase>; SLOT_COUNT]) -> Self {
        Self {
            library,
            slots: [SlotStatus::NoResult; SLOT_COUNT],
            active: None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.library.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.library.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.library.iter().map(|case| case.name())
    }

    #[must_use]
    pub fn slot_status(&self, slot: usize) -> Option<SlotStatus> {
        self.slots.get(slot).copied()
    }

    #[must_use]
    pub fn slots(&self) -> &[SlotStatus] {
        &self.slots
    }

    #[must_use]
    pub fn active(&self) -> Option<&ActiveRun> {
        self.active.as_ref()
    }

    pub(crate) fn clear_slots(&mut self) {
        self.slots = [SlotStatus::NoResult; SLOT_COUNT];
    }

    /// Start the case at the cursor. Returns `false` when the bench is not
    /// ready; nothing changes in that case.
    pub(crate) fn start_next(&mut self, core: &mut BenchCore) -> bool {
        if !core.state.is_ready() {
            let reason = not_ready_reason(core);
            info!("start rejected: {reason}");
            core.emit(BenchEvent::StartRejected {
                at: core.now(),
                reason: reason.into(),
            });
            return false;
        }

        if core.state.current_test_index >= self.library.len() {
            debug!("suite complete, wrapping to the first case");
            core.state.current_test_index = 0;
            core.animator.test_indicators_off();
            self.clear_slots();
            core.emit(BenchEvent::SuiteWrapped { at: core.now() });
        }

        let slot = core.state.current_test_index;
        core.state.current_test_index += 1;
        let run_id = core.state.next_run_id();
        core.status_running();
        core.animator.clear_group(GroupTag::Test);
        core.animator.clear_group(GroupTag::Progress);
        let progress = core.status.progress_period;
        core.animator
            .start_alternating(IndicatorId::Pass(slot), IndicatorId::Fail(slot), progress);
        self.slots[slot] = SlotStatus::InProgress;

        let name = SmolStr::new(self.library[slot].name());
        info!(slot, run_id, "starting {name}");
        core.emit(BenchEvent::TestStarted {
            at: core.now(),
            slot,
            run_id,
            name,
        });

        let case = &mut self.library[slot];
        let mut fixture = Fixture::new();
        let started = case.start(&mut fixture);
        let window = case.window();
        let tick_interval = case.tick_interval();
        let (setups, teardowns) = fixture.into_hooks();
        self.active = Some(ActiveRun {
            run_id,
            slot,
            teardowns,
            observation: None,
            tick: None,
        });

        if let Err(err) = started {
            self.finish(core, Err(err));
            return true;
        }

        let mut cx = HookContext::new(run_id, &mut core.inputs);
        let setup_failure = setups
            .into_iter()
            .enumerate()
            .find_map(|(index, hook)| {
                hook(&mut cx).err().map(|err| BenchError::SetupFailed {
                    index,
                    reason: err.to_string().into(),
                })
            });
        if let Some(err) = setup_failure {
            self.finish(core, Err(err));
            return true;
        }

        let observation = core.animator.schedule_observation(window, run_id);
        let tick = tick_interval.map(|interval| core.animator.schedule_case_tick(interval, run_id));
        if let Some(run) = self.active.as_mut() {
            run.observation = Some(observation);
            run.tick = tick;
        }
        true
    }

    /// Route a press to the running case if it subscribed to that channel.
    pub(crate) fn deliver_input(&mut self, core: &mut BenchCore, event: InputEvent) {
        let Some(run) = self.active.as_ref() else {
            return;
        };
        if !core.inputs.is_subscribed(run.run_id, event.channel) {
            return;
        }
        let slot = run.slot;
        let mut cx = CaseContext::new(core.now(), core.state.ready());
        let verdict = self.library[slot].on_input(event, &mut cx);
        Self::apply_cues(core, slot, cx.into_cues());
        if let Some(outcome) = verdict.transpose() {
            self.finish(core, outcome);
        }
    }

    pub(crate) fn on_tick(&mut self, core: &mut BenchCore, run_id: u64) {
        let Some(run) = self.active.as_ref().filter(|run| run.run_id == run_id) else {
            debug!(run_id, "dropping tick for a finished run");
            return;
        };
        let slot = run.slot;
        let mut cx = CaseContext::new(core.now(), core.state.ready());
        let case = &mut self.library[slot];
        let verdict = case.on_tick(&mut cx);
        let interval = case.tick_interval();
        Self::apply_cues(core, slot, cx.into_cues());
        match verdict.transpose() {
            Some(outcome) => self.finish(core, outcome),
            None => {
                let tick = interval.map(|interval| core.animator.schedule_case_tick(interval, run_id));
                if let Some(run) = self.active.as_mut() {
                    run.tick = tick;
                }
            }
        }
    }

    /// Observation window closed for `run_id`.
    pub(crate) fn on_observation(&mut self, core: &mut BenchCore, run_id: u64) {
        let Some(run) = self.active.as_ref().filter(|run| run.run_id == run_id) else {
            debug!(
                run_id,
                current = core.state.run_id(),
                "discarding stale completion"
            );
            core.emit(BenchEvent::StaleCompletion {
                at: core.now(),
                run_id,
            });
            return;
        };
        let slot = run.slot;
        let mut cx = CaseContext::new(core.now(), core.state.ready());
        let outcome = self.library[slot].conclude(&mut cx);
        Self::apply_cues(core, slot, cx.into_cues());
        self.finish(core, outcome);
    }

    /// End the active run without a result; a reset or power-off took over.
    pub(crate) fn supersede(&mut self, core: &mut BenchCore) {
        let Some(run) = self.active.take() else {
            return;
        };
        info!(slot = run.slot, run_id = run.run_id, "run superseded");
        if let Some(tick) = run.tick {
            core.animator.cancel(tick);
        }
        core.emit(BenchEvent::RunSuperseded {
            at: core.now(),
            slot: run.slot,
            run_id: run.run_id,
        });
        Self::tear_down(core, run);
    }

    fn finish(&mut self, core: &mut BenchCore, outcome: Result<TestResult, BenchError>) {
        let Some(mut run) = self.active.take() else {
            return;
        };
        let result = outcome.unwrap_or_else(|err| {
            error!(slot = run.slot, run_id = run.run_id, "test case fault: {err}");
            TestResult::errored(&err)
        });
        for timer in [run.observation.take(), run.tick.take()].into_iter().flatten() {
            core.animator.cancel(timer);
        }

        let slot = run.slot;
        let run_id = run.run_id;
        if run_id == core.state.run_id() {
            core.status_idle();
            core.animator.clear_group(GroupTag::Test);
            core.animator.clear_group(GroupTag::Progress);
            let pass = IndicatorId::Pass(slot);
            let fail = IndicatorId::Fail(slot);
            core.animator.set_off(pass);
            core.animator.set_off(fail);
            if result.passed() {
                core.animator.set_on(pass, Color::Lime);
                self.slots[slot] = SlotStatus::Pass;
            } else {
                core.animator.set_on(fail, Color::Red);
                self.slots[slot] = SlotStatus::Fail;
            }
            info!(slot, run_id, "{result}");
        } else {
            debug!(slot, run_id, "run finished after being replaced");
        }

        Self::tear_down(core, run);
        core.emit(BenchEvent::TestFinished {
            at: core.now(),
            slot,
            run_id,
            result,
        });
    }

    fn tear_down(core: &mut BenchCore, run: ActiveRun) {
        let ActiveRun {
            run_id,
            slot,
            teardowns,
            ..
        } = run;
        let mut failures = Vec::new();
        {
            let mut cx = HookContext::new(run_id, &mut core.inputs);
            for (index, hook) in teardowns.into_iter().enumerate() {
                if let Err(err) = hook(&mut cx) {
                    failures.push(BenchError::TeardownFailed {
                        index,
                        reason: err.to_string().into(),
                    });
                }
            }
        }
        let leftover = core.inputs.unsubscribe_owner(run_id);
        if leftover > 0 {
            debug!(run_id, leftover, "released subscriptions left by teardown");
        }
        for err in failures {
            error!(slot, run_id, "{err}");
            core.emit(BenchEvent::HookFailed {
                at: core.now(),
                slot,
                run_id,
                error: err.to_string().into(),
            });
        }
    }

    fn apply_cues(core: &mut BenchCore, slot: usize, cues: Vec<CueRequest>) {
        for request in cues {
            match request {
                CueRequest::Known(cue) => apply_cue(core, slot, cue),
                CueRequest::Unknown(name) => {
                    warn!(slot, "unknown visual cue '{name}'");
                    core.emit(BenchEvent::UnknownCue {
                        at: core.now(),
                        slot,
                        cue: name,
                    });
                }
            }
        }
    }
}

fn apply_cue(core: &mut BenchCore, slot: usize, cue: VisualCue) {
    let pass = IndicatorId::Pass(slot);
    let fail = IndicatorId::Fail(slot);
    let animator = &mut core.animator;
    match cue {
        VisualCue::FailBlink => {
            animator.clear_group(GroupTag::Progress);
            animator.clear_group(GroupTag::Test);
            animator.set_off(pass);
            animator.start_pulse(fail, core.status.fail_blink, Color::Red, GroupTag::Test);
        }
        VisualCue::StopBlink => {
            animator.clear_group(GroupTag::Test);
            animator.set_off(fail);
        }
        VisualCue::Pass => {
            animator.clear_group(GroupTag::Progress);
            animator.clear_group(GroupTag::Test);
            animator.set_off(fail);
            animator.set_on(pass, Color::Lime);
        }
        VisualCue::Fail => {
            animator.clear_group(GroupTag::Progress);
            animator.clear_group(GroupTag::Test);
            animator.set_off(pass);
            animator.set_on(fail, Color::Red);
        }
        VisualCue::Off => {
            animator.clear_group(GroupTag::Progress);
            animator.clear_group(GroupTag::Test);
            animator.set_off(pass);
            animator.set_off(fail);
        }
        VisualCue::TestInProgress => {
            animator.clear_group(GroupTag::Test);
            animator.clear_group(GroupTag::Progress);
            animator.start_alternating(pass, fail, core.status.resume_progress_period);
        }
    }
}

fn not_ready_reason(core: &BenchCore) -> &'static str {
    let state = &core.state;
    if !state.power() {
        "bench is powered off"
    } else if state.running() {
        "a test is already running"
    } else if state.boot_init() || !state.ready() {
        "bench is still booting"
    } else {
        "bench is not idle"
    }
}
