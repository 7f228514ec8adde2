//! The bench: one owner for state, indicators, inputs, and the active run.

#![allow(missing_docs)]

use std::time::Duration;

use serde::Serialize;
use smol_str::SmolStr;
use tracing::debug;

use crate::animator::{Animator, Due};
use crate::boot::BootController;
use crate::cases::standard_library;
use crate::config::{BenchConfig, StatusTiming};
use crate::engine::{SlotStatus, TestCase, TestRunner};
use crate::events::BenchEvent;
use crate::input::{Channel, InputBus, InputEvent};
use crate::panel::{Color, IndicatorId, Indicators, PanelState, StatusLed, SLOT_COUNT};
use crate::state::SystemState;
use crate::time::SimTime;
use crate::timers::GroupTag;

/// Everything the boot controller and the runner mutate.
#[derive(Debug)]
pub(crate) struct BenchCore {
    pub(crate) state: SystemState,
    pub(crate) animator: Animator,
    pub(crate) inputs: InputBus,
    pub(crate) events: Vec<BenchEvent>,
    pub(crate) status: StatusTiming,
}

impl BenchCore {
    fn new(status: StatusTiming) -> Self {
        Self {
            state: SystemState::new(),
            animator: Animator::new(),
            inputs: InputBus::new(),
            events: Vec::new(),
            status,
        }
    }

    pub(crate) fn now(&self) -> SimTime {
        self.animator.now()
    }

    pub(crate) fn emit(&mut self, event: BenchEvent) {
        self.events.push(event);
    }

    /// Idle pulse off, run pulse on.
    pub(crate) fn status_running(&mut self) {
        self.animator.clear_group(GroupTag::Status);
        self.animator.set_off(StatusLed::Idle.into());
        self.state.enter_running();
        let period = self.status.run_pulse;
        self.animator
            .start_pulse(StatusLed::Run.into(), period, Color::Red, GroupTag::Status);
    }

    /// Run pulse off, idle pulse on.
    pub(crate) fn status_idle(&mut self) {
        self.animator.clear_group(GroupTag::Status);
        self.animator.set_off(StatusLed::Run.into());
        self.state.enter_idle();
        let period = self.status.idle_pulse;
        self.animator
            .start_pulse(StatusLed::Idle.into(), period, Color::Red, GroupTag::Status);
    }
}

/// The running case, as reported in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunInfo {
    pub slot: usize,
    pub run_id: u64,
    pub name: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorReading {
    pub indicator: IndicatorId,
    pub color: Color,
}

/// Point-in-time view of the whole bench.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchSnapshot {
    pub now: SimTime,
    pub state: SystemState,
    pub indicators: Vec<IndicatorReading>,
    pub slots: Vec<SlotStatus>,
    pub active_run: Option<RunInfo>,
}

/// Simulated test bench driven by presses and virtual time.
///
/// Nothing happens between calls: timers fire only inside
/// [`advance_to`](Self::advance_to) and [`advance_by`](Self::advance_by).
#[derive(Debug)]
pub struct Bench {
    core: BenchCore,
    boot: BootController,
    runner: TestRunner,
    config: BenchConfig,
}

impl Default for Bench {
    fn default() -> Self {
        Self::new(BenchConfig::default())
    }
}

impl Bench {
    /// Unpowered bench with the standard case library.
    #[must_use]
    pub fn new(config: BenchConfig) -> Self {
        let library = standard_library(&config.cases);
        Self::with_library(config, library)
    }

    /// Unpowered bench running a custom case library.
    #[must_use]
    pub fn with_library(config: BenchConfig, library: [Box<dyn TestCase>; SLOT_COUNT]) -> Self {
        Self {
            core: BenchCore::new(config.status.clone()),
            boot: BootController::new(config.boot.clone()),
            runner: TestRunner::new(library),
            config,
        }
    }

    /// Mirror indicator changes into an external renderer.
    pub fn attach(&mut self, sink: Box<dyn Indicators>) {
        self.core.animator.attach(sink);
    }

    #[must_use]
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    #[must_use]
    pub fn now(&self) -> SimTime {
        self.core.now()
    }

    #[must_use]
    pub fn state(&self) -> &SystemState {
        &self.core.state
    }

    #[must_use]
    pub fn panel(&self) -> &PanelState {
        self.core.animator.panel()
    }

    #[must_use]
    pub fn color(&self, indicator: IndicatorId) -> Option<Color> {
        self.panel().color(indicator)
    }

    #[must_use]
    pub fn animator(&self) -> &Animator {
        &self.core.animator
    }

    #[must_use]
    pub fn inputs(&self) -> &InputBus {
        &self.core.inputs
    }

    #[must_use]
    pub fn runner(&self) -> &TestRunner {
        &self.runner
    }

    #[must_use]
    pub fn slot_status(&self, slot: usize) -> Option<SlotStatus> {
        self.runner.slot_status(slot)
    }

    #[must_use]
    pub fn active_run(&self) -> Option<RunInfo> {
        let run = self.runner.active()?;
        let name = self.runner.names().nth(run.slot()).unwrap_or_default();
        Some(RunInfo {
            slot: run.slot(),
            run_id: run.run_id(),
            name: SmolStr::new(name),
        })
    }

    /// A discrete button press at the current time.
    pub fn press(&mut self, channel: Channel) {
        let at = self.now();
        debug!(%channel, %at, "press");
        self.core.emit(BenchEvent::Input { at, channel });
        match channel {
            Channel::A | Channel::B | Channel::C => {
                if self.core.state.power() {
                    let status = &self.core.status;
                    let (period, duration) = (status.input_flash_period, status.input_flash);
                    self.core.animator.clear_group(GroupTag::Flash);
                    self.core.animator.flash(
                        StatusLed::Init.into(),
                        Color::Red,
                        period,
                        duration,
                        GroupTag::Flash,
                    );
                }
                self.runner
                    .deliver_input(&mut self.core, InputEvent { channel, at });
            }
            Channel::D => {
                self.start_test();
            }
            Channel::E => self.reset(),
            Channel::Power => {
                if self.core.state.power() {
                    self.power_off();
                } else {
                    self.power_on();
                }
            }
        }
    }

    /// Begin the boot sequence. Ignored while already powered.
    pub fn power_on(&mut self) {
        if self.core.state.power() {
            debug!("power on ignored, already powered");
            return;
        }
        self.boot.power_on(&mut self.core);
    }

    /// Cut power: supersede any run, stop every animation, darken the panel.
    pub fn power_off(&mut self) {
        if !self.core.state.power() {
            debug!("power off ignored, already off");
            return;
        }
        self.runner.supersede(&mut self.core);
        self.runner.clear_slots();
        self.boot.power_off(&mut self.core);
    }

    /// Run the reset sequence. Rejected without power.
    pub fn reset(&mut self) {
        if self.core.state.power() {
            self.runner.supersede(&mut self.core);
            self.runner.clear_slots();
        }
        self.boot.reset(&mut self.core);
    }

    /// Start the next case. Returns `false` if the bench was not ready.
    pub fn start_test(&mut self) -> bool {
        self.runner.start_next(&mut self.core)
    }

    /// Fire every timer due up to `until`, in deadline order.
    pub fn advance_to(&mut self, until: SimTime) {
        while let Some(due) = self.core.animator.next_due(until, &self.core.state) {
            match due {
                Due::Boot(stage) => self.boot.on_stage(&mut self.core, stage),
                Due::Observation { run_id } => self.runner.on_observation(&mut self.core, run_id),
                Due::CaseTick { run_id } => self.runner.on_tick(&mut self.core, run_id),
            }
        }
        self.core.animator.settle(until);
    }

    pub fn advance_by(&mut self, delta: Duration) {
        let until = self.now().after(delta);
        self.advance_to(until);
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<SimTime> {
        self.core.animator.next_deadline()
    }

    /// Events recorded since the last drain.
    #[must_use]
    pub fn events(&self) -> &[BenchEvent] {
        &self.core.events
    }

    pub fn drain_events(&mut self) -> Vec<BenchEvent> {
        std::mem::take(&mut self.core.events)
    }

    #[must_use]
    pub fn snapshot(&self) -> BenchSnapshot {
        BenchSnapshot {
            now: self.now(),
            state: self.core.state.clone(),
            indicators: self
                .panel()
                .snapshot()
                .into_iter()
                .map(|(indicator, color)| IndicatorReading { indicator, color })
                .collect(),
            slots: self.runner.slots().to_vec(),
            active_run: self.active_run(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booted() -> Bench {
        let mut bench = Bench::default();
        bench.power_on();
        bench.advance_to(SimTime::from_millis(3_000));
        bench
    }

    #[test]
    fn run_and_idle_pulses_never_coexist() {
        let mut bench = booted();
        assert_eq!(bench.animator().group_len(GroupTag::Status), 1);
        assert!(bench.start_test());
        assert_eq!(bench.animator().group_len(GroupTag::Status), 1);
        assert!(!bench.panel().is_lit(StatusLed::Idle.into()));
        bench.advance_by(Duration::from_millis(5_000));
        assert_eq!(bench.animator().group_len(GroupTag::Status), 1);
        assert!(!bench.panel().is_lit(StatusLed::Run.into()));
    }

    #[test]
    fn press_flashes_init_only_when_powered() {
        let mut bench = Bench::default();
        bench.press(Channel::A);
        assert_eq!(bench.animator().group_len(GroupTag::Flash), 0);

        let mut bench = booted();
        bench.press(Channel::B);
        assert_eq!(bench.animator().group_len(GroupTag::Flash), 1);
        bench.advance_by(Duration::from_millis(100));
        assert!(bench.panel().is_lit(StatusLed::Init.into()));
        bench.advance_by(Duration::from_millis(100));
        assert!(!bench.panel().is_lit(StatusLed::Init.into()));
        assert_eq!(bench.animator().group_len(GroupTag::Flash), 0);
    }

    #[test]
    fn snapshot_reports_active_run() {
        let mut bench = booted();
        bench.start_test();
        let snapshot = bench.snapshot();
        let run = snapshot.active_run.unwrap();
        assert_eq!(run.slot, 0);
        assert_eq!(snapshot.slots[0], SlotStatus::InProgress);
        assert_eq!(snapshot.indicators.len(), 15);
    }
}
