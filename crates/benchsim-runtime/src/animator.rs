//! Indicator animations: pulses, flashes, and the alternating progress cue.
//!
//! The animator is the only writer of indicator colors and the only owner of
//! timers. Boot stages and test observation deadlines share its queue; when
//! one of those comes due it is handed back to the bench as a [`Due`].

use std::time::Duration;

use tracing::debug;

use crate::panel::{Color, IndicatorId, Indicators, PanelState};
use crate::state::SystemState;
use crate::time::SimTime;
use crate::timers::{Fired, GroupTag, TimerId, TimerQueue};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Steps of the boot and reset sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BootStage {
    /// Start flashing the init indicator.
    InitFlash,
    /// Init finished; light ready and go idle.
    Ready,
    /// Reset flash finished; start powering on again.
    Restart,
}

#[derive(Debug, Clone)]
pub(crate) enum TimerTask {
    Pulse {
        indicator: IndicatorId,
        color: Color,
        period: Duration,
        lit: bool,
    },
    Flash {
        indicator: IndicatorId,
        color: Color,
        period: Duration,
        duration: Duration,
        elapsed: Duration,
        lit: bool,
    },
    Alternate {
        pass: IndicatorId,
        fail: IndicatorId,
        period: Duration,
        pass_phase: bool,
    },
    Boot(BootStage),
    Observation {
        run_id: u64,
    },
    CaseTick {
        run_id: u64,
    },
}

/// Non-animation timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Due {
    Boot(BootStage),
    Observation { run_id: u64 },
    CaseTick { run_id: u64 },
}

/// Owns the panel state, the optional renderer, and every timer.
pub struct Animator {
    panel: PanelState,
    sink: Option<Box<dyn Indicators>>,
    timers: TimerQueue<TimerTask>,
    now: SimTime,
}

impl std::fmt::Debug for Animator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animator")
            .field("now", &self.now)
            .field("timers", &self.timers.len())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}

impl Animator {
    /// Animator with every indicator off and no renderer attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            panel: PanelState::new(),
            sink: None,
            timers: TimerQueue::new(),
            now: SimTime::ZERO,
        }
    }

    /// Mirror every color change into `sink`.
    pub fn attach(&mut self, sink: Box<dyn Indicators>) {
        self.sink = Some(sink);
    }

    /// Current indicator colors and history.
    #[must_use]
    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    /// Virtual time of the last fired timer or settle.
    #[must_use]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Active timers registered under `tag`.
    #[must_use]
    pub fn group_len(&self, tag: GroupTag) -> usize {
        self.timers.group_len(tag)
    }

    /// Timers of any kind still pending.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Light an indicator. Unknown indicators are ignored.
    pub fn set_on(&mut self, indicator: IndicatorId, color: Color) {
        if !indicator.is_valid() {
            debug!(%indicator, "ignoring write to unknown indicator");
            return;
        }
        if self.panel.apply(self.now, indicator, color) {
            if let Some(sink) = self.sink.as_mut() {
                sink.set_color(indicator, color);
            }
        }
    }

    /// Turn an indicator off.
    pub fn set_off(&mut self, indicator: IndicatorId) {
        if !indicator.is_valid() {
            debug!(%indicator, "ignoring write to unknown indicator");
            return;
        }
        if self.panel.apply(self.now, indicator, Color::White) {
            if let Some(sink) = self.sink.as_mut() {
                sink.set_off(indicator);
            }
        }
    }

    /// Force every indicator off.
    pub fn all_off(&mut self) {
        for id in IndicatorId::all() {
            self.set_off(id);
        }
    }

    /// Force every pass/fail indicator off.
    pub fn test_indicators_off(&mut self) {
        for id in IndicatorId::all().filter(|id| !matches!(id, IndicatorId::Status(_))) {
            self.set_off(id);
        }
    }

    /// Toggle `indicator` every `period`, starting lit, until power drops or
    /// `group` is cleared.
    pub fn start_pulse(
        &mut self,
        indicator: IndicatorId,
        period: Duration,
        color: Color,
        group: GroupTag,
    ) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.set_on(indicator, color);
        self.timers.schedule(
            self.now.after(period),
            Some(group),
            TimerTask::Pulse {
                indicator,
                color,
                period,
                lit: true,
            },
        )
    }

    /// Toggle `indicator` every `period` for `duration`, then leave it off.
    pub fn flash(
        &mut self,
        indicator: IndicatorId,
        color: Color,
        period: Duration,
        duration: Duration,
        group: GroupTag,
    ) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.timers.schedule(
            self.now.after(period),
            Some(group),
            TimerTask::Flash {
                indicator,
                color,
                period,
                duration,
                elapsed: Duration::ZERO,
                lit: self.panel.is_lit(indicator),
            },
        )
    }

    /// Alternate a pass/fail pair (fail red first, then pass lime) while the
    /// bench is running.
    pub fn start_alternating(
        &mut self,
        pass: IndicatorId,
        fail: IndicatorId,
        period: Duration,
    ) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.set_off(pass);
        self.set_on(fail, Color::Red);
        self.timers.schedule(
            self.now.after(period),
            Some(GroupTag::Progress),
            TimerTask::Alternate {
                pass,
                fail,
                period,
                pass_phase: true,
            },
        )
    }

    /// Cancel every timer under `tag`. Safe on an empty group.
    pub fn clear_group(&mut self, tag: GroupTag) -> usize {
        let cancelled = self.timers.clear_group(tag);
        if cancelled > 0 {
            debug!(group = %tag, cancelled, "cleared indicator group");
        }
        cancelled
    }

    /// Cancel every grouped timer.
    pub fn clear_all_groups(&mut self) -> usize {
        self.timers.clear_all_groups()
    }

    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    pub(crate) fn schedule_stage(&mut self, delay: Duration, stage: BootStage) -> TimerId {
        self.timers.schedule(
            self.now.after(delay),
            Some(GroupTag::Boot),
            TimerTask::Boot(stage),
        )
    }

    pub(crate) fn schedule_observation(&mut self, window: Duration, run_id: u64) -> TimerId {
        self.timers.schedule(
            self.now.after(window),
            None,
            TimerTask::Observation { run_id },
        )
    }

    pub(crate) fn schedule_case_tick(&mut self, interval: Duration, run_id: u64) -> TimerId {
        self.timers.schedule(
            self.now.after(interval.max(MIN_PERIOD)),
            None,
            TimerTask::CaseTick { run_id },
        )
    }

    /// Earliest pending deadline of any timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<SimTime> {
        self.timers.next_deadline()
    }

    /// Fire animation timers up to `until` and return the first
    /// non-animation timer that comes due, with the clock set to its deadline.
    pub(crate) fn next_due(&mut self, until: SimTime, state: &SystemState) -> Option<Due> {
        while let Some(fired) = self.timers.pop_due(until) {
            self.now = self.now.max(fired.at);
            match fired.task {
                TimerTask::Boot(stage) => return Some(Due::Boot(stage)),
                TimerTask::Observation { run_id } => return Some(Due::Observation { run_id }),
                TimerTask::CaseTick { run_id } => return Some(Due::CaseTick { run_id }),
                _ => self.animate(fired, state),
            }
        }
        None
    }

    /// Move the clock forward with nothing due in between.
    pub(crate) fn settle(&mut self, until: SimTime) {
        self.now = self.now.max(until);
    }

    fn animate(&mut self, fired: Fired<TimerTask>, state: &SystemState) {
        let Fired { id, group, task, .. } = fired;
        match task {
            TimerTask::Pulse {
                indicator,
                color,
                period,
                lit,
            } => {
                if !state.power() {
                    self.set_off(indicator);
                    return;
                }
                let lit = !lit;
                self.show(indicator, color, lit);
                let next = TimerTask::Pulse {
                    indicator,
                    color,
                    period,
                    lit,
                };
                self.timers.rearm(id, self.now.after(period), group, next);
            }
            TimerTask::Flash {
                indicator,
                color,
                period,
                duration,
                elapsed,
                lit,
            } => {
                if !state.power() {
                    self.set_off(indicator);
                    return;
                }
                let lit = !lit;
                self.show(indicator, color, lit);
                let elapsed = elapsed + period;
                if elapsed >= duration {
                    self.set_off(indicator);
                    return;
                }
                let next = TimerTask::Flash {
                    indicator,
                    color,
                    period,
                    duration,
                    elapsed,
                    lit,
                };
                self.timers.rearm(id, self.now.after(period), group, next);
            }
            TimerTask::Alternate {
                pass,
                fail,
                period,
                pass_phase,
            } => {
                if !state.running() {
                    self.set_off(pass);
                    self.set_off(fail);
                    return;
                }
                if pass_phase {
                    self.set_off(fail);
                    self.set_on(pass, Color::Lime);
                } else {
                    self.set_off(pass);
                    self.set_on(fail, Color::Red);
                }
                let next = TimerTask::Alternate {
                    pass,
                    fail,
                    period,
                    pass_phase: !pass_phase,
                };
                self.timers.rearm(id, self.now.after(period), group, next);
            }
            TimerTask::Boot(_) | TimerTask::Observation { .. } | TimerTask::CaseTick { .. } => {}
        }
    }

    fn show(&mut self, indicator: IndicatorId, color: Color, lit: bool) {
        if lit {
            self.set_on(indicator, color);
        } else {
            self.set_off(indicator);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::StatusLed;

    fn powered() -> SystemState {
        SystemState {
            power: true,
            running: true,
            ..SystemState::default()
        }
    }

    fn run_until(animator: &mut Animator, ms: u64, state: &SystemState) {
        let until = SimTime::from_millis(ms);
        while animator.next_due(until, state).is_some() {}
        animator.settle(until);
    }

    #[test]
    fn pulse_starts_lit_and_toggles_each_period() {
        let mut animator = Animator::new();
        let state = powered();
        let run = IndicatorId::Status(StatusLed::Run);
        animator.start_pulse(run, Duration::from_millis(500), Color::Red, GroupTag::Status);
        assert!(animator.panel().is_lit(run));

        run_until(&mut animator, 500, &state);
        assert!(!animator.panel().is_lit(run));
        run_until(&mut animator, 1_000, &state);
        assert!(animator.panel().is_lit(run));
        assert_eq!(animator.group_len(GroupTag::Status), 1);
    }

    #[test]
    fn pulse_self_cancels_without_power() {
        let mut animator = Animator::new();
        let mut state = powered();
        let idle = IndicatorId::Status(StatusLed::Idle);
        animator.start_pulse(idle, Duration::from_millis(100), Color::Red, GroupTag::Status);
        state.power = false;

        run_until(&mut animator, 100, &state);
        assert!(!animator.panel().is_lit(idle));
        assert_eq!(animator.group_len(GroupTag::Status), 0);
        assert_eq!(animator.pending_timers(), 0);
    }

    #[test]
    fn flash_terminates_after_duration() {
        let mut animator = Animator::new();
        let state = powered();
        let init = IndicatorId::Status(StatusLed::Init);
        animator.flash(
            init,
            Color::Red,
            Duration::from_millis(200),
            Duration::from_millis(2_000),
            GroupTag::Boot,
        );

        run_until(&mut animator, 200, &state);
        assert!(animator.panel().is_lit(init));
        run_until(&mut animator, 5_000, &state);
        assert!(!animator.panel().is_lit(init));
        assert_eq!(animator.group_len(GroupTag::Boot), 0);
        assert_eq!(animator.panel().lit_count_since(init, SimTime::ZERO), 5);
    }

    #[test]
    fn alternating_stops_when_not_running() {
        let mut animator = Animator::new();
        let mut state = powered();
        let (pass, fail) = (IndicatorId::Pass(0), IndicatorId::Fail(0));
        animator.start_alternating(pass, fail, Duration::from_millis(300));
        assert_eq!(animator.panel().color(fail), Some(Color::Red));

        run_until(&mut animator, 300, &state);
        assert_eq!(animator.panel().color(pass), Some(Color::Lime));
        assert_eq!(animator.panel().color(fail), Some(Color::White));

        state.running = false;
        run_until(&mut animator, 600, &state);
        assert!(!animator.panel().is_lit(pass));
        assert!(!animator.panel().is_lit(fail));
        assert_eq!(animator.group_len(GroupTag::Progress), 0);
    }

    #[test]
    fn clearing_a_group_stops_its_animation() {
        let mut animator = Animator::new();
        let state = powered();
        let fail = IndicatorId::Fail(4);
        animator.start_pulse(fail, Duration::from_millis(500), Color::Red, GroupTag::Test);
        assert_eq!(animator.clear_group(GroupTag::Test), 1);
        assert_eq!(animator.clear_group(GroupTag::Test), 0);
        animator.set_off(fail);

        run_until(&mut animator, 2_000, &state);
        assert!(!animator.panel().is_lit(fail));
    }

    #[test]
    fn unknown_indicator_is_a_no_op() {
        let mut animator = Animator::new();
        animator.set_on(IndicatorId::Pass(7), Color::Lime);
        animator.set_off(IndicatorId::Fail(7));
        assert_eq!(animator.panel().transitions().count(), 0);
    }
}
