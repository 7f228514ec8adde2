//! Power-on and reset sequences.
//!
//! ```text
//! OFF --power--> BOOT_INIT --init flash--> READY_IDLE
//!                    ^                          |
//!                    +------ RESETTING <---reset+
//! ```
//!
//! Each stage is a Boot-group timer, so clearing the groups on power-off or
//! reset abandons the sequence wherever it is.

use tracing::{debug, info};

use crate::animator::BootStage;
use crate::bench::BenchCore;
use crate::config::BootTiming;
use crate::events::{BenchEvent, BootPhase};
use crate::panel::{Color, StatusLed};
use crate::timers::GroupTag;

#[derive(Debug, Clone)]
pub(crate) struct BootController {
    timing: BootTiming,
}

impl BootController {
    pub(crate) fn new(timing: BootTiming) -> Self {
        Self { timing }
    }

    pub(crate) fn power_on(&mut self, core: &mut BenchCore) {
        info!("power on");
        core.state.power = true;
        core.emit(BenchEvent::Power {
            at: core.now(),
            on: true,
        });
        self.begin(core);
    }

    pub(crate) fn power_off(&mut self, core: &mut BenchCore) {
        info!("power off");
        core.state.power = false;
        core.state.clear_readiness();
        core.state.current_test_index = 0;
        core.state.next_run_id();
        core.animator.clear_all_groups();
        core.animator.all_off();
        core.emit(BenchEvent::Power {
            at: core.now(),
            on: false,
        });
    }

    pub(crate) fn reset(&mut self, core: &mut BenchCore) {
        if !core.state.power() {
            info!("reset ignored without power");
            core.emit(BenchEvent::ResetRejected { at: core.now() });
            return;
        }
        info!("reset");
        core.animator.clear_all_groups();
        core.state.next_run_id();
        core.state.current_test_index = 0;
        core.state.clear_readiness();
        core.animator.all_off();
        core.animator.flash(
            StatusLed::Power.into(),
            Color::Red,
            self.timing.reset_flash_period,
            self.timing.reset_flash,
            GroupTag::Boot,
        );
        core.animator
            .schedule_stage(self.timing.reset_restart, BootStage::Restart);
        core.emit(BenchEvent::Boot {
            at: core.now(),
            phase: BootPhase::Resetting,
        });
    }

    pub(crate) fn on_stage(&mut self, core: &mut BenchCore, stage: BootStage) {
        if !core.state.power() {
            debug!(?stage, "boot stage dropped without power");
            return;
        }
        match stage {
            BootStage::InitFlash => {
                debug!("boot init flash");
                core.animator.flash(
                    StatusLed::Init.into(),
                    Color::Red,
                    self.timing.init_flash_period,
                    self.timing.init_flash,
                    GroupTag::Boot,
                );
                core.animator
                    .schedule_stage(self.timing.init_flash, BootStage::Ready);
                core.emit(BenchEvent::Boot {
                    at: core.now(),
                    phase: BootPhase::InitFlash,
                });
            }
            BootStage::Ready => {
                info!("bench ready");
                core.state.boot_init = false;
                core.state.ready = true;
                core.animator.set_on(StatusLed::Ready.into(), Color::Red);
                core.status_idle();
                core.emit(BenchEvent::Boot {
                    at: core.now(),
                    phase: BootPhase::Ready,
                });
            }
            BootStage::Restart => {
                core.emit(BenchEvent::Boot {
                    at: core.now(),
                    phase: BootPhase::Restart,
                });
                self.begin(core);
            }
        }
    }

    fn begin(&mut self, core: &mut BenchCore) {
        core.state.clear_readiness();
        core.state.boot_init = true;
        core.animator.set_on(StatusLed::Power.into(), Color::Red);
        core.animator
            .schedule_stage(self.timing.init_delay, BootStage::InitFlash);
    }
}
