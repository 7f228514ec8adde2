#![allow(dead_code)]

use std::time::Duration;

use benchsim_runtime::engine::TestResult;
use benchsim_runtime::events::BenchEvent;
use benchsim_runtime::input::Channel;
use benchsim_runtime::panel::{Color, IndicatorId};
use benchsim_runtime::time::SimTime;
use benchsim_runtime::{Bench, BenchConfig};

/// Power-on to ready with default timing.
pub const READY_AT: u64 = 2_500;
/// Default observation window.
pub const WINDOW: u64 = 5_000;

/// Powered, idle, and ready at t = 3000 ms with the journal drained.
pub fn booted() -> Bench {
    booted_with(BenchConfig::default())
}

pub fn booted_with(config: BenchConfig) -> Bench {
    let mut bench = Bench::new(config);
    bench.power_on();
    at(&mut bench, 3_000);
    assert!(bench.state().is_ready(), "bench did not boot");
    bench.drain_events();
    bench
}

pub fn at(bench: &mut Bench, ms: u64) {
    bench.advance_to(SimTime::from_millis(ms));
}

pub fn wait(bench: &mut Bench, ms: u64) {
    bench.advance_by(Duration::from_millis(ms));
}

/// Press each channel `gap` ms apart, starting after one gap.
pub fn press_all(bench: &mut Bench, channels: &[Channel], gap: u64) {
    for channel in channels {
        wait(bench, gap);
        bench.press(*channel);
    }
}

/// Run the next case without any input until it concludes.
pub fn run_idle_case(bench: &mut Bench) {
    assert!(bench.start_test());
    while bench.active_run().is_some() {
        wait(bench, 100);
    }
}

/// Advance the cursor to `slot` by running the cases before it idle.
pub fn skip_to_slot(bench: &mut Bench, slot: usize) {
    while bench.state().current_test_index() < slot {
        run_idle_case(bench);
        wait(bench, 100);
    }
}

pub fn pass_color(bench: &Bench, slot: usize) -> Color {
    bench.color(IndicatorId::Pass(slot)).unwrap()
}

pub fn fail_color(bench: &Bench, slot: usize) -> Color {
    bench.color(IndicatorId::Fail(slot)).unwrap()
}

/// Results journaled since the last drain, in order.
pub fn finished(bench: &mut Bench) -> Vec<(usize, TestResult)> {
    bench
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            BenchEvent::TestFinished { slot, result, .. } => Some((slot, result)),
            _ => None,
        })
        .collect()
}
