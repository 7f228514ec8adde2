mod common;

use benchsim_runtime::engine::SlotStatus;
use benchsim_runtime::events::{BenchEvent, BootPhase};
use benchsim_runtime::input::Channel;
use benchsim_runtime::panel::{Color, IndicatorId, StatusLed};
use benchsim_runtime::time::SimTime;
use benchsim_runtime::timers::GroupTag;
use benchsim_runtime::Bench;

use common::{at, booted, fail_color, pass_color, press_all, run_idle_case, wait, WINDOW};

#[test]
fn boot_sequence_stages() {
    let mut bench = Bench::default();
    bench.press(Channel::Power);
    assert_eq!(bench.color(StatusLed::Power.into()), Some(Color::Red));
    assert!(bench.state().boot_init());
    assert!(!bench.state().is_ready());

    at(&mut bench, 2_499);
    let init = IndicatorId::Status(StatusLed::Init);
    assert_eq!(bench.panel().lit_count_since(init, SimTime::ZERO), 5);
    assert!(!bench.state().ready());

    at(&mut bench, 2_500);
    assert!(bench.state().is_ready());
    assert!(!bench.state().boot_init());
    assert_eq!(bench.color(StatusLed::Ready.into()), Some(Color::Red));
    assert_eq!(bench.color(StatusLed::Idle.into()), Some(Color::Red));
    assert!(!bench.panel().is_lit(init));

    let phases: Vec<BootPhase> = bench
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            BenchEvent::Boot { phase, .. } => Some(phase),
            _ => None,
        })
        .collect();
    assert_eq!(phases, vec![BootPhase::InitFlash, BootPhase::Ready]);
}

#[test]
fn start_is_gated_on_readiness() {
    let mut bench = Bench::default();
    assert!(!bench.start_test());
    bench.power_on();
    at(&mut bench, 1_000);
    let before = bench.state().clone();
    assert!(!bench.start_test());
    assert_eq!(bench.state(), &before);
    assert!(bench.active_run().is_none());
    let rejected = bench
        .events()
        .iter()
        .filter(|event| matches!(event, BenchEvent::StartRejected { .. }))
        .count();
    assert_eq!(rejected, 2);
}

#[test]
fn only_one_test_in_flight() {
    let mut bench = booted();
    assert!(bench.start_test());
    let run_id = bench.state().run_id();
    wait(&mut bench, 100);
    assert!(!bench.start_test());
    bench.press(Channel::D);
    assert_eq!(bench.state().run_id(), run_id);
    assert_eq!(bench.state().current_test_index(), 1);
    assert_eq!(bench.active_run().unwrap().slot, 0);
}

#[test]
fn run_and_idle_pulses_are_exclusive() {
    let mut bench = booted();
    let run = IndicatorId::Status(StatusLed::Run);
    let idle = IndicatorId::Status(StatusLed::Idle);
    bench.start_test();
    for _ in 0..700 {
        wait(&mut bench, 10);
        assert!(
            !(bench.panel().is_lit(run) && bench.panel().is_lit(idle)),
            "both pulses lit at {}",
            bench.now()
        );
        assert!(bench.animator().group_len(GroupTag::Status) <= 1);
        assert_ne!(bench.state().running(), bench.state().idle());
    }
}

#[test]
fn suite_wraps_after_last_case() {
    let mut bench = booted();
    for _ in 0..5 {
        run_idle_case(&mut bench);
        wait(&mut bench, 100);
    }
    assert_eq!(bench.state().current_test_index(), 5);
    assert!((0..5).all(|slot| fail_color(&bench, slot) == Color::Red));
    bench.drain_events();

    assert!(bench.start_test());
    assert_eq!(bench.active_run().unwrap().slot, 0);
    assert_eq!(bench.state().current_test_index(), 1);
    assert!((1..5).all(|slot| fail_color(&bench, slot) == Color::White));
    assert!((1..5).all(|slot| bench.slot_status(slot) == Some(SlotStatus::NoResult)));
    assert!(bench
        .events()
        .iter()
        .any(|event| matches!(event, BenchEvent::SuiteWrapped { .. })));
}

#[test]
fn reset_mid_window_discards_stale_result() {
    let mut bench = booted();
    bench.start_test();
    let stale = bench.state().run_id();
    press_all(&mut bench, &Channel::TEST_INPUTS, 100);
    wait(&mut bench, 700);
    bench.press(Channel::E);
    assert!(bench.active_run().is_none());
    assert_ne!(bench.state().run_id(), stale);
    assert_eq!(bench.state().current_test_index(), 0);

    at(&mut bench, 3_000 + WINDOW + 1_000);
    assert_eq!(pass_color(&bench, 0), Color::White);
    assert_eq!(fail_color(&bench, 0), Color::White);
    assert!(bench.state().is_ready());

    let events = bench.drain_events();
    assert!(events.contains(&BenchEvent::RunSuperseded {
        at: SimTime::from_millis(4_000),
        slot: 0,
        run_id: stale,
    }));
    assert!(events.contains(&BenchEvent::StaleCompletion {
        at: SimTime::from_millis(8_000),
        run_id: stale,
    }));
    assert!(!events
        .iter()
        .any(|event| matches!(event, BenchEvent::TestFinished { .. })));
}

#[test]
fn reset_restarts_boot() {
    let mut bench = booted();
    bench.press(Channel::E);
    assert!(!bench.state().ready());
    assert!(bench.panel().snapshot().iter().all(|(_, color)| !color.is_lit()));
    wait(&mut bench, 1_000);
    let power = IndicatorId::Status(StatusLed::Power);
    assert_eq!(bench.panel().lit_count_since(power, SimTime::from_millis(3_000)), 5);
    wait(&mut bench, 100);
    assert_eq!(bench.color(power), Some(Color::Red));
    assert!(bench.state().boot_init());
    wait(&mut bench, 2_500);
    assert!(bench.state().is_ready());
}

#[test]
fn reset_without_power_is_a_no_op() {
    let mut bench = Bench::default();
    bench.press(Channel::E);
    assert_eq!(bench.animator().pending_timers(), 0);
    assert_eq!(bench.state(), &Default::default());
    assert!(matches!(
        bench.events().last(),
        Some(BenchEvent::ResetRejected { .. })
    ));
}

#[test]
fn power_off_darkens_and_freezes() {
    let mut bench = booted();
    bench.start_test();
    bench.press(Channel::A);
    wait(&mut bench, 50);
    bench.press(Channel::Power);

    assert!(!bench.state().power());
    assert!(!bench.state().running());
    assert!(bench.active_run().is_none());
    assert!(bench.panel().snapshot().iter().all(|(_, color)| !color.is_lit()));
    for tag in GroupTag::ALL {
        assert_eq!(bench.animator().group_len(tag), 0, "{tag}");
    }

    let transitions = bench.panel().transitions().count();
    let state = bench.state().clone();
    wait(&mut bench, 20_000);
    assert_eq!(bench.panel().transitions().count(), transitions);
    assert_eq!(bench.state(), &state);
    assert_eq!(bench.slot_status(0), Some(SlotStatus::NoResult));

    bench.press(Channel::Power);
    wait(&mut bench, 2_500);
    assert!(bench.state().is_ready());
    assert!(bench.start_test());
    assert_eq!(bench.active_run().unwrap().slot, 0);
}

#[test]
fn input_feedback_flashes_init() {
    let mut bench = booted();
    let init = IndicatorId::Status(StatusLed::Init);
    let since = bench.now();
    bench.press(Channel::C);
    wait(&mut bench, 300);
    assert_eq!(bench.panel().lit_count_since(init, since), 1);
    assert!(!bench.panel().is_lit(init));
}
