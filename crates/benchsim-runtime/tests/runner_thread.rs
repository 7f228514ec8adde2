use std::time::Duration;

use benchsim_runtime::engine::SlotStatus;
use benchsim_runtime::input::Channel;
use benchsim_runtime::scheduler::{BenchRunner, ManualClock, RunnerState};
use benchsim_runtime::time::SimTime;
use benchsim_runtime::Bench;

#[test]
fn runner_thread_follows_the_manual_clock() {
    let clock = ManualClock::new();
    let runner = BenchRunner::new(Bench::default(), clock.clone(), Duration::from_secs(10));
    let mut handle = runner.spawn("bench-runner-test").unwrap();
    let control = handle.control();

    control.press(Channel::Power).unwrap();
    let snapshot = control.snapshot().unwrap();
    assert!(snapshot.state.power());
    assert!(!snapshot.state.is_ready());

    clock.advance(Duration::from_millis(3_000));
    let snapshot = control.snapshot().unwrap();
    assert_eq!(snapshot.now, SimTime::from_millis(3_000));
    assert!(snapshot.state.is_ready());

    control.press(Channel::D).unwrap();
    let snapshot = control.snapshot().unwrap();
    assert_eq!(snapshot.active_run.map(|run| run.slot), Some(0));
    assert_eq!(snapshot.slots[0], SlotStatus::InProgress);

    clock.advance(Duration::from_millis(5_000));
    let snapshot = control.snapshot().unwrap();
    assert!(snapshot.active_run.is_none());
    assert_eq!(snapshot.slots[0], SlotStatus::Fail);

    let events = control.drain_events().unwrap();
    assert!(!events.is_empty());
    assert!(control.drain_events().unwrap().is_empty());

    handle.stop();
    let bench = handle.join().unwrap().unwrap();
    assert_eq!(handle.state(), RunnerState::Stopped);
    assert_eq!(bench.slot_status(0), Some(SlotStatus::Fail));
    assert!(handle.join().unwrap().is_none());
}

#[test]
fn commands_fail_once_the_runner_is_gone() {
    let clock = ManualClock::new();
    let runner = BenchRunner::new(Bench::default(), clock, Duration::from_millis(50));
    let mut handle = runner.spawn("bench-runner-stop").unwrap();
    let control = handle.control();
    control.stop();
    handle.join().unwrap();
    assert!(control.snapshot().is_err());
}
