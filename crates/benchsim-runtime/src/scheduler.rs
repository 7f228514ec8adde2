//! Wall-clock driving for a bench and the clocks it runs on.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::bench::{Bench, BenchSnapshot};
use crate::error::BenchError;
use crate::events::BenchEvent;
use crate::input::Channel;
use crate::time::SimTime;

/// Time source for a bench runner.
pub trait Clock: Send + Sync + 'static {
    /// Current time.
    fn now(&self) -> SimTime;

    /// Block until `deadline` or a wake, whichever comes first.
    fn sleep_until(&self, deadline: SimTime);

    /// Wake any sleeper (best-effort).
    fn wake(&self) {}
}

/// Monotonic clock based on `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct StdClock {
    start: std::time::Instant,
}

impl StdClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now(&self) -> SimTime {
        let millis = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
        SimTime::from_millis(millis)
    }

    fn sleep_until(&self, deadline: SimTime) {
        let now = self.now();
        if deadline <= now {
            return;
        }
        thread::sleep(deadline.since(now));
    }
}

#[derive(Debug, Default)]
struct ManualClockState {
    now: SimTime,
    sleep_calls: u64,
    pending_wake: bool,
}

/// Deterministic clock for tests and simulations.
///
/// A wake issued while nobody sleeps is latched and ends the next sleep, so
/// commands sent between two loop iterations are never missed.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    inner: Arc<(Mutex<ManualClockState>, Condvar)>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current_time(&self) -> SimTime {
        self.lock().now
    }

    /// Advance time by `delta` and wake sleepers.
    pub fn advance(&self, delta: Duration) -> SimTime {
        let (_, cvar) = &*self.inner;
        let mut state = self.lock();
        state.now = state.now.after(delta);
        cvar.notify_all();
        state.now
    }

    pub fn set_time(&self, time: SimTime) {
        let (_, cvar) = &*self.inner;
        let mut state = self.lock();
        state.now = time;
        cvar.notify_all();
    }

    /// Number of sleep calls issued to this clock.
    #[must_use]
    pub fn sleep_calls(&self) -> u64 {
        self.lock().sleep_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualClockState> {
        let (lock, _) = &*self.inner;
        lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SimTime {
        self.current_time()
    }

    fn sleep_until(&self, deadline: SimTime) {
        let (_, cvar) = &*self.inner;
        let mut state = self.lock();
        state.sleep_calls = state.sleep_calls.saturating_add(1);
        while !state.pending_wake && state.now < deadline {
            state = cvar.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        state.pending_wake = false;
    }

    fn wake(&self) {
        let (_, cvar) = &*self.inner;
        let mut state = self.lock();
        state.pending_wake = true;
        cvar.notify_all();
    }
}

/// Runner thread lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerState {
    #[default]
    Starting,
    Running,
    Stopped,
}

/// External triggers delivered to the runner thread.
#[derive(Debug)]
pub enum BenchCommand {
    Press(Channel),
    Snapshot { respond_to: Sender<BenchSnapshot> },
    DrainEvents { respond_to: Sender<Vec<BenchEvent>> },
}

/// Drives a bench from a clock, in a dedicated thread.
#[derive(Debug)]
pub struct BenchRunner<C: Clock + Clone> {
    bench: Bench,
    clock: C,
    poll: Duration,
    command_rx: Option<Receiver<BenchCommand>>,
}

impl<C: Clock + Clone> BenchRunner<C> {
    /// `poll` bounds how long the thread sleeps with nothing scheduled.
    #[must_use]
    pub fn new(bench: Bench, clock: C, poll: Duration) -> Self {
        Self {
            bench,
            clock,
            poll,
            command_rx: None,
        }
    }

    #[must_use]
    pub fn bench(&self) -> &Bench {
        &self.bench
    }

    pub fn bench_mut(&mut self) -> &mut Bench {
        &mut self.bench
    }

    /// Catch the bench up to the clock.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.bench.advance_to(now);
    }

    /// Spawn the runner in a dedicated OS thread.
    pub fn spawn(self, name: impl Into<String>) -> Result<BenchHandle<C>, BenchError> {
        let stop = Arc::new(AtomicBool::new(false));
        let state = Arc::new(Mutex::new(RunnerState::Starting));
        let clock = self.clock.clone();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let mut runner = self;
        runner.command_rx = Some(cmd_rx);

        let stop_thread = stop.clone();
        let state_thread = state.clone();
        let join = thread::Builder::new()
            .name(name.into())
            .spawn(move || run_bench_loop(runner, &stop_thread, &state_thread))
            .map_err(|err| BenchError::ThreadSpawn(err.to_string().into()))?;

        Ok(BenchHandle {
            stop,
            state,
            clock,
            join: Some(join),
            cmd_tx,
        })
    }

    fn apply(&mut self, command: BenchCommand) {
        match command {
            BenchCommand::Press(channel) => self.bench.press(channel),
            BenchCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.bench.snapshot());
            }
            BenchCommand::DrainEvents { respond_to } => {
                let _ = respond_to.send(self.bench.drain_events());
            }
        }
    }
}

fn set_state(state: &Mutex<RunnerState>, next: RunnerState) {
    *state.lock().unwrap_or_else(PoisonError::into_inner) = next;
}

fn run_bench_loop<C: Clock + Clone>(
    mut runner: BenchRunner<C>,
    stop: &AtomicBool,
    state: &Mutex<RunnerState>,
) -> Bench {
    set_state(state, RunnerState::Running);
    loop {
        if stop.load(Ordering::SeqCst) {
            debug!("bench runner stopping");
            set_state(state, RunnerState::Stopped);
            break;
        }

        if let Some(commands) = runner.command_rx.take() {
            while let Ok(command) = commands.try_recv() {
                runner.tick();
                runner.apply(command);
            }
            runner.command_rx = Some(commands);
        }

        runner.tick();
        let now = runner.clock.now();
        let poll_deadline = now.after(runner.poll);
        let deadline = runner
            .bench
            .next_deadline()
            .map_or(poll_deadline, |next| next.min(poll_deadline));
        runner.clock.sleep_until(deadline);
    }
    runner.bench
}

/// Handle to a running bench thread.
#[derive(Debug)]
pub struct BenchHandle<C: Clock + Clone> {
    stop: Arc<AtomicBool>,
    state: Arc<Mutex<RunnerState>>,
    clock: C,
    join: Option<thread::JoinHandle<Bench>>,
    cmd_tx: Sender<BenchCommand>,
}

impl<C: Clock + Clone> BenchHandle<C> {
    /// Cloneable control handle.
    #[must_use]
    pub fn control(&self) -> BenchControl<C> {
        BenchControl {
            stop: self.stop.clone(),
            state: self.state.clone(),
            clock: self.clock.clone(),
            cmd_tx: self.cmd_tx.clone(),
        }
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.clock.wake();
    }

    #[must_use]
    pub fn state(&self) -> RunnerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Join the thread, returning the bench it owned.
    pub fn join(&mut self) -> thread::Result<Option<Bench>> {
        match self.join.take() {
            Some(join) => join.join().map(Some),
            None => Ok(None),
        }
    }
}

/// Lightweight control handle for a running bench.
#[derive(Debug, Clone)]
pub struct BenchControl<C: Clock + Clone> {
    stop: Arc<AtomicBool>,
    state: Arc<Mutex<RunnerState>>,
    clock: C,
    cmd_tx: Sender<BenchCommand>,
}

impl<C: Clock + Clone> BenchControl<C> {
    pub fn press(&self, channel: Channel) -> Result<(), BenchError> {
        self.send_command(BenchCommand::Press(channel))
    }

    /// Bench snapshot taken on the runner thread.
    pub fn snapshot(&self) -> Result<BenchSnapshot, BenchError> {
        let (tx, rx) = mpsc::channel();
        self.send_command(BenchCommand::Snapshot { respond_to: tx })?;
        rx.recv()
            .map_err(|_| BenchError::ControlError("runner dropped snapshot request".into()))
    }

    pub fn drain_events(&self) -> Result<Vec<BenchEvent>, BenchError> {
        let (tx, rx) = mpsc::channel();
        self.send_command(BenchCommand::DrainEvents { respond_to: tx })?;
        rx.recv()
            .map_err(|_| BenchError::ControlError("runner dropped event request".into()))
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.clock.wake();
    }

    #[must_use]
    pub fn state(&self) -> RunnerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn send_command(&self, command: BenchCommand) -> Result<(), BenchError> {
        self.cmd_tx
            .send(command)
            .map_err(|_| BenchError::ControlError("command channel closed".into()))?;
        self.clock.wake();
        Ok(())
    }
}
