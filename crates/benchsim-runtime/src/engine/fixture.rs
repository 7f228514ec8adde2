//! Per-run fixture: setup/teardown hooks and the contexts handed to test cases.

#![allow(missing_docs)]

use std::fmt;

use smol_str::SmolStr;

use crate::error::BenchError;
use crate::input::{Channel, InputBus, SubscriptionId};
use crate::time::SimTime;

use super::cue::VisualCue;

/// Result of a setup or teardown hook.
pub type HookResult = Result<(), BenchError>;

pub(crate) type Hook = Box<dyn FnOnce(&mut HookContext<'_>) -> HookResult + Send>;

/// Hook registry handed to [`TestCase::start`](super::TestCase::start).
///
/// Setup hooks run once, in registration order, before observation begins.
/// Teardown hooks run once, in registration order, after the run concludes,
/// whatever the outcome.
#[derive(Default)]
pub struct Fixture {
    setups: Vec<Hook>,
    teardowns: Vec<Hook>,
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("setups", &self.setups.len())
            .field("teardowns", &self.teardowns.len())
            .finish()
    }
}

impl Fixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn setup<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut HookContext<'_>) -> HookResult + Send + 'static,
    {
        self.setups.push(Box::new(hook));
    }

    pub fn teardown<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut HookContext<'_>) -> HookResult + Send + 'static,
    {
        self.teardowns.push(Box::new(hook));
    }

    /// Subscribe to `channels` on setup and release them on teardown.
    pub fn listen(&mut self, channels: &[Channel]) {
        let channels = channels.to_vec();
        self.setup(move |cx| {
            for channel in channels {
                cx.subscribe(channel);
            }
            Ok(())
        });
        self.teardown(|cx| {
            cx.release();
            Ok(())
        });
    }

    pub(crate) fn into_hooks(self) -> (Vec<Hook>, Vec<Hook>) {
        (self.setups, self.teardowns)
    }
}

/// Input-source access for hooks, scoped to the current run.
pub struct HookContext<'a> {
    run_id: u64,
    inputs: &'a mut InputBus,
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(run_id: u64, inputs: &'a mut InputBus) -> Self {
        Self { run_id, inputs }
    }

    #[must_use]
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Route presses on `channel` to the running case.
    pub fn subscribe(&mut self, channel: Channel) -> SubscriptionId {
        self.inputs.subscribe(self.run_id, channel)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.inputs.unsubscribe(id)
    }

    /// Drop every subscription this run holds.
    pub fn release(&mut self) -> usize {
        self.inputs.unsubscribe_owner(self.run_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CueRequest {
    Known(VisualCue),
    Unknown(SmolStr),
}

/// What a test case sees while observing: the time, the ready flag, and a
/// visual-cue channel.
#[derive(Debug)]
pub struct CaseContext {
    now: SimTime,
    ready: bool,
    cues: Vec<CueRequest>,
}

impl CaseContext {
    pub(crate) fn new(now: SimTime, ready: bool) -> Self {
        Self {
            now,
            ready,
            cues: Vec::new(),
        }
    }

    #[must_use]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// The bench `ready` flag (read-only).
    #[must_use]
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Request a visual cue on this case's indicators.
    pub fn cue(&mut self, cue: VisualCue) {
        self.cues.push(CueRequest::Known(cue));
    }

    /// Request a cue by name. Unknown names are reported and ignored.
    pub fn cue_named(&mut self, name: &str) {
        let request = match name.parse::<VisualCue>() {
            Ok(cue) => CueRequest::Known(cue),
            Err(_) => CueRequest::Unknown(SmolStr::new(name)),
        };
        self.cues.push(request);
    }

    pub(crate) fn into_cues(self) -> Vec<CueRequest> {
        self.cues
    }
}
