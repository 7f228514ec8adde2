//! System state flags and run bookkeeping.

#![allow(missing_docs)]

use serde::Serialize;

/// Process-wide bench state.
///
/// Mutated only by the boot controller and the test runner; test cases see
/// it read-only through their context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemState {
    pub(crate) power: bool,
    pub(crate) boot_init: bool,
    pub(crate) ready: bool,
    pub(crate) idle: bool,
    pub(crate) running: bool,
    pub(crate) current_test_index: usize,
    pub(crate) run_id: u64,
}

impl SystemState {
    /// Fresh, unpowered state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Master enable.
    #[must_use]
    pub fn power(&self) -> bool {
        self.power
    }

    /// Boot initialisation in progress.
    #[must_use]
    pub fn boot_init(&self) -> bool {
        self.boot_init
    }

    #[must_use]
    pub fn ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub fn idle(&self) -> bool {
        self.idle
    }

    #[must_use]
    pub fn running(&self) -> bool {
        self.running
    }

    /// Slot of the next test case to run.
    #[must_use]
    pub fn current_test_index(&self) -> usize {
        self.current_test_index
    }

    /// Current run identifier.
    #[must_use]
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// A test may start only when this holds.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready && self.idle && !self.running
    }

    /// Bump the run identifier, invalidating every pending completion.
    pub(crate) fn next_run_id(&mut self) -> u64 {
        self.run_id = self.run_id.wrapping_add(1);
        self.run_id
    }

    pub(crate) fn enter_running(&mut self) {
        self.idle = false;
        self.running = true;
    }

    pub(crate) fn enter_idle(&mut self) {
        self.idle = true;
        self.running = false;
    }

    /// Clear readiness flags; power and counters are left alone.
    pub(crate) fn clear_readiness(&mut self) {
        self.boot_init = false;
        self.ready = false;
        self.idle = false;
        self.running = false;
    }
}
