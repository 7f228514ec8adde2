//! `benchsim-runtime` - test-bench panel simulator core.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Indicator animations and the timer owner.
pub mod animator;
/// The bench and its snapshots.
pub mod bench;
mod boot;
/// Standard acceptance test cases.
pub mod cases;
/// Bench timing configuration.
pub mod config;
/// Test case contract and runner.
pub mod engine;
/// Bench errors.
pub mod error;
/// Bench event journal.
pub mod events;
/// Input channels and subscriptions.
pub mod input;
/// Panel layout and indicator state.
pub mod panel;
/// Scripted scenarios.
pub mod scenario;
/// Wall-clock runner thread and clocks.
pub mod scheduler;
/// System state flags.
pub mod state;
/// Virtual time.
pub mod time;
/// Grouped timer queue.
pub mod timers;

pub use bench::{Bench, BenchSnapshot};
pub use config::BenchConfig;
pub use error::BenchError;
