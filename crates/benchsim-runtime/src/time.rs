//! Simulated time.

#![allow(missing_docs)]

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Point on the bench timeline, in milliseconds since the bench was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Time `delta` after `self`, saturating at the end of the timeline.
    #[must_use]
    pub fn after(self, delta: Duration) -> Self {
        Self(self.0.saturating_add(millis_of(delta)))
    }

    /// Elapsed time since `earlier` (zero if `earlier` is later).
    #[must_use]
    pub fn since(self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Whole milliseconds of `delta`, saturating.
#[must_use]
pub fn millis_of(delta: Duration) -> u64 {
    u64::try_from(delta.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn after_and_since_are_inverse() {
        let start = SimTime::from_millis(1_500);
        let later = start.after(Duration::from_millis(250));
        assert_eq!(later.as_millis(), 1_750);
        assert_eq!(later.since(start), Duration::from_millis(250));
        assert_eq!(start.since(later), Duration::ZERO);
    }

    #[test]
    fn after_saturates() {
        let end = SimTime::from_millis(u64::MAX - 1);
        assert_eq!(end.after(Duration::from_secs(10)).as_millis(), u64::MAX);
    }
}
