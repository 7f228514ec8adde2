//! Input channels and press subscriptions.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;
use smol_str::SmolStr;

use crate::error::BenchError;
use crate::time::SimTime;

/// Discrete input channels on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Test input button A.
    A,
    /// Test input button B.
    B,
    /// Test input button C.
    C,
    /// "Start test" button.
    D,
    /// "Reset" button.
    E,
    /// Power switch.
    Power,
}

impl Channel {
    /// Buttons whose presses are routed to test cases.
    pub const TEST_INPUTS: [Self; 3] = [Self::A, Self::B, Self::C];

    /// Lowercase channel name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::C => "c",
            Self::D => "d",
            Self::E => "e",
            Self::Power => "power",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = BenchError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            "c" => Ok(Self::C),
            "d" | "start" => Ok(Self::D),
            "e" | "reset" => Ok(Self::E),
            "power" | "pwr" => Ok(Self::Power),
            _ => Err(BenchError::UnknownChannel(SmolStr::new(text))),
        }
    }
}

/// A single "activated" event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputEvent {
    /// Channel that fired.
    pub channel: Channel,
    /// When it fired.
    pub at: SimTime,
}

/// Handle returned by [`InputBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy)]
struct Subscription {
    owner: u64,
    channel: Channel,
}

/// Subscription table for press events.
///
/// Subscriptions are owned by a test run (its run id), so a run's teardown
/// can release everything it registered without tracking handles.
#[derive(Debug, Default)]
pub struct InputBus {
    next_id: u64,
    subscriptions: IndexMap<SubscriptionId, Subscription>,
}

impl InputBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `owner` to presses on `channel`.
    pub fn subscribe(&mut self, owner: u64, channel: Channel) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.insert(id, Subscription { owner, channel });
        id
    }

    /// Drop one subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.shift_remove(&id).is_some()
    }

    /// Drop every subscription held by `owner`; returns how many were removed.
    pub fn unsubscribe_owner(&mut self, owner: u64) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|_, sub| sub.owner != owner);
        before - self.subscriptions.len()
    }

    /// Whether `owner` currently listens on `channel`.
    #[must_use]
    pub fn is_subscribed(&self, owner: u64, channel: Channel) -> bool {
        self.subscriptions
            .values()
            .any(|sub| sub.owner == owner && sub.channel == channel)
    }

    /// Total live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_release_leaves_other_owners() {
        let mut bus = InputBus::new();
        let first = bus.subscribe(1, Channel::A);
        bus.subscribe(1, Channel::B);
        bus.subscribe(2, Channel::A);
        assert!(bus.is_subscribed(1, Channel::A));
        assert!(!bus.is_subscribed(1, Channel::C));

        assert_eq!(bus.unsubscribe_owner(1), 2);
        assert!(!bus.unsubscribe(first));
        assert!(bus.is_subscribed(2, Channel::A));
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn channel_aliases_parse() {
        assert_eq!("Start".parse::<Channel>().unwrap(), Channel::D);
        assert_eq!(" reset ".parse::<Channel>().unwrap(), Channel::E);
        assert_eq!("pwr".parse::<Channel>().unwrap(), Channel::Power);
        assert!("f".parse::<Channel>().is_err());
    }
}
