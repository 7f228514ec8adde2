//! Deadline-ordered timer queue with named cancellation groups.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::time::SimTime;

/// Named bucket of timers that are cancelled together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupTag {
    /// Run and idle status pulses.
    Status,
    /// Test-case cue animations (fail blink).
    Test,
    /// Alternating "test in progress" pattern.
    Progress,
    /// Boot and reset stages, including their flashes.
    Boot,
    /// Short input-feedback flashes.
    Flash,
}

impl GroupTag {
    /// Every group, in clearing order.
    pub const ALL: [Self; 5] = [
        Self::Status,
        Self::Test,
        Self::Progress,
        Self::Boot,
        Self::Flash,
    ];

    /// Lowercase tag name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Test => "test",
            Self::Progress => "progress",
            Self::Boot => "boot",
            Self::Flash => "flash",
        }
    }
}

impl fmt::Display for GroupTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timer handle. Stable across re-arming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer taken off the queue because its deadline passed.
#[derive(Debug)]
pub(crate) struct Fired<T> {
    pub(crate) id: TimerId,
    pub(crate) at: SimTime,
    pub(crate) group: Option<GroupTag>,
    pub(crate) task: T,
}

#[derive(Debug)]
struct Entry<T> {
    key: (SimTime, u64),
    group: Option<GroupTag>,
    task: T,
}

/// Timers ordered by deadline, then by scheduling order.
///
/// Every id listed under a group refers to a pending entry; firing,
/// cancelling, or clearing removes it from its group.
#[derive(Debug)]
pub(crate) struct TimerQueue<T> {
    next_id: u64,
    seq: u64,
    queue: BTreeMap<(SimTime, u64), TimerId>,
    entries: FxHashMap<TimerId, Entry<T>>,
    groups: FxHashMap<GroupTag, IndexSet<TimerId>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            seq: 0,
            queue: BTreeMap::new(),
            entries: FxHashMap::default(),
            groups: FxHashMap::default(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn schedule(&mut self, at: SimTime, group: Option<GroupTag>, task: T) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.insert(id, at, group, task);
        id
    }

    /// Put a fired timer back on the queue under its original id and group.
    pub(crate) fn rearm(&mut self, id: TimerId, at: SimTime, group: Option<GroupTag>, task: T) {
        self.insert(id, at, group, task);
    }

    fn insert(&mut self, id: TimerId, at: SimTime, group: Option<GroupTag>, task: T) {
        self.seq += 1;
        let key = (at, self.seq);
        self.queue.insert(key, id);
        self.entries.insert(id, Entry { key, group, task });
        if let Some(tag) = group {
            self.groups.entry(tag).or_default().insert(id);
        }
    }

    /// Earliest pending deadline.
    pub(crate) fn next_deadline(&self) -> Option<SimTime> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    /// Remove and return the earliest timer due at or before `until`.
    pub(crate) fn pop_due(&mut self, until: SimTime) -> Option<Fired<T>> {
        let (&key, &id) = self.queue.iter().next()?;
        if key.0 > until {
            return None;
        }
        self.queue.remove(&key);
        let entry = self.entries.remove(&id)?;
        self.forget_group(id, entry.group);
        Some(Fired {
            id,
            at: key.0,
            group: entry.group,
            task: entry.task,
        })
    }

    /// Cancel one timer. Returns `false` if it already fired or was cancelled.
    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        self.queue.remove(&entry.key);
        self.forget_group(id, entry.group);
        true
    }

    /// Cancel every timer under `tag`; returns how many were cancelled.
    pub(crate) fn clear_group(&mut self, tag: GroupTag) -> usize {
        let Some(ids) = self.groups.get_mut(&tag).map(std::mem::take) else {
            return 0;
        };
        let mut cancelled = 0;
        for id in ids {
            if let Some(entry) = self.entries.remove(&id) {
                self.queue.remove(&entry.key);
                cancelled += 1;
            }
        }
        cancelled
    }

    pub(crate) fn clear_all_groups(&mut self) -> usize {
        GroupTag::ALL.into_iter().map(|tag| self.clear_group(tag)).sum()
    }

    pub(crate) fn group_len(&self, tag: GroupTag) -> usize {
        self.groups.get(&tag).map_or(0, IndexSet::len)
    }

    #[cfg(test)]
    pub(crate) fn group_of(&self, id: TimerId) -> Option<GroupTag> {
        self.entries.get(&id).and_then(|entry| entry.group)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn forget_group(&mut self, id: TimerId, group: Option<GroupTag>) {
        if let Some(set) = group.and_then(|tag| self.groups.get_mut(&tag)) {
            set.shift_remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> SimTime {
        SimTime::from_millis(ms)
    }

    #[test]
    fn fires_in_deadline_then_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(at(20), None, "late");
        timers.schedule(at(10), None, "first");
        timers.schedule(at(10), Some(GroupTag::Status), "second");

        assert!(timers.pop_due(at(5)).is_none());
        let order: Vec<_> = std::iter::from_fn(|| timers.pop_due(at(20)))
            .map(|fired| fired.task)
            .collect();
        assert_eq!(order, vec!["first", "second", "late"]);
        assert_eq!(timers.group_len(GroupTag::Status), 0);
    }

    #[test]
    fn clearing_group_cancels_only_members() {
        let mut timers = TimerQueue::new();
        let pulse = timers.schedule(at(10), Some(GroupTag::Status), 1);
        timers.schedule(at(10), Some(GroupTag::Test), 2);
        timers.schedule(at(10), None, 3);

        assert_eq!(timers.clear_group(GroupTag::Status), 1);
        assert_eq!(timers.clear_group(GroupTag::Status), 0);
        assert!(!timers.cancel(pulse));
        assert_eq!(timers.len(), 2);

        assert_eq!(timers.clear_all_groups(), 1);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(at(10)));
    }

    #[test]
    fn rearm_keeps_id_and_group() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule(at(5), Some(GroupTag::Flash), ());
        let fired = timers.pop_due(at(5)).expect("due");
        assert_eq!(fired.id, id);
        assert_eq!(timers.group_len(GroupTag::Flash), 0);

        timers.rearm(fired.id, at(10), fired.group, fired.task);
        assert_eq!(timers.group_of(id), Some(GroupTag::Flash));
        assert_eq!(timers.group_len(GroupTag::Flash), 1);
        assert!(timers.cancel(id));
        assert_eq!(timers.group_len(GroupTag::Flash), 0);
    }
}
