#![forbid(unsafe_code)]

//! Cooperative deadline queue.
//!
//! The engine never owns a thread or a timer primitive; it records what
//! should happen when, and the host drains due work from whatever scheduler
//! it has via [`Engine::run_due_timers`]. Entries fire in deadline order,
//! ties broken by insertion order.
//!
//! [`Engine::run_due_timers`]: crate::engine::Engine::run_due_timers

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use driftwall_core::surface::LaneId;

/// Deferred engine work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerTask {
    /// Next chunk of the hydration run keyed by `revision`. Stale
    /// revisions are discarded at fire time, so superseded chains die
    /// without explicit cancellation.
    HydrationStep { lane: LaneId, revision: u64 },
    /// Debounced end of a resize burst. Only the latest `generation`
    /// is honored.
    ResizeSettle { generation: u64 },
}

#[derive(Debug, PartialEq, Eq)]
struct TimerEntry {
    due: Duration,
    seq: u64,
    task: TimerTask,
}

// BinaryHeap is a max-heap; reverse the ordering for earliest-first.
impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.due.cmp(&self.due).then(other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending timers, earliest first.
#[derive(Debug, Default)]
pub(crate) struct TimerQueue {
    heap: BinaryHeap<TimerEntry>,
    seq: u64,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn schedule(&mut self, due: Duration, task: TimerTask) {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(TimerEntry { due, seq, task });
    }

    /// Earliest pending deadline, if any.
    pub(crate) fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|entry| entry.due)
    }

    /// Pop the earliest entry that is due at `now`.
    pub(crate) fn pop_due(&mut self, now: Duration) -> Option<TimerTask> {
        if self.heap.peek().is_some_and(|entry| entry.due <= now) {
            self.heap.pop().map(|entry| entry.task)
        } else {
            None
        }
    }

    pub(crate) fn clear(&mut self) {
        self.heap.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
