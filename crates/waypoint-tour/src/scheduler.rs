// SPDX-License-Identifier: Apache-2.0
//! Host-driven timers.
//!
//! The tour's only suspension points are timers: the retry interval and the
//! navigation settle delay. [`Scheduler`] keeps them in due order over a
//! [`DeterministicClock`] that the host advances explicitly, so timing is
//! reproducible and nothing fires behind the host's back.
//!
//! Cancelling a timer removes it outright. A cancelled [`TimerId`] is never
//! returned from [`Scheduler::pop_due`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use waypoint_tour::scheduler::{Scheduler, TimerKind};
//!
//! let mut sched = Scheduler::new();
//! let a = sched.schedule(Duration::from_millis(200), TimerKind::RetryResolve { step_index: 0 });
//! let b = sched.schedule(Duration::from_millis(50), TimerKind::NavigationSettle { to: 1 });
//! sched.cancel(a);
//!
//! let due = sched.pop_due(Duration::from_millis(500)).unwrap();
//! assert_eq!(due.id, b);
//! assert!(sched.pop_due(Duration::from_millis(500)).is_none());
//! ```

#![forbid(unsafe_code)]

use core::time::Duration;
use std::collections::{BTreeMap, HashMap};

use waypoint_core::{Clock, DeterministicClock};

/// Opaque handle for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Re-run retry resolution for the step at this index.
    RetryResolve { step_index: usize },
    /// Finish a navigation by entering the step at this index.
    NavigationSettle { to: usize },
}

/// A timer that has come due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTimer {
    pub id: TimerId,
    pub due: Duration,
    pub kind: TimerKind,
}

/// Due-ordered timer queue over a deterministic clock.
#[derive(Debug, Default)]
pub struct Scheduler {
    clock: DeterministicClock,
    queue: BTreeMap<(Duration, TimerId), TimerKind>,
    index: HashMap<TimerId, Duration>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scheduler time.
    pub fn now(&self) -> Duration {
        self.clock.now_mono()
    }

    /// Schedule `kind` to fire `delay` from now.
    pub fn schedule(&mut self, delay: Duration, kind: TimerKind) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let due = self.now().saturating_add(delay);
        self.queue.insert((due, id), kind);
        self.index.insert(id, due);
        tracing::trace!(
            target: "waypoint.tour",
            timer = id.0,
            due_ms = due.as_millis() as u64,
            kind = ?kind,
            "timer scheduled"
        );
        id
    }

    /// Cancel a timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.index.remove(&id) {
            Some(due) => {
                self.queue.remove(&(due, id));
                true
            }
            None => false,
        }
    }

    /// Drop every pending timer.
    pub fn cancel_all(&mut self) {
        self.queue.clear();
        self.index.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|&(due, _)| due)
    }

    /// Remove and return the earliest timer due at or before `until`.
    ///
    /// The clock moves to the timer's due time, so timers scheduled while
    /// handling it are measured from the moment it fired.
    pub fn pop_due(&mut self, until: Duration) -> Option<DueTimer> {
        let (&(due, id), _) = self.queue.first_key_value()?;
        if due > until {
            return None;
        }
        let kind = self.queue.remove(&(due, id))?;
        self.index.remove(&id);
        self.clock.set(due);
        Some(DueTimer { id, due, kind })
    }

    /// Move the clock forward to `until` without firing anything.
    pub fn advance_to(&mut self, until: Duration) {
        self.clock.set(until);
    }
}
