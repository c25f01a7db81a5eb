//! Idle-disconnect timers
//!
//! Timers are plain deadlines checked on `IdleTick`; the time source is
//! injected so tests can advance it by hand.

use crate::registry::ContextIndex;
use std::collections::BTreeMap;
use std::time::Instant;

/// Monotonic time source
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock `Clock`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Armed idle deadlines, one per context at most
#[derive(Debug, Default)]
pub struct IdleTimers {
    deadlines: BTreeMap<ContextIndex, Instant>,
}

impl IdleTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer for `index`.
    pub fn arm(&mut self, index: ContextIndex, deadline: Instant) {
        self.deadlines.insert(index, deadline);
    }

    /// Disarm the timer for `index`. Returns whether one was armed.
    pub fn cancel(&mut self, index: ContextIndex) -> bool {
        self.deadlines.remove(&index).is_some()
    }

    pub fn is_armed(&self, index: ContextIndex) -> bool {
        self.deadlines.contains_key(&index)
    }

    pub fn deadline(&self, index: ContextIndex) -> Option<Instant> {
        self.deadlines.get(&index).copied()
    }

    /// Earliest armed deadline, for scheduling the next tick
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Disarm and return every timer due at `now`, in index order.
    pub fn take_expired(&mut self, now: Instant) -> Vec<ContextIndex> {
        let expired: Vec<ContextIndex> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(index, _)| *index)
            .collect();
        for index in &expired {
            self.deadlines.remove(index);
        }
        expired
    }
}
