//! Blocking-call coordinator.
//!
//! Each actor owns a [`SyncCoordinator`] counting its outstanding
//! operations. A command that starts something asynchronous (a walk, a wait)
//! calls [`begin`](SyncCoordinator::begin); whatever finishes it calls
//! [`end`](SyncCoordinator::end). The script scheduler does not resume a
//! learner program while an actor it awaits has a non-zero count.
//!
//! Nesting is allowed: two `begin`s need two `end`s.

use bevy_ecs::prelude::Component;
use log::warn;

#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncCoordinator {
    pending: u32,
}

impl SyncCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        self.pending = self.pending.saturating_add(1);
    }

    /// Finish one operation. An `end` with nothing pending is ignored and
    /// returns `false`.
    pub fn end(&mut self) -> bool {
        if self.pending == 0 {
            warn!("SyncCoordinator::end called with no pending operation");
            return false;
        }
        self.pending -= 1;
        true
    }

    pub fn pending(&self) -> u32 {
        self.pending
    }

    pub fn is_settled(&self) -> bool {
        self.pending == 0
    }

    /// Drop every pending operation without completing them.
    /// Returns how many were dropped.
    pub fn settle(&mut self) -> u32 {
        std::mem::take(&mut self.pending)
    }
}
