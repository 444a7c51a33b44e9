//! One-shot timer service.
//!
//! Timers are owned by an entity. When one expires
//! [`tick_timers`](crate::systems::timers::tick_timers) ends one pending
//! operation on the owner's coordinator. Timers of a removed actor are
//! cancelled with [`TimerService::cancel_owned_by`] so that nothing fires
//! into a despawned entity.

use bevy_ecs::prelude::{Entity, Resource};
use log::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    handle: TimerHandle,
    owner: Entity,
    due_ms: f64,
}

#[derive(Resource, Debug, Default)]
pub struct TimerService {
    now_ms: f64,
    next_handle: u64,
    pending: Vec<PendingTimer>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timer firing `delay_ms` from now. Negative or NaN delays
    /// fire on the next advance.
    pub fn schedule(&mut self, owner: Entity, delay_ms: f32) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        let delay = if delay_ms.is_finite() { delay_ms.max(0.0) } else { 0.0 };
        self.pending.push(PendingTimer {
            handle,
            owner,
            due_ms: self.now_ms + f64::from(delay),
        });
        handle
    }

    /// Returns `false` for unknown or already fired handles.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.handle != handle);
        let cancelled = self.pending.len() != before;
        if !cancelled {
            debug!("cancel of unknown timer {:?}", handle);
        }
        cancelled
    }

    pub fn cancel_owned_by(&mut self, owner: Entity) -> usize {
        let before = self.pending.len();
        self.pending.retain(|t| t.owner != owner);
        before - self.pending.len()
    }

    /// Move the clock forward and return expired timers, earliest first.
    pub fn advance(&mut self, elapsed_ms: f32) -> Vec<(TimerHandle, Entity)> {
        if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            self.now_ms += f64::from(elapsed_ms);
        }
        let now = self.now_ms;
        let mut expired: Vec<PendingTimer> = Vec::new();
        self.pending.retain(|t| {
            if t.due_ms <= now {
                expired.push(*t);
                false
            } else {
                true
            }
        });
        expired.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.handle.cmp(&b.handle)));
        expired.into_iter().map(|t| (t.handle, t.owner)).collect()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|t| t.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
