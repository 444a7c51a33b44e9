use bevy_ecs::prelude::*;
use log::debug;

use crate::components::coordinator::SyncCoordinator;
use crate::exercise::Exercise;
use crate::resources::timers::TimerService;
use crate::resources::worldtime::WorldTime;

/// Fire expired timers: each one ends one pending operation on its owner.
///
/// Owners that no longer exist are skipped. An exercise owner is also told
/// its wait is over.
pub fn tick_timers(
    time: Res<WorldTime>,
    mut timers: ResMut<TimerService>,
    mut coordinators: Query<&mut SyncCoordinator>,
    mut exercises: Query<&mut Exercise>,
) {
    for (handle, owner) in timers.advance(time.delta_ms()) {
        let Ok(mut coordinator) = coordinators.get_mut(owner) else {
            debug!("timer {:?} fired for missing owner {:?}", handle, owner);
            continue;
        };
        coordinator.end();
        if let Ok(mut exercise) = exercises.get_mut(owner) {
            exercise.wait_elapsed(handle);
        }
    }
}
