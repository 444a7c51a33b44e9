use bevy_ecs::prelude::*;
use log::debug;

use crate::components::actor::Actor;
use crate::resources::stages::Stages;
use crate::resources::timers::TimerService;

/// Remove an actor from the simulation.
///
/// Pending timers owned by the actor are cancelled without ending anything,
/// the actor leaves every stage and drops its touch claim, then the entity is
/// despawned. Programs waiting on it are aborted by the scheduler on their
/// next turn. Returns `false` if the entity was already gone.
pub fn teardown_actor(world: &mut World, entity: Entity) -> bool {
    if world.get_entity(entity).is_err() {
        return false;
    }
    let cancelled = world
        .resource_mut::<TimerService>()
        .cancel_owned_by(entity);
    if let Some(id) = world.get::<Actor>(entity).map(|a| a.id) {
        world.resource_mut::<Stages>().remove_actor(id);
        debug!("removing actor {} ({} timers cancelled)", id, cancelled);
    }
    world.despawn(entity)
}
