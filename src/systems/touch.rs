//! Pointer touch dispatch.
//!
//! These functions are the entry points for the input layer. They route a
//! touch through [`Stages`], then trigger a [`TouchEvent`] so observers
//! (such as the drag observer) can react.
use bevy_ecs::prelude::*;
use bevy_ecs::system::RunSystemOnce;
use glam::Vec2;
use log::warn;

use crate::components::actor::Actor;
use crate::events::touch::{TouchEvent, TouchPhase};
use crate::resources::stages::{Stages, TouchId, TouchReport};
use crate::spatial::ActorId;
use crate::systems::spatial::sync_spatial_index;

/// Entity carrying the actor `id`.
pub fn entity_of(world: &mut World, id: ActorId) -> Option<Entity> {
    let mut query = world.query::<(Entity, &Actor)>();
    query
        .iter(world)
        .find(|(_, actor)| actor.id == id)
        .map(|(entity, _)| entity)
}

/// A pointer went down at `point`.
///
/// The stage index is brought up to date first, so actors spawned, moved or
/// dragged since the last tick answer where they are now.
pub fn dispatch_touch(world: &mut World, identifier: TouchId, point: Vec2) -> TouchReport {
    if let Err(e) = world.run_system_once(sync_spatial_index) {
        warn!("touch {}: stage index not refreshed: {}", identifier, e);
    }
    let report = world.resource_mut::<Stages>().touch(identifier, point);
    let actor = report.hit.and_then(|hit| entity_of(world, hit.actor));
    world.trigger(TouchEvent {
        phase: TouchPhase::Start,
        identifier,
        stage: report.stage,
        actor,
        point,
    });
    report
}

/// A held pointer moved. Returns the entity it is holding.
pub fn drag_touch(world: &mut World, identifier: TouchId, point: Vec2) -> Option<Entity> {
    let id = world.resource::<Stages>().claimed_by(identifier)?;
    let actor = entity_of(world, id)?;
    world.trigger(TouchEvent {
        phase: TouchPhase::Drag,
        identifier,
        stage: None,
        actor: Some(actor),
        point,
    });
    Some(actor)
}

/// A pointer went up. Releases the claim and returns the entity it held.
pub fn release_touch(world: &mut World, identifier: TouchId, point: Vec2) -> Option<Entity> {
    let released = world.resource_mut::<Stages>().release(identifier);
    let actor = released.and_then(|id| entity_of(world, id));
    world.trigger(TouchEvent {
        phase: TouchPhase::End,
        identifier,
        stage: None,
        actor,
        point,
    });
    actor
}
