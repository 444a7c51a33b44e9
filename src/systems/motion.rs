//! Motion system.
//!
//! Moves every actor in movement toward its destination. Arrival ends the
//! pending operation on the actor's coordinator, which is what lets a
//! waiting learner program continue.
use bevy_ecs::prelude::*;
use log::debug;

use crate::components::actor::Actor;
use crate::components::boxcollider::BoxCollider;
use crate::components::coordinator::SyncCoordinator;
use crate::components::mapposition::MapPosition;
use crate::components::motion::{ARRIVAL_EPSILON, Motion};
use crate::components::stagemember::StageMember;
use crate::resources::runtimeconfig::RuntimeConfig;
use crate::resources::stages::Stages;
use crate::resources::worldtime::WorldTime;
use crate::spatial::{Body, Probe};

/// Advance moving actors by one tick.
///
/// - Dragged or frozen actors keep their state and do not finish.
/// - An actor with `blocked_by` set stops in front of the first matching
///   actor: it stays where it was and its destination is moved there.
/// - Axis speeds follow the remaining distance, so chained commands still
///   travel in a straight line to the final destination.
/// - Indexed bodies follow their actor within the tick, so later movers
///   and touches see the new bounds.
/// - A tick in which nothing moved finishes the movement and calls `end()`
///   once for every motion command it was carrying.
pub fn motion_system(
    time: Res<WorldTime>,
    config: Option<Res<RuntimeConfig>>,
    mut stages: ResMut<Stages>,
    mut query: Query<(
        &Actor,
        &mut MapPosition,
        &mut Motion,
        &mut SyncCoordinator,
        Option<&BoxCollider>,
        Option<&StageMember>,
    )>,
) {
    let epsilon = config.map_or(ARRIVAL_EPSILON, |c| c.epsilon);
    for (actor, mut position, mut motion, mut coordinator, collider, member) in query.iter_mut() {
        if !motion.in_movement || motion.dragging || motion.frozen {
            continue;
        }
        let previous = position.pos;
        let remaining = motion.destination - previous;
        motion.velocity = motion.axis_velocity(remaining);
        let (mut next, mut moved) = motion.advance(previous, time.delta, epsilon);

        if moved {
            if let (Some(mask), Some(collider), Some(member)) = (motion.blocked_by, collider, member)
            {
                let stage = stages.stage_mut(member.0);
                let ahead = Probe::actor(actor.id, collider.aabb(next));
                if let Some(hit) = stage.search(&ahead, Some(mask)) {
                    debug!("{} blocked by {} at {:?}", actor.id, hit.actor, previous);
                    motion.snap_to(previous);
                    next = previous;
                    moved = false;
                }
            }
        }

        position.pos = next;
        if let (Some(collider), Some(member)) = (collider, member) {
            let stage = stages.stage_mut(member.0);
            let bounds = collider.aabb(next);
            if let Some(body) = stage.body(actor.id).copied() {
                if body.bounds != bounds {
                    stage.upsert(Body { bounds, ..body });
                }
            }
        }
        if !moved {
            for _ in 0..motion.finish() {
                coordinator.end();
            }
        }
    }
}
