//! Script stepping system.
//!
//! [`run_scripts`] gives every program its turn once per tick. A program
//! whose awaited actors are all settled is resumed until one of its
//! commands leaves an actor busy, it finishes, or it used up
//! `max_steps_per_tick` resumes.
use bevy_ecs::prelude::*;
use log::{error, info, warn};
use rustc_hash::FxHashMap;

use crate::components::coordinator::SyncCoordinator;
use crate::components::mapposition::MapPosition;
use crate::components::motion::Motion;
use crate::components::rotation::Rotation;
use crate::exercise::Exercise;
use crate::resources::script::scheduler::ScriptSlot;
use crate::resources::script::{
    ActorSnapshot, EXERCISE_HANDLE, ScriptHandle, ScriptScheduler, ScriptState, ScriptStep,
    ScriptView,
};
use crate::systems::script_commands::apply_script_command;

/// Exclusive system: step every running program.
pub fn run_scripts(world: &mut World) {
    let Some(mut scheduler) = world.remove_non_send_resource::<ScriptScheduler>() else {
        return;
    };
    let max_steps = scheduler.max_steps_per_tick;
    for slot in scheduler.slots.iter_mut() {
        step_script(world, slot, max_steps);
    }
    world.insert_non_send_resource(scheduler);
}

fn step_script(world: &mut World, slot: &mut ScriptSlot, max_steps: u32) {
    if slot.state.is_done() {
        return;
    }
    let mut blocked = false;
    for &entity in &slot.awaiting {
        if world.get_entity(entity).is_err() {
            warn!(
                "script {} aborted: awaited actor {:?} was removed",
                slot.id.0, entity
            );
            slot.state = ScriptState::Aborted;
            return;
        }
        if world
            .get::<SyncCoordinator>(entity)
            .is_some_and(|c| !c.is_settled())
        {
            blocked = true;
        }
    }
    if blocked {
        return;
    }
    slot.awaiting.clear();

    for _ in 0..max_steps {
        let view = build_view(world, &slot.bindings);
        let (commands, finished) = match slot.source.resume(&view) {
            Ok(ScriptStep::Yielded(commands)) => (commands, false),
            Ok(ScriptStep::Finished(commands)) => (commands, true),
            Err(e) => {
                error!("script {} ({}) failed: {}", slot.id.0, slot.source.name(), e);
                slot.state = ScriptState::Failed(e.to_string());
                return;
            }
        };
        for cmd in commands {
            match apply_script_command(world, &mut slot.bindings, cmd) {
                Ok(Some(target)) => {
                    let busy = world
                        .get::<SyncCoordinator>(target)
                        .is_some_and(|c| !c.is_settled());
                    if busy && !slot.awaiting.contains(&target) {
                        slot.awaiting.push(target);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!("script {} ({}) failed: {}", slot.id.0, slot.source.name(), e);
                    slot.state = ScriptState::Failed(e.to_string());
                    return;
                }
            }
        }
        if finished {
            info!("script {} ({}) finished", slot.id.0, slot.source.name());
            slot.state = ScriptState::Finished;
            return;
        }
        if !slot.awaiting.is_empty() {
            return;
        }
    }
}

/// Snapshot of everything a program may read.
pub fn build_view(world: &World, bindings: &FxHashMap<ScriptHandle, Entity>) -> ScriptView {
    let mut view = ScriptView::default();
    for (&handle, &entity) in bindings {
        if handle == EXERCISE_HANDLE {
            view.exercise = world.get::<Exercise>(entity).cloned();
            continue;
        }
        let Some(position) = world.get::<MapPosition>(entity) else {
            continue;
        };
        view.actors.insert(
            handle,
            ActorSnapshot {
                x: position.pos.x,
                y: position.pos.y,
                heading: world.get::<Rotation>(entity).map_or(0.0, |r| r.degrees),
                moving: world.get::<Motion>(entity).is_some_and(|m| m.in_movement),
                pending: world
                    .get::<SyncCoordinator>(entity)
                    .map_or(0, |c| c.pending()),
            },
        );
    }
    view
}
