//! Applying learner commands to the world.
//!
//! - [`apply_script_command`] – resolve the target and dispatch one [`ScriptCmd`]
//! - [`apply_actor_command`] – turtle and sprite commands
//! - [`apply_exercise_command`] – exercise commands
//!
//! Commands that take time call `begin()` on the target's coordinator. The
//! matching `end()` comes later from the motion system or a timer.

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::actors::ActorBuilder;
use crate::components::actor::Actor;
use crate::components::coordinator::SyncCoordinator;
use crate::components::mapposition::MapPosition;
use crate::components::motion::Motion;
use crate::components::pathtrail::PathTrail;
use crate::components::rotation::Rotation;
use crate::components::visibility::Hidden;
use crate::exercise::Exercise;
use crate::resources::script::{
    ActorCmd, EXERCISE_HANDLE, ExerciseCmd, ScriptCmd, ScriptError, ScriptHandle, ScriptTarget,
};
use crate::resources::timers::TimerService;
use crate::systems::teardown::teardown_actor;

fn resolve(
    bindings: &FxHashMap<ScriptHandle, Entity>,
    target: ScriptTarget,
) -> Result<Entity, ScriptError> {
    match target {
        ScriptTarget::Entity(entity) => Ok(entity),
        ScriptTarget::Handle(handle) => bindings
            .get(&handle)
            .copied()
            .ok_or(ScriptError::UnknownHandle(handle)),
    }
}

/// Apply `cmd` on behalf of a program whose handles are `bindings`.
///
/// Returns the entity the command acted on, so the caller can wait for it.
/// Actor commands are also recorded as statements on the exercise bound to
/// [`EXERCISE_HANDLE`], if any.
pub fn apply_script_command(
    world: &mut World,
    bindings: &mut FxHashMap<ScriptHandle, Entity>,
    cmd: ScriptCmd,
) -> Result<Option<Entity>, ScriptError> {
    match cmd {
        ScriptCmd::Actor { target, cmd } => {
            let entity = resolve(bindings, target)?;
            let statement = world
                .get::<Actor>(entity)
                .map(|actor| cmd.statement(&actor.class_name));
            apply_actor_command(world, entity, cmd)?;
            if let (Some(statement), Some(exercise)) = (statement, bindings.get(&EXERCISE_HANDLE))
            {
                if let Some(mut exercise) = world.get_mut::<Exercise>(*exercise) {
                    exercise.record_statement(statement);
                }
            }
            Ok(world.get_entity(entity).is_ok().then_some(entity))
        }
        ScriptCmd::Exercise { target, cmd } => {
            let entity = resolve(bindings, target)?;
            apply_exercise_command(world, entity, cmd)?;
            Ok(Some(entity))
        }
        ScriptCmd::Spawn { handle, kind, x, y } => {
            if handle == EXERCISE_HANDLE {
                return Err(ScriptError::Runtime(format!(
                    "handle {} is reserved for the exercise",
                    EXERCISE_HANDLE
                )));
            }
            let entity = ActorBuilder::of_kind(kind, x, y).spawn(world);
            if let Some(previous) = bindings.insert(handle, entity) {
                warn!("handle {} rebound from {:?} to {:?}", handle, previous, entity);
            }
            Ok(Some(entity))
        }
    }
}

pub fn apply_actor_command(
    world: &mut World,
    entity: Entity,
    cmd: ActorCmd,
) -> Result<(), ScriptError> {
    if world.get_entity(entity).is_err() {
        return Err(ScriptError::BadTarget(entity, "actor"));
    }
    match cmd {
        ActorCmd::Walk(distance) => {
            if !distance.is_finite() {
                warn!("ignoring walk of {} for {:?}", distance, entity);
                return Ok(());
            }
            let heading = world.get::<Rotation>(entity).copied().unwrap_or_default();
            start_motion(world, entity, |motion| {
                motion.push_destination(heading.forward(distance))
            })?;
        }
        ActorCmd::MoveTo { x, y } => {
            if !(x.is_finite() && y.is_finite()) {
                warn!("ignoring destination ({}, {}) for {:?}", x, y, entity);
                return Ok(());
            }
            start_motion(world, entity, |motion| motion.retarget(Vec2::new(x, y)))?;
        }
        ActorCmd::Rotate(degrees) => {
            if !degrees.is_finite() {
                warn!("ignoring rotation of {} for {:?}", degrees, entity);
                return Ok(());
            }
            rotate(world, entity, degrees)?
        }
        ActorCmd::RotateRight => rotate(world, entity, 90.0)?,
        ActorCmd::RotateLeft => rotate(world, entity, 270.0)?,
        ActorCmd::RotateBehind => rotate(world, entity, 180.0)?,
        ActorCmd::SetPosition { x, y } => {
            if !(x.is_finite() && y.is_finite()) {
                warn!("ignoring position ({}, {}) for {:?}", x, y, entity);
                return Ok(());
            }
            let pos = Vec2::new(x, y);
            let mut position = world
                .get_mut::<MapPosition>(entity)
                .ok_or(ScriptError::BadTarget(entity, "position"))?;
            position.pos = pos;
            if let Some(mut motion) = world.get_mut::<Motion>(entity) {
                motion.snap_to(pos);
            }
        }
        ActorCmd::SetSpeed(speed) => {
            if !(speed.is_finite() && speed > 0.0) {
                warn!("ignoring speed {} for {:?}", speed, entity);
                return Ok(());
            }
            motion_mut(world, entity)?.speed = speed;
        }
        ActorCmd::Freeze(on) => motion_mut(world, entity)?.frozen = on,
        ActorCmd::BlockedBy(mask) => motion_mut(world, entity)?.blocked_by = mask,
        ActorCmd::TrackPath(on) => trail_mut(world, entity)?.enabled = on,
        ActorCmd::ColorPath(color) => trail_mut(world, entity)?.color = color,
        ActorCmd::PathWidth(width) => trail_mut(world, entity)?.width = width.max(0.0),
        ActorCmd::Hide(true) => {
            world.entity_mut(entity).insert(Hidden);
        }
        ActorCmd::Hide(false) => {
            world.entity_mut(entity).remove::<Hidden>();
        }
        ActorCmd::Wait(ms) => {
            if !ms.is_finite() {
                warn!("ignoring wait of {} ms for {:?}", ms, entity);
                return Ok(());
            }
            coordinator_mut(world, entity)?.begin();
            world.resource_mut::<TimerService>().schedule(entity, ms);
        }
        ActorCmd::Remove => {
            teardown_actor(world, entity);
        }
    }
    Ok(())
}

pub fn apply_exercise_command(
    world: &mut World,
    entity: Entity,
    cmd: ExerciseCmd,
) -> Result<(), ScriptError> {
    if cmd == ExerciseCmd::Clear {
        return clear_exercise(world, entity);
    }
    if let ExerciseCmd::Wait(ms) = cmd {
        if !ms.is_finite() {
            warn!("ignoring exercise wait of {} ms", ms);
            return Ok(());
        }
        coordinator_mut(world, entity)?.begin();
        let timer = world.resource_mut::<TimerService>().schedule(entity, ms);
        exercise_mut(world, entity)?.begin_wait(timer);
        return Ok(());
    }

    let mut exercise = exercise_mut(world, entity)?;
    match cmd {
        ExerciseCmd::Record(statement) => exercise.record_statement(statement),
        ExerciseCmd::SetStatements(statements) => exercise.set_statements(statements),
        ExerciseCmd::SetSource(source) => exercise.set_source(source),
        ExerciseCmd::SetScore(score) => exercise.set_score(score),
        ExerciseCmd::SetMessage(message) => exercise.set_message(message),
        ExerciseCmd::SetRequiredScore(score) => exercise.set_required_score(score),
        ExerciseCmd::Done { message, score } => {
            exercise.done(message, score);
        }
        ExerciseCmd::Validate(message) => exercise.validate(message),
        ExerciseCmd::Invalidate(message) => exercise.invalidate(message),
        ExerciseCmd::Set(name, value) => exercise.set(name, value),
        ExerciseCmd::SetTextMode => exercise.set_text_mode(),
        ExerciseCmd::SetProgramMode => exercise.set_program_mode(),
        ExerciseCmd::SetCompletions(json) => exercise.set_completions(json),
        ExerciseCmd::DumpStatements => exercise.dump_statements(),
        ExerciseCmd::Log(message) => info!(target: "exercise", "{}", message),
        ExerciseCmd::Debug(message) => debug!(target: "exercise", "{}", message),
        ExerciseCmd::Wait(_) | ExerciseCmd::Clear => {}
    }
    Ok(())
}

/// Reset the exercise, cancel its pending wait and release anyone waiting on it.
pub fn clear_exercise(world: &mut World, entity: Entity) -> Result<(), ScriptError> {
    let timer = exercise_mut(world, entity)?.clear();
    if let Some(timer) = timer {
        world.resource_mut::<TimerService>().cancel(timer);
    }
    coordinator_mut(world, entity)?.settle();
    Ok(())
}

fn start_motion(
    world: &mut World,
    entity: Entity,
    plan: impl FnOnce(&mut Motion) -> (Vec2, Vec2),
) -> Result<(), ScriptError> {
    let (from, to) = plan(&mut *motion_mut(world, entity)?);
    if let Some(mut trail) = world.get_mut::<PathTrail>(entity) {
        trail.record(from, to);
    }
    coordinator_mut(world, entity)?.begin();
    Ok(())
}

fn rotate(world: &mut World, entity: Entity, degrees: f32) -> Result<(), ScriptError> {
    world
        .get_mut::<Rotation>(entity)
        .ok_or(ScriptError::BadTarget(entity, "rotation"))?
        .rotate(degrees);
    Ok(())
}

fn motion_mut(world: &mut World, entity: Entity) -> Result<Mut<'_, Motion>, ScriptError> {
    world
        .get_mut::<Motion>(entity)
        .ok_or(ScriptError::BadTarget(entity, "motion"))
}

fn trail_mut(world: &mut World, entity: Entity) -> Result<Mut<'_, PathTrail>, ScriptError> {
    world
        .get_mut::<PathTrail>(entity)
        .ok_or(ScriptError::BadTarget(entity, "path trail"))
}

fn coordinator_mut(
    world: &mut World,
    entity: Entity,
) -> Result<Mut<'_, SyncCoordinator>, ScriptError> {
    world
        .get_mut::<SyncCoordinator>(entity)
        .ok_or(ScriptError::BadTarget(entity, "coordinator"))
}

fn exercise_mut(world: &mut World, entity: Entity) -> Result<Mut<'_, Exercise>, ScriptError> {
    world
        .get_mut::<Exercise>(entity)
        .ok_or(ScriptError::BadTarget(entity, "exercise"))
}
