//! Session wiring.
//!
//! A [`Session`] owns the ECS [`World`] and the per-tick [`Schedule`]. Each
//! tick runs, in order:
//!
//! 1. `tick_timers` – expired waits end their pending operation
//! 2. `sync_spatial_index` – actor bounds are mirrored into the stage grids
//! 3. `motion_system` – actors move, their stage bodies follow, and walks
//!    that converged end
//! 4. `run_scripts` – programs whose awaited actors settled take their turn
//! 5. `deliver_host_calls` – queued exercise calls reach the host
//!
//! Everything the input layer and the embedding frame need goes through the
//! session: spawning actors and programs, pointer touches, clearing.

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::{debug, error, info};

use crate::actors::{ActorBuilder, spawn_exercise};
use crate::components::actor::Actor;
use crate::components::persistent::Persistent;
use crate::events::touch::observe_touch_drag;
use crate::exercise::{Exercise, ExerciseHost, ExerciseReport};
use crate::resources::actorids::ActorIds;
use crate::resources::hostbridge::HostBridge;
use crate::resources::runtimeconfig::RuntimeConfig;
use crate::resources::script::{
    ActorCmd, ScriptError, ScriptId, ScriptScheduler, ScriptSource, ScriptState,
};
use crate::resources::stages::{Stages, TouchId, TouchReport};
use crate::resources::timers::TimerService;
use crate::resources::worldtime::WorldTime;
use crate::systems::exercise::deliver_host_calls;
use crate::systems::motion::motion_system;
use crate::systems::script_commands::{apply_actor_command, clear_exercise};
use crate::systems::scripts::run_scripts;
use crate::systems::spatial::sync_spatial_index;
use crate::systems::teardown::teardown_actor;
use crate::systems::time::update_world_time;
use crate::systems::timers::tick_timers;
use crate::systems::touch::{dispatch_touch, drag_touch, release_touch};

pub struct Session {
    world: World,
    schedule: Schedule,
    fixed_dt: f32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(RuntimeConfig::new())
    }
}

impl Session {
    pub fn new(config: RuntimeConfig) -> Self {
        let mut world = World::new();
        let fixed_dt = config.fixed_dt;

        world.insert_resource(WorldTime::default().with_time_scale(1.0));
        world.insert_resource(TimerService::new());
        world.insert_resource(Stages::from_config(&config));
        world.insert_resource(ActorIds::default());
        world.insert_non_send_resource(ScriptScheduler::new(config.max_script_steps));
        world.insert_resource(config);

        world.spawn((Observer::new(observe_touch_drag), Persistent));

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                tick_timers,
                sync_spatial_index,
                motion_system,
                run_scripts,
                deliver_host_calls,
            )
                .chain(),
        );
        if let Err(e) = schedule.initialize(&mut world) {
            error!("failed to initialize the tick schedule: {:?}", e);
        }

        Session {
            world,
            schedule,
            fixed_dt,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Advance the simulation by the configured fixed step.
    pub fn tick(&mut self) {
        self.tick_with(self.fixed_dt);
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick_with(&mut self, dt: f32) {
        update_world_time(&mut self.world, dt);
        self.schedule.run(&mut self.world);
        self.world.clear_trackers();
    }

    /// Tick until no program is running, or `max_ticks` ticks went by.
    /// Returns the number of ticks run.
    pub fn run_until_idle(&mut self, max_ticks: u32) -> u32 {
        let mut ticks = 0;
        while ticks < max_ticks && !self.is_idle() {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    pub fn is_idle(&self) -> bool {
        self.world
            .get_non_send_resource::<ScriptScheduler>()
            .is_none_or(|s| s.is_idle())
    }

    /// Report every exercise change to `host` from now on.
    pub fn attach_host(&mut self, host: impl ExerciseHost + 'static) {
        self.world.insert_non_send_resource(HostBridge::new(host));
    }

    pub fn spawn_exercise(&mut self) -> Entity {
        spawn_exercise(&mut self.world)
    }

    pub fn spawn_actor(&mut self, builder: ActorBuilder) -> Entity {
        builder.spawn(&mut self.world)
    }

    /// Start a program. With an `exercise`, its actor commands are recorded
    /// as statements there.
    pub fn run_script(
        &mut self,
        source: impl ScriptSource + 'static,
        exercise: Option<Entity>,
    ) -> ScriptId {
        self.world
            .non_send_resource_mut::<ScriptScheduler>()
            .spawn(source, exercise)
    }

    pub fn script_state(&self, id: ScriptId) -> Option<ScriptState> {
        self.world
            .get_non_send_resource::<ScriptScheduler>()
            .and_then(|s| s.state(id).cloned())
    }

    /// Apply one actor command directly, outside any program.
    pub fn command(&mut self, entity: Entity, cmd: ActorCmd) -> Result<(), ScriptError> {
        apply_actor_command(&mut self.world, entity, cmd)
    }

    pub fn exercise(&self, entity: Entity) -> Option<&Exercise> {
        self.world.get::<Exercise>(entity)
    }

    pub fn report(&self, entity: Entity) -> Option<ExerciseReport> {
        self.exercise(entity)
            .and_then(|e| e.last_report().cloned())
    }

    /// Stop every program, remove every actor that is not persistent and
    /// reset every exercise.
    pub fn clear_actors(&mut self) {
        if let Some(mut scheduler) = self.world.get_non_send_resource_mut::<ScriptScheduler>() {
            scheduler.abort_all();
            let reaped = scheduler.reap();
            debug!("cleared {} scripts", reaped.len());
        }

        let mut actors = self
            .world
            .query_filtered::<Entity, (With<Actor>, Without<Persistent>)>();
        let doomed: Vec<Entity> = actors.iter(&self.world).collect();
        for entity in &doomed {
            teardown_actor(&mut self.world, *entity);
        }

        let mut exercises = self.world.query_filtered::<Entity, With<Exercise>>();
        let exercises: Vec<Entity> = exercises.iter(&self.world).collect();
        for entity in exercises {
            if let Err(e) = clear_exercise(&mut self.world, entity) {
                debug!("exercise {:?} not cleared: {}", entity, e);
            }
        }
        info!("session cleared: {} actors removed", doomed.len());
    }

    pub fn touch(&mut self, identifier: TouchId, x: f32, y: f32) -> TouchReport {
        dispatch_touch(&mut self.world, identifier, Vec2::new(x, y))
    }

    pub fn drag(&mut self, identifier: TouchId, x: f32, y: f32) -> Option<Entity> {
        drag_touch(&mut self.world, identifier, Vec2::new(x, y))
    }

    pub fn release(&mut self, identifier: TouchId, x: f32, y: f32) -> Option<Entity> {
        release_touch(&mut self.world, identifier, Vec2::new(x, y))
    }

    pub fn stages(&self) -> &Stages {
        self.world.resource::<Stages>()
    }

    pub fn stages_mut(&mut self) -> Mut<'_, Stages> {
        self.world.resource_mut::<Stages>()
    }
}
