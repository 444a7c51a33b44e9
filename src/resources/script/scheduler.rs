//! Cooperative scheduler for learner programs.
//!
//! A program is a [`ScriptSource`] resumed step by step. Each resume
//! returns the commands issued since the previous one. When a command leaves
//! its target actor busy, the program waits until that actor's
//! [`SyncCoordinator`](crate::components::coordinator::SyncCoordinator)
//! settles. That is what makes `walk(50)` look blocking to the learner while
//! the simulation keeps ticking.
//!
//! The scheduler only keeps state. The stepping itself happens in
//! [`run_scripts`](crate::systems::scripts::run_scripts), which has world access.

use std::collections::VecDeque;
use std::fmt;

use bevy_ecs::prelude::Entity;
use log::info;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::commands::{EXERCISE_HANDLE, ScriptCmd, ScriptHandle};
use crate::exercise::Exercise;

/// Read-only state of one bound actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorSnapshot {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub moving: bool,
    pub pending: u32,
}

/// What a program may read while it runs. Refreshed before every resume.
#[derive(Debug, Clone, Default)]
pub struct ScriptView {
    pub actors: FxHashMap<ScriptHandle, ActorSnapshot>,
    pub exercise: Option<Exercise>,
}

#[derive(Debug)]
pub enum ScriptStep {
    /// More to come.
    Yielded(Vec<ScriptCmd>),
    /// Last commands of the program.
    Finished(Vec<ScriptCmd>),
}

#[derive(Debug)]
pub enum ScriptError {
    /// A command named a handle with no bound actor.
    UnknownHandle(ScriptHandle),
    /// A command targeted an entity that does not carry what it needs.
    BadTarget(Entity, &'static str),
    Runtime(String),
    #[cfg(feature = "lua")]
    Lua(mlua::Error),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::UnknownHandle(h) => write!(f, "no actor bound to handle {}", h),
            ScriptError::BadTarget(e, what) => write!(f, "entity {:?} has no {}", e, what),
            ScriptError::Runtime(msg) => write!(f, "{}", msg),
            #[cfg(feature = "lua")]
            ScriptError::Lua(e) => write!(f, "lua: {}", e),
        }
    }
}

impl std::error::Error for ScriptError {}

#[cfg(feature = "lua")]
impl From<mlua::Error> for ScriptError {
    fn from(e: mlua::Error) -> Self {
        ScriptError::Lua(e)
    }
}

/// A learner program that can be resumed.
pub trait ScriptSource {
    fn resume(&mut self, view: &ScriptView) -> Result<ScriptStep, ScriptError>;

    fn name(&self) -> &str {
        "script"
    }
}

/// Fixed list of commands, one per resume.
#[derive(Debug, Default)]
pub struct StatementList {
    name: String,
    commands: VecDeque<ScriptCmd>,
}

impl StatementList {
    pub fn new(commands: impl IntoIterator<Item = ScriptCmd>) -> Self {
        Self {
            name: "statements".to_string(),
            commands: commands.into_iter().collect(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl ScriptSource for StatementList {
    fn resume(&mut self, _view: &ScriptView) -> Result<ScriptStep, ScriptError> {
        match self.commands.pop_front() {
            Some(cmd) if self.commands.is_empty() => Ok(ScriptStep::Finished(vec![cmd])),
            Some(cmd) => Ok(ScriptStep::Yielded(vec![cmd])),
            None => Ok(ScriptStep::Finished(Vec::new())),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptState {
    Running,
    Finished,
    /// An awaited actor was removed.
    Aborted,
    Failed(String),
}

impl ScriptState {
    pub fn is_done(&self) -> bool {
        !matches!(self, ScriptState::Running)
    }
}

pub(crate) struct ScriptSlot {
    pub(crate) id: ScriptId,
    pub(crate) source: Box<dyn ScriptSource>,
    pub(crate) bindings: FxHashMap<ScriptHandle, Entity>,
    pub(crate) awaiting: SmallVec<[Entity; 2]>,
    pub(crate) state: ScriptState,
}

/// NonSend resource holding every program of the session.
pub struct ScriptScheduler {
    next_id: u32,
    pub(crate) slots: Vec<ScriptSlot>,
    pub max_steps_per_tick: u32,
}

impl Default for ScriptScheduler {
    fn default() -> Self {
        Self::new(64)
    }
}

impl ScriptScheduler {
    pub fn new(max_steps_per_tick: u32) -> Self {
        Self {
            next_id: 0,
            slots: Vec::new(),
            max_steps_per_tick: max_steps_per_tick.max(1),
        }
    }

    /// Queue a program. `exercise` is bound to [`EXERCISE_HANDLE`] so the
    /// program can reach it and its actor commands are recorded as statements.
    pub fn spawn(&mut self, source: impl ScriptSource + 'static, exercise: Option<Entity>) -> ScriptId {
        self.next_id += 1;
        let id = ScriptId(self.next_id);
        let mut bindings = FxHashMap::default();
        if let Some(entity) = exercise {
            bindings.insert(EXERCISE_HANDLE, entity);
        }
        info!("starting {} as script {}", source.name(), id.0);
        self.slots.push(ScriptSlot {
            id,
            source: Box::new(source),
            bindings,
            awaiting: SmallVec::new(),
            state: ScriptState::Running,
        });
        id
    }

    /// Bind `handle` to `entity` for script `id`.
    pub fn bind(&mut self, id: ScriptId, handle: ScriptHandle, entity: Entity) -> bool {
        match self.slots.iter_mut().find(|s| s.id == id) {
            Some(slot) => {
                slot.bindings.insert(handle, entity);
                true
            }
            None => false,
        }
    }

    pub fn state(&self, id: ScriptId) -> Option<&ScriptState> {
        self.slots.iter().find(|s| s.id == id).map(|s| &s.state)
    }

    pub fn awaiting(&self, id: ScriptId) -> &[Entity] {
        self.slots
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.awaiting.as_slice())
            .unwrap_or(&[])
    }

    pub fn running_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.state.is_done()).count()
    }

    pub fn is_idle(&self) -> bool {
        self.running_count() == 0
    }

    /// Drop finished programs. Returns their final states.
    pub fn reap(&mut self) -> Vec<(ScriptId, ScriptState)> {
        let mut done = Vec::new();
        self.slots.retain(|s| {
            if s.state.is_done() {
                done.push((s.id, s.state.clone()));
                false
            } else {
                true
            }
        });
        done
    }

    /// Abort every program. Used when the session is cleared.
    pub fn abort_all(&mut self) {
        for slot in &mut self.slots {
            if !slot.state.is_done() {
                slot.state = ScriptState::Aborted;
            }
        }
    }
}
