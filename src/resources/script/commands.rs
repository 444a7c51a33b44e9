//! Commands a learner program issues.
//!
//! Script sources never touch the world. They return [`ScriptCmd`]s which
//! [`apply_script_command`](crate::systems::script_commands::apply_script_command)
//! executes against the target actor. Actors are addressed either by entity
//! (programs built in Rust) or by a script-local handle (Lua programs),
//! resolved through the script's bindings.

use bevy_ecs::prelude::Entity;
use serde_json::{Value, json};

use crate::spatial::Category;

/// Script-local name of an actor. Handle 0 is the exercise.
pub type ScriptHandle = u32;

pub const EXERCISE_HANDLE: ScriptHandle = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptTarget {
    Entity(Entity),
    Handle(ScriptHandle),
}

impl From<Entity> for ScriptTarget {
    fn from(entity: Entity) -> Self {
        ScriptTarget::Entity(entity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Turtle,
    Sprite,
}

impl ActorKind {
    pub fn class_name(self) -> &'static str {
        match self {
            ActorKind::Turtle => "Turtle",
            ActorKind::Sprite => "Sprite",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActorCmd {
    /// Blocks until the actor arrives.
    Walk(f32),
    /// Blocks until the actor arrives.
    MoveTo { x: f32, y: f32 },
    Rotate(f32),
    RotateRight,
    RotateLeft,
    RotateBehind,
    SetPosition { x: f32, y: f32 },
    SetSpeed(f32),
    TrackPath(bool),
    ColorPath([u8; 3]),
    PathWidth(f32),
    Freeze(bool),
    Hide(bool),
    BlockedBy(Option<Category>),
    /// Blocks for the given milliseconds.
    Wait(f32),
    Remove,
}

impl ActorCmd {
    pub fn method_name(&self) -> &'static str {
        match self {
            ActorCmd::Walk(_) => "walk",
            ActorCmd::MoveTo { .. } => "moveTo",
            ActorCmd::Rotate(_) => "rotate",
            ActorCmd::RotateRight => "rotateRight",
            ActorCmd::RotateLeft => "rotateLeft",
            ActorCmd::RotateBehind => "rotateBehind",
            ActorCmd::SetPosition { .. } => "setLocation",
            ActorCmd::SetSpeed(_) => "setVelocity",
            ActorCmd::TrackPath(true) => "trackPath",
            ActorCmd::TrackPath(false) => "untrackPath",
            ActorCmd::ColorPath(_) => "colorPath",
            ActorCmd::PathWidth(_) => "pathWidth",
            ActorCmd::Freeze(_) => "freeze",
            ActorCmd::Hide(true) => "hide",
            ActorCmd::Hide(false) => "show",
            ActorCmd::BlockedBy(_) => "blockedBy",
            ActorCmd::Wait(_) => "wait",
            ActorCmd::Remove => "delete",
        }
    }

    fn arguments(&self) -> Value {
        match self {
            ActorCmd::Walk(d) => json!([d]),
            ActorCmd::MoveTo { x, y } | ActorCmd::SetPosition { x, y } => json!([x, y]),
            ActorCmd::Rotate(a) => json!([a]),
            ActorCmd::SetSpeed(v) | ActorCmd::PathWidth(v) | ActorCmd::Wait(v) => json!([v]),
            ActorCmd::ColorPath([r, g, b]) => json!([r, g, b]),
            ActorCmd::Freeze(f) => json!([f]),
            ActorCmd::BlockedBy(mask) => json!([mask.map_or(0, |m| m.bits())]),
            _ => json!([]),
        }
    }

    /// Statement recorded for the exercise when a program runs this command
    /// on an actor of class `class_name`.
    pub fn statement(&self, class_name: &str) -> Value {
        json!({
            "type": "CallExpression",
            "object": class_name,
            "method": self.method_name(),
            "arguments": self.arguments(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExerciseCmd {
    Record(Value),
    SetStatements(Vec<Value>),
    SetSource(String),
    SetScore(f64),
    SetMessage(String),
    SetRequiredScore(f64),
    Done {
        message: Option<String>,
        score: Option<f64>,
    },
    Validate(String),
    Invalidate(String),
    /// Blocks for the given milliseconds.
    Wait(f32),
    Set(String, Value),
    SetTextMode,
    SetProgramMode,
    SetCompletions(Value),
    DumpStatements,
    Log(String),
    Debug(String),
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCmd {
    Actor {
        target: ScriptTarget,
        cmd: ActorCmd,
    },
    Exercise {
        target: ScriptTarget,
        cmd: ExerciseCmd,
    },
    /// Create an actor and bind it to `handle` for the issuing script.
    Spawn {
        handle: ScriptHandle,
        kind: ActorKind,
        x: f32,
        y: f32,
    },
}

impl ScriptCmd {
    pub fn actor(target: impl Into<ScriptTarget>, cmd: ActorCmd) -> Self {
        ScriptCmd::Actor {
            target: target.into(),
            cmd,
        }
    }

    pub fn exercise(target: impl Into<ScriptTarget>, cmd: ExerciseCmd) -> Self {
        ScriptCmd::Exercise {
            target: target.into(),
            cmd,
        }
    }
}
