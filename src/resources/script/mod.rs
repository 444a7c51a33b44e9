//! Learner program execution.
//!
//! - [`commands`] – what a program can ask of actors and the exercise
//! - [`scheduler`] – resumable program sources and the cooperative scheduler
//! - `lua` – Lua programs (requires the `lua` feature)

pub mod commands;
#[cfg(feature = "lua")]
pub mod lua;
pub mod scheduler;

pub use commands::{
    ActorCmd, ActorKind, EXERCISE_HANDLE, ExerciseCmd, ScriptCmd, ScriptHandle, ScriptTarget,
};
#[cfg(feature = "lua")]
pub use lua::{LuaRuntime, LuaScript};
pub use scheduler::{
    ActorSnapshot, ScriptError, ScriptId, ScriptScheduler, ScriptSource, ScriptState, ScriptStep,
    ScriptView, StatementList,
};
