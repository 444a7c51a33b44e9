//! Lua programs.
//!
//! Each [`LuaScript`] owns its own interpreter. The learner program runs in
//! a coroutine; every write goes through the `engine` table, which only
//! queues a [`ScriptCmd`], and the Lua prelude yields right after. The
//! scheduler applies the queued commands and resumes the coroutine once the
//! touched actor is settled.
//!
//! Reads (`turtle:getX()`, `exercise:hasStatement{...}`) are answered from
//! the [`ScriptView`] refreshed before each resume, so they see the effect
//! of every previous statement.
//!
//! # Example
//!
//! ```lua
//! local t = Turtle.new()
//! t:walk(100)
//! t:rotateRight()
//! t:walk(50)
//! if exercise:hasStatement({ method = "rotateRight" }) then
//!     exercise:done("well done", 1)
//! end
//! ```

use std::cell::{Cell, RefCell};
use std::path::Path;

use log::{debug, error, info, warn};
use mlua::ThreadStatus;
use mlua::prelude::*;
use serde_json::Value;

use super::commands::{
    ActorCmd, ActorKind, EXERCISE_HANDLE, ExerciseCmd, ScriptCmd, ScriptHandle, ScriptTarget,
};
use super::scheduler::{ScriptError, ScriptSource, ScriptStep, ScriptView};
use crate::spatial::Category;

const PRELUDE: &str = include_str!("prelude.lua");

/// Shared state reachable from `engine` functions through Lua app data.
struct LuaAppData {
    commands: RefCell<Vec<ScriptCmd>>,
    view: RefCell<ScriptView>,
    next_handle: Cell<ScriptHandle>,
}

/// Registers a Lua function that queues a command built from its arguments.
macro_rules! register_cmd {
    ($engine:expr, $lua:expr, $name:expr, |$args:pat_param| $arg_ty:ty, $cmd:expr) => {
        $engine.set(
            $name,
            $lua.create_function(|lua, $args: $arg_ty| {
                lua.app_data_ref::<LuaAppData>()
                    .ok_or_else(|| LuaError::runtime("LuaAppData not found"))?
                    .commands
                    .borrow_mut()
                    .push($cmd);
                Ok(())
            })?,
        )?;
    };
}

fn actor(handle: ScriptHandle, cmd: ActorCmd) -> ScriptCmd {
    ScriptCmd::actor(ScriptTarget::Handle(handle), cmd)
}

fn exercise(cmd: ExerciseCmd) -> ScriptCmd {
    ScriptCmd::exercise(ScriptTarget::Handle(EXERCISE_HANDLE), cmd)
}

fn color(c: f64) -> u8 {
    c.clamp(0.0, 255.0) as u8
}

fn mask(bits: u32) -> Option<Category> {
    (bits != 0).then(|| Category::from_bits_truncate(bits))
}

/// Interpreter with the `engine` table and the learner prelude loaded.
pub struct LuaRuntime {
    lua: Lua,
}

impl LuaRuntime {
    /// Creates a new Lua runtime and registers the engine API.
    ///
    /// # Errors
    ///
    /// Returns an error if Lua initialization or API registration fails.
    pub fn new() -> LuaResult<Self> {
        let lua = Lua::new();
        lua.set_app_data(LuaAppData {
            commands: RefCell::new(Vec::new()),
            view: RefCell::new(ScriptView::default()),
            next_handle: Cell::new(EXERCISE_HANDLE + 1),
        });

        let runtime = Self { lua };
        runtime.register_base_api()?;
        runtime.register_actor_api()?;
        runtime.register_exercise_api()?;
        runtime.register_read_api()?;
        runtime.lua.load(PRELUDE).set_name("prelude").exec()?;
        Ok(runtime)
    }

    /// Registers the `engine` table with logging functions.
    fn register_base_api(&self) -> LuaResult<()> {
        let engine = self.lua.create_table()?;

        engine.set(
            "log",
            self.lua.create_function(|_, msg: String| {
                info!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;
        engine.set(
            "log_warn",
            self.lua.create_function(|_, msg: String| {
                warn!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;
        engine.set(
            "log_error",
            self.lua.create_function(|_, msg: String| {
                error!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        self.lua.globals().set("engine", engine)?;
        Ok(())
    }

    fn register_actor_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        // engine.spawn(kind, x, y) -> handle
        engine.set(
            "spawn",
            self.lua
                .create_function(|lua, (kind, x, y): (String, f32, f32)| {
                    let kind = match kind.as_str() {
                        "Turtle" => ActorKind::Turtle,
                        "Sprite" => ActorKind::Sprite,
                        other => {
                            return Err(LuaError::runtime(format!("unknown actor kind {}", other)));
                        }
                    };
                    let data = lua
                        .app_data_ref::<LuaAppData>()
                        .ok_or_else(|| LuaError::runtime("LuaAppData not found"))?;
                    let handle = data.next_handle.get();
                    data.next_handle.set(handle + 1);
                    data.commands
                        .borrow_mut()
                        .push(ScriptCmd::Spawn { handle, kind, x, y });
                    Ok(handle)
                })?,
        )?;

        register_cmd!(engine, self.lua, "walk",
            |(h, d)| (ScriptHandle, f32), actor(h, ActorCmd::Walk(d)));
        register_cmd!(engine, self.lua, "move_to",
            |(h, x, y)| (ScriptHandle, f32, f32), actor(h, ActorCmd::MoveTo { x, y }));
        register_cmd!(engine, self.lua, "rotate",
            |(h, a)| (ScriptHandle, f32), actor(h, ActorCmd::Rotate(a)));
        register_cmd!(engine, self.lua, "rotate_right",
            |h| ScriptHandle, actor(h, ActorCmd::RotateRight));
        register_cmd!(engine, self.lua, "rotate_left",
            |h| ScriptHandle, actor(h, ActorCmd::RotateLeft));
        register_cmd!(engine, self.lua, "rotate_behind",
            |h| ScriptHandle, actor(h, ActorCmd::RotateBehind));
        register_cmd!(engine, self.lua, "set_position",
            |(h, x, y)| (ScriptHandle, f32, f32), actor(h, ActorCmd::SetPosition { x, y }));
        register_cmd!(engine, self.lua, "set_speed",
            |(h, v)| (ScriptHandle, f32), actor(h, ActorCmd::SetSpeed(v)));
        register_cmd!(engine, self.lua, "track_path",
            |(h, on)| (ScriptHandle, bool), actor(h, ActorCmd::TrackPath(on)));
        register_cmd!(engine, self.lua, "color_path",
            |(h, r, g, b)| (ScriptHandle, f64, f64, f64),
            actor(h, ActorCmd::ColorPath([color(r), color(g), color(b)])));
        register_cmd!(engine, self.lua, "path_width",
            |(h, w)| (ScriptHandle, f32), actor(h, ActorCmd::PathWidth(w)));
        register_cmd!(engine, self.lua, "freeze",
            |(h, on)| (ScriptHandle, bool), actor(h, ActorCmd::Freeze(on)));
        register_cmd!(engine, self.lua, "hide",
            |(h, on)| (ScriptHandle, bool), actor(h, ActorCmd::Hide(on)));
        register_cmd!(engine, self.lua, "blocked_by",
            |(h, bits)| (ScriptHandle, u32), actor(h, ActorCmd::BlockedBy(mask(bits))));
        register_cmd!(engine, self.lua, "wait",
            |(h, ms)| (ScriptHandle, f32), actor(h, ActorCmd::Wait(ms)));
        register_cmd!(engine, self.lua, "remove",
            |h| ScriptHandle, actor(h, ActorCmd::Remove));

        Ok(())
    }

    fn register_exercise_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        // Functions taking arbitrary Lua data convert it to JSON first.
        engine.set(
            "exercise_record",
            self.lua.create_function(|lua, statement: LuaValue| {
                let statement: Value = lua.from_value(statement)?;
                push(lua, exercise(ExerciseCmd::Record(statement)))
            })?,
        )?;
        engine.set(
            "exercise_set_statements",
            self.lua.create_function(|lua, statements: LuaValue| {
                let statements: Vec<Value> = lua.from_value(statements)?;
                push(lua, exercise(ExerciseCmd::SetStatements(statements)))
            })?,
        )?;
        engine.set(
            "exercise_set",
            self.lua.create_function(|lua, (name, value): (String, LuaValue)| {
                let value: Value = lua.from_value(value)?;
                push(lua, exercise(ExerciseCmd::Set(name, value)))
            })?,
        )?;
        engine.set(
            "exercise_set_completions",
            self.lua.create_function(|lua, json: LuaValue| {
                let json: Value = lua.from_value(json)?;
                push(lua, exercise(ExerciseCmd::SetCompletions(json)))
            })?,
        )?;

        register_cmd!(engine, self.lua, "exercise_set_source",
            |source| String, exercise(ExerciseCmd::SetSource(source)));
        register_cmd!(engine, self.lua, "exercise_set_score",
            |score| f64, exercise(ExerciseCmd::SetScore(score)));
        register_cmd!(engine, self.lua, "exercise_set_message",
            |message| String, exercise(ExerciseCmd::SetMessage(message)));
        register_cmd!(engine, self.lua, "exercise_set_required_score",
            |score| f64, exercise(ExerciseCmd::SetRequiredScore(score)));
        register_cmd!(engine, self.lua, "exercise_done",
            |(message, score)| (Option<String>, Option<f64>),
            exercise(ExerciseCmd::Done { message, score }));
        register_cmd!(engine, self.lua, "exercise_validate",
            |message| Option<String>, exercise(ExerciseCmd::Validate(message.unwrap_or_default())));
        register_cmd!(engine, self.lua, "exercise_invalidate",
            |message| Option<String>, exercise(ExerciseCmd::Invalidate(message.unwrap_or_default())));
        register_cmd!(engine, self.lua, "exercise_wait",
            |ms| f32, exercise(ExerciseCmd::Wait(ms)));
        register_cmd!(engine, self.lua, "exercise_set_text_mode",
            |()| (), exercise(ExerciseCmd::SetTextMode));
        register_cmd!(engine, self.lua, "exercise_set_program_mode",
            |()| (), exercise(ExerciseCmd::SetProgramMode));
        register_cmd!(engine, self.lua, "exercise_dump_statements",
            |()| (), exercise(ExerciseCmd::DumpStatements));
        register_cmd!(engine, self.lua, "exercise_log",
            |msg| String, exercise(ExerciseCmd::Log(msg)));
        register_cmd!(engine, self.lua, "exercise_debug",
            |msg| String, exercise(ExerciseCmd::Debug(msg)));
        register_cmd!(engine, self.lua, "exercise_clear",
            |()| (), exercise(ExerciseCmd::Clear));

        Ok(())
    }

    /// Read functions answer from the cached [`ScriptView`].
    fn register_read_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        engine.set(
            "get_x",
            self.lua.create_function(|lua, h: ScriptHandle| {
                Ok(with_view(lua, |v| v.actors.get(&h).map(|a| a.x)))
            })?,
        )?;
        engine.set(
            "get_y",
            self.lua.create_function(|lua, h: ScriptHandle| {
                Ok(with_view(lua, |v| v.actors.get(&h).map(|a| a.y)))
            })?,
        )?;
        engine.set(
            "get_heading",
            self.lua.create_function(|lua, h: ScriptHandle| {
                Ok(with_view(lua, |v| v.actors.get(&h).map(|a| a.heading)))
            })?,
        )?;
        engine.set(
            "is_moving",
            self.lua.create_function(|lua, h: ScriptHandle| {
                Ok(with_view(lua, |v| v.actors.get(&h).is_some_and(|a| a.moving)))
            })?,
        )?;
        engine.set(
            "exists",
            self.lua.create_function(|lua, h: ScriptHandle| {
                Ok(with_view(lua, |v| v.actors.contains_key(&h)))
            })?,
        )?;

        engine.set(
            "exercise_get",
            self.lua.create_function(|lua, name: String| {
                // Missing variables read as `false`.
                match with_view(lua, |v| v.exercise.as_ref().and_then(|e| e.get(&name).cloned())) {
                    Some(value) => lua.to_value(&value),
                    None => Ok(LuaValue::Boolean(false)),
                }
            })?,
        )?;
        engine.set(
            "exercise_score",
            self.lua.create_function(|lua, ()| {
                Ok(with_view(lua, |v| v.exercise.as_ref().map(|e| e.score())))
            })?,
        )?;
        engine.set(
            "exercise_statements_length",
            self.lua.create_function(|lua, ()| {
                Ok(with_view(lua, |v| v.exercise.as_ref().map_or(0, |e| e.statements_len())))
            })?,
        )?;
        engine.set(
            "exercise_has_statement",
            self.lua.create_function(|lua, pattern: LuaValue| {
                let pattern: Value = lua.from_value(pattern)?;
                Ok(with_view(lua, |v| v.exercise.as_ref().is_some_and(|e| e.has_statement(&pattern))))
            })?,
        )?;
        engine.set(
            "exercise_verify_pattern",
            self.lua.create_function(|lua, pattern: String| {
                Ok(with_view(lua, |v| v.exercise.as_ref().is_some_and(|e| e.verify_pattern(&pattern))))
            })?,
        )?;
        engine.set(
            "exercise_displayed_classes",
            self.lua.create_function(|lua, ()| {
                Ok(with_view(lua, |v| {
                    v.exercise.as_ref().map(|e| e.displayed_classes()).unwrap_or_default()
                }))
            })?,
        )?;
        engine.set(
            "exercise_displayed_methods",
            self.lua.create_function(|lua, class: String| {
                let methods = with_view(lua, |v| {
                    v.exercise.as_ref().map(|e| e.displayed_methods(&class)).unwrap_or_default()
                });
                lua.to_value(&methods)
            })?,
        )?;

        Ok(())
    }

    fn drain_commands(&self) -> Vec<ScriptCmd> {
        self.lua
            .app_data_ref::<LuaAppData>()
            .map(|data| data.commands.borrow_mut().drain(..).collect())
            .unwrap_or_default()
    }

    fn update_view(&self, view: &ScriptView) {
        if let Some(data) = self.lua.app_data_ref::<LuaAppData>() {
            *data.view.borrow_mut() = view.clone();
        }
    }
}

fn push(lua: &Lua, cmd: ScriptCmd) -> LuaResult<()> {
    lua.app_data_ref::<LuaAppData>()
        .ok_or_else(|| LuaError::runtime("LuaAppData not found"))?
        .commands
        .borrow_mut()
        .push(cmd);
    Ok(())
}

fn with_view<R: Default>(lua: &Lua, f: impl FnOnce(&ScriptView) -> R) -> R {
    lua.app_data_ref::<LuaAppData>()
        .map(|data| f(&data.view.borrow()))
        .unwrap_or_default()
}

/// A learner program running in its own Lua coroutine.
pub struct LuaScript {
    name: String,
    runtime: LuaRuntime,
    thread: LuaThread,
}

impl LuaScript {
    /// Compile `source`. Syntax errors are reported here, before anything runs.
    pub fn new(name: impl Into<String>, source: &str) -> Result<Self, ScriptError> {
        let name = name.into();
        let runtime = LuaRuntime::new()?;
        let main = runtime.lua.load(source).set_name(name.as_str()).into_function()?;
        let thread = runtime.lua.create_thread(main)?;
        Ok(Self {
            name,
            runtime,
            thread,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ScriptError::Runtime(format!("cannot read {}: {}", path.display(), e)))?;
        Self::new(path.display().to_string(), &source)
    }
}

impl ScriptSource for LuaScript {
    fn resume(&mut self, view: &ScriptView) -> Result<ScriptStep, ScriptError> {
        if !matches!(self.thread.status(), ThreadStatus::Resumable) {
            return Ok(ScriptStep::Finished(self.runtime.drain_commands()));
        }
        self.runtime.update_view(view);
        let result = self.thread.resume::<()>(());
        let commands = self.runtime.drain_commands();
        if let Err(e) = result {
            debug!("{} dropped {} queued commands after error", self.name, commands.len());
            return Err(e.into());
        }
        if matches!(self.thread.status(), ThreadStatus::Resumable) {
            Ok(ScriptStep::Yielded(commands))
        } else {
            Ok(ScriptStep::Finished(commands))
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
