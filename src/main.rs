//! learnstage main entry point.
//!
//! Runs one learner program headless:
//! - **bevy_ecs** holds actors, stages and the exercise
//! - **mlua + LuaJIT** runs the learner program as a coroutine
//!
//! # Main Loop
//!
//! 1. Load `learnstage.ini` (or `--config`), falling back to defaults
//! 2. Build a session, spawn the exercise and attach a recording host
//! 3. Start the program and tick until it is done or `--max-ticks` ran out
//! 4. Print every host call and the final exercise report
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- lesson.lua
//! ```

use clap::Parser;
use std::path::PathBuf;

use learnstage::exercise::{HostCall, RecordingHost};
use learnstage::resources::runtimeconfig::RuntimeConfig;
use learnstage::resources::script::{LuaScript, ScriptState};
use learnstage::session::Session;

/// learnstage headless runner
#[derive(Parser)]
#[command(version, about = "Runs a learner program against an exercise and prints the verdict.")]
struct Cli {
    /// Lua program to run.
    #[arg(value_name = "SCRIPT.lua")]
    script: PathBuf,

    /// INI file with runtime settings (default: ./learnstage.ini).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Give up after this many ticks.
    #[arg(long, value_name = "N", default_value_t = 100_000)]
    max_ticks: u32,

    /// Score the exercise needs to pass, overriding the config file.
    #[arg(long, value_name = "S")]
    required_score: Option<f64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(path) => RuntimeConfig::with_path(path),
        None => RuntimeConfig::new(),
    };
    config.load_from_file().ok(); // ignore errors, use defaults
    if let Some(score) = cli.required_score {
        config.required_score = score;
    }

    let script = match LuaScript::from_file(&cli.script) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("Error loading {}: {e}", cli.script.display());
            std::process::exit(2);
        }
    };

    let mut session = Session::new(config);
    let host = RecordingHost::new();
    session.attach_host(host.clone());
    let exercise = session.spawn_exercise();
    let id = session.run_script(script, Some(exercise));

    let ticks = session.run_until_idle(cli.max_ticks);
    log::info!("ran {} ticks", ticks);

    for call in host.calls() {
        match call {
            HostCall::SetScore(score) => println!("setScore({score})"),
            HostCall::ValidateExercise(message) => println!("validateExercise({message:?})"),
            HostCall::InvalidateExercise(message) => println!("invalidateExercise({message:?})"),
            HostCall::SetTextMode => println!("setTextMode()"),
            HostCall::SetProgramMode => println!("setProgramMode()"),
        }
    }

    match session.script_state(id) {
        Some(ScriptState::Failed(e)) => eprintln!("program failed: {e}"),
        Some(ScriptState::Running) => eprintln!("program still running after {ticks} ticks"),
        _ => {}
    }

    match session.report(exercise) {
        Some(report) => {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("Error printing report: {e}"),
            }
            if !report.passed {
                std::process::exit(1);
            }
        }
        None => {
            println!("no verdict");
            std::process::exit(1);
        }
    }
}
