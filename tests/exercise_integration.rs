//! Exercise integration tests: statements recorded from a running program,
//! verdict delivery to the host, waits and clearing.

use learnstage::exercise::{ExercisePhase, HostCall, RecordingHost};
use learnstage::resources::runtimeconfig::RuntimeConfig;
use learnstage::resources::script::{
    ActorCmd, ActorKind, EXERCISE_HANDLE, ExerciseCmd, ScriptCmd, ScriptState, ScriptTarget,
    StatementList,
};
use learnstage::resources::timers::TimerService;
use learnstage::session::Session;
use serde_json::json;

const DT: f32 = 0.125;

fn spawn_turtle() -> ScriptCmd {
    ScriptCmd::Spawn {
        handle: 1,
        kind: ActorKind::Turtle,
        x: 50.0,
        y: 50.0,
    }
}

fn turtle(cmd: ActorCmd) -> ScriptCmd {
    ScriptCmd::actor(ScriptTarget::Handle(1), cmd)
}

fn exercise(cmd: ExerciseCmd) -> ScriptCmd {
    ScriptCmd::exercise(ScriptTarget::Handle(EXERCISE_HANDLE), cmd)
}

fn done(score: Option<f64>, message: &str) -> ScriptCmd {
    exercise(ExerciseCmd::Done {
        message: Some(message.to_string()),
        score,
    })
}

#[test]
fn test_program_statements_are_recorded_and_validated() {
    let mut session = Session::default();
    let host = RecordingHost::new();
    session.attach_host(host.clone());
    let ex = session.spawn_exercise();
    let id = session.run_script(
        StatementList::new([
            spawn_turtle(),
            turtle(ActorCmd::Walk(100.0)),
            turtle(ActorCmd::RotateRight),
            turtle(ActorCmd::Walk(50.0)),
            done(Some(1.0), "well done"),
        ]),
        Some(ex),
    );

    session.run_until_idle(1_000);
    assert_eq!(session.script_state(id), Some(ScriptState::Finished));

    let exercise = session.exercise(ex).unwrap();
    assert_eq!(exercise.statements_len(), 3);
    assert!(exercise.has_statement(&json!({
        "type": "CallExpression",
        "object": "Turtle",
        "method": "walk",
        "arguments": [50]
    })));
    assert!(exercise.has_statement(&json!({"method": "rotateRight"})));
    assert!(!exercise.has_statement(&json!({"method": "rotateLeft"})));
    assert_eq!(exercise.phase(), ExercisePhase::Validated);

    assert_eq!(
        host.calls(),
        vec![
            HostCall::SetScore(1.0),
            HostCall::ValidateExercise("well done".to_string())
        ]
    );
}

#[test]
fn test_repeated_done_reports_once_until_the_outcome_changes() {
    let mut session = Session::default();
    let host = RecordingHost::new();
    session.attach_host(host.clone());
    let ex = session.spawn_exercise();
    session.run_script(
        StatementList::new([
            done(Some(1.0), "ok"),
            done(Some(1.0), "ok"),
            exercise(ExerciseCmd::SetScore(0.5)),
            done(None, "ok"),
        ]),
        Some(ex),
    );
    session.run_until_idle(100);

    assert_eq!(
        host.calls(),
        vec![
            HostCall::SetScore(1.0),
            HostCall::ValidateExercise("ok".to_string()),
            HostCall::SetScore(0.5),
            HostCall::InvalidateExercise("ok".to_string()),
        ]
    );
    assert_eq!(
        host.last_verdict(),
        Some(HostCall::InvalidateExercise("ok".to_string()))
    );
    let report = session.report(ex).unwrap();
    assert!(!report.passed);
    assert_eq!(report.score, 0.5);
}

#[test]
fn test_statements_after_verdict_are_ignored() {
    let mut session = Session::default();
    let ex = session.spawn_exercise();
    session.run_script(
        StatementList::new([
            spawn_turtle(),
            turtle(ActorCmd::Walk(10.0)),
            done(Some(1.0), "done"),
            turtle(ActorCmd::Walk(10.0)),
        ]),
        Some(ex),
    );
    session.run_until_idle(1_000);
    assert_eq!(session.exercise(ex).unwrap().statements_len(), 1);
}

#[test]
fn test_exercise_wait_blocks_the_program() {
    let mut session = Session::default();
    let ex = session.spawn_exercise();
    let id = session.run_script(
        StatementList::new([
            exercise(ExerciseCmd::Wait(250.0)),
            exercise(ExerciseCmd::SetScore(1.0)),
            done(None, "waited"),
        ]),
        Some(ex),
    );

    session.tick_with(DT);
    assert_eq!(
        session.exercise(ex).unwrap().phase(),
        ExercisePhase::AwaitingResult
    );
    session.tick_with(DT);
    assert_eq!(session.script_state(id), Some(ScriptState::Running));

    session.tick_with(DT);
    assert_eq!(session.script_state(id), Some(ScriptState::Finished));
    assert_eq!(session.exercise(ex).unwrap().phase(), ExercisePhase::Validated);
}

#[test]
fn test_clear_cancels_wait_and_keeps_required_score() {
    let mut session = Session::default();
    let ex = session.spawn_exercise();
    let id = session.run_script(
        StatementList::new([
            exercise(ExerciseCmd::SetRequiredScore(2.0)),
            exercise(ExerciseCmd::Set("lives".to_string(), json!(3))),
            exercise(ExerciseCmd::Wait(10_000.0)),
            done(Some(5.0), "never"),
        ]),
        Some(ex),
    );
    session.tick_with(DT);
    assert_eq!(session.world().resource::<TimerService>().len(), 1);

    session.clear_actors();

    assert!(session.world().resource::<TimerService>().is_empty());
    assert_eq!(session.script_state(id), None);
    let exercise = session.exercise(ex).unwrap();
    assert_eq!(exercise.phase(), ExercisePhase::Collecting);
    assert_eq!(exercise.required_score(), 2.0);
    assert!(exercise.get("lives").is_none());
    assert!(exercise.wait_timer().is_none());
}

#[test]
fn test_required_score_comes_from_config() {
    let mut config = RuntimeConfig::new();
    config.required_score = 3.0;
    let mut session = Session::new(config);
    let host = RecordingHost::new();
    session.attach_host(host.clone());
    let ex = session.spawn_exercise();
    session.run_script(StatementList::new([done(Some(2.0), "close")]), Some(ex));
    session.run_until_idle(10);

    assert_eq!(
        host.last_verdict(),
        Some(HostCall::InvalidateExercise("close".to_string()))
    );
}

#[test]
fn test_mode_switches_reach_host_in_order() {
    let mut session = Session::default();
    let host = RecordingHost::new();
    session.attach_host(host.clone());
    let ex = session.spawn_exercise();
    session.run_script(
        StatementList::new([
            exercise(ExerciseCmd::SetTextMode),
            exercise(ExerciseCmd::Validate("by hand".to_string())),
            exercise(ExerciseCmd::SetProgramMode),
        ]),
        Some(ex),
    );
    session.run_until_idle(10);

    assert_eq!(
        host.calls(),
        vec![
            HostCall::SetTextMode,
            HostCall::ValidateExercise("by hand".to_string()),
            HostCall::SetProgramMode,
        ]
    );
}

#[test]
fn test_calls_without_host_are_dropped() {
    let mut session = Session::default();
    let ex = session.spawn_exercise();
    session.run_script(StatementList::new([done(Some(1.0), "alone")]), Some(ex));
    session.run_until_idle(10);

    let exercise = session.exercise(ex).unwrap();
    assert!(!exercise.has_outbox());
    assert_eq!(exercise.phase(), ExercisePhase::Validated);
}

#[test]
fn test_verify_pattern_falls_back_to_statements() {
    let mut session = Session::default();
    let ex = session.spawn_exercise();
    session.run_script(
        StatementList::new([spawn_turtle(), turtle(ActorCmd::RotateBehind)]),
        Some(ex),
    );
    session.run_until_idle(10);

    let exercise = session.exercise(ex).unwrap();
    assert!(exercise.verify_pattern(r#""method":"rotateBehind""#));
    assert!(!exercise.verify_pattern("walk"));
}
