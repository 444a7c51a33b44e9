//! Lua program integration tests.
//!
//! Each test runs a small learner program through a [`Session`] and checks
//! what it did to the actors and the exercise.
#![cfg(feature = "lua")]

use learnstage::exercise::{ExercisePhase, HostCall, RecordingHost};
use learnstage::resources::script::{LuaScript, ScriptState};
use learnstage::session::Session;

fn run(source: &str) -> (Session, bevy_ecs::entity::Entity, RecordingHost, ScriptState) {
    let mut session = Session::default();
    let host = RecordingHost::new();
    session.attach_host(host.clone());
    let ex = session.spawn_exercise();
    let script = LuaScript::new("lesson.lua", source).unwrap();
    let id = session.run_script(script, Some(ex));
    session.run_until_idle(5_000);
    let state = session.script_state(id).unwrap();
    (session, ex, host, state)
}

fn number(session: &Session, ex: bevy_ecs::entity::Entity, name: &str) -> f64 {
    session
        .exercise(ex)
        .unwrap()
        .get(name)
        .and_then(|v| v.as_f64())
        .unwrap()
}

#[test]
fn test_turtle_program_blocks_on_each_walk() {
    let (session, ex, host, state) = run(r#"
        local t = Turtle.new()
        t:walk(100)
        exercise:set("after_first", t:getX())
        t:rotateRight()
        t:walk(50)
        exercise:set("x", t:getX())
        exercise:set("y", t:getY())
        exercise:set("heading", t:getHeading())
        if exercise:hasStatement({ method = "walk", arguments = { 50 } }) then
            exercise:done("square started", 1)
        else
            exercise:done("missing walk", 0)
        end
    "#);

    assert_eq!(state, ScriptState::Finished);
    assert!((number(&session, ex, "after_first") - 150.0).abs() < 1e-3);
    assert!((number(&session, ex, "x") - 150.0).abs() < 1e-3);
    assert!((number(&session, ex, "y") - 100.0).abs() < 1e-3);
    assert!((number(&session, ex, "heading") - 180.0).abs() < 1e-3);
    assert_eq!(session.exercise(ex).unwrap().statements_len(), 3);
    assert_eq!(
        host.last_verdict(),
        Some(HostCall::ValidateExercise("square started".to_string()))
    );
}

#[test]
fn test_missing_variable_reads_false() {
    let (session, ex, _, state) = run(r#"
        if exercise:get("nope") == false then
            exercise:set("seen", 1)
        end
        exercise:set("list", { 1, 2, 3 })
        local list = exercise:get("list")
        exercise:set("second", list[2])
    "#);

    assert_eq!(state, ScriptState::Finished);
    assert_eq!(number(&session, ex, "seen"), 1.0);
    assert_eq!(number(&session, ex, "second"), 2.0);
}

#[test]
fn test_score_accumulates_before_done() {
    let (session, ex, host, _) = run(r#"
        exercise:setRequiredScore(2)
        exercise:setScore(exercise:getScore() + 1)
        exercise:setScore(exercise:getScore() + 1)
        exercise:setMessage("two points")
        exercise:done()
    "#);

    assert_eq!(session.exercise(ex).unwrap().phase(), ExercisePhase::Validated);
    assert_eq!(
        host.calls(),
        vec![
            HostCall::SetScore(2.0),
            HostCall::ValidateExercise("two points".to_string())
        ]
    );
}

#[test]
fn test_verify_regexp_checks_source() {
    let (session, ex, _, _) = run(r#"
        exercise:setSource("for i = 1, 4 do t:walk(10) end")
        exercise:set("loop", exercise:verifyRegexp("for%s*i") and 1 or 0)
        exercise:set("regex", exercise:verifyRegexp([[for\s+i\s*=]]) and 1 or 0)
    "#);

    assert_eq!(number(&session, ex, "loop"), 0.0);
    assert_eq!(number(&session, ex, "regex"), 1.0);
}

#[test]
fn test_wait_takes_simulated_time() {
    let mut session = Session::default();
    let script = LuaScript::new(
        "wait.lua",
        r#"
        local s = Sprite.new(10, 10)
        s:wait(500)
        s:hide()
    "#,
    )
    .unwrap();
    session.run_script(script, None);
    let ticks = session.run_until_idle(5_000);
    // 500 ms at the default 16 ms step.
    assert!(ticks >= 31, "finished after only {} ticks", ticks);
    assert!(session.is_idle());
}

#[test]
fn test_runtime_error_fails_the_program() {
    let (session, ex, _, state) = run(r#"
        local t = Turtle.new()
        t:walk(10)
        error("boom")
    "#);

    match state {
        ScriptState::Failed(message) => assert!(message.contains("boom")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(session.exercise(ex).unwrap().statements_len(), 1);
}

#[test]
fn test_deleted_actor_no_longer_exists() {
    let (session, ex, _, state) = run(r#"
        local s = Sprite.new()
        s:delete()
        exercise:set("exists", s:exists() and 1 or 0)
    "#);

    assert_eq!(state, ScriptState::Finished);
    assert_eq!(number(&session, ex, "exists"), 0.0);
}

#[test]
fn test_syntax_error_is_reported_before_running() {
    assert!(LuaScript::new("bad.lua", "local = 1").is_err());
}
