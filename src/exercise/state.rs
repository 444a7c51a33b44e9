//! Exercise validation state.
//!
//! An [`Exercise`] lives on its own entity next to a
//! [`SyncCoordinator`](crate::components::coordinator::SyncCoordinator) so
//! that `wait` can block the learner program like any actor command. It
//! collects the statements the learner ran, offers a few checks over them and
//! finally turns a score into a verdict for the host.
//!
//! Host calls are not delivered from here. They are queued in an outbox and
//! drained by [`deliver_host_calls`](crate::systems::exercise::deliver_host_calls).

use bevy_ecs::prelude::Component;
use log::{debug, info, warn};
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;

use super::completions::{Completions, MethodCompletion};
use super::host::HostCall;
use super::matching::contains;
use crate::resources::timers::TimerHandle;

pub const DEFAULT_REQUIRED_SCORE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ExercisePhase {
    #[default]
    Collecting,
    /// A `wait` is pending.
    AwaitingResult,
    Validated,
    Invalidated,
}

impl ExercisePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExercisePhase::Validated | ExercisePhase::Invalidated)
    }
}

/// Verdict last sent to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseReport {
    pub score: f64,
    pub passed: bool,
    pub message: String,
}

#[derive(Component, Debug, Clone)]
pub struct Exercise {
    statements: Vec<Value>,
    source: String,
    score: f64,
    required_score: f64,
    message: String,
    values: FxHashMap<String, Value>,
    completions: Completions,
    phase: ExercisePhase,
    last_report: Option<ExerciseReport>,
    outbox: Vec<HostCall>,
    wait_timer: Option<TimerHandle>,
}

impl Default for Exercise {
    fn default() -> Self {
        Self::new()
    }
}

impl Exercise {
    pub fn new() -> Self {
        Self {
            statements: Vec::new(),
            source: String::new(),
            score: 0.0,
            required_score: DEFAULT_REQUIRED_SCORE,
            message: String::new(),
            values: FxHashMap::default(),
            completions: Completions::default(),
            phase: ExercisePhase::Collecting,
            last_report: None,
            outbox: Vec::new(),
            wait_timer: None,
        }
    }

    pub fn phase(&self) -> ExercisePhase {
        self.phase
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn required_score(&self) -> f64 {
        self.required_score
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn last_report(&self) -> Option<&ExerciseReport> {
        self.last_report.as_ref()
    }

    pub fn wait_timer(&self) -> Option<TimerHandle> {
        self.wait_timer
    }

    // --- statements -------------------------------------------------------

    /// Append one executed statement. Ignored once a verdict was given.
    pub fn record_statement(&mut self, statement: Value) {
        if self.phase.is_terminal() {
            debug!("exercise already {:?}, statement ignored", self.phase);
            return;
        }
        self.statements.push(statement);
    }

    pub fn set_statements(&mut self, statements: Vec<Value>) {
        self.statements = statements;
    }

    pub fn statements(&self) -> &[Value] {
        &self.statements
    }

    pub fn statements_len(&self) -> usize {
        self.statements.len()
    }

    /// True when at least one recorded statement structurally contains `pattern`.
    pub fn has_statement(&self, pattern: &Value) -> bool {
        self.statements.iter().any(|s| contains(s, pattern))
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    /// Regex test over the learner's source text, or over the serialized
    /// statements when no source was given. An invalid pattern never matches.
    pub fn verify_pattern(&self, pattern: &str) -> bool {
        let re = match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                warn!("invalid exercise pattern {:?}: {}", pattern, e);
                return false;
            }
        };
        if !self.source.is_empty() {
            return re.is_match(&self.source);
        }
        match serde_json::to_string(&self.statements) {
            Ok(text) => re.is_match(&text),
            Err(e) => {
                warn!("could not serialize statements: {}", e);
                false
            }
        }
    }

    pub fn dump_statements(&self) {
        for (i, s) in self.statements.iter().enumerate() {
            debug!(target: "exercise", "[{}] {}", i, s);
        }
    }

    // --- scoring ----------------------------------------------------------

    pub fn set_score(&mut self, score: f64) {
        self.score = score;
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn set_required_score(&mut self, required: f64) {
        self.required_score = required;
    }

    pub fn validate(&mut self, message: impl Into<String>) {
        self.conclude(true, message.into(), false);
    }

    pub fn invalidate(&mut self, message: impl Into<String>) {
        self.conclude(false, message.into(), false);
    }

    /// Turn the current score into a verdict.
    ///
    /// `message` and `score` overwrite the stored values when given. The
    /// host receives the score then the verdict, unless the resulting report
    /// is identical to the last one it got.
    pub fn done(&mut self, message: Option<String>, score: Option<f64>) -> ExerciseReport {
        if let Some(score) = score {
            self.score = score;
        }
        if let Some(message) = message {
            self.message = message;
        }
        let passed = self.score >= self.required_score;
        self.conclude(passed, self.message.clone(), true)
    }

    fn conclude(&mut self, passed: bool, message: String, with_score: bool) -> ExerciseReport {
        let report = ExerciseReport {
            score: self.score,
            passed,
            message,
        };
        self.phase = if passed {
            ExercisePhase::Validated
        } else {
            ExercisePhase::Invalidated
        };
        if self.last_report.as_ref() == Some(&report) {
            debug!("exercise report unchanged, host not notified again");
            return report;
        }
        if with_score {
            self.outbox.push(HostCall::SetScore(report.score));
        }
        self.outbox.push(if passed {
            HostCall::ValidateExercise(report.message.clone())
        } else {
            HostCall::InvalidateExercise(report.message.clone())
        });
        info!(
            "exercise {} (score {} / {})",
            if passed { "validated" } else { "invalidated" },
            report.score,
            self.required_score
        );
        self.last_report = Some(report.clone());
        report
    }

    // --- wait -------------------------------------------------------------

    /// Remember the timer of a pending `wait`. The caller already called
    /// `begin()` on the coordinator.
    pub fn begin_wait(&mut self, timer: TimerHandle) {
        self.wait_timer = Some(timer);
        if !self.phase.is_terminal() {
            self.phase = ExercisePhase::AwaitingResult;
        }
    }

    /// Called by the timer system when `timer` fired. Unrelated handles are ignored.
    pub fn wait_elapsed(&mut self, timer: TimerHandle) -> bool {
        if self.wait_timer != Some(timer) {
            return false;
        }
        self.wait_timer = None;
        if self.phase == ExercisePhase::AwaitingResult {
            self.phase = ExercisePhase::Collecting;
        }
        true
    }

    // --- working variables ------------------------------------------------

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    // --- host modes and completions ---------------------------------------

    pub fn set_text_mode(&mut self) {
        self.outbox.push(HostCall::SetTextMode);
    }

    pub fn set_program_mode(&mut self) {
        self.outbox.push(HostCall::SetProgramMode);
    }

    pub fn set_completions(&mut self, json: Value) {
        self.completions = Completions::from_value(json);
    }

    pub fn displayed_classes(&self) -> Vec<String> {
        self.completions.displayed_classes()
    }

    pub fn displayed_methods(&self, class: &str) -> Vec<MethodCompletion> {
        self.completions.displayed_methods(class)
    }

    // --- lifecycle --------------------------------------------------------

    /// Reset to a fresh exercise. Returns the pending wait timer, which the
    /// caller must cancel before settling the coordinator.
    ///
    /// Required score and completions are authoring data and survive.
    pub fn clear(&mut self) -> Option<TimerHandle> {
        let timer = self.wait_timer.take();
        self.statements.clear();
        self.source.clear();
        self.score = 0.0;
        self.message.clear();
        self.values.clear();
        self.phase = ExercisePhase::Collecting;
        self.last_report = None;
        self.outbox.clear();
        timer
    }

    /// Drain queued host calls.
    pub fn take_outbox(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.outbox)
    }

    pub fn has_outbox(&self) -> bool {
        !self.outbox.is_empty()
    }
}
