//! Host-facing side of an exercise.
//!
//! The exercise never talks to the hosting frame directly. It queues
//! [`HostCall`]s, and [`deliver_host_calls`](crate::systems::exercise::deliver_host_calls)
//! forwards them to whatever [`ExerciseHost`] the session was given.

use std::cell::RefCell;
use std::rc::Rc;

use log::info;

/// A call the exercise wants the host to receive.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    SetScore(f64),
    ValidateExercise(String),
    InvalidateExercise(String),
    SetTextMode,
    SetProgramMode,
}

/// The frame embedding the learning environment.
///
/// Implementations must not panic and should tolerate repeated calls.
pub trait ExerciseHost {
    fn set_score(&mut self, score: f64);
    fn validate_exercise(&mut self, message: &str);
    fn invalidate_exercise(&mut self, message: &str);
    fn set_text_mode(&mut self);
    fn set_program_mode(&mut self);

    fn deliver(&mut self, call: &HostCall) {
        match call {
            HostCall::SetScore(score) => self.set_score(*score),
            HostCall::ValidateExercise(message) => self.validate_exercise(message),
            HostCall::InvalidateExercise(message) => self.invalidate_exercise(message),
            HostCall::SetTextMode => self.set_text_mode(),
            HostCall::SetProgramMode => self.set_program_mode(),
        }
    }
}

/// Host that records every call into a shared list.
///
/// Clones share the same list, so a test can keep one clone and hand the
/// other to the session.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    calls: Rc<RefCell<Vec<HostCall>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    /// Last validate/invalidate call, if any.
    pub fn last_verdict(&self) -> Option<HostCall> {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find(|c| {
                matches!(
                    c,
                    HostCall::ValidateExercise(_) | HostCall::InvalidateExercise(_)
                )
            })
            .cloned()
    }

    fn push(&mut self, call: HostCall) {
        info!(target: "host", "{:?}", call);
        self.calls.borrow_mut().push(call);
    }
}

impl ExerciseHost for RecordingHost {
    fn set_score(&mut self, score: f64) {
        self.push(HostCall::SetScore(score));
    }
    fn validate_exercise(&mut self, message: &str) {
        self.push(HostCall::ValidateExercise(message.to_string()));
    }
    fn invalidate_exercise(&mut self, message: &str) {
        self.push(HostCall::InvalidateExercise(message.to_string()));
    }
    fn set_text_mode(&mut self) {
        self.push(HostCall::SetTextMode);
    }
    fn set_program_mode(&mut self) {
        self.push(HostCall::SetProgramMode);
    }
}
