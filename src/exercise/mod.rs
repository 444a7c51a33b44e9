//! Exercise validation.
//!
//! An exercise collects evidence from a learner's program (recorded
//! statements, the program source, free-form working variables) and turns it
//! into a pass/fail verdict that is reported to the hosting frame.
//!
//! - [`matching`] – structural containment used by `has_statement`
//! - [`completions`] – projection of the editor completions map
//! - [`host`] – host-facing calls and the [`ExerciseHost`](host::ExerciseHost) trait
//! - [`state`] – the [`Exercise`](state::Exercise) component and its state machine

pub mod completions;
pub mod host;
pub mod matching;
pub mod state;

pub use completions::{Completions, MethodCompletion};
pub use host::{ExerciseHost, HostCall, RecordingHost};
pub use matching::contains;
pub use state::{Exercise, ExercisePhase, ExerciseReport};
