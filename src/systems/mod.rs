//! Simulation systems.
//!
//! Submodules overview
//! - [`exercise`] – deliver queued exercise calls to the host
//! - [`motion`] – move actors toward their destination and end their walks
//! - [`script_commands`] – apply learner commands to actors and the exercise
//! - [`scripts`] – resume learner programs whose awaited actors settled
//! - [`spatial`] – mirror actor bounds into the stage grids
//! - [`teardown`] – remove an actor together with its timers and claims
//! - [`time`] – update simulation time and delta
//! - [`timers`] – fire expired one-shot timers
//! - [`touch`] – route pointer touches and trigger touch events

pub mod exercise;
pub mod motion;
pub mod script_commands;
pub mod scripts;
pub mod spatial;
pub mod teardown;
pub mod time;
pub mod timers;
pub mod touch;
