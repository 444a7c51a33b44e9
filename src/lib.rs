//! learnstage library.
//!
//! A headless learning stage: learner programs drive turtles and sprites
//! with blocking calls, actors move and collide on spatial stages, and an
//! exercise turns what the program did into a verdict for the host.
//!
//! This module exposes the ECS components, resources, systems and events,
//! plus the [`session::Session`] that ties them together, for use in
//! integration tests and as a reusable library.

pub mod actors;
pub mod components;
pub mod events;
pub mod exercise;
pub mod resources;
pub mod session;
pub mod spatial;
pub mod systems;
