//! ECS resources made available to systems.
//!
//! Overview
//! - `actorids` – monotonic actor id allocator
//! - `hostbridge` – the exercise host the session reports to
//! - `runtimeconfig` – tuning values loaded from an INI file
//! - `script` – learner programs and their scheduler
//! - `stages` – spatial stages and pointer-touch routing
//! - `timers` – one-shot timers owned by entities
//! - `worldtime` – simulation time and delta
pub mod actorids;
pub mod hostbridge;
pub mod runtimeconfig;
pub mod script;
pub mod stages;
pub mod timers;
pub mod worldtime;
