//! Persistent entity marker component.
//!
//! [`Session::clear_actors`](crate::session::Session::clear_actors) despawns
//! every actor except those tagged [`Persistent`]. The exercise entity carries
//! it so that its authoring data outlives a program restart.

use bevy_ecs::prelude::Component;

/// Tag component for entities kept across a session clear.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Persistent;
