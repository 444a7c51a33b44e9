use bevy_ecs::prelude::Component;

/// Hidden actors are skipped by touch search. They still collide.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Hidden;
