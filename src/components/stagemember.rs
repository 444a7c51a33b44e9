use bevy_ecs::prelude::Component;

use crate::resources::stages::StageId;
use crate::spatial::Category;

/// Stage the actor is indexed in.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StageMember(pub StageId);

/// Categories this actor belongs to, tested against search masks.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CollisionCategory(pub Category);
