use bevy_ecs::prelude::Component;

use crate::spatial::ActorId;

/// Identity of a scripted actor.
///
/// Ids come from [`ActorIds`](crate::resources::actorids::ActorIds) and only
/// grow, so comparing them tells which actor was created last.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub class_name: String,
}

impl Actor {
    pub fn new(id: ActorId, class_name: impl Into<String>) -> Self {
        Actor {
            id,
            class_name: class_name.into(),
        }
    }
}
