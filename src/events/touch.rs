//! Touch event and the drag observer.
//!
//! [`dispatch_touch`](crate::systems::touch::dispatch_touch) and friends
//! trigger a [`TouchEvent`] for every pointer change. [`observe_touch_drag`]
//! turns those into dragging: while held, the actor follows the pointer and
//! its own movement is suspended.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::debug;

use crate::components::mapposition::MapPosition;
use crate::components::motion::Motion;
use crate::resources::stages::{StageId, TouchId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Drag,
    End,
}

/// A pointer touched, moved or left.
///
/// `actor` is the entity held by this touch, if any. A start that hit
/// nothing still fires, with `stage` naming the stage that answered.
#[derive(Event, Debug, Clone, Copy)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub identifier: TouchId,
    pub stage: Option<StageId>,
    pub actor: Option<Entity>,
    pub point: Vec2,
}

/// Grab offset of an actor currently held by a touch.
#[derive(Component, Debug, Clone, Copy)]
pub struct Dragged {
    pub identifier: TouchId,
    pub offset: Vec2,
}

pub fn observe_touch_drag(
    trigger: On<TouchEvent>,
    mut commands: Commands,
    mut actors: Query<(&mut MapPosition, Option<&mut Motion>, Option<&Dragged>)>,
) {
    let event = *trigger.event();
    let Some(entity) = event.actor else {
        return;
    };
    let Ok((mut position, motion, dragged)) = actors.get_mut(entity) else {
        return;
    };
    match event.phase {
        TouchPhase::Start => {
            commands.entity(entity).insert(Dragged {
                identifier: event.identifier,
                offset: position.pos - event.point,
            });
            if let Some(mut motion) = motion {
                motion.dragging = true;
            }
            debug!("touch {} grabbed {:?}", event.identifier, entity);
        }
        TouchPhase::Drag => {
            if let Some(dragged) = dragged.filter(|d| d.identifier == event.identifier) {
                position.pos = event.point + dragged.offset;
            }
        }
        TouchPhase::End => {
            commands.entity(entity).remove::<Dragged>();
            if let Some(mut motion) = motion {
                motion.dragging = false;
            }
        }
    }
}
