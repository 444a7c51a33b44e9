//! Actor spawning.
//!
//! [`ActorBuilder`] assembles the component bundle of a scripted actor. Ids
//! are drawn from [`ActorIds`] at spawn time so creation order is preserved,
//! and the default speed and required score come from [`RuntimeConfig`] when
//! one is present.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::actor::Actor;
use crate::components::boxcollider::BoxCollider;
use crate::components::coordinator::SyncCoordinator;
use crate::components::mapposition::MapPosition;
use crate::components::motion::{DEFAULT_SPEED, Motion};
use crate::components::pathtrail::PathTrail;
use crate::components::persistent::Persistent;
use crate::components::rotation::{Rotation, TURTLE_HEADING};
use crate::components::stagemember::{CollisionCategory, StageMember};
use crate::components::visibility::Hidden;
use crate::exercise::Exercise;
use crate::resources::actorids::ActorIds;
use crate::resources::runtimeconfig::RuntimeConfig;
use crate::resources::script::ActorKind;
use crate::resources::stages::StageId;
use crate::spatial::Category;

/// Side of the square collider given to turtles and sprites.
pub const DEFAULT_ACTOR_SIZE: f32 = 32.0;

#[derive(Debug, Clone)]
pub struct ActorBuilder {
    class_name: String,
    position: Vec2,
    heading: f32,
    collider: Option<BoxCollider>,
    stage: StageId,
    category: Category,
    speed: Option<f32>,
    blocked_by: Option<Category>,
    hidden: bool,
    path: Option<PathTrail>,
    persistent: bool,
}

impl ActorBuilder {
    pub fn new(class_name: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            class_name: class_name.into(),
            position: Vec2::new(x, y),
            heading: TURTLE_HEADING,
            collider: Some(BoxCollider::new(DEFAULT_ACTOR_SIZE, DEFAULT_ACTOR_SIZE)),
            stage: StageId(0),
            category: Category::DEFAULT,
            speed: None,
            blocked_by: None,
            hidden: false,
            path: None,
            persistent: false,
        }
    }

    /// A turtle leaves a red trail behind it.
    pub fn turtle(x: f32, y: f32) -> Self {
        Self::new(ActorKind::Turtle.class_name(), x, y).with_path(PathTrail::default())
    }

    pub fn sprite(x: f32, y: f32) -> Self {
        Self::new(ActorKind::Sprite.class_name(), x, y)
    }

    pub fn of_kind(kind: ActorKind, x: f32, y: f32) -> Self {
        match kind {
            ActorKind::Turtle => Self::turtle(x, y),
            ActorKind::Sprite => Self::sprite(x, y),
        }
    }

    pub fn with_heading(mut self, degrees: f32) -> Self {
        self.heading = degrees;
        self
    }

    pub fn with_collider(mut self, width: f32, height: f32) -> Self {
        self.collider = Some(BoxCollider::new(width, height));
        self
    }

    /// Actors without a collider never take part in spatial queries.
    pub fn without_collider(mut self) -> Self {
        self.collider = None;
        self
    }

    pub fn with_stage(mut self, stage: StageId) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn blocked_by(mut self, categories: Category) -> Self {
        self.blocked_by = Some(categories);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_path(mut self, trail: PathTrail) -> Self {
        self.path = Some(trail);
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn spawn(self, world: &mut World) -> Entity {
        let id = world.get_resource_or_init::<ActorIds>().allocate();
        let speed = self.speed.unwrap_or_else(|| {
            world
                .get_resource::<RuntimeConfig>()
                .map_or(DEFAULT_SPEED, |c| c.speed)
        });
        let mut motion = Motion::new(self.position).with_speed(speed);
        motion.blocked_by = self.blocked_by;

        let mut entity = world.spawn((
            Actor::new(id, self.class_name),
            MapPosition { pos: self.position },
            Rotation::new(self.heading),
            motion,
            SyncCoordinator::new(),
            StageMember(self.stage),
            CollisionCategory(self.category),
        ));
        if let Some(collider) = self.collider {
            entity.insert(collider);
        }
        if let Some(trail) = self.path {
            entity.insert(trail);
        }
        if self.hidden {
            entity.insert(Hidden);
        }
        if self.persistent {
            entity.insert(Persistent);
        }
        entity.id()
    }
}

/// Spawn the exercise entity. It survives session clears.
pub fn spawn_exercise(world: &mut World) -> Entity {
    let mut exercise = Exercise::new();
    if let Some(config) = world.get_resource::<RuntimeConfig>() {
        exercise.set_required_score(config.required_score);
    }
    world
        .spawn((exercise, SyncCoordinator::new(), Persistent))
        .id()
}
