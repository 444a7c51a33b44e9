//! Grid-based spatial query engine.
//!
//! This module answers "what is this actor overlapping?" for one or more
//! independently rendered layers ([`stage::Stage`]). It is deliberately free of
//! any ECS or rendering types: stages hold plain [`Body`] snapshots that the
//! [`crate::systems::spatial`] system refreshes from components every tick, so
//! searches can be unit-tested without a running world.
//!
//! Submodules overview:
//! - [`aabb`] – axis-aligned bounding boxes in world units
//! - [`category`] – bitmask of collidable categories used to filter searches
//! - [`grid`] – sparse cell index mapping grid cells to actor ids
//! - [`narrow`] – narrow-phase overlap tests run on broad-phase candidates
//! - [`stage`] – a layer of bodies with skip and touch searches

pub mod aabb;
pub mod category;
pub mod grid;
pub mod narrow;
pub mod stage;

pub use aabb::Aabb;
pub use category::Category;
pub use grid::{CellKey, CellRange, SpatialGrid};
pub use narrow::{AabbNarrowPhase, CollisionError, Contact, NarrowPhase};
pub use stage::Stage;

use std::fmt;

/// Script-visible actor identifier.
///
/// Identifiers are handed out in creation order by
/// [`ActorIds`](crate::resources::actorids::ActorIds), so a larger id always
/// means a more recently created (and therefore topmost) actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of an actor as seen by a stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub id: ActorId,
    pub bounds: Aabb,
    pub category: Category,
    /// Hidden bodies still collide but are never returned by touch searches.
    pub visible: bool,
}

impl Body {
    pub fn new(id: ActorId, bounds: Aabb) -> Self {
        Self {
            id,
            bounds,
            category: Category::DEFAULT,
            visible: true,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// The subject of a search.
///
/// A probe either stands for a stage member (`id` is set, and the member is
/// re-indexed from `bounds` before searching) or for a free shape such as a
/// touch point, which is ranged on the grid without being inserted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Probe {
    pub id: Option<ActorId>,
    pub bounds: Aabb,
}

impl Probe {
    pub fn actor(id: ActorId, bounds: Aabb) -> Self {
        Self {
            id: Some(id),
            bounds,
        }
    }

    pub fn point(x: f32, y: f32) -> Self {
        Self {
            id: None,
            bounds: Aabb::from_point(glam::Vec2::new(x, y)),
        }
    }

    pub fn shape(bounds: Aabb) -> Self {
        Self { id: None, bounds }
    }
}

/// A qualifying collision returned by a search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// The actor that was hit (never the probe itself).
    pub actor: ActorId,
    pub contact: Contact,
}
