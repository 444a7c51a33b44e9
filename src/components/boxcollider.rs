use bevy_ecs::prelude::Component;
use glam::Vec2;

use crate::spatial::Aabb;

/// Axis-aligned box around an actor's position.
///
/// The box is centered on the position unless an offset is given. A zero
/// size makes a point, which still collides with anything containing it.
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct BoxCollider {
    pub size: Vec2,
    pub offset: Vec2,
}

impl BoxCollider {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            offset: Vec2::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// World bounds for an actor standing at `position`.
    /// Negative sizes are normalized.
    pub fn aabb(&self, position: Vec2) -> Aabb {
        let center = position + self.offset;
        let half = self.size * 0.5;
        Aabb::from_corners(center - half, center + half)
    }

    pub fn contains_point(&self, position: Vec2, point: Vec2) -> bool {
        self.aabb(position).contains_point(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_is_centered() {
        let c = BoxCollider::new(10.0, 4.0);
        let b = c.aabb(Vec2::new(100.0, 50.0));
        assert_eq!(b.min, Vec2::new(95.0, 48.0));
        assert_eq!(b.max, Vec2::new(105.0, 52.0));
    }

    #[test]
    fn test_offset_and_negative_size() {
        let c = BoxCollider::new(-10.0, 10.0).with_offset(Vec2::new(5.0, 0.0));
        let b = c.aabb(Vec2::ZERO);
        assert_eq!(b.min, Vec2::new(0.0, -5.0));
        assert_eq!(b.max, Vec2::new(10.0, 5.0));
        assert!(c.contains_point(Vec2::ZERO, Vec2::new(10.0, 5.0)));
    }
}
