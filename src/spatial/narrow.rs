//! Narrow-phase overlap tests.
//!
//! The grid only says two actors share a cell. A [`NarrowPhase`] decides
//! whether they actually collide and describes the contact. An `Err` from a
//! narrow phase is never fatal: the search treats that pair as "no collision"
//! and moves on to the next candidate.

use std::fmt;

use glam::Vec2;

use super::Aabb;

/// Contact information from the point of view of the searching subject.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Unit direction in which the subject must move to separate.
    pub normal: Vec2,
    /// Penetration depth along `normal`. Zero for point probes.
    pub depth: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollisionError {
    /// One of the boxes has NaN or infinite coordinates.
    NonFinite,
}

impl fmt::Display for CollisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionError::NonFinite => write!(f, "bounds are not finite"),
        }
    }
}

impl std::error::Error for CollisionError {}

pub trait NarrowPhase {
    /// Test `subject` against `other`.
    ///
    /// Returns `Ok(None)` when they do not collide.
    fn collide(&self, subject: &Aabb, other: &Aabb) -> Result<Option<Contact>, CollisionError>;
}

/// Box-vs-box test using the axis of least penetration as separating normal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AabbNarrowPhase;

impl NarrowPhase for AabbNarrowPhase {
    fn collide(&self, subject: &Aabb, other: &Aabb) -> Result<Option<Contact>, CollisionError> {
        if !subject.is_finite() || !other.is_finite() {
            return Err(CollisionError::NonFinite);
        }
        if !subject.overlaps(other) {
            return Ok(None);
        }
        let overlap_x = subject.max.x.min(other.max.x) - subject.min.x.max(other.min.x);
        let overlap_y = subject.max.y.min(other.max.y) - subject.min.y.max(other.min.y);
        let away = subject.center() - other.center();
        let contact = if overlap_x <= overlap_y {
            Contact {
                normal: Vec2::new(if away.x < 0.0 { -1.0 } else { 1.0 }, 0.0),
                depth: overlap_x.max(0.0),
            }
        } else {
            Contact {
                normal: Vec2::new(0.0, if away.y < 0.0 { -1.0 } else { 1.0 }),
                depth: overlap_y.max(0.0),
            }
        };
        Ok(Some(contact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_separated_boxes_do_not_collide() {
        let a = Aabb::from_min_size(Vec2::ZERO, Vec2::splat(10.0));
        let b = Aabb::from_min_size(Vec2::new(20.0, 0.0), Vec2::splat(10.0));
        assert_eq!(AabbNarrowPhase.collide(&a, &b), Ok(None));
    }

    #[test]
    fn test_contact_uses_axis_of_least_penetration() {
        let a = Aabb::from_min_size(Vec2::ZERO, Vec2::splat(10.0));
        let b = Aabb::from_min_size(Vec2::new(8.0, 1.0), Vec2::splat(10.0));
        let c = AabbNarrowPhase.collide(&a, &b).unwrap().unwrap();
        assert!(approx_eq(c.depth, 2.0));
        assert!(approx_eq(c.normal.x, -1.0));
        assert!(approx_eq(c.normal.y, 0.0));
    }

    #[test]
    fn test_point_probe_has_zero_depth() {
        let p = Aabb::from_point(Vec2::new(5.0, 5.0));
        let b = Aabb::from_min_size(Vec2::ZERO, Vec2::splat(10.0));
        let c = AabbNarrowPhase.collide(&p, &b).unwrap().unwrap();
        assert!(approx_eq(c.depth, 0.0));
    }

    #[test]
    fn test_nan_bounds_are_an_error() {
        let a = Aabb::from_point(Vec2::new(f32::NAN, 0.0));
        let b = Aabb::from_min_size(Vec2::ZERO, Vec2::splat(10.0));
        assert_eq!(AabbNarrowPhase.collide(&a, &b), Err(CollisionError::NonFinite));
    }
}
