//! Per-actor movement state.
//!
//! [`Motion`] keeps where the actor is heading and how fast each axis
//! moves. Commands only set the destination; [`motion_system`] moves the
//! actor a little every tick and ends the blocking operation once it arrives.
//!
//! Destinations accumulate: a second walk issued before the first one
//! finished starts from the first one's destination, not from the current
//! position. Arrival finishes every command queued so far at once.
//!
//! [`motion_system`]: crate::systems::motion::motion_system

use bevy_ecs::prelude::Component;
use glam::Vec2;

use crate::spatial::Category;

pub const DEFAULT_SPEED: f32 = 200.0;
pub const ARRIVAL_EPSILON: f32 = 1e-3;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub destination: Vec2,
    /// Per-axis speed magnitudes in units per second. Direction comes from
    /// comparing position and destination.
    pub velocity: Vec2,
    pub speed: f32,
    pub in_movement: bool,
    /// Held by the pointer. Movement is suspended, not cancelled.
    pub dragging: bool,
    pub frozen: bool,
    /// Stop at actors of these categories instead of walking through them.
    pub blocked_by: Option<Category>,
    /// Motion commands that end when the actor arrives.
    queued: u32,
}

impl Motion {
    pub fn new(position: Vec2) -> Self {
        Motion {
            destination: position,
            velocity: Vec2::ZERO,
            speed: DEFAULT_SPEED,
            in_movement: false,
            dragging: false,
            frozen: false,
            blocked_by: None,
            queued: 0,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_blocked_by(mut self, categories: Category) -> Self {
        self.blocked_by = Some(categories);
        self
    }

    /// Extend the destination by `delta`. Returns the segment `(from, to)`.
    pub fn push_destination(&mut self, delta: Vec2) -> (Vec2, Vec2) {
        let from = self.destination;
        self.velocity = self.axis_velocity(delta);
        self.destination = from + delta;
        self.in_movement = true;
        self.queued += 1;
        (from, self.destination)
    }

    pub fn queued(&self) -> u32 {
        self.queued
    }

    /// Finish movement. Returns how many commands were waiting on it.
    pub fn finish(&mut self) -> u32 {
        self.in_movement = false;
        std::mem::take(&mut self.queued)
    }

    /// Head for an absolute target. Returns the segment `(from, to)`.
    pub fn retarget(&mut self, target: Vec2) -> (Vec2, Vec2) {
        self.push_destination(target - self.destination)
    }

    /// Stop where `position` is without finishing through the tick loop.
    pub fn snap_to(&mut self, position: Vec2) {
        self.destination = position;
    }

    /// The axis with the larger displacement runs at full speed; the other
    /// is scaled so both arrive together.
    pub fn axis_velocity(&self, delta: Vec2) -> Vec2 {
        let (ax, ay) = (delta.x.abs(), delta.y.abs());
        if ax == 0.0 && ay == 0.0 {
            Vec2::ZERO
        } else if ax > ay {
            Vec2::new(self.speed, self.speed * ay / ax)
        } else {
            Vec2::new(self.speed * ax / ay, self.speed)
        }
    }

    /// One tick of movement from `pos`. Returns the new position and
    /// whether any axis moved.
    pub fn advance(&self, pos: Vec2, dt: f32, epsilon: f32) -> (Vec2, bool) {
        let step = self.velocity * dt;
        let (x, moved_x) = advance_axis(pos.x, self.destination.x, step.x, epsilon);
        let (y, moved_y) = advance_axis(pos.y, self.destination.y, step.y, epsilon);
        (Vec2::new(x, y), moved_x || moved_y)
    }
}

fn advance_axis(current: f32, target: f32, step: f32, epsilon: f32) -> (f32, bool) {
    let mut moved = false;
    let mut next = current;
    if current < target {
        next = (current + step).min(target);
        moved = true;
    } else if current > target {
        next = (current - step).max(target);
        moved = true;
    }
    if (next - target).abs() < epsilon {
        next = target;
    }
    (next, moved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_axis_gets_full_speed() {
        let m = Motion::new(Vec2::ZERO);
        assert_eq!(m.axis_velocity(Vec2::new(100.0, -50.0)), Vec2::new(200.0, 100.0));
        assert_eq!(m.axis_velocity(Vec2::new(0.0, 30.0)), Vec2::new(0.0, 200.0));
        assert_eq!(m.axis_velocity(Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn test_destinations_accumulate() {
        let mut m = Motion::new(Vec2::new(50.0, 50.0));
        m.push_destination(Vec2::new(10.0, 0.0));
        let (from, to) = m.push_destination(Vec2::new(0.0, 10.0));
        assert_eq!(from, Vec2::new(60.0, 50.0));
        assert_eq!(to, Vec2::new(60.0, 60.0));
        assert!(m.in_movement);
        assert_eq!(m.queued(), 2);
        assert_eq!(m.finish(), 2);
        assert_eq!(m.queued(), 0);
        assert!(!m.in_movement);
    }

    #[test]
    fn test_advance_clamps_and_reports_motion() {
        let mut m = Motion::new(Vec2::ZERO);
        m.push_destination(Vec2::new(10.0, 0.0));
        let (p, moved) = m.advance(Vec2::ZERO, 0.03125, ARRIVAL_EPSILON);
        assert!(moved);
        assert_eq!(p, Vec2::new(6.25, 0.0));
        let (p, moved) = m.advance(p, 0.03125, ARRIVAL_EPSILON);
        assert!(moved);
        assert_eq!(p, Vec2::new(10.0, 0.0));
        let (_, moved) = m.advance(p, 0.03125, ARRIVAL_EPSILON);
        assert!(!moved);
    }

    #[test]
    fn test_advance_snaps_within_epsilon() {
        let mut m = Motion::new(Vec2::ZERO);
        m.destination = Vec2::new(0.0005, 0.0);
        m.velocity = Vec2::new(0.0001, 0.0);
        let (p, _) = m.advance(Vec2::ZERO, 1.0, ARRIVAL_EPSILON);
        assert_eq!(p.x, 0.0005);
    }
}
