use bevy_ecs::prelude::Component;
use glam::Vec2;

/// Heading a turtle starts with. It points along +x.
pub const TURTLE_HEADING: f32 = 90.0;

/// Heading in degrees. Positive angles turn clockwise on a y-down screen.
#[derive(Component, Clone, Debug, Copy, Default, PartialEq)]
pub struct Rotation {
    pub degrees: f32,
}

impl Rotation {
    pub fn new(degrees: f32) -> Self {
        Rotation { degrees }
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.degrees += degrees;
    }

    /// Offset covered by walking `distance` along this heading.
    pub fn forward(&self, distance: f32) -> Vec2 {
        let rad = (self.degrees - 90.0).to_radians();
        Vec2::new(rad.cos() * distance, rad.sin() * distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_turtle_heading_faces_positive_x() {
        let r = Rotation::new(TURTLE_HEADING);
        assert!(approx_eq(r.forward(50.0), Vec2::new(50.0, 0.0)));
    }

    #[test]
    fn test_right_turn_faces_down() {
        let mut r = Rotation::new(TURTLE_HEADING);
        r.rotate(90.0);
        assert!(approx_eq(r.forward(10.0), Vec2::new(0.0, 10.0)));
        r.rotate(180.0);
        assert!(approx_eq(r.forward(10.0), Vec2::new(0.0, -10.0)));
    }
}
