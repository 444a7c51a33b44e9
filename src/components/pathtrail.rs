//! Turtle path trail.
//!
//! Samples come in pairs: every walk pushes its start and end point while
//! tracking is on. A renderer draws one segment per pair. Nothing in the
//! simulation reads the trail.

use bevy_ecs::prelude::Component;
use glam::Vec2;
use serde::Serialize;

pub const DEFAULT_PATH_COLOR: [u8; 3] = [255, 0, 0];
pub const DEFAULT_PATH_WIDTH: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathSample {
    pub x: f32,
    pub y: f32,
    pub color: [u8; 3],
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct PathTrail {
    pub enabled: bool,
    pub color: [u8; 3],
    pub width: f32,
    pub samples: Vec<PathSample>,
}

impl Default for PathTrail {
    fn default() -> Self {
        PathTrail {
            enabled: true,
            color: DEFAULT_PATH_COLOR,
            width: DEFAULT_PATH_WIDTH,
            samples: Vec::new(),
        }
    }
}

impl PathTrail {
    /// Record a segment if tracking is on.
    pub fn record(&mut self, from: Vec2, to: Vec2) {
        if !self.enabled {
            return;
        }
        for p in [from, to] {
            self.samples.push(PathSample {
                x: p.x,
                y: p.y,
                color: self.color,
            });
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = (&PathSample, &PathSample)> {
        self.samples.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_pairs_with_current_color() {
        let mut t = PathTrail::default();
        t.record(Vec2::ZERO, Vec2::new(10.0, 0.0));
        t.color = [0, 0, 255];
        t.record(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        let segs: Vec<_> = t.segments().collect();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].0.color, DEFAULT_PATH_COLOR);
        assert_eq!(segs[1].1.color, [0, 0, 255]);
    }

    #[test]
    fn test_untracked_walks_leave_no_trail() {
        let mut t = PathTrail {
            enabled: false,
            ..Default::default()
        };
        t.record(Vec2::ZERO, Vec2::ONE);
        assert!(t.samples.is_empty());
    }
}
