use glam::Vec2;

/// Axis-aligned bounding box. `min` is always component-wise `<=` `max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Builds a box from two arbitrary corners, normalizing to proper min/max.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Builds a box from a top-left corner and a size. Negative sizes are
    /// normalized.
    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self::from_corners(min, min + size)
    }

    /// Zero-sized box located at `p`.
    pub fn from_point(p: Vec2) -> Self {
        Self { min: p, max: p }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Overlap test. Boxes sharing only an edge do not overlap; a zero-extent
    /// axis (such as a touch point) is compared inclusively.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        axis_overlap(self.min.x, self.max.x, other.min.x, other.max.x)
            && axis_overlap(self.min.y, self.max.y, other.min.y, other.max.y)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

fn axis_overlap(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> bool {
    if a_min == a_max || b_min == b_max {
        a_min <= b_max && a_max >= b_min
    } else {
        a_min < b_max && a_max > b_min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_min_size_normalizes_negative_size() {
        let b = Aabb::from_min_size(Vec2::new(10.0, 10.0), Vec2::new(-4.0, 6.0));
        assert_eq!(b.min, Vec2::new(6.0, 10.0));
        assert_eq!(b.max, Vec2::new(10.0, 16.0));
    }

    #[test]
    fn test_overlapping_boxes() {
        let a = Aabb::from_min_size(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let b = Aabb::from_min_size(Vec2::new(5.0, 5.0), Vec2::new(10.0, 10.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_edge_contact_is_not_overlap() {
        let a = Aabb::from_min_size(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let b = Aabb::from_min_size(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_point_inside_box_overlaps() {
        let a = Aabb::from_min_size(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let p = Aabb::from_point(Vec2::new(3.0, 4.0));
        assert!(a.overlaps(&p));
        assert!(p.overlaps(&a));
    }

    #[test]
    fn test_point_outside_box() {
        let a = Aabb::from_min_size(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let p = Aabb::from_point(Vec2::new(30.0, 4.0));
        assert!(!a.overlaps(&p));
    }
}
