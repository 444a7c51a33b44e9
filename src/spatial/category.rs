//! Collidable categories.
//!
//! Every body carries a [`Category`]; searches take an optional mask and only
//! consider bodies whose category intersects it. `None` as a mask disables
//! filtering entirely.

use bitflags::bitflags;

bitflags! {
    /// Bitmask of collidable categories.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Category: u32 {
        const DEFAULT = 1;
        const PARTICLE = 2;
        const ACTIVE = 4;
        const FRIENDLY = 8;
        const ENEMY = 16;
        const POWERUP = 32;
        const UI = 64;
        const ALL = 0xFFFF;
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::DEFAULT
    }
}

impl Category {
    /// Whether a body of this category passes `mask`.
    pub fn passes(self, mask: Option<Category>) -> bool {
        match mask {
            None => true,
            Some(mask) => self.intersects(mask),
        }
    }
}
