//! Axis-aligned rectangle and circle intersection tests
//!
//! Every collision in the game is a ball (circle) or power-up (rectangle)
//! against a paddle, brick or canvas edge (rectangles), so this is all the
//! geometry the simulation needs.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle, `pos` is the top-left corner (y grows down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.pos + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Check if a point lies inside (edges inclusive)
    pub fn contains_point(&self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.pos.x && p.x <= max.x && p.y >= self.pos.y && p.y <= max.y
    }

    /// Closest point on (or in) the rectangle to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max())
    }
}

/// Circle vs rectangle overlap
///
/// Touching counts as a miss so a ball resting exactly on a surface does not
/// register a second hit.
pub fn circle_intersects_rect(center: Vec2, radius: f32, rect: &Rect) -> bool {
    let closest = rect.closest_point(center);
    center.distance_squared(closest) < radius * radius
}

/// Rectangle vs rectangle overlap (touching edges do not overlap)
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    let (a_min, a_max) = (a.min(), a.max());
    let (b_min, b_max) = (b.min(), b.max());
    a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
}
