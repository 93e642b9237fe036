//! The player's swept collision volume.

use bevy::prelude::*;

/// A vertical capsule: core segment from `start` (lower) to `end` (upper)
/// plus a radius. `start.y <= end.y` always holds; the segment length is
/// fixed for the lifetime of a player.
#[derive(Clone, Copy, Debug)]
pub struct Capsule {
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
}

impl Capsule {
    /// Build an upright capsule whose volume is centered on `center`.
    pub fn from_center(center: Vec3, height: f32, radius: f32) -> Self {
        let half = height * 0.5;
        Self {
            start: Vec3::new(center.x, center.y - half + radius, center.z),
            end: Vec3::new(center.x, center.y + half - radius, center.z),
            radius,
        }
    }

    /// Midpoint of the core segment; the player's exposed world position.
    pub fn center(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    pub fn segment_half_length(&self) -> f32 {
        self.start.distance(self.end) * 0.5
    }

    /// Lowest point of the capsule surface.
    pub fn bottom_y(&self) -> f32 {
        self.start.y - self.radius
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.start += delta;
        self.end += delta;
    }
}
