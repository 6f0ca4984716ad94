//! Arena bounds - the rectangle every entity is confined to

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Ground-plane rectangle supplied by the arena. Read-only to gameplay systems.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self::square(20.0)
    }
}

impl ArenaBounds {
    pub const fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        Self { min_x, max_x, min_z, max_z }
    }

    /// Square arena centred on the origin
    pub const fn square(half_size: f32) -> Self {
        Self::new(-half_size, half_size, -half_size, half_size)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f32 {
        self.max_z - self.min_z
    }

    pub fn center(&self, height: f32) -> Vec3 {
        Vec3::new(
            (self.min_x + self.max_x) * 0.5,
            height,
            (self.min_z + self.max_z) * 0.5,
        )
    }

    pub fn contains(&self, position: Vec3) -> bool {
        (self.min_x..=self.max_x).contains(&position.x)
            && (self.min_z..=self.max_z).contains(&position.z)
    }

    /// Clamp X/Z into the rectangle. Height is left alone.
    pub fn clamp(&self, position: Vec3) -> Vec3 {
        Vec3::new(
            position.x.clamp(self.min_x, self.max_x),
            position.y,
            position.z.clamp(self.min_z, self.max_z),
        )
    }

    /// Bounds pulled in by `margin` on every side. Collapses to the centre line
    /// rather than inverting when the margin is larger than half the extent.
    pub fn shrink(&self, margin: f32) -> Self {
        let (min_x, max_x) = shrink_axis(self.min_x, self.max_x, margin);
        let (min_z, max_z) = shrink_axis(self.min_z, self.max_z, margin);
        Self { min_x, max_x, min_z, max_z }
    }

    /// Uniformly random point inside the bounds at the given height
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R, height: f32) -> Vec3 {
        Vec3::new(
            sample_axis(rng, self.min_x, self.max_x),
            height,
            sample_axis(rng, self.min_z, self.max_z),
        )
    }
}

fn shrink_axis(min: f32, max: f32, margin: f32) -> (f32, f32) {
    if max - min <= margin * 2.0 {
        let mid = (min + max) * 0.5;
        (mid, mid)
    } else {
        (min + margin, max - margin)
    }
}

fn sample_axis<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}

/// Distance on the XZ plane; the height axis never matters for combat
pub fn ground_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

/// Horizontal direction from `from` toward `to`, zero when they coincide
pub fn ground_direction(from: Vec3, to: Vec3) -> Vec2 {
    Vec2::new(to.x - from.x, to.z - from.z).normalize_or_zero()
}
