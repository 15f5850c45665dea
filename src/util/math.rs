//! Math type re-exports and axis helpers.
//!
//! This module re-exports the `glam` types used throughout the crate and
//! provides the handful of coordinate-convention helpers shared by the
//! mesh and terrain decoders.

pub use glam::{Mat3, Mat4, Vec2, Vec3};

use std::fmt;

/// Swap the X and Z components.
///
/// Container vectors are stored Z,Y,X.
#[inline]
pub fn reverse_components(v: Vec3) -> Vec3 {
    Vec3::new(v.z, v.y, v.x)
}

/// Round half to even, then clamp into a colour channel.
#[inline]
pub fn to_channel(value: f32) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Axis-aligned bounding box with single precision.
#[derive(Clone, Copy, PartialEq)]
pub struct BBox3f {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox3f {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a bounding box from min and max points.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Get the size (extents) of the box.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl Default for BBox3f {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BBox3f {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox3f({:?} - {:?})", self.min, self.max)
    }
}

impl FromIterator<Vec3> for BBox3f {
    fn from_iter<I: IntoIterator<Item = Vec3>>(iter: I) -> Self {
        let mut b = Self::EMPTY;
        for p in iter {
            b.expand_by_point(p);
        }
        b
    }
}
