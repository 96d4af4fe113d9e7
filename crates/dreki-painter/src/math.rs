//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. The [`Transform`] type provides the position and
//! scale that place a quad in the 2D world.

pub use glam::{Mat4, Vec2, Vec3, Vec4};

/// A 2D placement: bottom-left corner and size in world units.
///
/// Compared by value so a quad source can tell whether it moved since the
/// last frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub scale: Vec2,
}

impl Transform {
    /// Identity transform (origin, unit scale).
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        scale: Vec2::ONE,
    };

    /// Create a transform at the given position with unit scale.
    pub fn from_xy(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            ..Self::IDENTITY
        }
    }

    /// Create a transform from a position and a size.
    pub fn new(position: Vec2, scale: Vec2) -> Self {
        Self { position, scale }
    }

    /// Return a copy with the given size.
    pub fn with_scale(mut self, width: f32, height: f32) -> Self {
        self.scale = Vec2::new(width, height);
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A normalized rectangle within a texture (UV space, 0.0–1.0).
///
/// UV space here has its origin at the bottom-left: images are flipped on load
/// so that `v = 0` is the bottom row, and sprite corners are listed top-right
/// first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// The full texture (0,0) to (1,1).
    pub const FULL: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    /// Build from pixel coordinates and texture dimensions.
    pub fn from_pixels(x: f32, y: f32, w: f32, h: f32, tex_w: f32, tex_h: f32) -> Self {
        Self {
            min: Vec2::new(x / tex_w, y / tex_h),
            max: Vec2::new((x + w) / tex_w, (y + h) / tex_h),
        }
    }

    /// Corner UVs in quad winding order: top-right, bottom-right, bottom-left,
    /// top-left.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.max.x, self.max.y),
            Vec2::new(self.max.x, self.min.y),
            Vec2::new(self.min.x, self.min.y),
            Vec2::new(self.min.x, self.max.y),
        ]
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::FULL
    }
}
