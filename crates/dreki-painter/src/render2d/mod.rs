//! # Render2d — Batched Quad Rendering
//!
//! A 2D level is mostly quads: tiles, props, characters. Drawing each with its
//! own call would swamp the driver long before the GPU breaks a sweat, so
//! quads are grouped into batches that share one vertex buffer and one draw
//! call.
//!
//! ## Architecture
//!
//! ```text
//!   QuadSource (SpriteRenderer, ...)
//!         │  Painter::add — once per quad
//!         ▼
//!   ┌─────────────────────────────────────────────┐
//!   │ Painter: Vec<Batch>, sorted by depth key     │
//!   │   first fit: same depth, free slot,          │
//!   │              texture room                    │
//!   └──────────────────┬──────────────────────────┘
//!                      │  Painter::render — every frame
//!                      ▼
//!   ┌─────────────────────────────────────────────┐
//!   │ Batch::draw (ascending depth)                │
//!   │  • re-pack dirty quads into the CPU copy     │
//!   │  • one vertex upload if anything changed     │
//!   │  • bind shader, camera, textures 1..N        │
//!   │  • one indexed draw                          │
//!   └─────────────────────────────────────────────┘
//! ```
//!
//! Everything above talks to the GPU through
//! [`RenderDevice`](crate::render::RenderDevice), so the same batching code
//! drives wgpu in the [`WgpuDevice`](crate::render::WgpuDevice) and a call
//! log in the [`RecordingDevice`](crate::render::RecordingDevice).
//!
//! ## Ordering
//!
//! There is no depth buffer. Batches draw back to front by depth key with
//! alpha blending, and quads within a batch draw in insertion order. Two
//! quads at the same depth overlap in the order they were added.
//!
//! ## Comparison
//!
//! - **Bevy** extracts sprites every frame, sorts them and rebuilds batches
//!   from scratch. Here placement happens once and only changed quads are
//!   re-packed, which suits mostly-static levels.
//! - **macroquad** batches by flushing whenever the texture changes. Here a
//!   batch holds up to eight textures, chosen per vertex by a slot index.

mod batch;
mod painter;
pub(crate) mod pipeline;
mod sprite;
mod spritesheet;
mod vertex;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{Batch, BatchDraw, MAX_BATCH_TEXTURES, quad_indices};
pub use painter::{Painter, RenderStats};
pub use sprite::{QuadSource, SharedQuad, Sprite, SpriteRenderer};
pub use spritesheet::Spritesheet;
pub use vertex::QuadVertex;
pub(crate) use vertex::CameraUniform;

/// An RGBA color with floating-point components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const RED: Self = Self { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const GREEN: Self = Self { r: 0.0, g: 1.0, b: 0.0, a: 1.0 };
    pub const BLUE: Self = Self { r: 0.0, g: 0.0, b: 1.0, a: 1.0 };

    /// Create a color from RGB (alpha = 1).
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub(crate) fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
