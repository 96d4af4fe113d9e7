//! Convenience re-exports — `use dreki_painter::prelude::*` for the common items.

pub use crate::camera::{Camera, Camera2d};
pub use crate::config::PainterConfig;
pub use crate::error::RenderError;
pub use crate::math::{Mat4, Rect, Transform, Vec2, Vec3, Vec4};
pub use crate::render::{
    GpuContext, RecordingDevice, RenderDevice, RenderTarget, ShaderHandle, TextureHandle,
    WgpuDevice,
};
pub use crate::render2d::{
    Color, Painter, QuadSource, RenderStats, SharedQuad, Sprite, SpriteRenderer, Spritesheet,
};
pub use crate::resources::ResourceCache;
