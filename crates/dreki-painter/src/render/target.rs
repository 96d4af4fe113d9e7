//! Off-screen render targets.
//!
//! A [`RenderTarget`] is a colour texture the frame can be drawn into instead
//! of the window. Its texture is registered like any other, so quads can
//! sample the result on a later frame, e.g. for a minimap or a transition.
//! Drawing into a target while a quad in the same frame samples it is a wgpu
//! validation error.
//!
//! Targets are created by [`WgpuDevice::create_render_target`] and drawn with
//! [`WgpuDevice::render_to_target`].
//!
//! [`WgpuDevice::create_render_target`]: super::WgpuDevice::create_render_target
//! [`WgpuDevice::render_to_target`]: super::WgpuDevice::render_to_target

use super::device::TextureHandle;

/// An off-screen colour attachment in the surface format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    texture: TextureHandle,
    width: u32,
    height: u32,
}

impl RenderTarget {
    pub(crate) fn new(texture: TextureHandle, width: u32, height: u32) -> Self {
        Self {
            texture,
            width,
            height,
        }
    }

    /// The target's colour texture, for sampling from sprites.
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
