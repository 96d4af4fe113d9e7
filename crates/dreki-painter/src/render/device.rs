//! # Device — The Narrow GPU Surface the Painter Draws Through
//!
//! Batches speak a small, immediate-mode vocabulary: create a buffer, write
//! into it, bind a shader, set a couple of uniforms, bind textures to units,
//! issue an indexed draw. [`RenderDevice`] is exactly that vocabulary and
//! nothing more.
//!
//! Keeping the seam this narrow means the batching logic (which quads go
//! where, what gets re-packed, when an upload happens) can be exercised
//! without a GPU: the [`RecordingDevice`](super::RecordingDevice) implements
//! the same trait and simply writes down every call. The real backend,
//! [`WgpuDevice`](super::WgpuDevice), records the same calls into draw
//! commands and replays them into a wgpu render pass.
//!
//! ## Handles
//!
//! Every resource is referred to by a small `Copy` index, the same handle
//! pattern the texture store uses: the device owns the GPU object, callers
//! hold the index. Equality is identity: two handles are the same texture
//! only if they index the same entry, regardless of pixel content.
//!
//! ## Texture Units
//!
//! There are [`TEXTURE_UNITS`] units. Unit 0 is reserved: it always samples
//! white, so a texture slot of 0 in a vertex means "untextured, tint only".
//! Units 1..=8 hold a batch's registered textures.

use crate::error::RenderError;
use crate::math::Mat4;

/// Number of texture units a draw can reference: the reserved white unit 0
/// plus [`MAX_BATCH_TEXTURES`](crate::render2d::MAX_BATCH_TEXTURES).
pub const TEXTURE_UNITS: u32 = 9;

/// Uniform names the quad shaders understand.
pub(crate) const KNOWN_UNIFORMS: [&str; 3] = ["u_projection", "u_view", "u_textures"];

/// Handle to a vertex or index buffer owned by a [`RenderDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) usize);

/// Handle to a compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub(crate) usize);

/// Handle to a texture uploaded to a [`RenderDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) usize);

/// The GPU operations a batch needs. See the module docs.
pub trait RenderDevice {
    /// Allocate an uninitialised, writable vertex buffer of `size` bytes.
    fn create_vertex_buffer(&mut self, label: &str, size: u64) -> Result<BufferId, RenderError>;

    /// Allocate an index buffer holding `indices`. Its contents never change.
    fn create_index_buffer(&mut self, label: &str, indices: &[u32])
    -> Result<BufferId, RenderError>;

    /// Overwrite part of a vertex buffer starting at byte `offset`.
    fn write_vertex_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]);

    /// Compile a WGSL shader. Failure is fatal for whoever asked for it.
    fn create_shader(&mut self, label: &str, source: &str) -> Result<ShaderHandle, RenderError>;

    /// Upload tightly packed RGBA8 pixels.
    fn create_texture(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, RenderError>;

    /// Width and height of a texture, if the handle is known.
    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)>;

    fn bind_shader(&mut self, shader: ShaderHandle);

    /// Set a 4x4 matrix uniform on the bound shader. Unknown names are
    /// warned about once and otherwise ignored.
    fn set_uniform_mat4(&mut self, name: &str, value: Mat4);

    /// Set an integer array uniform on the bound shader. Unknown names are
    /// warned about once and otherwise ignored.
    fn set_uniform_i32_array(&mut self, name: &str, values: &[i32]);

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    fn unbind_texture(&mut self, unit: u32);

    /// Draw `index_count` indices from the start of `index_buffer` with the
    /// currently bound shader, uniforms and textures.
    fn draw_indexed(&mut self, vertex_buffer: BufferId, index_buffer: BufferId, index_count: u32);

    fn unbind_shader(&mut self);
}
