//! A headless [`RenderDevice`] that writes down every call.
//!
//! Buffers live in plain `Vec<u8>`s so tests (or tools) can inspect exactly
//! what would have been uploaded, and [`RecordingDevice::calls`] is the full,
//! ordered command log. Shaders are accepted as long as the source is not
//! empty; textures keep their size and pixels.

use std::collections::HashSet;

use super::device::{BufferId, KNOWN_UNIFORMS, RenderDevice, ShaderHandle, TextureHandle};
use crate::error::RenderError;
use crate::math::Mat4;

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateVertexBuffer { buffer: BufferId, size: u64 },
    CreateIndexBuffer { buffer: BufferId, len: usize },
    WriteVertexBuffer { buffer: BufferId, offset: u64, len: usize },
    CreateShader { shader: ShaderHandle },
    CreateTexture { texture: TextureHandle, width: u32, height: u32 },
    BindShader(ShaderHandle),
    SetUniformMat4 { name: String, value: Mat4 },
    SetUniformI32Array { name: String, values: Vec<i32> },
    BindTexture { unit: u32, texture: TextureHandle },
    UnbindTexture { unit: u32 },
    DrawIndexed { vertex_buffer: BufferId, index_buffer: BufferId, index_count: u32 },
    UnbindShader,
}

#[derive(Debug)]
struct RecordedTexture {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

#[derive(Debug, Default)]
struct RecordedBuffer {
    label: String,
    data: Vec<u8>,
}

/// Records calls instead of executing them. See the module docs.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
    buffers: Vec<RecordedBuffer>,
    shaders: usize,
    textures: Vec<RecordedTexture>,
    warned_uniforms: HashSet<String>,
    fail_buffer_creation: bool,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Forget the call log (buffers and handles are kept).
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Current contents of a buffer.
    pub fn buffer_data(&self, buffer: BufferId) -> &[u8] {
        &self.buffers[buffer.0].data
    }

    /// Label a buffer was created with.
    pub fn buffer_label(&self, buffer: BufferId) -> &str {
        &self.buffers[buffer.0].label
    }

    /// Pixels a texture was uploaded with.
    pub fn texture_data(&self, texture: TextureHandle) -> Option<&[u8]> {
        self.textures.get(texture.0).map(|entry| entry.rgba.as_slice())
    }

    /// Number of `write_vertex_buffer` calls in the log.
    pub fn upload_count(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::WriteVertexBuffer { .. }))
    }

    /// Number of `draw_indexed` calls in the log.
    pub fn draw_count(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::DrawIndexed { .. }))
    }

    /// Make every following buffer creation fail, to exercise error paths.
    pub fn fail_buffer_creation(&mut self, fail: bool) {
        self.fail_buffer_creation = fail;
    }

    fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    fn push_buffer(&mut self, label: &str, data: Vec<u8>) -> Result<BufferId, RenderError> {
        if self.fail_buffer_creation {
            return Err(RenderError::creation("buffer", label, "allocation refused"));
        }
        let id = BufferId(self.buffers.len());
        self.buffers.push(RecordedBuffer {
            label: label.to_owned(),
            data,
        });
        Ok(id)
    }

    fn check_uniform(&mut self, name: &str) {
        if !KNOWN_UNIFORMS.contains(&name) && self.warned_uniforms.insert(name.to_owned()) {
            log::warn!("uniform '{name}' does not exist");
        }
    }
}

impl RenderDevice for RecordingDevice {
    fn create_vertex_buffer(&mut self, label: &str, size: u64) -> Result<BufferId, RenderError> {
        let buffer = self.push_buffer(label, vec![0; size as usize])?;
        self.calls.push(DeviceCall::CreateVertexBuffer { buffer, size });
        Ok(buffer)
    }

    fn create_index_buffer(
        &mut self,
        label: &str,
        indices: &[u32],
    ) -> Result<BufferId, RenderError> {
        let buffer = self.push_buffer(label, bytemuck::cast_slice(indices).to_vec())?;
        self.calls.push(DeviceCall::CreateIndexBuffer {
            buffer,
            len: indices.len(),
        });
        Ok(buffer)
    }

    fn write_vertex_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) {
        let start = offset as usize;
        self.buffers[buffer.0].data[start..start + data.len()].copy_from_slice(data);
        self.calls.push(DeviceCall::WriteVertexBuffer {
            buffer,
            offset,
            len: data.len(),
        });
    }

    fn create_shader(&mut self, label: &str, source: &str) -> Result<ShaderHandle, RenderError> {
        if source.trim().is_empty() {
            return Err(RenderError::ShaderCompilation {
                label: label.to_owned(),
                message: "empty shader source".to_owned(),
            });
        }
        let shader = ShaderHandle(self.shaders);
        self.shaders += 1;
        self.calls.push(DeviceCall::CreateShader { shader });
        Ok(shader)
    }

    fn create_texture(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, RenderError> {
        if rgba.len() != (width * height * 4) as usize {
            return Err(RenderError::creation(
                "texture",
                label,
                format!("expected {} bytes, got {}", width * height * 4, rgba.len()),
            ));
        }
        let texture = TextureHandle(self.textures.len());
        self.textures.push(RecordedTexture {
            width,
            height,
            rgba: rgba.to_vec(),
        });
        self.calls.push(DeviceCall::CreateTexture {
            texture,
            width,
            height,
        });
        Ok(texture)
    }

    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures
            .get(texture.0)
            .map(|entry| (entry.width, entry.height))
    }

    fn bind_shader(&mut self, shader: ShaderHandle) {
        self.calls.push(DeviceCall::BindShader(shader));
    }

    fn set_uniform_mat4(&mut self, name: &str, value: Mat4) {
        self.check_uniform(name);
        self.calls.push(DeviceCall::SetUniformMat4 {
            name: name.to_owned(),
            value,
        });
    }

    fn set_uniform_i32_array(&mut self, name: &str, values: &[i32]) {
        self.check_uniform(name);
        self.calls.push(DeviceCall::SetUniformI32Array {
            name: name.to_owned(),
            values: values.to_vec(),
        });
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.calls.push(DeviceCall::BindTexture { unit, texture });
    }

    fn unbind_texture(&mut self, unit: u32) {
        self.calls.push(DeviceCall::UnbindTexture { unit });
    }

    fn draw_indexed(&mut self, vertex_buffer: BufferId, index_buffer: BufferId, index_count: u32) {
        self.calls.push(DeviceCall::DrawIndexed {
            vertex_buffer,
            index_buffer,
            index_count,
        });
    }

    fn unbind_shader(&mut self) {
        self.calls.push(DeviceCall::UnbindShader);
    }
}
