//! # WgpuDevice — Immediate-Mode Calls, Deferred wgpu Pass
//!
//! Batches issue GL-style calls: bind a shader, set uniforms, bind textures
//! to units, draw. wgpu wants all of that inside a render pass that borrows
//! its resources for the pass's lifetime. [`WgpuDevice`] bridges the two by
//! snapshotting the bound state at every `draw_indexed` into a
//! [`DrawCommand`] and replaying the list when the frame is presented.
//!
//! ```text
//!  Batch::draw                        WgpuDevice
//!  ───────────                        ──────────
//!  bind_shader(s)          ──►  bound_shader = s
//!  set_uniform_mat4(..)    ──►  camera uniform (CPU copy)
//!  bind_texture(u, t)      ──►  units[u] = t
//!  draw_indexed(vb, ib, n) ──►  push DrawCommand {
//!                                   pipeline, camera bind group,
//!                                   unit bind group, vb, ib, n }
//!  ...
//!  present()               ──►  one render pass, replay commands,
//!                               submit, present, clear commands
//! ```
//!
//! ## Bind Groups
//!
//! - **Camera (group 0):** one small uniform buffer per distinct camera state
//!   in a frame. Every batch normally sees the same camera, so a frame
//!   usually creates exactly one.
//! - **Texture units (group 1):** cached for the life of the device, keyed
//!   by the nine bound texture handles. Empty units sample a 1×1 white
//!   texture. Texture views never change after creation, so cached groups
//!   never go stale.
//!
//! ## Vertex Uploads
//!
//! `write_vertex_buffer` goes through `Queue::write_buffer`, which is staged
//! and applied before the next submit. Every batch writes at most once per
//! frame, so all draws in a pass see that frame's vertices.
//!
//! ## Errors
//!
//! Resource creation is wrapped in a validation error scope, the same way
//! shader hot-reload checks a candidate pipeline before swapping it in.
//! Failures come back as [`RenderError`]; logging them is up to the caller.

use std::collections::{HashMap, HashSet};

use wgpu::util::DeviceExt;

use super::device::{BufferId, RenderDevice, ShaderHandle, TEXTURE_UNITS, TextureHandle};
use super::gpu::GpuContext;
use super::target::RenderTarget;
use crate::error::RenderError;
use crate::math::Mat4;
use crate::render2d::CameraUniform;
use crate::render2d::pipeline::{self, PipelineLayouts};

/// The texture bound to each unit at draw time.
type UnitBindings = [Option<TextureHandle>; TEXTURE_UNITS as usize];

/// Format of textures uploaded through [`RenderDevice::create_texture`].
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

struct TextureEntry {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

struct CameraBinding {
    uniform: CameraUniform,
    _buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Snapshot of the bound state for one indexed draw.
struct DrawCommand {
    shader: ShaderHandle,
    camera: usize,
    units: UnitBindings,
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    index_count: u32,
}

/// [`RenderDevice`] backed by wgpu. See the module docs.
pub struct WgpuDevice {
    gpu: GpuContext,
    layouts: PipelineLayouts,
    white: TextureEntry,
    buffers: Vec<wgpu::Buffer>,
    pipelines: Vec<wgpu::RenderPipeline>,
    textures: Vec<TextureEntry>,

    bound_shader: Option<ShaderHandle>,
    uniform: CameraUniform,
    units: UnitBindings,

    commands: Vec<DrawCommand>,
    cameras: Vec<CameraBinding>,
    unit_groups: HashMap<UnitBindings, wgpu::BindGroup>,
    warned_uniforms: HashSet<String>,
    clear_color: wgpu::Color,
}

impl WgpuDevice {
    pub fn new(gpu: GpuContext) -> Self {
        let layouts = PipelineLayouts::new(&gpu.device);
        let white = upload_texture(&gpu, "white 1x1", 1, 1, &[255, 255, 255, 255]);

        Self {
            gpu,
            layouts,
            white,
            buffers: Vec::new(),
            pipelines: Vec::new(),
            textures: Vec::new(),
            bound_shader: None,
            uniform: CameraUniform::default(),
            units: [None; TEXTURE_UNITS as usize],
            commands: Vec::new(),
            cameras: Vec::new(),
            unit_groups: HashMap::new(),
            warned_uniforms: HashSet::new(),
            clear_color: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.15,
                a: 1.0,
            },
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Resize the window surface.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    /// Background colour every replayed pass clears to.
    pub fn set_clear_color(&mut self, color: [f64; 4]) {
        self.clear_color = wgpu::Color {
            r: color[0],
            g: color[1],
            b: color[2],
            a: color[3],
        };
    }

    /// Draw everything recorded this frame to the window and end the frame.
    ///
    /// If the surface texture can't be acquired the frame is dropped and the
    /// error returned; the caller decides whether to reconfigure or exit.
    pub fn present(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(err) => {
                self.end_frame();
                return Err(err);
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.replay(&view, "frame pass");
        output.present();
        self.end_frame();
        Ok(())
    }

    /// Draw everything recorded so far into an off-screen target. The frame
    /// stays open, so it can still be presented afterwards.
    pub fn render_to_target(&self, target: &RenderTarget) {
        match self.textures.get(target.texture().0) {
            Some(entry) => self.replay(&entry.view, "render target pass"),
            None => log::error!("render target {:?} is not known to this device", target),
        }
    }

    /// Drop this frame's recorded draws without drawing them.
    pub fn end_frame(&mut self) {
        self.commands.clear();
        self.cameras.clear();
    }

    /// Create an off-screen colour target in the surface format.
    pub fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<RenderTarget, RenderError> {
        let format = self.gpu.surface_format();
        let entry = self.scoped("render target", "render target", |gpu| {
            let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("render target"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            TextureEntry {
                _texture: texture,
                view,
                width,
                height,
            }
        })?;

        let texture = TextureHandle(self.textures.len());
        self.textures.push(entry);
        log::debug!("created {width}x{height} render target {texture:?}");
        Ok(RenderTarget::new(texture, width, height))
    }

    /// Run `create` inside a validation error scope.
    fn scoped<T>(
        &self,
        kind: &'static str,
        label: &str,
        create: impl FnOnce(&GpuContext) -> T,
    ) -> Result<T, RenderError> {
        self.gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(&self.gpu);
        match pollster::block_on(self.gpu.device.pop_error_scope()) {
            Some(err) => Err(RenderError::creation(kind, label, err)),
            None => Ok(value),
        }
    }

    /// Index of a camera bind group matching the current uniform state.
    fn current_camera(&mut self) -> usize {
        if let Some(index) = self
            .cameras
            .iter()
            .position(|camera| camera.uniform == self.uniform)
        {
            return index;
        }

        let buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("camera uniform buffer"),
                contents: bytemuck::cast_slice(&[self.uniform]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = self.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera bind group"),
            layout: &self.layouts.camera,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        self.cameras.push(CameraBinding {
            uniform: self.uniform,
            _buffer: buffer,
            bind_group,
        });
        self.cameras.len() - 1
    }

    fn unit_bind_group(&self, units: &UnitBindings) -> wgpu::BindGroup {
        let views: Vec<&wgpu::TextureView> = units
            .iter()
            .map(|unit| {
                unit.and_then(|texture| self.textures.get(texture.0))
                    .map_or(&self.white.view, |entry| &entry.view)
            })
            .collect();

        let mut entries: Vec<wgpu::BindGroupEntry> = views
            .iter()
            .enumerate()
            .map(|(binding, view)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: TEXTURE_UNITS,
            resource: wgpu::BindingResource::Sampler(&self.layouts.sampler),
        });

        self.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texture units bind group"),
            layout: &self.layouts.textures,
            entries: &entries,
        })
    }

    /// Encode one pass that clears `view` and replays every recorded draw.
    fn replay(&self, view: &wgpu::TextureView, label: &str) {
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for command in &self.commands {
                let (Some(pipeline), Some(units), Some(vertices), Some(indices)) = (
                    self.pipelines.get(command.shader.0),
                    self.unit_groups.get(&command.units),
                    self.buffers.get(command.vertex_buffer.0),
                    self.buffers.get(command.index_buffer.0),
                ) else {
                    log::trace!("skipping draw with unknown resources");
                    continue;
                };

                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.cameras[command.camera].bind_group, &[]);
                pass.set_bind_group(1, units, &[]);
                pass.set_vertex_buffer(0, vertices.slice(..));
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..command.index_count, 0, 0..1);
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        log::trace!("{label}: replayed {} draws", self.commands.len());
    }

    fn warn_unknown_uniform(&mut self, name: &str) {
        if self.warned_uniforms.insert(name.to_owned()) {
            log::warn!("uniform '{name}' does not exist");
        }
    }
}

impl RenderDevice for WgpuDevice {
    fn create_vertex_buffer(&mut self, label: &str, size: u64) -> Result<BufferId, RenderError> {
        let buffer = self.scoped("buffer", label, |gpu| {
            gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })?;
        self.buffers.push(buffer);
        Ok(BufferId(self.buffers.len() - 1))
    }

    fn create_index_buffer(
        &mut self,
        label: &str,
        indices: &[u32],
    ) -> Result<BufferId, RenderError> {
        let buffer = self.scoped("buffer", label, |gpu| {
            gpu.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
        })?;
        self.buffers.push(buffer);
        Ok(BufferId(self.buffers.len() - 1))
    }

    fn write_vertex_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) {
        match self.buffers.get(buffer.0) {
            Some(target) => self.gpu.queue.write_buffer(target, offset, data),
            None => log::error!("write to unknown buffer {buffer:?}"),
        }
    }

    fn create_shader(&mut self, label: &str, source: &str) -> Result<ShaderHandle, RenderError> {
        let device = &self.gpu.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let candidate = pipeline::build_pipeline(
            device,
            &self.layouts,
            &module,
            self.gpu.surface_format(),
            label,
        );

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::ShaderCompilation {
                label: label.to_owned(),
                message: err.to_string(),
            });
        }

        self.pipelines.push(candidate);
        log::debug!("compiled shader '{label}'");
        Ok(ShaderHandle(self.pipelines.len() - 1))
    }

    fn create_texture(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, RenderError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(RenderError::creation(
                "texture",
                label,
                format!("expected {expected} bytes, got {}", rgba.len()),
            ));
        }

        let entry = self.scoped("texture", label, |gpu| {
            upload_texture(gpu, label, width, height, rgba)
        })?;
        self.textures.push(entry);
        Ok(TextureHandle(self.textures.len() - 1))
    }

    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures
            .get(texture.0)
            .map(|entry| (entry.width, entry.height))
    }

    fn bind_shader(&mut self, shader: ShaderHandle) {
        self.bound_shader = Some(shader);
    }

    fn set_uniform_mat4(&mut self, name: &str, value: Mat4) {
        match name {
            "u_projection" => self.uniform.projection = value.to_cols_array_2d(),
            "u_view" => self.uniform.view = value.to_cols_array_2d(),
            _ => self.warn_unknown_uniform(name),
        }
    }

    fn set_uniform_i32_array(&mut self, name: &str, values: &[i32]) {
        if name != "u_textures" {
            self.warn_unknown_uniform(name);
            return;
        }
        for (slot, &unit) in values.iter().take(8).enumerate() {
            self.uniform.texture_units[slot / 4][slot % 4] = unit;
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        match self.units.get_mut(unit as usize) {
            Some(bound) => *bound = Some(texture),
            None => log::warn!("texture unit {unit} out of range (0..{TEXTURE_UNITS})"),
        }
    }

    fn unbind_texture(&mut self, unit: u32) {
        if let Some(bound) = self.units.get_mut(unit as usize) {
            *bound = None;
        }
    }

    fn draw_indexed(&mut self, vertex_buffer: BufferId, index_buffer: BufferId, index_count: u32) {
        let Some(shader) = self.bound_shader else {
            log::warn!("draw_indexed with no shader bound, skipped");
            return;
        };

        let camera = self.current_camera();
        if !self.unit_groups.contains_key(&self.units) {
            let group = self.unit_bind_group(&self.units);
            self.unit_groups.insert(self.units, group);
        }

        self.commands.push(DrawCommand {
            shader,
            camera,
            units: self.units,
            vertex_buffer,
            index_buffer,
            index_count,
        });
    }

    fn unbind_shader(&mut self) {
        self.bound_shader = None;
    }
}

fn upload_texture(
    gpu: &GpuContext,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> TextureEntry {
    let texture = gpu.device.create_texture_with_data(
        &gpu.queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        rgba,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    TextureEntry {
        _texture: texture,
        view,
        width,
        height,
    }
}
