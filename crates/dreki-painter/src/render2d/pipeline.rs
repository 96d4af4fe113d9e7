//! # Pipeline — The GPU Configuration for Drawing Batches
//!
//! A render pipeline bundles the shader, vertex layout, blend state and
//! primitive settings into one immutable wgpu object. One pipeline is built
//! per shader; every batch drawn with that shader binds it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ RenderPipeline                                              │
//! │                                                             │
//! │  Shader module ─── vs_main + fs_main (sprite.wgsl default)  │
//! │                                                             │
//! │  Vertex layout ─── QuadVertex { pos, color, uv, slot }      │
//! │                                                             │
//! │  Bind group layouts                                         │
//! │    group 0: camera uniform (projection, view, u_textures)   │
//! │    group 1: texture units 0..=8 + one sampler               │
//! │                                                             │
//! │  Blend state ─── ALPHA_BLENDING                             │
//! │  Primitive ───── TriangleList, no culling                   │
//! │  Depth/stencil ─ None (batches draw back to front)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Texture Units
//!
//! WGSL has no `sampler2D[]` that can be indexed per fragment without extra
//! device features, so the nine texture units are nine separate bindings and
//! the fragment shader picks one with a `switch`. Sampling uses
//! `textureSampleLevel` because implicit-derivative sampling is not allowed
//! under non-uniform control flow.

use super::vertex::QuadVertex;
use crate::render::TEXTURE_UNITS;

/// Source of the built-in quad shader.
pub(crate) const SPRITE_SHADER: &str = include_str!("sprite.wgsl");

/// Bind group layouts and the sampler shared by every quad pipeline.
pub(crate) struct PipelineLayouts {
    pub camera: wgpu::BindGroupLayout,
    pub textures: wgpu::BindGroupLayout,
    pub sampler: wgpu::Sampler,
}

impl PipelineLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        // Bind group layout 0: camera uniform
        let camera = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        // Bind group layout 1: one binding per texture unit, sampler last
        let mut entries: Vec<_> = (0..TEXTURE_UNITS)
            .map(|unit| wgpu::BindGroupLayoutEntry {
                binding: unit,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            })
            .collect();
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: TEXTURE_UNITS,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let textures = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture units bind group layout"),
            entries: &entries,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("quad sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            camera,
            textures,
            sampler,
        }
    }
}

/// Build a quad pipeline for `module`, rendering into `format`.
///
/// Does not check for errors; wrap the call in an error scope.
pub(crate) fn build_pipeline(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[&layouts.camera, &layouts.textures],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[QuadVertex::LAYOUT],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_shader_declares_every_texture_unit() {
        for unit in 0..TEXTURE_UNITS {
            let binding = format!("@group(1) @binding({unit}) var t_unit{unit}");
            assert!(SPRITE_SHADER.contains(&binding), "missing {binding}");
        }
        assert!(SPRITE_SHADER.contains(&format!("@binding({TEXTURE_UNITS}) var s_quad")));
    }

    #[test]
    fn builtin_shader_has_both_entry_points() {
        assert!(SPRITE_SHADER.contains("fn vs_main"));
        assert!(SPRITE_SHADER.contains("fn fs_main"));
    }
}
