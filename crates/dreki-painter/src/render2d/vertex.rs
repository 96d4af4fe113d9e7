//! # Vertex — Per-Corner Data Sent to the GPU
//!
//! Every quad has four vertices (the corners). Each vertex carries what the
//! shader needs to draw it: a world position, a tint color, a texture
//! coordinate and the texture slot to sample from. These are packed into a
//! flat struct and uploaded to the batch's vertex buffer.
//!
//! ## Memory Layout
//!
//! ```text
//! QuadVertex (36 bytes = 9 floats per vertex)
//! ┌──────────────┬────────────────────┬──────────────┬────────────┐
//! │ position     │ color              │ uv           │ tex_slot   │
//! │ [f32; 2]     │ [f32; 4]           │ [f32; 2]     │ f32        │
//! │ offset 0     │ offset 8           │ offset 24    │ offset 32  │
//! │ location(0)  │ location(1)        │ location(2)  │ location(3)│
//! └──────────────┴────────────────────┴──────────────┴────────────┘
//! ```
//!
//! The texture slot is stored as a float so the whole vertex is one
//! homogeneous run of `f32`s; the shader rounds it back to an integer.
//!
//! ## Uniforms
//!
//! [`CameraUniform`] holds the two camera matrices plus the slot→unit table
//! the batch sets through `u_textures`. Arrays in WGSL uniform buffers need a
//! 16-byte element stride, so the eight slot entries travel as two `vec4<i32>`.

use bytemuck::{Pod, Zeroable};

/// Floats per vertex.
pub const VERTEX_FLOATS: usize = 9;

/// Vertices per quad.
pub const QUAD_VERTICES: usize = 4;

/// Indices per quad (two triangles).
pub const QUAD_INDICES: usize = 6;

/// Per-vertex data for batched quads. Position is already in world space.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
    pub uv: [f32; 2],
    pub tex_slot: f32,
}

impl QuadVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            // color
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x4,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
            // texture slot
            wgpu::VertexAttribute {
                offset: 32,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32,
            },
        ],
    };
}

/// Camera matrices and texture slot table, uploaded as one uniform buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct CameraUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub texture_units: [[i32; 4]; 2],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            projection: glam::Mat4::IDENTITY.to_cols_array_2d(),
            view: glam::Mat4::IDENTITY.to_cols_array_2d(),
            texture_units: [[0, 1, 2, 3], [4, 5, 6, 7]],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_nine_tightly_packed_floats() {
        assert_eq!(
            std::mem::size_of::<QuadVertex>(),
            VERTEX_FLOATS * std::mem::size_of::<f32>()
        );
        assert_eq!(QuadVertex::LAYOUT.array_stride, 36);
    }

    #[test]
    fn camera_uniform_is_sixteen_byte_aligned() {
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
    }
}
