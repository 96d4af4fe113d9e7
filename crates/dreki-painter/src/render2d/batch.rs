//! # Batch — Many Quads, One Draw Call
//!
//! A batch owns one vertex buffer, one index buffer, a fixed number of quad
//! slots and up to [`MAX_BATCH_TEXTURES`] texture slots. Every quad it holds
//! shares the batch's depth key, so the whole batch can be drawn with a single
//! `draw_indexed` call without breaking back-to-front ordering.
//!
//! ## Buffers
//!
//! ```text
//! slot i ──► vertices 4i..4i+3   (TR, BR, BL, TL)
//!        ──► indices  {4i+3, 4i+2, 4i,  4i, 4i+2, 4i+1}
//! ```
//!
//! The index pattern depends only on the slot number, so the index buffer is
//! generated once for the full capacity in [`Batch::start`] and never written
//! again. Only the vertex buffer changes from frame to frame.
//!
//! The batch keeps a CPU copy of every packed vertex. Adding a quad packs it
//! straight into that copy; drawing re-packs only quads whose dirty flag is
//! set, then uploads the whole array in one write if anything changed. A
//! frame where nothing moved costs no upload at all.
//!
//! ## Texture Slots
//!
//! Textures are registered in first-seen order and compared by handle, not
//! by content. A quad's texture slot is `1 + index` of its texture, or 0 when
//! it has none. Unit 0 always samples white, so slot 0 means "tint only".
//! Registered textures are never removed, so a texture keeps its slot for the
//! batch's whole life.
//!
//! ## Preconditions
//!
//! [`Batch::add_to_batch`] does not re-validate capacity: the
//! [`Painter`](super::Painter) checks [`Batch::has_room`] and
//! [`Batch::has_texture_room`] before every insertion. Violations trip a
//! `debug_assert!` in debug builds.

use bytemuck::Zeroable;

use super::sprite::{QuadSource, SharedQuad, quad_corners};
use super::vertex::{QUAD_INDICES, QUAD_VERTICES, QuadVertex};
use crate::camera::Camera;
use crate::error::RenderError;
use crate::render::{BufferId, RenderDevice, ShaderHandle, TextureHandle};

/// Distinct textures one batch can reference.
pub const MAX_BATCH_TEXTURES: usize = 8;

/// Slot→unit table handed to the shader as `u_textures`.
const TEXTURE_SAMPLER_SLOTS: [i32; MAX_BATCH_TEXTURES] = [0, 1, 2, 3, 4, 5, 6, 7];

/// Index data for `capacity` quads: two triangles per slot.
pub fn quad_indices(capacity: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(capacity * QUAD_INDICES);
    for slot in 0..capacity as u32 {
        let base = slot * QUAD_VERTICES as u32;
        indices.extend_from_slice(&[base + 3, base + 2, base, base, base + 2, base + 1]);
    }
    indices
}

#[derive(Debug, Clone, Copy)]
struct BatchBuffers {
    vertex: BufferId,
    index: BufferId,
}

/// What a single [`Batch::draw`] did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchDraw {
    /// The vertex buffer was rewritten.
    pub uploaded: bool,
    /// A draw call was issued.
    pub drawn: bool,
}

/// A fixed-capacity group of same-depth quads drawn with one call.
pub struct Batch {
    depth: i32,
    capacity: usize,
    shader: ShaderHandle,
    slots: Vec<SharedQuad>,
    textures: Vec<TextureHandle>,
    vertices: Vec<QuadVertex>,
    buffers: Option<BatchBuffers>,
    pending_upload: bool,
}

impl Batch {
    /// Create an empty batch. Call [`start`](Self::start) before adding quads.
    pub fn new(depth: i32, capacity: usize, shader: ShaderHandle) -> Self {
        Self {
            depth,
            capacity,
            shader,
            slots: Vec::with_capacity(capacity),
            textures: Vec::with_capacity(MAX_BATCH_TEXTURES),
            vertices: vec![QuadVertex::zeroed(); capacity * QUAD_VERTICES],
            buffers: None,
            pending_upload: false,
        }
    }

    /// Allocate the GPU buffers: an uninitialised vertex buffer sized for the
    /// full capacity and the static index buffer.
    pub fn start(&mut self, device: &mut impl RenderDevice) -> Result<(), RenderError> {
        debug_assert!(self.buffers.is_none(), "batch started twice");

        let size = std::mem::size_of_val(self.vertices.as_slice()) as u64;
        let vertex = device.create_vertex_buffer("batch vertex buffer", size)?;
        let index =
            device.create_index_buffer("batch index buffer", &quad_indices(self.capacity))?;
        self.buffers = Some(BatchBuffers { vertex, index });
        Ok(())
    }

    /// Place a quad in the next free slot and pack its vertices.
    ///
    /// The caller must have checked [`has_room`](Self::has_room) and, for a
    /// texture this batch hasn't seen, [`has_texture_room`](Self::has_texture_room).
    pub fn add_to_batch(&mut self, quad: SharedQuad) {
        let slot = self.slots.len();
        debug_assert!(slot < self.capacity, "batch is full");
        {
            let source = quad.borrow();
            debug_assert_eq!(source.depth(), self.depth, "quad depth differs from batch depth");

            if let Some(texture) = source.texture() {
                if !self.textures.contains(&texture) {
                    debug_assert!(self.has_texture_room(), "batch texture slots exhausted");
                    self.textures.push(texture);
                }
            }

            let start = slot * QUAD_VERTICES;
            self.vertices[start..start + QUAD_VERTICES]
                .copy_from_slice(&pack_quad(&*source, &self.textures));
        }
        self.slots.push(quad);
        self.pending_upload = true;
    }

    /// Re-pack dirty quads, upload if anything changed, then draw every quad
    /// in one call.
    pub fn draw(&mut self, device: &mut impl RenderDevice, camera: &impl Camera) -> BatchDraw {
        let Some(buffers) = self.buffers else {
            log::trace!("skipping batch at depth {}: no GPU buffers", self.depth);
            return BatchDraw::default();
        };

        for (slot, quad) in self.slots.iter().enumerate() {
            let mut quad = quad.borrow_mut();
            if quad.is_dirty() {
                let start = slot * QUAD_VERTICES;
                self.vertices[start..start + QUAD_VERTICES]
                    .copy_from_slice(&pack_quad(&*quad, &self.textures));
                quad.clean();
                self.pending_upload = true;
            }
        }

        let uploaded = std::mem::take(&mut self.pending_upload);
        if uploaded {
            log::trace!(
                "uploading {} quads for batch at depth {}",
                self.slots.len(),
                self.depth
            );
            device.write_vertex_buffer(buffers.vertex, 0, bytemuck::cast_slice(&self.vertices));
        }

        device.bind_shader(self.shader);
        device.set_uniform_mat4("u_projection", camera.projection_matrix());
        device.set_uniform_mat4("u_view", camera.view_matrix());
        for (index, &texture) in self.textures.iter().enumerate() {
            device.bind_texture(index as u32 + 1, texture);
        }
        device.set_uniform_i32_array("u_textures", &TEXTURE_SAMPLER_SLOTS);

        device.draw_indexed(
            buffers.vertex,
            buffers.index,
            (self.slots.len() * QUAD_INDICES) as u32,
        );

        for unit in 1..=self.textures.len() as u32 {
            device.unbind_texture(unit);
        }
        device.unbind_shader();

        BatchDraw {
            uploaded,
            drawn: true,
        }
    }

    /// The depth key every quad in this batch shares.
    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn has_room(&self) -> bool {
        self.slots.len() < self.capacity
    }

    pub fn has_texture_room(&self) -> bool {
        self.textures.len() < MAX_BATCH_TEXTURES
    }

    /// Whether `texture` is already registered. `None` is never registered.
    pub fn has_texture(&self, texture: Option<TextureHandle>) -> bool {
        texture.is_some_and(|texture| self.textures.contains(&texture))
    }

    /// Registered textures in slot order (slot = index + 1).
    pub fn textures(&self) -> &[TextureHandle] {
        &self.textures
    }

    /// Quads in slot order.
    pub fn quads(&self) -> &[SharedQuad] {
        &self.slots
    }

    /// The CPU copy of the packed vertices for occupied slots.
    pub fn vertices(&self) -> &[QuadVertex] {
        &self.vertices[..self.slots.len() * QUAD_VERTICES]
    }

    /// Whether [`start`](Self::start) succeeded.
    pub fn is_started(&self) -> bool {
        self.buffers.is_some()
    }

    /// `None` until [`start`](Self::start) succeeds.
    pub fn vertex_buffer(&self) -> Option<BufferId> {
        self.buffers.map(|buffers| buffers.vertex)
    }

    pub fn index_buffer(&self) -> Option<BufferId> {
        self.buffers.map(|buffers| buffers.index)
    }
}

/// Pack one quad's four vertices.
pub(crate) fn pack_quad(quad: &dyn QuadSource, textures: &[TextureHandle]) -> [QuadVertex; 4] {
    let color = quad.color().to_array();
    let tex_slot = texture_slot(textures, quad.texture());
    let corners = quad_corners(quad.position(), quad.scale());
    let uvs = quad.uvs();

    std::array::from_fn(|i| QuadVertex {
        position: corners[i].to_array(),
        color,
        uv: uvs[i].to_array(),
        tex_slot,
    })
}

fn texture_slot(textures: &[TextureHandle], texture: Option<TextureHandle>) -> f32 {
    texture
        .and_then(|texture| textures.iter().position(|&known| known == texture))
        .map_or(0.0, |index| (index + 1) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera2d;
    use crate::math::{Transform, Vec2};
    use crate::render::{DeviceCall, RecordingDevice};
    use crate::render2d::{Color, SpriteRenderer};
    use crate::render2d::testing::{
        colored_quad, make_textures, read_vertices, shared, textured_quad,
    };

    fn started_batch(device: &mut RecordingDevice, capacity: usize) -> Batch {
        let shader = device.create_shader("test", "fn main() {}").unwrap();
        let mut batch = Batch::new(0, capacity, shader);
        batch.start(device).unwrap();
        batch
    }

    #[test]
    fn index_pattern_depends_only_on_slot() {
        let indices = quad_indices(3);
        assert_eq!(indices.len(), 18);
        for slot in 0..3u32 {
            let i = slot as usize * 6;
            let b = slot * 4;
            assert_eq!(&indices[i..i + 6], &[b + 3, b + 2, b, b, b + 2, b + 1]);
        }
    }

    #[test]
    fn start_allocates_buffers_for_full_capacity() {
        let mut device = RecordingDevice::new();
        let batch = started_batch(&mut device, 10);

        let vb = batch.vertex_buffer().unwrap();
        let ib = batch.index_buffer().unwrap();
        assert_eq!(device.buffer_data(vb).len(), 10 * 4 * 36);

        let indices: Vec<u32> = bytemuck::pod_collect_to_vec(device.buffer_data(ib));
        assert_eq!(indices, quad_indices(10));
    }

    #[test]
    fn index_buffer_is_never_rewritten() {
        let mut device = RecordingDevice::new();
        let mut batch = started_batch(&mut device, 4);
        let ib = batch.index_buffer().unwrap();
        let camera = Camera2d::default();

        batch.add_to_batch(shared(colored_quad(Color::RED, 0)));
        batch.draw(&mut device, &camera);
        batch.add_to_batch(shared(colored_quad(Color::GREEN, 0)));
        batch.draw(&mut device, &camera);

        assert!(!device.calls().iter().any(|call| matches!(
            call,
            DeviceCall::WriteVertexBuffer { buffer, .. } if *buffer == ib
        )));
    }

    #[test]
    fn add_packs_vertices_at_slot_offset() {
        let mut device = RecordingDevice::new();
        let mut batch = started_batch(&mut device, 4);

        batch.add_to_batch(shared(colored_quad(Color::RED, 0)));
        let quad = SpriteRenderer::colored(
            Color::WHITE,
            Transform::from_xy(5.0, 7.0).with_scale(2.0, 3.0),
            0,
        );
        batch.add_to_batch(shared(quad));

        let second = &batch.vertices()[4..8];
        assert_eq!(second[0].position, [7.0, 10.0]);
        assert_eq!(second[1].position, [7.0, 7.0]);
        assert_eq!(second[2].position, [5.0, 7.0]);
        assert_eq!(second[3].position, [5.0, 10.0]);
        assert!(second.iter().all(|v| v.tex_slot == 0.0));
        assert!(second.iter().all(|v| v.color == [1.0, 1.0, 1.0, 1.0]));
    }

    #[test]
    fn has_room_turns_false_at_capacity() {
        let mut device = RecordingDevice::new();
        let mut batch = started_batch(&mut device, 2);

        batch.add_to_batch(shared(colored_quad(Color::RED, 0)));
        assert!(batch.has_room());
        batch.add_to_batch(shared(colored_quad(Color::RED, 0)));
        assert!(!batch.has_room());
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn textures_register_once_by_identity() {
        let mut device = RecordingDevice::new();
        let textures = make_textures(&mut device, 2);
        let mut batch = started_batch(&mut device, 8);

        batch.add_to_batch(shared(textured_quad(textures[0], 0)));
        batch.add_to_batch(shared(textured_quad(textures[1], 0)));
        batch.add_to_batch(shared(textured_quad(textures[0], 0)));

        assert_eq!(batch.textures(), &textures[..]);
        assert!(batch.has_texture(Some(textures[1])));
        assert!(!batch.has_texture(None));

        let slots: Vec<f32> = batch.vertices().chunks(4).map(|q| q[0].tex_slot).collect();
        assert_eq!(slots, vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn texture_room_runs_out_at_eight() {
        let mut device = RecordingDevice::new();
        let textures = make_textures(&mut device, MAX_BATCH_TEXTURES);
        let mut batch = started_batch(&mut device, 16);

        for &texture in &textures {
            assert!(batch.has_texture_room());
            batch.add_to_batch(shared(textured_quad(texture, 0)));
        }
        assert!(!batch.has_texture_room());
        assert_eq!(batch.textures().len(), MAX_BATCH_TEXTURES);
    }

    #[test]
    fn texture_slot_is_stable_after_redraws() {
        let mut device = RecordingDevice::new();
        let textures = make_textures(&mut device, 3);
        let mut batch = started_batch(&mut device, 8);
        let camera = Camera2d::default();

        let late = shared(textured_quad(textures[2], 0));
        batch.add_to_batch(shared(textured_quad(textures[0], 0)));
        batch.add_to_batch(late.clone());
        batch.draw(&mut device, &camera);

        batch.add_to_batch(shared(textured_quad(textures[1], 0)));
        late.borrow_mut().set_color(Color::BLUE);
        batch.draw(&mut device, &camera);

        assert!(batch.vertices()[4..8].iter().all(|v| v.tex_slot == 2.0));
        assert!(batch.vertices()[8..12].iter().all(|v| v.tex_slot == 3.0));
    }

    #[test]
    fn draw_cleans_dirty_quads_and_matches_fresh_pack() {
        let mut device = RecordingDevice::new();
        let textures = make_textures(&mut device, 1);
        let mut batch = started_batch(&mut device, 4);
        let camera = Camera2d::default();

        let a = shared(colored_quad(Color::RED, 0));
        let b = shared(textured_quad(textures[0], 0));
        batch.add_to_batch(a.clone());
        batch.add_to_batch(b.clone());
        batch.draw(&mut device, &camera);

        b.borrow_mut().transform_mut().position = Vec2::new(40.0, 50.0);
        b.borrow_mut().update();
        assert!(b.borrow().is_dirty());

        batch.draw(&mut device, &camera);

        assert!(!a.borrow().is_dirty());
        assert!(!b.borrow().is_dirty());
        let fresh = pack_quad(&*b.borrow(), batch.textures());
        assert_eq!(&batch.vertices()[4..8], &fresh);

        let uploaded = read_vertices(&device, batch.vertex_buffer().unwrap());
        assert_eq!(&uploaded[4..8], &fresh);
    }

    #[test]
    fn tint_change_uploads_exactly_once() {
        let mut device = RecordingDevice::new();
        let mut batch = started_batch(&mut device, 4);
        let camera = Camera2d::default();

        let quad = shared(colored_quad(Color::RED, 0));
        batch.add_to_batch(shared(colored_quad(Color::GREEN, 0)));
        batch.add_to_batch(quad.clone());
        batch.draw(&mut device, &camera);
        device.clear_calls();

        quad.borrow_mut().set_color(Color::BLUE);
        let first = batch.draw(&mut device, &camera);
        assert!(first.uploaded);
        assert_eq!(device.upload_count(), 1);

        let uploaded = read_vertices(&device, batch.vertex_buffer().unwrap());
        assert!(uploaded[4..8].iter().all(|v| v.color == Color::BLUE.to_array()));
        assert!(uploaded[0..4].iter().all(|v| v.color == Color::GREEN.to_array()));

        device.clear_calls();
        let second = batch.draw(&mut device, &camera);
        assert!(!second.uploaded);
        assert!(second.drawn);
        assert_eq!(device.upload_count(), 0);
        assert_eq!(device.draw_count(), 1);
    }

    #[test]
    fn clean_quads_added_later_are_still_uploaded() {
        let mut device = RecordingDevice::new();
        let mut batch = started_batch(&mut device, 4);
        let camera = Camera2d::default();

        let quad = shared(colored_quad(Color::RED, 0));
        quad.borrow_mut().clean();
        batch.add_to_batch(quad);

        assert!(batch.draw(&mut device, &camera).uploaded);
        assert!(!batch.draw(&mut device, &camera).uploaded);
    }

    #[test]
    fn draw_issues_calls_in_order() {
        let mut device = RecordingDevice::new();
        let textures = make_textures(&mut device, 2);
        let mut batch = started_batch(&mut device, 4);
        let camera = Camera2d::default();

        batch.add_to_batch(shared(textured_quad(textures[0], 0)));
        batch.add_to_batch(shared(textured_quad(textures[1], 0)));
        batch.add_to_batch(shared(colored_quad(Color::RED, 0)));
        batch.draw(&mut device, &camera);

        let vb = batch.vertex_buffer().unwrap();
        let ib = batch.index_buffer().unwrap();
        let calls: Vec<&DeviceCall> = device
            .calls()
            .iter()
            .skip_while(|call| !matches!(call, DeviceCall::WriteVertexBuffer { .. }))
            .collect();

        assert!(matches!(calls[0], DeviceCall::WriteVertexBuffer { offset: 0, .. }));
        assert!(matches!(calls[1], DeviceCall::BindShader(_)));
        assert_eq!(
            calls[2],
            &DeviceCall::SetUniformMat4 {
                name: "u_projection".into(),
                value: camera.projection_matrix(),
            }
        );
        assert_eq!(
            calls[3],
            &DeviceCall::SetUniformMat4 {
                name: "u_view".into(),
                value: camera.view_matrix(),
            }
        );
        assert_eq!(calls[4], &DeviceCall::BindTexture { unit: 1, texture: textures[0] });
        assert_eq!(calls[5], &DeviceCall::BindTexture { unit: 2, texture: textures[1] });
        assert_eq!(
            calls[6],
            &DeviceCall::SetUniformI32Array {
                name: "u_textures".into(),
                values: vec![0, 1, 2, 3, 4, 5, 6, 7],
            }
        );
        assert_eq!(
            calls[7],
            &DeviceCall::DrawIndexed {
                vertex_buffer: vb,
                index_buffer: ib,
                index_count: 18,
            }
        );
        assert_eq!(calls[8], &DeviceCall::UnbindTexture { unit: 1 });
        assert_eq!(calls[9], &DeviceCall::UnbindTexture { unit: 2 });
        assert_eq!(calls[10], &DeviceCall::UnbindShader);
        assert_eq!(calls.len(), 11);
    }

    #[test]
    fn unstarted_batch_skips_draw() {
        let mut device = RecordingDevice::new();
        let shader = device.create_shader("test", "fn main() {}").unwrap();
        let mut batch = Batch::new(0, 4, shader);
        batch.add_to_batch(shared(colored_quad(Color::RED, 0)));

        let result = batch.draw(&mut device, &Camera2d::default());
        assert_eq!(result, BatchDraw::default());
        assert_eq!(device.draw_count(), 0);
    }

    #[test]
    fn failed_start_leaves_batch_unstarted() {
        let mut device = RecordingDevice::new();
        let shader = device.create_shader("test", "fn main() {}").unwrap();
        device.fail_buffer_creation(true);

        let mut batch = Batch::new(0, 4, shader);
        assert!(batch.start(&mut device).is_err());
        assert!(batch.vertex_buffer().is_none());
    }

}
