//! Shared fixtures for the render2d tests.

use std::cell::RefCell;
use std::rc::Rc;

use super::vertex::QuadVertex;
use super::{Color, Sprite, SpriteRenderer};
use crate::math::Transform;
use crate::render::{BufferId, RecordingDevice, RenderDevice, TextureHandle};

/// Route `log` output through the test harness. Safe to call repeatedly.
pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn shared(quad: SpriteRenderer) -> Rc<RefCell<SpriteRenderer>> {
    Rc::new(RefCell::new(quad))
}

pub(crate) fn colored_quad(color: Color, depth: i32) -> SpriteRenderer {
    SpriteRenderer::colored(color, Transform::from_xy(0.0, 0.0).with_scale(8.0, 8.0), depth)
}

pub(crate) fn textured_quad(texture: TextureHandle, depth: i32) -> SpriteRenderer {
    SpriteRenderer::new(
        Sprite::new(Some(texture)),
        Transform::from_xy(0.0, 0.0).with_scale(8.0, 8.0),
        depth,
    )
}

/// Upload `count` distinct 1x1 textures.
pub(crate) fn make_textures(device: &mut RecordingDevice, count: usize) -> Vec<TextureHandle> {
    (0..count)
        .map(|i| {
            device
                .create_texture(&format!("texture {i}"), 1, 1, &[i as u8, 0, 0, 255])
                .unwrap()
        })
        .collect()
}

/// Decode what was last uploaded to a vertex buffer.
pub(crate) fn read_vertices(device: &RecordingDevice, buffer: BufferId) -> Vec<QuadVertex> {
    bytemuck::pod_collect_to_vec(device.buffer_data(buffer))
}
