//! # Painter — Routing Quads into Batches
//!
//! The painter owns every [`Batch`] and decides, once per quad, which one it
//! lives in. That placement is final: a quad never migrates to another batch.
//!
//! ## Placement
//!
//! Batches are scanned in their current (depth-sorted) order and the first
//! one that fits wins:
//!
//! 1. same depth key as the quad, and a free quad slot;
//! 2. room for one more texture.
//!
//! Rule 2 does not check whether the quad's texture is already registered.
//! A batch with texture room accepts any quad. A batch whose eight texture
//! slots are full accepts nothing more, not even quads whose texture it
//! already holds or untextured ones.
//!
//! If nothing fits, a new batch is created for the quad's depth, started,
//! and the list is re-sorted by depth. Sorting only happens here, never per
//! frame: batch creation is rare next to drawing.
//!
//! ## Drawing
//!
//! [`Painter::render`] draws batches in ascending depth order, so lower
//! depths end up behind higher ones. Within one depth, batches draw in
//! creation order and quads in insertion order. There is no sub-sort.

use serde::Serialize;

use super::batch::Batch;
use super::sprite::SharedQuad;
use crate::camera::Camera;
use crate::config::PainterConfig;
use crate::error::RenderError;
use crate::render::{RenderDevice, ShaderHandle, TextureHandle};
use crate::resources::ResourceCache;

/// Per-frame numbers from [`Painter::render`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub batches: usize,
    pub draw_calls: usize,
    pub quads: usize,
    /// Batches whose vertex buffer was rewritten this frame.
    pub uploads: usize,
}

/// Owns the batches and drives the per-frame draw sequence.
pub struct Painter {
    batches: Vec<Batch>,
    max_batch_size: usize,
    shader: ShaderHandle,
}

impl Painter {
    /// A painter whose batches hold `max_batch_size` quads and draw with
    /// `shader`. A size of 0 is raised to 1.
    pub fn new(shader: ShaderHandle, max_batch_size: usize) -> Self {
        if max_batch_size == 0 {
            log::warn!("max_batch_size 0 raised to 1");
        }
        Self {
            batches: Vec::new(),
            max_batch_size: max_batch_size.max(1),
            shader,
        }
    }

    /// Build a painter from a config, resolving its shader through the cache.
    ///
    /// Fails if the shader can't be read or compiled; a painter without a
    /// working shader can't draw anything.
    pub fn with_resources(
        device: &mut impl RenderDevice,
        resources: &mut ResourceCache,
        config: &PainterConfig,
    ) -> Result<Self, RenderError> {
        let shader = match &config.shader {
            Some(path) => resources.shader(device, path)?,
            None => resources.default_shader(device)?,
        };
        Ok(Self::new(shader, config.max_batch_size))
    }

    /// Place a quad into the first batch that accepts it, or a new one.
    ///
    /// Adding the same quad twice draws it twice.
    pub fn add(&mut self, device: &mut impl RenderDevice, quad: SharedQuad) {
        let (depth, texture) = {
            let source = quad.borrow();
            (source.depth(), source.texture())
        };

        if let Some(batch) = self
            .batches
            .iter_mut()
            .find(|batch| accepts(batch, depth, texture))
        {
            batch.add_to_batch(quad);
            if !batch.is_started() {
                log::trace!(
                    "{} quads at depth {depth} queued in a batch with no GPU buffers",
                    batch.len()
                );
            }
            return;
        }

        let mut batch = Batch::new(depth, self.max_batch_size, self.shader);
        if let Err(err) = batch.start(device) {
            if cfg!(debug_assertions) {
                log::error!("failed to start batch at depth {depth}: {err}");
            }
        }
        batch.add_to_batch(quad);
        self.batches.push(batch);
        self.batches.sort_by_key(Batch::depth);

        log::debug!(
            "created batch at depth {depth} (capacity {}, {} batches total)",
            self.max_batch_size,
            self.batches.len()
        );
    }

    /// Draw every batch in depth order.
    pub fn render(&mut self, device: &mut impl RenderDevice, camera: &impl Camera) -> RenderStats {
        let mut stats = RenderStats {
            batches: self.batches.len(),
            ..Default::default()
        };

        for batch in &mut self.batches {
            let result = batch.draw(device, camera);
            if result.drawn {
                stats.draw_calls += 1;
                stats.quads += batch.len();
            }
            if result.uploaded {
                stats.uploads += 1;
            }
        }

        stats
    }

    /// Batches in draw order.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Total quads across all batches.
    pub fn quad_count(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}

/// First-fit acceptance test. See the module docs.
fn accepts(batch: &Batch, depth: i32, texture: Option<TextureHandle>) -> bool {
    if batch.depth() != depth || !batch.has_room() {
        return false;
    }
    // TODO: also accept quads whose texture is already registered, so full
    // texture batches keep filling with atlas sprites.
    (texture.is_none() && batch.has_texture(texture)) || batch.has_texture_room()
}
