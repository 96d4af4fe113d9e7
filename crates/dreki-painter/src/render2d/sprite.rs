//! # Sprite — What a Batch Needs to Know About a Quad
//!
//! The painter doesn't care what owns a quad: a game object, a particle, a
//! tile. It only needs a narrow view of it: where it is, how big, what tint,
//! which texture and which part of it, which depth layer, and whether any of
//! that changed since it was last packed. [`QuadSource`] is that view.
//!
//! Quads are shared between their owner (which mutates them during the update
//! phase) and the batch slot that references them (which reads and cleans
//! them during the render phase). Both phases run on the render thread one
//! after the other, so a [`SharedQuad`] is a plain `Rc<RefCell<_>>`.
//!
//! ## Dirty Tracking
//!
//! A batch only re-packs quads whose dirty flag is set, and clears the flag
//! once the new vertices are in its buffer. [`SpriteRenderer`] sets the flag
//! when constructed, when its colour or sprite changes, and when
//! [`SpriteRenderer::update`] sees that its transform moved.
//!
//! ## Corner Order
//!
//! Quads are anchored at their bottom-left corner and `scale` is their size.
//! The four corners are always listed top-right, bottom-right, bottom-left,
//! top-left, the same order as a sprite's UVs.

use std::cell::RefCell;
use std::rc::Rc;

use super::Color;
use crate::math::{Rect, Transform, Vec2};
use crate::render::TextureHandle;

/// The renderable-quad capability a batch reads from.
pub trait QuadSource {
    /// Bottom-left corner in world space.
    fn position(&self) -> Vec2;
    /// Width and height in world units.
    fn scale(&self) -> Vec2;
    fn color(&self) -> Color;
    /// `None` draws an untextured, tint-only quad.
    fn texture(&self) -> Option<TextureHandle>;
    /// UVs for the top-right, bottom-right, bottom-left and top-left corners.
    fn uvs(&self) -> [Vec2; 4];
    /// Z-order key. Lower draws first (further back).
    fn depth(&self) -> i32;
    fn is_dirty(&self) -> bool;
    /// Mark the quad as packed.
    fn clean(&mut self);
}

/// A quad shared between its owner and the batch slot drawing it.
pub type SharedQuad = Rc<RefCell<dyn QuadSource>>;

/// A texture plus the region of it to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub texture: Option<TextureHandle>,
    pub uvs: [Vec2; 4],
}

impl Sprite {
    /// The whole texture, or an untextured sprite for `None`.
    pub fn new(texture: Option<TextureHandle>) -> Self {
        Self::from_rect(texture, Rect::FULL)
    }

    /// A sub-region of a texture.
    pub fn from_rect(texture: Option<TextureHandle>, rect: Rect) -> Self {
        Self {
            texture,
            uvs: rect.corners(),
        }
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self::new(None)
    }
}

/// The stock [`QuadSource`]: a sprite with a transform, tint and depth.
#[derive(Debug, Clone)]
pub struct SpriteRenderer {
    transform: Transform,
    last_transform: Transform,
    color: Color,
    sprite: Sprite,
    z_index: i32,
    dirty: bool,
}

impl SpriteRenderer {
    /// A textured sprite with a white tint.
    pub fn new(sprite: Sprite, transform: Transform, z_index: i32) -> Self {
        Self {
            transform,
            last_transform: transform,
            color: Color::WHITE,
            sprite,
            z_index,
            dirty: true,
        }
    }

    /// An untextured quad in a solid colour.
    pub fn colored(color: Color, transform: Transform, z_index: i32) -> Self {
        Self {
            color,
            ..Self::new(Sprite::default(), transform, z_index)
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Mutable access to the transform. Changes are picked up by
    /// [`update`](Self::update).
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    /// Swap the sprite. Always marks the quad dirty.
    pub fn set_sprite(&mut self, sprite: Sprite) {
        self.sprite = sprite;
        self.dirty = true;
    }

    /// Change the tint. Marks the quad dirty only if the colour differs.
    pub fn set_color(&mut self, color: Color) {
        if self.color == color {
            return;
        }
        self.color = color;
        self.dirty = true;
    }

    /// Per-frame update: flag the quad if its transform moved since the last
    /// call.
    pub fn update(&mut self) {
        if self.last_transform != self.transform {
            self.last_transform = self.transform;
            self.dirty = true;
        }
    }
}

impl QuadSource for SpriteRenderer {
    fn position(&self) -> Vec2 {
        self.transform.position
    }

    fn scale(&self) -> Vec2 {
        self.transform.scale
    }

    fn color(&self) -> Color {
        self.color
    }

    fn texture(&self) -> Option<TextureHandle> {
        self.sprite.texture
    }

    fn uvs(&self) -> [Vec2; 4] {
        self.sprite.uvs
    }

    fn depth(&self) -> i32 {
        self.z_index
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn clean(&mut self) {
        self.dirty = false;
    }
}

/// World-space corners of a quad in top-right, bottom-right, bottom-left,
/// top-left order.
pub(crate) fn quad_corners(position: Vec2, scale: Vec2) -> [Vec2; 4] {
    [
        position + scale,
        Vec2::new(position.x + scale.x, position.y),
        position,
        Vec2::new(position.x, position.y + scale.y),
    ]
}
