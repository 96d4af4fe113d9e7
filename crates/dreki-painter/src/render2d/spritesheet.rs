//! # Spritesheet — Slicing a Texture into Sprites
//!
//! A spritesheet is one texture holding many equally sized frames laid out in
//! a grid, optionally separated by a fixed gap.
//!
//! ```text
//!   height ┌────┬─┬────┬─┬────┐
//!          │ 0  │ │ 1  │ │ 2  │   row 0 starts at y = height - sprite_h
//!          ├────┘ └────┘ └────┤
//!          │      spacing     │
//!          ├────┬─┬────┬─┬────┤
//!          │ 3  │ │ 4  │ │ 5  │
//!        0 └────┴─┴────┴─┴────┘
//!          0                  width
//! ```
//!
//! Textures are flipped on load, so UV `y = 0` is the bottom row of the image
//! and the first sprite sits at the top. Frames run left to right; once the
//! cursor reaches the right edge it wraps to the next row down. Asking for
//! more sprites than the sheet holds yields UVs below zero rather than an
//! error.

use std::ops::Index;

use super::Sprite;
use crate::error::RenderError;
use crate::math::Vec2;
use crate::render::{RenderDevice, TextureHandle};

/// An ordered list of sprites cut from one texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Spritesheet {
    texture: TextureHandle,
    sprites: Vec<Sprite>,
}

impl Spritesheet {
    /// Slice `count` sprites of `sprite_width`×`sprite_height` pixels out of a
    /// texture of `texture_size`, with `spacing` pixels between frames.
    pub fn new(
        texture: TextureHandle,
        texture_size: (u32, u32),
        sprite_width: u32,
        sprite_height: u32,
        count: usize,
        spacing: u32,
    ) -> Self {
        let (width, height) = (texture_size.0 as f32, texture_size.1 as f32);
        let (sprite_w, sprite_h) = (sprite_width as f32, sprite_height as f32);
        let spacing = spacing as f32;

        let mut x = 0.0;
        let mut y = height - sprite_h;
        let mut sprites = Vec::with_capacity(count);

        for _ in 0..count {
            let left = x / width;
            let right = (x + sprite_w) / width;
            let bottom = y / height;
            let top = (y + sprite_h) / height;

            sprites.push(Sprite {
                texture: Some(texture),
                uvs: [
                    Vec2::new(right, top),
                    Vec2::new(right, bottom),
                    Vec2::new(left, bottom),
                    Vec2::new(left, top),
                ],
            });

            x += sprite_w + spacing;
            if x >= width {
                x = 0.0;
                y -= sprite_h + spacing;
            }
        }

        Self { texture, sprites }
    }

    /// Like [`new`](Self::new), with the texture size read from `device`.
    pub fn from_device(
        device: &impl RenderDevice,
        texture: TextureHandle,
        sprite_width: u32,
        sprite_height: u32,
        count: usize,
        spacing: u32,
    ) -> Result<Self, RenderError> {
        let size = device.texture_size(texture).ok_or_else(|| {
            RenderError::creation("spritesheet", &format!("{texture:?}"), "unknown texture")
        })?;
        Ok(Self::new(texture, size, sprite_width, sprite_height, count, spacing))
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn get(&self, index: usize) -> Option<&Sprite> {
        self.sprites.get(index)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter()
    }
}

impl Index<usize> for Spritesheet {
    type Output = Sprite;

    fn index(&self, index: usize) -> &Sprite {
        &self.sprites[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RecordingDevice, RenderDevice};

    fn texture() -> TextureHandle {
        let mut device = RecordingDevice::new();
        device.create_texture("sheet", 1, 1, &[0; 4]).unwrap()
    }

    #[test]
    fn first_sprite_is_the_top_left_frame() {
        let sheet = Spritesheet::new(texture(), (64, 32), 16, 16, 1, 0);

        assert_eq!(
            sheet[0].uvs,
            [
                Vec2::new(0.25, 1.0),
                Vec2::new(0.25, 0.5),
                Vec2::new(0.0, 0.5),
                Vec2::new(0.0, 1.0),
            ]
        );
        assert_eq!(sheet[0].texture, Some(sheet.texture()));
    }

    #[test]
    fn frames_wrap_to_the_next_row_down() {
        let sheet = Spritesheet::new(texture(), (64, 32), 16, 16, 6, 0);
        assert_eq!(sheet.len(), 6);

        // Last frame of the top row.
        assert_eq!(sheet[3].uvs[2], Vec2::new(0.75, 0.5));
        // First frame of the second row.
        assert_eq!(sheet[4].uvs[2], Vec2::new(0.0, 0.0));
        assert_eq!(sheet[5].uvs[0], Vec2::new(0.5, 0.5));
    }

    #[test]
    fn spacing_separates_frames_and_rows() {
        // Two 16px frames per row with a 2px gap: 16 + 2 + 16 = 34.
        let sheet = Spritesheet::new(texture(), (34, 34), 16, 16, 3, 2);

        let second = sheet[1].uvs;
        assert_eq!(second[2].x, 18.0 / 34.0);
        assert_eq!(second[0].x, 1.0);

        let third = sheet[2].uvs;
        assert_eq!(third[2], Vec2::new(0.0, 0.0));
        assert_eq!(third[0], Vec2::new(16.0 / 34.0, 16.0 / 34.0));
    }

    #[test]
    fn from_device_reads_the_texture_size() {
        let mut device = RecordingDevice::new();
        let texture = device.create_texture("sheet", 64, 32, &[0; 64 * 32 * 4]).unwrap();

        let sheet = Spritesheet::from_device(&device, texture, 16, 16, 6, 0).unwrap();
        assert_eq!(sheet, Spritesheet::new(texture, (64, 32), 16, 16, 6, 0));
    }

    #[test]
    fn from_device_rejects_unknown_textures() {
        let texture = texture();
        let other = RecordingDevice::new();

        let err = Spritesheet::from_device(&other, texture, 16, 16, 1, 0).unwrap_err();
        assert!(matches!(err, RenderError::ResourceCreation { kind: "spritesheet", .. }));
    }

    #[test]
    fn empty_sheet_has_no_sprites() {
        let sheet = Spritesheet::new(texture(), (16, 16), 16, 16, 0, 0);
        assert!(sheet.is_empty());
        assert!(sheet.get(0).is_none());
    }
}
