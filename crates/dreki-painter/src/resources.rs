//! # Resources — Loading Once, Sharing by Handle
//!
//! Levels reference the same tileset and shader from hundreds of quads. The
//! [`ResourceCache`] makes sure each file is read, decoded and uploaded once,
//! and hands out the same handle on every later request.
//!
//! ```text
//! ResourceCache
//! ┌───────────────────────────────────────────────┐
//! │ shaders:      HashMap<PathBuf, ShaderHandle>  │
//! │ textures:     HashMap<PathBuf, TextureHandle> │
//! │ spritesheets: HashMap<String, Spritesheet>    │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! The cache is an ordinary value owned by the game, not a global. Paths are
//! used as given, so `"a/b.png"` and `"./a/b.png"` are two entries.
//!
//! ## Image Orientation
//!
//! Image files store their top row first. Quad UVs put `v = 0` at the
//! bottom, so textures are flipped vertically before upload.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::RenderError;
use crate::render::{RenderDevice, ShaderHandle, TextureHandle};
use crate::render2d::Spritesheet;
use crate::render2d::pipeline::SPRITE_SHADER;

/// Caches shaders and textures by path and spritesheets by name.
#[derive(Debug, Default)]
pub struct ResourceCache {
    shaders: HashMap<PathBuf, ShaderHandle>,
    default_shader: Option<ShaderHandle>,
    textures: HashMap<PathBuf, TextureHandle>,
    spritesheets: HashMap<String, Spritesheet>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and compile a WGSL shader, or return the cached handle.
    pub fn shader(
        &mut self,
        device: &mut impl RenderDevice,
        path: impl AsRef<Path>,
    ) -> Result<ShaderHandle, RenderError> {
        let path = path.as_ref();
        if let Some(&shader) = self.shaders.get(path) {
            return Ok(shader);
        }

        let source = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_owned(),
            source,
        })?;
        let shader = device.create_shader(&path.display().to_string(), &source)?;

        log::info!("loaded shader {}", path.display());
        self.shaders.insert(path.to_owned(), shader);
        Ok(shader)
    }

    /// The built-in quad shader, compiled on first use.
    pub fn default_shader(
        &mut self,
        device: &mut impl RenderDevice,
    ) -> Result<ShaderHandle, RenderError> {
        if let Some(shader) = self.default_shader {
            return Ok(shader);
        }
        let shader = device.create_shader("built-in quad shader", SPRITE_SHADER)?;
        self.default_shader = Some(shader);
        Ok(shader)
    }

    /// Decode an image file, flip it and upload it, or return the cached
    /// handle.
    pub fn texture(
        &mut self,
        device: &mut impl RenderDevice,
        path: impl AsRef<Path>,
    ) -> Result<TextureHandle, RenderError> {
        let path = path.as_ref();
        if let Some(&texture) = self.textures.get(path) {
            return Ok(texture);
        }

        let image = image::open(path)
            .map_err(|source| RenderError::Image {
                path: path.to_owned(),
                source,
            })?
            .flipv()
            .to_rgba8();
        let (width, height) = image.dimensions();
        let texture = device.create_texture(&path.display().to_string(), width, height, &image)?;

        log::info!("loaded texture {} ({width}x{height})", path.display());
        self.textures.insert(path.to_owned(), texture);
        Ok(texture)
    }

    /// Register a spritesheet under `name`. An existing entry is kept and
    /// `sheet` is dropped.
    pub fn add_spritesheet(&mut self, name: impl Into<String>, sheet: Spritesheet) {
        self.spritesheets.entry(name.into()).or_insert(sheet);
    }

    pub fn spritesheet(&self, name: &str) -> Option<&Spritesheet> {
        self.spritesheets.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DeviceCall, RecordingDevice};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("dreki-painter-{}-{name}", std::process::id()))
    }

    fn count_calls(device: &RecordingDevice, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        device.calls().iter().filter(|call| predicate(call)).count()
    }

    #[test]
    fn textures_are_flipped_and_cached() {
        // 1x2 image: red on top, blue below.
        let path = temp_path("flip.png");
        let mut image = image::RgbaImage::new(1, 2);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        image.save(&path).unwrap();

        let mut device = RecordingDevice::new();
        let mut cache = ResourceCache::new();
        let first = cache.texture(&mut device, &path).unwrap();
        let second = cache.texture(&mut device, &path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(first, second);
        assert_eq!(
            count_calls(&device, |call| matches!(call, DeviceCall::CreateTexture { .. })),
            1
        );
        assert_eq!(device.texture_size(first), Some((1, 2)));
        // Bottom row of the file is uploaded first.
        assert_eq!(
            device.texture_data(first),
            Some(&[0, 0, 255, 255, 255, 0, 0, 255][..])
        );
    }

    #[test]
    fn missing_texture_is_an_image_error() {
        let mut device = RecordingDevice::new();
        let mut cache = ResourceCache::new();
        let err = cache
            .texture(&mut device, temp_path("does-not-exist.png"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Image { .. }));
    }

    #[test]
    fn shaders_are_cached_by_path() {
        let path = temp_path("draw.wgsl");
        std::fs::write(&path, SPRITE_SHADER).unwrap();

        let mut device = RecordingDevice::new();
        let mut cache = ResourceCache::new();
        let first = cache.shader(&mut device, &path).unwrap();
        let second = cache.shader(&mut device, &path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(first, second);
        assert_eq!(
            count_calls(&device, |call| matches!(call, DeviceCall::CreateShader { .. })),
            1
        );
    }

    #[test]
    fn broken_shader_is_a_compilation_error() {
        let path = temp_path("empty.wgsl");
        std::fs::write(&path, "").unwrap();

        let mut device = RecordingDevice::new();
        let mut cache = ResourceCache::new();
        let err = cache.shader(&mut device, &path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, RenderError::ShaderCompilation { .. }));
    }

    #[test]
    fn default_shader_compiles_once() {
        let mut device = RecordingDevice::new();
        let mut cache = ResourceCache::new();
        let first = cache.default_shader(&mut device).unwrap();
        assert_eq!(cache.default_shader(&mut device).unwrap(), first);
        assert_eq!(device.calls().len(), 1);
    }

    #[test]
    fn first_spritesheet_under_a_name_wins() {
        let mut device = RecordingDevice::new();
        let texture = device.create_texture("sheet", 1, 1, &[0; 4]).unwrap();
        let four = Spritesheet::new(texture, (32, 32), 16, 16, 4, 0);
        let two = Spritesheet::new(texture, (32, 32), 16, 16, 2, 0);

        let mut cache = ResourceCache::new();
        cache.add_spritesheet("tiles", four);
        cache.add_spritesheet("tiles", two);

        assert_eq!(cache.spritesheet("tiles").map(Spritesheet::len), Some(4));
        assert!(cache.spritesheet("missing").is_none());
    }
}
