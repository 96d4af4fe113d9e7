//! Painter configuration.
//!
//! Every field has a default, so an empty JSON object (`{}`) is a valid
//! config. Typical usage loads a small file next to the game's assets:
//!
//! ```json
//! {
//!     "max_batch_size": 2000,
//!     "shader": "res/shaders/draw.wgsl",
//!     "viewport": [1280.0, 672.0]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::error::RenderError;
use crate::math::Vec2;

/// Quads per batch when nothing else is configured.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Tunables for a [`Painter`](crate::render2d::Painter) and the camera it is
/// usually paired with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PainterConfig {
    /// Quad capacity of every batch. Fixed at batch construction. Must be at
    /// least 1.
    #[serde(deserialize_with = "batch_size")]
    pub max_batch_size: usize,
    /// WGSL shader to draw with. `None` uses the built-in sprite shader.
    pub shader: Option<PathBuf>,
    /// Visible world area of the default camera, in world units.
    pub viewport: Vec2,
    /// Background colour used when presenting a frame.
    pub clear_color: [f64; 4],
}

impl PainterConfig {
    /// Parse a config from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

fn batch_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    match usize::deserialize(deserializer)? {
        0 => Err(serde::de::Error::custom("max_batch_size must be at least 1")),
        size => Ok(size),
    }
}

impl Default for PainterConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            shader: None,
            viewport: Vec2::new(32.0 * 40.0, 32.0 * 21.0),
            // A pleasant dark blue, like a night sky.
            clear_color: [0.1, 0.1, 0.15, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = PainterConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PainterConfig::default());
        assert_eq!(config.max_batch_size, 1000);
        assert_eq!(config.viewport, Vec2::new(1280.0, 672.0));
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config =
            PainterConfig::from_json_str(r#"{ "max_batch_size": 16, "shader": "draw.wgsl" }"#)
                .unwrap();
        assert_eq!(config.max_batch_size, 16);
        assert_eq!(config.shader, Some(PathBuf::from("draw.wgsl")));
        assert_eq!(config.clear_color, PainterConfig::default().clear_color);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = PainterConfig::from_json_str("{ max_batch_size: }").unwrap_err();
        assert!(matches!(err, RenderError::Config(_)));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = PainterConfig::from_json_str(r#"{ "max_batch_size": 0 }"#).unwrap_err();
        assert!(matches!(err, RenderError::Config(_)));
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = PainterConfig::from_json_file("does/not/exist.json").unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
    }
}
