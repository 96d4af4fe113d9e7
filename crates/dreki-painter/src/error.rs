//! Error types for the painter and its GPU collaborators.
//!
//! Capacity violations are not here on purpose: the [`Painter`] checks room
//! before every insertion, and [`Batch::add_to_batch`] only `debug_assert!`s
//! its preconditions.
//!
//! [`Painter`]: crate::render2d::Painter
//! [`Batch::add_to_batch`]: crate::render2d::Batch::add_to_batch

use std::path::PathBuf;

/// Everything that can go wrong while creating or loading GPU resources.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A buffer, texture or render target could not be created.
    #[error("failed to create {kind} '{label}': {message}")]
    ResourceCreation {
        kind: &'static str,
        label: String,
        message: String,
    },

    /// A shader module or its pipeline failed validation.
    #[error("shader '{label}' failed to compile: {message}")]
    ShaderCompilation { label: String, message: String },

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid painter config: {0}")]
    Config(#[from] serde_json::Error),
}

impl RenderError {
    pub(crate) fn creation(kind: &'static str, label: &str, message: impl ToString) -> Self {
        Self::ResourceCreation {
            kind,
            label: label.to_owned(),
            message: message.to_string(),
        }
    }
}
