//! # Dreki Painter — Batched 2D Quad Rendering
//!
//! A small renderer for tile-based 2D scenes. Quads are grouped into
//! fixed-capacity batches by depth key and texture set, so a level of ten
//! thousand tiles draws in a handful of calls and re-uploads only what moved.
//!
//! Start with `use dreki_painter::prelude::*`, create a
//! [`WgpuDevice`](render::WgpuDevice), a [`ResourceCache`](resources::ResourceCache)
//! and a [`Painter`](render2d::Painter), add quads once and call
//! [`Painter::render`](render2d::Painter::render) every frame.

pub mod camera;
pub mod config;
pub mod error;
pub mod math;
pub mod prelude;
pub mod render;
pub mod render2d;
pub mod resources;
