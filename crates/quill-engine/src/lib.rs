//! Quill engine crate.
//!
//! A 2D UI render core: screen-space primitives (flat-colored triangles and
//! textured glyph quads) are transformed through per-draw projection/transform
//! blocks and composited against a single-channel font atlas.
//!
//! The crate owns the GPU runtime pieces (device, surface/offscreen targets,
//! pipelines); atlas *content* and text layout belong to the caller.

pub mod device;

pub mod logging;
pub mod coords;
pub mod paint;
pub mod render;
pub mod scene;
