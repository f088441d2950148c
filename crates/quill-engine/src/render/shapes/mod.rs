//! Primitive renderers.

mod common;

pub mod flat;
pub mod glyph;

pub use common::{FlatVertex, GlyphVertex};
pub use flat::FlatRenderer;
pub use glyph::GlyphRenderer;
