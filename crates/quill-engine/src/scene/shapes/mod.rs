//! Primitive payloads and push helpers, one module per primitive kind.

pub mod flat;
pub mod glyph;
