//! GPU rendering subsystem.
//!
//! Renderers consume `scene` draw streams and issue GPU commands via wgpu.
//! Each renderer is responsible for its own GPU resources (pipelines,
//! buffers).
//!
//! Convention:
//! - CPU geometry is in local space; the vertex stage applies the per-draw
//!   `TransformBlock` (object transform first, then projection).
//! - The fragment stage composites glyph coverage per `CompositeVariant`;
//!   flat geometry passes interpolated vertex color through untouched.
//! - Blending against the destination is declared in pipeline state
//!   (straight `SrcAlpha / OneMinusSrcAlpha`); shaders only produce the
//!   source color/alpha pair.

mod atlas;
mod composite;
mod ctx;
mod params;

pub mod shapes;

pub use atlas::FontAtlas;
pub use composite::{CompositeVariant, ShadowParams, composite_over, flat_color, gamma_compress, gamma_expand, glyph_alpha, shadow_estimate};
pub use ctx::{Attachment, RenderCtx, RenderTarget};
pub use params::{PlainBlockRaw, TintedBlockRaw, TransformBlock};
pub use shapes::{FlatVertex, GlyphVertex};
