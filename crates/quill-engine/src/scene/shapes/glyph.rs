use crate::render::{CompositeVariant, GlyphVertex, TransformBlock};
use crate::scene::{DrawCmd, DrawList, ZIndex};

/// Glyph-run payload: quads (as a triangle list) with normalized atlas UVs,
/// the per-draw transform block, and the compositing variant for the run.
///
/// Exactly one variant applies to the whole run; runs wanting different
/// looks are separate draws. Glyph RGB comes from the block's modulation
/// color (white when absent), so plain white text, tinted UI text, and
/// explicitly colored labels are all the same code path.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphCmd {
    /// Triangle list, six vertices per glyph quad.
    pub vertices: Vec<GlyphVertex>,
    pub block: TransformBlock,
    pub variant: CompositeVariant,
}

impl GlyphCmd {
    #[inline]
    pub fn new(
        vertices: Vec<GlyphVertex>,
        block: TransformBlock,
        variant: CompositeVariant,
    ) -> Self {
        debug_assert!(vertices.len() % 3 == 0, "glyph geometry must be a triangle list");
        Self {
            vertices,
            block,
            variant,
        }
    }
}

impl DrawList {
    /// Records a glyph run.
    #[inline]
    pub fn push_glyphs(
        &mut self,
        z: ZIndex,
        vertices: Vec<GlyphVertex>,
        block: TransformBlock,
        variant: CompositeVariant,
    ) {
        self.push(z, DrawCmd::Glyph(GlyphCmd::new(vertices, block, variant)));
    }
}
