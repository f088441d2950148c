//! Shared GPU types and utilities used by both primitive renderers.

use bytemuck::{Pod, Zeroable};

// ── blend ─────────────────────────────────────────────────────────────────

/// Straight-alpha over blending. The shaders emit straight (unpremultiplied)
/// source color/alpha; all blending math against the destination lives here
/// in pipeline state.
pub(super) fn straight_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── vertex formats ────────────────────────────────────────────────────────

/// Flat-geometry vertex: local-space position + straight RGB color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FlatVertex {
    pub position: [f32; 2],
    pub color: [f32; 3],
}

impl FlatVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x3  // color
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<FlatVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Glyph-quad vertex: local-space position + normalized atlas UV.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GlyphVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl GlyphVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2  // uv
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GlyphVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// ── per-draw uniform slots ────────────────────────────────────────────────

/// Alignment for dynamic uniform offsets. 256 satisfies
/// `min_uniform_buffer_offset_alignment` on every backend wgpu targets.
pub(super) const UNIFORM_STRIDE: u64 = 256;

/// Byte offset of slot `i` in a dynamically offset per-draw uniform buffer.
#[inline]
pub(super) fn uniform_slot_offset(i: usize) -> u64 {
    i as u64 * UNIFORM_STRIDE
}

/// `wgpu` minimum binding size for a Pod uniform type.
///
/// Centralised so renderers do not repeat `.unwrap()` at every pipeline
/// creation site; the types involved are non-zero-sized by construction.
pub(super) fn min_binding_size<T>() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<T>() as u64)
        .expect("uniform type has non-zero size by construction")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{PlainBlockRaw, TintedBlockRaw};

    #[test]
    fn vertex_strides_match_declared_attributes() {
        assert_eq!(std::mem::size_of::<FlatVertex>(), 20); // vec2 + vec3
        assert_eq!(std::mem::size_of::<GlyphVertex>(), 16); // vec2 + vec2
        assert_eq!(FlatVertex::layout().array_stride, 20);
        assert_eq!(GlyphVertex::layout().array_stride, 16);
    }

    #[test]
    fn blend_is_straight_alpha_over() {
        let blend = straight_alpha_blend();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn uniform_stride_fits_both_block_layouts() {
        assert!(std::mem::size_of::<PlainBlockRaw>() as u64 <= UNIFORM_STRIDE);
        assert!(std::mem::size_of::<TintedBlockRaw>() as u64 <= UNIFORM_STRIDE);
        assert_eq!(uniform_slot_offset(3), 768);
    }
}
