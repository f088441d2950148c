use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::coords::Vec2;

/// Per-draw constant block: projection, object transform, optional tint.
///
/// Immutable once submitted with a draw. The object transform is applied in
/// local space first, then the projection; `clip_position` is the reference
/// for the order and the shaders mirror it exactly.
///
/// `modulation` tints vertex colors (flat geometry) or supplies glyph RGB
/// (text). `None` means no tinting and is encoded as the plain block layout;
/// the math treats it as `(1, 1, 1)`, so untinted draws are the identity
/// case of the tinted path rather than a separate one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransformBlock {
    pub projection: Mat4,
    pub transform: Mat4,
    pub modulation: Option<[f32; 3]>,
}

impl TransformBlock {
    #[inline]
    pub fn new(projection: Mat4, transform: Mat4) -> Self {
        Self {
            projection,
            transform,
            modulation: None,
        }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }

    #[inline]
    pub fn with_modulation(mut self, rgb: [f32; 3]) -> Self {
        self.modulation = Some(rgb);
        self
    }

    /// Reference transform stage: `projection × transform × (p.x, p.y, 0, 1)`.
    #[inline]
    pub fn clip_position(&self, p: Vec2) -> Vec4 {
        self.projection * (self.transform * Vec4::new(p.x, p.y, 0.0, 1.0))
    }

    /// Modulation color, `(1, 1, 1)` when absent.
    #[inline]
    pub fn modulation_or_identity(&self) -> [f32; 3] {
        self.modulation.unwrap_or([1.0, 1.0, 1.0])
    }

    /// Reference color modulation: component-wise tint of a vertex color.
    #[inline]
    pub fn modulated(&self, color: [f32; 3]) -> [f32; 3] {
        let m = self.modulation_or_identity();
        [color[0] * m[0], color[1] * m[1], color[2] * m[2]]
    }

    /// Encodes the block without a modulation field (plain layout).
    ///
    /// Only valid for draws bound to a plain-layout pipeline; encoding the
    /// wrong layout for a pipeline is a caller error that shows up as wrong
    /// pixels, not as a runtime failure.
    #[inline]
    pub(crate) fn to_plain_raw(&self) -> PlainBlockRaw {
        PlainBlockRaw {
            projection: self.projection.to_cols_array_2d(),
            transform: self.transform.to_cols_array_2d(),
        }
    }

    /// Encodes the block with its modulation field (tinted layout).
    #[inline]
    pub(crate) fn to_tinted_raw(&self) -> TintedBlockRaw {
        TintedBlockRaw {
            projection: self.projection.to_cols_array_2d(),
            transform: self.transform.to_cols_array_2d(),
            modulation: self.modulation_or_identity(),
            _pad: 0.0,
        }
    }
}

/// GPU layout of a per-draw block without tint: two column-major mat4s.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct PlainBlockRaw {
    pub projection: [[f32; 4]; 4],
    pub transform: [[f32; 4]; 4],
}

/// GPU layout of a per-draw block with tint; vec3 padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct TintedBlockRaw {
    pub projection: [[f32; 4]; 4],
    pub transform: [[f32; 4]; 4],
    pub modulation: [f32; 3],
    pub _pad: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn transform_applies_before_projection() {
        // projection = uniform scale(2), transform = translate(1, 0):
        // local (0,0) must go through the translate first, so clip x is 2.
        let block = TransformBlock::new(
            Mat4::from_scale(Vec3::splat(2.0)),
            Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)),
        );

        let clip = block.clip_position(Vec2::ZERO);
        assert_eq!(clip.x, 2.0);
        assert_eq!(clip.y, 0.0);
        assert_eq!(clip.w, 1.0);

        // The reversed order would give x = 1; guard against it explicitly.
        let reversed = TransformBlock::new(
            Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)),
            Mat4::from_scale(Vec3::splat(2.0)),
        );
        assert_eq!(reversed.clip_position(Vec2::ZERO).x, 1.0);
    }

    #[test]
    fn absent_modulation_equals_identity_modulation() {
        let plain = TransformBlock::identity();
        let unit = TransformBlock::identity().with_modulation([1.0, 1.0, 1.0]);

        let color = [0.3, 0.6, 0.9];
        assert_eq!(plain.modulated(color), unit.modulated(color));

        // Raw encodings agree on every field the tinted layout shares.
        let a = plain.to_tinted_raw();
        let b = unit.to_tinted_raw();
        assert_eq!(a.modulation, b.modulation);
        assert_eq!(a.projection, b.projection);
        assert_eq!(a.transform, b.transform);
    }

    #[test]
    fn modulation_is_componentwise() {
        let block = TransformBlock::identity().with_modulation([0.5, 1.0, 0.0]);
        assert_eq!(block.modulated([1.0, 0.8, 0.6]), [0.5, 0.8, 0.0]);
    }

    #[test]
    fn raw_layout_sizes_match_std140_expectations() {
        assert_eq!(std::mem::size_of::<PlainBlockRaw>(), 128);
        assert_eq!(std::mem::size_of::<TintedBlockRaw>(), 144);
    }

    #[test]
    fn clip_position_carries_translation_through_projection() {
        // An orthographic-like projection must see translated positions.
        let block = TransformBlock::new(
            Mat4::from_scale(Vec3::new(0.5, 0.5, 1.0)),
            Mat4::from_translation(Vec3::new(4.0, 2.0, 0.0)),
        );
        let clip = block.clip_position(Vec2::new(2.0, 2.0));
        assert_eq!(clip.x, 3.0);
        assert_eq!(clip.y, 2.0);
    }
}
