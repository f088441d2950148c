//! Glyph coverage compositing model.
//!
//! One parameterized algorithm covers every text look the engine ships:
//! sample coverage, optionally estimate a soft shadow from four diagonal
//! atlas taps, optionally gamma round-trip around the blend, then composite
//! the shadow behind the glyph. The WGSL fragment entry points in
//! `shapes/shaders/glyph.wgsl` mirror these functions exactly; this module
//! is the testable reference.

/// Display gamma used for the round-trip variants.
pub const GAMMA: f32 = 2.2;

/// Shadow knobs for a compositing variant.
///
/// Kept as data rather than shader constants so the two shipped presets
/// cannot silently drift apart.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadowParams {
    /// Tap offset magnitude, in atlas texels.
    pub offset_texels: f32,
    /// Scale applied to the four-tap coverage sum.
    pub strength: f32,
    /// Whether coverage and shadow are blended in gamma-expanded space.
    pub gamma: bool,
}

/// Compositing policy for a glyph draw. Exactly one variant is active per
/// draw; it is chosen before the render pass and never changes mid-draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CompositeVariant {
    /// Raw coverage, no shadow or gamma work at all. The cheapest variant;
    /// its fragment entry point contains none of the effect code.
    Plain,
    /// Soft shadow, 1.0-texel taps at strength 0.08. Suited to small UI
    /// chrome text.
    ShadowSubtle,
    /// Stronger shadow, 1.2-texel taps at strength 0.15, blended with a
    /// gamma round-trip. Suited to larger text where linear-space blending
    /// visibly changes contrast.
    ShadowGamma,
}

impl CompositeVariant {
    /// Shadow parameters, `None` for the plain variant.
    #[inline]
    pub fn shadow(self) -> Option<ShadowParams> {
        match self {
            CompositeVariant::Plain => None,
            CompositeVariant::ShadowSubtle => Some(ShadowParams {
                offset_texels: 1.0,
                strength: 0.08,
                gamma: false,
            }),
            CompositeVariant::ShadowGamma => Some(ShadowParams {
                offset_texels: 1.2,
                strength: 0.15,
                gamma: true,
            }),
        }
    }

    pub const ALL: [CompositeVariant; 3] = [
        CompositeVariant::Plain,
        CompositeVariant::ShadowSubtle,
        CompositeVariant::ShadowGamma,
    ];
}

/// Perceptual-to-linear-ish conversion applied before blending.
#[inline]
pub fn gamma_expand(x: f32) -> f32 {
    x.powf(GAMMA)
}

/// Inverse of [`gamma_expand`], applied after blending.
#[inline]
pub fn gamma_compress(x: f32) -> f32 {
    x.powf(1.0 / GAMMA)
}

/// Four-tap diagonal shadow estimate.
///
/// `sample(u, v)` reads the atlas coverage channel at normalized
/// coordinates; `texel_size` is `1 / atlas_dimensions`. The taps sit at
/// `(±offset, ±offset) * texel_size` around `uv` and their sum is scaled by
/// the variant strength, so the result ranges over `[0, 4 * strength]`.
pub fn shadow_estimate(
    sample: impl Fn(f32, f32) -> f32,
    uv: [f32; 2],
    texel_size: [f32; 2],
    params: ShadowParams,
) -> f32 {
    let dx = params.offset_texels * texel_size[0];
    let dy = params.offset_texels * texel_size[1];

    let sum = sample(uv[0] - dx, uv[1] - dy)
        + sample(uv[0] + dx, uv[1] - dy)
        + sample(uv[0] - dx, uv[1] + dy)
        + sample(uv[0] + dx, uv[1] + dy);

    sum * params.strength
}

/// Composites the shadow behind the glyph.
///
/// The contribution is attenuated by the glyph's own opacity, so a shadow
/// never darkens a fully opaque interior, and the result is clamped so
/// summed taps can never push alpha out of range.
#[inline]
pub fn composite_over(alpha: f32, shadow: f32) -> f32 {
    (alpha + shadow * (1.0 - alpha)).clamp(0.0, 1.0)
}

/// The whole glyph fragment stage against an arbitrary coverage sampler.
///
/// Returns the final output alpha for the given variant. The plain variant
/// is the sampled coverage untouched.
pub fn glyph_alpha(
    variant: CompositeVariant,
    sample: impl Fn(f32, f32) -> f32,
    uv: [f32; 2],
    texel_size: [f32; 2],
) -> f32 {
    let coverage = sample(uv[0], uv[1]);

    let Some(params) = variant.shadow() else {
        return coverage;
    };

    let shadow = shadow_estimate(&sample, uv, texel_size, params);

    if params.gamma {
        // Expand before combining, compress after; combining in the wrong
        // space visibly changes contrast.
        let combined = composite_over(gamma_expand(coverage), gamma_expand(shadow));
        gamma_compress(combined)
    } else {
        composite_over(coverage, shadow)
    }
}

/// Flat-geometry fragment stage: interpolated (already modulated) vertex
/// color passes through with alpha 1. No texture is read.
#[inline]
pub fn flat_color(rgb: [f32; 3]) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn composite_alpha_stays_in_unit_range_for_random_inputs() {
        let mut rng = StdRng::seed_from_u64(0x51ab);
        for _ in 0..10_000 {
            let alpha: f32 = rng.gen_range(0.0..=1.0);
            let shadow_sum: f32 = rng.gen_range(0.0..=4.0);
            for variant in CompositeVariant::ALL {
                let strength = variant.shadow().map_or(0.0, |p| p.strength);
                let out = composite_over(alpha, shadow_sum * strength);
                assert!((0.0..=1.0).contains(&out), "alpha {out} out of range");
            }
        }
    }

    #[test]
    fn plain_variant_is_raw_coverage() {
        let stub = |_u: f32, _v: f32| 0.5;
        let alpha = glyph_alpha(CompositeVariant::Plain, stub, [0.25, 0.25], [1.0 / 64.0; 2]);
        assert_eq!(alpha, 0.5);

        // Plain never touches neighbours: a sampler that fails off-center
        // proves no shadow taps happen.
        let center_only = |u: f32, v: f32| {
            assert_eq!((u, v), (0.25, 0.25), "plain variant sampled off-center");
            0.125
        };
        let alpha = glyph_alpha(
            CompositeVariant::Plain,
            center_only,
            [0.25, 0.25],
            [1.0 / 64.0; 2],
        );
        assert_eq!(alpha, 0.125);
    }

    #[test]
    fn gamma_round_trip_is_identity_within_tolerance() {
        for i in 0..=1000 {
            let x = i as f32 / 1000.0;
            assert_relative_eq!(gamma_compress(gamma_expand(x)), x, epsilon = 1e-5);
            assert_relative_eq!(gamma_expand(gamma_compress(x)), x, epsilon = 1e-5);
        }
    }

    #[test]
    fn shadow_never_darkens_opaque_interior() {
        let solid = |_u: f32, _v: f32| 1.0;
        for variant in [CompositeVariant::ShadowSubtle, CompositeVariant::ShadowGamma] {
            let alpha = glyph_alpha(variant, solid, [0.5, 0.5], [1.0 / 128.0; 2]);
            assert_relative_eq!(alpha, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn shadow_taps_are_diagonal_and_scaled() {
        // Atlas with ink only below-right of the UV; exactly one tap hits.
        let sample = |u: f32, v: f32| if u > 0.5 && v > 0.5 { 1.0 } else { 0.0 };
        let texel = [1.0 / 100.0; 2];
        let params = CompositeVariant::ShadowSubtle.shadow().unwrap();

        let shadow = shadow_estimate(sample, [0.5, 0.5], texel, params);
        assert_relative_eq!(shadow, params.strength, epsilon = 1e-6);

        // All four taps hitting sums to 4x.
        let solid = |_u: f32, _v: f32| 1.0;
        let shadow = shadow_estimate(solid, [0.5, 0.5], texel, params);
        assert_relative_eq!(shadow, 4.0 * params.strength, epsilon = 1e-6);
    }

    #[test]
    fn variant_presets_match_their_documented_knobs() {
        assert_eq!(CompositeVariant::Plain.shadow(), None);

        let subtle = CompositeVariant::ShadowSubtle.shadow().unwrap();
        assert_eq!(subtle.offset_texels, 1.0);
        assert_eq!(subtle.strength, 0.08);
        assert!(!subtle.gamma);

        let strong = CompositeVariant::ShadowGamma.shadow().unwrap();
        assert_eq!(strong.offset_texels, 1.2);
        assert_eq!(strong.strength, 0.15);
        assert!(strong.gamma);
    }

    #[test]
    fn gamma_blend_differs_from_linear_blend_mid_range() {
        // The round-trip exists because the spaces differ; make sure the
        // variant actually blends differently where it matters.
        let sample = |_u: f32, _v: f32| 0.5;
        let texel = [1.0 / 64.0; 2];
        let linear = glyph_alpha(CompositeVariant::ShadowSubtle, sample, [0.5, 0.5], texel);
        let gamma = glyph_alpha(CompositeVariant::ShadowGamma, sample, [0.5, 0.5], texel);
        assert!((linear - gamma).abs() > 1e-3);
    }

    // ── end-to-end flat path ──────────────────────────────────────────────

    use crate::coords::Vec2;
    use crate::render::TransformBlock;

    /// Barycentric weights of `p` in triangle `(a, b, c)`.
    fn barycentric(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> [f32; 3] {
        let v0 = b - a;
        let v1 = c - a;
        let v2 = p - a;
        let d00 = v0.dot(v0);
        let d01 = v0.dot(v1);
        let d11 = v1.dot(v1);
        let d20 = v2.dot(v0);
        let d21 = v2.dot(v1);
        let denom = d00 * d11 - d01 * d01;
        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        [1.0 - v - w, v, w]
    }

    #[test]
    fn flat_triangle_interior_is_barycentric_interpolation() {
        let block = TransformBlock::identity();
        let positions = [
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(0.0, 1.0),
        ];
        let colors = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

        // Identity transform/projection: clip xy equals local xy.
        let clip: Vec<Vec2> = positions
            .iter()
            .map(|p| {
                let c = block.clip_position(*p);
                Vec2::new(c.x, c.y)
            })
            .collect();
        for (p, c) in positions.iter().zip(&clip) {
            assert_eq!(p, c);
        }

        // Rasterize one interior pixel the way the hardware interpolator
        // would, then run the flat fragment stage on it.
        let p = Vec2::new(0.1, -0.2);
        let w = barycentric(p, clip[0], clip[1], clip[2]);
        assert!(w.iter().all(|&wi| wi > 0.0), "pixel must be interior");

        let interpolated = [
            w[0] * colors[0][0] + w[1] * colors[1][0] + w[2] * colors[2][0],
            w[0] * colors[0][1] + w[1] * colors[1][1] + w[2] * colors[2][1],
            w[0] * colors[0][2] + w[1] * colors[1][2] + w[2] * colors[2][2],
        ];
        // No modulation: vertex colors arrive untouched.
        let modulated = block.modulated(interpolated);
        assert_eq!(modulated, interpolated);

        let out = flat_color(modulated);
        assert_eq!(out[3], 1.0);
        assert_relative_eq!(out[0], w[0], epsilon = 1e-6);
        assert_relative_eq!(out[1], w[1], epsilon = 1e-6);
        assert_relative_eq!(out[2], w[2], epsilon = 1e-6);
    }
}
