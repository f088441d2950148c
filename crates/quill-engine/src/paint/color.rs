/// Straight-alpha RGBA color.
///
/// The pipelines blend with `SrcAlpha / OneMinusSrcAlpha`, so colors are kept
/// straight (not premultiplied) all the way to the fragment output.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates a color from sRGB bytes (`0`–`255`), straight alpha.
    #[inline]
    pub fn from_srgb_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// RGB channels only, as consumed by flat vertices and tint modulation.
    #[inline]
    pub const fn rgb(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Clamps all channels to [0, 1].
    #[inline]
    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
            a: self.a.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_srgb_u8_spans_unit_range() {
        let c = Color::from_srgb_u8(0, 127, 255, 255);
        assert_eq!(c.r, 0.0);
        assert!((c.g - 127.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 1.0);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn clamped_bounds_channels() {
        let c = Color::new(-0.5, 1.5, 0.25, 2.0).clamped();
        assert_eq!(c, Color::new(0.0, 1.0, 0.25, 1.0));
    }
}
