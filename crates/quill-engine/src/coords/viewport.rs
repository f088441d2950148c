use glam::Mat4;

/// Viewport size in logical pixels.
///
/// Callers use this as the coordinate basis when building the projection half
/// of a per-draw transform block: `ortho_projection` maps logical pixels
/// (top-left origin, +Y down) to clip space.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Orthographic projection from logical pixels to clip space.
    ///
    /// Logical (0, 0) maps to clip (-1, -1)'s top-left counterpart: x right,
    /// y down on the CPU side, y up in clip space, z fixed at the near plane.
    pub fn ortho_projection(self) -> Mat4 {
        let w = self.width.max(1.0);
        let h = self.height.max(1.0);
        Mat4::orthographic_rh(0.0, w, h, 0.0, -1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn ortho_maps_corners_to_clip() {
        let vp = Viewport::new(800.0, 600.0);
        let m = vp.ortho_projection();

        let tl = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((tl.x - -1.0).abs() < 1e-6);
        assert!((tl.y - 1.0).abs() < 1e-6);

        let br = m * Vec4::new(800.0, 600.0, 0.0, 1.0);
        assert!((br.x - 1.0).abs() < 1e-6);
        assert!((br.y - -1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_viewport_is_invalid() {
        assert!(!Viewport::new(0.0, 600.0).is_valid());
        assert!(Viewport::new(1.0, 1.0).is_valid());
    }
}
