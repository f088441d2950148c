use crate::paint::Color;
use crate::render::{FlatVertex, TransformBlock};
use crate::scene::{DrawCmd, DrawList, ZIndex};

/// Flat-colored geometry payload: a triangle list in local space plus the
/// per-draw transform block.
///
/// The vertices are transient, rebuilt by the caller whenever the shape
/// changes; the renderer copies them out during the frame and retains
/// nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatCmd {
    /// Triangle list (length must be a multiple of 3).
    pub vertices: Vec<FlatVertex>,
    pub block: TransformBlock,
}

impl FlatCmd {
    #[inline]
    pub fn new(vertices: Vec<FlatVertex>, block: TransformBlock) -> Self {
        debug_assert!(vertices.len() % 3 == 0, "flat geometry must be a triangle list");
        Self { vertices, block }
    }
}

impl DrawList {
    /// Records flat triangle-list geometry.
    #[inline]
    pub fn push_flat(&mut self, z: ZIndex, vertices: Vec<FlatVertex>, block: TransformBlock) {
        self.push(z, DrawCmd::Flat(FlatCmd::new(vertices, block)));
    }

    /// Records an axis-aligned solid rectangle (two triangles) in local space.
    pub fn push_flat_rect(
        &mut self,
        z: ZIndex,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
        block: TransformBlock,
    ) {
        let c = color.rgb();
        let v = |px: f32, py: f32| FlatVertex {
            position: [px, py],
            color: c,
        };
        let vertices = vec![
            v(x, y),
            v(x + w, y),
            v(x, y + h),
            v(x + w, y),
            v(x + w, y + h),
            v(x, y + h),
        ];
        self.push_flat(z, vertices, block);
    }
}
