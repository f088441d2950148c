use glam::Mat4;
use quill_engine::coords::Viewport;
use quill_engine::paint::Color;
use quill_engine::render::{CompositeVariant, FlatVertex, TransformBlock};
use quill_engine::scene::{DrawList, ZIndex};

use crate::font::AtlasFont;

const BACKGROUND: Color = Color::opaque(0.09, 0.09, 0.11);

pub fn clear_color() -> wgpu::Color {
    wgpu::Color {
        r: BACKGROUND.r as f64,
        g: BACKGROUND.g as f64,
        b: BACKGROUND.b as f64,
        a: 1.0,
    }
}

/// Builds the demo frame: a vertex-colored triangle, a tinted panel, and one
/// text line per compositing variant.
pub fn build(viewport: Viewport, font: &AtlasFont) -> DrawList {
    let mut list = DrawList::new();
    let projection = viewport.ortho_projection();
    let base = TransformBlock::new(projection, Mat4::IDENTITY);

    // Panel behind the text column, tinted through the block rather than
    // baked into the vertices.
    list.push_flat_rect(
        ZIndex(0),
        40.0,
        40.0,
        viewport.width - 80.0,
        170.0,
        Color::WHITE,
        TransformBlock::new(projection, Mat4::IDENTITY).with_modulation([0.16, 0.17, 0.22]),
    );

    // Vertex-colored triangle, rotated about its own center.
    let cx = viewport.width * 0.5;
    let cy = viewport.height * 0.65;
    let spin = Mat4::from_translation(glam::Vec3::new(cx, cy, 0.0))
        * Mat4::from_rotation_z(0.35)
        * Mat4::from_translation(glam::Vec3::new(-cx, -cy, 0.0));
    let r = (viewport.height * 0.22).max(40.0);
    let tri = vec![
        FlatVertex { position: [cx, cy - r], color: [1.0, 0.2, 0.2] },
        FlatVertex { position: [cx + r * 0.866, cy + r * 0.5], color: [0.2, 1.0, 0.2] },
        FlatVertex { position: [cx - r * 0.866, cy + r * 0.5], color: [0.2, 0.4, 1.0] },
    ];
    list.push_flat(ZIndex(1), tri, TransformBlock::new(projection, spin));

    // One line per compositing variant, over the panel.
    let line_height = font.size_px() * 1.4;
    let lines = [
        ("plain coverage", CompositeVariant::Plain, None),
        ("subtle drop shadow", CompositeVariant::ShadowSubtle, None),
        (
            "gamma-aware shadow",
            CompositeVariant::ShadowGamma,
            Some([1.0, 0.82, 0.35]),
        ),
    ];
    for (i, (text, variant, tint)) in lines.into_iter().enumerate() {
        let baseline = 60.0 + font.size_px() + i as f32 * line_height;
        let verts = font.layout_text(text, 56.0, baseline);
        let block = match tint {
            Some(rgb) => base.with_modulation(rgb),
            None => base,
        };
        list.push_glyphs(ZIndex(2), verts, block, variant);
    }

    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_engine::scene::DrawCmd;

    #[test]
    fn panel_paints_under_triangle_and_text() {
        let Ok(bytes) = crate::font::load_system_font() else { return };
        let Ok(font) = AtlasFont::build(&bytes, 24.0) else { return };

        let mut list = build(Viewport::new(800.0, 600.0), &font);
        let kinds: Vec<_> = list
            .iter_in_paint_order()
            .map(|item| match &item.cmd {
                DrawCmd::Flat(_) => "flat",
                DrawCmd::Glyph(_) => "glyph",
            })
            .collect();

        assert_eq!(kinds.first(), Some(&"flat"));
        assert_eq!(kinds.last(), Some(&"glyph"));
    }

    #[test]
    fn each_variant_appears_once() {
        let Ok(bytes) = crate::font::load_system_font() else { return };
        let Ok(font) = AtlasFont::build(&bytes, 24.0) else { return };

        let mut list = build(Viewport::new(800.0, 600.0), &font);
        let mut variants: Vec<_> = list
            .iter_in_paint_order()
            .filter_map(|item| match &item.cmd {
                DrawCmd::Glyph(cmd) => Some(cmd.variant),
                DrawCmd::Flat(_) => None,
            })
            .collect();
        variants.sort_by_key(|v| format!("{v:?}"));
        variants.dedup();
        assert_eq!(variants.len(), 3);
    }
}
