use std::collections::HashMap;

use anyhow::{Context, Result};
use quill_engine::render::GlyphVertex;

const ATLAS_SIZE: u32 = 512;
const GLYPH_PADDING: u32 = 1; // pixels between glyphs in the atlas

/// One glyph's slot in the packed atlas plus the metrics needed to place
/// its quad relative to the text baseline.
struct PackedGlyph {
    uv_min: [f32; 2],
    uv_max: [f32; 2],
    xmin: f32,
    /// Offset from the baseline to the bitmap bottom, y-up (fontdue's
    /// convention).
    ymin: f32,
    width: f32,
    height: f32,
    advance: f32,
}

/// A font rasterized once, at one pixel size, into a single-channel
/// coverage image with the printable ASCII range shelf-packed into it.
///
/// The image is CPU-side; uploading it is the caller's job. Layout here is
/// a plain pen walk, no kerning or wrapping.
pub struct AtlasFont {
    size_px: f32,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    glyphs: HashMap<char, PackedGlyph>,
}

impl AtlasFont {
    /// Rasterizes `' '..='~'` from `bytes` at `size_px` and packs the
    /// bitmaps into a coverage image.
    pub fn build(bytes: &[u8], size_px: f32) -> Result<Self> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| anyhow::anyhow!("failed to parse font: {e}"))
            .context("font bytes are not a usable TrueType/OpenType face")?;

        let mut pixels = vec![0u8; (ATLAS_SIZE * ATLAS_SIZE) as usize];
        let mut glyphs = HashMap::new();

        let mut cursor_x = GLYPH_PADDING;
        let mut cursor_y = GLYPH_PADDING;
        let mut row_height = 0u32;

        for ch in ' '..='~' {
            let (metrics, bitmap) = font.rasterize(ch, size_px);
            let (w, h) = (metrics.width as u32, metrics.height as u32);

            let mut entry = PackedGlyph {
                uv_min: [0.0; 2],
                uv_max: [0.0; 2],
                xmin: metrics.xmin as f32,
                ymin: metrics.ymin as f32,
                width: metrics.width as f32,
                height: metrics.height as f32,
                advance: metrics.advance_width,
            };

            if w > 0 && h > 0 {
                if cursor_x + w + GLYPH_PADDING > ATLAS_SIZE {
                    cursor_y += row_height + GLYPH_PADDING;
                    cursor_x = GLYPH_PADDING;
                    row_height = 0;
                }
                anyhow::ensure!(
                    cursor_y + h + GLYPH_PADDING <= ATLAS_SIZE,
                    "glyph atlas overflow at {size_px}px ({ATLAS_SIZE}x{ATLAS_SIZE})"
                );

                for (row, chunk) in bitmap.chunks_exact(w as usize).enumerate() {
                    let dst = ((cursor_y + row as u32) * ATLAS_SIZE + cursor_x) as usize;
                    pixels[dst..dst + w as usize].copy_from_slice(chunk);
                }

                let atlas_f = ATLAS_SIZE as f32;
                entry.uv_min = [cursor_x as f32 / atlas_f, cursor_y as f32 / atlas_f];
                entry.uv_max = [
                    (cursor_x + w) as f32 / atlas_f,
                    (cursor_y + h) as f32 / atlas_f,
                ];

                cursor_x += w + GLYPH_PADDING;
                row_height = row_height.max(h);
            }

            glyphs.insert(ch, entry);
        }

        Ok(Self {
            size_px,
            width: ATLAS_SIZE,
            height: ATLAS_SIZE,
            pixels,
            glyphs,
        })
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The packed coverage image, row-major, one byte per texel.
    pub fn coverage(&self) -> &[u8] {
        &self.pixels
    }

    /// Lays out `text` as glyph quads with the baseline at `(x, baseline_y)`.
    ///
    /// Returns a triangle list, six vertices per visible glyph; whitespace
    /// advances the pen without producing geometry. Characters missing from
    /// the packed range are skipped.
    pub fn layout_text(&self, text: &str, x: f32, baseline_y: f32) -> Vec<GlyphVertex> {
        let mut vertices = Vec::with_capacity(text.len() * 6);
        let mut pen_x = x;

        for ch in text.chars() {
            let Some(g) = self.glyphs.get(&ch) else { continue };

            if g.width > 0.0 && g.height > 0.0 {
                let x0 = pen_x + g.xmin;
                let x1 = x0 + g.width;
                // fontdue metrics are y-up from the baseline; screen space
                // is y-down.
                let y1 = baseline_y - g.ymin;
                let y0 = y1 - g.height;

                let v = |px: f32, py: f32, u: f32, vv: f32| GlyphVertex {
                    position: [px, py],
                    uv: [u, vv],
                };
                let [u0, v0] = g.uv_min;
                let [u1, v1] = g.uv_max;

                vertices.push(v(x0, y0, u0, v0));
                vertices.push(v(x1, y0, u1, v0));
                vertices.push(v(x0, y1, u0, v1));
                vertices.push(v(x1, y0, u1, v0));
                vertices.push(v(x1, y1, u1, v1));
                vertices.push(v(x0, y1, u0, v1));
            }

            pen_x += g.advance;
        }

        vertices
    }

    /// Advance-based width of `text` at the packed pixel size.
    pub fn measure(&self, text: &str) -> f32 {
        text.chars()
            .filter_map(|ch| self.glyphs.get(&ch))
            .map(|g| g.advance)
            .sum()
    }
}

/// Reads the first available system UI font.
pub fn load_system_font() -> Result<Vec<u8>> {
    [
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    ]
    .iter()
    .find_map(|p| std::fs::read(p).ok())
    .context("no usable system font found (tried DejaVu Sans and Noto Sans paths)")
}

#[cfg(test)]
mod tests {
    use super::*;

    // A font is not guaranteed on the test machine, so layout-geometry
    // tests run only when one is present.
    fn test_font() -> Option<AtlasFont> {
        let bytes = load_system_font().ok()?;
        AtlasFont::build(&bytes, 24.0).ok()
    }

    #[test]
    fn whitespace_advances_without_geometry() {
        let Some(font) = test_font() else { return };
        let spaces = font.layout_text("   ", 0.0, 50.0);
        assert!(spaces.is_empty());
        assert!(font.measure("   ") > 0.0);
    }

    #[test]
    fn layout_is_a_triangle_list_left_to_right() {
        let Some(font) = test_font() else { return };
        let verts = font.layout_text("ab", 10.0, 50.0);
        assert_eq!(verts.len() % 3, 0);
        assert_eq!(verts.len(), 12);

        // Second glyph starts at a larger pen position than the first.
        let first_x = verts[0].position[0];
        let second_x = verts[6].position[0];
        assert!(second_x > first_x);
    }

    #[test]
    fn uvs_are_normalized() {
        let Some(font) = test_font() else { return };
        for v in font.layout_text("Hello, world!", 0.0, 50.0) {
            assert!((0.0..=1.0).contains(&v.uv[0]));
            assert!((0.0..=1.0).contains(&v.uv[1]));
        }
    }
}
