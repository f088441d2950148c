use crate::scene::shapes::flat::FlatCmd;
use crate::scene::shapes::glyph::GlyphCmd;

/// Renderer-agnostic draw command stream.
///
/// Extending the scene:
/// - add a new primitive module under `scene::shapes::*`
/// - add a new variant here
/// - implement push helpers inside that primitive module
/// - add a matching renderer under `render::shapes::*`
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Flat-colored triangle-list geometry. Never samples a texture.
    Flat(FlatCmd),
    /// Textured glyph quads compositing atlas coverage.
    Glyph(GlyphCmd),
}
