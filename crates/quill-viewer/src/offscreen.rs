use std::path::Path;

use anyhow::{Context, Result};

use quill_engine::coords::Viewport;
use quill_engine::device::{HeadlessGpu, OffscreenTarget};
use quill_engine::render::{Attachment, FontAtlas, RenderCtx};

use crate::font::AtlasFont;
use crate::frame::FrameRenderers;
use crate::scene;

const WIDTH: u32 = 900;
const HEIGHT: u32 = 600;

/// Renders one demo frame into an offscreen framebuffer and writes it to
/// `path` as a PNG.
pub fn render_to_png(font: &AtlasFont, path: &Path) -> Result<()> {
    let gpu = HeadlessGpu::new_blocking()?;
    let target = OffscreenTarget::new(
        gpu.device(),
        WIDTH,
        HEIGHT,
        wgpu::TextureFormat::Rgba8UnormSrgb,
    );

    let atlas = FontAtlas::from_coverage(
        gpu.device(),
        gpu.queue(),
        font.coverage(),
        font.dimensions().0,
        font.dimensions().1,
    )
    .context("failed to upload font atlas")?;

    let viewport = Viewport::new(WIDTH as f32, HEIGHT as f32);
    let mut draw_list = scene::build(viewport, font);
    let ctx = RenderCtx::new(gpu.device(), gpu.queue(), target.format());

    let mut renderers = FrameRenderers::new();
    let mut encoder = gpu.create_encoder();
    renderers.record(
        &ctx,
        &mut encoder,
        Attachment::Framebuffer(target.view()),
        &mut draw_list,
        &atlas,
        scene::clear_color(),
    );
    gpu.queue().submit(std::iter::once(encoder.finish()));

    let pixels = target.read_rgba(gpu.device(), gpu.queue())?;
    image::save_buffer(
        path,
        &pixels,
        WIDTH,
        HEIGHT,
        image::ExtendedColorType::Rgba8,
    )
    .with_context(|| format!("failed to write {}", path.display()))?;

    log::info!("wrote {}x{} frame to {}", WIDTH, HEIGHT, path.display());
    Ok(())
}
