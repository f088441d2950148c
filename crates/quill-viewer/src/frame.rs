use quill_engine::render::{
    Attachment, FontAtlas, RenderCtx, RenderTarget,
};
use quill_engine::render::shapes::{FlatRenderer, GlyphRenderer};
use quill_engine::scene::DrawList;

/// Per-frame renderer state shared by the windowed and offscreen paths.
pub struct FrameRenderers {
    pub flat: FlatRenderer,
    pub glyph: GlyphRenderer,
}

impl FrameRenderers {
    pub fn new() -> Self {
        Self {
            flat: FlatRenderer::new(),
            glyph: GlyphRenderer::new(),
        }
    }

    /// Records one frame into `encoder`: clears the attachment, then draws
    /// flat geometry and glyph runs over it.
    ///
    /// The renderers load the existing contents, so the clear is its own
    /// empty pass up front.
    pub fn record(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        attachment: Attachment<'_>,
        draw_list: &mut DrawList,
        atlas: &FontAtlas,
        clear: wgpu::Color,
    ) {
        {
            let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quill clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        let mut target = RenderTarget::new(encoder, attachment);
        self.flat.render(ctx, &mut target, draw_list);
        self.glyph.render(ctx, &mut target, draw_list, atlas);
    }
}
