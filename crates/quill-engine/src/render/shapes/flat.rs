use crate::render::{PlainBlockRaw, RenderCtx, RenderTarget, TintedBlockRaw};
use crate::scene::{DrawCmd, DrawList};

use super::common::{
    FlatVertex, UNIFORM_STRIDE, min_binding_size, straight_alpha_blend, uniform_slot_offset,
};

/// Renderer for `DrawCmd::Flat`.
///
/// Geometry is a caller-built triangle list in local space; the vertex stage
/// applies the per-draw block. Two pipelines exist over one shader module,
/// one per block layout (with/without modulation); a draw whose block
/// carries no modulation uses the plain layout. Neither pipeline binds any
/// texture.
#[derive(Default)]
pub struct FlatRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline_plain: Option<wgpu::RenderPipeline>,
    pipeline_tinted: Option<wgpu::RenderPipeline>,
    bgl_plain: Option<wgpu::BindGroupLayout>,
    bgl_tinted: Option<wgpu::BindGroupLayout>,

    // bindings (rebuilt when the block buffer grows)
    bind_plain: Option<wgpu::BindGroup>,
    bind_tinted: Option<wgpu::BindGroup>,

    block_ubo: Option<wgpu::Buffer>,
    block_capacity: usize, // slots

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize, // vertices
}

/// One recorded draw: its vertex range, uniform slot, and block layout.
struct Batch {
    vertex_range: std::ops::Range<u32>,
    slot: usize,
    tinted: bool,
}

impl FlatRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders all `DrawCmd::Flat` entries in `draw_list` in paint order.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        draw_list: &mut DrawList,
    ) {
        self.ensure_pipelines(ctx);

        // ── gather geometry + per-draw blocks in paint order ───────────────
        let mut vertices: Vec<FlatVertex> = Vec::new();
        let mut blocks: Vec<u8> = Vec::new();
        let mut batches: Vec<Batch> = Vec::new();

        for item in draw_list.iter_in_paint_order() {
            let DrawCmd::Flat(cmd) = &item.cmd else { continue };
            if cmd.vertices.is_empty() {
                continue;
            }

            let start = vertices.len() as u32;
            vertices.extend_from_slice(&cmd.vertices);

            let slot = batches.len();
            blocks.resize(slot * UNIFORM_STRIDE as usize, 0);
            let tinted = cmd.block.modulation.is_some();
            if tinted {
                blocks.extend_from_slice(bytemuck::bytes_of(&cmd.block.to_tinted_raw()));
            } else {
                blocks.extend_from_slice(bytemuck::bytes_of(&cmd.block.to_plain_raw()));
            }

            batches.push(Batch {
                vertex_range: start..vertices.len() as u32,
                slot,
                tinted,
            });
        }

        if batches.is_empty() {
            return;
        }

        // ── uploads (mutable) before immutable borrows ─────────────────────
        self.ensure_vertex_capacity(ctx, vertices.len());
        self.ensure_block_capacity(ctx, batches.len());

        let Some(vbo) = self.vbo.as_ref() else { return };
        let Some(block_ubo) = self.block_ubo.as_ref() else { return };
        ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&vertices));
        ctx.queue.write_buffer(block_ubo, 0, &blocks);

        let Some(pipeline_plain) = self.pipeline_plain.as_ref() else { return };
        let Some(pipeline_tinted) = self.pipeline_tinted.as_ref() else { return };
        let Some(bind_plain) = self.bind_plain.as_ref() else { return };
        let Some(bind_tinted) = self.bind_tinted.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("quill flat pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.attachment.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_vertex_buffer(0, vbo.slice(..));
        for batch in &batches {
            let offset = uniform_slot_offset(batch.slot) as u32;
            if batch.tinted {
                rpass.set_pipeline(pipeline_tinted);
                rpass.set_bind_group(0, bind_tinted, &[offset]);
            } else {
                rpass.set_pipeline(pipeline_plain);
                rpass.set_bind_group(0, bind_plain, &[offset]);
            }
            rpass.draw(batch.vertex_range.clone(), 0..1);
        }
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.target_format) && self.pipeline_plain.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quill flat shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/flat.wgsl").into()),
        });

        let bgl_plain = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quill flat bgl (plain)"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(min_binding_size::<PlainBlockRaw>()),
                },
                count: None,
            }],
        });

        let bgl_tinted = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quill flat bgl (tinted)"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(min_binding_size::<TintedBlockRaw>()),
                },
                count: None,
            }],
        });

        let make_pipeline = |bgl: &wgpu::BindGroupLayout, entry: &str, label: &str| {
            let layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[bgl],
                immediate_size: 0,
            });
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(entry),
                    compilation_options: Default::default(),
                    buffers: &[FlatVertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.target_format,
                        blend: Some(straight_alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        self.pipeline_plain = Some(make_pipeline(&bgl_plain, "vs_plain", "quill flat pipeline (plain)"));
        self.pipeline_tinted =
            Some(make_pipeline(&bgl_tinted, "vs_tinted", "quill flat pipeline (tinted)"));
        self.pipeline_format = Some(ctx.target_format);
        self.bgl_plain = Some(bgl_plain);
        self.bgl_tinted = Some(bgl_tinted);
        // The old bind groups were built against the replaced layouts. Drop
        // the block buffer as well so ensure_block_capacity rebuilds buffer
        // and bind groups together instead of early-returning on capacity.
        self.bind_plain = None;
        self.bind_tinted = None;
        self.block_ubo = None;
        self.block_capacity = 0;
    }

    fn ensure_vertex_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.vbo_capacity && self.vbo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(256);
        self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quill flat vbo"),
            size: (new_cap * std::mem::size_of::<FlatVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vbo_capacity = new_cap;
    }

    fn ensure_block_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.block_capacity && self.block_ubo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(16);
        let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quill flat block ubo"),
            size: new_cap as u64 * UNIFORM_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Bind groups reference the buffer; rebuild both on growth.
        let (Some(bgl_plain), Some(bgl_tinted)) = (self.bgl_plain.as_ref(), self.bgl_tinted.as_ref())
        else {
            return;
        };

        self.bind_plain = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quill flat bind group (plain)"),
            layout: bgl_plain,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &ubo,
                    offset: 0,
                    size: Some(min_binding_size::<PlainBlockRaw>()),
                }),
            }],
        }));
        self.bind_tinted = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quill flat bind group (tinted)"),
            layout: bgl_tinted,
            entries: &[wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &ubo,
                    offset: 0,
                    size: Some(min_binding_size::<TintedBlockRaw>()),
                }),
            }],
        }));

        self.block_ubo = Some(ubo);
        self.block_capacity = new_cap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::device::{HeadlessGpu, OffscreenTarget};
    use crate::paint::Color;
    use crate::render::{Attachment, TransformBlock};
    use crate::scene::ZIndex;

    fn render_full_rect(
        gpu: &HeadlessGpu,
        renderer: &mut FlatRenderer,
        format: wgpu::TextureFormat,
    ) -> Vec<u8> {
        let target = OffscreenTarget::new(gpu.device(), 8, 8, format);
        let viewport = Viewport::new(8.0, 8.0);

        let mut list = DrawList::new();
        list.push_flat_rect(
            ZIndex(0),
            0.0,
            0.0,
            8.0,
            8.0,
            Color::WHITE,
            TransformBlock::new(viewport.ortho_projection(), glam::Mat4::IDENTITY),
        );

        let ctx = RenderCtx::new(gpu.device(), gpu.queue(), format);
        let mut encoder = gpu.create_encoder();
        {
            let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
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
        {
            let mut rt = RenderTarget::new(&mut encoder, Attachment::Framebuffer(target.view()));
            renderer.render(&ctx, &mut rt, &mut list);
        }
        gpu.queue().submit(std::iter::once(encoder.finish()));
        target.read_rgba(gpu.device(), gpu.queue()).unwrap()
    }

    // Needs a live adapter; skipped where none is available.
    #[test]
    fn renderer_survives_a_target_format_switch() {
        let Ok(gpu) = HeadlessGpu::new_blocking() else {
            return;
        };
        let mut renderer = FlatRenderer::new();

        let first = render_full_rect(&gpu, &mut renderer, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(&first[..4], &[255, 255, 255, 255]);

        // Same renderer, new target format: bind groups and block buffer must
        // come back along with the pipelines, not silently stay dropped.
        let second = render_full_rect(&gpu, &mut renderer, wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(&second[..4], &[255, 255, 255, 255]);
        assert!(renderer.bind_plain.is_some());
        assert_eq!(
            renderer.pipeline_format,
            Some(wgpu::TextureFormat::Rgba8UnormSrgb)
        );
    }
}
