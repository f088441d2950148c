use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::render::{CompositeVariant, FontAtlas, RenderCtx, RenderTarget, TintedBlockRaw};
use crate::scene::{DrawCmd, DrawList};

use super::common::{
    GlyphVertex, UNIFORM_STRIDE, min_binding_size, straight_alpha_blend, uniform_slot_offset,
};

/// Per-draw style slot: the active variant's shadow knobs.
///
/// The plain variant writes zeros; its fragment entry point never reads
/// them.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct StyleRaw {
    shadow_offset: f32,
    shadow_strength: f32,
    _pad: [f32; 2],
}

impl StyleRaw {
    fn for_variant(variant: CompositeVariant) -> Self {
        match variant.shadow() {
            None => Self::zeroed(),
            Some(p) => Self {
                shadow_offset: p.offset_texels,
                shadow_strength: p.strength,
                _pad: [0.0; 2],
            },
        }
    }
}

fn fragment_entry(variant: CompositeVariant) -> &'static str {
    match variant {
        CompositeVariant::Plain => "fs_plain",
        CompositeVariant::ShadowSubtle => "fs_shadow",
        CompositeVariant::ShadowGamma => "fs_shadow_gamma",
    }
}

/// Renderer for `DrawCmd::Glyph`.
///
/// One pipeline per compositing variant over a single shader module; the
/// variants differ only in fragment entry point, so the plain path contains
/// no shadow or gamma code at all. The atlas is an external read-only
/// handle; this renderer binds it and never writes it.
#[derive(Default)]
pub struct GlyphRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipelines: HashMap<CompositeVariant, wgpu::RenderPipeline>,
    bgl_draw: Option<wgpu::BindGroupLayout>,
    bgl_atlas: Option<wgpu::BindGroupLayout>,

    bind_draw: Option<wgpu::BindGroup>,

    block_ubo: Option<wgpu::Buffer>,
    style_ubo: Option<wgpu::Buffer>,
    slot_capacity: usize,

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize, // vertices
}

struct Batch {
    vertex_range: std::ops::Range<u32>,
    slot: usize,
    variant: CompositeVariant,
}

impl GlyphRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders all `DrawCmd::Glyph` entries in `draw_list` in paint order,
    /// sampling coverage from `atlas`.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        draw_list: &mut DrawList,
        atlas: &FontAtlas,
    ) {
        self.ensure_pipelines(ctx);

        let mut vertices: Vec<GlyphVertex> = Vec::new();
        let mut blocks: Vec<u8> = Vec::new();
        let mut styles: Vec<u8> = Vec::new();
        let mut batches: Vec<Batch> = Vec::new();

        for item in draw_list.iter_in_paint_order() {
            let DrawCmd::Glyph(cmd) = &item.cmd else { continue };
            if cmd.vertices.is_empty() {
                continue;
            }

            let start = vertices.len() as u32;
            vertices.extend_from_slice(&cmd.vertices);

            let slot = batches.len();
            blocks.resize(slot * UNIFORM_STRIDE as usize, 0);
            blocks.extend_from_slice(bytemuck::bytes_of(&cmd.block.to_tinted_raw()));
            styles.resize(slot * UNIFORM_STRIDE as usize, 0);
            styles.extend_from_slice(bytemuck::bytes_of(&StyleRaw::for_variant(cmd.variant)));

            batches.push(Batch {
                vertex_range: start..vertices.len() as u32,
                slot,
                variant: cmd.variant,
            });
        }

        if batches.is_empty() {
            return;
        }

        self.ensure_vertex_capacity(ctx, vertices.len());
        self.ensure_slot_capacity(ctx, batches.len());

        let Some(vbo) = self.vbo.as_ref() else { return };
        let Some(block_ubo) = self.block_ubo.as_ref() else { return };
        let Some(style_ubo) = self.style_ubo.as_ref() else { return };
        ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&vertices));
        ctx.queue.write_buffer(block_ubo, 0, &blocks);
        ctx.queue.write_buffer(style_ubo, 0, &styles);

        let Some(bgl_atlas) = self.bgl_atlas.as_ref() else { return };
        let bind_atlas = atlas.bind_group(ctx.device, bgl_atlas);

        let Some(bind_draw) = self.bind_draw.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("quill glyph pass"),
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
        rpass.set_bind_group(1, &bind_atlas, &[]);
        for batch in &batches {
            let Some(pipeline) = self.pipelines.get(&batch.variant) else {
                log::warn!("GlyphRenderer: missing pipeline for {:?}", batch.variant);
                continue;
            };
            let offset = uniform_slot_offset(batch.slot) as u32;
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, bind_draw, &[offset, offset]);
            rpass.draw(batch.vertex_range.clone(), 0..1);
        }
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.target_format) && !self.pipelines.is_empty() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quill glyph shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/glyph.wgsl").into()),
        });

        let bgl_draw = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quill glyph draw bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: Some(min_binding_size::<TintedBlockRaw>()),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: Some(min_binding_size::<StyleRaw>()),
                    },
                    count: None,
                },
            ],
        });

        let bgl_atlas = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quill glyph atlas bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(min_binding_size::<[f32; 4]>()),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quill glyph pipeline layout"),
            bind_group_layouts: &[&bgl_draw, &bgl_atlas],
            immediate_size: 0,
        });

        self.pipelines.clear();
        for variant in CompositeVariant::ALL {
            let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("quill glyph pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[GlyphVertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fragment_entry(variant)),
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
            });
            self.pipelines.insert(variant, pipeline);
        }

        self.pipeline_format = Some(ctx.target_format);
        self.bgl_draw = Some(bgl_draw);
        self.bgl_atlas = Some(bgl_atlas);
        // The old bind group was built against the replaced layout. Drop the
        // uniform buffers too so ensure_slot_capacity rebuilds buffers and
        // bind group together instead of early-returning on capacity.
        self.bind_draw = None;
        self.block_ubo = None;
        self.style_ubo = None;
        self.slot_capacity = 0;
    }

    fn ensure_vertex_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.vbo_capacity && self.vbo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(1024);
        self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quill glyph vbo"),
            size: (new_cap * std::mem::size_of::<GlyphVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vbo_capacity = new_cap;
    }

    fn ensure_slot_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.slot_capacity && self.block_ubo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(16);
        let size = new_cap as u64 * UNIFORM_STRIDE;

        let block_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quill glyph block ubo"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let style_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quill glyph style ubo"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let Some(bgl_draw) = self.bgl_draw.as_ref() else { return };
        self.bind_draw = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quill glyph draw bind group"),
            layout: bgl_draw,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &block_ubo,
                        offset: 0,
                        size: Some(min_binding_size::<TintedBlockRaw>()),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &style_ubo,
                        offset: 0,
                        size: Some(min_binding_size::<StyleRaw>()),
                    }),
                },
            ],
        }));

        self.block_ubo = Some(block_ubo);
        self.style_ubo = Some(style_ubo);
        self.slot_capacity = new_cap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::device::{HeadlessGpu, OffscreenTarget};
    use crate::render::{Attachment, TransformBlock};
    use crate::scene::ZIndex;

    #[test]
    fn style_slots_mirror_variant_presets() {
        let plain = StyleRaw::for_variant(CompositeVariant::Plain);
        assert_eq!(plain.shadow_strength, 0.0);

        let subtle = StyleRaw::for_variant(CompositeVariant::ShadowSubtle);
        assert_eq!((subtle.shadow_offset, subtle.shadow_strength), (1.0, 0.08));

        let gamma = StyleRaw::for_variant(CompositeVariant::ShadowGamma);
        assert_eq!((gamma.shadow_offset, gamma.shadow_strength), (1.2, 0.15));
    }

    #[test]
    fn each_variant_selects_its_own_entry_point() {
        assert_eq!(fragment_entry(CompositeVariant::Plain), "fs_plain");
        assert_eq!(fragment_entry(CompositeVariant::ShadowSubtle), "fs_shadow");
        assert_eq!(fragment_entry(CompositeVariant::ShadowGamma), "fs_shadow_gamma");
    }

    fn render_full_quad(
        gpu: &HeadlessGpu,
        renderer: &mut GlyphRenderer,
        atlas: &FontAtlas,
        format: wgpu::TextureFormat,
    ) -> Vec<u8> {
        let target = OffscreenTarget::new(gpu.device(), 8, 8, format);
        let viewport = Viewport::new(8.0, 8.0);

        // Quad spanning the whole target, sampling the center of a
        // fully-covered atlas.
        let v = |x: f32, y: f32| GlyphVertex {
            position: [x, y],
            uv: [0.5, 0.5],
        };
        let vertices = vec![
            v(0.0, 0.0),
            v(8.0, 0.0),
            v(0.0, 8.0),
            v(8.0, 0.0),
            v(8.0, 8.0),
            v(0.0, 8.0),
        ];

        let mut list = DrawList::new();
        list.push_glyphs(
            ZIndex(0),
            vertices,
            TransformBlock::new(viewport.ortho_projection(), glam::Mat4::IDENTITY),
            CompositeVariant::Plain,
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
            renderer.render(&ctx, &mut rt, &mut list, atlas);
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
        let atlas =
            FontAtlas::from_coverage(gpu.device(), gpu.queue(), &[255u8; 4], 2, 2).unwrap();
        let mut renderer = GlyphRenderer::new();

        let first = render_full_quad(&gpu, &mut renderer, &atlas, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(&first[..4], &[255, 255, 255, 255]);

        // Same renderer, new target format: the draw bind group and its
        // uniform buffers must come back along with the pipelines.
        let second =
            render_full_quad(&gpu, &mut renderer, &atlas, wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(&second[..4], &[255, 255, 255, 255]);
        assert!(renderer.bind_draw.is_some());
        assert_eq!(
            renderer.pipeline_format,
            Some(wgpu::TextureFormat::Rgba8UnormSrgb)
        );
    }
}
