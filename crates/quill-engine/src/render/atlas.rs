use anyhow::{Result, ensure};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Read-only handle to a single-channel font atlas.
///
/// The atlas *content* (glyph rasterization, packing, shaping) is owned by
/// the caller; this core only needs a sampled view, a sampler, and the pixel
/// dimensions to compute texel offsets for shadow taps. The texture must not
/// be written while draws referencing it are in flight — that lifetime is
/// the caller's to manage.
pub struct FontAtlas {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    dims_ubo: wgpu::Buffer,
    width: u32,
    height: u32,
}

/// Texel-size uniform consumed by the shadow taps in the glyph shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct AtlasUniform {
    pub texel_size: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

impl FontAtlas {
    /// Uploads caller-provided coverage pixels (row-major, one byte per
    /// texel) into a new R8Unorm atlas with a linear clamp-to-edge sampler.
    ///
    /// Out-of-range UVs fall to the sampler's clamp behavior; no extra
    /// clamping happens in the shaders. Fails when the buffer length does
    /// not match the dimensions.
    pub fn from_coverage(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Self> {
        ensure!(
            pixels.len() == (width * height) as usize,
            "coverage buffer is {} bytes for a {width}x{height} atlas",
            pixels.len()
        );

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("quill font atlas"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("quill atlas sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let uniform = AtlasUniform {
            texel_size: Self::texel_size_for(width, height),
            _pad: [0.0; 2],
        };
        let dims_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quill atlas dims ubo"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        Ok(Self {
            texture,
            view,
            sampler,
            dims_ubo,
            width,
            height,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// `1 / dimensions`, the basis for shadow tap offsets.
    pub fn texel_size(&self) -> [f32; 2] {
        Self::texel_size_for(self.width, self.height)
    }

    fn texel_size_for(width: u32, height: u32) -> [f32; 2] {
        [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32]
    }

    /// Builds the atlas-side bind group for the glyph pipeline layout.
    pub(crate) fn bind_group(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quill atlas bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.dims_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&self.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texel_size_is_reciprocal_of_dimensions() {
        assert_eq!(
            FontAtlas::texel_size_for(256, 128),
            [1.0 / 256.0, 1.0 / 128.0]
        );
        // Degenerate dimensions never divide by zero.
        assert_eq!(FontAtlas::texel_size_for(0, 0), [1.0, 1.0]);
    }

    #[test]
    fn atlas_uniform_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<AtlasUniform>(), 16);
    }

    // Needs a live adapter; skipped where none is available.
    #[test]
    fn mismatched_coverage_buffer_is_rejected() {
        let Ok(gpu) = crate::device::HeadlessGpu::new_blocking() else {
            return;
        };
        let result = FontAtlas::from_coverage(gpu.device(), gpu.queue(), &[0u8; 3], 2, 2);
        assert!(result.is_err());
    }
}
