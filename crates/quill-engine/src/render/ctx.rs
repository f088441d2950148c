/// Renderer-facing context (device/queue + target format).
///
/// This is intentionally small and stable.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    /// Format of the current color attachment (swapchain or offscreen).
    pub target_format: wgpu::TextureFormat,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            device,
            queue,
            target_format,
        }
    }
}

/// The color attachment a frame renders into, chosen once per frame.
///
/// Renderers are agnostic to the choice: they only ever ask for [`view`].
/// The tag exists so frame orchestration (present vs. readback) stays out
/// of draw code.
///
/// [`view`]: Attachment::view
#[derive(Copy, Clone)]
pub enum Attachment<'a> {
    /// Swapchain image acquired from a window surface.
    Swapchain(&'a wgpu::TextureView),
    /// Offscreen framebuffer texture.
    Framebuffer(&'a wgpu::TextureView),
}

impl<'a> Attachment<'a> {
    /// The current color attachment, whatever backs it.
    #[inline]
    pub fn view(&self) -> &'a wgpu::TextureView {
        match self {
            Attachment::Swapchain(v) | Attachment::Framebuffer(v) => v,
        }
    }
}

/// Target for drawing (encoder + attachment).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub attachment: Attachment<'a>,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, attachment: Attachment<'a>) -> Self {
        Self {
            encoder,
            attachment,
        }
    }
}
