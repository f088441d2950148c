use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use quill_engine::coords::Viewport;
use quill_engine::device::{Gpu, GpuInit, SurfaceErrorAction};
use quill_engine::render::{Attachment, FontAtlas, RenderCtx};

use crate::font::AtlasFont;
use crate::frame::FrameRenderers;
use crate::scene;

/// Opens a window and redraws the demo scene until closed.
pub fn run(font: AtlasFont) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut state = AppState {
        font,
        entry: None,
        renderers: FrameRenderers::new(),
        atlas: None,
    };
    event_loop
        .run_app(&mut state)
        .context("winit event loop terminated with error")?;
    Ok(())
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState {
    font: AtlasFont,
    entry: Option<WindowEntry>,
    renderers: FrameRenderers,
    atlas: Option<FontAtlas>,
}

impl AppState {
    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("quill viewer")
            .with_inner_size(LogicalSize::new(900.0, 600.0));

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, GpuInit::default())),
        }
        .try_build()?;

        self.entry = Some(entry);
        Ok(())
    }

    /// Draws one frame. Returns `true` when the session hit an unrecoverable
    /// error and the event loop should exit.
    fn redraw(&mut self) -> bool {
        let Some(entry) = self.entry.as_mut() else {
            return false;
        };
        let (font, renderers, atlas_slot) = (&self.font, &mut self.renderers, &mut self.atlas);

        let mut fatal = false;
        entry.with_gpu_mut(|gpu| {
            let mut frame = match gpu.begin_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    let action = gpu.handle_surface_error(err);
                    if is_fatal(action) {
                        log::error!("unrecoverable surface error");
                        fatal = true;
                    }
                    return;
                }
            };

            let size = gpu.size();
            let viewport = Viewport::new(size.width as f32, size.height as f32);
            if !viewport.is_valid() {
                // Minimized; nothing to draw.
                return;
            }

            if atlas_slot.is_none() {
                match FontAtlas::from_coverage(
                    gpu.device(),
                    gpu.queue(),
                    font.coverage(),
                    font.dimensions().0,
                    font.dimensions().1,
                ) {
                    Ok(atlas) => *atlas_slot = Some(atlas),
                    Err(e) => {
                        log::error!("failed to upload font atlas: {e:#}");
                        fatal = true;
                        return;
                    }
                }
            }
            let Some(atlas) = atlas_slot.as_ref() else {
                return;
            };

            let mut draw_list = scene::build(viewport, font);

            let ctx = RenderCtx::new(gpu.device(), gpu.queue(), gpu.surface_format());
            renderers.record(
                &ctx,
                &mut frame.encoder,
                Attachment::Swapchain(&frame.view),
                &mut draw_list,
                atlas,
                scene::clear_color(),
            );

            gpu.submit(frame);
        });
        fatal
    }
}

/// Whether a surface-error outcome ends the session.
fn is_fatal(action: SurfaceErrorAction) -> bool {
    matches!(action, SurfaceErrorAction::Fatal)
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            log::error!("failed to open window: {e:#}");
            event_loop.exit();
            return;
        }
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.entry = None;
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event, .. }
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                self.entry = None;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.entry.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => {
                // Fatal render errors tear the window down through the event
                // loop instead of aborting the process.
                if self.redraw() {
                    self.entry = None;
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fatal_surface_errors_end_the_session() {
        assert!(is_fatal(SurfaceErrorAction::Fatal));
        assert!(!is_fatal(SurfaceErrorAction::Reconfigured));
        assert!(!is_fatal(SurfaceErrorAction::SkipFrame));
    }
}
