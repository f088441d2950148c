//! GPU device + render-target management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - the swapchain-backed path: configuring the window surface and acquiring
//!   frames
//! - the framebuffer path: headless device creation and offscreen color
//!   targets with CPU readback
//!
//! Which of the two target kinds a frame renders into is decided once per
//! frame by the caller; see [`crate::render::Attachment`].

mod gpu;
mod headless;
mod offscreen;
mod surface;

pub use gpu::{Gpu, GpuFrame, GpuInit};
pub use headless::HeadlessGpu;
pub use offscreen::OffscreenTarget;
pub use surface::SurfaceErrorAction;
