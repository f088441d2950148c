//! Coordinate types shared across the render core and callers.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! The transform stage maps local-space positions to clip space using the
//! per-draw projection/transform block; `Viewport` is the basis callers use
//! to build that projection. Vector and matrix math comes from `glam`;
//! `Vec2` is re-exported here as the canonical 2D position type.

mod viewport;

pub use glam::Vec2;
pub use viewport::Viewport;
