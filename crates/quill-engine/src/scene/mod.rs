//! Scene (draw stream) types.
//!
//! Responsibilities:
//! - store renderer-agnostic draw commands (flat geometry, glyph runs)
//! - provide deterministic ordering (z-index + insertion order)
//!
//! Compositing is alpha-blend-over in paint order; there is no depth-based
//! reordering. Callers express visual layering through `ZIndex` and
//! insertion order, and the renderers submit in exactly that order.

mod cmd;
mod key;
mod list;
mod z_index;

pub mod shapes;

pub use cmd::DrawCmd;
pub use key::SortKey;
pub use list::{DrawItem, DrawList};
pub use z_index::ZIndex;
