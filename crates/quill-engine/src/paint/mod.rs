//! Color types for draw submission.

mod color;

pub use color::Color;
