//! Per-file diff rendering.

pub mod block;
pub mod render;

pub use block::{DiffBlock, render_block};
pub use render::{DiffOptions, DiffStyle, render_text};
