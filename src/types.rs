//! Common types used throughout the editor.

use std::time::Instant;

/// A terminal cell.
///
/// - `x`: column (0-based)
/// - `y`: row (0-based)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

/// Size of the visible screen area in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 80, height: 24 }
    }
}

/// Short-lived status message shown in the status bar.
#[derive(Clone)]
pub struct StatusMsg {
    pub text: String,
    pub until: Instant,
}
