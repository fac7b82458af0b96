//! Canvas 2D rendering module
//!
//! Draws the board, pieces, ghost and XP popups from a [`Snapshot`](crate::sim::Snapshot).

pub mod canvas;

pub use canvas::CanvasRenderer;
