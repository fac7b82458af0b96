//! Blockfall - A falling-block puzzle game with XP progression
//!
//! Core modules:
//! - `sim`: Game simulation (board, pieces, session controller)
//! - `progression`: XP curve and level derivation
//! - `account`: Player profiles behind the `AccountFacade` trait
//! - `shop`: Cosmetic catalog
//! - `platform`: Browser/native platform abstraction (frame loop, storage)
//! - `renderer`: Canvas 2D drawing (browser only)

pub mod account;
pub mod controls;
pub mod error;
pub mod platform;
pub mod progression;
#[cfg(target_arch = "wasm32")]
pub mod renderer;
pub mod settings;
pub mod shop;
pub mod sim;

pub use account::{AccountBook, AccountFacade, Guest};
pub use error::{AccountError, AccountResult};
pub use settings::{BlockScale, Settings};

/// Game configuration constants
pub mod consts {
    /// Board height in cells
    pub const ROWS: usize = 20;
    /// Board width in cells
    pub const COLS: usize = 10;

    /// Cell size for the next-piece preview (px)
    pub const PREVIEW_BLOCK_SIZE: u32 = 30;
    /// Next-piece preview canvas edge, in cells
    pub const PREVIEW_CELLS: u32 = 4;
}
