//! Game simulation
//!
//! All gameplay logic lives here. Nothing in this module touches the DOM:
//! - Time comes in as frame deltas
//! - Randomness comes from a seeded RNG
//! - Account access goes through `AccountFacade`

pub mod board;
pub mod catalog;
pub mod session;
pub mod snapshot;
pub mod state;

pub use board::{Board, Cell};
pub use catalog::{Color, Piece, PieceKind, Shape, random_piece, resolve_color};
pub use session::{GameEvent, POPUP_LIFETIME_FRAMES, Session, SoftDrop, XpPopup};
pub use snapshot::Snapshot;
pub use state::{Direction, GamePhase, GameState, LockOutcome, spawn_position};
