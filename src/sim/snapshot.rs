//! Read-only view of a session for drawing

use super::board::Board;
use super::catalog::Piece;
use super::session::XpPopup;

/// Everything a frame needs, borrowed from the session
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub board: &'a Board,
    pub current: &'a Piece,
    /// `None` when the landing preview is turned off
    pub ghost: Option<&'a Piece>,
    pub next: &'a Piece,
    pub score: u32,
    pub lines_cleared: u32,
    pub xp_this_session: u64,
    pub popups: &'a [XpPopup],
    pub paused: bool,
    pub over: bool,
}

impl Snapshot<'_> {
    /// Ghost cells worth drawing: hidden once the piece is already resting there
    pub fn visible_ghost(&self) -> Option<&Piece> {
        self.ghost.filter(|g| g.pos != self.current.pos)
    }
}
