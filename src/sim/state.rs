//! Board and piece state machine
//!
//! Owns the grid plus the current, next and ghost pieces. Every mutation of the
//! current piece leaves it legal (no overlap, inside the side walls and floor) and
//! recomputes the ghost.

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::board::Board;
use super::catalog::{Piece, random_piece};
use crate::account::AccountFacade;

/// Session-level phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Not started, or stopped from outside
    Ready,
    /// Gravity and input active
    Playing,
    /// Frozen; still rendered
    Paused,
    /// A freshly spawned piece overlapped the stack
    GameOver,
}

/// Horizontal move direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn dx(self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

/// What happened when the current piece locked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOutcome {
    /// Anchor of the piece that locked
    pub anchor: IVec2,
    /// Rows removed by this lock
    pub lines_cleared: usize,
    /// The promoted piece overlaps the stack; the game is over
    pub spawn_blocked: bool,
}

/// Grid + active pieces + per-session counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub current: Piece,
    pub next: Piece,
    /// Lowest legal resting place of `current`; derived, never moved directly
    pub ghost: Piece,
    /// One point per locked piece
    pub score: u32,
    pub lines_cleared: u32,
    pub phase: GamePhase,
}

impl GameState {
    /// Empty board with a freshly drawn current/next pair
    pub fn new<R, A>(rows: usize, cols: usize, rng: &mut R, account: &A) -> Self
    where
        R: Rng + ?Sized,
        A: AccountFacade + ?Sized,
    {
        let spawn = spawn_position(cols);
        let current = random_piece(rng, account).with_pos(spawn);
        let next = random_piece(rng, account);
        let mut state = Self {
            board: Board::new(rows, cols),
            ghost: current.clone(),
            current,
            next,
            score: 0,
            lines_cleared: 0,
            phase: GamePhase::Ready,
        };
        state.compute_ghost();
        state
    }

    pub fn collides(&self, piece: &Piece) -> bool {
        self.board.collides(piece)
    }

    /// Shift the current piece one column. Rejected moves leave it in place.
    pub fn move_horizontal(&mut self, dir: Direction) -> bool {
        self.current.pos.x += dir.dx();
        let moved = !self.collides(&self.current);
        if !moved {
            self.current.pos.x -= dir.dx();
        }
        self.compute_ghost();
        moved
    }

    /// Quarter turn clockwise in place, no wall kicks. Rejected turns restore the
    /// previous shape.
    pub fn rotate(&mut self) -> bool {
        let rotated = self.current.shape.rotated();
        let original = std::mem::replace(&mut self.current.shape, rotated);
        let turned = !self.collides(&self.current);
        if !turned {
            self.current.shape = original;
        }
        self.compute_ghost();
        turned
    }

    /// Move the current piece down one row if that is legal
    pub fn step_down(&mut self) -> bool {
        self.current.pos.y += 1;
        if self.collides(&self.current) {
            self.current.pos.y -= 1;
            return false;
        }
        true
    }

    /// Drop a copy of the current piece until it would collide, then back off a row
    pub fn compute_ghost(&mut self) {
        let mut ghost = self.current.clone();
        // Any piece with a cell is out of the floor after `rows` steps
        let limit = self.current.pos.y + self.board.rows() as i32 + 1;
        while !self.collides(&ghost) && ghost.pos.y <= limit {
            ghost.pos.y += 1;
        }
        ghost.pos.y -= 1;
        self.ghost = ghost;
    }

    /// Remove full rows and add them to the counter
    pub fn clear_lines(&mut self) -> usize {
        let cleared = self.board.clear_lines();
        self.lines_cleared += cleared as u32;
        cleared
    }

    /// Merge the current piece, score it, clear lines, then promote `next` to the
    /// spawn point and draw a new `next`.
    pub fn lock_piece<R, A>(&mut self, rng: &mut R, account: &A) -> LockOutcome
    where
        R: Rng + ?Sized,
        A: AccountFacade + ?Sized,
    {
        let anchor = self.current.pos;
        self.board.merge(&self.current);
        self.score += 1;
        let lines_cleared = self.clear_lines();

        let next = std::mem::replace(&mut self.next, random_piece(rng, account));
        self.current = next.with_pos(spawn_position(self.board.cols()));
        self.compute_ghost();

        LockOutcome {
            anchor,
            lines_cleared,
            spawn_blocked: self.collides(&self.current),
        }
    }
}

/// Top-center anchor for new pieces
pub fn spawn_position(cols: usize) -> IVec2 {
    IVec2::new(cols as i32 / 2 - 1, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Guest;
    use crate::consts::{COLS, ROWS};
    use crate::sim::catalog::{Color, PieceKind};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn make_state() -> (GameState, Pcg32) {
        let mut rng = Pcg32::seed_from_u64(12345);
        let state = GameState::new(ROWS, COLS, &mut rng, &Guest);
        (state, rng)
    }

    fn set_current(state: &mut GameState, kind: PieceKind, x: i32, y: i32) {
        state.current = Piece::new(kind, Color::NEUTRAL).with_pos(IVec2::new(x, y));
        state.compute_ghost();
    }

    #[test]
    fn test_new_state_spawns_at_top_center() {
        let (state, _) = make_state();
        assert_eq!(state.current.pos, IVec2::new(4, 0));
        assert_eq!(state.score, 0);
        assert_eq!(state.board.occupied_count(), 0);
        assert!(!state.collides(&state.current));
    }

    #[test]
    fn test_move_blocked_by_wall() {
        let (mut state, _) = make_state();
        set_current(&mut state, PieceKind::O, 0, 5);
        assert!(!state.move_horizontal(Direction::Left));
        assert_eq!(state.current.pos.x, 0);
        assert!(state.move_horizontal(Direction::Right));
        assert_eq!(state.current.pos.x, 1);
        assert_eq!(state.ghost.pos.x, 1);
    }

    #[test]
    fn test_rotate_reverted_against_wall() {
        let (mut state, _) = make_state();
        // Vertical I flush against the right wall cannot turn flat
        set_current(&mut state, PieceKind::I, 9, 5);
        state.current.shape = state.current.shape.rotated();
        assert!(!state.collides(&state.current));
        let before = state.current.shape.clone();
        assert!(!state.rotate());
        assert_eq!(state.current.shape, before);
    }

    #[test]
    fn test_ghost_rests_on_floor() {
        let (mut state, _) = make_state();
        set_current(&mut state, PieceKind::O, 4, 0);
        assert_eq!(state.ghost.pos, IVec2::new(4, ROWS as i32 - 2));
    }

    #[test]
    fn test_ghost_rests_on_stack() {
        let (mut state, _) = make_state();
        state.board.set(IVec2::new(4, 10), Some(Color::NEUTRAL));
        set_current(&mut state, PieceKind::O, 4, 0);
        assert_eq!(state.ghost.pos.y, 8);
        let mut below = state.ghost.clone();
        below.pos.y += 1;
        assert!(state.collides(&below));
    }

    #[test]
    fn test_ghost_follows_moves() {
        let (mut state, _) = make_state();
        state.board.set(IVec2::new(0, 15), Some(Color::NEUTRAL));
        set_current(&mut state, PieceKind::O, 1, 0);
        assert_eq!(state.ghost.pos.y, ROWS as i32 - 2);
        state.move_horizontal(Direction::Left);
        assert_eq!(state.ghost.pos, IVec2::new(0, 13));
    }

    #[test]
    fn test_ghost_follows_rotation() {
        let (mut state, _) = make_state();
        set_current(&mut state, PieceKind::I, 3, 0);
        assert_eq!(state.ghost.pos.y, ROWS as i32 - 1);

        assert!(state.rotate());
        assert_eq!(state.ghost.shape, state.current.shape);
        assert_eq!(state.ghost.pos, IVec2::new(3, ROWS as i32 - 4));
    }

    #[test]
    fn test_ghost_refreshed_on_rejected_move() {
        let (mut state, _) = make_state();
        set_current(&mut state, PieceKind::O, 0, 0);
        assert_eq!(state.ghost.pos.y, ROWS as i32 - 2);
        // Stack grows under the piece without a ghost refresh
        state.board.set(IVec2::new(0, 15), Some(Color::NEUTRAL));

        assert!(!state.move_horizontal(Direction::Left));
        assert_eq!(state.current.pos, IVec2::new(0, 0));
        assert_eq!(state.ghost.pos, IVec2::new(0, 13));
    }

    #[test]
    fn test_lock_scores_and_promotes_next() {
        let (mut state, mut rng) = make_state();
        set_current(&mut state, PieceKind::T, 0, 18);
        let next_kind = state.next.kind;

        let outcome = state.lock_piece(&mut rng, &Guest);
        assert_eq!(outcome.anchor, IVec2::new(0, 18));
        assert_eq!(outcome.lines_cleared, 0);
        assert!(!outcome.spawn_blocked);
        assert_eq!(state.score, 1);
        assert_eq!(state.board.occupied_count(), 4);
        assert_eq!(state.current.kind, next_kind);
        assert_eq!(state.current.pos, spawn_position(COLS));
    }

    #[test]
    fn test_lock_clears_completed_row() {
        let (mut state, mut rng) = make_state();
        for x in 0..COLS as i32 - 4 {
            state.board.set(IVec2::new(x, ROWS as i32 - 1), Some(Color::NEUTRAL));
        }
        set_current(&mut state, PieceKind::I, COLS as i32 - 4, ROWS as i32 - 1);

        let outcome = state.lock_piece(&mut rng, &Guest);
        assert_eq!(outcome.lines_cleared, 1);
        assert_eq!(state.lines_cleared, 1);
        assert_eq!(state.score, 1);
        assert_eq!(state.board.occupied_count(), 0);
    }

    #[test]
    fn test_lock_reports_spawn_blocked() {
        let (mut state, mut rng) = make_state();
        for x in 0..COLS as i32 {
            if x != 0 {
                state.board.set(IVec2::new(x, 0), Some(Color::NEUTRAL));
            }
        }
        set_current(&mut state, PieceKind::O, 0, 18);
        let outcome = state.lock_piece(&mut rng, &Guest);
        assert!(outcome.spawn_blocked);
    }
}
