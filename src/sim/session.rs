//! Game session controller
//!
//! Drives the state machine from frame deltas and player input, hands out XP on
//! every lock, and reports the final score. All account writes are fire-and-forget.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::snapshot::Snapshot;
use super::state::{Direction, GamePhase, GameState, LockOutcome};
use crate::account::AccountFacade;
use crate::consts::{COLS, ROWS};
use crate::controls::Control;
use crate::progression;
use crate::settings::Settings;

/// Frames an XP popup stays visible
pub const POPUP_LIFETIME_FRAMES: u32 = 60;

/// Where a soft drop came from; each source has its own speed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftDrop {
    Key,
    Touch,
}

/// Floating "+N XP" label at a lock position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XpPopup {
    pub col: i32,
    pub row: i32,
    pub xp: u32,
    pub age: u32,
}

impl XpPopup {
    pub fn opacity(&self) -> f32 {
        (1.0 - self.age as f32 / POPUP_LIFETIME_FRAMES as f32).max(0.0)
    }
}

/// Notifications for the UI layer, drained once per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    PieceLocked { xp: u32, lines_cleared: usize },
    /// The session ended; the UI should leave the game view
    GameOver {
        score: u32,
        lines_cleared: u32,
        xp: u64,
        new_best: bool,
    },
}

/// One play session against an account
pub struct Session<A: AccountFacade> {
    state: GameState,
    account: A,
    settings: Settings,
    rng: Pcg32,
    seed: u64,
    /// Current gravity period (ms)
    drop_interval_ms: f64,
    /// Time since the last gravity step (ms)
    drop_elapsed_ms: f64,
    xp_this_session: u64,
    popups: Vec<XpPopup>,
    events: Vec<GameEvent>,
}

impl<A: AccountFacade> Session<A> {
    pub fn new(account: A, settings: Settings, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let state = GameState::new(ROWS, COLS, &mut rng, &account);
        Self {
            state,
            drop_interval_ms: settings.drop_interval_ms,
            account,
            settings,
            rng,
            seed,
            drop_elapsed_ms: 0.0,
            xp_this_session: 0,
            popups: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Fresh board, new piece pair, counters zeroed, gravity running
    pub fn start(&mut self) {
        let rows = self.state.board.rows();
        let cols = self.state.board.cols();
        self.state = GameState::new(rows, cols, &mut self.rng, &self.account);
        self.state.phase = GamePhase::Playing;
        self.drop_interval_ms = self.settings.drop_interval_ms;
        self.drop_elapsed_ms = 0.0;
        self.xp_this_session = 0;
        self.popups.clear();
        self.events.clear();
        log::info!("Session started (seed {})", self.seed);
    }

    /// Cancel from outside. No further gravity or input is applied.
    pub fn stop(&mut self) {
        if self.is_running() {
            log::info!("Session stopped at score {}", self.state.score);
            self.state.phase = GamePhase::Ready;
        }
    }

    pub fn toggle_pause(&mut self) {
        self.state.phase = match self.state.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
            other => other,
        };
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state.phase, GamePhase::Playing | GamePhase::Paused)
    }

    pub fn is_paused(&self) -> bool {
        self.state.phase == GamePhase::Paused
    }

    pub fn is_over(&self) -> bool {
        self.state.phase == GamePhase::GameOver
    }

    fn accepts_input(&self) -> bool {
        self.state.phase == GamePhase::Playing
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct state access for tests and tools; callers must keep `current` legal
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn account(&self) -> &A {
        &self.account
    }

    pub fn account_mut(&mut self) -> &mut A {
        &mut self.account
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn lines_cleared(&self) -> u32 {
        self.state.lines_cleared
    }

    pub fn xp_this_session(&self) -> u64 {
        self.xp_this_session
    }

    pub fn drop_interval_ms(&self) -> f64 {
        self.drop_interval_ms
    }

    pub fn popups(&self) -> &[XpPopup] {
        &self.popups
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Read-only view for the render layer
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            board: &self.state.board,
            current: &self.state.current,
            ghost: self.settings.ghost_piece.then_some(&self.state.ghost),
            next: &self.state.next,
            score: self.state.score,
            lines_cleared: self.state.lines_cleared,
            xp_this_session: self.xp_this_session,
            popups: if self.settings.xp_popups {
                &self.popups[..]
            } else {
                &[]
            },
            paused: self.is_paused(),
            over: self.is_over(),
        }
    }

    /// Advance one display frame by `dt_ms`
    ///
    /// Gravity fires once the elapsed time exceeds the drop interval. Popups age
    /// while the session is running, paused or not.
    pub fn update(&mut self, dt_ms: f64) {
        if !self.is_running() {
            return;
        }
        for popup in &mut self.popups {
            popup.age += 1;
        }
        self.popups.retain(|p| p.opacity() > 0.0);

        if !self.accepts_input() {
            return;
        }
        self.drop_elapsed_ms += dt_ms;
        if self.drop_elapsed_ms > self.drop_interval_ms {
            self.drop_elapsed_ms = 0.0;
            self.gravity_step();
        }
    }

    /// One row of gravity; locks if the piece cannot fall
    fn gravity_step(&mut self) {
        if !self.state.step_down() {
            self.lock();
        }
    }

    pub fn move_left(&mut self) -> bool {
        self.accepts_input() && self.state.move_horizontal(Direction::Left)
    }

    pub fn move_right(&mut self) -> bool {
        self.accepts_input() && self.state.move_horizontal(Direction::Right)
    }

    pub fn rotate(&mut self) -> bool {
        self.accepts_input() && self.state.rotate()
    }

    /// Drop to the ghost position and lock, all within this call
    pub fn hard_drop(&mut self) {
        if !self.accepts_input() {
            return;
        }
        while self.state.step_down() {}
        self.lock();
    }

    /// Shorten the gravity period until released
    pub fn accelerate_drop(&mut self, source: SoftDrop) {
        if !self.accepts_input() {
            return;
        }
        self.drop_interval_ms = match source {
            SoftDrop::Key => self.settings.soft_drop_interval_ms,
            SoftDrop::Touch => self.settings.touch_soft_drop_interval_ms,
        };
        self.state.compute_ghost();
    }

    pub fn release_drop(&mut self) {
        if !self.accepts_input() {
            return;
        }
        self.drop_interval_ms = self.settings.drop_interval_ms;
    }

    pub fn apply(&mut self, control: Control) {
        match control {
            Control::Left => {
                self.move_left();
            }
            Control::Right => {
                self.move_right();
            }
            Control::Rotate => {
                self.rotate();
            }
            Control::SoftDrop => self.accelerate_drop(SoftDrop::Key),
            Control::HardDrop => self.hard_drop(),
        }
    }

    /// Keyboard press, matched against the account's current bindings
    pub fn key_down(&mut self, key: &str) {
        if !self.accepts_input() {
            return;
        }
        if let Some(control) = self.account.control_bindings().resolve(key) {
            self.apply(control);
        }
    }

    /// Keyboard release; letting go of the "down" binding restores normal gravity
    pub fn key_up(&mut self, key: &str) {
        if self.account.control_bindings().is_down(key) {
            self.release_drop();
        }
    }

    fn lock(&mut self) {
        let outcome: LockOutcome = self.state.lock_piece(&mut self.rng, &self.account);

        let xp = progression::xp_gain(&mut self.rng);
        self.xp_this_session += u64::from(xp);
        self.account.report_xp_gain(xp);
        self.popups.push(XpPopup {
            col: outcome.anchor.x,
            row: outcome.anchor.y,
            xp,
            age: 0,
        });
        self.events.push(GameEvent::PieceLocked {
            xp,
            lines_cleared: outcome.lines_cleared,
        });
        log::debug!(
            "Locked at {:?}: +{xp} XP, {} line(s)",
            outcome.anchor,
            outcome.lines_cleared
        );

        self.drop_interval_ms = self.settings.drop_interval_ms;

        if outcome.spawn_blocked {
            self.end_game();
        }
    }

    fn end_game(&mut self) {
        self.state.phase = GamePhase::GameOver;
        let score = self.state.score;
        let new_best = self.account.report_best_score(score);
        log::info!(
            "Game over: score {score}, {} line(s), {} XP{}",
            self.state.lines_cleared,
            self.xp_this_session,
            if new_best { " (new best)" } else { "" }
        );
        self.events.push(GameEvent::GameOver {
            score,
            lines_cleared: self.state.lines_cleared,
            xp: self.xp_this_session,
            new_best,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountBook, Guest};
    use crate::sim::catalog::{Color, Piece, PieceKind};
    use glam::IVec2;

    fn started() -> Session<Guest> {
        let mut session = Session::new(Guest, Settings::default(), 12345);
        session.start();
        session
    }

    fn place(session: &mut Session<impl AccountFacade>, kind: PieceKind, x: i32, y: i32) {
        let state = session.state_mut();
        state.current = Piece::new(kind, Color::NEUTRAL).with_pos(IVec2::new(x, y));
        state.compute_ghost();
    }

    #[test]
    fn test_start_resets() {
        let mut session = Session::new(Guest, Settings::default(), 1);
        assert_eq!(session.phase(), GamePhase::Ready);
        session.start();
        assert!(session.is_running());
        assert_eq!(session.score(), 0);
        assert_eq!(session.xp_this_session(), 0);
        assert_eq!(session.state().board.occupied_count(), 0);
    }

    #[test]
    fn test_gravity_waits_for_interval() {
        let mut session = started();
        let y0 = session.state().current.pos.y;
        session.update(500.0);
        session.update(500.0);
        // Exactly 1000 ms is not "more than" the interval
        assert_eq!(session.state().current.pos.y, y0);
        session.update(1.0);
        assert_eq!(session.state().current.pos.y, y0 + 1);
    }

    #[test]
    fn test_gravity_locks_on_floor() {
        let mut session = started();
        place(&mut session, PieceKind::O, 0, ROWS as i32 - 2);
        session.update(1001.0);
        assert_eq!(session.score(), 1);
        assert_eq!(session.state().board.occupied_count(), 4);
        let events = session.drain_events();
        assert!(matches!(events[0], GameEvent::PieceLocked { lines_cleared: 0, .. }));
    }

    #[test]
    fn test_soft_drop_and_release() {
        let mut session = started();
        session.key_down("s");
        assert_eq!(session.drop_interval_ms(), 100.0);
        session.key_up("s");
        assert_eq!(session.drop_interval_ms(), 1000.0);

        session.accelerate_drop(SoftDrop::Touch);
        assert_eq!(session.drop_interval_ms(), 50.0);
        session.release_drop();
        assert_eq!(session.drop_interval_ms(), 1000.0);
    }

    #[test]
    fn test_release_ignored_while_paused() {
        let mut session = started();
        session.key_down("s");
        session.toggle_pause();
        session.key_up("s");
        session.release_drop();
        assert_eq!(session.drop_interval_ms(), 100.0);

        session.toggle_pause();
        session.key_up("s");
        assert_eq!(session.drop_interval_ms(), 1000.0);
    }

    #[test]
    fn test_lock_restores_normal_interval() {
        let mut session = started();
        session.accelerate_drop(SoftDrop::Key);
        session.hard_drop();
        assert_eq!(session.drop_interval_ms(), 1000.0);
    }

    #[test]
    fn test_hard_drop_lands_on_ghost() {
        let mut session = started();
        place(&mut session, PieceKind::I, 0, 0);
        let ghost = session.state().ghost.pos;
        session.hard_drop();
        assert_eq!(session.score(), 1);
        assert_eq!(ghost, IVec2::new(0, ROWS as i32 - 1));
        for x in 0..4 {
            assert!(
                session
                    .state()
                    .board
                    .get(IVec2::new(x, ROWS as i32 - 1))
                    .flatten()
                    .is_some()
            );
        }
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut session = started();
        session.toggle_pause();
        assert!(session.is_paused());
        let before = session.state().current.clone();

        session.update(5_000.0);
        session.key_down("a");
        session.move_right();
        session.rotate();
        session.hard_drop();
        assert_eq!(session.state().current, before);
        assert_eq!(session.score(), 0);

        session.toggle_pause();
        assert!(!session.is_paused());
        assert!(session.move_left());
    }

    #[test]
    fn test_popups_age_and_expire() {
        let mut session = started();
        session.hard_drop();
        assert_eq!(session.popups().len(), 1);
        session.toggle_pause();
        for _ in 0..POPUP_LIFETIME_FRAMES - 1 {
            session.update(16.0);
        }
        assert_eq!(session.popups().len(), 1);
        session.update(16.0);
        assert!(session.popups().is_empty());
    }

    #[test]
    fn test_stop_halts_gravity() {
        let mut session = started();
        session.stop();
        let before = session.state().current.pos;
        session.update(10_000.0);
        session.hard_drop();
        assert_eq!(session.state().current.pos, before);
        assert!(!session.is_running());
        assert!(!session.is_over());
    }

    #[test]
    fn test_game_over_reports_best_score() {
        let mut book = AccountBook::new();
        book.create_account("ana", "1").unwrap();
        book.login("ana", "1").unwrap();
        let mut session = Session::new(book, Settings::default(), 3);
        session.start();

        // Stack the spawn rows so the next piece cannot appear
        for x in 1..COLS as i32 {
            session.state_mut().board.set(IVec2::new(x, 0), Some(Color::NEUTRAL));
        }
        place(&mut session, PieceKind::O, 0, ROWS as i32 - 2);
        session.hard_drop();

        assert!(session.is_over());
        assert!(!session.is_running());
        let events = session.drain_events();
        assert_eq!(
            events.last(),
            Some(&GameEvent::GameOver {
                score: 1,
                lines_cleared: 0,
                xp: session.xp_this_session(),
                new_best: true,
            })
        );
        let user = session.account().current_user().unwrap();
        assert_eq!(user.best_score, 1);
        assert_eq!(user.xp, session.xp_this_session());

        // Nothing moves once the game is over
        session.update(5_000.0);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn test_bindings_come_from_account() {
        let mut book = AccountBook::new();
        book.create_account("ana", "1").unwrap();
        book.login("ana", "1").unwrap();
        book.update_controls(crate::controls::ControlBindings {
            left: "arrowleft".to_string(),
            ..Default::default()
        })
        .unwrap();
        let mut session = Session::new(book, Settings::default(), 3);
        session.start();
        place(&mut session, PieceKind::O, 4, 5);

        session.key_down("a");
        assert_eq!(session.state().current.pos.x, 4);
        session.key_down("ArrowLeft");
        assert_eq!(session.state().current.pos.x, 3);
    }

    #[test]
    fn test_snapshot_respects_display_settings() {
        let settings = Settings {
            ghost_piece: false,
            xp_popups: false,
            ..Settings::default()
        };
        let mut session = Session::new(Guest, settings, 9);
        session.start();
        session.hard_drop();
        let snap = session.snapshot();
        assert!(snap.ghost.is_none());
        assert!(snap.popups.is_empty());
        assert_eq!(snap.score, 1);
        assert!(!snap.paused);
    }
}
