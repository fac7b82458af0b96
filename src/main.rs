//! Blockfall entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlInputElement, MouseEvent, TouchEvent};

    use blockfall::account::AccountBook;
    use blockfall::platform::{Frame, FrameLoop, now_ms};
    use blockfall::progression;
    use blockfall::renderer::CanvasRenderer;
    use blockfall::settings::{BlockScale, Settings};
    use blockfall::sim::{GameEvent, Session, SoftDrop};

    type SharedAccounts = Rc<RefCell<AccountBook>>;

    /// Game instance holding all state
    struct Game {
        session: Session<SharedAccounts>,
        accounts: SharedAccounts,
        renderer: CanvasRenderer,
        frame_loop: FrameLoop,
        /// Bumped on every start so a stale animation frame callback can tell it is stale
        loop_generation: u32,
    }

    impl Game {
        fn new(accounts: SharedAccounts, settings: Settings, renderer: CanvasRenderer) -> Self {
            let seed = now_ms() as u64;
            Self {
                session: Session::new(accounts.clone(), settings, seed),
                accounts,
                renderer,
                frame_loop: FrameLoop::new(),
                loop_generation: 0,
            }
        }

        /// New session with a fresh seed
        fn start(&mut self) {
            let settings = self.session.settings().clone();
            let seed = now_ms() as u64;
            self.session = Session::new(self.accounts.clone(), settings, seed);
            self.session.start();
            self.frame_loop.start(now_ms());
            self.loop_generation = self.loop_generation.wrapping_add(1);
        }

        fn toggle_pause(&mut self) {
            if !self.session.is_running() {
                return;
            }
            self.session.toggle_pause();
            self.frame_loop
                .set_paused(self.session.is_paused(), now_ms());
        }

        fn auto_pause(&mut self, reason: &str) {
            if self.session.is_running() && !self.session.is_paused() {
                self.toggle_pause();
                log::info!("Auto-paused ({reason})");
            }
        }

        /// Leave the game view without finishing the session
        fn exit(&mut self) {
            self.session.stop();
            self.frame_loop.stop();
        }

        /// Advance one display refresh. Returns false once the loop is cancelled.
        fn frame(&mut self, time: f64) -> bool {
            match self.frame_loop.frame(time) {
                Frame::Stopped => return false,
                Frame::Paused => self.session.update(0.0),
                Frame::Run { dt_ms } => self.session.update(dt_ms),
            }
            for event in self.session.drain_events() {
                if let GameEvent::GameOver { .. } = event {
                    self.frame_loop.stop();
                }
                handle_event(event);
            }
            self.renderer.render(&self.session.snapshot());
            if !self.session.is_paused() {
                self.update_hud();
            }
            true
        }

        fn update_hud(&self) {
            let Some(document) = document() else {
                return;
            };
            set_text(&document, "gameScore", &self.session.score().to_string());
            set_text(&document, "gameXP", &self.session.xp_this_session().to_string());
            let accounts = self.accounts.borrow();
            if let Some(user) = accounts.current_user() {
                set_text(&document, "gameRecord", &user.best_score.to_string());
                set_text(&document, "gameLevel", &user.level.to_string());
            }
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn show_page(page: &str) {
        let Some(document) = document() else {
            return;
        };
        for id in ["lobbyPage", "gamePage"] {
            if let Some(el) = document.get_element_by_id(id) {
                let _ = if id == page {
                    el.class_list().add_1("active")
                } else {
                    el.class_list().remove_1("active")
                };
            }
        }
    }

    /// Lobby stats for the logged-in player
    fn update_lobby(accounts: &AccountBook) {
        let Some(document) = document() else {
            return;
        };
        let Some(user) = accounts.current_user() else {
            set_text(&document, "lobbyUsername", "Guest");
            return;
        };
        let progress = progression::progress(user.xp);
        set_text(&document, "lobbyUsername", &user.pseudo);
        set_text(&document, "lobbyLevel", &progress.level.to_string());
        set_text(&document, "lobbyXP", &progress.current.to_string());
        set_text(&document, "lobbyXPRequired", &progress.required.to_string());
        set_text(&document, "playerRecord", &user.best_score.to_string());
        if let Some(fill) = document.get_element_by_id("lobbyXPFill") {
            let _ = fill.set_attribute("style", &format!("width: {}%", progress.percentage));
        }
        if let Some(list) = document.get_element_by_id("topPlayers") {
            let lines: Vec<String> = accounts
                .top_scores(AccountBook::TOP_SCORES)
                .iter()
                .enumerate()
                .map(|(i, e)| format!("{}. {} - {}", i + 1, e.pseudo, e.score))
                .collect();
            list.set_text_content(Some(&lines.join("\n")));
        }
    }

    fn handle_event(event: GameEvent) {
        let GameEvent::GameOver {
            score, new_best, ..
        } = event
        else {
            return;
        };
        if let Some(document) = document() {
            set_text(&document, "finalScore", &score.to_string());
            if let Some(el) = document.get_element_by_id("newBest") {
                let _ = if new_best {
                    el.class_list().remove_1("hidden")
                } else {
                    el.class_list().add_1("hidden")
                };
            }
        }
        show_page("lobbyPage");
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Blockfall starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");
        let preview: Option<HtmlCanvasElement> = document
            .get_element_by_id("nextCanvas")
            .and_then(|el| el.dyn_into().ok());

        let mut settings = Settings::load();
        if let Some(width) = window.inner_width().ok().and_then(|w| w.as_f64()) {
            settings.block_scale = BlockScale::for_viewport(width);
        }

        let renderer = CanvasRenderer::new(canvas, preview.as_ref(), settings.block_scale)
            .expect("Failed to set up canvas");

        let accounts: SharedAccounts = Rc::new(RefCell::new(AccountBook::load()));
        update_lobby(&accounts.borrow());

        let game = Rc::new(RefCell::new(Game::new(accounts, settings, renderer)));

        setup_keyboard(game.clone());
        setup_mobile_controls(game.clone());
        setup_buttons(game.clone());
        setup_account_form(game.clone());
        setup_auto_pause(game);

        log::info!("Blockfall ready");
    }

    fn start_game(game: &Rc<RefCell<Game>>) {
        let generation = {
            let mut g = game.borrow_mut();
            g.start();
            g.loop_generation
        };
        show_page("gamePage");
        request_animation_frame(game.clone(), generation);
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>, generation: u32) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, generation, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, generation: u32, _time: f64) {
        let keep_going = {
            let mut g = game.borrow_mut();
            // The rAF timestamp and Date::now() use different clocks, stick to one
            g.loop_generation == generation && g.frame(now_ms())
        };
        if keep_going {
            request_animation_frame(game, generation);
        } else if let Ok(g) = game.try_borrow() {
            update_lobby(&g.accounts.borrow());
        }
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else {
            return;
        };

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let key = event.key();
                let mut g = game.borrow_mut();
                if !g.session.is_running() {
                    return;
                }
                if key == " " {
                    event.prevent_default();
                }
                if key == "Escape" {
                    g.toggle_pause();
                } else {
                    g.session.key_down(&key);
                }
            });
            let _ = document
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                game.borrow_mut().session.key_up(&event.key());
            });
            let _ = document
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, mut action: impl FnMut() + 'static) {
        let Some(btn) = document.get_element_by_id(id) else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| action());
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_mobile_controls(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else {
            return;
        };

        {
            let game = game.clone();
            on_click(&document, "btnLeft", move || {
                game.borrow_mut().session.move_left();
            });
        }
        {
            let game = game.clone();
            on_click(&document, "btnRight", move || {
                game.borrow_mut().session.move_right();
            });
        }
        {
            let game = game.clone();
            on_click(&document, "btnRotate", move || {
                game.borrow_mut().session.rotate();
            });
        }
        {
            let game = game.clone();
            on_click(&document, "btnHardDrop", move || {
                game.borrow_mut().session.hard_drop();
            });
        }

        // Hold-to-soft-drop button
        let Some(btn) = document.get_element_by_id("btnDown") else {
            return;
        };
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                game.borrow_mut().session.accelerate_drop(SoftDrop::Touch);
            });
            let _ = btn
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                game.borrow_mut().session.release_drop();
            });
            let _ = btn
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().session.accelerate_drop(SoftDrop::Touch);
            });
            let _ = btn
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        for release in ["mouseup", "mouseleave"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().session.release_drop();
            });
            let _ =
                btn.add_event_listener_with_callback(release, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else {
            return;
        };

        {
            let game = game.clone();
            on_click(&document, "playBtn", move || start_game(&game));
        }
        for id in ["pauseBtn", "pauseBtn-desktop"] {
            let game = game.clone();
            on_click(&document, id, move || game.borrow_mut().toggle_pause());
        }
        for id in ["exitGameBtn", "exitGameBtn-desktop"] {
            let game = game.clone();
            on_click(&document, id, move || {
                let mut g = game.borrow_mut();
                g.exit();
                update_lobby(&g.accounts.borrow());
                show_page("lobbyPage");
            });
        }
    }

    fn input_value(document: &Document, id: &str) -> String {
        document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value().trim().to_string())
            .unwrap_or_default()
    }

    /// Lobby login form. Account changes are refused mid-game.
    fn setup_account_form(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else {
            return;
        };

        for (id, create) in [("loginBtn", false), ("createAccountBtn", true)] {
            let game = game.clone();
            let doc = document.clone();
            on_click(&document, id, move || {
                let g = game.borrow();
                if g.session.is_running() {
                    return;
                }
                let pseudo = input_value(&doc, "loginPseudo");
                let code = input_value(&doc, "loginCode");
                if pseudo.is_empty() || code.is_empty() {
                    set_text(&doc, "accountStatus", "enter a name and a code");
                    return;
                }
                let mut accounts = g.accounts.borrow_mut();
                let result = if create {
                    accounts
                        .create_account(&pseudo, &code)
                        .and_then(|()| accounts.login(&pseudo, &code))
                } else {
                    accounts.login(&pseudo, &code)
                };
                match result {
                    Ok(()) => set_text(&doc, "accountStatus", ""),
                    Err(e) => {
                        log::warn!("Account action failed: {e}");
                        set_text(&doc, "accountStatus", &e.to_string());
                    }
                }
                update_lobby(&accounts);
            });
        }
        on_click(&document, "logoutBtn", move || {
            let g = game.borrow();
            if g.session.is_running() {
                return;
            }
            let mut accounts = g.accounts.borrow_mut();
            accounts.logout();
            update_lobby(&accounts);
        });
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().auto_pause("tab hidden");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().auto_pause("window blur");
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Blockfall (native) starting...");
    log::info!("Native mode runs a headless demo - run with `trunk serve` for the web version");

    demo_session();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Hard-drop pieces into a guest account until the stack tops out
#[cfg(not(target_arch = "wasm32"))]
fn demo_session() {
    use blockfall::account::AccountBook;
    use blockfall::settings::Settings;
    use blockfall::sim::{GameEvent, Session};

    let mut book = AccountBook::new();
    if let Err(e) = book
        .create_account("demo", "0000")
        .and_then(|()| book.login("demo", "0000"))
    {
        log::error!("Demo account unavailable: {e}");
        return;
    }

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let mut session = Session::new(book, Settings::default(), seed);
    session.start();

    let mut turn = 0u32;
    while !session.is_over() {
        // Spread pieces across the board so some lines clear
        match turn % 4 {
            0 => {
                for _ in 0..4 {
                    session.move_left();
                }
            }
            1 => {
                session.rotate();
                for _ in 0..4 {
                    session.move_right();
                }
            }
            2 => {}
            _ => {
                session.move_right();
                session.move_right();
            }
        }
        session.hard_drop();
        for _ in 0..10 {
            session.update(16.0);
        }
        for event in session.drain_events() {
            if let GameEvent::GameOver {
                score,
                lines_cleared,
                xp,
                new_best,
            } = event
            {
                println!(
                    "Game over: {score} pieces, {lines_cleared} lines, {xp} XP (new best: {new_best})"
                );
            }
        }
        turn += 1;
    }

    if let Some(user) = session.account().current_user() {
        let progress = blockfall::progression::progress(user.xp);
        println!(
            "demo is level {} ({}/{} XP, {}%)",
            progress.level, progress.current, progress.required, progress.percentage
        );
    }
}
