//! Brickfall entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use brickfall::input::{Key, LevelGrid, client_to_canvas};
    use brickfall::progress::LocalStorage;
    use brickfall::sim::GameEvent;
    use brickfall::{LevelStatus, MenuChoice, Phase, Session, Settings, Tuning};

    /// Game instance holding all state
    struct Game {
        session: Session<LocalStorage>,
        settings: Settings,
        ctx: CanvasRenderingContext2d,
        grid: LevelGrid,
        /// Pending animation frame, cancelled on screen switch
        frame_id: Option<i32>,
        /// Transient "life lost" banner, in frames
        banner_frames: u32,
        /// Menu message (sign-in errors, welcome)
        notice: Option<String>,
    }

    impl Game {
        fn draw(&self) {
            let tuning = self.session.tuning();
            let (w, h) = (tuning.canvas_width as f64, tuning.canvas_height as f64);
            let ctx = &self.ctx;
            ctx.set_fill_style_str("#111");
            ctx.fill_rect(0.0, 0.0, w, h);

            let Some(state) = self.session.state() else {
                self.draw_menu();
                return;
            };

            for brick in state.bricks.iter().filter(|b| !b.broken) {
                ctx.set_fill_style_str(&format!("#{:06x}", brick.color));
                let r = brick.rect;
                ctx.fill_rect(r.pos.x as f64, r.pos.y as f64, r.size.x as f64, r.size.y as f64);
            }

            ctx.set_fill_style_str("#ffd54f");
            for power_up in &state.power_ups {
                let r = power_up.rect;
                ctx.fill_rect(r.pos.x as f64, r.pos.y as f64, r.size.x as f64, r.size.y as f64);
            }

            let p = &state.paddle;
            ctx.set_fill_style_str("#90caf9");
            ctx.fill_rect(p.x as f64, p.y as f64, p.width as f64, p.height as f64);

            let b = &state.ball;
            ctx.set_fill_style_str("#fff");
            ctx.begin_path();
            let _ = ctx.arc(
                b.pos.x as f64,
                b.pos.y as f64,
                b.radius as f64,
                0.0,
                std::f64::consts::TAU,
            );
            ctx.fill();

            ctx.set_font("16px sans-serif");
            let hud = format!(
                "Level {}   Lives {}   Score {}",
                state.level, state.lives, state.score
            );
            let _ = ctx.fill_text(&hud, 10.0, 22.0);

            let overlay = match self.session.phase() {
                Phase::LevelCleared { .. } => Some("Level cleared! N: next level  M: menu"),
                Phase::GameOver { .. } => Some("Game over. R: replay  M: menu"),
                _ if self.banner_frames > 0 => Some("Life lost!"),
                _ => None,
            };
            if let Some(text) = overlay {
                ctx.set_font("24px sans-serif");
                let _ = ctx.fill_text(text, w / 2.0 - 200.0, h / 2.0);
            }
        }

        /// Level select with the current profile
        fn draw_menu(&self) {
            let ctx = &self.ctx;
            ctx.set_fill_style_str("#eee");
            ctx.set_font("20px sans-serif");
            let player = match self.session.user() {
                Some(name) => format!("Player: {}", name),
                None => "Playing as guest".to_string(),
            };
            let _ = ctx.fill_text(&player, 30.0, 40.0);
            ctx.set_font("14px sans-serif");
            let _ = ctx.fill_text(
                "Click a level or press Enter   L: sign in   O: sign out   S: sound",
                30.0,
                66.0,
            );
            if let Some(notice) = &self.notice {
                ctx.set_fill_style_str("#ffb74d");
                let _ = ctx.fill_text(notice, 30.0, 90.0);
            }

            ctx.set_font("14px sans-serif");
            for (level, status) in self.session.level_statuses() {
                let Some(r) = self.grid.cell_rect(level) else {
                    continue;
                };
                let fill = match status {
                    LevelStatus::Cleared => "#66bb6a",
                    LevelStatus::Frontier => "#ffd54f",
                    LevelStatus::Locked => "#424242",
                };
                ctx.set_fill_style_str(fill);
                ctx.fill_rect(r.pos.x as f64, r.pos.y as f64, r.size.x as f64, r.size.y as f64);
                ctx.set_fill_style_str("#111");
                let _ = ctx.fill_text(
                    &level.to_string(),
                    r.pos.x as f64 + 6.0,
                    r.pos.y as f64 + 23.0,
                );
            }
        }

        fn handle_events(&mut self, events: &[GameEvent]) {
            for event in events {
                match event {
                    GameEvent::LifeLost { .. } => self.banner_frames = 90,
                    GameEvent::LevelCleared { next_level } => {
                        log::info!("Cleared! Level {} unlocked", next_level);
                    }
                    _ => {}
                }
            }
            self.banner_frames = self.banner_frames.saturating_sub(1);
        }

        /// Leave the play screen: stop the loop before dropping the attempt
        fn to_menu(&mut self) {
            if let Some(id) = self.frame_id.take() {
                let _ = web_sys::window().map(|w| w.cancel_animation_frame(id));
            }
            self.session.choose(MenuChoice::MainMenu);
        }

        /// Ask for a username, creating the profile if it is new
        fn prompt_sign_in(&mut self) {
            let answer = web_sys::window()
                .and_then(|w| w.prompt_with_message("Username").ok())
                .flatten();
            let Some(name) = answer else {
                return;
            };
            self.notice = match self.session.sign_in(&name) {
                Ok(progress) => Some(format!(
                    "Welcome {}! Level {} is next",
                    name.trim(),
                    progress.frontier(self.session.tuning().max_level)
                )),
                Err(e) => {
                    log::warn!("Sign-in failed: {}", e);
                    Some(e.to_string())
                }
            };
        }

        fn sign_out(&mut self) {
            self.session.logout();
            self.notice = Some("Signed out".to_string());
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Brickfall starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let tuning = Tuning::default();
        canvas.set_width(tuning.canvas_width as u32);
        canvas.set_height(tuning.canvas_height as u32);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        let seed = js_sys::Date::now() as u64;
        let storage = LocalStorage::new();
        let settings = Settings::load(&storage);
        let mut session = Session::new(tuning, storage, seed);
        let notice = match session.resume_last_user() {
            Some(progress) => {
                log::info!("Welcome back (level {})", progress.last_unlocked_level);
                session.user().map(|name| format!("Welcome back, {}", name))
            }
            None => {
                log::info!("Playing as guest");
                None
            }
        };
        let grid = LevelGrid::new(session.tuning().canvas_width, session.tuning().max_level);

        let game = Rc::new(RefCell::new(Game {
            session,
            settings,
            ctx,
            grid,
            frame_id: None,
            banner_frames: 0,
            notice,
        }));
        log::info!("Sound: {}", game.borrow().settings.sound_label());

        setup_input_handlers(&canvas, game.clone());
        game.borrow().draw();

        log::info!("Brickfall running!");
    }

    /// Start `level` from the menu if it is playable
    fn start_level(game: &Rc<RefCell<Game>>, level: u32) {
        {
            let mut g = game.borrow_mut();
            let playable = g
                .session
                .level_statuses()
                .iter()
                .any(|(l, status)| *l == level && status.is_playable());
            if !playable {
                g.notice = Some(format!("Level {} is locked", level));
                g.draw();
                return;
            }
            g.notice = None;
            g.session.start(level);
        }
        request_animation_frame(game.clone());
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let document = web_sys::window().unwrap().document().unwrap();

        // Pointer
        {
            let game = game.clone();
            let target = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let rect = target.get_bounding_client_rect();
                let mut g = game.borrow_mut();
                let width = g.session.tuning().canvas_width;
                let x = client_to_canvas(
                    event.client_x() as f32,
                    rect.left() as f32,
                    rect.width() as f32,
                    width,
                );
                g.session.input_mut().pointer_moved(x);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch
        {
            let game = game.clone();
            let target = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let Some(touch) = event.touches().get(0) else {
                    return;
                };
                event.prevent_default();
                let rect = target.get_bounding_client_rect();
                let mut g = game.borrow_mut();
                let width = g.session.tuning().canvas_width;
                let x = client_to_canvas(
                    touch.client_x() as f32,
                    rect.left() as f32,
                    rect.width() as f32,
                    width,
                );
                g.session.input_mut().pointer_moved(x);
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click picks a level from the menu grid
        {
            let game = game.clone();
            let target = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let level = {
                    let g = game.borrow();
                    if g.session.phase() != Phase::Idle {
                        return;
                    }
                    let rect = target.get_bounding_client_rect();
                    let tuning = g.session.tuning();
                    let x = client_to_canvas(
                        event.client_x() as f32,
                        rect.left() as f32,
                        rect.width() as f32,
                        tuning.canvas_width,
                    );
                    let y = client_to_canvas(
                        event.client_y() as f32,
                        rect.top() as f32,
                        rect.height() as f32,
                        tuning.canvas_height,
                    );
                    g.grid.level_at(x, y)
                };
                if let Some(level) = level {
                    start_level(&game, level);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                if let Some(k) = Key::from_dom_key(&key) {
                    game.borrow_mut().session.input_mut().key_down(k);
                    return;
                }
                let idle = game.borrow().session.phase() == Phase::Idle;
                let choice = match key.as_str() {
                    "n" | "N" => MenuChoice::NextLevel,
                    "r" | "R" => MenuChoice::Replay,
                    "s" | "S" => {
                        let mut g = game.borrow_mut();
                        g.settings.toggle_sound();
                        g.settings.save(&mut LocalStorage::new());
                        log::info!("{}", g.settings.sound_label());
                        return;
                    }
                    "m" | "M" | "Escape" => {
                        let mut g = game.borrow_mut();
                        g.to_menu();
                        g.draw();
                        return;
                    }
                    "Enter" if idle => {
                        let level = game.borrow().session.unlocked_level();
                        start_level(&game, level);
                        return;
                    }
                    "l" | "L" if idle => {
                        let mut g = game.borrow_mut();
                        g.prompt_sign_in();
                        g.draw();
                        return;
                    }
                    "o" | "O" if idle => {
                        let mut g = game.borrow_mut();
                        g.sign_out();
                        g.draw();
                        return;
                    }
                    _ => return,
                };
                let started = game.borrow_mut().session.choose(choice);
                if started.is_some() {
                    request_animation_frame(game.clone());
                }
            });
            let _ = document
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(k) = Key::from_dom_key(&event.key()) {
                    game.borrow_mut().session.input_mut().key_up(k);
                }
            });
            let _ = document
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let handle = game.clone();
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let id = window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .ok();
        handle.borrow_mut().frame_id = id;
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>) {
        let schedule_next = {
            let mut g = game.borrow_mut();
            g.frame_id = None;
            let frame = g.session.frame();
            g.handle_events(&frame.events);
            g.draw();
            frame.schedule_next
        };

        // Only a running session keeps the loop alive
        if schedule_next {
            request_animation_frame(game);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Entry point is wasm_main
}

/// Headless autopilot demo
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, clap::Parser)]
#[command(name = "brickfall")]
#[command(about = "Play a Brickfall level headlessly with the autopilot")]
struct Cli {
    /// Level to play
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    level: Option<u32>,
    /// JSON file with tuning overrides
    tuning: Option<std::path::PathBuf>,
    /// Give up after this many frames
    #[arg(long, default_value_t = 60 * 60 * 5)]
    max_frames: u32,
    /// RNG seed (defaults to the clock)
    #[arg(long)]
    seed: Option<u64>,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use brickfall::sim::{GameEvent, PaddleIntent, autopilot};
    use brickfall::{MemoryStore, Phase, Session, Tuning};
    use clap::Parser;

    env_logger::init();
    let cli = Cli::parse();
    log::info!("Brickfall (native) starting...");
    log::info!("Native mode runs a headless autopilot demo - build for wasm32 to play");

    let level = cli.level.unwrap_or(1);
    let tuning = match &cli.tuning {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => Tuning::from_json_or_default(&json),
            Err(e) => {
                log::warn!("Could not read {}: {}; using default tuning", path.display(), e);
                Tuning::default()
            }
        },
        None => Tuning::default(),
    };

    let seed = cli.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    });
    let mut session = Session::new(tuning, MemoryStore::new(), seed);
    if let Err(e) = session.sign_in("demo") {
        log::warn!("Demo profile unavailable: {}", e);
    }
    // Demo unlocks everything up to the requested level
    session.progress_mut().set("demo", level);
    let started = session.start(level);

    let mut frames = 0;
    while frames < cli.max_frames {
        if let Some(state) = session.state() {
            if let PaddleIntent::MoveTo(x) = autopilot(state) {
                session.input_mut().pointer_moved(x);
            }
        }
        let frame = session.frame();
        for event in &frame.events {
            match event {
                GameEvent::LifeLost { lives } => log::info!("Life lost, {} left", lives),
                GameEvent::PowerUpCollected { kind } => log::info!("Picked up {:?}", kind),
                _ => {}
            }
        }
        frames += 1;
        if !frame.schedule_next {
            break;
        }
    }

    let (score, remaining) = session
        .state()
        .map(|s| (s.score, s.remaining_bricks()))
        .unwrap_or((0, 0));
    match session.phase() {
        Phase::LevelCleared { next_level, .. } => println!(
            "Level {} cleared in {} frames (score {}), level {} unlocked",
            started, frames, score, next_level
        ),
        Phase::GameOver { .. } => println!(
            "Game over on level {} after {} frames (score {}, {} bricks left)",
            started, frames, score, remaining
        ),
        _ => println!(
            "Stopped after {} frames on level {} (score {}, {} bricks left)",
            frames, started, score, remaining
        ),
    }
}
