//! Math Pop entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Element, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use math_pop::audio::AudioManager;
    use math_pop::engine::{Cue, CueSink, GameLoop, Stage};
    use math_pop::render::CanvasTheme;
    use math_pop::tuning::Tuning;

    type WebGame = GameLoop<CanvasTheme, AudioManager>;

    /// Mirrors cue labels into an ARIA live region, when the host page
    /// provides one
    struct LiveAnnouncer {
        node: Option<Element>,
    }

    impl LiveAnnouncer {
        fn new(document: &web_sys::Document) -> Self {
            Self {
                node: document.get_element_by_id("announcer"),
            }
        }
    }

    impl CueSink for LiveAnnouncer {
        fn on_cue(&mut self, cue: Cue) {
            if let Some(node) = &self.node {
                node.set_text_content(Some(cue.label()));
            }
        }
    }

    /// The game loop plus the host page bits it keeps in sync
    struct App {
        game: WebGame,
        question_node: Option<Element>,
        last_question: String,
        announce_node: Option<Element>,
        last_selection: Option<u32>,
    }

    impl App {
        fn frame(&mut self, time: f64) {
            self.game.frame(time);
            self.sync_question_region();
            self.sync_selection();
        }

        /// Screen readers get each fresh prompt through a second live
        /// region; only written when the text actually changes
        fn sync_question_region(&mut self) {
            let Some(node) = &self.question_node else { return };
            let text = self
                .game
                .session()
                .round
                .as_ref()
                .map(|r| r.question.prompt())
                .unwrap_or_default();
            if text != self.last_question {
                node.set_text_content(Some(&text));
                self.last_question = text;
            }
        }

        /// Arrow navigation reads the highlighted value into the polite
        /// region. Silent once the round is judged; the outcome
        /// announcement keeps the last word.
        fn sync_selection(&mut self) {
            let Some(node) = &self.announce_node else { return };
            let session = self.game.session();
            let value = match session.stage {
                Stage::Awaiting => session.round.as_ref().and_then(|r| r.selected_value()),
                _ => None,
            };
            if value != self.last_selection {
                self.last_selection = value;
                if let Some(v) = value {
                    node.set_text_content(Some(&v.to_string()));
                }
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Math Pop starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Backing store in device pixels, drawing in CSS pixels
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        canvas.set_width((client_w as f64 * dpr) as u32);
        canvas.set_height((client_h as f64 * dpr) as u32);

        let mut theme = CanvasTheme::new(&canvas).expect("no 2d context");
        theme.set_viewport(client_w as f32, client_h as f32, dpr);

        // Hosts tune a variant by embedding JSON on the canvas tag
        let tuning = canvas
            .get_attribute("data-tuning")
            .map(|json| Tuning::from_json(&json))
            .unwrap_or_default();

        let seed = js_sys::Date::now() as u64;
        log::info!("Session seed: {seed}");

        let mut game = GameLoop::new(seed, &tuning, theme, AudioManager::new());
        game.add_sink(Box::new(LiveAnnouncer::new(&document)));

        let app = Rc::new(RefCell::new(App {
            game,
            question_node: document.get_element_by_id("question-live"),
            last_question: String::new(),
            announce_node: document.get_element_by_id("announcer"),
            last_selection: None,
        }));

        setup_input_handlers(&canvas, app.clone());
        setup_page_buttons(app.clone());

        request_animation_frame(app);

        log::info!("Math Pop running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Keyboard
        {
            let app = app.clone();
            let window = web_sys::window().unwrap();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                // keep space and arrows from scrolling the page
                match key.as_str() {
                    " " | "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight" => {
                        event.prevent_default()
                    }
                    _ => {}
                }
                app.borrow_mut().game.router_mut().on_key(&key);
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let point = vec2(event.offset_x() as f32, event.offset_y() as f32);
                app.borrow_mut().game.router_mut().on_pointer(point);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let point = vec2(
                        touch.client_x() as f32 - rect.left() as f32,
                        touch.client_y() as f32 - rect.top() as f32,
                    );
                    app.borrow_mut().game.router_mut().on_pointer(point);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Resize keeps the backing store and viewport in step
        {
            let canvas_clone = canvas.clone();
            let window = web_sys::window().unwrap();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let window = web_sys::window().unwrap();
                let dpr = window.device_pixel_ratio();
                let w = canvas_clone.client_width();
                let h = canvas_clone.client_height();
                canvas_clone.set_width((w as f64 * dpr) as u32);
                canvas_clone.set_height((h as f64 * dpr) as u32);
                app.borrow_mut()
                    .game
                    .renderer_mut()
                    .set_viewport(w as f32, h as f32, dpr);
            });
            let _ = window
                .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_page_buttons(app: Rc<RefCell<App>>) {
        let document = web_sys::window().unwrap().document().unwrap();

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().game.restart();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("mute-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().game.toggle_audio(None);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        app.borrow_mut().frame(time);
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

/// Headless scripted playthrough, handy as a native smoke test
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use math_pop::engine::{
        BurstField, Cue, GameLoop, GameSession, Hitbox, RenderError, Renderer, SoundEmitter, Stage,
    };
    use math_pop::tuning::Tuning;

    /// Fixed virtual board that logs the scene whenever it changes
    struct ConsoleBoard {
        last_line: String,
    }

    impl Renderer for ConsoleBoard {
        fn draw(
            &mut self,
            session: &GameSession,
            _sparks: &BurstField,
        ) -> Result<Vec<Hitbox>, RenderError> {
            let line = match session.round.as_ref() {
                Some(round) => format!(
                    "[{:?}] {}  score {}/{}  missed {}/{}",
                    session.phase,
                    round.question.prompt(),
                    session.scoreboard.display_score(),
                    session.scoreboard.score_goal,
                    session.scoreboard.wrong,
                    session.scoreboard.max_wrong,
                ),
                None => format!("[{:?}]", session.phase),
            };
            if line != self.last_line {
                log::info!("{line}");
                self.last_line = line;
            }
            let count = session.round.as_ref().map_or(0, |r| r.choices.len());
            Ok((0..count)
                .map(|i| {
                    Hitbox::new(i, vec2(40.0 + i as f32 * 130.0, 300.0), vec2(110.0, 70.0))
                })
                .collect())
        }
    }

    struct ConsoleChime;

    impl SoundEmitter for ConsoleChime {
        fn play(&mut self, cue: Cue) {
            log::debug!("chime: {}", cue.label());
        }
        fn set_muted(&mut self, _muted: bool) {}
    }

    pub fn run() {
        let seed = 2024;
        let tuning = Tuning {
            score_goal: 5,
            max_wrong: 3,
            ..Tuning::default()
        };
        let mut game = GameLoop::new(
            seed,
            &tuning,
            ConsoleBoard {
                last_line: String::new(),
            },
            ConsoleChime,
        );
        let mut policy = Pcg32::seed_from_u64(seed ^ 0xd1ce);

        game.start_game(None);

        let mut now = 0.0;
        for _ in 0..20_000 {
            if game.session().is_over() {
                break;
            }
            maybe_answer(&mut game, &mut policy);
            now += 16.7;
            game.frame(now);
        }

        let session = game.session();
        log::info!(
            "Finished {:?}: {} right, {} wrong, reached level {}",
            session.phase,
            session.scoreboard.score,
            session.scoreboard.wrong,
            session.level
        );
        println!("{}", game.snapshot_json());
    }

    /// Tap an answer through the same pointer path a player would use,
    /// right four times out of five
    fn maybe_answer(game: &mut GameLoop<ConsoleBoard, ConsoleChime>, policy: &mut Pcg32) {
        if game.session().stage != Stage::Awaiting {
            return;
        }
        let Some(round) = game.session().round.as_ref() else {
            return;
        };
        let len = round.choices.len();
        let correct = round
            .choices
            .position_of(round.question.answer)
            .unwrap_or(0);
        let target = if policy.random_bool(0.8) {
            correct
        } else {
            (correct + 1 + policy.random_range(0..len - 1)) % len
        };

        let boxes = game.router_mut().hitboxes().to_vec();
        if let Some(hit) = boxes.iter().find(|h| h.index == target) {
            game.router_mut().on_pointer(hit.center());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Math Pop (native) starting...");
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
