//! Phosphor Pong entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use phosphor_pong::display::{Rgba, Surface};
    use phosphor_pong::{App, Settings};

    /// Canvas 2D context as a compositor target
    struct CanvasSurface {
        ctx: CanvasRenderingContext2d,
        width: u32,
        height: u32,
        last_color: Option<Rgba>,
    }

    impl Surface for CanvasSurface {
        fn size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
            // Style strings are costly to build; most cells repeat the last one
            if self.last_color != Some(color) {
                self.ctx.set_fill_style_str(&color.to_css());
                self.last_color = Some(color);
            }
            self.ctx.fill_rect(x as f64, y as f64, w as f64, h as f64);
        }
    }

    struct Game {
        app: App,
        surface: CanvasSurface,
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"logger already initialized".into());
        }

        log::info!("Phosphor Pong starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let settings = Settings::default();
        canvas.set_width(settings.display.output_width);
        canvas.set_height(settings.display.output_height);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;

        let seed = settings.game.seed.unwrap_or(js_sys::Date::now() as u64);
        let surface = CanvasSurface {
            ctx,
            width: settings.display.output_width,
            height: settings.display.output_height,
            last_color: None,
        };
        let game = Rc::new(RefCell::new(Game {
            app: App::new(settings, seed),
            surface,
        }));

        setup_input_handlers(&canvas, game.clone());
        setup_auto_pause(game.clone());

        request_animation_frame(game);

        log::info!("Phosphor Pong running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if game.borrow_mut().app.key_down(&event.key()) {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if game.borrow_mut().app.key_up(&event.key()) {
                    event.prevent_default();
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Clicks land in CSS pixels; scale to the canvas backing size
        {
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let rect = canvas_clone.get_bounding_client_rect();
                if rect.width() <= 0.0 || rect.height() <= 0.0 {
                    return;
                }
                let sx = (event.client_x() as f64 - rect.left()) * canvas_clone.width() as f64
                    / rect.width();
                let sy = (event.client_y() as f64 - rect.top()) * canvas_clone.height() as f64
                    / rect.height();
                game.borrow_mut().app.click(sx as f32, sy as f32);
            });
            let _ = canvas.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>) {
        {
            let mut g = game.borrow_mut();
            let Game { app, surface } = &mut *g;
            if app.frame(surface).is_none() {
                log::info!("Frame loop ended");
                return;
            }
        }

        request_animation_frame(game);
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
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden
                    && game.borrow_mut().app.auto_pause()
                {
                    log::info!("Auto-paused (tab hidden)");
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
                if game.borrow_mut().app.auto_pause() {
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

/// Headless attract run: AI against AI on a manual clock, composited
/// into an in-memory framebuffer, with the coil fired now and then.
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use phosphor_pong::display::{DegaussOutcome, Framebuffer, ManualClock};
    use phosphor_pong::sim::GamePhase;
    use phosphor_pong::{App, Settings};

    env_logger::init();
    log::info!("Phosphor Pong (native) starting...");

    let mut config_path = None;
    let mut seconds = 30.0_f64;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seconds" => match args.next().and_then(|s| s.parse().ok()) {
                Some(s) => seconds = s,
                None => {
                    eprintln!("--seconds needs a number");
                    std::process::exit(2);
                }
            },
            path => config_path = Some(std::path::PathBuf::from(path)),
        }
    }

    let settings = match &config_path {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    let seed = settings.game.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    });

    let clock = ManualClock::new(0.0);
    let mut fb = Framebuffer::new(
        settings.display.output_width,
        settings.display.output_height,
    );
    let frame_ms = settings.display.target_interval_ms();
    let mut app = App::with_clock(settings, seed, Box::new(clock.clone()));
    app.start_attract();

    let frames = (seconds * 1000.0 / frame_ms).ceil() as u64;
    let mut degauss_started = 0;
    let mut max_drift = 0.0_f64;
    for i in 0..frames {
        clock.advance(frame_ms);
        // Fire the coil every five seconds
        if i % 300 == 150 && matches!(app.degauss(), DegaussOutcome::Started { .. }) {
            degauss_started += 1;
        }
        if let Some(timing) = app.frame(&mut fb) {
            max_drift = max_drift.max(timing.drift_ms.abs());
        }
        if app.state().phase == GamePhase::GameOver {
            let score = app.state().score;
            log::info!("Attract game over: {} - {}", score.left, score.right);
            app.key_down("Enter");
            app.start_attract();
        }
    }
    app.stop();

    let score = app.state().score;
    log::info!(
        "Ran {} frames ({:.1}s simulated): score {} - {}, {} degauss runs, lit cells {}, mean luma {:.3}, max drift {:.2}ms",
        frames,
        seconds,
        score.left,
        score.right,
        degauss_started,
        app.display().grid().lit_count(),
        fb.mean_luma(),
        max_drift,
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
