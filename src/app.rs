//! Frame driver
//!
//! One `frame()` call per display refresh: advance phase timers, run the
//! due simulation steps, draw the scene into the pixel grid and composite
//! it. Input arrives between frames as logical key names and surface
//! clicks.

use crate::consts::SIM_DT;
use crate::display::{
    BlinkClock, DegaussOutcome, FrameTiming, Mask, PixelDisplay, Surface, TimeSource,
};
use crate::game_loop::{FixedTimestep, StepReport};
use crate::scene;
use crate::settings::Settings;
use crate::sim::{
    AiController, Controller, DegaussWindow, EntitySnapshot, GameEvent, GameMode, GamePhase,
    GameState, KeySet, KeyboardController, PaddleController, Side, SimContext, TickInput, tick,
};

/// Everything one running game needs
#[derive(Debug)]
pub struct App {
    settings: Settings,
    display: PixelDisplay,
    state: GameState,
    controllers: [Controller; 2],
    timestep: FixedTimestep<EntitySnapshot>,
    blink: BlinkClock,
    mask: Mask,
    last_frame_at: Option<f64>,
    last_report: Option<StepReport>,
    running: bool,
}

impl App {
    /// App on the wall clock
    pub fn new(settings: Settings, seed: u64) -> Self {
        let display = PixelDisplay::new(&settings.display, settings.degauss);
        Self::with_display(settings, display, seed)
    }

    /// App on an explicit clock (tests, headless runs)
    pub fn with_clock(settings: Settings, seed: u64, clock: Box<dyn TimeSource>) -> Self {
        let display = PixelDisplay::with_clock(&settings.display, settings.degauss, clock);
        Self::with_display(settings, display, seed)
    }

    fn with_display(settings: Settings, display: PixelDisplay, seed: u64) -> Self {
        let (w, h) = (settings.display.emulated_width, settings.display.emulated_height);
        let mut state = GameState::new(seed, w, h);
        state.win_score = settings.game.win_score.max(1);
        state.countdown_ms = settings.game.countdown_ms;
        state.difficulty = settings.game.difficulty;
        state.mode = if settings.game.two_player {
            GameMode::TwoPlayer
        } else {
            GameMode::OnePlayer
        };
        let controllers = Self::controllers_for(state.mode, &state);
        log::info!("Game initialized with seed: {}", seed);
        Self {
            settings,
            display,
            state,
            controllers,
            timestep: FixedTimestep::default(),
            blink: BlinkClock::default(),
            mask: Mask::new(w, h),
            last_frame_at: None,
            last_report: None,
            running: true,
        }
    }

    fn controllers_for(mode: GameMode, state: &GameState) -> [Controller; 2] {
        let ai = |side: Side, salt: u64| {
            Controller::Ai(AiController::new(
                side,
                state.difficulty,
                state.seed.wrapping_add(salt),
            ))
        };
        match mode {
            GameMode::OnePlayer => [
                Controller::Keyboard(KeyboardController::new(KeySet::both())),
                ai(Side::Right, 1),
            ],
            GameMode::TwoPlayer => [
                Controller::Keyboard(KeyboardController::new(KeySet::left_hand())),
                Controller::Keyboard(KeyboardController::new(KeySet::right_hand())),
            ],
            GameMode::Attract => [ai(Side::Left, 2), ai(Side::Right, 3)],
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn display(&self) -> &PixelDisplay {
        &self.display
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop scheduling frames; `frame()` becomes a no-op
    pub fn stop(&mut self) {
        if self.running {
            log::info!("Display stopped");
        }
        self.running = false;
    }

    /// Step report of the most recent frame
    pub fn last_step(&self) -> Option<StepReport> {
        self.last_report
    }

    /// Read the clock fresh, without the previous frame's pinned time
    fn now(&mut self) -> f64 {
        self.display.set_time_override(None);
        let now = self.display.now();
        self.display.set_time_override(Some(now));
        now
    }

    /// Start a game from the menu
    pub fn start(&mut self) -> bool {
        if self.state.phase != GamePhase::Menu {
            return false;
        }
        let now = self.now();
        self.controllers = Self::controllers_for(self.state.mode, &self.state);
        self.state.start(now)
    }

    /// Start an AI-vs-AI game straight away
    pub fn start_attract(&mut self) -> bool {
        self.state.mode = GameMode::Attract;
        self.start()
    }

    /// Fire the degauss coil
    pub fn degauss(&mut self) -> DegaussOutcome {
        self.now();
        self.display.degauss()
    }

    /// Logical key pressed; returns true if anything used it
    pub fn key_down(&mut self, key: &str) -> bool {
        let mut used = false;
        for c in &mut self.controllers {
            used |= c.key_down(key);
        }

        if matches!(key, "d" | "D") {
            self.degauss();
            return true;
        }

        let now = self.now();
        let phase_used = match (self.state.phase, key) {
            (GamePhase::Menu, "Enter" | " ") => self.start(),
            (GamePhase::Menu, "ArrowUp" | "ArrowDown" | "w" | "W" | "s" | "S") => {
                self.state.mode = self.state.mode.toggled();
                true
            }
            (GamePhase::Menu, "ArrowRight") => {
                self.state.difficulty = self.state.difficulty.next();
                true
            }
            (GamePhase::Menu, "ArrowLeft") => {
                self.state.difficulty = self.state.difficulty.prev();
                true
            }
            (GamePhase::Playing | GamePhase::Paused, "Escape" | "p" | "P") => {
                self.state.toggle_pause(now)
            }
            (GamePhase::GameOver, "Enter" | " ") => self.state.restart(now),
            _ => false,
        };
        used || phase_used
    }

    /// Logical key released
    pub fn key_up(&mut self, key: &str) -> bool {
        let mut used = false;
        for c in &mut self.controllers {
            used |= c.key_up(key);
        }
        used
    }

    /// Drop held keys (window blur)
    pub fn release_keys(&mut self) {
        for c in &mut self.controllers {
            c.release_all();
        }
    }

    /// Pause if a game is in progress (tab hidden, focus lost)
    pub fn auto_pause(&mut self) -> bool {
        self.release_keys();
        if self.state.phase != GamePhase::Playing {
            return false;
        }
        let now = self.now();
        self.state.toggle_pause(now)
    }

    /// Pointer click at output-surface coordinates
    pub fn click(&mut self, sx: f32, sy: f32) -> bool {
        let (gx, gy) = self.display.grid().geometry().surface_to_grid(sx, sy);
        let (w, h) = (self.state.width, self.state.height);
        let now = self.now();
        match self.state.phase {
            GamePhase::Menu if scene::start_button(w, h).contains(gx, gy) => self.start(),
            GamePhase::GameOver if scene::restart_button(w, h).contains(gx, gy) => {
                self.state.restart(now)
            }
            _ => false,
        }
    }

    fn sim_context(&self, now: f64) -> SimContext {
        SimContext {
            now_ms: now,
            court_width: self.state.width,
            court_height: self.state.height,
            degauss: self
                .display
                .degauss_window()
                .map(|(start_ms, duration_ms)| DegaussWindow {
                    start_ms,
                    duration_ms,
                }),
        }
    }

    /// Clear the grid on scene changes so the old scene fades out
    ///
    /// Returns true if a goal re-served the ball.
    fn handle_events(&mut self) -> bool {
        let mut served = false;
        for event in self.state.drain_events() {
            match event {
                GameEvent::PhaseChanged { from, to } => {
                    let (w, h) = (self.state.width, self.state.height);
                    let grid = self.display.grid_mut();
                    match (from, to) {
                        // Court stays lit between these scenes
                        (GamePhase::Countdown, GamePhase::Playing)
                        | (GamePhase::Playing, GamePhase::GameOver) => {
                            let court = |x: i32, y: i32| scene::court_contains(w, h, x, y);
                            grid.clear_rect(0, 0, w as i32, h as i32, Some(&court));
                        }
                        (GamePhase::Playing, GamePhase::Paused)
                        | (GamePhase::Paused, GamePhase::Playing) => {}
                        _ => grid.clear(),
                    }
                    if to != GamePhase::Playing {
                        for c in &mut self.controllers {
                            c.release_all();
                        }
                    }
                }
                GameEvent::Goal { scorer, score } => {
                    log::debug!("{} scored ({}-{})", scorer.as_str(), score.left, score.right);
                    served = true;
                }
                GameEvent::PaddleHit(_) | GameEvent::WallBounce => {}
            }
        }
        served
    }

    /// Run one animation frame and composite it onto `surface`
    ///
    /// Returns `None` once the app has been stopped.
    pub fn frame<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Option<FrameTiming> {
        if !self.running {
            return None;
        }
        let now = self.now();
        let elapsed_ms = match self.last_frame_at {
            Some(prev) => (now - prev).max(0.0),
            None => self.display.target_interval_ms(),
        };
        self.last_frame_at = Some(now);

        self.state.update_countdown(now);
        self.handle_events();

        let simulating = self.state.phase == GamePhase::Playing;
        let ctx = self.sim_context(now);
        let controllers = &mut self.controllers;
        let report = self.timestep.advance(
            (elapsed_ms / 1000.0) as f32,
            simulating,
            &mut self.state,
            GameState::snapshot,
            |state| {
                let mut input = TickInput {
                    now_ms: ctx.now_ms,
                    ..Default::default()
                };
                for (i, c) in controllers.iter_mut().enumerate() {
                    input.directions[i] = c.decide(&state.paddles[i], &state.ball, &ctx);
                }
                tick(state, &input, SIM_DT);
            },
        );
        if report.capped {
            log::warn!("Simulation fell behind; dropped backlog");
        }
        self.last_report = Some(report);
        // The serve teleports the ball; never draw it between goal and centre
        if self.handle_events() {
            self.timestep.settle(self.state.snapshot());
        }

        let entities = match self.timestep.snapshots() {
            Some((prev, cur)) if simulating => cur.lerp_from(prev, report.alpha),
            _ => self.state.snapshot(),
        };
        scene::draw(&mut self.mask, &self.state, &entities, now, &mut self.blink);
        self.display.grid_mut().apply_mask(&self.mask);

        Some(self.display.render(surface, elapsed_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{Framebuffer, ManualClock};
    use crate::sim::Ball;
    use glam::Vec2;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn app(clock: &ManualClock) -> App {
        let mut settings = Settings::default();
        settings.display.output_width = 192;
        settings.display.output_height = 128;
        App::with_clock(settings, 42, Box::new(clock.clone()))
    }

    fn run_frames(app: &mut App, clock: &ManualClock, fb: &mut Framebuffer, n: usize) {
        for _ in 0..n {
            clock.advance(FRAME_MS);
            app.frame(fb);
        }
    }

    #[test]
    fn test_enter_runs_through_countdown_to_playing() {
        let clock = ManualClock::new(1000.0);
        let mut app = app(&clock);
        let mut fb = Framebuffer::new(192, 128);
        run_frames(&mut app, &clock, &mut fb, 2);
        assert_eq!(app.state().phase, GamePhase::Menu);
        assert!(app.display().grid().lit_count() > 0);

        assert!(app.key_down("Enter"));
        assert_eq!(app.state().phase, GamePhase::Countdown);
        run_frames(&mut app, &clock, &mut fb, 190);
        assert_eq!(app.state().phase, GamePhase::Playing);

        run_frames(&mut app, &clock, &mut fb, 30);
        assert!(app.state().time_ticks > 0);
        assert!(app.last_step().is_some_and(|r| r.steps <= crate::consts::MAX_SUBSTEPS));
    }

    #[test]
    fn test_menu_keys_change_mode_and_difficulty() {
        let clock = ManualClock::new(1.0);
        let mut app = app(&clock);
        assert_eq!(app.state().mode, GameMode::OnePlayer);
        app.key_down("ArrowDown");
        assert_eq!(app.state().mode, GameMode::TwoPlayer);
        let before = app.state().difficulty;
        app.key_down("ArrowRight");
        assert_eq!(app.state().difficulty, before.next());
        assert!(!app.key_down("x"));
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let clock = ManualClock::new(1.0);
        let mut app = app(&clock);
        let mut fb = Framebuffer::new(192, 128);
        app.key_down("Enter");
        run_frames(&mut app, &clock, &mut fb, 200);
        assert_eq!(app.state().phase, GamePhase::Playing);

        assert!(app.key_down("Escape"));
        let ticks = app.state().time_ticks;
        run_frames(&mut app, &clock, &mut fb, 30);
        assert_eq!(app.state().phase, GamePhase::Paused);
        assert_eq!(app.state().time_ticks, ticks);

        app.key_down("p");
        // First frame back only re-arms the accumulator
        run_frames(&mut app, &clock, &mut fb, 1);
        assert_eq!(app.state().time_ticks, ticks);
        run_frames(&mut app, &clock, &mut fb, 5);
        assert!(app.state().time_ticks > ticks);
    }

    #[test]
    fn test_goal_frame_does_not_interpolate_across_serve() {
        let clock = ManualClock::new(1.0);
        let mut app = app(&clock);
        let mut fb = Framebuffer::new(192, 128);
        app.key_down("Enter");
        run_frames(&mut app, &clock, &mut fb, 200);
        assert_eq!(app.state().phase, GamePhase::Playing);

        // One step from leaving through the left goal mouth
        app.state.ball = Ball {
            pos: Vec2::new(-1.95, 20.0),
            vel: Vec2::new(-40.0, 0.0),
        };
        run_frames(&mut app, &clock, &mut fb, 1);
        assert_eq!(app.state().score.right, 1);

        let (prev, cur) = app.timestep.snapshots().unwrap();
        assert_eq!(prev, cur);
        assert_eq!(*cur, app.state().snapshot());

        // Nothing lit between the goal mouth and the serve point
        let grid = app.display().grid();
        for x in 6..40 {
            for y in 19..=31 {
                assert!(!grid.get_pixel(x, y), "ghost ball at ({x},{y})");
            }
        }
    }

    #[test]
    fn test_click_start_button() {
        let clock = ManualClock::new(1.0);
        let mut app = app(&clock);
        let rect = scene::start_button(96, 64);
        let cell = app.display().grid().geometry().cell_width;
        assert!(!app.click(0.0, 0.0));
        let sx = (rect.x as f32 + 2.5) * cell;
        let sy = (rect.y as f32 + 2.5) * cell;
        assert!(app.click(sx, sy));
        assert_eq!(app.state().phase, GamePhase::Countdown);
    }

    #[test]
    fn test_degauss_key_reaches_ai_context() {
        let clock = ManualClock::new(1.0);
        let mut app = app(&clock);
        let mut fb = Framebuffer::new(192, 128);
        app.key_down("d");
        assert!(app.display().degauss_window().is_some());
        let ctx = app.sim_context(app.display().now());
        assert!(ctx.degauss.is_some());

        // Second press while running is swallowed
        assert_eq!(app.degauss(), DegaussOutcome::Ignored);
        run_frames(&mut app, &clock, &mut fb, 1);
        assert!(app.display().degauss_state().is_active());
    }

    #[test]
    fn test_countdown_to_playing_keeps_court_timestamps() {
        let clock = ManualClock::new(1.0);
        let mut app = app(&clock);
        let mut fb = Framebuffer::new(192, 128);
        app.key_down("Enter");
        run_frames(&mut app, &clock, &mut fb, 2);
        let net = app.display().grid().cell(48, 1).copied().unwrap();
        assert!(net.state);

        run_frames(&mut app, &clock, &mut fb, 200);
        assert_eq!(app.state().phase, GamePhase::Playing);
        let after = app.display().grid().cell(48, 1).copied().unwrap();
        assert!(after.state);
        assert_eq!(after.on_timestamp, net.on_timestamp);
    }

    #[test]
    fn test_attract_game_finishes() {
        let clock = ManualClock::new(1.0);
        let mut settings = Settings::default();
        settings.game.win_score = 1;
        settings.display.output_width = 192;
        settings.display.output_height = 128;
        let mut app = App::with_clock(settings, 9, Box::new(clock.clone()));
        let mut fb = Framebuffer::new(192, 128);
        assert!(app.start_attract());

        let mut frames = 0;
        while app.state().phase != GamePhase::GameOver && frames < 60 * 600 {
            clock.advance(FRAME_MS);
            app.frame(&mut fb);
            frames += 1;
        }
        assert_eq!(app.state().phase, GamePhase::GameOver);
        assert!(app.state().winner.is_some());
        assert!(fb.mean_luma() > 0.0);
    }

    #[test]
    fn test_stop_ends_frames() {
        let clock = ManualClock::new(1.0);
        let mut app = app(&clock);
        let mut fb = Framebuffer::new(192, 128);
        assert!(app.frame(&mut fb).is_some());
        app.stop();
        assert!(!app.is_running());
        assert!(app.frame(&mut fb).is_none());
    }

    #[test]
    fn test_scene_change_clears_grid() {
        let clock = ManualClock::new(1.0);
        let mut app = app(&clock);
        let mut fb = Framebuffer::new(192, 128);
        run_frames(&mut app, &clock, &mut fb, 1);
        assert!(app.display().grid().lit_count() > 0);
        app.key_down("Enter");
        run_frames(&mut app, &clock, &mut fb, 1);
        // Menu-only cells (the START button row) are off now
        let rect = scene::start_button(96, 64);
        assert!(!app.display().grid().get_pixel(rect.x, rect.y));
    }
}
