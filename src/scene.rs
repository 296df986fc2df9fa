//! Per-phase screen layout
//!
//! Each frame is drawn from scratch into a `Mask`; the pixel grid then
//! adopts the mask, so only cells that actually change get new fade
//! timestamps.

use crate::consts::*;
use crate::display::{BlinkClock, Canvas, Mask};
use crate::font::{self, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::sim::{EntitySnapshot, GameMode, GamePhase, GameState, Side};

/// Zoom-in time for the game-over banner (ms)
const BANNER_ZOOM_MS: f64 = 600.0;

/// Rectangle in grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl CellRect {
    pub fn contains(&self, gx: i32, gy: i32) -> bool {
        gx >= self.x && gy >= self.y && gx < self.x + self.w && gy < self.y + self.h
    }
}

/// A labelled, outlined button centred horizontally
fn button(width: u32, top: i32, label: &str) -> CellRect {
    let w = font::text_width(label, 1.0) + 6;
    CellRect {
        x: (width as i32 - w) / 2,
        y: top,
        w,
        h: GLYPH_HEIGHT as i32 + 4,
    }
}

/// START button on the menu
pub fn start_button(width: u32, height: u32) -> CellRect {
    button(width, height as i32 * 47 / 64, "START")
}

/// RESTART button on the game-over screen
pub fn restart_button(width: u32, height: u32) -> CellRect {
    button(width, height as i32 * 42 / 64, "RESTART")
}

/// Whether a cell belongs to the static court (walls and centre line)
pub fn court_contains(width: u32, height: u32, x: i32, y: i32) -> bool {
    let (w, h) = (width as i32, height as i32);
    if x < 0 || y < 0 || x >= w || y >= h {
        return false;
    }
    let wall = (y == 0 || y == h - 1) && x > 0 && x < w - 1;
    let net = x == w / 2 && y >= 1 && y <= h - 2 && (y - 1) % 2 == 0;
    wall || net
}

/// Walls along top and bottom, open goal mouths, dashed net
pub fn draw_court<C: Canvas + ?Sized>(canvas: &mut C) {
    let (w, h) = (canvas.width(), canvas.height());
    let goal_mouth = |x: i32, _y: i32| x == 0 || x == w - 1;
    canvas.rect_outline(0, 0, w, h, true, Some(&goal_mouth));
    canvas.dashed_vline(w / 2, 1, h - 2, 2, true);
}

/// Draw `text` with its top-left at (x, y); glyphs the font lacks are skipped
pub fn draw_text<C: Canvas + ?Sized>(canvas: &mut C, text: &str, x: i32, y: i32, scale: f32) {
    for (i, c) in text.chars().enumerate() {
        let Some(glyph) = font::glyph(c) else {
            continue;
        };
        let gx = x + ((i * GLYPH_ADVANCE) as f32 * scale).round() as i32;
        canvas.blit_scaled(&glyph, gx, y, scale);
    }
}

/// Draw `text` centred horizontally, top at `y`
pub fn draw_text_centered<C: Canvas + ?Sized>(canvas: &mut C, text: &str, y: i32, scale: f32) {
    let x = (canvas.width() - font::text_width(text, scale)) / 2;
    draw_text(canvas, text, x, y, scale);
}

fn draw_button<C: Canvas + ?Sized>(canvas: &mut C, rect: CellRect, label: &str) {
    canvas.rect_outline(rect.x, rect.y, rect.w, rect.h, true, None);
    draw_text(canvas, label, rect.x + 3, rect.y + 2, 1.0);
}

fn draw_scores(mask: &mut Mask, state: &GameState) {
    let w = mask.width();
    for side in [Side::Left, Side::Right] {
        let text = state.score.get(side).to_string();
        let tw = font::text_width(&text, 2.0);
        let cx = match side {
            Side::Left => w / 4,
            Side::Right => w * 3 / 4,
        };
        draw_text(mask, &text, cx - tw / 2, 3, 2.0);
    }
}

fn draw_entities(mask: &mut Mask, state: &GameState, entities: &EntitySnapshot) {
    for (paddle, y) in state.paddles.iter().zip(entities.paddle_y) {
        mask.fill_rect(
            paddle.x.round() as i32,
            y.round() as i32,
            PADDLE_WIDTH as i32,
            PADDLE_HEIGHT as i32,
            true,
        );
    }
    mask.fill_rect(
        entities.ball.x.round() as i32,
        entities.ball.y.round() as i32,
        BALL_SIZE as i32,
        BALL_SIZE as i32,
        true,
    );
}

fn draw_menu(mask: &mut Mask, state: &GameState, blink_on: bool) {
    let (w, h) = (mask.width() as u32, mask.height() as u32);
    draw_text_centered(mask, "PONG", 4, 3.0);

    let options = [(GameMode::OnePlayer, "1 PLAYER"), (GameMode::TwoPlayer, "2 PLAYER")];
    let left = (mask.width() - font::text_width("2 PLAYER", 1.0)) / 2;
    for (i, (mode, label)) in options.iter().enumerate() {
        let y = 23 + i as i32 * 7;
        draw_text(mask, label, left, y, 1.0);
        if state.mode == *mode {
            draw_text(mask, ">", left - GLYPH_ADVANCE as i32 - 1, y, 1.0);
        }
    }
    if state.mode == GameMode::OnePlayer {
        draw_text_centered(mask, state.difficulty.as_str(), 38, 1.0);
    }

    draw_button(mask, start_button(w, h), "START");
    if blink_on {
        draw_text_centered(mask, "PRESS ENTER", h as i32 - 7, 1.0);
    }
}

fn draw_countdown(mask: &mut Mask, state: &GameState, entities: &EntitySnapshot, now: f64) {
    draw_court(mask);
    draw_scores(mask, state);
    draw_entities(mask, state, entities);

    let n = state.countdown_remaining(now).max(1);
    let Some(glyph) = font::digit(n) else {
        return;
    };
    // Each digit shrinks from 6x to 3x over its second
    let frac = ((now - state.phase_started_at).max(0.0) % 1000.0 / 1000.0) as f32;
    let scale = 6.0 - 3.0 * frac;
    let gw = (GLYPH_WIDTH as f32 * scale).ceil() as i32;
    let gh = (GLYPH_HEIGHT as f32 * scale).ceil() as i32;
    let x = (mask.width() - gw) / 2;
    let y = (mask.height() - gh) / 2;
    mask.fill_rect(x - 1, y - 1, gw + 2, gh + 2, false);
    mask.blit_scaled(&glyph, x, y, scale);
}

fn draw_paused(mask: &mut Mask, state: &GameState, entities: &EntitySnapshot, blink_on: bool) {
    draw_court(mask);
    draw_scores(mask, state);
    draw_entities(mask, state, entities);

    let label = "PAUSED";
    let tw = font::text_width(label, 1.0);
    let bw = tw + 8;
    let bh = GLYPH_HEIGHT as i32 + 6;
    let bx = (mask.width() - bw) / 2;
    let by = (mask.height() - bh) / 2;
    mask.fill_rect(bx, by, bw, bh, false);
    mask.rect_outline(bx, by, bw, bh, true, None);
    if blink_on {
        draw_text(mask, label, bx + 4, by + 3, 1.0);
    }
}

/// Banner text for the winner
pub fn winner_banner(state: &GameState) -> &'static str {
    match (state.mode, state.winner) {
        (GameMode::OnePlayer, Some(Side::Left)) => "YOU WIN",
        (GameMode::OnePlayer, Some(Side::Right)) => "CPU WINS",
        (_, Some(Side::Left)) => "LEFT WINS",
        (_, Some(Side::Right)) => "RIGHT WINS",
        (_, None) => "GAME OVER",
    }
}

fn draw_game_over(mask: &mut Mask, state: &GameState, now: f64, blink_on: bool) {
    let (w, h) = (mask.width() as u32, mask.height() as u32);
    draw_court(mask);
    draw_scores(mask, state);

    let t = ((now - state.phase_started_at) / BANNER_ZOOM_MS).clamp(0.0, 1.0) as f32;
    let scale = 0.5 + 1.5 * t;
    let banner = winner_banner(state);
    let bh = (GLYPH_HEIGHT as f32 * scale).ceil() as i32;
    let by = h as i32 * 26 / 64 - bh / 2;
    mask.fill_rect(1, by - 1, w as i32 - 2, bh + 2, false);
    draw_text_centered(mask, banner, by, scale);

    let rect = restart_button(w, h);
    mask.fill_rect(rect.x, rect.y, rect.w, rect.h, false);
    draw_button(mask, rect, "RESTART");
    if blink_on {
        draw_text_centered(mask, "PRESS ENTER", h as i32 - 9, 1.0);
    }
}

/// Draw the whole frame for the current phase
pub fn draw(
    mask: &mut Mask,
    state: &GameState,
    entities: &EntitySnapshot,
    now: f64,
    blink: &mut BlinkClock,
) {
    mask.clear();
    match state.phase {
        GamePhase::Menu => {
            let on = blink.is_on(now);
            draw_menu(mask, state, on);
        }
        GamePhase::Countdown => draw_countdown(mask, state, entities, now),
        GamePhase::Playing => {
            draw_court(mask);
            draw_scores(mask, state);
            draw_entities(mask, state, entities);
        }
        GamePhase::Paused => {
            let on = blink.is_on(now);
            draw_paused(mask, state, entities, on);
        }
        GamePhase::GameOver => {
            let on = blink.is_on(now);
            draw_game_over(mask, state, now, on);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_court_predicate_matches_drawing() {
        let mut mask = Mask::new(96, 64);
        draw_court(&mut mask);
        for y in 0..64 {
            for x in 0..96 {
                assert_eq!(mask.get(x, y), court_contains(96, 64, x, y), "at ({x},{y})");
            }
        }
        assert!(!court_contains(96, 64, 0, 0));
        assert!(court_contains(96, 64, 48, 1));
        assert!(!court_contains(96, 64, 48, 2));
    }

    #[test]
    fn test_playing_frame_has_paddles_and_ball() {
        let mut state = GameState::new(5, 96, 64);
        state.start(0.0);
        state.update_countdown(state.countdown_ms);
        state.ball.pos = Vec2::new(20.0, 20.0);

        let mut mask = Mask::new(96, 64);
        let mut blink = BlinkClock::default();
        draw(&mut mask, &state, &state.snapshot(), 0.0, &mut blink);

        assert!(mask.get(20, 20) && mask.get(21, 21));
        let left = state.paddles[0];
        assert!(mask.get(left.x as i32, left.y as i32 + 5));
        let right = state.paddles[1];
        assert!(mask.get(right.x as i32 + 1, right.y as i32));
    }

    #[test]
    fn test_text_skips_unknown_glyphs() {
        let mut known = Mask::new(40, 10);
        draw_text(&mut known, "P P", 0, 0, 1.0);
        let mut with_unknown = Mask::new(40, 10);
        draw_text(&mut with_unknown, "PQP", 0, 0, 1.0);
        assert_eq!(known, with_unknown);
    }

    #[test]
    fn test_buttons_fit_and_contain_centre() {
        let start = start_button(96, 64);
        assert!(start.x >= 0 && start.x + start.w <= 96);
        assert!(start.contains(48, start.y + start.h / 2));
        assert!(!start.contains(0, 0));

        let restart = restart_button(96, 64);
        assert!(restart.y + restart.h < 64);
    }

    #[test]
    fn test_menu_blink_toggles_prompt() {
        let state = GameState::new(1, 96, 64);
        let mut blink = BlinkClock::new(500.0);
        let mut on = Mask::new(96, 64);
        draw(&mut on, &state, &state.snapshot(), 0.0, &mut blink);
        let mut off = Mask::new(96, 64);
        draw(&mut off, &state, &state.snapshot(), 300.0, &mut blink);
        assert!(on.count_on() > off.count_on());
    }

    #[test]
    fn test_game_over_banner_zooms() {
        let mut state = GameState::new(1, 96, 64);
        state.start(0.0);
        state.update_countdown(state.countdown_ms);
        for _ in 0..state.win_score {
            state.score_goal(Side::Right, 10_000.0);
        }
        assert_eq!(winner_banner(&state), "CPU WINS");

        let mut blink = BlinkClock::new(500.0);
        let mut early = Mask::new(96, 64);
        draw(&mut early, &state, &state.snapshot(), 10_000.0, &mut blink);
        let mut late = Mask::new(96, 64);
        draw(&mut late, &state, &state.snapshot(), 10_000.0 + BANNER_ZOOM_MS + 1000.0, &mut blink);
        assert!(late.count_on() > early.count_on());
    }
}
