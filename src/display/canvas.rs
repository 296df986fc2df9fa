//! Drawing primitives over an on/off pixel plane
//!
//! Everything here is expressed through `Canvas::set`, so the same shapes
//! can be drawn straight onto the `PixelGrid` or into a scratch `Mask`.
//! Coordinates are signed and every primitive clips silently.

/// A row-major 0/1 bitmap (font glyphs, sprites)
#[derive(Debug, Clone, Copy)]
pub struct Bitmap<'a> {
    pub width: usize,
    pub height: usize,
    pub bits: &'a [u8],
}

impl<'a> Bitmap<'a> {
    pub const fn new(width: usize, height: usize, bits: &'a [u8]) -> Self {
        Self {
            width,
            height,
            bits,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.bits.get(y * self.width + x).is_some_and(|b| *b != 0)
    }
}

/// On/off drawing target
pub trait Canvas {
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    /// Write one cell; out-of-bounds writes are ignored
    fn set(&mut self, x: i32, y: i32, on: bool);

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width() && y < self.height()
    }

    /// Filled rectangle
    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, on: bool) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width());
        let y1 = y.saturating_add(h).min(self.height());
        for py in y0..y1 {
            for px in x0..x1 {
                self.set(px, py, on);
            }
        }
    }

    /// One-cell rectangle outline; cells for which `skip` returns true are left alone
    fn rect_outline(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        on: bool,
        skip: Option<&dyn Fn(i32, i32) -> bool>,
    ) {
        if w <= 0 || h <= 0 {
            return;
        }
        let plot = |canvas: &mut Self, px: i32, py: i32| {
            if skip.is_some_and(|f| f(px, py)) {
                return;
            }
            canvas.set(px, py, on);
        };
        let right = x + w - 1;
        let bottom = y + h - 1;
        for px in x..=right {
            plot(self, px, y);
            if bottom != y {
                plot(self, px, bottom);
            }
        }
        for py in (y + 1)..bottom {
            plot(self, x, py);
            if right != x {
                plot(self, right, py);
            }
        }
    }

    /// Horizontal line from `x0` to `x1` inclusive
    fn hline(&mut self, x0: i32, x1: i32, y: i32, on: bool) {
        let (a, b) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        for px in a.max(0)..=b.min(self.width() - 1) {
            self.set(px, y, on);
        }
    }

    /// Vertical line from `y0` to `y1` inclusive
    fn vline(&mut self, x: i32, y0: i32, y1: i32, on: bool) {
        let (a, b) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        for py in a.max(0)..=b.min(self.height() - 1) {
            self.set(x, py, on);
        }
    }

    /// Vertical line lit only on every `every`-th row, counted from `y0`
    fn dashed_vline(&mut self, x: i32, y0: i32, y1: i32, every: i32, on: bool) {
        if every <= 0 {
            return;
        }
        let (a, b) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        let mut py = a;
        while py <= b {
            self.set(x, py, on);
            py += every;
        }
    }

    /// Nearest-neighbour scaled blit of the bitmap's set bits
    ///
    /// `scale` may be fractional, which is what the zoom animations use.
    /// Zero bits are transparent.
    fn blit_scaled(&mut self, bitmap: &Bitmap<'_>, x: i32, y: i32, scale: f32) {
        if scale <= 0.0 || !scale.is_finite() {
            return;
        }
        let dw = (bitmap.width as f32 * scale).ceil() as i32;
        let dh = (bitmap.height as f32 * scale).ceil() as i32;
        for dy in 0..dh {
            let sy = (dy as f32 / scale) as usize;
            for dx in 0..dw {
                let sx = (dx as f32 / scale) as usize;
                if bitmap.get(sx, sy) {
                    self.set(x + dx, y + dy, true);
                }
            }
        }
    }
}

/// Scratch on/off plane, the desired contents of one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: i32,
    height: i32,
    cells: Vec<bool>,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            cells: vec![false; width as usize * height as usize],
        }
    }

    /// False outside the mask
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.cells[(y * self.width + x) as usize]
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    pub fn count_on(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    /// Coordinates of every lit cell, row-major
    pub fn lit(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let w = self.width;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(move |(i, _)| (i as i32 % w, i as i32 / w))
    }
}

impl Canvas for Mask {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn set(&mut self, x: i32, y: i32, on: bool) {
        if self.in_bounds(x, y) {
            self.cells[(y * self.width + x) as usize] = on;
        }
    }
}
