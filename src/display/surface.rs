//! Output surfaces
//!
//! The compositor only needs to fill rectangles with an RGBA color and to
//! know how big the surface is. `Framebuffer` is the in-memory software
//! implementation used by the headless runner and the tests; the browser
//! frontend wraps a 2D canvas context behind the same trait.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 8-bit RGBA color, laid out to match RGBA8888 byte order
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const MAGENTA: Rgba = Rgba::rgb(255, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with alpha set from a 0-1 fraction
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// Alpha as a 0-1 fraction
    #[inline]
    pub fn alpha(&self) -> f32 {
        self.a as f32 / 255.0
    }

    /// CSS `rgba()` form, for canvas fill styles
    pub fn to_css(&self) -> String {
        format!("rgba({},{},{},{:.4})", self.r, self.g, self.b, self.alpha())
    }

    /// Source-over blend of `self` onto an opaque destination
    #[inline]
    pub fn blend_over(self, dst: Rgba) -> Rgba {
        let a = self.a as u16;
        let inv = 255 - a;
        let mix = |s: u8, d: u8| ((s as u16 * a + d as u16 * inv + 127) / 255) as u8;
        Rgba {
            r: mix(self.r, dst.r),
            g: mix(self.g, dst.g),
            b: mix(self.b, dst.b),
            a: 255,
        }
    }
}

/// Minimal drawing capability the compositor depends on
pub trait Surface {
    /// Surface size in output pixels
    fn size(&self) -> (u32, u32);

    /// Fill a rectangle, blending `color` by its alpha over what is there
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba);
}

/// Software RGBA surface
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::BLACK; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Read one pixel; `None` outside the surface
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Raw RGBA8888 bytes, row-major
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Average luma over the whole surface, 0-255
    pub fn mean_luma(&self) -> f32 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let sum: f32 = self
            .pixels
            .iter()
            .map(|p| 0.299 * p.r as f32 + 0.587 * p.g as f32 + 0.114 * p.b as f32)
            .sum();
        sum / self.pixels.len() as f32
    }

    /// Convert a float span to a clipped pixel range (pixel centers inside the span)
    fn span(start: f32, len: f32, limit: u32) -> (u32, u32) {
        let a = start.round().max(0.0) as u32;
        let b = (start + len).round().max(0.0) as u32;
        (a.min(limit), b.min(limit))
    }
}

impl Surface for Framebuffer {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        if color.a == 0 || w <= 0.0 || h <= 0.0 {
            return;
        }
        let (x0, x1) = Self::span(x, w, self.width);
        let (y0, y1) = Self::span(y, h, self.height);
        for py in y0..y1 {
            let row = (py * self.width) as usize;
            for px in x0..x1 {
                let dst = &mut self.pixels[row + px as usize];
                *dst = if color.a == 255 { color } else { color.blend_over(*dst) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_opaque_and_clipped() {
        let mut fb = Framebuffer::new(4, 4);
        fb.fill_rect(2.0, 2.0, 10.0, 10.0, Rgba::rgb(10, 20, 30));
        assert_eq!(fb.pixel(3, 3), Some(Rgba::rgb(10, 20, 30)));
        assert_eq!(fb.pixel(1, 1), Some(Rgba::BLACK));
        assert_eq!(fb.pixel(4, 0), None);
    }

    #[test]
    fn test_fill_rect_negative_origin_clips() {
        let mut fb = Framebuffer::new(4, 4);
        fb.fill_rect(-3.0, -3.0, 4.0, 4.0, Rgba::rgb(255, 255, 255));
        assert_eq!(fb.pixel(0, 0), Some(Rgba::rgb(255, 255, 255)));
        assert_eq!(fb.pixel(1, 1), Some(Rgba::BLACK));
    }

    #[test]
    fn test_half_alpha_blend() {
        let mut fb = Framebuffer::new(1, 1);
        fb.fill_rect(0.0, 0.0, 1.0, 1.0, Rgba::rgb(200, 100, 0).with_alpha(0.5));
        let p = fb.pixel(0, 0).unwrap();
        assert!((p.r as i32 - 100).abs() <= 1);
        assert!((p.g as i32 - 50).abs() <= 1);
        assert_eq!(p.b, 0);
        assert_eq!(p.a, 255);
    }

    #[test]
    fn test_zero_alpha_is_noop() {
        let mut fb = Framebuffer::new(2, 2);
        fb.fill_rect(0.0, 0.0, 2.0, 2.0, Rgba::MAGENTA.with_alpha(0.0));
        assert!(fb.pixels().iter().all(|p| *p == Rgba::BLACK));
    }

    #[test]
    fn test_as_bytes_layout() {
        let mut fb = Framebuffer::new(1, 1);
        fb.fill_rect(0.0, 0.0, 1.0, 1.0, Rgba::rgb(1, 2, 3));
        assert_eq!(fb.as_bytes(), &[1, 2, 3, 255]);
    }

    #[test]
    fn test_css_string() {
        assert_eq!(Rgba::MAGENTA.with_alpha(0.5).to_css(), "rgba(255,0,255,0.5020)");
    }
}
