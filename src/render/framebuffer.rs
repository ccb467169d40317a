//! RGBA pixel buffer behind the raster canvas.

use crate::color::Rgba;
use crate::error::{Error, Result};

/// Rows are padded to this many bytes.
const ROW_ALIGNMENT: usize = 64;

/// Row-major RGBA pixel buffer.
///
/// Every row is padded to a multiple of 64 bytes; [`Framebuffer::to_compact_pixels`]
/// strips the padding for encoders.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    stride: usize,
}

impl Framebuffer {
    /// Create a transparent framebuffer.
    ///
    /// # Errors
    ///
    /// Returns an error if width or height is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use trueno_gg::render::Framebuffer;
    ///
    /// let fb = Framebuffer::new(800, 600).unwrap();
    /// assert_eq!(fb.width(), 800);
    /// assert_eq!(fb.height(), 600);
    /// ```
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        let row_bytes = (width as usize) * 4;
        let stride = (row_bytes + ROW_ALIGNMENT - 1) & !(ROW_ALIGNMENT - 1);
        Ok(Self {
            width,
            height,
            pixels: vec![0; stride * height as usize],
            stride,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Fill every pixel with `color`.
    pub fn clear(&mut self, color: Rgba) {
        let px = color.to_array();
        let row_bytes = (self.width as usize) * 4;
        for row in self.pixels.chunks_exact_mut(self.stride) {
            for chunk in row[..row_bytes].chunks_exact_mut(4) {
                chunk.copy_from_slice(&px);
            }
        }
    }

    /// Color at `(x, y)`, `None` outside the buffer.
    #[must_use]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.pixel_index(x, y);
        Some(Rgba::from_array([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]))
    }

    /// Overwrite the pixel at `(x, y)`; ignored outside the buffer.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.pixel_index(x, y);
        self.pixels[i..i + 4].copy_from_slice(&color.to_array());
    }

    /// Composite `color` over the pixel at `(x, y)` ("over" operator).
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height || color.a == 0 {
            return;
        }
        if color.a == 255 {
            self.set_pixel(x, y, color);
            return;
        }
        let i = self.pixel_index(x, y);
        let src_a = f32::from(color.a) / 255.0;
        let dst_a = f32::from(self.pixels[i + 3]) / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            return;
        }
        let blend = |src: u8, dst: u8| -> u8 {
            let out = (f32::from(src) * src_a + f32::from(dst) * dst_a * (1.0 - src_a)) / out_a;
            out.round().clamp(0.0, 255.0) as u8
        };
        self.pixels[i] = blend(color.r, self.pixels[i]);
        self.pixels[i + 1] = blend(color.g, self.pixels[i + 1]);
        self.pixels[i + 2] = blend(color.b, self.pixels[i + 2]);
        self.pixels[i + 3] = (out_a * 255.0).round() as u8;
    }

    /// Blend `color` over the pixels `x0..x1` of row `y`, clipped to the
    /// buffer.
    pub fn blend_span(&mut self, x0: i64, x1: i64, y: i64, color: Rgba) {
        if y < 0 || y >= i64::from(self.height) {
            return;
        }
        let start = x0.max(0);
        let end = x1.min(i64::from(self.width));
        for x in start..end {
            self.blend_pixel(x as u32, y as u32, color);
        }
    }

    /// Number of pixels that differ from `color`.
    #[must_use]
    pub fn count_unlike(&self, color: Rgba) -> usize {
        let px = color.to_array();
        let row_bytes = (self.width as usize) * 4;
        self.pixels
            .chunks_exact(self.stride)
            .flat_map(|row| row[..row_bytes].chunks_exact(4))
            .filter(|p| *p != px)
            .count()
    }

    /// Pixel data without row padding, as PNG encoders expect it.
    #[must_use]
    pub fn to_compact_pixels(&self) -> Vec<u8> {
        let row_bytes = (self.width as usize) * 4;
        if self.stride == row_bytes {
            return self.pixels.clone();
        }
        let mut compact = Vec::with_capacity(row_bytes * self.height as usize);
        for row in self.pixels.chunks_exact(self.stride) {
            compact.extend_from_slice(&row[..row_bytes]);
        }
        compact
    }

    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        (y as usize) * self.stride + (x as usize) * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_framebuffer() {
        let fb = Framebuffer::new(100, 50).unwrap();
        assert_eq!(fb.width(), 100);
        assert_eq!(fb.height(), 50);
        assert_eq!(fb.get_pixel(0, 0), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            Framebuffer::new(0, 10),
            Err(Error::InvalidDimensions { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_clear_and_count() {
        let mut fb = Framebuffer::new(17, 3).unwrap();
        fb.clear(Rgba::WHITE);
        assert_eq!(fb.count_unlike(Rgba::WHITE), 0);
        fb.set_pixel(16, 2, Rgba::RED);
        assert_eq!(fb.count_unlike(Rgba::WHITE), 1);
        assert_eq!(fb.get_pixel(16, 2), Some(Rgba::RED));
        assert_eq!(fb.get_pixel(17, 2), None);
    }

    #[test]
    fn test_blend_pixel() {
        let mut fb = Framebuffer::new(2, 2).unwrap();
        fb.clear(Rgba::WHITE);
        fb.blend_pixel(0, 0, Rgba::BLACK.with_alpha(128));
        let p = fb.get_pixel(0, 0).unwrap();
        assert!(p.r > 120 && p.r < 135);
        assert_eq!(p.a, 255);
    }

    #[test]
    fn test_blend_span_clips() {
        let mut fb = Framebuffer::new(4, 4).unwrap();
        fb.blend_span(-5, 10, 1, Rgba::BLUE);
        fb.blend_span(0, 4, 9, Rgba::BLUE);
        assert_eq!(fb.count_unlike(Rgba::TRANSPARENT), 4);
    }

    #[test]
    fn test_compact_pixels_strip_padding() {
        let fb = Framebuffer::new(3, 2).unwrap();
        assert_eq!(fb.to_compact_pixels().len(), 3 * 2 * 4);
    }
}
