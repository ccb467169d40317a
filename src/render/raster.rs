//! Raster canvas over a [`Framebuffer`].

use super::canvas::{dash_segments, Canvas, Stroke, TextStyle};
use super::framebuffer::Framebuffer;
use super::primitives::{draw_line, fill_circle, fill_polygon, fill_rect, stroke_circle};
use crate::color::Rgba;
use crate::error::Result;

/// Raster backend. Text is not shaped: each string becomes a small marker
/// at its anchor.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    fb: Framebuffer,
}

impl RasterCanvas {
    /// Canvas of `width` x `height` pixels cleared to `background`.
    pub fn new(width: u32, height: u32, background: Rgba) -> Result<Self> {
        let mut fb = Framebuffer::new(width, height)?;
        fb.clear(background);
        Ok(Self { fb })
    }

    /// Rendered pixels.
    #[must_use]
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.fb
    }

    /// Consume the canvas.
    #[must_use]
    pub fn into_framebuffer(self) -> Framebuffer {
        self.fb
    }

    fn stroke_path(&mut self, points: &[(f64, f64)], stroke: &Stroke) {
        for segment in dash_segments(points, &stroke.dash) {
            for pair in segment.windows(2) {
                let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
                draw_line(&mut self.fb, x0, y0, x1, y1, stroke.width, stroke.color);
            }
        }
    }
}

impl Canvas for RasterCanvas {
    fn size(&self) -> (f64, f64) {
        (f64::from(self.fb.width()), f64::from(self.fb.height()))
    }

    fn supports_text(&self) -> bool {
        false
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: Rgba) {
        fill_rect(&mut self.fb, x, y, w, h, fill);
    }

    fn polyline(&mut self, points: &[(f64, f64)], stroke: &Stroke) {
        self.stroke_path(points, stroke);
    }

    fn polygon(&mut self, points: &[(f64, f64)], fill: Option<Rgba>, stroke: Option<&Stroke>) {
        if let Some(fill) = fill {
            fill_polygon(&mut self.fb, points, fill);
        }
        if let (Some(stroke), Some(first)) = (stroke, points.first()) {
            let mut closed = points.to_vec();
            closed.push(*first);
            self.stroke_path(&closed, stroke);
        }
    }

    fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: Option<Rgba>, stroke: Option<&Stroke>) {
        if let Some(fill) = fill {
            fill_circle(&mut self.fb, cx, cy, r, fill);
        }
        if let Some(stroke) = stroke {
            stroke_circle(&mut self.fb, cx, cy, r, stroke.width, stroke.color);
        }
    }

    fn text(&mut self, x: f64, y: f64, text: &str, style: &TextStyle) {
        if text.is_empty() {
            return;
        }
        let side = (style.size / 3.0).max(2.0);
        fill_rect(&mut self.fb, x - side / 2.0, y - side / 2.0, side, side, style.color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::canvas::Anchor;

    #[test]
    fn test_draws_shapes() {
        let mut c = RasterCanvas::new(50, 50, Rgba::WHITE).unwrap();
        assert_eq!(c.size(), (50.0, 50.0));
        c.circle(10.0, 10.0, 3.0, Some(Rgba::RED), None);
        c.polyline(&[(0.0, 40.0), (49.0, 40.0)], &Stroke::solid(Rgba::BLACK, 1.0));
        assert_eq!(c.framebuffer().get_pixel(10, 10), Some(Rgba::RED));
        assert_ne!(c.framebuffer().get_pixel(25, 40), Some(Rgba::WHITE));
    }

    #[test]
    fn test_text_is_a_marker() {
        let mut c = RasterCanvas::new(20, 20, Rgba::WHITE).unwrap();
        assert!(!c.supports_text());
        c.text(10.0, 10.0, "label", &TextStyle::new(12.0, Rgba::BLACK, Anchor::Middle));
        assert_eq!(c.framebuffer().get_pixel(10, 10), Some(Rgba::BLACK));
    }

    #[test]
    fn test_dashed_line_has_gaps() {
        let mut c = RasterCanvas::new(40, 5, Rgba::WHITE).unwrap();
        let stroke = Stroke::solid(Rgba::BLACK, 1.0).dashed(vec![4.0, 4.0]);
        c.polyline(&[(0.0, 2.0), (40.0, 2.0)], &stroke);
        assert_ne!(c.framebuffer().get_pixel(2, 2), Some(Rgba::WHITE));
        assert_eq!(c.framebuffer().get_pixel(6, 2), Some(Rgba::WHITE));
    }
}
