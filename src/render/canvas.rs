//! Drawing surface abstraction shared by the raster and vector backends.

use crate::color::Rgba;

/// Line appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Line color.
    pub color: Rgba,
    /// Width in pixels.
    pub width: f64,
    /// Dash pattern in pixels, alternating on and off; empty for solid.
    pub dash: Vec<f64>,
}

impl Stroke {
    /// Solid line.
    #[must_use]
    pub fn solid(color: Rgba, width: f64) -> Self {
        Self {
            color,
            width,
            dash: Vec::new(),
        }
    }

    /// Set the dash pattern.
    #[must_use]
    pub fn dashed(mut self, dash: Vec<f64>) -> Self {
        self.dash = dash;
        self
    }
}

/// Horizontal text alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Text starts at the anchor.
    #[default]
    Start,
    /// Text is centered on the anchor.
    Middle,
    /// Text ends at the anchor.
    End,
}

/// Text appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size: f64,
    /// Fill color.
    pub color: Rgba,
    /// Horizontal alignment.
    pub anchor: Anchor,
    /// Rotation in degrees, counter-clockwise.
    pub rotate: f64,
}

impl TextStyle {
    /// Unrotated text.
    #[must_use]
    pub fn new(size: f64, color: Rgba, anchor: Anchor) -> Self {
        Self {
            size,
            color,
            anchor,
            rotate: 0.0,
        }
    }

    /// Rotate by `degrees`.
    #[must_use]
    pub fn rotated(mut self, degrees: f64) -> Self {
        self.rotate = degrees;
        self
    }
}

/// A surface the renderer draws on, in pixel coordinates with the origin
/// at the top left.
pub trait Canvas {
    /// Surface size in pixels.
    fn size(&self) -> (f64, f64);

    /// Whether [`Canvas::text`] renders glyphs.
    fn supports_text(&self) -> bool;

    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: Rgba);

    /// Outline an axis-aligned rectangle.
    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, stroke: &Stroke) {
        let pts = [(x, y), (x + w, y), (x + w, y + h), (x, y + h), (x, y)];
        self.polyline(&pts, stroke);
    }

    /// Open polyline.
    fn polyline(&mut self, points: &[(f64, f64)], stroke: &Stroke);

    /// Closed polygon, filled and/or outlined.
    fn polygon(&mut self, points: &[(f64, f64)], fill: Option<Rgba>, stroke: Option<&Stroke>);

    /// Circle, filled and/or outlined.
    fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: Option<Rgba>, stroke: Option<&Stroke>);

    /// Text at an anchor point on the baseline.
    fn text(&mut self, x: f64, y: f64, text: &str, style: &TextStyle);
}

/// Split a polyline into its visible dash segments.
#[must_use]
pub fn dash_segments(points: &[(f64, f64)], dash: &[f64]) -> Vec<Vec<(f64, f64)>> {
    if dash.is_empty() || dash.iter().all(|d| *d <= 0.0) || points.len() < 2 {
        return vec![points.to_vec()];
    }
    let mut segments = Vec::new();
    let mut current: Vec<(f64, f64)> = vec![points[0]];
    let mut index = 0;
    let mut left = dash[0];
    let mut on = true;
    for pair in points.windows(2) {
        let (mut x0, mut y0) = pair[0];
        let (x1, y1) = pair[1];
        let mut len = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        while len > left {
            let t = left / len;
            let (mx, my) = (x0 + (x1 - x0) * t, y0 + (y1 - y0) * t);
            if on {
                current.push((mx, my));
                segments.push(std::mem::take(&mut current));
            } else {
                current = vec![(mx, my)];
            }
            len -= left;
            (x0, y0) = (mx, my);
            on = !on;
            index = (index + 1) % dash.len();
            left = dash[index].max(f64::EPSILON);
        }
        left -= len;
        if on {
            current.push((x1, y1));
        }
    }
    if on && current.len() > 1 {
        segments.push(current);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_is_one_segment() {
        let pts = [(0.0, 0.0), (10.0, 0.0)];
        assert_eq!(dash_segments(&pts, &[]).len(), 1);
    }

    #[test]
    fn test_dashes_split_line() {
        let pts = [(0.0, 0.0), (10.0, 0.0)];
        let segs = dash_segments(&pts, &[2.0, 2.0]);
        assert_eq!(segs.len(), 3);
        assert!((segs[0][1].0 - 2.0).abs() < 1e-9);
        assert!((segs[1][0].0 - 4.0).abs() < 1e-9);
    }
}
