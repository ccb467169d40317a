//! Rasterization of lines, circles and polygons onto a [`Framebuffer`].
//!
//! All functions blend with the existing pixels and clip at the buffer
//! edges. Coordinates are in pixels, origin at the top left.

use super::framebuffer::Framebuffer;
use crate::color::Rgba;

// ============================================================================
// Line Drawing
// ============================================================================

/// Draw an anti-aliased hairline using Wu's algorithm.
///
/// # References
///
/// Wu, X. (1991). "An Efficient Antialiasing Technique." SIGGRAPH '91.
pub fn draw_line_aa(fb: &mut Framebuffer, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgba) {
    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    let (x0, y0, x1, y1) = if steep { (y0, x0, y1, x1) } else { (x0, y0, x1, y1) };
    let (x0, y0, x1, y1) = if x0 > x1 { (x1, y1, x0, y0) } else { (x0, y0, x1, y1) };

    let dx = x1 - x0;
    let dy = y1 - y0;
    let gradient = if dx.abs() < f64::EPSILON { 1.0 } else { dy / dx };

    let mut put = |x: i64, y: i64, intensity: f64| {
        if steep {
            plot(fb, y, x, color, intensity);
        } else {
            plot(fb, x, y, color, intensity);
        }
    };

    let xend = x0.round();
    let yend = y0 + gradient * (xend - x0);
    let xgap = rfpart(x0 + 0.5);
    let xpxl1 = xend as i64;
    let ypxl1 = yend.floor() as i64;
    put(xpxl1, ypxl1, rfpart(yend) * xgap);
    put(xpxl1, ypxl1 + 1, fpart(yend) * xgap);
    let mut intery = yend + gradient;

    let xend = x1.round();
    let yend = y1 + gradient * (xend - x1);
    let xgap = fpart(x1 + 0.5);
    let xpxl2 = xend as i64;
    let ypxl2 = yend.floor() as i64;
    if xpxl2 != xpxl1 {
        put(xpxl2, ypxl2, rfpart(yend) * xgap);
        put(xpxl2, ypxl2 + 1, fpart(yend) * xgap);
    }

    for x in (xpxl1 + 1)..xpxl2 {
        let ipart = intery.floor() as i64;
        put(x, ipart, rfpart(intery));
        put(x, ipart + 1, fpart(intery));
        intery += gradient;
    }
}

/// Draw a line of any width. Hairlines use [`draw_line_aa`]; wider lines
/// are filled as a quad.
pub fn draw_line(fb: &mut Framebuffer, x0: f64, y0: f64, x1: f64, y1: f64, width: f64, color: Rgba) {
    if width <= 1.5 {
        draw_line_aa(fb, x0, y0, x1, y1, color);
        return;
    }
    let len = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
    if len < f64::EPSILON {
        fill_circle(fb, x0, y0, width / 2.0, color);
        return;
    }
    let (nx, ny) = (-(y1 - y0) / len * width / 2.0, (x1 - x0) / len * width / 2.0);
    let quad = [
        (x0 + nx, y0 + ny),
        (x1 + nx, y1 + ny),
        (x1 - nx, y1 - ny),
        (x0 - nx, y0 - ny),
    ];
    fill_polygon(fb, &quad, color);
}

#[inline]
fn plot(fb: &mut Framebuffer, x: i64, y: i64, color: Rgba, intensity: f64) {
    if x < 0 || y < 0 || x >= i64::from(fb.width()) || y >= i64::from(fb.height()) {
        return;
    }
    let alpha = (f64::from(color.a) * intensity.clamp(0.0, 1.0)).round() as u8;
    fb.blend_pixel(x as u32, y as u32, color.with_alpha(alpha));
}

#[inline]
fn fpart(x: f64) -> f64 {
    x - x.floor()
}

#[inline]
fn rfpart(x: f64) -> f64 {
    1.0 - fpart(x)
}

// ============================================================================
// Rectangles and circles
// ============================================================================

/// Fill an axis-aligned rectangle, snapping edges to whole pixels.
pub fn fill_rect(fb: &mut Framebuffer, x: f64, y: f64, w: f64, h: f64, color: Rgba) {
    let (x0, x1) = (x.min(x + w).round() as i64, x.max(x + w).round() as i64);
    let (y0, y1) = (y.min(y + h).round() as i64, y.max(y + h).round() as i64);
    let x1 = x1.max(x0 + 1);
    for row in y0..y1.max(y0 + 1) {
        fb.blend_span(x0, x1, row, color);
    }
}

/// Half widths of a filled circle per row offset, from the midpoint
/// circle algorithm.
fn circle_spans(radius: i64) -> Vec<i64> {
    let mut half = vec![0_i64; radius as usize + 1];
    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;
    while x >= y {
        half[y as usize] = half[y as usize].max(x);
        half[x as usize] = half[x as usize].max(y);
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
    half
}

/// Fill a circle using the midpoint algorithm, one span per row.
pub fn fill_circle(fb: &mut Framebuffer, cx: f64, cy: f64, radius: f64, color: Rgba) {
    let (cx, cy) = (cx.round() as i64, cy.round() as i64);
    let r = radius.round() as i64;
    if r <= 0 {
        fb.blend_span(cx, cx + 1, cy, color);
        return;
    }
    let half = circle_spans(r);
    for (dy, w) in half.iter().enumerate() {
        let dy = dy as i64;
        fb.blend_span(cx - w, cx + w + 1, cy + dy, color);
        if dy != 0 {
            fb.blend_span(cx - w, cx + w + 1, cy - dy, color);
        }
    }
}

/// Outline a circle with anti-aliased segments.
pub fn stroke_circle(fb: &mut Framebuffer, cx: f64, cy: f64, radius: f64, width: f64, color: Rgba) {
    let steps = ((radius * 2.0 * std::f64::consts::PI) / 3.0).ceil().max(8.0) as usize;
    let pts: Vec<(f64, f64)> = (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64 * std::f64::consts::TAU;
            (cx + radius * t.cos(), cy + radius * t.sin())
        })
        .collect();
    for pair in pts.windows(2) {
        draw_line(fb, pair[0].0, pair[0].1, pair[1].0, pair[1].1, width, color);
    }
}

// ============================================================================
// Polygons
// ============================================================================

/// Fill a polygon with the even-odd rule by scanning pixel rows.
pub fn fill_polygon(fb: &mut Framebuffer, points: &[(f64, f64)], color: Rgba) {
    if points.len() < 3 {
        return;
    }
    let (min_y, max_y) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
    if !min_y.is_finite() || !max_y.is_finite() {
        return;
    }
    let first = (min_y.floor() as i64).max(0);
    let last = (max_y.ceil() as i64).min(i64::from(fb.height()));
    let mut xs: Vec<f64> = Vec::new();
    for row in first..last {
        let sy = row as f64 + 0.5;
        xs.clear();
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            if (a.1 <= sy && b.1 > sy) || (b.1 <= sy && a.1 > sy) {
                xs.push(a.0 + (sy - a.1) / (b.1 - a.1) * (b.0 - a.0));
            }
        }
        xs.sort_by(f64::total_cmp);
        for pair in xs.chunks_exact(2) {
            let x0 = (pair[0] - 0.5).ceil() as i64;
            let x1 = (pair[1] - 0.5).floor() as i64 + 1;
            fb.blend_span(x0, x1, row, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Framebuffer {
        let mut fb = Framebuffer::new(40, 40).unwrap();
        fb.clear(Rgba::WHITE);
        fb
    }

    #[test]
    fn test_hairline_touches_endpoints() {
        let mut fb = canvas();
        draw_line_aa(&mut fb, 2.0, 2.0, 30.0, 2.0, Rgba::BLACK);
        assert_ne!(fb.get_pixel(2, 2), Some(Rgba::WHITE));
        assert_ne!(fb.get_pixel(30, 2), Some(Rgba::WHITE));
        assert_eq!(fb.get_pixel(2, 10), Some(Rgba::WHITE));
    }

    #[test]
    fn test_thick_line() {
        let mut fb = canvas();
        draw_line(&mut fb, 5.0, 20.0, 35.0, 20.0, 4.0, Rgba::BLACK);
        assert_eq!(fb.get_pixel(20, 19), Some(Rgba::BLACK));
        assert_eq!(fb.get_pixel(20, 21), Some(Rgba::BLACK));
        assert_eq!(fb.get_pixel(20, 25), Some(Rgba::WHITE));
    }

    #[test]
    fn test_circle_is_symmetric() {
        let mut fb = canvas();
        fill_circle(&mut fb, 20.0, 20.0, 5.0, Rgba::RED);
        assert_eq!(fb.get_pixel(25, 20), Some(Rgba::RED));
        assert_eq!(fb.get_pixel(15, 20), Some(Rgba::RED));
        assert_eq!(fb.get_pixel(20, 15), Some(Rgba::RED));
        assert_eq!(fb.get_pixel(26, 20), Some(Rgba::WHITE));
    }

    #[test]
    fn test_translucent_circle_blends_once() {
        let mut fb = canvas();
        fill_circle(&mut fb, 20.0, 20.0, 6.0, Rgba::BLACK.with_alpha(128));
        assert_eq!(fb.get_pixel(20, 20), fb.get_pixel(24, 20));
    }

    #[test]
    fn test_polygon_fill() {
        let mut fb = canvas();
        fill_polygon(&mut fb, &[(10.0, 10.0), (30.0, 10.0), (30.0, 30.0), (10.0, 30.0)], Rgba::BLUE);
        assert_eq!(fb.get_pixel(20, 20), Some(Rgba::BLUE));
        assert_eq!(fb.get_pixel(10, 10), Some(Rgba::BLUE));
        assert_eq!(fb.get_pixel(30, 30), Some(Rgba::WHITE));
        assert_eq!(fb.count_unlike(Rgba::WHITE), 400);
    }

    #[test]
    fn test_rect_fill() {
        let mut fb = canvas();
        fill_rect(&mut fb, 0.0, 0.0, 4.0, 2.0, Rgba::RED);
        assert_eq!(fb.count_unlike(Rgba::WHITE), 8);
    }
}
