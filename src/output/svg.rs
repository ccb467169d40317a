//! Vector backend: a [`Canvas`] that records SVG elements.

use crate::color::Rgba;
use crate::error::Result;
use crate::render::{Anchor, Canvas, Stroke, TextStyle};
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A recorded SVG element.
///
/// Field names match the SVG attributes they become.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum SvgElement {
    /// Rectangle
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Rgba>,
        stroke: Option<Stroke>,
    },
    /// Circle
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        fill: Option<Rgba>,
        stroke: Option<Stroke>,
    },
    /// Polyline, or polygon when `closed`
    Poly {
        points: Vec<(f64, f64)>,
        closed: bool,
        fill: Option<Rgba>,
        stroke: Option<Stroke>,
    },
    /// Text
    Text {
        x: f64,
        y: f64,
        text: String,
        style: TextStyle,
    },
}

/// SVG document builder.
#[derive(Debug, Clone)]
pub struct SvgCanvas {
    width: f64,
    height: f64,
    background: Option<Rgba>,
    elements: Vec<SvgElement>,
}

impl SvgCanvas {
    /// Empty document of `width` x `height` pixels.
    #[must_use]
    pub fn new(width: f64, height: f64, background: Option<Rgba>) -> Self {
        Self {
            width,
            height,
            background,
            elements: Vec::new(),
        }
    }

    /// Elements recorded so far.
    #[must_use]
    pub fn elements(&self) -> &[SvgElement] {
        &self.elements
    }

    /// Render the document.
    #[must_use]
    pub fn render(&self) -> String {
        let mut svg = String::with_capacity(256 + self.elements.len() * 96);
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = num(self.width),
            h = num(self.height),
        );
        if let Some(bg) = self.background {
            let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="{}"/>"#, rgba_to_css(bg));
        }
        for element in &self.elements {
            let _ = writeln!(svg, "  {}", element_to_svg(element));
        }
        svg.push_str("</svg>\n");
        svg
    }

    /// Write the document to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if file writing fails.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.render().as_bytes())?;
        Ok(())
    }
}

impl Canvas for SvgCanvas {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn supports_text(&self) -> bool {
        true
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: Rgba) {
        self.elements.push(SvgElement::Rect {
            x: x.min(x + w),
            y: y.min(y + h),
            width: w.abs(),
            height: h.abs(),
            fill: Some(fill),
            stroke: None,
        });
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, stroke: &Stroke) {
        self.elements.push(SvgElement::Rect {
            x: x.min(x + w),
            y: y.min(y + h),
            width: w.abs(),
            height: h.abs(),
            fill: None,
            stroke: Some(stroke.clone()),
        });
    }

    fn polyline(&mut self, points: &[(f64, f64)], stroke: &Stroke) {
        if points.len() < 2 {
            return;
        }
        self.elements.push(SvgElement::Poly {
            points: points.to_vec(),
            closed: false,
            fill: None,
            stroke: Some(stroke.clone()),
        });
    }

    fn polygon(&mut self, points: &[(f64, f64)], fill: Option<Rgba>, stroke: Option<&Stroke>) {
        if points.len() < 3 {
            return;
        }
        self.elements.push(SvgElement::Poly {
            points: points.to_vec(),
            closed: true,
            fill,
            stroke: stroke.cloned(),
        });
    }

    fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: Option<Rgba>, stroke: Option<&Stroke>) {
        self.elements.push(SvgElement::Circle {
            cx,
            cy,
            r,
            fill,
            stroke: stroke.cloned(),
        });
    }

    fn text(&mut self, x: f64, y: f64, text: &str, style: &TextStyle) {
        self.elements.push(SvgElement::Text {
            x,
            y,
            text: text.to_string(),
            style: style.clone(),
        });
    }
}

/// Numbers with at most two decimals and no trailing zeros.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn rgba_to_css(color: Rgba) -> String {
    if color.a == 255 {
        format!("rgb({},{},{})", color.r, color.g, color.b)
    } else {
        format!(
            "rgba({},{},{},{:.3})",
            color.r,
            color.g,
            color.b,
            f64::from(color.a) / 255.0
        )
    }
}

fn fill_attr(fill: Option<Rgba>) -> String {
    format!(r#" fill="{}""#, fill.map_or_else(|| "none".to_string(), rgba_to_css))
}

fn stroke_attr(stroke: Option<&Stroke>) -> String {
    let Some(s) = stroke else {
        return String::new();
    };
    let mut attr = format!(
        r#" stroke="{}" stroke-width="{}""#,
        rgba_to_css(s.color),
        num(s.width)
    );
    if !s.dash.is_empty() {
        let dash: Vec<String> = s.dash.iter().map(|d| num(*d)).collect();
        let _ = write!(attr, r#" stroke-dasharray="{}""#, dash.join(","));
    }
    attr
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn element_to_svg(element: &SvgElement) -> String {
    match element {
        SvgElement::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        } => format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}"{}{}/>"#,
            num(*x),
            num(*y),
            num(*width),
            num(*height),
            fill_attr(*fill),
            stroke_attr(stroke.as_ref())
        ),
        SvgElement::Circle { cx, cy, r, fill, stroke } => format!(
            r#"<circle cx="{}" cy="{}" r="{}"{}{}/>"#,
            num(*cx),
            num(*cy),
            num(*r),
            fill_attr(*fill),
            stroke_attr(stroke.as_ref())
        ),
        SvgElement::Poly {
            points,
            closed,
            fill,
            stroke,
        } => {
            let pts: Vec<String> = points.iter().map(|(x, y)| format!("{},{}", num(*x), num(*y))).collect();
            let tag = if *closed { "polygon" } else { "polyline" };
            format!(
                r#"<{tag} points="{}"{}{}/>"#,
                pts.join(" "),
                fill_attr(*fill),
                stroke_attr(stroke.as_ref())
            )
        }
        SvgElement::Text { x, y, text, style } => {
            let anchor = match style.anchor {
                Anchor::Start => "start",
                Anchor::Middle => "middle",
                Anchor::End => "end",
            };
            let rotate = if style.rotate == 0.0 {
                String::new()
            } else {
                format!(
                    r#" transform="rotate({} {} {})""#,
                    num(-style.rotate),
                    num(*x),
                    num(*y)
                )
            };
            format!(
                r#"<text x="{}" y="{}" font-size="{}" fill="{}" text-anchor="{anchor}" font-family="sans-serif"{rotate}>{}</text>"#,
                num(*x),
                num(*y),
                num(style.size),
                rgba_to_css(style.color),
                escape(text)
            )
        }
    }
}
