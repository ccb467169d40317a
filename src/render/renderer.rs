//! Draws a [`BuiltPlot`] onto a [`Canvas`].
//!
//! The figure is split into a title block, a panel area, axis areas and a
//! legend box. Each panel gets its background, grid, layers, strips and
//! axes. Positions arrive in scale space; the coordinate system rescales
//! them into the unit square of the panel before they are placed.

use super::canvas::{Anchor, Canvas, Stroke, TextStyle};
use crate::color::Rgba;
use crate::data::{DataFrame, DataValue};
use crate::grammar::build::{BuiltLayer, BuiltPlot};
use crate::grammar::coord::{Coord, PanelParams};
use crate::grammar::facet::Facet;
use crate::grammar::geom::GeomKind;
use crate::grammar::guide::{key_value, Guide, GuideBody, LegendKey};
use crate::grammar::theme::{LegendPosition, Theme};
use crate::scale::breaks::rescale;
use crate::scale::LinearScale;

/// Points per millimeter; sizes and line widths are given in millimeters.
const PT: f64 = 72.27 / 25.4;

/// Pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Area {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Area {
    fn right(&self) -> f64 {
        self.x + self.w
    }

    fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

/// Maps unit panel coordinates to pixels.
#[derive(Debug, Clone, Copy)]
struct Painter {
    area: Area,
    horizontal: LinearScale,
    vertical: LinearScale,
    flipped: bool,
}

impl Painter {
    fn new(area: Area, flipped: bool) -> Self {
        Self {
            area,
            horizontal: LinearScale::from_unit((area.x, area.right())),
            vertical: LinearScale::from_unit((area.bottom(), area.y)),
            flipped,
        }
    }

    fn sx(&self, u: f64) -> f64 {
        self.horizontal.map(u)
    }

    fn sy(&self, v: f64) -> f64 {
        self.vertical.map(v)
    }

    /// Pixel position of a point given in data-x and data-y units.
    fn pt(&self, x: f64, y: f64) -> (f64, f64) {
        if self.flipped {
            (self.sx(y), self.sy(x))
        } else {
            (self.sx(x), self.sy(y))
        }
    }
}

/// Size conversions for one render.
#[derive(Debug, Clone, Copy)]
struct Units {
    /// Pixels per point.
    px_per_pt: f64,
}

impl Units {
    fn new(dpi: f64) -> Self {
        Self { px_per_pt: dpi / 72.0 }
    }

    fn pt(&self, points: f64) -> f64 {
        points * self.px_per_pt
    }

    fn mm(&self, mm: f64) -> f64 {
        mm * PT * self.px_per_pt
    }
}

/// Render `plot` onto `canvas` at `dpi`.
#[tracing::instrument(level = "debug", skip_all, fields(dpi = dpi))]
pub fn draw_plot(plot: &BuiltPlot, canvas: &mut dyn Canvas, dpi: f64) {
    let theme = plot.theme();
    let units = Units::new(dpi);
    let (width, height) = canvas.size();
    canvas.fill_rect(0.0, 0.0, width, height, theme.background);

    let text_px = units.pt(theme.base_size);
    let tick_px = units.pt(theme.tick_size());
    let margin = f64::from(theme.margin) * dpi / 100.0;
    let labels = plot.labels();

    let mut top = margin;
    let text_style = |size: f64, anchor: Anchor| TextStyle::new(size, theme.text_color, anchor);
    if let Some(title) = labels.get_title() {
        let size = units.pt(theme.title_size());
        top += size;
        if canvas.supports_text() {
            canvas.text(margin, top, title, &text_style(size, Anchor::Start));
        }
        top += size * 0.5;
    }
    if let Some(subtitle) = labels.get_subtitle() {
        top += text_px;
        if canvas.supports_text() {
            canvas.text(margin, top, subtitle, &text_style(text_px, Anchor::Start));
        }
        top += text_px * 0.5;
    }
    let mut bottom = height - margin;
    if let Some(caption) = labels.get_caption() {
        if canvas.supports_text() {
            canvas.text(width - margin, bottom, caption, &text_style(tick_px, Anchor::End));
        }
        bottom -= tick_px * 1.5;
    }

    let guides: &[Guide] = if theme.legend_position == LegendPosition::None {
        &[]
    } else {
        plot.guides()
    };
    let mut right = width - margin;
    if !guides.is_empty() {
        match theme.legend_position {
            LegendPosition::Right => {
                let w = legend_width(guides, text_px, tick_px);
                let legend = Area {
                    x: right - w,
                    y: top,
                    w,
                    h: bottom - top,
                };
                draw_legends_vertical(canvas, guides, legend, theme, units);
                right -= w + text_px;
            }
            LegendPosition::Bottom => {
                let h = legend_height(guides, text_px);
                let legend = Area {
                    x: margin,
                    y: bottom - h,
                    w: right - margin,
                    h,
                };
                draw_legends_horizontal(canvas, guides, legend, theme, units);
                bottom -= h + text_px * 0.5;
            }
            LegendPosition::None => {}
        }
    }

    let flipped = plot.coord().is_flipped();
    let (h_label, v_label) = if flipped { ("y", "x") } else { ("x", "y") };
    if let Some(label) = labels.get(h_label) {
        if canvas.supports_text() {
            canvas.text((margin + right) / 2.0, bottom, label, &text_style(text_px, Anchor::Middle));
        }
    }
    bottom -= text_px * 1.5;
    let mut left = margin;
    if let Some(label) = labels.get(v_label) {
        left += text_px;
        if canvas.supports_text() {
            let style = text_style(text_px, Anchor::Middle).rotated(90.0);
            canvas.text(left, (top + bottom) / 2.0, label, &style);
        }
        left += text_px * 0.5;
    }
    let tick_len = units.pt(2.75);
    left += y_label_width(plot, tick_px) + tick_len + tick_px * 0.3;
    bottom -= tick_px * 1.2 + tick_len;

    let area = Area {
        x: left,
        y: top,
        w: (right - left).max(1.0),
        h: (bottom - top).max(1.0),
    };
    draw_panels(canvas, plot, area, units, tick_len);
}

/// Widest y tick label, estimated from its length.
fn y_label_width(plot: &BuiltPlot, tick_px: f64) -> f64 {
    let layout = plot.layout();
    layout
        .panels()
        .iter()
        .filter_map(|p| layout.panel_params(p.panel))
        .flat_map(|pp| pp.y.labels.iter())
        .map(|l| text_width(l, tick_px))
        .fold(0.0, f64::max)
}

fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * 0.6
}

fn draw_panels(canvas: &mut dyn Canvas, plot: &BuiltPlot, area: Area, units: Units, tick_len: f64) {
    let theme = plot.theme();
    let facet = plot.facet();
    let layout = plot.layout();
    let (nrow, ncol) = layout.dims();
    let (nrow, ncol) = (nrow.max(1), ncol.max(1));
    let text_px = units.pt(theme.base_size);
    let tick_px = units.pt(theme.tick_size());
    let gap = text_px * 0.5;
    let strip_h = text_px * 1.6;
    let wrap = matches!(facet, Facet::Wrap { .. });
    let any_top = layout.panels().iter().any(|p| facet.strip_labels(p).0.is_some());
    let any_right = layout.panels().iter().any(|p| facet.strip_labels(p).1.is_some());
    let top_strip = if any_top { strip_h } else { 0.0 };
    let right_strip = if any_right { strip_h } else { 0.0 };
    let top_strips = if wrap { nrow as f64 } else { 1.0 } * top_strip;
    let cell_w = ((area.w - gap * (ncol - 1) as f64 - right_strip) / ncol as f64).max(1.0);
    let cell_h = ((area.h - gap * (nrow - 1) as f64 - top_strips) / nrow as f64).max(1.0);
    let scales = facet.facet_scales();

    for info in layout.panels() {
        let Some(params) = layout.panel_params(info.panel) else {
            continue;
        };
        let strips_above = if wrap { info.row as f64 } else { 1.0 } * top_strip;
        let mut cell = Area {
            x: area.x + (info.col - 1) as f64 * (cell_w + gap),
            y: area.y + strips_above + (info.row - 1) as f64 * (cell_h + gap),
            w: cell_w,
            h: cell_h,
        };
        if let Some(ratio) = plot.coord().aspect_ratio(params) {
            if cell.h / cell.w > ratio {
                let h = cell.w * ratio;
                cell.y += (cell.h - h) / 2.0;
                cell.h = h;
            } else {
                let w = cell.h / ratio;
                cell.x += (cell.w - w) / 2.0;
                cell.w = w;
            }
        }
        let painter = Painter::new(cell, plot.coord().is_flipped());

        canvas.fill_rect(cell.x, cell.y, cell.w, cell.h, theme.panel_background);
        draw_grid(canvas, &painter, params, theme, units);
        for layer in plot.layers() {
            let data = panel_rows(&layer.data, info.panel);
            if data.is_empty() {
                continue;
            }
            let data = if layer.geom.is_connected() {
                plot.coord().munch(&data, params).unwrap_or_else(|err| {
                    tracing::warn!(%err, geom = layer.geom.name(), "drawing without interpolation");
                    data
                })
            } else {
                data
            };
            let data = plot.coord().transform(&data, params);
            draw_layer(canvas, &painter, plot.coord(), layer, &data, params, units);
        }
        if let Some(border) = theme.panel_border {
            canvas.stroke_rect(cell.x, cell.y, cell.w, cell.h, &Stroke::solid(border, units.pt(1.0)));
        }

        let (top_text, right_text) = facet.strip_labels(info);
        if let Some(text) = top_text.filter(|_| wrap || info.row == 1) {
            let strip = Area {
                x: cell.x,
                y: cell.y - top_strip,
                w: cell.w,
                h: top_strip,
            };
            draw_strip(canvas, strip, &text, theme, tick_px, false);
        }
        if let Some(text) = right_text.filter(|_| info.col == ncol) {
            let strip = Area {
                x: cell.right(),
                y: cell.y,
                w: right_strip,
                h: cell.h,
            };
            draw_strip(canvas, strip, &text, theme, tick_px, true);
        }

        let lowest = !layout
            .panels()
            .iter()
            .any(|p| p.col == info.col && p.row > info.row);
        let h_free = if painter.flipped { scales.free_y() } else { scales.free_x() };
        let v_free = if painter.flipped { scales.free_x() } else { scales.free_y() };
        if lowest || h_free {
            draw_x_axis(canvas, &painter, params, theme, tick_px, tick_len, units);
        }
        if info.col == 1 || v_free {
            draw_y_axis(canvas, &painter, params, theme, tick_px, tick_len, units);
        }
    }
}

/// Rows of `data` that belong to panel `id`.
fn panel_rows(data: &DataFrame, id: usize) -> DataFrame {
    match data.numbers("PANEL") {
        Some(panel) => {
            let mask: Vec<bool> = panel.iter().map(|p| (*p - id as f64).abs() < 0.5).collect();
            data.filter(&mask)
        }
        None => data.clone(),
    }
}

fn draw_grid(canvas: &mut dyn Canvas, painter: &Painter, params: &PanelParams, theme: &Theme, units: Units) {
    let Some(color) = theme.grid_color else {
        return;
    };
    let stroke = Stroke::solid(color, units.pt(theme.grid_width));
    let a = painter.area;
    for b in &params.x.breaks {
        let x = painter.sx(Coord::rescale_x(params, *b));
        canvas.polyline(&[(x, a.y), (x, a.bottom())], &stroke);
    }
    for b in &params.y.breaks {
        let y = painter.sy(Coord::rescale_y(params, *b));
        canvas.polyline(&[(a.x, y), (a.right(), y)], &stroke);
    }
}

fn draw_strip(canvas: &mut dyn Canvas, strip: Area, text: &str, theme: &Theme, size: f64, vertical: bool) {
    canvas.fill_rect(strip.x, strip.y, strip.w, strip.h, theme.strip_background);
    if !canvas.supports_text() {
        return;
    }
    let cx = strip.x + strip.w / 2.0;
    let cy = strip.y + strip.h / 2.0;
    let style = TextStyle::new(size, theme.text_color, Anchor::Middle);
    if vertical {
        canvas.text(cx + size / 3.0, cy, text, &style.rotated(-90.0));
    } else {
        canvas.text(cx, cy + size / 3.0, text, &style);
    }
}

fn draw_x_axis(
    canvas: &mut dyn Canvas,
    painter: &Painter,
    params: &PanelParams,
    theme: &Theme,
    tick_px: f64,
    tick_len: f64,
    units: Units,
) {
    let y0 = painter.area.bottom();
    if let Some(color) = theme.axis_color {
        let stroke = Stroke::solid(color, units.pt(0.5));
        for b in &params.x.breaks {
            let x = painter.sx(Coord::rescale_x(params, *b));
            canvas.polyline(&[(x, y0), (x, y0 + tick_len)], &stroke);
        }
    }
    if !canvas.supports_text() || theme.axis_color.is_none() && theme.grid_color.is_none() {
        return;
    }
    let style = TextStyle::new(tick_px, theme.text_color, Anchor::Middle);
    for (b, label) in params.x.breaks.iter().zip(&params.x.labels) {
        let x = painter.sx(Coord::rescale_x(params, *b));
        canvas.text(x, y0 + tick_len + tick_px, label, &style);
    }
}

fn draw_y_axis(
    canvas: &mut dyn Canvas,
    painter: &Painter,
    params: &PanelParams,
    theme: &Theme,
    tick_px: f64,
    tick_len: f64,
    units: Units,
) {
    let x0 = painter.area.x;
    if let Some(color) = theme.axis_color {
        let stroke = Stroke::solid(color, units.pt(0.5));
        for b in &params.y.breaks {
            let y = painter.sy(Coord::rescale_y(params, *b));
            canvas.polyline(&[(x0 - tick_len, y), (x0, y)], &stroke);
        }
    }
    if !canvas.supports_text() || theme.axis_color.is_none() && theme.grid_color.is_none() {
        return;
    }
    let style = TextStyle::new(tick_px, theme.text_color, Anchor::End);
    for (b, label) in params.y.breaks.iter().zip(&params.y.labels) {
        let y = painter.sy(Coord::rescale_y(params, *b));
        canvas.text(x0 - tick_len - tick_px * 0.3, y + tick_px / 3.0, label, &style);
    }
}

// ============================================================================
// Layer drawing
// ============================================================================

/// Row accessors over a layer's drawable data.
struct Rows<'a> {
    df: &'a DataFrame,
}

impl Rows<'_> {
    fn num(&self, name: &str, i: usize) -> Option<f64> {
        self.df
            .get(name)
            .and_then(|c| c.get(i).as_f64())
            .filter(|v| v.is_finite())
    }

    fn value(&self, name: &str, i: usize) -> DataValue {
        self.df.get(name).map_or(DataValue::Null, |c| c.get(i))
    }

    fn color(&self, name: &str, i: usize) -> Option<Rgba> {
        self.value(name, i).as_color()
    }

    fn alpha(&self, i: usize) -> Option<f64> {
        self.num("alpha", i)
    }

    /// Line color with alpha applied.
    fn stroke(&self, i: usize, units: Units) -> Option<Stroke> {
        let color = self.color("color", i)?;
        let color = match self.alpha(i) {
            Some(a) if a < 1.0 => color.with_alpha_f(color.alpha_f() * a),
            _ => color,
        };
        let width = units.mm(self.num("size", i).unwrap_or(0.5)).max(0.5);
        Some(Stroke::solid(color, width).dashed(dash_pattern(&self.value("linetype", i), width)))
    }

    /// Fill color with alpha applied.
    fn fill(&self, i: usize) -> Option<Rgba> {
        let fill = self.color("fill", i)?;
        Some(match self.alpha(i) {
            Some(a) => fill.with_alpha_f(fill.alpha_f() * a),
            None => fill,
        })
    }

    /// Outline of a filled shape; no outline when no color was mapped or
    /// set.
    fn outline(&self, i: usize, units: Units) -> Option<Stroke> {
        let color = self.color("color", i)?;
        let width = units.mm(self.num("size", i).unwrap_or(0.5)).max(0.5);
        Some(Stroke::solid(color, width).dashed(dash_pattern(&self.value("linetype", i), width)))
    }

    fn nrow(&self) -> usize {
        self.df.nrow()
    }
}

fn dash_pattern(linetype: &DataValue, width: f64) -> Vec<f64> {
    let unit = width.max(1.0);
    let name = match linetype {
        DataValue::Number(n) => match *n as i64 {
            2 => "dashed",
            3 => "dotted",
            4 => "dotdash",
            5 => "longdash",
            6 => "twodash",
            _ => "solid",
        },
        DataValue::Text(s) => s.as_str(),
        _ => "solid",
    };
    let pattern: &[f64] = match name {
        "dashed" => &[4.0, 4.0],
        "dotted" => &[1.0, 3.0],
        "dotdash" => &[1.0, 3.0, 4.0, 3.0],
        "longdash" => &[8.0, 4.0],
        "twodash" => &[2.0, 2.0, 6.0, 2.0],
        _ => &[],
    };
    pattern.iter().map(|p| p * unit).collect()
}

fn draw_layer(
    canvas: &mut dyn Canvas,
    painter: &Painter,
    coord: &Coord,
    layer: &BuiltLayer,
    data: &DataFrame,
    params: &PanelParams,
    units: Units,
) {
    let rows = Rows { df: data };
    match layer.geom {
        GeomKind::Blank => {}
        GeomKind::Point | GeomKind::Jitter => draw_points(canvas, painter, &rows, units),
        GeomKind::Line | GeomKind::Path => draw_paths(canvas, painter, data, units, false),
        GeomKind::Step => draw_paths(canvas, painter, data, units, true),
        GeomKind::Area | GeomKind::Ribbon | GeomKind::Density => draw_areas(canvas, painter, data, units),
        GeomKind::Smooth => {
            if data.has_column("ymin") && data.has_column("ymax") {
                draw_areas(canvas, painter, data, units);
            }
            draw_paths(canvas, painter, data, units, false);
        }
        GeomKind::Bar | GeomKind::Col | GeomKind::Histogram | GeomKind::Rect | GeomKind::Tile => {
            draw_rects(canvas, painter, &rows, units);
        }
        GeomKind::Text => draw_text(canvas, painter, &rows, units),
        GeomKind::Hline | GeomKind::Vline => {
            draw_reference_lines(canvas, painter, layer.geom, &rows, params, units);
        }
        GeomKind::Abline if coord.is_linear() => {
            draw_reference_lines(canvas, painter, layer.geom, &rows, params, units);
        }
        GeomKind::Abline => draw_curved_ablines(canvas, painter, coord, &rows, params, units),
        GeomKind::Segment => {
            for i in 0..rows.nrow() {
                let (Some(x), Some(y), Some(xe), Some(ye), Some(stroke)) = (
                    rows.num("x", i),
                    rows.num("y", i),
                    rows.num("xend", i),
                    rows.num("yend", i),
                    rows.stroke(i, units),
                ) else {
                    continue;
                };
                canvas.polyline(&[painter.pt(x, y), painter.pt(xe, ye)], &stroke);
            }
        }
        GeomKind::Errorbar => {
            for i in 0..rows.nrow() {
                let (Some(x0), Some(x1), Some(lo), Some(hi), Some(stroke)) = (
                    rows.num("xmin", i),
                    rows.num("xmax", i),
                    rows.num("ymin", i),
                    rows.num("ymax", i),
                    rows.stroke(i, units),
                ) else {
                    continue;
                };
                let xc = (x0 + x1) / 2.0;
                canvas.polyline(&[painter.pt(x0, hi), painter.pt(x1, hi)], &stroke);
                canvas.polyline(&[painter.pt(xc, hi), painter.pt(xc, lo)], &stroke);
                canvas.polyline(&[painter.pt(x0, lo), painter.pt(x1, lo)], &stroke);
            }
        }
        GeomKind::Boxplot => draw_boxplots(canvas, painter, &rows, units),
        GeomKind::Linerange | GeomKind::Pointrange => {
            for i in 0..rows.nrow() {
                let (Some(x), Some(lo), Some(hi), Some(stroke)) = (
                    rows.num("x", i),
                    rows.num("ymin", i),
                    rows.num("ymax", i),
                    rows.stroke(i, units),
                ) else {
                    continue;
                };
                canvas.polyline(&[painter.pt(x, lo), painter.pt(x, hi)], &stroke);
            }
            if layer.geom == GeomKind::Pointrange {
                let fatten = layer.params.f64("fatten").unwrap_or(4.0);
                draw_points_scaled(canvas, painter, &rows, units, fatten);
            }
        }
        GeomKind::Crossbar => {
            let fatten = layer.params.f64("fatten").unwrap_or(2.0);
            for i in 0..rows.nrow() {
                let (Some(x0), Some(x1), Some(lo), Some(mid), Some(hi)) = (
                    rows.num("xmin", i),
                    rows.num("xmax", i),
                    rows.num("ymin", i),
                    rows.num("y", i),
                    rows.num("ymax", i),
                ) else {
                    continue;
                };
                let outline = rows.stroke(i, units);
                let body = [
                    painter.pt(x0, lo),
                    painter.pt(x1, lo),
                    painter.pt(x1, hi),
                    painter.pt(x0, hi),
                ];
                canvas.polygon(&body, rows.fill(i), outline.as_ref());
                if let Some(stroke) = outline {
                    let middle = Stroke {
                        width: stroke.width * fatten,
                        ..stroke
                    };
                    canvas.polyline(&[painter.pt(x0, mid), painter.pt(x1, mid)], &middle);
                }
            }
        }
        GeomKind::Violin => draw_violins(canvas, painter, data, units),
        GeomKind::Polygon => {
            for part in data.split_by(&["group"]) {
                let rows = Rows { df: &part };
                let points: Vec<(f64, f64)> = (0..rows.nrow())
                    .filter_map(|i| Some(painter.pt(rows.num("x", i)?, rows.num("y", i)?)))
                    .collect();
                if points.len() > 2 {
                    canvas.polygon(&points, rows.fill(0), rows.outline(0, units).as_ref());
                }
            }
        }
    }
}

/// Mirrored density outlines: `violinwidth` scales the distance from `x`
/// to the edges of the slot.
fn draw_violins(canvas: &mut dyn Canvas, painter: &Painter, data: &DataFrame, units: Units) {
    for part in data.split_by(&["group"]) {
        let rows = Rows { df: &part };
        let mut left = Vec::new();
        let mut right = Vec::new();
        for i in 0..rows.nrow() {
            let (Some(x), Some(x0), Some(x1), Some(y), Some(w)) = (
                rows.num("x", i),
                rows.num("xmin", i),
                rows.num("xmax", i),
                rows.num("y", i),
                rows.num("violinwidth", i),
            ) else {
                continue;
            };
            left.push(painter.pt(x - w * (x - x0), y));
            right.push(painter.pt(x + w * (x1 - x), y));
        }
        if left.len() < 2 {
            continue;
        }
        left.extend(right.into_iter().rev());
        canvas.polygon(&left, rows.fill(0), rows.outline(0, units).as_ref());
    }
}

fn draw_points(canvas: &mut dyn Canvas, painter: &Painter, rows: &Rows<'_>, units: Units) {
    draw_points_scaled(canvas, painter, rows, units, 1.0);
}

/// Points with their size multiplied by `fatten`.
fn draw_points_scaled(canvas: &mut dyn Canvas, painter: &Painter, rows: &Rows<'_>, units: Units, fatten: f64) {
    for i in 0..rows.nrow() {
        let (Some(x), Some(y)) = (rows.num("x", i), rows.num("y", i)) else {
            continue;
        };
        let Some(color) = rows.color("color", i) else {
            continue;
        };
        let color = match rows.alpha(i) {
            Some(a) => color.with_alpha_f(color.alpha_f() * a),
            None => color,
        };
        let size = rows.num("size", i).unwrap_or(1.5) * fatten;
        let stroke = rows.num("stroke", i).unwrap_or(0.5);
        let r = units.pt(size * PT + stroke * 96.0 / 25.4 / 2.0) / 2.0;
        let (px, py) = painter.pt(x, y);
        let shape = rows.value("shape", i).to_label();
        draw_marker(canvas, px, py, r.max(0.5), &shape, color);
    }
}

/// One point marker.
fn draw_marker(canvas: &mut dyn Canvas, x: f64, y: f64, r: f64, shape: &str, color: Rgba) {
    let regular = |n: usize, start: f64| -> Vec<(f64, f64)> {
        (0..n)
            .map(|k| {
                let t = start + k as f64 * std::f64::consts::TAU / n as f64;
                (x + r * t.cos(), y - r * t.sin())
            })
            .collect()
    };
    use std::f64::consts::FRAC_PI_2;
    match shape {
        "s" => canvas.fill_rect(x - r * 0.9, y - r * 0.9, r * 1.8, r * 1.8, color),
        "^" => canvas.polygon(&regular(3, FRAC_PI_2), Some(color), None),
        "v" => canvas.polygon(&regular(3, -FRAC_PI_2), Some(color), None),
        "<" => canvas.polygon(&regular(3, std::f64::consts::PI), Some(color), None),
        ">" => canvas.polygon(&regular(3, 0.0), Some(color), None),
        "D" | "d" => canvas.polygon(&regular(4, 0.0), Some(color), None),
        "p" => canvas.polygon(&regular(5, FRAC_PI_2), Some(color), None),
        "h" | "H" => canvas.polygon(&regular(6, 0.0), Some(color), None),
        "8" => canvas.polygon(&regular(8, 0.0), Some(color), None),
        "*" => {
            let stroke = Stroke::solid(color, (r / 3.0).max(1.0));
            for k in 0..3 {
                let t = k as f64 * std::f64::consts::PI / 3.0;
                let (dx, dy) = (r * t.cos(), r * t.sin());
                canvas.polyline(&[(x - dx, y - dy), (x + dx, y + dy)], &stroke);
            }
        }
        _ => canvas.circle(x, y, r, Some(color), None),
    }
}

/// Connected lines per group; rows with missing positions break the line.
fn draw_paths(canvas: &mut dyn Canvas, painter: &Painter, data: &DataFrame, units: Units, step: bool) {
    for part in data.split_by(&["group"]) {
        let rows = Rows { df: &part };
        let Some(stroke) = (0..rows.nrow()).find_map(|i| rows.stroke(i, units)) else {
            continue;
        };
        let mut run: Vec<(f64, f64)> = Vec::new();
        let mut last: Option<(f64, f64)> = None;
        for i in 0..rows.nrow() {
            match (rows.num("x", i), rows.num("y", i)) {
                (Some(x), Some(y)) => {
                    if step {
                        if let Some((_, py)) = last {
                            run.push(painter.pt(x, py));
                        }
                    }
                    run.push(painter.pt(x, y));
                    last = Some((x, y));
                }
                _ => {
                    if run.len() > 1 {
                        canvas.polyline(&run, &stroke);
                    }
                    run.clear();
                    last = None;
                }
            }
        }
        if run.len() > 1 {
            canvas.polyline(&run, &stroke);
        }
    }
}

/// Filled band between `ymin` and `ymax` per group, with its outline.
fn draw_areas(canvas: &mut dyn Canvas, painter: &Painter, data: &DataFrame, units: Units) {
    for part in data.split_by(&["group"]) {
        let rows = Rows { df: &part };
        let mut upper = Vec::new();
        let mut lower = Vec::new();
        for i in 0..rows.nrow() {
            if let (Some(x), Some(lo), Some(hi)) = (rows.num("x", i), rows.num("ymin", i), rows.num("ymax", i)) {
                upper.push(painter.pt(x, hi));
                lower.push(painter.pt(x, lo));
            }
        }
        if upper.len() < 2 {
            continue;
        }
        let fill = rows.fill(0);
        let outline = rows.outline(0, units);
        let mut polygon = upper.clone();
        polygon.extend(lower.iter().rev());
        canvas.polygon(&polygon, fill, None);
        if let Some(stroke) = outline {
            canvas.polyline(&upper, &stroke);
        }
    }
}

fn draw_rects(canvas: &mut dyn Canvas, painter: &Painter, rows: &Rows<'_>, units: Units) {
    for i in 0..rows.nrow() {
        let (Some(x0), Some(x1), Some(y0), Some(y1)) = (
            rows.num("xmin", i),
            rows.num("xmax", i),
            rows.num("ymin", i),
            rows.num("ymax", i),
        ) else {
            continue;
        };
        let corners = [
            painter.pt(x0, y0),
            painter.pt(x1, y0),
            painter.pt(x1, y1),
            painter.pt(x0, y1),
        ];
        let fill = rows.fill(i);
        let outline = rows.outline(i, units);
        canvas.polygon(&corners, fill, outline.as_ref());
    }
}

fn draw_text(canvas: &mut dyn Canvas, painter: &Painter, rows: &Rows<'_>, units: Units) {
    for i in 0..rows.nrow() {
        let (Some(x), Some(y)) = (rows.num("x", i), rows.num("y", i)) else {
            continue;
        };
        let label = rows.value("label", i);
        if label.is_missing() {
            continue;
        }
        let color = rows.color("color", i).unwrap_or(Rgba::BLACK);
        let color = match rows.alpha(i) {
            Some(a) => color.with_alpha_f(color.alpha_f() * a),
            None => color,
        };
        let size = units.pt(rows.num("size", i).unwrap_or(11.0));
        let anchor = match rows.num("hjust", i) {
            Some(h) if h < 0.25 => Anchor::Start,
            Some(h) if h > 0.75 => Anchor::End,
            _ => Anchor::Middle,
        };
        let vjust = rows.num("vjust", i).unwrap_or(0.5);
        let style = TextStyle::new(size, color, anchor).rotated(rows.num("angle", i).unwrap_or(0.0));
        let (px, py) = painter.pt(x, y);
        canvas.text(px, py + size * (0.7 - vjust), &label.to_label(), &style);
    }
}

fn draw_reference_lines(
    canvas: &mut dyn Canvas,
    painter: &Painter,
    geom: GeomKind,
    rows: &Rows<'_>,
    params: &PanelParams,
    units: Units,
) {
    let (x_range, y_range) = if painter.flipped {
        (params.y.range, params.x.range)
    } else {
        (params.x.range, params.y.range)
    };
    for i in 0..rows.nrow() {
        let Some(stroke) = rows.stroke(i, units) else {
            continue;
        };
        let segment = match geom {
            GeomKind::Hline => rows.num("yintercept", i).map(|v| ((0.0, v), (1.0, v))),
            GeomKind::Vline => rows.num("xintercept", i).map(|v| ((v, 0.0), (v, 1.0))),
            _ => match (rows.num("intercept", i), rows.num("slope", i)) {
                (Some(a), Some(b)) => {
                    let y_at = |x: f64| rescale(a + b * x, y_range);
                    clip_unit((0.0, y_at(x_range.0)), (1.0, y_at(x_range.1)))
                }
                _ => None,
            },
        };
        if let Some((p, q)) = segment {
            canvas.polyline(&[painter.pt(p.0, p.1), painter.pt(q.0, q.1)], &stroke);
        }
    }
}

/// Sloped lines through a non-linear coordinate system, sampled across
/// the panel and broken where they leave it.
fn draw_curved_ablines(
    canvas: &mut dyn Canvas,
    painter: &Painter,
    coord: &Coord,
    rows: &Rows<'_>,
    params: &PanelParams,
    units: Units,
) {
    const SAMPLES: usize = 200;
    let (tx, ty) = coord.transforms();
    let (x0, x1) = params.x.range;
    for i in 0..rows.nrow() {
        let (Some(a), Some(b), Some(stroke)) = (rows.num("intercept", i), rows.num("slope", i), rows.stroke(i, units))
        else {
            continue;
        };
        let mut run: Vec<(f64, f64)> = Vec::new();
        for k in 0..=SAMPLES {
            let u = k as f64 / SAMPLES as f64;
            let x = tx.inverse(x0 + u * (x1 - x0));
            let v = rescale(ty.transform(a + b * x), params.y.range);
            if v.is_finite() && (0.0..=1.0).contains(&v) {
                run.push(painter.pt(u, v));
            } else {
                if run.len() > 1 {
                    canvas.polyline(&run, &stroke);
                }
                run.clear();
            }
        }
        if run.len() > 1 {
            canvas.polyline(&run, &stroke);
        }
    }
}

/// Clip a segment to the unit square (Liang-Barsky).
fn clip_unit(p: (f64, f64), q: (f64, f64)) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (q.0 - p.0, q.1 - p.1);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for (pk, qk) in [(-dx, p.0), (dx, 1.0 - p.0), (-dy, p.1), (dy, 1.0 - p.1)] {
        if pk.abs() < f64::EPSILON {
            if qk < 0.0 {
                return None;
            }
            continue;
        }
        let r = qk / pk;
        if pk < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
    }
    (t0 <= t1).then(|| ((p.0 + t0 * dx, p.1 + t0 * dy), (p.0 + t1 * dx, p.1 + t1 * dy)))
}

fn draw_boxplots(canvas: &mut dyn Canvas, painter: &Painter, rows: &Rows<'_>, units: Units) {
    for i in 0..rows.nrow() {
        let (Some(x0), Some(x1), Some(lo), Some(q1), Some(mid), Some(q3), Some(hi)) = (
            rows.num("xmin", i),
            rows.num("xmax", i),
            rows.num("ymin", i),
            rows.num("lower", i),
            rows.num("middle", i),
            rows.num("upper", i),
            rows.num("ymax", i),
        ) else {
            continue;
        };
        let xc = (x0 + x1) / 2.0;
        let stroke = rows
            .outline(i, units)
            .unwrap_or_else(|| Stroke::solid(Rgba::rgb(51, 51, 51), units.mm(0.5)));
        canvas.polyline(&[painter.pt(xc, lo), painter.pt(xc, q1)], &stroke);
        canvas.polyline(&[painter.pt(xc, q3), painter.pt(xc, hi)], &stroke);
        let body = [
            painter.pt(x0, q1),
            painter.pt(x1, q1),
            painter.pt(x1, q3),
            painter.pt(x0, q3),
        ];
        canvas.polygon(&body, rows.fill(i), Some(&stroke));
        let median = Stroke {
            width: stroke.width * 2.0,
            ..stroke.clone()
        };
        canvas.polyline(&[painter.pt(x0, mid), painter.pt(x1, mid)], &median);
    }
}

// ============================================================================
// Legends
// ============================================================================

fn key_size(text_px: f64) -> f64 {
    text_px * 1.5
}

fn legend_width(guides: &[Guide], text_px: f64, tick_px: f64) -> f64 {
    let key = key_size(text_px);
    guides
        .iter()
        .map(|g| {
            let labels = match &g.body {
                GuideBody::Legend(keys) => keys.iter().map(|k| text_width(&k.label, tick_px)).fold(0.0, f64::max),
                GuideBody::Colorbar { ticks, .. } => ticks.iter().map(|(_, l)| text_width(l, tick_px)).fold(0.0, f64::max),
            };
            text_width(&g.title, text_px).max(key + tick_px * 0.5 + labels)
        })
        .fold(0.0, f64::max)
        + text_px
}

fn legend_height(guides: &[Guide], text_px: f64) -> f64 {
    if guides.is_empty() {
        0.0
    } else {
        text_px * 1.5 + key_size(text_px)
    }
}

fn draw_legends_vertical(canvas: &mut dyn Canvas, guides: &[Guide], area: Area, theme: &Theme, units: Units) {
    let text_px = units.pt(theme.base_size);
    let tick_px = units.pt(theme.tick_size());
    let key = key_size(text_px);
    let mut y = area.y;
    for guide in guides {
        y += text_px;
        if canvas.supports_text() {
            canvas.text(area.x, y, &guide.title, &TextStyle::new(text_px, theme.text_color, Anchor::Start));
        }
        y += text_px * 0.5;
        match &guide.body {
            GuideBody::Legend(keys) => {
                for k in keys {
                    let cell = Area {
                        x: area.x,
                        y,
                        w: key,
                        h: key,
                    };
                    draw_key(canvas, guide, k, cell, theme, units);
                    if canvas.supports_text() {
                        let style = TextStyle::new(tick_px, theme.text_color, Anchor::Start);
                        canvas.text(cell.right() + tick_px * 0.5, y + key / 2.0 + tick_px / 3.0, &k.label, &style);
                    }
                    y += key;
                }
            }
            GuideBody::Colorbar { colors, ticks } => {
                let bar = Area {
                    x: area.x,
                    y,
                    w: key,
                    h: key * 5.0,
                };
                draw_colorbar(canvas, colors, ticks, bar, theme, tick_px, true);
                y += bar.h;
            }
        }
        y += text_px;
    }
}

fn draw_legends_horizontal(canvas: &mut dyn Canvas, guides: &[Guide], area: Area, theme: &Theme, units: Units) {
    let text_px = units.pt(theme.base_size);
    let tick_px = units.pt(theme.tick_size());
    let key = key_size(text_px);
    let mut x = area.x;
    let y = area.y + text_px;
    for guide in guides {
        if canvas.supports_text() {
            canvas.text(x, y, &guide.title, &TextStyle::new(text_px, theme.text_color, Anchor::Start));
        }
        let row = y + text_px * 0.5;
        match &guide.body {
            GuideBody::Legend(keys) => {
                for k in keys {
                    let cell = Area { x, y: row, w: key, h: key };
                    draw_key(canvas, guide, k, cell, theme, units);
                    if canvas.supports_text() {
                        let style = TextStyle::new(tick_px, theme.text_color, Anchor::Start);
                        canvas.text(cell.right() + tick_px * 0.3, row + key / 2.0 + tick_px / 3.0, &k.label, &style);
                    }
                    x += key + tick_px * 0.6 + text_width(&k.label, tick_px);
                }
            }
            GuideBody::Colorbar { colors, ticks } => {
                let bar = Area {
                    x,
                    y: row,
                    w: key * 5.0,
                    h: key * 0.6,
                };
                draw_colorbar(canvas, colors, ticks, bar, theme, tick_px, false);
                x += bar.w;
            }
        }
        x += text_px * 2.0 + text_width(&guide.title, text_px);
    }
}

/// One legend key: the glyph of every geometry of the guide, drawn with the
/// key's mapped values.
fn draw_key(canvas: &mut dyn Canvas, guide: &Guide, key: &LegendKey, cell: Area, theme: &Theme, units: Units) {
    canvas.fill_rect(cell.x, cell.y, cell.w, cell.h, theme.panel_background);
    let color = key_value(key, "color").and_then(DataValue::as_color);
    let fill = key_value(key, "fill").and_then(DataValue::as_color);
    let alpha = key_value(key, "alpha").and_then(DataValue::as_f64);
    let size = key_value(key, "size").and_then(DataValue::as_f64);
    let shape = key_value(key, "shape").map_or_else(|| "o".to_string(), DataValue::to_label);
    let linetype = key_value(key, "linetype").cloned().unwrap_or(DataValue::Null);
    let with_alpha = |c: Rgba| alpha.map_or(c, |a| c.with_alpha_f(a));
    let (cx, cy) = (cell.x + cell.w / 2.0, cell.y + cell.h / 2.0);
    for geom in &guide.geoms {
        match geom {
            GeomKind::Point | GeomKind::Jitter | GeomKind::Text => {
                let r = size.map_or(cell.w * 0.2, |s| units.pt(s * PT) / 2.0).min(cell.w / 2.0);
                let c = with_alpha(color.unwrap_or(Rgba::BLACK));
                draw_marker(canvas, cx, cy, r.max(1.0), &shape, c);
            }
            GeomKind::Pointrange => {
                let c = with_alpha(color.unwrap_or(Rgba::BLACK));
                let width = units.mm(size.unwrap_or(0.5)).max(0.5);
                canvas.polyline(&[(cx, cell.y + 1.0), (cx, cell.bottom() - 1.0)], &Stroke::solid(c, width));
                draw_marker(canvas, cx, cy, (cell.w * 0.15).max(1.0), &shape, c);
            }
            GeomKind::Line
            | GeomKind::Path
            | GeomKind::Step
            | GeomKind::Hline
            | GeomKind::Vline
            | GeomKind::Abline
            | GeomKind::Segment
            | GeomKind::Errorbar
            | GeomKind::Linerange
            | GeomKind::Smooth => {
                let width = units.mm(size.unwrap_or(0.5)).max(0.5);
                let stroke = Stroke::solid(with_alpha(color.unwrap_or(Rgba::BLACK)), width)
                    .dashed(dash_pattern(&linetype, width));
                canvas.polyline(&[(cell.x + 1.0, cy), (cell.right() - 1.0, cy)], &stroke);
            }
            _ => {
                let inset = cell.w * 0.1;
                let f = fill.or(color).map(with_alpha);
                let outline = color.filter(|_| fill.is_some()).map(|c| Stroke::solid(c, units.pt(0.5)));
                let pts = [
                    (cell.x + inset, cell.y + inset),
                    (cell.right() - inset, cell.y + inset),
                    (cell.right() - inset, cell.bottom() - inset),
                    (cell.x + inset, cell.bottom() - inset),
                ];
                canvas.polygon(&pts, f, outline.as_ref());
            }
        }
    }
}

fn draw_colorbar(
    canvas: &mut dyn Canvas,
    colors: &[Rgba],
    ticks: &[(f64, String)],
    bar: Area,
    theme: &Theme,
    tick_px: f64,
    vertical: bool,
) {
    let n = colors.len().max(1) as f64;
    for (i, c) in colors.iter().enumerate() {
        let t = i as f64 / n;
        if vertical {
            let h = bar.h / n;
            canvas.fill_rect(bar.x, bar.bottom() - (t * bar.h) - h, bar.w, h + 0.5, *c);
        } else {
            let w = bar.w / n;
            canvas.fill_rect(bar.x + t * bar.w, bar.y, w + 0.5, bar.h, *c);
        }
    }
    let stroke = Stroke::solid(Rgba::WHITE, 1.0);
    for (pos, label) in ticks {
        if vertical {
            let y = bar.bottom() - pos * bar.h;
            canvas.polyline(&[(bar.x, y), (bar.x + bar.w * 0.2, y)], &stroke);
            canvas.polyline(&[(bar.right() - bar.w * 0.2, y), (bar.right(), y)], &stroke);
            if canvas.supports_text() {
                let style = TextStyle::new(tick_px, theme.text_color, Anchor::Start);
                canvas.text(bar.right() + tick_px * 0.5, y + tick_px / 3.0, label, &style);
            }
        } else {
            let x = bar.x + pos * bar.w;
            canvas.polyline(&[(x, bar.y), (x, bar.y + bar.h * 0.2)], &stroke);
            if canvas.supports_text() {
                let style = TextStyle::new(tick_px, theme.text_color, Anchor::Middle);
                canvas.text(x, bar.bottom() + tick_px * 1.2, label, &style);
            }
        }
    }
}
