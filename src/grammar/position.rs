//! Position adjustments for Grammar of Graphics.
//!
//! A position adjustment moves marks that would overlap within a panel:
//! stacking bars on top of each other, dodging them side by side, or
//! jittering points. Adjustments run once per panel, after statistics and
//! before the second training pass of the position scales, and keep the
//! number of rows unless rows lack the values they need.

use super::layout::{Layout, PanelScales};
use super::params::Params;
use super::stat::{remove_missing, resolution};
use crate::data::{Column, DataFrame, DataValue};
use crate::error::{Error, Result};
use crate::scale::{X_AES, Y_AES};
use crate::warning::{PlotWarning, Warnings};
use std::fmt;
use std::sync::Arc;

/// The computation behind a position adjustment.
pub trait PositionAdjust: Send + Sync + fmt::Debug {
    /// Short name, e.g. `stack`.
    fn name(&self) -> &str;

    /// Aesthetics the adjustment needs.
    fn required_aes(&self) -> &[&str] {
        &[]
    }

    /// Default parameter values. Their names are accepted parameters.
    fn default_params(&self) -> Params {
        Params::new()
    }

    /// Accepted parameters that have no default.
    fn extra_params(&self) -> &[&str] {
        &[]
    }

    /// Resolve parameters against the layer data.
    fn setup_params(&self, _data: &DataFrame, params: Params, _warnings: &mut Warnings) -> Result<Params> {
        Ok(params)
    }

    /// Prepare layer data. The default checks the required aesthetics.
    fn setup_data(&self, data: DataFrame, _params: &Params, _warnings: &mut Warnings) -> Result<DataFrame> {
        let missing: Vec<String> = self
            .required_aes()
            .iter()
            .filter(|ae| !data.has_column(ae))
            .map(|ae| (*ae).to_string())
            .collect();
        if missing.is_empty() {
            Ok(data)
        } else {
            Err(Error::MissingAesthetics {
                component: format!("position_{}", self.name()),
                missing,
            })
        }
    }

    /// Adjust every panel of a layer. The default adjusts each panel on
    /// its own and keeps the row order.
    fn compute_layer(
        &self,
        data: &DataFrame,
        layout: &Layout,
        params: &Params,
        warnings: &mut Warnings,
    ) -> Result<DataFrame> {
        let panels = data.group_indices(&["PANEL"]);
        if panels.len() <= 1 {
            let id = panel_id(data);
            return self.compute_panel(data, layout.panel_scales(id), params, warnings);
        }
        let mut parts = Vec::with_capacity(panels.len());
        let mut order = Vec::with_capacity(data.nrow());
        for idx in panels {
            let panel = data.take(&idx);
            let scales = layout.panel_scales(panel_id(&panel));
            parts.push(self.compute_panel(&panel, scales, params, warnings)?);
            order.extend(idx);
        }
        let combined = DataFrame::concat(&parts);
        if combined.nrow() != order.len() {
            return Ok(combined);
        }
        let mut inverse = vec![0; order.len()];
        for (pos, row) in order.into_iter().enumerate() {
            inverse[row] = pos;
        }
        Ok(combined.take(&inverse))
    }

    /// Adjust one panel.
    fn compute_panel(
        &self,
        data: &DataFrame,
        scales: PanelScales<'_>,
        params: &Params,
        warnings: &mut Warnings,
    ) -> Result<DataFrame>;
}

fn panel_id(data: &DataFrame) -> usize {
    data.numbers("PANEL")
        .and_then(|p| p.first().copied())
        .filter(|p| p.is_finite() && *p >= 1.0)
        .map_or(1, |p| p as usize)
}

/// Leaves positions alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPosition;

impl PositionAdjust for IdentityPosition {
    fn name(&self) -> &str {
        "identity"
    }

    fn compute_layer(&self, data: &DataFrame, _: &Layout, _: &Params, _: &mut Warnings) -> Result<DataFrame> {
        Ok(data.clone())
    }

    fn compute_panel(&self, data: &DataFrame, _: PanelScales<'_>, _: &Params, _: &mut Warnings) -> Result<DataFrame> {
        Ok(data.clone())
    }
}

/// Stacks marks that share an x interval. With `fill`, every stack is
/// scaled to a total height of 1.
///
/// Negative values stack downwards from zero separately from positive
/// ones. `vjust` places `y` within each slice (1 at the top, 0 at the
/// bottom) and `reverse` flips the stacking order of the groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackPosition {
    fill: bool,
}

impl StackPosition {
    /// Stacking that keeps the heights.
    #[must_use]
    pub fn stack() -> Self {
        Self { fill: false }
    }

    /// Stacking normalised to a height of 1.
    #[must_use]
    pub fn fill() -> Self {
        Self { fill: true }
    }

    fn component(&self) -> &'static str {
        if self.fill {
            "position_fill"
        } else {
            "position_stack"
        }
    }
}

impl PositionAdjust for StackPosition {
    fn name(&self) -> &str {
        if self.fill {
            "fill"
        } else {
            "stack"
        }
    }

    fn default_params(&self) -> Params {
        Params::new().with("vjust", 1.0).with("reverse", false)
    }

    fn setup_params(&self, data: &DataFrame, mut params: Params, warnings: &mut Warnings) -> Result<Params> {
        let var = if let Some(ymax) = data.numbers("ymax") {
            if let Some(ymin) = data.numbers("ymin") {
                if ymin.iter().zip(ymax).any(|(a, b)| *a != 0.0 && *b != 0.0) {
                    warnings.push(PlotWarning::Position {
                        component: self.component().to_string(),
                        message: "Stacking not well defined when not anchored on the axis".to_string(),
                    });
                }
            }
            Some("ymax")
        } else if data.has_column("y") {
            Some("y")
        } else {
            warnings.push(PlotWarning::Position {
                component: self.component().to_string(),
                message: "Stacking requires either ymin & ymax or y aesthetics. \
                          Maybe you want position = 'identity'?"
                    .to_string(),
            });
            None
        };
        if let Some(var) = var {
            params.set("var", var);
        }
        Ok(params)
    }

    fn setup_data(&self, mut data: DataFrame, params: &Params, warnings: &mut Warnings) -> Result<DataFrame> {
        match params.str("var") {
            None => return Ok(data),
            Some("y") => {
                if let Some(y) = data.numbers("y").map(<[f64]>::to_vec) {
                    data.insert("ymax", Column::Number(y))?;
                }
            }
            Some(_) => {
                if let (Some(ymin), Some(ymax)) = (data.numbers("ymin"), data.numbers("ymax")) {
                    let ymax: Vec<f64> = ymin
                        .iter()
                        .zip(ymax)
                        .map(|(lo, hi)| if *hi == 0.0 { *lo } else { *hi })
                        .collect();
                    data.insert("ymax", Column::Number(ymax))?;
                }
            }
        }
        Ok(remove_missing(
            &data,
            &["x", "xmin", "xmax", "y"],
            self.component(),
            params,
            warnings,
        ))
    }

    fn compute_panel(
        &self,
        data: &DataFrame,
        _scales: PanelScales<'_>,
        params: &Params,
        warnings: &mut Warnings,
    ) -> Result<DataFrame> {
        if params.str("var").is_none() || data.is_empty() {
            return Ok(data.clone());
        }
        let frame = CollideFrame::new(data, None)?;
        frame.check_overlap(self.component(), warnings);
        let reverse = params.bool("reverse").unwrap_or(false);
        let vjust = params.f64("vjust").unwrap_or(1.0);

        let heights: Vec<f64> = data
            .numbers("y")
            .or_else(|| data.numbers("ymax"))
            .map_or_else(|| vec![0.0; data.nrow()], <[f64]>::to_vec);
        let negative: Vec<bool> = frame.ymax.iter().map(|v| *v < 0.0).collect();
        let mut ymin = vec![f64::NAN; data.nrow()];
        let mut ymax = vec![f64::NAN; data.nrow()];
        let mut y = vec![f64::NAN; data.nrow()];

        for sign in [true, false] {
            let rows: Vec<usize> = (0..data.nrow()).filter(|i| negative[*i] == sign).collect();
            for stack in frame.stacks(&rows, reverse) {
                let mut cum = 0.0;
                let bounds: Vec<(f64, f64)> = stack
                    .iter()
                    .map(|&i| {
                        let h = if heights[i].is_finite() { heights[i] } else { 0.0 };
                        let start = cum;
                        cum += h;
                        (start, cum)
                    })
                    .collect();
                let total = cum.abs();
                for (&i, (a, b)) in stack.iter().zip(bounds) {
                    let (a, b) = if self.fill && total > 0.0 {
                        (a / total, b / total)
                    } else {
                        (a, b)
                    };
                    ymin[i] = a.min(b);
                    ymax[i] = a.max(b);
                    y[i] = (1.0 - vjust) * ymin[i] + vjust * ymax[i];
                }
            }
        }

        let mut out = frame.into_frame()?;
        out.insert("ymin", Column::Number(ymin))?;
        out.insert("ymax", Column::Number(ymax))?;
        out.insert("y", Column::Number(y))?;
        Ok(out)
    }
}

/// Places overlapping marks side by side within their x interval.
///
/// `width` is the dodging width when it differs from the marks' width;
/// `preserve` is `total` (share the interval) or `single` (every mark
/// keeps the width of one element).
#[derive(Debug, Clone, Copy, Default)]
pub struct DodgePosition;

impl PositionAdjust for DodgePosition {
    fn name(&self) -> &str {
        "dodge"
    }

    fn required_aes(&self) -> &[&str] {
        &["x"]
    }

    fn default_params(&self) -> Params {
        Params::new().with("preserve", "total")
    }

    fn extra_params(&self) -> &[&str] {
        &["width"]
    }

    fn setup_params(&self, data: &DataFrame, mut params: Params, _warnings: &mut Warnings) -> Result<Params> {
        if !data.has_column("xmin") && !data.has_column("xmax") && !params.contains("width") {
            return Err(Error::invalid_parameter(
                "position_dodge",
                "width",
                "Width not defined. Set with `position_dodge(width = ?)`",
            ));
        }
        match params.str("preserve") {
            Some("total") | None => {}
            Some("single") => {
                let key = if data.has_column("xmin") { "xmin" } else { "x" };
                let most = data
                    .group_indices(&["PANEL", key])
                    .iter()
                    .map(Vec::len)
                    .max()
                    .unwrap_or(1);
                params.set("n", most as f64);
            }
            Some(_) => {
                return Err(Error::invalid_parameter(
                    "position_dodge",
                    "preserve",
                    "expected one of total, single",
                ))
            }
        }
        Ok(params)
    }

    fn compute_panel(
        &self,
        data: &DataFrame,
        _scales: PanelScales<'_>,
        params: &Params,
        warnings: &mut Warnings,
    ) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(data.clone());
        }
        let mut frame = CollideFrame::new(data, params.f64("width"))?;
        frame.check_overlap("position_dodge", warnings);
        let width = params.f64("width").unwrap_or(frame.width);
        let fixed_n = params.usize("n");
        let groups: Vec<f64> = data
            .numbers("group")
            .map_or_else(|| vec![-1.0; data.nrow()], <[f64]>::to_vec);
        let mut x = data
            .get("x")
            .and_then(Column::to_numbers)
            .unwrap_or_else(|| vec![f64::NAN; data.nrow()]);

        let all: Vec<usize> = (0..data.nrow()).collect();
        for stack in frame.stacks(&all, false) {
            let mut unique: Vec<f64> = stack.iter().map(|&i| groups[i]).collect();
            unique.sort_by(f64::total_cmp);
            unique.dedup();
            let n = fixed_n.unwrap_or(unique.len());
            if n <= 1 {
                continue;
            }
            let d_width = stack
                .iter()
                .map(|&i| frame.xmax[i] - frame.xmin[i])
                .fold(f64::NEG_INFINITY, f64::max);
            let n = n as f64;
            for &i in &stack {
                let idx = unique.partition_point(|g| *g < groups[i]) as f64 + 1.0;
                x[i] += width * ((idx - 0.5) / n - 0.5);
                frame.xmin[i] = x[i] - d_width / n / 2.0;
                frame.xmax[i] = x[i] + d_width / n / 2.0;
            }
        }

        let mut out = frame.into_frame()?;
        out.insert("x", Column::Number(x))?;
        Ok(out)
    }
}

/// Dodging for marks whose x intervals overlap without sharing an
/// `xmin`, such as boxes of different widths.
///
/// Rows are sorted by `xmin` and group; consecutive overlapping rows form
/// one block whose extent is split between them. `padding` shrinks every
/// mark of a block with more than one mark, `preserve` is `total` or
/// `single` as for [`DodgePosition`] and `reverse` flips the group order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dodge2Position;

impl PositionAdjust for Dodge2Position {
    fn name(&self) -> &str {
        "dodge2"
    }

    fn required_aes(&self) -> &[&str] {
        &["x"]
    }

    fn default_params(&self) -> Params {
        Params::new()
            .with("preserve", "total")
            .with("padding", 0.1)
            .with("reverse", false)
    }

    fn extra_params(&self) -> &[&str] {
        &["width"]
    }

    fn setup_params(&self, data: &DataFrame, mut params: Params, _warnings: &mut Warnings) -> Result<Params> {
        if !data.has_column("xmin") && !data.has_column("xmax") && !params.contains("width") {
            return Err(Error::invalid_parameter(
                "position_dodge2",
                "width",
                "Width not defined. Set with `position_dodge2(width = ?)`",
            ));
        }
        match params.str("preserve") {
            Some("total") | None => {}
            Some("single") => {
                let most = if data.has_column("x") {
                    data.group_indices(&["PANEL", "x"]).iter().map(Vec::len).max()
                } else {
                    data.group_indices(&["PANEL"])
                        .iter()
                        .filter_map(|idx| {
                            let panel = data.take(idx);
                            let frame = CollideFrame::new(&panel, None).ok()?;
                            let order = frame.sorted_rows(false);
                            let blocks = frame.overlap_blocks(&order);
                            blocks.iter().map(Vec::len).max()
                        })
                        .max()
                };
                params.set("n", most.unwrap_or(1) as f64);
            }
            Some(_) => {
                return Err(Error::invalid_parameter(
                    "position_dodge2",
                    "preserve",
                    "expected one of total, single",
                ))
            }
        }
        Ok(params)
    }

    fn compute_panel(
        &self,
        data: &DataFrame,
        _scales: PanelScales<'_>,
        params: &Params,
        _warnings: &mut Warnings,
    ) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(data.clone());
        }
        let mut frame = CollideFrame::new(data, params.f64("width"))?;
        let fixed_n = params.f64("n");
        let padding = params.f64("padding").unwrap_or(0.1);
        let order = frame.sorted_rows(params.bool("reverse").unwrap_or(false));
        let blocks = frame.overlap_blocks(&order);
        let shared = blocks.iter().any(|b| b.len() > 1);

        let mut x = vec![f64::NAN; data.nrow()];
        for block in &blocks {
            let lo = block.iter().map(|&i| frame.xmin[i]).fold(f64::INFINITY, f64::min);
            let hi = block.iter().map(|&i| frame.xmax[i]).fold(f64::NEG_INFINITY, f64::max);
            let n = fixed_n.unwrap_or(block.len() as f64);
            let new_width: Vec<f64> = block.iter().map(|&i| (frame.xmax[i] - frame.xmin[i]) / n).collect();
            let mut start = (lo + hi) / 2.0 - new_width.iter().sum::<f64>() / 2.0;
            for (&i, w) in block.iter().zip(&new_width) {
                x[i] = start + w / 2.0;
                let half = if shared { w * (1.0 - padding) / 2.0 } else { w / 2.0 };
                frame.xmin[i] = x[i] - half;
                frame.xmax[i] = x[i] + half;
                start += w;
            }
        }

        let (xmin, xmax) = (frame.xmin.clone(), frame.xmax.clone());
        let mut out = frame.into_frame()?;
        if out.has_column("xend") {
            out.insert("x", Column::Number(xmin))?;
            out.insert("xend", Column::Number(xmax))?;
        } else {
            out.insert("x", Column::Number(x))?;
        }
        Ok(out)
    }
}

/// Adds uniform random noise to x and y.
///
/// `width` and `height` bound the noise (defaults: 40% of the data's
/// resolution). `seed` makes the noise reproducible; every x-family column
/// of a row moves by the same amount.
#[derive(Debug, Clone, Copy, Default)]
pub struct JitterPosition;

impl JitterPosition {
    const DEFAULT_SEED: u64 = 2_147_483_647;
}

impl PositionAdjust for JitterPosition {
    fn name(&self) -> &str {
        "jitter"
    }

    fn required_aes(&self) -> &[&str] {
        &["x", "y"]
    }

    fn extra_params(&self) -> &[&str] {
        &["width", "height", "seed"]
    }

    fn setup_params(&self, data: &DataFrame, mut params: Params, _warnings: &mut Warnings) -> Result<Params> {
        for (key, column) in [("width", "x"), ("height", "y")] {
            if !params.contains(key) {
                let values = data.get(column).and_then(Column::to_numbers).unwrap_or_default();
                params.set(key, resolution(&values, true) * 0.4);
            }
        }
        Ok(params)
    }

    fn compute_layer(&self, data: &DataFrame, _: &Layout, params: &Params, _: &mut Warnings) -> Result<DataFrame> {
        jitter(data, params)
    }

    fn compute_panel(&self, data: &DataFrame, _: PanelScales<'_>, params: &Params, _: &mut Warnings) -> Result<DataFrame> {
        jitter(data, params)
    }
}

/// One draw of noise per row, shared by the panels of a layer.
fn jitter(data: &DataFrame, params: &Params) -> Result<DataFrame> {
    let seed = params
        .get("seed")
        .and_then(DataValue::as_f64)
        .map_or(JitterPosition::DEFAULT_SEED, |s| s as u64);
    let mut rng = Lcg::new(seed);
    let n = data.nrow();
    let width = params.f64("width").unwrap_or(0.0);
    let height = params.f64("height").unwrap_or(0.0);
    let dx: Vec<f64> = (0..n).map(|_| rng.symmetric(width)).collect();
    let dy: Vec<f64> = (0..n).map(|_| rng.symmetric(height)).collect();
    shift_family(data, &dx, &dy)
}

/// Moves every mark by a fixed offset, `x` horizontally and `y`
/// vertically.
#[derive(Debug, Clone, Copy, Default)]
pub struct NudgePosition;

impl PositionAdjust for NudgePosition {
    fn name(&self) -> &str {
        "nudge"
    }

    fn default_params(&self) -> Params {
        Params::new().with("x", 0.0).with("y", 0.0)
    }

    fn compute_layer(&self, data: &DataFrame, _: &Layout, params: &Params, _: &mut Warnings) -> Result<DataFrame> {
        nudge(data, params)
    }

    fn compute_panel(&self, data: &DataFrame, _: PanelScales<'_>, params: &Params, _: &mut Warnings) -> Result<DataFrame> {
        nudge(data, params)
    }
}

fn nudge(data: &DataFrame, params: &Params) -> Result<DataFrame> {
    let n = data.nrow();
    let dx = vec![params.f64("x").unwrap_or(0.0); n];
    let dy = vec![params.f64("y").unwrap_or(0.0); n];
    shift_family(data, &dx, &dy)
}

/// Add per-row offsets to every x-family and y-family column.
fn shift_family(data: &DataFrame, dx: &[f64], dy: &[f64]) -> Result<DataFrame> {
    let mut out = data.clone();
    for (names, delta) in [(X_AES, dx), (Y_AES, dy)] {
        if delta.iter().all(|d| *d == 0.0) {
            continue;
        }
        for name in names {
            if let Some(values) = data.numbers(name) {
                let moved = values.iter().zip(delta).map(|(v, d)| v + d).collect::<Vec<_>>();
                out.insert(*name, Column::Number(moved))?;
            }
        }
    }
    Ok(out)
}

/// Linear congruential generator used by jittering.
#[derive(Debug, Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345) % (1 << 31);
        self.0 as f64 / (1u64 << 31) as f64
    }

    /// Uniform in `[-amount, amount]`.
    fn symmetric(&mut self, amount: f64) -> f64 {
        if amount == 0.0 {
            return 0.0;
        }
        (self.next_f64() * 2.0 - 1.0) * amount
    }
}

/// X intervals of a panel shared by stacking and dodging.
struct CollideFrame {
    data: DataFrame,
    xmin: Vec<f64>,
    xmax: Vec<f64>,
    ymax: Vec<f64>,
    /// Width of the marks, from the data when no width was given.
    width: f64,
}

impl CollideFrame {
    /// Intervals from `xmin`/`xmax`, else `x` plus or minus half of
    /// `width`. Without either, intervals collapse onto `x`.
    fn new(data: &DataFrame, width: Option<f64>) -> Result<Self> {
        let n = data.nrow();
        let x = data
            .get("x")
            .and_then(Column::to_numbers)
            .unwrap_or_else(|| vec![f64::NAN; n]);
        let (xmin, xmax) = match (data.numbers("xmin"), data.numbers("xmax")) {
            (Some(lo), Some(hi)) => (lo.to_vec(), hi.to_vec()),
            _ => {
                let half = width.unwrap_or(0.0) / 2.0;
                (
                    x.iter().map(|v| v - half).collect(),
                    x.iter().map(|v| v + half).collect(),
                )
            }
        };
        let width = width.unwrap_or_else(|| {
            xmin.iter()
                .zip(&xmax)
                .map(|(a, b)| b - a)
                .find(|w| w.is_finite())
                .unwrap_or(0.0)
        });
        let ymax = data
            .numbers("ymax")
            .or_else(|| data.numbers("y"))
            .map_or_else(|| vec![0.0; n], <[f64]>::to_vec);
        Ok(Self {
            data: data.clone(),
            xmin,
            xmax,
            ymax,
            width,
        })
    }

    /// Rows sharing an `xmin`, ordered by group (descending unless
    /// `reverse`), stable within a group.
    fn stacks(&self, rows: &[usize], reverse: bool) -> Vec<Vec<usize>> {
        let groups = self.data.numbers("group");
        let group = |i: usize| groups.map_or(-1.0, |g| g[i]);
        let mut sorted = rows.to_vec();
        sorted.sort_by(|&a, &b| {
            let by_group = if reverse {
                group(a).total_cmp(&group(b))
            } else {
                group(b).total_cmp(&group(a))
            };
            self.xmin[a].total_cmp(&self.xmin[b]).then(by_group)
        });
        let mut out: Vec<Vec<usize>> = Vec::new();
        for i in sorted {
            match out.last_mut() {
                Some(last) if self.xmin[last[0]] == self.xmin[i] => last.push(i),
                _ => out.push(vec![i]),
            }
        }
        out
    }

    /// Every row ordered by `xmin`, then by group (ascending unless
    /// `reverse`).
    fn sorted_rows(&self, reverse: bool) -> Vec<usize> {
        let groups = self.data.numbers("group");
        let group = |i: usize| groups.map_or(-1.0, |g| g[i]);
        let mut order: Vec<usize> = (0..self.xmin.len()).collect();
        order.sort_by(|&a, &b| {
            let by_group = if reverse {
                group(b).total_cmp(&group(a))
            } else {
                group(a).total_cmp(&group(b))
            };
            self.xmin[a].total_cmp(&self.xmin[b]).then(by_group)
        });
        order
    }

    /// Runs of `order` where each row starts before the previous one ends.
    fn overlap_blocks(&self, order: &[usize]) -> Vec<Vec<usize>> {
        let mut out: Vec<Vec<usize>> = Vec::new();
        let mut prev: Option<usize> = None;
        for &i in order {
            match (out.last_mut(), prev) {
                (Some(last), Some(p)) if self.xmin[i] < self.xmax[p] => last.push(i),
                _ => out.push(vec![i]),
            }
            prev = Some(i);
        }
        out
    }

    /// Warn when distinct x intervals overlap.
    fn check_overlap(&self, component: &str, warnings: &mut Warnings) {
        let mut intervals: Vec<(f64, f64)> = self
            .xmin
            .iter()
            .zip(&self.xmax)
            .map(|(a, b)| (*a, *b))
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .collect();
        intervals.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        intervals.dedup();
        if intervals.windows(2).any(|w| w[0].1 > w[1].0 + 1e-6) {
            warnings.push(PlotWarning::Position {
                component: component.to_string(),
                message: format!("{component} requires non-overlapping x intervals"),
            });
        }
    }

    fn into_frame(self) -> Result<DataFrame> {
        let mut data = self.data;
        data.insert("xmin", Column::Number(self.xmin))?;
        data.insert("xmax", Column::Number(self.xmax))?;
        Ok(data)
    }
}

/// A position adjustment and its parameters.
#[derive(Clone)]
pub struct Position {
    adjust: Arc<dyn PositionAdjust>,
    params: Params,
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("name", &self.name())
            .field("params", &self.params)
            .finish()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::identity()
    }
}

impl Position {
    /// Wrap an adjustment.
    #[must_use]
    pub fn custom(adjust: impl PositionAdjust + 'static) -> Self {
        Self {
            adjust: Arc::new(adjust),
            params: Params::new(),
        }
    }

    /// No adjustment.
    #[must_use]
    pub fn identity() -> Self {
        Self::custom(IdentityPosition)
    }

    /// Stack overlapping marks.
    #[must_use]
    pub fn stack() -> Self {
        Self::custom(StackPosition::stack())
    }

    /// Stack overlapping marks to a height of 1.
    #[must_use]
    pub fn fill() -> Self {
        Self::custom(StackPosition::fill())
    }

    /// Place overlapping marks side by side.
    #[must_use]
    pub fn dodge() -> Self {
        Self::custom(DodgePosition)
    }

    /// Place overlapping intervals side by side, with padding.
    #[must_use]
    pub fn dodge2() -> Self {
        Self::custom(Dodge2Position)
    }

    /// Add random noise.
    #[must_use]
    pub fn jitter() -> Self {
        Self::custom(JitterPosition)
    }

    /// Shift by a constant.
    #[must_use]
    pub fn nudge(x: f64, y: f64) -> Self {
        Self {
            adjust: Arc::new(NudgePosition),
            params: Params::new().with("x", x).with("y", y),
        }
    }

    /// Look up a built-in adjustment; the `position_` prefix is optional.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name.strip_prefix("position_").unwrap_or(name) {
            "identity" => Self::identity(),
            "stack" => Self::stack(),
            "fill" => Self::fill(),
            "dodge" => Self::dodge(),
            "dodge2" => Self::dodge2(),
            "jitter" => Self::jitter(),
            "nudge" => Self::custom(NudgePosition),
            other => {
                return Err(Error::UnknownComponent {
                    kind: "position",
                    name: other.to_string(),
                })
            }
        })
    }

    /// Short name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.adjust.name()
    }

    /// Name used in messages, e.g. `position_dodge`.
    #[must_use]
    pub fn component(&self) -> String {
        format!("position_{}", self.name())
    }

    /// Parameters set so far.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Set a parameter.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for names the adjustment does not accept.
    pub fn param(mut self, key: &str, value: impl Into<DataValue>) -> Result<Self> {
        let defaults = self.adjust.default_params();
        let allowed: Vec<&str> = self
            .adjust
            .extra_params()
            .iter()
            .copied()
            .chain(defaults.iter().map(|(k, _)| k))
            .collect();
        let component = self.component();
        self.params.set_checked(&component, &allowed, key, value)?;
        Ok(self)
    }

    /// Adjust a layer across its panels.
    ///
    /// # Errors
    ///
    /// [`Error::MissingAesthetics`] when the data lacks what the
    /// adjustment needs; parameter errors from its setup.
    pub fn compute_layer(&self, data: &DataFrame, layout: &Layout, warnings: &mut Warnings) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(data.clone());
        }
        let params = self.params.clone().or_defaults(&self.adjust.default_params());
        let params = self.adjust.setup_params(data, params, warnings)?;
        let data = self.adjust.setup_data(data.clone(), &params, warnings)?;
        if data.is_empty() {
            return Ok(data);
        }
        let out = self.adjust.compute_layer(&data, layout, &params, warnings)?;
        tracing::trace!(position = self.name(), rows = out.nrow(), "position adjusted");
        Ok(out)
    }
}
