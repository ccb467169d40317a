//! Coordinate systems for Grammar of Graphics.
//!
//! A coordinate system turns the trained position scales of a panel into
//! axis ranges, breaks and labels, and rescales layer data into the unit
//! square of the panel.
//!
//! [`Coord::Trans`] applies a second transform after the scales' own, so
//! straight lines in data space bend on screen. Connected geometries are
//! interpolated with [`Coord::munch`] before they are transformed.

use crate::data::{Column, DataFrame};
use crate::error::Result;
use crate::scale::breaks::rescale;
use crate::scale::{expand_range, Expansion, Scale, Transform, X_AES, Y_AES};

/// Pieces per unit of panel distance when interpolating connected rows.
const MUNCH_SEGMENTS: f64 = 100.0;

/// One axis of a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisView {
    /// Visible range in transformed space.
    pub range: (f64, f64),
    /// Break positions inside the range.
    pub breaks: Vec<f64>,
    /// Break labels.
    pub labels: Vec<String>,
}

impl Default for AxisView {
    fn default() -> Self {
        Self {
            range: (0.0, 1.0),
            breaks: Vec::new(),
            labels: Vec::new(),
        }
    }
}

/// Horizontal and vertical axis of a panel, as drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelParams {
    /// Horizontal axis.
    pub x: AxisView,
    /// Vertical axis.
    pub y: AxisView,
}

/// Coordinate system.
#[derive(Debug, Clone, PartialEq)]
pub enum Coord {
    /// Cartesian coordinates.
    Cartesian {
        /// X-axis limits in data space.
        xlim: Option<(f64, f64)>,
        /// Y-axis limits in data space.
        ylim: Option<(f64, f64)>,
        /// Add the scales' expansion around the limits.
        expand: bool,
        /// Swap the axes.
        flip: bool,
    },
    /// Cartesian coordinates with a fixed aspect ratio.
    Fixed {
        /// Y units per x unit on screen.
        ratio: f64,
        /// X-axis limits in data space.
        xlim: Option<(f64, f64)>,
        /// Y-axis limits in data space.
        ylim: Option<(f64, f64)>,
        /// Add the scales' expansion around the limits.
        expand: bool,
    },
    /// Cartesian coordinates drawn through a transform per axis.
    Trans {
        /// Horizontal transform.
        x: Transform,
        /// Vertical transform.
        y: Transform,
        /// X-axis limits in data space.
        xlim: Option<(f64, f64)>,
        /// Y-axis limits in data space.
        ylim: Option<(f64, f64)>,
        /// Add the scales' expansion around the limits.
        expand: bool,
    },
}

impl Default for Coord {
    fn default() -> Self {
        Self::cartesian()
    }
}

impl Coord {
    /// Standard Cartesian coordinates.
    #[must_use]
    pub fn cartesian() -> Self {
        Self::Cartesian {
            xlim: None,
            ylim: None,
            expand: true,
            flip: false,
        }
    }

    /// Cartesian coordinates with x and y swapped.
    #[must_use]
    pub fn flip() -> Self {
        Self::Cartesian {
            xlim: None,
            ylim: None,
            expand: true,
            flip: true,
        }
    }

    /// Fixed aspect ratio.
    #[must_use]
    pub fn fixed(ratio: f64) -> Self {
        Self::Fixed {
            ratio,
            xlim: None,
            ylim: None,
            expand: true,
        }
    }

    /// Transformed coordinates, e.g. `Coord::trans(Transform::Log10,
    /// Transform::Identity)`.
    #[must_use]
    pub fn trans(x: Transform, y: Transform) -> Self {
        Self::Trans {
            x,
            y,
            xlim: None,
            ylim: None,
            expand: true,
        }
    }

    /// Set x limits.
    #[must_use]
    pub fn xlim(mut self, min: f64, max: f64) -> Self {
        match &mut self {
            Self::Cartesian { xlim, .. } | Self::Fixed { xlim, .. } | Self::Trans { xlim, .. } => {
                *xlim = Some((min, max));
            }
        }
        self
    }

    /// Set y limits.
    #[must_use]
    pub fn ylim(mut self, min: f64, max: f64) -> Self {
        match &mut self {
            Self::Cartesian { ylim, .. } | Self::Fixed { ylim, .. } | Self::Trans { ylim, .. } => {
                *ylim = Some((min, max));
            }
        }
        self
    }

    /// Turn scale expansion on or off.
    #[must_use]
    pub fn expand(mut self, value: bool) -> Self {
        match &mut self {
            Self::Cartesian { expand, .. } | Self::Fixed { expand, .. } | Self::Trans { expand, .. } => {
                *expand = value;
            }
        }
        self
    }

    /// Horizontal and vertical transform; identities unless transformed.
    #[must_use]
    pub fn transforms(&self) -> (Transform, Transform) {
        match self {
            Self::Trans { x, y, .. } => (*x, *y),
            _ => (Transform::Identity, Transform::Identity),
        }
    }

    /// True when straight lines stay straight.
    #[must_use]
    pub fn is_linear(&self) -> bool {
        self.transforms() == (Transform::Identity, Transform::Identity)
    }

    /// True when x is drawn vertically.
    #[must_use]
    pub fn is_flipped(&self) -> bool {
        matches!(self, Self::Cartesian { flip: true, .. })
    }

    /// Height over width of a panel, when fixed.
    #[must_use]
    pub fn aspect_ratio(&self, params: &PanelParams) -> Option<f64> {
        match self {
            Self::Fixed { ratio, .. } => {
                let dx = params.x.range.1 - params.x.range.0;
                let dy = params.y.range.1 - params.y.range.0;
                (dx.abs() > f64::EPSILON).then(|| ratio * dy / dx)
            }
            Self::Cartesian { .. } | Self::Trans { .. } => None,
        }
    }

    fn limits(&self) -> (Option<(f64, f64)>, Option<(f64, f64)>, bool) {
        match self {
            Self::Cartesian { xlim, ylim, expand, .. }
            | Self::Fixed { xlim, ylim, expand, .. }
            | Self::Trans { xlim, ylim, expand, .. } => (*xlim, *ylim, *expand),
        }
    }

    /// Axis views of one panel from its trained scales.
    #[must_use]
    pub fn setup_panel_params(&self, x: Option<&Scale>, y: Option<&Scale>) -> PanelParams {
        let (xlim, ylim, expand) = self.limits();
        let (tx, ty) = self.transforms();
        let xv = x.map_or_else(AxisView::default, |s| trans_axis_view(s, tx, xlim, expand));
        let yv = y.map_or_else(AxisView::default, |s| trans_axis_view(s, ty, ylim, expand));
        if self.is_flipped() {
            PanelParams { x: yv, y: xv }
        } else {
            PanelParams { x: xv, y: yv }
        }
    }

    /// Rescale position columns into `[0, 1]` panel space.
    ///
    /// After a flip, x-family columns are measured on the vertical axis.
    /// Infinite positions are squished onto the panel edges.
    #[must_use]
    pub fn transform(&self, data: &DataFrame, params: &PanelParams) -> DataFrame {
        let (horizontal, vertical) = if self.is_flipped() {
            (Y_AES, X_AES)
        } else {
            (X_AES, Y_AES)
        };
        let (tx, ty) = self.transforms();
        let mut out = data.clone();
        for (name, t, range) in horizontal
            .iter()
            .map(|n| (n, tx, params.x.range))
            .chain(vertical.iter().map(|n| (n, ty, params.y.range)))
        {
            out.map_numbers(name, |v| to_panel(t, v, range));
        }
        out
    }

    /// Interpolate consecutive rows of each group so that the segments
    /// between them follow a non-linear transform. Linear systems return
    /// the data unchanged.
    ///
    /// Every numeric column is interpolated; other columns repeat the
    /// value of the segment's first row.
    ///
    /// # Errors
    ///
    /// Fails only when a column cannot be replaced.
    pub fn munch(&self, data: &DataFrame, params: &PanelParams) -> Result<DataFrame> {
        if self.is_linear() || data.nrow() < 2 {
            return Ok(data.clone());
        }
        let (tx, ty) = self.transforms();
        let (Some(x), Some(y)) = (data.numbers("x"), data.numbers("y")) else {
            return Ok(data.clone());
        };
        let group = data.numbers("group");
        let same_group = |i: usize| group.map_or(true, |g| g[i] == g[i + 1]);

        let mut rows: Vec<usize> = Vec::with_capacity(data.nrow());
        let mut fractions: Vec<f64> = Vec::with_capacity(data.nrow());
        for i in 0..data.nrow() {
            rows.push(i);
            fractions.push(0.0);
            if i + 1 == data.nrow() || !same_group(i) {
                continue;
            }
            let dx = to_panel(tx, x[i + 1], params.x.range) - to_panel(tx, x[i], params.x.range);
            let dy = to_panel(ty, y[i + 1], params.y.range) - to_panel(ty, y[i], params.y.range);
            let dist = dx.hypot(dy);
            if !dist.is_finite() {
                continue;
            }
            let pieces = (dist * MUNCH_SEGMENTS).ceil().max(1.0) as usize;
            for k in 1..pieces {
                rows.push(i);
                fractions.push(k as f64 / pieces as f64);
            }
        }
        if rows.len() == data.nrow() {
            return Ok(data.clone());
        }

        let mut out = data.take(&rows);
        let names: Vec<String> = data.column_names().to_vec();
        for name in names {
            let Some(values) = data.numbers(&name) else {
                continue;
            };
            let interpolated: Vec<f64> = rows
                .iter()
                .zip(&fractions)
                .map(|(&i, &f)| {
                    if f == 0.0 {
                        values[i]
                    } else {
                        values[i] + (values[i + 1] - values[i]) * f
                    }
                })
                .collect();
            out.insert(name, Column::Number(interpolated))?;
        }
        Ok(out)
    }

    /// Rescale one horizontal value into `[0, 1]`.
    #[must_use]
    pub fn rescale_x(params: &PanelParams, v: f64) -> f64 {
        rescale(v, params.x.range)
    }

    /// Rescale one vertical value into `[0, 1]`.
    #[must_use]
    pub fn rescale_y(params: &PanelParams, v: f64) -> f64 {
        rescale(v, params.y.range)
    }
}

/// Transform and rescale one position; infinities land on the edges.
fn to_panel(t: Transform, v: f64, range: (f64, f64)) -> f64 {
    if v.is_infinite() {
        return if v > 0.0 { 1.0 } else { 0.0 };
    }
    rescale(t.transform(v), range)
}

/// Axis view through a coordinate transform. Ranges are expanded after
/// transforming, breaks stay where the scale put them.
fn trans_axis_view(scale: &Scale, t: Transform, limits: Option<(f64, f64)>, expand: bool) -> AxisView {
    if t == Transform::Identity || scale.is_discrete() {
        return axis_view(scale, limits, expand);
    }
    let st = scale.value_transform();
    let base = match limits {
        Some((lo, hi)) => (st.transform(lo), st.transform(hi)),
        None => scale.dimension_with(Expansion::NONE),
    };
    let (a, b) = (t.transform(base.0), t.transform(base.1));
    if !a.is_finite() || !b.is_finite() {
        tracing::warn!(
            transform = t.name(),
            lo = base.0,
            hi = base.1,
            "coordinate transform undefined on the scale range; drawing untransformed"
        );
        return axis_view(scale, limits, expand);
    }
    let expansion = if expand { scale.expansion() } else { Expansion::NONE };
    let range = expand_range((a.min(b), a.max(b)), expansion);

    let breaks: Vec<f64> = match limits {
        Some((lo, hi)) => st
            .breaks(lo.min(hi), lo.max(hi), 5)
            .into_iter()
            .map(|b| st.transform(b))
            .collect(),
        None => scale.get_breaks(),
    };
    let labels = scale.get_labels(&breaks);
    let labelled = !labels.is_empty();
    let (breaks, labels): (Vec<f64>, Vec<String>) = breaks
        .iter()
        .map(|b| t.transform(*b))
        .zip(labels.into_iter().chain(std::iter::repeat(String::new())))
        .filter(|(b, _)| b.is_finite() && *b >= range.0 && *b <= range.1)
        .unzip();
    AxisView {
        range,
        breaks,
        labels: if labelled { labels } else { Vec::new() },
    }
}

fn axis_view(scale: &Scale, limits: Option<(f64, f64)>, expand: bool) -> AxisView {
    let expansion = if expand { scale.expansion() } else { Expansion::NONE };
    let range = match limits {
        Some((lo, hi)) if !scale.is_discrete() => {
            let t = scale.value_transform();
            let (a, b) = (t.transform(lo), t.transform(hi));
            expand_range((a.min(b), a.max(b)), expansion)
        }
        Some(lims) => expand_range(lims, expansion),
        None => scale.dimension_with(expansion),
    };
    let breaks: Vec<f64> = match limits {
        Some((lo, hi)) if !scale.is_discrete() => {
            let t = scale.value_transform();
            t.breaks(lo.min(hi), lo.max(hi), 5)
                .into_iter()
                .map(|b| t.transform(b))
                .collect()
        }
        _ => scale.get_breaks(),
    };
    let (lo, hi) = (range.0.min(range.1), range.0.max(range.1));
    let breaks: Vec<f64> = breaks.into_iter().filter(|b| *b >= lo && *b <= hi).collect();
    let labels = scale.get_labels(&breaks);
    AxisView { range, breaks, labels }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, DataFrame};
    use approx::assert_relative_eq;

    fn trained(aes: &str, values: Vec<f64>) -> Scale {
        let mut s = Scale::continuous(aes);
        s.train(&Column::Number(values)).unwrap();
        s
    }

    #[test]
    fn test_cartesian_expands_range() {
        let x = trained("x", vec![0.0, 10.0]);
        let params = Coord::cartesian().setup_panel_params(Some(&x), None);
        assert_relative_eq!(params.x.range.0, -0.5);
        assert_relative_eq!(params.x.range.1, 10.5);
        assert_eq!(params.x.breaks, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(params.y, AxisView::default());
    }

    #[test]
    fn test_limits_without_expand() {
        let x = trained("x", vec![0.0, 10.0]);
        let params = Coord::cartesian()
            .xlim(2.0, 4.0)
            .expand(false)
            .setup_panel_params(Some(&x), None);
        assert_eq!(params.x.range, (2.0, 4.0));
        assert!(params.x.breaks.iter().all(|b| (2.0..=4.0).contains(b)));
    }

    #[test]
    fn test_flip_swaps_axes() {
        let x = trained("x", vec![0.0, 1.0]);
        let y = trained("y", vec![0.0, 100.0]);
        let coord = Coord::flip();
        let params = coord.setup_panel_params(Some(&x), Some(&y));
        assert!(params.x.range.1 > 100.0);
        let df = DataFrame::new()
            .with_column("x", vec![0.0, 1.0])
            .unwrap()
            .with_column("y", vec![0.0, 100.0])
            .unwrap();
        let out = coord.transform(&df, &params);
        let y = out.numbers("y").unwrap();
        assert!(y[0] > 0.0 && y[1] < 1.0);
    }

    #[test]
    fn test_transform_unit_square() {
        let params = PanelParams {
            x: AxisView {
                range: (0.0, 10.0),
                ..AxisView::default()
            },
            y: AxisView::default(),
        };
        let df = DataFrame::new()
            .with_column("xmin", vec![5.0])
            .unwrap()
            .with_column("label", vec!["a"])
            .unwrap();
        let out = Coord::cartesian().transform(&df, &params);
        assert_eq!(out.numbers("xmin").unwrap(), &[0.5]);
        assert!(out.get("label").is_some());
    }

    #[test]
    fn test_trans_transforms_range_and_breaks() {
        let x = trained("x", vec![1.0, 1000.0]);
        let coord = Coord::trans(Transform::Log10, Transform::Identity).expand(false);
        assert!(!coord.is_linear());
        let params = coord.setup_panel_params(Some(&x), None);
        assert_relative_eq!(params.x.range.0, 0.0);
        assert_relative_eq!(params.x.range.1, 3.0);
        assert_eq!(params.x.breaks.len(), params.x.labels.len());
        assert!(params.x.breaks.iter().all(|b| (0.0..=3.0).contains(b)));
        assert!(params.x.labels.contains(&"1000".to_string()));

        let df = DataFrame::new()
            .with_column("x", vec![10.0, f64::NEG_INFINITY])
            .unwrap()
            .with_column("y", vec![f64::INFINITY, 0.5])
            .unwrap();
        let out = coord.transform(&df, &params);
        let xs = out.numbers("x").unwrap();
        assert_relative_eq!(xs[0], 1.0 / 3.0, epsilon = 1e-12);
        assert_eq!(xs[1], 0.0);
        assert_eq!(out.numbers("y").unwrap()[0], 1.0);
    }

    #[test]
    fn test_trans_falls_back_outside_domain() {
        let x = trained("x", vec![-1.0, 10.0]);
        let params = Coord::trans(Transform::Log10, Transform::Identity).setup_panel_params(Some(&x), None);
        assert_eq!(params, Coord::cartesian().setup_panel_params(Some(&x), None));
    }

    #[test]
    fn test_munch_interpolates_only_when_curved() {
        let params = PanelParams {
            x: AxisView {
                range: (0.0, 2.0),
                ..AxisView::default()
            },
            y: AxisView::default(),
        };
        let df = DataFrame::new()
            .with_column("x", vec![1.0, 100.0])
            .unwrap()
            .with_column("y", vec![0.0, 1.0])
            .unwrap()
            .with_column("group", vec![1.0, 1.0])
            .unwrap()
            .with_column("color", vec!["a", "a"])
            .unwrap();
        assert_eq!(Coord::cartesian().munch(&df, &params).unwrap(), df);
        let out = Coord::trans(Transform::Log10, Transform::Identity)
            .munch(&df, &params)
            .unwrap();
        assert_eq!(out.nrow(), 143);
        let x = out.numbers("x").unwrap();
        assert_eq!(x[71], 50.5);
        assert_eq!(x[142], 100.0);
        assert_eq!(out.numbers("y").unwrap()[71], 0.5);
        assert_eq!(out.get("color").unwrap().get(100), out.get("color").unwrap().get(0));

        let split = df.with_column("group", vec![1.0, 2.0]).unwrap();
        let out = Coord::trans(Transform::Log10, Transform::Identity)
            .munch(&split, &params)
            .unwrap();
        assert_eq!(out.nrow(), 2);
    }

    #[test]
    fn test_fixed_aspect() {
        let x = trained("x", vec![0.0, 10.0]);
        let y = trained("y", vec![0.0, 5.0]);
        let coord = Coord::fixed(1.0).expand(false);
        let params = coord.setup_panel_params(Some(&x), Some(&y));
        assert_relative_eq!(coord.aspect_ratio(&params).unwrap(), 0.5);
        assert!(Coord::cartesian().aspect_ratio(&params).is_none());
    }
}
