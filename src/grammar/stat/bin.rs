//! Binning of continuous x.
//!
//! Breaks cover the unexpanded range of the panel's x scale, so every group
//! of a panel shares the same bins.

use super::{frame, numeric, percentile, weights, StatCompute};
use crate::data::{DataFrame, DataValue};
use crate::error::{Error, Result};
use crate::grammar::aes::{after_stat, Aes};
use crate::grammar::layout::PanelScales;
use crate::grammar::params::Params;

/// Counts in adjacent intervals of x.
///
/// Produces `count`, `density`, `ncount`, `ndensity`, `ngroup`, `width`,
/// `xmin` and `xmax`, with `x` at the bin centers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinStat;

impl StatCompute for BinStat {
    fn name(&self) -> &str {
        "bin"
    }

    fn required_aes(&self) -> &[&str] {
        &["x"]
    }

    fn default_aes(&self) -> Aes {
        Aes::new().y(after_stat("count"))
    }

    fn default_params(&self) -> Params {
        Params::new().with("closed", "right").with("pad", false)
    }

    fn extra_params(&self) -> &[&str] {
        &["bins", "binwidth", "breaks", "center", "boundary"]
    }

    fn setup_params(&self, data: &DataFrame, mut params: Params) -> Result<Params> {
        if data.has_column("y") {
            return Err(Error::invalid_parameter(
                "stat_bin",
                "y",
                "stat_bin must not be used with a y aesthetic",
            ));
        }
        if !matches!(params.str("closed"), Some("right" | "left")) {
            return Err(Error::invalid_parameter(
                "stat_bin",
                "closed",
                "expected 'right' or 'left'",
            ));
        }
        if params.contains("center") && params.contains("boundary") {
            return Err(Error::invalid_parameter(
                "stat_bin",
                "center",
                "only one of 'boundary' and 'center' may be given",
            ));
        }
        if ["breaks", "binwidth", "bins"].iter().all(|p| !params.contains(p)) {
            let x = data.get("x").and_then(|c| c.to_numbers()).unwrap_or_default();
            let bins = freedman_diaconis_bins(&x);
            tracing::info!(bins, "stat_bin picked the number of bins; set binwidth for a better value");
            params.set("bins", bins as f64);
        }
        Ok(params)
    }

    fn compute_group(&self, data: &DataFrame, scales: PanelScales<'_>, params: &Params) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(DataFrame::new());
        }
        let x = numeric(data, "x", self.name())?;
        let range = scales
            .x
            .and_then(|s| s.continuous_limits())
            .or_else(|| crate::scale::breaks::finite_range(&x))
            .unwrap_or((0.0, 1.0));
        let center = params.f64("center");
        let boundary = params.f64("boundary");

        let breaks = if let Some(DataValue::Text(list)) = params.get("breaks") {
            let t = scales.x.map(crate::scale::Scale::value_transform).unwrap_or_default();
            list.split(',')
                .filter_map(|b| b.trim().parse::<f64>().ok())
                .map(|b| t.transform(b))
                .collect()
        } else if let Some(width) = params.f64("binwidth") {
            breaks_from_binwidth(range, width, center, boundary)?
        } else {
            let bins = params.usize("bins").unwrap_or(30);
            if range.1 - range.0 == 0.0 {
                breaks_from_binwidth(range, 0.1, center, boundary)?
            } else {
                breaks_from_bins(range, bins, center, boundary)?
            }
        };
        let right = params.str("closed") != Some("left");
        let pad = params.bool("pad").unwrap_or(false);
        assign_bins(&x, &breaks, &weights(data), pad, right)
    }
}

/// Number of bins by the Freedman-Diaconis rule, falling back to
/// `sqrt(n)` when the interquartile range is zero.
fn freedman_diaconis_bins(x: &[f64]) -> usize {
    let mut v: Vec<f64> = x.iter().copied().filter(|v| v.is_finite()).collect();
    if v.is_empty() {
        return 1;
    }
    v.sort_by(f64::total_cmp);
    let iqr = percentile(&v, 0.75) - percentile(&v, 0.25);
    let n = v.len() as f64;
    let h = 2.0 * iqr / n.cbrt();
    let bins = if h == 0.0 {
        n.sqrt().ceil()
    } else {
        ((v[v.len() - 1] - v[0]) / h).ceil()
    };
    (bins as usize).max(1)
}

/// Breaks `width` apart covering `range`.
///
/// Without `center` or `boundary` the extremes sit in the outer halves of
/// their bins.
pub fn breaks_from_binwidth(
    range: (f64, f64),
    width: f64,
    center: Option<f64>,
    boundary: Option<f64>,
) -> Result<Vec<f64>> {
    if !width.is_finite() || width <= 0.0 {
        return Err(Error::invalid_parameter("stat_bin", "binwidth", "must be positive"));
    }
    let boundary = match (boundary, center) {
        (Some(b), _) => b,
        (None, Some(c)) => c - width / 2.0,
        (None, None) => width / 2.0,
    };
    let shift = ((range.0 - boundary) / width).floor();
    let origin = boundary + shift * width;
    let max_x = range.1 + width * (1.0 - 1e-12);
    let count = ((max_x - origin) / width).ceil().max(1.0) as usize;
    if count > 1_000_000 {
        return Err(Error::invalid_parameter(
            "stat_bin",
            "binwidth",
            "too small for the range of the data",
        ));
    }
    let mut breaks: Vec<f64> = (0..count).map(|k| origin + k as f64 * width).collect();
    if breaks.len() == 1 {
        breaks.push(breaks[0] + width);
    }
    Ok(breaks)
}

/// Breaks for `bins` bins covering `range`.
pub fn breaks_from_bins(
    range: (f64, f64),
    bins: usize,
    center: Option<f64>,
    boundary: Option<f64>,
) -> Result<Vec<f64>> {
    match bins {
        0 => Err(Error::invalid_parameter("stat_bin", "bins", "need at least one bin")),
        1 => breaks_from_binwidth(range, range.1 - range.0, center, boundary.or(Some(range.1))),
        n => breaks_from_binwidth(range, (range.1 - range.0) / (n - 1) as f64, center, boundary),
    }
}

/// Count weighted values of `x` per bin.
///
/// Bins are right-closed (or left-closed) with the outermost edge
/// included. Values outside every bin are not counted. Empty bins are kept.
pub fn assign_bins(x: &[f64], breaks: &[f64], weight: &[f64], pad: bool, right: bool) -> Result<DataFrame> {
    if breaks.len() < 2 {
        return Ok(DataFrame::new());
    }
    let n_bins = breaks.len() - 1;
    let mut widths: Vec<f64> = breaks.windows(2).map(|w| w[1] - w[0]).collect();
    let mut sorted = widths.clone();
    sorted.sort_by(f64::total_cmp);
    let fuzz = 1e-8 * percentile(&sorted, 0.5);
    let edges: Vec<f64> = breaks
        .iter()
        .enumerate()
        .map(|(i, b)| match (right, i) {
            (true, 0) => b - fuzz,
            (true, _) => b + fuzz,
            (false, i) if i == n_bins => b + fuzz,
            (false, _) => b - fuzz,
        })
        .collect();

    let mut count = vec![0.0; n_bins];
    for (xi, wi) in x.iter().zip(weight) {
        if !xi.is_finite() || *xi < edges[0] || *xi > edges[n_bins] {
            continue;
        }
        let below = if right {
            edges.partition_point(|e| e < xi)
        } else {
            edges.partition_point(|e| e <= xi)
        };
        if let Some(c) = count.get_mut(below.saturating_sub(1).min(n_bins - 1)) {
            *c += if wi.is_nan() { 0.0 } else { *wi };
        }
    }
    let mut centers: Vec<f64> = breaks.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    if pad {
        let (w0, wn) = (widths[0], widths[n_bins - 1]);
        count.insert(0, 0.0);
        count.push(0.0);
        centers.insert(0, centers[0] - w0);
        centers.push(centers[n_bins] + wn);
        widths.insert(0, w0);
        widths.push(wn);
    }
    result_frame(count, centers, widths)
}

fn result_frame(count: Vec<f64>, x: Vec<f64>, width: Vec<f64>) -> Result<DataFrame> {
    let xmax: Vec<f64> = x.iter().zip(&width).map(|(c, w)| c + w / 2.0).collect();
    let mut xmin: Vec<f64> = x.iter().zip(&width).map(|(c, w)| c - w / 2.0).collect();
    // adjacent edges must coincide exactly
    for i in 1..xmin.len() {
        xmin[i] = xmax[i - 1];
    }
    let total: f64 = count.iter().map(|c| c.abs()).sum();
    let density: Vec<f64> = count
        .iter()
        .zip(&width)
        .map(|(c, w)| if total > 0.0 { c / w / total } else { 0.0 })
        .collect();
    let max_count = count.iter().fold(0.0f64, |a, c| a.max(c.abs()));
    let max_density = density.iter().fold(0.0f64, |a, d| a.max(d.abs()));
    let scaled = |v: &[f64], max: f64| -> Vec<f64> {
        v.iter().map(|x| if max > 0.0 { x / max } else { 0.0 }).collect()
    };
    let n = count.len();
    frame(vec![
        ("x", x),
        ("ncount", scaled(&count, max_count)),
        ("ndensity", scaled(&density, max_density)),
        ("count", count),
        ("xmin", xmin),
        ("xmax", xmax),
        ("width", width),
        ("density", density),
        ("ngroup", vec![total; n]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_breaks_from_bins_places_extremes_inside() {
        let b = breaks_from_bins((0.0, 10.0), 11, None, None).unwrap();
        // width 1, boundary 0.5
        assert_relative_eq!(b[0], -0.5);
        assert_relative_eq!(b[1] - b[0], 1.0);
        assert_eq!(b.len(), 12);
        assert!(*b.last().unwrap() >= 10.0);
    }

    #[test]
    fn test_breaks_from_binwidth_center_and_boundary() {
        let b = breaks_from_binwidth((0.3, 2.7), 1.0, Some(0.0), None).unwrap();
        assert_relative_eq!(b[0], -0.5);
        let b = breaks_from_binwidth((0.3, 2.7), 1.0, None, Some(0.0)).unwrap();
        assert_relative_eq!(b[0], 0.0);
        assert_relative_eq!(*b.last().unwrap(), 3.0);
        assert!(breaks_from_binwidth((0.0, 1.0), 0.0, None, None).is_err());
    }

    #[test]
    fn test_assign_bins_right_closed() {
        let breaks = [0.0, 1.0, 2.0];
        let out = assign_bins(&[0.0, 0.5, 1.0, 1.5, 2.0], &breaks, &[1.0; 5], false, true).unwrap();
        assert_eq!(out.numbers("count").unwrap(), &[3.0, 2.0]);
        assert_eq!(out.numbers("x").unwrap(), &[0.5, 1.5]);
        let density = out.numbers("density").unwrap();
        assert_relative_eq!(density.iter().sum::<f64>(), 1.0);

        let left = assign_bins(&[0.0, 0.5, 1.0, 1.5, 2.0], &breaks, &[1.0; 5], false, false).unwrap();
        assert_eq!(left.numbers("count").unwrap(), &[2.0, 3.0]);
    }

    #[test]
    fn test_assign_bins_pad_and_empty_bins() {
        let out = assign_bins(&[0.5], &[0.0, 1.0, 2.0], &[1.0], true, true).unwrap();
        assert_eq!(out.numbers("count").unwrap(), &[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(out.numbers("xmin").unwrap()[0], -1.0);
        assert_eq!(out.numbers("ncount").unwrap()[1], 1.0);
    }

    #[test]
    fn test_freedman_diaconis() {
        let x: Vec<f64> = (0..100).map(f64::from).collect();
        assert!(freedman_diaconis_bins(&x) > 1);
        assert_eq!(freedman_diaconis_bins(&[1.0; 9]), 3);
    }

    #[test]
    fn test_compute_group_uses_scale_range() {
        use crate::data::Column;
        use crate::scale::Scale;
        let mut sx = Scale::x_continuous();
        sx.train(&Column::Number(vec![0.0, 10.0])).unwrap();
        let df = DataFrame::new().with_column("x", vec![1.0, 2.0, 2.5]).unwrap();
        let params = Params::new().with("binwidth", 5.0).or_defaults(&BinStat.default_params());
        let out = BinStat
            .compute_group(&df, PanelScales { x: Some(&sx), y: None }, &params)
            .unwrap();
        assert_eq!(out.numbers("count").unwrap().iter().sum::<f64>(), 3.0);
        assert!(out.numbers("xmax").unwrap().last().unwrap() >= &10.0);
    }

    #[test]
    fn test_y_aesthetic_rejected() {
        let df = DataFrame::new()
            .with_column("x", vec![1.0])
            .unwrap()
            .with_column("y", vec![1.0])
            .unwrap();
        assert!(BinStat.setup_params(&df, BinStat.default_params()).is_err());
    }
}
