//! Kernel density estimation.

use super::{frame, numeric, percentile, StatCompute};
use crate::data::{DataFrame, DataValue};
use crate::error::{Error, Result};
use crate::grammar::aes::{after_stat, Aes};
use crate::grammar::layout::PanelScales;
use crate::grammar::params::Params;

const KERNELS: &[&str] = &[
    "gaussian",
    "epanechnikov",
    "rectangular",
    "triangular",
    "biweight",
    "cosine",
];

/// Smoothed density of x evaluated on an even grid.
///
/// Produces `density`, `scaled` (maximum 1), `ndensity`, `count`
/// (density times observations) and `n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DensityStat;

impl StatCompute for DensityStat {
    fn name(&self) -> &str {
        "density"
    }

    fn required_aes(&self) -> &[&str] {
        &["x"]
    }

    fn default_aes(&self) -> Aes {
        Aes::new().y(after_stat("density"))
    }

    fn default_params(&self) -> Params {
        Params::new()
            .with("kernel", "gaussian")
            .with("adjust", 1.0)
            .with("n", 512.0)
            .with("trim", false)
            .with("bw", "nrd0")
    }

    fn setup_params(&self, _data: &DataFrame, params: Params) -> Result<Params> {
        check_params("stat_density", &params)?;
        Ok(params)
    }

    fn compute_group(&self, data: &DataFrame, scales: PanelScales<'_>, params: &Params) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(DataFrame::new());
        }
        let x = numeric(data, "x", self.name())?;
        let pairs = weighted(&x, data);
        let values: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let range = if params.bool("trim").unwrap_or(false) {
            crate::scale::breaks::finite_range(&values)
        } else {
            scales.x.and_then(|s| s.continuous_limits())
        }
        .or_else(|| crate::scale::breaks::finite_range(&values))
        .unwrap_or((0.0, 1.0));
        kde(&pairs, range, params)
    }
}

/// Validate the kernel and the bandwidth adjustment.
pub(super) fn check_params(component: &str, params: &Params) -> Result<()> {
    let kernel = params.str("kernel").unwrap_or("gaussian");
    if !KERNELS.contains(&kernel) {
        return Err(Error::invalid_parameter(
            component,
            "kernel",
            format!("expected one of {}", KERNELS.join(", ")),
        ));
    }
    if params.f64("adjust").is_some_and(|a| a <= 0.0) {
        return Err(Error::invalid_parameter(component, "adjust", "must be positive"));
    }
    Ok(())
}

/// Finite values paired with their row weights.
pub(super) fn weighted(values: &[f64], data: &DataFrame) -> Vec<(f64, f64)> {
    values
        .iter()
        .copied()
        .zip(super::weights(data))
        .filter(|(v, _)| v.is_finite())
        .collect()
}

/// Weighted kernel density of `(value, weight)` pairs on an even grid
/// over `range`. The grid lands in column `x`.
///
/// Fewer than three values give one row per value instead of a grid.
pub(super) fn kde(pairs: &[(f64, f64)], range: (f64, f64), params: &Params) -> Result<DataFrame> {
    let n = pairs.len();
    let total: f64 = pairs.iter().map(|p| p.1).sum();
    if n == 0 || total <= 0.0 {
        return Ok(DataFrame::new());
    }

    if n < 3 {
        let max_w = pairs.iter().fold(0.0f64, |a, p| a.max(p.1));
        return frame(vec![
            ("x", pairs.iter().map(|p| p.0).collect()),
            ("density", pairs.iter().map(|p| p.1 / total).collect()),
            ("scaled", pairs.iter().map(|p| p.1 / max_w).collect()),
            ("ndensity", pairs.iter().map(|p| p.1 / max_w).collect()),
            ("count", vec![1.0; n]),
            ("n", vec![n as f64; n]),
        ]);
    }

    let values: Vec<f64> = pairs.iter().map(|p| p.0).collect();
    let bw = match params.get("bw") {
        Some(DataValue::Number(v)) if *v > 0.0 => *v,
        Some(DataValue::Text(rule)) if rule == "nrd" => nrd(&values),
        _ => nrd0(&values),
    } * params.f64("adjust").unwrap_or(1.0);

    let grid_n = params.usize("n").unwrap_or(512).max(2);
    let kernel = params.str("kernel").unwrap_or("gaussian");
    let step = (range.1 - range.0) / (grid_n - 1) as f64;
    let grid: Vec<f64> = (0..grid_n).map(|i| range.0 + i as f64 * step).collect();
    let density: Vec<f64> = grid
        .iter()
        .map(|g| {
            pairs
                .iter()
                .map(|(xi, wi)| wi * kernel_value(kernel, (g - xi) / bw))
                .sum::<f64>()
                / (total * bw)
        })
        .collect();
    let max = density.iter().fold(0.0f64, |a, d| a.max(*d));
    let scaled: Vec<f64> = density
        .iter()
        .map(|d| if max > 0.0 { d / max } else { 0.0 })
        .collect();
    frame(vec![
        ("x", grid),
        ("count", density.iter().map(|d| d * n as f64).collect()),
        ("density", density),
        ("ndensity", scaled.clone()),
        ("scaled", scaled),
        ("n", vec![n as f64; grid_n]),
    ])
}

/// Kernel functions scaled to unit standard deviation.
fn kernel_value(kernel: &str, u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.506_628_274_631_000_2;
    match kernel {
        "epanechnikov" => {
            let a = 5f64.sqrt();
            if u.abs() < a {
                3.0 / (4.0 * a) * (1.0 - u * u / 5.0)
            } else {
                0.0
            }
        }
        "rectangular" => {
            let a = 3f64.sqrt();
            if u.abs() < a {
                0.5 / a
            } else {
                0.0
            }
        }
        "triangular" => {
            let a = 6f64.sqrt();
            if u.abs() < a {
                (1.0 - u.abs() / a) / a
            } else {
                0.0
            }
        }
        "biweight" => {
            let a = 7f64.sqrt();
            if u.abs() < a {
                let t = u / a;
                15.0 / (16.0 * a) * (1.0 - t * t).powi(2)
            } else {
                0.0
            }
        }
        "cosine" => {
            let a = 1.0 / (1.0 / 3.0 - 2.0 / (std::f64::consts::PI * std::f64::consts::PI)).sqrt();
            if u.abs() < a {
                (1.0 + (std::f64::consts::PI * u / a).cos()) / (2.0 * a)
            } else {
                0.0
            }
        }
        _ => (-0.5 * u * u).exp() / SQRT_2PI,
    }
}

fn spread(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sd = (values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let iqr = percentile(&sorted, 0.75) - percentile(&sorted, 0.25);
    (sd, iqr)
}

/// Silverman's rule of thumb, `0.9 min(sd, IQR/1.34) n^-1/5`, with
/// fallbacks for degenerate data.
#[must_use]
pub fn nrd0(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 1.0;
    }
    let (sd, iqr) = spread(values);
    let mut lo = sd.min(iqr / 1.34);
    if lo <= 0.0 {
        lo = sd;
    }
    if lo <= 0.0 {
        lo = values[0].abs();
    }
    if lo <= 0.0 {
        lo = 1.0;
    }
    0.9 * lo * (values.len() as f64).powf(-0.2)
}

/// Scott's variant, `1.06 min(sd, IQR/1.34) n^-1/5`.
fn nrd(values: &[f64]) -> f64 {
    let (sd, iqr) = spread(values);
    let h = sd.min(iqr / 1.34);
    if h > 0.0 {
        1.06 * h * (values.len() as f64).powf(-0.2)
    } else {
        nrd0(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn compute(x: Vec<f64>, params: Params) -> DataFrame {
        let df = DataFrame::new().with_column("x", x).unwrap();
        let params = params.or_defaults(&DensityStat.default_params());
        DensityStat
            .compute_group(&df, PanelScales::default(), &params)
            .unwrap()
    }

    #[test]
    fn test_density_integrates_to_one() {
        let x: Vec<f64> = (0..50).map(|i| f64::from(i) / 10.0).collect();
        let out = compute(x, Params::new().with("trim", false));
        let grid = out.numbers("x").unwrap();
        let d = out.numbers("density").unwrap();
        assert_eq!(grid.len(), 512);
        let step = grid[1] - grid[0];
        let area: f64 = d.iter().sum::<f64>() * step;
        // grid only spans the data range, so the tails are cut
        assert!(area > 0.8 && area <= 1.0);
        assert_relative_eq!(out.numbers("scaled").unwrap().iter().fold(0.0f64, |a, b| a.max(*b)), 1.0);
    }

    #[test]
    fn test_kernels_are_densities() {
        for k in KERNELS {
            let step = 0.001;
            let area: f64 = (-10_000..10_000)
                .map(|i| kernel_value(k, f64::from(i) * step) * step)
                .sum();
            assert_relative_eq!(area, 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_small_groups() {
        let out = compute(vec![1.0, 2.0], Params::new());
        assert_eq!(out.nrow(), 2);
        assert_eq!(out.numbers("density").unwrap(), &[0.5, 0.5]);
    }

    #[test]
    fn test_nrd0() {
        assert_eq!(nrd0(&[1.0]), 1.0);
        let constant = nrd0(&[2.0, 2.0, 2.0]);
        assert!(constant > 0.0);
        let bw = nrd0(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        // sd = 1.58, IQR/1.34 = 1.49
        assert_relative_eq!(bw, 0.9 * 2.0 / 1.34 * 5f64.powf(-0.2), epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_kernel() {
        let p = Params::new().with("kernel", "spiky");
        assert!(DensityStat.setup_params(&DataFrame::new(), p).is_err());
    }
}
