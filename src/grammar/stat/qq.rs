//! Quantile-quantile statistics.

use super::smooth::normal_quantile;
use super::{frame, numeric, StatCompute};
use crate::data::DataFrame;
use crate::error::{Error, Result};
use crate::grammar::aes::{after_stat, Aes};
use crate::grammar::layout::PanelScales;
use crate::grammar::params::Params;

fn check_distribution(component: &str, params: &Params) -> Result<()> {
    match params.str("distribution").unwrap_or("norm") {
        "norm" => Ok(()),
        other => Err(Error::invalid_parameter(
            component,
            "distribution",
            format!("unsupported distribution '{other}', expected norm"),
        )),
    }
}

/// Filliben's estimate of the order statistic medians.
fn plotting_positions(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![0.5];
    }
    let nf = n as f64;
    let last = 0.5f64.powf(1.0 / nf);
    (1..=n)
        .map(|i| match i {
            1 => 1.0 - last,
            i if i == n => last,
            i => (i as f64 - 0.3175) / (nf + 0.365),
        })
        .collect()
}

/// Sorted sample and its theoretical normal quantiles.
fn quantiles(data: &DataFrame, stat: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut sample = numeric(data, "sample", stat)?.into_owned();
    sample.sort_by(f64::total_cmp);
    let theoretical = plotting_positions(sample.len())
        .into_iter()
        .map(normal_quantile)
        .collect();
    Ok((theoretical, sample))
}

/// Sample quantile with plotting positions `(i - 0.4) / (n + 0.2)`.
fn sample_quantile(sorted: &[f64], p: f64) -> f64 {
    const ALPHA: f64 = 0.4;
    const BETA: f64 = 0.4;
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let aleph = n as f64 * p + ALPHA + p * (1.0 - ALPHA - BETA);
    let k = aleph.clamp(1.0, (n - 1) as f64).floor();
    let gamma = (aleph - k).clamp(0.0, 1.0);
    let k = k as usize;
    (1.0 - gamma) * sorted[k - 1] + gamma * sorted[k]
}

/// Sample quantiles against the quantiles of a normal distribution.
///
/// Requires `sample`; produces `theoretical` and `sample`, mapped to x and
/// y by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct QqStat;

impl StatCompute for QqStat {
    fn name(&self) -> &str {
        "qq"
    }

    fn required_aes(&self) -> &[&str] {
        &["sample"]
    }

    fn default_aes(&self) -> Aes {
        Aes::new().x(after_stat("theoretical")).y(after_stat("sample"))
    }

    fn default_params(&self) -> Params {
        Params::new().with("distribution", "norm")
    }

    fn setup_params(&self, _data: &DataFrame, params: Params) -> Result<Params> {
        check_distribution("stat_qq", &params)?;
        Ok(params)
    }

    fn compute_group(&self, data: &DataFrame, _scales: PanelScales<'_>, _params: &Params) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(DataFrame::new());
        }
        let (theoretical, sample) = quantiles(data, self.name())?;
        frame(vec![("theoretical", theoretical), ("sample", sample)])
    }
}

/// Reference line of a quantile-quantile plot.
///
/// The line passes through the first and third quartiles of the sample
/// against the same quartiles of the distribution. It spans the
/// theoretical quantiles, or the whole x scale with `fullrange`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QqLineStat;

impl StatCompute for QqLineStat {
    fn name(&self) -> &str {
        "qq_line"
    }

    fn required_aes(&self) -> &[&str] {
        &["sample"]
    }

    fn default_params(&self) -> Params {
        Params::new().with("distribution", "norm").with("fullrange", false)
    }

    fn setup_params(&self, _data: &DataFrame, params: Params) -> Result<Params> {
        check_distribution("stat_qq_line", &params)?;
        Ok(params)
    }

    fn compute_group(&self, data: &DataFrame, scales: PanelScales<'_>, params: &Params) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(DataFrame::new());
        }
        let (theoretical, sample) = quantiles(data, self.name())?;
        let (x1, x2) = (normal_quantile(0.25), normal_quantile(0.75));
        let (y1, y2) = (sample_quantile(&sample, 0.25), sample_quantile(&sample, 0.75));
        let slope = (y2 - y1) / (x2 - x1);
        let intercept = y1 - slope * x1;

        let (lo, hi) = match scales.x {
            Some(scale) if params.bool("fullrange").unwrap_or(false) => scale.dimension(),
            _ => (theoretical[0], theoretical[theoretical.len() - 1]),
        };
        frame(vec![
            ("x", vec![lo, hi]),
            ("y", vec![slope * lo + intercept, slope * hi + intercept]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(values: Vec<f64>) -> DataFrame {
        DataFrame::new().with_column("sample", values).unwrap()
    }

    #[test]
    fn test_theoretical_quantiles_are_symmetric() {
        let out = QqStat
            .compute_group(&sample(vec![5.0, 1.0, 3.0]), PanelScales::default(), &Params::new())
            .unwrap();
        assert_eq!(out.numbers("sample").unwrap(), &[1.0, 3.0, 5.0]);
        let t = out.numbers("theoretical").unwrap();
        assert_relative_eq!(t[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(t[0], -t[2], epsilon = 1e-9);
        // Filliben: 1 - 0.5^(1/3)
        assert_relative_eq!(t[0], normal_quantile(1.0 - 0.5f64.powf(1.0 / 3.0)), epsilon = 1e-12);
    }

    #[test]
    fn test_line_through_quartiles() {
        // a perfectly linear sample gives the line y = 2x + 1 on its quartiles
        let n = 101;
        let theoretical: Vec<f64> = plotting_positions(n).into_iter().map(normal_quantile).collect();
        let values: Vec<f64> = theoretical.iter().map(|t| 2.0 * t + 1.0).collect();
        let out = QqLineStat
            .compute_group(&sample(values), PanelScales::default(), &QqLineStat.default_params())
            .unwrap();
        let x = out.numbers("x").unwrap();
        let y = out.numbers("y").unwrap();
        assert_eq!(x, &[theoretical[0], theoretical[n - 1]]);
        assert_relative_eq!(y[0], 2.0 * x[0] + 1.0, epsilon = 0.05);
        assert_relative_eq!(y[1], 2.0 * x[1] + 1.0, epsilon = 0.05);
    }

    #[test]
    fn test_sample_quantile() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(sample_quantile(&v, 0.5), 3.0);
        assert_relative_eq!(sample_quantile(&[7.0], 0.25), 7.0);
    }

    #[test]
    fn test_other_distributions_rejected() {
        let p = Params::new().with("distribution", "t");
        let err = QqStat.setup_params(&DataFrame::new(), p).unwrap_err();
        assert!(err.to_string().contains("distribution"));
    }
}
