//! Summaries of y at each x.

use super::{frame, numeric, percentile, resolution, weights, StatCompute};
use crate::data::{Column, DataFrame};
use crate::error::{Error, Result};
use crate::grammar::layout::PanelScales;
use crate::grammar::params::Params;

/// Box-and-whisker summary of y.
///
/// Produces `lower`, `middle`, `upper` (quartiles), `ymin`/`ymax`
/// (whisker ends: the most extreme observations within `coef` IQRs of the
/// hinges), `notchlower`/`notchupper`, `n_outliers`, `relvarwidth` and
/// `width`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxplotStat;

impl StatCompute for BoxplotStat {
    fn name(&self) -> &str {
        "boxplot"
    }

    fn required_aes(&self) -> &[&str] {
        &["x", "y"]
    }

    fn default_params(&self) -> Params {
        Params::new().with("coef", 1.5)
    }

    fn extra_params(&self) -> &[&str] {
        &["width"]
    }

    fn setup_params(&self, data: &DataFrame, mut params: Params) -> Result<Params> {
        if !params.contains("width") {
            let x = data.get("x").and_then(Column::to_numbers).unwrap_or_default();
            params.set("width", resolution(&x, false) * 0.75);
        }
        Ok(params)
    }

    fn compute_group(&self, data: &DataFrame, _scales: PanelScales<'_>, params: &Params) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(DataFrame::new());
        }
        let x = numeric(data, "x", self.name())?;
        let mut y: Vec<f64> = numeric(data, "y", self.name())?
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        if y.is_empty() {
            return Ok(DataFrame::new());
        }
        y.sort_by(f64::total_cmp);

        let coef = params.f64("coef").unwrap_or(1.5);
        let q1 = percentile(&y, 0.25);
        let med = percentile(&y, 0.5);
        let q3 = percentile(&y, 0.75);
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - coef * iqr, q3 + coef * iqr);
        let whislo = y.iter().copied().find(|v| *v >= lo_fence).unwrap_or(q1);
        let whishi = y.iter().rev().copied().find(|v| *v <= hi_fence).unwrap_or(q3);
        let outliers = y.iter().filter(|v| **v < whislo || **v > whishi).count();

        let n: f64 = weights(data).iter().sum();
        let (xmin, xmax) = x
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), v| (a.min(*v), b.max(*v)));
        let width = if xmax > xmin {
            (xmax - xmin) * 0.9
        } else {
            params.f64("width").unwrap_or(0.75)
        };
        let notch = 1.58 * iqr / n.sqrt();

        frame(vec![
            ("ymin", vec![whislo]),
            ("lower", vec![q1]),
            ("middle", vec![med]),
            ("upper", vec![q3]),
            ("ymax", vec![whishi]),
            ("n_outliers", vec![outliers as f64]),
            ("notchupper", vec![med + notch]),
            ("notchlower", vec![med - notch]),
            ("x", vec![(xmin + xmax) / 2.0]),
            ("width", vec![width]),
            ("relvarwidth", vec![n.sqrt()]),
        ])
    }
}

/// Summary function applied to the y values at one x.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SummaryFun {
    MeanSe,
    MeanSdl,
    MedianHilow,
    MeanClNormal,
}

impl SummaryFun {
    const NAMES: &'static [&'static str] = &["mean_se", "mean_sdl", "median_hilow", "mean_cl_normal"];

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "mean_se" => Self::MeanSe,
            "mean_sdl" => Self::MeanSdl,
            "median_hilow" => Self::MedianHilow,
            "mean_cl_normal" => Self::MeanClNormal,
            _ => return None,
        })
    }

    /// `(y, ymin, ymax)` of sorted values.
    fn apply(self, sorted: &[f64], mult: Option<f64>, level: f64) -> (f64, f64, f64) {
        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let var_pop = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let sd = if n > 1.0 { (var_pop * n / (n - 1.0)).sqrt() } else { 0.0 };
        match self {
            Self::MeanSe => {
                let se = mult.unwrap_or(1.0) * (var_pop / n).sqrt();
                (mean, mean - se, mean + se)
            }
            Self::MeanSdl => {
                let h = mult.unwrap_or(2.0) * sd;
                (mean, mean - h, mean + h)
            }
            Self::MedianHilow => {
                let tail = (1.0 - level) / 2.0;
                (
                    percentile(sorted, 0.5),
                    percentile(sorted, tail),
                    percentile(sorted, 1.0 - tail),
                )
            }
            Self::MeanClNormal => {
                let h = super::smooth::normal_quantile(0.5 + level / 2.0) * sd / n.sqrt();
                (mean, mean - h, mean + h)
            }
        }
    }
}

/// Summary of y at each distinct x within a group.
///
/// `fun_data` picks the summary: `mean_se` (default), `mean_sdl`,
/// `median_hilow` or `mean_cl_normal`. Produces `y`, `ymin`, `ymax`
/// and `n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryStat;

impl StatCompute for SummaryStat {
    fn name(&self) -> &str {
        "summary"
    }

    fn required_aes(&self) -> &[&str] {
        &["x", "y"]
    }

    fn default_params(&self) -> Params {
        Params::new().with("fun_data", "mean_se").with("level", 0.95)
    }

    fn extra_params(&self) -> &[&str] {
        &["mult"]
    }

    fn setup_params(&self, _data: &DataFrame, params: Params) -> Result<Params> {
        let name = params.str("fun_data").unwrap_or("mean_se");
        if SummaryFun::from_name(name).is_none() {
            return Err(Error::invalid_parameter(
                "stat_summary",
                "fun_data",
                format!("expected one of {}", SummaryFun::NAMES.join(", ")),
            ));
        }
        Ok(params)
    }

    fn compute_group(&self, data: &DataFrame, _scales: PanelScales<'_>, params: &Params) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(DataFrame::new());
        }
        let fun = SummaryFun::from_name(params.str("fun_data").unwrap_or("mean_se")).unwrap_or(SummaryFun::MeanSe);
        let mult = params.f64("mult");
        let level = params.f64("level").unwrap_or(0.95);
        let x = numeric(data, "x", self.name())?;
        let y = numeric(data, "y", self.name())?;

        let mut pairs: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        let mut cols: [Vec<f64>; 5] = Default::default();
        let mut start = 0;
        while start < pairs.len() {
            let at = pairs[start].0;
            let end = start + pairs[start..].iter().take_while(|p| p.0 == at).count();
            let ys: Vec<f64> = pairs[start..end].iter().map(|p| p.1).collect();
            let (m, lo, hi) = fun.apply(&ys, mult, level);
            for (col, v) in cols.iter_mut().zip([at, m, lo, hi, ys.len() as f64]) {
                col.push(v);
            }
            start = end;
        }
        let [xs, ys, ymin, ymax, n] = cols;
        frame(vec![("x", xs), ("y", ys), ("ymin", ymin), ("ymax", ymax), ("n", n)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn xy(x: Vec<f64>, y: Vec<f64>) -> DataFrame {
        DataFrame::new()
            .with_column("x", x)
            .unwrap()
            .with_column("y", y)
            .unwrap()
    }

    #[test]
    fn test_boxplot_five_numbers() {
        let y: Vec<f64> = (1..=9).map(f64::from).chain([40.0]).collect();
        let df = xy(vec![1.0; 10], y);
        let params = BoxplotStat
            .setup_params(&df, BoxplotStat.default_params())
            .unwrap();
        let out = BoxplotStat
            .compute_group(&df, PanelScales::default(), &params)
            .unwrap();
        assert_eq!(out.nrow(), 1);
        assert_relative_eq!(out.numbers("middle").unwrap()[0], 5.5);
        assert_relative_eq!(out.numbers("lower").unwrap()[0], 3.25);
        assert_relative_eq!(out.numbers("upper").unwrap()[0], 7.75);
        assert_eq!(out.numbers("ymin").unwrap(), &[1.0]);
        assert_eq!(out.numbers("ymax").unwrap(), &[9.0]);
        assert_eq!(out.numbers("n_outliers").unwrap(), &[1.0]);
        assert_eq!(out.numbers("width").unwrap(), &[0.75]);
        assert_relative_eq!(out.numbers("relvarwidth").unwrap()[0], 10f64.sqrt());
    }

    #[test]
    fn test_boxplot_width_from_resolution() {
        let df = xy(vec![1.0, 3.0], vec![1.0, 2.0]);
        let params = BoxplotStat.setup_params(&df, Params::new()).unwrap();
        assert_relative_eq!(params.f64("width").unwrap(), 1.5);
    }

    #[test]
    fn test_summary_mean_se() {
        let df = xy(vec![1.0, 1.0, 2.0, 2.0], vec![1.0, 3.0, 10.0, 10.0]);
        let params = SummaryStat.default_params();
        let out = SummaryStat
            .compute_group(&df, PanelScales::default(), &params)
            .unwrap();
        assert_eq!(out.numbers("x").unwrap(), &[1.0, 2.0]);
        assert_eq!(out.numbers("y").unwrap(), &[2.0, 10.0]);
        assert_relative_eq!(out.numbers("ymin").unwrap()[0], 2.0 - 0.5f64.sqrt());
        assert_relative_eq!(out.numbers("ymax").unwrap()[0], 2.0 + 0.5f64.sqrt());
        assert_eq!(out.numbers("ymin").unwrap()[1], 10.0);
        assert_eq!(out.numbers("n").unwrap(), &[2.0, 2.0]);
    }

    #[test]
    fn test_summary_median_hilow() {
        let df = xy(vec![0.0; 5], vec![5.0, 1.0, 3.0, 2.0, 4.0]);
        let params = Params::new()
            .with("fun_data", "median_hilow")
            .with("level", 0.5);
        let out = SummaryStat
            .compute_group(&df, PanelScales::default(), &params)
            .unwrap();
        assert_eq!(out.numbers("y").unwrap(), &[3.0]);
        assert_eq!(out.numbers("ymin").unwrap(), &[2.0]);
        assert_eq!(out.numbers("ymax").unwrap(), &[4.0]);
    }

    #[test]
    fn test_summary_rejects_unknown_function() {
        let params = Params::new().with("fun_data", "mode");
        assert!(SummaryStat.setup_params(&DataFrame::new(), params).is_err());
    }
}
