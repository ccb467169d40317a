//! Empirical cumulative distribution.

use super::{frame, numeric, weights, StatCompute};
use crate::data::DataFrame;
use crate::error::{Error, Result};
use crate::grammar::aes::{after_stat, Aes};
use crate::grammar::layout::PanelScales;
use crate::grammar::params::Params;
use crate::scale::breaks::finite_range;

/// Share of the (weighted) observations at or below every x.
///
/// Evaluated at the distinct values of x, or at `n` evenly spaced points
/// when `n` is set. With `pad`, rows at negative and positive infinity
/// with 0 and 1 extend the step to the panel edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcdfStat;

impl StatCompute for EcdfStat {
    fn name(&self) -> &str {
        "ecdf"
    }

    fn required_aes(&self) -> &[&str] {
        &["x"]
    }

    fn default_aes(&self) -> Aes {
        Aes::new().y(after_stat("ecdf"))
    }

    fn default_params(&self) -> Params {
        Params::new().with("pad", true)
    }

    fn extra_params(&self) -> &[&str] {
        &["n"]
    }

    fn setup_params(&self, _data: &DataFrame, params: Params) -> Result<Params> {
        if let Some(n) = params.f64("n") {
            if n.is_nan() || n < 1.0 {
                return Err(Error::invalid_parameter("stat_ecdf", "n", "must be at least 1"));
            }
        }
        Ok(params)
    }

    fn compute_group(&self, data: &DataFrame, _scales: PanelScales<'_>, params: &Params) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(DataFrame::new());
        }
        let x = numeric(data, "x", self.name())?;
        let mut pairs: Vec<(f64, f64)> = x.iter().copied().zip(weights(data)).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let total: f64 = pairs.iter().map(|p| p.1).sum();

        let mut xs: Vec<f64> = match params.f64("n") {
            Some(n) => {
                let n = n as usize;
                let (lo, hi) = finite_range(&x).unwrap_or((0.0, 0.0));
                if n == 1 || hi <= lo {
                    vec![lo]
                } else {
                    (0..n).map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64).collect()
                }
            }
            None => {
                let mut v: Vec<f64> = pairs.iter().map(|p| p.0).collect();
                v.dedup();
                v
            }
        };
        // running sum over sorted x, read off at every evaluation point
        let mut cumulative = Vec::with_capacity(xs.len());
        let mut seen = 0.0;
        let mut next = 0;
        for xi in &xs {
            while next < pairs.len() && pairs[next].0 <= *xi {
                seen += pairs[next].1;
                next += 1;
            }
            cumulative.push(if total > 0.0 { seen / total } else { 0.0 });
        }
        if params.bool("pad").unwrap_or(true) {
            xs.insert(0, f64::NEG_INFINITY);
            cumulative.insert(0, 0.0);
            xs.push(f64::INFINITY);
            cumulative.push(1.0);
        }
        frame(vec![("x", xs), ("ecdf", cumulative)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        DataFrame::new().with_column("x", vec![3.0, 1.0, 2.0, 2.0]).unwrap()
    }

    #[test]
    fn test_steps_at_distinct_values() {
        let params = Params::new().with("pad", false);
        let out = EcdfStat.compute_group(&sample(), PanelScales::default(), &params).unwrap();
        assert_eq!(out.numbers("x").unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(out.numbers("ecdf").unwrap(), &[0.25, 0.75, 1.0]);
    }

    #[test]
    fn test_padding_reaches_both_ends() {
        let out = EcdfStat
            .compute_group(&sample(), PanelScales::default(), &EcdfStat.default_params())
            .unwrap();
        let x = out.numbers("x").unwrap();
        assert_eq!(x.len(), 5);
        assert_eq!(x[0], f64::NEG_INFINITY);
        assert_eq!(x[4], f64::INFINITY);
        let e = out.numbers("ecdf").unwrap();
        assert_eq!((e[0], e[4]), (0.0, 1.0));
    }

    #[test]
    fn test_even_grid_and_weights() {
        let df = sample().with_column("weight", vec![1.0, 1.0, 0.0, 2.0]).unwrap();
        let params = Params::new().with("pad", false).with("n", 5.0);
        let out = EcdfStat.compute_group(&df, PanelScales::default(), &params).unwrap();
        assert_eq!(out.numbers("x").unwrap(), &[1.0, 1.5, 2.0, 2.5, 3.0]);
        assert_eq!(out.numbers("ecdf").unwrap(), &[0.25, 0.25, 0.75, 0.75, 1.0]);
    }

    #[test]
    fn test_rejects_empty_grid() {
        let p = Params::new().with("n", 0.0);
        assert!(EcdfStat.setup_params(&DataFrame::new(), p).is_err());
    }
}
