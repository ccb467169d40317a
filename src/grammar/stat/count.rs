//! Counting statistics.

use super::{frame, numeric, resolution, weights, StatCompute};
use crate::data::{Column, DataFrame};
use crate::error::Result;
use crate::grammar::aes::{after_stat, Aes};
use crate::grammar::layout::PanelScales;
use crate::grammar::params::Params;

/// Number of rows (sum of weights) at each distinct x.
///
/// Produces `count`, `prop` and `width`; bars default to
/// `y = after_stat(count)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountStat;

impl StatCompute for CountStat {
    fn name(&self) -> &str {
        "count"
    }

    fn required_aes(&self) -> &[&str] {
        &["x"]
    }

    fn default_aes(&self) -> Aes {
        Aes::new().y(after_stat("count"))
    }

    fn extra_params(&self) -> &[&str] {
        &["width"]
    }

    fn compute_group(&self, data: &DataFrame, _scales: PanelScales<'_>, params: &Params) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(DataFrame::new());
        }
        let x = numeric(data, "x", self.name())?;
        let w = weights(data);

        let mut pairs: Vec<(f64, f64)> = x.iter().copied().zip(w).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut xs: Vec<f64> = Vec::new();
        let mut counts: Vec<f64> = Vec::new();
        for (xi, wi) in pairs {
            match xs.last() {
                Some(last) if *last == xi => {
                    if let Some(c) = counts.last_mut() {
                        *c += wi;
                    }
                }
                _ => {
                    xs.push(xi);
                    counts.push(wi);
                }
            }
        }
        let total: f64 = counts.iter().sum();
        let prop = counts.iter().map(|c| if total > 0.0 { c / total } else { 0.0 }).collect();
        let width = params
            .f64("width")
            .unwrap_or_else(|| resolution(&x, false) * 0.9);
        let n = xs.len();
        frame(vec![
            ("x", xs),
            ("count", counts),
            ("prop", prop),
            ("width", vec![width; n]),
        ])
    }
}

/// Number of observations at each distinct position.
///
/// Rows are collapsed over every column except `weight`; `n` holds the
/// count and `prop` its share within the group. Points default to
/// `size = after_stat(n)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumStat;

impl StatCompute for SumStat {
    fn name(&self) -> &str {
        "sum"
    }

    fn required_aes(&self) -> &[&str] {
        &["x", "y"]
    }

    fn default_aes(&self) -> Aes {
        Aes::new().size(after_stat("n"))
    }

    fn compute_panel(&self, data: &DataFrame, _scales: PanelScales<'_>, _params: &Params) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(DataFrame::new());
        }
        let w = weights(data);
        let keys: Vec<&str> = data
            .column_names()
            .iter()
            .map(String::as_str)
            .filter(|n| *n != "weight")
            .collect();
        let combos = data.group_indices(&keys);
        let firsts: Vec<usize> = combos.iter().map(|idx| idx[0]).collect();
        let n: Vec<f64> = combos
            .iter()
            .map(|idx| idx.iter().map(|&i| w[i]).sum())
            .collect();

        let mut out = data.take(&firsts);
        out.remove("weight");
        let group: Vec<f64> = out
            .numbers("group")
            .map_or_else(|| vec![0.0; out.nrow()], <[f64]>::to_vec);
        let prop = n
            .iter()
            .zip(&group)
            .map(|(ni, g)| {
                let total: f64 = n
                    .iter()
                    .zip(&group)
                    .filter(|(_, h)| *h == g)
                    .map(|(m, _)| m)
                    .sum();
                ni / total
            })
            .collect();
        out.insert("n", Column::Number(n))?;
        out.insert("prop", Column::Number(prop))?;
        Ok(out)
    }

    fn compute_group(&self, data: &DataFrame, scales: PanelScales<'_>, params: &Params) -> Result<DataFrame> {
        self.compute_panel(data, scales, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_by_x() {
        let df = DataFrame::new()
            .with_column("x", vec![2.0, 1.0, 2.0, 3.0, 2.0])
            .unwrap();
        let out = CountStat
            .compute_group(&df, PanelScales::default(), &Params::new())
            .unwrap();
        assert_eq!(out.numbers("x").unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(out.numbers("count").unwrap(), &[1.0, 3.0, 1.0]);
        assert_eq!(out.numbers("prop").unwrap(), &[0.2, 0.6, 0.2]);
        assert_eq!(out.numbers("width").unwrap(), &[0.9; 3]);
    }

    #[test]
    fn test_count_weighted() {
        let df = DataFrame::new()
            .with_column("x", vec![1.0, 1.0])
            .unwrap()
            .with_column("weight", vec![2.0, 3.0])
            .unwrap();
        let params = Params::new().with("width", 0.5);
        let out = CountStat.compute_group(&df, PanelScales::default(), &params).unwrap();
        assert_eq!(out.numbers("count").unwrap(), &[5.0]);
        assert_eq!(out.numbers("width").unwrap(), &[0.5]);
    }

    #[test]
    fn test_sum_collapses_duplicates() {
        let df = DataFrame::new()
            .with_column("x", vec![1.0, 1.0, 2.0])
            .unwrap()
            .with_column("y", vec![5.0, 5.0, 5.0])
            .unwrap()
            .with_column("group", vec![-1.0; 3])
            .unwrap();
        let out = SumStat
            .compute_panel(&df, PanelScales::default(), &Params::new())
            .unwrap();
        assert_eq!(out.nrow(), 2);
        assert_eq!(out.numbers("n").unwrap(), &[2.0, 1.0]);
        let prop = out.numbers("prop").unwrap();
        assert!((prop[0] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_groups() {
        let empty = DataFrame::new();
        assert!(CountStat
            .compute_group(&empty, PanelScales::default(), &Params::new())
            .unwrap()
            .is_empty());
        assert!(SumStat
            .compute_panel(&empty, PanelScales::default(), &Params::new())
            .unwrap()
            .is_empty());
    }
}
