//! Densities of y for violins.

use super::density::{check_params, kde, weighted};
use super::{compute_by_group, numeric, StatCompute};
use crate::data::{Column, DataFrame};
use crate::error::{Error, Result};
use crate::grammar::layout::PanelScales;
use crate::grammar::params::Params;
use crate::scale::breaks::finite_range;

const SCALES: &[&str] = &["area", "count", "width"];

/// Kernel density of y within every group, laid out along x.
///
/// Besides the columns of the density statistic it produces
/// `violinwidth`, the half-width of a violin relative to its slot. The
/// `scale` parameter decides how violins compare: `area` gives all of
/// them the same area, `count` makes the area follow the number of
/// observations and `width` gives them the same maximum width.
#[derive(Debug, Clone, Copy, Default)]
pub struct YdensityStat;

impl StatCompute for YdensityStat {
    fn name(&self) -> &str {
        "ydensity"
    }

    fn required_aes(&self) -> &[&str] {
        &["x", "y"]
    }

    fn default_params(&self) -> Params {
        Params::new()
            .with("kernel", "gaussian")
            .with("adjust", 1.0)
            .with("n", 1024.0)
            .with("trim", true)
            .with("bw", "nrd0")
            .with("scale", "area")
    }

    fn setup_params(&self, _data: &DataFrame, params: Params) -> Result<Params> {
        check_params("stat_ydensity", &params)?;
        let scale = params.str("scale").unwrap_or("area");
        if !SCALES.contains(&scale) {
            return Err(Error::invalid_parameter(
                "stat_ydensity",
                "scale",
                format!("expected one of {}", SCALES.join(", ")),
            ));
        }
        Ok(params)
    }

    /// A single violin needs no x.
    fn setup_data(&self, mut data: DataFrame, _params: &Params) -> Result<DataFrame> {
        if !data.has_column("x") {
            let n = data.nrow();
            data.insert("x", Column::Number(vec![0.0; n]))?;
        }
        Ok(data)
    }

    fn compute_panel(&self, data: &DataFrame, scales: PanelScales<'_>, params: &Params) -> Result<DataFrame> {
        let mut out = compute_by_group(self, data, scales, params)?;
        if out.is_empty() {
            return Ok(out);
        }
        let density = numeric(&out, "density", self.name())?.into_owned();
        let max_density = density.iter().fold(0.0f64, |a, d| a.max(*d));
        let relative = |d: f64| if max_density > 0.0 { d / max_density } else { 0.0 };
        let width: Vec<f64> = match params.str("scale").unwrap_or("area") {
            "count" => {
                let n = numeric(&out, "n", self.name())?;
                let max_n = n.iter().fold(0.0f64, |a, v| a.max(*v));
                density
                    .iter()
                    .zip(n.iter())
                    .map(|(d, k)| relative(*d) * if max_n > 0.0 { k / max_n } else { 0.0 })
                    .collect()
            }
            "width" => numeric(&out, "scaled", self.name())?.into_owned(),
            _ => density.iter().map(|d| relative(*d)).collect(),
        };
        out.insert("violinwidth", Column::Number(width))?;
        Ok(out)
    }

    fn compute_group(&self, data: &DataFrame, scales: PanelScales<'_>, params: &Params) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(DataFrame::new());
        }
        let y = numeric(data, "y", self.name())?;
        let pairs = weighted(&y, data);
        let values: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let range = if params.bool("trim").unwrap_or(true) {
            finite_range(&values)
        } else {
            scales.y.and_then(|s| s.continuous_limits())
        }
        .or_else(|| finite_range(&values))
        .unwrap_or((0.0, 1.0));

        let mut out = kde(&pairs, range, params)?;
        if out.is_empty() {
            return Ok(out);
        }
        out.rename("x", "y");
        let x = numeric(data, "x", self.name())?;
        let (lo, hi) = finite_range(&x).unwrap_or((0.0, 0.0));
        let n = out.nrow();
        out.insert("x", Column::Number(vec![(lo + hi) / 2.0; n]))?;
        if hi > lo {
            out.insert("width", Column::Number(vec![(hi - lo) * 0.9; n]))?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::facet::Facet;
    use crate::grammar::layout::Layout;
    use crate::grammar::stat::Stat;
    use crate::warning::Warnings;
    use approx::assert_relative_eq;

    fn violins() -> DataFrame {
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut group = Vec::new();
        for i in 0..40 {
            x.push(1.0);
            y.push(f64::from(i % 10));
            group.push(1.0);
        }
        for i in 0..10 {
            x.push(2.0);
            y.push(f64::from(i) * 2.0);
            group.push(2.0);
        }
        DataFrame::new()
            .with_column("x", x)
            .unwrap()
            .with_column("y", y)
            .unwrap()
            .with_column("group", group)
            .unwrap()
    }

    fn compute(stat: &Stat, df: &DataFrame) -> DataFrame {
        let (layout, mut data) = Layout::setup(&Facet::null(), std::slice::from_ref(df)).unwrap();
        stat.compute_layer(&data.remove(0), &layout, &mut Warnings::new()).unwrap()
    }

    #[test]
    fn test_density_along_y_per_group() {
        let out = compute(&Stat::ydensity().param("n", 64.0).unwrap(), &violins());
        assert_eq!(out.nrow(), 128);
        let x = out.numbers("x").unwrap();
        assert_eq!(x[0], 1.0);
        assert_eq!(x[127], 2.0);
        // trimmed to each group's own range
        let y = out.numbers("y").unwrap();
        assert_relative_eq!(y[0], 0.0);
        assert_relative_eq!(y[63], 9.0, epsilon = 1e-9);
        assert_relative_eq!(y[64], 0.0);
        assert_relative_eq!(y[127], 18.0, epsilon = 1e-9);
    }

    #[test]
    fn test_area_scaling_peaks_at_one() {
        let out = compute(&Stat::ydensity().param("n", 64.0).unwrap(), &violins());
        let w = out.numbers("violinwidth").unwrap();
        assert_relative_eq!(w.iter().fold(0.0f64, |a, b| a.max(*b)), 1.0);
        // the wider group is flatter
        let peak = |range: std::ops::Range<usize>| w[range].iter().fold(0.0f64, |a, b| a.max(*b));
        assert!(peak(64..128) < peak(0..64));
    }

    #[test]
    fn test_width_scaling_and_count_scaling() {
        let wide = Stat::ydensity().param("n", 32.0).unwrap().param("scale", "width").unwrap();
        let out = compute(&wide, &violins());
        let w = out.numbers("violinwidth").unwrap();
        let peak = |range: std::ops::Range<usize>| w[range].iter().fold(0.0f64, |a, b| a.max(*b));
        assert_relative_eq!(peak(0..32), 1.0);
        assert_relative_eq!(peak(32..64), 1.0);

        let counted = Stat::ydensity().param("n", 32.0).unwrap().param("scale", "count").unwrap();
        let out = compute(&counted, &violins());
        let w = out.numbers("violinwidth").unwrap();
        let peak = |range: std::ops::Range<usize>| w[range].iter().fold(0.0f64, |a, b| a.max(*b));
        assert!(peak(32..64) < 0.25 * 1.01);
    }

    #[test]
    fn test_single_violin_without_x() {
        let df = DataFrame::new()
            .with_column("y", vec![1.0, 2.0, 2.5, 3.0, 5.0])
            .unwrap()
            .with_column("group", vec![-1.0; 5])
            .unwrap();
        let out = compute(&Stat::ydensity().param("n", 16.0).unwrap(), &df);
        assert_eq!(out.nrow(), 16);
        assert!(out.numbers("x").unwrap().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_rejects_unknown_scale() {
        let p = YdensityStat.default_params().with("scale", "volume");
        assert!(YdensityStat.setup_params(&DataFrame::new(), p).is_err());
    }
}
