//! Statistical transformations for Grammar of Graphics.
//!
//! A statistic turns the rows of one group into derived rows: bin counts,
//! a smoothed curve, box summaries. Statistics run after position scales
//! were trained, once per panel and then once per group, and see the
//! trained x and y scales of their panel.
//!
//! Built-in statistics are constructed through [`Stat`]; user statistics
//! implement [`StatCompute`] and are wrapped with [`Stat::custom`].

mod bin;
mod boxplot;
mod count;
mod density;
mod ecdf;
mod qq;
mod smooth;
mod ydensity;

pub use bin::{assign_bins, breaks_from_bins, breaks_from_binwidth, BinStat};
pub use boxplot::{BoxplotStat, SummaryStat};
pub use count::{CountStat, SumStat};
pub use density::{nrd0, DensityStat};
pub use ecdf::EcdfStat;
pub use qq::{QqLineStat, QqStat};
pub use smooth::SmoothStat;
pub use ydensity::YdensityStat;

use super::aes::Aes;
use super::layout::{Layout, PanelScales};
use super::params::Params;
use crate::data::{Column, DataFrame, DataValue};
use crate::error::{Error, Result};
use crate::warning::{PlotWarning, Warnings};
use std::fmt;
use std::sync::Arc;

/// Parameters every statistic accepts.
const COMMON_PARAMS: &[&str] = &["na_rm"];

/// The computation behind a statistic.
///
/// Only [`StatCompute::name`] and [`StatCompute::compute_group`] are
/// required. The default [`StatCompute::compute_panel`] splits a panel by
/// `group`, computes every group and carries over columns that are
/// constant within the group.
pub trait StatCompute: Send + Sync + fmt::Debug {
    /// Short name, e.g. `bin`.
    fn name(&self) -> &str;

    /// Aesthetics that must be present before computing.
    fn required_aes(&self) -> &[&str] {
        &[]
    }

    /// Aesthetics the statistic produces, usually after-stat mappings.
    fn default_aes(&self) -> Aes {
        Aes::new()
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
    fn setup_params(&self, _data: &DataFrame, params: Params) -> Result<Params> {
        Ok(params)
    }

    /// Prepare layer data before computing.
    fn setup_data(&self, data: DataFrame, _params: &Params) -> Result<DataFrame> {
        Ok(data)
    }

    /// Compute one panel.
    fn compute_panel(&self, data: &DataFrame, scales: PanelScales<'_>, params: &Params) -> Result<DataFrame> {
        compute_by_group(self, data, scales, params)
    }

    /// Compute one group.
    fn compute_group(&self, data: &DataFrame, scales: PanelScales<'_>, params: &Params) -> Result<DataFrame>;

    /// Adjust the fully built layer data.
    fn finish_layer(&self, data: DataFrame, _params: &Params) -> Result<DataFrame> {
        Ok(data)
    }
}

/// Compute every group of a panel and carry over the columns that are
/// constant within the group.
pub fn compute_by_group<S: StatCompute + ?Sized>(
    stat: &S,
    data: &DataFrame,
    scales: PanelScales<'_>,
    params: &Params,
) -> Result<DataFrame> {
    let mut parts = Vec::new();
    for idx in data.group_indices(&["group"]) {
        let group = data.take(&idx);
        let mut out = stat.compute_group(&group, scales, params)?;
        if out.is_empty() {
            continue;
        }
        let repeat = vec![0; out.nrow()];
        for name in constant_columns(&group) {
            if let (false, Some(col)) = (out.has_column(&name), group.get(&name)) {
                out.insert(name.clone(), col.take(&repeat))?;
            }
        }
        parts.push(out);
    }
    Ok(DataFrame::concat(&parts))
}

/// Names of columns holding a single value across every row.
fn constant_columns(data: &DataFrame) -> Vec<String> {
    data.iter()
        .filter(|(_, col)| {
            let first = col.get(0);
            (1..col.len()).all(|i| col.get(i) == first)
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Output-only identity computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStat;

impl StatCompute for IdentityStat {
    fn name(&self) -> &str {
        "identity"
    }

    fn compute_panel(&self, data: &DataFrame, _: PanelScales<'_>, _: &Params) -> Result<DataFrame> {
        Ok(data.clone())
    }

    fn compute_group(&self, data: &DataFrame, _: PanelScales<'_>, _: &Params) -> Result<DataFrame> {
        Ok(data.clone())
    }
}

/// A statistic and its parameters.
#[derive(Clone)]
pub struct Stat {
    compute: Arc<dyn StatCompute>,
    params: Params,
}

impl fmt::Debug for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stat")
            .field("name", &self.name())
            .field("params", &self.params)
            .finish()
    }
}

impl Default for Stat {
    fn default() -> Self {
        Self::identity()
    }
}

impl Stat {
    /// Wrap a computation.
    #[must_use]
    pub fn custom(compute: impl StatCompute + 'static) -> Self {
        Self {
            compute: Arc::new(compute),
            params: Params::new(),
        }
    }

    /// No transformation.
    #[must_use]
    pub fn identity() -> Self {
        Self::custom(IdentityStat)
    }

    /// Count rows at each x.
    #[must_use]
    pub fn count() -> Self {
        Self::custom(CountStat)
    }

    /// Bin continuous x into intervals.
    #[must_use]
    pub fn bin() -> Self {
        Self::custom(BinStat)
    }

    /// Kernel density estimate of x.
    #[must_use]
    pub fn density() -> Self {
        Self::custom(DensityStat)
    }

    /// Five-number summaries of y.
    #[must_use]
    pub fn boxplot() -> Self {
        Self::custom(BoxplotStat)
    }

    /// Fitted curve with a confidence band.
    #[must_use]
    pub fn smooth() -> Self {
        Self::custom(SmoothStat)
    }

    /// Summary of y at each x.
    #[must_use]
    pub fn summary() -> Self {
        Self::custom(SummaryStat)
    }

    /// Number of observations at each (x, y).
    #[must_use]
    pub fn sum() -> Self {
        Self::custom(SumStat)
    }

    /// Density of y per x, for violins.
    #[must_use]
    pub fn ydensity() -> Self {
        Self::custom(YdensityStat)
    }

    /// Empirical cumulative distribution of x.
    #[must_use]
    pub fn ecdf() -> Self {
        Self::custom(EcdfStat)
    }

    /// Sample quantiles against normal quantiles.
    #[must_use]
    pub fn qq() -> Self {
        Self::custom(QqStat)
    }

    /// Line through the quartiles of a quantile-quantile plot.
    #[must_use]
    pub fn qq_line() -> Self {
        Self::custom(QqLineStat)
    }

    /// Look up a built-in statistic; the `stat_` prefix is optional.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name.strip_prefix("stat_").unwrap_or(name) {
            "identity" => Self::identity(),
            "count" => Self::count(),
            "bin" => Self::bin(),
            "density" => Self::density(),
            "boxplot" => Self::boxplot(),
            "smooth" => Self::smooth(),
            "summary" => Self::summary(),
            "sum" => Self::sum(),
            "ydensity" => Self::ydensity(),
            "ecdf" => Self::ecdf(),
            "qq" => Self::qq(),
            "qq_line" => Self::qq_line(),
            other => {
                return Err(Error::UnknownComponent {
                    kind: "stat",
                    name: other.to_string(),
                })
            }
        })
    }

    /// Short name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.compute.name()
    }

    /// Name used in messages, e.g. `stat_bin`.
    #[must_use]
    pub fn component(&self) -> String {
        format!("stat_{}", self.name())
    }

    /// Parameters set so far.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Names of accepted parameters.
    #[must_use]
    pub fn allowed_params(&self) -> Vec<String> {
        let defaults = self.compute.default_params();
        COMMON_PARAMS
            .iter()
            .chain(self.compute.extra_params())
            .map(|s| (*s).to_string())
            .chain(defaults.iter().map(|(k, _)| k.to_string()))
            .collect()
    }

    /// True when `key` is an accepted parameter.
    #[must_use]
    pub fn accepts(&self, key: &str) -> bool {
        self.allowed_params().iter().any(|p| p == key)
    }

    /// Set a parameter.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for names the statistic does not accept.
    pub fn param(mut self, key: &str, value: impl Into<DataValue>) -> Result<Self> {
        let allowed = self.allowed_params();
        let allowed: Vec<&str> = allowed.iter().map(String::as_str).collect();
        let component = self.component();
        self.params.set_checked(&component, &allowed, key, value)?;
        Ok(self)
    }

    /// Aesthetics that must be present.
    #[must_use]
    pub fn required_aes(&self) -> &[&str] {
        self.compute.required_aes()
    }

    /// Aesthetics the statistic produces.
    #[must_use]
    pub fn default_aes(&self) -> Aes {
        self.compute.default_aes()
    }

    /// Parameters with defaults filled in.
    #[must_use]
    pub fn resolved_params(&self) -> Params {
        self.params.clone().or_defaults(&self.compute.default_params())
    }

    /// Run the statistic over a layer.
    ///
    /// Required aesthetics are checked first. Rows with non-finite values
    /// in them are removed with a warning, then every panel is computed
    /// with its own trained scales. Empty data is returned unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::MissingAesthetics`] naming the statistic and what is
    /// missing; errors raised by the computation.
    pub fn compute_layer(&self, data: &DataFrame, layout: &Layout, warnings: &mut Warnings) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(data.clone());
        }
        let params = self.compute.setup_params(data, self.resolved_params())?;
        let data = self.compute.setup_data(data.clone(), &params)?;

        let missing: Vec<String> = self
            .required_aes()
            .iter()
            .filter(|ae| {
                !ae.split('|')
                    .any(|alt| data.has_column(alt) || params.contains(alt))
            })
            .map(|ae| (*ae).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingAesthetics {
                component: self.component(),
                missing,
            });
        }

        let data = remove_missing(&data, self.required_aes(), &self.component(), &params, warnings);
        if data.is_empty() {
            return Ok(data);
        }

        let mut parts = Vec::new();
        for idx in data.group_indices(&["PANEL"]) {
            let panel = data.take(&idx);
            let id = panel.numbers("PANEL").and_then(|p| p.first().copied()).unwrap_or(1.0);
            let scales = layout.panel_scales(id as usize);
            let mut out = self.compute.compute_panel(&panel, scales, &params)?;
            if !out.is_empty() && !out.has_column("PANEL") {
                out.insert("PANEL", Column::Number(vec![id; out.nrow()]))?;
            }
            parts.push(out);
        }
        tracing::trace!(stat = self.name(), panels = parts.len(), "statistic computed");
        Ok(DataFrame::concat(&parts))
    }

    /// Last adjustment of the built layer data.
    pub fn finish_layer(&self, data: DataFrame) -> Result<DataFrame> {
        let params = self.resolved_params();
        self.compute.finish_layer(data, &params)
    }
}

/// Drop rows that are missing or non-finite in any of `aesthetics`.
///
/// Raises [`PlotWarning::RowsRemoved`] unless `na_rm` is set.
pub(crate) fn remove_missing(
    data: &DataFrame,
    aesthetics: &[&str],
    component: &str,
    params: &Params,
    warnings: &mut Warnings,
) -> DataFrame {
    let columns: Vec<&Column> = aesthetics
        .iter()
        .flat_map(|ae| ae.split('|'))
        .filter_map(|ae| data.get(ae))
        .collect();
    let keep: Vec<bool> = (0..data.nrow())
        .map(|i| {
            columns.iter().all(|c| match c.as_numbers() {
                Some(v) => v[i].is_finite(),
                None => !c.is_missing(i),
            })
        })
        .collect();
    let removed = keep.iter().filter(|k| !**k).count();
    if removed == 0 {
        return data.clone();
    }
    if !params.bool("na_rm").unwrap_or(false) {
        warnings.push(PlotWarning::RowsRemoved {
            component: component.to_string(),
            count: removed,
            reason: "non-finite values",
        });
    }
    data.filter(&keep)
}

/// Smallest gap between distinct finite values; 1 when there is none.
///
/// With `zero`, 0 counts as one of the values.
#[must_use]
pub fn resolution(values: &[f64], zero: bool) -> f64 {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if zero {
        v.push(0.0);
    }
    v.sort_by(f64::total_cmp);
    v.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
    v.windows(2)
        .map(|w| w[1] - w[0])
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))))
        .unwrap_or(1.0)
}

/// Percentile of sorted data with linear interpolation between ranks.
#[must_use]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = p.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let w = rank - lo as f64;
            sorted[lo] * (1.0 - w) + sorted[hi] * w
        }
    }
}

/// Per-row weights: the `weight` column, or 1.
pub(crate) fn weights(data: &DataFrame) -> Vec<f64> {
    match data.numbers("weight") {
        Some(w) => w.iter().map(|v| if v.is_nan() { 1.0 } else { *v }).collect(),
        None => vec![1.0; data.nrow()],
    }
}

/// Numeric column by name, or an error naming the statistic.
pub(crate) fn numeric<'a>(data: &'a DataFrame, name: &str, stat: &str) -> Result<std::borrow::Cow<'a, [f64]>> {
    match data.get(name) {
        Some(col) => match col.as_numbers() {
            Some(v) => Ok(std::borrow::Cow::Borrowed(v)),
            None => col.to_numbers().map(std::borrow::Cow::Owned).ok_or_else(|| {
                Error::Data(format!(
                    "stat_{stat} requires a continuous '{name}', got {}",
                    col.type_name()
                ))
            }),
        },
        None => Err(Error::MissingAesthetics {
            component: format!("stat_{stat}"),
            missing: vec![name.to_string()],
        }),
    }
}

/// Build a numeric frame from named vectors.
pub(crate) fn frame(columns: Vec<(&str, Vec<f64>)>) -> Result<DataFrame> {
    DataFrame::from_columns(
        columns
            .into_iter()
            .map(|(n, v)| (n, Column::Number(v)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::facet::Facet;

    fn layout_for(df: &DataFrame) -> (Layout, DataFrame) {
        let (layout, mut data) = Layout::setup(&Facet::null(), std::slice::from_ref(df)).unwrap();
        (layout, data.remove(0))
    }

    #[test]
    fn test_from_name() {
        for name in [
            "identity", "count", "bin", "density", "boxplot", "smooth", "summary", "sum", "ydensity", "ecdf", "qq",
            "qq_line",
        ] {
            assert_eq!(Stat::from_name(name).unwrap().name(), name);
        }
        assert_eq!(Stat::from_name("stat_bin").unwrap().name(), "bin");
        let err = Stat::from_name("bogus").unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_param_rejects_unknown() {
        assert!(Stat::bin().param("bins", 10.0).is_ok());
        let err = Stat::bin().param("binz", 10.0).unwrap_err();
        assert!(matches!(err, Error::Configuration { ref component, .. } if component == "stat_bin"));
    }

    #[test]
    fn test_missing_required_aes() {
        let df = DataFrame::new().with_column("y", vec![1.0]).unwrap();
        let (layout, data) = layout_for(&df);
        let err = Stat::bin()
            .compute_layer(&data, &layout, &mut Warnings::new())
            .unwrap_err();
        match err {
            Error::MissingAesthetics { component, missing } => {
                assert_eq!(component, "stat_bin");
                assert_eq!(missing, vec!["x".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_rows_removed_with_warning() {
        let df = DataFrame::new()
            .with_column("x", vec![1.0, f64::INFINITY, f64::NAN, 2.0])
            .unwrap()
            .with_column("group", vec![-1.0; 4])
            .unwrap();
        let (layout, data) = layout_for(&df);
        let mut w = Warnings::new();
        let out = Stat::count().compute_layer(&data, &layout, &mut w).unwrap();
        assert_eq!(out.nrow(), 2);
        assert_eq!(w.len(), 1);
        assert!(w.as_slice()[0].to_string().contains("removed 2 rows"));

        let mut quiet = Warnings::new();
        Stat::count()
            .param("na_rm", true)
            .unwrap()
            .compute_layer(&data, &layout, &mut quiet)
            .unwrap();
        assert!(quiet.is_empty());
    }

    #[test]
    fn test_empty_data_passes_through() {
        let df = DataFrame::new().with_column("x", Vec::<f64>::new()).unwrap();
        let layout = Layout::default();
        for name in [
            "identity", "count", "bin", "density", "boxplot", "smooth", "summary", "sum", "ydensity", "ecdf", "qq",
            "qq_line",
        ] {
            let out = Stat::from_name(name)
                .unwrap()
                .compute_layer(&df, &layout, &mut Warnings::new())
                .unwrap();
            assert!(out.is_empty(), "{name}");
        }
    }

    #[test]
    fn test_constant_columns_carried() {
        let df = DataFrame::new()
            .with_column("x", vec![1.0, 1.0, 2.0])
            .unwrap()
            .with_column("fill", vec!["a", "a", "a"])
            .unwrap()
            .with_column("group", vec![1.0, 1.0, 1.0])
            .unwrap();
        let (layout, data) = layout_for(&df);
        let out = Stat::count().compute_layer(&data, &layout, &mut Warnings::new()).unwrap();
        assert_eq!(out.get("fill").unwrap().get(1), DataValue::from("a"));
        assert_eq!(out.numbers("PANEL").unwrap(), &[1.0, 1.0]);
    }

    #[test]
    fn test_resolution() {
        assert_eq!(resolution(&[1.0, 2.0, 4.0], false), 1.0);
        assert_eq!(resolution(&[0.5, 1.0, 1.0], false), 0.5);
        assert_eq!(resolution(&[3.0], false), 1.0);
        assert_eq!(resolution(&[3.0], true), 3.0);
    }

    #[test]
    fn test_percentile() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&v, 0.5), 2.5);
        assert_eq!(percentile(&v, 0.0), 1.0);
        assert_eq!(percentile(&v, 1.0), 4.0);
        assert!(percentile(&[], 0.5).is_nan());
    }
}
