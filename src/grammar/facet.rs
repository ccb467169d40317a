//! Faceting for Grammar of Graphics.
//!
//! Creates small multiples by splitting data on one or more variables.
//! A facet computes the panel table from the layers' data and assigns every
//! layer row to its panel. Layers that lack some facet variables are
//! repeated in every panel matching the variables they do have.

use super::layout::PanelInfo;
use crate::data::{Column, DataFrame, DataValue, SortKey};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Which position scales vary between panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacetScales {
    /// Shared x and y scales.
    #[default]
    Fixed,
    /// Independent x and y scales.
    Free,
    /// Independent x scales.
    FreeX,
    /// Independent y scales.
    FreeY,
}

impl FacetScales {
    /// Parse `fixed`, `free`, `free_x` or `free_y`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "fixed" => Ok(Self::Fixed),
            "free" => Ok(Self::Free),
            "free_x" => Ok(Self::FreeX),
            "free_y" => Ok(Self::FreeY),
            other => Err(Error::invalid_parameter(
                "facet",
                "scales",
                format!("'{other}' is not one of fixed, free, free_x, free_y"),
            )),
        }
    }

    /// True when x scales are per panel (or per column).
    #[must_use]
    pub fn free_x(self) -> bool {
        matches!(self, Self::Free | Self::FreeX)
    }

    /// True when y scales are per panel (or per row).
    #[must_use]
    pub fn free_y(self) -> bool {
        matches!(self, Self::Free | Self::FreeY)
    }
}

/// How data is split into panels.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Facet {
    /// A single panel.
    #[default]
    Null,
    /// Panels laid out in reading order, wrapping into rows.
    Wrap {
        /// Variables whose combinations define panels.
        vars: Vec<String>,
        /// Requested number of columns.
        ncol: Option<usize>,
        /// Requested number of rows.
        nrow: Option<usize>,
        /// Scale sharing.
        scales: FacetScales,
        /// Train position scales on adjusted data only.
        shrink: bool,
        /// Drop combinations absent from the data.
        drop: bool,
    },
    /// A grid with one row per `rows` combination and one column per
    /// `cols` combination.
    Grid {
        /// Row variables.
        rows: Vec<String>,
        /// Column variables.
        cols: Vec<String>,
        /// Scale sharing; free x varies by column, free y by row.
        scales: FacetScales,
        /// Train position scales on adjusted data only.
        shrink: bool,
        /// Drop combinations absent from the data.
        drop: bool,
    },
}

const WRAP_PARAMS: &[&str] = &["vars", "var", "ncol", "nrow", "scales", "shrink", "drop"];
const GRID_PARAMS: &[&str] = &["rows", "cols", "scales", "shrink", "drop"];

impl Facet {
    /// No faceting.
    #[must_use]
    pub fn null() -> Self {
        Self::Null
    }

    /// Wrap panels by the given variables.
    #[must_use]
    pub fn wrap(vars: &[&str]) -> Self {
        Self::Wrap {
            vars: vars.iter().map(|v| (*v).to_string()).collect(),
            ncol: None,
            nrow: None,
            scales: FacetScales::Fixed,
            shrink: true,
            drop: true,
        }
    }

    /// Grid of panels by row and column variables.
    #[must_use]
    pub fn grid(rows: &[&str], cols: &[&str]) -> Self {
        Self::Grid {
            rows: rows.iter().map(|v| (*v).to_string()).collect(),
            cols: cols.iter().map(|v| (*v).to_string()).collect(),
            scales: FacetScales::Fixed,
            shrink: true,
            drop: true,
        }
    }

    /// Build a facet from a name and `key=value` parameters.
    ///
    /// Variable lists are comma separated.
    pub fn from_name(name: &str, params: &[(String, DataValue)]) -> Result<Self> {
        let (mut facet, allowed, component) = match name {
            "null" | "facet_null" => (Self::Null, &[][..], "facet_null"),
            "wrap" | "facet_wrap" => (Self::wrap(&[]), WRAP_PARAMS, "facet_wrap"),
            "grid" | "facet_grid" => (Self::grid(&[], &[]), GRID_PARAMS, "facet_grid"),
            other => {
                return Err(Error::UnknownComponent {
                    kind: "facet",
                    name: other.to_string(),
                })
            }
        };
        for (key, value) in params {
            if !allowed.contains(&key.as_str()) {
                return Err(Error::configuration(component, key, allowed));
            }
            let text = value.to_label();
            let list: Vec<String> = text
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            let count = || {
                value
                    .as_f64()
                    .filter(|v| *v >= 1.0)
                    .map(|v| v as usize)
                    .ok_or_else(|| Error::invalid_parameter(component, key, "expected a positive integer"))
            };
            let flag = || match text.as_str() {
                "true" | "True" => Ok(true),
                "false" | "False" => Ok(false),
                _ => Err(Error::invalid_parameter(component, key, "expected true or false")),
            };
            match (&mut facet, key.as_str()) {
                (Self::Wrap { vars, .. }, "vars" | "var") => *vars = list,
                (Self::Wrap { ncol, .. }, "ncol") => *ncol = Some(count()?),
                (Self::Wrap { nrow, .. }, "nrow") => *nrow = Some(count()?),
                (Self::Grid { rows, .. }, "rows") => *rows = list,
                (Self::Grid { cols, .. }, "cols") => *cols = list,
                (Self::Wrap { scales, .. } | Self::Grid { scales, .. }, "scales") => {
                    *scales = FacetScales::from_name(&text)?;
                }
                (Self::Wrap { shrink, .. } | Self::Grid { shrink, .. }, "shrink") => *shrink = flag()?,
                (Self::Wrap { drop, .. } | Self::Grid { drop, .. }, "drop") => *drop = flag()?,
                _ => return Err(Error::configuration(component, key, allowed)),
            }
        }
        Ok(facet)
    }

    /// Set the number of columns of a wrap facet.
    #[must_use]
    pub fn ncol(mut self, n: usize) -> Self {
        if let Self::Wrap { ncol, .. } = &mut self {
            *ncol = Some(n.max(1));
        }
        self
    }

    /// Set the number of rows of a wrap facet.
    #[must_use]
    pub fn nrow(mut self, n: usize) -> Self {
        if let Self::Wrap { nrow, .. } = &mut self {
            *nrow = Some(n.max(1));
        }
        self
    }

    /// Set scale sharing.
    #[must_use]
    pub fn scales(mut self, value: FacetScales) -> Self {
        if let Self::Wrap { scales, .. } | Self::Grid { scales, .. } = &mut self {
            *scales = value;
        }
        self
    }

    /// Set whether position scales shrink to the adjusted data.
    #[must_use]
    pub fn shrink(mut self, value: bool) -> Self {
        if let Self::Wrap { shrink, .. } | Self::Grid { shrink, .. } = &mut self {
            *shrink = value;
        }
        self
    }

    /// Set whether unobserved combinations are dropped.
    #[must_use]
    pub fn drop(mut self, value: bool) -> Self {
        if let Self::Wrap { drop, .. } | Self::Grid { drop, .. } = &mut self {
            *drop = value;
        }
        self
    }

    /// Facet variables in panel-key order (rows before columns).
    #[must_use]
    pub fn vars(&self) -> Vec<&str> {
        match self {
            Self::Null => Vec::new(),
            Self::Wrap { vars, .. } => vars.iter().map(String::as_str).collect(),
            Self::Grid { rows, cols, .. } => rows.iter().chain(cols).map(String::as_str).collect(),
        }
    }

    /// Scale sharing in effect.
    #[must_use]
    pub fn facet_scales(&self) -> FacetScales {
        match self {
            Self::Null => FacetScales::Fixed,
            Self::Wrap { scales, .. } | Self::Grid { scales, .. } => *scales,
        }
    }

    /// True when position scales are retrained on adjusted data.
    #[must_use]
    pub fn shrinks(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Wrap { shrink, .. } | Self::Grid { shrink, .. } => *shrink,
        }
    }

    /// Compute the panel table.
    ///
    /// # Errors
    ///
    /// [`Error::Facet`] when no layer holds every facet variable.
    pub fn compute_layout(&self, datas: &[&DataFrame]) -> Result<Vec<PanelInfo>> {
        match self {
            Self::Null => Ok(vec![PanelInfo::single()]),
            Self::Wrap {
                vars,
                ncol,
                nrow,
                scales,
                drop,
                ..
            } => {
                let combos = combinations(datas, vars, *drop)?;
                let (_, ncol) = wrap_dims(combos.len(), *nrow, *ncol);
                Ok(combos
                    .into_iter()
                    .enumerate()
                    .map(|(i, values)| PanelInfo {
                        panel: i + 1,
                        row: i / ncol + 1,
                        col: i % ncol + 1,
                        scale_x: if scales.free_x() { i + 1 } else { 1 },
                        scale_y: if scales.free_y() { i + 1 } else { 1 },
                        vars: vars.iter().cloned().zip(values).collect(),
                    })
                    .collect())
            }
            Self::Grid {
                rows,
                cols,
                scales,
                drop,
                ..
            } => {
                let row_combos = combinations(datas, rows, *drop)?;
                let col_combos = combinations(datas, cols, *drop)?;
                let mut panels = Vec::with_capacity(row_combos.len() * col_combos.len());
                for (ri, rv) in row_combos.iter().enumerate() {
                    for (ci, cv) in col_combos.iter().enumerate() {
                        let vars = rows
                            .iter()
                            .cloned()
                            .zip(rv.iter().cloned())
                            .chain(cols.iter().cloned().zip(cv.iter().cloned()))
                            .collect();
                        panels.push(PanelInfo {
                            panel: panels.len() + 1,
                            row: ri + 1,
                            col: ci + 1,
                            scale_x: if scales.free_x() { ci + 1 } else { 1 },
                            scale_y: if scales.free_y() { ri + 1 } else { 1 },
                            vars,
                        });
                    }
                }
                Ok(panels)
            }
        }
    }

    /// Assign every row of `data` to its panels via a `PANEL` column.
    ///
    /// Rows of layers missing some facet variables are repeated for each
    /// panel matching the variables present.
    pub fn map_data(&self, data: &DataFrame, panels: &[PanelInfo]) -> Result<DataFrame> {
        let vars = self.vars();
        let present: Vec<(usize, &Column)> = vars
            .iter()
            .enumerate()
            .filter_map(|(j, v)| data.get(v).map(|c| (j, c)))
            .collect();

        if vars.is_empty() || (present.is_empty() && panels.len() == 1) {
            let mut out = data.clone();
            out.insert("PANEL", Column::Number(vec![1.0; data.nrow()]))?;
            return Ok(out);
        }

        let mut rows = Vec::with_capacity(data.nrow());
        let mut ids = Vec::with_capacity(data.nrow());
        for i in 0..data.nrow() {
            for p in panels {
                let matches = present
                    .iter()
                    .all(|(j, col)| p.vars.get(*j).is_some_and(|(_, v)| *v == key_label(col, i)));
                if matches {
                    rows.push(i);
                    ids.push(p.panel as f64);
                }
            }
        }
        let mut out = data.take(&rows);
        out.insert("PANEL", Column::Number(ids))?;
        Ok(out)
    }

    /// Last adjustment of a layer's built data: rows without a panel are
    /// dropped.
    #[must_use]
    pub fn finish_data(&self, data: DataFrame) -> DataFrame {
        match data.numbers("PANEL") {
            Some(panel) if panel.iter().any(|p| p.is_nan()) => {
                let keep: Vec<bool> = panel.iter().map(|p| !p.is_nan()).collect();
                data.filter(&keep)
            }
            _ => data,
        }
    }

    /// Strip texts of a panel: `(top, right)`.
    #[must_use]
    pub fn strip_labels(&self, panel: &PanelInfo) -> (Option<String>, Option<String>) {
        let join = |vars: &[(String, String)]| {
            (!vars.is_empty()).then(|| {
                vars.iter()
                    .map(|(_, v)| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
        };
        match self {
            Self::Null => (None, None),
            Self::Wrap { .. } => (join(&panel.vars), None),
            Self::Grid { rows, .. } => {
                let split = rows.len().min(panel.vars.len());
                let (r, c) = panel.vars.split_at(split);
                (join(c), join(r))
            }
        }
    }
}

/// Rows and columns of a wrapped layout of `n` panels.
#[must_use]
pub fn wrap_dims(n: usize, nrow: Option<usize>, ncol: Option<usize>) -> (usize, usize) {
    let n = n.max(1);
    match (nrow, ncol) {
        (Some(r), Some(c)) => (r, c),
        (Some(r), None) => (r, n.div_ceil(r)),
        (None, Some(c)) => (n.div_ceil(c), c),
        (None, None) => {
            let c = (n as f64).sqrt().ceil() as usize;
            (n.div_ceil(c), c)
        }
    }
}

fn key_label(col: &Column, i: usize) -> String {
    col.get(i).to_label()
}

/// Distinct values of `var` over all layers, in display order.
fn ordered_values(datas: &[&DataFrame], var: &str) -> Vec<String> {
    let mut levels: Option<Vec<String>> = None;
    let mut seen: BTreeMap<String, SortKey> = BTreeMap::new();
    for df in datas {
        let Some(col) = df.get(var) else { continue };
        if let (Column::Categorical(c), None) = (col, &levels) {
            levels = Some(c.levels().to_vec());
        }
        for i in 0..col.len() {
            seen.entry(key_label(col, i)).or_insert_with(|| col.sort_key(i));
        }
    }
    let mut values: Vec<(SortKey, String)> = seen.into_iter().map(|(k, s)| (s, k)).collect();
    if let Some(levels) = levels {
        // level order first, unknown values after
        values.sort_by_key(|(_, v)| levels.iter().position(|l| l == v).unwrap_or(usize::MAX));
    } else {
        values.sort_by(|a, b| a.0.cmp(&b.0));
    }
    values.into_iter().map(|(_, v)| v).collect()
}

/// Panel keys for `vars`.
fn combinations(datas: &[&DataFrame], vars: &[String], drop: bool) -> Result<Vec<Vec<String>>> {
    if vars.is_empty() {
        return Ok(vec![Vec::new()]);
    }
    let full: Vec<&DataFrame> = datas
        .iter()
        .copied()
        .filter(|df| vars.iter().all(|v| df.has_column(v)))
        .collect();
    if full.is_empty() {
        return Err(Error::Facet(
            "At least one layer must contain all variables used for facetting".to_string(),
        ));
    }
    let orders: Vec<Vec<String>> = vars.iter().map(|v| ordered_values(&full, v)).collect();
    let rank = |key: &[String]| -> Vec<usize> {
        key.iter()
            .zip(&orders)
            .map(|(k, order)| order.iter().position(|o| o == k).unwrap_or(usize::MAX))
            .collect()
    };

    let mut keys: Vec<Vec<String>> = if drop {
        let mut keys = Vec::new();
        for df in &full {
            let cols: Vec<&Column> = vars.iter().filter_map(|v| df.get(v)).collect();
            for i in 0..df.nrow() {
                let key: Vec<String> = cols.iter().map(|c| key_label(c, i)).collect();
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    } else {
        orders.iter().fold(vec![Vec::new()], |acc, values| {
            acc.iter()
                .flat_map(|prefix| {
                    values.iter().map(move |v| {
                        let mut k = prefix.clone();
                        k.push(v.clone());
                        k
                    })
                })
                .collect()
        })
    };
    keys.sort_by_key(|k| rank(k));
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> DataFrame {
        DataFrame::new()
            .with_column("x", vec![1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .with_column("g", vec!["b", "a", "b", "a"])
            .unwrap()
            .with_column("h", vec!["u", "u", "v", "u"])
            .unwrap()
    }

    #[test]
    fn test_null_layout() {
        let panels = Facet::null().compute_layout(&[&data()]).unwrap();
        assert_eq!(panels.len(), 1);
        let mapped = Facet::null().map_data(&data(), &panels).unwrap();
        assert_eq!(mapped.numbers("PANEL").unwrap(), &[1.0; 4]);
    }

    #[test]
    fn test_wrap_layout_sorted() {
        let facet = Facet::wrap(&["g"]);
        let panels = facet.compute_layout(&[&data()]).unwrap();
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].vars[0].1, "a");
        assert_eq!((panels[1].row, panels[1].col), (1, 2));
        let mapped = facet.map_data(&data(), &panels).unwrap();
        assert_eq!(mapped.numbers("PANEL").unwrap(), &[2.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_free_scales_index() {
        let panels = Facet::wrap(&["g"])
            .scales(FacetScales::FreeY)
            .compute_layout(&[&data()])
            .unwrap();
        assert_eq!(panels[0].scale_x, 1);
        assert_eq!(panels[1].scale_x, 1);
        assert_eq!(panels[1].scale_y, 2);
    }

    #[test]
    fn test_drop_false_crosses_levels() {
        let kept = Facet::wrap(&["g", "h"]).compute_layout(&[&data()]).unwrap();
        assert_eq!(kept.len(), 3);
        let crossed = Facet::wrap(&["g", "h"]).drop(false).compute_layout(&[&data()]).unwrap();
        assert_eq!(crossed.len(), 4);
    }

    #[test]
    fn test_grid_layout() {
        let facet = Facet::grid(&["h"], &["g"]).scales(FacetScales::FreeX);
        let panels = facet.compute_layout(&[&data()]).unwrap();
        assert_eq!(panels.len(), 4);
        assert_eq!((panels[3].row, panels[3].col), (2, 2));
        assert_eq!(panels[3].scale_x, 2);
        assert_eq!(panels[3].scale_y, 1);
        assert_eq!(
            facet.strip_labels(&panels[1]),
            (Some("b".to_string()), Some("u".to_string()))
        );
    }

    #[test]
    fn test_layer_without_facet_vars_is_repeated() {
        let facet = Facet::wrap(&["g"]);
        let panels = facet.compute_layout(&[&data()]).unwrap();
        let other = DataFrame::new().with_column("y", vec![5.0]).unwrap();
        let mapped = facet.map_data(&other, &panels).unwrap();
        assert_eq!(mapped.nrow(), 2);
        assert_eq!(mapped.numbers("PANEL").unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_no_layer_with_all_vars_fails() {
        let err = Facet::wrap(&["zzz"]).compute_layout(&[&data()]).unwrap_err();
        assert!(err.to_string().contains("must contain all variables"));
    }

    #[test]
    fn test_from_name() {
        let params = vec![
            ("var".to_string(), DataValue::from("g")),
            ("scales".to_string(), DataValue::from("free_y")),
            ("ncol".to_string(), DataValue::Number(1.0)),
        ];
        let facet = Facet::from_name("wrap", &params).unwrap();
        assert_eq!(facet.vars(), vec!["g"]);
        assert_eq!(facet.facet_scales(), FacetScales::FreeY);
        let bad = vec![("colour".to_string(), DataValue::from("g"))];
        assert!(matches!(
            Facet::from_name("wrap", &bad),
            Err(Error::Configuration { .. })
        ));
        assert!(Facet::from_name("spiral", &[]).is_err());
    }

    #[test]
    fn test_wrap_dims() {
        assert_eq!(wrap_dims(5, None, None), (2, 3));
        assert_eq!(wrap_dims(5, None, Some(1)), (5, 1));
        assert_eq!(wrap_dims(4, Some(1), None), (1, 4));
    }
}
