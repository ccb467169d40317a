//! Panel layout: the panel table, per-panel position scales and panel
//! parameters.
//!
//! The layout is created once per build from the facet. It owns untrained
//! copies of the plot's x and y scales, one per scale index of the panel
//! table, and trains, maps and resets them as the build progresses.

use super::coord::{Coord, PanelParams};
use super::facet::Facet;
use crate::data::{Column, DataFrame};
use crate::error::{Error, Result};
use crate::scale::{Scale, X_AES, Y_AES};

/// One row of the panel table.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelInfo {
    /// Panel id, contiguous from 1.
    pub panel: usize,
    /// Row in the panel grid, from 1.
    pub row: usize,
    /// Column in the panel grid, from 1.
    pub col: usize,
    /// Index of the x scale used by this panel, from 1.
    pub scale_x: usize,
    /// Index of the y scale used by this panel, from 1.
    pub scale_y: usize,
    /// Facet variable values identifying the panel.
    pub vars: Vec<(String, String)>,
}

impl PanelInfo {
    pub(crate) fn single() -> Self {
        Self {
            panel: 1,
            row: 1,
            col: 1,
            scale_x: 1,
            scale_y: 1,
            vars: Vec::new(),
        }
    }
}

/// The trained position scales a statistic sees for one panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelScales<'a> {
    /// Panel x scale.
    pub x: Option<&'a Scale>,
    /// Panel y scale.
    pub y: Option<&'a Scale>,
}

/// Panels of a plot and their position scales.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    panels: Vec<PanelInfo>,
    scales_x: Vec<Scale>,
    scales_y: Vec<Scale>,
    panel_params: Vec<PanelParams>,
}

impl Layout {
    /// Compute the panel table from the layers' data and attach a `PANEL`
    /// column to each layer's data.
    pub fn setup(facet: &Facet, data: &[DataFrame]) -> Result<(Self, Vec<DataFrame>)> {
        let refs: Vec<&DataFrame> = data.iter().collect();
        let panels = facet.compute_layout(&refs)?;
        tracing::debug!(panels = panels.len(), "layout computed");
        let mapped = data
            .iter()
            .map(|df| facet.map_data(df, &panels))
            .collect::<Result<Vec<_>>>()?;
        Ok((
            Self {
                panels,
                ..Self::default()
            },
            mapped,
        ))
    }

    /// The panel table.
    #[must_use]
    pub fn panels(&self) -> &[PanelInfo] {
        &self.panels
    }

    /// Number of panels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.panels.len()
    }

    /// True before [`Layout::setup`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Grid dimensions `(rows, cols)`.
    #[must_use]
    pub fn dims(&self) -> (usize, usize) {
        let rows = self.panels.iter().map(|p| p.row).max().unwrap_or(1);
        let cols = self.panels.iter().map(|p| p.col).max().unwrap_or(1);
        (rows, cols)
    }

    /// Panel `id`, if it exists.
    #[must_use]
    pub fn panel(&self, id: usize) -> Option<&PanelInfo> {
        id.checked_sub(1).and_then(|i| self.panels.get(i))
    }

    /// Per-panel x scales.
    #[must_use]
    pub fn scales_x(&self) -> &[Scale] {
        &self.scales_x
    }

    /// Per-panel y scales.
    #[must_use]
    pub fn scales_y(&self) -> &[Scale] {
        &self.scales_y
    }

    /// Trained position scales of panel `id`.
    #[must_use]
    pub fn panel_scales(&self, id: usize) -> PanelScales<'_> {
        match self.panel(id) {
            Some(p) => PanelScales {
                x: self.scales_x.get(p.scale_x - 1),
                y: self.scales_y.get(p.scale_y - 1),
            },
            None => PanelScales::default(),
        }
    }

    /// Train the per-panel position scales on every layer.
    ///
    /// Panel scales are cloned from `x` and `y` the first time through.
    pub fn train_position(&mut self, data: &[DataFrame], x: Option<&Scale>, y: Option<&Scale>) -> Result<()> {
        if self.scales_x.is_empty() {
            if let Some(x) = x {
                let n = self.panels.iter().map(|p| p.scale_x).max().unwrap_or(1);
                self.scales_x = vec![x.fresh(); n];
            }
        }
        if self.scales_y.is_empty() {
            if let Some(y) = y {
                let n = self.panels.iter().map(|p| p.scale_y).max().unwrap_or(1);
                self.scales_y = vec![y.fresh(); n];
            }
        }
        for df in data.iter().filter(|df| !df.is_empty()) {
            let scale_index = self.row_scale_indices(df)?;
            train_family(&mut self.scales_x, df, X_AES, &scale_index, |p| p.0)?;
            train_family(&mut self.scales_y, df, Y_AES, &scale_index, |p| p.1)?;
        }
        Ok(())
    }

    /// Map position columns of every layer through its panel's scales.
    pub fn map_position(&self, data: &mut [DataFrame]) -> Result<()> {
        for df in data.iter_mut() {
            if df.is_empty() {
                continue;
            }
            let scale_index = self.row_scale_indices(df)?;
            map_family(&self.scales_x, df, X_AES, &scale_index, |p| p.0)?;
            map_family(&self.scales_y, df, Y_AES, &scale_index, |p| p.1)?;
        }
        Ok(())
    }

    /// Forget the continuous ranges of the panel scales.
    pub fn reset_position_scales(&mut self) {
        self.scales_x.iter_mut().chain(&mut self.scales_y).for_each(Scale::reset);
    }

    /// Compute axis ranges, breaks and labels for every panel.
    pub fn setup_panel_params(&mut self, coord: &Coord) {
        self.panel_params = self
            .panels
            .iter()
            .map(|p| {
                coord.setup_panel_params(
                    self.scales_x.get(p.scale_x - 1),
                    self.scales_y.get(p.scale_y - 1),
                )
            })
            .collect();
    }

    /// Panel parameters of panel `id`; available after
    /// [`Layout::setup_panel_params`].
    #[must_use]
    pub fn panel_params(&self, id: usize) -> Option<&PanelParams> {
        id.checked_sub(1).and_then(|i| self.panel_params.get(i))
    }

    /// `(scale_x, scale_y)` index per row, `None` for rows outside every
    /// panel.
    fn row_scale_indices(&self, df: &DataFrame) -> Result<Vec<Option<(usize, usize)>>> {
        let panel = df
            .numbers("PANEL")
            .ok_or_else(|| Error::Data("layer data has no PANEL column".to_string()))?;
        Ok(panel
            .iter()
            .map(|p| {
                if p.is_nan() || *p < 1.0 {
                    None
                } else {
                    self.panel(*p as usize).map(|info| (info.scale_x - 1, info.scale_y - 1))
                }
            })
            .collect())
    }
}

fn rows_by_scale(
    index: &[Option<(usize, usize)>],
    pick: impl Fn((usize, usize)) -> usize,
    n_scales: usize,
) -> Vec<Vec<usize>> {
    let mut rows = vec![Vec::new(); n_scales];
    for (i, idx) in index.iter().enumerate() {
        if let Some(s) = idx.map(&pick) {
            if let Some(bucket) = rows.get_mut(s) {
                bucket.push(i);
            }
        }
    }
    rows
}

fn train_family(
    scales: &mut [Scale],
    df: &DataFrame,
    family: &[&str],
    index: &[Option<(usize, usize)>],
    pick: impl Fn((usize, usize)) -> usize,
) -> Result<()> {
    if scales.is_empty() {
        return Ok(());
    }
    let rows = rows_by_scale(index, pick, scales.len());
    for (name, column) in df.iter() {
        if !family.contains(&name) {
            continue;
        }
        for (scale, idx) in scales.iter_mut().zip(&rows) {
            if !idx.is_empty() {
                scale.train(&column.take(idx))?;
            }
        }
    }
    Ok(())
}

fn map_family(
    scales: &[Scale],
    df: &mut DataFrame,
    family: &[&str],
    index: &[Option<(usize, usize)>],
    pick: impl Fn((usize, usize)) -> usize,
) -> Result<()> {
    if scales.is_empty() {
        return Ok(());
    }
    let rows = rows_by_scale(index, pick, scales.len());
    let names: Vec<String> = df
        .column_names()
        .iter()
        .filter(|n| family.contains(&n.as_str()))
        .cloned()
        .collect();
    // position scales never warn
    let mut quiet = crate::warning::Warnings::new();
    for name in names {
        let Some(column) = df.get(&name) else { continue };
        let mut out = vec![f64::NAN; df.nrow()];
        let mut numeric = true;
        for (scale, idx) in scales.iter().zip(&rows) {
            if idx.is_empty() {
                continue;
            }
            let mapped = scale.map(&column.take(idx), &mut quiet)?;
            let Some(values) = mapped.to_numbers() else {
                numeric = false;
                break;
            };
            for (&row, v) in idx.iter().zip(values) {
                out[row] = v;
            }
        }
        if numeric {
            df.insert(name, Column::Number(out))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::facet::FacetScales;

    fn data() -> DataFrame {
        DataFrame::new()
            .with_column("x", vec![1.0, 2.0, 10.0, 20.0])
            .unwrap()
            .with_column("y", vec![1.0, 2.0, 100.0, 200.0])
            .unwrap()
            .with_column("g", vec!["a", "a", "b", "b"])
            .unwrap()
    }

    #[test]
    fn test_setup_adds_panel() {
        let (layout, mapped) = Layout::setup(&Facet::wrap(&["g"]), &[data()]).unwrap();
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.dims(), (1, 2));
        assert_eq!(mapped[0].numbers("PANEL").unwrap(), &[1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_free_y_scales_train_independently() {
        let facet = Facet::wrap(&["g"]).scales(FacetScales::FreeY);
        let (mut layout, mapped) = Layout::setup(&facet, &[data()]).unwrap();
        layout
            .train_position(&mapped, Some(&Scale::x_continuous()), Some(&Scale::y_continuous()))
            .unwrap();
        assert_eq!(layout.scales_x().len(), 1);
        assert_eq!(layout.scales_y().len(), 2);
        assert_eq!(layout.panel_scales(1).y.unwrap().trained_range(), Some((1.0, 2.0)));
        assert_eq!(layout.panel_scales(2).y.unwrap().trained_range(), Some((100.0, 200.0)));
        assert_eq!(layout.panel_scales(2).x.unwrap().trained_range(), Some((1.0, 20.0)));
    }

    #[test]
    fn test_map_discrete_position() {
        let df = DataFrame::new()
            .with_column("x", vec!["b", "a", "b"])
            .unwrap();
        let (mut layout, mut mapped) = Layout::setup(&Facet::null(), &[df]).unwrap();
        layout.train_position(&mapped, Some(&Scale::x_discrete()), None).unwrap();
        layout.map_position(&mut mapped).unwrap();
        assert_eq!(mapped[0].numbers("x").unwrap(), &[2.0, 1.0, 2.0]);
    }

    #[test]
    fn test_reset_keeps_categories() {
        let (mut layout, mapped) = Layout::setup(&Facet::null(), &[data()]).unwrap();
        layout.train_position(&mapped, Some(&Scale::x_continuous()), None).unwrap();
        layout.reset_position_scales();
        assert!(layout.scales_x()[0].trained_range().is_none());
    }

    #[test]
    fn test_missing_panel_column() {
        let layout = Layout::setup(&Facet::null(), &[]).unwrap().0;
        assert!(layout.map_position(&mut [data()]).is_err());
    }
}
