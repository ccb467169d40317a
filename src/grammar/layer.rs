//! Layers and their part of the build pipeline.
//!
//! A [`Layer`] is the declarative half: geometry, statistic, position,
//! mapping, data and fixed settings, exactly as the user composed them. It
//! is never mutated by a build. Each build instead creates a
//! [`LayerBuild`] per layer that owns its working mapping and data and
//! carries them through the stages.

use super::aes::{Aes, AesExpr};
use super::evaluate::{add_group, evaluate, merge_columns};
use super::expr::Environment;
use super::geom::{Geom, GeomKind};
use super::layout::Layout;
use super::params::Params;
use super::position::Position;
use super::stat::Stat;
use crate::data::{Column, DataFrame};
use crate::error::{Error, Result};
use crate::scale::Scales;
use crate::warning::Warnings;

/// One layer of a plot.
#[derive(Debug, Clone)]
pub struct Layer {
    geom: GeomKind,
    mapping: Aes,
    data: Option<DataFrame>,
    stat: Stat,
    position: Position,
    geom_params: Params,
    aes_params: Params,
    inherit_aes: bool,
    show_legend: Option<bool>,
}

impl From<Geom> for Layer {
    fn from(geom: Geom) -> Self {
        let parts = geom.into_parts();
        Self {
            geom: parts.kind,
            mapping: parts.mapping,
            data: parts.data,
            stat: parts.stat,
            position: parts.position,
            geom_params: parts.params,
            aes_params: parts.aes_params,
            inherit_aes: parts.inherit_aes,
            show_legend: parts.show_legend,
        }
    }
}

impl Layer {
    /// Layer drawing `geom`.
    #[must_use]
    pub fn new(geom: Geom) -> Self {
        Self::from(geom)
    }

    /// Layer that draws nothing.
    #[must_use]
    pub fn blank() -> Self {
        Self::from(Geom::blank())
    }

    /// Geometry kind.
    #[must_use]
    pub fn geom(&self) -> GeomKind {
        self.geom
    }

    /// Layer mapping, before inheriting the plot mapping.
    #[must_use]
    pub fn mapping(&self) -> &Aes {
        &self.mapping
    }

    /// Layer data, if the layer has its own.
    #[must_use]
    pub fn data(&self) -> Option<&DataFrame> {
        self.data.as_ref()
    }

    /// Statistic.
    #[must_use]
    pub fn stat(&self) -> &Stat {
        &self.stat
    }

    /// Position adjustment.
    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Geometry parameters.
    #[must_use]
    pub fn geom_params(&self) -> &Params {
        &self.geom_params
    }

    /// Aesthetics fixed to one value.
    #[must_use]
    pub fn aes_params(&self) -> &Params {
        &self.aes_params
    }

    /// Whether the plot mapping is inherited.
    #[must_use]
    pub fn inherits_aes(&self) -> bool {
        self.inherit_aes
    }

    /// Forced legend visibility.
    #[must_use]
    pub fn show_legend(&self) -> Option<bool> {
        self.show_legend
    }

    /// Labels contributed by this layer: its own mapping first, then the
    /// statistic's defaults.
    #[must_use]
    pub fn default_labels(&self) -> Vec<(String, String)> {
        let mut labels = self.mapping.labels();
        for (ae, label) in self.stat.default_aes().labels() {
            if !labels.iter().any(|(k, _)| *k == ae) {
                labels.push((ae, label));
            }
        }
        labels
    }

    fn is_fixed(&self, aesthetic: &str) -> bool {
        self.aes_params.contains(aesthetic)
    }
}

/// Working state of one layer during one build.
#[derive(Debug)]
pub struct LayerBuild<'a> {
    layer: &'a Layer,
    mapping: Aes,
    /// Layer data as of the last completed stage.
    pub data: DataFrame,
}

impl<'a> LayerBuild<'a> {
    /// Resolve data and mapping: the layer's own data, else a copy of the
    /// plot data; the layer mapping over the plot mapping unless
    /// inheritance is off.
    #[must_use]
    pub fn new(layer: &'a Layer, plot_data: Option<&DataFrame>, plot_mapping: &Aes) -> Self {
        let data = layer
            .data
            .clone()
            .or_else(|| plot_data.cloned())
            .unwrap_or_default();
        let mapping = if layer.inherit_aes {
            plot_mapping.merge(&layer.mapping)
        } else {
            layer.mapping.clone()
        };
        Self { layer, mapping, data }
    }

    /// The declarative layer.
    #[must_use]
    pub fn layer(&self) -> &Layer {
        self.layer
    }

    /// Resolved mapping.
    #[must_use]
    pub fn mapping(&self) -> &Aes {
        &self.mapping
    }

    /// Evaluate the start stage of the mapping, keep `PANEL`, assign
    /// groups and add default scales for the new columns.
    pub fn compute_aesthetics(&mut self, env: &Environment, scales: &mut Scales) -> Result<()> {
        let entries: Vec<(&str, &AesExpr)> = self
            .mapping
            .starts()
            .filter(|(ae, _)| !self.layer.is_fixed(ae))
            .collect();
        let mut evaled = evaluate(entries, &self.data, env)?;
        match self.data.get("PANEL") {
            Some(panel) if evaled.ncol() == 0 || evaled.nrow() == panel.len() => {
                evaled.insert("PANEL", panel.clone())?;
            }
            _ if evaled.ncol() > 0 => {
                let n = evaled.nrow();
                evaled.insert("PANEL", Column::Number(vec![1.0; n]))?;
            }
            _ => {}
        }
        add_group(&mut evaled)?;
        scales.add_defaults(&evaled)?;
        tracing::trace!(
            geom = self.layer.geom.name(),
            rows = evaled.nrow(),
            columns = evaled.ncol(),
            "aesthetics evaluated"
        );
        self.data = evaled;
        Ok(())
    }

    /// Apply scale transforms ahead of the statistic.
    pub fn transform(&mut self, scales: &Scales) -> Result<()> {
        scales.transform_df(&mut self.data)
    }

    /// Run the statistic per panel and group.
    pub fn compute_statistic(&mut self, layout: &Layout, warnings: &mut Warnings) -> Result<()> {
        self.data = self.layer.stat.compute_layer(&self.data, layout, warnings)?;
        Ok(())
    }

    /// Evaluate the after-stat stage, including the statistic's default
    /// aesthetics the mapping does not override.
    pub fn map_statistic(&mut self, env: &Environment, scales: &mut Scales) -> Result<()> {
        if self.data.is_empty() {
            return Ok(());
        }
        let mapping = self.layer.stat.default_aes().merge(&self.mapping);
        let entries: Vec<(&str, &AesExpr)> = mapping
            .after_stats()
            .filter(|(ae, _)| !self.layer.is_fixed(ae))
            .collect();
        if entries.is_empty() {
            return Ok(());
        }
        let mut new = evaluate(entries, &self.data, env)?;
        scales.add_defaults(&new)?;
        scales.transform_df(&mut new)?;
        merge_columns(&mut self.data, new)
    }

    /// Let the geometry derive its columns, then check that everything it
    /// requires is there.
    ///
    /// # Errors
    ///
    /// [`Error::MissingAesthetics`] naming the geometry.
    pub fn setup_data(&mut self) -> Result<()> {
        if self.data.is_empty() {
            return Ok(());
        }
        let data = std::mem::take(&mut self.data);
        self.data = self.layer.geom.setup_data(data, &self.layer.geom_params)?;
        let missing: Vec<String> = self
            .layer
            .geom
            .required_aes()
            .iter()
            .filter(|ae| !self.data.has_column(ae) && !self.layer.is_fixed(ae))
            .map(|ae| (*ae).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingAesthetics {
                component: format!("geom_{}", self.layer.geom.name()),
                missing,
            });
        }
        Ok(())
    }

    /// Apply the position adjustment per panel.
    pub fn compute_position(&mut self, layout: &Layout, warnings: &mut Warnings) -> Result<()> {
        self.data = self.layer.position.compute_layer(&self.data, layout, warnings)?;
        Ok(())
    }

    /// Fill in geometry defaults and fixed aesthetics, then evaluate the
    /// after-scale stage against the mapped columns.
    pub fn use_defaults(&mut self, env: &Environment) -> Result<()> {
        if self.data.is_empty() {
            return Ok(());
        }
        Geom::use_defaults(self.layer.geom, &mut self.data, &self.layer.aes_params)?;
        let entries: Vec<(&str, &AesExpr)> = self
            .mapping
            .after_scales()
            .filter(|(ae, _)| !self.layer.is_fixed(ae))
            .collect();
        if entries.is_empty() {
            return Ok(());
        }
        let new = evaluate(entries, &self.data, env)?;
        merge_columns(&mut self.data, new)
    }

    /// Statistic post-processing.
    pub fn finish_statistics(&mut self) -> Result<()> {
        let data = std::mem::take(&mut self.data);
        self.data = self.layer.stat.finish_layer(data)?;
        Ok(())
    }

    /// Drop rows the geometry cannot draw.
    pub fn handle_na(&mut self, warnings: &mut Warnings) {
        self.data = Geom::handle_na(self.layer.geom, &self.data, &self.layer.geom_params, warnings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::aes::after_stat;
    use crate::grammar::facet::Facet;

    fn frame() -> DataFrame {
        DataFrame::new()
            .with_column("a", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("b", vec![4.0, 5.0, 6.0])
            .unwrap()
            .with_column("g", vec!["u", "v", "u"])
            .unwrap()
    }

    fn prepared<'a>(layer: &'a Layer, mapping: &Aes) -> (LayerBuild<'a>, Scales, Layout) {
        let data = frame();
        let (mut layout, mapped) = Layout::setup(&Facet::null(), &[data]).unwrap();
        let mut lb = LayerBuild::new(layer, None, mapping);
        lb.data = mapped.into_iter().next().unwrap();
        let mut scales = Scales::new();
        lb.compute_aesthetics(&Environment::new(), &mut scales).unwrap();
        layout
            .train_position(std::slice::from_ref(&lb.data), scales.x(), scales.y())
            .unwrap();
        layout.map_position(std::slice::from_mut(&mut lb.data)).unwrap();
        (lb, scales, layout)
    }

    #[test]
    fn test_inheritance() {
        let plot_aes = Aes::new().x("a").y("b");
        let layer = Layer::new(Geom::point().aes(Aes::new().color("g")));
        let lb = LayerBuild::new(&layer, Some(&frame()), &plot_aes);
        assert_eq!(lb.mapping().len(), 3);
        let no_inherit = Layer::new(Geom::point().aes(Aes::new().x("a")).inherit_aes(false));
        let lb = LayerBuild::new(&no_inherit, Some(&frame()), &plot_aes);
        assert_eq!(lb.mapping().aesthetics(), vec!["x"]);
        assert_eq!(lb.data.nrow(), 3);
    }

    #[test]
    fn test_compute_aesthetics_groups_and_panels() {
        let layer = Layer::new(Geom::point());
        let (lb, scales, _) = prepared(&layer, &Aes::new().x("a").y("b").color("g"));
        assert_eq!(lb.data.numbers("group").unwrap(), &[1.0, 2.0, 1.0]);
        assert_eq!(lb.data.numbers("PANEL").unwrap(), &[1.0, 1.0, 1.0]);
        assert!(scales.find("color"));
        assert!(scales.find("x"));
    }

    #[test]
    fn test_fixed_aesthetics_are_not_evaluated() {
        let layer = Layer::new(Geom::point().set("color", "red").unwrap());
        let (lb, scales, _) = prepared(&layer, &Aes::new().x("a").y("b").color("g"));
        assert!(!lb.data.has_column("color"));
        assert!(!scales.find("color"));
    }

    #[test]
    fn test_statistic_defaults_after_stat() {
        let layer = Layer::new(Geom::bar());
        let (mut lb, mut scales, layout) = prepared(&layer, &Aes::new().x("g"));
        let mut warnings = Warnings::new();
        lb.compute_statistic(&layout, &mut warnings).unwrap();
        lb.map_statistic(&Environment::new(), &mut scales).unwrap();
        assert_eq!(lb.data.numbers("y").unwrap(), &[2.0, 1.0]);
        lb.setup_data().unwrap();
        assert!(lb.data.has_column("ymax"));
    }

    #[test]
    fn test_after_stat_mapping_overrides_default() {
        let layer = Layer::new(Geom::bar().aes(Aes::new().y(after_stat("prop"))));
        let (mut lb, mut scales, layout) = prepared(&layer, &Aes::new().x("g"));
        lb.compute_statistic(&layout, &mut Warnings::new()).unwrap();
        lb.map_statistic(&Environment::new(), &mut scales).unwrap();
        let y = lb.data.numbers("y").unwrap();
        assert!(y.iter().all(|v| (*v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_missing_geometry_aesthetics() {
        let layer = Layer::new(Geom::point());
        let (mut lb, _, _) = prepared(&layer, &Aes::new().x("a"));
        let err = lb.setup_data().unwrap_err();
        match err {
            Error::MissingAesthetics { component, missing } => {
                assert_eq!(component, "geom_point");
                assert_eq!(missing, vec!["y".to_string()]);
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_labels_mapping_before_stat_defaults() {
        let layer = Layer::new(Geom::histogram().aes(Aes::new().x("a")));
        let labels = layer.default_labels();
        assert!(labels.contains(&("x".to_string(), "a".to_string())));
        assert!(labels.iter().any(|(k, _)| k == "y"));
    }
}
