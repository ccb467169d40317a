//! The plot build pipeline.
//!
//! [`build`] takes a [`GGPlot`] by reference and never mutates it. All
//! working state lives in a [`Layout`], a [`Scales`] copy and one
//! [`LayerBuild`] per layer, created fresh for every call.

use super::coord::Coord;
use super::facet::Facet;
use super::geom::GeomKind;
use super::ggplot::GGPlot;
use super::guide::{build_guides, Guide};
use super::labels::Labs;
use super::layer::{Layer, LayerBuild};
use super::layout::Layout;
use super::params::Params;
use super::theme::Theme;
use crate::data::DataFrame;
use crate::error::Result;
use crate::options::{options, PlotOptions};
use crate::scale::{Scale, Scales};
use crate::warning::Warnings;

/// Drawable data of one layer.
#[derive(Debug, Clone)]
pub struct BuiltLayer {
    /// Geometry that draws the rows.
    pub geom: GeomKind,
    /// One row per mark, positions in scale space, every aesthetic mapped.
    pub data: DataFrame,
    /// Geometry parameters.
    pub params: Params,
}

/// Result of a build: everything the renderer needs.
#[derive(Debug, Clone)]
pub struct BuiltPlot {
    layers: Vec<BuiltLayer>,
    layout: Layout,
    scales: Scales,
    guides: Vec<Guide>,
    labels: Labs,
    coord: Coord,
    facet: Facet,
    theme: Theme,
    options: PlotOptions,
    warnings: Warnings,
}

impl BuiltPlot {
    /// Built layers in drawing order.
    #[must_use]
    pub fn layers(&self) -> &[BuiltLayer] {
        &self.layers
    }

    /// Panel table with trained panel scales and panel parameters.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Final scales: the plot-level position scales followed by the
    /// trained non-position scales.
    #[must_use]
    pub fn scales(&self) -> &Scales {
        &self.scales
    }

    /// Legends and color bars.
    #[must_use]
    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    /// Resolved labels.
    #[must_use]
    pub fn labels(&self) -> &Labs {
        &self.labels
    }

    /// Coordinate system.
    #[must_use]
    pub fn coord(&self) -> &Coord {
        &self.coord
    }

    /// Facet layout.
    #[must_use]
    pub fn facet(&self) -> &Facet {
        &self.facet
    }

    /// Theme in effect.
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Options snapshot taken when the build started.
    #[must_use]
    pub fn options(&self) -> &PlotOptions {
        &self.options
    }

    /// Warnings raised while composing and building.
    #[must_use]
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// Total number of rows over all layers.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.layers.iter().map(|l| l.data.nrow()).sum()
    }
}

/// Run every stage of the pipeline over `plot`.
///
/// # Errors
///
/// Any evaluation, missing-aesthetic, scale, facet or guide error raised by
/// a stage. Non-fatal conditions end up in [`BuiltPlot::warnings`].
#[tracing::instrument(level = "debug", skip_all, fields(layers = plot.layers().len()))]
pub fn build(plot: &GGPlot) -> Result<BuiltPlot> {
    let opts = options();
    let theme = match plot.theme() {
        Some(t) => t.clone(),
        None => Theme::from_name(&opts.theme)?,
    };
    let mut warnings = plot.warnings().clone();
    let mut scales = plot.scales().clone();
    let env = plot.env();

    let blank;
    let layers: Vec<&Layer> = if plot.layers().is_empty() {
        blank = Layer::blank();
        vec![&blank]
    } else {
        plot.layers().iter().collect()
    };

    let mut labels = Labs::default();
    labels.add_defaults(plot.mapping().labels());
    for layer in &layers {
        labels.add_defaults(layer.default_labels());
    }
    labels.update(plot.labs());

    let mut builds: Vec<LayerBuild<'_>> = layers
        .iter()
        .map(|l| LayerBuild::new(l, plot.get_data(), plot.mapping()))
        .collect();

    let datas: Vec<DataFrame> = builds.iter_mut().map(|b| std::mem::take(&mut b.data)).collect();
    let (mut layout, mapped) = Layout::setup(plot.facet(), &datas)?;
    for (b, df) in builds.iter_mut().zip(mapped) {
        b.data = df;
    }

    for b in &mut builds {
        b.compute_aesthetics(env, &mut scales)?;
    }
    for b in &mut builds {
        b.transform(&scales)?;
    }
    let referenced: Vec<String> = builds
        .iter()
        .flat_map(|b| b.data.column_names().to_vec())
        .collect();
    let referenced: Vec<&str> = referenced.iter().map(String::as_str).collect();
    scales.add_missing(&referenced);

    train_and_map(&mut layout, &mut builds, &scales)?;

    for b in &mut builds {
        b.compute_statistic(&layout, &mut warnings)?;
    }
    for b in &mut builds {
        b.map_statistic(env, &mut scales)?;
    }
    scales.add_missing(&["x", "y"]);

    for b in &mut builds {
        b.setup_data()?;
    }
    for b in &mut builds {
        b.compute_position(&layout, &mut warnings)?;
    }

    layout.reset_position_scales();
    train_and_map(&mut layout, &mut builds, &scales)?;

    let mut npscales = scales.non_position_scales();
    if !npscales.is_empty() {
        for b in &builds {
            npscales.train_df(&b.data)?;
        }
        for b in &mut builds {
            npscales.map_df(&mut b.data, &mut warnings)?;
        }
    }

    layout.setup_panel_params(plot.coord());

    for b in &mut builds {
        b.use_defaults(env)?;
    }
    for b in &mut builds {
        b.finish_statistics()?;
    }
    for b in &mut builds {
        let data = std::mem::take(&mut b.data);
        b.data = plot.facet().finish_data(data);
        b.handle_na(&mut warnings);
    }

    let guides = if theme.legend_position == super::theme::LegendPosition::None {
        Vec::new()
    } else {
        build_guides(&npscales, &labels, &builds)?
    };

    let final_scales: Scales = scales.position().cloned().chain(npscales.iter().cloned()).collect();
    let built_layers = builds
        .into_iter()
        .map(|b| BuiltLayer {
            geom: b.layer().geom(),
            params: b.layer().geom_params().clone(),
            data: b.data,
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        panels = layout.len(),
        rows = built_layers.iter().map(|l| l.data.nrow()).sum::<usize>(),
        warnings = warnings.len(),
        "plot built"
    );

    Ok(BuiltPlot {
        layers: built_layers,
        layout,
        scales: final_scales,
        guides,
        labels,
        coord: plot.coord().clone(),
        facet: plot.facet().clone(),
        theme,
        options: opts,
        warnings,
    })
}

/// Train the panel position scales on every layer, then map positions.
fn train_and_map(layout: &mut Layout, builds: &mut [LayerBuild<'_>], scales: &Scales) -> Result<()> {
    let datas: Vec<DataFrame> = builds.iter_mut().map(|b| std::mem::take(&mut b.data)).collect();
    let x: Option<&Scale> = scales.x();
    let y: Option<&Scale> = scales.y();
    let trained = layout.train_position(&datas, x, y);
    let mut datas = datas;
    let mapped = trained.and_then(|()| layout.map_position(&mut datas));
    for (b, df) in builds.iter_mut().zip(datas) {
        b.data = df;
    }
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::grammar::aes::Aes;
    use crate::grammar::geom::Geom;
    use crate::grammar::ggplot::ggplot;
    use crate::grammar::labels::labs;
    use crate::grammar::theme::LegendPosition;

    fn frame() -> DataFrame {
        DataFrame::new()
            .with_column("a", vec![1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .with_column("b", vec![2.0, 4.0, 6.0, 8.0])
            .unwrap()
            .with_column("g", vec!["p", "q", "p", "q"])
            .unwrap()
    }

    #[test]
    fn test_blank_plot_builds() {
        let built = build(&ggplot(None, Aes::new())).unwrap();
        assert_eq!(built.layers().len(), 1);
        assert_eq!(built.layers()[0].geom, GeomKind::Blank);
        assert_eq!(built.layout().len(), 1);
    }

    #[test]
    fn test_points_keep_every_row() {
        let plot = ggplot(Some(frame()), Aes::new().x("a").y("b")) + Geom::point();
        let built = build(&plot).unwrap();
        let layer = &built.layers()[0];
        assert_eq!(layer.data.nrow(), 4);
        assert!(layer.data.has_column("size"));
        assert!(layer.data.has_column("PANEL"));
        assert!(built.warnings().is_empty());
    }

    #[test]
    fn test_labels_from_mapping_and_stat() {
        let plot = ggplot(Some(frame()), Aes::new().x("g")) + Geom::bar() + labs().title("Counts");
        let built = build(&plot).unwrap();
        assert_eq!(built.labels().get("x"), Some("g"));
        assert_eq!(built.labels().get("y"), Some("count"));
        assert_eq!(built.labels().get_title(), Some("Counts"));
    }

    #[test]
    fn test_plot_is_not_mutated() {
        let plot = ggplot(Some(frame()), Aes::new().x("a").y("b").color("g")) + Geom::point();
        let before = plot.get_data().map(DataFrame::ncol);
        let first = build(&plot).unwrap();
        let second = build(&plot).unwrap();
        assert_eq!(plot.get_data().map(DataFrame::ncol), before);
        assert_eq!(first.layers()[0].data, second.layers()[0].data);
    }

    #[test]
    fn test_color_mapped_and_legend_built() {
        let plot = ggplot(Some(frame()), Aes::new().x("a").y("b").color("g")) + Geom::point();
        let built = build(&plot).unwrap();
        assert!(matches!(built.layers()[0].data.get("color"), Some(Column::Color(_))));
        assert_eq!(built.guides().len(), 1);
        assert_eq!(built.guides()[0].title, "g");
        assert!(built.scales().get("color").is_some());
        assert!(built.scales().x().is_some());
    }

    #[test]
    fn test_hidden_legends() {
        let plot = ggplot(Some(frame()), Aes::new().x("a").y("b").color("g"))
            + Geom::point()
            + Theme::minimal().legend_position(LegendPosition::None);
        assert!(build(&plot).unwrap().guides().is_empty());
    }

    #[test]
    fn test_panel_params_ready() {
        let plot = ggplot(Some(frame()), Aes::new().x("a").y("b")) + Geom::line();
        let built = build(&plot).unwrap();
        let params = built.layout().panel_params(1).unwrap();
        assert!(params.x.range.0 < 1.0 && params.x.range.1 > 4.0);
        assert!(!params.y.breaks.is_empty());
    }
}
