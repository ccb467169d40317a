//! The plot object and its composition operators.
//!
//! A [`GGPlot`] is a declarative description. Components are added with
//! `+` (which consumes the plot, or clones it when added to a reference)
//! or `+=`, data can be piped in with `>>`, and [`GGPlot::build`],
//! [`GGPlot::draw`] and [`GGPlot::save`] turn the description into output
//! without touching it.

use std::ops::{Add, AddAssign, Shr};
use std::path::Path;

use super::aes::{Aes, AesExpr};
use super::build::{build, BuiltPlot};
use super::coord::Coord;
use super::expr::{Environment, Namespace, Value};
use super::facet::Facet;
use super::geom::Geom;
use super::labels::Labs;
use super::layer::Layer;
use super::theme::Theme;
use crate::data::{ninteraction, Column, DataFrame, GroupedFrame};
use crate::error::{Error, Result};
use crate::output::SaveOptions;
use crate::render::Figure;
use crate::scale::{Scale, Scales};
use crate::warning::Warnings;

/// A layered plot.
#[derive(Debug, Clone, Default)]
pub struct GGPlot {
    data: Option<DataFrame>,
    mapping: Aes,
    environment: Environment,
    layers: Vec<Layer>,
    scales: Scales,
    coord: Coord,
    facet: Facet,
    theme: Option<Theme>,
    labs: Labs,
    warnings: Warnings,
}

/// Start a plot from optional data and a default mapping.
#[must_use]
pub fn ggplot(data: Option<DataFrame>, mapping: Aes) -> GGPlot {
    GGPlot {
        data,
        mapping,
        ..GGPlot::default()
    }
}

impl GGPlot {
    /// Empty plot without data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the plot data.
    #[must_use]
    pub fn data(mut self, data: DataFrame) -> Self {
        self.data = Some(data);
        self
    }

    /// Merge `mapping` over the plot mapping.
    #[must_use]
    pub fn aes(mut self, mapping: Aes) -> Self {
        self.mapping = self.mapping.merge(&mapping);
        self
    }

    /// Variables visible to mapping expressions besides the data columns.
    #[must_use]
    pub fn environment(mut self, env: Environment) -> Self {
        self.environment = env;
        self
    }

    /// Add a geometry layer.
    #[must_use]
    pub fn geom(self, geom: Geom) -> Self {
        self + geom
    }

    /// Add any component.
    #[must_use]
    pub fn with(self, component: impl PlotComponent) -> Self {
        self + component
    }

    /// Plot data, if any.
    #[must_use]
    pub fn get_data(&self) -> Option<&DataFrame> {
        self.data.as_ref()
    }

    /// Default mapping.
    #[must_use]
    pub fn mapping(&self) -> &Aes {
        &self.mapping
    }

    /// Expression environment.
    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.environment
    }

    /// Layers in the order they were added.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Scales added so far.
    #[must_use]
    pub fn scales(&self) -> &Scales {
        &self.scales
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

    /// Theme, when one was added.
    #[must_use]
    pub fn theme(&self) -> Option<&Theme> {
        self.theme.as_ref()
    }

    /// Labels added with `+ labs(...)`.
    #[must_use]
    pub fn labs(&self) -> &Labs {
        &self.labs
    }

    /// Warnings raised while composing, such as replaced scales.
    #[must_use]
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// Run the build pipeline.
    pub fn build(&self) -> Result<BuiltPlot> {
        build(self)
    }

    /// Build and render at the default figure size and dpi.
    pub fn draw(&self) -> Result<Figure> {
        let built = self.build()?;
        let opts = built.options().clone();
        let (w, h) = opts.figure_size;
        Figure::raster(built, w, h, opts.dpi)
    }

    /// Build, render and write the plot to `path`.
    ///
    /// # Errors
    ///
    /// [`Error::SizeLimit`] when the requested size exceeds the ceiling
    /// and `limitsize` is on; checked before anything is built.
    pub fn save(&self, path: impl AsRef<Path>, opts: &SaveOptions) -> Result<()> {
        crate::output::save(self, path.as_ref(), opts)
    }
}

/// Something that can be added to a plot.
pub trait PlotComponent {
    /// Add `self` to `plot`.
    fn add_to(self, plot: &mut GGPlot);
}

impl PlotComponent for Geom {
    fn add_to(self, plot: &mut GGPlot) {
        plot.layers.push(Layer::from(self));
    }
}

impl PlotComponent for Layer {
    fn add_to(self, plot: &mut GGPlot) {
        plot.layers.push(self);
    }
}

impl PlotComponent for Scale {
    fn add_to(self, plot: &mut GGPlot) {
        plot.scales.append(self, &mut plot.warnings);
    }
}

impl PlotComponent for Coord {
    fn add_to(self, plot: &mut GGPlot) {
        plot.coord = self;
    }
}

impl PlotComponent for Facet {
    fn add_to(self, plot: &mut GGPlot) {
        plot.facet = self;
    }
}

impl PlotComponent for Theme {
    fn add_to(self, plot: &mut GGPlot) {
        plot.theme = Some(self);
    }
}

impl PlotComponent for Labs {
    fn add_to(self, plot: &mut GGPlot) {
        plot.labs.update(&self);
    }
}

impl PlotComponent for Aes {
    fn add_to(self, plot: &mut GGPlot) {
        plot.mapping = plot.mapping.merge(&self);
    }
}

impl<T: PlotComponent> PlotComponent for Vec<T> {
    fn add_to(self, plot: &mut GGPlot) {
        for item in self {
            item.add_to(plot);
        }
    }
}

impl<T: PlotComponent> PlotComponent for Option<T> {
    fn add_to(self, plot: &mut GGPlot) {
        if let Some(item) = self {
            item.add_to(plot);
        }
    }
}

impl<T: PlotComponent> Add<T> for GGPlot {
    type Output = GGPlot;

    fn add(mut self, rhs: T) -> GGPlot {
        rhs.add_to(&mut self);
        self
    }
}

impl<T: PlotComponent> Add<T> for &GGPlot {
    type Output = GGPlot;

    fn add(self, rhs: T) -> GGPlot {
        self.clone() + rhs
    }
}

impl<T: PlotComponent> AddAssign<T> for GGPlot {
    fn add_assign(&mut self, rhs: T) {
        rhs.add_to(self);
    }
}

impl Shr<GGPlot> for DataFrame {
    type Output = Result<GGPlot>;

    fn shr(self, mut plot: GGPlot) -> Result<GGPlot> {
        if plot.data.is_some() {
            return Err(Error::Data("`>>` failed, the plot already has data".to_string()));
        }
        plot.data = Some(self);
        Ok(plot)
    }
}

impl Shr<GGPlot> for GroupedFrame {
    type Output = Result<GGPlot>;

    fn shr(self, plot: GGPlot) -> Result<GGPlot> {
        let (frame, vars) = self.into_parts();
        let mut plot = (frame >> plot)?;
        if !plot.mapping.contains("group") && !vars.is_empty() {
            plot.mapping.insert("group", group_expr(vars).into());
        }
        Ok(plot)
    }
}

/// Group mapping for the grouping variables of a piped frame.
fn group_expr(vars: Vec<String>) -> AesExpr {
    if let [single] = vars.as_slice() {
        return AesExpr::Expr(single.clone());
    }
    let label = format!("interaction({})", vars.join(", "));
    AesExpr::func(&label, move |ns: &Namespace<'_>| {
        let columns = vars
            .iter()
            .map(|v| ns.column(v).ok_or_else(|| format!("name '{v}' is not defined")))
            .collect::<std::result::Result<Vec<&Column>, String>>()?;
        let ids = ninteraction(&columns, ns.nrow());
        Ok(Value::Column(Column::Number(ids.into_iter().map(|i| i as f64).collect())))
    })
}
