//! Geometry types for Grammar of Graphics.
//!
//! A geometry decides how a layer is drawn and what it needs to be drawn:
//! its required aesthetics, the defaults for the aesthetics nobody mapped,
//! and the statistic and position adjustment it uses unless told
//! otherwise. [`Geom`] is also the builder for a layer: mapping, data,
//! fixed aesthetics and parameters are set on it before it is added to a
//! plot.

use super::aes::{normalize_aesthetic, Aes};
use super::params::Params;
use super::position::Position;
use super::stat::{remove_missing, resolution, Stat};
use crate::color::Rgba;
use crate::data::{Column, DataFrame, DataValue};
use crate::error::{Error, Result};
use crate::warning::Warnings;

/// Kind of mark a layer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeomKind {
    /// Draws nothing; trains scales only.
    Blank,
    /// Points.
    Point,
    /// Jittered points.
    Jitter,
    /// Lines connecting points in x order.
    Line,
    /// Lines connecting points in data order.
    Path,
    /// Stairs connecting points in x order.
    Step,
    /// Bars of counts.
    Bar,
    /// Bars of y values.
    Col,
    /// Bars of binned counts.
    Histogram,
    /// Area between 0 and y.
    Area,
    /// Area between ymin and ymax.
    Ribbon,
    /// Rectangles by corners.
    Rect,
    /// Rectangles by center.
    Tile,
    /// Text labels.
    Text,
    /// Horizontal reference lines.
    Hline,
    /// Vertical reference lines.
    Vline,
    /// Sloped reference lines.
    Abline,
    /// Line segments.
    Segment,
    /// Vertical error bars.
    Errorbar,
    /// Box-and-whisker summaries.
    Boxplot,
    /// Fitted curve with confidence band.
    Smooth,
    /// Density outline.
    Density,
    /// Mirrored densities of y.
    Violin,
    /// A point with a vertical range.
    Pointrange,
    /// A box from ymin to ymax with a line at y.
    Crossbar,
    /// Vertical ranges.
    Linerange,
    /// Filled polygons, one per group.
    Polygon,
}

const LINE_DEFAULTS: &[&str] = &["color", "size", "linetype", "alpha"];

impl GeomKind {
    /// Every geometry kind.
    pub const ALL: [Self; 27] = [
        Self::Blank,
        Self::Point,
        Self::Jitter,
        Self::Line,
        Self::Path,
        Self::Step,
        Self::Bar,
        Self::Col,
        Self::Histogram,
        Self::Area,
        Self::Ribbon,
        Self::Rect,
        Self::Tile,
        Self::Text,
        Self::Hline,
        Self::Vline,
        Self::Abline,
        Self::Segment,
        Self::Errorbar,
        Self::Boxplot,
        Self::Smooth,
        Self::Density,
        Self::Violin,
        Self::Pointrange,
        Self::Crossbar,
        Self::Linerange,
        Self::Polygon,
    ];

    /// Short name, e.g. `point`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Point => "point",
            Self::Jitter => "jitter",
            Self::Line => "line",
            Self::Path => "path",
            Self::Step => "step",
            Self::Bar => "bar",
            Self::Col => "col",
            Self::Histogram => "histogram",
            Self::Area => "area",
            Self::Ribbon => "ribbon",
            Self::Rect => "rect",
            Self::Tile => "tile",
            Self::Text => "text",
            Self::Hline => "hline",
            Self::Vline => "vline",
            Self::Abline => "abline",
            Self::Segment => "segment",
            Self::Errorbar => "errorbar",
            Self::Boxplot => "boxplot",
            Self::Smooth => "smooth",
            Self::Density => "density",
            Self::Violin => "violin",
            Self::Pointrange => "pointrange",
            Self::Crossbar => "crossbar",
            Self::Linerange => "linerange",
            Self::Polygon => "polygon",
        }
    }

    /// Look up a kind; the `geom_` prefix is optional.
    pub fn from_name(name: &str) -> Result<Self> {
        let short = name.strip_prefix("geom_").unwrap_or(name);
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == short)
            .ok_or_else(|| Error::UnknownComponent {
                kind: "geom",
                name: short.to_string(),
            })
    }

    /// Aesthetics that must be present when the geometry sets up its data.
    #[must_use]
    pub fn required_aes(self) -> &'static [&'static str] {
        match self {
            Self::Blank => &[],
            Self::Point
            | Self::Jitter
            | Self::Line
            | Self::Path
            | Self::Step
            | Self::Bar
            | Self::Col
            | Self::Histogram
            | Self::Area
            | Self::Tile
            | Self::Smooth
            | Self::Density
            | Self::Violin
            | Self::Polygon => &["x", "y"],
            Self::Ribbon => &["x", "ymin", "ymax"],
            Self::Rect => &["xmin", "xmax", "ymin", "ymax"],
            Self::Text => &["x", "y", "label"],
            Self::Hline => &["yintercept"],
            Self::Vline => &["xintercept"],
            Self::Abline => &["slope", "intercept"],
            Self::Segment => &["x", "y", "xend", "yend"],
            Self::Errorbar | Self::Linerange => &["x", "ymin", "ymax"],
            Self::Pointrange | Self::Crossbar => &["x", "y", "ymin", "ymax"],
            Self::Boxplot => &["x", "lower", "upper", "middle", "ymin", "ymax"],
        }
    }

    /// Values of the aesthetics nobody mapped or set.
    #[must_use]
    pub fn default_aes(self) -> Vec<(&'static str, DataValue)> {
        let grey = |v: u8| DataValue::Color(Rgba::rgb(v, v, v));
        let black = || DataValue::Color(Rgba::BLACK);
        let line = |color: DataValue, size: f64| {
            let values = [color, DataValue::Number(size), DataValue::from("solid"), DataValue::Number(1.0)];
            LINE_DEFAULTS.iter().copied().zip(values).collect::<Vec<_>>()
        };
        let filled = |fill: DataValue, size: f64| {
            let mut out = line(DataValue::Null, size);
            out.push(("fill", fill));
            out
        };
        match self {
            Self::Blank => Vec::new(),
            Self::Point | Self::Jitter => vec![
                ("color", black()),
                ("fill", DataValue::Null),
                ("shape", DataValue::from("o")),
                ("size", DataValue::Number(1.5)),
                ("alpha", DataValue::Number(1.0)),
                ("stroke", DataValue::Number(0.5)),
            ],
            Self::Line
            | Self::Path
            | Self::Step
            | Self::Hline
            | Self::Vline
            | Self::Abline
            | Self::Segment
            | Self::Errorbar
            | Self::Linerange => line(black(), 0.5),
            Self::Bar | Self::Col | Self::Histogram | Self::Rect => filled(grey(89), 0.5),
            Self::Tile => filled(grey(89), 0.1),
            Self::Area | Self::Ribbon | Self::Polygon => filled(grey(51), 0.5),
            Self::Crossbar => {
                let mut out = line(black(), 0.5);
                out.push(("fill", DataValue::Null));
                out
            }
            Self::Pointrange => {
                let mut out = line(black(), 0.5);
                out.push(("fill", DataValue::Null));
                out.push(("shape", DataValue::from("o")));
                out.push(("stroke", DataValue::Number(0.5)));
                out
            }
            Self::Violin => {
                let mut out = line(grey(51), 0.5);
                out.push(("fill", DataValue::Color(Rgba::WHITE)));
                out.push(("weight", DataValue::Number(1.0)));
                out
            }
            Self::Density => {
                let mut out = line(black(), 0.5);
                out.push(("fill", DataValue::Null));
                out.push(("weight", DataValue::Number(1.0)));
                out
            }
            Self::Text => vec![
                ("color", black()),
                ("size", DataValue::Number(11.0)),
                ("alpha", DataValue::Number(1.0)),
                ("angle", DataValue::Number(0.0)),
                ("hjust", DataValue::Number(0.5)),
                ("vjust", DataValue::Number(0.5)),
            ],
            Self::Boxplot => {
                let mut out = line(grey(51), 0.5);
                out.push(("fill", DataValue::Color(Rgba::WHITE)));
                out.push(("shape", DataValue::from("o")));
                out.push(("weight", DataValue::Number(1.0)));
                out
            }
            Self::Smooth => {
                let mut out = line(DataValue::Color(Rgba::rgb(0x33, 0x66, 0xff)), 1.0);
                out.retain(|(name, _)| *name != "alpha");
                out.push(("fill", grey(153)));
                out.push(("alpha", DataValue::Number(0.4)));
                out
            }
        }
    }

    /// The statistic used unless another is given.
    #[must_use]
    pub fn default_stat(self) -> Stat {
        match self {
            Self::Bar => Stat::count(),
            Self::Histogram => Stat::bin(),
            Self::Boxplot => Stat::boxplot(),
            Self::Smooth => Stat::smooth(),
            Self::Density => Stat::density(),
            Self::Violin => Stat::ydensity(),
            _ => Stat::identity(),
        }
    }

    /// The position adjustment used unless another is given.
    #[must_use]
    pub fn default_position(self) -> Position {
        match self {
            Self::Jitter => Position::jitter(),
            Self::Bar | Self::Col | Self::Histogram | Self::Area => Position::stack(),
            Self::Boxplot => Position::dodge2(),
            Self::Violin => Position::dodge(),
            _ => Position::identity(),
        }
    }

    /// Parameters the geometry itself accepts besides `na_rm`.
    #[must_use]
    pub fn extra_params(self) -> &'static [&'static str] {
        match self {
            Self::Bar | Self::Col | Self::Histogram | Self::Errorbar | Self::Violin => &["width"],
            Self::Crossbar => &["width", "fatten"],
            Self::Pointrange => &["fatten"],
            Self::Tile => &["width", "height"],
            Self::Boxplot => &["width", "notch", "varwidth"],
            Self::Step => &["direction"],
            Self::Jitter => &["width", "height", "seed"],
            Self::Text => &["nudge_x", "nudge_y"],
            _ => &[],
        }
    }

    /// True for geometries drawn as connected lines, which keep rows with
    /// missing values as breaks.
    #[must_use]
    pub fn is_path(self) -> bool {
        matches!(self, Self::Line | Self::Path | Self::Step)
    }

    /// True for geometries whose rows are joined into lines or outlines,
    /// which a non-linear coordinate system has to interpolate.
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            Self::Line
                | Self::Path
                | Self::Polygon
                | Self::Area
                | Self::Ribbon
                | Self::Density
                | Self::Smooth
                | Self::Violin
        )
    }

    /// Aesthetics the geometry understands.
    #[must_use]
    pub fn aesthetics(self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = self.required_aes().to_vec();
        out.extend(self.default_aes().into_iter().map(|(name, _)| name));
        out.push("group");
        out
    }

    /// Prepare statistic output for drawing: rectangles get their
    /// corners, connected geometries are put in drawing order.
    ///
    /// # Errors
    ///
    /// [`Error::MissingAesthetics`] when the data lacks a required
    /// aesthetic.
    pub fn setup_data(self, data: DataFrame, params: &Params) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(data);
        }
        let mut data = data;
        match self {
            Self::Bar | Self::Col | Self::Histogram => {
                let width = widths(&data, "width", "x", params, 0.9)?;
                let y = require(&data, "y", self)?;
                let ymin: Vec<f64> = y.iter().map(|v| v.min(0.0)).collect();
                let ymax: Vec<f64> = y.iter().map(|v| v.max(0.0)).collect();
                data.insert("ymin", Column::Number(ymin))?;
                data.insert("ymax", Column::Number(ymax))?;
                span(&mut data, "x", &width)?;
                data.remove("width");
            }
            Self::Boxplot | Self::Violin => {
                let width = widths(&data, "width", "x", params, 0.9)?;
                span(&mut data, "x", &width)?;
                data.remove("width");
            }
            Self::Errorbar | Self::Crossbar => {
                let width = match (data.numbers("width"), params.f64("width")) {
                    (Some(w), _) => w.to_vec(),
                    (None, Some(w)) => vec![w; data.nrow()],
                    (None, None) => vec![0.5; data.nrow()],
                };
                span(&mut data, "x", &width)?;
                data.remove("width");
            }
            Self::Tile => {
                let width = widths(&data, "width", "x", params, 1.0)?;
                let height = widths(&data, "height", "y", params, 1.0)?;
                span(&mut data, "x", &width)?;
                span(&mut data, "y", &height)?;
                data.remove("width");
                data.remove("height");
            }
            Self::Area | Self::Density => {
                data = sort_rows(&data, &["PANEL", "group", "x"]);
                let y = require(&data, "y", self)?;
                data.insert("ymin", Column::Number(vec![0.0; y.len()]))?;
                data.insert("ymax", Column::Number(y))?;
            }
            Self::Line | Self::Step | Self::Ribbon | Self::Smooth => {
                data = sort_rows(&data, &["PANEL", "group", "x"]);
            }
            _ => {}
        }
        Ok(data)
    }
}

/// Numeric copy of a column the geometry cannot do without.
fn require(data: &DataFrame, name: &str, kind: GeomKind) -> Result<Vec<f64>> {
    data.get(name)
        .and_then(Column::to_numbers)
        .ok_or_else(|| Error::MissingAesthetics {
            component: format!("geom_{}", kind.name()),
            missing: vec![name.to_string()],
        })
}

/// Per-row extent along one axis: the `column`, else the parameter of the
/// same name, else `factor` times the resolution of `axis`.
fn widths(data: &DataFrame, column: &str, axis: &str, params: &Params, factor: f64) -> Result<Vec<f64>> {
    if let Some(w) = data.numbers(column) {
        return Ok(w.to_vec());
    }
    if let Some(w) = params.f64(column) {
        return Ok(vec![w; data.nrow()]);
    }
    let values = data.get(axis).and_then(Column::to_numbers).unwrap_or_default();
    Ok(vec![resolution(&values, false) * factor; data.nrow()])
}

/// Set `<axis>min`/`<axis>max` to the center plus or minus half the extent.
fn span(data: &mut DataFrame, axis: &str, extent: &[f64]) -> Result<()> {
    let Some(center) = data.get(axis).and_then(Column::to_numbers) else {
        return Ok(());
    };
    let lo = center.iter().zip(extent).map(|(c, w)| c - w / 2.0).collect();
    let hi = center.iter().zip(extent).map(|(c, w)| c + w / 2.0).collect();
    data.insert(format!("{axis}min"), Column::Number(lo))?;
    data.insert(format!("{axis}max"), Column::Number(hi))
}

/// Stable sort of the rows by the given columns, ignoring absent ones.
pub(crate) fn sort_rows(data: &DataFrame, keys: &[&str]) -> DataFrame {
    let cols: Vec<&Column> = keys.iter().filter_map(|k| data.get(k)).collect();
    let mut order: Vec<usize> = (0..data.nrow()).collect();
    order.sort_by(|&a, &b| {
        cols.iter()
            .map(|c| c.sort_key(a).cmp(&c.sort_key(b)))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    data.take(&order)
}

/// A layer under construction: the geometry plus everything set on it.
#[derive(Debug, Clone)]
pub struct Geom {
    kind: GeomKind,
    mapping: Aes,
    data: Option<DataFrame>,
    stat: Stat,
    position: Position,
    params: Params,
    aes_params: Params,
    inherit_aes: bool,
    show_legend: Option<bool>,
}

macro_rules! geom_constructors {
    ($($(#[$doc:meta])* $fn:ident => $kind:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $fn() -> Self {
                Self::new(GeomKind::$kind)
            }
        )*
    };
}

impl Geom {
    /// A geometry with its default statistic and position.
    #[must_use]
    pub fn new(kind: GeomKind) -> Self {
        Self {
            kind,
            mapping: Aes::new(),
            data: None,
            stat: kind.default_stat(),
            position: kind.default_position(),
            params: Params::new(),
            aes_params: Params::new(),
            inherit_aes: true,
            show_legend: None,
        }
    }

    /// Look up a geometry by name, e.g. `point` or `geom_bar`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.strip_prefix("geom_").unwrap_or(name) {
            "qq" => Ok(Self::qq()),
            "qq_line" => Ok(Self::qq_line()),
            _ => GeomKind::from_name(name).map(Self::new),
        }
    }

    geom_constructors! {
        /// Draw nothing.
        blank => Blank,
        /// Scatter plot points.
        point => Point,
        /// Points with random noise added.
        jitter => Jitter,
        /// Lines ordered by x.
        line => Line,
        /// Lines in data order.
        path => Path,
        /// Stairs.
        step => Step,
        /// Bars of counts.
        bar => Bar,
        /// Bars of y values.
        col => Col,
        /// Histogram bars.
        histogram => Histogram,
        /// Filled area.
        area => Area,
        /// Band between ymin and ymax.
        ribbon => Ribbon,
        /// Rectangles.
        rect => Rect,
        /// Tiles for heatmaps.
        tile => Tile,
        /// Text labels.
        text => Text,
        /// Line segments.
        segment => Segment,
        /// Error bars.
        errorbar => Errorbar,
        /// Box plots.
        boxplot => Boxplot,
        /// Smoothed conditional mean.
        smooth => Smooth,
        /// Kernel density curve.
        density => Density,
        /// Violins of the distribution of y at each x.
        violin => Violin,
        /// Points with vertical ranges.
        pointrange => Pointrange,
        /// Boxes from ymin to ymax with a line at y.
        crossbar => Crossbar,
        /// Vertical ranges.
        linerange => Linerange,
        /// Filled polygons.
        polygon => Polygon,
    }

    /// Sample quantiles against normal quantiles, as points.
    #[must_use]
    pub fn qq() -> Self {
        Self::point().stat(Stat::qq())
    }

    /// Reference line of a quantile-quantile plot.
    #[must_use]
    pub fn qq_line() -> Self {
        Self::path().stat(Stat::qq_line())
    }

    /// A reference line for each mapped or given `yintercept`.
    #[must_use]
    pub fn hline(yintercept: f64) -> Self {
        Self::reference(GeomKind::Hline, &[("yintercept", yintercept)])
    }

    /// A reference line for each mapped or given `xintercept`.
    #[must_use]
    pub fn vline(xintercept: f64) -> Self {
        Self::reference(GeomKind::Vline, &[("xintercept", xintercept)])
    }

    /// The line `y = intercept + slope * x`.
    #[must_use]
    pub fn abline(intercept: f64, slope: f64) -> Self {
        Self::reference(GeomKind::Abline, &[("intercept", intercept), ("slope", slope)])
    }

    /// Reference lines carry their own one-row data and ignore the plot
    /// mapping.
    fn reference(kind: GeomKind, values: &[(&str, f64)]) -> Self {
        let mut geom = Self::new(kind);
        for (name, _) in values {
            geom.mapping.insert(name, (*name).into());
        }
        geom.data = Some(DataFrame::single_row(
            values.iter().map(|(name, value)| (*name, DataValue::Number(*value))),
        ));
        geom.inherit_aes = false;
        geom
    }

    /// Geometry kind.
    #[must_use]
    pub fn kind(&self) -> GeomKind {
        self.kind
    }

    /// Short name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Name used in messages, e.g. `geom_point`.
    #[must_use]
    pub fn component(&self) -> String {
        format!("geom_{}", self.kind.name())
    }

    /// Layer mapping, merged over the plot mapping.
    #[must_use]
    pub fn aes(mut self, mapping: Aes) -> Self {
        self.mapping = self.mapping.merge(&mapping);
        self
    }

    /// Layer data instead of the plot data.
    #[must_use]
    pub fn data(mut self, data: DataFrame) -> Self {
        self.data = Some(data);
        self
    }

    /// Use another statistic.
    #[must_use]
    pub fn stat(mut self, stat: Stat) -> Self {
        self.stat = stat;
        self
    }

    /// Use another position adjustment.
    #[must_use]
    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Ignore the plot mapping.
    #[must_use]
    pub fn inherit_aes(mut self, inherit: bool) -> Self {
        self.inherit_aes = inherit;
        self
    }

    /// Force the layer into or out of legends.
    #[must_use]
    pub fn show_legend(mut self, show: bool) -> Self {
        self.show_legend = Some(show);
        self
    }

    /// Fix an aesthetic to one value for every row, e.g. `color = "red"`.
    ///
    /// Color names and hex strings given for `color` or `fill` are parsed
    /// here.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for aesthetics the geometry does not use;
    /// [`Error::InvalidColor`] for unparsable colors.
    pub fn set(mut self, aesthetic: &str, value: impl Into<DataValue>) -> Result<Self> {
        let name = normalize_aesthetic(aesthetic);
        let allowed = self.kind.aesthetics();
        if !allowed.contains(&name.as_str()) {
            return Err(Error::configuration(&self.component(), &name, &allowed));
        }
        let value = match (name.as_str(), value.into()) {
            ("color" | "fill", DataValue::Text(s)) => DataValue::Color(Rgba::parse(&s)?),
            (_, v) => v,
        };
        self.aes_params.set(&name, value);
        Ok(self)
    }

    /// Set a parameter of the geometry, its statistic or its position.
    ///
    /// Geometry parameters win. `width` also reaches a statistic that
    /// accepts it; jitter and nudge parameters configure the position.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when neither the geometry nor its
    /// statistic accepts `key`.
    pub fn param(mut self, key: &str, value: impl Into<DataValue>) -> Result<Self> {
        let value = value.into();
        let own = self.kind.extra_params();
        if key == "na_rm" || own.contains(&key) {
            match (self.kind, key) {
                (GeomKind::Jitter, _) => {
                    self.position = self.position.param(key, value.clone())?;
                }
                (GeomKind::Text, "nudge_x" | "nudge_y") => {
                    let mut p = self.params.clone();
                    p.set(key, value.clone());
                    self.position =
                        Position::nudge(p.f64("nudge_x").unwrap_or(0.0), p.f64("nudge_y").unwrap_or(0.0));
                }
                _ => {}
            }
            if (key == "width" || key == "na_rm") && self.stat.accepts(key) {
                self.stat = self.stat.param(key, value.clone())?;
            }
            self.params.set(key, value);
            return Ok(self);
        }
        if self.stat.accepts(key) {
            self.stat = self.stat.param(key, value)?;
            return Ok(self);
        }
        let mut allowed: Vec<String> = std::iter::once("na_rm".to_string())
            .chain(own.iter().map(|s| (*s).to_string()))
            .collect();
        allowed.extend(self.stat.allowed_params().into_iter().filter(|p| p != "na_rm"));
        let allowed: Vec<&str> = allowed.iter().map(String::as_str).collect();
        Err(Error::configuration(&self.component(), key, &allowed))
    }

    /// Geometry parameters set so far.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Aesthetics fixed with [`Geom::set`].
    #[must_use]
    pub fn aes_params(&self) -> &Params {
        &self.aes_params
    }

    /// Layer mapping.
    #[must_use]
    pub fn mapping(&self) -> &Aes {
        &self.mapping
    }

    /// The statistic.
    #[must_use]
    pub fn get_stat(&self) -> &Stat {
        &self.stat
    }

    /// The position adjustment.
    #[must_use]
    pub fn get_position(&self) -> &Position {
        &self.position
    }

    /// Split into the parts a layer owns.
    pub(crate) fn into_parts(self) -> GeomParts {
        GeomParts {
            kind: self.kind,
            mapping: self.mapping,
            data: self.data,
            stat: self.stat,
            position: self.position,
            params: self.params,
            aes_params: self.aes_params,
            inherit_aes: self.inherit_aes,
            show_legend: self.show_legend,
        }
    }

    /// Add default values for every aesthetic missing from `data`, then
    /// overwrite with the fixed aesthetics.
    ///
    /// # Errors
    ///
    /// Fails only when a column cannot be inserted.
    pub fn use_defaults(kind: GeomKind, data: &mut DataFrame, aes_params: &Params) -> Result<()> {
        let n = data.nrow();
        for (name, value) in kind.default_aes() {
            if data.has_column(name) {
                continue;
            }
            let col = match (name, &value) {
                ("color" | "fill", DataValue::Null) => Column::Color(vec![None; n]),
                _ => Column::broadcast(&value, n),
            };
            data.insert(name, col)?;
        }
        for (name, value) in aes_params.iter() {
            data.insert(name, Column::broadcast(value, n))?;
        }
        Ok(())
    }

    /// Drop rows missing a required or non-missing aesthetic before
    /// drawing. Connected geometries keep them as breaks.
    #[must_use]
    pub fn handle_na(kind: GeomKind, data: &DataFrame, params: &Params, warnings: &mut Warnings) -> DataFrame {
        if kind.is_path() || kind == GeomKind::Polygon || data.is_empty() {
            return data.clone();
        }
        let mut check: Vec<&str> = kind.required_aes().to_vec();
        check.extend(
            ["size", "shape"]
                .into_iter()
                .filter(|a| data.get(a).is_some_and(|c| !c.is_discrete())),
        );
        remove_missing(data, &check, &format!("geom_{}", kind.name()), params, warnings)
    }
}

/// The pieces of a [`Geom`] a layer takes over.
#[derive(Debug, Clone)]
pub(crate) struct GeomParts {
    pub(crate) kind: GeomKind,
    pub(crate) mapping: Aes,
    pub(crate) data: Option<DataFrame>,
    pub(crate) stat: Stat,
    pub(crate) position: Position,
    pub(crate) params: Params,
    pub(crate) aes_params: Params,
    pub(crate) inherit_aes: bool,
    pub(crate) show_legend: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_kind() {
        let bar = Geom::bar();
        assert_eq!(bar.get_stat().name(), "count");
        assert_eq!(bar.get_position().name(), "stack");
        assert_eq!(Geom::boxplot().get_position().name(), "dodge2");
        assert_eq!(Geom::violin().get_stat().name(), "ydensity");
        assert_eq!(Geom::violin().get_position().name(), "dodge");
        assert_eq!(Geom::from_name("geom_qq").unwrap().get_stat().name(), "qq");
        assert_eq!(Geom::from_name("qq_line").unwrap().kind(), GeomKind::Path);
        assert_eq!(Geom::point().get_stat().name(), "identity");
        for kind in GeomKind::ALL {
            assert_eq!(GeomKind::from_name(kind.name()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_geom() {
        let err = Geom::from_name("geom_spiral").unwrap_err();
        assert!(err.to_string().contains("spiral"));
    }

    #[test]
    fn test_params_route_to_stat() {
        let hist = Geom::histogram().param("bins", 10.0).unwrap();
        assert_eq!(hist.get_stat().params().usize("bins"), Some(10));
        let bar = Geom::bar().param("width", 0.5).unwrap();
        assert_eq!(bar.params().f64("width"), Some(0.5));
        assert_eq!(bar.get_stat().params().f64("width"), Some(0.5));
        let err = Geom::point().param("bins", 3.0).unwrap_err();
        assert!(matches!(err, Error::Configuration { ref param, .. } if param == "bins"));
    }

    #[test]
    fn test_jitter_params_reach_position() {
        let g = Geom::jitter().param("width", 0.1).unwrap();
        assert_eq!(g.get_position().params().f64("width"), Some(0.1));
        let t = Geom::text().param("nudge_y", 2.0).unwrap();
        assert_eq!(t.get_position().name(), "nudge");
    }

    #[test]
    fn test_set_checks_aesthetic() {
        let g = Geom::point().set("colour", "red").unwrap();
        assert_eq!(g.aes_params().get("color"), Some(&DataValue::Color(Rgba::RED)));
        assert!(Geom::point().set("linetype", "dashed").is_err());
        assert!(matches!(Geom::point().set("color", "nocolor"), Err(Error::InvalidColor(_))));
    }

    #[test]
    fn test_bar_setup_data() {
        let data = DataFrame::new()
            .with_column("x", vec![1.0, 2.0])
            .unwrap()
            .with_column("y", vec![3.0, -1.0])
            .unwrap();
        let out = GeomKind::Bar.setup_data(data, &Params::new()).unwrap();
        assert_eq!(out.numbers("ymin").unwrap(), &[0.0, -1.0]);
        assert_eq!(out.numbers("ymax").unwrap(), &[3.0, 0.0]);
        assert_eq!(out.numbers("xmin").unwrap(), &[0.55, 1.55]);
        assert!(!out.has_column("width"));
    }

    #[test]
    fn test_crossbar_and_violin_setup_data() {
        let data = DataFrame::new()
            .with_column("x", vec![1.0, 2.0])
            .unwrap()
            .with_column("y", vec![3.0, 4.0])
            .unwrap();
        let crossbar = GeomKind::Crossbar.setup_data(data.clone(), &Params::new()).unwrap();
        assert_eq!(crossbar.numbers("xmin").unwrap(), &[0.75, 1.75]);
        assert_eq!(crossbar.numbers("xmax").unwrap(), &[1.25, 2.25]);
        let wide = GeomKind::Crossbar
            .setup_data(data.clone(), &Params::new().with("width", 0.2))
            .unwrap();
        assert_eq!(wide.numbers("xmax").unwrap(), &[1.1, 2.1]);

        let violin = GeomKind::Violin.setup_data(data, &Params::new()).unwrap();
        assert_eq!(violin.numbers("xmin").unwrap(), &[0.55, 1.55]);
        assert!(!violin.has_column("width"));
    }

    #[test]
    fn test_polygon_keeps_missing_rows_and_order() {
        let data = DataFrame::new()
            .with_column("x", vec![0.0, 1.0, f64::NAN, 0.0])
            .unwrap()
            .with_column("y", vec![0.0, 0.0, 1.0, 1.0])
            .unwrap();
        let out = GeomKind::Polygon.setup_data(data.clone(), &Params::new()).unwrap();
        assert_eq!(out.numbers("y").unwrap(), &[0.0, 0.0, 1.0, 1.0]);
        let mut warnings = Warnings::new();
        let kept = Geom::handle_na(GeomKind::Polygon, &out, &Params::new(), &mut warnings);
        assert_eq!(kept.nrow(), 4);
        assert!(warnings.is_empty());
        assert!(GeomKind::Polygon.is_connected() && !GeomKind::Polygon.is_path());
    }

    #[test]
    fn test_line_sorts_by_x_within_group() {
        let data = DataFrame::new()
            .with_column("x", vec![3.0, 1.0, 2.0])
            .unwrap()
            .with_column("y", vec![30.0, 10.0, 20.0])
            .unwrap()
            .with_column("group", vec![1.0, 1.0, 1.0])
            .unwrap();
        let out = GeomKind::Line.setup_data(data, &Params::new()).unwrap();
        assert_eq!(out.numbers("y").unwrap(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_reference_lines_carry_data() {
        let g = Geom::hline(3.0);
        let parts = g.into_parts();
        assert!(!parts.inherit_aes);
        assert_eq!(parts.data.unwrap().numbers("yintercept").unwrap(), &[3.0]);
        assert!(parts.mapping.contains("yintercept"));
        let data = Geom::abline(1.0, 2.0).into_parts().data.unwrap();
        assert_eq!(data.nrow(), 1);
        assert_eq!(data.numbers("slope").unwrap(), &[2.0]);
    }

    #[test]
    fn test_use_defaults_then_aes_params() {
        let mut data = DataFrame::new().with_column("x", vec![1.0, 2.0]).unwrap();
        let fixed = Params::new().with("size", 4.0);
        Geom::use_defaults(GeomKind::Point, &mut data, &fixed).unwrap();
        assert_eq!(data.get("color").unwrap().get(0), DataValue::Color(Rgba::BLACK));
        assert_eq!(data.numbers("size").unwrap(), &[4.0, 4.0]);
        assert!(data.get("fill").unwrap().is_missing(0));
    }

    #[test]
    fn test_handle_na_drops_rows() {
        let data = DataFrame::new()
            .with_column("x", vec![1.0, f64::NAN])
            .unwrap()
            .with_column("y", vec![1.0, 2.0])
            .unwrap();
        let mut warnings = Warnings::new();
        let out = Geom::handle_na(GeomKind::Point, &data, &Params::new(), &mut warnings);
        assert_eq!(out.nrow(), 1);
        assert_eq!(warnings.len(), 1);
        let kept = Geom::handle_na(GeomKind::Line, &data, &Params::new(), &mut warnings);
        assert_eq!(kept.nrow(), 2);
    }
}
