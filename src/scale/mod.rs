//! Scales: trainable mappings from data values to aesthetic values.
//!
//! A scale starts **untrained**. Every [`Scale::train`] call widens its
//! continuous range or extends its category list; user limits mask the
//! trained range when present but never stop training.
//!
//! Continuous mapping rescales into `[0, 1]` by the limits, applies the
//! out-of-bounds policy, runs the palette and substitutes `na_value` for
//! missing results. Discrete mapping looks each value up in the ordered
//! categories and indexes an `n`-value palette built for exactly those
//! categories.

pub mod breaks;
mod collection;
pub mod linear;
pub mod palette;
pub mod transform;

pub use breaks::{expand_range, nice_breaks, Expansion};
pub use collection::{is_scaled_aes, Scales};
pub use linear::LinearScale;
pub use palette::Palette;
pub use transform::Transform;

use crate::color::Rgba;
use crate::data::{format_number, Column, DataValue};
use crate::error::{Error, Result};
use crate::grammar::aes::normalize_aesthetic;
use crate::warning::{PlotWarning, Warnings};
use breaks::{censor, finite_range, format_datetime, rescale, squish};

/// Aesthetics trained by x scales.
pub const X_AES: &[&str] = &["x", "xmin", "xmax", "xend", "xintercept"];

/// Aesthetics trained by y scales.
pub const Y_AES: &[&str] = &[
    "y",
    "ymin",
    "ymax",
    "yend",
    "yintercept",
    "lower",
    "middle",
    "upper",
];

/// True for aesthetics handled by x or y scales.
#[must_use]
pub fn is_position_aes(aesthetic: &str) -> bool {
    X_AES.contains(&aesthetic) || Y_AES.contains(&aesthetic)
}

/// The family an aesthetic belongs to: `x`, `y` or the aesthetic itself.
#[must_use]
pub fn aes_family(aesthetic: &str) -> &str {
    if X_AES.contains(&aesthetic) {
        "x"
    } else if Y_AES.contains(&aesthetic) {
        "y"
    } else {
        aesthetic
    }
}

/// What kind of values a scale trains on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleKind {
    /// Numbers.
    Continuous,
    /// Categories.
    Discrete,
    /// Epoch seconds.
    Datetime,
}

/// Treatment of values outside the limits of a continuous scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfBounds {
    /// Replace with missing.
    #[default]
    Censor,
    /// Clamp to the nearest limit.
    Squish,
    /// Leave as is.
    Keep,
}

/// User limits.
#[derive(Debug, Clone, PartialEq)]
pub enum Limits {
    /// Data-space interval of a continuous scale.
    Continuous(f64, f64),
    /// Categories of a discrete scale, in display order.
    Discrete(Vec<String>),
}

/// Break selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Breaks {
    /// Computed from the limits.
    #[default]
    Auto,
    /// No breaks.
    None,
    /// Explicit data-space break values.
    Values(Vec<f64>),
    /// Explicit categories of a discrete scale.
    Categories(Vec<String>),
}

/// Break label selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Labels {
    /// Formatted from the break values.
    #[default]
    Auto,
    /// No labels.
    None,
    /// Explicit labels, one per break.
    Values(Vec<String>),
}

/// Guide requested for a scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideKind {
    /// Keyed legend.
    Legend,
    /// Continuous color bar.
    Colorbar,
    /// No guide.
    None,
}

/// A scale for one or more aesthetics.
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    aesthetics: Vec<String>,
    kind: ScaleKind,
    name: Option<String>,
    limits: Option<Limits>,
    breaks: Breaks,
    labels: Labels,
    transform: Transform,
    palette: Palette,
    expand: Option<Expansion>,
    oob: OutOfBounds,
    na_value: DataValue,
    na_translate: bool,
    drop: bool,
    guide: GuideKind,
    // trained state; for discrete scales `range` holds continuous values
    // seen by a discrete position scale
    range: Option<(f64, f64)>,
    categories: Vec<String>,
    ordered: bool,
}

impl Scale {
    fn with_kind(aesthetic: &str, kind: ScaleKind) -> Self {
        let aesthetic = normalize_aesthetic(aesthetic);
        let family = aes_family(&aesthetic).to_string();
        let aesthetics: Vec<String> = match family.as_str() {
            "x" => X_AES.iter().map(|s| (*s).to_string()).collect(),
            "y" => Y_AES.iter().map(|s| (*s).to_string()).collect(),
            _ => vec![aesthetic],
        };
        let continuous = kind != ScaleKind::Discrete;
        let palette = match (family.as_str(), continuous) {
            ("color" | "fill", true) => Palette::gradient(),
            ("color" | "fill", false) => Palette::hue(),
            ("size", _) => Palette::Area { low: 1.0, high: 6.0 },
            ("alpha", _) => Palette::Rescale { low: 0.1, high: 1.0 },
            ("shape", false) => Palette::Shapes,
            ("linetype", false) => Palette::Linetypes,
            _ => Palette::Identity,
        };
        let na_value = match family.as_str() {
            "color" | "fill" => DataValue::Color(Rgba::NA_GREY),
            _ => DataValue::Null,
        };
        let guide = match (family.as_str(), continuous) {
            ("x" | "y", _) => GuideKind::None,
            ("color" | "fill", true) => GuideKind::Colorbar,
            _ => GuideKind::Legend,
        };
        Self {
            aesthetics,
            kind,
            name: None,
            limits: None,
            breaks: Breaks::Auto,
            labels: Labels::Auto,
            transform: if kind == ScaleKind::Datetime {
                Transform::Datetime
            } else {
                Transform::Identity
            },
            palette,
            expand: None,
            oob: OutOfBounds::Censor,
            na_value,
            na_translate: true,
            drop: true,
            guide,
            range: None,
            categories: Vec::new(),
            ordered: false,
        }
    }

    /// Continuous scale for `aesthetic` with its family's default palette.
    #[must_use]
    pub fn continuous(aesthetic: &str) -> Self {
        Self::with_kind(aesthetic, ScaleKind::Continuous)
    }

    /// Discrete scale for `aesthetic` with its family's default palette.
    #[must_use]
    pub fn discrete(aesthetic: &str) -> Self {
        Self::with_kind(aesthetic, ScaleKind::Discrete)
    }

    /// Date-time scale for `aesthetic`.
    #[must_use]
    pub fn datetime(aesthetic: &str) -> Self {
        Self::with_kind(aesthetic, ScaleKind::Datetime)
    }

    /// Continuous x scale.
    #[must_use]
    pub fn x_continuous() -> Self {
        Self::continuous("x")
    }

    /// Continuous y scale.
    #[must_use]
    pub fn y_continuous() -> Self {
        Self::continuous("y")
    }

    /// Discrete x scale.
    #[must_use]
    pub fn x_discrete() -> Self {
        Self::discrete("x")
    }

    /// Discrete y scale.
    #[must_use]
    pub fn y_discrete() -> Self {
        Self::discrete("y")
    }

    /// Base 10 logarithmic x scale.
    #[must_use]
    pub fn x_log10() -> Self {
        Self::continuous("x").transform(Transform::Log10)
    }

    /// Base 10 logarithmic y scale.
    #[must_use]
    pub fn y_log10() -> Self {
        Self::continuous("y").transform(Transform::Log10)
    }

    /// Square-root x scale.
    #[must_use]
    pub fn x_sqrt() -> Self {
        Self::continuous("x").transform(Transform::Sqrt)
    }

    /// Square-root y scale.
    #[must_use]
    pub fn y_sqrt() -> Self {
        Self::continuous("y").transform(Transform::Sqrt)
    }

    /// Reversed x scale.
    #[must_use]
    pub fn x_reverse() -> Self {
        Self::continuous("x").transform(Transform::Reverse)
    }

    /// Reversed y scale.
    #[must_use]
    pub fn y_reverse() -> Self {
        Self::continuous("y").transform(Transform::Reverse)
    }

    /// Two-color gradient for `aesthetic` (`color` or `fill`).
    #[must_use]
    pub fn gradient(aesthetic: &str, low: Rgba, high: Rgba) -> Self {
        Self::continuous(aesthetic).palette(Palette::Gradient(vec![low, high]))
    }

    /// Diverging gradient through `mid`.
    #[must_use]
    pub fn gradient2(aesthetic: &str, low: Rgba, mid: Rgba, high: Rgba) -> Self {
        Self::continuous(aesthetic).palette(Palette::Gradient(vec![low, mid, high]))
    }

    /// Viridis gradient for `aesthetic`.
    #[must_use]
    pub fn viridis(aesthetic: &str) -> Self {
        Self::continuous(aesthetic).palette(Palette::viridis())
    }

    /// Evenly spaced hues for `aesthetic`.
    #[must_use]
    pub fn hue(aesthetic: &str) -> Self {
        Self::discrete(aesthetic)
    }

    /// Discrete scale with explicit values, used in category order.
    #[must_use]
    pub fn manual(aesthetic: &str, values: Vec<DataValue>) -> Self {
        Self::discrete(aesthetic).palette(Palette::Manual(values))
    }

    /// Scale whose data already holds aesthetic values; trains nothing
    /// visible and shows no guide.
    #[must_use]
    pub fn identity(aesthetic: &str) -> Self {
        let mut s = Self::discrete(aesthetic).palette(Palette::Identity);
        s.guide = GuideKind::None;
        s
    }

    /// Look up a scale by its registry name, such as `x_log10`,
    /// `color_gradient` or `shape_discrete`.
    pub fn from_name(name: &str) -> Result<Self> {
        let unknown = || Error::UnknownComponent {
            kind: "scale",
            name: name.to_string(),
        };
        let stripped = name.strip_prefix("scale_").unwrap_or(name);
        let (aesthetic, variant) = stripped.split_once('_').ok_or_else(unknown)?;
        let aesthetic = normalize_aesthetic(aesthetic);
        let position = aesthetic == "x" || aesthetic == "y";
        let colorish = aesthetic == "color" || aesthetic == "fill";
        let known = ["x", "y", "color", "fill", "size", "alpha", "shape", "linetype"];
        if !known.contains(&aesthetic.as_str()) {
            return Err(unknown());
        }
        let scale = match variant {
            "continuous" if aesthetic != "shape" && aesthetic != "linetype" => {
                Self::continuous(&aesthetic)
            }
            "discrete" => Self::discrete(&aesthetic),
            "datetime" | "date" if position => Self::datetime(&aesthetic),
            "log10" if position => Self::continuous(&aesthetic).transform(Transform::Log10),
            "sqrt" if position => Self::continuous(&aesthetic).transform(Transform::Sqrt),
            "reverse" if position => Self::continuous(&aesthetic).transform(Transform::Reverse),
            "gradient" if colorish => Self::continuous(&aesthetic),
            "gradient2" if colorish => Self::gradient2(
                &aesthetic,
                Rgba::rgb(178, 24, 43),
                Rgba::WHITE,
                Rgba::rgb(33, 102, 172),
            ),
            "viridis" if colorish => Self::viridis(&aesthetic),
            "hue" if colorish => Self::hue(&aesthetic),
            "manual" if !position => Self::manual(&aesthetic, Vec::new()),
            "identity" if !position => Self::identity(&aesthetic),
            _ => return Err(unknown()),
        };
        Ok(scale)
    }

    /// Apply a `key=value` option, as given on the command line.
    pub fn set_param(&mut self, key: &str, value: &DataValue) -> Result<()> {
        const ALLOWED: &[&str] = &[
            "name",
            "limits",
            "breaks",
            "labels",
            "trans",
            "palette",
            "low",
            "mid",
            "high",
            "values",
            "range",
            "expand",
            "oob",
            "na_value",
            "na_translate",
            "drop",
            "guide",
        ];
        let component = format!("scale_{}", self.primary());
        let text = value.to_label();
        let list = || -> Vec<String> {
            text.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };
        let numbers = |param: &str| -> Result<Vec<f64>> {
            list()
                .iter()
                .map(|s| {
                    s.parse::<f64>().map_err(|_| {
                        Error::invalid_parameter(&component, param, format!("'{s}' is not a number"))
                    })
                })
                .collect()
        };
        let color = |param: &str, s: &str| -> Result<Rgba> {
            Rgba::parse(s).map_err(|e| Error::invalid_parameter(&component, param, e.to_string()))
        };
        let pair = |param: &str| -> Result<(f64, f64)> {
            match numbers(param)?.as_slice() {
                [lo, hi] => Ok((*lo, *hi)),
                _ => Err(Error::invalid_parameter(&component, param, "expected two numbers")),
            }
        };
        match key {
            "name" => self.name = Some(text.clone()),
            "limits" => {
                self.limits = Some(if self.kind == ScaleKind::Discrete {
                    Limits::Discrete(list())
                } else {
                    let (lo, hi) = pair(key)?;
                    Limits::Continuous(lo, hi)
                });
            }
            "breaks" => {
                self.breaks = match text.as_str() {
                    "none" | "NA" => Breaks::None,
                    _ if self.kind == ScaleKind::Discrete => Breaks::Categories(list()),
                    _ => Breaks::Values(numbers(key)?),
                }
            }
            "labels" => {
                self.labels = match text.as_str() {
                    "none" | "NA" => Labels::None,
                    _ => Labels::Values(list()),
                }
            }
            "trans" => self.transform = Transform::from_name(&text)?,
            "palette" => self.palette = Palette::preset(&text)?,
            "low" | "mid" | "high" => {
                let c = color(key, &text)?;
                let mut stops = match &self.palette {
                    Palette::Gradient(stops) => stops.clone(),
                    _ => vec![palette::GRADIENT_LOW, palette::GRADIENT_HIGH],
                };
                match key {
                    "low" => {
                        if let Some(first) = stops.first_mut() {
                            *first = c;
                        }
                    }
                    "high" => {
                        if let Some(last) = stops.last_mut() {
                            *last = c;
                        }
                    }
                    _ => {
                        if stops.len() == 3 {
                            stops[1] = c;
                        } else {
                            stops.insert(1, c);
                        }
                    }
                }
                self.palette = Palette::Gradient(stops);
            }
            "values" => {
                self.palette = Palette::Manual(
                    list()
                        .into_iter()
                        .map(|s| match s.parse::<f64>() {
                            Ok(v) => DataValue::Number(v),
                            Err(_) => DataValue::Text(s),
                        })
                        .collect(),
                );
            }
            "range" => {
                let (low, high) = pair(key)?;
                self.palette = match self.palette {
                    Palette::Area { .. } => Palette::Area { low, high },
                    _ => Palette::Rescale { low, high },
                };
            }
            "expand" => {
                let (mult, add) = pair(key)?;
                self.expand = Some(Expansion { mult, add });
            }
            "oob" => {
                self.oob = match text.as_str() {
                    "censor" => OutOfBounds::Censor,
                    "squish" => OutOfBounds::Squish,
                    "keep" => OutOfBounds::Keep,
                    _ => {
                        return Err(Error::invalid_parameter(
                            &component,
                            key,
                            "expected censor, squish or keep",
                        ))
                    }
                }
            }
            "na_value" => {
                self.na_value = match value.as_color() {
                    Some(c) => DataValue::Color(c),
                    None => value.clone(),
                }
            }
            "na_translate" | "drop" => {
                let flag = crate::grammar::params::Params::new()
                    .with(key, value.clone())
                    .bool(key)
                    .ok_or_else(|| Error::invalid_parameter(&component, key, "expected a boolean"))?;
                if key == "drop" {
                    self.drop = flag;
                } else {
                    self.na_translate = flag;
                }
            }
            "guide" => {
                self.guide = match text.as_str() {
                    "legend" => GuideKind::Legend,
                    "colorbar" | "colourbar" => GuideKind::Colorbar,
                    "none" => GuideKind::None,
                    _ => {
                        return Err(Error::invalid_parameter(
                            &component,
                            key,
                            "expected legend, colorbar or none",
                        ))
                    }
                }
            }
            _ => return Err(Error::configuration(&component, key, ALLOWED)),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Builders
    // ------------------------------------------------------------------

    /// Set the axis or legend title.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set continuous limits in data space.
    #[must_use]
    pub fn limits(mut self, lo: f64, hi: f64) -> Self {
        self.limits = Some(Limits::Continuous(lo, hi));
        self
    }

    /// Set discrete limits; only these categories are shown, in this order.
    #[must_use]
    pub fn discrete_limits<S: Into<String>>(mut self, categories: Vec<S>) -> Self {
        self.limits = Some(Limits::Discrete(
            categories.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Set the breaks.
    #[must_use]
    pub fn breaks(mut self, breaks: Breaks) -> Self {
        self.breaks = breaks;
        self
    }

    /// Set the break labels.
    #[must_use]
    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Set the value transform.
    #[must_use]
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the palette.
    #[must_use]
    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Set the range expansion.
    #[must_use]
    pub fn expand(mut self, expand: Expansion) -> Self {
        self.expand = Some(expand);
        self
    }

    /// Set the out-of-bounds policy.
    #[must_use]
    pub fn oob(mut self, oob: OutOfBounds) -> Self {
        self.oob = oob;
        self
    }

    /// Set the value used for missing results.
    #[must_use]
    pub fn na_value(mut self, value: impl Into<DataValue>) -> Self {
        self.na_value = value.into();
        self
    }

    /// Whether missing categories map to `na_value` (otherwise their rows
    /// are dropped).
    #[must_use]
    pub fn na_translate(mut self, translate: bool) -> Self {
        self.na_translate = translate;
        self
    }

    /// Whether unused categorical levels are dropped.
    #[must_use]
    pub fn drop(mut self, drop: bool) -> Self {
        self.drop = drop;
        self
    }

    /// Set the guide.
    #[must_use]
    pub fn guide(mut self, guide: GuideKind) -> Self {
        self.guide = guide;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// All aesthetics handled by the scale.
    #[must_use]
    pub fn aesthetics(&self) -> &[String] {
        &self.aesthetics
    }

    /// The first aesthetic, used to name the scale.
    #[must_use]
    pub fn primary(&self) -> &str {
        self.aesthetics.first().map_or("", String::as_str)
    }

    /// True when the scale handles `aesthetic`.
    #[must_use]
    pub fn handles(&self, aesthetic: &str) -> bool {
        self.aesthetics.iter().any(|a| a == aesthetic)
    }

    /// True for x and y scales.
    #[must_use]
    pub fn is_position(&self) -> bool {
        is_position_aes(self.primary())
    }

    /// Scale kind.
    #[must_use]
    pub fn kind(&self) -> ScaleKind {
        self.kind
    }

    /// True for discrete scales.
    #[must_use]
    pub fn is_discrete(&self) -> bool {
        self.kind == ScaleKind::Discrete
    }

    /// Title set by the user.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Value transform.
    #[must_use]
    pub fn value_transform(&self) -> Transform {
        self.transform
    }

    /// Palette.
    #[must_use]
    pub fn palette_ref(&self) -> &Palette {
        &self.palette
    }

    /// Requested guide.
    #[must_use]
    pub fn guide_kind(&self) -> GuideKind {
        self.guide
    }

    /// User limits.
    #[must_use]
    pub fn user_limits(&self) -> Option<&Limits> {
        self.limits.as_ref()
    }

    /// Trained continuous range in transformed space.
    #[must_use]
    pub fn trained_range(&self) -> Option<(f64, f64)> {
        self.range
    }

    /// Trained categories.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// True when the scale has neither trained state nor limits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_none() && self.categories.is_empty() && self.limits.is_none()
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// An untrained copy with the same settings.
    #[must_use]
    pub fn fresh(&self) -> Self {
        let mut s = self.clone();
        s.range = None;
        s.categories.clear();
        s.ordered = false;
        s
    }

    /// Forget the continuous range; discrete categories are kept.
    pub fn reset(&mut self) {
        self.range = None;
    }

    /// Train on a column in transformed space.
    ///
    /// # Errors
    ///
    /// Discrete data given to a continuous scale.
    pub fn train(&mut self, column: &Column) -> Result<()> {
        if column.is_empty() || matches!(column, Column::Color(_)) {
            return Ok(());
        }
        match self.kind {
            ScaleKind::Continuous | ScaleKind::Datetime => {
                if column.is_discrete() {
                    return Err(Error::Data(format!(
                        "discrete values ({}) supplied to the continuous '{}' scale",
                        column.type_name(),
                        self.primary()
                    )));
                }
                self.train_range(column);
            }
            ScaleKind::Discrete => {
                if self.is_position() && !column.is_discrete() {
                    self.train_range(column);
                } else {
                    self.train_categories(column);
                }
            }
        }
        Ok(())
    }

    fn train_range(&mut self, column: &Column) {
        let Some(values) = column.to_numbers() else {
            return;
        };
        if let Some((lo, hi)) = finite_range(&values) {
            self.range = Some(match self.range {
                Some((a, b)) => (a.min(lo), b.max(hi)),
                None => (lo, hi),
            });
        }
    }

    fn train_categories(&mut self, column: &Column) {
        let new: Vec<String> = match column {
            Column::Categorical(c) if !self.drop => c.levels().to_vec(),
            other => other.categories(),
        };
        let from_levels = matches!(column, Column::Categorical(_));
        let before = self.categories.len();
        for c in new {
            if !self.categories.contains(&c) {
                self.categories.push(c);
            }
        }
        if from_levels {
            self.ordered = true;
        } else if !self.ordered && before > 0 && self.categories.len() > before {
            sort_categories(&mut self.categories);
        }
    }

    /// Move a column into transformed space.
    ///
    /// Date-times become plain numbers; discrete scales leave data alone.
    #[must_use]
    pub fn transform_column(&self, column: &Column) -> Column {
        if self.kind == ScaleKind::Discrete {
            return column.clone();
        }
        match column {
            Column::Number(v) | Column::DateTime(v) => {
                Column::Number(v.iter().map(|x| self.transform.transform(*x)).collect())
            }
            other => other.clone(),
        }
    }

    /// Limits of a continuous scale in transformed space.
    #[must_use]
    pub fn continuous_limits(&self) -> Option<(f64, f64)> {
        match &self.limits {
            Some(Limits::Continuous(lo, hi)) => {
                let (a, b) = (self.transform.transform(*lo), self.transform.transform(*hi));
                Some(if a <= b { (a, b) } else { (b, a) })
            }
            _ => self.range,
        }
    }

    /// Categories of a discrete scale in display order.
    #[must_use]
    pub fn discrete_limits_list(&self) -> &[String] {
        match &self.limits {
            Some(Limits::Discrete(c)) => c,
            _ => &self.categories,
        }
    }

    /// Expansion in effect.
    #[must_use]
    pub fn expansion(&self) -> Expansion {
        self.expand.unwrap_or(if self.is_discrete() {
            Expansion::DISCRETE
        } else {
            Expansion::CONTINUOUS
        })
    }

    /// Expanded extent of a position scale in transformed space.
    #[must_use]
    pub fn dimension(&self) -> (f64, f64) {
        self.dimension_with(self.expansion())
    }

    /// Extent under an explicit expansion.
    #[must_use]
    pub fn dimension_with(&self, expand: Expansion) -> (f64, f64) {
        if self.is_discrete() {
            let n = self.discrete_limits_list().len();
            let disc = if n == 0 {
                (0.0, 1.0)
            } else {
                expand_range((1.0, n as f64), expand)
            };
            match self.range {
                Some(rc) => {
                    let c = expand_range(rc, expand);
                    if n == 0 {
                        c
                    } else {
                        (disc.0.min(c.0), disc.1.max(c.1))
                    }
                }
                None => disc,
            }
        } else {
            expand_range(self.continuous_limits().unwrap_or((0.0, 1.0)), expand)
        }
    }

    // ------------------------------------------------------------------
    // Mapping
    // ------------------------------------------------------------------

    /// Map a transformed column to aesthetic values.
    ///
    /// Position scales keep numbers: discrete categories become their
    /// 1-based index. Other scales run their palette.
    pub fn map(&self, column: &Column, warnings: &mut Warnings) -> Result<Column> {
        if matches!(column, Column::Color(_)) {
            return Ok(column.clone());
        }
        if self.is_position() {
            return Ok(self.map_position(column));
        }
        let values: Vec<DataValue> = match self.kind {
            ScaleKind::Discrete => self.map_discrete(column, warnings),
            ScaleKind::Continuous | ScaleKind::Datetime => {
                let Some(nums) = column.to_numbers() else {
                    return Err(Error::Data(format!(
                        "cannot map {} values through the continuous '{}' scale",
                        column.type_name(),
                        self.primary()
                    )));
                };
                let limits = self.continuous_limits().unwrap_or((0.0, 1.0));
                nums.iter()
                    .map(|v| {
                        let t = self.apply_oob(rescale(*v, limits));
                        match self.palette {
                            Palette::Identity => DataValue::Number(*v),
                            _ => self.palette.continuous(t),
                        }
                    })
                    .map(|v| if v.is_missing() { self.na_value.clone() } else { v })
                    .collect()
            }
        };
        let colorish = matches!(aes_family(self.primary()), "color" | "fill");
        let values: Vec<DataValue> = if colorish {
            values
                .into_iter()
                .map(|v| match v.as_color() {
                    Some(c) => DataValue::Color(c),
                    None => v,
                })
                .collect()
        } else {
            values
        };
        Column::from_values(&values)
    }

    fn apply_oob(&self, t: f64) -> f64 {
        match self.oob {
            OutOfBounds::Censor => censor(t),
            OutOfBounds::Squish => squish(t),
            OutOfBounds::Keep => t,
        }
    }

    fn map_position(&self, column: &Column) -> Column {
        if column.is_discrete() {
            let cats = self.discrete_limits_list();
            let labels = column.labels();
            return Column::Number(
                labels
                    .iter()
                    .map(|l| {
                        l.as_ref()
                            .and_then(|l| cats.iter().position(|c| c == l))
                            .map_or(f64::NAN, |i| (i + 1) as f64)
                    })
                    .collect(),
            );
        }
        let Some(nums) = column.to_numbers() else {
            return column.clone();
        };
        let user_limits = matches!(self.limits, Some(Limits::Continuous(..)));
        if self.is_discrete() || !user_limits || self.oob == OutOfBounds::Keep {
            return Column::Number(nums);
        }
        let limits = self.continuous_limits().unwrap_or((0.0, 1.0));
        let width = limits.1 - limits.0;
        Column::Number(
            nums.iter()
                .map(|v| {
                    let t = self.apply_oob(rescale(*v, limits));
                    if t.is_nan() {
                        f64::NAN
                    } else {
                        limits.0 + t * width
                    }
                })
                .collect(),
        )
    }

    fn map_discrete(&self, column: &Column, warnings: &mut Warnings) -> Vec<DataValue> {
        let cats = self.discrete_limits_list();
        let n = cats.len();
        if let Some(cap) = self.palette.capacity() {
            if n > cap && cap > 0 {
                warnings.push(PlotWarning::PaletteExhausted {
                    aesthetic: self.primary().to_string(),
                    needed: n,
                    available: cap,
                });
            }
        }
        let pal = self.palette.discrete(n);
        let na = if self.na_translate {
            self.na_value.clone()
        } else {
            DataValue::Null
        };
        column
            .labels()
            .iter()
            .map(|label| {
                let idx = label
                    .as_ref()
                    .and_then(|l| cats.iter().position(|c| c == l));
                match (idx, &self.palette) {
                    (Some(_), Palette::Identity) => column_value_for(label.as_deref()),
                    (Some(i), _) => pal.get(i).cloned().unwrap_or_else(|| na.clone()),
                    (None, _) => na.clone(),
                }
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Breaks and labels
    // ------------------------------------------------------------------

    /// Break positions in mapped space.
    ///
    /// Continuous scales return transformed values inside the limits;
    /// discrete position scales return category indices.
    #[must_use]
    pub fn get_breaks(&self) -> Vec<f64> {
        if self.is_discrete() {
            let cats = self.discrete_limits_list();
            return match &self.breaks {
                Breaks::None => Vec::new(),
                Breaks::Categories(chosen) => cats
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| chosen.contains(c))
                    .map(|(i, _)| (i + 1) as f64)
                    .collect(),
                _ => (1..=cats.len()).map(|i| i as f64).collect(),
            };
        }
        let Some((lo, hi)) = self.continuous_limits() else {
            return Vec::new();
        };
        let eps = (hi - lo).abs() * 1e-10;
        let inside = |b: &f64| b.is_finite() && *b >= lo - eps && *b <= hi + eps;
        match &self.breaks {
            Breaks::None | Breaks::Categories(_) => Vec::new(),
            Breaks::Values(v) => v
                .iter()
                .map(|b| self.transform.transform(*b))
                .filter(inside)
                .collect(),
            Breaks::Auto => {
                let (a, b) = (self.transform.inverse(lo), self.transform.inverse(hi));
                let mut out: Vec<f64> = self
                    .transform
                    .breaks(a, b, 5)
                    .into_iter()
                    .map(|v| self.transform.transform(v))
                    .filter(inside)
                    .collect();
                out.sort_by(f64::total_cmp);
                out
            }
        }
    }

    /// Labels for `breaks` (as returned by [`Scale::get_breaks`]).
    #[must_use]
    pub fn get_labels(&self, breaks: &[f64]) -> Vec<String> {
        match &self.labels {
            Labels::None => Vec::new(),
            Labels::Values(v) => v.iter().take(breaks.len()).cloned().collect(),
            Labels::Auto => {
                if self.is_discrete() {
                    let cats = self.discrete_limits_list();
                    breaks
                        .iter()
                        .map(|b| {
                            cats.get((b.round() as usize).saturating_sub(1))
                                .cloned()
                                .unwrap_or_else(|| format_number(*b))
                        })
                        .collect()
                } else if self.kind == ScaleKind::Datetime {
                    breaks.iter().map(|b| format_datetime(*b)).collect()
                } else {
                    breaks
                        .iter()
                        .map(|b| format_number(self.transform.inverse(*b)))
                        .collect()
                }
            }
        }
    }

    /// Legend keys of a non-position scale: `(label, mapped value)`.
    #[must_use]
    pub fn legend_entries(&self) -> Vec<(String, DataValue)> {
        let mut quiet = Warnings::new();
        if self.is_discrete() {
            let cats = self.discrete_limits_list().to_vec();
            let labels = self.get_labels(&self.get_breaks_all_categories());
            let column = Column::from(cats.clone());
            let mapped = self.map_discrete(&column, &mut quiet);
            cats.iter()
                .enumerate()
                .map(|(i, c)| {
                    (
                        labels.get(i).cloned().unwrap_or_else(|| c.clone()),
                        mapped.get(i).cloned().unwrap_or_default(),
                    )
                })
                .collect()
        } else {
            let breaks = self.get_breaks();
            let labels = self.get_labels(&breaks);
            let values = self
                .map(&Column::Number(breaks), &mut quiet)
                .map(|c| (0..c.len()).map(|i| c.get(i)).collect::<Vec<_>>())
                .unwrap_or_default();
            labels.into_iter().zip(values).collect()
        }
    }

    fn get_breaks_all_categories(&self) -> Vec<f64> {
        (1..=self.discrete_limits_list().len())
            .map(|i| i as f64)
            .collect()
    }
}

fn column_value_for(label: Option<&str>) -> DataValue {
    match label {
        Some(l) => match l.parse::<f64>() {
            Ok(v) => DataValue::Number(v),
            Err(_) => DataValue::Text(l.to_string()),
        },
        None => DataValue::Null,
    }
}

/// Sort numerically when every category parses as a number, otherwise
/// lexicographically.
fn sort_categories(categories: &mut [String]) {
    let numeric: Option<Vec<f64>> = categories.iter().map(|c| c.parse::<f64>().ok()).collect();
    if let Some(nums) = numeric {
        let mut paired: Vec<(f64, String)> = nums.into_iter().zip(categories.iter().cloned()).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (slot, (_, c)) in categories.iter_mut().zip(paired) {
            *slot = c;
        }
    } else {
        categories.sort();
    }
}
