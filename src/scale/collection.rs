//! The ordered set of scales attached to a plot.

use super::{aes_family, is_position_aes, Scale, ScaleKind};
use crate::data::{Column, ColumnKind, DataFrame};
use crate::error::{Error, Result};
use crate::warning::{PlotWarning, Warnings};

/// Non-position aesthetics that get scales.
const SCALED_AES: &[&str] = &["color", "fill", "size", "alpha", "shape", "linetype"];

/// True when a column of this name is handled by some scale.
#[must_use]
pub fn is_scaled_aes(aesthetic: &str) -> bool {
    is_position_aes(aesthetic) || SCALED_AES.contains(&aesthetic)
}

/// Scales, at most one per aesthetic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scales(Vec<Scale>);

impl Scales {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scales.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no scales.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the scales.
    pub fn iter(&self) -> std::slice::Iter<'_, Scale> {
        self.0.iter()
    }

    /// Add a scale, replacing any scale for the same aesthetic.
    ///
    /// A replacement raises [`PlotWarning::DuplicateScale`].
    pub fn append(&mut self, scale: Scale, warnings: &mut Warnings) {
        let primary = scale.primary().to_string();
        if let Some(i) = self.position_of(&primary) {
            warnings.push(PlotWarning::DuplicateScale { aesthetic: primary });
            self.0.remove(i);
        }
        self.0.push(scale);
    }

    fn position_of(&self, aesthetic: &str) -> Option<usize> {
        self.0.iter().position(|s| s.handles(aesthetic))
    }

    /// True when some scale handles `aesthetic`.
    #[must_use]
    pub fn find(&self, aesthetic: &str) -> bool {
        self.position_of(aesthetic).is_some()
    }

    /// The scale for `aesthetic`.
    #[must_use]
    pub fn get(&self, aesthetic: &str) -> Option<&Scale> {
        self.position_of(aesthetic).map(|i| &self.0[i])
    }

    /// Mutable access to the scale for `aesthetic`.
    pub fn get_mut(&mut self, aesthetic: &str) -> Option<&mut Scale> {
        self.position_of(aesthetic).map(move |i| &mut self.0[i])
    }

    /// The x scale.
    #[must_use]
    pub fn x(&self) -> Option<&Scale> {
        self.get("x")
    }

    /// The y scale.
    #[must_use]
    pub fn y(&self) -> Option<&Scale> {
        self.get("y")
    }

    /// Position scales.
    pub fn position(&self) -> impl Iterator<Item = &Scale> {
        self.0.iter().filter(|s| s.is_position())
    }

    /// Non-position scales.
    pub fn non_position(&self) -> impl Iterator<Item = &Scale> {
        self.0.iter().filter(|s| !s.is_position())
    }

    /// A collection of copies of the non-position scales.
    #[must_use]
    pub fn non_position_scales(&self) -> Self {
        Self(self.non_position().cloned().collect())
    }

    /// Every aesthetic handled by some scale.
    #[must_use]
    pub fn input(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|s| s.aesthetics().iter().cloned())
            .collect()
    }

    /// Add default scales for scaled aesthetics of `data` without one.
    ///
    /// The scale kind follows the column kind. Columns that already hold
    /// colors get no scale, and shapes or line types get no scale for
    /// continuous data.
    ///
    /// # Errors
    ///
    /// [`Error::NonFiniteScale`] when a numeric column holds only infinite
    /// values.
    pub fn add_defaults(&mut self, data: &DataFrame) -> Result<()> {
        for (name, column) in data.iter() {
            if !is_scaled_aes(name) || self.find(name) {
                continue;
            }
            let family = aes_family(name);
            let kind = match column.kind() {
                ColumnKind::Mapped => continue,
                ColumnKind::Discrete => ScaleKind::Discrete,
                ColumnKind::DateTime => ScaleKind::Datetime,
                ColumnKind::Continuous => {
                    if matches!(family, "shape" | "linetype") {
                        continue;
                    }
                    if all_infinite(column) {
                        return Err(Error::NonFiniteScale(name.to_string()));
                    }
                    ScaleKind::Continuous
                }
            };
            tracing::debug!(aesthetic = name, ?kind, "adding default scale");
            self.0.push(Scale::with_kind(family, kind));
        }
        Ok(())
    }

    /// Add continuous x and y scales when `aesthetics` need them.
    pub fn add_missing(&mut self, aesthetics: &[&str]) {
        for family in ["x", "y"] {
            if !self.find(family) && aesthetics.iter().any(|a| aes_family(a) == family) {
                self.0.push(Scale::continuous(family));
            }
        }
    }

    /// Apply scale transforms to every handled column.
    pub fn transform_df(&self, data: &mut DataFrame) -> Result<()> {
        let names: Vec<String> = data.column_names().to_vec();
        for name in names {
            let (Some(scale), Some(column)) = (self.get(&name), data.get(&name)) else {
                continue;
            };
            if scale.kind() == ScaleKind::Discrete {
                continue;
            }
            let transformed = scale.transform_column(column);
            data.insert(name, transformed)?;
        }
        Ok(())
    }

    /// Train every scale on the columns it handles.
    pub fn train_df(&mut self, data: &DataFrame) -> Result<()> {
        for (name, column) in data.iter() {
            if let Some(scale) = self.get_mut(name) {
                scale.train(column)?;
            }
        }
        Ok(())
    }

    /// Map every handled column through its scale.
    ///
    /// Rows whose category a non-translating discrete scale could not map
    /// are removed with a warning.
    pub fn map_df(&self, data: &mut DataFrame, warnings: &mut Warnings) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = data.column_names().to_vec();
        let mut keep = vec![true; data.nrow()];
        let mut dropping = Vec::new();
        for name in names {
            let (Some(scale), Some(column)) = (self.get(&name), data.get(&name)) else {
                continue;
            };
            let mapped = scale.map(column, warnings)?;
            if scale.is_discrete() && !scale.is_position() && !scale.na_translate {
                for (i, k) in keep.iter_mut().enumerate() {
                    if mapped.is_missing(i) {
                        *k = false;
                    }
                }
                dropping.push(name.clone());
            }
            data.insert(name, mapped)?;
        }
        let removed = keep.iter().filter(|k| !**k).count();
        if removed > 0 {
            warnings.push(PlotWarning::RowsRemoved {
                component: format!("scale_{}_discrete", dropping.join("/")),
                count: removed,
                reason: "values outside the scale categories",
            });
            *data = data.filter(&keep);
        }
        Ok(())
    }

    /// Forget the continuous ranges of every scale.
    pub fn reset(&mut self) {
        for s in &mut self.0 {
            s.reset();
        }
    }
}

impl<'a> IntoIterator for &'a Scales {
    type Item = &'a Scale;
    type IntoIter = std::slice::Iter<'a, Scale>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Scale> for Scales {
    fn from_iter<T: IntoIterator<Item = Scale>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn all_infinite(column: &Column) -> bool {
    column.as_numbers().is_some_and(|v| {
        let present: Vec<&f64> = v.iter().filter(|x| !x.is_nan()).collect();
        !present.is_empty() && present.iter().all(|x| x.is_infinite())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataValue;

    fn frame() -> DataFrame {
        DataFrame::new()
            .with_column("x", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("color", vec!["a", "b", "a"])
            .unwrap()
            .with_column("group", vec![1.0, 2.0, 1.0])
            .unwrap()
    }

    #[test]
    fn test_append_replaces_with_warning() {
        let mut scales = Scales::new();
        let mut w = Warnings::new();
        scales.append(Scale::x_continuous().limits(0.0, 1.0), &mut w);
        scales.append(Scale::x_continuous().limits(0.0, 9.0), &mut w);
        assert_eq!(scales.len(), 1);
        assert_eq!(w.len(), 1);
        assert!(w.as_slice()[0].to_string().contains("'x'"));
        assert_eq!(scales.x().unwrap().continuous_limits(), Some((0.0, 9.0)));
    }

    #[test]
    fn test_add_defaults_by_kind() {
        let mut scales = Scales::new();
        scales.add_defaults(&frame()).unwrap();
        assert_eq!(scales.x().unwrap().kind(), ScaleKind::Continuous);
        assert!(scales.get("color").unwrap().is_discrete());
        assert!(!scales.find("group"));
        assert!(scales.find("xmin"));
    }

    #[test]
    fn test_add_defaults_skips_colors_and_continuous_shapes() {
        let df = DataFrame::new()
            .with_column("shape", vec![1.0, 2.0])
            .unwrap()
            .with_column("fill", Column::Color(vec![Some(crate::color::Rgba::RED); 2]))
            .unwrap();
        let mut scales = Scales::new();
        scales.add_defaults(&df).unwrap();
        assert!(scales.is_empty());
    }

    #[test]
    fn test_all_infinite_column_fails() {
        let df = DataFrame::new()
            .with_column("y", vec![f64::INFINITY, f64::NEG_INFINITY])
            .unwrap();
        let err = Scales::new().add_defaults(&df).unwrap_err();
        assert!(matches!(err, Error::NonFiniteScale(ref ae) if ae == "y"));
    }

    #[test]
    fn test_add_missing() {
        let mut scales = Scales::new();
        scales.add_missing(&["x", "ymin"]);
        assert!(scales.x().is_some());
        assert!(scales.y().is_some());
    }

    #[test]
    fn test_train_and_map_df() {
        let mut df = frame();
        let mut scales = Scales::new();
        scales.add_defaults(&df).unwrap();
        scales.train_df(&df).unwrap();
        let mut w = Warnings::new();
        scales.map_df(&mut df, &mut w).unwrap();
        assert!(matches!(df.get("color"), Some(Column::Color(_))));
        assert_eq!(df.get("color").unwrap().get(0), df.get("color").unwrap().get(2));
        assert_eq!(df.numbers("x").unwrap(), &[1.0, 2.0, 3.0]);
        assert!(w.is_empty());
    }

    #[test]
    fn test_map_df_drops_untranslated_rows() {
        let mut df = frame();
        let mut scales = Scales::new();
        scales.append(
            Scale::discrete("color").discrete_limits(vec!["a"]).na_translate(false),
            &mut Warnings::new(),
        );
        let mut w = Warnings::new();
        scales.map_df(&mut df, &mut w).unwrap();
        assert_eq!(df.nrow(), 2);
        assert_eq!(w.len(), 1);
        assert_eq!(df.numbers("x").unwrap(), &[1.0, 3.0]);
    }

    #[test]
    fn test_transform_df_log() {
        let mut df = DataFrame::new().with_column("y", vec![10.0, 100.0]).unwrap();
        let mut scales = Scales::new();
        scales.append(Scale::y_log10(), &mut Warnings::new());
        scales.transform_df(&mut df).unwrap();
        assert_eq!(df.numbers("y").unwrap(), &[1.0, 2.0]);
        assert_eq!(df.get("y").unwrap().get(0), DataValue::Number(1.0));
    }
}
