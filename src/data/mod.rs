//! Tabular data collaborator.
//!
//! A [`DataFrame`] is an ordered set of named, equal-length [`Column`]s.
//! Columns carry a kind (continuous, discrete, datetime or already-mapped
//! color) which drives default scale selection and grouping.
//!
//! Missing values are `NaN` in numeric columns and `None` elsewhere.

mod csv;
mod group;

pub use csv::read_csv;
pub use group::{ninteraction, GroupedFrame, SortKey};

use crate::color::Rgba;
use crate::error::{Error, Result};
use std::fmt;

// ============================================================================
// Scalar values
// ============================================================================

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DataValue {
    /// Missing value.
    #[default]
    Null,
    /// Floating point number.
    Number(f64),
    /// Boolean.
    Bool(bool),
    /// Text.
    Text(String),
    /// Seconds since the Unix epoch.
    DateTime(f64),
    /// A renderable color.
    Color(Rgba),
}

impl DataValue {
    /// True for `Null` and `NaN` numbers.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Number(v) | Self::DateTime(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the value, if it has one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) | Self::DateTime(v) => Some(*v),
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    /// Text view of the value, if it is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Color view of the value; text is parsed as a color name.
    #[must_use]
    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            Self::Color(c) => Some(*c),
            Self::Text(s) => Rgba::parse(s).ok(),
            _ => None,
        }
    }

    /// Human readable label used for categories and legends.
    #[must_use]
    pub fn to_label(&self) -> String {
        match self {
            Self::Null => "NA".to_string(),
            Self::Number(v) | Self::DateTime(v) => format_number(*v),
            Self::Bool(b) => b.to_string(),
            Self::Text(s) => s.clone(),
            Self::Color(c) => c.to_hex(),
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_label())
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for DataValue {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<bool> for DataValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for DataValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Rgba> for DataValue {
    fn from(v: Rgba) -> Self {
        Self::Color(v)
    }
}

/// Format a number without a trailing `.0` for integral values.
#[must_use]
pub fn format_number(v: f64) -> String {
    if v.is_nan() {
        "NA".to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.6}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

// ============================================================================
// Columns
// ============================================================================

/// Broad classification of a column used for scale selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Numbers.
    Continuous,
    /// Text, booleans and categoricals.
    Discrete,
    /// Date-times.
    DateTime,
    /// Values already in output space (colors).
    Mapped,
}

/// A categorical column: ordered levels plus per-row codes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Categorical {
    levels: Vec<String>,
    codes: Vec<Option<usize>>,
}

impl Categorical {
    /// Build from values, using the sorted unique values as levels.
    #[must_use]
    pub fn from_values(values: &[Option<String>]) -> Self {
        let mut levels: Vec<String> = values.iter().flatten().cloned().collect();
        levels.sort();
        levels.dedup();
        Self::with_levels(values, levels)
    }

    /// Build from values and an explicit level order.
    ///
    /// Values not among `levels` become missing.
    #[must_use]
    pub fn with_levels(values: &[Option<String>], levels: Vec<String>) -> Self {
        let codes = values
            .iter()
            .map(|v| v.as_ref().and_then(|s| levels.iter().position(|l| l == s)))
            .collect();
        Self { levels, codes }
    }

    /// Ordered levels.
    #[must_use]
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Per-row level index.
    #[must_use]
    pub fn codes(&self) -> &[Option<usize>] {
        &self.codes
    }

    /// Level of row `i`.
    #[must_use]
    pub fn value(&self, i: usize) -> Option<&str> {
        self.codes
            .get(i)
            .copied()
            .flatten()
            .and_then(|c| self.levels.get(c))
            .map(String::as_str)
    }

    /// Levels that occur at least once, in level order.
    #[must_use]
    pub fn used_levels(&self) -> Vec<String> {
        let mut seen = vec![false; self.levels.len()];
        for c in self.codes.iter().flatten() {
            seen[*c] = true;
        }
        self.levels
            .iter()
            .zip(seen)
            .filter(|(_, s)| *s)
            .map(|(l, _)| l.clone())
            .collect()
    }

    fn take(&self, idx: &[usize]) -> Self {
        Self {
            levels: self.levels.clone(),
            codes: idx.iter().map(|&i| self.codes[i]).collect(),
        }
    }
}

/// A typed column of values.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Numbers, `NaN` is missing.
    Number(Vec<f64>),
    /// Booleans.
    Bool(Vec<Option<bool>>),
    /// Free text.
    Text(Vec<Option<String>>),
    /// Categorical values with ordered levels.
    Categorical(Categorical),
    /// Seconds since the Unix epoch, `NaN` is missing.
    DateTime(Vec<f64>),
    /// Colors.
    Color(Vec<Option<Rgba>>),
}

impl Column {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Number(v) | Self::DateTime(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Categorical(c) => c.codes.len(),
            Self::Color(v) => v.len(),
        }
    }

    /// True when the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column classification.
    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Number(_) => ColumnKind::Continuous,
            Self::Bool(_) | Self::Text(_) | Self::Categorical(_) => ColumnKind::Discrete,
            Self::DateTime(_) => ColumnKind::DateTime,
            Self::Color(_) => ColumnKind::Mapped,
        }
    }

    /// True for text, boolean and categorical columns.
    #[must_use]
    pub fn is_discrete(&self) -> bool {
        self.kind() == ColumnKind::Discrete
    }

    /// Short type name used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Categorical(_) => "categorical",
            Self::DateTime(_) => "datetime",
            Self::Color(_) => "color",
        }
    }

    /// Value of row `i` (`Null` when out of range).
    #[must_use]
    pub fn get(&self, i: usize) -> DataValue {
        if i >= self.len() {
            return DataValue::Null;
        }
        match self {
            Self::Number(v) if v[i].is_nan() => DataValue::Null,
            Self::Number(v) => DataValue::Number(v[i]),
            Self::DateTime(v) if v[i].is_nan() => DataValue::Null,
            Self::DateTime(v) => DataValue::DateTime(v[i]),
            Self::Bool(v) => v[i].map_or(DataValue::Null, DataValue::Bool),
            Self::Text(v) => v[i].clone().map_or(DataValue::Null, DataValue::Text),
            Self::Categorical(c) => c
                .value(i)
                .map_or(DataValue::Null, |s| DataValue::Text(s.to_string())),
            Self::Color(v) => v[i].map_or(DataValue::Null, DataValue::Color),
        }
    }

    /// True when row `i` is missing.
    #[must_use]
    pub fn is_missing(&self, i: usize) -> bool {
        self.get(i).is_missing()
    }

    /// Borrow the numbers of a numeric or datetime column.
    #[must_use]
    pub fn as_numbers(&self) -> Option<&[f64]> {
        match self {
            Self::Number(v) | Self::DateTime(v) => Some(v),
            _ => None,
        }
    }

    /// Numbers for every row; booleans become 0/1, other kinds `None`.
    #[must_use]
    pub fn to_numbers(&self) -> Option<Vec<f64>> {
        match self {
            Self::Number(v) | Self::DateTime(v) => Some(v.clone()),
            Self::Bool(v) => Some(
                v.iter()
                    .map(|b| b.map_or(f64::NAN, |b| f64::from(u8::from(b))))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Text labels for every row (`None` for missing).
    #[must_use]
    pub fn labels(&self) -> Vec<Option<String>> {
        (0..self.len())
            .map(|i| {
                let v = self.get(i);
                (!v.is_missing()).then(|| v.to_label())
            })
            .collect()
    }

    /// Categories in their natural order.
    ///
    /// Categorical columns keep their level order (only used levels),
    /// other columns sort their unique values.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        match self {
            Self::Categorical(c) => c.used_levels(),
            Self::Bool(v) => {
                let mut out = Vec::new();
                for b in [false, true] {
                    if v.contains(&Some(b)) {
                        out.push(b.to_string());
                    }
                }
                out
            }
            _ => {
                let mut keys: Vec<(SortKey, String)> = (0..self.len())
                    .filter(|&i| !self.is_missing(i))
                    .map(|i| (self.sort_key(i), self.get(i).to_label()))
                    .collect();
                keys.sort_by(|a, b| a.0.cmp(&b.0));
                keys.dedup_by(|a, b| a.1 == b.1);
                keys.into_iter().map(|(_, s)| s).collect()
            }
        }
    }

    /// Ordering key of row `i`.
    #[must_use]
    pub fn sort_key(&self, i: usize) -> SortKey {
        if self.is_missing(i) {
            return SortKey::Missing;
        }
        match self {
            Self::Number(v) | Self::DateTime(v) => SortKey::Num(v[i]),
            Self::Bool(v) => SortKey::Code(usize::from(v[i] == Some(true))),
            Self::Categorical(c) => c.codes[i].map_or(SortKey::Missing, SortKey::Code),
            Self::Text(_) | Self::Color(_) => SortKey::Str(self.get(i).to_label()),
        }
    }

    /// Rows at the given indices.
    #[must_use]
    pub fn take(&self, idx: &[usize]) -> Self {
        match self {
            Self::Number(v) => Self::Number(idx.iter().map(|&i| v[i]).collect()),
            Self::DateTime(v) => Self::DateTime(idx.iter().map(|&i| v[i]).collect()),
            Self::Bool(v) => Self::Bool(idx.iter().map(|&i| v[i]).collect()),
            Self::Text(v) => Self::Text(idx.iter().map(|&i| v[i].clone()).collect()),
            Self::Categorical(c) => Self::Categorical(c.take(idx)),
            Self::Color(v) => Self::Color(idx.iter().map(|&i| v[i]).collect()),
        }
    }

    /// Rows where `mask` is true.
    #[must_use]
    pub fn filter(&self, mask: &[bool]) -> Self {
        let idx: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| i)
            .collect();
        self.take(&idx)
    }

    /// A column of `n` missing values of the given kind.
    #[must_use]
    pub fn missing_like(&self, n: usize) -> Self {
        match self {
            Self::Number(_) => Self::Number(vec![f64::NAN; n]),
            Self::DateTime(_) => Self::DateTime(vec![f64::NAN; n]),
            Self::Bool(_) => Self::Bool(vec![None; n]),
            Self::Text(_) => Self::Text(vec![None; n]),
            Self::Categorical(c) => Self::Categorical(Categorical {
                levels: c.levels.clone(),
                codes: vec![None; n],
            }),
            Self::Color(_) => Self::Color(vec![None; n]),
        }
    }

    /// Repeat a scalar `n` times.
    #[must_use]
    pub fn broadcast(value: &DataValue, n: usize) -> Self {
        match value {
            DataValue::Null => Self::Number(vec![f64::NAN; n]),
            DataValue::Number(v) => Self::Number(vec![*v; n]),
            DataValue::DateTime(v) => Self::DateTime(vec![*v; n]),
            DataValue::Bool(b) => Self::Bool(vec![Some(*b); n]),
            DataValue::Text(s) => Self::Text(vec![Some(s.clone()); n]),
            DataValue::Color(c) => Self::Color(vec![Some(*c); n]),
        }
    }

    /// Build a column from scalars, inferring the kind.
    ///
    /// Missing values are allowed anywhere; mixing non-missing kinds fails.
    pub fn from_values(values: &[DataValue]) -> Result<Self> {
        let first = values.iter().find(|v| !v.is_missing());
        let Some(first) = first else {
            return Ok(Self::Number(vec![f64::NAN; values.len()]));
        };
        let mismatch = |v: &DataValue| {
            Error::Data(format!(
                "cannot mix {:?} and {:?} values in one column",
                first, v
            ))
        };
        match first {
            DataValue::Number(_) | DataValue::Null => values
                .iter()
                .map(|v| match v {
                    DataValue::Number(x) => Ok(*x),
                    v if v.is_missing() => Ok(f64::NAN),
                    v => Err(mismatch(v)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Number),
            DataValue::DateTime(_) => values
                .iter()
                .map(|v| match v {
                    DataValue::DateTime(x) => Ok(*x),
                    v if v.is_missing() => Ok(f64::NAN),
                    v => Err(mismatch(v)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::DateTime),
            DataValue::Bool(_) => values
                .iter()
                .map(|v| match v {
                    DataValue::Bool(b) => Ok(Some(*b)),
                    v if v.is_missing() => Ok(None),
                    v => Err(mismatch(v)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Bool),
            DataValue::Text(_) => values
                .iter()
                .map(|v| match v {
                    DataValue::Text(s) => Ok(Some(s.clone())),
                    v if v.is_missing() => Ok(None),
                    v => Err(mismatch(v)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Text),
            DataValue::Color(_) => values
                .iter()
                .map(|v| match v {
                    DataValue::Color(c) => Ok(Some(*c)),
                    v if v.is_missing() => Ok(None),
                    v => Err(mismatch(v)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Color),
        }
    }

    /// Append `other` below `self`.
    ///
    /// Same kinds append directly, categoricals merge their levels,
    /// numbers and datetimes combine as numbers, anything else falls back
    /// to text.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Number(a), Self::Number(b))
            | (Self::Number(a), Self::DateTime(b))
            | (Self::DateTime(a), Self::Number(b)) => Self::Number([a.as_slice(), b].concat()),
            (Self::DateTime(a), Self::DateTime(b)) => Self::DateTime([a.as_slice(), b].concat()),
            (Self::Bool(a), Self::Bool(b)) => Self::Bool([a.as_slice(), b].concat()),
            (Self::Text(a), Self::Text(b)) => Self::Text([a.as_slice(), b].concat()),
            (Self::Color(a), Self::Color(b)) => Self::Color([a.as_slice(), b].concat()),
            (Self::Categorical(a), Self::Categorical(b)) => {
                let mut levels = a.levels.clone();
                for l in &b.levels {
                    if !levels.contains(l) {
                        levels.push(l.clone());
                    }
                }
                let values: Vec<Option<String>> = (0..a.codes.len())
                    .map(|i| a.value(i).map(str::to_string))
                    .chain((0..b.codes.len()).map(|i| b.value(i).map(str::to_string)))
                    .collect();
                Self::Categorical(Categorical::with_levels(&values, levels))
            }
            (Self::Categorical(a), Self::Text(_)) | (Self::Text(_), Self::Categorical(a)) => {
                let values = [self.labels(), other.labels()].concat();
                let mut levels = a.levels.clone();
                for v in values.iter().flatten() {
                    if !levels.contains(v) {
                        levels.push(v.clone());
                    }
                }
                Self::Categorical(Categorical::with_levels(&values, levels))
            }
            _ => Self::Text([self.labels(), other.labels()].concat()),
        }
    }
}

impl From<Vec<f64>> for Column {
    fn from(v: Vec<f64>) -> Self {
        Self::Number(v)
    }
}

impl From<Vec<&str>> for Column {
    fn from(v: Vec<&str>) -> Self {
        Self::Text(v.into_iter().map(|s| Some(s.to_string())).collect())
    }
}

impl From<Vec<String>> for Column {
    fn from(v: Vec<String>) -> Self {
        Self::Text(v.into_iter().map(Some).collect())
    }
}

impl From<Categorical> for Column {
    fn from(c: Categorical) -> Self {
        Self::Categorical(c)
    }
}

// ============================================================================
// DataFrame
// ============================================================================

/// Ordered named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Column>,
    nrow: usize,
}

impl DataFrame {
    /// Create an empty data frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a data frame from named columns.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Column)>) -> Result<Self> {
        let mut df = Self::new();
        for (name, col) in columns {
            df.insert(name, col)?;
        }
        Ok(df)
    }

    /// One-row frame with a column per value. A repeated name keeps the
    /// last value.
    #[must_use]
    pub fn single_row<S: Into<String>>(values: impl IntoIterator<Item = (S, DataValue)>) -> Self {
        let mut df = Self::new();
        for (name, value) in values {
            let name = name.into();
            let column = Column::broadcast(&value, 1);
            match df.names.iter().position(|n| *n == name) {
                Some(i) => df.columns[i] = column,
                None => {
                    df.names.push(name);
                    df.columns.push(column);
                }
            }
        }
        df.nrow = usize::from(!df.columns.is_empty());
        df
    }

    /// Number of rows.
    #[must_use]
    pub fn nrow(&self) -> usize {
        self.nrow
    }

    /// Number of columns.
    #[must_use]
    pub fn ncol(&self) -> usize {
        self.columns.len()
    }

    /// True when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nrow == 0
    }

    /// Column names in order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Check whether a column exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Get a column by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Numbers of a numeric column.
    #[must_use]
    pub fn numbers(&self, name: &str) -> Option<&[f64]> {
        self.get(name).and_then(Column::as_numbers)
    }

    /// Iterate over `(name, column)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Insert or replace a column.
    ///
    /// The first column of an empty frame fixes the row count.
    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.columns.is_empty() {
            self.nrow = column.len();
        } else if column.len() != self.nrow {
            return Err(Error::Data(format!(
                "column '{name}' has {} rows, expected {}",
                column.len(),
                self.nrow
            )));
        }
        if let Some(i) = self.names.iter().position(|n| *n == name) {
            self.columns[i] = column;
        } else {
            self.names.push(name);
            self.columns.push(column);
        }
        Ok(())
    }

    /// Rewrite a numeric column in place. Returns false when the column is
    /// absent or not numeric.
    pub fn map_numbers(&mut self, name: &str, mut f: impl FnMut(f64) -> f64) -> bool {
        let Some(i) = self.names.iter().position(|n| n == name) else {
            return false;
        };
        match &mut self.columns[i] {
            Column::Number(values) => {
                for v in values.iter_mut() {
                    *v = f(*v);
                }
                true
            }
            _ => false,
        }
    }

    /// Builder form of [`DataFrame::insert`].
    pub fn with_column(mut self, name: impl Into<String>, column: impl Into<Column>) -> Result<Self> {
        self.insert(name, column.into())?;
        Ok(self)
    }

    /// Add a numeric column.
    pub fn add_column_f64(&mut self, name: &str, values: &[f64]) -> Result<()> {
        self.insert(name, Column::Number(values.to_vec()))
    }

    /// Add a text column.
    pub fn add_column_str(&mut self, name: &str, values: &[&str]) -> Result<()> {
        self.insert(name, Column::from(values.to_vec()))
    }

    /// Remove a column, returning it.
    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let i = self.names.iter().position(|n| n == name)?;
        self.names.remove(i);
        Some(self.columns.remove(i))
    }

    /// Rename a column; does nothing when `from` is absent.
    pub fn rename(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        if let Some(col) = self.remove(from) {
            self.remove(to);
            self.names.push(to.to_string());
            self.columns.push(col);
        }
    }

    /// Rows at the given indices.
    #[must_use]
    pub fn take(&self, idx: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(idx)).collect(),
            nrow: idx.len(),
        }
    }

    /// Rows where `mask` is true.
    #[must_use]
    pub fn filter(&self, mask: &[bool]) -> Self {
        let idx: Vec<usize> = (0..self.nrow).filter(|&i| mask.get(i) == Some(&true)).collect();
        self.take(&idx)
    }

    /// A zero-row frame with the same columns.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        self.take(&[])
    }

    /// Stack frames vertically.
    ///
    /// Columns are the union in order of first appearance; frames lacking a
    /// column get missing values there.
    #[must_use]
    pub fn concat(frames: &[Self]) -> Self {
        let mut out = Self::new();
        let mut names: Vec<&str> = Vec::new();
        for f in frames {
            for n in &f.names {
                if !names.contains(&n.as_str()) {
                    names.push(n);
                }
            }
        }
        let nrow = frames.iter().map(Self::nrow).sum();
        for name in names {
            let mut acc: Option<Column> = None;
            for f in frames {
                let part = match f.get(name) {
                    Some(c) => c.clone(),
                    None => match frames.iter().find_map(|g| g.get(name)) {
                        Some(proto) => proto.missing_like(f.nrow),
                        None => continue,
                    },
                };
                acc = Some(match acc {
                    Some(a) => a.concat(&part),
                    None => part,
                });
            }
            if let Some(col) = acc {
                out.names.push(name.to_string());
                out.columns.push(col);
            }
        }
        out.nrow = nrow;
        out
    }

    /// Row indices grouped by the values of `keys`, groups in key order.
    ///
    /// Missing key columns are ignored; with no usable key every row lands
    /// in one group.
    #[must_use]
    pub fn group_indices(&self, keys: &[&str]) -> Vec<Vec<usize>> {
        let cols: Vec<&Column> = keys.iter().filter_map(|k| self.get(k)).collect();
        if self.nrow == 0 {
            return Vec::new();
        }
        if cols.is_empty() {
            return vec![(0..self.nrow).collect()];
        }
        let ids = ninteraction(&cols, self.nrow);
        let n_groups = ids.iter().copied().max().unwrap_or(0);
        let mut groups = vec![Vec::new(); n_groups];
        for (row, id) in ids.into_iter().enumerate() {
            groups[id - 1].push(row);
        }
        groups
    }

    /// Split into sub-frames by the values of `keys`.
    #[must_use]
    pub fn split_by(&self, keys: &[&str]) -> Vec<Self> {
        self.group_indices(keys)
            .iter()
            .map(|idx| self.take(idx))
            .collect()
    }

    /// Group rows by the given variables for use with the pipe operator.
    pub fn group_by(self, vars: &[&str]) -> Result<GroupedFrame> {
        GroupedFrame::new(self, vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        DataFrame::new()
            .with_column("x", vec![3.0, 1.0, 2.0])
            .unwrap()
            .with_column("g", vec!["b", "a", "b"])
            .unwrap()
    }

    #[test]
    fn test_insert_checks_length() {
        let mut df = sample();
        assert!(df.add_column_f64("bad", &[1.0]).is_err());
        assert_eq!(df.nrow(), 3);
        assert_eq!(df.ncol(), 2);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut df = sample();
        df.add_column_f64("x", &[9.0, 9.0, 9.0]).unwrap();
        assert_eq!(df.column_names(), &["x".to_string(), "g".to_string()]);
        assert_eq!(df.numbers("x").unwrap(), &[9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_map_numbers_in_place() {
        let mut df = sample();
        assert!(df.map_numbers("x", |v| v * 10.0));
        assert_eq!(df.numbers("x").unwrap(), &[30.0, 10.0, 20.0]);
        assert!(!df.map_numbers("g", |v| v));
        assert!(!df.map_numbers("nope", |v| v));
    }

    #[test]
    fn test_single_row() {
        let df = DataFrame::single_row([("a", DataValue::Number(1.0)), ("b", DataValue::Text("t".into()))]);
        assert_eq!(df.nrow(), 1);
        assert_eq!(df.column_names(), &["a".to_string(), "b".to_string()]);
        assert!(DataFrame::single_row(Vec::<(&str, DataValue)>::new()).is_empty());
    }

    #[test]
    fn test_take_and_filter() {
        let df = sample();
        let t = df.filter(&[true, false, true]);
        assert_eq!(t.nrow(), 2);
        assert_eq!(t.numbers("x").unwrap(), &[3.0, 2.0]);
    }

    #[test]
    fn test_concat_fills_missing_columns() {
        let a = sample();
        let b = DataFrame::new().with_column("x", vec![7.0]).unwrap();
        let c = DataFrame::concat(&[a, b]);
        assert_eq!(c.nrow(), 4);
        assert_eq!(c.get("g").unwrap().get(3), DataValue::Null);
    }

    #[test]
    fn test_group_indices_sorted_by_key() {
        let df = sample();
        let groups = df.group_indices(&["g"]);
        assert_eq!(groups, vec![vec![1], vec![0, 2]]);
    }

    #[test]
    fn test_categories_follow_level_order() {
        let values = vec![Some("lo".to_string()), Some("hi".to_string())];
        let cat = Categorical::with_levels(&values, vec!["lo".into(), "mid".into(), "hi".into()]);
        let col = Column::Categorical(cat);
        assert_eq!(col.categories(), vec!["lo".to_string(), "hi".to_string()]);
    }

    #[test]
    fn test_from_values_infers_kind() {
        let col = Column::from_values(&[DataValue::from(1.0), DataValue::Null]).unwrap();
        assert_eq!(col.kind(), ColumnKind::Continuous);
        assert!(Column::from_values(&[DataValue::from(1.0), DataValue::from("a")]).is_err());
    }

    #[test]
    fn test_categorical_concat_merges_levels() {
        let a = Column::Categorical(Categorical::from_values(&[Some("a".into())]));
        let b = Column::Categorical(Categorical::from_values(&[Some("c".into())]));
        match a.concat(&b) {
            Column::Categorical(c) => assert_eq!(c.levels(), &["a".to_string(), "c".to_string()]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "NA");
    }
}
