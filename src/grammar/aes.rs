//! Aesthetic mappings for Grammar of Graphics.
//!
//! An [`Aes`] is an ordered map from aesthetic name to a [`Stage`]: up to
//! three value sources evaluated at different points of the build:
//!
//! - `start`: before statistics, against the layer data
//! - `after_stat`: after the statistic, against its output
//! - `after_scale`: after non-position scales mapped values
//!
//! Strings of the form `stat(expr)` or containing `..name..` are legacy
//! spellings of an after-stat stage and are normalized when the mapping is
//! built.

use super::expr::{Namespace, Value};
use crate::data::DataValue;
use std::fmt;
use std::sync::Arc;

/// A typed closure evaluated against a [`Namespace`].
pub type EvalFn = Arc<dyn Fn(&Namespace<'_>) -> Result<Value, String> + Send + Sync>;

/// Source of values for one aesthetic stage.
#[derive(Clone)]
pub enum AesExpr {
    /// A column name, or expression text when no column has that name.
    Expr(String),
    /// A scalar broadcast to every row.
    Literal(DataValue),
    /// Explicit values, length one or the data's row count.
    Values(Vec<DataValue>),
    /// A typed closure with a label used for axis titles.
    Func {
        /// Label shown in titles.
        label: String,
        /// The closure.
        f: EvalFn,
    },
}

impl AesExpr {
    /// Wrap a typed closure.
    pub fn func<F>(label: &str, f: F) -> Self
    where
        F: Fn(&Namespace<'_>) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self::Func {
            label: label.to_string(),
            f: Arc::new(f),
        }
    }

    /// Text describing the source; used for default labels and errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Expr(s) => s.clone(),
            Self::Literal(v) => v.to_label(),
            Self::Values(v) => format!("<{} values>", v.len()),
            Self::Func { label, .. } => label.clone(),
        }
    }
}

impl fmt::Debug for AesExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expr(s) => f.debug_tuple("Expr").field(s).finish(),
            Self::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Self::Values(v) => f.debug_tuple("Values").field(v).finish(),
            Self::Func { label, .. } => f.debug_struct("Func").field("label", label).finish(),
        }
    }
}

impl PartialEq for AesExpr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Expr(a), Self::Expr(b)) => a == b,
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Values(a), Self::Values(b)) => a == b,
            (Self::Func { f: a, .. }, Self::Func { f: b, .. }) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for AesExpr {
    fn from(s: &str) -> Self {
        Self::Expr(s.to_string())
    }
}

impl From<String> for AesExpr {
    fn from(s: String) -> Self {
        Self::Expr(s)
    }
}

impl From<f64> for AesExpr {
    fn from(v: f64) -> Self {
        Self::Literal(DataValue::Number(v))
    }
}

impl From<bool> for AesExpr {
    fn from(v: bool) -> Self {
        Self::Literal(DataValue::Bool(v))
    }
}

impl From<DataValue> for AesExpr {
    fn from(v: DataValue) -> Self {
        Self::Literal(v)
    }
}

impl From<Vec<f64>> for AesExpr {
    fn from(v: Vec<f64>) -> Self {
        Self::Values(v.into_iter().map(DataValue::Number).collect())
    }
}

impl From<Vec<DataValue>> for AesExpr {
    fn from(v: Vec<DataValue>) -> Self {
        Self::Values(v)
    }
}

/// Staged value of one aesthetic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stage {
    /// Evaluated against the layer data before statistics.
    pub start: Option<AesExpr>,
    /// Evaluated against the statistic output.
    pub after_stat: Option<AesExpr>,
    /// Evaluated against the mapped aesthetics.
    pub after_scale: Option<AesExpr>,
}

impl Stage {
    /// Label for axis and legend titles.
    #[must_use]
    pub fn label(&self) -> Option<String> {
        self.start
            .as_ref()
            .or(self.after_stat.as_ref())
            .or(self.after_scale.as_ref())
            .map(AesExpr::describe)
    }
}

/// Compute a value after the statistic ran.
pub fn after_stat(expr: impl Into<AesExpr>) -> Stage {
    Stage {
        after_stat: Some(expr.into()),
        ..Stage::default()
    }
}

/// Compute a value after the scales mapped the data.
pub fn after_scale(expr: impl Into<AesExpr>) -> Stage {
    Stage {
        after_scale: Some(expr.into()),
        ..Stage::default()
    }
}

/// Build a stage with any combination of sources.
pub fn stage(
    start: Option<AesExpr>,
    after_stat: Option<AesExpr>,
    after_scale: Option<AesExpr>,
) -> Stage {
    Stage {
        start,
        after_stat,
        after_scale,
    }
}

/// Recognize legacy after-stat spellings.
///
/// `stat(count)` and `after_stat(count)` yield `count`; `..count.. / 2`
/// yields `count / 2`. Anything else returns `None`.
fn legacy_after_stat(s: &str) -> Option<String> {
    let t = s.trim();
    for prefix in ["stat(", "after_stat("] {
        if let Some(inner) = t.strip_prefix(prefix).and_then(|r| r.strip_suffix(')')) {
            if balanced(inner) {
                return Some(inner.trim().to_string());
            }
        }
    }
    if !t.contains("..") {
        return None;
    }
    let chars: Vec<char> = t.chars().collect();
    let mut out = String::new();
    let mut found = false;
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '.' && chars.get(i + 1) == Some(&'.') {
            let start = i + 2;
            let mut end = start;
            while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
                end += 1;
            }
            let closes = chars.get(end) == Some(&'.') && chars.get(end + 1) == Some(&'.');
            if end > start && closes {
                out.extend(&chars[start..end]);
                i = end + 2;
                found = true;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    found.then_some(out)
}

fn balanced(s: &str) -> bool {
    let mut depth = 0i32;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

impl From<AesExpr> for Stage {
    fn from(e: AesExpr) -> Self {
        match e {
            AesExpr::Expr(s) => Self::from(s),
            other => Self {
                start: Some(other),
                ..Self::default()
            },
        }
    }
}

impl From<String> for Stage {
    fn from(s: String) -> Self {
        match legacy_after_stat(&s) {
            Some(inner) => after_stat(inner),
            None => Self {
                start: Some(AesExpr::Expr(s)),
                ..Self::default()
            },
        }
    }
}

impl From<&str> for Stage {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<f64> for Stage {
    fn from(v: f64) -> Self {
        Self::from(AesExpr::from(v))
    }
}

impl From<bool> for Stage {
    fn from(v: bool) -> Self {
        Self::from(AesExpr::from(v))
    }
}

impl From<DataValue> for Stage {
    fn from(v: DataValue) -> Self {
        Self::from(AesExpr::from(v))
    }
}

impl From<Vec<f64>> for Stage {
    fn from(v: Vec<f64>) -> Self {
        Self::from(AesExpr::from(v))
    }
}

impl From<Vec<DataValue>> for Stage {
    fn from(v: Vec<DataValue>) -> Self {
        Self::from(AesExpr::from(v))
    }
}

/// Canonical spelling of an aesthetic name.
#[must_use]
pub fn normalize_aesthetic(name: &str) -> String {
    match name {
        "colour" | "col" => "color".to_string(),
        n if n.ends_with("_colour") => format!("{}_color", &n[..n.len() - "_colour".len()]),
        n => n.to_string(),
    }
}

/// Aesthetic mapping.
///
/// Entries keep insertion order; setting an aesthetic twice replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aes {
    entries: Vec<(String, Stage)>,
}

macro_rules! aes_setters {
    ($($(#[$doc:meta])* $name:ident => $aes:literal),* $(,)?) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $name(self, value: impl Into<Stage>) -> Self {
                self.set($aes, value)
            }
        )*
    };
}

impl Aes {
    /// Create a new aesthetic mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map any aesthetic.
    #[must_use]
    pub fn set(mut self, aesthetic: &str, value: impl Into<Stage>) -> Self {
        self.insert(aesthetic, value.into());
        self
    }

    /// Map any aesthetic in place.
    pub fn insert(&mut self, aesthetic: &str, value: Stage) {
        let name = normalize_aesthetic(aesthetic);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    aes_setters! {
        /// Map x position.
        x => "x",
        /// Map y position.
        y => "y",
        /// Map line/point color.
        color => "color",
        /// Map line/point color (British spelling).
        colour => "color",
        /// Map fill color.
        fill => "fill",
        /// Map size.
        size => "size",
        /// Map shape.
        shape => "shape",
        /// Map alpha/opacity.
        alpha => "alpha",
        /// Map line type.
        linetype => "linetype",
        /// Map group explicitly.
        group => "group",
        /// Map text label.
        label => "label",
        /// Map observation weight.
        weight => "weight",
        /// Map lower x bound.
        xmin => "xmin",
        /// Map upper x bound.
        xmax => "xmax",
        /// Map lower y bound.
        ymin => "ymin",
        /// Map upper y bound.
        ymax => "ymax",
        /// Map segment end x.
        xend => "xend",
        /// Map segment end y.
        yend => "yend",
    }

    /// Stage of an aesthetic.
    #[must_use]
    pub fn get(&self, aesthetic: &str) -> Option<&Stage> {
        let name = normalize_aesthetic(aesthetic);
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, s)| s)
    }

    /// Check whether an aesthetic is mapped.
    #[must_use]
    pub fn contains(&self, aesthetic: &str) -> bool {
        self.get(aesthetic).is_some()
    }

    /// Remove an aesthetic.
    pub fn remove(&mut self, aesthetic: &str) -> Option<Stage> {
        let name = normalize_aesthetic(aesthetic);
        let i = self.entries.iter().position(|(n, _)| *n == name)?;
        Some(self.entries.remove(i).1)
    }

    /// Iterate over `(aesthetic, stage)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Stage)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Mapped aesthetic names in order.
    #[must_use]
    pub fn aesthetics(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of mapped aesthetics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another Aes, with other taking precedence.
    #[must_use]
    pub fn merge(&self, other: &Aes) -> Aes {
        let mut merged = self.clone();
        for (name, stage) in &other.entries {
            merged.insert(name, stage.clone());
        }
        merged
    }

    /// Aesthetics with a start stage.
    pub fn starts(&self) -> impl Iterator<Item = (&str, &AesExpr)> {
        self.entries
            .iter()
            .filter_map(|(n, s)| s.start.as_ref().map(|e| (n.as_str(), e)))
    }

    /// Aesthetics with an after-stat stage.
    pub fn after_stats(&self) -> impl Iterator<Item = (&str, &AesExpr)> {
        self.entries
            .iter()
            .filter_map(|(n, s)| s.after_stat.as_ref().map(|e| (n.as_str(), e)))
    }

    /// Aesthetics with an after-scale stage.
    pub fn after_scales(&self) -> impl Iterator<Item = (&str, &AesExpr)> {
        self.entries
            .iter()
            .filter_map(|(n, s)| s.after_scale.as_ref().map(|e| (n.as_str(), e)))
    }

    /// Default label per aesthetic.
    #[must_use]
    pub fn labels(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(n, s)| {
                let label = match s
                    .start
                    .as_ref()
                    .or(s.after_stat.as_ref())
                    .or(s.after_scale.as_ref())
                {
                    Some(AesExpr::Expr(e)) => e.clone(),
                    Some(AesExpr::Func { label, .. }) => label.clone(),
                    _ => n.clone(),
                };
                (n.clone(), label)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aes_builder() {
        let aes = Aes::new().x("xvar").y("yvar").colour("category").size(5.0);
        assert_eq!(aes.aesthetics(), vec!["x", "y", "color", "size"]);
        assert_eq!(aes.get("colour"), aes.get("color"));
        assert_eq!(
            aes.get("size").unwrap().start,
            Some(AesExpr::Literal(DataValue::Number(5.0)))
        );
    }

    #[test]
    fn test_aes_merge() {
        let base = Aes::new().x("x").y("y");
        let layer = Aes::new().y("y2").fill("f");
        let merged = base.merge(&layer);
        assert_eq!(merged.aesthetics(), vec!["x", "y", "fill"]);
        assert_eq!(merged.get("y").unwrap().label().unwrap(), "y2");
    }

    #[test]
    fn test_legacy_after_stat_forms() {
        let a = Aes::new().y("stat(count)").fill("..density..").alpha("..count.. / 10");
        assert_eq!(a.get("y").unwrap().after_stat, Some(AesExpr::from("count")));
        assert!(a.get("y").unwrap().start.is_none());
        assert_eq!(a.get("fill").unwrap().after_stat, Some(AesExpr::from("density")));
        assert_eq!(a.get("alpha").unwrap().after_stat, Some(AesExpr::from("count / 10")));
    }

    #[test]
    fn test_plain_dots_are_not_staged() {
        let a = Aes::new().x("a..b");
        assert_eq!(a.get("x").unwrap().start, Some(AesExpr::from("a..b")));
    }

    #[test]
    fn test_stage_constructor() {
        let s = stage(Some("cls".into()), None, Some("alpha(fill, 0.4)".into()));
        let aes = Aes::new().fill(s);
        assert_eq!(aes.starts().count(), 1);
        assert_eq!(aes.after_scales().count(), 1);
        assert_eq!(aes.after_stats().count(), 0);
    }

    #[test]
    fn test_normalize_aesthetic() {
        assert_eq!(normalize_aesthetic("colour"), "color");
        assert_eq!(normalize_aesthetic("outlier_colour"), "outlier_color");
        assert_eq!(normalize_aesthetic("fill"), "fill");
    }

    #[test]
    fn test_func_label() {
        let aes = Aes::new().y(AesExpr::func("double b", |ns| {
            ns.lookup("b").ok_or_else(|| "no b".to_string())
        }));
        assert_eq!(aes.labels(), vec![("y".to_string(), "double b".to_string())]);
    }
}
