//! Named component parameters.
//!
//! Geoms, stats, positions and facets accept `key=value` parameters. Each
//! component declares the names it knows; anything else is rejected when
//! the parameter is given, not when the plot is built.

use crate::data::DataValue;
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Parameter values keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(BTreeMap<String, DataValue>);

impl Params {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter after checking it against `allowed`.
    pub fn set_checked(
        &mut self,
        component: &str,
        allowed: &[&str],
        key: &str,
        value: impl Into<DataValue>,
    ) -> Result<()> {
        if !allowed.contains(&key) {
            return Err(Error::configuration(component, key, allowed));
        }
        self.0.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Set a parameter without checking.
    pub fn set(&mut self, key: &str, value: impl Into<DataValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Builder form of [`Params::set`].
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<DataValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.0.get(key)
    }

    /// True when the key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Fill keys that are not set from `defaults`.
    #[must_use]
    pub fn or_defaults(mut self, defaults: &Params) -> Self {
        for (k, v) in &defaults.0 {
            self.0.entry(k.clone()).or_insert_with(|| v.clone());
        }
        self
    }

    /// Numeric parameter; missing and non-numeric values give `None`.
    #[must_use]
    pub fn f64(&self, key: &str) -> Option<f64> {
        self.get(key)
            .and_then(|v| match v {
                DataValue::Text(s) => s.trim().parse().ok(),
                other => other.as_f64(),
            })
            .filter(|v| !v.is_nan())
    }

    /// Non-negative integer parameter.
    #[must_use]
    pub fn usize(&self, key: &str) -> Option<usize> {
        self.f64(key).filter(|v| *v >= 0.0).map(|v| v as usize)
    }

    /// Boolean parameter; accepts `true/false/yes/no/1/0` text.
    #[must_use]
    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            DataValue::Bool(b) => Some(*b),
            DataValue::Number(v) => Some(*v != 0.0),
            DataValue::Text(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Text parameter.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(DataValue::as_str)
    }

    /// Iterate over `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Parse `key=value` text into a typed value: number, bool or text.
#[must_use]
pub fn parse_value(text: &str) -> DataValue {
    let t = text.trim();
    if let Ok(v) = t.parse::<f64>() {
        return DataValue::Number(v);
    }
    match t {
        "true" | "True" => DataValue::Bool(true),
        "false" | "False" => DataValue::Bool(false),
        "" | "None" | "null" => DataValue::Null,
        _ => DataValue::Text(t.trim_matches(|c| c == '"' || c == '\'').to_string()),
    }
}

/// Split `key=value` pairs.
pub fn parse_pairs<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<Vec<(String, DataValue)>> {
    pairs
        .into_iter()
        .map(|pair| {
            let (k, v) = pair
                .split_once('=')
                .ok_or_else(|| Error::Data(format!("expected key=value, got '{pair}'")))?;
            Ok((k.trim().to_string(), parse_value(v)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_checked_rejects_unknown() {
        let mut p = Params::new();
        assert!(p.set_checked("stat_bin", &["bins"], "bins", 10.0).is_ok());
        let err = p.set_checked("stat_bin", &["bins"], "binz", 10.0).unwrap_err();
        assert!(err.to_string().contains("stat_bin"));
        assert!(err.to_string().contains("'binz'"));
    }

    #[test]
    fn test_typed_getters() {
        let p = Params::new()
            .with("n", 12.0)
            .with("flag", "yes")
            .with("name", "lm")
            .with("text_num", "2.5");
        assert_eq!(p.usize("n"), Some(12));
        assert_eq!(p.bool("flag"), Some(true));
        assert_eq!(p.str("name"), Some("lm"));
        assert_eq!(p.f64("text_num"), Some(2.5));
        assert_eq!(p.f64("missing"), None);
    }

    #[test]
    fn test_or_defaults_keeps_explicit() {
        let p = Params::new().with("a", 1.0).or_defaults(&Params::new().with("a", 2.0).with("b", 3.0));
        assert_eq!(p.f64("a"), Some(1.0));
        assert_eq!(p.f64("b"), Some(3.0));
    }

    #[test]
    fn test_parse_pairs() {
        let pairs = parse_pairs(["bins=10", "method=lm", "se=false"]).unwrap();
        assert_eq!(pairs[0], ("bins".to_string(), DataValue::Number(10.0)));
        assert_eq!(pairs[1].1, DataValue::from("lm"));
        assert_eq!(pairs[2].1, DataValue::Bool(false));
        assert!(parse_pairs(["oops"]).is_err());
    }
}
