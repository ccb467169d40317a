//! Continuous scale transforms.
//!
//! A transform maps data space into the space a continuous scale trains in.
//! Every transform is invertible on its domain:
//! `inverse(transform(v)) == v` up to floating-point error.

use super::breaks::nice_breaks;
use crate::error::{Error, Result};

/// Value transform of a continuous scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    /// No transform.
    #[default]
    Identity,
    /// Base 10 logarithm.
    Log10,
    /// Base 2 logarithm.
    Log2,
    /// Natural logarithm.
    Ln,
    /// Square root.
    Sqrt,
    /// Negation, so larger values come first.
    Reverse,
    /// Seconds since the epoch; numerically the identity.
    Datetime,
}

impl Transform {
    /// Look a transform up by name.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "identity" => Self::Identity,
            "log10" => Self::Log10,
            "log2" => Self::Log2,
            "log" | "ln" => Self::Ln,
            "sqrt" => Self::Sqrt,
            "reverse" => Self::Reverse,
            "datetime" | "date" => Self::Datetime,
            other => {
                return Err(Error::UnknownComponent {
                    kind: "transform",
                    name: other.to_string(),
                })
            }
        })
    }

    /// Transform name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Log10 => "log10",
            Self::Log2 => "log2",
            Self::Ln => "log",
            Self::Sqrt => "sqrt",
            Self::Reverse => "reverse",
            Self::Datetime => "datetime",
        }
    }

    /// Data space to scale space.
    #[must_use]
    pub fn transform(self, v: f64) -> f64 {
        match self {
            Self::Identity | Self::Datetime => v,
            Self::Log10 => v.log10(),
            Self::Log2 => v.log2(),
            Self::Ln => v.ln(),
            Self::Sqrt => v.sqrt(),
            Self::Reverse => -v,
        }
    }

    /// Scale space back to data space.
    #[must_use]
    pub fn inverse(self, v: f64) -> f64 {
        match self {
            Self::Identity | Self::Datetime => v,
            Self::Log10 => 10f64.powf(v),
            Self::Log2 => v.exp2(),
            Self::Ln => v.exp(),
            Self::Sqrt => v * v,
            Self::Reverse => -v,
        }
    }

    /// Values outside this interval have no finite image.
    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        match self {
            Self::Log10 | Self::Log2 | Self::Ln => (f64::MIN_POSITIVE, f64::INFINITY),
            Self::Sqrt => (0.0, f64::INFINITY),
            _ => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }

    /// Break positions in data space for the data-space interval `[lo, hi]`.
    #[must_use]
    pub fn breaks(self, lo: f64, hi: f64, n: usize) -> Vec<f64> {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        match self {
            Self::Log10 | Self::Log2 | Self::Ln => {
                let base: f64 = match self {
                    Self::Log2 => 2.0,
                    Self::Ln => std::f64::consts::E,
                    _ => 10.0,
                };
                let lo_exp = lo.max(f64::MIN_POSITIVE).log(base).floor() as i32;
                let hi_exp = hi.log(base).ceil() as i32;
                if hi_exp - lo_exp < 2 {
                    return nice_breaks(lo, hi, n).into_iter().filter(|b| *b > 0.0).collect();
                }
                (lo_exp..=hi_exp).map(|e| base.powi(e)).collect()
            }
            _ => nice_breaks(lo, hi, n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_round_trip() {
        for t in [
            Transform::Identity,
            Transform::Log10,
            Transform::Log2,
            Transform::Ln,
            Transform::Sqrt,
            Transform::Reverse,
            Transform::Datetime,
        ] {
            for v in [0.5, 1.0, 42.0, 1234.5] {
                assert_relative_eq!(t.inverse(t.transform(v)), v, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_log_breaks_are_powers() {
        let b = Transform::Log10.breaks(1.0, 10_000.0, 5);
        assert_eq!(b, vec![1.0, 10.0, 100.0, 1000.0, 10_000.0]);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Transform::from_name("sqrt").unwrap(), Transform::Sqrt);
        assert!(Transform::from_name("cubic").is_err());
    }
}
