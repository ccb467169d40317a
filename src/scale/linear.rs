//! Linear mapping between two intervals, used to place normalized panel
//! coordinates on the output surface.

use crate::error::{Error, Result};

/// Linear scale for continuous-to-continuous mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_min: f64,
    domain_max: f64,
    range_min: f64,
    range_max: f64,
}

impl LinearScale {
    /// Create a new linear scale.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain has zero width.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Result<Self> {
        if (domain.0 - domain.1).abs() < f64::EPSILON || !domain.0.is_finite() || !domain.1.is_finite() {
            return Err(Error::invalid_parameter(
                "LinearScale",
                "domain",
                format!("({}, {}) has no usable width", domain.0, domain.1),
            ));
        }
        Ok(Self {
            domain_min: domain.0,
            domain_max: domain.1,
            range_min: range.0,
            range_max: range.1,
        })
    }

    /// Scale from the unit interval onto `range`.
    #[must_use]
    pub const fn from_unit(range: (f64, f64)) -> Self {
        Self {
            domain_min: 0.0,
            domain_max: 1.0,
            range_min: range.0,
            range_max: range.1,
        }
    }

    /// Create a scale from the extent of finite data.
    #[must_use]
    pub fn from_data(data: &[f64], range: (f64, f64)) -> Option<Self> {
        let (min, max) = super::breaks::finite_range(data)?;
        Self::new((min, max), range).ok()
    }

    /// Domain value to range value.
    #[must_use]
    pub fn map(&self, value: f64) -> f64 {
        let t = (value - self.domain_min) / (self.domain_max - self.domain_min);
        self.range_min + t * (self.range_max - self.range_min)
    }

    /// Range value back to the domain.
    #[must_use]
    pub fn invert(&self, value: f64) -> f64 {
        let t = (value - self.range_min) / (self.range_max - self.range_min);
        self.domain_min + t * (self.domain_max - self.domain_min)
    }

    /// Domain extent.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        (self.domain_min, self.domain_max)
    }

    /// Range extent.
    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        (self.range_min, self.range_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_scale() {
        let scale = LinearScale::new((0.0, 1.0), (40.0, 440.0)).unwrap();
        assert_relative_eq!(scale.map(0.5), 240.0);
        assert_relative_eq!(scale.invert(240.0), 0.5);
    }

    #[test]
    fn test_inverted_range() {
        // screen y grows downwards
        let scale = LinearScale::new((0.0, 1.0), (300.0, 20.0)).unwrap();
        assert_relative_eq!(scale.map(0.0), 300.0);
        assert_relative_eq!(scale.map(1.0), 20.0);
    }

    #[test]
    fn test_equal_domain_error() {
        assert!(LinearScale::new((5.0, 5.0), (0.0, 1.0)).is_err());
    }

    #[test]
    fn test_from_data_skips_non_finite() {
        let scale = LinearScale::from_data(&[f64::NAN, 2.0, 4.0], (0.0, 1.0)).unwrap();
        assert_eq!(scale.domain(), (2.0, 4.0));
        assert!(LinearScale::from_data(&[], (0.0, 1.0)).is_none());
    }
}
