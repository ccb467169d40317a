//! Range arithmetic, break selection and label formatting.
//!
//! # References
//!
//! - Heckbert, P. S. (1990). "Nice Numbers for Graph Labels."
//!   *Graphics Gems*, 61-63.

/// Range expansion: `mult` of the width plus a constant `add` on each side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expansion {
    /// Multiplicative expansion.
    pub mult: f64,
    /// Additive expansion.
    pub add: f64,
}

impl Expansion {
    /// Expansion of continuous scales (5% each side).
    pub const CONTINUOUS: Self = Self {
        mult: 0.05,
        add: 0.0,
    };
    /// Expansion of discrete scales (0.6 units each side).
    pub const DISCRETE: Self = Self {
        mult: 0.0,
        add: 0.6,
    };
    /// No expansion.
    pub const NONE: Self = Self {
        mult: 0.0,
        add: 0.0,
    };
}

/// Expand `(lo, hi)`; a zero-width range grows by half a unit each side.
#[must_use]
pub fn expand_range(range: (f64, f64), expand: Expansion) -> (f64, f64) {
    let (lo, hi) = range;
    if !lo.is_finite() || !hi.is_finite() {
        return range;
    }
    if (hi - lo).abs() < f64::EPSILON * lo.abs().max(1.0) {
        return (lo - 0.5, hi + 0.5);
    }
    let d = (hi - lo) * expand.mult + expand.add;
    (lo - d, hi + d)
}

/// Rescale `v` from `from` to `[0, 1]`; a zero-width domain maps to 0.5.
#[must_use]
pub fn rescale(v: f64, from: (f64, f64)) -> f64 {
    let width = from.1 - from.0;
    if width == 0.0 {
        return if v.is_nan() { v } else { 0.5 };
    }
    (v - from.0) / width
}

/// Replace values outside `[0, 1]` with `NaN`.
#[must_use]
pub fn censor(v: f64) -> f64 {
    // small tolerance so rescaled limits themselves stay in bounds
    if (-1e-10..=1.0 + 1e-10).contains(&v) {
        v
    } else {
        f64::NAN
    }
}

/// Clamp values into `[0, 1]`.
#[must_use]
pub fn squish(v: f64) -> f64 {
    if v.is_nan() {
        v
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Minimum and maximum of the finite values.
#[must_use]
pub fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Round `x` to a "nice" number: 1, 2, 5 or 10 times a power of ten.
fn nice_number(x: f64, round: bool) -> f64 {
    let exp = x.log10().floor();
    let f = x / 10f64.powf(exp);
    let nf = if round {
        if f < 1.5 {
            1.0
        } else if f < 3.0 {
            2.0
        } else if f < 7.0 {
            5.0
        } else {
            10.0
        }
    } else if f <= 1.0 {
        1.0
    } else if f <= 2.0 {
        2.0
    } else if f <= 5.0 {
        5.0
    } else {
        10.0
    };
    nf * 10f64.powf(exp)
}

/// About `n` evenly spaced nice break values covering `[lo, hi]`.
///
/// Only breaks inside the interval are returned.
#[must_use]
pub fn nice_breaks(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if !lo.is_finite() || !hi.is_finite() {
        return Vec::new();
    }
    if lo == hi {
        return vec![lo];
    }
    let (lo, hi) = if lo < hi { (lo, hi) } else { (hi, lo) };
    let n = n.max(2);
    let range = nice_number(hi - lo, false);
    let step = nice_number(range / (n - 1) as f64, true);
    // decimal places of the step, used to snap 0.30000000000000004 to 0.3
    let digits = (-step.log10().floor()).max(0.0).min(15.0) as i32;
    let p = 10f64.powi(digits);
    let start = (lo / step).ceil();
    let mut out = Vec::new();
    let mut k = start;
    loop {
        let b = ((k * step) * p).round() / p;
        if b > hi + step * 1e-10 {
            break;
        }
        out.push(if b == 0.0 { 0.0 } else { b });
        k += 1.0;
    }
    out
}

/// Format epoch seconds as an ISO date, adding the time when not midnight.
#[must_use]
pub fn format_datetime(secs: f64) -> String {
    if !secs.is_finite() {
        return "NA".to_string();
    }
    let days = (secs / 86_400.0).floor() as i64;
    let rem = (secs - days as f64 * 86_400.0).round() as i64;
    let (y, m, d) = civil_from_days(days);
    if rem == 0 {
        format!("{y:04}-{m:02}-{d:02}")
    } else {
        let (hh, mm, ss) = (rem / 3600, (rem % 3600) / 60, rem % 60);
        format!("{y:04}-{m:02}-{d:02} {hh:02}:{mm:02}:{ss:02}")
    }
}

/// Days since 1970-01-01 to a proleptic Gregorian date.
///
/// Howard Hinnant, "chrono-Compatible Low-Level Date Algorithms".
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_expand_range() {
        let (lo, hi) = expand_range((0.0, 10.0), Expansion::CONTINUOUS);
        assert_relative_eq!(lo, -0.5);
        assert_relative_eq!(hi, 10.5);
        let (lo, hi) = expand_range((1.0, 3.0), Expansion::DISCRETE);
        assert_relative_eq!(lo, 0.4);
        assert_relative_eq!(hi, 3.6);
        assert_eq!(expand_range((2.0, 2.0), Expansion::CONTINUOUS), (1.5, 2.5));
    }

    #[test]
    fn test_rescale_and_censor() {
        assert_relative_eq!(rescale(5.0, (0.0, 10.0)), 0.5);
        assert_relative_eq!(rescale(3.0, (3.0, 3.0)), 0.5);
        assert!(censor(1.5).is_nan());
        assert_relative_eq!(censor(1.0), 1.0);
        assert_relative_eq!(squish(-2.0), 0.0);
    }

    #[test]
    fn test_nice_breaks() {
        assert_eq!(nice_breaks(0.0, 100.0, 5), vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
        assert_eq!(nice_breaks(0.1, 0.5, 5), vec![0.1, 0.2, 0.3, 0.4, 0.5]);
        assert_eq!(nice_breaks(3.0, 3.0, 5), vec![3.0]);
        assert!(nice_breaks(f64::NAN, 1.0, 5).is_empty());
    }

    #[test]
    fn test_finite_range() {
        assert_eq!(finite_range(&[3.0, f64::NAN, -1.0, f64::INFINITY]), Some((-1.0, 3.0)));
        assert_eq!(finite_range(&[f64::INFINITY]), None);
    }

    #[test]
    fn test_format_datetime() {
        assert_eq!(format_datetime(0.0), "1970-01-01");
        assert_eq!(format_datetime(951_782_400.0), "2000-02-29");
        assert_eq!(format_datetime(3_661.0), "1970-01-01 01:01:01");
    }
}
