//! Non-fatal plot warnings.
//!
//! A warning never interrupts a build. Each one is logged through `tracing`
//! when it is raised and kept in a [`Warnings`] list so callers can inspect
//! what happened.

use std::fmt;

/// A non-fatal condition raised while composing or building a plot.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotWarning {
    /// Rows with non-finite or missing values were dropped.
    RowsRemoved {
        /// Component that dropped them.
        component: String,
        /// Number of rows removed.
        count: usize,
        /// Describes what the rows contained.
        reason: &'static str,
    },
    /// A scale replaced another scale for the same aesthetic.
    DuplicateScale {
        /// The aesthetic both scales claim.
        aesthetic: String,
    },
    /// A discrete palette had fewer values than categories.
    PaletteExhausted {
        /// Aesthetic of the scale.
        aesthetic: String,
        /// Number of categories.
        needed: usize,
        /// Number of palette values.
        available: usize,
    },
    /// A position adjustment saw data it cannot handle cleanly.
    Position {
        /// Position adjustment name.
        component: String,
        /// Description.
        message: String,
    },
}

impl fmt::Display for PlotWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowsRemoved {
                component,
                count,
                reason,
            } => write!(f, "{component}: removed {count} rows containing {reason}"),
            Self::DuplicateScale { aesthetic } => write!(
                f,
                "Scale for '{aesthetic}' is already present. Adding another scale for \
                 '{aesthetic}', which will replace the existing scale."
            ),
            Self::PaletteExhausted {
                aesthetic,
                needed,
                available,
            } => write!(
                f,
                "The '{aesthetic}' palette can deal with a maximum of {available} discrete \
                 values; you have {needed}. Values will be recycled."
            ),
            Self::Position { component, message } => write!(f, "{component}: {message}"),
        }
    }
}

/// Ordered list of raised warnings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Warnings(Vec<PlotWarning>);

impl Warnings {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and record a warning.
    pub fn push(&mut self, warning: PlotWarning) {
        tracing::warn!("{warning}");
        self.0.push(warning);
    }

    /// Append every warning of another list without logging them again.
    pub fn extend(&mut self, other: Warnings) {
        self.0.extend(other.0);
    }

    /// Recorded warnings in the order they were raised.
    #[must_use]
    pub fn as_slice(&self) -> &[PlotWarning] {
        &self.0
    }

    /// Number of recorded warnings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the recorded warnings.
    pub fn iter(&self) -> std::slice::Iter<'_, PlotWarning> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a PlotWarning;
    type IntoIter = std::slice::Iter<'a, PlotWarning>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_scale_message() {
        let w = PlotWarning::DuplicateScale {
            aesthetic: "x".into(),
        };
        assert!(w.to_string().contains("Scale for 'x' is already present"));
    }

    #[test]
    fn test_push_and_extend() {
        let mut a = Warnings::new();
        a.push(PlotWarning::RowsRemoved {
            component: "stat_bin".into(),
            count: 3,
            reason: "non-finite values",
        });
        let mut b = Warnings::new();
        b.extend(a.clone());
        assert_eq!(b.len(), 1);
        assert!(b.as_slice()[0].to_string().contains("removed 3 rows"));
    }
}
