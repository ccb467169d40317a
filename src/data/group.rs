//! Row keys, interaction ids and grouped frames.

use super::{Column, DataFrame};
use crate::error::{Error, Result};
use std::cmp::Ordering;

/// Ordering key of one cell. Missing values sort last.
#[derive(Debug, Clone)]
pub enum SortKey {
    /// Numeric value.
    Num(f64),
    /// Level index of a categorical or boolean.
    Code(usize),
    /// Text value.
    Str(String),
    /// Missing value.
    Missing,
}

impl SortKey {
    fn rank(&self) -> u8 {
        match self {
            Self::Num(_) => 0,
            Self::Code(_) => 1,
            Self::Str(_) => 2,
            Self::Missing => 3,
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Num(a), Self::Num(b)) => a.total_cmp(b),
            (Self::Code(a), Self::Code(b)) => a.cmp(b),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

/// Interaction ids of several columns.
///
/// Each row gets the 1-based rank of its combination of values among all
/// distinct combinations present, in sorted order.
#[must_use]
pub fn ninteraction(columns: &[&Column], nrow: usize) -> Vec<usize> {
    if columns.is_empty() {
        return vec![1; nrow];
    }
    let keys: Vec<Vec<SortKey>> = (0..nrow)
        .map(|i| columns.iter().map(|c| c.sort_key(i)).collect())
        .collect();
    let mut unique: Vec<&Vec<SortKey>> = keys.iter().collect();
    unique.sort();
    unique.dedup();
    keys.iter()
        .map(|k| unique.binary_search(&k).map_or(0, |pos| pos + 1))
        .collect()
}

/// A data frame with grouping variables attached.
///
/// Piping it into a plot (`grouped >> plot`) supplies the plot's data and
/// makes the grouping variables the default `group` mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedFrame {
    frame: DataFrame,
    vars: Vec<String>,
}

impl GroupedFrame {
    /// Group `frame` by `vars`; every variable must be a column.
    pub fn new(frame: DataFrame, vars: &[&str]) -> Result<Self> {
        if let Some(missing) = vars.iter().find(|v| !frame.has_column(v)) {
            return Err(Error::Data(format!("cannot group by unknown column '{missing}'")));
        }
        Ok(Self {
            frame,
            vars: vars.iter().map(|v| (*v).to_string()).collect(),
        })
    }

    /// The underlying frame.
    #[must_use]
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Grouping variables.
    #[must_use]
    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    /// Split into the frame and its grouping variables.
    #[must_use]
    pub fn into_parts(self) -> (DataFrame, Vec<String>) {
        (self.frame, self.vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ninteraction_two_columns() {
        let a = Column::from(vec!["x", "y", "x", "y"]);
        let b = Column::Number(vec![1.0, 1.0, 2.0, 1.0]);
        let ids = ninteraction(&[&a, &b], 4);
        assert_eq!(ids, vec![1, 3, 2, 3]);
    }

    #[test]
    fn test_missing_sorts_last() {
        let a = Column::Number(vec![f64::NAN, 2.0, 1.0]);
        assert_eq!(ninteraction(&[&a], 3), vec![3, 2, 1]);
    }

    #[test]
    fn test_grouped_frame_rejects_unknown_column() {
        let df = DataFrame::new().with_column("a", vec![1.0]).unwrap();
        assert!(df.clone().group_by(&["nope"]).is_err());
        let g = df.group_by(&["a"]).unwrap();
        assert_eq!(g.vars(), &["a".to_string()]);
    }
}
