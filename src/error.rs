//! Error types for trueno-gg operations.
//!
//! Every fatal condition of the plot pipeline maps to one variant here.
//! Non-fatal conditions are [`crate::warning::PlotWarning`]s instead.

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while composing, building, drawing or saving a plot.
#[derive(Error, Debug)]
pub enum Error {
    /// An unrecognized parameter was given to a plot component.
    #[error("{component} does not accept the parameter '{param}'; expected one of: {allowed}")]
    Configuration {
        /// Component the parameter was given to.
        component: String,
        /// The offending parameter name.
        param: String,
        /// Comma separated list of accepted names.
        allowed: String,
    },

    /// A parameter value had the wrong type or range.
    #[error("{component}: invalid value for '{param}': {reason}")]
    InvalidParameter {
        /// Component the parameter was given to.
        component: String,
        /// The parameter name.
        param: String,
        /// What was wrong with the value.
        reason: String,
    },

    /// A component was looked up by a name no registry knows.
    #[error("unknown {kind} '{name}'")]
    UnknownComponent {
        /// Registry that was searched (geom, stat, scale, ...).
        kind: &'static str,
        /// The unresolved identifier.
        name: String,
    },

    /// An aesthetic mapping could not be evaluated.
    #[error("Could not evaluate the '{aesthetic}' mapping: '{expr}' (original error: {cause})")]
    Evaluation {
        /// Aesthetic being evaluated.
        aesthetic: String,
        /// Expression text (or a description of the value).
        expr: String,
        /// Underlying cause.
        cause: String,
    },

    /// Required aesthetics are absent after all upstream stages ran.
    #[error("{component} requires the following missing aesthetics: {}", .missing.join(", "))]
    MissingAesthetics {
        /// Geometry, statistic or position that needs them.
        component: String,
        /// Names of the missing aesthetics.
        missing: Vec<String>,
    },

    /// Incompatible scale and guide combination.
    #[error("cannot use a {guide} guide for the '{aesthetic}' scale: {reason}")]
    ScaleConflict {
        /// Aesthetic of the scale.
        aesthetic: String,
        /// Requested guide.
        guide: String,
        /// Why they do not fit together.
        reason: String,
    },

    /// Output dimensions exceed the safety ceiling.
    #[error(
        "Dimensions ({width:.2} x {height:.2} inches) exceed {ceiling} inches in at least one direction; \
         pass limitsize=false to save anyway"
    )]
    SizeLimit {
        /// Requested width in inches.
        width: f64,
        /// Requested height in inches.
        height: f64,
        /// The ceiling that was exceeded.
        ceiling: f64,
    },

    /// A scale could not be built because the column holds no finite value.
    #[error("cannot build a scale for '{0}': the column contains only infinite values")]
    NonFiniteScale(String),

    /// Faceting failure.
    #[error("Facet error: {0}")]
    Facet(String),

    /// Malformed tabular data.
    #[error("Data error: {0}")]
    Data(String),

    /// Color parsing error.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Options file error.
    #[error("Options error: {0}")]
    Options(#[from] serde_yaml_ng::Error),

    /// I/O error (file operations, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// PNG encoding error.
    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),

    /// Invalid dimensions for a framebuffer or figure.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },
}

impl Error {
    /// Shorthand for [`Error::Configuration`] built from an allowed-name list.
    pub(crate) fn configuration(component: &str, param: &str, allowed: &[&str]) -> Self {
        Self::Configuration {
            component: component.to_string(),
            param: param.to_string(),
            allowed: allowed.join(", "),
        }
    }

    /// Shorthand for [`Error::InvalidParameter`].
    pub(crate) fn invalid_parameter(component: &str, param: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            component: component.to_string(),
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidDimensions {
            width: 0,
            height: 100,
        };
        assert!(err.to_string().contains("Invalid dimensions"));
    }

    #[test]
    fn test_evaluation_error_names_everything() {
        let err = Error::Evaluation {
            aesthetic: "y".into(),
            expr: "b * q".into(),
            cause: "name 'q' is not defined".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'y'"));
        assert!(msg.contains("b * q"));
        assert!(msg.contains("'q' is not defined"));
    }

    #[test]
    fn test_missing_aesthetics_lists_names() {
        let err = Error::MissingAesthetics {
            component: "geom_rect".into(),
            missing: vec!["xmax".into(), "ymin".into()],
        };
        assert!(err.to_string().contains("geom_rect"));
        assert!(err.to_string().contains("xmax, ymin"));
    }

    #[test]
    fn test_size_limit_names_dimensions() {
        let err = Error::SizeLimit {
            width: 26.0,
            height: 30.0,
            ceiling: 25.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("26.00"));
        assert!(msg.contains("30.00"));
    }

    #[test]
    fn test_configuration_shorthand() {
        let err = Error::configuration("geom_point", "colr", &["color", "size"]);
        assert!(err.to_string().contains("'colr'"));
        assert!(err.to_string().contains("color, size"));
    }
}
