//! # Trueno-GG
//!
//! A layered grammar of graphics: plots are composed by adding independent
//! components (data, aesthetic mappings, layers, scales, coordinates,
//! facets, themes) and resolved by a deterministic build pipeline into
//! drawable layer data, trained scales, panels and guides.
//!
//! ## Features
//!
//! - **Composition**: `plot + component` never mutates its operands
//! - **Staged aesthetics**: map from data, from computed statistics, or
//!   after scaling
//! - **Deterministic build**: 18 ordered stages, no hidden state
//! - **Pure Rust output**: PNG through a software rasterizer, SVG as text
//!
//! ## Quick Start
//!
//! ```rust
//! use trueno_gg::prelude::*;
//!
//! let df = DataFrame::new()
//!     .with_column("x", vec![1.0, 2.0, 3.0])?
//!     .with_column("y", vec![2.0, 4.0, 1.0])?;
//! let plot = ggplot(Some(df), Aes::new().x("x").y("y")) + Geom::point();
//! let built = plot.build()?;
//! assert_eq!(built.layers()[0].data.nrow(), 3);
//! # Ok::<(), trueno_gg::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli`: the `trueno-gg` command line front end
//! - `full`: all features enabled
//!
//! ## References
//!
//! - Wilkinson, L. (2005). *The Grammar of Graphics*. Springer.
//! - Wickham, H. (2010). "A Layered Grammar of Graphics." JCGS 19(1).
//! - Heckbert, P. (1990). "Nice Numbers for Graph Labels." Graphics Gems.
//! - Wu, X. (1991). "An Efficient Antialiasing Technique." SIGGRAPH '91.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
// Allow unwrap() in tests only - banned in production code
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Core Modules
// ============================================================================

/// Color types, parsing and palettes.
pub mod color;

/// Tabular data: data frames, columns and grouping.
pub mod data;

/// Scales: training, mapping, breaks and the scale collection.
pub mod scale;

/// Process-wide plot options.
pub mod options;

/// Non-fatal conditions raised while composing and building.
pub mod warning;

// ============================================================================
// Grammar
// ============================================================================

/// Plot composition and the build pipeline.
pub mod grammar;

// ============================================================================
// Rendering Modules
// ============================================================================

/// Canvas trait, raster backend and the plot renderer.
pub mod render;

/// Output encoders (PNG, SVG) and saving.
pub mod output;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for trueno-gg operations.
pub mod error;

pub use error::{Error, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types and functions for convenient imports.
///
/// ```rust
/// use trueno_gg::prelude::*;
/// ```
pub mod prelude {
    pub use crate::color::Rgba;
    pub use crate::data::{Column, DataFrame, DataValue};
    pub use crate::error::{Error, Result};
    pub use crate::grammar::{
        after_scale, after_stat, annotate, ggplot, ggtitle, labs, stage, xlab, ylab, Aes, BuiltPlot, Coord, Facet,
        FacetScales, GGPlot, Geom, Labs, LegendPosition, Position, Stat, Theme,
    };
    pub use crate::options::{options, set_options, PlotOptions};
    pub use crate::output::{Format, SaveOptions, Units};
    pub use crate::render::Figure;
    pub use crate::scale::Scale;
}
