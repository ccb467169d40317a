//! Layered grammar of graphics.
//!
//! A plot is data, a default aesthetic mapping and a list of layers. Each
//! layer pairs a geometry with a statistic and a position adjustment.
//! Scales, a facet, a coordinate system, labels and a theme complete the
//! description. [`build`] turns the description into drawable per-panel
//! data.
//!
//! # Components
//!
//! - **Aesthetics**: mappings from data to visual channels, evaluated at
//!   the start, after the statistic or after scale mapping
//! - **Geometries**: the mark drawn per row or group
//! - **Statistics**: per-group transformations (counts, bins, densities)
//! - **Positions**: per-panel de-overlapping (stack, dodge, jitter)
//! - **Facets and layout**: small multiples and their panel scales
//! - **Coordinates**: axis ranges and the mapping into panel space
//!
//! # Example
//!
//! ```rust
//! use trueno_gg::data::DataFrame;
//! use trueno_gg::grammar::*;
//!
//! let df = DataFrame::new()
//!     .with_column("a", vec![1.0, 2.0, 3.0])
//!     .unwrap()
//!     .with_column("b", vec![4.0, 5.0, 6.0])
//!     .unwrap();
//! let plot = ggplot(Some(df), Aes::new().x("a").y("b")) + Geom::point();
//! let built = plot.build().unwrap();
//! assert_eq!(built.layers()[0].data.nrow(), 3);
//! ```
//!
//! # References
//!
//! - Wilkinson, L. (2005). *The Grammar of Graphics*. Springer.
//! - Wickham, H. (2010). "A Layered Grammar of Graphics." Journal of Computational
//!   and Graphical Statistics.

pub mod aes;
pub mod annotate;
pub mod build;
pub mod coord;
pub mod evaluate;
pub mod expr;
pub mod facet;
pub mod geom;
pub mod ggplot;
pub mod guide;
pub mod labels;
pub mod layer;
pub mod layout;
pub mod params;
pub mod position;
pub mod stat;
pub mod theme;

pub use aes::{after_scale, after_stat, stage, Aes, AesExpr, Stage};
pub use annotate::{annotate, Annotation};
pub use build::{build, BuiltLayer, BuiltPlot};
pub use coord::{AxisView, Coord, PanelParams};
pub use expr::{Environment, Namespace, Value};
pub use facet::{Facet, FacetScales};
pub use geom::{Geom, GeomKind};
pub use ggplot::{ggplot, GGPlot, PlotComponent};
pub use guide::{Guide, GuideBody, LegendKey};
pub use labels::{ggtitle, labs, xlab, ylab, Labs};
pub use layer::Layer;
pub use layout::{Layout, PanelInfo};
pub use params::Params;
pub use position::{Position, PositionAdjust};
pub use stat::{Stat, StatCompute};
pub use theme::{LegendPosition, Theme};
