//! Drawing built plots.
//!
//! [`draw_plot`] walks a [`BuiltPlot`](crate::grammar::BuiltPlot) and issues
//! drawing calls against the [`Canvas`] trait. Two backends implement it:
//! [`RasterCanvas`] rasterizes into a [`Framebuffer`] and
//! [`SvgCanvas`](crate::output::SvgCanvas) records vector elements.
//!
//! # Algorithms
//!
//! - **Wu's anti-aliased line** for hairlines
//! - **Midpoint circle** for point markers
//! - **Even-odd scanline fill** for bars, areas and polygons
//!
//! # References
//!
//! - Wu, X. (1991). "An Efficient Antialiasing Technique." SIGGRAPH '91.

mod canvas;
mod figure;
mod framebuffer;
mod primitives;
mod raster;
mod renderer;

pub use canvas::{dash_segments, Anchor, Canvas, Stroke, TextStyle};
pub use figure::Figure;
pub use framebuffer::Framebuffer;
pub use primitives::{draw_line, draw_line_aa, fill_circle, fill_polygon, fill_rect, stroke_circle};
pub use raster::RasterCanvas;
pub use renderer::draw_plot;
