//! Output encoders (PNG, SVG) and file saving.

pub(crate) mod png_encoder;
mod save;
pub(crate) mod svg;

pub use png_encoder::PngEncoder;
pub use save::{save, Format, SaveOptions, Units};
pub use svg::{SvgCanvas, SvgElement};
