//! Rendered figures.
//!
//! A [`Figure`] owns the built plot together with the surface it was drawn
//! on. Dropping the figure releases the surface; nothing else holds on to
//! rendering state, so rendering many plots in a loop does not accumulate
//! memory.

use super::framebuffer::Framebuffer;
use super::raster::RasterCanvas;
use super::renderer::draw_plot;
use crate::error::{Error, Result};
use crate::grammar::BuiltPlot;
use crate::output::png_encoder::PngEncoder;
use crate::output::svg::SvgCanvas;
use crate::output::Format;
use std::path::Path;

/// Drawing surface of a figure.
#[derive(Debug)]
enum Surface {
    Raster(RasterCanvas),
    Vector(SvgCanvas),
}

/// A built plot drawn at a fixed size and resolution.
#[derive(Debug)]
pub struct Figure {
    plot: BuiltPlot,
    surface: Surface,
    dpi: u32,
}

/// Pixel size of a `width` x `height` inch surface at `dpi`.
fn surface_size(width: f64, height: f64, dpi: u32) -> Result<(u32, u32)> {
    let w = (width * f64::from(dpi)).round();
    let h = (height * f64::from(dpi)).round();
    let valid = |v: f64| v.is_finite() && v >= 1.0 && v <= f64::from(u32::MAX);
    if !valid(w) || !valid(h) {
        return Err(Error::InvalidDimensions {
            width: w as u32,
            height: h as u32,
        });
    }
    Ok((w as u32, h as u32))
}

impl Figure {
    /// Draw `plot` onto a raster surface of `width` x `height` inches.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDimensions`] for empty or oversized surfaces.
    pub fn raster(plot: BuiltPlot, width: f64, height: f64, dpi: u32) -> Result<Self> {
        let (w, h) = surface_size(width, height, dpi)?;
        let mut canvas = RasterCanvas::new(w, h, plot.theme().background)?;
        draw_plot(&plot, &mut canvas, f64::from(dpi));
        tracing::debug!(width = w, height = h, dpi, "raster figure drawn");
        Ok(Self {
            plot,
            surface: Surface::Raster(canvas),
            dpi,
        })
    }

    /// Draw `plot` into an SVG document of `width` x `height` inches.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDimensions`] for empty or oversized documents.
    pub fn vector(plot: BuiltPlot, width: f64, height: f64, dpi: u32) -> Result<Self> {
        let (w, h) = surface_size(width, height, dpi)?;
        let mut canvas = SvgCanvas::new(f64::from(w), f64::from(h), Some(plot.theme().background));
        draw_plot(&plot, &mut canvas, f64::from(dpi));
        tracing::debug!(width = w, height = h, dpi, "vector figure drawn");
        Ok(Self {
            plot,
            surface: Surface::Vector(canvas),
            dpi,
        })
    }

    /// Draw `plot` on the surface `format` needs.
    pub fn render(plot: BuiltPlot, format: Format, width: f64, height: f64, dpi: u32) -> Result<Self> {
        match format {
            Format::Png => Self::raster(plot, width, height, dpi),
            Format::Svg => Self::vector(plot, width, height, dpi),
        }
    }

    /// The plot this figure shows.
    #[must_use]
    pub fn plot(&self) -> &BuiltPlot {
        &self.plot
    }

    /// Resolution the figure was drawn at.
    #[must_use]
    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Surface size in pixels.
    #[must_use]
    pub fn size_px(&self) -> (u32, u32) {
        match &self.surface {
            Surface::Raster(c) => (c.framebuffer().width(), c.framebuffer().height()),
            Surface::Vector(c) => {
                let (w, h) = crate::render::Canvas::size(c);
                (w as u32, h as u32)
            }
        }
    }

    /// Pixels of a raster figure.
    #[must_use]
    pub fn framebuffer(&self) -> Option<&Framebuffer> {
        match &self.surface {
            Surface::Raster(c) => Some(c.framebuffer()),
            Surface::Vector(_) => None,
        }
    }

    /// Document of a vector figure.
    #[must_use]
    pub fn svg(&self) -> Option<String> {
        match &self.surface {
            Surface::Vector(c) => Some(c.render()),
            Surface::Raster(_) => None,
        }
    }

    /// Encoded bytes in the figure's native format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match &self.surface {
            Surface::Raster(c) => PngEncoder::to_bytes(c.framebuffer(), self.dpi),
            Surface::Vector(c) => Ok(c.render().into_bytes()),
        }
    }

    /// Write the figure to `path` in its native format.
    ///
    /// # Errors
    ///
    /// I/O and encoding failures.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        match &self.surface {
            Surface::Raster(c) => PngEncoder::write_to_file(c.framebuffer(), self.dpi, path),
            Surface::Vector(c) => c.write_to_file(path),
        }
    }

    /// Release the figure now.
    pub fn close(self) {}
}

impl Drop for Figure {
    fn drop(&mut self) {
        let (w, h) = self.size_px();
        tracing::debug!(width = w, height = h, "figure released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::data::DataFrame;
    use crate::grammar::{ggplot, Aes, Geom};

    fn built() -> BuiltPlot {
        let df = DataFrame::new()
            .with_column("x", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("y", vec![2.0, 1.0, 3.0])
            .unwrap();
        (ggplot(Some(df), Aes::new().x("x").y("y")) + Geom::point()).build().unwrap()
    }

    #[test]
    fn test_raster_size_follows_dpi() {
        let fig = Figure::raster(built(), 2.0, 1.5, 50).unwrap();
        assert_eq!(fig.size_px(), (100, 75));
        assert!(fig.svg().is_none());
        let fb = fig.framebuffer().unwrap();
        assert!(fb.count_unlike(Rgba::WHITE) > 0);
    }

    #[test]
    fn test_vector_figure() {
        let fig = Figure::vector(built(), 3.0, 2.0, 100).unwrap();
        assert!(fig.framebuffer().is_none());
        let svg = fig.svg().unwrap();
        assert!(svg.contains(r#"width="300""#));
        assert_eq!(svg.matches("<circle").count(), 3);
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = Figure::raster(built(), 0.0, 2.0, 100).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { .. }));
    }

    #[test]
    fn test_many_figures_release() {
        for _ in 0..20 {
            let fig = Figure::raster(built(), 1.0, 1.0, 40).unwrap();
            fig.close();
        }
    }

    #[test]
    fn test_write_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fig.png");
        let fig = Figure::raster(built(), 1.0, 1.0, 30).unwrap();
        fig.write_to(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(fig.to_bytes().unwrap(), bytes);
    }
}
