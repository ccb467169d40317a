//! Writing plots to files.

use crate::error::{Error, Result};
use crate::grammar::GGPlot;
use crate::options::options;
use crate::render::Figure;
use std::path::Path;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Raster image.
    Png,
    /// Vector document.
    Svg,
}

impl Format {
    /// Format for a file extension, case-insensitive.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownComponent`] for anything but `png` and `svg`.
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            _ => Err(Error::UnknownComponent {
                kind: "output format",
                name: ext.to_string(),
            }),
        }
    }

    /// Format implied by the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::from_extension(ext)
    }
}

/// Unit of `width` and `height`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Units {
    /// Inches.
    #[default]
    In,
    /// Centimeters.
    Cm,
    /// Millimeters.
    Mm,
    /// Pixels at the save dpi.
    Px,
}

impl Units {
    /// Parse `in`, `cm`, `mm` or `px`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "in" => Ok(Self::In),
            "cm" => Ok(Self::Cm),
            "mm" => Ok(Self::Mm),
            "px" => Ok(Self::Px),
            _ => Err(Error::UnknownComponent {
                kind: "unit",
                name: name.to_string(),
            }),
        }
    }

    fn to_inches(self, value: f64, dpi: u32) -> f64 {
        match self {
            Self::In => value,
            Self::Cm => value / 2.54,
            Self::Mm => value / 25.4,
            Self::Px => value / f64::from(dpi),
        }
    }
}

/// Settings for [`save`]. Unset fields fall back to the process-wide
/// options.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOptions {
    /// Output format; inferred from the file extension when `None`.
    pub format: Option<Format>,
    /// Width in `units`.
    pub width: Option<f64>,
    /// Height in `units`.
    pub height: Option<f64>,
    /// Unit of `width` and `height`.
    pub units: Units,
    /// Resolution.
    pub dpi: Option<u32>,
    /// Refuse sizes above the ceiling.
    pub limitsize: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            format: None,
            width: None,
            height: None,
            units: Units::In,
            dpi: None,
            limitsize: true,
        }
    }
}

impl SaveOptions {
    /// Defaults: size and dpi from the options, `limitsize` on.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size in `units`.
    #[must_use]
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the size unit.
    #[must_use]
    pub fn units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Set the resolution.
    #[must_use]
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    /// Force a format.
    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Turn the size ceiling check on or off.
    #[must_use]
    pub fn limitsize(mut self, on: bool) -> Self {
        self.limitsize = on;
        self
    }
}

/// Build `plot`, draw it and write it to `path`.
///
/// The size check runs first, so an oversized request fails without
/// building anything. The figure is released on every exit path.
///
/// # Errors
///
/// [`Error::SizeLimit`], any build error, and I/O or encoding failures.
#[tracing::instrument(level = "debug", skip(plot, opts), fields(path = %path.display()))]
pub fn save(plot: &GGPlot, path: &Path, opts: &SaveOptions) -> Result<()> {
    let defaults = options();
    let format = match opts.format {
        Some(f) => f,
        None => Format::from_path(path)?,
    };
    let dpi = opts.dpi.unwrap_or(defaults.dpi);
    if dpi == 0 {
        return Err(Error::InvalidDimensions { width: 0, height: 0 });
    }
    let (default_w, default_h) = defaults.figure_size;
    let width = opts.width.map_or(default_w, |w| opts.units.to_inches(w, dpi));
    let height = opts.height.map_or(default_h, |h| opts.units.to_inches(h, dpi));
    let ceiling = defaults.limitsize_ceiling;
    if opts.limitsize && (width > ceiling || height > ceiling) {
        return Err(Error::SizeLimit { width, height, ceiling });
    }

    tracing::info!("saving {width:.2} x {height:.2} in image");
    let built = plot.build()?;
    let figure = Figure::render(built, format, width, height, dpi)?;
    figure.write_to(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataFrame;
    use crate::grammar::{ggplot, Aes, Geom};
    use approx::assert_relative_eq;

    fn plot() -> GGPlot {
        let df = DataFrame::new()
            .with_column("x", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("y", vec![3.0, 1.0, 2.0])
            .unwrap();
        ggplot(Some(df), Aes::new().x("x").y("y")) + Geom::point()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a/b.PNG")).unwrap(), Format::Png);
        assert_eq!(Format::from_path(Path::new("plot.svg")).unwrap(), Format::Svg);
        let err = Format::from_path(Path::new("plot.gif")).unwrap_err();
        assert!(err.to_string().contains("gif"));
    }

    #[test]
    fn test_unit_conversion() {
        assert_relative_eq!(Units::Cm.to_inches(2.54, 100), 1.0);
        assert_relative_eq!(Units::Mm.to_inches(254.0, 100), 10.0);
        assert_relative_eq!(Units::Px.to_inches(300.0, 150), 2.0);
    }

    #[test]
    fn test_size_limit_checked_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        let err = save(&plot(), &path, &SaveOptions::new().size(26.0, 26.0)).unwrap_err();
        match err {
            Error::SizeLimit { width, height, .. } => {
                assert_relative_eq!(width, 26.0);
                assert_relative_eq!(height, 26.0);
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_limitsize_off() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        let opts = SaveOptions::new().size(26.0, 26.0).dpi(4).limitsize(false);
        save(&plot(), &path, &opts).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_svg_in_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.svg");
        let opts = SaveOptions::new().size(300.0, 200.0).units(Units::Px).dpi(100);
        save(&plot(), &path, &opts).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains(r#"width="300""#));
        assert!(svg.contains(r#"height="200""#));
    }
}
