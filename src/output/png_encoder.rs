//! PNG output encoder.
//!
//! Pure Rust PNG encoding using the `png` crate. The pixel density is
//! stored in a `pHYs` chunk so viewers can recover the physical size.

use crate::error::Result;
use crate::render::Framebuffer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Inches per meter, for the `pHYs` chunk.
const INCHES_PER_METER: f64 = 39.370_078_740_157_48;

/// PNG encoder for framebuffer output.
pub struct PngEncoder;

impl PngEncoder {
    /// Write a framebuffer to a PNG file.
    ///
    /// # Errors
    ///
    /// Returns an error if file creation or PNG encoding fails.
    pub fn write_to_file<P: AsRef<Path>>(fb: &Framebuffer, dpi: u32, path: P) -> Result<()> {
        let file = File::create(path)?;
        Self::encode(fb, dpi, BufWriter::new(file))
    }

    /// Encode a framebuffer to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn to_bytes(fb: &Framebuffer, dpi: u32) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        Self::encode(fb, dpi, &mut buffer)?;
        Ok(buffer)
    }

    fn encode<W: Write>(fb: &Framebuffer, dpi: u32, out: W) -> Result<()> {
        let mut encoder = png::Encoder::new(out, fb.width(), fb.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let ppm = (f64::from(dpi) * INCHES_PER_METER).round() as u32;
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&fb.to_compact_pixels())?;
        writer.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    #[test]
    fn test_png_to_bytes() {
        let mut fb = Framebuffer::new(10, 10).unwrap();
        fb.clear(Rgba::RED);
        let bytes = PngEncoder::to_bytes(&fb, 100).unwrap();
        assert_eq!(&bytes[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    }

    #[test]
    fn test_png_records_dpi() {
        let fb = Framebuffer::new(4, 4).unwrap();
        let bytes = PngEncoder::to_bytes(&fb, 300).unwrap();
        let decoder = png::Decoder::new(bytes.as_slice());
        let reader = decoder.read_info().unwrap();
        let dims = reader.info().pixel_dims.unwrap();
        assert_eq!(dims.xppu, 11811);
        assert_eq!(dims.unit, png::Unit::Meter);
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let fb = Framebuffer::new(3, 2).unwrap();
        PngEncoder::write_to_file(&fb, 72, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 8);
    }
}
