//! Color types, parsing and palette helpers.
//!
//! Colors are the output type of the color/fill scales and of literal color
//! settings on geometries. Strings like `"steelblue"`, `"grey40"` or
//! `"#1f77b4"` are parsed into [`Rgba`].

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct Rgba {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
    /// Alpha component (0-255, 255 = fully opaque).
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Opaque red.
    pub const RED: Self = Self::new(255, 0, 0, 255);
    /// Opaque blue.
    pub const BLUE: Self = Self::new(0, 0, 255, 255);
    /// The grey used for missing values (`grey50`).
    pub const NA_GREY: Self = Self::new(127, 127, 127, 255);

    /// Create a new RGBA color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color (alpha = 255).
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Create a color with modified alpha.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Create a color whose alpha is `alpha` in `[0, 1]`.
    #[must_use]
    pub fn with_alpha_f(self, alpha: f64) -> Self {
        self.with_alpha((alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Alpha as a fraction in `[0, 1]`.
    #[must_use]
    pub fn alpha_f(self) -> f64 {
        f64::from(self.a) / 255.0
    }

    /// Convert to array representation.
    #[must_use]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Create from array representation.
    #[must_use]
    pub const fn from_array(arr: [u8; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }

    /// Linear interpolation between two colors.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f64::from(a) * (1.0 - t) + f64::from(b) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    /// Hex notation, `#rrggbb` or `#rrggbbaa` when not opaque.
    #[must_use]
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Parse a color name, `greyNN`/`grayNN` level or hex string.
    pub fn parse(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        if let Some(hex) = lower.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| Error::InvalidColor(s.to_string()));
        }
        if let Some(level) = lower
            .strip_prefix("grey")
            .or_else(|| lower.strip_prefix("gray"))
            .filter(|rest| !rest.is_empty())
        {
            let pct: u8 = level
                .parse()
                .ok()
                .filter(|p| *p <= 100)
                .ok_or_else(|| Error::InvalidColor(s.to_string()))?;
            let v = (f64::from(pct) / 100.0 * 255.0).round() as u8;
            return Ok(Self::rgb(v, v, v));
        }
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, c)| *c)
            .ok_or_else(|| Error::InvalidColor(s.to_string()))
    }
}

impl FromStr for Rgba {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        3 => {
            let nib = |i: usize| u8::from_str_radix(hex.get(i..=i)?, 16).ok().map(|v| v * 17);
            Some(Rgba::rgb(nib(0)?, nib(1)?, nib(2)?))
        }
        _ => None,
    }
}

const NAMED_COLORS: &[(&str, Rgba)] = &[
    ("black", Rgba::BLACK),
    ("white", Rgba::WHITE),
    ("red", Rgba::RED),
    ("green", Rgba::rgb(0, 128, 0)),
    ("blue", Rgba::BLUE),
    ("yellow", Rgba::rgb(255, 255, 0)),
    ("cyan", Rgba::rgb(0, 255, 255)),
    ("magenta", Rgba::rgb(255, 0, 255)),
    ("orange", Rgba::rgb(255, 165, 0)),
    ("purple", Rgba::rgb(128, 0, 128)),
    ("pink", Rgba::rgb(255, 192, 203)),
    ("brown", Rgba::rgb(165, 42, 42)),
    ("grey", Rgba::rgb(190, 190, 190)),
    ("gray", Rgba::rgb(190, 190, 190)),
    ("darkgrey", Rgba::rgb(169, 169, 169)),
    ("darkgray", Rgba::rgb(169, 169, 169)),
    ("lightgrey", Rgba::rgb(211, 211, 211)),
    ("lightgray", Rgba::rgb(211, 211, 211)),
    ("navy", Rgba::rgb(0, 0, 128)),
    ("steelblue", Rgba::rgb(70, 130, 180)),
    ("darkblue", Rgba::rgb(0, 0, 139)),
    ("skyblue", Rgba::rgb(135, 206, 235)),
    ("darkred", Rgba::rgb(139, 0, 0)),
    ("darkgreen", Rgba::rgb(0, 100, 0)),
    ("forestgreen", Rgba::rgb(34, 139, 34)),
    ("firebrick", Rgba::rgb(178, 34, 34)),
    ("tomato", Rgba::rgb(255, 99, 71)),
    ("gold", Rgba::rgb(255, 215, 0)),
    ("salmon", Rgba::rgb(250, 128, 114)),
    ("violet", Rgba::rgb(238, 130, 238)),
    ("transparent", Rgba::TRANSPARENT),
    ("none", Rgba::TRANSPARENT),
];

/// HSLA color with floating-point components.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsla {
    /// Hue (0.0-360.0 degrees).
    pub h: f64,
    /// Saturation (0.0-1.0).
    pub s: f64,
    /// Lightness (0.0-1.0).
    pub l: f64,
    /// Alpha (0.0-1.0).
    pub a: f64,
}

impl Hsla {
    /// Create an opaque HSL color (alpha = 1.0).
    #[must_use]
    pub const fn hsl(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l, a: 1.0 }
    }

    /// Convert to RGBA.
    #[must_use]
    pub fn to_rgba(self) -> Rgba {
        let h = self.h.rem_euclid(360.0) / 360.0;
        let (s, l) = (self.s, self.l);

        let (r, g, b) = if s == 0.0 {
            (l, l, l)
        } else {
            let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
            let p = 2.0 * l - q;
            (
                hue_to_rgb(p, q, h + 1.0 / 3.0),
                hue_to_rgb(p, q, h),
                hue_to_rgb(p, q, h - 1.0 / 3.0),
            )
        };

        let to_u8 = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgba::new(to_u8(r), to_u8(g), to_u8(b), to_u8(self.a))
    }
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

impl From<Hsla> for Rgba {
    fn from(hsla: Hsla) -> Self {
        hsla.to_rgba()
    }
}

/// `n` evenly spaced hues starting at `h_start` degrees.
///
/// The hue circle is split into `n` steps; when the range covers the whole
/// circle the last step is dropped so first and last colors differ.
#[must_use]
pub fn hue_palette(n: usize, h_start: f64, saturation: f64, lightness: f64) -> Vec<Rgba> {
    if n == 0 {
        return Vec::new();
    }
    let step = 360.0 / n as f64;
    (0..n)
        .map(|i| Hsla::hsl(h_start + step * i as f64, saturation, lightness).to_rgba())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_lerp() {
        let mid = Rgba::BLACK.lerp(Rgba::WHITE, 0.5);
        assert_eq!(mid.r, 128);
        assert_eq!(mid.g, 128);
        assert_eq!(mid.b, 128);
    }

    #[test]
    fn test_parse_named_and_hex() {
        assert_eq!(Rgba::parse("Red").unwrap(), Rgba::RED);
        assert_eq!(Rgba::parse("#ff8000").unwrap(), Rgba::rgb(255, 128, 0));
        assert_eq!(Rgba::parse("#f00").unwrap(), Rgba::RED);
        assert_eq!(Rgba::parse("#ff000080").unwrap().a, 128);
        assert_eq!(Rgba::parse("grey50").unwrap(), Rgba::rgb(128, 128, 128));
        assert!(Rgba::parse("notacolor").is_err());
        assert!(Rgba::parse("grey101").is_err());
    }

    #[test]
    fn test_hex_round_trip() {
        let c = Rgba::rgb(31, 119, 180);
        assert_eq!(c.to_hex(), "#1f77b4");
        assert_eq!(Rgba::parse(&c.to_hex()).unwrap(), c);
    }

    #[test]
    fn test_hsla_to_rgba() {
        let red = Hsla::hsl(0.0, 1.0, 0.5).to_rgba();
        assert_eq!(red, Rgba::RED);
        let gray = Hsla::hsl(0.0, 0.0, 0.5).to_rgba();
        assert_eq!(gray.r, 128);
    }

    #[test]
    fn test_hue_palette_distinct() {
        let pal = hue_palette(3, 15.0, 0.65, 0.6);
        assert_eq!(pal.len(), 3);
        assert_ne!(pal[0], pal[1]);
        assert_ne!(pal[1], pal[2]);
        assert!(hue_palette(0, 15.0, 0.65, 0.6).is_empty());
    }

    #[test]
    fn test_alpha_helpers() {
        let c = Rgba::RED.with_alpha_f(0.5);
        assert_eq!(c.a, 128);
        assert!((c.alpha_f() - 0.502).abs() < 0.01);
    }
}
