//! Palettes: the functions scales use to turn positions into visual values.
//!
//! Continuous palettes take a rescaled value in `[0, 1]`; discrete palettes
//! produce `n` values at once. Gradient presets use the classic
//! sequential and diverging color stops.

use crate::color::{hue_palette, Rgba};
use crate::data::DataValue;
use crate::error::{Error, Result};

/// Point shapes in the order discrete shape scales hand them out.
pub const SHAPES: &[&str] = &["o", "^", "s", "D", "v", "*", "p", "8", "<", "h", ">", "H", "d"];

/// Line types in the order discrete linetype scales hand them out.
pub const LINETYPES: &[&str] = &["solid", "dashed", "dotted", "dotdash", "longdash", "twodash"];

/// Low end of the default continuous color gradient.
pub const GRADIENT_LOW: Rgba = Rgba::rgb(0x13, 0x2B, 0x43);
/// High end of the default continuous color gradient.
pub const GRADIENT_HIGH: Rgba = Rgba::rgb(0x56, 0xB1, 0xF7);

/// A mapping from normalized data to aesthetic values.
#[derive(Debug, Clone, PartialEq)]
pub enum Palette {
    /// Values pass through unchanged.
    Identity,
    /// Piecewise linear interpolation through color stops.
    Gradient(Vec<Rgba>),
    /// Evenly spaced hues.
    Hue {
        /// Hue of the first color in degrees.
        h_start: f64,
        /// HSL saturation.
        saturation: f64,
        /// HSL lightness.
        lightness: f64,
    },
    /// Explicit values, used in order.
    Manual(Vec<DataValue>),
    /// Area-proportional sizes: the square root of the position is
    /// rescaled into `[low, high]`.
    Area {
        /// Smallest size.
        low: f64,
        /// Largest size.
        high: f64,
    },
    /// Linear rescale into `[low, high]`.
    Rescale {
        /// Value at 0.
        low: f64,
        /// Value at 1.
        high: f64,
    },
    /// Point shapes.
    Shapes,
    /// Line types.
    Linetypes,
}

impl Palette {
    /// The default continuous color gradient.
    #[must_use]
    pub fn gradient() -> Self {
        Self::Gradient(vec![GRADIENT_LOW, GRADIENT_HIGH])
    }

    /// Default discrete color palette.
    #[must_use]
    pub fn hue() -> Self {
        Self::Hue {
            h_start: 15.0,
            saturation: 0.65,
            lightness: 0.65,
        }
    }

    /// Sequential blues.
    #[must_use]
    pub fn blues() -> Self {
        Self::Gradient(vec![
            Rgba::rgb(247, 251, 255),
            Rgba::rgb(198, 219, 239),
            Rgba::rgb(107, 174, 214),
            Rgba::rgb(33, 113, 181),
            Rgba::rgb(8, 48, 107),
        ])
    }

    /// Diverging red to blue.
    #[must_use]
    pub fn red_blue() -> Self {
        Self::Gradient(vec![
            Rgba::rgb(178, 24, 43),
            Rgba::rgb(239, 138, 98),
            Rgba::rgb(247, 247, 247),
            Rgba::rgb(103, 169, 207),
            Rgba::rgb(33, 102, 172),
        ])
    }

    /// Viridis (perceptually uniform).
    #[must_use]
    pub fn viridis() -> Self {
        Self::Gradient(vec![
            Rgba::rgb(68, 1, 84),
            Rgba::rgb(59, 82, 139),
            Rgba::rgb(33, 145, 140),
            Rgba::rgb(94, 201, 98),
            Rgba::rgb(253, 231, 37),
        ])
    }

    /// Magma (sequential, perceptually uniform).
    #[must_use]
    pub fn magma() -> Self {
        Self::Gradient(vec![
            Rgba::rgb(0, 0, 4),
            Rgba::rgb(81, 18, 124),
            Rgba::rgb(183, 55, 121),
            Rgba::rgb(252, 137, 97),
            Rgba::rgb(252, 253, 191),
        ])
    }

    /// Black to white.
    #[must_use]
    pub fn greyscale() -> Self {
        Self::Gradient(vec![Rgba::BLACK, Rgba::WHITE])
    }

    /// Black, red, yellow, white.
    #[must_use]
    pub fn heat() -> Self {
        Self::Gradient(vec![
            Rgba::rgb(0, 0, 0),
            Rgba::rgb(128, 0, 0),
            Rgba::rgb(255, 0, 0),
            Rgba::rgb(255, 128, 0),
            Rgba::rgb(255, 255, 0),
            Rgba::rgb(255, 255, 255),
        ])
    }

    /// Look up a named gradient preset.
    pub fn preset(name: &str) -> Result<Self> {
        Ok(match name {
            "blues" => Self::blues(),
            "red_blue" | "rdbu" => Self::red_blue(),
            "viridis" => Self::viridis(),
            "magma" => Self::magma(),
            "greyscale" | "grey" | "gray" => Self::greyscale(),
            "heat" => Self::heat(),
            other => {
                return Err(Error::UnknownComponent {
                    kind: "palette",
                    name: other.to_string(),
                })
            }
        })
    }

    /// True when the palette produces colors.
    #[must_use]
    pub fn is_color(&self) -> bool {
        match self {
            Self::Gradient(_) | Self::Hue { .. } => true,
            Self::Manual(values) => values.iter().any(|v| v.as_color().is_some()),
            _ => false,
        }
    }

    /// Value for the rescaled position `t`; `NaN` gives `Null`.
    #[must_use]
    pub fn continuous(&self, t: f64) -> DataValue {
        if t.is_nan() {
            return DataValue::Null;
        }
        match self {
            Self::Identity => DataValue::Number(t),
            Self::Gradient(stops) => DataValue::Color(interpolate(stops, t)),
            Self::Hue { .. } => {
                // continuous hue sweeps the circle without wrapping back
                let colors = self.discrete(2);
                match (colors.first().and_then(DataValue::as_color), colors.last().and_then(DataValue::as_color)) {
                    (Some(a), Some(b)) => DataValue::Color(a.lerp(b, t.clamp(0.0, 1.0))),
                    _ => DataValue::Null,
                }
            }
            Self::Manual(values) => {
                let colors: Vec<Rgba> = values.iter().filter_map(DataValue::as_color).collect();
                if colors.is_empty() {
                    let nums: Vec<f64> = values.iter().filter_map(DataValue::as_f64).collect();
                    match (nums.first(), nums.last()) {
                        (Some(lo), Some(hi)) => DataValue::Number(lo + t * (hi - lo)),
                        _ => DataValue::Null,
                    }
                } else {
                    DataValue::Color(interpolate(&colors, t))
                }
            }
            Self::Area { low, high } => DataValue::Number(low + t.max(0.0).sqrt() * (high - low)),
            Self::Rescale { low, high } => DataValue::Number(low + t * (high - low)),
            Self::Shapes | Self::Linetypes => DataValue::Null,
        }
    }

    /// Number of distinct values the palette can produce, if limited.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        match self {
            Self::Manual(values) => Some(values.len()),
            Self::Shapes => Some(SHAPES.len()),
            Self::Linetypes => Some(LINETYPES.len()),
            _ => None,
        }
    }

    /// `n` values for `n` categories.
    ///
    /// Limited palettes cycle once their values run out; the caller decides
    /// whether that deserves a warning (see [`Palette::capacity`]).
    #[must_use]
    pub fn discrete(&self, n: usize) -> Vec<DataValue> {
        let spaced = |i: usize| if n <= 1 { 0.0 } else { i as f64 / (n - 1) as f64 };
        match self {
            Self::Identity => (1..=n).map(|i| DataValue::Number(i as f64)).collect(),
            Self::Gradient(stops) => (0..n)
                .map(|i| DataValue::Color(interpolate(stops, spaced(i))))
                .collect(),
            Self::Hue {
                h_start,
                saturation,
                lightness,
            } => hue_palette(n, *h_start, *saturation, *lightness)
                .into_iter()
                .map(DataValue::Color)
                .collect(),
            Self::Manual(values) => cycle(values.iter().cloned(), values.len(), n),
            Self::Area { low, high } | Self::Rescale { low, high } => {
                (0..n).map(|i| DataValue::Number(low + spaced(i) * (high - low))).collect()
            }
            Self::Shapes => cycle(SHAPES.iter().map(|s| DataValue::from(*s)), SHAPES.len(), n),
            Self::Linetypes => cycle(
                LINETYPES.iter().map(|s| DataValue::from(*s)),
                LINETYPES.len(),
                n,
            ),
        }
    }
}

fn cycle(values: impl Iterator<Item = DataValue> + Clone, len: usize, n: usize) -> Vec<DataValue> {
    if len == 0 {
        return vec![DataValue::Null; n];
    }
    values.cycle().take(n).collect()
}

/// Piecewise linear color interpolation; `t` is clamped to `[0, 1]`.
#[must_use]
pub fn interpolate(stops: &[Rgba], t: f64) -> Rgba {
    match stops {
        [] => Rgba::NA_GREY,
        [only] => *only,
        _ => {
            let t = t.clamp(0.0, 1.0);
            let segments = stops.len() - 1;
            let segment = ((t * segments as f64).floor() as usize).min(segments - 1);
            let local = t * segments as f64 - segment as f64;
            stops[segment].lerp(stops[segment + 1], local)
        }
    }
}
