//! Themes: the non-data appearance of a figure.
//!
//! A theme never changes built data. The renderer reads it for
//! backgrounds, grid lines, strips, legends and text sizes.

use crate::color::Rgba;
use crate::error::{Error, Result};

/// Where the legend box goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendPosition {
    /// Right of the panels.
    #[default]
    Right,
    /// Below the panels.
    Bottom,
    /// No legends.
    None,
}

/// Appearance settings of a figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Preset the theme started from.
    pub name: &'static str,
    /// Figure background.
    pub background: Rgba,
    /// Panel background.
    pub panel_background: Rgba,
    /// Major grid line color; `None` hides the grid.
    pub grid_color: Option<Rgba>,
    /// Axis line and tick color; `None` hides axes.
    pub axis_color: Option<Rgba>,
    /// Panel border color; `None` draws no border.
    pub panel_border: Option<Rgba>,
    /// Facet strip background.
    pub strip_background: Rgba,
    /// Title, label and tick text color.
    pub text_color: Rgba,
    /// Base font size in points.
    pub base_size: f64,
    /// Grid line width in points.
    pub grid_width: f64,
    /// Space around the figure in pixels.
    pub margin: u32,
    /// Legend placement.
    pub legend_position: LegendPosition,
}

impl Default for Theme {
    fn default() -> Self {
        Self::grey()
    }
}

impl Theme {
    /// Names accepted by [`Theme::from_name`].
    pub const PRESETS: &'static [&'static str] = &["grey", "minimal", "bw", "classic", "dark", "void"];

    /// Grey panel with white grid lines.
    #[must_use]
    pub fn grey() -> Self {
        Self {
            name: "grey",
            background: Rgba::WHITE,
            panel_background: Rgba::rgb(235, 235, 235),
            grid_color: Some(Rgba::WHITE),
            axis_color: Some(Rgba::rgb(51, 51, 51)),
            panel_border: None,
            strip_background: Rgba::rgb(217, 217, 217),
            text_color: Rgba::rgb(30, 30, 30),
            base_size: 11.0,
            grid_width: 1.0,
            margin: 40,
            legend_position: LegendPosition::Right,
        }
    }

    /// White panel, light grid, no border.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            name: "minimal",
            panel_background: Rgba::WHITE,
            grid_color: Some(Rgba::rgb(235, 235, 235)),
            axis_color: None,
            strip_background: Rgba::WHITE,
            grid_width: 0.5,
            ..Self::grey()
        }
    }

    /// White panel with a dark border.
    #[must_use]
    pub fn bw() -> Self {
        Self {
            name: "bw",
            panel_background: Rgba::WHITE,
            grid_color: Some(Rgba::rgb(235, 235, 235)),
            panel_border: Some(Rgba::rgb(51, 51, 51)),
            strip_background: Rgba::rgb(217, 217, 217),
            grid_width: 0.5,
            ..Self::grey()
        }
    }

    /// Axis lines, no grid.
    #[must_use]
    pub fn classic() -> Self {
        Self {
            name: "classic",
            panel_background: Rgba::WHITE,
            grid_color: None,
            axis_color: Some(Rgba::BLACK),
            strip_background: Rgba::WHITE,
            ..Self::grey()
        }
    }

    /// Dark panel, light text.
    #[must_use]
    pub fn dark() -> Self {
        Self {
            name: "dark",
            background: Rgba::WHITE,
            panel_background: Rgba::rgb(127, 127, 127),
            grid_color: Some(Rgba::rgb(107, 107, 107)),
            strip_background: Rgba::rgb(38, 38, 38),
            grid_width: 0.5,
            ..Self::grey()
        }
    }

    /// Nothing but data.
    #[must_use]
    pub fn void() -> Self {
        Self {
            name: "void",
            panel_background: Rgba::WHITE,
            grid_color: None,
            axis_color: None,
            strip_background: Rgba::WHITE,
            margin: 10,
            ..Self::grey()
        }
    }

    /// Look up a preset by name; the `theme_` prefix is optional.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name.strip_prefix("theme_").unwrap_or(name) {
            "grey" | "gray" => Self::grey(),
            "minimal" => Self::minimal(),
            "bw" => Self::bw(),
            "classic" => Self::classic(),
            "dark" => Self::dark(),
            "void" => Self::void(),
            other => {
                return Err(Error::UnknownComponent {
                    kind: "theme",
                    name: other.to_string(),
                })
            }
        })
    }

    /// Set the base font size.
    #[must_use]
    pub fn base_size(mut self, size: f64) -> Self {
        self.base_size = size;
        self
    }

    /// Set the figure background.
    #[must_use]
    pub fn background(mut self, color: Rgba) -> Self {
        self.background = color;
        self
    }

    /// Set the panel background.
    #[must_use]
    pub fn panel_background(mut self, color: Rgba) -> Self {
        self.panel_background = color;
        self
    }

    /// Set or hide the grid.
    #[must_use]
    pub fn grid(mut self, color: Option<Rgba>) -> Self {
        self.grid_color = color;
        self
    }

    /// Move or hide the legends.
    #[must_use]
    pub fn legend_position(mut self, position: LegendPosition) -> Self {
        self.legend_position = position;
        self
    }

    /// Title size in points.
    #[must_use]
    pub fn title_size(&self) -> f64 {
        self.base_size * 1.2
    }

    /// Axis tick label size in points.
    #[must_use]
    pub fn tick_size(&self) -> f64 {
        self.base_size * 0.8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_by_name() {
        for name in Theme::PRESETS {
            assert_eq!(Theme::from_name(name).unwrap().name, *name);
        }
        assert_eq!(Theme::from_name("theme_bw").unwrap(), Theme::bw());
        assert_eq!(Theme::from_name("gray").unwrap().name, "grey");
    }

    #[test]
    fn test_unknown_theme() {
        let err = Theme::from_name("solarized").unwrap_err();
        assert!(matches!(err, Error::UnknownComponent { kind: "theme", .. }));
    }

    #[test]
    fn test_preset_differences() {
        assert!(Theme::classic().grid_color.is_none());
        assert!(Theme::bw().panel_border.is_some());
        assert!(Theme::void().axis_color.is_none());
        assert_eq!(Theme::void().margin, 10);
        assert_eq!(Theme::default(), Theme::grey());
    }

    #[test]
    fn test_customization() {
        let t = Theme::minimal()
            .base_size(14.0)
            .grid(None)
            .legend_position(LegendPosition::Bottom);
        assert!(t.grid_color.is_none());
        assert_eq!(t.legend_position, LegendPosition::Bottom);
        assert!((t.title_size() - 16.8).abs() < 1e-9);
    }
}
