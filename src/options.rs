//! Process-wide plot defaults.
//!
//! A small set of options (dpi, figure size, theme, size ceiling) is read at
//! the start of every build and draw. The pipeline never writes them; only
//! [`set_options`] does.
//!
//! Options can be loaded from YAML:
//!
//! ```yaml
//! dpi: 150
//! figure_size: [8.0, 6.0]
//! theme: minimal
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, PoisonError, RwLock};

/// Default rendering options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotOptions {
    /// Dots per inch used when no explicit dpi is given.
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Figure size in inches, `(width, height)`.
    #[serde(default = "default_figure_size")]
    pub figure_size: (f64, f64),

    /// Theme used by plots that do not set one.
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Largest dimension, in inches, that `save` accepts with `limitsize`.
    #[serde(default = "default_limitsize_ceiling")]
    pub limitsize_ceiling: f64,
}

fn default_dpi() -> u32 {
    100
}
fn default_figure_size() -> (f64, f64) {
    (6.4, 4.8)
}
fn default_theme() -> String {
    "grey".to_string()
}
fn default_limitsize_ceiling() -> f64 {
    25.0
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            figure_size: default_figure_size(),
            theme: default_theme(),
            limitsize_ceiling: default_limitsize_ceiling(),
        }
    }
}

impl PlotOptions {
    /// Parse options from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Serialize options to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Load options from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load options with fallback to defaults.
    ///
    /// With no explicit path, `<config dir>/trueno-gg/options.yaml` is tried.
    #[must_use]
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).or_else(default_options_path);
        match path {
            Some(p) if p.exists() => Self::load(&p).unwrap_or_else(|e| {
                tracing::warn!("ignoring options file {}: {e}", p.display());
                Self::default()
            }),
            _ => Self::default(),
        }
    }
}

/// Location of the per-user options file.
#[must_use]
pub fn default_options_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("trueno-gg").join("options.yaml"))
}

fn global() -> &'static RwLock<PlotOptions> {
    static OPTIONS: OnceLock<RwLock<PlotOptions>> = OnceLock::new();
    OPTIONS.get_or_init(|| RwLock::new(PlotOptions::default()))
}

/// Snapshot of the current process-wide options.
#[must_use]
pub fn options() -> PlotOptions {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the process-wide options, returning the previous value.
pub fn set_options(new: PlotOptions) -> PlotOptions {
    let mut guard = global().write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *guard, new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let o = PlotOptions::default();
        assert_eq!(o.dpi, 100);
        assert_eq!(o.figure_size, (6.4, 4.8));
        assert_eq!(o.theme, "grey");
        assert_eq!(o.limitsize_ceiling, 25.0);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let o = PlotOptions::from_yaml_str("dpi: 300\n").unwrap();
        assert_eq!(o.dpi, 300);
        assert_eq!(o.theme, "grey");
    }

    #[test]
    fn test_yaml_round_trip() {
        let o = PlotOptions {
            theme: "minimal".into(),
            ..PlotOptions::default()
        };
        let back = PlotOptions::from_yaml_str(&o.to_yaml_string().unwrap()).unwrap();
        assert_eq!(back, o);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.yaml");
        std::fs::write(&path, "figure_size: [3.0, 2.0]\n").unwrap();
        let o = PlotOptions::load_or_default(Some(&path));
        assert_eq!(o.figure_size, (3.0, 2.0));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(PlotOptions::from_yaml_str("dpi: [").is_err());
    }
}
