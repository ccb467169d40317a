//! Legends and color bars for non-position scales.

use super::geom::GeomKind;
use super::labels::Labs;
use super::layer::LayerBuild;
use crate::color::Rgba;
use crate::data::{Column, DataValue};
use crate::error::{Error, Result};
use crate::scale::breaks::rescale;
use crate::scale::{GuideKind, Scale, ScaleKind, Scales};
use crate::warning::Warnings;

/// Number of color samples in a color bar.
const BAR_STEPS: usize = 32;

/// One key of a legend.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendKey {
    /// Key label.
    pub label: String,
    /// Mapped value per aesthetic shown by this key.
    pub values: Vec<(String, DataValue)>,
}

/// What a guide shows.
#[derive(Debug, Clone, PartialEq)]
pub enum GuideBody {
    /// Keyed legend.
    Legend(Vec<LegendKey>),
    /// Continuous color bar.
    Colorbar {
        /// Colors from the low to the high end.
        colors: Vec<Rgba>,
        /// Tick positions in `[0, 1]` with their labels.
        ticks: Vec<(f64, String)>,
    },
}

/// A built guide.
#[derive(Debug, Clone, PartialEq)]
pub struct Guide {
    /// Guide title.
    pub title: String,
    /// Aesthetics the guide explains.
    pub aesthetics: Vec<String>,
    /// Geometries drawn in the legend keys.
    pub geoms: Vec<GeomKind>,
    /// Contents.
    pub body: GuideBody,
}

impl Guide {
    /// True for color bars.
    #[must_use]
    pub fn is_colorbar(&self) -> bool {
        matches!(self.body, GuideBody::Colorbar { .. })
    }
}

/// Build one guide per non-position scale that asks for one, then merge
/// legends with the same title and keys.
///
/// # Errors
///
/// [`Error::ScaleConflict`] when a color bar is requested for a scale that
/// is not a continuous color scale.
pub fn build_guides(scales: &Scales, labels: &Labs, layers: &[LayerBuild<'_>]) -> Result<Vec<Guide>> {
    let mut guides: Vec<Guide> = Vec::new();
    for scale in scales.non_position() {
        let kind = scale.guide_kind();
        if kind == GuideKind::None {
            continue;
        }
        let geoms = legend_geoms(scale, layers);
        if geoms.is_empty() {
            continue;
        }
        let aesthetic = scale.primary().to_string();
        let title = scale
            .title()
            .or_else(|| labels.get(&aesthetic))
            .unwrap_or(&aesthetic)
            .to_string();
        let body = match kind {
            GuideKind::Colorbar => colorbar(scale)?,
            _ => legend(scale),
        };
        if matches!(&body, GuideBody::Legend(keys) if keys.is_empty()) {
            continue;
        }
        let guide = Guide {
            title,
            aesthetics: vec![aesthetic],
            geoms,
            body,
        };
        match guides.iter_mut().find(|g| mergeable(g, &guide)) {
            Some(existing) => merge(existing, guide),
            None => guides.push(guide),
        }
    }
    tracing::debug!(guides = guides.len(), "guides built");
    Ok(guides)
}

/// Geometries of the layers that map one of the scale's aesthetics and do
/// not hide their legend.
fn legend_geoms(scale: &Scale, layers: &[LayerBuild<'_>]) -> Vec<GeomKind> {
    let mut geoms = Vec::new();
    for lb in layers {
        let show = lb.layer().show_legend();
        let maps = scale.aesthetics().iter().any(|ae| lb.mapping().contains(ae));
        if show == Some(false) || !(maps || show == Some(true)) {
            continue;
        }
        let geom = lb.layer().geom();
        if geom != GeomKind::Blank && !geoms.contains(&geom) {
            geoms.push(geom);
        }
    }
    geoms
}

fn legend(scale: &Scale) -> GuideBody {
    let aesthetic = scale.primary().to_string();
    let keys = scale
        .legend_entries()
        .into_iter()
        .map(|(label, value)| LegendKey {
            label,
            values: vec![(aesthetic.clone(), value)],
        })
        .collect();
    GuideBody::Legend(keys)
}

fn colorbar(scale: &Scale) -> Result<GuideBody> {
    let conflict = |reason: &str| Error::ScaleConflict {
        aesthetic: scale.primary().to_string(),
        guide: "colorbar".to_string(),
        reason: reason.to_string(),
    };
    if scale.kind() == ScaleKind::Discrete {
        return Err(conflict("a colorbar needs a continuous scale"));
    }
    if !scale.palette_ref().is_color() {
        return Err(conflict("a colorbar needs a scale that maps to colors"));
    }
    let Some((lo, hi)) = scale.continuous_limits() else {
        return Ok(GuideBody::Colorbar {
            colors: Vec::new(),
            ticks: Vec::new(),
        });
    };
    let samples: Vec<f64> = (0..BAR_STEPS)
        .map(|i| lo + (hi - lo) * i as f64 / (BAR_STEPS - 1) as f64)
        .collect();
    let mut quiet = Warnings::new();
    let colors = match scale.map(&Column::Number(samples), &mut quiet)? {
        Column::Color(c) => c.into_iter().map(|c| c.unwrap_or(Rgba::NA_GREY)).collect(),
        _ => return Err(conflict("the scale palette did not produce colors")),
    };
    let breaks = scale.get_breaks();
    let labels = scale.get_labels(&breaks);
    let ticks = breaks
        .iter()
        .zip(labels)
        .map(|(b, l)| (if hi > lo { rescale(*b, (lo, hi)) } else { 0.5 }, l))
        .collect();
    Ok(GuideBody::Colorbar { colors, ticks })
}

fn mergeable(a: &Guide, b: &Guide) -> bool {
    match (&a.body, &b.body) {
        (GuideBody::Legend(ka), GuideBody::Legend(kb)) => {
            a.title == b.title
                && ka.len() == kb.len()
                && ka.iter().zip(kb).all(|(x, y)| x.label == y.label)
        }
        _ => false,
    }
}

fn merge(into: &mut Guide, other: Guide) {
    into.aesthetics.extend(other.aesthetics);
    for g in other.geoms {
        if !into.geoms.contains(&g) {
            into.geoms.push(g);
        }
    }
    if let (GuideBody::Legend(keys), GuideBody::Legend(more)) = (&mut into.body, other.body) {
        for (key, extra) in keys.iter_mut().zip(more) {
            key.values.extend(extra.values);
        }
    }
}

/// Value of `aesthetic` shown by a legend key.
#[must_use]
pub fn key_value<'a>(key: &'a LegendKey, aesthetic: &str) -> Option<&'a DataValue> {
    key.values.iter().find(|(a, _)| a == aesthetic).map(|(_, v)| v)
}
