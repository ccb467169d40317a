//! Annotation layers.
//!
//! An annotation is a layer with its own small data frame of fixed
//! positions. It ignores the plot mapping, never appears in legends and
//! always uses the identity statistic.

use super::aes::{normalize_aesthetic, Aes};
use super::geom::Geom;
use super::ggplot::{GGPlot, PlotComponent};
use super::layer::Layer;
use super::stat::Stat;
use crate::data::{Column, DataFrame, DataValue};
use crate::error::{Error, Result};

/// Aesthetics an annotation may give one value per row for.
const ROW_AES: &[&str] = &["x", "y", "xmin", "xmax", "xend", "ymin", "ymax", "yend", "label"];

/// Start an annotation drawn with the named geometry, e.g. `text` or
/// `rect`.
///
/// # Errors
///
/// [`Error::UnknownComponent`] for unknown geometries.
///
/// ```
/// use trueno_gg::prelude::*;
///
/// let note = annotate("text")?
///     .position("x", vec![1.0, 2.0])?
///     .position("y", vec![3.0])?
///     .position("label", vec!["low", "high"])?
///     .set("color", "red")?;
/// # Ok::<(), trueno_gg::Error>(())
/// ```
pub fn annotate(geom: &str) -> Result<Annotation> {
    let geom = Geom::from_name(geom)?
        .stat(Stat::identity())
        .inherit_aes(false)
        .show_legend(false);
    Ok(Annotation {
        geom,
        data: DataFrame::new(),
    })
}

/// A layer of fixed positions. Built with [`annotate`].
#[derive(Debug, Clone)]
pub struct Annotation {
    geom: Geom,
    data: DataFrame,
}

impl Annotation {
    /// Give a position (or `label`) one value per row.
    ///
    /// Single values are repeated over the rows of the other aesthetics.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for other aesthetics;
    /// [`Error::InvalidParameter`] when two lists differ in length.
    pub fn position(mut self, aesthetic: &str, values: impl Into<Column>) -> Result<Self> {
        let name = normalize_aesthetic(aesthetic);
        if !ROW_AES.contains(&name.as_str()) {
            return Err(Error::configuration("annotate", &name, ROW_AES));
        }
        let column = values.into();
        let (have, len) = (self.data.nrow(), column.len());
        let column = match (self.data.ncol() == 0, have, len) {
            (true, _, _) => column,
            (false, h, l) if h == l => column,
            (false, h, 1) => column.take(&vec![0; h]),
            (false, 1, l) => {
                self.data = DataFrame::from_columns(
                    self.data
                        .iter()
                        .map(|(n, c)| (n.to_string(), c.take(&vec![0; l])))
                        .collect(),
                )?;
                column
            }
            (false, h, l) => {
                let lengths: Vec<String> = self
                    .data
                    .iter()
                    .map(|(n, _)| format!("{n} ({h})"))
                    .chain(std::iter::once(format!("{name} ({l})")))
                    .collect();
                return Err(Error::invalid_parameter(
                    "annotate",
                    &name,
                    format!("Unequal parameter lengths: {}", lengths.join(", ")),
                ));
            }
        };
        self.data.insert(name, column)?;
        Ok(self)
    }

    /// Fix any other aesthetic, e.g. `color` or `size`.
    ///
    /// # Errors
    ///
    /// As [`Geom::set`].
    pub fn set(mut self, aesthetic: &str, value: impl Into<DataValue>) -> Result<Self> {
        self.geom = self.geom.set(aesthetic, value)?;
        Ok(self)
    }

    /// Set a parameter of the geometry.
    ///
    /// # Errors
    ///
    /// As [`Geom::param`].
    pub fn param(mut self, key: &str, value: impl Into<DataValue>) -> Result<Self> {
        self.geom = self.geom.param(key, value)?;
        Ok(self)
    }

    /// Rows of the annotation.
    #[must_use]
    pub fn data(&self) -> &DataFrame {
        &self.data
    }
}

impl From<Annotation> for Layer {
    fn from(annotation: Annotation) -> Self {
        let mapping = annotation
            .data
            .column_names()
            .iter()
            .fold(Aes::new(), |aes, name| aes.set(name, name.as_str()));
        Layer::from(annotation.geom.aes(mapping).data(annotation.data))
    }
}

impl PlotComponent for Annotation {
    fn add_to(self, plot: &mut GGPlot) {
        Layer::from(self).add_to(plot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ggplot::ggplot;

    #[test]
    fn test_single_values_broadcast() {
        let a = annotate("text")
            .unwrap()
            .position("x", vec![1.0])
            .unwrap()
            .position("y", vec![2.0, 3.0])
            .unwrap()
            .position("label", vec!["a", "b"])
            .unwrap();
        assert_eq!(a.data().nrow(), 2);
        assert_eq!(a.data().numbers("x").unwrap(), &[1.0, 1.0]);
    }

    #[test]
    fn test_unequal_lengths_are_named() {
        let err = annotate("point")
            .unwrap()
            .position("x", vec![1.0, 2.0])
            .unwrap()
            .position("y", vec![1.0, 2.0, 3.0])
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Unequal parameter lengths"));
        assert!(message.contains("x (2)") && message.contains("y (3)"));
    }

    #[test]
    fn test_only_positions_vary_by_row() {
        let err = annotate("point").unwrap().position("color", vec!["red"]).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(annotate("spiral").is_err());
        assert!(annotate("rect").unwrap().set("fill", "blue").is_ok());
    }

    #[test]
    fn test_layer_ignores_plot_mapping() {
        let a = annotate("rect")
            .unwrap()
            .position("xmin", vec![1.0])
            .unwrap()
            .position("xmax", vec![2.0])
            .unwrap()
            .position("ymin", vec![0.0])
            .unwrap()
            .position("ymax", vec![5.0])
            .unwrap();
        let data = DataFrame::new()
            .with_column("u", vec![0.0, 10.0])
            .unwrap()
            .with_column("v", vec![0.0, 10.0])
            .unwrap()
            .with_column("g", vec!["p", "q"])
            .unwrap();
        let plot = ggplot(Some(data), Aes::new().x("u").y("v").color("g")) + Geom::point() + a;
        let built = plot.build().unwrap();
        let layer = &built.layers()[1];
        assert_eq!(layer.data.nrow(), 1);
        assert_eq!(layer.data.numbers("xmax").unwrap(), &[2.0]);
        assert_eq!(built.guides().len(), 1);
    }
}
