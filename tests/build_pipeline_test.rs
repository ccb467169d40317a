//! End-to-end tests of the build pipeline: composition, build, render and
//! save, checked through public API only.
//!
//! Run: cargo test --test build_pipeline_test

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use approx::assert_relative_eq;
use trueno_gg::prelude::*;
use trueno_gg::scale::{Limits, Transform};
use trueno_gg::warning::PlotWarning;

fn ten_rows() -> DataFrame {
    let a: Vec<f64> = (0..10).map(f64::from).collect();
    let b: Vec<f64> = a.iter().map(|v| v * v - 3.0).collect();
    DataFrame::new().with_column("a", a).unwrap().with_column("b", b).unwrap()
}

fn duplicate_scale_warnings(plot: &BuiltPlot) -> usize {
    plot.warnings()
        .iter()
        .filter(|w| matches!(w, PlotWarning::DuplicateScale { .. }))
        .count()
}

// ============================================================================
// Scenario: one point per row
// ============================================================================

#[test]
fn points_produce_one_mark_per_row() {
    let plot = ggplot(Some(ten_rows()), Aes::new().x("a").y("b")) + Geom::point();
    let built = plot.build().unwrap();
    assert_eq!(built.layers().len(), 1);
    assert_eq!(built.layers()[0].data.nrow(), 10);

    let figure = Figure::vector(built, 4.0, 3.0, 72).unwrap();
    let svg = figure.svg().unwrap();
    assert_eq!(svg.matches("<circle").count(), 10);
}

// ============================================================================
// Scenario: bars count rows per category
// ============================================================================

#[test]
fn bars_count_rows_per_category() {
    let df = DataFrame::new()
        .with_column("g", vec!["b", "a", "c", "a", "c", "c"])
        .unwrap();
    let plot = ggplot(Some(df), Aes::new().x("g")) + Geom::bar();
    let built = plot.build().unwrap();
    let data = &built.layers()[0].data;
    assert_eq!(data.nrow(), 3);

    let x = data.numbers("x").unwrap();
    let top = data.numbers("ymax").unwrap();
    let mut bars: Vec<(f64, f64)> = x.iter().copied().zip(top.iter().copied()).collect();
    bars.sort_by(|p, q| p.0.total_cmp(&q.0));
    assert_eq!(bars, vec![(1.0, 2.0), (2.0, 1.0), (3.0, 3.0)]);
    assert_eq!(built.labels().get("y"), Some("count"));
}

// ============================================================================
// Scenario: a second scale for an aesthetic replaces the first
// ============================================================================

#[test]
fn second_scale_wins_with_one_warning() {
    let df = DataFrame::new()
        .with_column("a", vec![2.0, 3.0, 4.0, 5.0])
        .unwrap()
        .with_column("b", vec![1.0, 2.0, 3.0, 4.0])
        .unwrap();
    let plot = ggplot(Some(df), Aes::new().x("a").y("b"))
        + Geom::point()
        + Scale::x_continuous().limits(0.0, 10.0)
        + Scale::x_continuous().limits(2.0, 5.0);
    assert_eq!(plot.warnings().len(), 1);

    let built = plot.build().unwrap();
    assert_eq!(duplicate_scale_warnings(&built), 1);
    let x = built.scales().x().unwrap();
    assert_eq!(x.user_limits(), Some(&Limits::Continuous(2.0, 5.0)));

    let params = built.layout().panel_params(1).unwrap();
    assert_relative_eq!(params.x.range.0, 2.0 - 0.15, epsilon = 1e-9);
    assert_relative_eq!(params.x.range.1, 5.0 + 0.15, epsilon = 1e-9);

    // A second build reports the composition warning again, not twice.
    let again = plot.build().unwrap();
    assert_eq!(duplicate_scale_warnings(&again), 1);
}

// ============================================================================
// Scenario: free y scales train per panel
// ============================================================================

#[test]
fn free_y_facets_have_independent_ranges() {
    let df = DataFrame::new()
        .with_column("g", vec!["a", "a", "a", "b", "b", "b"])
        .unwrap()
        .with_column("x", vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0])
        .unwrap()
        .with_column("y", vec![1.0, 2.0, 3.0, 100.0, 200.0, 300.0])
        .unwrap();
    let plot = ggplot(Some(df), Aes::new().x("x").y("y"))
        + Geom::point()
        + Facet::wrap(&["g"]).scales(FacetScales::FreeY);
    let built = plot.build().unwrap();
    let layout = built.layout();
    assert_eq!(layout.len(), 2);
    assert_eq!(layout.scales_y().len(), 2);
    assert_eq!(layout.scales_x().len(), 1);

    let first = layout.panel_params(1).unwrap();
    let second = layout.panel_params(2).unwrap();
    assert!(first.y.range.1 < 10.0);
    assert!(second.y.range.0 > 50.0);
    assert_eq!(first.x.range, second.x.range);
}

#[test]
fn fixed_facets_share_ranges() {
    let df = DataFrame::new()
        .with_column("g", vec!["a", "b"])
        .unwrap()
        .with_column("x", vec![1.0, 2.0])
        .unwrap()
        .with_column("y", vec![1.0, 100.0])
        .unwrap();
    let plot = ggplot(Some(df), Aes::new().x("x").y("y")) + Geom::point() + Facet::wrap(&["g"]);
    let built = plot.build().unwrap();
    let layout = built.layout();
    assert_eq!(layout.panel_params(1), layout.panel_params(2));
}

// ============================================================================
// Scenario: the size ceiling on save
// ============================================================================

#[test]
fn oversized_save_needs_limitsize_off() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.png");
    let plot = ggplot(Some(ten_rows()), Aes::new().x("a").y("b")) + Geom::point();

    let err = plot.save(&path, &SaveOptions::new().size(26.0, 26.0)).unwrap_err();
    assert!(matches!(err, Error::SizeLimit { .. }));
    assert!(err.to_string().contains("26.00 x 26.00"));
    assert!(!path.exists());

    let opts = SaveOptions::new().size(26.0, 26.0).dpi(10).limitsize(false);
    plot.save(&path, &opts).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}

// ============================================================================
// Composition and rendering
// ============================================================================

#[test]
fn composition_leaves_operands_untouched() {
    let base = ggplot(Some(ten_rows()), Aes::new().x("a").y("b"));
    let with_points = &base + Geom::point();
    let with_both = &with_points + Geom::line();
    assert!(base.layers().is_empty());
    assert_eq!(with_points.layers().len(), 1);
    assert_eq!(with_both.layers().len(), 2);
}

#[test]
fn staged_aesthetics_map_after_stat() {
    let df = DataFrame::new().with_column("g", vec!["a", "a", "b"]).unwrap();
    let plot = ggplot(Some(df), Aes::new().x("g"))
        + Geom::bar().aes(Aes::new().fill(after_stat("count")));
    let built = plot.build().unwrap();
    let data = &built.layers()[0].data;
    assert!(matches!(data.get("fill"), Some(Column::Color(_))));
    assert_eq!(built.guides().len(), 1);
}

#[test]
fn missing_aesthetic_names_the_geometry() {
    let plot = ggplot(Some(ten_rows()), Aes::new().x("a")) + Geom::point();
    let err = plot.build().unwrap_err();
    let text = err.to_string();
    assert!(text.contains("geom_point"), "{text}");
    assert!(text.contains('y'), "{text}");
}

#[test]
fn pipe_data_into_plot() {
    let plot = (ten_rows() >> (ggplot(None, Aes::new().x("a").y("b")) + Geom::line())).unwrap();
    assert_eq!(plot.build().unwrap().total_rows(), 10);
}

#[test]
fn draw_uses_default_options() {
    let plot = ggplot(Some(ten_rows()), Aes::new().x("a").y("b")) + Geom::point() + Theme::minimal();
    let figure = plot.draw().unwrap();
    let (w, h) = figure.size_px();
    let opts = options();
    assert_eq!(w, (opts.figure_size.0 * f64::from(opts.dpi)).round() as u32);
    assert_eq!(h, (opts.figure_size.1 * f64::from(opts.dpi)).round() as u32);
    assert!(figure.framebuffer().is_some());
}

#[test]
fn flipped_bars_render_to_svg() {
    let df = DataFrame::new().with_column("g", vec!["a", "b", "b"]).unwrap();
    let plot = ggplot(Some(df), Aes::new().x("g")) + Geom::bar() + Coord::flip() + labs().title("Counts");
    let built = plot.build().unwrap();
    let svg = Figure::vector(built, 4.0, 3.0, 72).unwrap().svg().unwrap();
    assert_eq!(svg.matches("<polygon").count(), 2);
    assert!(svg.contains(">Counts</text>"));
}

#[test]
fn after_scale_fill_reuses_mapped_color() {
    let df = DataFrame::new()
        .with_column("a", vec![1.0, 2.0, 3.0])
        .unwrap()
        .with_column("b", vec![3.0, 1.0, 2.0])
        .unwrap()
        .with_column("g", vec!["u", "v", "u"])
        .unwrap();
    let plot = ggplot(Some(df), Aes::new().x("a").y("b").color("g"))
        + Geom::point().aes(Aes::new().fill(after_scale("alpha(color, 0.4)")));
    let built = plot.build().unwrap();
    let data = &built.layers()[0].data;
    let (Some(Column::Color(color)), Some(Column::Color(fill))) = (data.get("color"), data.get("fill")) else {
        panic!("color and fill should both be color columns");
    };
    for (c, f) in color.iter().zip(fill) {
        let (c, f) = (c.unwrap(), f.unwrap());
        assert_eq!((f.r, f.g, f.b), (c.r, c.g, c.b));
        assert_eq!(f.a, 102);
    }
    assert_ne!(color[0], color[1]);
    assert_eq!(built.guides().len(), 1);
}

#[test]
fn staged_fill_maps_then_fades() {
    let df = DataFrame::new().with_column("g", vec!["a", "a", "b"]).unwrap();
    let fill = stage(Some("g".into()), None, Some("alpha(fill, 0.4)".into()));
    let plot = ggplot(Some(df), Aes::new().x("g")) + Geom::bar().aes(Aes::new().fill(fill));
    let built = plot.build().unwrap();
    let data = &built.layers()[0].data;
    let Some(Column::Color(fill)) = data.get("fill") else {
        panic!("fill should be a color column");
    };
    assert_eq!(fill.len(), 2);
    assert!(fill.iter().all(|c| c.unwrap().a == 102));
    assert_ne!(fill[0].unwrap().r, fill[1].unwrap().r);
    assert_eq!(built.guides().len(), 1);
}

#[test]
fn lists_without_data_set_the_row_count() {
    let plot = ggplot(None, Aes::new())
        + Geom::point().aes(Aes::new().x(vec![1.0, 2.0, 3.0]).y(vec![1.0, 2.0, 3.0]));
    let built = plot.build().unwrap();
    assert_eq!(built.layers()[0].data.nrow(), 3);
    let svg = Figure::vector(built, 4.0, 3.0, 72).unwrap().svg().unwrap();
    assert_eq!(svg.matches("<circle").count(), 3);
}

// ============================================================================
// Scenario: additional layers and coordinates
// ============================================================================

#[test]
fn violins_span_their_slot() {
    let df = DataFrame::new()
        .with_column("g", vec!["a", "a", "a", "a", "b", "b", "b", "b"])
        .unwrap()
        .with_column("v", vec![1.0, 2.0, 2.5, 4.0, 3.0, 5.0, 5.5, 9.0])
        .unwrap();
    let violin = Geom::violin().stat(Stat::ydensity().param("n", 32.0).unwrap());
    let plot = ggplot(Some(df), Aes::new().x("g").y("v")) + violin;
    let built = plot.build().unwrap();
    let data = &built.layers()[0].data;
    assert_eq!(data.nrow(), 64);
    let widths = data.numbers("violinwidth").unwrap();
    assert_relative_eq!(widths.iter().fold(0.0f64, |a, w| a.max(*w)), 1.0);
    let (xmin, xmax) = (data.numbers("xmin").unwrap(), data.numbers("xmax").unwrap());
    assert_relative_eq!(xmin[0], 0.55, epsilon = 1e-9);
    assert_relative_eq!(xmax[63], 2.45, epsilon = 1e-9);

    let svg = Figure::vector(built, 4.0, 3.0, 72).unwrap().svg().unwrap();
    assert_eq!(svg.matches("<polygon").count(), 2);
}

#[test]
fn annotations_ignore_plot_mapping_and_legends() {
    let df = DataFrame::new()
        .with_column("a", vec![1.0, 2.0, 3.0])
        .unwrap()
        .with_column("b", vec![3.0, 1.0, 2.0])
        .unwrap()
        .with_column("g", vec!["u", "v", "u"])
        .unwrap();
    let note = annotate("text")
        .unwrap()
        .position("x", vec![2.0])
        .unwrap()
        .position("y", vec![2.5])
        .unwrap()
        .position("label", vec!["peak"])
        .unwrap();
    let plot = ggplot(Some(df), Aes::new().x("a").y("b").color("g")) + Geom::point() + note;
    let built = plot.build().unwrap();
    assert_eq!(built.layers()[1].data.nrow(), 1);
    assert_eq!(built.guides().len(), 1);
    let svg = Figure::vector(built, 4.0, 3.0, 72).unwrap().svg().unwrap();
    assert!(svg.contains(">peak</text>"));
}

#[test]
fn coord_trans_draws_log_axis() {
    let df = DataFrame::new()
        .with_column("a", vec![1.0, 10.0, 100.0])
        .unwrap()
        .with_column("b", vec![1.0, 2.0, 3.0])
        .unwrap();
    let plot = ggplot(Some(df), Aes::new().x("a").y("b"))
        + Geom::point()
        + Coord::trans(Transform::Log10, Transform::Identity);
    let built = plot.build().unwrap();
    // positions stay in data space until drawing
    assert_eq!(built.layers()[0].data.numbers("x").unwrap(), &[1.0, 10.0, 100.0]);
    let params = built.layout().panel_params(1).unwrap();
    assert_relative_eq!(params.x.range.0, -0.1, epsilon = 1e-9);
    assert_relative_eq!(params.x.range.1, 2.1, epsilon = 1e-9);
    assert!(params.x.breaks.iter().all(|b| (-0.1..=2.1).contains(b)));

    let svg = Figure::vector(built, 4.0, 3.0, 72).unwrap().svg().unwrap();
    assert_eq!(svg.matches("<circle").count(), 3);
}

#[test]
fn qq_points_and_reference_line() {
    let df = DataFrame::new()
        .with_column("v", vec![4.0, -1.0, 0.5, 2.0, 1.0, 3.0])
        .unwrap();
    let plot = ggplot(Some(df), Aes::new().set("sample", "v")) + Geom::qq() + Geom::qq_line();
    let built = plot.build().unwrap();
    let points = &built.layers()[0].data;
    assert_eq!(points.numbers("y").unwrap(), &[-1.0, 0.5, 1.0, 2.0, 3.0, 4.0]);
    let x = points.numbers("x").unwrap();
    assert!(x.windows(2).all(|w| w[0] < w[1]));
    assert_relative_eq!(x[0], -x[5], epsilon = 1e-9);
    let line = &built.layers()[1].data;
    assert_eq!(line.nrow(), 2);
    assert_eq!(line.numbers("x").unwrap(), &[x[0], x[5]]);
}
