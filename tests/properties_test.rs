//! Property tests for scale math and build invariants.
//!
//! Run: cargo test --test properties_test

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use approx::assert_relative_eq;
use proptest::prelude::*;
use trueno_gg::data::{ninteraction, Column};
use trueno_gg::grammar::evaluate::evaluate;
use trueno_gg::grammar::{AesExpr, Environment};
use trueno_gg::prelude::*;
use trueno_gg::scale::breaks::rescale;
use trueno_gg::scale::{nice_breaks, Transform};
use trueno_gg::warning::Warnings;

fn xy_frame(x: Vec<f64>, y: Vec<f64>) -> DataFrame {
    DataFrame::new().with_column("x", x).unwrap().with_column("y", y).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Breaks are ascending and stay inside the interval.
    #[test]
    fn prop_breaks_inside_range(lo in -1.0e6..1.0e6f64, width in 1.0e-3..1.0e6f64, n in 2usize..12) {
        let hi = lo + width;
        let breaks = nice_breaks(lo, hi, n);
        let tol = width * 1e-9;
        for pair in breaks.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        for b in &breaks {
            prop_assert!(*b >= lo - tol && *b <= hi + tol, "{b} outside [{lo}, {hi}]");
        }
    }

    /// Every transform inverts on its domain.
    #[test]
    fn prop_transforms_round_trip(v in 1.0e-6..1.0e9f64) {
        for t in [Transform::Identity, Transform::Log10, Transform::Log2, Transform::Ln, Transform::Sqrt, Transform::Reverse] {
            let back = t.inverse(t.transform(v));
            assert_relative_eq!(back, v, max_relative = 1e-9);
        }
    }

    /// Rescaling maps the interval ends to 0 and 1 and keeps order.
    #[test]
    fn prop_rescale_is_monotone(lo in -1.0e3..1.0e3f64, width in 1.0e-3..1.0e3f64, a in 0.0..1.0f64, b in 0.0..1.0f64) {
        let range = (lo, lo + width);
        assert_relative_eq!(rescale(lo, range), 0.0, epsilon = 1e-9);
        assert_relative_eq!(rescale(lo + width, range), 1.0, epsilon = 1e-9);
        let (va, vb) = (lo + a * width, lo + b * width);
        if va < vb {
            prop_assert!(rescale(va, range) <= rescale(vb, range));
        }
    }

    /// Equal values share an interaction id and ids are dense from 1.
    #[test]
    fn prop_ninteraction_ids(values in proptest::collection::vec(0u8..5, 1..40)) {
        let labels: Vec<String> = values.iter().map(|v| format!("k{v}")).collect();
        let column = Column::from(labels.clone());
        let ids = ninteraction(&[&column], labels.len());
        let mut distinct = labels.clone();
        distinct.sort();
        distinct.dedup();
        for (i, a) in labels.iter().enumerate() {
            prop_assert!(ids[i] >= 1 && ids[i] <= distinct.len());
            for (j, b) in labels.iter().enumerate() {
                prop_assert_eq!(a == b, ids[i] == ids[j]);
            }
        }
    }

    /// Identity statistics keep one row per finite input row, and the
    /// plot's own data stays unchanged.
    #[test]
    fn prop_points_keep_rows(points in proptest::collection::vec((-1.0e4..1.0e4f64, -1.0e4..1.0e4f64), 1..60)) {
        let (x, y): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
        let df = xy_frame(x, y);
        let plot = ggplot(Some(df.clone()), Aes::new().x("x").y("y")) + Geom::point();
        let built = plot.build().unwrap();
        prop_assert_eq!(built.layers()[0].data.nrow(), df.nrow());
        prop_assert_eq!(plot.get_data(), Some(&df));
    }

    /// Stacked bar counts add up to the number of rows.
    #[test]
    fn prop_bar_counts_sum_to_rows(values in proptest::collection::vec(0u8..6, 1..80)) {
        let labels: Vec<String> = values.iter().map(|v| format!("c{v}")).collect();
        let n = labels.len();
        let df = DataFrame::new().with_column("g", labels).unwrap();
        let built = (ggplot(Some(df), Aes::new().x("g")) + Geom::bar()).build().unwrap();
        let counts = built.layers()[0].data.numbers("count").unwrap();
        let total: f64 = counts.iter().sum();
        prop_assert_eq!(total as usize, n);
    }

    /// Jitter is reproducible from build to build.
    #[test]
    fn prop_jitter_is_deterministic(ys in proptest::collection::vec(-100.0..100.0f64, 2..30)) {
        let x: Vec<f64> = (0..ys.len()).map(|i| (i % 3) as f64).collect();
        let plot = ggplot(Some(xy_frame(x, ys)), Aes::new().x("x").y("y")) + Geom::jitter();
        let first = plot.build().unwrap();
        let second = plot.build().unwrap();
        prop_assert_eq!(first.layers()[0].data.numbers("x"), second.layers()[0].data.numbers("x"));
    }

    /// Evaluating the same mapping twice gives identical columns.
    #[test]
    fn prop_evaluation_is_idempotent(x in proptest::collection::vec(-1.0e3..1.0e3f64, 0..30)) {
        let data = DataFrame::new().with_column("x", x).unwrap();
        let entries = vec![
            ("x", AesExpr::Expr("x".to_string())),
            ("y", AesExpr::Expr("x * 2 + 1".to_string())),
            ("size", AesExpr::Literal(DataValue::from(3.0))),
        ];
        let env = Environment::new();
        let eval = || evaluate(entries.iter().map(|(k, v)| (*k, v)), &data, &env).unwrap();
        prop_assert_eq!(eval(), eval());
    }

    /// Discrete mapping stays within an n-sized palette and is stable.
    #[test]
    fn prop_discrete_map_is_stable(values in proptest::collection::vec(0u8..6, 1..40)) {
        let labels: Vec<String> = values.iter().map(|v| format!("c{v}")).collect();
        let column = Column::from(labels);
        let mut scale = Scale::hue("color");
        scale.train(&column).unwrap();
        let n = scale.categories().len();
        let mut warnings = Warnings::new();
        let first = scale.map(&column, &mut warnings).unwrap();
        let second = scale.map(&column, &mut warnings).unwrap();
        prop_assert_eq!(&first, &second);
        let mut distinct: Vec<String> = (0..first.len()).map(|i| first.get(i).to_label()).collect();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(distinct.len(), n);
    }
}
