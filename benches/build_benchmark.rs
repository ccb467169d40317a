//! Benchmarks for the build pipeline and rendering.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trueno_gg::prelude::*;

fn frame(size: usize) -> DataFrame {
    let x: Vec<f64> = (0..size).map(|i| i as f64).collect();
    let y: Vec<f64> = (0..size).map(|i| (i as f64 / 50.0).sin()).collect();
    let g: Vec<String> = (0..size).map(|i| format!("g{}", i % 4)).collect();
    DataFrame::new()
        .with_column("x", x)
        .and_then(|df| df.with_column("y", y))
        .and_then(|df| df.with_column("g", g))
        .unwrap()
}

fn build_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_points");

    for size in [100, 1_000, 10_000, 100_000] {
        let plot = ggplot(Some(frame(size)), Aes::new().x("x").y("y").color("g")) + Geom::point();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(&plot).build().unwrap());
        });
    }

    group.finish();
}

fn stat_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_stats");
    let df = frame(10_000);

    let histogram = ggplot(Some(df.clone()), Aes::new().x("y")) + Geom::histogram();
    group.bench_function("histogram", |b| b.iter(|| black_box(&histogram).build().unwrap()));

    let smooth = ggplot(Some(df.clone()), Aes::new().x("x").y("y")) + Geom::smooth();
    group.bench_function("smooth", |b| b.iter(|| black_box(&smooth).build().unwrap()));

    let facetted = ggplot(Some(df), Aes::new().x("x").y("y")) + Geom::line() + Facet::wrap(&["g"]);
    group.bench_function("facet_wrap", |b| b.iter(|| black_box(&facetted).build().unwrap()));

    group.finish();
}

fn render_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let built = (ggplot(Some(frame(5_000)), Aes::new().x("x").y("y").color("g")) + Geom::point())
        .build()
        .unwrap();

    group.bench_function("raster_640x480", |b| {
        b.iter(|| Figure::raster(black_box(built.clone()), 6.4, 4.8, 100).unwrap());
    });
    group.bench_function("svg_640x480", |b| {
        b.iter(|| Figure::vector(black_box(built.clone()), 6.4, 4.8, 100).unwrap());
    });

    group.finish();
}

criterion_group!(benches, build_benchmark, stat_benchmark, render_benchmark);
criterion_main!(benches);
