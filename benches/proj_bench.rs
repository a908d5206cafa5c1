use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridproj::ellipsoid::WGS84;
use gridproj::{Albers, LambertConformalConic, Projection, Stereographic};

fn make_grid(n: usize) -> Vec<(f64, f64)> {
    let mut pts = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let lon = -120.0 + 50.0 * (i as f64 / n as f64);
            let lat = 25.0 + 25.0 * (j as f64 / n as f64);
            pts.push((lon, lat));
        }
    }
    pts
}

fn bench_forward(c: &mut Criterion) {
    let albers = Albers::new(WGS84, -96.0, 23.0, 29.5, 45.5, 0.0, 0.0).unwrap();
    let stere = Stereographic::new(WGS84, -45.0, 90.0, 70.0, 0.0, 0.0).unwrap();
    let lcc = LambertConformalConic::new(WGS84, -96.0, 39.0, 33.0, 45.0, 0.0, 0.0).unwrap();

    let mut group = c.benchmark_group("forward");
    group.bench_function("albers_single", |b| {
        b.iter(|| albers.project(black_box(-90.0), black_box(38.0)).unwrap())
    });
    group.bench_function("stereographic_single", |b| {
        b.iter(|| stere.project(black_box(-60.0), black_box(75.0)).unwrap())
    });
    group.bench_function("lambert_single", |b| {
        b.iter(|| lcc.project(black_box(-90.0), black_box(38.0)).unwrap())
    });

    let pts = make_grid(32);
    group.bench_function("albers_batch_1024", |b| {
        b.iter(|| {
            let mut coords = pts.clone();
            albers.project_batch(black_box(&mut coords)).unwrap();
            coords
        })
    });
    group.finish();
}

fn bench_roundtrip(c: &mut Criterion) {
    let albers = Albers::new(WGS84, -96.0, 23.0, 29.5, 45.5, 0.0, 0.0).unwrap();
    let lcc = LambertConformalConic::new(WGS84, -96.0, 39.0, 33.0, 45.0, 0.0, 0.0).unwrap();

    let mut group = c.benchmark_group("roundtrip");
    // The ellipsoidal inverse is the only iterative path; measure it
    // against the closed-form forward.
    group.bench_function("albers_inverse", |b| {
        let (x, y) = albers.project(-90.0, 38.0).unwrap();
        b.iter(|| albers.unproject(black_box(x), black_box(y)).unwrap())
    });
    group.bench_function("lambert_inverse", |b| {
        let (x, y) = lcc.project(-90.0, 38.0).unwrap();
        b.iter(|| lcc.unproject(black_box(x), black_box(y)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_forward, bench_roundtrip);
criterion_main!(benches);
