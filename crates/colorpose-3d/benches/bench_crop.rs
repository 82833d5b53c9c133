use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use colorpose_3d::{OrientedBoundingBox, PointCloud};
use glam::DVec3;

fn make_cloud(num_points: usize) -> PointCloud {
    let side = (num_points as f64).sqrt() as usize;
    let points = (0..side * side)
        .map(|i| {
            let (u, v) = ((i % side) as f64, (i / side) as f64);
            [u / side as f64 - 0.5, v / side as f64 - 0.5, 1.0 + 0.1 * (u * 0.01).sin()]
        })
        .collect::<Vec<_>>();
    let colors = vec![[128u8, 64, 32]; points.len()];
    PointCloud::new(points, Some(colors)).expect("consistent cloud")
}

fn bench_crop(c: &mut Criterion) {
    let mut group = c.benchmark_group("crop");

    let obb = OrientedBoundingBox::from_center_corner(
        DVec3::new(0.05, -0.02, 1.0),
        DVec3::new(0.0, -0.07, 1.0),
        3.0,
        0.4,
    );

    // typical aligned depth resolutions
    for num_points in [320 * 240, 640 * 480, 1280 * 720].iter() {
        let cloud = make_cloud(*num_points);
        group.bench_with_input(
            BenchmarkId::new("crop", num_points),
            &cloud,
            |b, cloud| b.iter(|| black_box(cloud.crop(black_box(&obb)))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_crop);
criterion_main!(benches);
