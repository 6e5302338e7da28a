use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Point3;
use tractmeasures::{EndpointResolver, SurfaceIndex};

/// A deterministic pseudo-random cloud of surface vertices with overlays.
fn synthetic_index(num_vertices: usize, x_offset: f32) -> SurfaceIndex {
    let mut positions = Vec::with_capacity(num_vertices);
    let mut curvature = Vec::with_capacity(num_vertices);
    let mut thickness = Vec::with_capacity(num_vertices);
    let mut state: u64 = 0x5DEECE66D;
    let mut next = || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) as f32 / (1u64 << 31) as f32) * 100.0 - 50.0
    };
    for _ in 0..num_vertices {
        positions.push(Point3::new(next() + x_offset, next(), next()));
        curvature.push(next() / 100.0);
        thickness.push(next().abs() / 10.0);
    }
    SurfaceIndex::build(positions, curvature, thickness).unwrap()
}

fn bench_surface_index(c: &mut Criterion) {
    c.bench_function("surface_index_build_50k", |b| {
        b.iter(|| synthetic_index(black_box(50_000), -60.0))
    });

    let index = synthetic_index(50_000, -60.0);
    c.bench_function("nearest_within_radius", |b| {
        b.iter(|| {
            index.nearest_within_radius(&Point3::new(black_box(-30.0), 12.0, -7.0), 1000.0)
        })
    });

    let resolver = EndpointResolver::new(
        synthetic_index(50_000, -60.0),
        synthetic_index(50_000, 60.0),
    );
    c.bench_function("resolve_endpoint", |b| {
        b.iter(|| resolver.resolve(&Point3::new(black_box(10.0), 0.0, 0.0)))
    });
}

criterion_group!(benches, bench_surface_index);
criterion_main!(benches);
