//! Benchmarks for field generation and the CPU-side vortex transform.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;

use chromatic_vortex::glow::shade;
use chromatic_vortex::transform::{transform_field, transform_field_into};
use chromatic_vortex::{ContinuousParams, FieldGenerator, Jitter, MathConstant, Vec3};

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    let generator = FieldGenerator::new().with_jitter(Jitter::Seeded(42));

    for count in [1_000u32, 10_000, 45_000] {
        group.bench_with_input(BenchmarkId::new("golden_ratio", count), &count, |b, &count| {
            b.iter(|| black_box(generator.generate(count, MathConstant::GoldenRatio)))
        });
    }

    group.bench_function("unjittered_45k", |b| {
        let generator = FieldGenerator::new().with_jitter(Jitter::Disabled);
        b.iter(|| black_box(generator.generate(45_000, MathConstant::Plastic)))
    });

    group.finish();
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");
    let params = ContinuousParams::default();

    for count in [10_000u32, 45_000, 200_000] {
        let field = FieldGenerator::new()
            .with_jitter(Jitter::Seeded(7))
            .generate(count, MathConstant::GoldenRatio);

        group.bench_with_input(BenchmarkId::new("alloc", count), &field, |b, field| {
            b.iter(|| black_box(transform_field(field, black_box(2.5), &params)))
        });

        group.bench_with_input(BenchmarkId::new("reuse", count), &field, |b, field| {
            let mut out = Vec::with_capacity(field.len());
            b.iter(|| {
                transform_field_into(field, black_box(2.5), &params, &mut out);
                black_box(out.len())
            })
        });
    }

    group.finish();
}

fn bench_shade(c: &mut Criterion) {
    c.bench_function("shade_sprite_16x16", |b| {
        let color = Vec3::new(0.9, 0.4, 0.7);
        b.iter(|| {
            let mut acc = 0.0f32;
            for y in 0..16 {
                for x in 0..16 {
                    let coord = Vec2::new(x as f32 / 16.0 - 0.5, y as f32 / 16.0 - 0.5);
                    if let Some(f) = shade(color, black_box(0.6), coord, 0.65) {
                        acc += f.alpha;
                    }
                }
            }
            black_box(acc)
        })
    });
}

criterion_group!(benches, bench_generate, bench_transform, bench_shade);
criterion_main!(benches);
