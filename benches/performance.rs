// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use voxset::evaluation::{iou, maximize_iou};
use voxset::voxel::{decode_binvox, encode_binvox, AxisOrder, VoxelGrid};

/// Solid sphere of radius `dim / 3` centred in a `dim^3` grid
fn sphere(dim: usize) -> VoxelGrid {
    let mut grid = VoxelGrid::empty([dim, dim, dim]).unwrap();
    let c = dim as f32 / 2.0;
    let r = dim as f32 / 3.0;
    for i in 0..dim {
        for j in 0..dim {
            for k in 0..dim {
                let d = (i as f32 - c).powi(2) + (j as f32 - c).powi(2) + (k as f32 - c).powi(2);
                grid.set(i, j, k, d <= r * r);
            }
        }
    }
    grid
}

fn bench_iou(c: &mut Criterion) {
    let mut group = c.benchmark_group("iou");

    for dim in [32, 64] {
        let a = sphere(dim);
        let b = a.rolled([1, 2, 0]);
        group.bench_with_input(BenchmarkId::new("sphere", dim), &(a, b), |bench, (a, b)| {
            bench.iter(|| iou(black_box(a), black_box(b)).unwrap());
        });
    }

    group.finish();
}

fn bench_alignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("maximize_iou");
    group.sample_size(10);

    let truth = sphere(32);
    let result = truth.rolled([2, -1, 1]);
    for max_shift in [1, 3, 5] {
        group.bench_with_input(
            BenchmarkId::new("sphere_32", max_shift),
            &max_shift,
            |bench, &max_shift| {
                bench.iter(|| {
                    maximize_iou(black_box(&result), black_box(&truth), max_shift).unwrap()
                });
            },
        );
    }

    group.finish();
}

fn bench_binvox(c: &mut Criterion) {
    let mut group = c.benchmark_group("binvox");

    let grid = sphere(64);
    let mut bytes = Vec::new();
    encode_binvox(&grid, &mut bytes).unwrap();

    group.bench_function("encode_64", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(bytes.len());
            encode_binvox(black_box(&grid), &mut out).unwrap();
            out
        });
    });

    group.bench_function("decode_64", |b| {
        b.iter(|| decode_binvox(&mut black_box(bytes.as_slice()), AxisOrder::Xyz).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_iou, bench_alignment, bench_binvox);
criterion_main!(benches);
