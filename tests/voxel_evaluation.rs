// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Voxel file round trips, IoU properties and shift alignment

use approx::assert_relative_eq;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use tempfile::TempDir;
use voxset::evaluation::{iou, maximize_iou, threshold_iou, TaxonomyIouTable};
use voxset::voxel::{read_binvox, read_binvox_raw, read_volume, write_binvox, AxisOrder, VoxelGrid};
use voxset::VoxsetError;

fn random_grid(dims: [usize; 3], seed: u64) -> VoxelGrid {
    let mut rng = StdRng::seed_from_u64(seed);
    let occupancy = (0..dims.iter().product::<usize>())
        .map(|_| rng.gen_bool(0.3))
        .collect();
    VoxelGrid::new(dims, Vector3::new(0.5, -1.0, 2.0), 0.75, AxisOrder::Xyz, occupancy).unwrap()
}

fn face_grid() -> VoxelGrid {
    let mut grid = VoxelGrid::empty([4, 4, 4]).unwrap();
    for y in 0..4 {
        for z in 0..4 {
            grid.set(0, y, z, true);
        }
    }
    grid
}

#[test]
fn test_binvox_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let first_path = dir.path().join("first.binvox");
    let second_path = dir.path().join("second.binvox");

    write_binvox(&random_grid([5, 6, 7], 3), &first_path).unwrap();
    let first = read_binvox(&first_path).unwrap();
    write_binvox(&first, &second_path).unwrap();
    let second = read_binvox(&second_path).unwrap();

    assert_eq!(first.occupancy(), second.occupancy());
    assert_eq!(second.dimensions(), [5, 6, 7]);
    assert_relative_eq!(second.scale(), 0.75);
    assert_relative_eq!(second.translation().y, -1.0);
}

#[test]
fn test_raw_layout_swaps_y_and_z() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("grid.binvox");

    let mut grid = VoxelGrid::empty([2, 3, 4]).unwrap();
    grid.set(1, 2, 3, true);
    write_binvox(&grid, &path).unwrap();

    let raw = read_binvox_raw(&path).unwrap();
    assert_eq!(raw.axis_order(), AxisOrder::Xzy);
    assert_eq!(raw.dimensions(), [2, 4, 3]);
    assert!(raw.get(1, 3, 2));
    assert_eq!(raw.occupied_count(), 1);
}

#[test]
fn test_unknown_volume_suffix() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.obj");
    fs::write(&path, "v 0 0 0").unwrap();
    assert!(matches!(
        read_volume(&path).unwrap_err(),
        VoxsetError::UnknownVolumeFormat(_)
    ));
}

#[test]
fn test_iou_of_grid_with_itself() {
    for seed in 0..5 {
        let grid = random_grid([6, 6, 6], seed);
        assert_eq!(iou(&grid, &grid).unwrap().value, 1.0);
    }
}

#[test]
fn test_iou_of_disjoint_grids() {
    let a = face_grid();
    let b = a.rolled([2, 0, 0]);
    let score = iou(&a, &b).unwrap();
    assert_eq!(score.value, 0.0);
    assert!(!score.degenerate);
}

#[test]
fn test_zero_radius_search_equals_plain_iou() {
    for seed in 0..5 {
        let result = random_grid([5, 5, 5], seed);
        let truth = random_grid([5, 5, 5], seed + 100);
        let alignment = maximize_iou(&result, &truth, 0).unwrap();
        assert_eq!(alignment.candidates, 1);
        assert_eq!(alignment.iou(), iou(&result, &truth).unwrap().value);
    }
}

#[test]
fn test_wrapped_face_is_recovered() {
    let truth = face_grid();
    let result = truth.rolled([1, 0, 0]);
    assert_eq!(iou(&result, &truth).unwrap().value, 0.0);

    let alignment = maximize_iou(&result, &truth, 1).unwrap();
    assert_eq!(alignment.iou(), 1.0);
    assert_eq!(alignment.shift(), Some([-1, 0, 0]));

    // metadata is carried over and the input is untouched
    assert_eq!(alignment.grid.dimensions(), result.dimensions());
    assert_eq!(alignment.grid.axis_order(), result.axis_order());
    assert!(result.get(1, 0, 0));
    assert!(alignment.grid.get(0, 0, 0));
}

#[test]
fn test_alignment_finds_global_optimum() {
    let truth = random_grid([8, 8, 8], 42);
    let result = truth.rolled([2, -1, 3]);

    let alignment = maximize_iou(&result, &truth, 3).unwrap();
    assert_eq!(alignment.iou(), 1.0);
    assert_eq!(alignment.shift(), Some([-2, 1, -3]));
    assert!(alignment.iou() >= alignment.baseline.value);
}

#[test]
fn test_alignment_rejects_mismatched_grids() {
    let a = VoxelGrid::empty([4, 4, 4]).unwrap();
    let b = VoxelGrid::empty([4, 4, 5]).unwrap();
    assert!(matches!(
        maximize_iou(&a, &b, 1).unwrap_err(),
        VoxsetError::DimensionMismatch { .. }
    ));
}

#[test]
fn test_threshold_iou_against_binvox_truth() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("truth.binvox");
    let truth_grid = face_grid();
    write_binvox(&truth_grid, &path).unwrap();
    let truth = read_volume(&path).unwrap();

    let mut prediction = truth.clone();
    for value in prediction.data.iter_mut() {
        *value = if *value > 0.5 { 0.35 } else { 0.1 };
    }

    assert_eq!(threshold_iou(&prediction, &truth, 0.3).unwrap().value, 1.0);
    let score = threshold_iou(&prediction, &truth, 0.4).unwrap();
    assert_eq!(score.value, 0.0);
    assert_eq!(score.union, 16);
}

#[test]
fn test_taxonomy_table_from_scores() {
    let truth = face_grid();
    let mut table = TaxonomyIouTable::new();
    table.record("a", iou(&truth, &truth).unwrap().value);
    table.record("a", iou(&truth.rolled([1, 0, 0]), &truth).unwrap().value);
    table.record("b", 0.25);

    assert_eq!(table.get("a").unwrap().n_samples, 2);
    assert_relative_eq!(table.get("a").unwrap().mean().unwrap(), 0.5);
    assert_relative_eq!(table.overall_mean().unwrap(), 1.25 / 3.0);
}
