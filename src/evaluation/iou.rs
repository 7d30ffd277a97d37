// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Intersection-over-union of occupancy grids

use crate::error::{Result, VoxsetError};
use crate::voxel::{Volume, VoxelGrid};
use serde::{Deserialize, Serialize};

/// Occupancy at or above this value counts as filled in a ground-truth volume
pub const TRUTH_THRESHOLD: f32 = 0.5;

/// IoU together with the counts it was computed from.
///
/// When both grids are empty the union is zero; `value` is then `0.0` and
/// `degenerate` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IouScore {
    pub value: f64,
    pub intersection: usize,
    pub union: usize,
    pub degenerate: bool,
}

impl IouScore {
    pub fn from_counts(intersection: usize, union: usize) -> Self {
        if union == 0 {
            Self {
                value: 0.0,
                intersection,
                union,
                degenerate: true,
            }
        } else {
            Self {
                value: intersection as f64 / union as f64,
                intersection,
                union,
                degenerate: false,
            }
        }
    }
}

fn check_dimensions(left: [usize; 3], right: [usize; 3]) -> Result<()> {
    if left != right {
        return Err(VoxsetError::DimensionMismatch { left, right });
    }
    Ok(())
}

/// Count intersection and union of two equally sized boolean masks
pub fn occupancy_iou(a: &[bool], b: &[bool]) -> IouScore {
    let (intersection, union) = a
        .iter()
        .zip(b)
        .fold((0usize, 0usize), |(inter, uni), (&x, &y)| {
            (inter + (x && y) as usize, uni + (x || y) as usize)
        });
    IouScore::from_counts(intersection, union)
}

/// IoU of two grids with identical dimensions
pub fn iou(a: &VoxelGrid, b: &VoxelGrid) -> Result<IouScore> {
    check_dimensions(a.dimensions(), b.dimensions())?;
    Ok(occupancy_iou(a.occupancy(), b.occupancy()))
}

/// IoU of a soft prediction binarised at `threshold` against a truth volume
/// binarised at [`TRUTH_THRESHOLD`]
pub fn threshold_iou(prediction: &Volume, truth: &Volume, threshold: f32) -> Result<IouScore> {
    check_dimensions(prediction.dimensions, truth.dimensions)?;

    let (intersection, union) = prediction.data.iter().zip(&truth.data).fold(
        (0usize, 0usize),
        |(inter, uni), (&p, &t)| {
            let p = p >= threshold;
            let t = t >= TRUTH_THRESHOLD;
            (inter + (p && t) as usize, uni + (p || t) as usize)
        },
    );
    Ok(IouScore::from_counts(intersection, union))
}
