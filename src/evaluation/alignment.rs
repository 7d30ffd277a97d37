// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Brute-force circular shift search maximising IoU
//!
//! Every translation in `[-max_shift, max_shift]^3` is scored. Candidates are
//! visited by ascending L1 norm and then lexicographically by `(dx, dy, dz)`,
//! so the zero shift comes first and ties go to the smallest displacement.
//! This differs from a plain lexicographic scan starting at
//! `(-max_shift, -max_shift, -max_shift)`, which keeps the most negative
//! shift among equal scorers. The best IoU is the same either way; only the
//! reported shift can differ on ties.
//! Scores are computed in parallel; selection is sequential over that order.

use super::iou::{iou, IouScore};
use crate::error::Result;
use crate::voxel::{wrap, VoxelGrid};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Shift with its score, retained when it strictly beats everything before it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestShift {
    pub shift: [i64; 3],
    pub score: IouScore,
}

/// Outcome of [`maximize_iou`]
#[derive(Debug, Clone)]
pub struct Alignment {
    /// IoU of the unshifted result
    pub baseline: IouScore,
    /// `None` when no candidate scored above zero
    pub best: Option<BestShift>,
    /// Number of shifts evaluated
    pub candidates: usize,
    /// Result after the winning shift; a copy of the input when nothing improved
    pub grid: VoxelGrid,
}

impl Alignment {
    /// Best IoU reached, `0.0` when no shift improved
    pub fn iou(&self) -> f64 {
        self.best.map_or(0.0, |best| best.score.value)
    }

    pub fn shift(&self) -> Option<[i64; 3]> {
        self.best.map(|best| best.shift)
    }

    pub fn improved(&self) -> bool {
        self.best.is_some()
    }
}

/// All shifts within `max_shift` of the origin, in search order
pub fn shift_candidates(max_shift: u32) -> Vec<[i64; 3]> {
    let r = max_shift as i64;
    let mut shifts = Vec::with_capacity((2 * max_shift as usize + 1).pow(3));
    for dx in -r..=r {
        for dy in -r..=r {
            for dz in -r..=r {
                shifts.push([dx, dy, dz]);
            }
        }
    }
    shifts.sort_by_key(|&[dx, dy, dz]| (dx.abs() + dy.abs() + dz.abs(), dx, dy, dz));
    shifts
}

/// IoU of `result` rolled by `shift` against `truth`, without building the
/// rolled grid. Rolling is a bijection, so the union follows from the
/// intersection and both occupied counts.
fn shifted_score(
    result: &VoxelGrid,
    truth: &VoxelGrid,
    result_count: usize,
    truth_count: usize,
    shift: [i64; 3],
) -> IouScore {
    let [d0, d1, d2] = result.dimensions();
    let source = result.occupancy();
    let target = truth.occupancy();

    let mut intersection = 0usize;
    for i in 0..d0 {
        let ti = wrap(i, shift[0], d0);
        for j in 0..d1 {
            let tj = wrap(j, shift[1], d1);
            let src = (i * d1 + j) * d2;
            let dst = (ti * d1 + tj) * d2;
            for k in 0..d2 {
                if source[src + k] && target[dst + wrap(k, shift[2], d2)] {
                    intersection += 1;
                }
            }
        }
    }

    IouScore::from_counts(intersection, result_count + truth_count - intersection)
}

/// Find the circular shift of `result` that best overlaps `truth`
pub fn maximize_iou(result: &VoxelGrid, truth: &VoxelGrid, max_shift: u32) -> Result<Alignment> {
    let baseline = iou(result, truth)?;
    let result_count = result.occupied_count();
    let truth_count = truth.occupied_count();

    let shifts = shift_candidates(max_shift);
    log::debug!(
        "Searching {} shifts (max {}) over {:?} grid",
        shifts.len(),
        max_shift,
        result.dimensions()
    );

    let scores: Vec<IouScore> = shifts
        .par_iter()
        .map(|&shift| shifted_score(result, truth, result_count, truth_count, shift))
        .collect();

    let mut best: Option<BestShift> = None;
    for (&shift, &score) in shifts.iter().zip(&scores) {
        let current = best.map_or(0.0, |b| b.score.value);
        if score.value > current {
            log::debug!("Shift {:?} improves IoU to {:.4}", shift, score.value);
            best = Some(BestShift { shift, score });
        }
    }

    let grid = match best {
        Some(b) => result.rolled(b.shift),
        None => {
            log::debug!("No shift within {} improves on zero IoU", max_shift);
            result.clone()
        }
    };

    Ok(Alignment {
        baseline,
        best,
        candidates: shifts.len(),
        grid,
    })
}
