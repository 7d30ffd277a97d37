// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Dense occupancy grid with binvox metadata

use crate::error::{Result, VoxsetError};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Memory layout of the occupancy array
///
/// `Xyz` stores cell `(x, y, z)` at `(x * ny + y) * nz + z`. `Xzy` keeps the
/// raw binvox ordering, where the second and third axes are swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisOrder {
    Xyz,
    Xzy,
}

impl AxisOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            AxisOrder::Xyz => "xyz",
            AxisOrder::Xzy => "xzy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "xyz" => Some(AxisOrder::Xyz),
            "xzy" => Some(AxisOrder::Xzy),
            _ => None,
        }
    }
}

impl fmt::Display for AxisOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dense 3D occupancy grid
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    dimensions: [usize; 3],
    translation: Vector3<f32>,
    scale: f32,
    axis_order: AxisOrder,
    occupancy: Vec<bool>,
}

impl VoxelGrid {
    /// Create a grid, checking that the occupancy length matches the dimensions
    pub fn new(
        dimensions: [usize; 3],
        translation: Vector3<f32>,
        scale: f32,
        axis_order: AxisOrder,
        occupancy: Vec<bool>,
    ) -> Result<Self> {
        if dimensions.iter().any(|&d| d == 0) {
            return Err(VoxsetError::Binvox(format!(
                "dimensions must be positive, got {:?}",
                dimensions
            )));
        }

        let expected = dimensions[0] * dimensions[1] * dimensions[2];
        if occupancy.len() != expected {
            return Err(VoxsetError::Binvox(format!(
                "occupancy has {} cells but dimensions {:?} need {}",
                occupancy.len(),
                dimensions,
                expected
            )));
        }

        Ok(Self {
            dimensions,
            translation,
            scale,
            axis_order,
            occupancy,
        })
    }

    /// Empty xyz grid at the origin with unit scale
    pub fn empty(dimensions: [usize; 3]) -> Result<Self> {
        let len = dimensions.iter().product();
        Self::new(
            dimensions,
            Vector3::zeros(),
            1.0,
            AxisOrder::Xyz,
            vec![false; len],
        )
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    pub fn translation(&self) -> Vector3<f32> {
        self.translation
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn axis_order(&self) -> AxisOrder {
        self.axis_order
    }

    pub fn occupancy(&self) -> &[bool] {
        &self.occupancy
    }

    pub fn len(&self) -> usize {
        self.occupancy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupancy.is_empty()
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.occupancy.iter().filter(|&&v| v).count()
    }

    /// Linear index of a cell in storage order
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        let [_, d1, d2] = self.dimensions;
        (i * d1 + j) * d2 + k
    }

    pub fn get(&self, i: usize, j: usize, k: usize) -> bool {
        self.occupancy[self.index(i, j, k)]
    }

    pub fn set(&mut self, i: usize, j: usize, k: usize, value: bool) {
        let idx = self.index(i, j, k);
        self.occupancy[idx] = value;
    }

    /// Occupancy cast to `0.0` / `1.0`, same layout as the stored grid
    pub fn to_f32(&self) -> Vec<f32> {
        self.occupancy
            .iter()
            .map(|&v| if v { 1.0 } else { 0.0 })
            .collect()
    }

    /// Copy of this grid with new occupancy and identical metadata
    pub fn with_occupancy(&self, occupancy: Vec<bool>) -> Result<Self> {
        Self::new(
            self.dimensions,
            self.translation,
            self.scale,
            self.axis_order,
            occupancy,
        )
    }

    /// Circularly shift the occupancy by `shift` cells along each storage axis.
    ///
    /// Cell `p` moves to `(p + shift) mod dims`. The receiver is left untouched.
    pub fn rolled(&self, shift: [i64; 3]) -> Self {
        let [d0, d1, d2] = self.dimensions;
        let mut occupancy = vec![false; self.occupancy.len()];

        for i in 0..d0 {
            let ti = wrap(i, shift[0], d0);
            for j in 0..d1 {
                let tj = wrap(j, shift[1], d1);
                let src = (i * d1 + j) * d2;
                let dst = (ti * d1 + tj) * d2;
                for k in 0..d2 {
                    occupancy[dst + wrap(k, shift[2], d2)] = self.occupancy[src + k];
                }
            }
        }

        Self {
            dimensions: self.dimensions,
            translation: self.translation,
            scale: self.scale,
            axis_order: self.axis_order,
            occupancy,
        }
    }
}

/// `(index + shift) mod len` for a possibly negative shift
pub(crate) fn wrap(index: usize, shift: i64, len: usize) -> usize {
    (index as i64 + shift).rem_euclid(len as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let result = VoxelGrid::new(
            [2, 2, 2],
            Vector3::zeros(),
            1.0,
            AxisOrder::Xyz,
            vec![false; 7],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_zero_dimension() {
        assert!(VoxelGrid::empty([0, 2, 2]).is_err());
    }

    #[test]
    fn test_roll_wraps_around() {
        let mut grid = VoxelGrid::empty([3, 2, 2]).unwrap();
        grid.set(2, 1, 0, true);

        let rolled = grid.rolled([1, 0, -1]);
        assert!(rolled.get(0, 1, 1));
        assert_eq!(rolled.occupied_count(), 1);
        // receiver untouched
        assert!(grid.get(2, 1, 0));
    }

    #[test]
    fn test_roll_keeps_metadata() {
        let grid = VoxelGrid::new(
            [2, 2, 2],
            Vector3::new(1.0, 2.0, 3.0),
            0.5,
            AxisOrder::Xzy,
            vec![true, false, false, false, false, false, false, false],
        )
        .unwrap();

        let rolled = grid.rolled([1, 1, 1]);
        assert_eq!(rolled.translation(), grid.translation());
        assert_eq!(rolled.scale(), 0.5);
        assert_eq!(rolled.axis_order(), AxisOrder::Xzy);
        assert!(rolled.get(1, 1, 1));
    }

    #[test]
    fn test_axis_order_parse() {
        assert_eq!(AxisOrder::parse("XYZ"), Some(AxisOrder::Xyz));
        assert_eq!(AxisOrder::parse("xzy"), Some(AxisOrder::Xzy));
        assert_eq!(AxisOrder::parse("zyx"), None);
    }
}
