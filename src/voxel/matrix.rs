// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Dense-matrix (MATLAB `.mat`) volumes

use crate::error::{Result, VoxsetError};
use matfile::{MatFile, NumericData};
use std::fs::File;
use std::path::Path;

/// Name of the array holding the occupancy in dataset `.mat` files
pub const DEFAULT_VOLUME_FIELD: &str = "Volume";

/// Read the named 3D array of a `.mat` file as `f32`, in row-major (C) order
pub fn read_matrix_field(path: impl AsRef<Path>, field: &str) -> Result<([usize; 3], Vec<f32>)> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mat = MatFile::parse(file).map_err(|e| VoxsetError::Matrix {
        path: path.to_path_buf(),
        reason: format!("{:?}", e),
    })?;

    let array = mat
        .find_by_name(field)
        .ok_or_else(|| VoxsetError::MissingField {
            path: path.to_path_buf(),
            field: field.to_string(),
        })?;

    let size = array.size();
    let dims: [usize; 3] = match size.as_slice() {
        [a, b, c] => [*a, *b, *c],
        // MATLAB drops trailing singleton dimensions
        [a, b] => [*a, *b, 1],
        other => {
            return Err(VoxsetError::Matrix {
                path: path.to_path_buf(),
                reason: format!("expected a 3D array, got shape {:?}", other),
            })
        }
    };

    let column_major = real_as_f32(array.data());
    if column_major.len() != dims.iter().product::<usize>() {
        return Err(VoxsetError::Matrix {
            path: path.to_path_buf(),
            reason: format!(
                "array holds {} values for shape {:?}",
                column_major.len(),
                dims
            ),
        });
    }

    Ok((dims, column_to_row_major(&column_major, dims)))
}

fn real_as_f32(data: &NumericData) -> Vec<f32> {
    match data {
        NumericData::Double { real, .. } => real.iter().map(|&v| v as f32).collect(),
        NumericData::Single { real, .. } => real.clone(),
        NumericData::Int8 { real, .. } => real.iter().map(|&v| v as f32).collect(),
        NumericData::UInt8 { real, .. } => real.iter().map(|&v| v as f32).collect(),
        NumericData::Int16 { real, .. } => real.iter().map(|&v| v as f32).collect(),
        NumericData::UInt16 { real, .. } => real.iter().map(|&v| v as f32).collect(),
        NumericData::Int32 { real, .. } => real.iter().map(|&v| v as f32).collect(),
        NumericData::UInt32 { real, .. } => real.iter().map(|&v| v as f32).collect(),
        NumericData::Int64 { real, .. } => real.iter().map(|&v| v as f32).collect(),
        NumericData::UInt64 { real, .. } => real.iter().map(|&v| v as f32).collect(),
    }
}

/// MATLAB stores `(i, j, k)` at `i + j * d0 + k * d0 * d1`
fn column_to_row_major(data: &[f32], dims: [usize; 3]) -> Vec<f32> {
    let [d0, d1, d2] = dims;
    let mut out = vec![0.0; data.len()];
    for i in 0..d0 {
        for j in 0..d1 {
            for k in 0..d2 {
                out[(i * d1 + j) * d2 + k] = data[i + j * d0 + k * d0 * d1];
            }
        }
    }
    out
}
