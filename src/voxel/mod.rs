// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Voxel grids and the on-disk volume formats

mod binvox;
mod grid;
mod matrix;
mod ply;
mod volume;

pub use binvox::{decode as decode_binvox, encode as encode_binvox};
pub use binvox::{read_binvox, read_binvox_raw, write_binvox};
pub use grid::{AxisOrder, VoxelGrid};
pub use matrix::{read_matrix_field, DEFAULT_VOLUME_FIELD};
pub use ply::{ply_to_grid, read_ply_points, voxelize_points};
pub use volume::{read_volume, Volume, VolumeFormat};

pub(crate) use grid::wrap;
