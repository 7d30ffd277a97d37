// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Volume decoding dispatched on file suffix

use super::{binvox, matrix};
use crate::error::{Result, VoxsetError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported on-disk volume formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeFormat {
    Binvox,
    Matrix,
}

impl VolumeFormat {
    /// Detect the format from the file suffix
    pub fn detect(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("binvox") => Ok(VolumeFormat::Binvox),
            Some("mat") => Ok(VolumeFormat::Matrix),
            _ => Err(VoxsetError::UnknownVolumeFormat(path.to_path_buf())),
        }
    }
}

/// Decoded volume as a dense float array
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub dimensions: [usize; 3],
    pub data: Vec<f32>,
}

impl Volume {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Decode a `.binvox` or `.mat` volume into floats
pub fn read_volume(path: impl AsRef<Path>) -> Result<Volume> {
    let path = path.as_ref();
    match VolumeFormat::detect(path)? {
        VolumeFormat::Binvox => {
            let grid = binvox::read_binvox(path)?;
            Ok(Volume {
                dimensions: grid.dimensions(),
                data: grid.to_f32(),
            })
        }
        VolumeFormat::Matrix => {
            let (dimensions, data) =
                matrix::read_matrix_field(path, matrix::DEFAULT_VOLUME_FIELD)?;
            Ok(Volume { dimensions, data })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::{write_binvox, VoxelGrid};
    use tempfile::TempDir;

    #[test]
    fn test_unknown_suffix_is_error() {
        let err = read_volume("model.obj").unwrap_err();
        assert!(matches!(err, VoxsetError::UnknownVolumeFormat(_)));

        let err = read_volume("model").unwrap_err();
        assert!(matches!(err, VoxsetError::UnknownVolumeFormat(_)));
    }

    #[test]
    fn test_binvox_volume_as_floats() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.binvox");

        let mut grid = VoxelGrid::empty([2, 3, 4]).unwrap();
        grid.set(1, 2, 3, true);
        write_binvox(&grid, &path).unwrap();

        let volume = read_volume(&path).unwrap();
        assert_eq!(volume.dimensions, [2, 3, 4]);
        assert_eq!(volume.len(), 24);
        assert_eq!(volume.data[grid.index(1, 2, 3)], 1.0);
        assert_eq!(volume.data.iter().sum::<f32>(), 1.0);
    }
}
