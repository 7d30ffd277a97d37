// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error type shared by indexing, sampling, voxel I/O and evaluation

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, VoxsetError>;

/// Failures surfaced by the library
#[derive(Debug, Error)]
pub enum VoxsetError {
    #[error("taxonomy manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("failed to parse taxonomy manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown volume format for {0} (expected .binvox or .mat)")]
    UnknownVolumeFormat(PathBuf),

    /// A rendering decoded without a channel axis. Batches built from this
    /// sample would have a different shape, so the run must stop.
    #[error("rendering image {0} has no channel dimension (grayscale or corrupt file)")]
    MissingChannelAxis(PathBuf),

    #[error("grid dimensions differ: {left:?} vs {right:?}")]
    DimensionMismatch { left: [usize; 3], right: [usize; 3] },

    #[error("requested {requested} views but sample {sample} only has {available}")]
    NotEnoughViews {
        sample: String,
        requested: usize,
        available: usize,
    },

    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid subsampling ratio {0}: must be finite and greater than zero")]
    InvalidRatio(f64),

    #[error("invalid binvox data: {0}")]
    Binvox(String),

    #[error("invalid dense-matrix file {path}: {reason}")]
    Matrix { path: PathBuf, reason: String },

    #[error("field '{field}' not found in {path}")]
    MissingField { path: PathBuf, field: String },

    #[error("invalid PLY data: {0}")]
    Ply(String),

    #[error("invalid path template '{template}': {reason}")]
    Template { template: String, reason: String },

    #[error("failed to export results: {0}")]
    Export(#[from] csv::Error),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VoxsetError {
    /// Whether the caller must abort the whole run instead of skipping the sample
    pub fn is_fatal(&self) -> bool {
        matches!(self, VoxsetError::MissingChannelAxis(_))
    }
}
