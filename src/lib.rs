// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Voxset
//!
//! Multi-view 3D reconstruction datasets and voxel evaluation.
//! Indexes taxonomy manifests against rendered views and voxel volumes,
//! samples views per access, composes sources, and scores reconstructions
//! by IoU with an exhaustive circular shift search.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod reconstruction;
pub mod voxel;

pub use config::VoxsetConfig;
pub use dataset::{
    ComposedDataset, DatasetIndex, DatasetSplit, MultiViewDataset, Sample, SampleRecord,
    SamplingMode, TaxonomyIndex, ViewDataset,
};
pub use error::{Result, VoxsetError};
pub use evaluation::{iou, maximize_iou, Alignment, IouScore};
pub use voxel::{read_binvox, read_volume, write_binvox, AxisOrder, Volume, VoxelGrid};
