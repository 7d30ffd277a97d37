// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! On-disk layout of the MVS scans and their reconstructions

use std::path::{Path, PathBuf};

/// Dense point cloud written by the pipeline, relative to its output directory
pub const DENSE_CLOUD: &str = "omvs/scene_dense.ply";
/// Voxelised dense cloud, next to [`DENSE_CLOUD`]
pub const DENSE_VOXELS: &str = "omvs/scene_dense.binvox";
/// Voxelised dense cloud after shift alignment
pub const MAXIMIZED_VOXELS: &str = "omvs/scene_dense_maximized.binvox";

/// Files produced under one pipeline output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructionOutput {
    root: PathBuf,
}

impl ReconstructionOutput {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dense_cloud(&self) -> PathBuf {
        self.root.join(DENSE_CLOUD)
    }

    pub fn voxels(&self) -> PathBuf {
        self.root.join(DENSE_VOXELS)
    }

    pub fn maximized_voxels(&self) -> PathBuf {
        self.root.join(MAXIMIZED_VOXELS)
    }

    /// Voxel file to evaluate, aligned or not
    pub fn result_voxels(&self, maximized: bool) -> PathBuf {
        if maximized {
            self.maximized_voxels()
        } else {
            self.voxels()
        }
    }
}

/// Paths of numbered scans under an MVS dataset root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanLayout {
    root: PathBuf,
}

impl ScanLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scan_name(scan: u32) -> String {
        format!("scan{}", scan)
    }

    pub fn images_dir(&self, scan: u32) -> PathBuf {
        self.root.join("images").join(Self::scan_name(scan))
    }

    pub fn output(&self, scan: u32) -> ReconstructionOutput {
        ReconstructionOutput::new(
            self.root
                .join("results")
                .join("sfm")
                .join(Self::scan_name(scan)),
        )
    }

    pub fn truth_voxels(&self, scan: u32) -> PathBuf {
        self.root
            .join("voxels")
            .join(format!("stl{:03}_total.binvox", scan))
    }
}
