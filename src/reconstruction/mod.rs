// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! External photogrammetry reconstruction and its evaluation

pub mod evaluate;
pub mod layout;
pub mod resize;
pub mod runner;

pub use evaluate::{evaluate_taxonomies, voxelize_output, ScanEvaluator};
pub use layout::{ReconstructionOutput, ScanLayout};
pub use resize::{discover_images, resize_images, RESIZED_DIR};
pub use runner::ReconstructionRunner;

use crate::voxel::VoxelGrid;
use anyhow::Result;
use std::path::Path;

/// Resize (optionally), run the pipeline on `images` and voxelise its dense cloud
pub fn reconstruct(
    runner: &ReconstructionRunner,
    images: &Path,
    output: &ReconstructionOutput,
    resize: Option<u32>,
    dim: usize,
) -> Result<VoxelGrid> {
    let input = match resize {
        Some(size) => {
            let target = images.join(RESIZED_DIR);
            resize_images(images, &target, size)?;
            target
        }
        None => images.to_path_buf(),
    };

    let elapsed = runner.run(&input, output.root())?;
    log::info!("Pipeline finished in {:.1}s", elapsed.as_secs_f64());

    voxelize_output(output, dim)
}
