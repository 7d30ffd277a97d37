// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scoring reconstructed voxels against ground truth

use super::layout::{ReconstructionOutput, ScanLayout};
use crate::dataset::{DatasetIndex, PathTemplate};
use crate::evaluation::{
    iou, maximize_iou, EvaluationReport, SampleEvaluation, TaxonomyIouTable,
};
use crate::voxel::{ply_to_grid, read_binvox, write_binvox, VoxelGrid};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;

/// Voxelise the dense cloud of `output` and write it next to it
pub fn voxelize_output(output: &ReconstructionOutput, dim: usize) -> Result<VoxelGrid> {
    let cloud = output.dense_cloud();
    let grid =
        ply_to_grid(&cloud, dim).with_context(|| format!("Failed to voxelise {:?}", cloud))?;
    write_binvox(&grid, output.voxels())
        .with_context(|| format!("Failed to write {:?}", output.voxels()))?;
    Ok(grid)
}

fn read_grid(path: &Path) -> Result<VoxelGrid> {
    read_binvox(path).with_context(|| format!("Failed to read {:?}", path))
}

/// Evaluates numbered MVS scans
#[derive(Debug, Clone)]
pub struct ScanEvaluator {
    layout: ScanLayout,
    /// Score the previously written aligned result instead of the raw one
    maximized: bool,
    /// Run the shift search and write the aligned result
    max_shift: Option<u32>,
}

impl ScanEvaluator {
    pub fn new(layout: ScanLayout) -> Self {
        Self {
            layout,
            maximized: false,
            max_shift: None,
        }
    }

    pub fn with_maximized(mut self, maximized: bool) -> Self {
        self.maximized = maximized;
        self
    }

    pub fn with_alignment(mut self, max_shift: Option<u32>) -> Self {
        self.max_shift = max_shift;
        self
    }

    pub fn layout(&self) -> &ScanLayout {
        &self.layout
    }

    /// Whether both the result and the truth of `scan` exist
    pub fn is_available(&self, scan: u32) -> bool {
        self.layout
            .output(scan)
            .result_voxels(self.maximized)
            .is_file()
            && self.layout.truth_voxels(scan).is_file()
    }

    pub fn evaluate(&self, scan: u32) -> Result<SampleEvaluation> {
        let name = ScanLayout::scan_name(scan);
        let output = self.layout.output(scan);
        let start = Instant::now();

        let result = read_grid(&output.result_voxels(self.maximized))?;
        let truth = read_grid(&self.layout.truth_voxels(scan))?;

        match self.max_shift {
            Some(max_shift) if !self.maximized => {
                let alignment = maximize_iou(&result, &truth, max_shift)?;
                write_binvox(&alignment.grid, output.maximized_voxels())
                    .with_context(|| format!("Failed to write aligned result of {}", name))?;
                Ok(SampleEvaluation::from_alignment(name, &alignment, start.elapsed()))
            }
            _ => {
                let score = iou(&result, &truth)?;
                Ok(SampleEvaluation::unaligned(name, score.value, start.elapsed()))
            }
        }
    }

    /// Evaluate every available scan in `first..=last`; missing scans are skipped
    pub fn evaluate_range(
        &self,
        first: u32,
        last: u32,
        mut on_scan: impl FnMut(u32),
    ) -> EvaluationReport {
        let mut report = EvaluationReport::new(self.max_shift);
        for scan in first..=last {
            on_scan(scan);
            if !self.is_available(scan) {
                log::warn!(
                    "Skipping {}: result or truth voxels missing",
                    ScanLayout::scan_name(scan)
                );
                continue;
            }
            match self.evaluate(scan) {
                Ok(result) => {
                    log::info!("IoU {}: {:.4}", result.sample, result.aligned_iou);
                    report.add_result(result);
                }
                Err(e) => report.add_error(ScanLayout::scan_name(scan), format!("{:#}", e)),
            }
        }
        report
    }
}

/// Score reconstructions of every indexed sample, grouped by taxonomy.
///
/// `results` renders the pipeline output directory of a sample. Missing
/// voxel files are produced from the dense cloud at resolution `dim`.
pub fn evaluate_taxonomies(
    index: &DatasetIndex,
    results: &PathTemplate,
    dim: usize,
    mut on_sample: impl FnMut(usize),
) -> Result<(TaxonomyIouTable, EvaluationReport)> {
    let mut table = TaxonomyIouTable::new();
    let mut report = EvaluationReport::new(None);

    for (position, record) in index.records().iter().enumerate() {
        on_sample(position);
        let name = format!("{}/{}", record.taxonomy_id(), record.sample_id());
        let output = ReconstructionOutput::new(results.render(
            record.taxonomy_id(),
            record.sample_id(),
            None,
        )?);

        let start = Instant::now();
        let scored = (|| -> Result<f64> {
            let result = if output.voxels().is_file() {
                read_grid(&output.voxels())?
            } else {
                voxelize_output(&output, dim)?
            };
            let truth = read_grid(record.volume_path())?;
            Ok(iou(&result, &truth)?.value)
        })();

        match scored {
            Ok(value) => {
                table.record(record.taxonomy_id(), value);
                report.add_result(SampleEvaluation::unaligned(name, value, start.elapsed()));
            }
            Err(e) => {
                log::warn!("Skipping {}: {:#}", name, e);
                report.add_error(name, format!("{:#}", e));
            }
        }
    }

    Ok((table, report))
}
