// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Report generation (JSON and Markdown)

use super::alignment::Alignment;
use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Error information for samples that could not be evaluated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationError {
    pub sample: String,
    pub error: String,
}

/// IoU of one reconstructed sample before and after alignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleEvaluation {
    pub sample: String,
    pub baseline_iou: f64,
    /// Equal to `baseline_iou` when alignment was not run
    pub aligned_iou: f64,
    pub shift: Option<[i64; 3]>,
    pub time_ms: u128,
}

impl SampleEvaluation {
    pub fn unaligned(sample: impl Into<String>, iou: f64, elapsed: Duration) -> Self {
        Self {
            sample: sample.into(),
            baseline_iou: iou,
            aligned_iou: iou,
            shift: None,
            time_ms: elapsed.as_millis(),
        }
    }

    pub fn from_alignment(
        sample: impl Into<String>,
        alignment: &Alignment,
        elapsed: Duration,
    ) -> Self {
        Self {
            sample: sample.into(),
            baseline_iou: alignment.baseline.value,
            aligned_iou: alignment.iou(),
            shift: alignment.shift(),
            time_ms: elapsed.as_millis(),
        }
    }

    pub fn gain(&self) -> f64 {
        self.aligned_iou - self.baseline_iou
    }
}

/// Complete evaluation report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub timestamp: String,
    pub max_shift: Option<u32>,
    pub total_samples: usize,
    pub errors: usize,
    pub mean_baseline_iou: f64,
    pub mean_aligned_iou: f64,
    pub results: Vec<SampleEvaluation>,
    pub error_details: Vec<EvaluationError>,
}

impl EvaluationReport {
    pub fn new(max_shift: Option<u32>) -> Self {
        Self {
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            max_shift,
            total_samples: 0,
            errors: 0,
            mean_baseline_iou: 0.0,
            mean_aligned_iou: 0.0,
            results: Vec::new(),
            error_details: Vec::new(),
        }
    }

    pub fn add_result(&mut self, result: SampleEvaluation) {
        self.total_samples += 1;
        self.results.push(result);

        let n = self.results.len() as f64;
        self.mean_baseline_iou = self.results.iter().map(|r| r.baseline_iou).sum::<f64>() / n;
        self.mean_aligned_iou = self.results.iter().map(|r| r.aligned_iou).sum::<f64>() / n;
    }

    pub fn add_error(&mut self, sample: String, error: String) {
        self.total_samples += 1;
        self.errors += 1;
        self.error_details.push(EvaluationError { sample, error });
    }

    pub fn evaluated(&self) -> usize {
        self.results.len()
    }

    pub fn success_rate(&self) -> f32 {
        if self.total_samples == 0 {
            0.0
        } else {
            (self.evaluated() as f32 / self.total_samples as f32) * 100.0
        }
    }
}

/// Report writer
pub struct Reporter;

impl Reporter {
    /// Write JSON report
    pub fn write_json(report: &EvaluationReport, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Write Markdown report
    pub fn write_markdown(report: &EvaluationReport, path: &Path) -> Result<()> {
        let mut md = String::new();

        md.push_str(&format!(
            "# Voxel Evaluation Report ({})\n\n",
            Utc::now().format("%Y-%m-%d")
        ));

        // Summary
        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Total Samples**: {}\n", report.total_samples));
        md.push_str(&format!(
            "- **Evaluated**: {} ({:.1}%)\n",
            report.evaluated(),
            report.success_rate()
        ));
        md.push_str(&format!("- **Errors**: {}\n", report.errors));
        if let Some(max_shift) = report.max_shift {
            md.push_str(&format!("- **Max Shift**: {}\n", max_shift));
        }
        md.push_str(&format!(
            "- **Mean IoU**: {:.4} (aligned {:.4})\n\n",
            report.mean_baseline_iou, report.mean_aligned_iou
        ));

        md.push_str("## Detailed Results\n\n");
        md.push_str("| Sample | IoU | Aligned IoU | Shift | Time |\n");
        md.push_str("|--------|-----|-------------|-------|------|\n");

        for result in &report.results {
            let shift = result
                .shift
                .map(|[dx, dy, dz]| format!("({}, {}, {})", dx, dy, dz))
                .unwrap_or_else(|| "-".to_string());

            md.push_str(&format!(
                "| {} | {:.4} | {:.4} | {} | {}ms |\n",
                result.sample, result.baseline_iou, result.aligned_iou, shift, result.time_ms
            ));
        }

        if report.errors > 0 {
            md.push_str("\n## Errors\n\n");
            for error in &report.error_details {
                md.push_str(&format!("- ⚠️ **{}**\n", error.sample));
                md.push_str(&format!("  ```\n  {}\n  ```\n", error.error));
            }
        }

        md.push_str(&format!("\n---\n\n*Generated on {}*\n", report.timestamp));

        fs::write(path, md)?;
        Ok(())
    }
}
