// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CSV export of per-sample test results and timings

use super::reporter::SampleEvaluation;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metrics of one evaluated sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResultRow {
    pub sample_name: String,
    pub encoder_loss: f64,
    pub refiner_loss: Option<f64>,
    /// One IoU per threshold, in threshold order
    pub ious: Vec<f64>,
}

/// Wall time of one inference with the view count used
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingRow {
    pub time: f64,
    pub n_views: usize,
}

fn iou_column(threshold: f32) -> String {
    format!("iou_{}", threshold)
}

/// Write `sample_name, encoder_loss, [refiner_loss], iou_<t>...`.
///
/// The refiner column is present only if some row has a refiner loss.
pub fn write_test_results(
    path: impl AsRef<Path>,
    thresholds: &[f32],
    rows: &[TestResultRow],
) -> Result<()> {
    let with_refiner = rows.iter().any(|row| row.refiner_loss.is_some());
    let mut writer = csv::Writer::from_path(path.as_ref())?;

    let mut header = vec!["sample_name".to_string(), "encoder_loss".to_string()];
    if with_refiner {
        header.push("refiner_loss".to_string());
    }
    header.extend(thresholds.iter().map(|&t| iou_column(t)));
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.sample_name.clone(), row.encoder_loss.to_string()];
        if with_refiner {
            record.push(row.refiner_loss.map(|l| l.to_string()).unwrap_or_default());
        }
        for i in 0..thresholds.len() {
            record.push(row.ious.get(i).map(|v| v.to_string()).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    log::info!("Wrote {} test results to {:?}", rows.len(), path.as_ref());
    Ok(())
}

/// Write `time, n_views`
pub fn write_timings(path: impl AsRef<Path>, rows: &[TimingRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct EvaluationRow<'a> {
    sample_name: &'a str,
    iou: f64,
    aligned_iou: f64,
    dx: Option<i64>,
    dy: Option<i64>,
    dz: Option<i64>,
    time_ms: u64,
}

/// Write `sample_name, iou, aligned_iou, dx, dy, dz, time_ms`; shift columns
/// are empty for unaligned samples
pub fn write_evaluations(path: impl AsRef<Path>, results: &[SampleEvaluation]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for result in results {
        let shift = result.shift;
        writer.serialize(EvaluationRow {
            sample_name: &result.sample,
            iou: result.baseline_iou,
            aligned_iou: result.aligned_iou,
            dx: shift.map(|s| s[0]),
            dy: shift.map(|s| s[1]),
            dz: shift.map(|s| s[2]),
            time_ms: result.time_ms as u64,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_results_without_refiner() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");
        let rows = vec![TestResultRow {
            sample_name: "scan1".to_string(),
            encoder_loss: 0.25,
            refiner_loss: None,
            ious: vec![0.5, 0.75],
        }];

        write_test_results(&path, &[0.2, 0.3], &rows).unwrap();

        let table = read_rows(&path);
        assert_eq!(table[0], ["sample_name", "encoder_loss", "iou_0.2", "iou_0.3"]);
        assert_eq!(table[1], ["scan1", "0.25", "0.5", "0.75"]);
    }

    #[test]
    fn test_results_with_refiner() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");
        let rows = vec![
            TestResultRow {
                sample_name: "a".to_string(),
                encoder_loss: 1.0,
                refiner_loss: Some(0.5),
                ious: vec![0.1],
            },
            TestResultRow {
                sample_name: "b".to_string(),
                encoder_loss: 2.0,
                refiner_loss: None,
                ious: vec![0.2],
            },
        ];

        write_test_results(&path, &[0.5], &rows).unwrap();

        let table = read_rows(&path);
        assert_eq!(table[0][2], "refiner_loss");
        assert_eq!(table[1], ["a", "1", "0.5", "0.1"]);
        assert_eq!(table[2], ["b", "2", "", "0.2"]);
    }

    #[test]
    fn test_timings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("times.csv");
        write_timings(
            &path,
            &[
                TimingRow { time: 0.5, n_views: 1 },
                TimingRow { time: 1.5, n_views: 3 },
            ],
        )
        .unwrap();

        let table = read_rows(&path);
        assert_eq!(table[0], ["time", "n_views"]);
        assert_eq!(table[2], ["1.5", "3"]);
    }

    #[test]
    fn test_evaluations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan_iou.csv");
        let results = vec![
            SampleEvaluation {
                sample: "scan1".to_string(),
                baseline_iou: 0.25,
                aligned_iou: 0.5,
                shift: Some([-1, 0, 2]),
                time_ms: 12,
            },
            SampleEvaluation::unaligned("scan2", 0.75, std::time::Duration::ZERO),
        ];

        write_evaluations(&path, &results).unwrap();

        let table = read_rows(&path);
        assert_eq!(
            table[0],
            ["sample_name", "iou", "aligned_iou", "dx", "dy", "dz", "time_ms"]
        );
        assert_eq!(table[1], ["scan1", "0.25", "0.5", "-1", "0", "2", "12"]);
        assert_eq!(table[2], ["scan2", "0.75", "0.75", "", "", "", "0"]);
    }
}
