// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Voxel evaluation: IoU, shift alignment and result reporting

pub mod alignment;
pub mod export;
pub mod iou;
pub mod reporter;
pub mod taxonomy;

pub use alignment::{maximize_iou, shift_candidates, Alignment, BestShift};
pub use export::{
    write_evaluations, write_test_results, write_timings, TestResultRow, TimingRow,
};
pub use iou::{iou, occupancy_iou, threshold_iou, IouScore, TRUTH_THRESHOLD};
pub use reporter::{EvaluationError, EvaluationReport, Reporter, SampleEvaluation};
pub use taxonomy::{TaxonomyIou, TaxonomyIouTable};
