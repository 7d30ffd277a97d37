// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Composition of two sources into one index space
//!
//! Indices `[0, secondary.len())` address the secondary source; the rest
//! address the primary source after ratio truncation.

use super::record::SampleRecord;
use super::sampling::{MultiViewDataset, Sample, ViewCount, ViewDataset};
use crate::error::{Result, VoxsetError};
use rand::RngCore;

/// Records of the ratio-bearing source that are kept: `round(n / ratio)`,
/// half away from zero, never more than `n`.
pub fn selected_len(n: usize, ratio: f64) -> Result<usize> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(VoxsetError::InvalidRatio(ratio));
    }
    let keep = (n as f64 / ratio).round() as usize;
    Ok(keep.min(n))
}

/// Which underlying source an index resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposedSource {
    Secondary(usize),
    Primary(usize),
}

/// Secondary source followed by the truncated primary source
#[derive(Debug, Clone)]
pub struct ComposedDataset {
    secondary: MultiViewDataset,
    primary: MultiViewDataset,
    view_count: ViewCount,
}

impl ComposedDataset {
    /// Compose, keeping the first `round(primary.len() / primary_ratio)` primary records.
    ///
    /// Both sources are rebound to one shared view counter, initialised from
    /// the secondary source.
    pub fn new(
        secondary: MultiViewDataset,
        primary: MultiViewDataset,
        primary_ratio: f64,
    ) -> Result<Self> {
        let keep = selected_len(primary.len(), primary_ratio)?;
        log::info!(
            "Composing {} secondary samples with {} of {} primary samples (ratio {})",
            secondary.len(),
            keep,
            primary.len(),
            primary_ratio
        );

        let view_count = ViewCount::new(secondary.view_count());
        Ok(Self {
            secondary: secondary.with_view_count(view_count.clone()),
            primary: primary.truncated(keep).with_view_count(view_count.clone()),
            view_count,
        })
    }

    pub fn secondary(&self) -> &MultiViewDataset {
        &self.secondary
    }

    pub fn primary(&self) -> &MultiViewDataset {
        &self.primary
    }

    /// Map a composed index onto its source
    pub fn route(&self, index: usize) -> Option<ComposedSource> {
        let secondary_len = self.secondary.len();
        if index < secondary_len {
            Some(ComposedSource::Secondary(index))
        } else if index - secondary_len < self.primary.len() {
            Some(ComposedSource::Primary(index - secondary_len))
        } else {
            None
        }
    }
}

impl ViewDataset for ComposedDataset {
    fn len(&self) -> usize {
        self.secondary.len() + self.primary.len()
    }

    fn record(&self, index: usize) -> Option<&SampleRecord> {
        match self.route(index)? {
            ComposedSource::Secondary(i) => self.secondary.record(i),
            ComposedSource::Primary(i) => self.primary.record(i),
        }
    }

    fn view_count(&self) -> usize {
        self.view_count.get()
    }

    /// One store updates both sources
    fn set_view_count(&self, count: usize) {
        self.view_count.set(count);
    }

    fn get_with_views(&self, index: usize, k: usize, rng: &mut dyn RngCore) -> Result<Sample> {
        match self.route(index) {
            Some(ComposedSource::Secondary(i)) => self.secondary.get_with_views(i, k, rng),
            Some(ComposedSource::Primary(i)) => self.primary.get_with_views(i, k, rng),
            None => Err(VoxsetError::IndexOutOfRange {
                index,
                len: self.len(),
            }),
        }
    }
}
