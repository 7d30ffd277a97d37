// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-access view sampling and decoding

use super::index::DatasetIndex;
use super::record::SampleRecord;
use super::rendering::{load_rendering, RenderingImage};
use super::taxonomy::DatasetSplit;
use crate::error::{Result, VoxsetError};
use crate::voxel::{read_volume, Volume};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// How views are chosen on each access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplingMode {
    /// Distinct views drawn uniformly at random, independently per access
    Train,
    /// The first `k` views in stored order
    Eval,
}

impl From<DatasetSplit> for SamplingMode {
    fn from(split: DatasetSplit) -> Self {
        match split {
            DatasetSplit::Train => SamplingMode::Train,
            DatasetSplit::Test | DatasetSplit::Val => SamplingMode::Eval,
        }
    }
}

/// Shared, atomically updated number of views requested per access.
///
/// Clones share the same counter.
#[derive(Debug, Clone)]
pub struct ViewCount(Arc<AtomicUsize>);

impl ViewCount {
    pub fn new(count: usize) -> Self {
        Self(Arc::new(AtomicUsize::new(count)))
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, count: usize) {
        self.0.store(count, Ordering::Release);
    }
}

/// Choose `k` view positions of `record` according to `mode`
pub fn select_views(
    record: &SampleRecord,
    k: usize,
    mode: SamplingMode,
    rng: &mut dyn RngCore,
) -> Result<Vec<usize>> {
    let available = record.view_count();
    if k > available {
        return Err(VoxsetError::NotEnoughViews {
            sample: format!("{}/{}", record.taxonomy_id(), record.sample_id()),
            requested: k,
            available,
        });
    }

    Ok(match mode {
        SamplingMode::Train => rand::seq::index::sample(rng, available, k).into_vec(),
        SamplingMode::Eval => (0..k).collect(),
    })
}

/// A decoded sample: selected renderings plus the ground-truth volume
#[derive(Debug, Clone)]
pub struct Sample {
    pub taxonomy_id: String,
    pub sample_id: String,
    pub view_indices: Vec<usize>,
    pub images: Vec<RenderingImage>,
    pub volume: Volume,
}

impl Sample {
    /// Common `[height, width, channels]` of the views, if they agree
    pub fn view_shape(&self) -> Option<[usize; 3]> {
        let first = self.images.first()?.shape();
        self.images
            .iter()
            .all(|img| img.shape() == first)
            .then_some(first)
    }
}

/// Decode `record` using the given view selection
pub fn load_sample(
    record: &SampleRecord,
    k: usize,
    mode: SamplingMode,
    resize: Option<(u32, u32)>,
    rng: &mut dyn RngCore,
) -> Result<Sample> {
    let view_indices = select_views(record, k, mode, rng)?;

    let images = view_indices
        .iter()
        .map(|&i| load_rendering(&record.rendering_paths()[i], resize))
        .collect::<Result<Vec<_>>>()?;

    let volume = read_volume(record.volume_path())?;

    Ok(Sample {
        taxonomy_id: record.taxonomy_id().to_string(),
        sample_id: record.sample_id().to_string(),
        view_indices,
        images,
        volume,
    })
}

/// Random-access dataset of decoded samples.
///
/// Implementations are shared across loader workers; the only mutable state is
/// the view count, which is read once per access.
pub trait ViewDataset: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, index: usize) -> Option<&SampleRecord>;

    /// Views requested by the next access
    fn view_count(&self) -> usize;

    /// Change the views requested by subsequent accesses
    fn set_view_count(&self, count: usize);

    /// Decode `index` with an explicit view count
    fn get_with_views(&self, index: usize, k: usize, rng: &mut dyn RngCore) -> Result<Sample>;

    fn get_with_rng(&self, index: usize, rng: &mut dyn RngCore) -> Result<Sample> {
        self.get_with_views(index, self.view_count(), rng)
    }

    fn get(&self, index: usize) -> Result<Sample> {
        self.get_with_rng(index, &mut rand::thread_rng())
    }
}

/// Samples of a single source
#[derive(Debug, Clone)]
pub struct MultiViewDataset {
    records: Arc<[SampleRecord]>,
    mode: SamplingMode,
    view_count: ViewCount,
    image_size: Option<(u32, u32)>,
}

impl MultiViewDataset {
    /// Dataset over an index, sampling in the mode implied by its split
    pub fn new(index: DatasetIndex, n_views: usize) -> Self {
        let mode = SamplingMode::from(index.split());
        Self::from_records(index.into_records(), mode, n_views)
    }

    pub fn from_records(records: Vec<SampleRecord>, mode: SamplingMode, n_views: usize) -> Self {
        Self {
            records: records.into(),
            mode,
            view_count: ViewCount::new(n_views),
            image_size: None,
        }
    }

    /// Resize every rendering to `(width, height)` before normalising
    pub fn with_image_size(mut self, size: Option<(u32, u32)>) -> Self {
        self.image_size = size;
        self
    }

    pub fn with_mode(mut self, mode: SamplingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Share a view counter with other datasets
    pub fn with_view_count(mut self, view_count: ViewCount) -> Self {
        self.view_count = view_count;
        self
    }

    /// Keep only the first `keep` records
    pub fn truncated(self, keep: usize) -> Self {
        let keep = keep.min(self.records.len());
        Self {
            records: self.records[..keep].to_vec().into(),
            ..self
        }
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    pub fn view_counter(&self) -> &ViewCount {
        &self.view_count
    }
}

impl ViewDataset for MultiViewDataset {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn record(&self, index: usize) -> Option<&SampleRecord> {
        self.records.get(index)
    }

    fn view_count(&self) -> usize {
        self.view_count.get()
    }

    fn set_view_count(&self, count: usize) {
        self.view_count.set(count);
    }

    fn get_with_views(&self, index: usize, k: usize, rng: &mut dyn RngCore) -> Result<Sample> {
        let record = self.records.get(index).ok_or(VoxsetError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })?;
        load_sample(record, k, self.mode, self.image_size, rng)
    }
}
