// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Builds datasets from configuration

use super::composer::ComposedDataset;
use super::index::{DatasetIndex, TaxonomyIndex};
use super::sampling::{MultiViewDataset, ViewDataset};
use super::taxonomy::DatasetSplit;
use crate::config::{DatasetKind, SourceConfig, VoxsetConfig};
use anyhow::{Context, Result};

/// Index one configured source for `split`
pub fn collect_source(source: &SourceConfig, split: DatasetSplit) -> Result<DatasetIndex> {
    let index = TaxonomyIndex::load(&source.taxonomy_file, source.layout()?)
        .with_context(|| format!("Failed to load taxonomy {:?}", source.taxonomy_file))?;
    Ok(index.collect(split)?)
}

/// Build the dataset of one configured source
pub fn build_source(
    source: &SourceConfig,
    split: DatasetSplit,
    n_views: usize,
) -> Result<MultiViewDataset> {
    let index = collect_source(source, split)?;
    Ok(MultiViewDataset::new(index, n_views).with_image_size(source.resize()))
}

/// Build the dataset selected by `config.dataset`
pub fn build_dataset(config: &VoxsetConfig, split: DatasetSplit) -> Result<Box<dyn ViewDataset>> {
    let dataset: Box<dyn ViewDataset> = match config.dataset {
        DatasetKind::ShapeNet => Box::new(build_source(&config.shapenet, split, config.n_views)?),
        DatasetKind::Mvs => Box::new(build_source(&config.mvs, split, config.n_views)?),
        DatasetKind::Mixed => {
            let shapenet = build_source(&config.shapenet, split, config.n_views)?;
            let mvs = build_source(&config.mvs, split, config.n_views)?;
            Box::new(ComposedDataset::new(mvs, shapenet, config.shapenet_ratio)?)
        }
    };
    Ok(dataset)
}
