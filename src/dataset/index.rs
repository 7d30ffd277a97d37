// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Building sample indexes from a taxonomy manifest and the filesystem

use super::layout::SourceLayout;
use super::record::SampleRecord;
use super::taxonomy::{load_taxonomies, DatasetSplit, Taxonomy};
use crate::error::{Result, VoxsetError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contiguous range of records belonging to one taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpan {
    pub taxonomy_id: String,
    pub taxonomy_name: String,
    pub start: usize,
    pub len: usize,
    /// Samples listed in the manifest but skipped for missing assets
    pub skipped: usize,
}

/// Ordered records of one split, grouped by taxonomy in manifest order
#[derive(Debug, Clone, Serialize)]
pub struct DatasetIndex {
    split: DatasetSplit,
    records: Vec<SampleRecord>,
    categories: Vec<CategorySpan>,
}

impl DatasetIndex {
    pub fn split(&self) -> DatasetSplit {
        self.split
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    pub fn categories(&self) -> &[CategorySpan] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SampleRecord> {
        self.records.get(index)
    }

    pub fn into_records(self) -> Vec<SampleRecord> {
        self.records
    }
}

/// Cross-references a taxonomy manifest against one source layout
#[derive(Debug, Clone)]
pub struct TaxonomyIndex {
    taxonomies: Vec<Taxonomy>,
    layout: SourceLayout,
}

impl TaxonomyIndex {
    pub fn new(taxonomies: Vec<Taxonomy>, layout: SourceLayout) -> Self {
        Self { taxonomies, layout }
    }

    /// Load the manifest; fails if it is missing or malformed
    pub fn load(manifest: impl AsRef<Path>, layout: SourceLayout) -> Result<Self> {
        Ok(Self::new(load_taxonomies(manifest)?, layout))
    }

    pub fn taxonomies(&self) -> &[Taxonomy] {
        &self.taxonomies
    }

    pub fn layout(&self) -> &SourceLayout {
        &self.layout
    }

    /// Collect every usable sample of `split`.
    ///
    /// Samples whose volume is missing, whose views are all missing, or whose
    /// id cannot fill the path templates are logged and skipped.
    pub fn collect(&self, split: DatasetSplit) -> Result<DatasetIndex> {
        let mut records = Vec::new();
        let mut categories = Vec::with_capacity(self.taxonomies.len());

        for taxonomy in &self.taxonomies {
            info!(
                "Collecting files of Taxonomy[ID={}, Name={}]",
                taxonomy.taxonomy_id, taxonomy.taxonomy_name
            );

            let start = records.len();
            let mut skipped = 0;
            for sample in taxonomy.samples(split) {
                match self.collect_sample(&taxonomy.taxonomy_id, sample) {
                    Ok(Some(record)) => records.push(record),
                    Ok(None) => skipped += 1,
                    Err(e @ VoxsetError::Template { .. }) => {
                        warn!(
                            "Ignore sample {}/{} since its paths cannot be resolved: {}",
                            taxonomy.taxonomy_id, sample, e
                        );
                        skipped += 1;
                    }
                    Err(e) => return Err(e),
                }
            }

            categories.push(CategorySpan {
                taxonomy_id: taxonomy.taxonomy_id.clone(),
                taxonomy_name: taxonomy.taxonomy_name.clone(),
                start,
                len: records.len() - start,
                skipped,
            });
        }

        info!(
            "Complete collecting files of the dataset ({} split). Total files: {}.",
            split,
            records.len()
        );

        Ok(DatasetIndex {
            split,
            records,
            categories,
        })
    }

    /// Resolve one sample, `None` when its assets are missing
    fn collect_sample(&self, taxonomy_id: &str, sample: &str) -> Result<Option<SampleRecord>> {
        let volume_path = self.layout.volume_path(taxonomy_id, sample)?;
        if !volume_path.exists() {
            warn!(
                "Ignore sample {}/{} since volume file not exists.",
                taxonomy_id, sample
            );
            return Ok(None);
        }

        // the directory listing only bounds how many view indices to probe
        let total_views = match self.layout.rendering_dir(taxonomy_id, sample)? {
            Some(dir) => std::fs::read_dir(&dir).map(|entries| entries.count()).unwrap_or(0),
            None => 0,
        };

        let mut rendering_paths = Vec::with_capacity(total_views);
        for ordinal in 0..total_views {
            let path = self.layout.rendering_path(taxonomy_id, sample, ordinal)?;
            if path.exists() {
                rendering_paths.push(path);
            }
        }

        if rendering_paths.is_empty() {
            warn!(
                "Ignore sample {}/{} since image files not exists.",
                taxonomy_id, sample
            );
            return Ok(None);
        }

        Ok(Some(SampleRecord::new(
            taxonomy_id,
            sample,
            rendering_paths,
            volume_path,
        )))
    }
}
