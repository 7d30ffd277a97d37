// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-taxonomy IoU accumulation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// IoUs collected for one taxonomy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyIou {
    pub n_samples: usize,
    pub iou: Vec<f64>,
}

impl TaxonomyIou {
    pub fn mean(&self) -> Option<f64> {
        if self.iou.is_empty() {
            None
        } else {
            Some(self.iou.iter().sum::<f64>() / self.iou.len() as f64)
        }
    }
}

/// IoU per taxonomy id, ordered by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxonomyIouTable {
    entries: BTreeMap<String, TaxonomyIou>,
}

impl TaxonomyIouTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, taxonomy_id: &str, iou: f64) {
        let entry = self.entries.entry(taxonomy_id.to_string()).or_default();
        entry.n_samples += 1;
        entry.iou.push(iou);
    }

    pub fn get(&self, taxonomy_id: &str) -> Option<&TaxonomyIou> {
        self.entries.get(taxonomy_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaxonomyIou)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mean over every recorded sample, regardless of taxonomy
    pub fn overall_mean(&self) -> Option<f64> {
        let (sum, count) = self
            .entries
            .values()
            .flat_map(|entry| entry.iou.iter())
            .fold((0.0, 0usize), |(sum, count), &iou| (sum + iou, count + 1));
        (count > 0).then(|| sum / count as f64)
    }
}
