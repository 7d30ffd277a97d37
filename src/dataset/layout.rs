// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-source file layout conventions

use super::template::PathTemplate;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How rendering views are numbered on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewIndexing {
    /// Views `0..count`, e.g. ShapeNet renderings `00.png`..`23.png`
    ZeroBased,
    /// Views `1..=count`, e.g. MVS scans `clean_001_max.png`..
    OneBased,
}

impl ViewIndexing {
    /// View index used to locate the rendering directory
    pub fn first(&self) -> usize {
        match self {
            ViewIndexing::ZeroBased => 0,
            ViewIndexing::OneBased => 1,
        }
    }

    /// On-disk view index of the `ordinal`-th candidate
    pub fn view_index(&self, ordinal: usize) -> usize {
        ordinal + self.first()
    }
}

/// Where a source keeps its renderings and volumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLayout {
    pub rendering: PathTemplate,
    pub volume: PathTemplate,
    pub view_indexing: ViewIndexing,
}

impl SourceLayout {
    pub fn new(rendering: PathTemplate, volume: PathTemplate, view_indexing: ViewIndexing) -> Self {
        Self {
            rendering,
            volume,
            view_indexing,
        }
    }

    /// Parse both templates
    pub fn from_templates(
        rendering: &str,
        volume: &str,
        view_indexing: ViewIndexing,
    ) -> Result<Self> {
        Ok(Self::new(
            PathTemplate::parse(rendering)?,
            PathTemplate::parse(volume)?,
            view_indexing,
        ))
    }

    pub fn volume_path(&self, taxonomy: &str, sample: &str) -> Result<PathBuf> {
        self.volume.render(taxonomy, sample, None)
    }

    /// Path of the `ordinal`-th candidate view
    pub fn rendering_path(&self, taxonomy: &str, sample: &str, ordinal: usize) -> Result<PathBuf> {
        self.rendering
            .render(taxonomy, sample, Some(self.view_indexing.view_index(ordinal)))
    }

    /// Directory probed to bound the number of views
    pub fn rendering_dir(&self, taxonomy: &str, sample: &str) -> Result<Option<PathBuf>> {
        let probe = self
            .rendering
            .render(taxonomy, sample, Some(self.view_indexing.first()))?;
        Ok(probe.parent().map(|p| p.to_path_buf()))
    }
}
