// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Indexed sample records

use serde::Serialize;
use std::path::{Path, PathBuf};

/// One object instance: its renderings and ground-truth volume.
///
/// Built only by the index, which guarantees at least one rendering and that
/// every path existed at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRecord {
    taxonomy_id: String,
    sample_id: String,
    rendering_paths: Vec<PathBuf>,
    volume_path: PathBuf,
}

impl SampleRecord {
    pub(crate) fn new(
        taxonomy_id: impl Into<String>,
        sample_id: impl Into<String>,
        rendering_paths: Vec<PathBuf>,
        volume_path: PathBuf,
    ) -> Self {
        debug_assert!(!rendering_paths.is_empty());
        Self {
            taxonomy_id: taxonomy_id.into(),
            sample_id: sample_id.into(),
            rendering_paths,
            volume_path,
        }
    }

    pub fn taxonomy_id(&self) -> &str {
        &self.taxonomy_id
    }

    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn rendering_paths(&self) -> &[PathBuf] {
        &self.rendering_paths
    }

    pub fn volume_path(&self) -> &Path {
        &self.volume_path
    }

    pub fn view_count(&self) -> usize {
        self.rendering_paths.len()
    }
}
