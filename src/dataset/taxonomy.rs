// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Taxonomy manifest loading

use crate::error::{Result, VoxsetError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Dataset partition selected from the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSplit {
    Train,
    Test,
    Val,
}

impl DatasetSplit {
    pub const ALL: [DatasetSplit; 3] = [DatasetSplit::Train, DatasetSplit::Test, DatasetSplit::Val];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetSplit::Train => "train",
            DatasetSplit::Test => "test",
            DatasetSplit::Val => "val",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "train" => Some(DatasetSplit::Train),
            "test" => Some(DatasetSplit::Test),
            "val" | "validation" => Some(DatasetSplit::Val),
            _ => None,
        }
    }
}

impl fmt::Display for DatasetSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One category of the manifest with its per-split sample ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxonomy {
    pub taxonomy_id: String,
    pub taxonomy_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<serde_json::Value>,
    #[serde(default)]
    pub train: Vec<String>,
    #[serde(default)]
    pub test: Vec<String>,
    #[serde(default)]
    pub val: Vec<String>,
}

impl Taxonomy {
    /// Sample ids of a split, in manifest order
    pub fn samples(&self, split: DatasetSplit) -> &[String] {
        match split {
            DatasetSplit::Train => &self.train,
            DatasetSplit::Test => &self.test,
            DatasetSplit::Val => &self.val,
        }
    }
}

/// Load a taxonomy manifest. A missing file is fatal.
pub fn load_taxonomies(path: impl AsRef<Path>) -> Result<Vec<Taxonomy>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(VoxsetError::ManifestNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    parse_taxonomies(&content).map_err(|source| VoxsetError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse manifest JSON, tolerating `//` line comments
pub fn parse_taxonomies(content: &str) -> std::result::Result<Vec<Taxonomy>, serde_json::Error> {
    let stripped: String = content
        .lines()
        .map(strip_line_comment)
        .collect::<Vec<_>>()
        .join("\n");
    serde_json::from_str(&stripped)
}

/// Drop a trailing `//` comment that is not inside a string literal
fn strip_line_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut escaped = false;

    for i in 0..bytes.len() {
        let c = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if c == b'\\' {
                escaped = true;
            } else if c == b'"' {
                in_string = false;
            }
        } else if c == b'"' {
            in_string = true;
        } else if c == b'/' && bytes.get(i + 1) == Some(&b'/') {
            return &line[..i];
        }
    }
    line
}
