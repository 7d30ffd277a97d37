// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Configuration: dataset sources, evaluation and reconstruction settings

use crate::dataset::{SourceLayout, ViewIndexing};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const CONFIG_FILE: &str = "voxset.toml";

/// Which dataset the loader builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetKind {
    ShapeNet,
    Mvs,
    /// MVS followed by ratio-truncated ShapeNet
    Mixed,
}

impl DatasetKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "shapenet" => Some(DatasetKind::ShapeNet),
            "mvs" => Some(DatasetKind::Mvs),
            "mixed" => Some(DatasetKind::Mixed),
            _ => None,
        }
    }
}

/// One source dataset on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Taxonomy manifest (JSON)
    pub taxonomy_file: PathBuf,
    /// Rendering path template
    pub rendering_template: String,
    /// Volume path template
    pub volume_template: String,
    pub view_indexing: ViewIndexing,
    /// Resize renderings to `[width, height]`
    #[serde(default)]
    pub image_size: Option<[u32; 2]>,
}

impl SourceConfig {
    pub fn layout(&self) -> Result<SourceLayout> {
        SourceLayout::from_templates(
            &self.rendering_template,
            &self.volume_template,
            self.view_indexing,
        )
        .context("Invalid path template in source config")
    }

    pub fn resize(&self) -> Option<(u32, u32)> {
        self.image_size.map(|[w, h]| (w, h))
    }
}

/// Voxel evaluation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Shift-search radius in cells
    pub max_shift: u32,
    /// Binarisation thresholds for prediction IoU
    pub iou_thresholds: Vec<f32>,
    /// Resolution used when voxelising reconstructed point clouds
    pub voxel_dim: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_shift: 10,
            iou_thresholds: vec![0.2, 0.3, 0.4, 0.5],
            voxel_dim: 32,
        }
    }
}

/// External photogrammetry pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    /// Container image running the pipeline
    pub image: String,
    /// Host directory mounted at `/data`
    pub data_dir: PathBuf,
    /// MVS dataset root, relative to `data_dir`
    pub mvs_dir: PathBuf,
    /// Focal length passed to the pipeline
    pub focal_length: u32,
    /// Flags appended after the standard pipeline arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Resize inputs to fit this square size before reconstruction
    #[serde(default)]
    pub resize: Option<u32>,
    /// Reconstruction output of one sample, used by the per-taxonomy evaluation
    pub result_template: String,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            image: "spedenaave/dpg".to_string(),
            data_dir: PathBuf::from("data"),
            mvs_dir: PathBuf::from("mvs_dataset"),
            focal_length: 1920,
            extra_args: Vec::new(),
            resize: None,
            result_template: "datasets/ShapeNet/results/sfm/{taxonomy}/{sample}".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoxsetConfig {
    pub dataset: DatasetKind,
    /// Views requested per access
    pub n_views: usize,
    /// ShapeNet subsampling ratio used by the mixed dataset
    pub shapenet_ratio: f64,
    /// Output directory for reports
    pub output_dir: PathBuf,
    pub shapenet: SourceConfig,
    pub mvs: SourceConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub reconstruction: ReconstructionConfig,
}

impl Default for VoxsetConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetKind::ShapeNet,
            n_views: 1,
            shapenet_ratio: 1.0,
            output_dir: PathBuf::from("output"),
            shapenet: SourceConfig {
                taxonomy_file: PathBuf::from("datasets/ShapeNet.json"),
                rendering_template:
                    "datasets/ShapeNet/ShapeNetRendering/{taxonomy}/{sample}/rendering/{view:02}.png"
                        .to_string(),
                volume_template: "datasets/ShapeNet/ShapeNetVox32/{taxonomy}/{sample}/model.binvox"
                    .to_string(),
                view_indexing: ViewIndexing::ZeroBased,
                image_size: None,
            },
            mvs: SourceConfig {
                taxonomy_file: PathBuf::from("datasets/MVS.json"),
                rendering_template: "datasets/mvs_dataset/images/scan{number}/clean_{view:03}_max.png"
                    .to_string(),
                volume_template: "datasets/mvs_dataset/voxels/stl{number:03}_total.binvox"
                    .to_string(),
                view_indexing: ViewIndexing::OneBased,
                image_size: Some([224, 224]),
            },
            evaluation: EvaluationConfig::default(),
            reconstruction: ReconstructionConfig::default(),
        }
    }
}

impl VoxsetConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: VoxsetConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `path`, or `voxset.toml` if present, or defaults; then apply
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(CONFIG_FILE)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(n_views) = std::env::var("VOXSET_N_VIEWS") {
            if let Ok(n_views) = n_views.parse() {
                self.n_views = n_views;
            }
        }

        if let Ok(max_shift) = std::env::var("VOXSET_MAX_SHIFT") {
            if let Ok(max_shift) = max_shift.parse() {
                self.evaluation.max_shift = max_shift;
            }
        }

        if let Ok(output_dir) = std::env::var("VOXSET_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(output_dir);
        }

        if let Ok(data_dir) = std::env::var("VOXSET_DATA_DIR") {
            self.reconstruction.data_dir = PathBuf::from(data_dir);
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
