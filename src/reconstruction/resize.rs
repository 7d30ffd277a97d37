// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Input image preparation for the pipeline

use anyhow::{Context, Result};
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the directory holding resized copies, inside the image directory
pub const RESIZED_DIR: &str = "resized";

/// PNG files directly inside `dir`, sorted by name
pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Image directory not found: {:?}", dir);
    }

    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "png"))
        .collect();

    images.sort();
    Ok(images)
}

/// Write copies of every PNG in `source` into `target`, scaled to fit inside
/// `size x size` with the aspect ratio preserved. `target` is recreated.
pub fn resize_images(source: &Path, target: &Path, size: u32) -> Result<Vec<PathBuf>> {
    let images = discover_images(source)?;

    if target.exists() {
        std::fs::remove_dir_all(target)
            .with_context(|| format!("Failed to clear {:?}", target))?;
    }
    std::fs::create_dir_all(target).with_context(|| format!("Failed to create {:?}", target))?;

    let mut written = Vec::with_capacity(images.len());
    for path in &images {
        let img = image::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let resized = img.resize(size, size, FilterType::Lanczos3);

        let Some(name) = path.file_name() else {
            continue;
        };
        let out = target.join(name);
        resized
            .save(&out)
            .with_context(|| format!("Failed to write {:?}", out))?;
        written.push(out);
    }

    log::info!(
        "Resized {} images from {:?} to fit {}x{}",
        written.len(),
        source,
        size,
        size
    );
    Ok(written)
}
