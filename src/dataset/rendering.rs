// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Rendering image decoding into normalised float arrays

use crate::error::{Result, VoxsetError};
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;

/// Decoded rendering as `height x width x channels` floats in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct RenderingImage {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub data: Vec<f32>,
}

impl RenderingImage {
    pub fn shape(&self) -> [usize; 3] {
        [self.height, self.width, self.channels]
    }

    /// Value at row `y`, column `x`, channel `c`
    pub fn at(&self, y: usize, x: usize, c: usize) -> f32 {
        self.data[(y * self.width + x) * self.channels + c]
    }
}

/// Decode a rendering, optionally resized to `(width, height)`.
///
/// Single-channel images have no channel axis and are rejected with the fatal
/// [`VoxsetError::MissingChannelAxis`].
pub fn load_rendering(path: &Path, resize: Option<(u32, u32)>) -> Result<RenderingImage> {
    let mut img = image::open(path)?;
    if let Some((width, height)) = resize {
        img = img.resize_exact(width, height, FilterType::CatmullRom);
    }
    to_rendering(img, path)
}

fn to_rendering(img: DynamicImage, path: &Path) -> Result<RenderingImage> {
    if img.color().channel_count() < 2 {
        log::error!(
            "It seems that there is something wrong with the image file {}",
            path.display()
        );
        return Err(VoxsetError::MissingChannelAxis(path.to_path_buf()));
    }

    let (width, height) = (img.width() as usize, img.height() as usize);
    let data: Vec<f32> = match img {
        DynamicImage::ImageLumaA8(buf) => normalize_u8(buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => normalize_u8(buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => normalize_u8(buf.into_raw()),
        DynamicImage::ImageLumaA16(buf) => normalize_u16(buf.into_raw()),
        DynamicImage::ImageRgb16(buf) => normalize_u16(buf.into_raw()),
        DynamicImage::ImageRgba16(buf) => normalize_u16(buf.into_raw()),
        DynamicImage::ImageRgb32F(buf) => buf.into_raw(),
        DynamicImage::ImageRgba32F(buf) => buf.into_raw(),
        other => other.to_rgba32f().into_raw(),
    };

    let pixels = width * height;
    let channels = if pixels == 0 { 0 } else { data.len() / pixels };

    Ok(RenderingImage {
        height,
        width,
        channels,
        data,
    })
}

fn normalize_u8(raw: Vec<u8>) -> Vec<f32> {
    raw.into_iter().map(|v| v as f32 / 255.0).collect()
}

fn normalize_u16(raw: Vec<u16>) -> Vec<f32> {
    raw.into_iter().map(|v| v as f32 / 65535.0).collect()
}
