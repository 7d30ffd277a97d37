// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Binvox reader and writer
//!
//! A binvox file is an ASCII header followed by run-length encoded
//! `(value, count)` byte pairs:
//!
//! ```text
//! #binvox 1
//! dim 32 32 32
//! translate 0 0 0
//! scale 1
//! data
//! ```
//!
//! The raw runs are laid out in xzy order. Reading normalises to xyz unless
//! the raw layout is requested explicitly.

use super::grid::{AxisOrder, VoxelGrid};
use crate::error::{Result, VoxsetError};
use nalgebra::Vector3;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAX_RUN: usize = 255;

struct Header {
    dims: [usize; 3],
    translate: Vector3<f32>,
    scale: f32,
}

/// Read a binvox file as an xyz grid
pub fn read_binvox(path: impl AsRef<Path>) -> Result<VoxelGrid> {
    let file = File::open(path.as_ref())?;
    decode(&mut BufReader::new(file), AxisOrder::Xyz)
}

/// Read a binvox file keeping the raw xzy layout
pub fn read_binvox_raw(path: impl AsRef<Path>) -> Result<VoxelGrid> {
    let file = File::open(path.as_ref())?;
    decode(&mut BufReader::new(file), AxisOrder::Xzy)
}

/// Write a grid as binvox
pub fn write_binvox(grid: &VoxelGrid, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode(grid, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Decode binvox bytes into a grid stored in `order`
pub fn decode<R: BufRead>(reader: &mut R, order: AxisOrder) -> Result<VoxelGrid> {
    let header = parse_header(reader)?;
    let [d0, d1, d2] = header.dims;
    let total = d0
        .checked_mul(d1)
        .and_then(|n| n.checked_mul(d2))
        .ok_or_else(|| VoxsetError::Binvox(format!("dim {:?} overflows", header.dims)))?;

    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.len() % 2 != 0 {
        return Err(VoxsetError::Binvox("truncated run-length pair".to_string()));
    }
    // each pair covers at most MAX_RUN cells
    if total > bytes.len() / 2 * MAX_RUN {
        return Err(VoxsetError::Binvox(format!(
            "{} run-length pairs cannot cover grid of {} cells",
            bytes.len() / 2,
            total
        )));
    }

    let mut raw = Vec::with_capacity(total);
    for pair in bytes.chunks_exact(2) {
        let value = pair[0] != 0;
        let count = pair[1] as usize;
        if raw.len() + count > total {
            return Err(VoxsetError::Binvox(format!(
                "run-length data overflows grid of {} cells",
                total
            )));
        }
        raw.extend(std::iter::repeat(value).take(count));
    }

    if raw.len() != total {
        return Err(VoxsetError::Binvox(format!(
            "run-length data covers {} of {} cells",
            raw.len(),
            total
        )));
    }

    match order {
        AxisOrder::Xzy => VoxelGrid::new(
            header.dims,
            header.translate,
            header.scale,
            AxisOrder::Xzy,
            raw,
        ),
        AxisOrder::Xyz => {
            // raw (x, z, y) -> stored (x, y, z)
            let (nx, nz, ny) = (d0, d1, d2);
            let mut occupancy = vec![false; total];
            for x in 0..nx {
                for z in 0..nz {
                    for y in 0..ny {
                        occupancy[(x * ny + y) * nz + z] = raw[(x * nz + z) * ny + y];
                    }
                }
            }
            VoxelGrid::new(
                [nx, ny, nz],
                header.translate,
                header.scale,
                AxisOrder::Xyz,
                occupancy,
            )
        }
    }
}

/// Encode a grid as binvox bytes
pub fn encode<W: Write>(grid: &VoxelGrid, writer: &mut W) -> Result<()> {
    let raw_dims = match grid.axis_order() {
        AxisOrder::Xzy => grid.dimensions(),
        AxisOrder::Xyz => {
            let [nx, ny, nz] = grid.dimensions();
            [nx, nz, ny]
        }
    };
    let t = grid.translation();

    writeln!(writer, "#binvox 1")?;
    writeln!(writer, "dim {} {} {}", raw_dims[0], raw_dims[1], raw_dims[2])?;
    writeln!(writer, "translate {} {} {}", t.x, t.y, t.z)?;
    writeln!(writer, "scale {}", grid.scale())?;
    writeln!(writer, "data")?;

    let mut runs = RunWriter::new(writer);
    match grid.axis_order() {
        AxisOrder::Xzy => {
            for &value in grid.occupancy() {
                runs.push(value)?;
            }
        }
        AxisOrder::Xyz => {
            let [nx, ny, nz] = grid.dimensions();
            for x in 0..nx {
                for z in 0..nz {
                    for y in 0..ny {
                        runs.push(grid.get(x, y, z))?;
                    }
                }
            }
        }
    }
    runs.finish()
}

fn parse_header<R: BufRead>(reader: &mut R) -> Result<Header> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    if !line.trim().starts_with("#binvox") {
        return Err(VoxsetError::Binvox("missing '#binvox' magic".to_string()));
    }

    let mut dims = None;
    let mut translate = Vector3::zeros();
    let mut scale = 1.0;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(VoxsetError::Binvox("header ended before 'data'".to_string()));
        }

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("data") => break,
            Some("dim") => {
                let values = parse_values::<usize>(parts, "dim")?;
                if values.iter().any(|&d| d == 0) {
                    return Err(VoxsetError::Binvox(format!("invalid dim {:?}", values)));
                }
                dims = Some(values);
            }
            Some("translate") => {
                let [x, y, z] = parse_values::<f32>(parts, "translate")?;
                translate = Vector3::new(x, y, z);
            }
            Some("scale") => {
                scale = parts
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| VoxsetError::Binvox("invalid scale".to_string()))?;
            }
            // unknown header lines are ignored
            _ => {}
        }
    }

    let dims = dims.ok_or_else(|| VoxsetError::Binvox("missing 'dim' line".to_string()))?;
    Ok(Header {
        dims,
        translate,
        scale,
    })
}

fn parse_values<'a, T: std::str::FromStr>(
    parts: impl Iterator<Item = &'a str>,
    key: &str,
) -> Result<[T; 3]> {
    let values: Vec<T> = parts
        .map(|s| s.parse::<T>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| VoxsetError::Binvox(format!("invalid '{}' line", key)))?;

    values
        .try_into()
        .map_err(|_| VoxsetError::Binvox(format!("'{}' needs three values", key)))
}

/// Accumulates runs of equal values, flushing at 255
struct RunWriter<'a, W: Write> {
    writer: &'a mut W,
    current: Option<(bool, usize)>,
}

impl<'a, W: Write> RunWriter<'a, W> {
    fn new(writer: &'a mut W) -> Self {
        Self {
            writer,
            current: None,
        }
    }

    fn push(&mut self, value: bool) -> Result<()> {
        match self.current {
            Some((v, count)) if v == value && count < MAX_RUN => {
                self.current = Some((v, count + 1));
            }
            Some((v, count)) => {
                self.writer.write_all(&[v as u8, count as u8])?;
                self.current = Some((value, 1));
            }
            None => self.current = Some((value, 1)),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        if let Some((v, count)) = self.current.take() {
            self.writer.write_all(&[v as u8, count as u8])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_bytes() -> Vec<u8> {
        let mut bytes = b"#binvox 1\ndim 2 2 2\ntranslate 0.5 -1 2\nscale 3\ndata\n".to_vec();
        // raw xzy: cells 0..3 empty, 4..7 full
        bytes.extend_from_slice(&[0, 4, 1, 4]);
        bytes
    }

    #[test]
    fn test_decode_header_and_runs() {
        let grid = decode(&mut Cursor::new(sample_bytes()), AxisOrder::Xyz).unwrap();
        assert_eq!(grid.dimensions(), [2, 2, 2]);
        assert_eq!(grid.translation(), Vector3::new(0.5, -1.0, 2.0));
        assert_eq!(grid.scale(), 3.0);
        assert_eq!(grid.occupied_count(), 4);
        // x = 1 half occupied
        assert!(grid.get(1, 0, 0) && grid.get(1, 1, 1));
        assert!(!grid.get(0, 1, 1));
    }

    #[test]
    fn test_xyz_swaps_raw_axes() {
        let mut bytes = b"#binvox 1\ndim 1 2 2\ntranslate 0 0 0\nscale 1\ndata\n".to_vec();
        // raw index (x=0, z=0, y=1) is the only occupied cell
        bytes.extend_from_slice(&[0, 1, 1, 1, 0, 2]);
        let grid = decode(&mut Cursor::new(bytes), AxisOrder::Xyz).unwrap();
        assert!(grid.get(0, 1, 0));
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn test_rejects_short_data() {
        let mut bytes = b"#binvox 1\ndim 2 2 2\ndata\n".to_vec();
        bytes.extend_from_slice(&[1, 3]);
        assert!(decode(&mut Cursor::new(bytes), AxisOrder::Xyz).is_err());
    }

    #[test]
    fn test_rejects_missing_magic() {
        let bytes = b"dim 2 2 2\ndata\n".to_vec();
        assert!(decode(&mut Cursor::new(bytes), AxisOrder::Xyz).is_err());
    }

    #[test]
    fn test_long_runs_are_split() {
        let mut grid = VoxelGrid::empty([8, 8, 8]).unwrap();
        grid.set(7, 7, 7, true);

        let mut bytes = Vec::new();
        encode(&grid, &mut bytes).unwrap();
        let data_start = bytes.windows(5).position(|w| w == b"data\n").unwrap() + 5;
        let runs = &bytes[data_start..];
        assert!(runs.chunks_exact(2).all(|pair| pair[1] as usize <= MAX_RUN));

        let decoded = decode(&mut Cursor::new(bytes), AxisOrder::Xyz).unwrap();
        assert_eq!(decoded, grid);
    }

    #[test]
    fn test_rejects_overflowing_dim() {
        let mut bytes =
            b"#binvox 1\ndim 4294967296 4294967296 4294967296\ndata\n".to_vec();
        bytes.extend_from_slice(&[0, 255]);
        let err = decode(&mut Cursor::new(bytes), AxisOrder::Xyz).unwrap_err();
        assert!(matches!(err, VoxsetError::Binvox(_)));
    }

    #[test]
    fn test_rejects_dim_larger_than_data() {
        let mut bytes = b"#binvox 1\ndim 1000000 1000000 1000000\ndata\n".to_vec();
        bytes.extend_from_slice(&[1, 255, 0, 255]);
        let err = decode(&mut Cursor::new(bytes), AxisOrder::Xzy).unwrap_err();
        assert!(matches!(err, VoxsetError::Binvox(_)));
    }
}
