// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Point cloud loading and voxelisation of reconstruction output

use super::grid::VoxelGrid;
use crate::error::{Result, VoxsetError};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl ScalarType {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "char" | "int8" => Ok(ScalarType::Int8),
            "uchar" | "uint8" => Ok(ScalarType::UInt8),
            "short" | "int16" => Ok(ScalarType::Int16),
            "ushort" | "uint16" => Ok(ScalarType::UInt16),
            "int" | "int32" => Ok(ScalarType::Int32),
            "uint" | "uint32" => Ok(ScalarType::UInt32),
            "float" | "float32" => Ok(ScalarType::Float32),
            "double" | "float64" => Ok(ScalarType::Float64),
            other => Err(VoxsetError::Ply(format!("unsupported property type '{}'", other))),
        }
    }

    fn size(&self) -> usize {
        match self {
            ScalarType::Int8 | ScalarType::UInt8 => 1,
            ScalarType::Int16 | ScalarType::UInt16 => 2,
            ScalarType::Int32 | ScalarType::UInt32 | ScalarType::Float32 => 4,
            ScalarType::Float64 => 8,
        }
    }

    fn read_le(&self, bytes: &[u8]) -> f64 {
        let word = |b: &[u8]| [b[0], b[1], b[2], b[3]];
        match self {
            ScalarType::Int8 => bytes[0] as i8 as f64,
            ScalarType::UInt8 => bytes[0] as f64,
            ScalarType::Int16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            ScalarType::UInt16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            ScalarType::Int32 => i32::from_le_bytes(word(bytes)) as f64,
            ScalarType::UInt32 => u32::from_le_bytes(word(bytes)) as f64,
            ScalarType::Float32 => f32::from_le_bytes(word(bytes)) as f64,
            ScalarType::Float64 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&bytes[..8]);
                f64::from_le_bytes(buf)
            }
        }
    }
}

struct PlyHeader {
    format: PlyFormat,
    vertex_count: usize,
    properties: Vec<(String, ScalarType)>,
}

impl PlyHeader {
    fn position_of(&self, name: &str) -> Result<usize> {
        self.properties
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| VoxsetError::Ply(format!("vertex property '{}' missing", name)))
    }
}

fn parse_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader> {
    let mut line = String::new();
    let mut format = None;
    let mut vertex_count = None;
    let mut properties = Vec::new();
    let mut in_vertex = false;
    let mut is_ply = false;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(VoxsetError::Ply("header ended before 'end_header'".to_string()));
        }
        let trimmed = line.trim();

        if trimmed == "ply" {
            is_ply = true;
            continue;
        }
        if trimmed == "end_header" {
            break;
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        match parts.as_slice() {
            ["format", "ascii", ..] => format = Some(PlyFormat::Ascii),
            ["format", "binary_little_endian", ..] => format = Some(PlyFormat::BinaryLittleEndian),
            ["format", other, ..] => {
                return Err(VoxsetError::Ply(format!("unsupported format '{}'", other)))
            }
            ["element", "vertex", count] => {
                in_vertex = true;
                vertex_count = Some(
                    count
                        .parse()
                        .map_err(|_| VoxsetError::Ply("invalid vertex count".to_string()))?,
                );
            }
            ["element", ..] => in_vertex = false,
            ["property", "list", ..] if in_vertex => {
                return Err(VoxsetError::Ply("list properties on vertices".to_string()))
            }
            ["property", ty, name] if in_vertex => {
                properties.push((name.to_string(), ScalarType::parse(ty)?));
            }
            _ => {}
        }
    }

    if !is_ply {
        return Err(VoxsetError::Ply("missing 'ply' magic".to_string()));
    }

    Ok(PlyHeader {
        format: format.ok_or_else(|| VoxsetError::Ply("missing format line".to_string()))?,
        vertex_count: vertex_count
            .ok_or_else(|| VoxsetError::Ply("missing vertex element".to_string()))?,
        properties,
    })
}

const MAX_PREALLOCATED_VERTICES: usize = 1 << 20;

/// Read the vertex positions of a PLY file
pub fn read_ply_points(path: impl AsRef<Path>) -> Result<Vec<Point3<f32>>> {
    let file = File::open(path.as_ref())?;
    parse_points(&mut BufReader::new(file))
}

fn parse_points<R: BufRead>(reader: &mut R) -> Result<Vec<Point3<f32>>> {
    let header = parse_header(reader)?;
    let axes = [
        header.position_of("x")?,
        header.position_of("y")?,
        header.position_of("z")?,
    ];
    // the header count is untrusted until the vertices are actually read
    let mut points = Vec::with_capacity(header.vertex_count.min(MAX_PREALLOCATED_VERTICES));

    match header.format {
        PlyFormat::Ascii => {
            let mut line = String::new();
            while points.len() < header.vertex_count {
                line.clear();
                if reader.read_line(&mut line)? == 0 {
                    return Err(VoxsetError::Ply("unexpected end of vertex data".to_string()));
                }
                let values: Vec<f64> = line
                    .split_whitespace()
                    .map(|v| v.parse::<f64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|_| VoxsetError::Ply("invalid ascii vertex".to_string()))?;
                if values.len() < header.properties.len() {
                    return Err(VoxsetError::Ply("short ascii vertex".to_string()));
                }
                points.push(Point3::new(
                    values[axes[0]] as f32,
                    values[axes[1]] as f32,
                    values[axes[2]] as f32,
                ));
            }
        }
        PlyFormat::BinaryLittleEndian => {
            let offsets: Vec<usize> = header
                .properties
                .iter()
                .scan(0, |offset, (_, ty)| {
                    let current = *offset;
                    *offset += ty.size();
                    Some(current)
                })
                .collect();
            let stride: usize = header.properties.iter().map(|(_, ty)| ty.size()).sum();
            let mut buffer = vec![0u8; stride];

            for _ in 0..header.vertex_count {
                reader.read_exact(&mut buffer)?;
                let coord = |axis: usize| {
                    let idx = axes[axis];
                    header.properties[idx].1.read_le(&buffer[offsets[idx]..]) as f32
                };
                points.push(Point3::new(coord(0), coord(1), coord(2)));
            }
        }
    }

    Ok(points)
}

/// Voxelise points into a `dim^3` xyz grid spanning their cubic bounding box
pub fn voxelize_points(points: &[Point3<f32>], dim: usize) -> Result<VoxelGrid> {
    let mut grid = VoxelGrid::empty([dim, dim, dim])?;
    if points.is_empty() {
        return Ok(grid);
    }

    let mut min = points[0].coords;
    let mut max = points[0].coords;
    for p in points {
        min = min.inf(&p.coords);
        max = max.sup(&p.coords);
    }

    // regular bounding box: every axis spans the largest extent, centred on the cloud
    let extent = (max - min).max();
    let center = (min + max) / 2.0;
    let origin = center - Vector3::repeat(extent / 2.0);

    for p in points {
        let cell = |axis: usize| -> usize {
            if extent <= 0.0 {
                return 0;
            }
            let t = (p.coords[axis] - origin[axis]) / extent;
            ((t * dim as f32).floor().max(0.0) as usize).min(dim - 1)
        };
        grid.set(cell(0), cell(1), cell(2), true);
    }

    Ok(grid)
}

/// Read a PLY point cloud and voxelise it
pub fn ply_to_grid(path: impl AsRef<Path>, dim: usize) -> Result<VoxelGrid> {
    let points = read_ply_points(path)?;
    log::debug!("voxelising {} points into {}^3 grid", points.len(), dim);
    voxelize_points(&points, dim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::AxisOrder;
    use std::io::Cursor;

    #[test]
    fn test_parse_ascii_points() {
        let text = "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nproperty uchar red\nend_header\n1 2 3 255\n-1 0.5 4 0\n";
        let points = parse_points(&mut Cursor::new(text.as_bytes())).unwrap();
        assert_eq!(points, vec![Point3::new(1.0, 2.0, 3.0), Point3::new(-1.0, 0.5, 4.0)]);
    }

    #[test]
    fn test_parse_binary_points_with_extra_properties() {
        let header = "ply\nformat binary_little_endian 1.0\nelement vertex 1\nproperty uchar red\nproperty float x\nproperty float y\nproperty double z\nend_header\n";
        let mut bytes = header.as_bytes().to_vec();
        bytes.push(7);
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-2.0f32).to_le_bytes());
        bytes.extend_from_slice(&3.25f64.to_le_bytes());

        let points = parse_points(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(points, vec![Point3::new(1.5, -2.0, 3.25)]);
    }

    #[test]
    fn test_rejects_big_endian() {
        let text = "ply\nformat binary_big_endian 1.0\nelement vertex 0\nend_header\n";
        assert!(parse_points(&mut Cursor::new(text.as_bytes())).is_err());
    }

    #[test]
    fn test_voxelize_corners() {
        let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)];
        let grid = voxelize_points(&points, 4).unwrap();
        assert_eq!(grid.occupied_count(), 2);
        assert!(grid.get(0, 0, 0));
        assert!(grid.get(3, 3, 3));
        assert_eq!(grid.axis_order(), AxisOrder::Xyz);
    }

    #[test]
    fn test_voxelize_flat_cloud_is_centred() {
        // zero extent on z: points land in the middle slab
        let points = vec![Point3::new(0.0, 0.0, 5.0), Point3::new(2.0, 2.0, 5.0)];
        let grid = voxelize_points(&points, 4).unwrap();
        assert!(grid.get(0, 0, 2));
        assert!(grid.get(3, 3, 2));
    }

    #[test]
    fn test_oversized_vertex_count_is_an_error() {
        let text = "ply\nformat ascii 1.0\nelement vertex 1000000000000000000\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n";
        let err = parse_points(&mut Cursor::new(text.as_bytes())).unwrap_err();
        assert!(matches!(err, VoxsetError::Ply(_)));

        let header = "ply\nformat binary_little_endian 1.0\nelement vertex 1000000000000000000\nproperty float x\nproperty float y\nproperty float z\nend_header\n";
        let mut bytes = header.as_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 12]);
        assert!(parse_points(&mut Cursor::new(bytes)).is_err());
    }
}
