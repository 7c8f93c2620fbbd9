//! Baked mesh format (.mesh)
//!
//! Payload is the vertex buffer immediately followed by the index buffer,
//! compressed together as one unit. Readers slice the decompressed bytes at
//! `vertex_buffer_size`.
//!
//! # Metadata keys
//! ```text
//! vertex_format, vertex_format_enum_val, vertex_buffer_size, index_buffer_size,
//! index_size, original_file, bound, compression_mode, compression_mode_enum_val
//! ```
//!
//! `bound` is `[origin.x, origin.y, origin.z, radius, extents.x, extents.y, extents.z]`.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::metadata::{MetadataEnum, from_metadata, resolve_enum, to_metadata};
use super::{BAKED_FORMAT, FormatError, expect_tag};
use crate::compression::{CompressionMode, compress, decompress};
use crate::container::AssetContainer;

/// Vertex layouts a baked mesh can carry.
///
/// Every layout starts with an f32x3 position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum VertexFormat {
    #[default]
    Unknown = 0,
    /// Position, normal, color as f32x3, uv as f32x2 (44 bytes)
    PncvF32 = 1,
    /// Position f32x3, normal unorm8x3, color unorm8x3, uv f32x2 (28 bytes)
    P32N8C8V16 = 2,
}

impl VertexFormat {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::PncvF32 => "PNCV_F32",
            Self::P32N8C8V16 => "P32N8C8V16",
        }
    }

    pub const fn value(self) -> u32 {
        self as u32
    }

    /// Bytes per vertex, `None` for [`VertexFormat::Unknown`].
    pub const fn stride(self) -> Option<usize> {
        match self {
            Self::Unknown => None,
            Self::PncvF32 => Some(size_of::<VertexPncvF32>()),
            Self::P32N8C8V16 => Some(size_of::<VertexP32N8C8V16>()),
        }
    }

    /// Parse a format name as written in metadata or config files.
    pub fn parse(name: &str) -> Option<Self> {
        <Self as MetadataEnum>::from_name(name)
    }
}

impl MetadataEnum for VertexFormat {
    const KIND: &'static str = "vertex format";

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Unknown" => Some(Self::Unknown),
            "PNCV_F32" => Some(Self::PncvF32),
            "P32N8C8V16" => Some(Self::P32N8C8V16),
            _ => None,
        }
    }

    fn from_value(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            1 => Some(Self::PncvF32),
            2 => Some(Self::P32N8C8V16),
            _ => None,
        }
    }
}

/// Full-precision vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct VertexPncvF32 {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

/// Compact vertex with quantized normal and color.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct VertexP32N8C8V16 {
    pub position: [f32; 3],
    pub normal: [u8; 3],
    pub color: [u8; 3],
    pub _padding: [u8; 2],
    pub uv: [f32; 2],
}

impl VertexP32N8C8V16 {
    /// Quantize a full-precision vertex. Normal and color map [-1, 1] to [0, 255].
    pub fn from_pncv(v: &VertexPncvF32) -> Self {
        Self {
            position: v.position,
            normal: v.normal.map(quantize_snorm),
            color: v.color.map(quantize_snorm),
            _padding: [0; 2],
            uv: v.uv,
        }
    }
}

fn quantize_snorm(value: f32) -> u8 {
    ((value * 0.5 + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Axis-aligned box plus bounding sphere, both centered at `origin`.
///
/// The sphere radius is the exact maximum distance from `origin` to any
/// vertex; it is not derived from the box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeshBounds {
    pub origin: [f32; 3],
    pub radius: f32,
    pub extents: [f32; 3],
}

impl MeshBounds {
    pub fn to_array(&self) -> [f32; 7] {
        [
            self.origin[0],
            self.origin[1],
            self.origin[2],
            self.radius,
            self.extents[0],
            self.extents[1],
            self.extents[2],
        ]
    }

    pub fn from_array(a: [f32; 7]) -> Self {
        Self {
            origin: [a[0], a[1], a[2]],
            radius: a[3],
            extents: [a[4], a[5], a[6]],
        }
    }
}

/// Compute bounds from vertex positions.
///
/// First pass finds the axis-aligned min/max, second pass scans the true
/// distance of every point from the box center.
pub fn calculate_bounds(positions: &[[f32; 3]]) -> MeshBounds {
    if positions.is_empty() {
        return MeshBounds::default();
    }

    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for p in positions {
        let p = Vec3::from_array(*p);
        min = min.min(p);
        max = max.max(p);
    }

    let origin = (max + min) * 0.5;
    let extents = (max - min) * 0.5;

    let mut radius_sq = 0.0f32;
    for p in positions {
        radius_sq = radius_sq.max(Vec3::from_array(*p).distance_squared(origin));
    }

    MeshBounds {
        origin: origin.to_array(),
        radius: radius_sq.sqrt(),
        extents: extents.to_array(),
    }
}

/// Read the leading f32x3 position of each vertex in a raw vertex buffer.
pub fn read_positions(
    format: VertexFormat,
    vertex_bytes: &[u8],
) -> Result<Vec<[f32; 3]>, FormatError> {
    let stride = format
        .stride()
        .ok_or(FormatError::UnknownVertexLayout(format))?;
    if vertex_bytes.len() % stride != 0 {
        return Err(FormatError::VertexSizeMismatch {
            len: vertex_bytes.len(),
            stride,
        });
    }

    Ok(vertex_bytes
        .chunks_exact(stride)
        .map(|vertex| bytemuck::pod_read_unaligned::<[f32; 3]>(&vertex[0..12]))
        .collect())
}

/// Decoded mesh metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInfo {
    pub original_file: String,
    pub vertex_format: VertexFormat,
    pub vertex_buffer_size: u64,
    pub index_buffer_size: u64,
    /// Bytes per index element
    pub index_size: u8,
    pub bounds: MeshBounds,
    pub compression_mode: CompressionMode,
}

#[derive(Serialize, Deserialize)]
struct MeshMetadata {
    vertex_format: String,
    vertex_format_enum_val: u32,
    vertex_buffer_size: u64,
    index_buffer_size: u64,
    index_size: u8,
    original_file: String,
    bound: [f32; 7],
    compression_mode: String,
    compression_mode_enum_val: u32,
}

/// Pack vertex and index buffers into a mesh container.
pub fn pack_mesh(
    vertex_format: VertexFormat,
    vertex_bytes: &[u8],
    index_bytes: &[u8],
    index_size: u8,
    original_file: &str,
) -> Result<AssetContainer, FormatError> {
    if !matches!(index_size, 1 | 2 | 4) {
        return Err(FormatError::InvalidIndexSize(index_size));
    }
    if index_bytes.len() % index_size as usize != 0 {
        return Err(FormatError::IndexSizeMismatch {
            len: index_bytes.len(),
            index_size,
        });
    }

    let bounds = calculate_bounds(&read_positions(vertex_format, vertex_bytes)?);

    let mut merged = Vec::with_capacity(vertex_bytes.len() + index_bytes.len());
    merged.extend_from_slice(vertex_bytes);
    merged.extend_from_slice(index_bytes);
    let compressed = compress(&merged);

    let metadata = MeshMetadata {
        vertex_format: vertex_format.name().to_string(),
        vertex_format_enum_val: vertex_format.value(),
        vertex_buffer_size: vertex_bytes.len() as u64,
        index_buffer_size: index_bytes.len() as u64,
        index_size,
        original_file: original_file.to_string(),
        bound: bounds.to_array(),
        compression_mode: compressed.mode.name().to_string(),
        compression_mode_enum_val: compressed.mode.value(),
    };

    Ok(AssetContainer::new(
        BAKED_FORMAT.mesh_tag,
        to_metadata(&metadata)?,
        compressed.bytes,
    ))
}

/// Parse mesh metadata from a container.
pub fn read_mesh_info(container: &AssetContainer) -> Result<MeshInfo, FormatError> {
    expect_tag(BAKED_FORMAT.mesh_tag, container.tag)?;
    let metadata: MeshMetadata = from_metadata(&container.metadata)?;

    Ok(MeshInfo {
        vertex_format: resolve_enum(&metadata.vertex_format, metadata.vertex_format_enum_val)?,
        compression_mode: resolve_enum(
            &metadata.compression_mode,
            metadata.compression_mode_enum_val,
        )?,
        original_file: metadata.original_file,
        vertex_buffer_size: metadata.vertex_buffer_size,
        index_buffer_size: metadata.index_buffer_size,
        index_size: metadata.index_size,
        bounds: MeshBounds::from_array(metadata.bound),
    })
}

/// Decompress a mesh payload and split it into caller-provided buffers.
///
/// `vertex_destination` and `index_destination` must be exactly
/// `vertex_buffer_size` and `index_buffer_size` bytes.
pub fn unpack_mesh(
    info: &MeshInfo,
    source: &[u8],
    vertex_destination: &mut [u8],
    index_destination: &mut [u8],
) -> Result<(), FormatError> {
    if vertex_destination.len() as u64 != info.vertex_buffer_size {
        return Err(FormatError::DestinationSize {
            what: "vertex",
            expected: info.vertex_buffer_size,
            actual: vertex_destination.len(),
        });
    }
    if index_destination.len() as u64 != info.index_buffer_size {
        return Err(FormatError::DestinationSize {
            what: "index",
            expected: info.index_buffer_size,
            actual: index_destination.len(),
        });
    }

    let total = (info.vertex_buffer_size + info.index_buffer_size) as usize;
    let merged = decompress(source, info.compression_mode, total)?;

    let (vertices, indices) = merged.split_at(vertex_destination.len());
    vertex_destination.copy_from_slice(vertices);
    index_destination.copy_from_slice(indices);
    Ok(())
}
