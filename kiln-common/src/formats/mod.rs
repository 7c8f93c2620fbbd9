//! Per-type baked asset formats
//!
//! Each asset type defines a JSON metadata schema and a payload layout on top
//! of the generic [`AssetContainer`](crate::AssetContainer). Metadata key
//! names are part of the on-disk contract and must not change.
//!
//! Format constants (type tags, file extensions) live in [`BAKED_FORMAT`].

pub mod material;
mod metadata;
pub mod mesh;
pub mod prefab;
pub mod texture;

pub use material::*;
pub use mesh::*;
pub use prefab::*;
pub use texture::*;

use crate::compression::CompressionError;
use crate::container::AssetTag;

/// Baked format constants.
///
/// Single source of truth for type tags and file extensions.
#[derive(Debug, Clone, Copy)]
pub struct BakedFormat {
    pub texture_tag: AssetTag,
    pub mesh_tag: AssetTag,
    pub material_tag: AssetTag,
    pub prefab_tag: AssetTag,

    /// Texture file extension without dot
    pub texture_ext: &'static str,
    /// Mesh file extension without dot
    pub mesh_ext: &'static str,
    /// Material file extension without dot
    pub material_ext: &'static str,
    /// Prefab file extension without dot
    pub prefab_ext: &'static str,
}

pub const BAKED_FORMAT: BakedFormat = BakedFormat {
    texture_tag: AssetTag::new(b"TEXI"),
    mesh_tag: AssetTag::new(b"MESH"),
    material_tag: AssetTag::new(b"MATX"),
    prefab_tag: AssetTag::new(b"PRFB"),
    texture_ext: "tx",
    mesh_ext: "mesh",
    material_ext: "mat",
    prefab_ext: "pfb",
};

/// Errors produced while packing or unpacking typed assets.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("unexpected container tag {actual}, expected {expected}")]
    UnexpectedTag { expected: AssetTag, actual: AssetTag },

    #[error("malformed metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("unknown {kind} (name {name:?}, value {value})")]
    UnknownEnum {
        kind: &'static str,
        name: String,
        value: u32,
    },

    #[error("texture format {0:?} cannot be packed")]
    UnsupportedTextureFormat(TextureFormat),

    #[error("pixel buffer is {actual} bytes, expected {expected} for {width}x{height}")]
    PixelSizeMismatch {
        width: u32,
        height: u32,
        expected: u64,
        actual: usize,
    },

    #[error("vertex format {0:?} has no known layout")]
    UnknownVertexLayout(VertexFormat),

    #[error("vertex buffer of {len} bytes is not a multiple of the {stride}-byte stride")]
    VertexSizeMismatch { len: usize, stride: usize },

    #[error("invalid index element size {0} (expected 1, 2 or 4)")]
    InvalidIndexSize(u8),

    #[error("index buffer of {len} bytes is not a multiple of the {index_size}-byte element")]
    IndexSizeMismatch { len: usize, index_size: u8 },

    #[error("{what} destination is {actual} bytes, expected {expected}")]
    DestinationSize {
        what: &'static str,
        expected: u64,
        actual: usize,
    },

    #[error("payload is {actual} bytes, metadata declares {expected}")]
    PayloadSize { expected: u64, actual: usize },

    #[error("invalid prefab: {0}")]
    InvalidPrefab(String),

    #[error(transparent)]
    Compression(#[from] CompressionError),
}

/// Verify a container carries the expected tag before interpreting it.
pub(crate) fn expect_tag(expected: AssetTag, actual: AssetTag) -> Result<(), FormatError> {
    if expected != actual {
        return Err(FormatError::UnexpectedTag { expected, actual });
    }
    Ok(())
}
