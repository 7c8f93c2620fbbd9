//! Baked texture format (.tx)
//!
//! Payload is a single RGBA8 row-major pixel buffer (no mips), compressed as
//! one unit when that pays off.
//!
//! # Metadata keys
//! ```text
//! texture_format, texture_format_enum_val, texture_size, original_file,
//! compression_mode, compression_mode_enum_val, width, height, compressed_size
//! ```

use serde::{Deserialize, Serialize};

use super::metadata::{MetadataEnum, from_metadata, resolve_enum, to_metadata};
use super::{BAKED_FORMAT, FormatError, expect_tag};
use crate::compression::{CompressionMode, compress, decompress_into};
use crate::container::AssetContainer;

/// Pixel formats a baked texture can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum TextureFormat {
    #[default]
    Unknown = 0,
    Rgba8 = 1,
}

impl TextureFormat {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Rgba8 => "RGBA8",
        }
    }

    pub const fn value(self) -> u32 {
        self as u32
    }

    /// Bytes per pixel, `None` for formats without a fixed pixel size.
    pub const fn bytes_per_pixel(self) -> Option<u64> {
        match self {
            Self::Unknown => None,
            Self::Rgba8 => Some(4),
        }
    }
}

impl MetadataEnum for TextureFormat {
    const KIND: &'static str = "texture format";

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Unknown" => Some(Self::Unknown),
            "RGBA8" => Some(Self::Rgba8),
            _ => None,
        }
    }

    fn from_value(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            1 => Some(Self::Rgba8),
            _ => None,
        }
    }
}

/// Decoded texture metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub original_file: String,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    /// Raw pixel buffer size in bytes
    pub texture_size: u64,
    pub compression_mode: CompressionMode,
    /// Stored payload size in bytes
    pub compressed_size: u64,
}

#[derive(Serialize, Deserialize)]
struct TextureMetadata {
    texture_format: String,
    texture_format_enum_val: u32,
    texture_size: u64,
    original_file: String,
    compression_mode: String,
    compression_mode_enum_val: u32,
    width: u32,
    height: u32,
    compressed_size: u64,
}

/// Pack raw pixels into a texture container.
pub fn pack_texture(
    width: u32,
    height: u32,
    format: TextureFormat,
    original_file: &str,
    pixels: &[u8],
) -> Result<AssetContainer, FormatError> {
    let bpp = format
        .bytes_per_pixel()
        .ok_or(FormatError::UnsupportedTextureFormat(format))?;
    let expected = width as u64 * height as u64 * bpp;
    if pixels.len() as u64 != expected {
        return Err(FormatError::PixelSizeMismatch {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }

    let compressed = compress(pixels);

    let metadata = TextureMetadata {
        texture_format: format.name().to_string(),
        texture_format_enum_val: format.value(),
        texture_size: expected,
        original_file: original_file.to_string(),
        compression_mode: compressed.mode.name().to_string(),
        compression_mode_enum_val: compressed.mode.value(),
        width,
        height,
        compressed_size: compressed.bytes.len() as u64,
    };

    Ok(AssetContainer::new(
        BAKED_FORMAT.texture_tag,
        to_metadata(&metadata)?,
        compressed.bytes,
    ))
}

/// Parse texture metadata from a container.
pub fn read_texture_info(container: &AssetContainer) -> Result<TextureInfo, FormatError> {
    expect_tag(BAKED_FORMAT.texture_tag, container.tag)?;
    let metadata: TextureMetadata = from_metadata(&container.metadata)?;

    Ok(TextureInfo {
        format: resolve_enum(&metadata.texture_format, metadata.texture_format_enum_val)?,
        compression_mode: resolve_enum(
            &metadata.compression_mode,
            metadata.compression_mode_enum_val,
        )?,
        original_file: metadata.original_file,
        width: metadata.width,
        height: metadata.height,
        texture_size: metadata.texture_size,
        compressed_size: metadata.compressed_size,
    })
}

/// Decompress a texture payload into `destination` (exactly `texture_size` bytes).
pub fn unpack_texture(
    info: &TextureInfo,
    source: &[u8],
    destination: &mut [u8],
) -> Result<(), FormatError> {
    if destination.len() as u64 != info.texture_size {
        return Err(FormatError::DestinationSize {
            what: "texture",
            expected: info.texture_size,
            actual: destination.len(),
        });
    }
    if source.len() as u64 != info.compressed_size {
        return Err(FormatError::PayloadSize {
            expected: info.compressed_size,
            actual: source.len(),
        });
    }
    decompress_into(source, info.compression_mode, destination)?;
    Ok(())
}
