//! Payload compression strategy
//!
//! Payloads are compressed with the LZ4 block format. The block format does
//! not record the decompressed size, so every packer stores it in metadata
//! and hands it back to [`decompress_into`].
//!
//! When compression saves too little (compressed/original above 0.8) the raw
//! bytes are stored instead and the mode is recorded as [`CompressionMode::None`].

/// Fallback threshold as a fraction: `compressed / original > 4/5` stores raw.
const RAW_FALLBACK_NUMERATOR: u128 = 4;
const RAW_FALLBACK_DENOMINATOR: u128 = 5;

/// Errors produced while decompressing a payload.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("decompressed size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("corrupt LZ4 payload: {0}")]
    Corrupt(String),
}

/// How a payload is stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum CompressionMode {
    #[default]
    None = 0,
    Lz4 = 1,
}

impl CompressionMode {
    /// Name written to metadata.
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Lz4 => "LZ4",
        }
    }

    /// Integer written to metadata alongside the name.
    pub const fn value(self) -> u32 {
        self as u32
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "None" => Some(Self::None),
            "LZ4" => Some(Self::Lz4),
            _ => None,
        }
    }

    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Lz4),
            _ => None,
        }
    }
}

/// Result of [`compress`]: the bytes to store and how they are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub mode: CompressionMode,
}

/// Decide the stored mode from the original and compressed sizes.
///
/// A ratio strictly above 0.8 falls back to raw; exactly 0.8 keeps LZ4.
/// Empty input has no meaningful ratio and is stored raw.
pub fn choose_mode(original_len: usize, compressed_len: usize) -> CompressionMode {
    if original_len == 0 {
        return CompressionMode::None;
    }
    let compressed = compressed_len as u128 * RAW_FALLBACK_DENOMINATOR;
    let original = original_len as u128 * RAW_FALLBACK_NUMERATOR;
    if compressed > original {
        CompressionMode::None
    } else {
        CompressionMode::Lz4
    }
}

/// Compress `raw`, falling back to a raw copy when the gain is marginal.
pub fn compress(raw: &[u8]) -> Compressed {
    if raw.is_empty() {
        return Compressed {
            bytes: Vec::new(),
            mode: CompressionMode::None,
        };
    }

    let bound = lz4_flex::block::get_maximum_output_size(raw.len());
    let mut output = vec![0u8; bound];
    let compressed_len = match lz4_flex::block::compress_into(raw, &mut output) {
        Ok(len) => len,
        Err(err) => {
            tracing::warn!("LZ4 compression failed ({}), storing raw", err);
            return Compressed {
                bytes: raw.to_vec(),
                mode: CompressionMode::None,
            };
        }
    };

    match choose_mode(raw.len(), compressed_len) {
        CompressionMode::Lz4 => {
            output.truncate(compressed_len);
            Compressed {
                bytes: output,
                mode: CompressionMode::Lz4,
            }
        }
        CompressionMode::None => Compressed {
            bytes: raw.to_vec(),
            mode: CompressionMode::None,
        },
    }
}

/// Decompress `source` into `destination`, which must be exactly the raw size.
pub fn decompress_into(
    source: &[u8],
    mode: CompressionMode,
    destination: &mut [u8],
) -> Result<(), CompressionError> {
    match mode {
        CompressionMode::None => {
            if source.len() != destination.len() {
                return Err(CompressionError::SizeMismatch {
                    expected: destination.len(),
                    actual: source.len(),
                });
            }
            destination.copy_from_slice(source);
        }
        CompressionMode::Lz4 => {
            let written = lz4_flex::block::decompress_into(source, destination)
                .map_err(|e| CompressionError::Corrupt(e.to_string()))?;
            if written != destination.len() {
                return Err(CompressionError::SizeMismatch {
                    expected: destination.len(),
                    actual: written,
                });
            }
        }
    }
    Ok(())
}

/// Decompress into a freshly allocated buffer of `raw_size` bytes.
pub fn decompress(
    source: &[u8],
    mode: CompressionMode,
    raw_size: usize,
) -> Result<Vec<u8>, CompressionError> {
    let mut raw = vec![0u8; raw_size];
    decompress_into(source, mode, &mut raw)?;
    Ok(raw)
}
