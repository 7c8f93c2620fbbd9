//! Baked asset container (.tx, .mesh, .mat, .pfb)
//!
//! Every baked asset shares the same framing. The metadata region is UTF-8
//! JSON describing how to interpret the payload; the payload is opaque and
//! possibly compressed.
//!
//! # Layout
//! ```text
//! 0x00: type tag [u8; 4] (ASCII, not null-terminated)
//! 0x04: version u32
//! 0x08: metadata_len u32
//! 0x0C: payload_len u32
//! 0x10: metadata bytes (metadata_len)
//! var:  payload bytes (payload_len)
//! ```
//!
//! All integers are little-endian. No padding between fields.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Version written into every container by this crate.
pub const CONTAINER_VERSION: u32 = 1;

/// Size of the fixed header (tag + version + two lengths).
pub const HEADER_SIZE: usize = 16;

/// Errors produced while reading or writing containers.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Stream(#[from] io::Error),

    #[error("container truncated: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: u64, actual: u64 },

    #[error("{region} region too large for container framing ({len} bytes)")]
    TooLarge { region: &'static str, len: usize },
}

impl ContainerError {
    fn at_path(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Four-byte asset type tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetTag(pub [u8; 4]);

impl AssetTag {
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for AssetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for AssetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetTag({self})")
    }
}

/// One baked asset file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetContainer {
    pub tag: AssetTag,
    pub version: u32,
    pub metadata: Vec<u8>,
    pub payload: Vec<u8>,
}

impl AssetContainer {
    /// Create a container stamped with [`CONTAINER_VERSION`].
    pub fn new(tag: AssetTag, metadata: Vec<u8>, payload: Vec<u8>) -> Self {
        Self {
            tag,
            version: CONTAINER_VERSION,
            metadata,
            payload,
        }
    }

    /// Total encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.metadata.len() + self.payload.len()
    }

    /// Write the container framing and both regions.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), ContainerError> {
        let metadata_len = region_len("metadata", &self.metadata)?;
        let payload_len = region_len("payload", &self.payload)?;

        w.write_all(self.tag.as_bytes())?;
        w.write_u32::<LittleEndian>(self.version)?;
        w.write_u32::<LittleEndian>(metadata_len)?;
        w.write_u32::<LittleEndian>(payload_len)?;
        w.write_all(&self.metadata)?;
        w.write_all(&self.payload)?;
        Ok(())
    }

    /// Encode to an in-memory buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ContainerError> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Decode from bytes, validating that both declared regions are present.
    ///
    /// A version other than [`CONTAINER_VERSION`] is logged and the container
    /// is still returned; schema compatibility is up to the caller.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContainerError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ContainerError::Truncated {
                expected: HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        let tag = AssetTag([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let version = LittleEndian::read_u32(&bytes[4..8]);
        let metadata_len = LittleEndian::read_u32(&bytes[8..12]) as usize;
        let payload_len = LittleEndian::read_u32(&bytes[12..16]) as usize;

        let expected = HEADER_SIZE as u64 + metadata_len as u64 + payload_len as u64;
        if (bytes.len() as u64) < expected {
            return Err(ContainerError::Truncated {
                expected,
                actual: bytes.len() as u64,
            });
        }
        if (bytes.len() as u64) > expected {
            tracing::debug!(
                "Container {} has {} trailing bytes",
                tag,
                bytes.len() as u64 - expected
            );
        }

        if version != CONTAINER_VERSION {
            tracing::warn!(
                "Container {} has version {}, expected {}; loading anyway",
                tag,
                version,
                CONTAINER_VERSION
            );
        }

        let metadata_end = HEADER_SIZE + metadata_len;
        let payload_end = metadata_end + payload_len;

        Ok(Self {
            tag,
            version,
            metadata: bytes[HEADER_SIZE..metadata_end].to_vec(),
            payload: bytes[metadata_end..payload_end].to_vec(),
        })
    }
}

fn region_len(region: &'static str, bytes: &[u8]) -> Result<u32, ContainerError> {
    u32::try_from(bytes.len()).map_err(|_| ContainerError::TooLarge {
        region,
        len: bytes.len(),
    })
}

/// Write a container to `path`, replacing any existing file.
///
/// The bytes go to `<path>.tmp` first and are renamed into place once fully
/// flushed. The parent directory must already exist.
pub fn write_container(path: &Path, container: &AssetContainer) -> Result<(), ContainerError> {
    let tmp = staging_path(path);

    let result = (|| {
        let file = File::create(&tmp).map_err(|e| ContainerError::at_path(&tmp, e))?;
        let mut writer = BufWriter::new(file);
        container.write_to(&mut writer)?;
        let file = writer
            .into_inner()
            .map_err(|e| ContainerError::at_path(&tmp, e.into_error()))?;
        file.sync_all().map_err(|e| ContainerError::at_path(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| ContainerError::at_path(path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Read a container from `path`.
pub fn read_container(path: &Path) -> Result<AssetContainer, ContainerError> {
    let bytes = fs::read(path).map_err(|e| ContainerError::at_path(path, e))?;
    AssetContainer::from_bytes(&bytes)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
