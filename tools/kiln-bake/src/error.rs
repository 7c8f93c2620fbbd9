//! Importer and driver error types

use std::path::PathBuf;

/// Precondition violations in a scene document.
///
/// These are recoverable: the driver logs them and moves on to the next file.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("scene failed validation: {0}")]
    InvalidDocument(String),

    #[error("mesh {mesh} primitive {primitive} has no {attribute} attribute")]
    MissingAttribute {
        mesh: usize,
        primitive: usize,
        attribute: &'static str,
    },

    #[error("mesh {mesh} primitive {primitive} uses mode {mode:?}, only triangle lists are supported")]
    UnsupportedMode {
        mesh: usize,
        primitive: usize,
        mode: gltf::mesh::Mode,
    },

    #[error("accessor {accessor} ({what}) has unsupported layout {data_type:?} {dimensions:?}")]
    UnsupportedAccessor {
        accessor: usize,
        what: &'static str,
        data_type: gltf::accessor::DataType,
        dimensions: gltf::accessor::Dimensions,
    },

    #[error("accessor {0} has no buffer view")]
    MissingBufferView(usize),

    #[error("accessor {accessor} needs {needed} bytes but its buffer view provides {available}")]
    AccessorOutOfBounds {
        accessor: usize,
        needed: usize,
        available: usize,
    },

    #[error("buffer {0} was not loaded")]
    MissingBuffer(usize),

    #[error("mesh {mesh} primitive {primitive}: attribute counts differ ({positions} positions, {other} {attribute})")]
    AttributeCountMismatch {
        mesh: usize,
        primitive: usize,
        attribute: &'static str,
        positions: usize,
        other: usize,
    },

    #[error("mesh {mesh} primitive {primitive}: index count {count} is not a multiple of 3")]
    IncompleteTriangle {
        mesh: usize,
        primitive: usize,
        count: usize,
    },

    #[error("mesh {mesh} primitive {primitive}: index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        mesh: usize,
        primitive: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("image {image} could not be decoded")]
    EmbeddedImage {
        image: usize,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Format(#[from] kiln_common::FormatError),
}

/// Failures that end a bake run, each with its own process exit code.
#[derive(Debug, thiserror::Error)]
pub enum BakeError {
    #[error("input directory {0:?} does not exist or is not a directory")]
    InvalidInputDir(PathBuf),

    #[error("failed to parse scene {path:?}")]
    SceneParse {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

/// Exit code for missing or malformed arguments.
pub const EXIT_USAGE: i32 = -1;

impl BakeError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInputDir(_) => -2,
            Self::SceneParse { .. } => -3,
            Self::Fatal(_) => -4,
        }
    }
}
