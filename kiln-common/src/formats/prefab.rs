//! Baked prefab format (.pfb)
//!
//! A flattened scene: sparse per-node maps in metadata, and the transform
//! arena as the payload (16 little-endian f32 per matrix, column-major).
//!
//! # Metadata keys
//! ```text
//! node_matrices, node_names, node_parents, node_meshes, matrices_size,
//! compression_mode, compression_mode_enum_val
//! ```
//!
//! Node indices are dense from 0. A node missing from `node_parents` is a
//! root; a node missing from `node_meshes` draws nothing.

use std::collections::BTreeMap;

use byteorder::{ByteOrder, LittleEndian};
use glam::Mat4;
use serde::{Deserialize, Serialize};

use super::metadata::{from_metadata, resolve_enum, to_metadata};
use super::{BAKED_FORMAT, FormatError, expect_tag};
use crate::compression::{compress, decompress};
use crate::container::AssetContainer;

const FLOATS_PER_MATRIX: usize = 16;
const MATRIX_BYTES: usize = FLOATS_PER_MATRIX * 4;

/// Mesh reference attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefabNodeMesh {
    pub mesh_path: String,
    pub material_path: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrefabInfo {
    /// Node -> index into `matrices`
    pub node_matrices: BTreeMap<u64, u64>,
    pub node_names: BTreeMap<u64, String>,
    /// Child -> parent
    pub node_parents: BTreeMap<u64, u64>,
    pub node_meshes: BTreeMap<u64, PrefabNodeMesh>,
    /// Column-major transforms, appended as nodes are created
    pub matrices: Vec<[f32; 16]>,
}

impl PrefabInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with `transform`, returning its index.
    pub fn add_node(&mut self, transform: Mat4) -> u64 {
        let node = self.node_matrices.len() as u64;
        let slot = self.matrices.len() as u64;
        self.matrices.push(transform.to_cols_array());
        self.node_matrices.insert(node, slot);
        node
    }

    pub fn node_count(&self) -> u64 {
        self.node_matrices.len() as u64
    }

    pub fn is_root(&self, node: u64) -> bool {
        !self.node_parents.contains_key(&node)
    }

    pub fn matrix(&self, node: u64) -> Option<Mat4> {
        let slot = *self.node_matrices.get(&node)?;
        self.matrices
            .get(slot as usize)
            .map(Mat4::from_cols_array)
    }

    /// Replace a node's transform. Returns false for an unknown node.
    pub fn set_matrix(&mut self, node: u64, transform: Mat4) -> bool {
        let Some(&slot) = self.node_matrices.get(&node) else {
            return false;
        };
        match self.matrices.get_mut(slot as usize) {
            Some(m) => {
                *m = transform.to_cols_array();
                true
            }
            None => false,
        }
    }

    /// Check that every referenced node has a transform and the node space is dense.
    pub fn validate(&self) -> Result<(), FormatError> {
        for (expected, (&node, &slot)) in self.node_matrices.iter().enumerate() {
            if node != expected as u64 {
                return Err(FormatError::InvalidPrefab(format!(
                    "node indices are not dense: found {node} where {expected} was expected"
                )));
            }
            if slot as usize >= self.matrices.len() {
                return Err(FormatError::InvalidPrefab(format!(
                    "node {node} points at matrix {slot}, only {} stored",
                    self.matrices.len()
                )));
            }
        }

        let known = |node: &u64| self.node_matrices.contains_key(node);
        for (child, parent) in &self.node_parents {
            if !known(child) || !known(parent) {
                return Err(FormatError::InvalidPrefab(format!(
                    "parent link {child} -> {parent} references a node without a transform"
                )));
            }
        }
        if let Some(node) = self.node_meshes.keys().find(|n| !known(n)) {
            return Err(FormatError::InvalidPrefab(format!(
                "mesh attached to unknown node {node}"
            )));
        }
        if let Some(node) = self.node_names.keys().find(|n| !known(n)) {
            return Err(FormatError::InvalidPrefab(format!(
                "name attached to unknown node {node}"
            )));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct PrefabMetadata {
    node_matrices: BTreeMap<u64, u64>,
    node_names: BTreeMap<u64, String>,
    node_parents: BTreeMap<u64, u64>,
    node_meshes: BTreeMap<u64, PrefabNodeMesh>,
    matrices_size: u64,
    compression_mode: String,
    compression_mode_enum_val: u32,
}

pub fn pack_prefab(info: &PrefabInfo) -> Result<AssetContainer, FormatError> {
    info.validate()?;

    let floats: Vec<f32> = info.matrices.iter().flatten().copied().collect();
    let mut raw = vec![0u8; floats.len() * 4];
    LittleEndian::write_f32_into(&floats, &mut raw);
    let compressed = compress(&raw);

    let metadata = PrefabMetadata {
        node_matrices: info.node_matrices.clone(),
        node_names: info.node_names.clone(),
        node_parents: info.node_parents.clone(),
        node_meshes: info.node_meshes.clone(),
        matrices_size: raw.len() as u64,
        compression_mode: compressed.mode.name().to_string(),
        compression_mode_enum_val: compressed.mode.value(),
    };

    Ok(AssetContainer::new(
        BAKED_FORMAT.prefab_tag,
        to_metadata(&metadata)?,
        compressed.bytes,
    ))
}

/// Parse a prefab, including its transform payload.
pub fn read_prefab_info(container: &AssetContainer) -> Result<PrefabInfo, FormatError> {
    expect_tag(BAKED_FORMAT.prefab_tag, container.tag)?;
    let metadata: PrefabMetadata = from_metadata(&container.metadata)?;

    if metadata.matrices_size as usize % MATRIX_BYTES != 0 {
        return Err(FormatError::InvalidPrefab(format!(
            "matrices_size {} is not a whole number of matrices",
            metadata.matrices_size
        )));
    }

    let mode = resolve_enum(&metadata.compression_mode, metadata.compression_mode_enum_val)?;
    let raw = decompress(&container.payload, mode, metadata.matrices_size as usize)?;

    let mut floats = vec![0f32; raw.len() / 4];
    LittleEndian::read_f32_into(&raw, &mut floats);
    let matrices = floats
        .chunks_exact(FLOATS_PER_MATRIX)
        .map(|chunk| {
            let mut m = [0f32; 16];
            m.copy_from_slice(chunk);
            m
        })
        .collect();

    let info = PrefabInfo {
        node_matrices: metadata.node_matrices,
        node_names: metadata.node_names,
        node_parents: metadata.node_parents,
        node_meshes: metadata.node_meshes,
        matrices,
    };
    info.validate()?;
    Ok(info)
}
