//! Baked material format (.mat)
//!
//! Metadata-only asset: the payload region is always empty.
//!
//! # Metadata keys
//! ```text
//! base_effect, textures, custom_properties, transparency
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::metadata::{from_metadata, to_metadata};
use super::{BAKED_FORMAT, FormatError, expect_tag};
use crate::container::AssetContainer;

/// Texture slot names used by the importer.
pub mod slots {
    pub const BASE_COLOR: &str = "baseColor";
    pub const METALLIC_ROUGHNESS: &str = "metallicRoughness";
    pub const NORMALS: &str = "normals";
    pub const OCCLUSION: &str = "occlusion";
    pub const EMISSIVE: &str = "emissive";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum TransparencyMode {
    #[default]
    Opaque = 0,
    Transparent = 1,
}

/// Material description: effect name, texture slots and free-form properties.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaterialInfo {
    pub base_effect: String,
    /// Slot name -> baked texture path
    pub textures: BTreeMap<String, String>,
    pub custom_properties: BTreeMap<String, String>,
    pub transparency: TransparencyMode,
}

impl MaterialInfo {
    pub fn new(base_effect: impl Into<String>) -> Self {
        Self {
            base_effect: base_effect.into(),
            ..Default::default()
        }
    }
}

pub fn pack_material(info: &MaterialInfo) -> Result<AssetContainer, FormatError> {
    Ok(AssetContainer::new(
        BAKED_FORMAT.material_tag,
        to_metadata(info)?,
        Vec::new(),
    ))
}

pub fn read_material_info(container: &AssetContainer) -> Result<MaterialInfo, FormatError> {
    expect_tag(BAKED_FORMAT.material_tag, container.tag)?;
    if !container.payload.is_empty() {
        tracing::debug!(
            "ignoring {} payload bytes in material container",
            container.payload.len()
        );
    }
    from_metadata(&container.metadata)
}
