//! kiln.toml configuration
//!
//! Every section and key is optional. Command-line flags override file values.
//!
//! ```toml
//! [output]
//! baked_dir = "../assets_export"
//!
//! [mesh]
//! vertex_format = "P32N8C8V16"
//! missing_attributes = "default"
//!
//! [manifest]
//! mesh_macro = "MESH"
//! ```

use anyhow::{Context, Result, bail};
use kiln_common::VertexFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the input directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "kiln.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BakeConfig {
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub mesh: MeshSection,
    #[serde(default)]
    pub manifest: ManifestSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Baked output root, relative paths resolve against the input directory.
    /// Default: `<input>/../assets_export`
    pub baked_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshSection {
    #[serde(default = "default_vertex_format")]
    pub vertex_format: String,
    #[serde(default)]
    pub missing_attributes: MissingAttributes,
}

impl Default for MeshSection {
    fn default() -> Self {
        Self {
            vertex_format: default_vertex_format(),
            missing_attributes: MissingAttributes::default(),
        }
    }
}

fn default_vertex_format() -> String {
    VertexFormat::PncvF32.name().to_string()
}

/// What to do with a primitive that lacks NORMAL or TEXCOORD_0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingAttributes {
    /// Skip the scene with an import error
    #[default]
    Reject,
    /// Substitute normal (0, 1, 0) and uv (0, 0)
    Default,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestSection {
    #[serde(default = "default_texture_macro")]
    pub texture_macro: String,
    #[serde(default = "default_mesh_macro")]
    pub mesh_macro: String,
    #[serde(default = "default_material_macro")]
    pub material_macro: String,
    #[serde(default = "default_prefab_macro")]
    pub prefab_macro: String,
}

impl Default for ManifestSection {
    fn default() -> Self {
        Self {
            texture_macro: default_texture_macro(),
            mesh_macro: default_mesh_macro(),
            material_macro: default_material_macro(),
            prefab_macro: default_prefab_macro(),
        }
    }
}

fn default_texture_macro() -> String {
    "TEXTURE_ASSET".to_string()
}

fn default_mesh_macro() -> String {
    "MESH_ASSET".to_string()
}

fn default_material_macro() -> String {
    "MATERIAL_ASSET".to_string()
}

fn default_prefab_macro() -> String {
    "PREFAB_ASSET".to_string()
}

impl BakeConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse kiln config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Load `path` if given, else `<input_dir>/kiln.toml` if it exists, else defaults.
    pub fn discover(path: Option<&Path>, input_dir: &Path) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = input_dir.join(CONFIG_FILE_NAME);
        if default_path.is_file() {
            tracing::debug!("Using config {}", default_path.display());
            return Self::load(&default_path);
        }
        Ok(Self::default())
    }

    pub fn vertex_format(&self) -> Result<VertexFormat> {
        parse_vertex_format(&self.mesh.vertex_format)
    }

    pub fn baked_dir(&self, input_dir: &Path) -> PathBuf {
        match &self.output.baked_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => input_dir.join(dir),
            None => input_dir.join("..").join("assets_export"),
        }
    }
}

/// Parse a vertex format name, rejecting formats without a vertex layout.
pub fn parse_vertex_format(name: &str) -> Result<VertexFormat> {
    match VertexFormat::parse(name) {
        Some(format) if format.stride().is_some() => Ok(format),
        _ => bail!(
            "Unknown vertex format {:?} (expected {} or {})",
            name,
            VertexFormat::PncvF32.name(),
            VertexFormat::P32N8C8V16.name()
        ),
    }
}
