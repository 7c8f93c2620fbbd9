//! glTF/GLB scene import
//!
//! One scene file produces:
//! - a mesh container per primitive
//! - a material container per glTF material (plus `MAT_DEFAULT` on demand)
//! - a texture container per embedded image
//! - one prefab holding the flattened node graph

mod material;
mod mesh;
mod paths;
mod prefab;

pub use material::DEFAULT_EFFECT;
pub use mesh::{PrimitiveData, flip_winding};
pub use paths::{ScenePaths, slash_path};
pub use prefab::{local_transform, root_fixup};

use anyhow::{Context, Result};
use kiln_common::{
    AssetContainer, PrefabInfo, PrefabNodeMesh, VertexFormat, pack_material, pack_mesh,
    pack_prefab, write_container,
};
use std::path::Path;

use crate::config::MissingAttributes;
use crate::error::ImportError;
use material::{TextureResolver, default_material, extract_material};

/// Scene file extensions handled by the importer.
pub const SCENE_EXTENSIONS: &[&str] = &["gltf", "glb"];

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub vertex_format: VertexFormat,
    pub missing_attributes: MissingAttributes,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            vertex_format: VertexFormat::PncvF32,
            missing_attributes: MissingAttributes::Reject,
        }
    }
}

/// A packed container and where it goes under the baked root.
#[derive(Debug, Clone)]
pub struct BakedAsset {
    pub path: String,
    pub container: AssetContainer,
}

/// A parsed document with its buffers loaded.
pub struct LoadedScene {
    pub document: gltf::Document,
    pub buffers: Vec<gltf::buffer::Data>,
}

/// Parse a .gltf/.glb file and load its buffers (external .bin files resolve
/// against the file's directory).
pub fn load_scene(path: &Path) -> Result<LoadedScene, gltf::Error> {
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)?;
    Ok(LoadedScene { document, buffers })
}

/// Parse an in-memory GLB or glTF JSON document with no external resources.
pub fn load_scene_from_slice(bytes: &[u8]) -> Result<LoadedScene, gltf::Error> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, None, blob)?;
    Ok(LoadedScene { document, buffers })
}

/// Everything baked from one scene, not yet written.
#[derive(Debug)]
pub struct ImportedScene {
    pub textures: Vec<BakedAsset>,
    pub materials: Vec<BakedAsset>,
    pub meshes: Vec<BakedAsset>,
    pub prefab: BakedAsset,
}

impl ImportedScene {
    /// Write every container under `baked_root`, creating directories as needed.
    pub fn write(&self, baked_root: &Path) -> Result<()> {
        let assets = self
            .textures
            .iter()
            .chain(&self.materials)
            .chain(&self.meshes)
            .chain(std::iter::once(&self.prefab));
        for asset in assets {
            let output = baked_root.join(&asset.path);
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
            write_container(&output, &asset.container)
                .with_context(|| format!("Failed to write {}", output.display()))?;
        }
        Ok(())
    }
}

/// Convert a loaded scene into containers.
pub fn import_scene(
    scene: &LoadedScene,
    paths: &ScenePaths,
    options: &ImportOptions,
) -> Result<ImportedScene, ImportError> {
    let document = &scene.document;
    let buffers = scene.buffers.as_slice();
    let mut textures = TextureResolver::new(paths, buffers);

    let mut materials = Vec::new();
    let mut material_paths = Vec::new();
    for gltf_material in document.materials() {
        let index = gltf_material.index().unwrap_or(material_paths.len());
        let info = extract_material(&gltf_material, &mut textures)?;
        let path = paths.material(index, gltf_material.name().unwrap_or_default());
        tracing::debug!(
            "Material {} -> {} ({} texture slots)",
            index,
            path,
            info.textures.len()
        );
        materials.push(BakedAsset {
            path: path.clone(),
            container: pack_material(&info)?,
        });
        material_paths.push(path);
    }

    let mut default_material_path: Option<String> = None;
    let mut meshes = Vec::new();
    let mut primitive_refs: Vec<Vec<PrefabNodeMesh>> = Vec::new();
    for gltf_mesh in document.meshes() {
        let primitive_count = gltf_mesh.primitives().count();
        let name = gltf_mesh.name().unwrap_or_default();
        let mut refs = Vec::with_capacity(primitive_count);

        for primitive in gltf_mesh.primitives() {
            let data = mesh::extract_primitive(
                &primitive,
                gltf_mesh.index(),
                buffers,
                options.missing_attributes,
            )?;
            let vertex_bytes = data.vertex_bytes(options.vertex_format);
            let (index_bytes, index_size) = data.index_bytes();
            let path = paths.mesh(
                gltf_mesh.index(),
                name,
                (primitive_count > 1).then_some(primitive.index()),
            );
            let container = pack_mesh(
                options.vertex_format,
                &vertex_bytes,
                &index_bytes,
                index_size,
                &paths.original_file,
            )?;
            tracing::debug!(
                "Mesh {} primitive {}: {} vertices, {} indices -> {}",
                gltf_mesh.index(),
                primitive.index(),
                data.vertices.len(),
                data.indices.len(),
                path
            );

            let material_path = match primitive.material().index() {
                Some(i) => material_paths.get(i).cloned().ok_or_else(|| {
                    ImportError::InvalidDocument(format!(
                        "mesh {} primitive {} references missing material {i}",
                        gltf_mesh.index(),
                        primitive.index()
                    ))
                })?,
                None => match &default_material_path {
                    Some(path) => path.clone(),
                    None => {
                        let path = paths.default_material();
                        materials.push(BakedAsset {
                            path: path.clone(),
                            container: pack_material(&default_material())?,
                        });
                        default_material_path = Some(path.clone());
                        path
                    }
                },
            };

            meshes.push(BakedAsset {
                path: path.clone(),
                container,
            });
            refs.push(PrefabNodeMesh {
                mesh_path: path,
                material_path,
            });
        }
        primitive_refs.push(refs);
    }

    let prefab_info: PrefabInfo = prefab::flatten_nodes(document, &primitive_refs);
    let prefab = BakedAsset {
        path: paths.prefab(),
        container: pack_prefab(&prefab_info)?,
    };

    Ok(ImportedScene {
        textures: textures.into_baked(),
        materials,
        meshes,
        prefab,
    })
}
