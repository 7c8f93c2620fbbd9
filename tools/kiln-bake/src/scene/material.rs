//! Material extraction and texture reference resolution

use std::collections::BTreeMap;

use gltf::image::Source;
use gltf::material::AlphaMode;
use kiln_common::{MaterialInfo, TransparencyMode, slots};

use super::{BakedAsset, ScenePaths};
use crate::error::ImportError;
use crate::texture::pack_image;

/// Effect name written for every imported material.
pub const DEFAULT_EFFECT: &str = "defaultPBR";

/// Maps glTF textures to baked texture paths, baking embedded images on first use.
pub(crate) struct TextureResolver<'a> {
    paths: &'a ScenePaths,
    buffers: &'a [gltf::buffer::Data],
    embedded: BTreeMap<usize, String>,
    baked: Vec<BakedAsset>,
}

impl<'a> TextureResolver<'a> {
    pub(crate) fn new(paths: &'a ScenePaths, buffers: &'a [gltf::buffer::Data]) -> Self {
        Self {
            paths,
            buffers,
            embedded: BTreeMap::new(),
            baked: Vec::new(),
        }
    }

    /// Containers for embedded images baked so far.
    pub(crate) fn into_baked(self) -> Vec<BakedAsset> {
        self.baked
    }

    pub(crate) fn resolve(
        &mut self,
        texture: &gltf::Texture,
    ) -> Result<Option<String>, ImportError> {
        let image = texture.source();
        match image.source() {
            Source::Uri { uri, .. } if uri.starts_with("data:") => {
                tracing::warn!(
                    "{}: image {} uses a data URI, which is not supported; slot left empty",
                    self.paths.original_file,
                    image.index()
                );
                Ok(None)
            }
            Source::Uri { uri, .. } => Ok(Some(self.paths.external_texture(uri))),
            Source::View { view, .. } => {
                if let Some(path) = self.embedded.get(&image.index()) {
                    return Ok(Some(path.clone()));
                }

                let buffer = self
                    .buffers
                    .get(view.buffer().index())
                    .ok_or(ImportError::MissingBuffer(view.buffer().index()))?;
                let bytes = view
                    .offset()
                    .checked_add(view.length())
                    .and_then(|end| buffer.get(view.offset()..end))
                    .ok_or(ImportError::AccessorOutOfBounds {
                        accessor: view.index(),
                        needed: view.offset().saturating_add(view.length()),
                        available: buffer.len(),
                    })?;

                let decoded = image::load_from_memory(bytes).map_err(
                    |source| ImportError::EmbeddedImage {
                        image: image.index(),
                        source,
                    },
                )?;
                let path = self
                    .paths
                    .embedded_texture(image.index(), image.name().unwrap_or_default());
                let original = format!("{}#image{}", self.paths.original_file, image.index());
                let container = pack_image(&decoded, &original).map_err(|e| {
                    ImportError::InvalidDocument(format!("image {}: {e:#}", image.index()))
                })?;

                tracing::debug!(
                    "Embedded image {} ({}x{}) -> {}",
                    image.index(),
                    decoded.width(),
                    decoded.height(),
                    path
                );
                self.embedded.insert(image.index(), path.clone());
                self.baked.push(BakedAsset {
                    path: path.clone(),
                    container,
                });
                Ok(Some(path))
            }
        }
    }
}

fn join_floats(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Properties of the material used by primitives without one.
pub(crate) fn default_material() -> MaterialInfo {
    let mut info = MaterialInfo::new(DEFAULT_EFFECT);
    let props = &mut info.custom_properties;
    props.insert("base_color_factor".into(), join_floats(&[1.0, 1.0, 1.0, 1.0]));
    props.insert("metallic_factor".into(), "1".into());
    props.insert("roughness_factor".into(), "1".into());
    props.insert("emissive_factor".into(), join_floats(&[0.0, 0.0, 0.0]));
    props.insert("double_sided".into(), "false".into());
    info
}

pub(crate) fn extract_material(
    material: &gltf::Material,
    textures: &mut TextureResolver,
) -> Result<MaterialInfo, ImportError> {
    let mut info = MaterialInfo::new(DEFAULT_EFFECT);
    let pbr = material.pbr_metallic_roughness();

    let slot_textures = [
        (slots::BASE_COLOR, pbr.base_color_texture().map(|t| t.texture())),
        (
            slots::METALLIC_ROUGHNESS,
            pbr.metallic_roughness_texture().map(|t| t.texture()),
        ),
        (slots::NORMALS, material.normal_texture().map(|t| t.texture())),
        (
            slots::OCCLUSION,
            material.occlusion_texture().map(|t| t.texture()),
        ),
        (slots::EMISSIVE, material.emissive_texture().map(|t| t.texture())),
    ];
    for (slot, texture) in slot_textures {
        let Some(texture) = texture else { continue };
        if let Some(path) = textures.resolve(&texture)? {
            info.textures.insert(slot.to_string(), path);
        }
    }

    let props = &mut info.custom_properties;
    props.insert(
        "base_color_factor".into(),
        join_floats(&pbr.base_color_factor()),
    );
    props.insert("metallic_factor".into(), pbr.metallic_factor().to_string());
    props.insert("roughness_factor".into(), pbr.roughness_factor().to_string());
    props.insert(
        "emissive_factor".into(),
        join_floats(&material.emissive_factor()),
    );
    props.insert("double_sided".into(), material.double_sided().to_string());

    info.transparency = match material.alpha_mode() {
        AlphaMode::Blend => TransparencyMode::Transparent,
        AlphaMode::Mask => {
            let cutoff = material.alpha_cutoff().unwrap_or(0.5);
            props.insert("alpha_cutoff".into(), cutoff.to_string());
            TransparencyMode::Opaque
        }
        AlphaMode::Opaque => TransparencyMode::Opaque,
    };

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_floats() {
        assert_eq!(join_floats(&[1.0, 0.5, 0.25, 1.0]), "1,0.5,0.25,1");
        assert_eq!(join_floats(&[]), "");
    }

    #[test]
    fn test_default_material() {
        let info = default_material();
        assert_eq!(info.base_effect, DEFAULT_EFFECT);
        assert!(info.textures.is_empty());
        assert_eq!(info.transparency, TransparencyMode::Opaque);
        assert_eq!(info.custom_properties["base_color_factor"], "1,1,1,1");
    }
}
