//! glTF document construction

use crate::buffer::{BufferBuilder, ViewIndex};
use crate::mesh::PrimitiveAccessors;
use crate::utils::assemble_glb;
use serde_json::{Map, Value, json};

/// A scene node. Unset transform properties are omitted from the JSON.
#[derive(Debug, Clone, Default)]
pub struct Node {
    name: Option<String>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
    matrix: Option<[f32; 16]>,
    children: Vec<u32>,
    mesh: Option<u32>,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn translation(mut self, translation: [f32; 3]) -> Self {
        self.translation = Some(translation);
        self
    }

    /// Rotation quaternion as `[x, y, z, w]`
    pub fn rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn scale(mut self, scale: [f32; 3]) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Column-major local matrix
    pub fn matrix(mut self, matrix: [f32; 16]) -> Self {
        self.matrix = Some(matrix);
        self
    }

    pub fn children(mut self, children: &[u32]) -> Self {
        self.children = children.to_vec();
        self
    }

    pub fn mesh(mut self, mesh: u32) -> Self {
        self.mesh = Some(mesh);
        self
    }

    fn to_json(&self) -> Value {
        let mut node = Map::new();
        if let Some(name) = &self.name {
            node.insert("name".into(), json!(name));
        }
        if let Some(t) = self.translation {
            node.insert("translation".into(), json!(t));
        }
        if let Some(r) = self.rotation {
            node.insert("rotation".into(), json!(r));
        }
        if let Some(s) = self.scale {
            node.insert("scale".into(), json!(s));
        }
        if let Some(m) = self.matrix {
            node.insert("matrix".into(), json!(m.to_vec()));
        }
        if !self.children.is_empty() {
            node.insert("children".into(), json!(self.children));
        }
        if let Some(mesh) = self.mesh {
            node.insert("mesh".into(), json!(mesh));
        }
        Value::Object(node)
    }
}

/// A PBR material with optional texture slots (texture indices).
#[derive(Debug, Clone, Default)]
pub struct Material {
    pub name: Option<String>,
    pub base_color_factor: Option<[f32; 4]>,
    pub metallic_factor: Option<f32>,
    pub roughness_factor: Option<f32>,
    pub base_color_texture: Option<u32>,
    pub metallic_roughness_texture: Option<u32>,
    pub normal_texture: Option<u32>,
    pub occlusion_texture: Option<u32>,
    pub emissive_texture: Option<u32>,
    pub emissive_factor: Option<[f32; 3]>,
    /// "OPAQUE", "MASK" or "BLEND"
    pub alpha_mode: Option<&'static str>,
    pub alpha_cutoff: Option<f32>,
    pub double_sided: bool,
}

impl Material {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn to_json(&self) -> Value {
        let mut pbr = Map::new();
        if let Some(f) = self.base_color_factor {
            pbr.insert("baseColorFactor".into(), json!(f));
        }
        if let Some(f) = self.metallic_factor {
            pbr.insert("metallicFactor".into(), json!(f));
        }
        if let Some(f) = self.roughness_factor {
            pbr.insert("roughnessFactor".into(), json!(f));
        }
        if let Some(t) = self.base_color_texture {
            pbr.insert("baseColorTexture".into(), json!({ "index": t }));
        }
        if let Some(t) = self.metallic_roughness_texture {
            pbr.insert("metallicRoughnessTexture".into(), json!({ "index": t }));
        }

        let mut material = Map::new();
        material.insert("pbrMetallicRoughness".into(), Value::Object(pbr));
        if let Some(name) = &self.name {
            material.insert("name".into(), json!(name));
        }
        if let Some(t) = self.normal_texture {
            material.insert("normalTexture".into(), json!({ "index": t }));
        }
        if let Some(t) = self.occlusion_texture {
            material.insert("occlusionTexture".into(), json!({ "index": t }));
        }
        if let Some(t) = self.emissive_texture {
            material.insert("emissiveTexture".into(), json!({ "index": t }));
        }
        if let Some(f) = self.emissive_factor {
            material.insert("emissiveFactor".into(), json!(f));
        }
        if let Some(mode) = self.alpha_mode {
            material.insert("alphaMode".into(), json!(mode));
        }
        if let Some(cutoff) = self.alpha_cutoff {
            material.insert("alphaCutoff".into(), json!(cutoff));
        }
        if self.double_sided {
            material.insert("doubleSided".into(), json!(true));
        }
        Value::Object(material)
    }
}

/// Builder for complete glTF documents
#[derive(Default)]
pub struct GltfBuilder {
    nodes: Vec<Value>,
    meshes: Vec<Value>,
    materials: Vec<Value>,
    images: Vec<Value>,
    textures: Vec<Value>,
    scene_roots: Option<Vec<u32>>,
}

impl GltfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its index
    pub fn add_node(&mut self, node: Node) -> u32 {
        self.nodes.push(node.to_json());
        self.nodes.len() as u32 - 1
    }

    /// Add a mesh made of `primitives`, returning its index
    pub fn add_mesh(&mut self, name: &str, primitives: &[PrimitiveAccessors]) -> u32 {
        let mut mesh = json!({
            "primitives": primitives.iter().map(PrimitiveAccessors::to_json).collect::<Vec<_>>(),
        });
        if !name.is_empty() {
            mesh["name"] = json!(name);
        }
        self.meshes.push(mesh);
        self.meshes.len() as u32 - 1
    }

    pub fn add_material(&mut self, material: &Material) -> u32 {
        self.materials.push(material.to_json());
        self.materials.len() as u32 - 1
    }

    /// Image referenced by (relative) URI
    pub fn add_image_uri(&mut self, uri: &str) -> u32 {
        self.images.push(json!({ "uri": uri }));
        self.images.len() as u32 - 1
    }

    /// Image embedded in a buffer view
    pub fn add_image_view(&mut self, name: &str, view: ViewIndex, mime_type: &str) -> u32 {
        self.images.push(json!({
            "name": name,
            "bufferView": view.0,
            "mimeType": mime_type,
        }));
        self.images.len() as u32 - 1
    }

    /// Texture sampling `image`
    pub fn add_texture(&mut self, image: u32) -> u32 {
        self.textures.push(json!({ "source": image }));
        self.textures.len() as u32 - 1
    }

    /// Set the default scene's root nodes
    pub fn scene(&mut self, roots: &[u32]) {
        self.scene_roots = Some(roots.to_vec());
    }

    /// Build the JSON document. `buffer_uri` names an external .bin file;
    /// `None` means the buffer is the GLB binary chunk.
    pub fn build_json(&self, buffer: &BufferBuilder, buffer_uri: Option<&str>) -> Value {
        let mut root = Map::new();
        root.insert(
            "asset".into(),
            json!({ "version": "2.0", "generator": "glb-builder" }),
        );

        let mut gltf_buffer = json!({ "byteLength": buffer.data().len() });
        if let Some(uri) = buffer_uri {
            gltf_buffer["uri"] = json!(uri);
        }
        root.insert("buffers".into(), json!([gltf_buffer]));

        let sections = [
            ("bufferViews", buffer.views()),
            ("accessors", buffer.accessors()),
            ("nodes", self.nodes.as_slice()),
            ("meshes", self.meshes.as_slice()),
            ("materials", self.materials.as_slice()),
            ("images", self.images.as_slice()),
            ("textures", self.textures.as_slice()),
        ];
        for (key, items) in sections {
            if !items.is_empty() {
                root.insert(key.into(), Value::Array(items.to_vec()));
            }
        }

        if let Some(roots) = &self.scene_roots {
            root.insert("scenes".into(), json!([{ "nodes": roots }]));
            root.insert("scene".into(), json!(0));
        }
        Value::Object(root)
    }

    /// Build a binary GLB with the buffer as its binary chunk.
    pub fn build_glb(&self, buffer: &BufferBuilder) -> Vec<u8> {
        assemble_glb(&self.build_json(buffer, None), buffer.data())
    }
}
