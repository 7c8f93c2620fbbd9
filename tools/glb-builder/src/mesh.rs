//! High-level primitive construction

use crate::buffer::{AccessorIndex, BufferBuilder, ComponentType};
use serde_json::{Value, json};

/// glTF primitive mode codes
pub const MODE_POINTS: u32 = 0;
pub const MODE_LINES: u32 = 1;
pub const MODE_TRIANGLES: u32 = 4;

/// Accessor indices for one primitive
#[derive(Debug, Clone)]
pub struct PrimitiveAccessors {
    pub positions: AccessorIndex,
    pub normals: Option<AccessorIndex>,
    pub uvs: Option<AccessorIndex>,
    pub indices: Option<AccessorIndex>,
    pub material: Option<u32>,
    pub mode: u32,
}

impl PrimitiveAccessors {
    pub fn to_json(&self) -> Value {
        let mut attributes = json!({ "POSITION": self.positions.0 });
        if let Some(normals) = self.normals {
            attributes["NORMAL"] = json!(normals.0);
        }
        if let Some(uvs) = self.uvs {
            attributes["TEXCOORD_0"] = json!(uvs.0);
        }

        let mut primitive = json!({ "attributes": attributes, "mode": self.mode });
        if let Some(indices) = self.indices {
            primitive["indices"] = json!(indices.0);
        }
        if let Some(material) = self.material {
            primitive["material"] = json!(material);
        }
        primitive
    }
}

/// Builder for mesh primitive data
pub struct MeshBuilder {
    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    uvs: Option<Vec<[f32; 2]>>,
    indices: Option<Vec<u32>>,
    index_type: ComponentType,
    material: Option<u32>,
    mode: u32,
    interleaved: bool,
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: None,
            uvs: None,
            indices: None,
            index_type: ComponentType::U16,
            material: None,
            mode: MODE_TRIANGLES,
            interleaved: false,
        }
    }

    /// Set positions (required)
    pub fn positions(mut self, positions: &[[f32; 3]]) -> Self {
        self.positions = positions.to_vec();
        self
    }

    pub fn normals(mut self, normals: &[[f32; 3]]) -> Self {
        self.normals = Some(normals.to_vec());
        self
    }

    pub fn uvs(mut self, uvs: &[[f32; 2]]) -> Self {
        self.uvs = Some(uvs.to_vec());
        self
    }

    /// Set indices, stored as u16 unless [`MeshBuilder::index_type`] says otherwise
    pub fn indices(mut self, indices: &[u32]) -> Self {
        self.indices = Some(indices.to_vec());
        self
    }

    pub fn index_type(mut self, component_type: ComponentType) -> Self {
        self.index_type = component_type;
        self
    }

    pub fn material(mut self, material: u32) -> Self {
        self.material = Some(material);
        self
    }

    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Store position/normal/uv in a single strided view (needs all three attributes)
    pub fn interleaved(mut self) -> Self {
        self.interleaved = true;
        self
    }

    /// Pack into buffer and return accessor indices
    pub fn build(self, buffer: &mut BufferBuilder) -> PrimitiveAccessors {
        let (positions, normals, uvs) = match (&self.normals, &self.uvs) {
            (Some(normals), Some(uvs)) if self.interleaved => {
                let (p, n, uv) = buffer.pack_interleaved(&self.positions, normals, uvs);
                (p, Some(n), Some(uv))
            }
            _ => (
                buffer.pack_positions(&self.positions),
                self.normals.as_ref().map(|n| buffer.pack_vec3(n)),
                self.uvs.as_ref().map(|uv| buffer.pack_vec2(uv)),
            ),
        };
        let indices = self
            .indices
            .as_ref()
            .map(|indices| buffer.pack_indices(indices, self.index_type));

        PrimitiveAccessors {
            positions,
            normals,
            uvs,
            indices,
            material: self.material,
            mode: self.mode,
        }
    }
}
