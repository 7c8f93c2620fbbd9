//! Low-level buffer packing with automatic alignment and accessor creation

use crate::utils::{align_buffer, compute_bounds};
use serde_json::{Value, json};

/// glTF component type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ComponentType {
    I8 = 5120,
    U8 = 5121,
    I16 = 5122,
    U16 = 5123,
    U32 = 5125,
    F32 = 5126,
}

impl ComponentType {
    pub fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }
}

/// Accessor index returned by buffer operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorIndex(pub u32);

/// Buffer view index returned by buffer operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewIndex(pub u32);

const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// Builder for binary buffer with automatic alignment
#[derive(Default)]
pub struct BufferBuilder {
    buffer: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl BufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the binary buffer data
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn views(&self) -> &[Value] {
        &self.views
    }

    pub fn accessors(&self) -> &[Value] {
        &self.accessors
    }

    /// Append raw bytes as a new buffer view.
    pub fn push_view(
        &mut self,
        bytes: &[u8],
        stride: Option<usize>,
        target: Option<u32>,
    ) -> ViewIndex {
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);
        align_buffer(&mut self.buffer);

        let mut view = json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
        });
        if let Some(stride) = stride {
            view["byteStride"] = json!(stride);
        }
        if let Some(target) = target {
            view["target"] = json!(target);
        }
        self.views.push(view);
        ViewIndex(self.views.len() as u32 - 1)
    }

    /// Add an accessor reading `count` elements from `view` at `byte_offset`.
    #[allow(clippy::too_many_arguments)]
    pub fn push_accessor(
        &mut self,
        view: ViewIndex,
        byte_offset: usize,
        component_type: ComponentType,
        type_: &str,
        count: usize,
        normalized: bool,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
    ) -> AccessorIndex {
        let mut accessor = json!({
            "bufferView": view.0,
            "byteOffset": byte_offset,
            "componentType": component_type as u32,
            "count": count,
            "type": type_,
        });
        if normalized {
            accessor["normalized"] = json!(true);
        }
        if let Some((min, max)) = bounds {
            accessor["min"] = json!(min);
            accessor["max"] = json!(max);
        }
        self.accessors.push(accessor);
        AccessorIndex(self.accessors.len() as u32 - 1)
    }

    /// Pack Vec3 positions with bounds calculation
    pub fn pack_positions(&mut self, positions: &[[f32; 3]]) -> AccessorIndex {
        let view = self.push_view(bytemuck::cast_slice(positions), None, Some(ARRAY_BUFFER));
        self.push_accessor(
            view,
            0,
            ComponentType::F32,
            "VEC3",
            positions.len(),
            false,
            Some(compute_bounds(positions)),
        )
    }

    /// Pack Vec3 data (normals)
    pub fn pack_vec3(&mut self, data: &[[f32; 3]]) -> AccessorIndex {
        let view = self.push_view(bytemuck::cast_slice(data), None, Some(ARRAY_BUFFER));
        self.push_accessor(view, 0, ComponentType::F32, "VEC3", data.len(), false, None)
    }

    /// Pack Vec2 data (UVs)
    pub fn pack_vec2(&mut self, data: &[[f32; 2]]) -> AccessorIndex {
        let view = self.push_view(bytemuck::cast_slice(data), None, Some(ARRAY_BUFFER));
        self.push_accessor(view, 0, ComponentType::F32, "VEC2", data.len(), false, None)
    }

    /// Pack u16 UVs as normalized integers
    pub fn pack_uv_unorm16(&mut self, data: &[[u16; 2]]) -> AccessorIndex {
        let view = self.push_view(bytemuck::cast_slice(data), None, Some(ARRAY_BUFFER));
        self.push_accessor(view, 0, ComponentType::U16, "VEC2", data.len(), true, None)
    }

    /// Pack an index list of the given component type (U8, I16, U16 or U32).
    pub fn pack_indices(
        &mut self,
        indices: &[u32],
        component_type: ComponentType,
    ) -> AccessorIndex {
        let bytes: Vec<u8> = match component_type {
            ComponentType::U8 | ComponentType::I8 => indices.iter().map(|&i| i as u8).collect(),
            ComponentType::U16 | ComponentType::I16 => indices
                .iter()
                .flat_map(|&i| (i as u16).to_le_bytes())
                .collect(),
            ComponentType::U32 | ComponentType::F32 => {
                indices.iter().flat_map(|&i| i.to_le_bytes()).collect()
            }
        };
        let view = self.push_view(&bytes, None, Some(ELEMENT_ARRAY_BUFFER));
        self.push_accessor(view, 0, component_type, "SCALAR", indices.len(), false, None)
    }

    /// Pack position/normal/uv interleaved in one view with a 32-byte stride.
    ///
    /// Returns the (position, normal, uv) accessors.
    pub fn pack_interleaved(
        &mut self,
        positions: &[[f32; 3]],
        normals: &[[f32; 3]],
        uvs: &[[f32; 2]],
    ) -> (AccessorIndex, AccessorIndex, AccessorIndex) {
        const STRIDE: usize = 32;
        let mut bytes = Vec::with_capacity(positions.len() * STRIDE);
        for ((p, n), uv) in positions.iter().zip(normals).zip(uvs) {
            bytes.extend_from_slice(bytemuck::cast_slice(p));
            bytes.extend_from_slice(bytemuck::cast_slice(n));
            bytes.extend_from_slice(bytemuck::cast_slice(uv));
        }

        let view = self.push_view(&bytes, Some(STRIDE), Some(ARRAY_BUFFER));
        let count = positions.len();
        let position = self.push_accessor(
            view,
            0,
            ComponentType::F32,
            "VEC3",
            count,
            false,
            Some(compute_bounds(positions)),
        );
        let normal = self.push_accessor(view, 12, ComponentType::F32, "VEC3", count, false, None);
        let uv = self.push_accessor(view, 24, ComponentType::F32, "VEC2", count, false, None);
        (position, normal, uv)
    }

    /// Store encoded image bytes (PNG/JPEG) as a buffer view.
    pub fn pack_image(&mut self, encoded: &[u8]) -> ViewIndex {
        self.push_view(encoded, None, None)
    }
}
