//! Primitive extraction: glTF attributes to packed vertex and index buffers

use gltf::accessor::{DataType, Dimensions};
use gltf::mesh::Mode;
use kiln_common::{VertexFormat, VertexP32N8C8V16, VertexPncvF32};

use crate::config::MissingAttributes;
use crate::error::ImportError;

const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];
const DEFAULT_UV: [f32; 2] = [0.0, 0.0];

/// Vertex and index data for one primitive, ready for the mesh packer.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveData {
    pub vertices: Vec<VertexPncvF32>,
    /// Triangle list, winding already flipped
    pub indices: Vec<u32>,
}

impl PrimitiveData {
    /// Encode vertices in `format`.
    pub fn vertex_bytes(&self, format: VertexFormat) -> Vec<u8> {
        match format {
            VertexFormat::P32N8C8V16 => {
                let packed: Vec<VertexP32N8C8V16> = self
                    .vertices
                    .iter()
                    .map(VertexP32N8C8V16::from_pncv)
                    .collect();
                bytemuck::cast_slice(&packed).to_vec()
            }
            _ => bytemuck::cast_slice(&self.vertices).to_vec(),
        }
    }

    /// Encode indices as u16 when they all fit, else u32. Returns `(bytes, index_size)`.
    pub fn index_bytes(&self) -> (Vec<u8>, u8) {
        let fits_u16 = self.indices.iter().all(|&i| i <= u16::MAX as u32);
        if fits_u16 {
            let narrow: Vec<u16> = self.indices.iter().map(|&i| i as u16).collect();
            (bytemuck::cast_slice(&narrow).to_vec(), 2)
        } else {
            (bytemuck::cast_slice(&self.indices).to_vec(), 4)
        }
    }
}

/// Swap the second and third index of every triangle.
pub fn flip_winding(indices: &mut [u32]) {
    for triangle in indices.chunks_exact_mut(3) {
        triangle.swap(1, 2);
    }
}

/// Bytes covered by `count` elements of `element_size` placed `stride` apart,
/// starting `offset` bytes into a view. `None` on overflow.
fn accessor_end(offset: usize, count: usize, stride: usize, element_size: usize) -> Option<usize> {
    let span = match count.checked_sub(1) {
        None => 0,
        Some(last) => last.checked_mul(stride)?.checked_add(element_size)?,
    };
    offset.checked_add(span)
}

/// Check that `count` elements at `offset` within `view` lie inside its buffer.
fn check_view_range(
    accessor: usize,
    view: &gltf::buffer::View,
    offset: usize,
    count: usize,
    stride: usize,
    element_size: usize,
    buffers: &[gltf::buffer::Data],
) -> Result<(), ImportError> {
    let buffer_index = view.buffer().index();
    let buffer = buffers
        .get(buffer_index)
        .ok_or(ImportError::MissingBuffer(buffer_index))?;

    let view_end = view
        .offset()
        .checked_add(view.length())
        .filter(|&end| end <= buffer.len());
    if view_end.is_none() {
        return Err(ImportError::AccessorOutOfBounds {
            accessor,
            needed: view.offset().saturating_add(view.length()),
            available: buffer.len(),
        });
    }

    match accessor_end(offset, count, stride, element_size) {
        Some(needed) if needed <= view.length() => Ok(()),
        needed => Err(ImportError::AccessorOutOfBounds {
            accessor,
            needed: needed.unwrap_or(usize::MAX),
            available: view.length(),
        }),
    }
}

/// Validate an accessor before handing it to the gltf reader.
///
/// The reader trusts the document's layout and byte ranges, so anything it
/// would misread or slice out of bounds is turned into an [`ImportError`].
fn check_accessor(
    accessor: &gltf::Accessor,
    what: &'static str,
    layouts: &[(DataType, Dimensions)],
    buffers: &[gltf::buffer::Data],
) -> Result<(), ImportError> {
    let index = accessor.index();
    if !layouts.contains(&(accessor.data_type(), accessor.dimensions())) {
        return Err(ImportError::UnsupportedAccessor {
            accessor: index,
            what,
            data_type: accessor.data_type(),
            dimensions: accessor.dimensions(),
        });
    }

    let element_size = accessor.size();
    match accessor.view() {
        Some(view) => check_view_range(
            index,
            &view,
            accessor.offset(),
            accessor.count(),
            view.stride().unwrap_or(element_size),
            element_size,
            buffers,
        )?,
        None if accessor.sparse().is_none() => return Err(ImportError::MissingBufferView(index)),
        // sparse-only accessors start from zeros
        None => {}
    }

    if let Some(sparse) = accessor.sparse() {
        let indices = sparse.indices();
        let index_size = indices.index_type().size();
        check_view_range(
            index,
            &indices.view(),
            indices.offset(),
            sparse.count(),
            index_size,
            index_size,
            buffers,
        )?;
        let values = sparse.values();
        check_view_range(
            index,
            &values.view(),
            values.offset(),
            sparse.count(),
            element_size,
            element_size,
            buffers,
        )?;
    }
    Ok(())
}

const VEC3_F32: &[(DataType, Dimensions)] = &[(DataType::F32, Dimensions::Vec3)];

/// Texture coordinates the reader can widen to f32.
const UV_LAYOUTS: &[(DataType, Dimensions)] = &[
    (DataType::F32, Dimensions::Vec2),
    (DataType::U8, Dimensions::Vec2),
    (DataType::U16, Dimensions::Vec2),
];

/// glTF allows unsigned indices only; I16 shows up from some exporters and is read as u16.
const INDEX_LAYOUTS: &[(DataType, Dimensions)] = &[
    (DataType::U8, Dimensions::Scalar),
    (DataType::U16, Dimensions::Scalar),
    (DataType::I16, Dimensions::Scalar),
    (DataType::U32, Dimensions::Scalar),
];

/// Extract one primitive's vertices (color mirrors the normal) and triangle indices.
pub(crate) fn extract_primitive(
    primitive: &gltf::Primitive,
    mesh: usize,
    buffers: &[gltf::buffer::Data],
    missing: MissingAttributes,
) -> Result<PrimitiveData, ImportError> {
    let index = primitive.index();
    if primitive.mode() != Mode::Triangles {
        return Err(ImportError::UnsupportedMode {
            mesh,
            primitive: index,
            mode: primitive.mode(),
        });
    }

    let missing_attribute = |attribute| ImportError::MissingAttribute {
        mesh,
        primitive: index,
        attribute,
    };
    let unreadable = |accessor: &gltf::Accessor| match accessor.view() {
        Some(view) => ImportError::MissingBuffer(view.buffer().index()),
        None => ImportError::MissingBufferView(accessor.index()),
    };

    let position_accessor = primitive
        .get(&gltf::Semantic::Positions)
        .ok_or_else(|| missing_attribute("POSITION"))?;
    check_accessor(&position_accessor, "POSITION", VEC3_F32, buffers)?;
    if let Some(accessor) = primitive.get(&gltf::Semantic::Normals) {
        check_accessor(&accessor, "NORMAL", VEC3_F32, buffers)?;
    }
    if let Some(accessor) = primitive.get(&gltf::Semantic::TexCoords(0)) {
        check_accessor(&accessor, "TEXCOORD_0", UV_LAYOUTS, buffers)?;
    }
    if let Some(accessor) = primitive.indices() {
        check_accessor(&accessor, "indices", INDEX_LAYOUTS, buffers)?;
    }

    // buffer ranges were checked above, so a `None` from the reader means the attribute is absent
    let get_buffer =
        |buffer: gltf::Buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice());
    let reader = primitive.reader(get_buffer);

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| unreadable(&position_accessor))?
        .collect();
    let vertex_count = positions.len();

    let check_count = |attribute, other: usize| {
        if other == vertex_count {
            Ok(())
        } else {
            Err(ImportError::AttributeCountMismatch {
                mesh,
                primitive: index,
                attribute,
                positions: vertex_count,
                other,
            })
        }
    };

    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(normals) => {
            let normals: Vec<_> = normals.collect();
            check_count("NORMAL", normals.len())?;
            normals
        }
        None if missing == MissingAttributes::Default => {
            tracing::debug!("mesh {} primitive {}: defaulting NORMAL", mesh, index);
            vec![DEFAULT_NORMAL; vertex_count]
        }
        None => return Err(missing_attribute("NORMAL")),
    };

    let uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
        Some(uvs) => {
            let uvs: Vec<_> = uvs.into_f32().collect();
            check_count("TEXCOORD_0", uvs.len())?;
            uvs
        }
        None if missing == MissingAttributes::Default => {
            tracing::debug!("mesh {} primitive {}: defaulting TEXCOORD_0", mesh, index);
            vec![DEFAULT_UV; vertex_count]
        }
        None => return Err(missing_attribute("TEXCOORD_0")),
    };

    let vertices = positions
        .iter()
        .zip(&normals)
        .zip(&uvs)
        .map(|((position, normal), uv)| VertexPncvF32 {
            position: *position,
            normal: *normal,
            color: *normal,
            uv: *uv,
        })
        .collect();

    let mut indices: Vec<u32> = match primitive.indices() {
        // the reader only decodes unsigned index types
        Some(accessor) if accessor.data_type() == DataType::I16 => {
            let fallback = unreadable(&accessor);
            gltf::accessor::Iter::<i16>::new(accessor, get_buffer)
                .ok_or(fallback)?
                .map(|i| i as u16 as u32)
                .collect()
        }
        Some(accessor) => reader
            .read_indices()
            .ok_or_else(|| unreadable(&accessor))?
            .into_u32()
            .collect(),
        None => (0..vertex_count as u32).collect(),
    };
    if indices.len() % 3 != 0 {
        return Err(ImportError::IncompleteTriangle {
            mesh,
            primitive: index,
            count: indices.len(),
        });
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(ImportError::IndexOutOfRange {
            mesh,
            primitive: index,
            index: bad,
            vertex_count,
        });
    }
    flip_winding(&mut indices);

    Ok(PrimitiveData { vertices, indices })
}
