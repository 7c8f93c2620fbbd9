//! GLB/glTF construction for importer tests
//!
//! Builder-pattern APIs for assembling scene files in memory:
//! - BufferBuilder: pack binary data with alignment, create views and accessors
//! - MeshBuilder: one primitive's attributes and indices, tight or interleaved
//! - GltfBuilder: nodes, meshes, materials, images, textures
//!
//! # Example
//!
//! ```no_run
//! use glb_builder::*;
//!
//! let mut buffer = BufferBuilder::new();
//! let triangle = MeshBuilder::new()
//!     .positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]])
//!     .normals(&[[0.0, 0.0, 1.0]; 3])
//!     .uvs(&[[0.0, 0.0]; 3])
//!     .indices(&[0, 1, 2])
//!     .build(&mut buffer);
//!
//! let mut gltf = GltfBuilder::new();
//! let mesh = gltf.add_mesh("Triangle", &[triangle]);
//! gltf.add_node(Node::new().name("Root").mesh(mesh));
//! let glb_bytes = gltf.build_glb(&buffer);
//! ```

pub mod buffer;
pub mod document;
pub mod mesh;
pub mod utils;

pub use buffer::{AccessorIndex, BufferBuilder, ComponentType, ViewIndex};
pub use document::{GltfBuilder, Material, Node};
pub use mesh::{MeshBuilder, PrimitiveAccessors};
pub use utils::{align_buffer, assemble_glb, compute_bounds};

pub use serde_json::Value;
