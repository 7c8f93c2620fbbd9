//! Baked asset formats for the kiln asset pipeline
//!
//! This crate is shared between:
//! - `kiln-bake` (offline baker, writes containers)
//! - engine-side loaders (read containers back)
//!
//! # Modules
//!
//! - [`container`] - Generic on-disk container (tag + version + metadata + payload)
//! - [`compression`] - LZ4 block compression with a size-based raw fallback
//! - [`formats`] - Per-type packers: texture, mesh, material, prefab

pub mod compression;
pub mod container;
pub mod formats;

pub use compression::{
    Compressed, CompressionError, CompressionMode, choose_mode, compress, decompress,
    decompress_into,
};
pub use container::{
    AssetContainer, AssetTag, CONTAINER_VERSION, ContainerError, HEADER_SIZE, read_container,
    write_container,
};
pub use formats::{
    BAKED_FORMAT, BakedFormat, FormatError, MaterialInfo, MeshBounds, MeshInfo, PrefabInfo,
    PrefabNodeMesh, TextureFormat, TextureInfo, TransparencyMode, VertexFormat, VertexP32N8C8V16,
    VertexPncvF32, calculate_bounds, pack_material, pack_mesh, pack_prefab, pack_texture,
    read_material_info, read_mesh_info, read_positions, read_prefab_info, read_texture_info, slots,
    unpack_mesh, unpack_texture,
};
