//! kiln-bake library
//!
//! Offline conversion of source images and glTF/GLB scenes into kiln
//! containers, plus the manifests listing them. The `kiln-bake` binary is a
//! thin wrapper around [`driver::run`].

pub mod config;
pub mod driver;
pub mod error;
pub mod manifest;
pub mod scene;
pub mod texture;

pub use config::{BakeConfig, MissingAttributes};
pub use driver::{BakeOptions, BakeReport, run};
pub use error::{BakeError, ImportError};
pub use scene::{
    BakedAsset, ImportOptions, ImportedScene, LoadedScene, ScenePaths, import_scene, load_scene,
    load_scene_from_slice,
};
