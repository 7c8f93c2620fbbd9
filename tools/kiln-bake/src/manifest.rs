//! Include-style manifest files listing baked containers
//!
//! One file per asset type, one line per container:
//!
//! ```text
//! MESH_ASSET(MESH_0_Cube, "props/crate_GLTF/MESH_0_Cube.mesh")
//! ```

use anyhow::{Context, Result};
use std::fmt::Write as FmtWrite;
use std::path::Path;

use crate::config::ManifestSection;
use crate::driver::BakeReport;

pub const TEXTURE_MANIFEST: &str = "textures.inl";
pub const MESH_MANIFEST: &str = "meshes.inl";
pub const MATERIAL_MANIFEST: &str = "materials.inl";
pub const PREFAB_MANIFEST: &str = "prefabs.inl";

/// Container file name without its extension, with every `.` replaced by `_`.
pub fn identifier(path: &str) -> String {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = match file.rfind('.') {
        Some(i) => &file[..i],
        None => file,
    };
    stem.replace('.', "_")
}

/// Double every backslash so the path survives as a C string literal.
pub fn escape_path(path: &str) -> String {
    path.replace('\\', "\\\\")
}

/// Render one manifest.
pub fn render_manifest(macro_name: &str, paths: &[String]) -> Result<String> {
    let mut output = String::new();
    for path in paths {
        writeln!(
            output,
            "{}({}, \"{}\")",
            macro_name,
            identifier(path),
            escape_path(path)
        )?;
    }
    Ok(output)
}

/// Write all four manifests into `dir`.
pub fn write_manifests(dir: &Path, report: &BakeReport, macros: &ManifestSection) -> Result<()> {
    let manifests = [
        (TEXTURE_MANIFEST, macros.texture_macro.as_str(), &report.textures),
        (MESH_MANIFEST, macros.mesh_macro.as_str(), &report.meshes),
        (MATERIAL_MANIFEST, macros.material_macro.as_str(), &report.materials),
        (PREFAB_MANIFEST, macros.prefab_macro.as_str(), &report.prefabs),
    ];

    for (file_name, macro_name, paths) in manifests {
        let path = dir.join(file_name);
        std::fs::write(&path, render_manifest(macro_name, paths)?)
            .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
        tracing::info!("Wrote {} ({} entries)", path.display(), paths.len());
    }
    Ok(())
}
