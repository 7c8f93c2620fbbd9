//! Output naming for scene containers
//!
//! Every path here is relative to the baked root and uses `/` separators,
//! since these strings are written into materials and prefabs.

use kiln_common::BAKED_FORMAT;
use std::borrow::Cow;
use std::path::{Component, Path};

/// Render a relative path with `/` separators.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Replace characters that can't appear in a file name.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Swap the extension of the last path segment, keeping any directories.
fn with_extension(path: &str, ext: &str) -> String {
    let (dir, file) = match path.rfind('/') {
        Some(i) => (&path[..=i], &path[i + 1..]),
        None => ("", path),
    };
    let stem = match file.rfind('.') {
        Some(i) if i > 0 => &file[..i],
        _ => file,
    };
    format!("{dir}{stem}.{ext}")
}

/// Collapse `.` and `..` segments. Leading `..` that escape the root are dropped.
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            p => parts.push(p),
        }
    }
    parts.join("/")
}

/// Names for everything baked out of one scene file.
#[derive(Debug, Clone)]
pub struct ScenePaths {
    /// Source path relative to the input root
    pub original_file: String,
    /// Directory of the source file relative to the input root ("" at the root)
    pub source_dir: String,
    /// `<source_dir>/<stem>_GLTF`
    pub scene_dir: String,
    pub stem: String,
}

impl ScenePaths {
    pub fn new(relative_source: &Path) -> Self {
        let stem = relative_source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source_dir = relative_source.parent().map(slash_path).unwrap_or_default();
        let scene_dir = join(&source_dir, &format!("{stem}_GLTF"));
        Self {
            original_file: slash_path(relative_source),
            source_dir,
            scene_dir,
            stem,
        }
    }

    /// `MESH_<m>_<name>[_PRIM_<p>].mesh`; `primitive` is `None` for single-primitive meshes.
    pub fn mesh(&self, mesh: usize, name: &str, primitive: Option<usize>) -> String {
        let suffix = primitive.map(|p| format!("_PRIM_{p}")).unwrap_or_default();
        join(
            &self.scene_dir,
            &format!(
                "MESH_{mesh}_{}{suffix}.{}",
                sanitize(name),
                BAKED_FORMAT.mesh_ext
            ),
        )
    }

    pub fn material(&self, material: usize, name: &str) -> String {
        join(
            &self.scene_dir,
            &format!(
                "MAT_{material}_{}.{}",
                sanitize(name),
                BAKED_FORMAT.material_ext
            ),
        )
    }

    pub fn default_material(&self) -> String {
        join(
            &self.scene_dir,
            &format!("MAT_DEFAULT.{}", BAKED_FORMAT.material_ext),
        )
    }

    pub fn embedded_texture(&self, image: usize, name: &str) -> String {
        join(
            &self.scene_dir,
            &format!(
                "TEX_{image}_{}.{}",
                sanitize(name),
                BAKED_FORMAT.texture_ext
            ),
        )
    }

    /// Texture baked by the image pass for an image the scene references by URI.
    ///
    /// The URI is percent-decoded first; one that doesn't decode to UTF-8 is used as written.
    pub fn external_texture(&self, uri: &str) -> String {
        let decoded = urlencoding::decode(uri).unwrap_or(Cow::Borrowed(uri));
        let uri = decoded.replace('\\', "/");
        normalize(&with_extension(
            &join(&self.source_dir, &uri),
            BAKED_FORMAT.texture_ext,
        ))
    }

    pub fn prefab(&self) -> String {
        join(
            &self.scene_dir,
            &format!("{}.{}", self.stem, BAKED_FORMAT.prefab_ext),
        )
    }
}
