//! Conversion driver: walk the input tree, bake every asset, write manifests

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

use crate::config::ManifestSection;
use crate::error::BakeError;
use crate::manifest::write_manifests;
use crate::scene::{
    ImportOptions, SCENE_EXTENSIONS, ScenePaths, import_scene, load_scene, slash_path,
};
use crate::texture::{IMAGE_EXTENSIONS, bake_image_file};
use kiln_common::BAKED_FORMAT;

#[derive(Debug, Clone)]
pub struct BakeOptions {
    pub input_dir: PathBuf,
    pub manifest_dir: PathBuf,
    pub baked_dir: PathBuf,
    pub import: ImportOptions,
    pub manifest: ManifestSection,
}

/// Baked container paths (relative to the baked root) in the order they were produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BakeReport {
    pub textures: Vec<String>,
    pub meshes: Vec<String>,
    pub materials: Vec<String>,
    pub prefabs: Vec<String>,
    /// Source files that failed and were skipped
    pub skipped: Vec<String>,
}

enum SourceKind {
    Image,
    Scene,
}

fn classify(path: &Path) -> Option<SourceKind> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceKind::Image)
    } else if SCENE_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceKind::Scene)
    } else {
        None
    }
}

/// Source files under `input_dir`, sorted, images first then scenes.
///
/// Anything under `exclude` (output directories nested in the input) is skipped.
fn collect_sources(
    input_dir: &Path,
    exclude: &[PathBuf],
) -> anyhow::Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut images = Vec::new();
    let mut scenes = Vec::new();

    let walker = WalkDir::new(input_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let path = entry.path();
            !exclude.iter().any(|dir| {
                path.canonicalize()
                    .map(|p| p.starts_with(dir))
                    .unwrap_or(false)
            })
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", input_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        match classify(entry.path()) {
            Some(SourceKind::Image) => images.push(entry.into_path()),
            Some(SourceKind::Scene) => scenes.push(entry.into_path()),
            None => {}
        }
    }
    Ok((images, scenes))
}

fn relative<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

fn create_dir(dir: &Path) -> Result<PathBuf, BakeError> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    Ok(dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve directory: {}", dir.display()))?)
}

/// Run a full bake.
///
/// Images are baked before scenes so scene materials can reference them. A
/// scene that cannot be parsed aborts the run; import errors and unreadable
/// images only skip that file.
pub fn run(options: &BakeOptions) -> Result<BakeReport, BakeError> {
    if !options.input_dir.is_dir() {
        return Err(BakeError::InvalidInputDir(options.input_dir.clone()));
    }
    let start = Instant::now();

    let baked_dir = create_dir(&options.baked_dir)?;
    let manifest_dir = create_dir(&options.manifest_dir)?;
    let input_dir = options.input_dir.as_path();

    let exclude = [baked_dir.clone(), manifest_dir.clone()];
    let (images, scenes) = collect_sources(input_dir, &exclude)?;
    tracing::info!(
        "Found {} images and {} scenes in {}",
        images.len(),
        scenes.len(),
        input_dir.display()
    );

    let mut report = BakeReport::default();

    for source in &images {
        let rel = relative(source, input_dir);
        let baked = slash_path(&rel.with_extension(BAKED_FORMAT.texture_ext));
        // `a.png` and `a.jpg` bake to the same file; the first one baked keeps it
        if report.textures.contains(&baked) {
            tracing::warn!(
                "Skipping image {}: {} was already baked from another source",
                rel.display(),
                baked
            );
            report.skipped.push(slash_path(rel));
            continue;
        }
        let output = baked_dir.join(&baked);
        if let Some(parent) = output.parent() {
            create_dir(parent)?;
        }

        match bake_image_file(source, &output, &slash_path(rel)) {
            Ok(()) => report.textures.push(baked),
            Err(err) if err.downcast_ref::<image::ImageError>().is_some() => {
                tracing::error!("Skipping image {}: {:#}", rel.display(), err);
                report.skipped.push(slash_path(rel));
            }
            Err(err) => return Err(err.into()),
        }
    }

    for source in &scenes {
        let rel = relative(source, input_dir);
        let file_start = Instant::now();

        let loaded = match load_scene(source) {
            Ok(loaded) => loaded,
            Err(gltf::Error::Validation(errors)) => {
                tracing::error!(
                    "Skipping scene {}: {} validation errors (first: {:?})",
                    rel.display(),
                    errors.len(),
                    errors.first()
                );
                report.skipped.push(slash_path(rel));
                continue;
            }
            Err(source_err) => {
                return Err(BakeError::SceneParse {
                    path: source.clone(),
                    source: source_err,
                });
            }
        };

        let paths = ScenePaths::new(rel);
        let scene = match import_scene(&loaded, &paths, &options.import) {
            Ok(scene) => scene,
            Err(err) => {
                tracing::error!("Skipping scene {}: {}", rel.display(), err);
                report.skipped.push(slash_path(rel));
                continue;
            }
        };
        scene.write(&baked_dir)?;

        tracing::info!(
            "Baked scene {}: {} meshes, {} materials, {} embedded textures, {} nodes in {:.1?}",
            paths.original_file,
            scene.meshes.len(),
            scene.materials.len(),
            scene.textures.len(),
            loaded.document.nodes().count(),
            file_start.elapsed()
        );

        report
            .textures
            .extend(scene.textures.into_iter().map(|a| a.path));
        report
            .materials
            .extend(scene.materials.into_iter().map(|a| a.path));
        report
            .meshes
            .extend(scene.meshes.into_iter().map(|a| a.path));
        report.prefabs.push(scene.prefab.path);
    }

    write_manifests(&manifest_dir, &report, &options.manifest)?;

    tracing::info!(
        "Bake complete: {} textures, {} meshes, {} materials, {} prefabs ({} skipped) in {:.1?}",
        report.textures.len(),
        report.meshes.len(),
        report.materials.len(),
        report.prefabs.len(),
        report.skipped.len(),
        start.elapsed()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert!(matches!(classify(Path::new("a/b.PNG")), Some(SourceKind::Image)));
        assert!(matches!(classify(Path::new("a.jpeg")), Some(SourceKind::Image)));
        assert!(matches!(classify(Path::new("scene.glb")), Some(SourceKind::Scene)));
        assert!(matches!(classify(Path::new("scene.gltf")), Some(SourceKind::Scene)));
        assert!(classify(Path::new("scene.bin")).is_none());
        assert!(classify(Path::new("README")).is_none());
    }

    #[test]
    fn test_collect_sources_sorted_and_excluding_output() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for file in ["b.png", "a.png", "sub/c.jpg", "z.glb", "m.gltf", "notes.txt"] {
            let path = root.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"").unwrap();
        }
        let out = root.join("out");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("old.png"), b"").unwrap();

        let (images, scenes) = collect_sources(root, &[out.canonicalize().unwrap()]).unwrap();
        let rel = |paths: &[PathBuf]| -> Vec<String> {
            paths.iter().map(|p| slash_path(relative(p, root))).collect()
        };
        assert_eq!(rel(&images), vec!["a.png", "b.png", "sub/c.jpg"]);
        assert_eq!(rel(&scenes), vec!["m.gltf", "z.glb"]);
    }

    #[test]
    fn test_missing_input_dir() {
        let dir = tempfile::tempdir().unwrap();
        let options = BakeOptions {
            input_dir: dir.path().join("nope"),
            manifest_dir: dir.path().join("manifests"),
            baked_dir: dir.path().join("baked"),
            import: ImportOptions::default(),
            manifest: ManifestSection::default(),
        };
        let err = run(&options).unwrap_err();
        assert_eq!(err.exit_code(), -2);
        assert!(!dir.path().join("baked").exists());
    }
}
