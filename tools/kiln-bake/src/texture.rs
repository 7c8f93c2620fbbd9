//! Image to texture container conversion

use anyhow::{Context, Result};
use kiln_common::{AssetContainer, TextureFormat, pack_texture, write_container};
use std::path::Path;

/// Source image extensions baked by the driver.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Pack a decoded image as an RGBA8 texture.
pub fn pack_image(image: &image::DynamicImage, original_file: &str) -> Result<AssetContainer> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    pack_texture(width, height, TextureFormat::Rgba8, original_file, rgba.as_raw())
        .with_context(|| format!("Failed to pack texture: {original_file}"))
}

/// Load an image file and write it as a texture container.
///
/// Decode failures come back as [`image::ImageError`] inside the error chain,
/// which the driver treats as skippable.
pub fn bake_image_file(source: &Path, output: &Path, original_file: &str) -> Result<()> {
    let start = std::time::Instant::now();
    let image =
        image::open(source).with_context(|| format!("Failed to load image: {}", source.display()))?;
    let container = pack_image(&image, original_file)?;
    write_container(output, &container)
        .with_context(|| format!("Failed to write texture: {}", output.display()))?;

    tracing::info!(
        "Baked texture {} ({}x{}) in {:.1?}",
        original_file,
        image.width(),
        image.height(),
        start.elapsed()
    );
    Ok(())
}
