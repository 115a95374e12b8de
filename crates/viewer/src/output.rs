//! Frame output.

use anyhow::{Context, Result};
use render::CanvasSurface;
use render::Surface;
use std::path::Path;

/// Write the surface's backing store as an RGBA PNG.
pub fn write_png(surface: &CanvasSurface, path: &Path) -> Result<()> {
    let (width, height) = surface.backing_size();
    let image = image::RgbaImage::from_raw(width, height, surface.data().to_vec())
        .context("backing store does not match its reported size")?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// File name for frame `index`.
pub fn frame_file_name(index: u32) -> String {
    format!("frame_{:04}.png", index)
}
