// ============================================================
// Layer 4 — Aligned Image Loader
// ============================================================
// An aligned dataset is a directory of side-by-side pictures:
//
//   <dataroot>/<phase>/
//     0001.png   ┌─────────┬─────────┐
//     0002.png   │    A    │    B    │
//     ...        └─────────┴─────────┘
//
// The left half is domain A, the right half domain B. Both halves
// always share a size, which is what makes the pair "aligned".
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};
use image::{imageops, RgbImage};

const EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Every image file directly under `dir`, sorted by path.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("image directory '{}' does not exist", dir.display());
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
    {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            paths.push(path);
        }
    }
    paths.sort();
    tracing::debug!("Found {} images in '{}'", paths.len(), dir.display());
    Ok(paths)
}

pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path)
        .with_context(|| format!("Cannot open image '{}'", path.display()))?;
    Ok(img.to_rgb8())
}

/// Split a side-by-side picture into its (A, B) halves.
pub fn split_pair(ab: &RgbImage) -> Result<(RgbImage, RgbImage)> {
    let (w, h) = ab.dimensions();
    if w < 2 {
        bail!("aligned image is only {w} pixel(s) wide");
    }
    let half = w / 2;
    let a = imageops::crop_imm(ab, 0, 0, half, h).to_image();
    let b = imageops::crop_imm(ab, half, 0, half, h).to_image();
    Ok((a, b))
}
