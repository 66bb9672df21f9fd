// Writes visuals (real/fake images and watermarks) as PNG files.
//
//   checkpoints/samples/epoch003_iter000400_fake_B_img.png

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use image::RgbImage;

pub struct VisualWriter {
    dir: PathBuf,
}

impl VisualWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create visuals directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, epoch: usize, iters: usize, visuals: &[(&str, RgbImage)]) -> Result<()> {
        for (name, img) in visuals {
            let path = self.dir.join(format!("epoch{epoch:03}_iter{iters:06}_{name}.png"));
            save_png(&path, img)?;
        }
        tracing::debug!("Saved {} visuals for epoch {}, iters {}", visuals.len(), epoch, iters);
        Ok(())
    }
}

pub fn save_png(path: &Path, img: &RgbImage) -> Result<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Cannot write image '{}'", path.display()))
}
