// ============================================================
// Layer 2 — GenerateUseCase
// ============================================================
// Runs a trained generator over every aligned image of a phase:
//
//   Step 1: Restore the generator      (Layer 5 - ml, Layer 6 - infra)
//   Step 2: List aligned images        (Layer 4 - data)
//   Step 3: For each image: split, pick the input half by direction,
//           translate, and write three PNGs to the results dir
//
//   results/
//     0001_real_A.png          ← conditioning input (resized)
//     0001_fake_B.png          ← generator output
//     0001_fake_watermark.png  ← watermark read from the output

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::prelude::*;

use crate::data::loader::{list_images, load_rgb, split_pair};
use crate::infra::{checkpoint::CheckpointManager, visuals::save_png};
use crate::ml::inferencer::Inferencer;

type InferBackend = burn::backend::Wgpu;

pub struct GenerateUseCase {
    checkpoint_dir: String,
    dataroot:       Option<String>,
    phase:          String,
    results_dir:    PathBuf,
}

impl GenerateUseCase {
    /// `dataroot` defaults to the one stored in train_config.json.
    pub fn new(
        checkpoint_dir: impl Into<String>,
        dataroot:       Option<String>,
        phase:          impl Into<String>,
        results_dir:    impl Into<PathBuf>,
    ) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            dataroot,
            phase:          phase.into(),
            results_dir:    results_dir.into(),
        }
    }

    /// Returns the number of images translated.
    pub fn execute(&self) -> Result<usize> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        self.execute_on::<InferBackend>(device)
    }

    fn execute_on<B: Backend>(&self, device: B::Device) -> Result<usize> {
        // ── Step 1: Restore the generator ─────────────────────────────────────
        let ckpt = CheckpointManager::new(&self.checkpoint_dir)?;
        let cfg  = ckpt.load_config()?;
        let inferencer = Inferencer::<B>::from_checkpoint(&ckpt, device)?;

        // ── Step 2: List aligned images ───────────────────────────────────────
        let dataroot = self.dataroot.clone().unwrap_or(cfg.dataroot);
        let dir      = Path::new(&dataroot).join(&self.phase);
        let paths    = list_images(&dir)?;
        tracing::info!("Translating {} images from '{}'", paths.len(), dir.display());

        fs::create_dir_all(&self.results_dir)
            .with_context(|| format!("Cannot create '{}'", self.results_dir.display()))?;

        // ── Step 3: Translate ─────────────────────────────────────────────────
        for path in &paths {
            let (a, b)     = split_pair(&load_rgb(path)?)?;
            let (input, _) = inferencer.direction().arrange(a, b);
            let out        = inferencer.translate(&input)?;

            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
            save_png(&self.results_dir.join(format!("{stem}_real_A.png")), &out.input)?;
            save_png(&self.results_dir.join(format!("{stem}_fake_B.png")), &out.fake)?;
            save_png(&self.results_dir.join(format!("{stem}_fake_watermark.png")), &out.watermark.to_rgb())?;
            tracing::debug!("Translated '{}'", path.display());
        }

        Ok(paths.len())
    }
}
