// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records per-epoch loss averages to a CSV file.
//
// Metrics recorded per epoch:
//   - epoch:   the epoch number (1, 2, 3, ...)
//   - G_GAN:   adversarial term of the generator objective
//   - G_L1:    weighted L1 reconstruction term
//   - G_SSIM:  weighted (1 - SSIM) term
//   - D_real:  discriminator loss on real pairs
//   - D_fake:  discriminator loss on generated pairs
//   - lr:      learning rate used during the epoch
//
// Output file: checkpoints/metrics.csv
//
//   epoch,G_GAN,G_L1,G_SSIM,D_real,D_fake,lr
//   1,0.912300,31.402100,42.118000,0.581200,0.602400,0.000200
//   ...
//
// How to read the metrics:
//   - D_real and D_fake near 0 while G_GAN grows → D is winning
//   - G_SSIM falling faster than G_L1 → structure learnt before colour
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

const HEADER: &str = "epoch,G_GAN,G_L1,G_SSIM,D_real,D_fake,lr";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:  usize,
    pub g_gan:  f64,
    pub g_l1:   f64,
    pub g_ssim: f64,
    pub d_real: f64,
    pub d_fake: f64,
    pub lr:     f64,
}

/// Running sums of the five losses over one epoch.
#[derive(Debug, Clone, Default)]
pub struct LossMeter {
    sums:  [f64; 5],
    count: usize,
}

impl LossMeter {
    /// Values in G_GAN, G_L1, G_SSIM, D_real, D_fake order.
    pub fn add(&mut self, values: [f64; 5]) {
        for (sum, v) in self.sums.iter_mut().zip(values) {
            *sum += v;
        }
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Averages; NaN for an epoch without batches.
    pub fn finish(&self, epoch: usize, lr: f64) -> EpochMetrics {
        let avg = |i: usize| {
            if self.count > 0 { self.sums[i] / self.count as f64 } else { f64::NAN }
        };
        EpochMetrics {
            epoch,
            g_gan:  avg(0),
            g_l1:   avg(1),
            g_ssim: avg(2),
            d_real: avg(3),
            d_fake: avg(4),
            lr,
        }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so a
    /// resumed run keeps appending to the same log.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.8}",
            m.epoch, m.g_gan, m.g_l1, m.g_ssim, m.d_real, m.d_fake, m.lr,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: G_GAN={:.4}, D_real={:.4}, D_fake={:.4}",
            m.epoch, m.g_gan, m.d_real, m.d_fake,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
