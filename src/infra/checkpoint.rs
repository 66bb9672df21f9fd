// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores network weights using Burn's CompactRecorder.
//
// The generator and the discriminator are stored independently,
// so inference can restore G without ever building D.
//
// File naming convention:
//   checkpoints/
//     net_G_epoch_5.mpk      ← generator after epoch 5
//     net_D_epoch_5.mpk      ← discriminator after epoch 5
//     ...
//     latest_epoch.json      ← number of the newest complete save
//     train_config.json      ← every option of the run
//     metrics.csv            ← see metrics.rs
//     samples/               ← see visuals.rs
//
// latest_epoch.json is only written after both networks of an
// epoch are on disk.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, making the directory if needed.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn network_path(&self, name: &str, epoch: usize) -> PathBuf {
        self.dir.join(format!("{name}_epoch_{epoch}"))
    }

    /// Save one network's weights. The recorder adds the file extension.
    pub fn save_network<B: Backend, M: Module<B>>(&self, net: &M, name: &str, epoch: usize) -> Result<()> {
        let path = self.network_path(name, epoch);
        CompactRecorder::new()
            .record(net.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;
        tracing::debug!("Saved {} for epoch {}", name, epoch);
        Ok(())
    }

    /// Restore weights into a network of the same architecture.
    pub fn load_network<B: Backend, M: Module<B>>(
        &self,
        net:    M,
        name:   &str,
        epoch:  usize,
        device: &B::Device,
    ) -> Result<M> {
        let path = self.network_path(name, epoch);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?", path.display())
            })?;
        Ok(net.load_record(record))
    }

    pub fn mark_latest(&self, epoch: usize) -> Result<()> {
        let path = self.dir.join("latest_epoch.json");
        fs::write(&path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        Ok(())
    }

    /// Newest epoch with a complete save.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'. Have you run 'train' first?", path.display()))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }

    /// Persist the run's options so inference can rebuild the generator.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. Make sure you have run 'train' before 'generate'.",
                    path.display()
                )
            })?;
        serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a valid training config", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use crate::ml::networks::{Discriminator, DiscriminatorConfig};

    type TestBackend = NdArray<f32>;

    fn dir() -> (tempfile::TempDir, CheckpointManager) {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path().to_str().unwrap()).unwrap();
        (tmp, ckpt)
    }

    #[test]
    fn test_config_round_trip() {
        let (_tmp, ckpt) = dir();
        let cfg = TrainConfig { watermark: "dct".into(), expand_bits: true, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        let back = ckpt.load_config().unwrap();
        assert_eq!(back.watermark, "dct");
        assert!(back.expand_bits);
        assert_eq!(back.netg, cfg.netg);
    }

    #[test]
    fn test_latest_epoch_requires_a_save() {
        let (_tmp, ckpt) = dir();
        assert!(ckpt.latest_epoch().is_err());
        ckpt.mark_latest(7).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 7);
    }

    #[test]
    fn test_network_weights_round_trip() {
        let (_tmp, ckpt) = dir();
        let device = Default::default();
        let config = DiscriminatorConfig::new("pixel".into(), "none".into(), 6).with_ndf(4);

        let saved: Discriminator<TestBackend> = config.init(&device).unwrap();
        ckpt.save_network(&saved, "net_D", 1).unwrap();

        let fresh: Discriminator<TestBackend> = config.init(&device).unwrap();
        let loaded = ckpt.load_network(fresh, "net_D", 1, &device).unwrap();

        let a: Vec<f32> = saved.probe_weight().into_data().to_vec().unwrap();
        let b: Vec<f32> = loaded.probe_weight().into_data().to_vec().unwrap();
        // CompactRecorder stores half precision
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(&b).all(|(x, y)| (x - y).abs() < 1e-3));
    }

    #[test]
    fn test_missing_network_is_an_error() {
        let (_tmp, ckpt) = dir();
        let device = Default::default();
        let config = DiscriminatorConfig::new("pixel".into(), "none".into(), 6).with_ndf(4);
        let net: Discriminator<TestBackend> = config.init(&device).unwrap();
        assert!(ckpt.load_network(net, "net_D", 9, &device).is_err());
    }
}
