// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Resolve every option        (Layer 3 - domain)
//   Step 2: Build the aligned dataset   (Layer 4 - data)
//   Step 3: Save config                 (Layer 6 - infra)
//   Step 4: Open metrics and visuals    (Layer 6 - infra)
//   Step 5: Run training loop           (Layer 5 - ml)
//
// Step 1 comes first on purpose: an unknown watermark (or any
// other misspelt option) stops the run before a single image is
// read or a single weight allocated.

use anyhow::Result;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use crate::data::dataset::{AlignedOptions, PairedDataset};
use crate::domain::{direction::Direction, error::ConfigError};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    visuals::VisualWriter,
};
use crate::ml::{
    conversion::BITS,
    loss::GanMode,
    networks::{DiscriminatorArch, DiscriminatorConfig, GeneratorArch, GeneratorConfig, NormKind},
    schedule::{LrPolicy, LrSchedule},
    trainer::run_training,
};
use crate::watermark::WatermarkKind;

// ─── Training Configuration ──────────────────────────────────────────────────
// All options of a training run. Enumerated options stay strings
// here so the JSON on disk reads like the command line; `resolve`
// turns them into typed values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    // ── data ──
    pub dataroot:        String,
    pub phase:           String,
    pub checkpoint_dir:  String,
    pub direction:       String,
    pub input_nc:        usize,
    pub output_nc:       usize,
    pub load_size:       usize,
    pub crop_size:       usize,
    pub no_flip:         bool,
    pub batch_size:      usize,
    pub num_workers:     usize,
    pub seed:            u64,

    // ── watermark ──
    pub watermark:       String,
    pub expand_bits:     bool,

    // ── networks ──
    pub netg:            String,
    pub netd:            String,
    pub n_layers_d:      usize,
    pub ngf:             usize,
    pub ndf:             usize,
    pub norm:            String,
    pub no_dropout:      bool,

    // ── objective ──
    pub gan_mode:        String,
    pub lambda_l1:       f64,
    pub lambda_ssim:     f64,

    // ── optimisation ──
    pub lr:              f64,
    pub beta1:           f64,
    pub lr_policy:       String,
    pub lr_decay_iters:  usize,
    pub n_epochs:        usize,
    pub n_epochs_decay:  usize,
    pub continue_train:  bool,

    // ── reporting ──
    pub print_freq:      usize,
    pub display_freq:    usize,
    pub save_epoch_freq: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataroot:        "datasets/facades".to_string(),
            phase:           "train".to_string(),
            checkpoint_dir:  "checkpoints".to_string(),
            direction:       "AtoB".to_string(),
            input_nc:        3,
            output_nc:       3,
            load_size:       286,
            crop_size:       256,
            no_flip:         false,
            batch_size:      1,
            num_workers:     1,
            seed:            42,
            watermark:       "lsb".to_string(),
            expand_bits:     false,
            netg:            "unet_256".to_string(),
            netd:            "basic".to_string(),
            n_layers_d:      3,
            ngf:             64,
            ndf:             64,
            norm:            "instance".to_string(),
            no_dropout:      false,
            gan_mode:        "vanilla".to_string(),
            lambda_l1:       100.0,
            lambda_ssim:     100.0,
            lr:              2e-4,
            beta1:           0.5,
            lr_policy:       "linear".to_string(),
            lr_decay_iters:  50,
            n_epochs:        100,
            n_epochs_decay:  100,
            continue_train:  false,
            print_freq:      100,
            display_freq:    400,
            save_epoch_freq: 5,
        }
    }
}

/// The enumerated options of a run, parsed.
#[derive(Debug, Clone, Copy)]
pub struct Resolved {
    pub direction:     Direction,
    pub watermark:     WatermarkKind,
    pub generator:     GeneratorArch,
    pub discriminator: DiscriminatorArch,
    pub norm:          NormKind,
    pub gan_mode:      GanMode,
    pub lr_policy:     LrPolicy,
}

fn positive(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue { field, reason: "must be at least 1".into() });
    }
    Ok(())
}

fn image_channels(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value != 1 && value != 3 {
        return Err(ConfigError::InvalidValue { field, reason: format!("{value} channels; use 1 or 3") });
    }
    Ok(())
}

impl TrainConfig {
    /// Parse every enumerated option and check the numeric ones.
    /// The watermark is resolved first.
    pub fn resolve(&self) -> Result<Resolved, ConfigError> {
        let watermark: WatermarkKind = self.watermark.parse()?;
        let resolved = Resolved {
            watermark,
            direction:     self.direction.parse()?,
            generator:     self.netg.parse()?,
            discriminator: DiscriminatorArch::parse(&self.netd, self.n_layers_d)?,
            norm:          self.norm.parse()?,
            gan_mode:      self.gan_mode.parse()?,
            lr_policy:     self.lr_policy.parse()?,
        };

        image_channels("input_nc", self.input_nc)?;
        image_channels("output_nc", self.output_nc)?;
        positive("batch_size", self.batch_size)?;
        positive("crop_size", self.crop_size)?;
        positive("print_freq", self.print_freq)?;
        positive("display_freq", self.display_freq)?;
        positive("save_epoch_freq", self.save_epoch_freq)?;
        positive("ngf", self.ngf)?;
        positive("ndf", self.ndf)?;
        if self.crop_size > self.load_size {
            return Err(ConfigError::InvalidValue {
                field:  "crop_size",
                reason: format!("{} is larger than load_size {}", self.crop_size, self.load_size),
            });
        }
        // Each down-sampling halves the grid; the output must come back to crop_size
        let stride = match resolved.generator {
            GeneratorArch::Unet(levels) => 1usize << levels,
            GeneratorArch::Resnet(_)    => 4,
        };
        if self.crop_size % stride != 0 {
            return Err(ConfigError::InvalidValue {
                field:  "crop_size",
                reason: format!("{} must be a multiple of {stride} for {}", self.crop_size, self.netg),
            });
        }
        Ok(resolved)
    }

    /// Channel counts the networks see: ×8 under bit expansion.
    pub fn net_channels(&self) -> (usize, usize) {
        let factor = if self.expand_bits { BITS } else { 1 };
        (self.input_nc * factor, self.output_nc * factor)
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        let (input_nc, output_nc) = self.net_channels();
        GeneratorConfig::new(self.netg.clone(), self.norm.clone(), input_nc, output_nc)
            .with_ngf(self.ngf)
            .with_use_dropout(!self.no_dropout)
    }

    /// D sees input and output concatenated along channels.
    pub fn discriminator_config(&self) -> DiscriminatorConfig {
        let (input_nc, output_nc) = self.net_channels();
        DiscriminatorConfig::new(self.netd.clone(), self.norm.clone(), input_nc + output_nc)
            .with_ndf(self.ndf)
            .with_n_layers(self.n_layers_d)
    }

    pub fn schedule(&self, policy: LrPolicy) -> LrSchedule {
        LrSchedule {
            policy,
            base_lr:        self.lr,
            n_epochs:       self.n_epochs,
            n_epochs_decay: self.n_epochs_decay,
            lr_decay_iters: self.lr_decay_iters,
        }
    }

    pub fn aligned_options(&self, augment: bool) -> AlignedOptions {
        AlignedOptions {
            load_size:  self.load_size as u32,
            crop_size:  self.crop_size as u32,
            channels_a: self.input_nc,
            channels_b: self.output_nc,
            augment,
            flip:       !self.no_flip,
            seed:       self.seed,
        }
    }

    pub fn phase_dir(&self) -> PathBuf {
        PathBuf::from(&self.dataroot).join(&self.phase)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Resolve options ───────────────────────────────────────────
        let resolved = cfg.resolve()?;
        tracing::info!(
            "Run: {} | watermark={} | G={:?} D={:?} norm={:?} | gan_mode={} | lr_policy={}",
            resolved.direction, resolved.watermark, resolved.generator,
            resolved.discriminator, resolved.norm, resolved.gan_mode, resolved.lr_policy,
        );

        // ── Step 2: Aligned dataset ───────────────────────────────────────────
        // The DataLoader shuffles; the dataset only crops and flips.
        // Channel counts follow the direction: the input half feeds input_nc.
        let mut opts = cfg.aligned_options(true);
        if resolved.direction == Direction::BtoA {
            std::mem::swap(&mut opts.channels_a, &mut opts.channels_b);
        }
        let dir = cfg.phase_dir();
        tracing::info!("Loading aligned images from '{}'", dir.display());
        let dataset = PairedDataset::from_dir(&dir, opts)?;

        // ── Step 3: Save config for inference ─────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt.save_config(cfg)?;

        // ── Step 4: Metrics and visuals ───────────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
        let visuals = VisualWriter::new(ckpt.dir().join("samples"))?;

        // ── Step 5: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, &resolved, dataset, &ckpt, &metrics, &visuals)
    }
}
