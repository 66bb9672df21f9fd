// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the generator from train_config.json, restores the
// latest net_G weights and translates single images. The
// discriminator is never constructed here.
//
// On a backend without autodiff Burn's Dropout is a no-op, so the
// generator runs deterministically.

use anyhow::{Context, Result};
use burn::prelude::*;
use image::{imageops::FilterType, RgbImage};

use crate::application::train_use_case::TrainConfig;
use crate::domain::{direction::Direction, watermark::Watermark};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    conversion::{expand_bits, to_image, to_image_space, to_tensor},
    networks::Generator,
    trainer::NET_G,
};
use crate::watermark::Codec;

/// One translated image and the watermark recovered from it.
#[derive(Debug, Clone)]
pub struct Translation {
    pub input:     RgbImage,
    pub fake:      RgbImage,
    pub watermark: Watermark,
}

pub struct Inferencer<B: Backend> {
    generator: Generator<B>,
    codec:     Codec,
    direction: Direction,
    expand:    bool,
    input_nc:  usize,
    size:      u32,
    device:    B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn from_checkpoint(ckpt: &CheckpointManager, device: B::Device) -> Result<Self> {
        let cfg   = ckpt.load_config()?;
        let epoch = ckpt.latest_epoch()?;
        let generator: Generator<B> = cfg.generator_config().init(&device)?;
        let generator = ckpt.load_network(generator, NET_G, epoch, &device)?;
        tracing::info!("Generator restored from epoch {}", epoch);
        Self::new(&cfg, generator, device)
    }

    pub fn new(cfg: &TrainConfig, generator: Generator<B>, device: B::Device) -> Result<Self> {
        let resolved = cfg.resolve()?;
        Ok(Self {
            generator,
            codec:     resolved.watermark.codec(),
            direction: resolved.direction,
            expand:    cfg.expand_bits,
            input_nc:  cfg.input_nc,
            size:      cfg.crop_size as u32,
            device,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Resize to the training crop, run G, and read the watermark back
    /// with the (resized) input as the reference.
    pub fn translate(&self, input: &RgbImage) -> Result<Translation> {
        let input = if input.dimensions() == (self.size, self.size) {
            input.clone()
        } else {
            image::imageops::resize(input, self.size, self.size, FilterType::CatmullRom)
        };

        let x = to_tensor::<B>(std::slice::from_ref(&input), self.input_nc, &self.device)?;
        let x = if self.expand { expand_bits(x) } else { x };

        let fake = to_image(to_image_space(self.generator.forward(x), self.expand))?;
        let watermark = self.codec
            .extract(&fake, &input)
            .context("watermark extraction failed on the generated image")?;

        tracing::debug!("Translated {}x{} image", self.size, self.size);
        Ok(Translation { input, fake, watermark })
    }
}
