// Normalisation and layer helpers shared by every network.

use std::str::FromStr;
use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        Initializer, InstanceNorm, InstanceNormConfig, PaddingConfig2d,
    },
    prelude::*,
};

use crate::domain::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormKind {
    Instance,
    None,
}

impl NormKind {
    pub const NAMES: [&'static str; 2] = ["instance", "none"];
}

impl FromStr for NormKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instance" => Ok(NormKind::Instance),
            "none"     => Ok(NormKind::None),
            other      => Err(ConfigError::unknown("norm", other, &Self::NAMES)),
        }
    }
}

/// Optional per-channel normalisation; `None` is the identity.
#[derive(Module, Debug)]
pub struct Norm2d<B: Backend> {
    instance: Option<InstanceNorm<B>>,
}

impl<B: Backend> Norm2d<B> {
    pub fn new(kind: NormKind, channels: usize, device: &B::Device) -> Self {
        let instance = match kind {
            NormKind::Instance => Some(
                InstanceNormConfig::new(channels)
                    .with_affine(false)
                    .init(device),
            ),
            NormKind::None => None,
        };
        Self { instance }
    }

    pub fn identity() -> Self {
        Self { instance: None }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match &self.instance {
            Some(norm) => norm.forward(x),
            None       => x,
        }
    }
}

/// Weights ~ N(0, 0.02), the usual GAN initialisation.
fn init_normal() -> Initializer {
    Initializer::Normal { mean: 0.0, std: 0.02 }
}

pub fn conv<B: Backend>(
    channels: [usize; 2],
    kernel:   usize,
    stride:   usize,
    padding:  usize,
    device:   &B::Device,
) -> Conv2d<B> {
    Conv2dConfig::new(channels, [kernel, kernel])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(padding, padding))
        .with_initializer(init_normal())
        .init(device)
}

/// Stride-2 transposed conv that exactly doubles H and W.
pub fn up_conv<B: Backend>(
    channels:    [usize; 2],
    kernel:      usize,
    padding:     usize,
    padding_out: usize,
    device:      &B::Device,
) -> ConvTranspose2d<B> {
    ConvTranspose2dConfig::new(channels, [kernel, kernel])
        .with_stride([2, 2])
        .with_padding([padding, padding])
        .with_padding_out([padding_out, padding_out])
        .with_initializer(init_normal())
        .init(device)
}
