// ============================================================
// Layer 5 — Discriminator Networks
// ============================================================
// The discriminator judges (input, output) pairs: its input is the
// conditioning image concatenated with a real or generated target
// along the channel axis, so it sees input_nc + output_nc channels.
//
//   basic     PatchGAN with 3 stride-2 layers (70x70 receptive field)
//   n_layers  PatchGAN with a configurable number of layers
//   pixel     1x1 convs, one verdict per pixel
//
// Every variant returns raw scores (no sigmoid); the GAN objective
// decides how to read them.

use std::str::FromStr;
use burn::{
    nn::conv::Conv2d,
    prelude::*,
    tensor::activation::leaky_relu,
};

use super::norm::{conv, Norm2d, NormKind};
use crate::domain::error::ConfigError;

const SLOPE: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscriminatorArch {
    /// PatchGAN with this many stride-2 layers
    NLayers(usize),
    Pixel,
}

impl DiscriminatorArch {
    pub const NAMES: [&'static str; 3] = ["basic", "n_layers", "pixel"];

    /// `n_layers` only matters for the `n_layers` variant.
    pub fn parse(name: &str, n_layers: usize) -> Result<Self, ConfigError> {
        match name {
            "basic"    => Ok(DiscriminatorArch::NLayers(3)),
            "n_layers" => {
                if n_layers == 0 {
                    return Err(ConfigError::InvalidValue {
                        field:  "n_layers_d",
                        reason: "must be at least 1".into(),
                    });
                }
                Ok(DiscriminatorArch::NLayers(n_layers))
            }
            "pixel"    => Ok(DiscriminatorArch::Pixel),
            other      => Err(ConfigError::unknown("discriminator architecture", other, &Self::NAMES)),
        }
    }
}

impl FromStr for DiscriminatorArch {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, 3)
    }
}

#[derive(Config, Debug)]
pub struct DiscriminatorConfig {
    pub arch:     String,
    pub norm:     String,
    /// Channels of input and target together
    pub input_nc: usize,
    #[config(default = 64)]
    pub ndf: usize,
    #[config(default = 3)]
    pub n_layers: usize,
}

impl DiscriminatorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Discriminator<B>, ConfigError> {
        let arch = DiscriminatorArch::parse(&self.arch, self.n_layers)?;
        let norm: NormKind = self.norm.parse()?;
        let net = match arch {
            DiscriminatorArch::NLayers(n) => {
                Discriminator::Patch(NLayerDiscriminator::new(self.input_nc, self.ndf, n, norm, device))
            }
            DiscriminatorArch::Pixel => {
                Discriminator::Pixel(PixelDiscriminator::new(self.input_nc, self.ndf, norm, device))
            }
        };
        Ok(net)
    }
}

#[derive(Module, Debug)]
pub enum Discriminator<B: Backend> {
    Patch(NLayerDiscriminator<B>),
    Pixel(PixelDiscriminator<B>),
}

impl<B: Backend> Discriminator<B> {
    /// [N, C, H, W] pair → [N, 1, h, w] raw scores.
    pub fn forward(&self, pair: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Discriminator::Patch(net) => net.forward(pair),
            Discriminator::Pixel(net) => net.forward(pair),
        }
    }

    #[cfg(test)]
    pub fn probe_weight(&self) -> Tensor<B, 4> {
        match self {
            Discriminator::Patch(net) => net.convs[0].weight.val(),
            Discriminator::Pixel(net) => net.conv1.weight.val(),
        }
    }
}

// ─── PatchGAN ─────────────────────────────────────────────────────────────────
// conv(k4 s2) → lrelu, then n-1 × [conv(k4 s2) → norm → lrelu],
// one conv(k4 s1) → norm → lrelu, and a k4 s1 head to a single map.
// The channel multiplier doubles per layer and caps at 8.
#[derive(Module, Debug)]
pub struct NLayerDiscriminator<B: Backend> {
    convs: Vec<Conv2d<B>>,
    norms: Vec<Norm2d<B>>,
    head:  Conv2d<B>,
}

impl<B: Backend> NLayerDiscriminator<B> {
    pub fn new(input_nc: usize, ndf: usize, n_layers: usize, norm: NormKind, device: &B::Device) -> Self {
        let mut convs = vec![conv([input_nc, ndf], 4, 2, 1, device)];
        let mut norms = vec![Norm2d::identity()];

        let mut mult = 1;
        for n in 1..=n_layers {
            let prev = mult;
            mult = (1 << n).min(8);
            let stride = if n < n_layers { 2 } else { 1 };
            convs.push(conv([ndf * prev, ndf * mult], 4, stride, 1, device));
            norms.push(Norm2d::new(norm, ndf * mult, device));
        }

        Self {
            convs,
            norms,
            head: conv([ndf * mult, 1], 4, 1, 1, device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut h = x;
        for (conv, norm) in self.convs.iter().zip(&self.norms) {
            h = leaky_relu(norm.forward(conv.forward(h)), SLOPE);
        }
        self.head.forward(h)
    }
}

// ─── PixelGAN ─────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct PixelDiscriminator<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    norm2: Norm2d<B>,
    head:  Conv2d<B>,
}

impl<B: Backend> PixelDiscriminator<B> {
    pub fn new(input_nc: usize, ndf: usize, norm: NormKind, device: &B::Device) -> Self {
        Self {
            conv1: conv([input_nc, ndf], 1, 1, 0, device),
            conv2: conv([ndf, ndf * 2], 1, 1, 0, device),
            norm2: Norm2d::new(norm, ndf * 2, device),
            head:  conv([ndf * 2, 1], 1, 1, 0, device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let h = leaky_relu(self.conv1.forward(x), SLOPE);
        let h = leaky_relu(self.norm2.forward(self.conv2.forward(h)), SLOPE);
        self.head.forward(h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    fn pair(c: usize, size: usize) -> Tensor<TestBackend, 4> {
        Tensor::random([2, c, size, size], Distribution::Uniform(-1.0, 1.0), &Default::default())
    }

    fn build(arch: &str, input_nc: usize) -> Discriminator<TestBackend> {
        DiscriminatorConfig::new(arch.into(), "instance".into(), input_nc)
            .with_ndf(4)
            .init(&Default::default())
            .unwrap()
    }

    #[test]
    fn test_basic_patchgan_output_grid() {
        // 32 → 16 → 8 → 4 (s2 ×2, then s1 k4 twice: 4 → 3 → 2)
        let out = build("basic", 6).forward(pair(6, 32));
        assert_eq!(out.dims(), [2, 1, 2, 2]);
    }

    #[test]
    fn test_pixel_keeps_resolution() {
        let out = build("pixel", 48).forward(pair(48, 8));
        assert_eq!(out.dims(), [2, 1, 8, 8]);
    }

    #[test]
    fn test_n_layers_uses_configured_depth() {
        let d: Discriminator<TestBackend> = DiscriminatorConfig::new("n_layers".into(), "none".into(), 6)
            .with_ndf(4)
            .with_n_layers(1)
            .init(&Default::default())
            .unwrap();
        // 16 → 8 (s2), → 7 (s1 k4), → 6 (head)
        assert_eq!(d.forward(pair(6, 16)).dims(), [2, 1, 6, 6]);
    }

    #[test]
    fn test_zero_layers_rejected() {
        assert!(DiscriminatorArch::parse("n_layers", 0).is_err());
    }

    #[test]
    fn test_unknown_arch_lists_choices() {
        let err = "patch".parse::<DiscriminatorArch>().unwrap_err();
        assert!(err.to_string().contains("basic | n_layers | pixel"));
    }
}
