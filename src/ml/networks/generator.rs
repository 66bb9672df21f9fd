// ============================================================
// Layer 5 — Generator Networks
// ============================================================
// Two families, picked by an architecture string:
//
//   unet_<size>       U-Net with log2(size) stride-2 levels and
//                     skip connections between mirrored levels.
//                     unet_32 | unet_64 | unet_128 | unet_256
//
//   resnet_<n>blocks  conv stem, two down-samplings, n residual
//                     blocks, two up-samplings, conv head.
//                     resnet_6blocks | resnet_9blocks
//
// Both end in tanh, so outputs live in [-1, 1] like the data.
// Under bit expansion the caller passes channel counts that are
// already multiplied by 8; the network itself is unaware of it.

use std::str::FromStr;
use burn::{
    nn::{
        conv::{Conv2d, ConvTranspose2d},
        Dropout, DropoutConfig,
    },
    prelude::*,
    tensor::activation::{leaky_relu, relu, tanh},
};

use super::norm::{conv, up_conv, Norm2d, NormKind};
use crate::domain::error::ConfigError;

const DROPOUT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorArch {
    /// Number of stride-2 levels
    Unet(usize),
    /// Number of residual blocks
    Resnet(usize),
}

impl GeneratorArch {
    pub const NAMES: [&'static str; 6] = [
        "unet_32", "unet_64", "unet_128", "unet_256", "resnet_6blocks", "resnet_9blocks",
    ];
}

impl FromStr for GeneratorArch {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unet_32"        => Ok(GeneratorArch::Unet(5)),
            "unet_64"        => Ok(GeneratorArch::Unet(6)),
            "unet_128"       => Ok(GeneratorArch::Unet(7)),
            "unet_256"       => Ok(GeneratorArch::Unet(8)),
            "resnet_6blocks" => Ok(GeneratorArch::Resnet(6)),
            "resnet_9blocks" => Ok(GeneratorArch::Resnet(9)),
            other => Err(ConfigError::unknown("generator architecture", other, &Self::NAMES)),
        }
    }
}

#[derive(Config, Debug)]
pub struct GeneratorConfig {
    pub arch:      String,
    pub norm:      String,
    pub input_nc:  usize,
    pub output_nc: usize,
    #[config(default = 64)]
    pub ngf: usize,
    #[config(default = true)]
    pub use_dropout: bool,
}

impl GeneratorConfig {
    /// Resolve the architecture string and build the network.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Generator<B>, ConfigError> {
        let arch: GeneratorArch = self.arch.parse()?;
        let norm: NormKind      = self.norm.parse()?;
        let generator = match arch {
            GeneratorArch::Unet(levels) => Generator::Unet(UnetGenerator::new(
                self.input_nc, self.output_nc, levels, self.ngf, norm, self.use_dropout, device,
            )),
            GeneratorArch::Resnet(blocks) => Generator::Resnet(ResnetGenerator::new(
                self.input_nc, self.output_nc, blocks, self.ngf, norm, self.use_dropout, device,
            )),
        };
        Ok(generator)
    }
}

/// Conditioning image → output image of the same spatial size.
#[derive(Module, Debug)]
pub enum Generator<B: Backend> {
    Unet(UnetGenerator<B>),
    Resnet(ResnetGenerator<B>),
}

impl<B: Backend> Generator<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Generator::Unet(net)   => net.forward(x),
            Generator::Resnet(net) => net.forward(x),
        }
    }

    #[cfg(test)]
    pub fn probe_weight(&self) -> Tensor<B, 4> {
        match self {
            Generator::Unet(net)   => net.down[0].weight.val(),
            Generator::Resnet(net) => net.stem.weight.val(),
        }
    }
}

// ─── U-Net ────────────────────────────────────────────────────────────────────
// Level i down-samples enc[i-1] → enc[i] channels, with
// enc = [ngf, 2ngf, 4ngf, 8ngf, 8ngf, ...]. The way back up
// concatenates the level's own down output with the result from
// the level below. Levels 4 ..= n-2 (the deep 8·ngf ones) apply
// dropout after their up-sampling.
#[derive(Module, Debug)]
pub struct UnetGenerator<B: Backend> {
    down:         Vec<Conv2d<B>>,
    down_norm:    Vec<Norm2d<B>>,
    up:           Vec<ConvTranspose2d<B>>,
    up_norm:      Vec<Norm2d<B>>,
    dropout:      Option<Dropout>,
    dropout_from: usize,
    dropout_to:   usize,
}

impl<B: Backend> UnetGenerator<B> {
    pub fn new(
        input_nc:    usize,
        output_nc:   usize,
        levels:      usize,
        ngf:         usize,
        norm:        NormKind,
        use_dropout: bool,
        device:      &B::Device,
    ) -> Self {
        let enc: Vec<usize> = (0..levels).map(|i| ngf * (1 << i.min(3))).collect();
        let innermost = levels - 1;

        let mut down      = Vec::with_capacity(levels);
        let mut down_norm = Vec::with_capacity(levels);
        let mut up        = Vec::with_capacity(levels);
        let mut up_norm   = Vec::with_capacity(levels);

        for i in 0..levels {
            let d_in = if i == 0 { input_nc } else { enc[i - 1] };
            down.push(conv([d_in, enc[i]], 4, 2, 1, device));
            down_norm.push(if i == 0 || i == innermost {
                Norm2d::identity()
            } else {
                Norm2d::new(norm, enc[i], device)
            });

            let u_in  = if i == innermost { enc[i] } else { 2 * enc[i] };
            let u_out = if i == 0 { output_nc } else { enc[i - 1] };
            up.push(up_conv([u_in, u_out], 4, 1, 0, device));
            up_norm.push(if i == 0 { Norm2d::identity() } else { Norm2d::new(norm, u_out, device) });
        }

        Self {
            down, down_norm, up, up_norm,
            dropout:      use_dropout.then(|| DropoutConfig::new(DROPOUT).init()),
            dropout_from: 4,
            dropout_to:   levels.saturating_sub(2),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let levels = self.down.len();

        let mut skips = Vec::with_capacity(levels);
        let mut h = self.down[0].forward(x);
        skips.push(h.clone());
        for i in 1..levels {
            h = self.down_norm[i].forward(self.down[i].forward(leaky_relu(h, 0.2)));
            skips.push(h.clone());
        }

        let innermost = levels - 1;
        let mut u = self.up_norm[innermost].forward(self.up[innermost].forward(relu(h)));
        for i in (1..innermost).rev() {
            let joined = Tensor::cat(vec![skips[i].clone(), u], 1);
            u = self.up_norm[i].forward(self.up[i].forward(relu(joined)));
            if let Some(dropout) = &self.dropout {
                if (self.dropout_from..=self.dropout_to).contains(&i) {
                    u = dropout.forward(u);
                }
            }
        }

        let joined = Tensor::cat(vec![skips[0].clone(), u], 1);
        tanh(self.up[0].forward(relu(joined)))
    }
}

// ─── ResNet ───────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ResnetBlock<B: Backend> {
    conv1:   Conv2d<B>,
    norm1:   Norm2d<B>,
    conv2:   Conv2d<B>,
    norm2:   Norm2d<B>,
    dropout: Option<Dropout>,
}

impl<B: Backend> ResnetBlock<B> {
    fn new(dim: usize, norm: NormKind, use_dropout: bool, device: &B::Device) -> Self {
        Self {
            conv1:   conv([dim, dim], 3, 1, 1, device),
            norm1:   Norm2d::new(norm, dim, device),
            conv2:   conv([dim, dim], 3, 1, 1, device),
            norm2:   Norm2d::new(norm, dim, device),
            dropout: use_dropout.then(|| DropoutConfig::new(DROPOUT).init()),
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut h = relu(self.norm1.forward(self.conv1.forward(x.clone())));
        if let Some(dropout) = &self.dropout {
            h = dropout.forward(h);
        }
        x + self.norm2.forward(self.conv2.forward(h))
    }
}

#[derive(Module, Debug)]
pub struct ResnetGenerator<B: Backend> {
    stem:      Conv2d<B>,
    stem_norm: Norm2d<B>,
    down:      Vec<Conv2d<B>>,
    down_norm: Vec<Norm2d<B>>,
    blocks:    Vec<ResnetBlock<B>>,
    up:        Vec<ConvTranspose2d<B>>,
    up_norm:   Vec<Norm2d<B>>,
    head:      Conv2d<B>,
}

impl<B: Backend> ResnetGenerator<B> {
    pub fn new(
        input_nc:    usize,
        output_nc:   usize,
        n_blocks:    usize,
        ngf:         usize,
        norm:        NormKind,
        use_dropout: bool,
        device:      &B::Device,
    ) -> Self {
        let down_channels = [[ngf, ngf * 2], [ngf * 2, ngf * 4]];
        let up_channels   = [[ngf * 4, ngf * 2], [ngf * 2, ngf]];

        Self {
            stem:      conv([input_nc, ngf], 7, 1, 3, device),
            stem_norm: Norm2d::new(norm, ngf, device),
            down:      down_channels.iter().map(|&c| conv(c, 3, 2, 1, device)).collect(),
            down_norm: down_channels.iter().map(|c| Norm2d::new(norm, c[1], device)).collect(),
            blocks:    (0..n_blocks).map(|_| ResnetBlock::new(ngf * 4, norm, use_dropout, device)).collect(),
            up:        up_channels.iter().map(|&c| up_conv(c, 3, 1, 1, device)).collect(),
            up_norm:   up_channels.iter().map(|c| Norm2d::new(norm, c[1], device)).collect(),
            head:      conv([ngf, output_nc], 7, 1, 3, device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut h = relu(self.stem_norm.forward(self.stem.forward(x)));
        for (conv, norm) in self.down.iter().zip(&self.down_norm) {
            h = relu(norm.forward(conv.forward(h)));
        }
        for block in &self.blocks {
            h = block.forward(h);
        }
        for (conv, norm) in self.up.iter().zip(&self.up_norm) {
            h = relu(norm.forward(conv.forward(h)));
        }
        tanh(self.head.forward(h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    fn config(arch: &str, input_nc: usize, output_nc: usize) -> GeneratorConfig {
        GeneratorConfig::new(arch.to_string(), "instance".to_string(), input_nc, output_nc)
            .with_ngf(4)
            .with_use_dropout(false)
    }

    fn input(c: usize, size: usize) -> Tensor<TestBackend, 4> {
        Tensor::random([2, c, size, size], Distribution::Uniform(-1.0, 1.0), &Default::default())
    }

    #[test]
    fn test_unet_keeps_spatial_size() {
        let g: Generator<TestBackend> = config("unet_32", 3, 3).init(&Default::default()).unwrap();
        assert_eq!(g.forward(input(3, 32)).dims(), [2, 3, 32, 32]);
    }

    #[test]
    fn test_unet_with_expanded_channels() {
        let g: Generator<TestBackend> = config("unet_32", 24, 24).init(&Default::default()).unwrap();
        assert_eq!(g.forward(input(24, 32)).dims(), [2, 24, 32, 32]);
    }

    #[test]
    fn test_resnet_keeps_spatial_size() {
        let g: Generator<TestBackend> = config("resnet_6blocks", 1, 3).init(&Default::default()).unwrap();
        assert_eq!(g.forward(input(1, 16)).dims(), [2, 3, 16, 16]);
    }

    #[test]
    fn test_outputs_are_bounded_by_tanh() {
        let g: Generator<TestBackend> = config("unet_32", 3, 3).init(&Default::default()).unwrap();
        let out: Vec<f32> = g.forward(input(3, 32)).into_data().to_vec().unwrap();
        assert!(out.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_unknown_arch_is_config_error() {
        let err = config("unet_512", 3, 3).init::<TestBackend>(&Default::default()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownVariant { kind: "generator architecture", .. }));
    }

    #[test]
    fn test_batch_norm_is_not_offered() {
        let cfg = GeneratorConfig::new("unet_32".into(), "batch".into(), 3, 3);
        assert!(cfg.init::<TestBackend>(&Default::default()).is_err());
    }
}
