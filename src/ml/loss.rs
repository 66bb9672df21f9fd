// ============================================================
// Layer 5 — Loss Assembly
// ============================================================
// Three ingredients, combined by the trainer:
//
//   adversarial  GanMode::score(prediction, target_is_real)
//                  vanilla → BCE with logits
//                  lsgan   → MSE against 1 / 0
//                  wgangp  → -mean (real) / mean (fake)
//
//   L1           mean |fake - real|, in network space
//
//   SSIM         structural similarity of the image-space views,
//                Gaussian 11x11 window, σ = 1.5, inputs in [0, 1]
//
//   loss_D = 0.5 · (score(D(real), true) + score(D(fake.detach()), false))
//   loss_G = score(D(fake), true) + λ_L1 · L1 + λ_SSIM · (1 - SSIM)
//
// Reference: Wang et al. (2004) Image Quality Assessment: From Error
//            Visibility to Structural Similarity

use std::{fmt, str::FromStr};
use burn::{
    nn::loss::{BinaryCrossEntropyLossConfig, MseLoss, Reduction},
    prelude::*,
    tensor::{
        module::conv2d,
        ops::ConvOptions,
        TensorData,
    },
};
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

const SSIM_WINDOW: usize = 11;
const SSIM_SIGMA:  f64   = 1.5;
const SSIM_C1:     f64   = 0.01 * 0.01;
const SSIM_C2:     f64   = 0.03 * 0.03;

// ─── Adversarial objective ────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GanMode {
    Vanilla,
    Lsgan,
    Wgangp,
}

impl GanMode {
    pub const NAMES: [&'static str; 3] = ["vanilla", "lsgan", "wgangp"];

    /// Reduce discriminator output to a scalar loss against the given label.
    pub fn score<B: Backend>(self, prediction: Tensor<B, 4>, target_is_real: bool) -> Tensor<B, 1> {
        let device = prediction.device();
        match self {
            GanMode::Vanilla => {
                // BCE wants [batch, features]
                let [n, c, h, w] = prediction.dims();
                let logits  = prediction.reshape([n, c * h * w]);
                let targets = if target_is_real {
                    Tensor::<B, 2, Int>::ones([n, c * h * w], &device)
                } else {
                    Tensor::<B, 2, Int>::zeros([n, c * h * w], &device)
                };
                BinaryCrossEntropyLossConfig::new()
                    .with_logits(true)
                    .init(&device)
                    .forward(logits, targets)
            }
            GanMode::Lsgan => {
                let label  = if target_is_real { 1.0 } else { 0.0 };
                let target = prediction.ones_like().mul_scalar(label);
                MseLoss::new().forward(prediction, target, Reduction::Mean)
            }
            GanMode::Wgangp => {
                let mean = prediction.mean();
                if target_is_real { mean.neg() } else { mean }
            }
        }
    }
}

impl FromStr for GanMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vanilla" => Ok(GanMode::Vanilla),
            "lsgan"   => Ok(GanMode::Lsgan),
            "wgangp"  => Ok(GanMode::Wgangp),
            other     => Err(ConfigError::unknown("gan mode", other, &Self::NAMES)),
        }
    }
}

impl fmt::Display for GanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GanMode::Vanilla => "vanilla",
            GanMode::Lsgan   => "lsgan",
            GanMode::Wgangp  => "wgangp",
        };
        f.write_str(name)
    }
}

// ─── Reconstruction ───────────────────────────────────────────────────────────
pub fn l1<B: Backend>(fake: Tensor<B, 4>, real: Tensor<B, 4>) -> Tensor<B, 1> {
    fake.sub(real).abs().mean()
}

// ─── SSIM ─────────────────────────────────────────────────────────────────────
/// Normalised 1-D Gaussian.
fn gaussian(size: usize, sigma: f64) -> Vec<f32> {
    let centre = (size / 2) as f64;
    let raw: Vec<f64> = (0..size)
        .map(|i| (-((i as f64 - centre).powi(2)) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f64 = raw.iter().sum();
    raw.iter().map(|v| (v / total) as f32).collect()
}

/// Depthwise window: [C, 1, K, K], the outer product of the 1-D Gaussian.
fn window<B: Backend>(channels: usize, device: &B::Device) -> Tensor<B, 4> {
    let g = gaussian(SSIM_WINDOW, SSIM_SIGMA);
    let kernel: Vec<f32> = (0..channels)
        .flat_map(|_| g.iter().flat_map(|a| g.iter().map(move |b| a * b)).collect::<Vec<_>>())
        .collect();
    Tensor::from_data(
        TensorData::new(kernel, [channels, 1, SSIM_WINDOW, SSIM_WINDOW]),
        device,
    )
}

fn blur<B: Backend>(x: Tensor<B, 4>, window: Tensor<B, 4>, channels: usize) -> Tensor<B, 4> {
    let pad = SSIM_WINDOW / 2;
    conv2d(x, window, None, ConvOptions::new([1, 1], [pad, pad], [1, 1], channels))
}

/// Mean SSIM of two [N, C, H, W] tensors with values in [0, 1].
pub fn ssim<B: Backend>(x: Tensor<B, 4>, y: Tensor<B, 4>) -> Tensor<B, 1> {
    let [_, c, _, _] = x.dims();
    let win = window::<B>(c, &x.device());

    let mu_x = blur(x.clone(), win.clone(), c);
    let mu_y = blur(y.clone(), win.clone(), c);
    let mu_x2 = mu_x.clone().powf_scalar(2.0);
    let mu_y2 = mu_y.clone().powf_scalar(2.0);
    let mu_xy = mu_x.mul(mu_y);

    let sigma_x2 = blur(x.clone().powf_scalar(2.0), win.clone(), c).sub(mu_x2.clone());
    let sigma_y2 = blur(y.clone().powf_scalar(2.0), win.clone(), c).sub(mu_y2.clone());
    let sigma_xy = blur(x.mul(y), win, c).sub(mu_xy.clone());

    let numerator = mu_xy.mul_scalar(2.0).add_scalar(SSIM_C1)
        .mul(sigma_xy.mul_scalar(2.0).add_scalar(SSIM_C2));
    let denominator = mu_x2.add(mu_y2).add_scalar(SSIM_C1)
        .mul(sigma_x2.add(sigma_y2).add_scalar(SSIM_C2));

    numerator.div(denominator).mean()
}
