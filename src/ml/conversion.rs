// ============================================================
// Layer 5 — Tensor / Image Conversion
// ============================================================
// The networks see tensors, the watermark codecs see pixels.
// This module is the only bridge between the two.
//
// Conventions:
//   tensor values  : [-1, 1]      (what tanh outputs)
//   pixel levels   : 0..=255      (what the codecs read)
//   unit values    : [0, 1]       (what SSIM compares)
//
//   level = round((t + 1) * 127.5)        t = level / 127.5 - 1
//
// Bit expansion turns every channel into 8 binary planes, most
// significant bit first, each plane holding -1 (bit clear) or
// +1 (bit set):
//
//   [N, C, H, W]  ──expand_bits──▶  [N, 8C, H, W]
//   channel c owns planes 8c .. 8c+7
//
// collapse_bits is the inverse. It is written as a weighted sum
// of the planes, so it is also differentiable: a generator that
// outputs soft planes still gets a gradient through SSIM.

use anyhow::{bail, Result};
use burn::{prelude::*, tensor::TensorData};
use image::{Rgb, RgbImage};

/// Planes per channel under bit expansion
pub const BITS: usize = 8;

fn to_levels<B: Backend, const D: usize>(t: Tensor<B, D>) -> Tensor<B, D> {
    t.add_scalar(1.0).mul_scalar(127.5).round().clamp(0.0, 255.0)
}

fn from_levels<B: Backend, const D: usize>(t: Tensor<B, D>) -> Tensor<B, D> {
    t.div_scalar(127.5).sub_scalar(1.0)
}

/// Map [-1, 1] tensor values to [0, 1].
pub fn to_unit<B: Backend, const D: usize>(t: Tensor<B, D>) -> Tensor<B, D> {
    t.add_scalar(1.0).div_scalar(2.0)
}

/// [N, C, H, W] → [N, 8C, H, W] binary planes in {-1, +1}.
pub fn expand_bits<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    let [n, c, h, w] = x.dims();
    let levels = to_levels(x).unsqueeze_dim::<5>(2); // [N, C, 1, H, W]

    let planes: Vec<Tensor<B, 5>> = (0..BITS)
        .map(|k| {
            let shift = (1u32 << (BITS - 1 - k)) as f64;
            // bit_k = floor(v / 2^s) - 2 * floor(v / 2^(s+1))
            let high = levels.clone().div_scalar(shift).floor();
            let rest = levels.clone().div_scalar(shift * 2.0).floor().mul_scalar(2.0);
            high.sub(rest).mul_scalar(2.0).sub_scalar(1.0)
        })
        .collect();

    Tensor::cat(planes, 2).reshape([n, c * BITS, h, w])
}

/// [N, 8C, H, W] planes → [N, C, H, W] values in [-1, 1].
pub fn collapse_bits<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    let [n, c8, h, w] = x.dims();
    let c = c8 / BITS;
    let device = x.device();

    let weights: Vec<f32> = (0..BITS).map(|k| (1u32 << (BITS - 1 - k)) as f32).collect();
    let weights = Tensor::<B, 1>::from_data(TensorData::new(weights, [BITS]), &device)
        .reshape([1, 1, BITS, 1, 1]);

    let bits   = to_unit(x.reshape([n, c, BITS, h, w]));
    let levels = bits.mul(weights).sum_dim(2).reshape([n, c, h, w]);
    from_levels(levels)
}

/// Image-space view of a network tensor: identity, or collapse when expanded.
pub fn to_image_space<B: Backend>(x: Tensor<B, 4>, expanded: bool) -> Tensor<B, 4> {
    if expanded { collapse_bits(x) } else { x }
}

/// Pixel image → CHW values in [-1, 1]. One channel means ITU-R 601 luma.
pub fn image_to_values(img: &RgbImage, channels: usize) -> Vec<f32> {
    let (w, h) = img.dimensions();
    let plane  = (w * h) as usize;
    let mut out = vec![0.0f32; channels * plane];
    for (x, y, px) in img.enumerate_pixels() {
        let idx = (y * w + x) as usize;
        let [r, g, b] = px.0;
        if channels == 1 {
            let luma = (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000;
            out[idx] = luma as f32 / 127.5 - 1.0;
        } else {
            out[idx]             = r as f32 / 127.5 - 1.0;
            out[plane + idx]     = g as f32 / 127.5 - 1.0;
            out[2 * plane + idx] = b as f32 / 127.5 - 1.0;
        }
    }
    out
}

/// Stack images into one [N, C, H, W] tensor. All images must share a size.
pub fn to_tensor<B: Backend>(images: &[RgbImage], channels: usize, device: &B::Device) -> Result<Tensor<B, 4>> {
    let Some(first) = images.first() else {
        bail!("cannot build a tensor from zero images");
    };
    if channels != 1 && channels != 3 {
        bail!("images can only be converted to 1 or 3 channels, not {channels}");
    }
    let (w, h) = first.dimensions();
    let mut flat = Vec::with_capacity(images.len() * channels * (w * h) as usize);
    for img in images {
        if img.dimensions() != (w, h) {
            bail!("image is {:?} but the batch is {:?}", img.dimensions(), (w, h));
        }
        flat.extend(image_to_values(img, channels));
    }
    let shape = [images.len(), channels, h as usize, w as usize];
    Ok(Tensor::from_data(TensorData::new(flat, shape), device))
}

/// Render every batch element of a 1- or 3-channel tensor. Detaches first.
pub fn to_images<B: Backend>(t: Tensor<B, 4>) -> Result<Vec<RgbImage>> {
    let [n, c, h, w] = t.dims();
    if c != 1 && c != 3 {
        bail!("cannot render a {c}-channel tensor as an image; collapse bit planes first");
    }
    let levels = to_levels(t.detach())
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("tensor read-back failed: {e:?}"))?;

    let plane = h * w;
    let images = (0..n)
        .map(|i| {
            let base = i * c * plane;
            RgbImage::from_fn(w as u32, h as u32, |x, y| {
                let idx = base + y as usize * w + x as usize;
                let at  = |ch: usize| levels[idx + ch * plane] as u8;
                if c == 1 { Rgb([at(0), at(0), at(0)]) } else { Rgb([at(0), at(1), at(2)]) }
            })
        })
        .collect();
    Ok(images)
}

/// First batch element as a pixel image (what the codecs consume).
pub fn to_image<B: Backend>(t: Tensor<B, 4>) -> Result<RgbImage> {
    let first = t.narrow(0, 0, 1);
    to_images(first)?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("empty batch"))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn quantised(n: usize, c: usize, h: usize, w: usize) -> Tensor<TestBackend, 4> {
        let device = Default::default();
        let values: Vec<f32> = (0..n * c * h * w)
            .map(|i| ((i * 37) % 256) as f32 / 127.5 - 1.0)
            .collect();
        Tensor::from_data(TensorData::new(values, [n, c, h, w]), &device)
    }

    fn values(t: Tensor<TestBackend, 4>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_expand_multiplies_channels_by_eight() {
        let x = quantised(2, 3, 4, 5);
        assert_eq!(expand_bits(x).dims(), [2, 24, 4, 5]);
    }

    #[test]
    fn test_expanded_planes_are_binary() {
        let planes = values(expand_bits(quantised(1, 3, 4, 4)));
        assert!(planes.iter().all(|&v| v == -1.0 || v == 1.0));
    }

    #[test]
    fn test_collapse_inverts_expand() {
        let x    = quantised(2, 3, 6, 6);
        let back = collapse_bits(expand_bits(x.clone()));
        assert_eq!(back.dims(), x.dims());
        for (a, b) in values(x).iter().zip(values(back)) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn test_plane_order_is_msb_first() {
        let device = Default::default();
        // level 128 → only the most significant bit set
        let x = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(vec![128.0f32 / 127.5 - 1.0], [1, 1, 1, 1]), &device,
        );
        let planes = values(expand_bits(x));
        assert_eq!(planes, vec![1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_image_round_trip() {
        let img = RgbImage::from_fn(4, 3, |x, y| Rgb([(x * 60) as u8, (y * 80) as u8, 200]));
        let t   = to_tensor::<TestBackend>(&[img.clone()], 3, &Default::default()).unwrap();
        assert_eq!(t.dims(), [1, 3, 3, 4]);
        assert_eq!(to_image(t).unwrap(), img);
    }

    #[test]
    fn test_grayscale_is_tiled_to_rgb() {
        let img = RgbImage::from_pixel(2, 2, Rgb([90, 90, 90]));
        let t   = to_tensor::<TestBackend>(&[img], 1, &Default::default()).unwrap();
        let out = to_image(t).unwrap();
        assert!(out.pixels().all(|px| px.0 == [90, 90, 90]));
    }

    #[test]
    fn test_expanded_tensor_cannot_be_rendered() {
        let x = expand_bits(quantised(1, 3, 2, 2));
        assert!(to_image(x).is_err());
    }
}
