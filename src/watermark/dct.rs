//! Transform-domain watermark on 8x8 DCT blocks.
//!
//! One bit per block of the blue channel. The bit is the order of two
//! mid-frequency coefficients: `C(4,3) > C(3,4)` means set. Embedding
//! pushes the pair apart by at least `strength`, re-checking after the
//! block is rounded back to pixels, since saturation can eat the margin.
//!
//! The recovered watermark lives on the block grid, `(W/8) x (H/8)`.

use std::f64::consts::PI;
use image::RgbImage;

use crate::domain::error::CodecError;
use crate::domain::traits::BlindCodec;
use crate::domain::watermark::Watermark;

const BLOCK: usize = 8;
const CHANNEL: usize = 2;
const COEFF_A: (usize, usize) = (4, 3);
const COEFF_B: (usize, usize) = (3, 4);
const MAX_ATTEMPTS: usize = 4;

type Block = [[f64; BLOCK]; BLOCK];

#[derive(Debug, Clone, Copy)]
pub struct DctCodec {
    strength: f64,
}

impl Default for DctCodec {
    fn default() -> Self {
        Self { strength: 30.0 }
    }
}

#[inline]
fn alpha(k: usize) -> f64 {
    if k == 0 { (1.0 / BLOCK as f64).sqrt() } else { (2.0 / BLOCK as f64).sqrt() }
}

fn cos_table() -> Block {
    let mut t = [[0.0; BLOCK]; BLOCK];
    for (k, row) in t.iter_mut().enumerate() {
        for (n, v) in row.iter_mut().enumerate() {
            *v = ((2 * n + 1) as f64 * k as f64 * PI / (2 * BLOCK) as f64).cos();
        }
    }
    t
}

/// Orthonormal 2-D DCT-II. `px[y][x]`, result `c[v][u]`.
fn forward(px: &Block, t: &Block) -> Block {
    let mut c = [[0.0; BLOCK]; BLOCK];
    for v in 0..BLOCK {
        for u in 0..BLOCK {
            let mut acc = 0.0;
            for y in 0..BLOCK {
                for x in 0..BLOCK {
                    acc += px[y][x] * t[u][x] * t[v][y];
                }
            }
            c[v][u] = alpha(u) * alpha(v) * acc;
        }
    }
    c
}

fn inverse(c: &Block, t: &Block) -> Block {
    let mut px = [[0.0; BLOCK]; BLOCK];
    for y in 0..BLOCK {
        for x in 0..BLOCK {
            let mut acc = 0.0;
            for v in 0..BLOCK {
                for u in 0..BLOCK {
                    acc += alpha(u) * alpha(v) * c[v][u] * t[u][x] * t[v][y];
                }
            }
            px[y][x] = acc;
        }
    }
    px
}

fn read_block(img: &RgbImage, bx: u32, by: u32) -> Block {
    let mut b = [[0.0; BLOCK]; BLOCK];
    for (y, row) in b.iter_mut().enumerate() {
        for (x, v) in row.iter_mut().enumerate() {
            let px = img.get_pixel(bx * BLOCK as u32 + x as u32, by * BLOCK as u32 + y as u32);
            *v = px.0[CHANNEL] as f64;
        }
    }
    b
}

fn write_block(img: &mut RgbImage, bx: u32, by: u32, b: &Block) {
    for (y, row) in b.iter().enumerate() {
        for (x, v) in row.iter().enumerate() {
            let px = img.get_pixel_mut(bx * BLOCK as u32 + x as u32, by * BLOCK as u32 + y as u32);
            px.0[CHANNEL] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
}

#[inline]
fn block_bit(c: &Block) -> bool {
    c[COEFF_A.1][COEFF_A.0] > c[COEFF_B.1][COEFF_B.0]
}

impl DctCodec {
    fn check_size(&self, img: &RgbImage) -> Result<(), CodecError> {
        if img.width() < BLOCK as u32 || img.height() < BLOCK as u32 {
            return Err(CodecError::ImageTooSmall {
                codec:  "dct",
                width:  img.width(),
                height: img.height(),
                block:  BLOCK as u32,
            });
        }
        Ok(())
    }
}

impl BlindCodec for DctCodec {
    fn name(&self) -> &'static str {
        "dct"
    }

    fn capacity(&self, width: u32, height: u32) -> (u32, u32) {
        (width / BLOCK as u32, height / BLOCK as u32)
    }

    fn extract(&self, host: &RgbImage) -> Result<Watermark, CodecError> {
        self.check_size(host)?;
        let t = cos_table();
        let (gw, gh) = self.capacity(host.width(), host.height());
        let mut bits = Vec::with_capacity((gw * gh) as usize);
        for by in 0..gh {
            for bx in 0..gw {
                bits.push(block_bit(&forward(&read_block(host, bx, by), &t)));
            }
        }
        Ok(Watermark::from_bits(gw, gh, &bits))
    }

    fn embed(&self, host: &RgbImage, mark: &Watermark) -> Result<RgbImage, CodecError> {
        self.check_size(host)?;
        let t = cos_table();
        let (gw, gh) = self.capacity(host.width(), host.height());
        let mark = mark.fit_to(gw, gh);
        let mut out = host.clone();

        for by in 0..gh {
            for bx in 0..gw {
                let want = mark.bit(bx, by);
                let mut strength = self.strength;
                for _ in 0..MAX_ATTEMPTS {
                    let mut c = forward(&read_block(&out, bx, by), &t);
                    let (a, b) = (c[COEFF_A.1][COEFF_A.0], c[COEFF_B.1][COEFF_B.0]);
                    let margin = if want { a - b } else { b - a };
                    if margin >= self.strength * 0.5 {
                        break;
                    }
                    let mid  = (a + b) / 2.0;
                    let half = strength / 2.0;
                    let (na, nb) = if want { (mid + half, mid - half) } else { (mid - half, mid + half) };
                    c[COEFF_A.1][COEFF_A.0] = na;
                    c[COEFF_B.1][COEFF_B.0] = nb;
                    write_block(&mut out, bx, by, &inverse(&c, &t));
                    strength *= 2.0;
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dct_round_trip_is_identity() {
        let t = cos_table();
        let mut px = [[0.0; BLOCK]; BLOCK];
        for (y, row) in px.iter_mut().enumerate() {
            for (x, v) in row.iter_mut().enumerate() {
                *v = (x * 13 + y * 7) as f64;
            }
        }
        let back = inverse(&forward(&px, &t), &t);
        for y in 0..BLOCK {
            for x in 0..BLOCK {
                assert!((back[y][x] - px[y][x]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_grid_is_one_cell_per_block() {
        let host = RgbImage::new(33, 17);
        let wm = DctCodec::default().extract(&host).unwrap();
        assert_eq!(wm.dims(), (4, 2));
    }

    #[test]
    fn test_too_small_image_is_rejected() {
        let host = RgbImage::new(4, 4);
        assert!(matches!(
            DctCodec::default().extract(&host),
            Err(CodecError::ImageTooSmall { .. })
        ));
    }
}
