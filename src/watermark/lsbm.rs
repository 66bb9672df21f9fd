//! LSB matching on a single channel.
//!
//! Instead of overwriting the LSB, a pixel whose LSB disagrees with the
//! mark is moved one step up or down at random. Extraction is identical
//! to plain LSB on that channel.

use image::RgbImage;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{lsb_of, step};
use crate::domain::error::CodecError;
use crate::domain::traits::BlindCodec;
use crate::domain::watermark::Watermark;

const EMBED_SEED: u64 = 0x5eed_15b3;

#[derive(Debug, Clone, Copy)]
pub struct LsbMatching {
    channel: usize,
    seed:    u64,
}

impl LsbMatching {
    pub fn new(channel: usize) -> Self {
        Self { channel: channel.min(2), seed: EMBED_SEED }
    }
}

impl BlindCodec for LsbMatching {
    fn name(&self) -> &'static str {
        "lsbm"
    }

    fn extract(&self, host: &RgbImage) -> Result<Watermark, CodecError> {
        let bits: Vec<bool> = host.pixels()
            .map(|px| lsb_of(px.0[self.channel]))
            .collect();
        Ok(Watermark::from_bits(host.width(), host.height(), &bits))
    }

    fn embed(&self, host: &RgbImage, mark: &Watermark) -> Result<RgbImage, CodecError> {
        let mark    = mark.fit_to(host.width(), host.height());
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out = host.clone();
        for (x, y, px) in out.enumerate_pixels_mut() {
            let v = px.0[self.channel];
            if lsb_of(v) != mark.bit(x, y) {
                px.0[self.channel] = step(v, rng.gen_bool(0.5));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_only_selected_channel_is_touched() {
        let host = RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]));
        let mark = Watermark::from_bits(8, 8, &[true; 64]);
        let out  = LsbMatching::new(2).embed(&host, &mark).unwrap();
        for px in out.pixels() {
            assert_eq!(px.0[0], 10);
            assert_eq!(px.0[1], 20);
            assert!(px.0[2] == 29 || px.0[2] == 31);
        }
    }

    #[test]
    fn test_saturated_pixels_stay_in_range() {
        let host = RgbImage::from_pixel(2, 1, Rgb([0, 0, 0]));
        let mark = Watermark::from_bits(2, 1, &[true, true]);
        let out  = LsbMatching::new(2).embed(&host, &mark).unwrap();
        assert!(out.pixels().all(|px| px.0[2] == 1));
    }
}
