//! Plain least-significant-bit substitution.
//!
//! Each watermark bit overwrites the LSB of all three channels of the
//! matching pixel. Extraction takes a majority vote over the three LSBs,
//! so a single flipped channel does not flip the recovered bit.

use image::RgbImage;

use super::{lsb_of, with_lsb};
use crate::domain::error::CodecError;
use crate::domain::traits::BlindCodec;
use crate::domain::watermark::Watermark;

#[derive(Debug, Clone, Copy, Default)]
pub struct Lsb;

impl BlindCodec for Lsb {
    fn name(&self) -> &'static str {
        "lsb"
    }

    fn extract(&self, host: &RgbImage) -> Result<Watermark, CodecError> {
        let bits: Vec<bool> = host.pixels()
            .map(|px| px.0.iter().filter(|&&v| lsb_of(v)).count() >= 2)
            .collect();
        Ok(Watermark::from_bits(host.width(), host.height(), &bits))
    }

    fn embed(&self, host: &RgbImage, mark: &Watermark) -> Result<RgbImage, CodecError> {
        let mark = mark.fit_to(host.width(), host.height());
        let mut out = host.clone();
        for (x, y, px) in out.enumerate_pixels_mut() {
            let bit = mark.bit(x, y);
            for v in px.0.iter_mut() {
                *v = with_lsb(*v, bit);
            }
        }
        Ok(out)
    }
}
