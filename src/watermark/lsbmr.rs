//! LSB matching revisited (Mielikainen) on horizontal pixel pairs.
//!
//! For a pair `(x1, x2)` on one channel the two carried bits are
//! `lsb(x1)` and `lsb(x1 / 2 + x2)`. Embedding changes at most one of the
//! two pixels by one in the common case. A trailing odd column carries
//! its bit as plain LSB.

use image::RgbImage;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{lsb_of, step, with_lsb};
use crate::domain::error::CodecError;
use crate::domain::traits::BlindCodec;
use crate::domain::watermark::Watermark;

const EMBED_SEED: u64 = 0x15b3_4a11;

#[inline]
fn pair_bit(x1: u8, x2: u8) -> bool {
    (x1 as u16 / 2 + x2 as u16) & 1 == 1
}

#[derive(Debug, Clone, Copy)]
pub struct LsbMatchingRevisited {
    channel: usize,
    seed:    u64,
}

impl LsbMatchingRevisited {
    pub fn new(channel: usize) -> Self {
        Self { channel: channel.min(2), seed: EMBED_SEED }
    }

    /// Embed `(m1, m2)` into `(x1, x2)`.
    fn embed_pair(x1: u8, x2: u8, m1: bool, m2: bool, rng: &mut StdRng) -> (u8, u8) {
        let x1 = if lsb_of(x1) == m1 {
            x1
        } else if x1 > 0 && pair_bit(x1 - 1, x2) == m2 {
            x1 - 1
        } else if x1 < 255 {
            x1 + 1
        } else {
            254
        };
        let x2 = if pair_bit(x1, x2) == m2 { x2 } else { step(x2, rng.gen_bool(0.5)) };
        (x1, x2)
    }
}

impl BlindCodec for LsbMatchingRevisited {
    fn name(&self) -> &'static str {
        "lsbmr"
    }

    fn extract(&self, host: &RgbImage) -> Result<Watermark, CodecError> {
        let (w, h) = host.dimensions();
        let c = self.channel;
        let mut bits = vec![false; (w * h) as usize];
        for y in 0..h {
            let mut x = 0;
            while x + 1 < w {
                let x1 = host.get_pixel(x, y).0[c];
                let x2 = host.get_pixel(x + 1, y).0[c];
                bits[(y * w + x) as usize]     = lsb_of(x1);
                bits[(y * w + x + 1) as usize] = pair_bit(x1, x2);
                x += 2;
            }
            if x < w {
                bits[(y * w + x) as usize] = lsb_of(host.get_pixel(x, y).0[c]);
            }
        }
        Ok(Watermark::from_bits(w, h, &bits))
    }

    fn embed(&self, host: &RgbImage, mark: &Watermark) -> Result<RgbImage, CodecError> {
        let (w, h)  = host.dimensions();
        let mark    = mark.fit_to(w, h);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out = host.clone();
        let c = self.channel;
        for y in 0..h {
            let mut x = 0;
            while x + 1 < w {
                let x1 = out.get_pixel(x, y).0[c];
                let x2 = out.get_pixel(x + 1, y).0[c];
                let (y1, y2) = Self::embed_pair(x1, x2, mark.bit(x, y), mark.bit(x + 1, y), &mut rng);
                out.get_pixel_mut(x, y).0[c]     = y1;
                out.get_pixel_mut(x + 1, y).0[c] = y2;
                x += 2;
            }
            if x < w {
                let px = out.get_pixel_mut(x, y);
                px.0[c] = with_lsb(px.0[c], mark.bit(x, y));
            }
        }
        Ok(out)
    }
}
