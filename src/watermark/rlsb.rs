//! Reference-assisted robust LSB.
//!
//! The bit of a pixel is the parity of `Σ host channels − Σ reference
//! channels`. Because only channel sums are compared, the mark survives
//! any permutation of the host's channels, and it can only be read back
//! by someone holding the aligned reference image.

use image::RgbImage;

use crate::domain::error::CodecError;
use crate::domain::traits::ReferenceCodec;
use crate::domain::watermark::Watermark;

#[derive(Debug, Clone, Copy, Default)]
pub struct RobustLsb;

#[inline]
fn channel_sum(px: &image::Rgb<u8>) -> i32 {
    px.0.iter().map(|&v| v as i32).sum()
}

fn check_dims(host: &RgbImage, reference: &RgbImage) -> Result<(), CodecError> {
    if host.dimensions() != reference.dimensions() {
        return Err(CodecError::DimensionMismatch {
            codec:  "rlsb",
            got_w:  host.width(),
            got_h:  host.height(),
            want_w: reference.width(),
            want_h: reference.height(),
        });
    }
    Ok(())
}

impl ReferenceCodec for RobustLsb {
    fn name(&self) -> &'static str {
        "rlsb"
    }

    fn extract(&self, host: &RgbImage, reference: &RgbImage) -> Result<Watermark, CodecError> {
        check_dims(host, reference)?;
        let bits: Vec<bool> = host.pixels()
            .zip(reference.pixels())
            .map(|(h, r)| (channel_sum(h) - channel_sum(r)).rem_euclid(2) == 1)
            .collect();
        Ok(Watermark::from_bits(host.width(), host.height(), &bits))
    }

    fn embed(
        &self,
        host:      &RgbImage,
        mark:      &Watermark,
        reference: &RgbImage,
    ) -> Result<RgbImage, CodecError> {
        check_dims(host, reference)?;
        let mark    = mark.fit_to(host.width(), host.height());
        let mut out = host.clone();
        for (x, y, px) in out.enumerate_pixels_mut() {
            let parity = (channel_sum(px) - channel_sum(reference.get_pixel(x, y))).rem_euclid(2) == 1;
            if parity == mark.bit(x, y) {
                continue;
            }
            // Nudge the channel with the most headroom so nothing saturates.
            let (idx, &v) = px.0.iter()
                .enumerate()
                .min_by_key(|(_, &v)| (v as i16 - 127).abs())
                .unwrap_or((0, &px.0[0]));
            px.0[idx] = if v < 255 { v + 1 } else { v - 1 };
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_mismatched_reference_is_rejected() {
        let host      = RgbImage::new(4, 4);
        let reference = RgbImage::new(4, 2);
        assert!(matches!(
            RobustLsb.extract(&host, &reference),
            Err(CodecError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_survives_channel_permutation() {
        let host      = RgbImage::from_pixel(4, 4, Rgb([40, 90, 200]));
        let reference = RgbImage::from_pixel(4, 4, Rgb([12, 34, 56]));
        let mark      = Watermark::from_bits(4, 4, &[true, false].repeat(8));
        let marked    = RobustLsb.embed(&host, &mark, &reference).unwrap();

        let mut swapped = marked.clone();
        for px in swapped.pixels_mut() {
            px.0.swap(0, 2);
        }
        assert_eq!(RobustLsb.extract(&swapped, &reference).unwrap(), mark);
    }

    #[test]
    fn test_depends_on_reference() {
        let host = RgbImage::from_pixel(2, 1, Rgb([1, 1, 1]));
        let even = RgbImage::from_pixel(2, 1, Rgb([0, 0, 0]));
        let odd  = RgbImage::from_pixel(2, 1, Rgb([1, 0, 0]));
        assert!(RobustLsb.extract(&host, &even).unwrap().bit(0, 0));
        assert!(!RobustLsb.extract(&host, &odd).unwrap().bit(0, 0));
    }
}
