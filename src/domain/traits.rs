// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The trainer treats watermarking as a black box with a fixed
// contract. There are two capabilities:
//
//   BlindCodec     — recovers the mark from the host alone
//                    (lsb, lsbm, lsbmr, dct)
//   ReferenceCodec — needs a second, aligned image to recover
//                    the mark (rlsb)
//
// Every codec can also embed, which the `embed` command uses to
// prepare watermarked training targets.
//
// Codecs are Send + Sync so a resolved codec can be shared by the
// training loop and the data tools without wrapping.

use image::RgbImage;

use crate::domain::error::CodecError;
use crate::domain::watermark::Watermark;

// ─── BlindCodec ───────────────────────────────────────────────────────────────
pub trait BlindCodec: Send + Sync {
    /// Registry name, e.g. "lsb"
    fn name(&self) -> &'static str;

    /// Grid of the recovered watermark for a host of the given size.
    fn capacity(&self, width: u32, height: u32) -> (u32, u32) {
        (width, height)
    }

    /// Recover the embedded mark. Must be deterministic.
    fn extract(&self, host: &RgbImage) -> Result<Watermark, CodecError>;

    /// Hide `mark` inside `host`; the mark is resampled onto `capacity()`.
    fn embed(&self, host: &RgbImage, mark: &Watermark) -> Result<RgbImage, CodecError>;
}

// ─── ReferenceCodec ───────────────────────────────────────────────────────────
pub trait ReferenceCodec: Send + Sync {
    fn name(&self) -> &'static str;

    fn capacity(&self, width: u32, height: u32) -> (u32, u32) {
        (width, height)
    }

    /// Recover the mark relative to an aligned reference image.
    fn extract(&self, host: &RgbImage, reference: &RgbImage) -> Result<Watermark, CodecError>;

    fn embed(
        &self,
        host:      &RgbImage,
        mark:      &Watermark,
        reference: &RgbImage,
    ) -> Result<RgbImage, CodecError>;
}
