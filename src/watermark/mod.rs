// ============================================================
// Layer 3b — Watermark Codecs
// ============================================================
// The concrete watermark algorithms plus the registry that turns
// a configuration string into one of them.
//
//   lsb.rs    — plain least-significant-bit substitution
//   lsbm.rs   — LSB matching (±1 steps) on one channel
//   lsbmr.rs  — LSB matching revisited (two bits per pixel pair)
//   rlsb.rs   — parity relative to a reference image
//   dct.rs    — coefficient ordering in 8x8 DCT blocks
//
// `ALL` is the registry; name and constructor are exhaustive
// matches over the variant. It is resolved exactly once per run.
// After that the trainer only ever holds a `Codec` and calls
// `extract`, which hands the reference image to the
// reference-assisted variant and to nobody else.

pub mod lsb;
pub mod lsbm;
pub mod lsbmr;
pub mod rlsb;
pub mod dct;

use std::{fmt, str::FromStr};
use image::RgbImage;

use crate::domain::error::{CodecError, ConfigError};
use crate::domain::traits::{BlindCodec, ReferenceCodec};
use crate::domain::watermark::Watermark;

/// Channel used by the single-channel matching codecs (blue).
pub const DEFAULT_CHANNEL: usize = 2;

// ─── WatermarkKind ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkKind {
    Lsb,
    Lsbm,
    Lsbmr,
    Rlsb,
    Dct,
}

/// Every variant, in the order names are listed to the user.
pub const ALL: [WatermarkKind; 5] = [
    WatermarkKind::Lsb,
    WatermarkKind::Lsbm,
    WatermarkKind::Lsbmr,
    WatermarkKind::Rlsb,
    WatermarkKind::Dct,
];

impl WatermarkKind {
    pub fn names() -> Vec<&'static str> {
        ALL.iter().map(|kind| kind.name()).collect()
    }

    pub fn name(self) -> &'static str {
        match self {
            WatermarkKind::Lsb   => "lsb",
            WatermarkKind::Lsbm  => "lsbm",
            WatermarkKind::Lsbmr => "lsbmr",
            WatermarkKind::Rlsb  => "rlsb",
            WatermarkKind::Dct   => "dct",
        }
    }

    /// Instantiate the codec for this variant.
    pub fn codec(self) -> Codec {
        match self {
            WatermarkKind::Lsb   => Codec::Blind(Box::new(lsb::Lsb)),
            WatermarkKind::Lsbm  => Codec::Blind(Box::new(lsbm::LsbMatching::new(DEFAULT_CHANNEL))),
            WatermarkKind::Lsbmr => Codec::Blind(Box::new(lsbmr::LsbMatchingRevisited::new(DEFAULT_CHANNEL))),
            WatermarkKind::Rlsb  => Codec::Referenced(Box::new(rlsb::RobustLsb)),
            WatermarkKind::Dct   => Codec::Blind(Box::new(dct::DctCodec::default())),
        }
    }
}

impl FromStr for WatermarkKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL.iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ConfigError::unknown("watermark", s, &Self::names()))
    }
}

impl fmt::Display for WatermarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Codec ────────────────────────────────────────────────────────────────────
/// A resolved codec, tagged by the capability it offers.
pub enum Codec {
    Blind(Box<dyn BlindCodec>),
    Referenced(Box<dyn ReferenceCodec>),
}

impl Codec {
    /// Resolve a configuration string. Fails fast on unknown names.
    pub fn resolve(name: &str) -> Result<Self, ConfigError> {
        let kind: WatermarkKind = name.parse()?;
        Ok(kind.codec())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Codec::Blind(c)      => c.name(),
            Codec::Referenced(c) => c.name(),
        }
    }

    pub fn needs_reference(&self) -> bool {
        matches!(self, Codec::Referenced(_))
    }

    pub fn capacity(&self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Codec::Blind(c)      => c.capacity(width, height),
            Codec::Referenced(c) => c.capacity(width, height),
        }
    }

    /// Extract the mark from `host`. `reference` is the aligned
    /// conditioning image; only the reference-assisted variant reads it.
    pub fn extract(&self, host: &RgbImage, reference: &RgbImage) -> Result<Watermark, CodecError> {
        match self {
            Codec::Blind(c)      => c.extract(host),
            Codec::Referenced(c) => c.extract(host, reference),
        }
    }

    /// Extraction outside training, where a reference may be absent.
    pub fn recover(&self, host: &RgbImage, reference: Option<&RgbImage>) -> Result<Watermark, CodecError> {
        match self {
            Codec::Blind(c) => c.extract(host),
            Codec::Referenced(c) => {
                let reference = reference.ok_or(CodecError::MissingReference { codec: c.name() })?;
                c.extract(host, reference)
            }
        }
    }

    /// Embedding counterpart used by the data tools.
    pub fn embed(
        &self,
        host:      &RgbImage,
        mark:      &Watermark,
        reference: Option<&RgbImage>,
    ) -> Result<RgbImage, CodecError> {
        match self {
            Codec::Blind(c) => c.embed(host, mark),
            Codec::Referenced(c) => {
                let reference = reference.ok_or(CodecError::MissingReference { codec: c.name() })?;
                c.embed(host, mark, reference)
            }
        }
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("name", &self.name())
            .field("needs_reference", &self.needs_reference())
            .finish()
    }
}

// ─── Pixel helpers shared by the codecs ──────────────────────────────────────
#[inline]
pub(crate) fn lsb_of(v: u8) -> bool {
    v & 1 == 1
}

#[inline]
pub(crate) fn with_lsb(v: u8, bit: bool) -> u8 {
    (v & !1) | bit as u8
}

/// Move `v` by ±1 without leaving [0, 255]. `up` is the preferred direction.
#[inline]
pub(crate) fn step(v: u8, up: bool) -> u8 {
    match (v, up) {
        (0, _)     => 1,
        (255, _)   => 254,
        (_, true)  => v + 1,
        (_, false) => v - 1,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{Rgb, RgbImage};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::domain::watermark::Watermark;

    /// Photo-like noise: values stay clear of 0/255 like most natural images.
    pub fn noisy_image(width: u32, height: u32, seed: u64) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(seed);
        RgbImage::from_fn(width, height, |_, _| {
            Rgb([rng.gen_range(32..224), rng.gen_range(32..224), rng.gen_range(32..224)])
        })
    }

    pub fn checker_mark(width: u32, height: u32) -> Watermark {
        let bits: Vec<bool> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x / 2 + y / 2) % 2 == 0))
            .collect();
        Watermark::from_bits(width, height, &bits)
    }
}
