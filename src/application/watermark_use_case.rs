// ============================================================
// Layer 2 — Watermark Tools
// ============================================================
// Standalone embed / extract, used to prepare watermarked training
// targets and to inspect generated images.
//
//   embed:   host.png + mark.png (+ reference.png for rlsb) → marked.png
//   extract: marked.png (+ reference.png for rlsb)          → mark.png
//
// The mark picture is thresholded at mid-grey and resampled onto
// the codec's capacity grid (the full image, or one cell per 8x8
// block for dct).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::data::loader::load_rgb;
use crate::domain::watermark::Watermark;
use crate::infra::visuals::save_png;
use crate::watermark::Codec;

fn load_reference(path: Option<&Path>) -> Result<Option<image::RgbImage>> {
    path.map(load_rgb).transpose()
}

pub struct EmbedUseCase {
    pub watermark: String,
    pub host:      PathBuf,
    pub mark:      PathBuf,
    pub reference: Option<PathBuf>,
    pub output:    PathBuf,
}

impl EmbedUseCase {
    pub fn execute(&self) -> Result<()> {
        let codec = Codec::resolve(&self.watermark)?;

        let host = load_rgb(&self.host)?;
        let mark = image::open(&self.mark)
            .with_context(|| format!("Cannot open mark '{}'", self.mark.display()))?
            .to_luma8();
        let reference = load_reference(self.reference.as_deref())?;

        let (w, h) = codec.capacity(host.width(), host.height());
        let mark   = Watermark::from_gray(&mark).fit_to(w, h);
        let marked = codec.embed(&host, &mark, reference.as_ref())?;

        save_png(&self.output, &marked)?;
        tracing::info!(
            "Embedded a {}x{} {} mark into '{}'",
            w, h, codec.name(), self.output.display(),
        );
        Ok(())
    }
}

pub struct ExtractUseCase {
    pub watermark: String,
    pub image:     PathBuf,
    pub reference: Option<PathBuf>,
    pub output:    PathBuf,
}

impl ExtractUseCase {
    pub fn execute(&self) -> Result<Watermark> {
        let codec = Codec::resolve(&self.watermark)?;

        let host      = load_rgb(&self.image)?;
        let reference = load_reference(self.reference.as_deref())?;
        let mark      = codec.recover(&host, reference.as_ref())?;

        save_png(&self.output, &mark.to_rgb())?;
        tracing::info!(
            "Extracted a {}x{} {} mark to '{}'",
            mark.width(), mark.height(), codec.name(), self.output.display(),
        );
        Ok(mark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    use crate::domain::error::{CodecError, ConfigError};
    use crate::watermark::test_support::noisy_image;

    fn write_inputs(dir: &Path) {
        noisy_image(32, 32, 1).save(dir.join("host.png")).unwrap();
        noisy_image(32, 32, 2).save(dir.join("ref.png")).unwrap();
        GrayImage::from_fn(32, 32, |x, _| Luma([if x < 16 { 255 } else { 0 }]))
            .save(dir.join("mark.png"))
            .unwrap();
    }

    fn round_trip(dir: &Path, watermark: &str, reference: Option<PathBuf>) -> Watermark {
        EmbedUseCase {
            watermark: watermark.into(),
            host:      dir.join("host.png"),
            mark:      dir.join("mark.png"),
            reference: reference.clone(),
            output:    dir.join("marked.png"),
        }
        .execute()
        .unwrap();

        ExtractUseCase {
            watermark: watermark.into(),
            image:     dir.join("marked.png"),
            reference,
            output:    dir.join("found.png"),
        }
        .execute()
        .unwrap()
    }

    #[test]
    fn test_lsb_round_trip_through_files() {
        let tmp = tempfile::tempdir().unwrap();
        write_inputs(tmp.path());
        let found = round_trip(tmp.path(), "lsb", None);
        assert_eq!(found.dims(), (32, 32));
        assert!(found.bit(0, 0));
        assert!(!found.bit(31, 0));
        assert!(tmp.path().join("found.png").exists());
    }

    #[test]
    fn test_dct_mark_lives_on_block_grid() {
        let tmp = tempfile::tempdir().unwrap();
        write_inputs(tmp.path());
        let found = round_trip(tmp.path(), "dct", None);
        assert_eq!(found.dims(), (4, 4));
        assert!(found.bit(0, 0));
        assert!(!found.bit(3, 0));
    }

    #[test]
    fn test_rlsb_with_reference() {
        let tmp = tempfile::tempdir().unwrap();
        write_inputs(tmp.path());
        let found = round_trip(tmp.path(), "rlsb", Some(tmp.path().join("ref.png")));
        assert!(found.bit(0, 0));
        assert!(!found.bit(31, 31));
    }

    #[test]
    fn test_rlsb_without_reference_fails() {
        let tmp = tempfile::tempdir().unwrap();
        write_inputs(tmp.path());
        let err = EmbedUseCase {
            watermark: "rlsb".into(),
            host:      tmp.path().join("host.png"),
            mark:      tmp.path().join("mark.png"),
            reference: None,
            output:    tmp.path().join("marked.png"),
        }
        .execute()
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<CodecError>(), Some(CodecError::MissingReference { .. })));
    }

    #[test]
    fn test_unknown_codec_is_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ExtractUseCase {
            watermark: "f5".into(),
            image:     tmp.path().join("missing.png"),
            reference: None,
            output:    tmp.path().join("out.png"),
        }
        .execute()
        .unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }
}
