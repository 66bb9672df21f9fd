use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};
use anyhow::{bail, Context, Result};
use burn::data::dataset::Dataset;
use image::{imageops::{self, FilterType}, RgbImage};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::loader::{list_images, load_rgb, split_pair};
use crate::ml::conversion::image_to_values;

/// One aligned pair, already cropped and normalised to [-1, 1], CHW.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairedItem {
    pub a:          Vec<f32>,
    pub b:          Vec<f32>,
    pub channels_a: usize,
    pub channels_b: usize,
    pub size:       usize,
    pub path:       String,
}

/// How a raw side-by-side picture becomes a training pair.
#[derive(Debug, Clone, Copy)]
pub struct AlignedOptions {
    pub load_size:  u32,
    pub crop_size:  u32,
    pub channels_a: usize,
    pub channels_b: usize,
    /// Random crop and flip; off means a plain resize to `crop_size`.
    pub augment:    bool,
    pub flip:       bool,
    pub seed:       u64,
}

impl AlignedOptions {
    /// Resize, then crop and flip both halves identically.
    pub fn transform(&self, a: &RgbImage, b: &RgbImage, rng: &mut impl Rng) -> (RgbImage, RgbImage) {
        if !self.augment {
            let c = self.crop_size;
            return (
                imageops::resize(a, c, c, FilterType::CatmullRom),
                imageops::resize(b, c, c, FilterType::CatmullRom),
            );
        }

        let l = self.load_size;
        let a = imageops::resize(a, l, l, FilterType::CatmullRom);
        let b = imageops::resize(b, l, l, FilterType::CatmullRom);

        let slack = l - self.crop_size;
        let x = rng.gen_range(0..=slack);
        let y = rng.gen_range(0..=slack);
        let mut a = imageops::crop_imm(&a, x, y, self.crop_size, self.crop_size).to_image();
        let mut b = imageops::crop_imm(&b, x, y, self.crop_size, self.crop_size).to_image();

        if self.flip && rng.gen_bool(0.5) {
            imageops::flip_horizontal_in_place(&mut a);
            imageops::flip_horizontal_in_place(&mut b);
        }
        (a, b)
    }
}

/// One decoded side-by-side picture, already split into its halves.
struct RawPair {
    path: PathBuf,
    a:    RgbImage,
    b:    RgbImage,
}

/// Aligned pairs decoded once at construction; `get` only augments.
pub struct PairedDataset {
    pairs: Vec<RawPair>,
    opts:  AlignedOptions,
    draws: AtomicU64,
}

impl PairedDataset {
    /// Decodes every image in `dir`. Any unreadable file fails here,
    /// before the first epoch.
    pub fn from_dir(dir: &Path, opts: AlignedOptions) -> Result<Self> {
        if opts.crop_size > opts.load_size {
            bail!("crop_size {} is larger than load_size {}", opts.crop_size, opts.load_size);
        }
        let paths = list_images(dir)?;
        if paths.is_empty() {
            bail!("no images found in '{}'", dir.display());
        }

        let pairs = paths
            .into_iter()
            .map(|path| {
                let (a, b) = split_pair(&load_rgb(&path)?)
                    .with_context(|| format!("Cannot split '{}' into an A|B pair", path.display()))?;
                Ok(RawPair { path, a, b })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Decoded {} aligned pairs from '{}'", pairs.len(), dir.display());
        Ok(Self { pairs, opts, draws: AtomicU64::new(0) })
    }

    fn item(&self, pair: &RawPair) -> PairedItem {
        let draw = self.draws.fetch_add(1, Ordering::Relaxed);
        let mut rng = StdRng::seed_from_u64(self.opts.seed.wrapping_add(draw));
        let (a, b) = self.opts.transform(&pair.a, &pair.b, &mut rng);

        PairedItem {
            a:          image_to_values(&a, self.opts.channels_a),
            b:          image_to_values(&b, self.opts.channels_b),
            channels_a: self.opts.channels_a,
            channels_b: self.opts.channels_b,
            size:       self.opts.crop_size as usize,
            path:       pair.path.display().to_string(),
        }
    }
}

impl Dataset<PairedItem> for PairedDataset {
    fn get(&self, index: usize) -> Option<PairedItem> {
        self.pairs.get(index).map(|pair| self.item(pair))
    }

    fn len(&self) -> usize {
        self.pairs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn options(augment: bool) -> AlignedOptions {
        AlignedOptions {
            load_size: 12, crop_size: 8, channels_a: 3, channels_b: 1,
            augment, flip: true, seed: 7,
        }
    }

    fn write_pair(dir: &Path, name: &str) {
        let ab = RgbImage::from_fn(20, 10, |x, _| if x < 10 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) });
        ab.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_items_have_cropped_shapes() {
        let tmp = tempfile::tempdir().unwrap();
        write_pair(tmp.path(), "0001.png");
        write_pair(tmp.path(), "0002.png");

        let ds = PairedDataset::from_dir(tmp.path(), options(true)).unwrap();
        assert_eq!(ds.len(), 2);
        let item = ds.get(1).unwrap();
        assert_eq!(item.a.len(), 3 * 8 * 8);
        assert_eq!(item.b.len(), 8 * 8);
        assert!(item.path.ends_with("0002.png"));
        assert!(ds.get(2).is_none());
    }

    #[test]
    fn test_halves_stay_in_their_domains() {
        let tmp = tempfile::tempdir().unwrap();
        write_pair(tmp.path(), "0001.png");
        let item = PairedDataset::from_dir(tmp.path(), options(false)).unwrap().get(0).unwrap();
        // A is pure red: R plane at +1, B plane at -1
        assert!(item.a[..64].iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert!(item.a[128..].iter().all(|&v| (v + 1.0).abs() < 1e-6));
        assert!(item.a.iter().chain(&item.b).all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_crop_larger_than_load_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write_pair(tmp.path(), "0001.png");
        let opts = AlignedOptions { crop_size: 16, ..options(true) };
        assert!(PairedDataset::from_dir(tmp.path(), opts).is_err());
    }

    #[test]
    fn test_truncated_image_fails_at_construction() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["0001.png", "0002.png", "0003.png"] {
            write_pair(tmp.path(), name);
        }
        // Keep the PNG signature and IHDR, drop the pixel data
        let bytes = std::fs::read(tmp.path().join("0002.png")).unwrap();
        std::fs::write(tmp.path().join("0002.png"), &bytes[..40]).unwrap();

        let err = PairedDataset::from_dir(tmp.path(), options(true)).err().unwrap();
        assert!(format!("{err:#}").contains("0002.png"), "{err:#}");
    }

    #[test]
    fn test_loader_yields_every_pair() {
        use burn::backend::NdArray;
        use burn::data::dataloader::DataLoaderBuilder;
        use crate::data::batcher::PairedBatcher;

        let tmp = tempfile::tempdir().unwrap();
        for name in ["0001.png", "0002.png", "0003.png"] {
            write_pair(tmp.path(), name);
        }
        let ds = PairedDataset::from_dir(tmp.path(), options(true)).unwrap();
        let loader = DataLoaderBuilder::<NdArray<f32>, _, _>::new(PairedBatcher)
            .batch_size(1)
            .num_workers(1)
            .build(ds);

        let mut paths: Vec<String> = loader.iter().flat_map(|batch| batch.a_paths).collect();
        paths.sort();
        assert_eq!(paths.len(), 3);
        assert!(paths[2].ends_with("0003.png"));
    }

    #[test]
    fn test_flip_and_crop_apply_to_both_halves() {
        let a = RgbImage::from_fn(12, 12, |x, y| Rgb([(x * 20) as u8, (y * 20) as u8, 0]));
        let opts = AlignedOptions { load_size: 12, ..options(true) };
        let mut rng = StdRng::seed_from_u64(3);
        let (ta, tb) = opts.transform(&a, &a, &mut rng);
        assert_eq!(ta, tb);
        assert_eq!(ta.dimensions(), (8, 8));
    }
}
