// ============================================================
// Layer 3 — Watermark Signal
// ============================================================
// The thing a codec hides inside a host image and later recovers.
// It is a binary plane: every cell is either "bit set" (stored as
// 255) or "bit clear" (stored as 0), so it can be saved and
// inspected like any greyscale picture.
//
// A watermark has no lifecycle of its own during training: it is
// recomputed from the real target and from the generated image on
// every iteration and only ever read for reporting.

use image::{GrayImage, Luma, RgbImage, imageops::FilterType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    plane: GrayImage,
}

impl Watermark {
    /// Build a watermark from per-cell bits, row-major.
    pub fn from_bits(width: u32, height: u32, bits: &[bool]) -> Self {
        let mut plane = GrayImage::new(width, height);
        for (i, px) in plane.pixels_mut().enumerate() {
            let on = bits.get(i).copied().unwrap_or(false);
            *px = Luma([if on { 255 } else { 0 }]);
        }
        Self { plane }
    }

    /// Threshold an arbitrary greyscale picture (e.g. a logo) into a mark.
    pub fn from_gray(img: &GrayImage) -> Self {
        let mut plane = img.clone();
        for px in plane.pixels_mut() {
            px.0[0] = if px.0[0] > 127 { 255 } else { 0 };
        }
        Self { plane }
    }

    pub fn width(&self)  -> u32 { self.plane.width() }
    pub fn height(&self) -> u32 { self.plane.height() }

    pub fn dims(&self) -> (u32, u32) {
        self.plane.dimensions()
    }

    pub fn bit(&self, x: u32, y: u32) -> bool {
        self.plane.get_pixel(x, y).0[0] > 127
    }

    /// Nearest-neighbour resample onto a codec's capacity grid.
    pub fn fit_to(&self, width: u32, height: u32) -> Self {
        if self.dims() == (width, height) {
            return self.clone();
        }
        let plane = image::imageops::resize(&self.plane, width, height, FilterType::Nearest);
        Self::from_gray(&plane)
    }

    /// Fraction of cells that agree with `other` (same grid required).
    pub fn agreement(&self, other: &Watermark) -> f64 {
        if self.dims() != other.dims() || self.width() == 0 || self.height() == 0 {
            return 0.0;
        }
        let same = self.plane.pixels()
            .zip(other.plane.pixels())
            .filter(|(a, b)| a == b)
            .count();
        same as f64 / (self.width() * self.height()) as f64
    }

    /// Fraction of cells that are set.
    pub fn density(&self) -> f64 {
        let cells = (self.width() * self.height()) as f64;
        if cells == 0.0 {
            return 0.0;
        }
        self.plane.pixels().filter(|p| p.0[0] > 127).count() as f64 / cells
    }

    pub fn to_rgb(&self) -> RgbImage {
        image::DynamicImage::ImageLuma8(self.plane.clone()).to_rgb8()
    }
}
