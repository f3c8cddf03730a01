// ============================================================
// Layer 4 — Image Preprocessor
// ============================================================
// Turns a decoded image into the normalised CHW float layout
// the classifier expects, and back into displayable RGB.
//
// Steps (applied in order):
//   1. Resize so the shorter side equals `resize`
//   2. Center-crop a `crop` × `crop` square
//   3. Scale channels from [0, 255] to [0.0, 1.0]
//   4. Normalise each channel: (x - mean) / std
//
// The pipeline is deterministic and is used for both partitions.
//
// Reference: image crate documentation (imageops)

use anyhow::{ensure, Context, Result};
use image::{imageops, imageops::FilterType, RgbImage};
use std::path::Path;

use crate::domain::traits::RenderImage;

/// Per-channel mean of the ImageNet training set (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel standard deviation of the ImageNet training set (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

// ─── Normalization ────────────────────────────────────────────────────────────
/// Channel statistics used to normalise inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub mean: [f32; 3],
    pub std:  [f32; 3],
}

impl Default for Normalization {
    fn default() -> Self {
        Self { mean: IMAGENET_MEAN, std: IMAGENET_STD }
    }
}

impl Normalization {
    /// RGB pixels → CHW floats, normalised per channel.
    pub fn normalize(&self, img: &RgbImage) -> Vec<f32> {
        let plane   = (img.width() * img.height()) as usize;
        let mut out = vec![0.0f32; 3 * plane];

        // pixels() walks row-major, which is the HW order of each plane
        for (i, px) in img.pixels().enumerate() {
            for c in 0..3 {
                let x = px.0[c] as f32 / 255.0;
                out[c * plane + i] = (x - self.mean[c]) / self.std[c];
            }
        }
        out
    }

    /// CHW normalised floats → RGB bytes, clipped to the displayable range.
    pub fn denormalize(&self, chw: &[f32], width: u32, height: u32) -> RenderImage {
        let plane   = (width * height) as usize;
        let mut rgb = Vec::with_capacity(3 * plane);

        for i in 0..plane {
            for c in 0..3 {
                let x = (self.std[c] * chw[c * plane + i] + self.mean[c]).clamp(0.0, 1.0);
                rgb.push((x * 255.0).round() as u8);
            }
        }
        RenderImage { width, height, rgb }
    }
}

// ─── Preprocessor ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct Preprocessor {
    resize:        u32,
    crop:          u32,
    normalization: Normalization,
}

impl Preprocessor {
    /// `crop` must fit inside the resized shorter side.
    pub fn new(resize: u32, crop: u32, normalization: Normalization) -> Result<Self> {
        ensure!(crop > 0, "crop size must be positive");
        ensure!(
            crop <= resize,
            "crop size {crop} is larger than the resized shorter side {resize}"
        );
        Ok(Self { resize, crop, normalization })
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Shape of one processed sample: [channels, height, width]
    pub fn output_shape(&self) -> [usize; 3] {
        [3, self.crop as usize, self.crop as usize]
    }

    /// Decode an image file and process it.
    pub fn load(&self, path: &Path) -> Result<Vec<f32>> {
        let img = image::open(path)
            .with_context(|| format!("Cannot decode image '{}'", path.display()))?;
        Ok(self.process(&img.to_rgb8()))
    }

    /// Resize, crop, and normalise an in-memory image.
    pub fn process(&self, img: &RgbImage) -> Vec<f32> {
        let resized = resize_shorter_side(img, self.resize);
        let cropped = center_crop(&resized, self.crop);
        self.normalization.normalize(&cropped)
    }
}

/// Scale `img` so that its shorter side is `target`, keeping aspect ratio.
pub fn resize_shorter_side(img: &RgbImage, target: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    let scaled = |long: u32, short: u32| -> u32 {
        ((long as f64 * target as f64 / short.max(1) as f64).round() as u32).max(1)
    };

    let (nw, nh) = if w <= h {
        (target, scaled(h, w))
    } else {
        (scaled(w, h), target)
    };
    imageops::resize(img, nw, nh, FilterType::Triangle)
}

/// Cut a `size` × `size` square from the middle of `img`.
pub fn center_crop(img: &RgbImage, size: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    let size = size.min(w).min(h);
    let x    = (w - size) / 2;
    let y    = (h - size) / 2;
    imageops::crop_imm(img, x, y, size, size).to_image()
}
