// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack preprocessed samples
// into tensors:
//
//   Input:  Vec of N ImageItems, each C×H×W floats
//   Output: ImageBatch with images [N, C, H, W] and targets [N]
//
// Every item already has the same shape (fixed crop size), so
// the pixels are concatenated and reshaped in one go.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::{dataset::ImageItem, preprocessor::Normalization};
use crate::domain::traits::{Batch, RenderImage, RenderableBatch};

// ─── ImageBatch ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Normalised pixels — shape: [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,

    /// Class indices — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,

    /// Statistics the pixels were normalised with, for rendering
    pub normalization: Normalization,
}

impl<B: Backend> ImageBatch<B> {
    pub fn to_device(self, device: &B::Device) -> Self {
        Self {
            images:        self.images.to_device(device),
            targets:       self.targets.to_device(device),
            normalization: self.normalization,
        }
    }
}

impl<B: Backend> Batch for ImageBatch<B> {
    fn size(&self) -> usize {
        self.targets.dims()[0]
    }

    fn labels(&self) -> Vec<usize> {
        self.targets
            .clone()
            .into_data()
            .iter::<i64>()
            .map(|l| l as usize)
            .collect()
    }
}

impl<B: Backend> RenderableBatch for ImageBatch<B> {
    fn render(&self, index: usize) -> RenderImage {
        let [_, _, height, width] = self.images.dims();
        let pixels: Vec<f32> = self.images
            .clone()
            .slice([index..index + 1])
            .into_data()
            .iter::<f32>()
            .collect();
        self.normalization.denormalize(&pixels, width as u32, height as u32)
    }
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created in the right place.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    device:        B::Device,
    /// [channels, height, width] of every item
    shape:         [usize; 3],
    normalization: Normalization,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device, shape: [usize; 3], normalization: Normalization) -> Self {
        Self { device, shape, normalization }
    }
}

impl<B: Backend> Batcher<ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>) -> ImageBatch<B> {
        let batch_size       = items.len();
        let [channels, h, w]    = self.shape;

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|item| item.pixels.iter().copied())
            .collect();
        let labels: Vec<i64> = items.iter().map(|item| item.label as i64).collect();

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([batch_size, channels, h, w]);
        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ImageBatch { images, targets, normalization: self.normalization }
    }
}
