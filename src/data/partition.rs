// ============================================================
// Layer 4 — Loader-backed Partition
// ============================================================
// Wraps a Burn DataLoader so the training loop can treat it as
// a finite, restartable sequence of batches. Every call to
// batches() starts a new pass (and a new shuffle, when enabled).

use burn::data::{
    dataloader::{DataLoader, DataLoaderBuilder},
    dataset::Dataset,
};
use burn::prelude::*;
use std::sync::Arc;

use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::ImageItem,
};
use crate::domain::traits::Partition;

/// How a partition's loader batches and orders its data.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub batch_size:  usize,
    /// Seed for per-pass shuffling; `None` keeps dataset order
    pub shuffle:     Option<u64>,
    /// Background loading threads; 0 loads on the calling thread
    pub num_workers: usize,
}

pub struct LoaderPartition<O> {
    loader:  Arc<dyn DataLoader<O>>,
    samples: usize,
}

impl<O> LoaderPartition<O> {
    pub fn new(loader: Arc<dyn DataLoader<O>>, samples: usize) -> Self {
        Self { loader, samples }
    }
}

impl<O> Partition for LoaderPartition<O> {
    type Batch = O;

    fn len(&self) -> usize {
        self.samples
    }

    fn batches(&self) -> Box<dyn Iterator<Item = O> + '_> {
        Box::new(self.loader.iter())
    }
}

/// Build an image partition over `dataset`.
pub fn image_partition<B, D>(
    dataset: D,
    batcher: ImageBatcher<B>,
    options: &LoaderOptions,
) -> LoaderPartition<ImageBatch<B>>
where
    B: Backend,
    D: Dataset<ImageItem> + 'static,
{
    let samples = dataset.len();

    let mut builder = DataLoaderBuilder::new(batcher).batch_size(options.batch_size);
    if let Some(seed) = options.shuffle {
        builder = builder.shuffle(seed);
    }
    if options.num_workers > 0 {
        builder = builder.num_workers(options.num_workers);
    }

    LoaderPartition::new(builder.build(dataset), samples)
}
