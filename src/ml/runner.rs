// ============================================================
// Layer 5 — Burn Training and Visualization Runs
// ============================================================
// Picks the backend, wires the Burn pieces into the generic
// training loop, and saves the outcome.
//
// Backends (chosen by --backend, never probed):
//   - wgpu    → Autodiff<Wgpu>     GPU through WebGPU
//   - ndarray → Autodiff<NdArray>  pure-Rust CPU
//
// Both runs use the autodiff backend; evaluation-mode forward
// passes drop to its inner backend inside BurnClassifier.

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    optim::{momentum::MomentumConfig, AdamConfig, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::path::Path;

use crate::application::train_use_case::{BackendKind, OptimizerKind, TrainConfig};
use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::{ImageFolder, ImageSets},
    partition::{image_partition, LoaderOptions, LoaderPartition},
};
use crate::domain::{
    metrics::TrainingSummary,
    traits::{RenderSink, TrainingObserver},
};
use crate::infra::checkpoint::{load_backbone, BestRecord, CheckpointManager};
use crate::ml::{
    classifier::{BurnClassifier, BurnOptimizer, CrossEntropy},
    model::ImageClassifier,
    schedule::StepLr,
    trainer::{Partitions, TrainedModel, Trainer},
    visualize::visualize_model,
};

type ImagePartition<B> = LoaderPartition<ImageBatch<B>>;

/// Train on `sets` and save the best model into `ckpt`.
pub fn run_training<R: TrainingObserver>(
    cfg:      &TrainConfig,
    sets:     ImageSets,
    ckpt:     &CheckpointManager,
    observer: &mut R,
) -> Result<TrainingSummary> {
    match cfg.backend {
        BackendKind::Wgpu => {
            let device = WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_on::<Autodiff<Wgpu>, R>(cfg, sets, ckpt, observer, &device)
        }
        BackendKind::NdArray => {
            let device = NdArrayDevice::default();
            tracing::info!("Using NdArray device: {:?}", device);
            train_on::<Autodiff<NdArray>, R>(cfg, sets, ckpt, observer, &device)
        }
    }
}

/// Load the best model from `ckpt` and render predictions over `val`.
pub fn run_visualization<K: RenderSink>(
    cfg:        &TrainConfig,
    val:        ImageFolder,
    best:       &BestRecord,
    ckpt:       &CheckpointManager,
    num_images: usize,
    sink:       &mut K,
) -> Result<usize> {
    match cfg.backend {
        BackendKind::Wgpu => {
            let device = WgpuDevice::default();
            visualize_on::<Autodiff<Wgpu>, K>(cfg, val, best, ckpt, num_images, sink, &device)
        }
        BackendKind::NdArray => {
            let device = NdArrayDevice::default();
            visualize_on::<Autodiff<NdArray>, K>(cfg, val, best, ckpt, num_images, sink, &device)
        }
    }
}

fn train_on<B: AutodiffBackend, R: TrainingObserver>(
    cfg:      &TrainConfig,
    sets:     ImageSets,
    ckpt:     &CheckpointManager,
    observer: &mut R,
    device:   &B::Device,
) -> Result<TrainingSummary> {
    let classes = sets.train.classes().to_vec();

    // ── Partitions ────────────────────────────────────────────────────────────
    // Training batches are reshuffled every pass; validation keeps file order
    let train = partition::<B>(cfg, sets.train, Some(cfg.seed), device);
    let val   = partition::<B>(cfg, sets.val, None, device);
    let partitions = Partitions::new(train, val);

    // ── Model ─────────────────────────────────────────────────────────────────
    let net = build_network::<B>(cfg, classes.len(), device)?;
    tracing::info!(
        "Model ready: {} stages, {} base channels, {} classes",
        cfg.num_stages, cfg.base_channels, classes.len()
    );

    // ── Optimiser + training loop ─────────────────────────────────────────────
    let trained = match cfg.optimizer {
        OptimizerKind::Sgd => {
            // v = μ·v + g ;  θ = θ − lr·v   (no dampening)
            let momentum = MomentumConfig::new().with_momentum(cfg.momentum).with_dampening(0.0);
            let optim    = SgdConfig::new()
                .with_momentum(Some(momentum))
                .init::<B, ImageClassifier<B>>();
            fit(cfg, optim, net, &partitions, device, observer)?
        }
        OptimizerKind::Adam => {
            let optim = AdamConfig::new().init::<B, ImageClassifier<B>>();
            fit(cfg, optim, net, &partitions, device, observer)?
        }
    };

    // ── Save the best model ───────────────────────────────────────────────────
    let best = BestRecord {
        epoch:    trained.best.epoch(),
        accuracy: trained.best.accuracy(),
        classes,
    };
    ckpt.save_best(trained.model.net(), &best)?;
    tracing::info!("Best model saved to '{}'", ckpt.dir().display());

    Ok(trained.summary)
}

fn fit<B, O, R>(
    cfg:        &TrainConfig,
    optimizer:  O,
    net:        ImageClassifier<B>,
    partitions: &Partitions<ImagePartition<B>>,
    device:     &B::Device,
    observer:   &mut R,
) -> Result<TrainedModel<BurnClassifier<B>>>
where
    B: AutodiffBackend,
    O: burn::optim::Optimizer<ImageClassifier<B>, B>,
    R: TrainingObserver,
{
    let mut trainer = Trainer::new(
        CrossEntropy::new(device),
        BurnOptimizer::new(optimizer),
        StepLr::new(cfg.lr, cfg.step_size, cfg.gamma),
        cfg.epochs,
    );
    Ok(trainer.fit(BurnClassifier::new(net), partitions, device, observer)?)
}

fn visualize_on<B: AutodiffBackend, K: RenderSink>(
    cfg:        &TrainConfig,
    val:        ImageFolder,
    best:       &BestRecord,
    ckpt:       &CheckpointManager,
    num_images: usize,
    sink:       &mut K,
    device:     &B::Device,
) -> Result<usize> {
    let net   = cfg.classifier_config(best.classes.len()).init::<B>(device);
    let net   = ckpt.load_best(net, device)?;
    let val   = partition::<B>(cfg, val, None, device);
    let mut model = BurnClassifier::new(net);

    visualize_model(&mut model, &val, device, &best.classes, num_images, sink)
}

fn partition<B: Backend>(
    cfg:     &TrainConfig,
    folder:  ImageFolder,
    shuffle: Option<u64>,
    device:  &B::Device,
) -> ImagePartition<B> {
    let preprocessor = folder.preprocessor();
    let batcher = ImageBatcher::<B>::new(
        device.clone(),
        preprocessor.output_shape(),
        preprocessor.normalization(),
    );
    let options = LoaderOptions {
        batch_size:  cfg.batch_size,
        shuffle,
        num_workers: cfg.num_workers,
    };
    image_partition(folder, batcher, &options)
}

/// Fresh classifier, optionally on a pretrained (and frozen) backbone.
fn build_network<B: AutodiffBackend>(
    cfg:         &TrainConfig,
    num_classes: usize,
    device:      &B::Device,
) -> Result<ImageClassifier<B>> {
    let model_cfg = cfg.classifier_config(num_classes);

    let net = match &cfg.pretrained {
        Some(path) => {
            let backbone = load_backbone(Path::new(path), model_cfg.backbone.init(device), device)?;
            model_cfg.init_with_backbone(backbone, device)
        }
        None => model_cfg.init(device),
    };

    if !cfg.freeze_backbone {
        return Ok(net);
    }
    if cfg.pretrained.is_none() {
        tracing::warn!("Freezing a randomly initialised backbone; only the head will learn");
    }
    tracing::info!("Backbone frozen; training the classification head only");
    Ok(net.freeze_backbone())
}
