// ============================================================
// Layer 5 — Burn Adapters for the Training Loop
// ============================================================
// Connects the Burn image classifier to the domain traits:
//
//   BurnClassifier  → Model       (mode, forward, parameters)
//   Logits          → Scores      (argmax over classes)
//   CrossEntropy    → Criterion   (mean cross-entropy)
//   BatchLoss       → Loss        (scalar value, backward)
//   BurnOptimizer   → Optimizer   (any burn::optim optimiser)
//
// Key Burn insight:
//   - Training forward runs on the autodiff backend so the
//     graph is recorded for backward()
//   - Evaluation forward runs model.valid() on the inner
//     backend: no graph, dropout off, batch-norm uses its
//     running statistics
//   - A parameter snapshot shares the module's tensors (they
//     are immutable; optimiser steps build new ones) but gets
//     its own batch-norm running statistics
//
// Reference: Burn Book §5 (Custom Training Loop)

use burn::{
    module::AutodiffModule,
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::ImageBatch;
use crate::domain::{
    mode::Mode,
    traits::{Criterion, Loss, Model, Optimizer, Scores},
};
use crate::ml::model::ImageClassifier;

// ─── BurnClassifier ───────────────────────────────────────────────────────────
pub struct BurnClassifier<B: AutodiffBackend> {
    net:  ImageClassifier<B>,
    mode: Mode,
}

impl<B: AutodiffBackend> BurnClassifier<B> {
    pub fn new(net: ImageClassifier<B>) -> Self {
        Self { net, mode: Mode::Training }
    }

    pub fn net(&self) -> &ImageClassifier<B> {
        &self.net
    }
}

impl<B: AutodiffBackend> Model for BurnClassifier<B> {
    type Device    = B::Device;
    type Batch     = ImageBatch<B>;
    type Scores    = Logits<B>;
    type Params    = ImageClassifier<B>;
    type Gradients = B::Gradients;

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn to_device(&self, batch: ImageBatch<B>, device: &B::Device) -> ImageBatch<B> {
        batch.to_device(device)
    }

    fn forward(&self, batch: &ImageBatch<B>) -> Logits<B> {
        let logits = match self.mode {
            Mode::Training   => self.net.forward(batch.images.clone()),
            Mode::Evaluation => {
                // model.valid() → ImageClassifier<B::InnerBackend>
                let net = self.net.valid();
                Tensor::from_inner(net.forward(batch.images.clone().inner()))
            }
        };
        Logits { logits }
    }

    fn parameters(&self) -> ImageClassifier<B> {
        detached(&self.net)
    }

    fn load_parameters(&mut self, params: &ImageClassifier<B>) {
        self.net = detached(params);
    }
}

/// A copy sharing every parameter tensor but owning its batch-norm
/// running statistics. Plain clones share those behind an `Arc`, so
/// later training forwards would leak into the copy.
fn detached<B: AutodiffBackend>(net: &ImageClassifier<B>) -> ImageClassifier<B> {
    net.clone().load_record(net.clone().into_record())
}

// ─── Logits ───────────────────────────────────────────────────────────────────
/// Raw class scores — shape: [batch_size, num_classes]
#[derive(Debug, Clone)]
pub struct Logits<B: Backend> {
    pub logits: Tensor<B, 2>,
}

impl<B: Backend> Scores for Logits<B> {
    fn predictions(&self) -> Vec<usize> {
        // argmax(1) returns [batch, 1]
        self.logits
            .clone()
            .argmax(1)
            .flatten::<1>(0, 1)
            .into_data()
            .iter::<i64>()
            .map(|p| p as usize)
            .collect()
    }
}

// ─── CrossEntropy ─────────────────────────────────────────────────────────────
/// loss = −mean(log softmax(logits)[target])
pub struct CrossEntropy<B: Backend> {
    loss: CrossEntropyLoss<B>,
}

impl<B: Backend> CrossEntropy<B> {
    pub fn new(device: &B::Device) -> Self {
        Self { loss: CrossEntropyLossConfig::new().init(device) }
    }
}

impl<B: AutodiffBackend> Criterion<BurnClassifier<B>> for CrossEntropy<B> {
    type Loss = BatchLoss<B>;

    fn loss(&self, scores: &Logits<B>, batch: &ImageBatch<B>) -> BatchLoss<B> {
        BatchLoss {
            loss: self.loss.forward(scores.logits.clone(), batch.targets.clone()),
        }
    }
}

/// Mean loss of one batch — shape: [1]
pub struct BatchLoss<B: AutodiffBackend> {
    loss: Tensor<B, 1>,
}

impl<B: AutodiffBackend> Loss for BatchLoss<B> {
    type Gradients = B::Gradients;

    fn value(&self) -> f64 {
        self.loss.clone().into_scalar().elem::<f64>()
    }

    fn backward(self) -> B::Gradients {
        self.loss.backward()
    }
}

// ─── BurnOptimizer ────────────────────────────────────────────────────────────
/// Adapts a `burn::optim` optimiser (SGD, Adam, ...) to the training loop.
pub struct BurnOptimizer<O> {
    inner: O,
}

impl<O> BurnOptimizer<O> {
    pub fn new(inner: O) -> Self {
        Self { inner }
    }
}

impl<B, O> Optimizer<BurnClassifier<B>> for BurnOptimizer<O>
where
    B: AutodiffBackend,
    O: burn::optim::Optimizer<ImageClassifier<B>, B>,
{
    /// Burn hands out fresh gradients from every backward pass,
    /// so there is nothing left over to clear.
    fn zero_grad(&mut self) {}

    fn step(&mut self, model: &mut BurnClassifier<B>, gradients: B::Gradients, lr: f64) {
        // Keep only the gradients of parameters that belong to the model
        let grads = GradientsParams::from_grads(gradients, &model.net);
        model.net = self.inner.step(lr, model.net.clone(), grads);
    }
}
