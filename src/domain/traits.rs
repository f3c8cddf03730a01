// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams of a training run. The training loop and the
// visualization routine are written only against these traits,
// so they run the same way over the Burn classifier in the ml
// layer and over the small mocks in the unit tests.
//
//   Partition ──batches──▶ Model ──scores──▶ Criterion ──▶ Loss
//                            ▲                               │
//                            └──────── Optimizer ◀─backward──┘
//
// Reference: Rust Book §10 (Traits), §19 (Associated Types)

use std::io;

use crate::domain::metrics::{PhaseMetrics, TrainingSummary};
use crate::domain::mode::Mode;

// ─── Batch ────────────────────────────────────────────────────────────────────
/// A group of labelled samples processed together.
pub trait Batch {
    /// Number of samples in this batch
    fn size(&self) -> usize;

    /// True class index of every sample, in batch order
    fn labels(&self) -> Vec<usize>;
}

/// A batch whose samples can be turned back into displayable pictures.
pub trait RenderableBatch: Batch {
    fn render(&self, index: usize) -> RenderImage;
}

// ─── Scores ───────────────────────────────────────────────────────────────────
/// Per-class scores for every sample of a batch.
pub trait Scores {
    /// Argmax over the class dimension, one entry per sample
    fn predictions(&self) -> Vec<usize>;
}

// ─── Model ────────────────────────────────────────────────────────────────────
/// An opaque trainable classifier.
///
/// The device is an explicit parameter: batches are moved onto it
/// by the model rather than through a process-wide default.
pub trait Model {
    type Device;
    type Batch: Batch;
    type Scores: Scores;
    /// Parameter state captured by snapshots
    type Params;
    /// Gradients produced by one backward pass
    type Gradients;

    fn set_mode(&mut self, mode: Mode);
    fn mode(&self) -> Mode;

    /// Place a batch on the compute device
    fn to_device(&self, batch: Self::Batch, device: &Self::Device) -> Self::Batch;

    /// Compute class scores. In evaluation mode no gradient history is kept.
    fn forward(&self, batch: &Self::Batch) -> Self::Scores;

    /// Current parameter state
    fn parameters(&self) -> Self::Params;

    /// Overwrite the parameter state
    fn load_parameters(&mut self, params: &Self::Params);
}

// ─── Loss / Criterion ─────────────────────────────────────────────────────────
/// A computed batch loss that can be propagated backwards.
pub trait Loss {
    type Gradients;

    /// Mean loss over the batch's samples
    fn value(&self) -> f64;

    fn backward(self) -> Self::Gradients;
}

/// Turns scores and true labels into a loss.
pub trait Criterion<M: Model> {
    type Loss: Loss<Gradients = M::Gradients>;

    fn loss(&self, scores: &M::Scores, batch: &M::Batch) -> Self::Loss;
}

// ─── Optimizer ────────────────────────────────────────────────────────────────
/// A stateful update rule over a model's parameters.
pub trait Optimizer<M: Model> {
    /// Clear gradients left over from a previous step
    fn zero_grad(&mut self);

    /// Apply one update using `gradients` at learning rate `lr`
    fn step(&mut self, model: &mut M, gradients: M::Gradients, lr: f64);
}

// ─── LrSchedule ───────────────────────────────────────────────────────────────
/// Learning-rate schedule, advanced once per epoch.
pub trait LrSchedule {
    /// Learning rate for the current epoch
    fn lr(&self) -> f64;

    fn step(&mut self);
}

// ─── Partition ────────────────────────────────────────────────────────────────
/// A finite, restartable source of batches.
pub trait Partition {
    type Batch;

    /// Total number of samples across all batches
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A fresh pass over the data. Batch size and shuffling belong
    /// to the implementation.
    fn batches(&self) -> Box<dyn Iterator<Item = Self::Batch> + '_>;
}

// ─── TrainingObserver ─────────────────────────────────────────────────────────
/// Receives progress reports from the training loop.
pub trait TrainingObserver {
    fn epoch_started(&mut self, _epoch: usize, _num_epochs: usize) -> io::Result<()> {
        Ok(())
    }

    fn phase_finished(&mut self, metrics: &PhaseMetrics) -> io::Result<()>;

    fn training_finished(&mut self, _summary: &TrainingSummary) -> io::Result<()> {
        Ok(())
    }
}

impl<T: TrainingObserver + ?Sized> TrainingObserver for &mut T {
    fn epoch_started(&mut self, epoch: usize, num_epochs: usize) -> io::Result<()> {
        (**self).epoch_started(epoch, num_epochs)
    }

    fn phase_finished(&mut self, metrics: &PhaseMetrics) -> io::Result<()> {
        (**self).phase_finished(metrics)
    }

    fn training_finished(&mut self, summary: &TrainingSummary) -> io::Result<()> {
        (**self).training_finished(summary)
    }
}

/// Fan out to two observers, first then second.
impl<A: TrainingObserver, B: TrainingObserver> TrainingObserver for (A, B) {
    fn epoch_started(&mut self, epoch: usize, num_epochs: usize) -> io::Result<()> {
        self.0.epoch_started(epoch, num_epochs)?;
        self.1.epoch_started(epoch, num_epochs)
    }

    fn phase_finished(&mut self, metrics: &PhaseMetrics) -> io::Result<()> {
        self.0.phase_finished(metrics)?;
        self.1.phase_finished(metrics)
    }

    fn training_finished(&mut self, summary: &TrainingSummary) -> io::Result<()> {
        self.0.training_finished(summary)?;
        self.1.training_finished(summary)
    }
}

// ─── RenderSink ───────────────────────────────────────────────────────────────
/// An 8-bit RGB picture, row-major, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderImage {
    pub width:  u32,
    pub height: u32,
    pub rgb:    Vec<u8>,
}

/// One prediction handed to a render sink.
#[derive(Debug, Clone)]
pub struct RenderedPrediction<'a> {
    /// 1-based position among the rendered images
    pub position:  usize,
    pub predicted: usize,
    pub label:     &'a str,
    pub image:     RenderImage,
}

/// Where visualized predictions are displayed.
pub trait RenderSink {
    fn render(&mut self, item: &RenderedPrediction<'_>) -> anyhow::Result<()>;
}

impl<T: RenderSink + ?Sized> RenderSink for &mut T {
    fn render(&mut self, item: &RenderedPrediction<'_>) -> anyhow::Result<()> {
        (**self).render(item)
    }
}

impl<A: RenderSink, B: RenderSink> RenderSink for (A, B) {
    fn render(&mut self, item: &RenderedPrediction<'_>) -> anyhow::Result<()> {
        self.0.render(item)?;
        self.1.render(item)
    }
}
