// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Repeated train + validation passes over two partitions,
// keeping the parameters of the best validation epoch.
//
// Per epoch:
//   train phase  → training mode, forward, loss, backward, step
//                  then exactly one schedule step
//   val phase    → evaluation mode, forward, loss only
//                  strict accuracy improvement → new snapshot
//
// After the last epoch the best snapshot is loaded back into
// the model. Ties keep the earliest epoch.
//
// The loop only knows the domain traits; Burn lives behind them
// in ml::classifier.
//
// Reference: Burn Book §5 (Custom Training Loop)

use std::{io, time::Instant};

use thiserror::Error;

use crate::domain::{
    metrics::{PhaseAccumulator, PhaseMetrics, TrainingSummary},
    mode::Phase,
    snapshot::ParameterSnapshot,
    traits::{Batch, Criterion, Loss, LrSchedule, Model, Optimizer, Partition, Scores, TrainingObserver},
};

// ─── Errors ───────────────────────────────────────────────────────────────────
#[derive(Debug, Error)]
pub enum TrainError {
    /// An epoch's metrics would divide by zero
    #[error("the {phase} partition is empty")]
    EmptyPartition { phase: Phase },

    /// The partition yielded a different number of samples than it reported
    #[error("the {phase} partition reported {expected} samples but yielded {seen}")]
    SizeMismatch { phase: Phase, expected: usize, seen: usize },

    #[error("failed to report training progress")]
    Report(#[from] io::Error),
}

// ─── Partitions ───────────────────────────────────────────────────────────────
/// The train and validation partitions of a run.
pub struct Partitions<P> {
    pub train: P,
    pub val:   P,
}

impl<P> Partitions<P> {
    pub fn new(train: P, val: P) -> Self {
        Self { train, val }
    }

    pub fn get(&self, phase: Phase) -> &P {
        match phase {
            Phase::Train      => &self.train,
            Phase::Validation => &self.val,
        }
    }
}

// ─── TrainedModel ─────────────────────────────────────────────────────────────
/// A model with its best parameters restored, and how it got there.
pub struct TrainedModel<M: Model> {
    pub model:   M,
    pub best:    ParameterSnapshot<M::Params>,
    pub summary: TrainingSummary,
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
pub struct Trainer<C, O, S> {
    criterion:  C,
    optimizer:  O,
    schedule:   S,
    num_epochs: usize,
}

impl<C, O, S> Trainer<C, O, S> {
    pub fn new(criterion: C, optimizer: O, schedule: S, num_epochs: usize) -> Self {
        Self { criterion, optimizer, schedule, num_epochs }
    }

    /// Train `model` for the configured number of epochs and return it
    /// with the parameters of its best validation epoch.
    pub fn fit<M, P, R>(
        &mut self,
        mut model:  M,
        partitions: &Partitions<P>,
        device:     &M::Device,
        observer:   &mut R,
    ) -> Result<TrainedModel<M>, TrainError>
    where
        M: Model,
        C: Criterion<M>,
        O: Optimizer<M>,
        S: LrSchedule,
        P: Partition<Batch = M::Batch>,
        R: TrainingObserver,
    {
        for phase in Phase::ORDER {
            if partitions.get(phase).is_empty() {
                return Err(TrainError::EmptyPartition { phase });
            }
        }

        let since   = Instant::now();
        let mut best = ParameterSnapshot::initial(model.parameters());

        for epoch in 0..self.num_epochs {
            observer.epoch_started(epoch, self.num_epochs)?;
            // both rows of an epoch report the rate its train phase used
            let lr = self.schedule.lr();

            for phase in Phase::ORDER {
                let metrics = self.run_phase(&mut model, partitions.get(phase), phase, epoch, lr, device)?;
                observer.phase_finished(&metrics)?;

                if phase == Phase::Validation && metrics.accuracy > best.accuracy() {
                    tracing::debug!(
                        "New best validation accuracy {:.4} at epoch {}",
                        metrics.accuracy, epoch
                    );
                    best = ParameterSnapshot::capture(epoch, metrics.accuracy, model.parameters());
                }
            }
        }

        model.load_parameters(best.params());
        if best.is_initial() && self.num_epochs > 0 {
            tracing::warn!(
                "Validation accuracy never rose above 0.0; returning the initial parameters"
            );
        }

        let summary = TrainingSummary {
            num_epochs:    self.num_epochs,
            best_accuracy: best.accuracy(),
            best_epoch:    best.epoch(),
            elapsed:       since.elapsed(),
        };
        observer.training_finished(&summary)?;

        Ok(TrainedModel { model, best, summary })
    }

    /// One pass over a partition.
    fn run_phase<M, P>(
        &mut self,
        model:     &mut M,
        partition: &P,
        phase:     Phase,
        epoch:     usize,
        lr:        f64,
        device:    &M::Device,
    ) -> Result<PhaseMetrics, TrainError>
    where
        M: Model,
        C: Criterion<M>,
        O: Optimizer<M>,
        S: LrSchedule,
        P: Partition<Batch = M::Batch>,
    {
        model.set_mode(phase.mode());
        let mut totals = PhaseAccumulator::new();

        for batch in partition.batches() {
            let batch = model.to_device(batch, device);
            self.optimizer.zero_grad();

            let scores      = model.forward(&batch);
            let predictions = scores.predictions();
            let loss        = self.criterion.loss(&scores, &batch);
            let loss_value  = loss.value();

            if phase == Phase::Train {
                let gradients = loss.backward();
                self.optimizer.step(model, gradients, lr);
            }

            totals.add_batch(batch.size(), loss_value, &predictions, &batch.labels());
        }

        if phase == Phase::Train {
            self.schedule.step();
        }

        let expected = partition.len();
        if totals.seen() != expected {
            return Err(TrainError::SizeMismatch { phase, expected, seen: totals.seen() });
        }

        Ok(totals.finish(epoch, phase, expected, lr))
    }
}
