// ============================================================
// Layer 3 — Epoch Metrics
// ============================================================
// What one phase of one epoch measured, plus the running
// totals used to compute it and the summary of a whole run.
//
// Loss is accumulated weighted by batch size so that a short
// final batch counts for exactly its own samples:
//
//   epoch_loss = Σ (batch_mean_loss × batch_size) / partition_size
//   epoch_acc  = Σ correct                       / partition_size

use std::time::Duration;

use crate::domain::mode::Phase;

/// Aggregate loss and accuracy for one pass over a partition.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseMetrics {
    /// Zero-based epoch index
    pub epoch: usize,

    pub phase: Phase,

    /// Mean per-sample loss over the partition
    pub loss: f64,

    /// Fraction of samples predicted correctly, in [0.0, 1.0]
    pub accuracy: f64,

    /// Number of samples the pass covered
    pub samples: usize,

    /// Learning rate of the epoch, as applied by its train phase
    pub learning_rate: f64,
}

// ─── PhaseAccumulator ─────────────────────────────────────────────────────────
/// Running totals for a phase in progress.
#[derive(Debug, Default, Clone)]
pub struct PhaseAccumulator {
    weighted_loss: f64,
    correct:       usize,
    seen:          usize,
}

impl PhaseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one batch: its size, its mean loss, and the predicted /
    /// true classes. Labels beyond the shorter of the two slices are ignored.
    pub fn add_batch(
        &mut self,
        batch_size:  usize,
        mean_loss:   f64,
        predictions: &[usize],
        labels:      &[usize],
    ) {
        self.weighted_loss += mean_loss * batch_size as f64;
        self.correct += predictions
            .iter()
            .zip(labels)
            .filter(|(p, l)| p == l)
            .count();
        self.seen += batch_size;
    }

    /// Number of samples recorded so far
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Finish the phase, dividing by the partition size.
    /// `partition_size` must be non-zero; the trainer rejects empty
    /// partitions before any pass starts.
    pub fn finish(
        &self,
        epoch:          usize,
        phase:          Phase,
        partition_size: usize,
        learning_rate:  f64,
    ) -> PhaseMetrics {
        let n = partition_size as f64;
        PhaseMetrics {
            epoch,
            phase,
            loss:     self.weighted_loss / n,
            accuracy: self.correct as f64 / n,
            samples:  partition_size,
            learning_rate,
        }
    }
}

// ─── TrainingSummary ──────────────────────────────────────────────────────────
/// What a completed run reports at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub num_epochs:    usize,

    /// Highest validation accuracy seen (0.0 if never improved)
    pub best_accuracy: f64,

    /// Epoch whose parameters were restored, `None` for the initial ones
    pub best_epoch:    Option<usize>,

    pub elapsed:       Duration,
}

impl TrainingSummary {
    /// Elapsed wall-clock time as whole (minutes, seconds)
    pub fn elapsed_min_sec(&self) -> (u64, u64) {
        let secs = self.elapsed.as_secs();
        (secs / 60, secs % 60)
    }
}
