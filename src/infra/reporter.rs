// ============================================================
// Layer 6 — Console Progress Reporter
// ============================================================
// Prints training progress in the familiar tutorial layout:
//
//   Epoch 0/24
//   ----------
//   train Loss: 0.6123 Acc: 0.6680
//   val Loss: 0.2418 Acc: 0.9085
//
//   ...
//   Training complete in 1m 7s
//   Best val Acc: 0.954248

use std::io::{self, Write};

use crate::domain::{
    metrics::{PhaseMetrics, TrainingSummary},
    mode::Phase,
    traits::TrainingObserver,
};

pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> TrainingObserver for ConsoleReporter<W> {
    fn epoch_started(&mut self, epoch: usize, num_epochs: usize) -> io::Result<()> {
        writeln!(self.out, "Epoch {}/{}", epoch, num_epochs.saturating_sub(1))?;
        writeln!(self.out, "{}", "-".repeat(10))
    }

    fn phase_finished(&mut self, m: &PhaseMetrics) -> io::Result<()> {
        writeln!(self.out, "{} Loss: {:.4} Acc: {:.4}", m.phase, m.loss, m.accuracy)?;
        if m.phase == Phase::Validation {
            writeln!(self.out)?;
        }
        self.out.flush()
    }

    fn training_finished(&mut self, summary: &TrainingSummary) -> io::Result<()> {
        let (minutes, seconds) = summary.elapsed_min_sec();
        writeln!(self.out, "Training complete in {minutes}m {seconds}s")?;
        writeln!(self.out, "Best val Acc: {:.6}", summary.best_accuracy)?;
        self.out.flush()
    }
}
