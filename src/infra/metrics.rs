// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each phase.
//
// Metrics recorded per row:
//   - epoch:    zero-based epoch index
//   - phase:    train or val
//   - loss:     mean per-sample cross-entropy over the partition
//   - accuracy: fraction of samples predicted correctly
//   - lr:       learning rate of the epoch (same on both rows)
//
// Output file: checkpoints/metrics.csv, started afresh by
// every training run.
//
// Example CSV output:
//   epoch,phase,loss,accuracy,lr
//   0,train,0.612300,0.668033,0.001000
//   0,val,0.241800,0.908497,0.001000
//   ...
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::domain::{metrics::PhaseMetrics, traits::TrainingObserver};

const HEADER: &str = "epoch,phase,loss,accuracy,lr";

/// Logs phase metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create `dir/metrics.csv` containing only the header row,
    /// replacing the log of any previous run.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics folder '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "{HEADER}")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one row.
    pub fn log(&self, m: &PhaseMetrics) -> io::Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6}",
            m.epoch,
            m.phase,
            m.loss,
            m.accuracy,
            m.learning_rate,
        )
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl TrainingObserver for MetricsLogger {
    fn phase_finished(&mut self, metrics: &PhaseMetrics) -> io::Result<()> {
        self.log(metrics)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mode::Phase;

    fn metrics(epoch: usize, phase: Phase, accuracy: f64) -> PhaseMetrics {
        PhaseMetrics { epoch, phase, loss: 0.5, accuracy, samples: 4, learning_rate: 0.001 }
    }

    #[test]
    fn test_rows_follow_header() {
        let dir        = tempfile::tempdir().unwrap();
        let mut logger = MetricsLogger::create(dir.path()).unwrap();

        logger.phase_finished(&metrics(0, Phase::Train, 0.25)).unwrap();
        logger.phase_finished(&metrics(0, Phase::Validation, 0.75)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec![
            HEADER,
            "0,train,0.500000,0.250000,0.001000",
            "0,val,0.500000,0.750000,0.001000",
        ]);
    }

    #[test]
    fn test_new_run_starts_a_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        MetricsLogger::create(dir.path()).unwrap()
            .log(&metrics(0, Phase::Train, 0.5)).unwrap();

        let logger = MetricsLogger::create(dir.path()).unwrap();
        let csv    = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
