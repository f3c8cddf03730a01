// ============================================================
// Layer 2 — VisualizeUseCase
// ============================================================
// Shows what a trained checkpoint predicts on validation images:
//
//   Step 1: Load train_config.json and best.json   (Layer 6 - infra)
//   Step 2: Rebuild the validation set             (Layer 4 - data)
//           (same classes, same seed → same split)
//   Step 3: Load the best model and render         (Layer 5 - ml)
//           predictions to the log, and to PNG files
//           when an output folder is given

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::application::train_use_case::BackendKind;
use crate::data::dataset::ImageSets;
use crate::infra::{
    checkpoint::CheckpointManager,
    render::{ImageDirSink, LogSink},
};
use crate::ml::runner::run_visualization;

#[derive(Debug, Clone)]
pub struct VisualizeRequest {
    pub checkpoint_dir: String,
    /// Overrides the dataset root recorded at training time
    pub data_dir:       Option<String>,
    pub num_images:     usize,
    /// Folder for PNG output; log only when `None`
    pub out_dir:        Option<PathBuf>,
    /// Overrides the backend recorded at training time
    pub backend:        Option<BackendKind>,
}

pub struct VisualizeUseCase {
    request: VisualizeRequest,
}

impl VisualizeUseCase {
    pub fn new(request: VisualizeRequest) -> Self {
        Self { request }
    }

    /// Returns the number of predictions rendered.
    pub fn execute(&self) -> Result<usize> {
        let req = &self.request;

        // ── Step 1: What was trained, and on which classes ────────────────────
        let ckpt    = CheckpointManager::new(&req.checkpoint_dir)?;
        let mut cfg = ckpt.load_config()?;
        if let Some(dir) = &req.data_dir {
            cfg.data_dir = dir.clone();
        }
        if let Some(backend) = req.backend {
            cfg.backend = backend;
        }
        let best = ckpt.load_best_record()?;
        tracing::info!(
            "Checkpoint: best val Acc {:.4} at epoch {:?}, classes: {}",
            best.accuracy,
            best.epoch,
            best.classes.join(", "),
        );

        // ── Step 2: Validation set ────────────────────────────────────────────
        let sets = ImageSets::open(
            Path::new(&cfg.data_dir),
            &best.classes,
            cfg.preprocessor()?,
            cfg.val_fraction,
            cfg.seed,
        )?;

        // ── Step 3: Render ────────────────────────────────────────────────────
        let shown = match &req.out_dir {
            Some(dir) => {
                let mut sink = (LogSink, ImageDirSink::new(dir)?);
                let shown = run_visualization(&cfg, sets.val, &best, &ckpt, req.num_images, &mut sink)?;
                tracing::info!("Wrote {} images to '{}'", sink.1.written().len(), dir.display());
                shown
            }
            None => run_visualization(&cfg, sets.val, &best, &ckpt, req.num_images, &mut LogSink)?,
        };

        if shown < req.num_images {
            tracing::warn!(
                "Validation set ran out after {} of {} images",
                shown, req.num_images
            );
        }
        Ok(shown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::domain::{metrics::PhaseMetrics, traits::TrainingObserver};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::{fs, io};

    struct Quiet;

    impl TrainingObserver for Quiet {
        fn phase_finished(&mut self, _metrics: &PhaseMetrics) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_renders_the_rebuilt_validation_split() {
        let tmp = tempfile::tempdir().unwrap();
        for class in ["ants", "bees"] {
            let folder = tmp.path().join("data/train").join(class);
            fs::create_dir_all(&folder).unwrap();
            for i in 0..5u8 {
                RgbImage::from_pixel(16, 16, Rgb([i * 50, 10, 10]))
                    .save_with_format(folder.join(format!("{class}_{i}.png")), ImageFormat::Png)
                    .unwrap();
            }
        }
        let cfg = TrainConfig {
            data_dir:       tmp.path().join("data").to_string_lossy().into_owned(),
            checkpoint_dir: tmp.path().join("ckpt").to_string_lossy().into_owned(),
            epochs:         1,
            batch_size:     4,
            resize:         16,
            crop:           16,
            base_channels:  4,
            num_stages:     1,
            num_workers:    0,
            backend:        BackendKind::NdArray,
            ..TrainConfig::default()
        };
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir).unwrap();
        TrainUseCase::new(cfg.clone()).execute_with(&ckpt, &mut Quiet).unwrap();

        let out_dir = tmp.path().join("preds");
        let shown = VisualizeUseCase::new(VisualizeRequest {
            checkpoint_dir: cfg.checkpoint_dir.clone(),
            data_dir:       None,
            num_images:     6,
            out_dir:        Some(out_dir.clone()),
            backend:        None,
        })
        .execute()
        .unwrap();

        // 10 images with a 0.2 hold-out leave 2 for validation
        assert_eq!(shown, 2);
        assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 2);
    }

    #[test]
    fn test_missing_checkpoint_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let use_case = VisualizeUseCase::new(VisualizeRequest {
            checkpoint_dir: tmp.path().to_string_lossy().into_owned(),
            data_dir:       None,
            num_images:     6,
            out_dir:        None,
            backend:        Some(BackendKind::NdArray),
        });
        assert!(use_case.execute().is_err());
    }
}
