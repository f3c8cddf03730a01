// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Discover class folders         (Layer 4 - data)
//   Step 2: Build the preprocessor         (Layer 4 - data)
//   Step 3: Open train/val image sets      (Layer 4 - data)
//   Step 4: Save config                    (Layer 6 - infra)
//   Step 5: Run training, save best model  (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{ensure, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    dataset::{discover_classes, ImageSets},
    preprocessor::{Normalization, Preprocessor},
};
use crate::domain::{metrics::TrainingSummary, traits::TrainingObserver};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    reporter::ConsoleReporter,
};
use crate::ml::{
    model::{BackboneConfig, ImageClassifierConfig, MAX_STAGES},
    runner::run_training,
};

/// Compute backend for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Wgpu,
    NdArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    /// SGD with momentum
    Sgd,
    Adam,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so `visualize` can rebuild the architecture and
// the validation split of the run that produced a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Root holding train/ and (optionally) val/
    pub data_dir:        String,
    pub checkpoint_dir:  String,
    pub epochs:          usize,
    pub batch_size:      usize,
    pub lr:              f64,
    pub momentum:        f64,
    /// Epochs between learning-rate decays; 0 keeps it constant
    pub step_size:       usize,
    pub gamma:           f64,
    pub optimizer:       OptimizerKind,
    /// Shorter side after resizing
    pub resize:          u32,
    /// Side of the center crop fed to the model
    pub crop:            u32,
    pub base_channels:   usize,
    pub num_stages:      usize,
    pub dropout:         f64,
    /// Backbone record to start from
    pub pretrained:      Option<String>,
    pub freeze_backbone: bool,
    pub num_workers:     usize,
    /// Seeds the train shuffle and the fallback validation split
    pub seed:            u64,
    /// Held-out fraction when the dataset has no val/ folder
    pub val_fraction:    f64,
    pub backend:         BackendKind,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:        "data/hymenoptera_data".to_string(),
            checkpoint_dir:  "checkpoints".to_string(),
            epochs:          25,
            batch_size:      4,
            lr:              0.001,
            momentum:        0.9,
            step_size:       7,
            gamma:           0.1,
            optimizer:       OptimizerKind::Sgd,
            resize:          256,
            crop:            224,
            base_channels:   32,
            num_stages:      3,
            dropout:         0.0,
            pretrained:      None,
            freeze_backbone: false,
            num_workers:     4,
            seed:            42,
            val_fraction:    0.2,
            backend:         BackendKind::Wgpu,
        }
    }
}

impl TrainConfig {
    /// Catch settings that would only fail deep inside a run.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "batch size must be at least 1");
        ensure!(self.lr > 0.0, "learning rate must be positive");
        ensure!((0.0..1.0).contains(&self.dropout), "dropout must be in [0, 1)");
        ensure!(
            self.val_fraction > 0.0 && self.val_fraction < 1.0,
            "validation fraction must be between 0 and 1"
        );
        ensure!(self.base_channels > 0, "base channels must be at least 1");
        ensure!(
            self.num_stages <= MAX_STAGES,
            "at most {MAX_STAGES} backbone stages are supported, got {}",
            self.num_stages
        );
        let min_crop = self.backbone_config().min_input_size();
        ensure!(
            self.crop as usize >= min_crop,
            "crop {} is too small for {} stages (needs at least {min_crop})",
            self.crop,
            self.num_stages
        );
        Ok(())
    }

    fn backbone_config(&self) -> BackboneConfig {
        BackboneConfig::new()
            .with_base_channels(self.base_channels)
            .with_num_stages(self.num_stages)
    }

    pub fn classifier_config(&self, num_classes: usize) -> ImageClassifierConfig {
        ImageClassifierConfig::new(num_classes, self.backbone_config()).with_dropout(self.dropout)
    }

    pub fn preprocessor(&self) -> Result<Preprocessor> {
        Preprocessor::new(self.resize, self.crop, Normalization::default())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train with console progress and a metrics CSV in the checkpoint folder.
    pub fn execute(&self) -> Result<TrainingSummary> {
        let ckpt    = CheckpointManager::new(&self.config.checkpoint_dir)?;
        let metrics = MetricsLogger::create(ckpt.dir())?;
        let mut observer = (ConsoleReporter::stdout(), metrics);
        self.execute_with(&ckpt, &mut observer)
    }

    /// Execute the full training pipeline end to end
    pub fn execute_with<R: TrainingObserver>(
        &self,
        ckpt:     &CheckpointManager,
        observer: &mut R,
    ) -> Result<TrainingSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Class names from the training folder ──────────────────────
        let data_dir = Path::new(&cfg.data_dir);
        let classes  = discover_classes(&data_dir.join("train"))?;
        tracing::info!("Found {} classes: {}", classes.len(), classes.join(", "));

        // ── Step 2: Deterministic resize / crop / normalise ───────────────────
        let preprocessor = cfg.preprocessor()?;

        // ── Step 3: Train / validation image sets ─────────────────────────────
        let sets = ImageSets::open(data_dir, &classes, preprocessor, cfg.val_fraction, cfg.seed)?;
        tracing::info!(
            "Dataset sizes: {} train, {} validation",
            sets.train.len(),
            sets.val.len()
        );

        // ── Step 4: Save config for visualization ─────────────────────────────
        ckpt.save_config(cfg)?;

        // ── Step 5: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, sets, ckpt, observer)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{metrics::PhaseMetrics, mode::Phase};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::{fs, io};

    #[derive(Default)]
    struct Collect(Vec<PhaseMetrics>);

    impl TrainingObserver for Collect {
        fn phase_finished(&mut self, metrics: &PhaseMetrics) -> io::Result<()> {
            self.0.push(metrics.clone());
            Ok(())
        }
    }

    /// train/{ants,bees} only; validation comes from the fallback split.
    fn tiny_dataset(root: &Path) {
        for (class, color) in [("ants", [20u8, 20, 20]), ("bees", [230, 200, 20])] {
            let folder = root.join("train").join(class);
            fs::create_dir_all(&folder).unwrap();
            for i in 0..5u8 {
                RgbImage::from_pixel(20, 16, Rgb([color[0], color[1].saturating_add(i), color[2]]))
                    .save_with_format(folder.join(format!("{i}.png")), ImageFormat::Png)
                    .unwrap();
            }
        }
    }

    fn tiny_config(root: &Path) -> TrainConfig {
        TrainConfig {
            data_dir:       root.join("data").to_string_lossy().into_owned(),
            checkpoint_dir: root.join("ckpt").to_string_lossy().into_owned(),
            epochs:         2,
            batch_size:     3,
            resize:         16,
            crop:           12,
            base_channels:  4,
            num_stages:     1,
            num_workers:    0,
            backend:        BackendKind::NdArray,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_defaults_follow_the_tutorial() {
        let cfg = TrainConfig::default();
        assert_eq!((cfg.epochs, cfg.batch_size, cfg.step_size), (25, 4, 7));
        assert_eq!((cfg.lr, cfg.momentum, cfg.gamma), (0.001, 0.9, 0.1));
        assert_eq!((cfg.resize, cfg.crop), (256, 224));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        assert!(TrainConfig { batch_size: 0, ..TrainConfig::default() }.validate().is_err());
        assert!(TrainConfig { val_fraction: 1.0, ..TrainConfig::default() }.validate().is_err());
        assert!(TrainConfig { dropout: 1.0, ..TrainConfig::default() }.validate().is_err());
    }

    #[test]
    fn test_architecture_must_fit_the_crop() {
        let base = TrainConfig::default();
        assert!(TrainConfig { base_channels: 0, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { num_stages: 64, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { num_stages: MAX_STAGES + 1, crop: 4096, ..base.clone() }.validate().is_err());
        // stem + 4 stage pools need 32 pixels
        assert!(TrainConfig { num_stages: 4, crop: 31, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { num_stages: 4, crop: 32, resize: 32, ..base }.validate().is_ok());
    }

    #[test]
    fn test_too_deep_for_crop_fails_before_saving_config() {
        let tmp = tempfile::tempdir().unwrap();
        tiny_dataset(&tmp.path().join("data"));
        let cfg  = TrainConfig { num_stages: 4, ..tiny_config(tmp.path()) };
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir).unwrap();

        assert!(TrainUseCase::new(cfg).execute_with(&ckpt, &mut Collect::default()).is_err());
        assert!(!ckpt.dir().join("train_config.json").exists());
    }

    #[test]
    fn test_enums_serialise_lowercase() {
        assert_eq!(serde_json::to_string(&BackendKind::NdArray).unwrap(), "\"ndarray\"");
        assert_eq!(serde_json::to_string(&OptimizerKind::Sgd).unwrap(), "\"sgd\"");
    }

    #[test]
    fn test_training_writes_a_complete_checkpoint() {
        let tmp = tempfile::tempdir().unwrap();
        tiny_dataset(&tmp.path().join("data"));
        let cfg  = tiny_config(tmp.path());
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir).unwrap();
        let mut observer = Collect::default();

        let summary = TrainUseCase::new(cfg.clone()).execute_with(&ckpt, &mut observer).unwrap();

        assert_eq!(summary.num_epochs, 2);
        assert_eq!(observer.0.len(), 4);
        assert!(observer.0.iter().filter(|m| m.phase == Phase::Validation).all(|m| m.samples == 2));

        assert_eq!(ckpt.load_config().unwrap(), cfg);
        let best = ckpt.load_best_record().unwrap();
        assert_eq!(best.classes, ["ants", "bees"]);
        assert_eq!(best.epoch, summary.best_epoch);
        assert!(ckpt.dir().join("model_best.mpk.gz").exists());
    }

    #[test]
    fn test_missing_train_folder_fails_before_training() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg  = tiny_config(tmp.path());
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir).unwrap();
        assert!(TrainUseCase::new(cfg).execute_with(&ckpt, &mut Collect::default()).is_err());
        assert!(!ckpt.dir().join("train_config.json").exists());
    }

    #[test]
    fn test_image_sets_match_config_split() {
        let tmp = tempfile::tempdir().unwrap();
        tiny_dataset(&tmp.path().join("data"));
        let cfg     = tiny_config(tmp.path());
        let classes = vec!["ants".to_string(), "bees".to_string()];
        let sets    = ImageSets::open(
            Path::new(&cfg.data_dir), &classes, cfg.preprocessor().unwrap(), cfg.val_fraction, cfg.seed,
        ).unwrap();
        assert_eq!((sets.train.len(), sets.val.len()), (8, 2));
    }
}
