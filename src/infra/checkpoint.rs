// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the best model using Burn's CompactRecorder.
//
// What gets saved after training:
//   1. model_best.mpk.gz     — all learned parameters of the
//                              best validation epoch
//   2. backbone_best.mpk.gz  — the backbone alone, reusable as
//                              --pretrained for another run
//   3. best.json             — epoch, accuracy and class names
//   4. train_config.json     — hyperparameters and architecture
//
// The config is written before training starts so `visualize`
// can rebuild the exact architecture (and the same validation
// split) before loading the weights into it.
//
// File naming convention:
//   checkpoints/
//     model_best.mpk.gz
//     backbone_best.mpk.gz
//     best.json
//     train_config.json
//     metrics.csv            ← written by infra::metrics
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{Backbone, ImageClassifier};

const MODEL_FILE:    &str = "model_best";
const BACKBONE_FILE: &str = "backbone_best";
const BEST_FILE:     &str = "best.json";
const CONFIG_FILE:   &str = "train_config.json";

/// Extension CompactRecorder appends to every record file
const RECORD_EXTENSION: &str = ".mpk.gz";

/// Outcome of a training run, stored next to the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestRecord {
    /// Zero-based epoch of the best validation accuracy;
    /// `None` when the initial parameters were kept
    pub epoch:    Option<usize>,
    pub accuracy: f64,
    /// Class names in label order
    pub classes:  Vec<String>,
}

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint folder '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save the best model, its backbone, and best.json.
    pub fn save_best<B: Backend>(&self, model: &ImageClassifier<B>, best: &BestRecord) -> Result<()> {
        let recorder = CompactRecorder::new();

        let path = self.dir.join(MODEL_FILE);
        recorder
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        let path = self.dir.join(BACKBONE_FILE);
        recorder
            .record(model.backbone.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save backbone to '{}'", path.display()))?;

        self.write_json(BEST_FILE, best)?;

        tracing::debug!("Saved best checkpoint (epoch {:?}) to '{}'", best.epoch, self.dir.display());
        Ok(())
    }

    /// Load the best weights into `model`, which must have the saved architecture.
    pub fn load_best<B: Backend>(
        &self,
        model:  ImageClassifier<B>,
        device: &B::Device,
    ) -> Result<ImageClassifier<B>> {
        let path = self.dir.join(MODEL_FILE);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load model '{}'. Have you trained the model first?", path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn load_best_record(&self) -> Result<BestRecord> {
        self.read_json(BEST_FILE)
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)?;
        tracing::debug!("Saved training config to '{}'", self.dir.join(CONFIG_FILE).display());
        Ok(())
    }

    /// Load the configuration of the run that produced this checkpoint.
    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(CONFIG_FILE)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).with_context(|| format!("Cannot write '{}'", path.display()))
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read '{}'. Make sure you have run 'train' first.", path.display())
        })?;
        serde_json::from_str(&json).with_context(|| format!("Malformed '{}'", path.display()))
    }
}

/// Load backbone weights saved by an earlier run into `backbone`.
/// `path` may be given with or without the record extension.
pub fn load_backbone<B: Backend>(
    path:     &Path,
    backbone: Backbone<B>,
    device:   &B::Device,
) -> Result<Backbone<B>> {
    let path = record_stem(path);
    let record = CompactRecorder::new()
        .load(path.clone(), device)
        .with_context(|| format!("Cannot load pretrained backbone '{}'", path.display()))?;

    tracing::info!("Loaded pretrained backbone from '{}'", path.display());
    Ok(backbone.load_record(record))
}

/// Strip a trailing `.mpk.gz`; the recorder adds it back.
fn record_stem(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    match text.strip_suffix(RECORD_EXTENSION) {
        Some(stem) => PathBuf::from(stem),
        None       => path.to_path_buf(),
    }
}
