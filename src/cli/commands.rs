// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `visualize`
// and all their configurable flags.
//
// clap value enums stay in this layer; they convert into the
// serde enums of the application layer.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{
    train_use_case::{BackendKind, OptimizerKind, TrainConfig},
    visualize_use_case::VisualizeRequest,
};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the classifier on an image folder dataset
    Train(TrainArgs),

    /// Show predictions of the best checkpoint on validation images
    Visualize(VisualizeArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum BackendArg {
    /// GPU through WebGPU
    Wgpu,
    /// CPU
    Ndarray,
}

impl From<BackendArg> for BackendKind {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Wgpu    => BackendKind::Wgpu,
            BackendArg::Ndarray => BackendKind::NdArray,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OptimizerArg {
    /// Stochastic gradient descent with momentum
    Sgd,
    Adam,
}

impl From<OptimizerArg> for OptimizerKind {
    fn from(o: OptimizerArg) -> Self {
        match o {
            OptimizerArg::Sgd  => OptimizerKind::Sgd,
            OptimizerArg::Adam => OptimizerKind::Adam,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Dataset root containing train/<class>/ and optionally val/<class>/
    #[arg(long, default_value = "data/hymenoptera_data")]
    pub data_dir: String,

    /// Directory for the best model, config and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 25)]
    pub epochs: usize,

    #[arg(long, default_value_t = 4)]
    pub batch_size: usize,

    /// Initial learning rate
    #[arg(long, default_value_t = 0.001)]
    pub lr: f64,

    /// SGD momentum
    #[arg(long, default_value_t = 0.9)]
    pub momentum: f64,

    /// Decay the learning rate every this many epochs (0 = never)
    #[arg(long, default_value_t = 7)]
    pub step_size: usize,

    /// Multiplicative learning-rate decay
    #[arg(long, default_value_t = 0.1)]
    pub gamma: f64,

    #[arg(long, value_enum, default_value_t = OptimizerArg::Sgd)]
    pub optimizer: OptimizerArg,

    /// Shorter image side after resizing
    #[arg(long, default_value_t = 256)]
    pub resize: u32,

    /// Side of the square center crop fed to the model
    #[arg(long, default_value_t = 224)]
    pub crop: u32,

    /// Channels after the stem convolution; doubled by every stage
    #[arg(long, default_value_t = 32)]
    pub base_channels: usize,

    /// Number of residual stages
    #[arg(long, default_value_t = 3)]
    pub stages: usize,

    /// Dropout before the classification head
    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    /// Backbone record from an earlier run (e.g. checkpoints/backbone_best.mpk.gz)
    #[arg(long)]
    pub pretrained: Option<String>,

    /// Train only the classification head
    #[arg(long)]
    pub freeze_backbone: bool,

    /// Background threads loading images
    #[arg(long, default_value_t = 4)]
    pub num_workers: usize,

    /// Seed for shuffling and the fallback validation split
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Validation share when the dataset has no val/ folder
    #[arg(long, default_value_t = 0.2)]
    pub val_fraction: f64,

    #[arg(long, value_enum, default_value_t = BackendArg::Wgpu)]
    pub backend: BackendArg,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:        a.data_dir,
            checkpoint_dir:  a.checkpoint_dir,
            epochs:          a.epochs,
            batch_size:      a.batch_size,
            lr:              a.lr,
            momentum:        a.momentum,
            step_size:       a.step_size,
            gamma:           a.gamma,
            optimizer:       a.optimizer.into(),
            resize:          a.resize,
            crop:            a.crop,
            base_channels:   a.base_channels,
            num_stages:      a.stages,
            dropout:         a.dropout,
            pretrained:      a.pretrained,
            freeze_backbone: a.freeze_backbone,
            num_workers:     a.num_workers,
            seed:            a.seed,
            val_fraction:    a.val_fraction,
            backend:         a.backend.into(),
        }
    }
}

/// All arguments for the `visualize` command
#[derive(Args, Debug)]
pub struct VisualizeArgs {
    /// Directory where `train` saved its checkpoint
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Dataset root; defaults to the one used for training
    #[arg(long)]
    pub data_dir: Option<String>,

    /// How many validation images to show
    #[arg(long, default_value_t = 6)]
    pub num_images: usize,

    /// Write one PNG per prediction into this folder
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Backend; defaults to the one used for training
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,
}

impl From<VisualizeArgs> for VisualizeRequest {
    fn from(a: VisualizeArgs) -> Self {
        VisualizeRequest {
            checkpoint_dir: a.checkpoint_dir,
            data_dir:       a.data_dir,
            num_images:     a.num_images,
            out_dir:        a.out_dir,
            backend:        a.backend.map(Into::into),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let Commands::Train(args) = parse(&["transfer-learn", "train"]) else {
            panic!("expected train");
        };
        assert_eq!(TrainConfig::from(args), TrainConfig::default());
    }

    #[test]
    fn test_train_flags_reach_the_config() {
        let Commands::Train(args) = parse(&[
            "transfer-learn", "train",
            "--optimizer", "adam", "--backend", "ndarray",
            "--stages", "2", "--freeze-backbone", "--pretrained", "ck/backbone_best",
        ]) else {
            panic!("expected train");
        };
        let cfg = TrainConfig::from(args);
        assert_eq!(cfg.optimizer, OptimizerKind::Adam);
        assert_eq!(cfg.backend, BackendKind::NdArray);
        assert_eq!(cfg.num_stages, 2);
        assert!(cfg.freeze_backbone);
        assert_eq!(cfg.pretrained.as_deref(), Some("ck/backbone_best"));
    }

    #[test]
    fn test_visualize_overrides_are_optional() {
        let Commands::Visualize(args) = parse(&["transfer-learn", "visualize", "--num-images", "3"]) else {
            panic!("expected visualize");
        };
        let req = VisualizeRequest::from(args);
        assert_eq!(req.num_images, 3);
        assert!(req.data_dir.is_none() && req.backend.is_none() && req.out_dir.is_none());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(Cli::try_parse_from(["transfer-learn", "train", "--backend", "cuda"]).is_err());
    }
}
