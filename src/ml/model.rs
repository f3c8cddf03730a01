// ============================================================
// Layer 5 — Image Classifier Architecture (Burn)
// ============================================================
// A small residual convolutional network:
//
//   images [N, 3, H, W]
//     → stem: conv3×3 → batch-norm → ReLU → max-pool
//     → stages: residual block → max-pool    (channels double)
//     → global average pool                  [N, features]
//     → dropout → linear head                [N, num_classes]
//
// The backbone and the head are separate modules so a backbone
// trained elsewhere can be loaded (and optionally frozen) while
// the head is sized for the classes at hand.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig,
        PaddingConfig2d, Relu,
    },
    prelude::*,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct BackboneConfig {
    #[config(default = 3)]
    pub in_channels:   usize,
    /// Channels after the stem; doubled by every stage
    #[config(default = 32)]
    pub base_channels: usize,
    #[config(default = 3)]
    pub num_stages:    usize,
}

/// Deepest backbone the CLI accepts
pub const MAX_STAGES: usize = 8;

impl BackboneConfig {
    /// Width of the feature vector the backbone produces
    pub fn out_features(&self) -> usize {
        self.base_channels << self.num_stages
    }

    /// Smallest image side that survives the stem pool and every stage pool
    pub fn min_input_size(&self) -> usize {
        1 << (self.num_stages + 1)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Backbone<B> {
        let stem = Conv2dConfig::new([self.in_channels, self.base_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .with_bias(false)
            .init(device);
        let stem_norm = BatchNormConfig::new(self.base_channels).init(device);

        let blocks = (0..self.num_stages)
            .map(|stage| {
                let channels_in = self.base_channels << stage;
                ResidualBlock::new(channels_in, channels_in * 2, device)
            })
            .collect();

        Backbone {
            stem,
            stem_norm,
            blocks,
            pool:        MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            activation:  Relu::new(),
        }
    }
}

// ─── ResidualBlock ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
    conv1:      Conv2d<B>,
    norm1:      BatchNorm<B, 2>,
    conv2:      Conv2d<B>,
    norm2:      BatchNorm<B, 2>,
    /// 1×1 projection when the channel count changes
    shortcut:   Option<Conv2d<B>>,
    activation: Relu,
}

impl<B: Backend> ResidualBlock<B> {
    fn new(channels_in: usize, channels_out: usize, device: &B::Device) -> Self {
        let conv3x3 = |c_in: usize, c_out: usize| {
            Conv2dConfig::new([c_in, c_out], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .with_bias(false)
                .init(device)
        };
        let shortcut = (channels_in != channels_out).then(|| {
            Conv2dConfig::new([channels_in, channels_out], [1, 1])
                .with_bias(false)
                .init(device)
        });

        Self {
            conv1:      conv3x3(channels_in, channels_out),
            norm1:      BatchNormConfig::new(channels_out).init(device),
            conv2:      conv3x3(channels_out, channels_out),
            norm2:      BatchNormConfig::new(channels_out).init(device),
            shortcut,
            activation: Relu::new(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.shortcut {
            Some(projection) => projection.forward(x.clone()),
            None             => x.clone(),
        };
        let out = self.activation.forward(self.norm1.forward(self.conv1.forward(x)));
        let out = self.norm2.forward(self.conv2.forward(out));
        self.activation.forward(out + identity)
    }
}

// ─── Backbone ─────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Backbone<B: Backend> {
    pub stem:    Conv2d<B>,
    stem_norm:   BatchNorm<B, 2>,
    blocks:      Vec<ResidualBlock<B>>,
    pool:        MaxPool2d,
    global_pool: AdaptiveAvgPool2d,
    activation:  Relu,
}

impl<B: Backend> Backbone<B> {
    /// images: [batch, channels, height, width] → features: [batch, out_features]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.stem_norm.forward(self.stem.forward(images)));
        let mut x = self.pool.forward(x);
        for block in &self.blocks {
            x = self.pool.forward(block.forward(x));
        }
        // [batch, channels, 1, 1] → [batch, channels]
        self.global_pool.forward(x).flatten::<2>(1, 3)
    }
}

// ─── ImageClassifier ──────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct ImageClassifierConfig {
    pub num_classes: usize,
    pub backbone:    BackboneConfig,
    #[config(default = 0.0)]
    pub dropout:     f64,
}

impl ImageClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ImageClassifier<B> {
        self.init_with_backbone(self.backbone.init(device), device)
    }

    /// Attach a fresh head to an existing backbone.
    pub fn init_with_backbone<B: Backend>(
        &self,
        backbone: Backbone<B>,
        device:   &B::Device,
    ) -> ImageClassifier<B> {
        ImageClassifier {
            backbone,
            dropout: DropoutConfig::new(self.dropout).init(),
            head:    LinearConfig::new(self.backbone.out_features(), self.num_classes).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct ImageClassifier<B: Backend> {
    pub backbone: Backbone<B>,
    pub dropout:  Dropout,
    pub head:     Linear<B>,
}

impl<B: Backend> ImageClassifier<B> {
    /// images: [batch, 3, height, width] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.backbone.forward(images);
        self.head.forward(self.dropout.forward(features))
    }

    /// Stop gradients from reaching the backbone; only the head trains.
    pub fn freeze_backbone(self) -> Self {
        Self { backbone: self.backbone.no_grad(), ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny_config(num_classes: usize) -> ImageClassifierConfig {
        ImageClassifierConfig::new(
            num_classes,
            BackboneConfig::new().with_base_channels(4).with_num_stages(2),
        )
    }

    #[test]
    fn test_out_features_doubles_per_stage() {
        let cfg = BackboneConfig::new().with_base_channels(8).with_num_stages(3);
        assert_eq!(cfg.out_features(), 64);
        assert_eq!(BackboneConfig::new().with_num_stages(0).out_features(), 32);
    }

    #[test]
    fn test_min_input_size_halves_once_per_pool() {
        assert_eq!(BackboneConfig::new().with_num_stages(0).min_input_size(), 2);
        assert_eq!(BackboneConfig::new().with_num_stages(3).min_input_size(), 16);

        // exactly the minimum pools down to 1×1
        let device = Default::default();
        let cfg    = BackboneConfig::new().with_base_channels(2).with_num_stages(2);
        let side   = cfg.min_input_size();
        let images = Tensor::<TestBackend, 4>::zeros([1, 3, side, side], &device);
        assert_eq!(cfg.init::<TestBackend>(&device).forward(images).dims(), [1, 8]);
    }

    #[test]
    fn test_forward_produces_one_score_per_class() {
        let device = Default::default();
        let model  = tiny_config(2).init::<TestBackend>(&device);
        let images = Tensor::<TestBackend, 4>::zeros([3, 3, 16, 16], &device);

        assert_eq!(model.backbone.forward(images.clone()).dims(), [3, 16]);
        assert_eq!(model.forward(images).dims(), [3, 2]);
    }

    #[test]
    fn test_head_follows_class_count() {
        let device = Default::default();
        let model  = tiny_config(5).init::<TestBackend>(&device);
        let images = Tensor::<TestBackend, 4>::zeros([1, 3, 16, 16], &device);
        assert_eq!(model.forward(images).dims(), [1, 5]);
    }
}
