//! Burn classifier architectures for diagnosis prediction.
//!
//! This crate defines the neural network backbones trained on the corpus:
//! - `VggClassifier`: VGG 11/13/16/19, with or without batch norm.
//! - `EffClassifier`: compact EfficientNet-style backbones, b0 through b4.
//!
//! Architectures are selected by name through [`create_model`], so a run
//! configuration can swap backbones without touching call sites. Every
//! model consumes `[N, 3, H, W]` images and emits `[N, num_classes]`
//! probabilities.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig};
use burn::nn::{
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
};
use burn::tensor::activation::{relu, sigmoid, silu, softmax};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown architecture: {0}")]
    UnknownArchitecture(String),
}

/// Names accepted by [`create_model`].
pub fn available_models() -> Vec<&'static str> {
    vec![
        "eff_b0", "eff_b1", "eff_b2", "eff_b3", "eff_b4", "vgg11", "vgg13", "vgg16", "vgg19",
        "vgg11_bn", "vgg13_bn", "vgg16_bn", "vgg19_bn",
    ]
}

/// Conv + optional batch norm + activation, the unit both backbones
/// are assembled from.
#[derive(Module, Debug)]
struct ConvBnAct<B: Backend> {
    conv: Conv2d<B>,
    norm: Option<BatchNorm<B, 2>>,
    /// SiLU when set, ReLU otherwise.
    swish: bool,
}

impl<B: Backend> ConvBnAct<B> {
    fn new(
        channels: [usize; 2],
        kernel: usize,
        stride: usize,
        batch_norm: bool,
        swish: bool,
        device: &B::Device,
    ) -> Self {
        let pad = kernel / 2;
        let conv = Conv2dConfig::new(channels, [kernel, kernel])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(pad, pad))
            .init(device);
        let norm = batch_norm.then(|| BatchNormConfig::new(channels[1]).init(device));
        Self { conv, norm, swish }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = self.conv.forward(input);
        if let Some(norm) = &self.norm {
            x = norm.forward(x);
        }
        if self.swish {
            silu(x)
        } else {
            relu(x)
        }
    }
}

/// Per-stage conv widths; every stage ends in a 2x2 max pool.
fn vgg_plan(depth: usize) -> Option<&'static [&'static [usize]]> {
    let plan: &[&[usize]] = match depth {
        11 => &[&[64], &[128], &[256, 256], &[512, 512], &[512, 512]],
        13 => &[&[64, 64], &[128, 128], &[256, 256], &[512, 512], &[512, 512]],
        16 => &[
            &[64, 64],
            &[128, 128],
            &[256, 256, 256],
            &[512, 512, 512],
            &[512, 512, 512],
        ],
        19 => &[
            &[64, 64],
            &[128, 128],
            &[256, 256, 256, 256],
            &[512, 512, 512, 512],
            &[512, 512, 512, 512],
        ],
        _ => return None,
    };
    Some(plan)
}

#[derive(Module, Debug)]
pub struct VggClassifier<B: Backend> {
    stages: Vec<Vec<ConvBnAct<B>>>,
    pool: MaxPool2d,
    avg_pool: AdaptiveAvgPool2d,
    fc1: Linear<B>,
    fc2: Linear<B>,
    head: Linear<B>,
    dropout: Dropout,
    num_classes: usize,
}

impl<B: Backend> VggClassifier<B> {
    pub fn new(
        depth: usize,
        batch_norm: bool,
        num_classes: usize,
        device: &B::Device,
    ) -> Result<Self, ModelError> {
        let plan = vgg_plan(depth).ok_or_else(|| {
            ModelError::UnknownArchitecture(format!("vgg{depth}"))
        })?;
        let mut stages = Vec::with_capacity(plan.len());
        let mut channels = 3;
        for widths in plan {
            let mut stage = Vec::with_capacity(widths.len());
            for &width in *widths {
                stage.push(ConvBnAct::new(
                    [channels, width],
                    3,
                    1,
                    batch_norm,
                    false,
                    device,
                ));
                channels = width;
            }
            stages.push(stage);
        }
        Ok(Self {
            stages,
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            avg_pool: AdaptiveAvgPool2dConfig::new([7, 7]).init(),
            fc1: LinearConfig::new(512 * 7 * 7, 4096).init(device),
            fc2: LinearConfig::new(4096, 4096).init(device),
            head: LinearConfig::new(4096, num_classes).init(device),
            dropout: DropoutConfig::new(0.5).init(),
            num_classes,
        })
    }

    /// Final conv feature map, before pooling. Useful for class
    /// activation mapping.
    pub fn forward_features(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = input;
        for stage in &self.stages {
            for block in stage {
                x = block.forward(x);
            }
            x = self.pool.forward(x);
        }
        x
    }

    pub fn forward_logits(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.forward_features(input);
        let x = self.avg_pool.forward(x);
        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = self.dropout.forward(relu(self.fc1.forward(x)));
        let x = self.dropout.forward(relu(self.fc2.forward(x)));
        self.head.forward(x)
    }
}

/// Stage widths and repeat counts for the b0 baseline; variants scale
/// these by the multipliers in [`eff_multipliers`].
const EFF_BASE_WIDTHS: [usize; 5] = [16, 24, 40, 80, 112];
const EFF_BASE_REPEATS: [usize; 5] = [1, 2, 2, 3, 3];
const EFF_HEAD_WIDTH: usize = 1280;

fn eff_multipliers(variant: usize) -> Option<(f32, f32)> {
    // (width, depth)
    match variant {
        0 => Some((1.0, 1.0)),
        1 => Some((1.0, 1.1)),
        2 => Some((1.1, 1.2)),
        3 => Some((1.2, 1.4)),
        4 => Some((1.4, 1.8)),
        _ => None,
    }
}

fn scale_width(base: usize, mult: f32) -> usize {
    ((base as f32 * mult).round() as usize).max(8)
}

fn scale_depth(base: usize, mult: f32) -> usize {
    ((base as f32 * mult).ceil() as usize).max(1)
}

#[derive(Module, Debug)]
pub struct EffClassifier<B: Backend> {
    stem: ConvBnAct<B>,
    stages: Vec<Vec<ConvBnAct<B>>>,
    head_conv: ConvBnAct<B>,
    avg_pool: AdaptiveAvgPool2d,
    dropout: Dropout,
    fc: Linear<B>,
    num_classes: usize,
}

impl<B: Backend> EffClassifier<B> {
    pub fn new(
        variant: usize,
        num_classes: usize,
        device: &B::Device,
    ) -> Result<Self, ModelError> {
        let (width_mult, depth_mult) = eff_multipliers(variant).ok_or_else(|| {
            ModelError::UnknownArchitecture(format!("eff_b{variant}"))
        })?;
        let stem_width = scale_width(32, width_mult);
        let stem = ConvBnAct::new([3, stem_width], 3, 2, true, true, device);

        let mut stages = Vec::with_capacity(EFF_BASE_WIDTHS.len());
        let mut channels = stem_width;
        for (i, (&base_width, &base_repeat)) in EFF_BASE_WIDTHS
            .iter()
            .zip(EFF_BASE_REPEATS.iter())
            .enumerate()
        {
            let width = scale_width(base_width, width_mult);
            let repeats = scale_depth(base_repeat, depth_mult);
            let mut stage = Vec::with_capacity(repeats);
            for r in 0..repeats {
                // The first block of every stage past the stem halves
                // the spatial resolution.
                let stride = if r == 0 && i > 0 { 2 } else { 1 };
                stage.push(ConvBnAct::new([channels, width], 3, stride, true, true, device));
                channels = width;
            }
            stages.push(stage);
        }

        let head_width = scale_width(EFF_HEAD_WIDTH, width_mult);
        Ok(Self {
            stem,
            stages,
            head_conv: ConvBnAct::new([channels, head_width], 1, 1, true, true, device),
            avg_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            dropout: DropoutConfig::new(0.2).init(),
            fc: LinearConfig::new(head_width, num_classes).init(device),
            num_classes,
        })
    }

    pub fn forward_features(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = self.stem.forward(input);
        for stage in &self.stages {
            for block in stage {
                x = block.forward(x);
            }
        }
        self.head_conv.forward(x)
    }

    pub fn forward_logits(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.forward_features(input);
        let x = self.avg_pool.forward(x);
        let x: Tensor<B, 2> = x.flatten(1, 3);
        self.fc.forward(self.dropout.forward(x))
    }
}

/// A backbone selected at runtime by name.
#[derive(Debug)]
pub enum Classifier<B: Backend> {
    Vgg(VggClassifier<B>),
    Eff(EffClassifier<B>),
}

impl<B: Backend> Classifier<B> {
    pub fn num_classes(&self) -> usize {
        match self {
            Classifier::Vgg(m) => m.num_classes,
            Classifier::Eff(m) => m.num_classes,
        }
    }

    /// Probabilities: softmax rows for multi-class heads, sigmoid for a
    /// single-logit head.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = match self {
            Classifier::Vgg(m) => m.forward_logits(input),
            Classifier::Eff(m) => m.forward_logits(input),
        };
        if self.num_classes() > 1 {
            softmax(logits, 1)
        } else {
            sigmoid(logits)
        }
    }

    pub fn forward_features(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Classifier::Vgg(m) => m.forward_features(input),
            Classifier::Eff(m) => m.forward_features(input),
        }
    }
}

/// Build a backbone from its configuration name: `vgg{11,13,16,19}`,
/// optionally suffixed `_bn`, or `eff_b{0..4}`.
pub fn create_model<B: Backend>(
    name: &str,
    num_classes: usize,
    device: &B::Device,
) -> Result<Classifier<B>, ModelError> {
    if let Some(rest) = name.strip_prefix("eff_b") {
        let variant: usize = rest
            .parse()
            .map_err(|_| ModelError::UnknownArchitecture(name.to_string()))?;
        let model = EffClassifier::new(variant, num_classes, device)
            .map_err(|_| ModelError::UnknownArchitecture(name.to_string()))?;
        return Ok(Classifier::Eff(model));
    }
    if let Some(rest) = name.strip_prefix("vgg") {
        let (depth, batch_norm) = match rest.strip_suffix("_bn") {
            Some(d) => (d, true),
            None => (rest, false),
        };
        let depth: usize = depth
            .parse()
            .map_err(|_| ModelError::UnknownArchitecture(name.to_string()))?;
        let model = VggClassifier::new(depth, batch_norm, num_classes, device)
            .map_err(|_| ModelError::UnknownArchitecture(name.to_string()))?;
        return Ok(Classifier::Vgg(model));
    }
    Err(ModelError::UnknownArchitecture(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn factory_accepts_every_advertised_name() {
        let device = Default::default();
        for name in available_models() {
            assert!(create_model::<TestBackend>(name, 3, &device).is_ok(), "{name}");
        }
    }

    #[test]
    fn factory_rejects_unknown_names() {
        let device = Default::default();
        for name in ["resnet50", "vgg12", "eff_b9", "eff_bx", ""] {
            let err = create_model::<TestBackend>(name, 3, &device).unwrap_err();
            assert!(matches!(err, ModelError::UnknownArchitecture(_)));
        }
    }

    #[test]
    fn eff_probabilities_sum_to_one() {
        let device = Default::default();
        let model = create_model::<TestBackend>("eff_b0", 5, &device).unwrap();
        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 64, 64], &device);
        let out = model.forward(input);
        assert_eq!(out.dims(), [2, 5]);
        let row_sums = out.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        for sum in row_sums {
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn vgg_emits_class_probabilities() {
        let device = Default::default();
        let model = create_model::<TestBackend>("vgg11", 3, &device).unwrap();
        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 32, 32], &device);
        let out = model.forward(input);
        assert_eq!(out.dims(), [2, 3]);
        let row_sums = out.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        for sum in row_sums {
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn single_logit_head_uses_sigmoid() {
        let device = Default::default();
        let model = create_model::<TestBackend>("eff_b0", 1, &device).unwrap();
        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 32, 32], &device);
        let out = model.forward(input);
        assert_eq!(out.dims(), [2, 1]);
        for v in out.into_data().to_vec::<f32>().unwrap() {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn feature_maps_keep_four_dims() {
        let device = Default::default();
        let model = create_model::<TestBackend>("vgg11_bn", 3, &device).unwrap();
        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 32, 32], &device);
        let features = model.forward_features(input);
        let dims = features.dims();
        assert_eq!(dims[0], 1);
        assert_eq!(dims[1], 512);
    }
}
