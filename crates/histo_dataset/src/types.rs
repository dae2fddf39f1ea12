//! Core types, error definitions, and configuration enums for histo_dataset.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, HistoDatasetError>;

#[derive(Debug, Error)]
pub enum HistoDatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {path} has {pixels} pixels, exceeding the decode guard of {max}")]
    ImageTooLarge { path: PathBuf, pixels: u64, max: u64 },
    #[error("invalid test ratio {0}; must lie strictly between 0 and 1")]
    InvalidTestRatio(f32),
    #[error("invalid scale {0}; must be at least 1")]
    InvalidScale(usize),
    #[error("unknown target: {0} (expected train, test, or all)")]
    UnknownTarget(String),
    #[error("unknown augmentation mode: {0} (expected same, train, test, or none)")]
    UnknownAugMode(String),
    #[error("no images found under {0}")]
    EmptyCorpus(PathBuf),
    #[error("batch contains varying image sizes; avoid aug_mode=none or batch per-size")]
    MixedImageSizes,
}

/// Which side of the train/test partition a dataset serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Train,
    Test,
    /// Both sides, train records first, each item flagged with its side.
    All,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Train => "train",
            Target::Test => "test",
            Target::All => "all",
        }
    }
}

impl FromStr for Target {
    type Err = HistoDatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Target::Train),
            "test" => Ok(Target::Test),
            "all" => Ok(Target::All),
            other => Err(HistoDatasetError::UnknownTarget(other.to_string())),
        }
    }
}

/// How the augmentation policy is chosen relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AugMode {
    /// Use the policy matching the dataset target.
    Same,
    /// Force the stochastic training battery, regardless of target.
    Train,
    /// Force the deterministic evaluation crop, regardless of target.
    Test,
    /// No geometric or color transform at all; raw decode only.
    None,
}

impl AugMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AugMode::Same => "same",
            AugMode::Train => "train",
            AugMode::Test => "test",
            AugMode::None => "none",
        }
    }
}

impl FromStr for AugMode {
    type Err = HistoDatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "same" => Ok(AugMode::Same),
            "train" => Ok(AugMode::Train),
            "test" => Ok(AugMode::Test),
            "none" => Ok(AugMode::None),
            other => Err(HistoDatasetError::UnknownAugMode(other.to_string())),
        }
    }
}

/// Explicit decoder guards, passed into the scanner so construction
/// stays free of process-wide state. Truncated or otherwise corrupt
/// files always fail the decode; there is no lenient mode to toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Refuse to decode images whose header reports more pixels than this.
    pub max_pixels: Option<u64>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_pixels: Some(1_000_000_000),
        }
    }
}

/// Pipeline output: one image in CHW layout, 3 channels, f32. Values sit
/// in `[0, 1]` unless mean/std normalization was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub chw: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

/// Per-label corpus statistics, enough for an external summary exporter
/// to derive its per-diagnosis CSV rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelSummary {
    pub code: String,
    pub images: usize,
    pub megapixels: f64,
    pub mean_megapixels: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub labels: Vec<LabelSummary>,
    pub total_images: usize,
    pub total_megapixels: f64,
}
