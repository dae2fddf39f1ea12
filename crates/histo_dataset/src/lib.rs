//! Histopathology image corpus preparation for supervised classification.
//!
//! This crate provides utilities for:
//! - Scanning a labeled corpus laid out as one directory per diagnosis code
//! - Deterministic stratified train/test splitting
//! - Probabilistic augmentation pipelines ending in CHW f32 tensors
//! - Burn-compatible batch iteration

// Module declarations
pub mod aug;
pub mod dataset;
pub mod scan;
pub mod splits;
pub mod taxonomy;
pub mod types;

#[cfg(feature = "burn-runtime")]
pub mod batch;

// Re-export public API
pub use aug::{AugOp, AugPipeline, NORM_MEAN, NORM_STD};
pub use dataset::{DatasetConfig, HistoDataset, SampleItem};
pub use scan::{decode_image, scan_corpus, CorpusRecord};
pub use splits::split_stratified;
pub use taxonomy::{num_classes, Diagnosis};
pub use types::*;

#[cfg(feature = "burn-runtime")]
pub use batch::{BatchIter, BurnBatch};
