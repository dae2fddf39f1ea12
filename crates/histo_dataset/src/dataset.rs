//! Corpus dataset: eager-decoded samples behind a stable retrieval API.
//!
//! Construction scans the corpus, splits it, filters to the requested
//! target, and decodes every surviving image up front so retrieval never
//! touches the filesystem. Retrieval applies the resolved augmentation
//! pipeline and hands back a CHW tensor plus the numeric label.

use crate::aug::AugPipeline;
use crate::scan::{decode_image, scan_corpus, CorpusRecord};
use crate::splits::split_stratified;
use crate::taxonomy::{num_classes, Diagnosis};
use crate::types::{
    AugMode, CorpusSummary, DatasetResult, DecodeOptions, HistoDatasetError, ImageTensor,
    LabelSummary, Target,
};
use image::RgbImage;
use rayon::prelude::*;
use std::path::PathBuf;

/// Everything a dataset needs to know at construction time.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub target: Target,
    /// Collapse the five-code taxonomy to three.
    pub merge: bool,
    pub base_dir: PathBuf,
    pub test_ratio: f32,
    pub seed: u64,
    /// Epoch-length multiplier for the train target; retrieval wraps
    /// around the stored items.
    pub scale: usize,
    pub crop_size: u32,
    pub size: u32,
    pub aug_mode: AugMode,
    pub normalize: bool,
    pub decode: DecodeOptions,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            target: Target::Train,
            merge: false,
            base_dir: PathBuf::from("data/images"),
            test_ratio: 0.25,
            seed: 42,
            scale: 1,
            crop_size: 768,
            size: 768,
            aug_mode: AugMode::Same,
            normalize: true,
            decode: DecodeOptions::default(),
        }
    }
}

/// One stored sample: decoded pixels plus provenance.
#[derive(Debug, Clone)]
pub struct SampleItem {
    pub path: PathBuf,
    pub label: Diagnosis,
    pub image: RgbImage,
    /// Which side of the split this record came from; only meaningful
    /// for the `all` target, where both sides are stored.
    pub is_test: bool,
}

#[derive(Debug)]
pub struct HistoDataset {
    config: DatasetConfig,
    pipeline: AugPipeline,
    items: Vec<SampleItem>,
    num_classes: usize,
}

impl HistoDataset {
    /// Scan, split, filter, and eagerly decode. Any unreadable or
    /// oversized image fails the whole construction.
    pub fn new(config: DatasetConfig) -> DatasetResult<Self> {
        if !(config.test_ratio > 0.0 && config.test_ratio < 1.0) {
            return Err(HistoDatasetError::InvalidTestRatio(config.test_ratio));
        }
        if config.scale == 0 {
            return Err(HistoDatasetError::InvalidScale(config.scale));
        }

        let pipeline = AugPipeline::resolve(
            config.target,
            config.aug_mode,
            config.crop_size,
            config.size,
            config.normalize,
        );

        let records = scan_corpus(&config.base_dir, config.merge)?;
        if records.is_empty() {
            return Err(HistoDatasetError::EmptyCorpus(config.base_dir.clone()));
        }
        let (train, test) = split_stratified(records, config.test_ratio, config.seed)?;

        let mut selected: Vec<(CorpusRecord, bool)> = Vec::new();
        match config.target {
            Target::Train => selected.extend(train.into_iter().map(|r| (r, false))),
            Target::Test => selected.extend(test.into_iter().map(|r| (r, true))),
            Target::All => {
                selected.extend(train.into_iter().map(|r| (r, false)));
                selected.extend(test.into_iter().map(|r| (r, true)));
            }
        }
        if selected.is_empty() {
            return Err(HistoDatasetError::EmptyCorpus(config.base_dir.clone()));
        }

        let decode = config.decode;
        let items: Vec<SampleItem> = selected
            .into_par_iter()
            .map(|(record, is_test)| {
                let image = decode_image(&record.path, &decode)?;
                Ok(SampleItem {
                    path: record.path,
                    label: record.label,
                    image,
                    is_test,
                })
            })
            .collect::<DatasetResult<Vec<_>>>()?;

        eprintln!(
            "[dataset] target={} items={} classes={} aug={} seed={}",
            config.target.as_str(),
            items.len(),
            num_classes(config.merge),
            config.aug_mode.as_str(),
            config.seed,
        );

        let num_classes = num_classes(config.merge);
        Ok(Self {
            config,
            pipeline,
            items,
            num_classes,
        })
    }

    /// Epoch length. The train target reports the stored count times
    /// `scale`; other targets report the stored count unchanged.
    pub fn len(&self) -> usize {
        if self.config.target == Target::Train {
            self.items.len() * self.config.scale
        } else {
            self.items.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of physically stored samples, independent of `scale`.
    pub fn stored_len(&self) -> usize {
        self.items.len()
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn items(&self) -> &[SampleItem] {
        &self.items
    }

    /// Retrieve one sample with the thread-local generator. Indices past
    /// the stored count wrap via modulo, which is what makes the
    /// scale-inflated epoch work.
    pub fn get(&self, index: usize) -> (ImageTensor, usize) {
        self.get_with(index, &mut rand::rng())
    }

    /// Retrieve with a caller-owned generator, for reproducible or
    /// decorrelated sampling.
    pub fn get_with(&self, index: usize, rng: &mut dyn rand::RngCore) -> (ImageTensor, usize) {
        let item = &self.items[index % self.items.len()];
        let tensor = self.pipeline.apply(&item.image, rng);
        (tensor, item.label.index())
    }

    /// Per-label corpus statistics over the stored items.
    pub fn summarize(&self) -> CorpusSummary {
        let mut labels: Vec<LabelSummary> = Vec::new();
        for diag in Diagnosis::ALL {
            let mut images = 0usize;
            let mut megapixels = 0f64;
            for item in self.items.iter().filter(|i| i.label == diag) {
                images += 1;
                let (w, h) = item.image.dimensions();
                megapixels += f64::from(w) * f64::from(h) / 1e6;
            }
            if images == 0 {
                continue;
            }
            labels.push(LabelSummary {
                code: diag.code().to_string(),
                images,
                megapixels,
                mean_megapixels: megapixels / images as f64,
            });
        }
        let total_images = labels.iter().map(|l| l.images).sum();
        let total_megapixels = labels.iter().map(|l| l.megapixels).sum();
        CorpusSummary {
            labels,
            total_images,
            total_megapixels,
        }
    }
}
