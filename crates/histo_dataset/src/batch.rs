//! Batch assembly for burn backends.
//!
//! Walks the dataset's scale-inflated epoch in cursor order, applies the
//! dataset's augmentation pipeline per sample, and packs the results into
//! `[N, 3, H, W]` image tensors with an `[N]` integer label tensor.

use crate::dataset::HistoDataset;
use crate::types::{DatasetResult, HistoDatasetError};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug)]
pub struct BurnBatch<B: Backend> {
    pub images: Tensor<B, 4>,
    pub labels: Tensor<B, 1, Int>,
}

pub struct BatchIter<'a> {
    dataset: &'a HistoDataset,
    order: Vec<usize>,
    cursor: usize,
    batch_size: usize,
    rng: StdRng,
    images_buf: Vec<f32>,
    labels_buf: Vec<i32>,
}

impl<'a> BatchIter<'a> {
    /// One pass over the epoch. `seed` fixes both the visit order (when
    /// shuffling) and the augmentation draws; `None` derives a fresh seed
    /// from the thread-local generator.
    pub fn new(dataset: &'a HistoDataset, batch_size: usize, shuffle: bool, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        if shuffle {
            order.shuffle(&mut rng);
        }
        Self {
            dataset,
            order,
            cursor: 0,
            batch_size: batch_size.max(1),
            rng,
            images_buf: Vec::new(),
            labels_buf: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Assemble the next batch, or `None` when the epoch is exhausted.
    /// Every image in a batch must share one size; varying sizes only
    /// arise under `aug_mode=none`, which skips the unifying crop.
    pub fn next_batch<B: Backend>(
        &mut self,
        device: &B::Device,
    ) -> DatasetResult<Option<BurnBatch<B>>> {
        if self.cursor >= self.order.len() {
            return Ok(None);
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let span = self.cursor..end;
        self.cursor = end;

        self.images_buf.clear();
        self.labels_buf.clear();
        let mut expected_size: Option<(u32, u32)> = None;
        for &index in &self.order[span] {
            let (tensor, label) = self.dataset.get_with(index, &mut self.rng);
            let size = (tensor.width, tensor.height);
            match expected_size {
                None => expected_size = Some(size),
                Some(sz) if sz != size => return Err(HistoDatasetError::MixedImageSizes),
                _ => {}
            }
            self.images_buf.extend_from_slice(&tensor.chw);
            self.labels_buf.push(label as i32);
        }

        let (width, height) = expected_size.expect("non-empty span sets the size");
        let batch_len = self.labels_buf.len();
        let images = Tensor::<B, 1>::from_floats(self.images_buf.as_slice(), device)
            .reshape([batch_len, 3, height as usize, width as usize]);
        let labels = Tensor::<B, 1, Int>::from_ints(self.labels_buf.as_slice(), device);
        Ok(Some(BurnBatch { images, labels }))
    }
}
