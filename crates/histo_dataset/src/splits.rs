//! Deterministic stratified train/test splitting.
//!
//! Each label stratum is partitioned independently so per-label
//! proportions survive the split. Rounding rule: the test side receives
//! `round(n * ratio)` records per stratum (half-up, clamped to `0..=n`).
//! Given identical `(records, ratio, seed)` the same records land on the
//! same side every run; `StdRng` is a portable, versioned generator and
//! strata are shuffled from seeds mixed with the label index so no
//! stratum's draw depends on another's size.

use crate::scan::CorpusRecord;
use crate::taxonomy::Diagnosis;
use crate::types::{DatasetResult, HistoDatasetError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Partition `records` into `(train, test)` with per-label stratification.
pub fn split_stratified(
    records: Vec<CorpusRecord>,
    test_ratio: f32,
    seed: u64,
) -> DatasetResult<(Vec<CorpusRecord>, Vec<CorpusRecord>)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(HistoDatasetError::InvalidTestRatio(test_ratio));
    }

    let mut strata: BTreeMap<Diagnosis, Vec<CorpusRecord>> = BTreeMap::new();
    for record in records {
        strata.entry(record.label).or_default().push(record);
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for (label, mut stratum) in strata {
        // Input order is already path-sorted by the scanner; re-sort so a
        // caller-assembled record list splits identically.
        stratum.sort_by(|a, b| a.path.cmp(&b.path));
        let mut rng = rand::rngs::StdRng::seed_from_u64(mix_seed(seed, label.index()));
        stratum.shuffle(&mut rng);

        let n = stratum.len();
        let test_count = ((n as f64 * f64::from(test_ratio)) + 0.5).floor() as usize;
        let test_count = test_count.min(n);
        let rest = stratum.split_off(test_count);
        test.extend(stratum);
        train.extend(rest);
    }
    Ok((train, test))
}

fn mix_seed(seed: u64, label_index: usize) -> u64 {
    // SplitMix-style spread so neighbouring label indices land far apart.
    seed ^ (label_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn synthetic_records(per_label: usize) -> Vec<CorpusRecord> {
        let mut records = Vec::new();
        for diag in Diagnosis::ALL {
            for i in 0..per_label {
                records.push(CorpusRecord {
                    path: PathBuf::from(format!("data/{}/slide_{i:03}.jpg", diag.code())),
                    label: diag,
                });
            }
        }
        records
    }

    fn count_label(records: &[CorpusRecord], label: Diagnosis) -> usize {
        records.iter().filter(|r| r.label == label).count()
    }

    #[test]
    fn split_is_deterministic() {
        let (train_a, test_a) = split_stratified(synthetic_records(10), 0.25, 42).unwrap();
        let (train_b, test_b) = split_stratified(synthetic_records(10), 0.25, 42).unwrap();
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
    }

    #[test]
    fn split_changes_with_seed() {
        let (_, test_a) = split_stratified(synthetic_records(20), 0.25, 42).unwrap();
        let (_, test_b) = split_stratified(synthetic_records(20), 0.25, 43).unwrap();
        assert_ne!(test_a, test_b);
    }

    #[test]
    fn partitions_are_disjoint_and_exhaustive() {
        let records = synthetic_records(13);
        let total = records.len();
        let (train, test) = split_stratified(records, 0.3, 7).unwrap();
        assert_eq!(train.len() + test.len(), total);
        for r in &test {
            assert!(!train.contains(r));
        }
    }

    #[test]
    fn per_label_proportions_follow_rounding_rule() {
        // 10 per label at ratio 0.2 divides evenly: 2 test, 8 train.
        let (train, test) = split_stratified(synthetic_records(10), 0.2, 42).unwrap();
        for diag in Diagnosis::ALL {
            assert_eq!(count_label(&test, diag), 2);
            assert_eq!(count_label(&train, diag), 8);
        }
    }

    #[test]
    fn tiny_stratum_still_partitions() {
        let records = vec![CorpusRecord {
            path: PathBuf::from("data/L/only.jpg"),
            label: Diagnosis::L,
        }];
        let (train, test) = split_stratified(records, 0.2, 42).unwrap();
        // round(1 * 0.2) == 0: the minority side may be empty.
        assert_eq!(train.len(), 1);
        assert!(test.is_empty());
    }

    #[test]
    fn out_of_range_ratio_is_rejected() {
        for ratio in [0.0, 1.0, -0.5, 1.5] {
            let err = split_stratified(synthetic_records(2), ratio, 42).unwrap_err();
            assert!(matches!(err, HistoDatasetError::InvalidTestRatio(_)));
        }
    }

    #[test]
    fn input_order_does_not_affect_membership() {
        let forward = synthetic_records(8);
        let mut reversed = forward.clone();
        reversed.reverse();
        let (_, test_a) = split_stratified(forward, 0.25, 99).unwrap();
        let (_, test_b) = split_stratified(reversed, 0.25, 99).unwrap();
        assert_eq!(test_a, test_b);
    }
}
