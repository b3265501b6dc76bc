use crate::core::fingerprint::{Distance, Hamming};
use crate::core::store::{FingerprintStore, ImageId};
use log::debug;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompareError {
    #[error("Invalid threshold {threshold}: must be zero or greater")]
    InvalidThreshold { threshold: i64 },
}

/// Two images whose fingerprints are within the threshold.
///
/// `first` always sorts before `second`, so a pair has one canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DuplicatePair {
    pub first: ImageId,
    pub second: ImageId,
    pub distance: u32,
}

impl DuplicatePair {
    /// Returns `None` when both identifiers are the same image.
    pub fn new(a: &str, b: &str, distance: u32) -> Option<Self> {
        let (first, second) = match a.cmp(b) {
            std::cmp::Ordering::Less => (a, b),
            std::cmp::Ordering::Greater => (b, a),
            std::cmp::Ordering::Equal => return None,
        };
        Some(Self {
            first: first.to_string(),
            second: second.to_string(),
            distance,
        })
    }

    /// Bit-identical fingerprints.
    pub fn is_exact(&self) -> bool {
        self.distance == 0
    }
}

/// Every unordered index pair `(i, j)` with `i < j < n`, outer index first.
pub fn pair_indices(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
}

/// Reject negative thresholds; anything beyond `u32::MAX` saturates.
pub fn validate_threshold(threshold: i64) -> Result<u32, CompareError> {
    if threshold < 0 {
        return Err(CompareError::InvalidThreshold { threshold });
    }
    Ok(u32::try_from(threshold).unwrap_or(u32::MAX))
}

/// Find all pairs within `threshold` bits of each other, using Hamming distance.
pub fn find_duplicates(
    store: &FingerprintStore,
    threshold: i64,
) -> Result<Vec<DuplicatePair>, CompareError> {
    find_duplicates_with(store, threshold, &Hamming)
}

/// Find all pairs whose `metric` distance is at most `threshold` (inclusive).
///
/// Pairs come out in encounter order: outer entry in store order, then each
/// later entry in store order. Each unordered pair is visited once.
pub fn find_duplicates_with<D>(
    store: &FingerprintStore,
    threshold: i64,
    metric: &D,
) -> Result<Vec<DuplicatePair>, CompareError>
where
    D: Distance + ?Sized,
{
    let threshold = validate_threshold(threshold)?;

    let entries = store.entries();
    let mut pairs = Vec::new();
    for (i, j) in pair_indices(entries.len()) {
        let (id_a, fp_a) = &entries[i];
        let (id_b, fp_b) = &entries[j];
        let distance = metric.distance(fp_a, fp_b);
        if distance <= threshold {
            pairs.extend(DuplicatePair::new(id_a, id_b, distance));
        }
    }

    debug!(
        "Compared {} fingerprints, {} pair(s) within {} bit(s)",
        entries.len(),
        pairs.len(),
        threshold
    );
    Ok(pairs)
}
