use image_hasher::ImageHash;
use serde::{Serialize, Serializer};
use std::fmt;

/// Fixed-width perceptual fingerprint of one image.
///
/// The bits are packed into whole bytes. A hash whose bit count is not a
/// multiple of eight is zero-padded, and the padding bits never differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    bytes: Box<[u8]>,
}

impl Fingerprint {
    pub fn from_bytes(bytes: impl Into<Box<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn from_u64(value: u64) -> Self {
        Self::from_bytes(value.to_be_bytes().to_vec())
    }

    /// Stored width in bits, including any byte padding.
    pub fn padded_bits(&self) -> u32 {
        (self.bytes.len() * 8) as u32
    }

    /// Hamming distance: number of bit positions at which the two differ.
    ///
    /// Fingerprints produced by one extractor always share a width. If the
    /// widths differ anyway, every bit of the longer tail counts as differing,
    /// which keeps the distance symmetric and zero only for equal values.
    pub fn distance(&self, other: &Fingerprint) -> u32 {
        let (short, long) = if self.bytes.len() <= other.bytes.len() {
            (&self.bytes, &other.bytes)
        } else {
            (&other.bytes, &self.bytes)
        };

        let common: u32 = short
            .iter()
            .zip(long.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        let tail = ((long.len() - short.len()) * 8) as u32;
        common + tail
    }

    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl<B: image_hasher::HashBytes> From<ImageHash<B>> for Fingerprint {
    fn from(hash: ImageHash<B>) -> Self {
        Self::from_bytes(hash.as_bytes().to_vec())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Metric used by the comparator to score a pair of fingerprints.
pub trait Distance {
    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> u32;
}

/// Hamming distance over the raw bit vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hamming;

impl Distance for Hamming {
    #[inline]
    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> u32 {
        a.distance(b)
    }
}
