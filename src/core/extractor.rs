use crate::core::fingerprint::Fingerprint;
use clap::ValueEnum;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unsupported image: {reason}")]
    Unsupported { reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractorError {
    #[error("Invalid hash size {hash_size}: must be at least 1")]
    InvalidHashSize { hash_size: u32 },
}

/// Turns raw image bytes into a fingerprint.
pub trait Extractor {
    fn extract(&self, bytes: &[u8]) -> Result<Fingerprint, DecodeError>;
}

/// Perceptual hash algorithm used by [`PerceptualExtractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// DCT + median (pHash)
    #[default]
    Phash,
    /// Mean of the pixel values (aHash)
    Mean,
    /// Horizontal gradient (dHash)
    Gradient,
    /// Horizontal and vertical gradients
    DoubleGradient,
    /// Blockhash.io
    Blockhash,
}

/// Extractor backed by `image` for decoding and `image_hasher` for hashing.
pub struct PerceptualExtractor {
    hasher: Hasher,
    algorithm: Algorithm,
    hash_size: u32,
}

impl PerceptualExtractor {
    /// `hash_size` is the side of the hash grid and must be non-zero.
    pub fn new(algorithm: Algorithm, hash_size: u32) -> Result<Self, ExtractorError> {
        if hash_size == 0 {
            return Err(ExtractorError::InvalidHashSize { hash_size });
        }
        Ok(Self::build(algorithm, hash_size))
    }

    fn build(algorithm: Algorithm, hash_size: u32) -> Self {
        let config = HasherConfig::new().hash_size(hash_size, hash_size);
        let config = match algorithm {
            Algorithm::Phash => config.hash_alg(HashAlg::Median).preproc_dct(),
            Algorithm::Mean => config.hash_alg(HashAlg::Mean),
            Algorithm::Gradient => config.hash_alg(HashAlg::Gradient),
            Algorithm::DoubleGradient => config.hash_alg(HashAlg::DoubleGradient),
            Algorithm::Blockhash => config.hash_alg(HashAlg::Blockhash),
        };

        Self {
            hasher: config.to_hasher(),
            algorithm,
            hash_size,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn hash_size(&self) -> u32 {
        self.hash_size
    }
}

impl Default for PerceptualExtractor {
    fn default() -> Self {
        Self::build(Algorithm::default(), 8)
    }
}

impl Extractor for PerceptualExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Fingerprint, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Unsupported {
                reason: "empty file".to_string(),
            });
        }

        let img = image::load_from_memory(bytes)?;
        if img.width() == 0 || img.height() == 0 {
            return Err(DecodeError::Unsupported {
                reason: format!("degenerate dimensions {}x{}", img.width(), img.height()),
            });
        }

        Ok(self.hasher.hash_image(&img).into())
    }
}
