pub mod config;
pub mod core;
pub mod report;

pub use crate::core::duplicate::{find_duplicates, find_duplicates_with, CompareError, DuplicatePair};
pub use crate::core::extractor::{
    Algorithm, DecodeError, Extractor, ExtractorError, PerceptualExtractor,
};
pub use crate::core::fingerprint::{Distance, Fingerprint, Hamming};
pub use crate::core::scanner::{Discovery, ScanError, Scanner};
pub use crate::core::store::{
    build_store, build_store_par, DirectorySource, ErrorRecord, FingerprintStore, ImageId,
    ImageSource,
};
pub use config::Config;
pub use report::Report;
