// Fingerprint comparison engine.
// - fingerprint: bit-vector fingerprints and the distance metric
// - extractor: image bytes -> fingerprint
// - store: building the identifier -> fingerprint map, tolerating bad images
// - duplicate: pairwise comparison against a threshold
// - scanner: discovering image files under a directory

pub mod duplicate;
pub mod extractor;
pub mod fingerprint;
pub mod scanner;
pub mod store;
