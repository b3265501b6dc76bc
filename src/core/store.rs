use crate::core::extractor::{DecodeError, Extractor};
use crate::core::fingerprint::Fingerprint;
use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Name or path identifying one input image. Unique within a run.
pub type ImageId = String;

/// Fetches the raw bytes behind an identifier.
pub trait ImageSource {
    fn load(&self, id: &str) -> Result<Vec<u8>, DecodeError>;
}

/// Reads identifiers as paths relative to a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageSource for DirectorySource {
    fn load(&self, id: &str) -> Result<Vec<u8>, DecodeError> {
        Ok(fs::read(self.root.join(id))?)
    }
}

/// An image whose fingerprint could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub identifier: ImageId,
    pub reason: String,
}

/// Insertion-ordered mapping from identifier to fingerprint.
///
/// Re-inserting an identifier replaces its fingerprint but keeps the slot of
/// the first insertion, so iteration order stays discovery order.
#[derive(Debug, Clone, Default)]
pub struct FingerprintStore {
    entries: Vec<(ImageId, Fingerprint)>,
    index: HashMap<ImageId, usize>,
}

impl FingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ImageId, fingerprint: Fingerprint) -> Option<Fingerprint> {
        match self.index.get(&id) {
            Some(&slot) => {
                debug!("Replacing fingerprint for duplicate identifier {}", id);
                Some(std::mem::replace(&mut self.entries[slot].1, fingerprint))
            }
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, fingerprint));
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Fingerprint> {
        self.index.get(id).map(|&slot| &self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in discovery order.
    pub fn entries(&self) -> &[(ImageId, Fingerprint)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fingerprint)> {
        self.entries.iter().map(|(id, fp)| (id.as_str(), fp))
    }
}

fn fingerprint_one<S, E>(id: &str, source: &S, extractor: &E) -> Result<Fingerprint, DecodeError>
where
    S: ImageSource + ?Sized,
    E: Extractor + ?Sized,
{
    let bytes = source.load(id)?;
    extractor.extract(&bytes)
}

fn collect_results<I>(results: I) -> (FingerprintStore, Vec<ErrorRecord>)
where
    I: IntoIterator<Item = (ImageId, Result<Fingerprint, DecodeError>)>,
{
    let mut store = FingerprintStore::new();
    let mut errors = Vec::new();

    for (id, result) in results {
        match result {
            Ok(fingerprint) => {
                store.insert(id, fingerprint);
            }
            Err(e) => {
                warn!("Skipping {}: {}", id, e);
                errors.push(ErrorRecord {
                    identifier: id,
                    reason: e.to_string(),
                });
            }
        }
    }

    (store, errors)
}

/// Fingerprint every identifier in order.
///
/// Per-image failures are collected into the returned error list; they never
/// abort the batch.
pub fn build_store<I, S, E>(
    identifiers: I,
    source: &S,
    extractor: &E,
) -> (FingerprintStore, Vec<ErrorRecord>)
where
    I: IntoIterator<Item = ImageId>,
    S: ImageSource + ?Sized,
    E: Extractor + ?Sized,
{
    build_store_with_progress(identifiers, source, extractor, |_| {})
}

/// Same as [`build_store`], calling `on_item` after each attempted identifier.
pub fn build_store_with_progress<I, S, E, F>(
    identifiers: I,
    source: &S,
    extractor: &E,
    mut on_item: F,
) -> (FingerprintStore, Vec<ErrorRecord>)
where
    I: IntoIterator<Item = ImageId>,
    S: ImageSource + ?Sized,
    E: Extractor + ?Sized,
    F: FnMut(&str),
{
    collect_results(identifiers.into_iter().map(|id| {
        let result = fingerprint_one(&id, source, extractor);
        on_item(&id);
        (id, result)
    }))
}

/// Parallel variant of [`build_store`].
///
/// Extraction runs on the rayon pool; results are gathered in input order
/// before insertion, so the output matches the sequential builder exactly.
pub fn build_store_par<S, E>(
    identifiers: Vec<ImageId>,
    source: &S,
    extractor: &E,
) -> (FingerprintStore, Vec<ErrorRecord>)
where
    S: ImageSource + Sync + ?Sized,
    E: Extractor + Sync + ?Sized,
{
    build_store_par_with_progress(identifiers, source, extractor, |_| {})
}

pub fn build_store_par_with_progress<S, E, F>(
    identifiers: Vec<ImageId>,
    source: &S,
    extractor: &E,
    on_item: F,
) -> (FingerprintStore, Vec<ErrorRecord>)
where
    S: ImageSource + Sync + ?Sized,
    E: Extractor + Sync + ?Sized,
    F: Fn(&str) + Sync,
{
    let results: Vec<(ImageId, Result<Fingerprint, DecodeError>)> = identifiers
        .into_par_iter()
        .map(|id| {
            let result = fingerprint_one(&id, source, extractor);
            on_item(&id);
            (id, result)
        })
        .collect();

    collect_results(results)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    /// Serves identifiers as their own bytes.
    pub(crate) struct EchoSource;

    impl ImageSource for EchoSource {
        fn load(&self, id: &str) -> Result<Vec<u8>, DecodeError> {
            if id.starts_with("missing") {
                return Err(DecodeError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such file",
                )));
            }
            Ok(id.as_bytes().to_vec())
        }
    }

    /// Reads `name:hex` and returns the hex value as a 64-bit fingerprint.
    pub(crate) struct HexExtractor;

    impl Extractor for HexExtractor {
        fn extract(&self, bytes: &[u8]) -> Result<Fingerprint, DecodeError> {
            let text = std::str::from_utf8(bytes).map_err(|e| DecodeError::Unsupported {
                reason: e.to_string(),
            })?;
            let hex = text.rsplit(':').next().unwrap_or_default();
            u64::from_str_radix(hex, 16)
                .map(Fingerprint::from_u64)
                .map_err(|_| DecodeError::Unsupported {
                    reason: format!("corrupt: {}", text),
                })
        }
    }

    fn ids(names: &[&str]) -> Vec<ImageId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_store_preserves_discovery_order() {
        let input = ids(&["c.jpg:3", "a.jpg:1", "b.jpg:2"]);
        let (store, errors) = build_store(input, &EchoSource, &HexExtractor);

        assert!(errors.is_empty());
        let order: Vec<&str> = store.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec!["c.jpg:3", "a.jpg:1", "b.jpg:2"]);
        assert_eq!(store.get("a.jpg:1"), Some(&Fingerprint::from_u64(1)));
    }

    #[test]
    fn test_build_store_partial_failure() {
        let input = ids(&[
            "1.jpg:00",
            "2.jpg:01",
            "3.jpg:03",
            "broken.jpg:zz",
            "4.jpg:ff",
            "5.jpg:f0",
        ]);
        let (store, errors) = build_store(input, &EchoSource, &HexExtractor);

        assert_eq!(store.len(), 5);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].identifier, "broken.jpg:zz");
        assert!(errors[0].reason.contains("corrupt"));
        assert!(store.get("broken.jpg:zz").is_none());
    }

    #[test]
    fn test_build_store_io_failure_is_recorded() {
        let input = ids(&["missing.jpg", "ok.jpg:1"]);
        let (store, errors) = build_store(input, &EchoSource, &HexExtractor);

        assert_eq!(store.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].reason.starts_with("IO error"));
    }

    #[test]
    fn test_build_store_empty_input() {
        let (store, errors) = build_store(Vec::new(), &EchoSource, &HexExtractor);
        assert!(store.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_build_store_progress_called_per_item() {
        let calls = Cell::new(0);
        let input = ids(&["a:1", "b:zz", "c:2"]);
        build_store_with_progress(input, &EchoSource, &HexExtractor, |_| {
            calls.set(calls.get() + 1)
        });
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let input: Vec<ImageId> = (0..200)
            .map(|i| {
                if i % 17 == 0 {
                    format!("img{}:bogus", i)
                } else {
                    format!("img{}:{:x}", i, i * 31)
                }
            })
            .collect();

        let (seq_store, seq_errors) = build_store(input.clone(), &EchoSource, &HexExtractor);
        let (par_store, par_errors) = build_store_par(input, &EchoSource, &HexExtractor);

        assert_eq!(seq_store.entries(), par_store.entries());
        assert_eq!(seq_errors, par_errors);
    }

    #[test]
    fn test_insert_duplicate_identifier_keeps_position() {
        let mut store = FingerprintStore::new();
        store.insert("a".into(), Fingerprint::from_u64(1));
        store.insert("b".into(), Fingerprint::from_u64(2));
        let old = store.insert("a".into(), Fingerprint::from_u64(3));

        assert_eq!(old, Some(Fingerprint::from_u64(1)));
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[0].0, "a");
        assert_eq!(store.get("a"), Some(&Fingerprint::from_u64(3)));
    }

    #[test]
    fn test_directory_source_reads_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("sub")).unwrap();
        std::fs::write(temp_dir.path().join("sub/x.jpg"), b"payload").unwrap();

        let source = DirectorySource::new(temp_dir.path());
        assert_eq!(source.load("sub/x.jpg").unwrap(), b"payload");
        assert!(matches!(source.load("nope.jpg"), Err(DecodeError::Io(_))));
    }
}
