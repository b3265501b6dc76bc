use crate::core::store::{ErrorRecord, ImageId};
use log::{debug, warn};
use std::collections::HashSet;
use std::path::{Component, Path};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];

/// Result of walking a directory.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Root-relative identifiers in sorted path order.
    pub images: Vec<ImageId>,
    /// Image files that cannot be addressed by an identifier.
    pub rejected: Vec<ErrorRecord>,
}

/// Discovers image files under a root directory.
#[derive(Debug, Clone)]
pub struct Scanner {
    extensions: HashSet<String>,
    recursive: bool,
}

impl Scanner {
    pub fn new<S: AsRef<str>>(extensions: &[S], recursive: bool) -> Self {
        let extensions = extensions
            .iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self {
            extensions,
            recursive,
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }

    /// Walk `root`, collecting root-relative identifiers in sorted path order.
    ///
    /// A missing or non-directory root is an error; unreadable entries below
    /// it are logged and skipped. Symlinked files are followed. Files whose
    /// relative path is not valid UTF-8 are returned in `rejected`.
    pub fn scan(&self, root: &Path) -> Result<Discovery, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::InvalidPath {
                path: root.to_string_lossy().to_string(),
            });
        }

        let mut walker = WalkDir::new(root).sort_by_file_name().min_depth(1);
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        let mut found = Discovery::default();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.path().is_file() || !self.accepts(entry.path()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            match to_identifier(relative) {
                Some(id) => found.images.push(id),
                None => {
                    warn!("Skipping non-UTF-8 path {}", relative.display());
                    found.rejected.push(ErrorRecord {
                        identifier: relative.to_string_lossy().to_string(),
                        reason: "file name is not valid UTF-8".to_string(),
                    });
                }
            }
        }

        debug!(
            "Discovered {} image(s) under {}, rejected {}",
            found.images.len(),
            root.display(),
            found.rejected.len()
        );
        Ok(found)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS, true)
    }
}

fn to_identifier(relative: &Path) -> Option<ImageId> {
    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_str()?);
        }
    }
    Some(parts.join("/"))
}
