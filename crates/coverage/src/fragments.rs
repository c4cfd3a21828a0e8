//! Reading coverage fragments from disk
//!
//! One fragment file is written per (test, worker). A fragment that cannot
//! be read or parsed is logged and skipped so the rest of the run still
//! aggregates.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{CoverageError, CoverageResult};

/// A parsed fragment and the file it came from
#[derive(Debug, Clone)]
pub struct Fragment<T> {
    pub path: PathBuf,
    pub data: T,
}

/// All `.json` files directly inside `dir`, sorted by name
pub fn fragment_files(dir: &Path) -> CoverageResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CoverageError::MissingDirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Parse a single fragment file
pub fn read_fragment<T: DeserializeOwned>(path: &Path) -> CoverageResult<T> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| CoverageError::MalformedFragment {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Parse every fragment in `dir`, skipping the ones that fail
pub fn load_fragments<T: DeserializeOwned>(dir: &Path) -> CoverageResult<Vec<Fragment<T>>> {
    let files = fragment_files(dir)?;
    let mut fragments = Vec::with_capacity(files.len());

    for path in files {
        match read_fragment(&path) {
            Ok(data) => {
                debug!("Loaded fragment {}", path.display());
                fragments.push(Fragment { path, data });
            }
            Err(e) => {
                warn!("Could not parse {}: {}", path.display(), e);
            }
        }
    }

    Ok(fragments)
}
