//! Error types for coverage aggregation

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("Coverage directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("Malformed fragment {path}: {reason}")]
    MalformedFragment { path: PathBuf, reason: String },

    #[error("JaCoCo report failed: {0}")]
    Jacoco(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type CoverageResult<T> = Result<T, CoverageError>;
