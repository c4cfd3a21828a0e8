//! Source-level statement/branch/function coverage
//!
//! Fragments are the `window.__coverage__` objects written by build-time
//! instrumentation, keyed by source file. Merging takes the maximum hit
//! count per statement, per branch arm and per function.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::summary::Summary;

/// Prefix the UI container builds from
const CONTAINER_ROOT: &str = "/app/";

/// Coverage of one instrumented source file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileCoverage {
    #[serde(default)]
    pub path: String,

    /// Statement id -> hit count
    #[serde(default)]
    pub s: BTreeMap<String, u64>,

    /// Function id -> hit count
    #[serde(default)]
    pub f: BTreeMap<String, u64>,

    /// Branch id -> hit count per arm
    #[serde(default)]
    pub b: BTreeMap<String, Vec<u64>>,

    /// statementMap, fnMap, branchMap, hash and anything else the
    /// instrumenter emits, carried through untouched
    #[serde(flatten)]
    pub maps: Map<String, Value>,
}

impl FileCoverage {
    /// Fold another fragment of the same file into this one
    pub fn merge(&mut self, other: FileCoverage) {
        for (id, count) in other.s {
            let slot = self.s.entry(id).or_insert(0);
            *slot = (*slot).max(count);
        }

        for (id, counts) in other.b {
            match self.b.get_mut(&id) {
                Some(existing) => {
                    if existing.len() < counts.len() {
                        existing.resize(counts.len(), 0);
                    }
                    for (slot, count) in existing.iter_mut().zip(counts) {
                        *slot = (*slot).max(count);
                    }
                }
                None => {
                    self.b.insert(id, counts);
                }
            }
        }

        for (id, count) in other.f {
            let slot = self.f.entry(id).or_insert(0);
            *slot = (*slot).max(count);
        }

        for (key, value) in other.maps {
            self.maps.entry(key).or_insert(value);
        }
    }

    pub fn statements(&self) -> Summary {
        Summary::from_counts(self.s.values())
    }

    pub fn functions(&self) -> Summary {
        Summary::from_counts(self.f.values())
    }

    /// Every arm of every branch is one unit
    pub fn branches(&self) -> Summary {
        Summary::from_counts(self.b.values().flatten())
    }
}

/// File path -> coverage, as written to `coverage-final.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverageMap {
    files: BTreeMap<String, FileCoverage>,
}

impl CoverageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a fragment into the map. The fragment is consumed so the merged
    /// record never shares structure with its inputs.
    pub fn merge(&mut self, fragment: CoverageMap) {
        for (key, mut file) in fragment.files {
            let path = rewrite_path(&key);
            match self.files.get_mut(&path) {
                Some(existing) => existing.merge(file),
                None => {
                    file.path = path.clone();
                    self.files.insert(path, file);
                }
            }
        }
    }

    pub fn insert(&mut self, path: impl Into<String>, file: FileCoverage) {
        self.files.insert(path.into(), file);
    }

    pub fn get(&self, path: &str) -> Option<&FileCoverage> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Per-file summaries sorted by path
    pub fn summaries(&self) -> Vec<FileSummary> {
        self.files
            .iter()
            .map(|(path, file)| FileSummary {
                path: path.clone(),
                statements: file.statements(),
                branches: file.branches(),
                functions: file.functions(),
            })
            .collect()
    }
}

/// Coverage of one file across the three source-level unit kinds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub path: String,
    pub statements: Summary,
    pub branches: Summary,
    pub functions: Summary,
}

/// Aggregate over all files
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SourceTotals {
    pub statements: Summary,
    pub branches: Summary,
    pub functions: Summary,
}

impl SourceTotals {
    pub fn from_summaries(summaries: &[FileSummary]) -> Self {
        let mut totals = Self::default();
        for file in summaries {
            totals.statements.add(file.statements);
            totals.branches.add(file.branches);
            totals.functions.add(file.functions);
        }
        totals
    }
}

/// Turn a container path (`/app/src/x.ts`) into a project-relative one
pub fn rewrite_path(container_path: &str) -> String {
    container_path
        .strip_prefix(CONTAINER_ROOT)
        .unwrap_or(container_path)
        .to_string()
}
