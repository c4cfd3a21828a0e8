//! Engine-level byte-range coverage
//!
//! A V8 fragment is the JSON array Playwright returns from
//! `page.coverage.stopJSCoverage()`, filtered down to first-party scripts.
//! Fragments are folded per URL by taking the maximum total and covered
//! byte counts, so the same static bundle seen by many tests is counted once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::{Position, Url};

use crate::summary::Summary;

/// Coverage of one served script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptCoverage {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default)]
    pub functions: Vec<FunctionCoverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCoverage {
    #[serde(default)]
    pub function_name: String,

    #[serde(default)]
    pub ranges: Vec<CoverageRange>,

    #[serde(default)]
    pub is_block_coverage: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRange {
    pub start_offset: u64,
    pub end_offset: u64,
    pub count: u64,
}

impl CoverageRange {
    pub fn size(&self) -> u64 {
        self.end_offset.saturating_sub(self.start_offset)
    }
}

impl ScriptCoverage {
    /// Byte totals for this entry: every range counts toward `total`,
    /// ranges with a non-zero hit count also count toward `covered`.
    pub fn byte_summary(&self) -> Summary {
        let mut summary = Summary::default();
        for range in self.functions.iter().flat_map(|f| f.ranges.iter()) {
            let size = range.size();
            summary.total += size;
            if range.count > 0 {
                summary.covered += size;
            }
        }
        summary
    }
}

/// Rules deciding which served scripts belong to the application
#[derive(Debug, Clone)]
pub struct FirstPartyFilter {
    /// `host:port` the UI is served from
    pub origin: String,
    pub excluded_fragments: Vec<String>,
    pub extensions: Vec<String>,
}

impl FirstPartyFilter {
    /// `origin` is the `host:port` pair, as produced by [`host_port`]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            excluded_fragments: vec!["node_modules".to_string(), "chunk-".to_string()],
            extensions: vec![".js".to_string(), ".tsx".to_string(), ".ts".to_string()],
        }
    }

    /// Build a filter from a UI base URL such as `http://localhost:13000`
    pub fn for_base_url(base_url: &str) -> Self {
        Self::new(host_port(base_url).unwrap_or_else(|| base_url.to_string()))
    }

    pub fn accepts(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let path = parsed.path();
        host_port_of(&parsed).as_deref() == Some(self.origin.as_str())
            && !self.excluded_fragments.iter().any(|f| path.contains(f.as_str()))
            && self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    /// Keep only the entries served from the application's own origin
    pub fn retain(&self, entries: Vec<ScriptCoverage>) -> Vec<ScriptCoverage> {
        entries.into_iter().filter(|e| self.accepts(&e.url)).collect()
    }
}

/// Per-URL byte coverage folded across fragments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ByteCoverage {
    urls: BTreeMap<String, Summary>,
}

impl ByteCoverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a single entry. Totals and covered counts are maxed, never summed.
    pub fn fold_entry(&mut self, key: String, entry: &ScriptCoverage) {
        let summary = entry.byte_summary();
        if summary.total == 0 {
            return;
        }
        let slot = self.urls.entry(key).or_default();
        slot.total = slot.total.max(summary.total);
        slot.covered = slot.covered.max(summary.covered);
    }

    /// Fold a whole fragment, keying entries by their URL with `origin_prefix` stripped
    pub fn fold_fragment(&mut self, entries: &[ScriptCoverage], origin_prefix: &str) {
        for entry in entries {
            self.fold_entry(short_url(&entry.url, origin_prefix), entry);
        }
    }

    /// Rows sorted by URL
    pub fn rows(&self) -> impl Iterator<Item = (&str, Summary)> {
        self.urls.iter().map(|(url, summary)| (url.as_str(), *summary))
    }

    pub fn get(&self, url: &str) -> Option<Summary> {
        self.urls.get(url).copied()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Sum of the per-URL maxima
    pub fn total(&self) -> Summary {
        let mut total = Summary::default();
        for summary in self.urls.values() {
            total.add(*summary);
        }
        total
    }
}

/// `host:port` of a URL, with the scheme's default port filled in
pub fn host_port(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(host_port_of)
}

fn host_port_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Strip the UI origin from a script URL, keeping path and query.
/// URLs from any other origin are returned unchanged.
pub fn short_url(url: &str, origin_prefix: &str) -> String {
    match (Url::parse(url), Url::parse(origin_prefix)) {
        (Ok(script), Ok(origin)) if script.origin() == origin.origin() => {
            script[Position::BeforePath..].to_string()
        }
        _ => url.to_string(),
    }
}
