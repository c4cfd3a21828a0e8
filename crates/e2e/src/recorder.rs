//! Per-scenario coverage fragments
//!
//! Coverage from every browser session of a scenario is accumulated and
//! written once when the scenario ends, pass or fail. Fragments are named
//! `<sanitized-title>-<worker>.json`, so concurrent workers never write the
//! same file.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use creatorpipeline_coverage::{CoverageMap, FirstPartyFilter, ScriptCoverage};

use crate::config::E2eConfig;
use crate::error::E2eResult;
use crate::playwright::ScriptOutput;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[^a-z0-9]").expect("title pattern is valid"));

/// Lowercase the title and replace anything outside `[a-z0-9]` with `-`
pub fn sanitize_title(title: &str) -> String {
    UNSAFE_CHARS.replace_all(title, "-").to_lowercase()
}

pub fn fragment_name(title: &str, worker_index: usize) -> String {
    format!("{}-{}.json", sanitize_title(title), worker_index)
}

/// Coverage gathered so far for the running scenario
#[derive(Debug, Clone, Default)]
pub struct CapturedCoverage {
    scripts: Vec<ScriptCoverage>,
    source: Option<CoverageMap>,
}

impl CapturedCoverage {
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.source.as_ref().map(CoverageMap::is_empty).unwrap_or(true)
    }

    /// Take the coverage a browser session brought back
    pub fn absorb(&mut self, output: &mut ScriptOutput) {
        if let Some(entries) = output.js_coverage.take() {
            self.scripts.extend(entries);
        }

        match output.istanbul.take() {
            Some(Value::Object(files)) if !files.is_empty() => {
                match serde_json::from_value::<CoverageMap>(Value::Object(files)) {
                    Ok(map) => self.source.get_or_insert_with(CoverageMap::new).merge(map),
                    Err(e) => warn!("Ignoring unreadable instrumentation counters: {}", e),
                }
            }
            _ => {}
        }
    }
}

/// Files written for one scenario
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedFragments {
    pub v8: Option<PathBuf>,
    pub istanbul: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CoverageRecorder {
    filter: FirstPartyFilter,
    v8_dir: PathBuf,
    istanbul_dir: PathBuf,
}

impl CoverageRecorder {
    pub fn new(ui_host: &str, v8_dir: impl Into<PathBuf>, istanbul_dir: impl Into<PathBuf>) -> Self {
        Self {
            filter: FirstPartyFilter::new(ui_host),
            v8_dir: v8_dir.into(),
            istanbul_dir: istanbul_dir.into(),
        }
    }

    pub fn from_config(config: &E2eConfig) -> Self {
        Self::new(&config.playwright.ui_host(), config.v8_dir(), config.istanbul_dir())
    }

    /// Persist a scenario's coverage.
    ///
    /// Nothing is written when no first-party scripts were seen or no page
    /// carried instrumentation counters. A fragment left by an earlier
    /// attempt of the same scenario is then removed, so the files on disk
    /// always match the returned paths.
    pub fn record(&self, title: &str, worker_index: usize, captured: CapturedCoverage) -> E2eResult<RecordedFragments> {
        let name = fragment_name(title, worker_index);
        let mut recorded = RecordedFragments::default();

        let seen = captured.scripts.len();
        let first_party = self.filter.retain(captured.scripts);
        let path = self.v8_dir.join(&name);
        if first_party.is_empty() {
            debug!("No first-party scripts among {} entries for '{}'", seen, title);
            remove_stale(&path)?;
        } else {
            write_pretty(&path, &first_party)?;
            info!("Saved V8 coverage: {} ({} scripts)", path.display(), first_party.len());
            recorded.v8 = Some(path);
        }

        let path = self.istanbul_dir.join(&name);
        match captured.source {
            Some(map) if !map.is_empty() => {
                write_pretty(&path, &map)?;
                info!("Saved Istanbul coverage: {} ({} files)", path.display(), map.len());
                recorded.istanbul = Some(path);
            }
            _ => {
                debug!("No instrumentation counters for '{}'", title);
                remove_stale(&path)?;
            }
        }

        Ok(recorded)
    }
}

fn remove_stale(path: &Path) -> E2eResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale fragment {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> E2eResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("create a new pipeline via sidebar", "create-a-new-pipeline-via-sidebar" ; "spaces")]
    #[test_case("API health check", "api-health-check" ; "uppercase")]
    #[test_case("can't edit: Series #2", "can-t-edit--series--2" ; "punctuation")]
    fn test_sanitize_title(title: &str, expected: &str) {
        assert_eq!(sanitize_title(title), expected);
    }

    #[test]
    fn test_fragment_name_includes_worker() {
        assert_eq!(fragment_name("Smoke Tests", 3), "smoke-tests-3.json");
    }

    fn entry(url: &str) -> ScriptCoverage {
        serde_json::from_value(json!({"url": url, "functions": []})).unwrap()
    }

    fn recorder(dir: &Path) -> CoverageRecorder {
        CoverageRecorder::new("localhost:13000", dir.join("v8"), dir.join("istanbul"))
    }

    fn session(scripts: Vec<ScriptCoverage>, istanbul: Option<Value>) -> ScriptOutput {
        ScriptOutput {
            js_coverage: Some(scripts),
            istanbul,
            ..Default::default()
        }
    }

    #[test]
    fn test_records_first_party_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut captured = CapturedCoverage::default();
        captured.absorb(&mut session(
            vec![
                entry("http://localhost:13000/src/App.tsx"),
                entry("http://localhost:13000/node_modules/.vite/deps/react.js"),
                entry("http://localhost:13000/assets/chunk-ABC123.js"),
                entry("https://cdn.example.com/analytics.js"),
            ],
            None,
        ));

        let recorded = recorder(dir.path()).record("edit pipeline name", 0, captured).unwrap();
        let path = recorded.v8.unwrap();
        assert_eq!(path, dir.path().join("v8").join("edit-pipeline-name-0.json"));

        let saved: Vec<ScriptCoverage> =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].url, "http://localhost:13000/src/App.tsx");
        assert_eq!(recorded.istanbul, None);
    }

    #[test]
    fn test_sessions_accumulate_into_one_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let mut captured = CapturedCoverage::default();
        captured.absorb(&mut session(vec![entry("http://localhost:13000/src/App.tsx")], None));
        captured.absorb(&mut session(vec![entry("http://localhost:13000/src/main.tsx")], None));

        let recorded = recorder(dir.path()).record("smoke", 0, captured).unwrap();
        let saved: Vec<ScriptCoverage> =
            serde_json::from_str(&std::fs::read_to_string(recorded.v8.unwrap()).unwrap()).unwrap();
        assert_eq!(saved.len(), 2);
    }

    #[test]
    fn test_nothing_written_without_relevant_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut captured = CapturedCoverage::default();
        captured.absorb(&mut session(
            vec![entry("https://cdn.example.com/analytics.js")],
            Some(Value::Null),
        ));
        assert!(!captured.is_empty());

        let recorded = recorder(dir.path()).record("smoke", 0, captured).unwrap();
        assert_eq!(recorded, RecordedFragments::default());
        assert!(!dir.path().join("v8").exists());
        assert!(!dir.path().join("istanbul").exists());
    }

    #[test]
    fn test_empty_retry_removes_earlier_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder(dir.path());

        let mut first = CapturedCoverage::default();
        first.absorb(&mut ScriptOutput {
            js_coverage: Some(vec![entry("http://localhost:13000/src/App.tsx")]),
            istanbul: Some(json!({"/app/src/App.tsx": {"path": "/app/src/App.tsx", "s": {"0": 1}}})),
            ..Default::default()
        });
        let recorded = recorder.record("flaky scenario", 0, first).unwrap();
        let v8 = recorded.v8.unwrap();
        let istanbul = recorded.istanbul.unwrap();
        assert!(v8.is_file() && istanbul.is_file());

        let recorded = recorder.record("flaky scenario", 0, CapturedCoverage::default()).unwrap();
        assert_eq!(recorded, RecordedFragments::default());
        assert!(!v8.exists());
        assert!(!istanbul.exists());
    }

    #[test]
    fn test_records_istanbul_counters() {
        let dir = tempfile::tempdir().unwrap();
        let mut captured = CapturedCoverage::default();
        captured.absorb(&mut ScriptOutput {
            istanbul: Some(json!({"/app/src/main.tsx": {"path": "/app/src/main.tsx", "s": {"0": 1}}})),
            ..Default::default()
        });
        captured.absorb(&mut ScriptOutput {
            istanbul: Some(json!({"/app/src/main.tsx": {"path": "/app/src/main.tsx", "s": {"0": 0, "1": 2}}})),
            ..Default::default()
        });

        let recorded = recorder(dir.path()).record("smoke", 1, captured).unwrap();
        let path = recorded.istanbul.unwrap();
        assert_eq!(path, dir.path().join("istanbul").join("smoke-1.json"));
        assert_eq!(recorded.v8, None);

        let saved: CoverageMap = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        let file = saved.get("src/main.tsx").unwrap();
        assert_eq!(file.s["0"], 1);
        assert_eq!(file.s["1"], 2);
    }
}
