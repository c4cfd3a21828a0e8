//! Backend line coverage from JaCoCo
//!
//! The API container runs with the JaCoCo agent. Its `jacoco.exec` dump is
//! turned into XML/HTML/CSV by `jacococli.jar report`, and the XML `LINE`
//! counters are read back with pattern matching.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

use crate::error::{CoverageError, CoverageResult};
use crate::summary::Summary;

static LINE_COUNTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<counter type="LINE" missed="(\d+)" covered="(\d+)"\s*/>"#)
        .expect("LINE counter pattern is valid")
});

static PACKAGE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<package name="([^"]+)"[^>]*>(.*?)</package>"#)
        .expect("package pattern is valid")
});

/// Line coverage of one Java package
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageCoverage {
    pub name: String,
    pub lines: Summary,
}

/// Line coverage read from a JaCoCo XML report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JacocoCoverage {
    pub lines: Summary,
    pub packages: Vec<PackageCoverage>,
}

fn last_line_counter(text: &str) -> Option<Summary> {
    LINE_COUNTER.captures_iter(text).last().and_then(|caps| {
        let missed: u64 = caps[1].parse().ok()?;
        let covered: u64 = caps[2].parse().ok()?;
        Some(Summary::new(covered, missed + covered))
    })
}

/// Extract report-level and per-package `LINE` counters.
///
/// JaCoCo writes a node's own counters after its children, so the last
/// `LINE` counter inside a package block is the package total and the last
/// one in the document is the report total.
pub fn parse_jacoco_xml(xml: &str) -> JacocoCoverage {
    let packages = PACKAGE_BLOCK
        .captures_iter(xml)
        .filter_map(|caps| {
            let lines = last_line_counter(&caps[2])?;
            Some(PackageCoverage {
                name: caps[1].replace('/', "."),
                lines,
            })
        })
        .collect();

    JacocoCoverage {
        lines: last_line_counter(xml).unwrap_or_default(),
        packages,
    }
}

/// Where the JaCoCo inputs live and where reports go
#[derive(Debug, Clone)]
pub struct JacocoReportConfig {
    /// Raw dump harvested from the API container
    pub exec_file: PathBuf,
    /// Compiled API classes
    pub classes_dir: PathBuf,
    /// API sources, for the HTML drill-down
    pub sources_dir: PathBuf,
    /// Local copy of the reporting tool
    pub cli_jar: PathBuf,
    /// Container to copy the tool from when no local copy exists
    pub container: String,
    pub container_cli_jar: String,
    pub docker: String,
    pub java: String,
    pub xml_file: PathBuf,
    pub html_dir: PathBuf,
    pub csv_file: PathBuf,
}

impl JacocoReportConfig {
    /// Standard layout: dumps under `backend_dir`, API checkout at `api_dir`
    pub fn new(backend_dir: &Path, api_dir: &Path) -> Self {
        Self {
            exec_file: backend_dir.join("jacoco.exec"),
            classes_dir: api_dir.join("build").join("classes").join("java").join("main"),
            sources_dir: api_dir.join("src").join("main").join("java"),
            cli_jar: PathBuf::from("/tmp/jacococli.jar"),
            container: "e2e-creatorpipeline-api".to_string(),
            container_cli_jar: "/jacoco/jacococli.jar".to_string(),
            docker: "docker".to_string(),
            java: "java".to_string(),
            xml_file: backend_dir.join("jacoco.xml"),
            html_dir: backend_dir.join("html"),
            csv_file: backend_dir.join("jacoco.csv"),
        }
    }

    pub fn html_index(&self) -> PathBuf {
        self.html_dir.join("index.html")
    }
}

/// Outcome of backend reporting. Missing prerequisites are not errors.
#[derive(Debug, Clone)]
pub enum BackendCoverage {
    /// No dump was harvested
    Missing { expected: PathBuf },
    /// A dump exists but no report could be produced from it
    Unavailable { reason: String, raw: PathBuf },
    Report {
        coverage: JacocoCoverage,
        html_index: PathBuf,
    },
}

impl BackendCoverage {
    pub fn lines(&self) -> Option<Summary> {
        match self {
            BackendCoverage::Report { coverage, .. } if !coverage.lines.is_empty() => {
                Some(coverage.lines)
            }
            _ => None,
        }
    }
}

/// Copy `jacococli.jar` out of the API container unless a local copy exists
pub fn ensure_cli_jar(config: &JacocoReportConfig) -> bool {
    if config.cli_jar.exists() {
        return true;
    }

    let source = format!("{}:{}", config.container, config.container_cli_jar);
    debug!("Copying {} to {}", source, config.cli_jar.display());
    match Command::new(&config.docker)
        .arg("cp")
        .arg(&source)
        .arg(&config.cli_jar)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => config.cli_jar.exists(),
        Ok(status) => {
            debug!("docker cp exited with {}", status);
            false
        }
        Err(e) => {
            debug!("docker cp failed: {}", e);
            false
        }
    }
}

/// Run `jacococli.jar report` producing XML, HTML and CSV
pub fn render_report(config: &JacocoReportConfig) -> CoverageResult<()> {
    let output = Command::new(&config.java)
        .arg("-jar")
        .arg(&config.cli_jar)
        .arg("report")
        .arg(&config.exec_file)
        .arg("--classfiles")
        .arg(&config.classes_dir)
        .arg("--sourcefiles")
        .arg(&config.sources_dir)
        .arg("--xml")
        .arg(&config.xml_file)
        .arg("--html")
        .arg(&config.html_dir)
        .arg("--csv")
        .arg(&config.csv_file)
        .output()?;

    if !output.status.success() {
        return Err(CoverageError::Jacoco(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(())
}

/// Produce backend coverage, degrading to a warning when prerequisites are missing
pub fn backend_coverage(config: &JacocoReportConfig) -> BackendCoverage {
    if !config.exec_file.exists() {
        return BackendCoverage::Missing {
            expected: config.exec_file.clone(),
        };
    }

    let unavailable = |reason: String| BackendCoverage::Unavailable {
        reason,
        raw: config.exec_file.clone(),
    };

    if !config.classes_dir.is_dir() {
        warn!("API class files not found at {}", config.classes_dir.display());
        return unavailable(format!(
            "API class files not found at {} (build the API classes first)",
            config.classes_dir.display()
        ));
    }

    if !ensure_cli_jar(config) {
        warn!("jacococli.jar not found - cannot generate report");
        return unavailable("jacococli.jar not found".to_string());
    }

    if let Err(e) = render_report(config) {
        warn!("Could not generate JaCoCo report: {}", e);
        return unavailable(e.to_string());
    }

    match std::fs::read_to_string(&config.xml_file) {
        Ok(xml) => {
            let coverage = parse_jacoco_xml(&xml);
            info!(
                "Backend line coverage: {}/{}",
                coverage.lines.covered, coverage.lines.total
            );
            BackendCoverage::Report {
                coverage,
                html_index: config.html_index(),
            }
        }
        Err(e) => unavailable(format!("could not read {}: {}", config.xml_file.display(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<report name="creatorpipeline-api">
  <package name="com/creatorpipeline/api/pipeline">
    <class name="com/creatorpipeline/api/pipeline/PipelineService">
      <method name="create" desc="()V" line="12">
        <counter type="LINE" missed="1" covered="4"/>
      </method>
      <counter type="LINE" missed="2" covered="8"/>
    </class>
    <counter type="LINE" missed="2" covered="8"/>
  </package>
  <package name="com/creatorpipeline/api/series">
    <counter type="LINE" missed="10" covered="0"/>
  </package>
  <counter type="INSTRUCTION" missed="40" covered="60"/>
  <counter type="LINE" missed="12" covered="8"/>
</report>"#;

    #[test]
    fn test_parse_totals_and_packages() {
        let coverage = parse_jacoco_xml(REPORT);
        assert_eq!(coverage.lines, Summary { covered: 8, total: 20 });
        assert_eq!(coverage.packages.len(), 2);
        assert_eq!(coverage.packages[0].name, "com.creatorpipeline.api.pipeline");
        assert_eq!(coverage.packages[0].lines, Summary { covered: 8, total: 10 });
        assert_eq!(coverage.packages[1].lines.pct(), 0.0);
    }

    #[test]
    fn test_parse_empty_document() {
        let coverage = parse_jacoco_xml("<report/>");
        assert!(coverage.lines.is_empty());
        assert!(coverage.packages.is_empty());
    }

    #[test]
    fn test_missing_exec_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = JacocoReportConfig::new(dir.path(), &dir.path().join("api"));
        assert!(matches!(backend_coverage(&config), BackendCoverage::Missing { .. }));
    }

    #[test]
    fn test_missing_classes_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let config = JacocoReportConfig::new(dir.path(), &dir.path().join("api"));
        std::fs::write(&config.exec_file, b"raw").unwrap();

        match backend_coverage(&config) {
            BackendCoverage::Unavailable { raw, reason } => {
                assert_eq!(raw, config.exec_file);
                assert!(reason.contains("class files"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
