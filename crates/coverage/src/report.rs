//! Report commands: frontend (V8), Istanbul and the combined console report

use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{CoverageError, CoverageResult};
use crate::fragments::{fragment_files, load_fragments};
use crate::istanbul::{CoverageMap, SourceTotals};
use crate::jacoco::{backend_coverage, BackendCoverage, JacocoReportConfig};
use crate::render::{console, html};
use crate::summary::{combined_percentage, Summary};
use crate::v8::{ByteCoverage, FirstPartyFilter, ScriptCoverage};

const RULE_WIDTH: usize = 60;

/// Fixed directory layout under the coverage root
#[derive(Debug, Clone)]
pub struct CoverageLayout {
    pub root: PathBuf,
}

impl Default for CoverageLayout {
    fn default() -> Self {
        Self::new("coverage")
    }
}

impl CoverageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Byte-coverage fragments
    pub fn v8_dir(&self) -> PathBuf {
        self.root.join("v8")
    }

    /// Istanbul fragments
    pub fn istanbul_dir(&self) -> PathBuf {
        self.root.join("istanbul")
    }

    /// JaCoCo dump and backend reports
    pub fn backend_dir(&self) -> PathBuf {
        self.root.join("backend")
    }

    pub fn frontend_html(&self) -> PathBuf {
        self.root.join("frontend").join("html").join("index.html")
    }

    pub fn istanbul_output_dir(&self) -> PathBuf {
        self.root.join("frontend-istanbul")
    }

    pub fn merged_istanbul_json(&self) -> PathBuf {
        self.istanbul_output_dir().join("coverage-final.json")
    }

    pub fn istanbul_html(&self) -> PathBuf {
        self.istanbul_output_dir().join("html").join("index.html")
    }
}

/// What a report command produced
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Written(PathBuf),
    /// Nothing to report; the message explains what was missing
    NoData(String),
}

impl ReportOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            ReportOutcome::Written(_) => 0,
            ReportOutcome::NoData(_) => 1,
        }
    }
}

fn write_file(path: &Path, contents: &str) -> CoverageResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

/// Fold every V8 fragment in `dir` into per-URL byte coverage.
///
/// Entries not served from `origin_prefix` are dropped again here, so
/// fragments recorded against another UI origin never leak into the report.
pub fn collect_byte_coverage(dir: &Path, origin_prefix: &str) -> CoverageResult<ByteCoverage> {
    let filter = FirstPartyFilter::for_base_url(origin_prefix);
    let mut coverage = ByteCoverage::new();
    for fragment in load_fragments::<Vec<ScriptCoverage>>(dir)? {
        let total = fragment.data.len();
        let kept = filter.retain(fragment.data);
        if kept.len() < total {
            debug!(
                "Dropped {} third-party entries from {}",
                total - kept.len(),
                fragment.path.display()
            );
        }
        coverage.fold_fragment(&kept, origin_prefix);
    }
    Ok(coverage)
}

/// Merge every Istanbul fragment in `dir`
pub fn collect_source_coverage(dir: &Path) -> CoverageResult<CoverageMap> {
    let mut merged = CoverageMap::new();
    for fragment in load_fragments::<CoverageMap>(dir)? {
        merged.merge(fragment.data);
    }
    Ok(merged)
}

fn has_fragments(dir: &Path) -> CoverageResult<bool> {
    match fragment_files(dir) {
        Ok(files) => Ok(!files.is_empty()),
        Err(CoverageError::MissingDirectory(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Render the byte-coverage HTML report
pub fn frontend_report(layout: &CoverageLayout, origin_prefix: &str) -> CoverageResult<ReportOutcome> {
    let dir = layout.v8_dir();
    if !dir.is_dir() {
        return Ok(ReportOutcome::NoData("No V8 coverage data found. Run tests first.".to_string()));
    }
    if !has_fragments(&dir)? {
        return Ok(ReportOutcome::NoData("No V8 coverage files found.".to_string()));
    }

    info!("Generating frontend coverage report...");
    let coverage = collect_byte_coverage(&dir, origin_prefix)?;
    let html = html::render_v8_report(&coverage, Utc::now());

    let output = layout.frontend_html();
    write_file(&output, &html)?;
    println!("Frontend HTML report: {}", output.display());
    Ok(ReportOutcome::Written(output))
}

/// Merge Istanbul fragments, persist the merged JSON and render HTML
pub fn istanbul_report(layout: &CoverageLayout) -> CoverageResult<ReportOutcome> {
    let dir = layout.istanbul_dir();
    if !dir.is_dir() {
        return Ok(ReportOutcome::NoData(
            "No Istanbul coverage data found. Build the UI with VITE_COVERAGE=true and run tests first."
                .to_string(),
        ));
    }

    let files = fragment_files(&dir)?;
    if files.is_empty() {
        return Ok(ReportOutcome::NoData(
            "No Istanbul coverage files found. Is the UI build instrumented?".to_string(),
        ));
    }

    info!("Processing {} Istanbul coverage file(s)", files.len());
    let merged = collect_source_coverage(&dir)?;
    if merged.is_empty() {
        return Ok(ReportOutcome::NoData("No valid coverage data found in files.".to_string()));
    }

    let summaries = merged.summaries();
    let totals = SourceTotals::from_summaries(&summaries);

    println!("Coverage Summary by File:");
    println!("{}", console::source_table(&summaries, &totals));
    println!(
        "\n{} TypeScript files, {}/{} statements covered\n",
        summaries.len(),
        totals.statements.covered,
        totals.statements.total
    );

    write_file(
        &layout.merged_istanbul_json(),
        &serde_json::to_string_pretty(&merged)?,
    )?;

    let output = layout.istanbul_html();
    write_file(&output, &html::render_istanbul_report(&summaries, &totals, Utc::now()))?;
    println!("Istanbul HTML report: {}", output.display());
    Ok(ReportOutcome::Written(output))
}

/// Numbers behind the combined console report
#[derive(Debug, Clone)]
pub struct CombinedReport {
    pub frontend: Option<Summary>,
    pub backend: BackendCoverage,
}

impl CombinedReport {
    pub fn frontend_pct(&self) -> Option<f64> {
        self.frontend.filter(|s| !s.is_empty()).map(|s| s.pct())
    }

    pub fn backend_pct(&self) -> Option<f64> {
        self.backend.lines().map(|s| s.pct())
    }

    /// Mean of the two sides, only when both have data
    pub fn combined_pct(&self) -> Option<f64> {
        combined_percentage(self.frontend_pct(), self.backend_pct())
    }

    pub fn has_data(&self) -> bool {
        self.frontend.is_some() || !matches!(self.backend, BackendCoverage::Missing { .. })
    }
}

fn format_pct(pct: Option<f64>) -> String {
    match pct {
        Some(pct) => format!("{:>6.1}%", pct),
        None => format!("{:>6}%", "N/A"),
    }
}

fn print_frontend_section(dir: &Path, origin_prefix: &str) -> CoverageResult<Option<Summary>> {
    if !has_fragments(dir)? {
        println!("FRONTEND: No coverage data found\n");
        return Ok(None);
    }

    println!("FRONTEND (V8 Coverage)");
    println!("{}", console::rule('─', RULE_WIDTH));

    let coverage = collect_byte_coverage(dir, origin_prefix)?;
    for (url, summary) in coverage.rows() {
        println!("{}", console::bar_line(summary.pct(), url));
    }

    let total = coverage.total();
    println!("{}", console::rule('─', RULE_WIDTH));
    println!(
        "Frontend Total: {} of {:.0} KB\n",
        console::colored_pct(total.pct()),
        total.total as f64 / 1024.0
    );
    Ok(Some(total))
}

fn print_backend_section(config: &JacocoReportConfig) -> BackendCoverage {
    let backend = backend_coverage(config);
    match &backend {
        BackendCoverage::Missing { expected } => {
            println!("BACKEND: No coverage data found");
            println!("   Expected: {}\n", expected.display());
        }
        BackendCoverage::Unavailable { reason, raw } => {
            println!("BACKEND (JaCoCo Coverage)");
            println!("{}", console::rule('─', RULE_WIDTH));
            println!("Could not generate JaCoCo report: {}", reason);
            println!("   Raw coverage data: {}\n", raw.display());
        }
        BackendCoverage::Report { coverage, html_index } => {
            println!("BACKEND (JaCoCo Coverage)");
            println!("{}", console::rule('─', RULE_WIDTH));
            for package in &coverage.packages {
                println!("{}", console::bar_line(package.lines.pct(), &package.name));
            }
            println!("{}", console::rule('─', RULE_WIDTH));
            println!(
                "Backend Total: {} ({}/{} lines)",
                console::colored_pct(coverage.lines.pct()),
                coverage.lines.covered,
                coverage.lines.total
            );
            println!("HTML Report: {}\n", html_index.display());
        }
    }
    backend
}

/// Print frontend, backend and combined coverage to the console
pub fn combined_report(
    layout: &CoverageLayout,
    origin_prefix: &str,
    jacoco: &JacocoReportConfig,
) -> CoverageResult<CombinedReport> {
    println!("\n{}", console::rule('═', RULE_WIDTH));
    println!("  E2E Coverage Report");
    println!("{}\n", console::rule('═', RULE_WIDTH));

    let frontend = print_frontend_section(&layout.v8_dir(), origin_prefix)?;
    let backend = print_backend_section(jacoco);
    let report = CombinedReport { frontend, backend };

    println!("{}", console::rule('═', RULE_WIDTH));
    println!("  COMBINED SUMMARY");
    println!("{}", console::rule('═', RULE_WIDTH));
    println!("\n  Frontend:  {}", format_pct(report.frontend_pct()));
    println!("  Backend:   {}", format_pct(report.backend_pct()));
    if let Some(combined) = report.combined_pct() {
        println!("  {}", console::rule('─', 17));
        println!("  Combined:  {}", format_pct(Some(combined)));
    }
    println!("\n{}\n", console::rule('═', RULE_WIDTH));

    if !report.has_data() {
        warn!("No frontend or backend coverage data found");
    }
    Ok(report)
}

