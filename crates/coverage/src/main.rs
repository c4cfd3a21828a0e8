//! cp-coverage - render E2E coverage reports
//!
//! Every subcommand reads from fixed directories under the coverage root
//! and exits 1 when there is no coverage data to report.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use creatorpipeline_coverage::jacoco::JacocoReportConfig;
use creatorpipeline_coverage::report::{self, CoverageLayout, ReportOutcome};

#[derive(Parser)]
#[command(name = "cp-coverage")]
#[command(about = "Merge and render CreatorPipeline E2E coverage")]
#[command(version)]
struct Cli {
    /// Coverage root directory
    #[arg(long, global = true, default_value = "coverage")]
    coverage_dir: PathBuf,

    /// UI origin stripped from script URLs
    #[arg(long, global = true, env = "BASE_URL", default_value = "http://localhost:13000")]
    origin: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// HTML report from V8 byte coverage
    Frontend,

    /// Merge Istanbul fragments and render an HTML report
    Istanbul,

    /// Combined frontend + backend console report
    Report {
        /// API project checkout (for compiled classes and sources)
        #[arg(long, default_value = "../creatorpipeline-api")]
        api_dir: PathBuf,

        /// API container holding jacococli.jar
        #[arg(long, default_value = "e2e-creatorpipeline-api")]
        api_container: String,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let layout = CoverageLayout::new(cli.coverage_dir);

    let outcome = match cli.command {
        Command::Frontend => report::frontend_report(&layout, &cli.origin)?,
        Command::Istanbul => report::istanbul_report(&layout)?,
        Command::Report {
            api_dir,
            api_container,
        } => {
            let jacoco = JacocoReportConfig {
                container: api_container,
                ..JacocoReportConfig::new(&layout.backend_dir(), &api_dir)
            };
            let combined = report::combined_report(&layout, &cli.origin, &jacoco)?;
            if combined.has_data() {
                ReportOutcome::Written(layout.root.clone())
            } else {
                ReportOutcome::NoData("No coverage data found.".to_string())
            }
        }
    };

    if let ReportOutcome::NoData(message) = &outcome {
        println!("{}", message);
    }
    Ok(ExitCode::from(outcome.exit_code()))
}
