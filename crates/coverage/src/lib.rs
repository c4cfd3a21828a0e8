//! CreatorPipeline E2E coverage aggregation
//!
//! Test runs leave one coverage fragment per (test, worker) on disk. This
//! crate folds those fragments into merged records and renders them.
//!
//! ```text
//! coverage/
//!   v8/*.json          byte-range fragments   -> frontend/html/index.html
//!   istanbul/*.json    statement/branch/fn    -> frontend-istanbul/{coverage-final.json,html/}
//!   backend/jacoco.exec JaCoCo dump            -> backend/{jacoco.xml,html/,jacoco.csv}
//! ```
//!
//! Merging always takes the maximum hit count per unit across fragments.
//! The question answered is "was this reached by any test", so counts
//! are never summed.

pub mod error;
pub mod fragments;
pub mod istanbul;
pub mod jacoco;
pub mod render;
pub mod report;
pub mod summary;
pub mod v8;

pub use error::{CoverageError, CoverageResult};
pub use istanbul::{CoverageMap, FileCoverage};
pub use report::{CoverageLayout, ReportOutcome};
pub use summary::{percentage, Summary, Threshold};
pub use v8::{host_port, ByteCoverage, FirstPartyFilter, ScriptCoverage};
