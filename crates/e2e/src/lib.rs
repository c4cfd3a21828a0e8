//! CreatorPipeline E2E Test Framework
//!
//! This crate drives a real browser against the CreatorPipeline stack and
//! cross-checks what the UI did through the REST API:
//! - Brings the compose stack up, polls the API health endpoint, tears down
//! - Generates Playwright scripts from page objects and runs them with Node
//! - Records V8 and Istanbul coverage per scenario
//! - Harvests JaCoCo coverage from the API container before shutdown
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Environment                                                │
//! │    ├── setup()    build, up -d, wait_for_api()              │
//! │    └── teardown() jacoco dump/copy/report, down -v          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner (serial, one worker)                            │
//! │    ├── Suite { before_all, before_each, after_all }         │
//! │    └── Scenario -> ScenarioContext                          │
//! │          ├── api: ApiClient          seed / verify / clean  │
//! │          └── browse(|script| ...)    pages -> Step -> JS    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CoverageRecorder                                           │
//! │    └── coverage/{v8,istanbul}/<title>-<worker>.json         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod compose;
pub mod config;
pub mod environment;
pub mod error;
pub mod locator;
pub mod pages;
pub mod playwright;
pub mod recorder;
pub mod runner;
pub mod scenarios;
pub mod step;

pub use api::{wait_for_api, ApiClient};
pub use config::E2eConfig;
pub use environment::{Environment, HarvestReport, LifecycleState};
pub use error::{E2eError, E2eResult};
pub use playwright::{PlaywrightDriver, Script, ScriptOutput};
pub use runner::{TestResult, TestRunner, TestSuiteResult};
