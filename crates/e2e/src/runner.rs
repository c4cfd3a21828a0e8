//! Scenario runner
//!
//! Scenarios share one backing store, so they run strictly one at a time on
//! a single worker. Suites clean up through the API before and after.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, Pipeline};
use crate::config::E2eConfig;
use crate::error::{E2eError, E2eResult};
use crate::playwright::{CollectOptions, PlaywrightDriver, Script, ScriptOutput, SHUTDOWN_GRACE};
use crate::recorder::{sanitize_title, CapturedCoverage, CoverageRecorder, RecordedFragments};

/// A scenario body or suite hook
pub type ScenarioFn = for<'a> fn(&'a mut ScenarioContext) -> BoxFuture<'a, E2eResult<()>>;

pub struct Scenario {
    pub title: &'static str,
    pub run: ScenarioFn,
}

/// Scenarios plus the hooks around them
pub struct Suite {
    pub name: &'static str,
    pub before_all: Option<ScenarioFn>,
    pub before_each: Option<ScenarioFn>,
    pub after_all: Option<ScenarioFn>,
    pub scenarios: Vec<Scenario>,
}

impl Suite {
    pub fn full_title(&self, scenario: &Scenario) -> String {
        format!("{} › {}", self.name, scenario.title)
    }
}

/// Everything a scenario can reach: the API, the browser and suite state
pub struct ScenarioContext {
    pub api: ApiClient,
    pub config: E2eConfig,
    driver: PlaywrightDriver,
    collect: CollectOptions,
    title: String,
    /// 1 for the first try, 2 for the first retry
    attempt: u32,
    sessions: usize,
    /// Shared by every browser session of the running scenario
    deadline: Instant,
    coverage: CapturedCoverage,
    /// Pipeline created by a suite's `before_all`
    pub suite_pipeline: Option<Pipeline>,
}

impl ScenarioContext {
    pub fn new(config: E2eConfig, api: ApiClient, driver: PlaywrightDriver) -> Self {
        let collect = CollectOptions {
            js_coverage: config.coverage.collect_js,
            istanbul: config.coverage.collect_istanbul,
            ..Default::default()
        };
        Self {
            api,
            config,
            driver,
            collect,
            title: String::new(),
            attempt: 1,
            sessions: 0,
            deadline: Instant::now(),
            coverage: CapturedCoverage::default(),
            suite_pipeline: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The suite pipeline, or an error if `before_all` did not create one
    pub fn pipeline(&self) -> E2eResult<&Pipeline> {
        self.suite_pipeline
            .as_ref()
            .ok_or_else(|| E2eError::Assertion("suite pipeline was not created".to_string()))
    }

    fn budget(&self) -> Duration {
        Duration::from_millis(self.config.playwright.test_timeout_ms)
    }

    fn begin(&mut self, title: &str, attempt: u32) {
        self.title = title.to_string();
        self.attempt = attempt;
        self.sessions = 0;
        self.deadline = Instant::now() + self.budget();
        self.coverage = CapturedCoverage::default();
    }

    /// Traces and video are recorded on the first retry only
    fn session_collect(&self) -> CollectOptions {
        let first_retry = self.attempt == 2;
        CollectOptions {
            trace: first_retry && self.config.playwright.trace_on_first_retry,
            video: first_retry && self.config.playwright.video_on_first_retry,
            ..self.collect
        }
    }

    fn take_coverage(&mut self) -> CapturedCoverage {
        std::mem::take(&mut self.coverage)
    }

    /// Run one browser session built by `build`.
    ///
    /// The session gets whatever is left of the scenario's time budget.
    /// Coverage is kept even when a step fails or the budget runs out; the
    /// failure is then returned.
    pub async fn browse<F>(&mut self, build: F) -> E2eResult<ScriptOutput>
    where
        F: FnOnce(&mut Script),
    {
        let mut script = Script::new();
        build(&mut script);

        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(E2eError::Timeout(format!(
                "scenario '{}' after {:?}",
                self.title,
                self.budget()
            )));
        }

        self.sessions += 1;
        let name = format!("{}-{}", sanitize_title(&self.title), self.sessions);
        let mut output = self
            .driver
            .run(&name, &script, self.session_collect(), remaining)
            .await?;

        self.coverage.absorb(&mut output);
        output.check()?;
        Ok(output)
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub suite: String,
    pub name: String,
    pub success: bool,
    pub attempts: u32,
    pub duration_ms: u64,
    pub error: Option<String>,
    #[serde(default)]
    pub coverage: Vec<PathBuf>,
}

impl TestResult {
    /// Passed, but only after a retry
    pub fn is_flaky(&self) -> bool {
        self.success && self.attempts > 1
    }
}

/// Result of running all suites
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub flaky: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    fn from_results(started_at: DateTime<Utc>, results: Vec<TestResult>, duration_ms: u64) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            started_at,
            total: results.len(),
            passed,
            failed: results.len() - passed,
            flaky: results.iter().filter(|r| r.is_flaky()).count(),
            duration_ms,
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// JUnit XML, one `<testsuite>` per suite in run order
    pub fn to_junit(&self) -> E2eResult<String> {
        let mut report = Report::new("creatorpipeline-e2e");
        report.set_timestamp(self.started_at);
        report.set_time(Duration::from_millis(self.duration_ms));

        let mut suites: Vec<TestSuite> = Vec::new();
        let mut current: Option<&str> = None;
        for result in &self.results {
            if current != Some(result.suite.as_str()) {
                suites.push(TestSuite::new(result.suite.as_str()));
                current = Some(result.suite.as_str());
            }
            let status = if result.success {
                TestCaseStatus::success()
            } else {
                let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                if let Some(error) = &result.error {
                    status.set_message(error.as_str());
                }
                status
            };
            let mut case = TestCase::new(result.name.as_str(), status);
            case.set_classname(result.suite.as_str());
            case.set_time(Duration::from_millis(result.duration_ms));
            if let Some(suite) = suites.last_mut() {
                suite.add_test_case(case);
            }
        }
        report.add_test_suites(suites);

        Ok(report.to_string()?)
    }
}

/// Runs suites serially against the shared stack
pub struct TestRunner {
    config: E2eConfig,
    api: ApiClient,
    driver: PlaywrightDriver,
    recorder: CoverageRecorder,
}

impl TestRunner {
    pub fn new(config: E2eConfig) -> E2eResult<Self> {
        let api = ApiClient::new(&config.api)?;
        let driver = PlaywrightDriver::new(config.playwright.clone());
        let recorder = CoverageRecorder::from_config(&config);
        Ok(Self {
            config,
            api,
            driver,
            recorder,
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn driver(&self) -> &PlaywrightDriver {
        &self.driver
    }

    /// Run every suite; `grep` keeps scenarios whose full title contains it
    pub async fn run_suites(&self, suites: &[Suite], grep: Option<&str>) -> TestSuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let grep = grep.map(str::to_lowercase);
        let mut results = Vec::new();

        for suite in suites {
            let selected: Vec<&Scenario> = suite
                .scenarios
                .iter()
                .filter(|s| match &grep {
                    Some(g) => suite.full_title(s).to_lowercase().contains(g),
                    None => true,
                })
                .collect();

            if selected.is_empty() {
                debug!("Skipping suite '{}': nothing selected", suite.name);
                continue;
            }
            results.extend(self.run_suite(suite, &selected).await);
        }

        let summary = TestSuiteResult::from_results(started_at, results, start.elapsed().as_millis() as u64);
        info!(
            "Test Results: {} passed, {} failed, {} flaky ({} ms)",
            summary.passed, summary.failed, summary.flaky, summary.duration_ms
        );
        summary
    }

    async fn run_suite(&self, suite: &Suite, scenarios: &[&Scenario]) -> Vec<TestResult> {
        info!("Running suite '{}' ({} scenario(s))", suite.name, scenarios.len());
        let mut ctx = ScenarioContext::new(self.config.clone(), self.api.clone(), self.driver.clone());
        let mut results = Vec::with_capacity(scenarios.len());

        if let Some(hook) = suite.before_all {
            ctx.begin(&format!("{} before all", suite.name), 1);
            if let Err(e) = hook(&mut ctx).await {
                error!("✗ {} - beforeAll hook failed: {}", suite.name, e);
                for scenario in scenarios {
                    results.push(TestResult {
                        suite: suite.name.to_string(),
                        name: scenario.title.to_string(),
                        success: false,
                        attempts: 0,
                        duration_ms: 0,
                        error: Some(format!("beforeAll hook failed: {}", e)),
                        coverage: Vec::new(),
                    });
                }
                self.run_after_all(suite, &mut ctx).await;
                return results;
            }
        }

        for scenario in scenarios {
            let result = self.run_scenario(suite, scenario, &mut ctx).await;
            if result.success {
                info!("✓ {} ({} ms)", suite.full_title(scenario), result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    suite.full_title(scenario),
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        self.run_after_all(suite, &mut ctx).await;
        results
    }

    async fn run_after_all(&self, suite: &Suite, ctx: &mut ScenarioContext) {
        if let Some(hook) = suite.after_all {
            ctx.begin(&format!("{} after all", suite.name), 1);
            if let Err(e) = hook(ctx).await {
                warn!("afterAll hook of '{}' failed: {}", suite.name, e);
            }
        }
    }

    async fn run_scenario(&self, suite: &Suite, scenario: &Scenario, ctx: &mut ScenarioContext) -> TestResult {
        let start = Instant::now();
        let max_attempts = self.config.runner.retries + 1;
        let mut attempts = 0;
        let mut last_error = None;
        let mut coverage = Vec::new();

        while attempts < max_attempts {
            attempts += 1;
            if attempts > 1 {
                warn!("Retrying '{}' (attempt {}/{})", scenario.title, attempts, max_attempts);
            }

            ctx.begin(scenario.title, attempts);
            let outcome = self.attempt(suite, scenario, ctx).await;

            // Fragments are overwritten per attempt; an attempt that saw no
            // coverage leaves none behind

            let captured = ctx.take_coverage();
            match self.recorder.record(scenario.title, self.config.runner.worker_index, captured) {
                Ok(RecordedFragments { v8, istanbul }) => {
                    coverage = v8.into_iter().chain(istanbul).collect();
                }
                Err(e) => warn!("Could not save coverage for '{}': {}", scenario.title, e),
            }

            match outcome {
                Ok(()) => {
                    last_error = None;
                    break;
                }
                Err(e) => last_error = Some(e.to_string()),
            }
        }

        TestResult {
            suite: suite.name.to_string(),
            name: scenario.title.to_string(),
            success: last_error.is_none(),
            attempts,
            duration_ms: start.elapsed().as_millis() as u64,
            error: last_error,
            coverage,
        }
    }

    /// One try at a scenario, bounded by the scenario budget plus the
    /// shutdown grace a browser session gets to report its coverage
    async fn attempt(&self, suite: &Suite, scenario: &Scenario, ctx: &mut ScenarioContext) -> E2eResult<()> {
        let limit = ctx.budget() + SHUTDOWN_GRACE;
        let run = async {
            if let Some(hook) = suite.before_each {
                hook(ctx).await?;
            }
            (scenario.run)(ctx).await
        };
        tokio::time::timeout(limit, run)
            .await
            .map_err(|_| E2eError::Timeout(format!("scenario '{}' after {:?}", scenario.title, limit)))?
    }

    /// Write results to `test-results.json` in the output directory, plus
    /// `junit.xml` when JUnit output is enabled
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        let dir = &self.config.runner.output_dir;
        std::fs::create_dir_all(dir)?;

        let path = dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;
        info!("Results written to: {}", path.display());

        if self.config.runner.junit {
            let junit = dir.join("junit.xml");
            std::fs::write(&junit, results.to_junit()?)?;
            info!("JUnit report written to: {}", junit.display());
        }
        Ok(path)
    }
}
