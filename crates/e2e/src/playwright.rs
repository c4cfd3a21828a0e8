//! Playwright browser automation
//!
//! Each scenario's UI phase becomes one generated Node script. The script
//! opens a fresh browser, brackets the steps with coverage collection and
//! writes a JSON result (outputs, console errors, coverage) whatever the
//! outcome of the steps. The time budget is enforced inside the script, so a
//! slow session still reports the coverage it gathered.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

use creatorpipeline_coverage::ScriptCoverage;

use crate::config::PlaywrightConfig;
use crate::error::{E2eError, E2eResult};
use crate::locator::{js_string, Locator, TextMatch};
use crate::step::{Assertion, CaptureKind, LoadState, Step, WaitState};

/// Ordered list of steps for one browser session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn push(&mut self, step: Step) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn goto(&mut self, path: &str) -> &mut Self {
        self.push(Step::Goto {
            path: path.to_string(),
        })
    }

    pub fn wait_for_load(&mut self, state: LoadState) -> &mut Self {
        self.push(Step::WaitForLoadState {
            state,
            timeout_ms: None,
        })
    }

    pub fn wait_for(&mut self, locator: &Locator, state: WaitState, timeout_ms: Option<u64>) -> &mut Self {
        self.push(Step::WaitFor {
            locator: locator.clone(),
            state,
            timeout_ms,
        })
    }

    pub fn click(&mut self, locator: &Locator) -> &mut Self {
        self.push(Step::Click {
            locator: locator.clone(),
        })
    }

    pub fn hover(&mut self, locator: &Locator) -> &mut Self {
        self.push(Step::Hover {
            locator: locator.clone(),
        })
    }

    pub fn fill(&mut self, locator: &Locator, value: &str) -> &mut Self {
        self.push(Step::Fill {
            locator: locator.clone(),
            value: value.to_string(),
        })
    }

    pub fn clear(&mut self, locator: &Locator) -> &mut Self {
        self.push(Step::Clear {
            locator: locator.clone(),
        })
    }

    pub fn expect(&mut self, locator: &Locator, assertion: Assertion) -> &mut Self {
        self.push(Step::Expect {
            locator: locator.clone(),
            assertion,
        })
    }

    pub fn expect_visible(&mut self, locator: &Locator) -> &mut Self {
        self.expect(locator, Assertion::Visible)
    }

    pub fn expect_not_visible(&mut self, locator: &Locator) -> &mut Self {
        self.expect(locator, Assertion::NotVisible)
    }

    pub fn expect_url(&mut self, pattern: TextMatch) -> &mut Self {
        self.push(Step::ExpectUrl { pattern })
    }

    pub fn capture(&mut self, name: &str, locator: &Locator, kind: CaptureKind) -> &mut Self {
        self.push(Step::Capture {
            name: name.to_string(),
            locator: locator.clone(),
            kind,
        })
    }
}

/// Extra time a script gets past its budget to stop coverage and close the
/// browser before the process is killed
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// What a run should bring back besides its outputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectOptions {
    pub js_coverage: bool,
    pub istanbul: bool,
    /// Playwright trace of the session
    pub trace: bool,
    /// Video of the session
    pub video: bool,
}

/// Where a session leaves files behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFiles {
    /// Full-page screenshot taken when a step fails
    pub screenshot: Option<PathBuf>,
    /// Directory for the trace archive and video
    pub artifacts: Option<PathBuf>,
}

/// Result file written by the generated script
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptOutput {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub outputs: Map<String, Value>,
    #[serde(default)]
    pub console_errors: Vec<String>,
    #[serde(default)]
    pub js_coverage: Option<Vec<ScriptCoverage>>,
    #[serde(default)]
    pub istanbul: Option<Value>,
    #[serde(default)]
    pub screenshot: Option<PathBuf>,
    #[serde(default)]
    pub trace: Option<PathBuf>,
    #[serde(default)]
    pub video: Option<PathBuf>,
}

impl ScriptOutput {
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    pub fn output_str(&self, name: &str) -> Option<&str> {
        self.output(name).and_then(Value::as_str)
    }

    pub fn output_strings(&self, name: &str) -> Vec<String> {
        self.output(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn output_count(&self, name: &str) -> Option<u64> {
        self.output(name).and_then(Value::as_u64)
    }

    pub fn output_bool(&self, name: &str) -> Option<bool> {
        self.output(name).and_then(Value::as_bool)
    }

    /// Turn a failed run into an error
    pub fn check(&self) -> E2eResult<()> {
        if self.success {
            return Ok(());
        }
        let mut message = self
            .error
            .clone()
            .unwrap_or_else(|| "script failed without a message".to_string());
        if let Some(shot) = &self.screenshot {
            message.push_str(&format!(" (screenshot: {})", shot.display()));
        }
        Err(E2eError::Playwright(message))
    }
}

/// Runs generated scripts with Node and `@playwright/test`
#[derive(Debug, Clone)]
pub struct PlaywrightDriver {
    config: PlaywrightConfig,
}

impl PlaywrightDriver {
    pub fn new(config: PlaywrightConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlaywrightConfig {
        &self.config
    }

    /// Check that Node can load `@playwright/test`
    pub async fn check_installed(&self) -> E2eResult<()> {
        let status = TokioCommand::new(&self.config.node_binary)
            .args(["-e", "require('@playwright/test')"])
            .env("NODE_PATH", self.node_path())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    fn node_path(&self) -> PathBuf {
        let dir = std::fs::canonicalize(&self.config.node_project_dir)
            .unwrap_or_else(|_| self.config.node_project_dir.clone());
        dir.join("node_modules")
    }

    /// Files for the session `name`; artifacts only when traces or video are on
    pub fn session_files(&self, name: &str, collect: CollectOptions) -> SessionFiles {
        SessionFiles {
            screenshot: Some(self.config.screenshot_dir.join(format!("{}.png", name))),
            artifacts: (collect.trace || collect.video).then(|| self.config.artifacts_dir.join(name)),
        }
    }

    /// Build the Node program for a script
    pub fn build_script(
        &self,
        script: &Script,
        collect: CollectOptions,
        budget: Duration,
        files: &SessionFiles,
    ) -> String {
        let browser = self.config.browser.as_str();
        let budget_ms = budget.as_millis().max(1) as u64;
        let trace_path = files
            .artifacts
            .as_ref()
            .filter(|_| collect.trace)
            .map(|dir| js_string(&dir.join("trace.zip").to_string_lossy()));
        let video_dir = files
            .artifacts
            .as_ref()
            .filter(|_| collect.video)
            .map(|dir| js_string(&dir.to_string_lossy()));
        let mut js = String::new();

        js.push_str(&format!(
            r#"const fs = require('fs');
const {{ {browser}, expect: baseExpect }} = require('@playwright/test');

const expect = baseExpect.configure({{ timeout: {expect_timeout} }});
const resultPath = process.argv[2];

(async () => {{
  const result = {{ success: false, error: null, outputs: {{}}, consoleErrors: [], jsCoverage: null, istanbul: null, screenshot: null, trace: null, video: null }};
  const outputs = result.outputs;
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    baseURL: {base_url},
    viewport: {{ width: {width}, height: {height} }}{record_video}
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({action_timeout});
  page.on('console', (msg) => {{
    if (msg.type() === 'error') {{
      result.consoleErrors.push(msg.text());
    }}
  }});
"#,
            browser = browser,
            expect_timeout = self.config.expect_timeout_ms,
            action_timeout = self.config.expect_timeout_ms.min(budget_ms),
            headless = self.config.headless,
            base_url = js_string(&self.config.base_url),
            width = self.config.viewport_width,
            height = self.config.viewport_height,
            record_video = video_dir
                .as_ref()
                .map(|dir| format!(",\n    recordVideo: {{ dir: {} }}", dir))
                .unwrap_or_default(),
        ));

        if trace_path.is_some() {
            js.push_str("  await context.tracing.start({ screenshots: true, snapshots: true, sources: true });\n");
        }

        let js_coverage = collect.js_coverage && self.config.browser.supports_js_coverage();
        if js_coverage {
            js.push_str("  await page.coverage.startJSCoverage({ resetOnNavigation: false });\n");
        }

        js.push_str(&format!(
            r#"
  let budgetTimer;
  const budget = new Promise((_, reject) => {{
    budgetTimer = setTimeout(() => reject(new Error('Time budget of {budget_ms}ms exceeded')), {budget_ms});
  }});

  try {{
    await Promise.race([(async () => {{
"#,
            budget_ms = budget_ms
        ));
        for (i, step) in script.steps().iter().enumerate() {
            js.push_str(&format!("      // Step {}: {}\n", i + 1, step.describe().replace('\n', " ")));
            js.push_str(&format!("      {}\n", step.to_js()));
        }
        js.push_str("    })(), budget]);\n");
        js.push_str("    result.success = true;\n  } catch (error) {\n");
        js.push_str("    result.error = error && error.message ? error.message : String(error);\n");
        if let Some(path) = &files.screenshot {
            let path = js_string(&path.to_string_lossy());
            js.push_str(&format!(
                "    try {{ await page.screenshot({{ path: {path}, fullPage: true }}); result.screenshot = {path}; }} catch (e) {{}}\n",
                path = path
            ));
        }
        js.push_str("  } finally {\n    clearTimeout(budgetTimer);\n");
        if js_coverage {
            js.push_str(
                "    try { result.jsCoverage = await page.coverage.stopJSCoverage(); } catch (e) {}\n",
            );
        }
        if collect.istanbul {
            js.push_str(
                "    try { result.istanbul = await page.evaluate(() => window.__coverage__ || null); } catch (e) {}\n",
            );
        }
        if let Some(path) = &trace_path {
            js.push_str(&format!(
                "    try {{ await context.tracing.stop({{ path: {path} }}); result.trace = {path}; }} catch (e) {{}}\n",
                path = path
            ));
        }
        if video_dir.is_some() {
            js.push_str(
                "    try { const video = page.video(); await context.close(); if (video) { result.video = await video.path(); } } catch (e) {}\n",
            );
        }
        js.push_str(
            r#"    fs.writeFileSync(resultPath, JSON.stringify(result));
    try { await browser.close(); } catch (e) {}
  }
  process.exit(result.success ? 0 : 1);
})().catch((error) => {
  console.error(error && error.stack ? error.stack : String(error));
  process.exit(2);
});
"#,
        );

        js
    }

    /// Run a script in a fresh browser and read back its result.
    ///
    /// The script stops its own steps once `budget` is spent and still
    /// writes its result. The process is only killed if it outlives
    /// `budget` plus [`SHUTDOWN_GRACE`].
    pub async fn run(
        &self,
        name: &str,
        script: &Script,
        collect: CollectOptions,
        budget: Duration,
    ) -> E2eResult<ScriptOutput> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        let result_path = temp_dir.path().join("result.json");

        std::fs::create_dir_all(&self.config.screenshot_dir)?;
        let files = self.session_files(name, collect);
        if let Some(dir) = &files.artifacts {
            std::fs::create_dir_all(dir)?;
        }
        let program = self.build_script(script, collect, budget, &files);
        std::fs::write(&script_path, program)?;

        debug!("Running Playwright script: {} ({} steps)", script_path.display(), script.len());

        let child = TokioCommand::new(&self.config.node_binary)
            .arg(&script_path)
            .arg(&result_path)
            .env("NODE_PATH", self.node_path())
            .current_dir(&self.config.node_project_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let hard_limit = budget + SHUTDOWN_GRACE;
        let output = tokio::time::timeout(hard_limit, child)
            .await
            .map_err(|_| E2eError::Timeout(format!("browser session '{}' after {:?}", name, hard_limit)))??;

        match std::fs::read_to_string(&result_path) {
            Ok(raw) => {
                let result: ScriptOutput = serde_json::from_str(&raw)?;
                if !result.success {
                    warn!(
                        "Script '{}' failed: {}",
                        name,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
                Ok(result)
            }
            Err(_) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                if stderr.contains("Cannot find module '@playwright/test'") {
                    return Err(E2eError::PlaywrightNotFound);
                }
                let stdout = String::from_utf8_lossy(&output.stdout);
                Err(E2eError::Playwright(format!(
                    "Script failed ({}):\nstdout: {}\nstderr: {}",
                    output.status, stdout, stderr
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Browser;

    const BUDGET: Duration = Duration::from_secs(30);

    fn driver() -> PlaywrightDriver {
        PlaywrightDriver::new(PlaywrightConfig::default())
    }

    fn script() -> Script {
        let mut script = Script::new();
        script
            .goto("/")
            .wait_for_load(LoadState::NetworkIdle)
            .expect_visible(&Locator::page().css("aside"));
        script
    }

    #[test]
    fn test_script_brackets_steps_with_coverage() {
        let js = driver().build_script(
            &script(),
            CollectOptions {
                js_coverage: true,
                istanbul: true,
                ..Default::default()
            },
            BUDGET,
            &SessionFiles::default(),
        );

        let start = js.find("startJSCoverage").unwrap();
        let first_step = js.find("await page.goto(\"/\");").unwrap();
        let stop = js.find("stopJSCoverage").unwrap();
        let finally = js.find("} finally {").unwrap();
        assert!(start < first_step);
        assert!(first_step < finally && finally < stop);
        assert!(js.contains("window.__coverage__ || null"));
        assert!(js.contains("baseURL: \"http://localhost:13000\""));
        assert!(js.contains("baseExpect.configure({ timeout: 5000 })"));
    }

    #[test]
    fn test_time_budget_runs_inside_script() {
        let js = driver().build_script(
            &script(),
            CollectOptions {
                js_coverage: true,
                istanbul: true,
                ..Default::default()
            },
            Duration::from_millis(1200),
            &SessionFiles::default(),
        );

        let budget = js.find("setTimeout(() => reject(new Error('Time budget of 1200ms exceeded')), 1200)").unwrap();
        let race = js.find("await Promise.race([").unwrap();
        let first_step = js.find("await page.goto(\"/\");").unwrap();
        let finally = js.find("} finally {").unwrap();
        let cleared = js.find("clearTimeout(budgetTimer)").unwrap();
        let stop = js.find("stopJSCoverage").unwrap();
        let written = js.find("fs.writeFileSync(resultPath").unwrap();
        assert!(budget < race && race < first_step);
        assert!(finally < cleared && cleared < stop && stop < written);

        // Single actions never wait longer than the remaining budget
        assert!(js.contains("page.setDefaultTimeout(1200)"));
        assert!(js.contains("baseExpect.configure({ timeout: 5000 })"));
    }

    #[test]
    fn test_script_without_coverage() {
        let js = driver().build_script(&script(), CollectOptions::default(), BUDGET, &SessionFiles::default());
        assert!(!js.contains("startJSCoverage"));
        assert!(!js.contains("__coverage__"));
        assert!(js.contains("// Step 3: expect:toBeVisible()"));
    }

    #[test]
    fn test_js_coverage_needs_chromium() {
        let driver = PlaywrightDriver::new(PlaywrightConfig {
            browser: Browser::Firefox,
            ..Default::default()
        });
        let js = driver.build_script(
            &script(),
            CollectOptions {
                js_coverage: true,
                ..Default::default()
            },
            BUDGET,
            &SessionFiles::default(),
        );
        assert!(js.contains("require('@playwright/test')"));
        assert!(js.contains("firefox.launch"));
        assert!(!js.contains("startJSCoverage"));
    }

    #[test]
    fn test_screenshot_on_failure() {
        let js = driver().build_script(
            &script(),
            CollectOptions::default(),
            BUDGET,
            &SessionFiles {
                screenshot: Some(PathBuf::from("test-results/screenshots/smoke.png")),
                artifacts: None,
            },
        );
        let catch = js.find("} catch (error) {").unwrap();
        let shot = js.find("page.screenshot").unwrap();
        assert!(catch < shot);
    }

    #[test]
    fn test_session_files_follow_collect_options() {
        let driver = driver();
        let plain = driver.session_files("smoke-1", CollectOptions::default());
        assert_eq!(plain.screenshot, Some(PathBuf::from("test-results/screenshots/smoke-1.png")));
        assert_eq!(plain.artifacts, None);

        let retry = driver.session_files(
            "smoke-1",
            CollectOptions {
                trace: true,
                ..Default::default()
            },
        );
        assert_eq!(retry.artifacts, Some(PathBuf::from("test-results/artifacts/smoke-1")));
    }

    #[test]
    fn test_trace_and_video_recorded_when_asked() {
        let files = SessionFiles {
            screenshot: None,
            artifacts: Some(PathBuf::from("test-results/artifacts/smoke-1")),
        };
        let js = driver().build_script(
            &script(),
            CollectOptions {
                js_coverage: true,
                trace: true,
                video: true,
                ..Default::default()
            },
            BUDGET,
            &files,
        );

        assert!(js.contains(r#"recordVideo: { dir: "test-results/artifacts/smoke-1" }"#));
        let start = js.find("context.tracing.start(").unwrap();
        let first_step = js.find("await page.goto(\"/\");").unwrap();
        let coverage = js.find("stopJSCoverage").unwrap();
        let trace = js.find(r#"context.tracing.stop({ path: "test-results/artifacts/smoke-1/trace.zip" })"#).unwrap();
        let video = js.find("await context.close()").unwrap();
        let written = js.find("fs.writeFileSync(resultPath").unwrap();
        assert!(start < first_step);
        assert!(coverage < trace && trace < video && video < written);

        let plain = driver().build_script(&script(), CollectOptions::default(), BUDGET, &files);
        assert!(!plain.contains("tracing"));
        assert!(!plain.contains("recordVideo"));
    }

    #[test]
    fn test_output_accessors() {
        let output: ScriptOutput = serde_json::from_str(
            r#"{
                "success": false,
                "error": "locator.click: Timeout 5000ms exceeded",
                "outputs": {"links": ["Board View", "Content Calendar"], "count": 2, "visible": true},
                "consoleErrors": ["Failed to load resource: 404"],
                "jsCoverage": [{"url": "http://localhost:13000/src/main.tsx", "functions": []}],
                "istanbul": null
            }"#,
        )
        .unwrap();

        assert_eq!(output.output_strings("links"), vec!["Board View", "Content Calendar"]);
        assert_eq!(output.output_count("count"), Some(2));
        assert_eq!(output.output_bool("visible"), Some(true));
        assert_eq!(output.output_str("missing"), None);
        assert_eq!(output.js_coverage.as_ref().map(Vec::len), Some(1));
        assert!(matches!(output.check(), Err(E2eError::Playwright(msg)) if msg.contains("Timeout 5000ms")));
    }
}
