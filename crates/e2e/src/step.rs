//! Browser steps and their Playwright statements

use serde::{Deserialize, Serialize};

use crate::locator::{js_string, Locator, TextMatch};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Load,
    DomContentLoaded,
    #[default]
    NetworkIdle,
}

impl LoadState {
    fn as_str(&self) -> &'static str {
        match self {
            LoadState::Load => "load",
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::NetworkIdle => "networkidle",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

/// Web-first assertion on a locator, retried until the expect timeout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assertion {
    Visible,
    /// `not.toBeVisible()`: absent elements pass too
    NotVisible,
    ContainsText(TextMatch),
    HaveText(TextMatch),
    HaveClass(TextMatch),
    Count(usize),
}

impl Assertion {
    fn to_js(&self) -> String {
        match self {
            Assertion::Visible => "toBeVisible()".to_string(),
            Assertion::NotVisible => "not.toBeVisible()".to_string(),
            Assertion::ContainsText(text) => format!("toContainText({})", text.to_js()),
            Assertion::HaveText(text) => format!("toHaveText({})", text.to_js()),
            Assertion::HaveClass(class) => format!("toHaveClass({})", class.to_js()),
            Assertion::Count(n) => format!("toHaveCount({})", n),
        }
    }
}

/// Value read back from the page into the script outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureKind {
    TextContent,
    AllTextContents,
    Count,
    IsVisible,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate relative to the UI base URL
    Goto { path: String },
    WaitForLoadState {
        state: LoadState,
        timeout_ms: Option<u64>,
    },
    WaitFor {
        locator: Locator,
        state: WaitState,
        timeout_ms: Option<u64>,
    },
    Click { locator: Locator },
    /// Click `preferred` when visible, `fallback` otherwise
    ClickEither { preferred: Locator, fallback: Locator },
    Hover { locator: Locator },
    Fill { locator: Locator, value: String },
    Clear { locator: Locator },
    Blur { locator: Locator },
    DragTo { source: Locator, target: Locator },
    Expect {
        locator: Locator,
        assertion: Assertion,
    },
    ExpectUrl { pattern: TextMatch },
    ExpectTitle { pattern: TextMatch },
    Capture {
        name: String,
        locator: Locator,
        kind: CaptureKind,
    },
    CaptureUrl { name: String },
    Log { message: String },
}

impl Step {
    /// Short description used in generated comments and logs
    pub fn describe(&self) -> String {
        match self {
            Step::Goto { path } => format!("goto:{}", path),
            Step::WaitForLoadState { state, .. } => format!("load:{}", state.as_str()),
            Step::WaitFor { state, .. } => format!("wait:{}", state.as_str()),
            Step::Click { .. } => "click".to_string(),
            Step::ClickEither { .. } => "click-either".to_string(),
            Step::Hover { .. } => "hover".to_string(),
            Step::Fill { value, .. } => format!("fill:{}", value),
            Step::Clear { .. } => "clear".to_string(),
            Step::Blur { .. } => "blur".to_string(),
            Step::DragTo { .. } => "drag".to_string(),
            Step::Expect { assertion, .. } => format!("expect:{}", assertion.to_js()),
            Step::ExpectUrl { .. } => "expect-url".to_string(),
            Step::ExpectTitle { .. } => "expect-title".to_string(),
            Step::Capture { name, .. } | Step::CaptureUrl { name } => format!("capture:{}", name),
            Step::Log { message } => format!("log:{}", message.chars().take(30).collect::<String>()),
        }
    }

    pub fn to_js(&self) -> String {
        match self {
            Step::Goto { path } => format!("await page.goto({});", js_string(path)),
            Step::WaitForLoadState { state, timeout_ms } => match timeout_ms {
                Some(ms) => format!(
                    "await page.waitForLoadState({}, {{ timeout: {} }});",
                    js_string(state.as_str()),
                    ms
                ),
                None => format!("await page.waitForLoadState({});", js_string(state.as_str())),
            },
            Step::WaitFor {
                locator,
                state,
                timeout_ms,
            } => match timeout_ms {
                Some(ms) => format!(
                    "await {}.waitFor({{ state: {}, timeout: {} }});",
                    locator.js(),
                    js_string(state.as_str()),
                    ms
                ),
                None => format!(
                    "await {}.waitFor({{ state: {} }});",
                    locator.js(),
                    js_string(state.as_str())
                ),
            },
            Step::Click { locator } => format!("await {}.click();", locator.js()),
            Step::ClickEither {
                preferred,
                fallback,
            } => format!(
                "if (await {p}.isVisible()) {{ await {p}.click(); }} else {{ await {f}.click(); }}",
                p = preferred.js(),
                f = fallback.js()
            ),
            Step::Hover { locator } => format!("await {}.hover();", locator.js()),
            Step::Fill { locator, value } => {
                format!("await {}.fill({});", locator.js(), js_string(value))
            }
            Step::Clear { locator } => format!("await {}.clear();", locator.js()),
            Step::Blur { locator } => format!("await {}.blur();", locator.js()),
            Step::DragTo { source, target } => {
                format!("await {}.dragTo({});", source.js(), target.js())
            }
            Step::Expect { locator, assertion } => {
                format!("await expect({}).{};", locator.js(), assertion.to_js())
            }
            Step::ExpectUrl { pattern } => {
                format!("await expect(page).toHaveURL({});", pattern.to_js())
            }
            Step::ExpectTitle { pattern } => {
                format!("await expect(page).toHaveTitle({});", pattern.to_js())
            }
            Step::Capture {
                name,
                locator,
                kind,
            } => {
                let read = match kind {
                    CaptureKind::TextContent => format!("await {}.textContent()", locator.js()),
                    CaptureKind::AllTextContents => {
                        format!("await {}.allTextContents()", locator.js())
                    }
                    CaptureKind::Count => format!("await {}.count()", locator.js()),
                    CaptureKind::IsVisible => format!("await {}.isVisible()", locator.js()),
                };
                format!("outputs[{}] = {};", js_string(name), read)
            }
            Step::CaptureUrl { name } => format!("outputs[{}] = page.url();", js_string(name)),
            Step::Log { message } => format!("console.log({});", js_string(&format!("[TEST] {}", message))),
        }
    }
}
