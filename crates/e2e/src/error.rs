//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Environment failed to start: {0}")]
    EnvironmentStartup(String),

    #[error("API health check failed after {0} attempts")]
    HealthCheck(usize),

    #[error("An E2E environment is already active in this process")]
    EnvironmentActive,

    #[error("Command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("API {method} {path} failed: {status} - {body}")]
    Api {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JUnit report error: {0}")]
    Junit(#[from] quick_junit::SerializeError),

    #[error("Coverage error: {0}")]
    Coverage(#[from] creatorpipeline_coverage::CoverageError),
}

impl E2eError {
    /// HTTP status of a failed API call
    pub fn status(&self) -> Option<u16> {
        match self {
            E2eError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Fail with an assertion error unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> E2eResult<()> {
    if condition {
        Ok(())
    } else {
        Err(E2eError::Assertion(message.into()))
    }
}
