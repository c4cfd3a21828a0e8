//! Environment lifecycle - bringing the compose stack up and down
//!
//! One [`Environment`] may exist per process. `setup` either reaches
//! [`LifecycleState::Ready`] or tears down what it started and fails;
//! `teardown` never fails.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use creatorpipeline_coverage::jacoco::{self, JacocoReportConfig};

use crate::api::wait_for_api;
use crate::compose::DockerCli;
use crate::config::E2eConfig;
use crate::error::{E2eError, E2eResult};

static ACTIVE: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Building,
    Starting,
    WaitingForHealth,
    Ready,
    TearingDown,
    Stopped,
}

/// What happened to each backend coverage harvest step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub dumped: bool,
    pub exec_copied: bool,
    pub cli_copied: bool,
    pub report_rendered: bool,
}

/// Handle to the application stack under test
pub struct Environment {
    config: E2eConfig,
    docker: DockerCli,
    state: LifecycleState,
}

impl Environment {
    /// Claim the per-process environment slot
    pub fn new(config: E2eConfig) -> E2eResult<Self> {
        if ACTIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(E2eError::EnvironmentActive);
        }

        let docker = DockerCli::new(&config.environment);
        Ok(Self {
            config,
            docker,
            state: LifecycleState::NotStarted,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &E2eConfig {
        &self.config
    }

    /// Build and start all services, then wait for the API to report UP
    pub async fn setup(&mut self) -> E2eResult<()> {
        info!("Starting E2E test environment");

        if let Err(e) = self.bring_up().await {
            error!("Failed to start E2E test environment: {}", e);
            self.state = LifecycleState::TearingDown;
            if !self.config.environment.reuse_existing {
                if let Err(cleanup) = self.docker.down().await {
                    warn!("Cleanup after failed setup also failed: {}", cleanup);
                }
            }
            self.state = LifecycleState::Stopped;
            return Err(e);
        }

        self.state = LifecycleState::Ready;
        info!("E2E test environment ready");
        Ok(())
    }

    async fn bring_up(&mut self) -> E2eResult<()> {
        if self.config.environment.reuse_existing {
            info!("Reusing running stack");
        } else {
            self.state = LifecycleState::Building;
            info!("Building images from {}", self.docker.compose_file().display());
            self.docker
                .build()
                .await
                .map_err(|e| E2eError::EnvironmentStartup(e.to_string()))?;

            self.state = LifecycleState::Starting;
            info!("Starting compose services");
            self.docker
                .up()
                .await
                .map_err(|e| E2eError::EnvironmentStartup(e.to_string()))?;
        }

        self.state = LifecycleState::WaitingForHealth;
        let attempts = self.config.environment.health_attempts;
        let health_url = self.config.api.health_url();
        info!("Waiting for API to be healthy at {}", health_url);

        if !wait_for_api(&health_url, attempts, self.config.environment.health_interval()).await {
            return Err(E2eError::HealthCheck(attempts));
        }
        Ok(())
    }

    /// Harvest backend coverage if enabled, then stop the stack.
    ///
    /// Every step is isolated; failures are logged and never returned.
    pub async fn teardown(&mut self) -> HarvestReport {
        info!("Tearing down E2E test environment");
        self.state = LifecycleState::TearingDown;

        let report = if self.config.coverage.backend.enabled {
            self.harvest_backend_coverage().await
        } else {
            HarvestReport::default()
        };

        if self.config.environment.reuse_existing {
            info!("Leaving reused stack running");
        } else if let Err(e) = self.docker.down().await {
            warn!("Teardown encountered issues: {}", e);
        }

        self.state = LifecycleState::Stopped;
        report
    }

    fn exec_file(&self) -> PathBuf {
        self.config.backend_dir().join("jacoco.exec")
    }

    async fn harvest_backend_coverage(&self) -> HarvestReport {
        let backend = &self.config.coverage.backend;
        let mut report = HarvestReport::default();
        info!("Collecting backend coverage from {}", backend.container);

        if let Err(e) = std::fs::create_dir_all(self.config.backend_dir()) {
            warn!("Could not create {}: {}", self.config.backend_dir().display(), e);
        }

        let port = backend.agent_port.to_string();
        match self
            .docker
            .exec(
                &backend.container,
                &[
                    "java",
                    "-jar",
                    &backend.container_cli_jar,
                    "dump",
                    "--address",
                    "localhost",
                    "--port",
                    &port,
                    "--destfile",
                    &backend.container_dump_file,
                ],
            )
            .await
        {
            Ok(()) => report.dumped = true,
            Err(e) => warn!("JaCoCo dump failed: {}", e),
        }

        let exec_file = self.exec_file();
        match self
            .docker
            .copy_from(&backend.container, &backend.container_dump_file, &exec_file)
            .await
        {
            Ok(()) => report.exec_copied = true,
            Err(e) => warn!("Copying JaCoCo dump failed: {}", e),
        }

        match self
            .docker
            .copy_from(&backend.container, &backend.container_cli_jar, &backend.cli_jar)
            .await
        {
            Ok(()) => report.cli_copied = true,
            Err(e) => warn!("Copying jacococli.jar failed: {}", e),
        }

        if backend.generate_report {
            let jacoco_config = JacocoReportConfig {
                cli_jar: backend.cli_jar.clone(),
                container: backend.container.clone(),
                container_cli_jar: backend.container_cli_jar.clone(),
                docker: self.config.environment.docker.clone(),
                ..JacocoReportConfig::new(&self.config.backend_dir(), &backend.api_dir)
            };
            let outcome =
                tokio::task::spawn_blocking(move || jacoco::backend_coverage(&jacoco_config)).await;
            match outcome {
                Err(e) => warn!("JaCoCo report task failed: {}", e),
                Ok(jacoco::BackendCoverage::Report { html_index, .. }) => {
                    info!("Backend coverage report: {}", html_index.display());
                    report.report_rendered = true;
                }
                Ok(jacoco::BackendCoverage::Missing { expected }) => {
                    warn!("No backend coverage data at {}", expected.display())
                }
                Ok(jacoco::BackendCoverage::Unavailable { reason, raw }) => {
                    warn!("{}; raw data at {}", reason, raw.display())
                }
            }
        }

        report
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        if !matches!(self.state, LifecycleState::Stopped | LifecycleState::NotStarted) {
            warn!("Environment dropped in state {:?} without teardown", self.state);
        }
        ACTIVE.store(false, Ordering::SeqCst);
    }
}
