//! Docker CLI wrapper for the test stack

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use crate::config::EnvironmentConfig;
use crate::error::{E2eError, E2eResult};

/// Runs `docker compose`, `docker exec` and `docker cp` for one compose file
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
    compose_file: PathBuf,
    project_dir: PathBuf,
}

impl DockerCli {
    pub fn new(config: &EnvironmentConfig) -> Self {
        Self {
            program: config.docker.clone(),
            compose_file: config.compose_file.clone(),
            project_dir: config.project_dir.clone(),
        }
    }

    pub fn compose_file(&self) -> &Path {
        &self.compose_file
    }

    /// `docker compose -f <file> <args>`, output streamed to the terminal
    pub async fn compose(&self, args: &[&str]) -> E2eResult<()> {
        let mut full = vec!["compose".to_string(), "-f".to_string()];
        full.push(self.compose_file.to_string_lossy().into_owned());
        full.extend(args.iter().map(|a| a.to_string()));
        self.run(&full, true).await
    }

    pub async fn build(&self) -> E2eResult<()> {
        self.compose(&["build"]).await
    }

    pub async fn up(&self) -> E2eResult<()> {
        self.compose(&["up", "-d"]).await
    }

    /// Stop services and remove their volumes
    pub async fn down(&self) -> E2eResult<()> {
        self.compose(&["down", "-v"]).await
    }

    /// `docker exec <container> <args>`
    pub async fn exec(&self, container: &str, args: &[&str]) -> E2eResult<()> {
        let mut full = vec!["exec".to_string(), container.to_string()];
        full.extend(args.iter().map(|a| a.to_string()));
        self.run(&full, false).await
    }

    /// `docker cp <container>:<src> <dest>`
    pub async fn copy_from(&self, container: &str, src: &str, dest: &Path) -> E2eResult<()> {
        let full = vec![
            "cp".to_string(),
            format!("{}:{}", container, src),
            dest.to_string_lossy().into_owned(),
        ];
        self.run(&full, false).await
    }

    async fn run(&self, args: &[String], inherit: bool) -> E2eResult<()> {
        let rendered = format!("{} {}", self.program, args.join(" "));
        debug!("Running: {}", rendered);

        let mut cmd = AsyncCommand::new(&self.program);
        cmd.args(args).current_dir(&self.project_dir);
        if inherit {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::null()).stderr(Stdio::piped());
        }

        let output = cmd.output().await.map_err(|e| E2eError::Command {
            command: rendered.clone(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(E2eError::Command {
                command: rendered,
                reason: format!("{} {}", output.status, stderr.trim()),
            });
        }
        Ok(())
    }
}
