//! Docker side of the deployment: launch, liveness poll, logs

use crate::error::{ProvisionError, ProvisionResult};
use crate::options::HealthCheckPolicy;
use std::sync::Arc;
use substore_core::{
    DeployConfig, BACKEND_SYNC_CRON, CONTAINER_DATA_PATH, CONTAINER_NAME, CONTAINER_PORT,
    ENV_BACKEND_API_URL, ENV_BACKEND_PATH, ENV_BACKEND_SYNC_CRON, FAILURE_LOG_LINES, IMAGE_NAME,
};
use substore_host::{CommandRunner, CommandSpec};
use tracing::{debug, info, warn};

/// Arguments after `docker` that start the container.
///
/// Shared by the launch step and the generated update script so both always
/// use identical parameters.
pub fn run_arguments(config: &DeployConfig) -> Vec<String> {
    vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        CONTAINER_NAME.to_string(),
        "--restart".to_string(),
        "always".to_string(),
        "-e".to_string(),
        format!("{}={}", ENV_BACKEND_SYNC_CRON, BACKEND_SYNC_CRON),
        "-e".to_string(),
        format!("{}={}", ENV_BACKEND_PATH, config.api_path),
        "-e".to_string(),
        format!("{}={}", ENV_BACKEND_API_URL, config.api_url()),
        "-p".to_string(),
        format!("{}:{}", config.port, CONTAINER_PORT),
        "-v".to_string(),
        format!("{}:{}", config.data_dir.display(), CONTAINER_DATA_PATH),
        IMAGE_NAME.to_string(),
    ]
}

pub struct ContainerLauncher {
    runner: Arc<dyn CommandRunner>,
    policy: HealthCheckPolicy,
}

impl ContainerLauncher {
    pub fn new(runner: Arc<dyn CommandRunner>, policy: HealthCheckPolicy) -> Self {
        Self { runner, policy }
    }

    /// Remove any previous container, pull the image and start a fresh one.
    ///
    /// Returns the new container id as printed by `docker run`.
    pub async fn launch(&self, config: &DeployConfig) -> ProvisionResult<String> {
        tokio::fs::create_dir_all(&config.data_dir)
            .await
            .map_err(|source| ProvisionError::Write {
                path: config.data_dir.clone(),
                source,
            })?;

        self.remove_existing().await?;

        self.checked(
            "pull image",
            CommandSpec::new("docker").args(["pull", IMAGE_NAME]),
        )
        .await?;

        let output = self
            .checked(
                "start container",
                CommandSpec::new("docker").args(run_arguments(config)),
            )
            .await?;
        let container_id = output.stdout.trim().to_string();
        info!("Started container {} ({})", CONTAINER_NAME, container_id);
        Ok(container_id)
    }

    /// Stop and remove a same-named container; absence is expected on first run
    pub async fn remove_existing(&self) -> ProvisionResult<()> {
        for action in ["stop", "rm"] {
            let output = self
                .runner
                .run(&CommandSpec::new("docker").args([action, CONTAINER_NAME]))
                .await?;
            if !output.is_success() {
                debug!(
                    "docker {} {} ignored: {}",
                    action,
                    CONTAINER_NAME,
                    output.diagnostic()
                );
            }
        }
        Ok(())
    }

    /// Poll `docker ps` with backoff until the container is running.
    ///
    /// On give-up the error carries the container's recent logs.
    pub async fn wait_until_running(&self) -> ProvisionResult<()> {
        for attempt in 1..=self.policy.attempts {
            let delay = self.policy.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if self.is_running().await? {
                info!(
                    "Container {} is running (check {}/{})",
                    CONTAINER_NAME, attempt, self.policy.attempts
                );
                return Ok(());
            }
            debug!(
                "Container {} not running yet (check {}/{})",
                CONTAINER_NAME, attempt, self.policy.attempts
            );
        }

        warn!(
            "Container {} did not reach the running state",
            CONTAINER_NAME
        );
        Err(ProvisionError::ContainerNotRunning {
            container: CONTAINER_NAME.to_string(),
            attempts: self.policy.attempts,
            logs: self.recent_logs().await,
        })
    }

    pub async fn is_running(&self) -> ProvisionResult<bool> {
        let name_filter = format!("name=^{}$", CONTAINER_NAME);
        let output = self
            .runner
            .run(&CommandSpec::new("docker").args([
                "ps",
                "--filter",
                name_filter.as_str(),
                "--filter",
                "status=running",
                "--format",
                "{{.Names}}",
            ]))
            .await?;
        Ok(output.is_success() && output.stdout.lines().any(|l| l.trim() == CONTAINER_NAME))
    }

    /// Last log lines of the container, best effort
    pub async fn recent_logs(&self) -> String {
        let spec = CommandSpec::new("docker").args([
            "logs".to_string(),
            "--tail".to_string(),
            FAILURE_LOG_LINES.to_string(),
            CONTAINER_NAME.to_string(),
        ]);
        match self.runner.run(&spec).await {
            Ok(output) => {
                // docker logs replays the container's stderr on stderr
                let mut logs = output.stdout;
                logs.push_str(&output.stderr);
                logs
            }
            Err(e) => format!("could not read container logs: {}", e),
        }
    }

    async fn checked(
        &self,
        step: &str,
        spec: CommandSpec,
    ) -> ProvisionResult<substore_host::CommandOutput> {
        let output = self.runner.run(&spec).await?;
        if output.is_success() {
            Ok(output)
        } else {
            Err(ProvisionError::StepFailed {
                step: step.to_string(),
                command: spec.command_line(),
                output: output.diagnostic(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use substore_host::testing::RecordingRunner;
    use substore_host::CommandOutput;
    use tempfile::TempDir;

    fn config(temp_dir: &TempDir) -> DeployConfig {
        DeployConfig::new("example.com", 8080, "/api-XYZ")
            .unwrap()
            .with_data_dir(temp_dir.path().join("data"))
    }

    #[test]
    fn test_run_arguments() {
        let config = DeployConfig::new("example.com", 8080, "/api-XYZ").unwrap();
        let args = run_arguments(&config);
        let line = args.join(" ");
        assert!(line.starts_with("run -d --name sub-store --restart always"));
        assert!(args.contains(&"SUB_STORE_BACKEND_SYNC_CRON=55 23 * * *".to_string()));
        assert!(args.contains(&"SUB_STORE_FRONTEND_BACKEND_PATH=/api-XYZ".to_string()));
        assert!(args.contains(&"SUB_STORE_BACKEND_API_URL=https://example.com/api-XYZ".to_string()));
        assert!(args.contains(&"8080:3001".to_string()));
        assert!(args.contains(&"/root/sub-store-data:/opt/app/data".to_string()));
        assert_eq!(args.last().unwrap(), "xream/sub-store:latest");
    }

    #[tokio::test]
    async fn test_launch_sequence() {
        let temp_dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        runner
            .respond("docker stop", CommandOutput::failure(1, "No such container: sub-store"))
            .respond("docker rm", CommandOutput::failure(1, "No such container: sub-store"))
            .respond("docker run", CommandOutput::with_stdout("abc123\n"));
        let launcher = ContainerLauncher::new(runner.clone(), HealthCheckPolicy::immediate(1));
        let config = config(&temp_dir);

        let id = launcher.launch(&config).await.unwrap();

        assert_eq!(id, "abc123");
        assert!(config.data_dir.is_dir());
        let commands = runner.commands();
        assert_eq!(commands[0], "docker stop sub-store");
        assert_eq!(commands[1], "docker rm sub-store");
        assert_eq!(commands[2], "docker pull xream/sub-store:latest");
        assert!(commands[3].starts_with("docker run -d --name sub-store"));
    }

    #[tokio::test]
    async fn test_failed_pull_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        runner.respond("docker pull", CommandOutput::failure(1, "network unreachable"));
        let launcher = ContainerLauncher::new(runner.clone(), HealthCheckPolicy::immediate(1));

        let err = launcher.launch(&config(&temp_dir)).await.unwrap_err();

        assert!(matches!(err, ProvisionError::StepFailed { ref step, .. } if step == "pull image"));
        assert_eq!(runner.count("docker run"), 0);
    }

    #[tokio::test]
    async fn test_wait_until_running_polls_until_up() {
        let runner = Arc::new(RecordingRunner::new());
        runner
            .respond("docker ps", CommandOutput::with_stdout("sub-store\n"))
            .respond_once("docker ps", CommandOutput::with_stdout(""))
            .respond_once("docker ps", CommandOutput::with_stdout(""));
        let launcher = ContainerLauncher::new(runner.clone(), HealthCheckPolicy::immediate(5));

        launcher.wait_until_running().await.unwrap();

        assert_eq!(runner.count("docker ps"), 3);
        assert_eq!(runner.count("docker logs"), 0);
    }

    #[tokio::test]
    async fn test_wait_until_running_gives_up_with_logs() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond(
            "docker logs",
            CommandOutput {
                code: Some(0),
                stdout: String::new(),
                stderr: "Error: EADDRINUSE\n".to_string(),
            },
        );
        let launcher = ContainerLauncher::new(runner.clone(), HealthCheckPolicy::immediate(3));

        let err = launcher.wait_until_running().await.unwrap_err();

        match err {
            ProvisionError::ContainerNotRunning { attempts, logs, .. } => {
                assert_eq!(attempts, 3);
                assert!(logs.contains("EADDRINUSE"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.count("docker ps"), 3);
        assert_eq!(runner.position("docker logs --tail 50 sub-store"), Some(3));
    }

    #[tokio::test]
    async fn test_other_container_names_do_not_count() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond("docker ps", CommandOutput::with_stdout("sub-store-old\n"));
        let launcher = ContainerLauncher::new(runner.clone(), HealthCheckPolicy::immediate(1));
        assert!(!launcher.is_running().await.unwrap());
    }
}
