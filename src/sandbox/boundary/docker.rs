//! Docker-backed isolation

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use super::IsolationBoundary;
use crate::error::{Result, TsarError};
use crate::sandbox::process::{kill_process_group, new_session, wait_with_deadline};
use crate::sandbox::request::ExecutionRequest;
use crate::sandbox::workspace::{Workspace, SCRIPT_NAME};

pub const DEFAULT_IMAGE: &str = "python:3.12-slim";

/// Mount point of the workspace inside the container
const CONTAINER_DIR: &str = "/app";

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const KILL_TIMEOUT: Duration = Duration::from_secs(5);

/// `docker run` exits with 125 when the daemon itself refuses the container
const DOCKER_RUN_FAILURE: i32 = 125;

/// How docker and podman prefix their own errors on stderr
const CLIENT_ERROR_PREFIXES: &[&str] = &["docker:", "Error:", "Error response from daemon:"];

/// Runs each script in a throwaway container
#[derive(Debug, Clone)]
pub struct DockerBoundary {
    docker: String,
    image: String,
}

impl DockerBoundary {
    pub fn new() -> Self {
        Self {
            docker: "docker".to_string(),
            image: DEFAULT_IMAGE.to_string(),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Use a different client binary (e.g. `podman`)
    pub fn with_client(mut self, docker: impl Into<String>) -> Self {
        self.docker = docker.into();
        self
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// Arguments passed to the client for one run
    pub fn run_args(&self, workspace: &Workspace, request: &ExecutionRequest) -> Vec<String> {
        let limits = &request.limits;
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            workspace.id().to_string(),
            "--memory".to_string(),
            format!("{}m", limits.memory_mb),
            "--cpus".to_string(),
            limits.cpu_share.to_string(),
        ];

        if limits.network_disabled {
            args.extend(["--network".to_string(), "none".to_string()]);
        }

        let mode = if limits.filesystem_read_only {
            args.push("--read-only".to_string());
            "ro"
        } else {
            "rw"
        };
        args.extend([
            "-v".to_string(),
            format!("{}:{}:{}", workspace.dir().display(), CONTAINER_DIR, mode),
            "-w".to_string(),
            CONTAINER_DIR.to_string(),
        ]);

        if request.stdin.is_some() {
            args.push("-i".to_string());
        }

        args.extend([
            self.image.clone(),
            "python".to_string(),
            "-u".to_string(),
            SCRIPT_NAME.to_string(),
        ]);
        args
    }
}

impl Default for DockerBoundary {
    fn default() -> Self {
        Self::new()
    }
}

impl IsolationBoundary for DockerBoundary {
    fn name(&self) -> &str {
        "docker"
    }

    fn probe(&self) -> Result<()> {
        let mut child = Command::new(&self.docker)
            .arg("ps")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                TsarError::BoundaryUnavailable(format!("cannot run '{}': {}", self.docker, e))
            })?;

        match wait_with_deadline(&mut child, PROBE_TIMEOUT)? {
            Some(status) if status.success() => Ok(()),
            Some(status) => Err(TsarError::BoundaryUnavailable(format!(
                "'{} ps' failed ({}); is the daemon running?",
                self.docker, status
            ))),
            None => Err(TsarError::BoundaryUnavailable(format!(
                "'{} ps' did not answer within {} s",
                self.docker,
                PROBE_TIMEOUT.as_secs()
            ))),
        }
    }

    fn command(&self, workspace: &Workspace, request: &ExecutionRequest) -> Command {
        let mut cmd = Command::new(&self.docker);
        cmd.args(self.run_args(workspace, request));
        cmd
    }

    fn terminate(&self, child: &mut Child, workspace: &Workspace) {
        // Killing the client alone would leave the container running
        let mut kill = Command::new(&self.docker);
        kill.args(["kill", workspace.id()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        new_session(&mut kill);
        match kill.spawn() {
            Ok(mut client) => match wait_with_deadline(&mut client, KILL_TIMEOUT) {
                Ok(Some(status)) if status.success() => {
                    log::debug!("Killed container {}", workspace.id())
                }
                Ok(Some(status)) => {
                    log::debug!("'{} kill {}' {}", self.docker, workspace.id(), status)
                }
                Ok(None) => log::warn!(
                    "'{} kill {}' did not finish within {} s",
                    self.docker,
                    workspace.id(),
                    KILL_TIMEOUT.as_secs()
                ),
                Err(e) => log::warn!("Failed to wait for '{} kill': {}", self.docker, e),
            },
            Err(e) => log::warn!(
                "Failed to run '{} kill {}': {}",
                self.docker,
                workspace.id(),
                e
            ),
        }
        kill_process_group(child);
    }

    fn launch_failure(
        &self,
        exit_code: Option<i32>,
        stdout: &str,
        stderr: &str,
    ) -> Option<String> {
        if exit_code != Some(DOCKER_RUN_FAILURE) || !stdout.is_empty() {
            return None;
        }
        // The client's own complaint is the last thing it writes
        let last = stderr.lines().rev().find(|line| !line.trim().is_empty())?;
        if !is_client_error(last) {
            return None;
        }
        Some(format!(
            "docker refused to start the container: {}",
            stderr.trim()
        ))
    }
}

/// Error line printed by the client rather than by the program
fn is_client_error(line: &str) -> bool {
    let line = line.trim_start();
    CLIENT_ERROR_PREFIXES
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::request::ResourceLimits;

    #[test]
    fn test_run_args_apply_limits() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(root.path(), "print(1)").unwrap();
        let request = ExecutionRequest::new("print(1)");
        let args = DockerBoundary::new().run_args(&workspace, &request);
        let joined = args.join(" ");

        assert!(joined.starts_with("run --rm --name tsar_"));
        assert!(joined.contains("--memory 128m"));
        assert!(joined.contains("--cpus 0.5"));
        assert!(joined.contains("--network none"));
        assert!(joined.contains("--read-only"));
        assert!(joined.contains(&format!("{}:/app:ro", workspace.dir().display())));
        assert!(joined.ends_with("python:3.12-slim python -u script.py"));
        assert!(!args.contains(&"-i".to_string()));
    }

    #[test]
    fn test_run_args_relaxed_limits_and_stdin() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(root.path(), "input()").unwrap();
        let limits = ResourceLimits {
            memory_mb: 256,
            cpu_share: 1.0,
            network_disabled: false,
            filesystem_read_only: false,
        };
        let request = ExecutionRequest::new("input()")
            .with_limits(limits)
            .with_stdin("да\n");
        let args = DockerBoundary::new()
            .with_image("python:3.11")
            .run_args(&workspace, &request);
        let joined = args.join(" ");

        assert!(joined.contains("--memory 256m"));
        assert!(joined.contains("--cpus 1"));
        assert!(!joined.contains("--network"));
        assert!(!joined.contains("--read-only"));
        assert!(joined.contains(":/app:rw"));
        assert!(joined.contains(" -i python:3.11 "));
    }

    #[test]
    fn test_launch_failure_only_for_daemon_errors() {
        let docker = DockerBoundary::new();
        assert!(docker.launch_failure(Some(1), "", "Traceback").is_none());
        assert!(docker.launch_failure(None, "", "").is_none());
        let msg = docker
            .launch_failure(
                Some(125),
                "",
                "Unable to find image 'nope:latest' locally\n\
                 docker: Error response from daemon: pull access denied.\n",
            )
            .unwrap();
        assert!(msg.contains("pull access denied"));
    }

    #[test]
    fn test_program_exit_125_is_not_launch_failure() {
        let docker = DockerBoundary::new();
        // sys.exit(125) after printing
        assert!(docker
            .launch_failure(Some(125), "program-output\n", "Traceback: SystemExit\n")
            .is_none());
        // Silent stdout, but the program wrote the stderr
        assert!(docker
            .launch_failure(Some(125), "", "Traceback: SystemExit\n")
            .is_none());
        assert!(docker.launch_failure(Some(125), "", "").is_none());
        // A client-looking line followed by program output still belongs to the program
        assert!(docker
            .launch_failure(Some(125), "", "docker: hi\nValueError: boom\n")
            .is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_does_not_wait_on_stuck_kill() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Instant;

        let dir = tempfile::tempdir().unwrap();
        let client = dir.path().join("stuck-docker");
        std::fs::write(&client, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&client, std::fs::Permissions::from_mode(0o755)).unwrap();

        let workspace = Workspace::create(dir.path(), "print(1)").unwrap();
        let docker = DockerBoundary::new().with_client(client.to_string_lossy());
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        new_session(&mut cmd);
        let mut child = cmd.spawn().unwrap();

        let started = Instant::now();
        docker.terminate(&mut child, &workspace);
        assert!(started.elapsed() < KILL_TIMEOUT + Duration::from_secs(3));
        let _ = child.wait();
    }

    #[test]
    fn test_probe_missing_client() {
        let docker = DockerBoundary::new().with_client("definitely-not-docker-tsar");
        assert!(matches!(
            docker.probe(),
            Err(TsarError::BoundaryUnavailable(_))
        ));
    }
}
