//! Execution result

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunStatus {
    /// The program ran to its own exit. A non-zero code is still a
    /// completed run; the program's error is in stderr.
    Completed { exit_code: Option<i32> },
    TimedOut,
    Cancelled,
    /// The workspace could not be created; nothing was launched
    PreparationFailed,
    /// The isolation boundary could not start or rejected the program
    LaunchFailed,
}

impl RunStatus {
    /// Whether the run failed before the program could produce output
    pub fn is_infrastructure_failure(&self) -> bool {
        matches!(self, RunStatus::PreparationFailed | RunStatus::LaunchFailed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Completed { exit_code: Some(code) } => write!(f, "exited with code {}", code),
            RunStatus::Completed { exit_code: None } => write!(f, "killed by signal"),
            RunStatus::TimedOut => write!(f, "timed out"),
            RunStatus::Cancelled => write!(f, "cancelled"),
            RunStatus::PreparationFailed => write!(f, "preparation failed"),
            RunStatus::LaunchFailed => write!(f, "launch failed"),
        }
    }
}

/// Captured outcome of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub error: Option<String>,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl ExecutionResult {
    pub(crate) fn failed(status: RunStatus, error: String, started_at: DateTime<Utc>) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            error: Some(error),
            status,
            started_at,
            duration: elapsed_since(started_at),
        }
    }

    /// True when the program finished and wrote nothing at all
    pub fn is_silent(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty() && self.error.is_none()
    }

    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Completed { exit_code: Some(0) }
    }
}

pub(crate) fn elapsed_since(started_at: DateTime<Utc>) -> Duration {
    (Utc::now() - started_at).to_std().unwrap_or_default()
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_has_empty_streams() {
        let result = ExecutionResult::failed(
            RunStatus::LaunchFailed,
            "docker missing".to_string(),
            Utc::now(),
        );
        assert!(result.stdout.is_empty());
        assert!(result.stderr.is_empty());
        assert!(!result.is_silent());
        assert!(result.status.is_infrastructure_failure());
    }

    #[test]
    fn test_status_serializes_tagged() {
        let json = serde_json::to_value(RunStatus::Completed { exit_code: Some(1) }).unwrap();
        assert_eq!(json["kind"], "completed");
        assert_eq!(json["exit_code"], 1);
        let json = serde_json::to_value(RunStatus::TimedOut).unwrap();
        assert_eq!(json["kind"], "timed_out");
    }
}
