//! Execution request and resource limits

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wall-clock budget for a run
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Resource constraints the isolation boundary must apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Hard memory ceiling in megabytes
    pub memory_mb: u64,
    /// Fraction of a CPU the program may use
    pub cpu_share: f64,
    pub network_disabled: bool,
    pub filesystem_read_only: bool,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_mb: 128,
            cpu_share: 0.5,
            network_disabled: true,
            filesystem_read_only: true,
        }
    }
}

impl ResourceLimits {
    pub fn memory_bytes(&self) -> u64 {
        self.memory_mb.saturating_mul(1024 * 1024)
    }
}

/// One program to run
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub source_code: String,
    pub timeout_seconds: u64,
    pub limits: ResourceLimits,
    /// Data piped to the program's standard input
    pub stdin: Option<String>,
}

impl ExecutionRequest {
    pub fn new(source_code: impl Into<String>) -> Self {
        Self {
            source_code: source_code.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            limits: ResourceLimits::default(),
            stdin: None,
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
