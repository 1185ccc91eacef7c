//! Unconfined host execution
//!
//! Runs the interpreter directly on the host inside the workspace directory.
//! Only the memory ceiling is enforced (through `RLIMIT_AS`); networking,
//! CPU share and the read-only view are not. Meant for trusted code and
//! for environments without a container runtime.

use std::process::Command;

use super::IsolationBoundary;
use crate::error::{Result, TsarError};
use crate::sandbox::process::{find_program, limit_address_space};
use crate::sandbox::request::ExecutionRequest;
use crate::sandbox::workspace::{Workspace, SCRIPT_NAME};

pub const DEFAULT_INTERPRETER: &str = "python3";

#[derive(Debug, Clone)]
pub struct HostBoundary {
    program: String,
    args: Vec<String>,
}

impl HostBoundary {
    /// Run scripts with `program [args..] script.py`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// The default Python interpreter with unbuffered output
    pub fn python() -> Self {
        Self::new(DEFAULT_INTERPRETER).with_args(["-u"])
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl IsolationBoundary for HostBoundary {
    fn name(&self) -> &str {
        "host"
    }

    fn probe(&self) -> Result<()> {
        find_program(&self.program).map(|_| ()).ok_or_else(|| {
            TsarError::BoundaryUnavailable(format!("'{}' not found in PATH", self.program))
        })
    }

    fn command(&self, workspace: &Workspace, request: &ExecutionRequest) -> Command {
        let limits = &request.limits;
        if limits.network_disabled || limits.filesystem_read_only {
            log::warn!(
                "host boundary does not restrict network or filesystem access for {}",
                workspace.id()
            );
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(SCRIPT_NAME)
            .current_dir(workspace.dir());
        limit_address_space(&mut cmd, limits.memory_bytes());
        cmd
    }
}
