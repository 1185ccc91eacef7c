//! Isolation boundaries
//!
//! A boundary turns a prepared workspace into a launch command with the
//! request's resource limits applied, and knows how to forcibly stop what it
//! launched. The executor does not care which technology sits behind it.

mod docker;
mod host;

use std::process::{Child, Command};

pub use docker::{DockerBoundary, DEFAULT_IMAGE};
pub use host::{HostBoundary, DEFAULT_INTERPRETER};

use super::process::kill_process_group;
use super::request::ExecutionRequest;
use super::workspace::Workspace;
use crate::error::Result;

pub trait IsolationBoundary: Send + Sync {
    /// Short name for logs and reports
    fn name(&self) -> &str;

    /// Check the boundary can launch programs at all
    fn probe(&self) -> Result<()>;

    /// Command that runs the workspace's script under the request's limits.
    /// The executor sets up stdio and the process session.
    fn command(&self, workspace: &Workspace, request: &ExecutionRequest) -> Command;

    /// Forcibly stop a launched program. No grace period.
    fn terminate(&self, child: &mut Child, _workspace: &Workspace) {
        kill_process_group(child);
    }

    /// Tell a program failure apart from the boundary refusing to run it.
    /// Returns the launch error message for the latter. Anything the program
    /// may have produced counts against a launch failure.
    fn launch_failure(
        &self,
        _exit_code: Option<i32>,
        _stdout: &str,
        _stderr: &str,
    ) -> Option<String> {
        None
    }
}

impl<B: IsolationBoundary + ?Sized> IsolationBoundary for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn probe(&self) -> Result<()> {
        (**self).probe()
    }

    fn command(&self, workspace: &Workspace, request: &ExecutionRequest) -> Command {
        (**self).command(workspace, request)
    }

    fn terminate(&self, child: &mut Child, workspace: &Workspace) {
        (**self).terminate(child, workspace)
    }

    fn launch_failure(
        &self,
        exit_code: Option<i32>,
        stdout: &str,
        stderr: &str,
    ) -> Option<String> {
        (**self).launch_failure(exit_code, stdout, stderr)
    }
}
