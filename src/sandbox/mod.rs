//! Sandboxed execution of translated programs
//!
//! Each run gets its own workspace and child process:
//! - the source is written to a fresh `tsar_<uuid>` directory
//! - an [`IsolationBoundary`] launches it under memory, CPU and network limits
//! - stdout and stderr are drained concurrently while a deadline is enforced
//! - the workspace is removed whatever happened

pub mod boundary;
mod executor;
mod process;
mod request;
mod result;
mod sink;
mod workspace;

pub use boundary::{DockerBoundary, HostBoundary, IsolationBoundary};
pub use executor::{CancelToken, Executor};
pub use request::{ExecutionRequest, ResourceLimits, DEFAULT_TIMEOUT_SECS};
pub use result::{ExecutionResult, RunStatus};
pub use sink::{NullSink, OutputSink};
pub use workspace::{Workspace, SCRIPT_NAME, WORKSPACE_PREFIX};
