//! Low-level process helpers shared by the boundaries and the executor

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

/// How often a waiting loop re-checks the child
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Start the child in its own session so the whole process group can be
/// killed at once, grandchildren included.
pub fn new_session(cmd: &mut Command) {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }
    #[cfg(not(unix))]
    let _ = cmd;
}

/// Cap the child's address space
pub fn limit_address_space(cmd: &mut Command, bytes: u64) {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        if bytes == 0 {
            return;
        }
        unsafe {
            cmd.pre_exec(move || {
                let limit = libc::rlimit {
                    rlim_cur: bytes as libc::rlim_t,
                    rlim_max: bytes as libc::rlim_t,
                };
                if libc::setrlimit(libc::RLIMIT_AS, &limit) != 0 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }
    #[cfg(not(unix))]
    let _ = (cmd, bytes);
}

/// SIGKILL the child's process group, falling back to the child alone
pub fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    {
        let pgid = child.id() as libc::pid_t;
        if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 {
            return;
        }
        log::debug!(
            "killpg({}) failed: {}, killing child only",
            pgid,
            io::Error::last_os_error()
        );
    }
    if let Err(e) = child.kill() {
        // Already exited and reaped is fine
        if e.kind() != io::ErrorKind::InvalidInput {
            log::warn!("Failed to kill process {}: {}", child.id(), e);
        }
    }
}

/// Wait for a child until `timeout`, killing it if the deadline passes.
/// Returns `None` on timeout.
pub fn wait_with_deadline(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            kill_process_group(child);
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Resolve a program name against `PATH` the way a shell would
pub fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|path| path.is_file())
    })
}
