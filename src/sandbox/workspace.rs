//! Ephemeral workspace holding one generated source file
//!
//! A workspace is a uniquely named directory owned by a single run. It is
//! removed exactly once, when the value is dropped, whatever path the run
//! took.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{Result, TsarError};

/// Name of the generated file inside every workspace
pub const SCRIPT_NAME: &str = "script.py";

/// Prefix of workspace directory names
pub const WORKSPACE_PREFIX: &str = "tsar_";

#[derive(Debug)]
pub struct Workspace {
    id: String,
    dir: PathBuf,
    script: PathBuf,
}

impl Workspace {
    /// Create a fresh workspace under `root` and write `source` into it
    pub fn create(root: &Path, source: &str) -> Result<Self> {
        let id = format!("{}{}", WORKSPACE_PREFIX, Uuid::new_v4().simple());
        let dir = root.join(&id);

        fs::create_dir_all(&dir).map_err(|e| {
            TsarError::Preparation(format!(
                "Failed to create workspace {}: {}",
                dir.display(),
                e
            ))
        })?;

        // From here on Drop owns the directory
        let workspace = Self {
            id,
            script: dir.join(SCRIPT_NAME),
            dir,
        };

        fs::write(&workspace.script, source).map_err(|e| {
            TsarError::Preparation(format!(
                "Failed to write {}: {}",
                workspace.script.display(),
                e
            ))
        })?;

        log::debug!("Prepared workspace {}", workspace.dir.display());
        Ok(workspace)
    }

    /// Unique id, also used to name the container
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn script(&self) -> &Path {
        &self.script
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => log::debug!("Removed workspace {}", self.dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove workspace {}: {}",
                self.dir.display(),
                e
            ),
        }
    }
}
