//! Per-run temporary workspaces.
//!
//! Each pipeline run gets its own directory so concurrent runs never share
//! engine input or output files.

use chrono::Utc;
use deck_core::{Error, InputFormat, LogConfig, Result};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "deck";

/// Base name the input is staged under inside a workspace.
pub const STAGED_INPUT_STEM: &str = "input";

/// Creates and removes workspaces under a root directory.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
    log: LogConfig,
}

impl WorkspaceManager {
    /// Workspaces under the platform temp directory.
    pub fn new(log: LogConfig) -> Self {
        Self::with_root(std::env::temp_dir(), log)
    }

    pub fn with_root(root: impl Into<PathBuf>, log: LogConfig) -> Self {
        Self {
            root: root.into(),
            log,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh, uniquely named workspace directory.
    pub async fn create(&self) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            Error::Workspace(format!("cannot create {}: {}", self.root.display(), e))
        })?;

        let path = self.root.join(workspace_name());
        // `create_dir` rather than `create_dir_all`: an existing directory
        // means a name collision and must not be reused.
        tokio::fs::create_dir(&path)
            .await
            .map_err(|e| Error::Workspace(format!("cannot create {}: {}", path.display(), e)))?;

        self.log.debug(format_args!("Created workspace {}", path.display()));
        Ok(path)
    }

    /// Remove a workspace and everything in it. A missing path is not an error.
    pub async fn destroy(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => {
                self.log.debug(format_args!("Removed workspace {}", path.display()));
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Workspace(format!(
                "cannot remove {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Copy `source` into the workspace as `input.<ext>`.
    pub async fn copy_into(
        &self,
        workspace: &Path,
        source: &Path,
        format: InputFormat,
    ) -> Result<PathBuf> {
        let target = workspace.join(format!("{}.{}", STAGED_INPUT_STEM, format.extension()));
        tokio::fs::copy(source, &target).await.map_err(|e| {
            Error::Workspace(format!(
                "cannot copy {} into {}: {}",
                source.display(),
                workspace.display(),
                e
            ))
        })?;

        self.log.trace(format_args!(
            "Staged {} as {}",
            source.display(),
            target.display()
        ));
        Ok(target)
    }
}

fn workspace_name() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        WORKSPACE_PREFIX,
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}
