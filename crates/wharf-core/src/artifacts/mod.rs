//! Resolved contract artifacts.

pub mod resolver;

use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::TempDir;

/// The two files a deployment needs, plus the staging directory that holds
/// them when they were fetched from a remote source.
///
/// The staging directory lives exactly as long as one pipeline run. The
/// pipeline closes it explicitly in its cleanup step; dropping the set is the
/// backstop that removes it on early-error paths.
#[derive(Debug)]
pub struct ArtifactSet {
    pub bytecode: PathBuf,
    pub schema: PathBuf,
    staging: Option<TempDir>,
}

impl ArtifactSet {
    /// Artifacts resolved from a local directory; nothing to clean up.
    pub fn local(bytecode: PathBuf, schema: PathBuf) -> Self {
        Self {
            bytecode,
            schema,
            staging: None,
        }
    }

    /// Artifacts staged into a temporary directory from a remote source.
    pub fn staged(bytecode: PathBuf, schema: PathBuf, staging: TempDir) -> Self {
        Self {
            bytecode,
            schema,
            staging: Some(staging),
        }
    }

    pub fn is_staged(&self) -> bool {
        self.staging.is_some()
    }

    pub fn staging_path(&self) -> Option<&Path> {
        self.staging.as_ref().map(|dir| dir.path())
    }

    /// Remove the staging directory, if one was created.
    pub fn cleanup(self) -> anyhow::Result<()> {
        if let Some(staging) = self.staging {
            let path = staging.path().to_path_buf();
            staging
                .close()
                .with_context(|| format!("Failed to remove staging directory {}", path.display()))?;
        }
        Ok(())
    }
}
