//! Pre-seeded deployment configuration.
//!
//! A `wharf.toml` can supply the values the CLI would otherwise require as
//! arguments. Discovery checks the working directory first, then the user
//! config directory (`~/.config/wharf/wharf.toml`). CLI flags override file
//! values; an absent file is not an error.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "wharf.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Target account to deploy to.
    pub account: Option<String>,
    /// Artifact source (local directory or repository URL).
    pub source: Option<String>,
    /// Node HTTP endpoint.
    pub node_url: Option<String>,
    /// Expected chain id; when set, a run against any other chain refuses to
    /// start.
    pub chain_id: Option<String>,
    /// Skip the initial deploy confirmation prompt.
    pub assume_yes: bool,
}

impl DeployConfig {
    /// Load a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Find and load the nearest config file, or return defaults.
    pub fn discover(project_root: &Path) -> anyhow::Result<Self> {
        for candidate in candidate_paths(project_root) {
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "loading config");
                return Self::load(&candidate);
            }
        }
        Ok(Self::default())
    }
}

fn candidate_paths(project_root: &Path) -> Vec<PathBuf> {
    let mut paths = vec![project_root.join(CONFIG_FILE)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("wharf").join(CONFIG_FILE));
    }
    paths
}
