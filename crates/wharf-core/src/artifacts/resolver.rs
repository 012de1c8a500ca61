//! Artifact source resolution.
//!
//! A source is either a local directory holding the build output or a GitHub
//! repository URL. Remote sources are staged into a fresh temporary directory
//! by fetching `{name}.wasm` and `{name}.abi` from the repository's raw-file
//! host; either way the resolved directory must then contain exactly one
//! bytecode file and one schema file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use url::Url;

use crate::errors::{ArtifactKind, DeployError};

use super::ArtifactSet;

/// Fixed per-fetch timeout for remote artifacts.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const RAW_HOST: &str = "https://raw.githubusercontent.com";

/// Resolves a source string into a ready-to-deploy [`ArtifactSet`].
#[derive(Debug)]
pub struct ArtifactResolver {
    client: reqwest::Client,
}

impl ArtifactResolver {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("wharf/0.1.0")
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Resolve a local directory path or a GitHub repository URL.
    ///
    /// Remote resolution proceeds to the directory scan even when a fetch
    /// fails: the missing file then trips the not-found check, which keeps
    /// the two fetches independent of each other.
    pub async fn resolve(&self, source: &str) -> anyhow::Result<ArtifactSet> {
        if let Some(remote) = RemoteSource::parse(source)? {
            let staging = tempfile::tempdir().context("Failed to create staging directory")?;
            tracing::debug!(
                source = %source,
                staging = %staging.path().display(),
                "staging remote artifacts"
            );

            let bytecode_url = remote.bytecode_url();
            let schema_url = remote.schema_url();
            let (code, schema) = tokio::join!(
                self.fetch_file(&bytecode_url, staging.path()),
                self.fetch_file(&schema_url, staging.path()),
            );
            for result in [code, schema] {
                if let Err(err) = result {
                    tracing::warn!("artifact fetch failed: {err:#}");
                }
            }

            let (bytecode, schema) = scan_artifacts(staging.path())?;
            Ok(ArtifactSet::staged(bytecode, schema, staging))
        } else {
            let dir = expand_local(source)?;
            let (bytecode, schema) = scan_artifacts(&dir)?;
            Ok(ArtifactSet::local(bytecode, schema))
        }
    }

    /// Download one file into `dir`, keeping its URL basename.
    async fn fetch_file(&self, url: &str, dir: &Path) -> anyhow::Result<()> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow::Error::from(DeployError::RequestTimeout {
                    url: url.to_string(),
                    seconds: FETCH_TIMEOUT.as_secs(),
                })
            } else {
                anyhow::Error::from(e).context(format!("Failed to fetch {url}"))
            }
        })?;

        if !response.status().is_success() {
            return Err(DeployError::DownloadFailed {
                url: url.to_string(),
                status: response.status().as_u16(),
            }
            .into());
        }

        let name = url.rsplit('/').next().unwrap_or("artifact");
        let dest = dir.join(name);
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;
        std::fs::write(&dest, &bytes)
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        tracing::debug!(url = %url, bytes = bytes.len(), "fetched artifact");
        Ok(())
    }
}

/// A GitHub repository location mapped to its raw-file equivalent.
///
/// `https://github.com/org/repo/tree/branch/path/to/token` becomes raw base
/// `https://raw.githubusercontent.com/org/repo/branch/path/to/token` with
/// contract basename `token` (the trailing path component).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemoteSource {
    raw_base: String,
    name: String,
}

impl RemoteSource {
    /// Returns `None` when the source is not a URL at all (local path).
    pub(crate) fn parse(source: &str) -> anyhow::Result<Option<Self>> {
        if !source.starts_with("http://") && !source.starts_with("https://") {
            return Ok(None);
        }

        let url = Url::parse(source).with_context(|| format!("Invalid source URL: {source}"))?;
        let host = url.host_str().unwrap_or("");
        if host != "github.com" && host != "www.github.com" {
            anyhow::bail!("Unsupported repository host: {host}");
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        let [org, repo, rest @ ..] = segments.as_slice() else {
            anyhow::bail!("Repository URL must include organization and repository: {source}");
        };

        // "/tree/<ref>" is a web-UI path segment with no raw-file counterpart.
        let (reference, subpath) = match rest {
            ["tree", reference, subpath @ ..] => (*reference, subpath),
            [] => ("main", &[] as &[&str]),
            _ => anyhow::bail!("Unsupported repository URL layout: {source}"),
        };

        let name = subpath.last().copied().unwrap_or(*repo).to_string();
        let mut raw_base = format!("{RAW_HOST}/{org}/{repo}/{reference}");
        if !subpath.is_empty() {
            raw_base.push('/');
            raw_base.push_str(&subpath.join("/"));
        }

        Ok(Some(Self { raw_base, name }))
    }

    pub(crate) fn bytecode_url(&self) -> String {
        format!("{}/{}.{}", self.raw_base, self.name, ArtifactKind::Bytecode.extension())
    }

    pub(crate) fn schema_url(&self) -> String {
        format!("{}/{}.{}", self.raw_base, self.name, ArtifactKind::Schema.extension())
    }
}

/// Expand `~/` and relative local paths.
fn expand_local(source: &str) -> anyhow::Result<PathBuf> {
    if let Some(rest) = source.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(source))
}

/// Find exactly one bytecode file and one schema file in `dir`.
fn scan_artifacts(dir: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read artifact directory: {}", dir.display()))?;

    let mut bytecode = Vec::new();
    let mut schemas = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read directory entry in {}", dir.display()))?
            .path();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext == ArtifactKind::Bytecode.extension() => bytecode.push(path),
            Some(ext) if ext == ArtifactKind::Schema.extension() => schemas.push(path),
            _ => {}
        }
    }
    bytecode.sort();
    schemas.sort();

    let bytecode = pick_single(bytecode, ArtifactKind::Bytecode, dir)?;
    let schema = pick_single(schemas, ArtifactKind::Schema, dir)?;
    Ok((bytecode, schema))
}

fn pick_single(
    mut found: Vec<PathBuf>,
    kind: ArtifactKind,
    dir: &Path,
) -> Result<PathBuf, DeployError> {
    match found.len() {
        0 => Err(DeployError::ArtifactNotFound {
            kind,
            dir: dir.to_path_buf(),
        }),
        1 => Ok(found.remove(0)),
        _ => Err(DeployError::AmbiguousArtifacts {
            kind,
            dir: dir.to_path_buf(),
            names: found
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect(),
        }),
    }
}
