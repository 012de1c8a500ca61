//! Deployment error taxonomy.
//!
//! Fatal errors abort a run before any chain mutation. Per-operation
//! submission failures are not represented here; the pipeline catches them
//! individually and keeps going (see [`crate::pipeline`]).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which of the two artifact roles a resolver error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Bytecode,
    Schema,
}

impl ArtifactKind {
    /// File extension used to recognize this artifact kind.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Bytecode => "wasm",
            ArtifactKind::Schema => "abi",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Bytecode => write!(f, "bytecode (.wasm)"),
            ArtifactKind::Schema => write!(f, "interface schema (.abi)"),
        }
    }
}

/// Fatal deployment errors.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The resolved directory holds no file of the required kind.
    #[error("no {kind} artifact found in {}", dir.display())]
    ArtifactNotFound { kind: ArtifactKind, dir: PathBuf },

    /// The resolved directory holds more than one file of the required kind.
    #[error("multiple {kind} artifacts found in {}: {}", dir.display(), names.join(", "))]
    AmbiguousArtifacts {
        kind: ArtifactKind,
        dir: PathBuf,
        names: Vec<String>,
    },

    /// A remote artifact fetch returned a non-200 status.
    #[error("download failed with HTTP {status}: {url}")]
    DownloadFailed { url: String, status: u16 },

    /// A remote artifact fetch exceeded the fixed fetch timeout.
    #[error("request timed out after {seconds}s: {url}")]
    RequestTimeout { url: String, seconds: u64 },

    /// The connected chain is not the one the run was configured for.
    #[error("connected chain id {actual} does not match configured chain id {expected}")]
    NetworkMismatch { expected: String, actual: String },
}
