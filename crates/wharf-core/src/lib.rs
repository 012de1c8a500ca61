//! Wharf Core Library
//!
//! Domain logic for deploying smart-contract artifacts (bytecode + interface
//! schema) to accounts on a running chain: artifact resolution, schema
//! diffing, data-loss risk probing, and the risk-gated deployment pipeline.

pub mod artifacts;
pub mod chain;
pub mod config;
pub mod errors;
pub mod hints;
pub mod pipeline;
pub mod risk;
pub mod schema;

/// Re-exports of commonly used types
pub mod prelude {
    // Artifacts
    pub use crate::artifacts::resolver::ArtifactResolver;
    pub use crate::artifacts::ArtifactSet;

    // Chain
    pub use crate::chain::http::HttpChainClient;
    pub use crate::chain::{
        Authorization, ChainInfo, ChainReader, ChainWriter, Operation, SubmitReceipt,
    };

    // Schema
    pub use crate::schema::diff::{diff, SchemaDiff};
    pub use crate::schema::{Field, InterfaceSchema, StructDef, TableDef};

    // Pipeline
    pub use crate::pipeline::{
        DecisionSource, DeployOptions, DeployOutcome, DeployPipeline, PipelineStatus,
        PreviewReport, SubmissionReport,
    };

    // Supporting pieces
    pub use crate::config::DeployConfig;
    pub use crate::errors::{ArtifactKind, DeployError};
    pub use crate::hints::HintCatalog;
    pub use crate::risk::assess_risk;
}
