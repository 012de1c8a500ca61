//! Deployment pipeline.
//!
//! Orchestrates one deployment run end to end: confirmation, artifact
//! resolution, schema diffing, data-loss risk probing, a second confirmation
//! when risk is found, then the ordered chain submissions (code before
//! schema, then the optional inline-action enablement) and staging cleanup.
//!
//! Submission failures are deliberately non-fatal: code and schema
//! replacement are independent chain operations, and one failing must not
//! block the other from being attempted. Fatal errors (resolution, network
//! mismatch) abort before any chain mutation.

use anyhow::Context;

use crate::artifacts::resolver::ArtifactResolver;
use crate::artifacts::ArtifactSet;
use crate::chain::{self, ChainReader, ChainWriter, Operation, SubmitReceipt};
use crate::errors::DeployError;
use crate::hints::HintCatalog;
use crate::risk::assess_risk;
use crate::schema::codec::encode_schema;
use crate::schema::diff::{diff, SchemaDiff};
use crate::schema::InterfaceSchema;

/// Source of yes/no answers for the two confirmation prompts.
///
/// Production uses a terminal prompt; tests inject a scripted source. Both
/// prompts default to "no" when automation leaves them unanswered.
pub trait DecisionSource {
    fn confirm(&mut self, prompt: &str) -> anyhow::Result<bool>;
}

/// Options for one pipeline run.
///
/// `code_only` and `schema_only` are mutually exclusive by convention, but
/// the pipeline does not enforce that: setting both skips both submissions
/// and the run deploys nothing. This quirk is deliberate and documented, not
/// a bug to fix.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Remove code and schema instead of deploying new ones.
    pub clear: bool,
    /// Submit only the bytecode replacement.
    pub code_only: bool,
    /// Submit only the schema replacement.
    pub schema_only: bool,
    /// Run the follow-up inline-action enablement.
    pub activate: bool,
    /// Skip the initial confirmation prompt (pre-seeded configuration).
    pub pre_confirmed: bool,
    /// Refuse to run against any chain but this one.
    pub expected_chain_id: Option<String>,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            clear: false,
            code_only: false,
            schema_only: false,
            activate: true,
            pre_confirmed: false,
            expected_chain_id: None,
        }
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStatus {
    #[default]
    Done,
    Aborted,
}

/// One classified, non-fatal submission failure.
#[derive(Debug, Clone)]
pub struct SubmissionFailure {
    pub message: String,
    pub hint: Option<String>,
}

/// Result of one attempted chain operation.
#[derive(Debug)]
pub struct SubmissionReport {
    pub operation: String,
    pub result: Result<SubmitReceipt, SubmissionFailure>,
}

impl SubmissionReport {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a run produced, terminal state included.
#[derive(Debug, Default)]
pub struct DeployOutcome {
    pub status: PipelineStatus,
    pub submissions: Vec<SubmissionReport>,
    /// Diff against the deployed schema, when one existed.
    pub diff: Option<SchemaDiff>,
    /// Changed tables confirmed to hold data.
    pub at_risk: Vec<String>,
    pub warnings: Vec<String>,
}

impl DeployOutcome {
    fn aborted() -> Self {
        Self {
            status: PipelineStatus::Aborted,
            ..Self::default()
        }
    }

    pub fn failed_submissions(&self) -> usize {
        self.submissions.iter().filter(|s| !s.succeeded()).count()
    }
}

/// Dry-run report for the `diff` command.
#[derive(Debug, Default)]
pub struct PreviewReport {
    /// Whether the account had a deployed schema to diff against.
    pub existing: bool,
    pub diff: SchemaDiff,
    pub removed_at_risk: Vec<String>,
    pub updated_at_risk: Vec<String>,
}

/// The deployment pipeline, generic over the chain client and the operator
/// decision source.
pub struct DeployPipeline<C, D> {
    chain: C,
    decisions: D,
    resolver: ArtifactResolver,
    hints: HintCatalog,
}

impl<C, D> DeployPipeline<C, D>
where
    C: ChainReader + ChainWriter,
    D: DecisionSource,
{
    pub fn new(chain: C, decisions: D) -> anyhow::Result<Self> {
        Ok(Self {
            chain,
            decisions,
            resolver: ArtifactResolver::new()?,
            hints: HintCatalog::chain_defaults()?,
        })
    }

    /// Run one deployment. `source` is ignored in clear mode.
    pub async fn run(
        &mut self,
        account: &str,
        source: &str,
        options: &DeployOptions,
    ) -> anyhow::Result<DeployOutcome> {
        self.check_network(options.expected_chain_id.as_deref()).await?;

        if !options.pre_confirmed {
            let prompt = format!("About to deploy to account {account}. Continue?");
            if !self.decisions.confirm(&prompt)? {
                tracing::info!("deployment declined by operator");
                return Ok(DeployOutcome::aborted());
            }
        }

        let mut outcome = DeployOutcome::default();
        let mut artifacts: Option<ArtifactSet> = None;
        let mut candidate: Option<InterfaceSchema> = None;

        // Clear mode goes straight to submission with empty payloads.
        if !options.clear {
            let resolved = self.resolver.resolve(source).await?;
            // Parse failures below drop `resolved`, which removes any staging
            // directory; explicit cleanup happens on the paths that keep it.
            let parsed = InterfaceSchema::from_file(&resolved.schema)?;

            if let Some(existing) = self.fetch_deployed(account).await {
                let schema_diff = diff(&existing, &parsed);
                let (removed_risk, updated_risk) = if schema_diff.is_empty() {
                    (Vec::new(), Vec::new())
                } else {
                    let removed: Vec<String> = schema_diff.removed.iter().cloned().collect();
                    let updated: Vec<String> = schema_diff.updated.iter().cloned().collect();
                    (
                        assess_risk(&self.chain, account, &removed).await,
                        assess_risk(&self.chain, account, &updated).await,
                    )
                };
                outcome.at_risk = removed_risk.iter().chain(&updated_risk).cloned().collect();

                if let Some(message) = risk_message(&removed_risk, &updated_risk) {
                    tracing::warn!("{message}");
                    let prompt =
                        format!("{message}. Data in these tables may be lost. Continue anyway?");
                    if !self.decisions.confirm(&prompt)? {
                        tracing::info!("deployment declined at risk confirmation");
                        outcome.status = PipelineStatus::Aborted;
                        outcome.diff = Some(schema_diff);
                        cleanup_staging(resolved, &mut outcome.warnings);
                        return Ok(outcome);
                    }
                } else {
                    tracing::info!("schema changes touch no populated tables; no data at risk");
                }
                outcome.diff = Some(schema_diff);
            } else {
                tracing::info!(account = %account, "no deployed schema found; skipping diff");
            }

            artifacts = Some(resolved);
            candidate = Some(parsed);
        }

        // Code strictly before schema; each failure is caught, classified and
        // reported without stopping the remaining operations.
        if !options.schema_only {
            let wasm = match &artifacts {
                Some(set) => std::fs::read(&set.bytecode).with_context(|| {
                    format!("Failed to read bytecode: {}", set.bytecode.display())
                })?,
                None => Vec::new(),
            };
            self.log_code_digest(account, &wasm).await;
            self.submit_step(chain::set_code(account, &wasm), &mut outcome).await;
        }

        if !options.code_only {
            let abi = candidate.as_ref().map(encode_schema).unwrap_or_default();
            self.submit_step(chain::set_schema(account, &abi), &mut outcome).await;
        }

        if options.code_only && options.schema_only {
            let msg = "both code-only and schema-only requested; nothing was submitted";
            tracing::warn!("{msg}");
            outcome.warnings.push(msg.to_string());
        }

        if options.activate {
            self.submit_step(chain::enable_inline_actions(account), &mut outcome)
                .await;
        }

        if let Some(artifacts) = artifacts {
            cleanup_staging(artifacts, &mut outcome.warnings);
        }
        Ok(outcome)
    }

    /// Resolve and diff without submitting anything. The network precondition
    /// applies here too: a report from the wrong chain is worse than none.
    pub async fn preview(
        &mut self,
        account: &str,
        source: &str,
        expected_chain_id: Option<&str>,
    ) -> anyhow::Result<PreviewReport> {
        self.check_network(expected_chain_id).await?;

        let resolved = self.resolver.resolve(source).await?;
        let candidate = InterfaceSchema::from_file(&resolved.schema)?;

        let mut report = PreviewReport::default();
        if let Some(existing) = self.fetch_deployed(account).await {
            report.existing = true;
            report.diff = diff(&existing, &candidate);
            let removed: Vec<String> = report.diff.removed.iter().cloned().collect();
            let updated: Vec<String> = report.diff.updated.iter().cloned().collect();
            report.removed_at_risk = assess_risk(&self.chain, account, &removed).await;
            report.updated_at_risk = assess_risk(&self.chain, account, &updated).await;
        }

        let mut warnings = Vec::new();
        cleanup_staging(resolved, &mut warnings);
        Ok(report)
    }

    /// Refuse to run against the wrong chain when a chain id is pre-seeded.
    async fn check_network(&self, expected: Option<&str>) -> anyhow::Result<()> {
        let Some(expected) = expected else {
            return Ok(());
        };
        let info = self
            .chain
            .chain_info()
            .await
            .context("Failed to query chain info")?;
        if info.chain_id != expected {
            return Err(DeployError::NetworkMismatch {
                expected: expected.to_string(),
                actual: info.chain_id,
            }
            .into());
        }
        tracing::debug!(chain_id = %info.chain_id, "network precondition satisfied");
        Ok(())
    }

    /// Fetch the deployed schema; unreadable counts as "none" because a first
    /// deployment has nothing to diff against.
    async fn fetch_deployed(&self, account: &str) -> Option<InterfaceSchema> {
        match self.chain.deployed_schema(account).await {
            Ok(schema) => schema,
            Err(err) => {
                tracing::debug!(account = %account, "deployed schema not readable: {err:#}");
                None
            }
        }
    }

    async fn log_code_digest(&self, account: &str, wasm: &[u8]) {
        if wasm.is_empty() {
            return;
        }
        let digest = blake3::hash(wasm).to_hex().to_string();
        tracing::info!(bytes = wasm.len(), digest = %digest, "submitting bytecode");
        match self.chain.code_digest(account).await {
            Ok(Some(current)) => {
                tracing::debug!(current = %current, "account already has code deployed")
            }
            Ok(None) => tracing::debug!("account has no code deployed yet"),
            Err(err) => tracing::debug!("code digest lookup failed: {err:#}"),
        }
    }

    async fn submit_step(&self, operation: Operation, outcome: &mut DeployOutcome) {
        let name = operation.name.clone();
        match self.chain.submit(operation).await {
            Ok(receipt) => {
                tracing::info!(
                    operation = %name,
                    transaction = %receipt.transaction_id,
                    "operation submitted"
                );
                outcome.submissions.push(SubmissionReport {
                    operation: name,
                    result: Ok(receipt),
                });
            }
            Err(err) => {
                let message = format!("{err:#}");
                let hint = self.hints.classify(&message).map(str::to_string);
                tracing::error!(operation = %name, "submission failed: {message}");
                if let Some(hint) = &hint {
                    tracing::warn!("hint: {hint}");
                }
                outcome.submissions.push(SubmissionReport {
                    operation: name,
                    result: Err(SubmissionFailure { message, hint }),
                });
            }
        }
    }
}

/// Grouped warning for changed tables that hold data, `None` when no table
/// is at risk.
fn risk_message(removed: &[String], updated: &[String]) -> Option<String> {
    let mut sections = Vec::new();
    if !removed.is_empty() {
        sections.push(format!("removed: {}", removed.join(", ")));
    }
    if !updated.is_empty() {
        sections.push(format!("updated: {}", updated.join(", ")));
    }
    if sections.is_empty() {
        None
    } else {
        Some(format!(
            "tables holding data would be affected ({})",
            sections.join("; ")
        ))
    }
}

fn cleanup_staging(artifacts: ArtifactSet, warnings: &mut Vec<String>) {
    let staged = artifacts.staging_path().map(|p| p.display().to_string());
    match artifacts.cleanup() {
        Ok(()) => {
            if let Some(path) = staged {
                tracing::debug!(path = %path, "removed staging directory");
            }
        }
        Err(err) => {
            let msg = format!("staging cleanup failed: {err:#}");
            tracing::warn!("{msg}");
            warnings.push(msg);
        }
    }
}
