//! Wharf - Contract Deployment Orchestrator
//!
//! Usage:
//!   wharf deploy <account> [source]   # deploy bytecode + schema
//!   wharf clear <account>             # remove deployed code + schema
//!   wharf diff <account> [source]     # dry-run: schema diff + risk report

mod prompt;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wharf_core::chain::http::HttpChainClient;
use wharf_core::config::DeployConfig;
use wharf_core::pipeline::{
    DeployOptions, DeployOutcome, DeployPipeline, PipelineStatus, PreviewReport,
};

use crate::prompt::TerminalDecisions;

const DEFAULT_NODE_URL: &str = "http://127.0.0.1:8888";

#[derive(Parser)]
#[command(name = "wharf")]
#[command(about = "Contract deployment orchestrator", long_about = None)]
struct Cli {
    /// Node HTTP endpoint (falls back to wharf.toml, then localhost)
    #[arg(long, global = true)]
    node: Option<String>,

    /// Refuse to run unless the connected chain has this id
    #[arg(long, global = true, value_name = "CHAIN_ID")]
    network: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy bytecode and interface schema to an account
    Deploy {
        /// Target account (falls back to wharf.toml)
        account: Option<String>,
        /// Local build directory or GitHub repository URL
        source: Option<String>,

        /// Submit only the bytecode replacement
        ///
        /// Combining --code-only with --schema-only submits nothing; the
        /// pipeline keeps that combination as-is rather than guessing which
        /// flag was meant.
        #[arg(long)]
        code_only: bool,

        /// Submit only the schema replacement
        #[arg(long)]
        schema_only: bool,

        /// Skip the follow-up inline-action enablement
        #[arg(long)]
        no_activate: bool,

        /// Skip the initial confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Remove deployed code and schema from an account
    Clear {
        /// Target account (falls back to wharf.toml)
        account: Option<String>,

        /// Skip the follow-up inline-action enablement
        #[arg(long)]
        no_activate: bool,

        /// Skip the initial confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show schema changes and at-risk tables without deploying
    Diff {
        /// Target account (falls back to wharf.toml)
        account: Option<String>,
        /// Local build directory or GitHub repository URL
        source: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wharf=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = DeployConfig::discover(&std::env::current_dir()?)?;

    let node = cli
        .node
        .or_else(|| config.node_url.clone())
        .unwrap_or_else(|| DEFAULT_NODE_URL.to_string());
    let chain = HttpChainClient::new(&node)?;
    tracing::debug!(node = %chain.endpoint(), "using node endpoint");
    let expected_chain_id = cli.network.or_else(|| config.chain_id.clone());

    match cli.command {
        Commands::Deploy {
            account,
            source,
            code_only,
            schema_only,
            no_activate,
            yes,
        } => {
            let account = require_account(account, &config)?;
            let source = require_source(source, &config)?;
            let options = DeployOptions {
                clear: false,
                code_only,
                schema_only,
                activate: !no_activate,
                pre_confirmed: yes || config.assume_yes,
                expected_chain_id,
            };
            let mut pipeline = DeployPipeline::new(chain, TerminalDecisions::new())?;
            let outcome = pipeline.run(&account, &source, &options).await?;
            render_outcome(&account, &outcome)
        }
        Commands::Clear {
            account,
            no_activate,
            yes,
        } => {
            let account = require_account(account, &config)?;
            let options = DeployOptions {
                clear: true,
                activate: !no_activate,
                pre_confirmed: yes || config.assume_yes,
                expected_chain_id,
                ..DeployOptions::default()
            };
            let mut pipeline = DeployPipeline::new(chain, TerminalDecisions::new())?;
            let outcome = pipeline.run(&account, "", &options).await?;
            render_outcome(&account, &outcome)
        }
        Commands::Diff { account, source } => {
            let account = require_account(account, &config)?;
            let source = require_source(source, &config)?;
            let mut pipeline = DeployPipeline::new(chain, TerminalDecisions::new())?;
            let report = pipeline
                .preview(&account, &source, expected_chain_id.as_deref())
                .await?;
            render_preview(&account, &report);
            Ok(())
        }
    }
}

fn require_account(arg: Option<String>, config: &DeployConfig) -> Result<String> {
    arg.or_else(|| config.account.clone()).ok_or_else(|| {
        anyhow::anyhow!("No account given; pass <ACCOUNT> or set `account` in wharf.toml")
    })
}

fn require_source(arg: Option<String>, config: &DeployConfig) -> Result<String> {
    arg.or_else(|| config.source.clone()).ok_or_else(|| {
        anyhow::anyhow!("No source given; pass <SOURCE> or set `source` in wharf.toml")
    })
}

fn render_outcome(account: &str, outcome: &DeployOutcome) -> Result<()> {
    if outcome.status == PipelineStatus::Aborted {
        println!("{}", style("Deployment aborted.").yellow());
        return Ok(());
    }

    for report in &outcome.submissions {
        match &report.result {
            Ok(receipt) => println!(
                "  {} {:<10} {}",
                style("ok").green(),
                report.operation,
                receipt.transaction_id
            ),
            Err(failure) => {
                println!(
                    "  {} {:<10} {}",
                    style("failed").red(),
                    report.operation,
                    failure.message
                );
                if let Some(hint) = &failure.hint {
                    println!("     {} {}", style("hint:").cyan(), hint);
                }
            }
        }
    }
    for warning in &outcome.warnings {
        println!("  {} {}", style("warning:").yellow(), warning);
    }

    let failed = outcome.failed_submissions();
    if failed > 0 {
        anyhow::bail!(
            "{failed} of {} operations failed for {account}",
            outcome.submissions.len()
        );
    }
    println!("{}", style(format!("Deployment to {account} complete.")).green());
    Ok(())
}

fn render_preview(account: &str, report: &PreviewReport) {
    if !report.existing {
        println!("No schema deployed to {account}; nothing to compare against.");
        return;
    }
    if report.diff.is_empty() {
        println!("{}", style("No breaking schema changes.").green());
        return;
    }

    if !report.diff.removed.is_empty() {
        println!("Removed tables:");
        for table in &report.diff.removed {
            print_table_line(table, report.removed_at_risk.contains(table));
        }
    }
    if !report.diff.updated.is_empty() {
        println!("Updated tables:");
        for table in &report.diff.updated {
            print_table_line(table, report.updated_at_risk.contains(table));
        }
    }
}

fn print_table_line(table: &str, at_risk: bool) {
    if at_risk {
        println!("  {table} {}", style("(holds data)").red());
    } else {
        println!("  {table}");
    }
}
