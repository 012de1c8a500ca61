//! End-to-end pipeline tests against the mock chain.

mod support;

use tempfile::TempDir;

use support::{schema_with, write_artifact_pair, MockChain, ScriptedDecisions};
use wharf_core::chain::{OP_ENABLE_INLINE, OP_SET_CODE, OP_SET_SCHEMA};
use wharf_core::errors::DeployError;
use wharf_core::pipeline::{DeployOptions, DeployPipeline, PipelineStatus};

fn submitted_names(log: &std::sync::Arc<std::sync::Mutex<Vec<wharf_core::chain::Operation>>>) -> Vec<String> {
    log.lock().unwrap().iter().map(|op| op.name.clone()).collect()
}

#[tokio::test]
async fn first_deployment_skips_diff_and_submits_everything() {
    // Scenario: local artifacts, no schema deployed yet.
    let dir = TempDir::new().unwrap();
    write_artifact_pair(dir.path(), "token", &schema_with(&[("rows", "row", &[("id", "u64")])]));

    let chain = MockChain::new();
    let log = chain.submission_log();
    let decisions = ScriptedDecisions::new(&[true]);
    let prompts = decisions.prompt_log();

    let mut pipeline = DeployPipeline::new(chain, decisions).unwrap();
    let outcome = pipeline
        .run("alice", dir.path().to_str().unwrap(), &DeployOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.status, PipelineStatus::Done);
    assert!(outcome.diff.is_none());
    assert_eq!(
        submitted_names(&log),
        vec![OP_SET_CODE, OP_SET_SCHEMA, OP_ENABLE_INLINE]
    );
    assert!(outcome.submissions.iter().all(|s| s.succeeded()));
    assert_eq!(prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn removed_populated_table_is_named_and_decline_aborts() {
    // Scenario: deployed schema has t1 with rows; candidate drops it.
    let dir = TempDir::new().unwrap();
    write_artifact_pair(dir.path(), "token", &schema_with(&[("t2", "r2", &[("id", "u64")])]));

    let chain = MockChain::new()
        .with_schema(schema_with(&[("t1", "r1", &[("a", "u64"), ("b", "string")])]))
        .with_rows("t1", 3);
    let log = chain.submission_log();
    let decisions = ScriptedDecisions::new(&[true, false]);
    let prompts = decisions.prompt_log();

    let mut pipeline = DeployPipeline::new(chain, decisions).unwrap();
    let outcome = pipeline
        .run("alice", dir.path().to_str().unwrap(), &DeployOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.status, PipelineStatus::Aborted);
    assert!(log.lock().unwrap().is_empty(), "no submission after decline");
    assert_eq!(outcome.at_risk, vec!["t1"]);

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("removed: t1"), "risk prompt was: {}", prompts[1]);
}

#[tokio::test]
async fn accepted_risk_proceeds_to_submission() {
    let dir = TempDir::new().unwrap();
    write_artifact_pair(dir.path(), "token", &schema_with(&[]));

    let chain = MockChain::new()
        .with_schema(schema_with(&[("t1", "r1", &[("a", "u64")])]))
        .with_rows("t1", 1);
    let log = chain.submission_log();

    let mut pipeline = DeployPipeline::new(chain, ScriptedDecisions::new(&[true, true])).unwrap();
    let outcome = pipeline
        .run("alice", dir.path().to_str().unwrap(), &DeployOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.status, PipelineStatus::Done);
    assert_eq!(
        submitted_names(&log),
        vec![OP_SET_CODE, OP_SET_SCHEMA, OP_ENABLE_INLINE]
    );
}

#[tokio::test]
async fn empty_changed_tables_need_no_second_prompt() {
    let schema = schema_with(&[("t1", "r1", &[("a", "u64")])]);
    let dir = TempDir::new().unwrap();
    // Same table, different record layout, but the table holds no rows.
    write_artifact_pair(dir.path(), "token", &schema_with(&[("t1", "r1", &[("a", "u128")])]));

    let chain = MockChain::new().with_schema(schema);
    let decisions = ScriptedDecisions::new(&[true]);
    let prompts = decisions.prompt_log();

    let mut pipeline = DeployPipeline::new(chain, decisions).unwrap();
    let outcome = pipeline
        .run("alice", dir.path().to_str().unwrap(), &DeployOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.status, PipelineStatus::Done);
    assert_eq!(prompts.lock().unwrap().len(), 1, "no risk prompt expected");
    let diff = outcome.diff.unwrap();
    assert!(diff.updated.contains("t1"));
    assert!(outcome.at_risk.is_empty());
}

#[tokio::test]
async fn code_failure_does_not_block_schema_submission() {
    let dir = TempDir::new().unwrap();
    write_artifact_pair(dir.path(), "token", &schema_with(&[]));

    let chain =
        MockChain::new().with_failing_op(OP_SET_CODE, "account alice needs 4096 bytes, has 0");
    let log = chain.submission_log();

    let options = DeployOptions {
        pre_confirmed: true,
        ..DeployOptions::default()
    };
    let mut pipeline = DeployPipeline::new(chain, ScriptedDecisions::new(&[])).unwrap();
    let outcome = pipeline
        .run("alice", dir.path().to_str().unwrap(), &options)
        .await
        .unwrap();

    // Code attempted strictly before schema, failure notwithstanding.
    assert_eq!(
        submitted_names(&log),
        vec![OP_SET_CODE, OP_SET_SCHEMA, OP_ENABLE_INLINE]
    );
    assert_eq!(outcome.status, PipelineStatus::Done);
    assert_eq!(outcome.failed_submissions(), 1);

    let failure = outcome.submissions[0].result.as_ref().unwrap_err();
    assert!(failure.message.contains("4096 bytes"));
    let hint = failure.hint.as_deref().expect("a hint should match");
    assert!(hint.contains("storage"));
    assert!(outcome.submissions[1].succeeded());
}

#[tokio::test]
async fn clear_mode_submits_empty_payloads_without_resolving() {
    let chain = MockChain::new();
    let log = chain.submission_log();

    let options = DeployOptions {
        clear: true,
        pre_confirmed: true,
        ..DeployOptions::default()
    };
    let mut pipeline = DeployPipeline::new(chain, ScriptedDecisions::new(&[])).unwrap();
    // A nonexistent source proves resolution is skipped entirely.
    let outcome = pipeline
        .run("alice", "/nonexistent/build/dir", &options)
        .await
        .unwrap();

    assert_eq!(outcome.status, PipelineStatus::Done);
    let log = log.lock().unwrap();
    assert_eq!(log[0].name, OP_SET_CODE);
    assert_eq!(log[0].data["code"], "");
    assert_eq!(log[1].name, OP_SET_SCHEMA);
    assert_eq!(log[1].data["abi"], "");
}

#[tokio::test]
async fn both_only_flags_submit_nothing_but_still_enable() {
    let dir = TempDir::new().unwrap();
    write_artifact_pair(dir.path(), "token", &schema_with(&[]));

    let chain = MockChain::new();
    let log = chain.submission_log();

    let options = DeployOptions {
        code_only: true,
        schema_only: true,
        pre_confirmed: true,
        ..DeployOptions::default()
    };
    let mut pipeline = DeployPipeline::new(chain, ScriptedDecisions::new(&[])).unwrap();
    let outcome = pipeline
        .run("alice", dir.path().to_str().unwrap(), &options)
        .await
        .unwrap();

    assert_eq!(submitted_names(&log), vec![OP_ENABLE_INLINE]);
    assert!(outcome
        .warnings
        .iter()
        .any(|w| w.contains("nothing was submitted")));
}

#[tokio::test]
async fn no_activate_skips_the_follow_up_operation() {
    let dir = TempDir::new().unwrap();
    write_artifact_pair(dir.path(), "token", &schema_with(&[]));

    let chain = MockChain::new();
    let log = chain.submission_log();

    let options = DeployOptions {
        activate: false,
        pre_confirmed: true,
        ..DeployOptions::default()
    };
    let mut pipeline = DeployPipeline::new(chain, ScriptedDecisions::new(&[])).unwrap();
    pipeline
        .run("alice", dir.path().to_str().unwrap(), &options)
        .await
        .unwrap();

    assert_eq!(submitted_names(&log), vec![OP_SET_CODE, OP_SET_SCHEMA]);
}

#[tokio::test]
async fn initial_decline_aborts_before_any_resolution() {
    let chain = MockChain::new();
    let log = chain.submission_log();

    let mut pipeline = DeployPipeline::new(chain, ScriptedDecisions::new(&[false])).unwrap();
    // Bogus source: a declined run must never reach the resolver.
    let outcome = pipeline
        .run("alice", "/nonexistent/build/dir", &DeployOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.status, PipelineStatus::Aborted);
    assert!(log.lock().unwrap().is_empty());
    assert!(outcome.submissions.is_empty());
}

#[tokio::test]
async fn unanswered_prompt_defaults_to_decline() {
    let chain = MockChain::new();
    let mut pipeline = DeployPipeline::new(chain, ScriptedDecisions::new(&[])).unwrap();
    let outcome = pipeline
        .run("alice", "/nonexistent", &DeployOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.status, PipelineStatus::Aborted);
}

#[tokio::test]
async fn chain_id_mismatch_refuses_to_run() {
    let chain = MockChain::new().with_chain_id("bbb");
    let log = chain.submission_log();
    let decisions = ScriptedDecisions::new(&[true]);
    let prompts = decisions.prompt_log();

    let options = DeployOptions {
        expected_chain_id: Some("aaa".to_string()),
        ..DeployOptions::default()
    };
    let mut pipeline = DeployPipeline::new(chain, decisions).unwrap();
    let err = pipeline
        .run("alice", "/nonexistent", &options)
        .await
        .unwrap_err();

    match err.downcast_ref::<DeployError>() {
        Some(DeployError::NetworkMismatch { expected, actual }) => {
            assert_eq!(expected, "aaa");
            assert_eq!(actual, "bbb");
        }
        other => panic!("expected NetworkMismatch, got {other:?}"),
    }
    assert!(log.lock().unwrap().is_empty());
    assert!(prompts.lock().unwrap().is_empty(), "hard precondition, not a prompt");
}

#[tokio::test]
async fn preview_reports_diff_and_risk_without_submitting() {
    let dir = TempDir::new().unwrap();
    write_artifact_pair(dir.path(), "token", &schema_with(&[("t2", "r2", &[("x", "u64")])]));

    let chain = MockChain::new()
        .with_schema(schema_with(&[
            ("t1", "r1", &[("a", "u64")]),
            ("t2", "r2", &[("x", "string")]),
        ]))
        .with_rows("t1", 2);
    let log = chain.submission_log();

    let mut pipeline = DeployPipeline::new(chain, ScriptedDecisions::new(&[])).unwrap();
    let report = pipeline
        .preview("alice", dir.path().to_str().unwrap(), None)
        .await
        .unwrap();

    assert!(report.existing);
    assert!(report.diff.removed.contains("t1"));
    assert!(report.diff.updated.contains("t2"));
    assert_eq!(report.removed_at_risk, vec!["t1"]);
    assert!(report.updated_at_risk.is_empty());
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn preview_refuses_chain_id_mismatch() {
    let dir = TempDir::new().unwrap();
    write_artifact_pair(dir.path(), "token", &schema_with(&[]));

    // Populated t1 would show up as removed-at-risk if the report were built.
    let chain = MockChain::new()
        .with_chain_id("bbb")
        .with_schema(schema_with(&[("t1", "r1", &[("a", "u64")])]))
        .with_rows("t1", 2);

    let mut pipeline = DeployPipeline::new(chain, ScriptedDecisions::new(&[])).unwrap();
    let err = pipeline
        .preview("alice", dir.path().to_str().unwrap(), Some("aaa"))
        .await
        .unwrap_err();

    match err.downcast_ref::<DeployError>() {
        Some(DeployError::NetworkMismatch { expected, actual }) => {
            assert_eq!(expected, "aaa");
            assert_eq!(actual, "bbb");
        }
        other => panic!("expected NetworkMismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn identical_schema_skips_risk_probes() {
    let schema = schema_with(&[("t1", "r1", &[("a", "u64")])]);
    let dir = TempDir::new().unwrap();
    write_artifact_pair(dir.path(), "token", &schema);

    // t1 holds rows, but an unchanged schema must not flag it.
    let chain = MockChain::new().with_schema(schema).with_rows("t1", 5);
    let decisions = ScriptedDecisions::new(&[true]);
    let prompts = decisions.prompt_log();

    let mut pipeline = DeployPipeline::new(chain, decisions).unwrap();
    let outcome = pipeline
        .run("alice", dir.path().to_str().unwrap(), &DeployOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.status, PipelineStatus::Done);
    assert!(outcome.diff.unwrap().is_empty());
    assert!(outcome.at_risk.is_empty());
    assert_eq!(prompts.lock().unwrap().len(), 1, "no risk prompt expected");
}
