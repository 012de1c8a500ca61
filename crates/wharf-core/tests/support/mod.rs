//! Shared test doubles: an in-memory chain and a scripted decision source.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::json;

use wharf_core::chain::{ChainInfo, ChainReader, ChainWriter, Operation, SubmitReceipt};
use wharf_core::pipeline::DecisionSource;
use wharf_core::schema::{Field, InterfaceSchema, StructDef, TableDef};

/// In-memory chain double. Submitted operations are recorded through a
/// shared handle so tests can inspect them after the pipeline consumes the
/// mock.
#[derive(Debug, Default)]
pub struct MockChain {
    pub chain_id: String,
    pub schema: Option<InterfaceSchema>,
    rows: HashMap<String, usize>,
    failing_probes: HashSet<String>,
    failing_ops: HashMap<String, String>,
    submitted: Arc<Mutex<Vec<Operation>>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            chain_id: "mock-chain".to_string(),
            ..Self::default()
        }
    }

    pub fn with_chain_id(mut self, id: &str) -> Self {
        self.chain_id = id.to_string();
        self
    }

    pub fn with_schema(mut self, schema: InterfaceSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_rows(mut self, table: &str, count: usize) -> Self {
        self.rows.insert(table.to_string(), count);
        self
    }

    pub fn with_failing_probe(mut self, table: &str) -> Self {
        self.failing_probes.insert(table.to_string());
        self
    }

    pub fn with_failing_op(mut self, operation: &str, message: &str) -> Self {
        self.failing_ops
            .insert(operation.to_string(), message.to_string());
        self
    }

    /// Handle to the submission log, valid after the mock is moved away.
    pub fn submission_log(&self) -> Arc<Mutex<Vec<Operation>>> {
        Arc::clone(&self.submitted)
    }
}

impl ChainReader for MockChain {
    async fn chain_info(&self) -> anyhow::Result<ChainInfo> {
        Ok(ChainInfo {
            chain_id: self.chain_id.clone(),
            head_block_num: 1,
            server_version_string: "mock".to_string(),
        })
    }

    async fn deployed_schema(&self, _account: &str) -> anyhow::Result<Option<InterfaceSchema>> {
        Ok(self.schema.clone())
    }

    async fn table_rows(
        &self,
        _account: &str,
        table: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<serde_json::Value>> {
        if self.failing_probes.contains(table) {
            anyhow::bail!("node unreachable while probing {table}");
        }
        let count = self.rows.get(table).copied().unwrap_or(0);
        Ok((0..count.min(limit as usize)).map(|i| json!({ "n": i })).collect())
    }

    async fn code_digest(&self, _account: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

impl ChainWriter for MockChain {
    async fn submit(&self, operation: Operation) -> anyhow::Result<SubmitReceipt> {
        let name = operation.name.clone();
        self.submitted.lock().unwrap().push(operation);
        if let Some(message) = self.failing_ops.get(&name) {
            anyhow::bail!("{message}");
        }
        let seq = self.submitted.lock().unwrap().len();
        Ok(SubmitReceipt {
            transaction_id: format!("tx-{seq:04}"),
            submitted_at: Utc::now(),
        })
    }
}

/// Scripted answers for the confirmation prompts; exhausted scripts answer
/// "no", matching the prompts' unattended default.
#[derive(Debug, Default)]
pub struct ScriptedDecisions {
    answers: VecDeque<bool>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedDecisions {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            prompts: Arc::default(),
        }
    }

    pub fn prompt_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

impl DecisionSource for ScriptedDecisions {
    fn confirm(&mut self, prompt: &str) -> anyhow::Result<bool> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answers.pop_front().unwrap_or(false))
    }
}

/// Schema fixture: one record layout and one table per `(table, record,
/// fields)` triple.
pub fn schema_with(tables: &[(&str, &str, &[(&str, &str)])]) -> InterfaceSchema {
    InterfaceSchema {
        version: "wharf::abi/1.0".to_string(),
        structs: tables
            .iter()
            .map(|(_, record, fields)| StructDef {
                name: record.to_string(),
                base: String::new(),
                fields: fields
                    .iter()
                    .map(|(n, t)| Field {
                        name: n.to_string(),
                        type_name: t.to_string(),
                    })
                    .collect(),
            })
            .collect(),
        tables: tables
            .iter()
            .map(|(table, record, _)| TableDef {
                name: table.to_string(),
                record_type: record.to_string(),
                index_type: "i64".to_string(),
            })
            .collect(),
    }
}

/// Write a `{name}.wasm` + `{name}.abi` pair into `dir`.
pub fn write_artifact_pair(dir: &std::path::Path, name: &str, schema: &InterfaceSchema) {
    std::fs::write(dir.join(format!("{name}.wasm")), b"\0asm\x01\x00\x00\x00").unwrap();
    std::fs::write(
        dir.join(format!("{name}.abi")),
        serde_json::to_string_pretty(schema).unwrap(),
    )
    .unwrap();
}
