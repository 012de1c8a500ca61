//! Chain read/write collaborator interfaces and operation builders.
//!
//! The pipeline is generic over these traits; production code uses
//! [`http::HttpChainClient`], tests inject mocks.

pub mod http;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::schema::InterfaceSchema;

/// Identity of the connected network.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainInfo {
    pub chain_id: String,
    #[serde(default)]
    pub head_block_num: u64,
    #[serde(default)]
    pub server_version_string: String,
}

/// One actor@permission pair authorizing an operation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Authorization {
    pub actor: String,
    pub permission: String,
}

impl Authorization {
    pub fn active(actor: &str) -> Self {
        Self {
            actor: actor.to_string(),
            permission: "active".to_string(),
        }
    }
}

/// A single chain operation. The pipeline always submits one operation per
/// transaction so that code and schema replacement fail independently.
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    #[serde(rename = "account")]
    pub target_account: String,
    pub name: String,
    #[serde(rename = "authorization")]
    pub authorizations: Vec<Authorization>,
    pub data: serde_json::Value,
}

/// Receipt for one accepted transaction.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub transaction_id: String,
    pub submitted_at: DateTime<Utc>,
}

/// Read-only chain API.
pub trait ChainReader {
    fn chain_info(&self) -> impl Future<Output = anyhow::Result<ChainInfo>> + Send;

    /// The schema currently deployed to `account`, or `None` when the account
    /// has never had one.
    fn deployed_schema(
        &self,
        account: &str,
    ) -> impl Future<Output = anyhow::Result<Option<InterfaceSchema>>> + Send;

    /// Up to `limit` rows of one table, scoped to the account itself.
    fn table_rows(
        &self,
        account: &str,
        table: &str,
        limit: u32,
    ) -> impl Future<Output = anyhow::Result<Vec<serde_json::Value>>> + Send;

    /// Digest of the account's deployed bytecode, `None` when no code is set.
    fn code_digest(
        &self,
        account: &str,
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;
}

/// Write side of the chain API.
pub trait ChainWriter {
    fn submit(
        &self,
        operation: Operation,
    ) -> impl Future<Output = anyhow::Result<SubmitReceipt>> + Send;
}

/// Operation name for bytecode replacement.
pub const OP_SET_CODE: &str = "setcode";
/// Operation name for schema replacement.
pub const OP_SET_SCHEMA: &str = "setabi";
/// Operation name for enabling self-calling (inline) actions.
pub const OP_ENABLE_INLINE: &str = "updateauth";

/// Build a bytecode-replacement operation. Empty `wasm` clears the code.
pub fn set_code(account: &str, wasm: &[u8]) -> Operation {
    Operation {
        target_account: "chain".to_string(),
        name: OP_SET_CODE.to_string(),
        authorizations: vec![Authorization::active(account)],
        data: json!({
            "account": account,
            "vmtype": 0,
            "vmversion": 0,
            "code": hex_encode(wasm),
        }),
    }
}

/// Build a schema-replacement operation. Empty `abi` clears the schema.
pub fn set_schema(account: &str, abi: &[u8]) -> Operation {
    Operation {
        target_account: "chain".to_string(),
        name: OP_SET_SCHEMA.to_string(),
        authorizations: vec![Authorization::active(account)],
        data: json!({
            "account": account,
            "abi": hex_encode(abi),
        }),
    }
}

/// Build the follow-up operation that lets the deployed contract authorize
/// its own inline actions under the account's active permission.
pub fn enable_inline_actions(account: &str) -> Operation {
    Operation {
        target_account: "chain".to_string(),
        name: OP_ENABLE_INLINE.to_string(),
        authorizations: vec![Authorization::active(account)],
        data: json!({
            "account": account,
            "permission": "active",
            "parent": "owner",
            "auth": {
                "threshold": 1,
                "keys": [],
                "waits": [],
                "accounts": [{
                    "permission": { "actor": account, "permission": "wharf.code" },
                    "weight": 1,
                }],
            },
        }),
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
