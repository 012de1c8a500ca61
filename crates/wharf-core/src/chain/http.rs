//! HTTP client for the chain's JSON API.

use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::schema::InterfaceSchema;

use super::{ChainInfo, ChainReader, ChainWriter, Operation, SubmitReceipt};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Chain API client over a node's HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpChainClient {
    base: Url,
    client: reqwest::Client,
}

impl HttpChainClient {
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        let base = Url::parse(endpoint)
            .with_context(|| format!("Invalid node endpoint: {endpoint}"))?;
        let client = reqwest::Client::builder()
            .user_agent("wharf/0.1.0")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { base, client })
    }

    pub fn endpoint(&self) -> &str {
        self.base.as_str()
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> anyhow::Result<T> {
        let url = self
            .base
            .join(path)
            .with_context(|| format!("Invalid API path: {path}"))?;
        let response = self
            .client
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach node at {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("node returned HTTP {status} from {path}: {text}");
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse node response from {path}"))
    }
}

#[derive(Debug, Deserialize)]
struct AbiResponse {
    #[serde(default)]
    abi: Option<InterfaceSchema>,
}

#[derive(Debug, Deserialize)]
struct RowsResponse {
    #[serde(default)]
    rows: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CodeHashResponse {
    #[serde(default)]
    code_hash: String,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    transaction_id: String,
}

impl ChainReader for HttpChainClient {
    async fn chain_info(&self) -> anyhow::Result<ChainInfo> {
        self.post("v1/chain/get_info", json!({})).await
    }

    async fn deployed_schema(&self, account: &str) -> anyhow::Result<Option<InterfaceSchema>> {
        let response: AbiResponse = self
            .post("v1/chain/get_abi", json!({ "account_name": account }))
            .await?;
        Ok(response.abi)
    }

    async fn table_rows(
        &self,
        account: &str,
        table: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<serde_json::Value>> {
        let response: RowsResponse = self
            .post(
                "v1/chain/get_table_rows",
                json!({
                    "json": true,
                    "code": account,
                    "scope": account,
                    "table": table,
                    "limit": limit,
                }),
            )
            .await?;
        Ok(response.rows)
    }

    async fn code_digest(&self, account: &str) -> anyhow::Result<Option<String>> {
        let response: CodeHashResponse = self
            .post("v1/chain/get_code_hash", json!({ "account_name": account }))
            .await?;
        // An all-zero hash means the account has no code deployed.
        if response.code_hash.is_empty() || response.code_hash.trim_matches('0').is_empty() {
            Ok(None)
        } else {
            Ok(Some(response.code_hash))
        }
    }
}

impl ChainWriter for HttpChainClient {
    async fn submit(&self, operation: Operation) -> anyhow::Result<SubmitReceipt> {
        let response: PushResponse = self
            .post(
                "v1/chain/push_transaction",
                json!({ "actions": [operation] }),
            )
            .await?;
        Ok(SubmitReceipt {
            transaction_id: response.transaction_id,
            submitted_at: Utc::now(),
        })
    }
}
