//! Data-loss risk probing.

use futures::future::join_all;

use crate::chain::ChainReader;

/// Report which of `tables` currently hold at least one row on chain.
///
/// Probes run concurrently, one existence query per table, and every probe is
/// allowed to fail on its own: a failed query counts as "no data" because the
/// assessor's job is conservative risk surfacing, not connectivity diagnosis.
/// The returned list is duplicate-free.
pub async fn assess_risk<C: ChainReader>(
    chain: &C,
    account: &str,
    tables: &[String],
) -> Vec<String> {
    let probes = tables.iter().map(|table| async move {
        match chain.table_rows(account, table, 1).await {
            Ok(rows) if !rows.is_empty() => Some(table.clone()),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!(table = %table, "row probe failed, assuming no data: {err:#}");
                None
            }
        }
    });

    let mut populated = Vec::new();
    for table in join_all(probes).await.into_iter().flatten() {
        if !populated.contains(&table) {
            populated.push(table);
        }
    }
    populated
}
