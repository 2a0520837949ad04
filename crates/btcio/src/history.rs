use bitcoin::{Transaction, Txid};
use futures::{stream, StreamExt};
use tracing::*;

use crate::{
    retry::RetryPolicy,
    source::{BlockSource, FetchError},
};

/// Fetches `txids` with at most `workers` requests in flight.
///
/// Results come back in input order, one per txid. Each fetch is retried
/// under `retry`.
pub async fn fetch_transactions<S: BlockSource + ?Sized>(
    source: &S,
    txids: &[Txid],
    workers: usize,
    retry: &RetryPolicy,
) -> Vec<(Txid, Result<Transaction, FetchError>)> {
    stream::iter(txids.iter().copied())
        .map(|txid| async move {
            let res = retry
                .run("getrawtransaction", || source.raw_transaction(&txid))
                .await;
            if let Err(err) = &res {
                warn!(%txid, %err, "could not fetch transaction");
            }
            (txid, res)
        })
        .buffered(workers.max(1))
        .collect()
        .await
}
