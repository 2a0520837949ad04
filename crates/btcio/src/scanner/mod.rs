//! Batched, concurrent scan of a height window for stake transactions.

use std::{iter, ops::RangeInclusive, sync::Arc};

use babylon_l1tx::StakeClassifier;
use babylon_primitives::{BlockContext, StakeRecord};
use babylon_txfmt::tx_has_stake_output;
use bitcoin::Block;
use futures::{stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::{
    retry::RetryPolicy,
    source::{BlockSource, FetchError},
};

mod stats;

pub use stats::ScanStats;
use stats::BlockTally;

/// Default number of concurrent block fetches.
pub const DEFAULT_WORKERS: usize = 4;

/// Inclusive height range walked in fixed-size batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub start_height: u64,
    pub end_height: u64,
    pub batch_size: u64,
}

impl ScanWindow {
    pub fn new(start_height: u64, end_height: u64, batch_size: u64) -> Self {
        Self {
            start_height,
            end_height,
            batch_size,
        }
    }

    /// Window of `range` blocks back from `tip`, tip included.
    pub fn trailing(tip: u64, range: u64, batch_size: u64) -> Self {
        Self::new(tip.saturating_sub(range), tip, batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.start_height > self.end_height
    }

    /// Consecutive batches covering the window. A zero batch size is treated as one.
    pub fn batches(&self) -> impl Iterator<Item = RangeInclusive<u64>> {
        let step = self.batch_size.max(1);
        let end = self.end_height;
        let starts = if self.is_empty() {
            None
        } else {
            Some(self.start_height)
        };
        iter::successors(starts, move |s| s.checked_add(step).filter(|n| *n <= end))
            .map(move |s| s..=s.saturating_add(step - 1).min(end))
    }
}

/// Records found by a scan, in height then transaction order, with its statistics.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub records: Vec<StakeRecord>,
    pub stats: ScanStats,
}

#[derive(Debug)]
struct ScannedBlock {
    records: Vec<StakeRecord>,
    tally: BlockTally,
}

/// Walks a [`ScanWindow`] over a [`BlockSource`] and classifies what it finds.
#[derive(Debug)]
pub struct Scanner<S> {
    source: Arc<S>,
    classifier: StakeClassifier,
    retry: RetryPolicy,
    workers: usize,
}

impl<S: BlockSource> Scanner<S> {
    pub fn new(source: Arc<S>, classifier: StakeClassifier) -> Self {
        Self {
            source,
            classifier,
            retry: RetryPolicy::default(),
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Scans the window. Fetch failures skip the affected block and never abort
    /// the scan. Cancellation is honoured between batches, so a block is either
    /// fully processed or contributes nothing.
    pub async fn scan(&self, window: &ScanWindow, cancel: &CancellationToken) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        info!(
            start = window.start_height,
            end = window.end_height,
            batch_size = window.batch_size,
            workers = self.workers,
            "starting stake scan"
        );

        for batch in window.batches() {
            if cancel.is_cancelled() {
                warn!(next_height = %batch.start(), "scan cancelled");
                outcome.stats.cancelled = true;
                break;
            }

            // `buffered` yields in input order, so heights stay ascending.
            let results: Vec<_> = stream::iter(batch.clone())
                .map(|height| async move { (height, self.scan_height(height).await) })
                .buffered(self.workers)
                .collect()
                .await;

            for (height, res) in results {
                match res {
                    Ok(block) => {
                        outcome.stats.absorb(&block.tally);
                        outcome.records.extend(block.records);
                    }
                    Err(err) => {
                        error!(%height, %err, "skipping block");
                        outcome.stats.record_skip(height);
                    }
                }
            }

            info!(
                batch_start = %batch.start(),
                batch_end = %batch.end(),
                found = outcome.records.len(),
                "finished batch"
            );
        }

        let stats = &outcome.stats;
        info!(
            blocks = stats.blocks_scanned,
            skipped = stats.blocks_skipped(),
            txs = stats.txs_seen,
            candidates = stats.candidates,
            validated = stats.validated,
            "stake scan finished"
        );
        outcome
    }

    async fn scan_height(&self, height: u64) -> Result<ScannedBlock, FetchError> {
        let block = self.fetch_block(height).await?;
        Ok(self.process_block(height, &block))
    }

    async fn fetch_block(&self, height: u64) -> Result<Block, FetchError> {
        let source = self.source.as_ref();
        let hash = self
            .retry
            .run("getblockhash", || source.block_hash_at(height))
            .await?;
        self.retry
            .run("getblock", || source.block_by_hash(&hash))
            .await
    }

    fn process_block(&self, height: u64, block: &Block) -> ScannedBlock {
        let ctx = BlockContext::new(height, block.header.time as u64);
        let mut tally = BlockTally::default();
        let mut records = Vec::new();

        for tx in &block.txdata {
            tally.txs_seen += 1;
            if !tx_has_stake_output(tx) {
                continue;
            }
            tally.candidates += 1;

            match self.classifier.classify(tx, ctx) {
                Ok(record) => {
                    info!(%height, txid = %record.txid, amount = record.stake_amount, "found stake");
                    tally.validated += 1;
                    records.push(record);
                }
                Err(rejection) => {
                    debug!(%height, txid = %tx.compute_txid(), %rejection, "rejected candidate");
                    tally.rejections.push(rejection.reason());
                }
            }
        }

        ScannedBlock { records, tally }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use babylon_l1tx::StakeClassifier;
    use babylon_params::ParamsTable;
    use babylon_test_utils_btc::{
        block_with_txs, dummy_output, params_row, tx_with_outputs, StakeTxBuilder,
    };
    use bitcoin::{Amount, Network, Transaction};

    use super::*;
    use crate::test_utils::MockBlockSource;

    fn classifier() -> StakeClassifier {
        let table = ParamsTable::new(vec![params_row(0, 0, None)]).expect("valid table");
        StakeClassifier::new(Arc::new(table), Network::Regtest)
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_millis(2),
        }
    }

    fn stake(nonce: u32) -> Transaction {
        StakeTxBuilder::new().nonce(nonce).build()
    }

    fn scanner(source: MockBlockSource) -> Scanner<MockBlockSource> {
        Scanner::new(Arc::new(source), classifier())
            .with_retry(fast_retry())
            .with_workers(4)
    }

    #[test]
    fn test_window_batches() {
        let batches: Vec<_> = ScanWindow::new(5, 16, 5).batches().collect();
        assert_eq!(batches, vec![5..=9, 10..=14, 15..=16]);

        let single: Vec<_> = ScanWindow::new(3, 3, 10).batches().collect();
        assert_eq!(single, vec![3..=3]);

        assert_eq!(ScanWindow::new(4, 3, 10).batches().count(), 0);
        assert_eq!(ScanWindow::new(0, 2, 0).batches().count(), 3);
    }

    #[test]
    fn test_trailing_window() {
        assert_eq!(ScanWindow::trailing(100, 50, 10), ScanWindow::new(50, 100, 10));
        assert_eq!(ScanWindow::trailing(20, 50, 10).start_height, 0);
    }

    #[tokio::test]
    async fn test_scan_finds_stakes_in_order() {
        let mut source = MockBlockSource::new();
        for height in 1..=12u64 {
            let txs = vec![
                tx_with_outputs(vec![dummy_output()]),
                stake(height as u32 * 2),
                stake(height as u32 * 2 + 1),
            ];
            source.push_block(height, block_with_txs(1_700_000_000 + height as u32, txs));
            // later heights in each batch answer first
            source.delay_height(height, Duration::from_millis(20 - height));
        }

        let outcome = scanner(source)
            .scan(&ScanWindow::new(1, 12, 5), &CancellationToken::new())
            .await;

        assert_eq!(outcome.records.len(), 24);
        let heights: Vec<_> = outcome.records.iter().map(|r| r.block_height).collect();
        let mut sorted = heights.clone();
        sorted.sort();
        assert_eq!(heights, sorted);

        let expected: Vec<_> = (1..=12u32)
            .flat_map(|h| [stake(h * 2).compute_txid(), stake(h * 2 + 1).compute_txid()])
            .collect();
        let txids: Vec<_> = outcome.records.iter().map(|r| r.txid).collect();
        assert_eq!(txids, expected);

        assert_eq!(outcome.stats.blocks_scanned, 12);
        assert_eq!(outcome.stats.txs_seen, 36);
        assert_eq!(outcome.stats.candidates, 24);
        assert_eq!(outcome.stats.validated, 24);
        assert_eq!(outcome.stats.blocks_skipped(), 0);
    }

    #[tokio::test]
    async fn test_all_blocks_failing_yields_empty_outcome() {
        let mut source = MockBlockSource::new();
        for height in 0..6 {
            source.push_block(height, block_with_txs(0, vec![stake(height as u32)]));
            source.fail_always(height);
        }

        let outcome = scanner(source)
            .scan(&ScanWindow::new(0, 5, 2), &CancellationToken::new())
            .await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.skipped_heights, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(outcome.stats.blocks_scanned, 0);
    }

    #[tokio::test]
    async fn test_transient_failures_within_ceiling_recover() {
        let mut source = MockBlockSource::new();
        source.push_block(1, block_with_txs(0, vec![stake(1)]));
        source.push_block(2, block_with_txs(0, vec![stake(2)]));
        source.fail_transiently(1, 2);
        source.fail_transiently(2, 3);

        let outcome = scanner(source)
            .scan(&ScanWindow::new(1, 2, 10), &CancellationToken::new())
            .await;

        // two failures fit in two retries, three do not
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].block_height, 1);
        assert_eq!(outcome.stats.skipped_heights, vec![2]);
    }

    #[tokio::test]
    async fn test_fatal_failure_skips_without_retry() {
        let mut source = MockBlockSource::new();
        source.push_block(1, block_with_txs(0, vec![stake(1)]));
        source.fail_fatally(1);

        let scanner = scanner(source);
        let outcome = scanner
            .scan(&ScanWindow::new(1, 1, 1), &CancellationToken::new())
            .await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.skipped_heights, vec![1]);
        assert_eq!(scanner.source().hash_requests(), 1);
    }

    #[tokio::test]
    async fn test_missing_block_is_skipped() {
        let mut source = MockBlockSource::new();
        source.push_block(1, block_with_txs(0, vec![stake(1)]));

        let outcome = scanner(source)
            .scan(&ScanWindow::new(1, 2, 10), &CancellationToken::new())
            .await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.stats.skipped_heights, vec![2]);
    }

    #[tokio::test]
    async fn test_rejections_are_counted() {
        let low = StakeTxBuilder::new().amount(Amount::from_sat(10)).build();
        let short = StakeTxBuilder::new().staking_duration(5).nonce(1).build();
        let mut source = MockBlockSource::new();
        source.push_block(0, block_with_txs(0, vec![low, short, stake(9)]));

        let outcome = scanner(source)
            .scan(&ScanWindow::new(0, 0, 1), &CancellationToken::new())
            .await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.stats.candidates, 3);
        assert_eq!(outcome.stats.rejections["amount_out_of_range"], 1);
        assert_eq!(outcome.stats.rejections["duration_out_of_range"], 1);
    }

    #[tokio::test]
    async fn test_cancelled_scan_stops_before_next_batch() {
        let mut source = MockBlockSource::new();
        for height in 0..4 {
            source.push_block(height, block_with_txs(0, vec![stake(height as u32)]));
        }
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = scanner(source).scan(&ScanWindow::new(0, 3, 2), &cancel).await;

        assert!(outcome.records.is_empty());
        assert!(outcome.stats.cancelled);
        assert_eq!(outcome.stats.blocks_scanned, 0);
    }

    #[tokio::test]
    async fn test_cancel_during_batch_keeps_completed_batch() {
        let mut source = MockBlockSource::new();
        for height in 0..4 {
            source.push_block(height, block_with_txs(0, vec![stake(height as u32)]));
        }
        source.delay_height(0, Duration::from_millis(50));
        let scanner = scanner(source);
        let cancel = CancellationToken::new();

        // Cancel once the first batch is in flight.
        let cancel_mid_batch = async {
            while scanner.source().hash_requests() == 0 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            cancel.cancel();
        };
        let window = ScanWindow::new(0, 3, 2);
        let (outcome, ()) = tokio::join!(
            scanner.scan(&window, &cancel),
            cancel_mid_batch
        );

        let heights: Vec<_> = outcome.records.iter().map(|r| r.block_height).collect();
        assert_eq!(heights, vec![0, 1]);
        assert!(outcome.stats.cancelled);
        assert_eq!(outcome.stats.blocks_scanned, 2);
        assert_eq!(scanner.source().hash_requests(), 2);
    }
}
