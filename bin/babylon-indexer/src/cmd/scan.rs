//! `scan`: window scan, aggregation and artifact output.

use std::{fs, path::Path, sync::Arc};

use anyhow::Context;
use babylon_btcio::{BlockSource, RetryPolicy, ScanOutcome, ScanWindow, Scanner};
use babylon_config::Config;
use babylon_l1tx::StakeClassifier;
use babylon_params::ParamsTable;
use babylon_stats::{aggregate, AggregateReport};
use babylon_txfmt::PayloadDecoder;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::*;

use super::decoder_for;
use crate::{
    args::SubcScan,
    context::{load_params, resolve_window, IndexerContext},
};

pub(super) async fn exec(
    args: SubcScan,
    ctx: &IndexerContext,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    // Both are fatal and must fail before any block is fetched.
    let params = load_params(&ctx.config)?;
    let window = resolve_window(&ctx.config.scan, ctx.source.as_ref(), &ctx.retry).await?;

    let decoder = decoder_for(args.fixed_term);
    let (outcome, report) = run_scan(
        ctx.source.clone(),
        &ctx.config,
        params,
        decoder,
        ctx.retry,
        window,
        &cancel,
    )
    .await;

    write_artifacts(&ctx.config, &outcome, &report)?;

    let stats = &outcome.stats;
    if !stats.skipped_heights.is_empty() {
        warn!(heights = ?stats.skipped_heights, "some blocks were skipped");
    }
    info!(
        records = outcome.records.len(),
        total_stake_btc = report.summary.total_stake_btc,
        stakers = report.summary.unique_stakers_count,
        finality_providers = report.summary.finality_provider_count,
        rejections = ?stats.rejections,
        cancelled = stats.cancelled,
        "scan complete"
    );
    Ok(())
}

async fn run_scan<S: BlockSource>(
    source: Arc<S>,
    config: &Config,
    params: Arc<ParamsTable>,
    decoder: PayloadDecoder,
    retry: RetryPolicy,
    window: ScanWindow,
    cancel: &CancellationToken,
) -> (ScanOutcome, AggregateReport) {
    let classifier = StakeClassifier::new(params, config.bitcoind.network).with_decoder(decoder);
    let scanner = Scanner::new(source, classifier)
        .with_retry(retry)
        .with_workers(config.scan.workers);

    let outcome = scanner.scan(&window, cancel).await;
    let report = aggregate(&outcome.records);
    (outcome, report)
}

fn write_artifacts(
    config: &Config,
    outcome: &ScanOutcome,
    report: &AggregateReport,
) -> anyhow::Result<()> {
    write_json(&config.output.transactions_path, &outcome.records)?;
    info!(path = %config.output.transactions_path.display(), "wrote stake records");
    write_json(&config.output.analysis_path, report)?;
    info!(path = %config.output.analysis_path.display(), "wrote stake analysis");
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use babylon_btcio::test_utils::MockBlockSource;
    use babylon_config::{BitcoindConfig, OutputConfig};
    use babylon_primitives::StakeRecord;
    use babylon_test_utils_btc::{block_with_txs, params_row, StakeTxBuilder};
    use bitcoin::{Amount, Network};

    use super::*;

    fn config(dir: &Path) -> Config {
        Config {
            bitcoind: BitcoindConfig {
                rpc_url: "http://localhost:18443".to_string(),
                rpc_user: "u".to_string(),
                rpc_password: "p".to_string(),
                network: Network::Regtest,
                retry_count: None,
                retry_interval: None,
            },
            scan: Default::default(),
            retry: Default::default(),
            params: Default::default(),
            output: OutputConfig {
                transactions_path: dir.join("out/txs.json"),
                analysis_path: dir.join("out/analysis.json"),
            },
            logging: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_scan_writes_records_and_report() {
        let mut source = MockBlockSource::new();
        let stake = StakeTxBuilder::new().build();
        let small = StakeTxBuilder::new()
            .amount(Amount::from_sat(10))
            .nonce(1)
            .build();
        source.push_block(100, block_with_txs(1_700_000_000, vec![stake.clone(), small]));
        source.push_block(101, block_with_txs(1_700_000_600, Vec::new()));
        source.fail_always(102);

        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let params = Arc::new(ParamsTable::new(vec![params_row(0, 0, None)]).unwrap());
        let retry = RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_millis(2),
        };

        let (outcome, report) = run_scan(
            Arc::new(source),
            &config,
            params,
            PayloadDecoder::default(),
            retry,
            ScanWindow::new(100, 102, 2),
            &CancellationToken::new(),
        )
        .await;
        write_artifacts(&config, &outcome, &report).unwrap();

        assert_eq!(outcome.stats.skipped_heights, vec![102]);
        assert_eq!(outcome.stats.rejections["amount_out_of_range"], 1);

        let written: Vec<StakeRecord> =
            serde_json::from_slice(&fs::read(&config.output.transactions_path).unwrap()).unwrap();
        assert_eq!(written, outcome.records);
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].txid, stake.compute_txid());

        let analysis: serde_json::Value =
            serde_json::from_slice(&fs::read(&config.output.analysis_path).unwrap()).unwrap();
        assert_eq!(analysis["summary"]["total_stake_sat"], 50_000);
        assert_eq!(analysis["summary"]["total_transactions"], 1);
    }
}
